use places_api::storage::models::{ImageHandle, Place, PlaceAttributes, PlaceChanges, PlaceType};
use places_api::storage::Database;

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn image(name: &str) -> ImageHandle {
    ImageHandle {
        url: format!("https://res.cloudinary.com/demo/image/upload/places/{name}.png"),
        public_id: format!("places/{name}"),
    }
}

fn sample_place(id: &str) -> Place {
    Place::new(
        id.to_string(),
        PlaceAttributes {
            name: "Praça Central".to_string(),
            place_type: PlaceType::Restaurante,
            phone: "(88) 99999-9999".to_string(),
            latitude: -3.7327,
            longitude: -38.5267,
        },
        vec![image("a"), image("b")],
    )
}

#[test]
fn test_put_and_get_place() {
    let (_dir, db) = test_db();
    let place = sample_place("place-1");

    db.put_place(&place).unwrap();

    let retrieved = db.get_place("place-1").unwrap().expect("place should exist");
    assert_eq!(retrieved, place);
    assert_eq!(retrieved.place_type, PlaceType::Restaurante);
    assert_eq!(retrieved.images, vec![image("a"), image("b")]);
}

#[test]
fn test_get_place_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_place("nonexistent").unwrap().is_none());
}

#[test]
fn test_delete_place() {
    let (_dir, db) = test_db();
    db.put_place(&sample_place("place-2")).unwrap();

    assert!(db.delete_place("place-2").unwrap());
    assert!(db.get_place("place-2").unwrap().is_none());
}

#[test]
fn test_delete_place_not_found() {
    let (_dir, db) = test_db();
    assert!(!db.delete_place("nonexistent").unwrap());
}

#[test]
fn test_update_place_attributes_keeps_images() {
    let (_dir, db) = test_db();
    let place = sample_place("place-3");
    db.put_place(&place).unwrap();

    let changes = PlaceChanges {
        name: Some("Bar do Zé".to_string()),
        place_type: Some(PlaceType::Bar),
        latitude: Some(-3.8),
        ..Default::default()
    };
    assert!(db.update_place("place-3", &changes, None).unwrap());

    let updated = db.get_place("place-3").unwrap().unwrap();
    assert_eq!(updated.name, "Bar do Zé");
    assert_eq!(updated.place_type, PlaceType::Bar);
    assert_eq!(updated.latitude, -3.8);
    assert_eq!(updated.longitude, place.longitude);
    assert_eq!(updated.phone, place.phone);
    assert_eq!(updated.images, place.images);
    assert_eq!(updated.created_at, place.created_at);
    assert!(updated.updated_at >= place.updated_at);
}

#[test]
fn test_update_place_replaces_image_set() {
    let (_dir, db) = test_db();
    db.put_place(&sample_place("place-4")).unwrap();

    let new_images = vec![image("c")];
    db.update_place("place-4", &PlaceChanges::default(), Some(new_images.as_slice()))
        .unwrap();

    let updated = db.get_place("place-4").unwrap().unwrap();
    assert_eq!(updated.images, new_images);
}

#[test]
fn test_update_place_not_found() {
    let (_dir, db) = test_db();
    let changes = PlaceChanges {
        name: Some("ghost".to_string()),
        ..Default::default()
    };
    assert!(!db.update_place("nonexistent", &changes, None).unwrap());
}

#[test]
fn test_list_places_oldest_first() {
    let (_dir, db) = test_db();
    let mut older = sample_place("z-older");
    older.created_at -= chrono::Duration::hours(1);
    db.put_place(&sample_place("a-newer")).unwrap();
    db.put_place(&older).unwrap();

    let ids: Vec<String> = db.list_places().unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, ["z-older", "a-newer"]);
}

#[test]
fn test_purge_all() {
    let (_dir, db) = test_db();
    db.put_place(&sample_place("p1")).unwrap();
    db.put_place(&sample_place("p2")).unwrap();

    let stats = db.purge_all().unwrap();
    assert_eq!(stats.places, 2);
    assert!(db.list_places().unwrap().is_empty());
}

#[test]
fn test_reopen_keeps_places() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    {
        let db = Database::open(&path).unwrap();
        db.put_place(&sample_place("durable")).unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert!(db.get_place("durable").unwrap().is_some());
}

#[test]
fn test_place_type_parsing() {
    assert_eq!("RESTAURANTE".parse::<PlaceType>(), Ok(PlaceType::Restaurante));
    assert_eq!(" bar ".parse::<PlaceType>(), Ok(PlaceType::Bar));
    assert_eq!("Hotel".parse::<PlaceType>(), Ok(PlaceType::Hotel));
    assert!("CINEMA".parse::<PlaceType>().is_err());
    assert_eq!(PlaceType::Hotel.to_string(), "HOTEL");
}

#[test]
fn test_place_json_uses_type_key() {
    let place = sample_place("json");
    let value = serde_json::to_value(&place).unwrap();
    assert_eq!(value["type"], "RESTAURANTE");
    assert_eq!(value["images"][0]["public_id"], "places/a");
}
