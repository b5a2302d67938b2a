use bytes::Bytes;
use places_api::media::{ImageUpload, LocalMediaStore, MediaError, MediaStore};

fn png(content: &'static [u8]) -> ImageUpload {
    let mut image = ImageUpload::new(Bytes::from_static(content));
    image.content_type = Some("image/png".to_string());
    image
}

#[tokio::test]
async fn test_local_store_upload() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalMediaStore::new(dir.path(), "places", "http://localhost:8080/").unwrap();

    let handle = store.upload(png(b"pixels")).await.unwrap();

    assert!(handle.public_id.starts_with("places/"));
    assert!(handle.public_id.ends_with(".png"));
    assert_eq!(
        handle.url,
        format!("http://localhost:8080/media/{}", handle.public_id)
    );
    assert!(store.contains(&handle.public_id));

    let stored = std::fs::read(store.base_path().join(&handle.public_id)).unwrap();
    assert_eq!(stored, b"pixels");
}

#[tokio::test]
async fn test_local_store_extension_from_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalMediaStore::new(dir.path(), "places", "http://localhost").unwrap();

    let mut image = ImageUpload::new(Bytes::from_static(b"data"));
    image.file_name = Some("Photo.JPG".to_string());
    let handle = store.upload(image).await.unwrap();
    assert!(handle.public_id.ends_with(".jpg"));

    let bare = store
        .upload(ImageUpload::new(Bytes::from_static(b"data")))
        .await
        .unwrap();
    assert!(bare.public_id.ends_with(".bin"));
}

#[tokio::test]
async fn test_local_store_uploads_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalMediaStore::new(dir.path(), "places", "http://localhost").unwrap();

    let first = store.upload(png(b"same")).await.unwrap();
    let second = store.upload(png(b"same")).await.unwrap();
    assert_ne!(first.public_id, second.public_id);
}

#[tokio::test]
async fn test_local_store_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalMediaStore::new(dir.path(), "places", "http://localhost").unwrap();

    let handle = store.upload(png(b"bye")).await.unwrap();
    store.delete(&handle.public_id).await.unwrap();
    assert!(!store.contains(&handle.public_id));
}

#[tokio::test]
async fn test_local_store_delete_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalMediaStore::new(dir.path(), "places", "http://localhost").unwrap();

    // Deleting an image that is already gone should not error
    store.delete("places/nonexistent.png").await.unwrap();
}

#[tokio::test]
async fn test_local_store_rejects_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalMediaStore::new(dir.path().join("media"), "places", "http://localhost")
        .unwrap();

    let outside = dir.path().join("secret.txt");
    std::fs::write(&outside, b"keep me").unwrap();

    let result = store.delete("../secret.txt").await;
    assert!(matches!(result, Err(MediaError::InvalidPublicId(_))));
    assert!(outside.exists());

    let absolute = store.delete("/etc/passwd").await;
    assert!(matches!(absolute, Err(MediaError::InvalidPublicId(_))));
}
