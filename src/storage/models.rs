use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlaceType {
    Bar,
    Hotel,
    Restaurante,
}

impl PlaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceType::Bar => "BAR",
            PlaceType::Hotel => "HOTEL",
            PlaceType::Restaurante => "RESTAURANTE",
        }
    }
}

impl fmt::Display for PlaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceType {
    type Err = String;

    /// Case-insensitive, so form fields like `bar` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BAR" => Ok(PlaceType::Bar),
            "HOTEL" => Ok(PlaceType::Hotel),
            "RESTAURANTE" => Ok(PlaceType::Restaurante),
            other => Err(format!(
                "unknown place type '{other}' (expected RESTAURANTE, BAR or HOTEL)"
            )),
        }
    }
}

/// A stored image on the media host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub url: String,
    pub public_id: String,
}

/// A place record stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    pub phone: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub images: Vec<ImageHandle>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes required to create a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceAttributes {
    pub name: String,
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    pub phone: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Partial update of a place's attributes. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub place_type: Option<PlaceType>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl PlaceChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.place_type.is_none()
            && self.phone.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}

impl Place {
    pub fn new(id: String, attributes: PlaceAttributes, images: Vec<ImageHandle>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: attributes.name,
            place_type: attributes.place_type,
            phone: attributes.phone,
            latitude: attributes.latitude,
            longitude: attributes.longitude,
            images,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply attribute changes and, when given, replace the whole image set.
    pub fn apply(&mut self, changes: &PlaceChanges, images: Option<&[ImageHandle]>) {
        if let Some(ref name) = changes.name {
            self.name = name.clone();
        }
        if let Some(place_type) = changes.place_type {
            self.place_type = place_type;
        }
        if let Some(ref phone) = changes.phone {
            self.phone = phone.clone();
        }
        if let Some(latitude) = changes.latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = changes.longitude {
            self.longitude = longitude;
        }
        if let Some(images) = images {
            self.images = images.to_vec();
        }
        self.updated_at = Utc::now();
    }
}

/// Types of write operations (replicated via muster)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WriteOp {
    CreatePlace(Place),
    DeletePlace {
        id: String,
    },
    UpdatePlace {
        id: String,
        changes: PlaceChanges,
        /// `Some` replaces the image set wholesale
        #[serde(default)]
        images: Option<Vec<ImageHandle>>,
    },
}
