//! Place workflows: image orchestration on top of the place repository.

pub mod repository;
pub mod service;

pub use repository::{PlaceRepository, ReplicatedPlaceRepository, RepositoryError};
pub use service::{clamp_page, PlaceError, PlacePage, PlaceService};
