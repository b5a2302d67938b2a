pub mod db;
pub mod models;
mod places;
mod tables;

pub use db::{Database, DatabaseError};
pub use tables::*;
