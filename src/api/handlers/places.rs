use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::place_error;
use crate::api::response::{ApiError, AppQuery, JSend, JSendPaginated, Pagination};
use crate::config::MAX_IMAGES_PER_PLACE;
use crate::media::ImageUpload;
use crate::places::clamp_page;
use crate::storage::models::{ImageHandle, Place, PlaceAttributes, PlaceChanges, PlaceType};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceResponse {
    pub created_at: String,
    pub id: String,
    pub images: Vec<ImageHandle>,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ListPlacesParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Multipart body shared by create and update: attributes plus image parts.
#[derive(Debug, Default)]
struct PlaceForm {
    changes: PlaceChanges,
    images: Vec<ImageUpload>,
}

impl PlaceForm {
    /// All attributes are required on create.
    fn into_attributes(self) -> Result<(PlaceAttributes, Vec<ImageUpload>), ApiError> {
        let PlaceChanges {
            name,
            place_type,
            phone,
            latitude,
            longitude,
        } = self.changes;

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if place_type.is_none() {
            missing.push("type");
        }
        if phone.is_none() {
            missing.push("phone");
        }
        if latitude.is_none() {
            missing.push("latitude");
        }
        if longitude.is_none() {
            missing.push("longitude");
        }

        match (name, place_type, phone, latitude, longitude) {
            (Some(name), Some(place_type), Some(phone), Some(latitude), Some(longitude)) => Ok((
                PlaceAttributes {
                    name,
                    place_type,
                    phone,
                    latitude,
                    longitude,
                },
                self.images,
            )),
            _ => Err(ApiError::bad_request(format!(
                "missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_places(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<PlaceResponse>>>, ApiError> {
    let places = state.places.list().await.map_err(place_error)?;
    Ok(JSend::success(places.iter().map(place_to_response).collect()))
}

pub async fn list_places_paginated(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListPlacesParams>,
) -> Result<Json<JSendPaginated<PlaceResponse>>, ApiError> {
    let (page, limit) = clamp_page(params.page, params.limit);

    let result = state
        .places
        .list_page(page, limit)
        .await
        .map_err(place_error)?;

    Ok(JSendPaginated::success(
        result.items.iter().map(place_to_response).collect(),
        Pagination::new(result.page, result.limit, result.total),
    ))
}

pub async fn get_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<PlaceResponse>>, ApiError> {
    let place = state.places.get(&id).await.map_err(place_error)?;
    Ok(JSend::success(place_to_response(&place)))
}

pub async fn create_place(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<JSend<PlaceResponse>>), ApiError> {
    let form = read_place_form(&mut multipart, state.config.max_upload_size).await?;

    if form.images.is_empty() {
        return Err(ApiError::bad_request("at least one image must be sent"));
    }
    let (attributes, images) = form.into_attributes()?;

    let place = state
        .places
        .create(attributes, images)
        .await
        .map_err(place_error)?;

    tracing::info!(place_id = %place.id, images = place.images.len(), "Place created");
    Ok((StatusCode::CREATED, JSend::success(place_to_response(&place))))
}

pub async fn update_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<JSend<PlaceResponse>>, ApiError> {
    let form = read_place_form(&mut multipart, state.config.max_upload_size).await?;

    if form.changes.is_empty() && form.images.is_empty() {
        return Err(ApiError::bad_request(
            "at least one field (name, type, phone, latitude, longitude, images) must be provided",
        ));
    }

    let place = state
        .places
        .update(&id, form.changes, form.images)
        .await
        .map_err(place_error)?;

    tracing::info!(place_id = %id, "Place updated");
    Ok(JSend::success(place_to_response(&place)))
}

pub async fn delete_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    state.places.delete(&id).await.map_err(place_error)?;

    tracing::info!(place_id = %id, "Place deleted");
    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

async fn read_place_form(
    multipart: &mut Multipart,
    max_upload_size: u64,
) -> Result<PlaceForm, ApiError> {
    let mut form = PlaceForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "images" => {
                if form.images.len() >= MAX_IMAGES_PER_PLACE {
                    return Err(ApiError::bad_request(format!(
                        "at most {MAX_IMAGES_PER_PLACE} images may be sent"
                    )));
                }

                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read image: {e}")))?;

                if data.is_empty() {
                    return Err(ApiError::bad_request("images must not be empty"));
                }
                if data.len() as u64 > max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "Image exceeds maximum upload size of {max_upload_size} bytes"
                    )));
                }

                form.images.push(ImageUpload {
                    data,
                    content_type,
                    file_name,
                });
            }
            "name" => {
                let name = text_field(field, "name").await?;
                if name.trim().is_empty() {
                    return Err(ApiError::bad_request("name must not be empty"));
                }
                form.changes.name = Some(name);
            }
            "type" => {
                let text = text_field(field, "type").await?;
                let place_type = text.parse::<PlaceType>().map_err(ApiError::bad_request)?;
                form.changes.place_type = Some(place_type);
            }
            "phone" => {
                form.changes.phone = Some(text_field(field, "phone").await?);
            }
            "latitude" => {
                let latitude = coordinate_field(field, "latitude", 90.0).await?;
                form.changes.latitude = Some(latitude);
            }
            "longitude" => {
                let longitude = coordinate_field(field, "longitude", 180.0).await?;
                form.changes.longitude = Some(longitude);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    Ok(form)
}

async fn text_field(field: Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid {name}: {e}")))
}

async fn coordinate_field(field: Field<'_>, name: &str, bound: f64) -> Result<f64, ApiError> {
    let text = text_field(field, name).await?;
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{name} must be a number")))?;

    if !value.is_finite() || value.abs() > bound {
        return Err(ApiError::bad_request(format!(
            "{name} must be between -{bound} and {bound}"
        )));
    }
    Ok(value)
}

fn place_to_response(place: &Place) -> PlaceResponse {
    PlaceResponse {
        created_at: place.created_at.to_rfc3339(),
        id: place.id.clone(),
        images: place.images.clone(),
        latitude: place.latitude,
        longitude: place.longitude,
        name: place.name.clone(),
        phone: place.phone.clone(),
        place_type: place.place_type,
        updated_at: place.updated_at.to_rfc3339(),
    }
}
