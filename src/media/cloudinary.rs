use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{ImageUpload, MediaError, MediaStore};
use crate::config::CloudinaryCredentials;
use crate::storage::models::ImageHandle;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary media store using the signed upload/destroy REST endpoints.
pub struct CloudinaryStore {
    client: Client,
    credentials: CloudinaryCredentials,
    folder: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryStore {
    pub fn new(
        credentials: CloudinaryCredentials,
        folder: &str,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            credentials,
            folder: folder.trim_matches('/').to_string(),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.credentials.cloud_name)
    }

    /// Build the form for a signed call: the caller's params plus timestamp, api_key and signature.
    fn signed_form(&self, params: &[(&str, &str)]) -> Vec<(String, String)> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut signed: Vec<(&str, &str)> = params.to_vec();
        signed.push(("timestamp", &timestamp));
        let signature = sign(&signed, &self.credentials.api_secret);

        let mut form: Vec<(String, String)> = signed
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        form.push(("api_key".to_string(), self.credentials.api_key.clone()));
        form.push(("signature".to_string(), signature));
        form
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, image: ImageUpload) -> Result<ImageHandle, MediaError> {
        let file = data_uri(&image);
        let mut form = self.signed_form(&[("folder", self.folder.as_str())]);
        // `file` is never part of the signature
        form.push(("file".to_string(), file));

        let resp = self
            .client
            .post(self.endpoint("upload"))
            .form(&form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MediaError::Backend(format!(
                "Cloudinary upload failed ({status}): {body}"
            )));
        }

        let uploaded: UploadResponse = resp.json().await?;
        tracing::debug!(public_id = %uploaded.public_id, "Uploaded image to Cloudinary");

        Ok(ImageHandle {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let form = self.signed_form(&[("public_id", public_id)]);

        let resp = self
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MediaError::Backend(format!(
                "Cloudinary destroy failed ({status}): {body}"
            )));
        }

        let destroyed: DestroyResponse = resp.json().await?;
        match destroyed.result.as_str() {
            // "not found" is fine -- image already gone
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Backend(format!(
                "Cloudinary destroy of {public_id} returned '{other}'"
            ))),
        }
    }
}

/// Cloudinary request signature: SHA-1 over the params sorted by key, joined
/// as `k=v&k=v`, with the API secret appended. Hex encoded.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let digest = ring::digest::digest(
        &ring::digest::SHA1_FOR_LEGACY_USE_ONLY,
        format!("{to_sign}{api_secret}").as_bytes(),
    );

    digest
        .as_ref()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn data_uri(image: &ImageUpload) -> String {
    use base64::Engine;
    format!(
        "data:{};base64,{}",
        image.mime_type(),
        base64::engine::general_purpose::STANDARD.encode(&image.data)
    )
}
