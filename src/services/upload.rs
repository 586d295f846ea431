use actix_web::web::Bytes;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};
use serde::Deserialize;

use crate::config::CloudinaryConfig;
use crate::error::AppError;

/// Side length of the square avatar served back to clients.
pub const AVATAR_SIZE: u32 = 250;

/// Stores avatar images and returns the URL they are served from.
#[async_trait]
pub trait AvatarStore: Send + Sync {
    async fn upload(
        &self,
        image: Bytes,
        content_type: &str,
        public_id: &str,
    ) -> Result<String, AppError>;
}

/// Public id under which a user's avatar is stored; re-uploads overwrite it.
pub fn avatar_public_id(username: &str) -> String {
    format!("ContactBook/{}", username)
}

/// Signed uploads to Cloudinary's image upload API.
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    version: u64,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }

    /// Delivery URL cropped to a `AVATAR_SIZE` square.
    pub fn delivery_url(&self, public_id: &str, version: u64) -> String {
        format!(
            "https://res.cloudinary.com/{}/image/upload/c_fill,h_{size},w_{size}/v{}/{}",
            self.config.cloud_name,
            version,
            public_id,
            size = AVATAR_SIZE
        )
    }
}

/// Cloudinary request signature: SHA-1 over the `key=value` pairs sorted by key
/// and joined with `&`, followed by the API secret.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let hashed = digest(
        &SHA1_FOR_LEGACY_USE_ONLY,
        format!("{}{}", to_sign, api_secret).as_bytes(),
    );
    hex::encode(hashed.as_ref())
}

#[async_trait]
impl AvatarStore for CloudinaryStore {
    async fn upload(
        &self,
        image: Bytes,
        content_type: &str,
        public_id: &str,
    ) -> Result<String, AppError> {
        let params = vec![
            ("overwrite", "true".to_string()),
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = sign_params(&params, &self.config.api_secret);

        let file = Part::bytes(image.to_vec())
            .file_name("avatar")
            .mime_str(content_type)?;
        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response: UploadResponse = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(self.delivery_url(public_id, response.version))
    }
}
