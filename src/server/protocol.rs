use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// JSON body for `POST /api/ocr/base64`. The field is optional so that its
/// absence can be reported as a missing input instead of a parse failure.
#[derive(Deserialize)]
pub struct B64ImageRequest {
    pub image: Option<String>,
}

impl Debug for B64ImageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "B64ImageRequest {{ image: {} }}",
            match &self.image {
                Some(s) => format!("<{} bytes>", s.len()),
                None => "None".to_string(),
            }
        )
    }
}

/// JSON body for `POST /api/ocr/url`.
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
    pub api_version: String,
}
