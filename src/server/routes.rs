//! The user-facing JSON routes. Each OCR route feeds its own acquisition
//! resolver, then forwards the decoded image to the shared engine handle.

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use actix_multipart::form::bytes::Bytes as UploadedBytes;
use actix_multipart::form::MultipartForm;
use actix_web::{get, post, web, Responder};
use serde_json::Value;
use tracing::{debug, info};

use super::protocol::{B64ImageRequest, HealthResponse, UrlRequest, VersionResponse};
use crate::acquire::ImageSource;
use crate::engine::OcrEngine;
use crate::error::GatewayError;
use crate::fetch::FetchClient;
use crate::image::DecodedImage;
use crate::policy::API_VERSION;

type Result<T> = std::result::Result<T, GatewayError>;

#[get("/api/health")]
pub async fn health() -> impl Responder {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    web::Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp,
    })
}

#[get("/api/version")]
pub async fn version() -> impl Responder {
    web::Json(VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: API_VERSION.to_string(),
    })
}

#[derive(MultipartForm)]
pub struct OcrUploadForm {
    pub image: Option<UploadedBytes>,
}

#[post("/api/ocr")]
pub async fn ocr_upload(
    MultipartForm(form): MultipartForm<OcrUploadForm>,
    engine: web::Data<dyn OcrEngine>,
    fetch: web::Data<FetchClient>,
) -> Result<impl Responder> {
    let file = form.image.ok_or_else(|| {
        GatewayError::MissingInput(
            "No image file provided. Use 'image' field in form data.".to_string(),
        )
    })?;

    debug!(
        filename = ?file.file_name,
        size = file.data.len(),
        "received uploaded file"
    );

    let source = ImageSource::UploadedFile {
        filename: file.file_name,
        bytes: file.data.to_vec(),
    };
    let image = source.resolve(&fetch).await?;

    run_ocr(engine.into_inner(), image).await.map(web::Json)
}

#[post("/api/ocr/base64")]
pub async fn ocr_base64(
    body: web::Json<B64ImageRequest>,
    engine: web::Data<dyn OcrEngine>,
    fetch: web::Data<FetchClient>,
) -> Result<impl Responder> {
    let encoded = body.into_inner().image.ok_or_else(|| {
        GatewayError::MissingInput("Missing 'image' field in JSON body".to_string())
    })?;

    let image = ImageSource::Base64Payload(encoded).resolve(&fetch).await?;

    run_ocr(engine.into_inner(), image).await.map(web::Json)
}

#[post("/api/ocr/url")]
pub async fn ocr_url(
    body: web::Json<UrlRequest>,
    engine: web::Data<dyn OcrEngine>,
    fetch: web::Data<FetchClient>,
) -> Result<impl Responder> {
    let url = body
        .into_inner()
        .url
        .ok_or_else(|| GatewayError::MissingInput("Missing 'url' field in JSON body".to_string()))?;

    info!("fetching image from URL: {url}");
    let image = ImageSource::RemoteUrl(url).resolve(&fetch).await?;

    run_ocr(engine.into_inner(), image).await.map(web::Json)
}

/// Run the blocking inference call off the worker thread, then attach timing
/// metadata when the engine result is structurally an object.
async fn run_ocr(engine: Arc<dyn OcrEngine>, image: DecodedImage) -> Result<Value> {
    debug!(width = image.width(), height = image.height(), "image decoded");

    let started = Instant::now();
    let mut result = web::block(move || engine.recognize(&image))
        .await
        .map_err(|e| GatewayError::Engine(e.to_string()))??;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    info!("finished serving inference request");

    if let Some(object) = result.as_object_mut() {
        object.insert("processing_time_ms".to_string(), Value::from(elapsed_ms));
    }

    Ok(result)
}
