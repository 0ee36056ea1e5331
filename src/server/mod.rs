//! The route dispatcher: binds the API routes and applies process-wide
//! policy (CORS, body-size caps, timeouts) before any handler runs.

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_multipart::form::MultipartFormConfig;
use actix_multipart::MultipartError;
use actix_web::error::{JsonPayloadError, PayloadError};
use actix_web::http::header;
use actix_web::{web, App, HttpRequest, HttpServer};
use tracing::info;

use crate::engine::OcrEngine;
use crate::error::GatewayError;
use crate::fetch::FetchClient;
use crate::policy::{CLIENT_REQUEST_TIMEOUT, MAX_IMAGE_BYTES, MULTIPART_OVERHEAD};
use crate::settings::Settings;

pub mod protocol;
pub mod routes;
pub mod timing;

/// Permissive cross-origin policy: any origin, `POST, GET, OPTIONS`,
/// `Content-Type, Authorization`.
pub fn cors() -> Cors {
    Cors::default()
        .send_wildcard()
        .allow_any_origin()
        .allowed_methods(vec!["POST", "GET", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let mapped = match &err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            GatewayError::PayloadTooLarge { what: "Request" }
        }
        other => GatewayError::MalformedBody(other.to_string()),
    };
    mapped.into()
}

fn multipart_error(err: MultipartError, _req: &HttpRequest) -> actix_web::Error {
    let mapped = match &err {
        MultipartError::Payload(PayloadError::Overflow) => {
            GatewayError::PayloadTooLarge { what: "Request" }
        }
        other => GatewayError::MalformedBody(other.to_string()),
    };
    mapped.into()
}

/// Register routes and per-body-type policy. Shared by the production
/// server and the test harness so both dispatch identically.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_IMAGE_BYTES)
            .error_handler(json_error),
    )
    .app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD))
    .app_data(
        MultipartFormConfig::default()
            .total_limit(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD)
            .memory_limit(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD)
            .error_handler(multipart_error),
    )
    .service(routes::health)
    .service(routes::version)
    .service(routes::ocr_upload)
    .service(routes::ocr_base64)
    .service(routes::ocr_url);
}

/// Bind and run the gateway. A bind failure is returned to the caller and is
/// the one startup condition that ends the process.
pub async fn run(
    settings: &Settings,
    engine: Arc<dyn OcrEngine>,
    fetch: FetchClient,
) -> io::Result<()> {
    let engine = web::Data::from(engine);
    let fetch = web::Data::new(fetch);
    let addr = (settings.host.clone(), settings.port);

    info!("binding to {}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .app_data(fetch.clone())
            .configure(app_config)
            .wrap(cors())
            .wrap(timing::RequestTimer)
    })
    .client_request_timeout(CLIENT_REQUEST_TIMEOUT)
    .bind(addr)?
    .run()
    .await
}
