//! The image acquisition subsystem: three resolvers that turn heterogeneous
//! request inputs into one canonical decoded image or a classified failure.

use base64::{engine::general_purpose, Engine as _};
use tracing::debug;

use crate::error::GatewayError;
use crate::fetch::FetchClient;
use crate::image::{decode_image, DecodedImage};
use crate::policy::MAX_IMAGE_BYTES;

/// One image-bearing input. Exactly one variant per request, selected by the
/// route that received it, never by content sniffing.
pub enum ImageSource {
    UploadedFile {
        filename: Option<String>,
        bytes: Vec<u8>,
    },
    Base64Payload(String),
    RemoteUrl(String),
}

impl ImageSource {
    /// Resolve this source into a decoded image.
    ///
    /// Size and encoding constraints are enforced before any decode is
    /// attempted; remote bytes additionally go through the fetch client's
    /// own transport and size policing.
    pub async fn resolve(self, fetch: &FetchClient) -> Result<DecodedImage, GatewayError> {
        match self {
            ImageSource::UploadedFile { filename, bytes } => {
                debug!(?filename, size = bytes.len(), "resolving uploaded file");
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err(GatewayError::PayloadTooLarge { what: "File" });
                }
                decode_image(&bytes)
            }
            ImageSource::Base64Payload(encoded) => {
                let bytes = general_purpose::STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|_| GatewayError::InvalidEncoding)?;
                decode_image(&bytes)
            }
            ImageSource::RemoteUrl(url) => {
                let bytes = fetch.fetch(&url).await?;
                decode_image(&bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::png_bytes;

    fn client() -> FetchClient {
        FetchClient::with_capability(false).unwrap()
    }

    #[tokio::test]
    async fn upload_and_base64_agree_on_dimensions() {
        let png = png_bytes(7, 11);

        let uploaded = ImageSource::UploadedFile {
            filename: Some("t.png".into()),
            bytes: png.clone(),
        }
        .resolve(&client())
        .await
        .unwrap();

        let encoded = general_purpose::STANDARD.encode(&png);
        let decoded = ImageSource::Base64Payload(encoded)
            .resolve(&client())
            .await
            .unwrap();

        assert_eq!(
            (uploaded.width(), uploaded.height()),
            (decoded.width(), decoded.height())
        );
    }

    #[tokio::test]
    async fn oversized_upload_fails_before_decode() {
        // Not an image at all: if decode ran, this would be a format error.
        let bytes = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = ImageSource::UploadedFile {
            filename: None,
            bytes,
        }
        .resolve(&client())
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::PayloadTooLarge { what: "File" }));
    }

    #[tokio::test]
    async fn upload_at_the_ceiling_reaches_decode() {
        let bytes = vec![0u8; MAX_IMAGE_BYTES];
        let err = ImageSource::UploadedFile {
            filename: None,
            bytes,
        }
        .resolve(&client())
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedFormat));
    }

    #[tokio::test]
    async fn non_canonical_base64_fails_without_decode() {
        for bad in ["###", "AB", "AAA=B", "A A A A"] {
            let err = ImageSource::Base64Payload(bad.to_string())
                .resolve(&client())
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::InvalidEncoding), "input {bad:?}");
        }
    }

    #[tokio::test]
    async fn valid_base64_of_garbage_is_a_format_error() {
        let encoded = general_purpose::STANDARD.encode(b"not an image");
        let err = ImageSource::Base64Payload(encoded)
            .resolve(&client())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedFormat));
    }

    #[tokio::test]
    async fn remote_url_scheme_is_checked_before_any_transport() {
        let err = ImageSource::RemoteUrl("ftp://example.com/x.jpg".into())
            .resolve(&client())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedScheme));
    }
}
