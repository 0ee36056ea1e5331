pub mod acquire;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod image;
pub mod server;
pub mod settings;

/// Fixed request policy shared by the dispatcher, the resolvers, and the
/// remote fetch client.
pub mod policy {
    use std::time::Duration;

    /// Payload ceiling enforced on every image-bearing input.
    pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

    /// Extra room on the multipart body cap for boundary and header
    /// overhead, so a file at the ceiling still reaches the upload resolver.
    pub const MULTIPART_OVERHEAD: usize = 256 * 1024;

    /// Server-side timeout for reading a complete client request.
    pub const CLIENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Remote fetch connect timeout.
    pub const FETCH_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Remote fetch read timeout.
    pub const FETCH_READ_TIMEOUT: Duration = Duration::from_secs(30);

    /// API version tag reported by `GET /api/version`.
    pub const API_VERSION: &str = "v1";
}
