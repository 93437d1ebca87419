//! I/O operations: the HTTP client seam, the fetcher, and staging files.

mod fetcher;
mod http;
mod partial;
mod reporter;

pub use fetcher::Fetcher;
pub use http::{BoxStream, HttpClient, HttpResponse};
pub use partial::{ensure_parent_directory, staging_path};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
