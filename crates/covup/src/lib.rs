//! Fetch, verify and run the Codecov uploader as a CI task.
//!
//! A run downloads the uploader's trusted PGP keys, the executable, its
//! SHA-256 manifest and the manifest's detached signature into a scratch
//! directory. The manifest signature is checked against the keys, the
//! executable against the manifest, and only then is the uploader started,
//! with the upload token passed through its environment.
//!
//! # Example
//!
//! ```no_run
//! use covup::{Endpoints, GpgTrustStore, Pipeline, TaskSettings};
//! use covup_fetch::ReqwestClient;
//! use covup_platform::{ProcessEnv, UploaderPlatform};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoints = Endpoints::for_platform("latest", UploaderPlatform::detect()?);
//! let mut settings = TaskSettings::new(endpoints, std::env::temp_dir(), std::env::current_dir()?);
//! settings.results_folder = Some("testResults".into());
//!
//! let result = Pipeline::new(ReqwestClient::new()?, GpgTrustStore::new(), ProcessEnv, settings)
//!     .run()
//!     .await;
//! println!("{}", result.message());
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod config;
mod error;
pub mod pipeline;
pub mod signature;
pub mod source;
pub mod token;

pub use config::{Endpoints, TaskInputs, TaskSettings};
pub use error::{Result, TaskError};
pub use pipeline::{Pipeline, Stage, TaskFailure, TaskResult};
pub use signature::{GpgTrustStore, SignatureGate, TrustError, TrustStore};
