//! Pure transformations: URL and status validation, progress throttling.

mod throttle;
mod validation;

pub use throttle::{PROGRESS_INTERVAL, ProgressThrottle};
pub use validation::{is_redirect, is_success, parse_source_url, resolve_redirect};
