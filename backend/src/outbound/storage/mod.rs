//! Image store adapters.
//!
//! [`LocalImageStore`] writes to an uploads directory served as static
//! files; [`S3ImageStore`] writes to an AWS S3 bucket. Configuration picks
//! one at startup.

pub mod local;
pub mod s3;

pub use local::LocalImageStore;
pub use s3::S3ImageStore;

use uuid::Uuid;

/// Derive a unique object name from an uploaded filename.
///
/// Only the final path component of the client-supplied name is kept,
/// reduced to a safe suffix (alphanumerics, dots, dashes, underscores) and
/// prefixed with a fresh UUID so concurrent uploads of the same file never
/// collide.
fn object_name(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{safe}", Uuid::new_v4().simple())
}
