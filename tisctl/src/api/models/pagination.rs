//! Shared pagination types for API query parameters.
//!
//! List endpoints page with a 1-based `chunk` number and a `size` per chunk, so
//! `?chunk=2&size=10` returns items 11 to 20.

use serde::Deserialize;

use crate::errors::Error;

/// Maximum number of items that can be requested per chunk.
pub const MAX_SIZE: i64 = 100;

/// Chunked pagination parameters for list endpoints.
///
/// Both values are required and must be positive integers. `size` is clamped to [`MAX_SIZE`].
/// They are taken as raw strings so malformed values are reported through [`Error`] rather
/// than the query extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ChunkPagination {
    /// 1-based chunk (page) number
    pub chunk: Option<String>,

    /// Items per chunk
    pub size: Option<String>,
}

/// Parse a required, strictly positive integer query parameter.
fn positive(value: Option<&str>, name: &str) -> Result<i64, Error> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| Error::BadRequest {
            message: format!("invalid '{name}' parameter"),
        })
}

impl ChunkPagination {
    /// Whether neither `chunk` nor `size` was given.
    pub fn is_unset(&self) -> bool {
        self.chunk.is_none() && self.size.is_none()
    }

    /// Validate the parameters and convert them to `(skip, limit)`.
    pub fn params(&self) -> Result<(i64, i64), Error> {
        let chunk = positive(self.chunk.as_deref(), "chunk")?;
        let size = positive(self.size.as_deref(), "size")?.min(MAX_SIZE);

        let skip = (chunk - 1).checked_mul(size).ok_or_else(|| Error::BadRequest {
            message: "invalid 'chunk' parameter".to_string(),
        })?;

        Ok((skip, size))
    }
}
