//! Pre-upload image checks: reachable, not too heavy, not too large.

use std::io::Cursor;
use std::time::Duration;

use catsync_engine::{ImageValidator, PlatformError, ValidationResult};
use image::ImageReader;
use reqwest::{Client, StatusCode};

/// Validates images over HTTP before they are handed to the platform.
///
/// Definite problems (404, oversize, undecodable) produce an invalid
/// [`ValidationResult`] that is cached. Network failures, 429s and 5xx
/// responses are returned as errors so the image is retried on a later run.
pub struct HttpImageValidator {
    client: Client,
    max_bytes: u64,
    max_pixels: u32,
}

impl HttpImageValidator {
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, max_bytes: u64, max_pixels: u32) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            max_bytes,
            max_pixels,
        })
    }

    fn check_status(status: StatusCode, method: &str) -> Result<Option<ValidationResult>, PlatformError> {
        if status.is_success() {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(PlatformError::Transient {
                status: Some(status.as_u16()),
                message: format!("{method} returned {status}"),
            });
        }
        Ok(Some(ValidationResult::invalid(format!(
            "{method} returned {status}"
        ))))
    }

    fn oversize(&self, len: u64) -> Option<ValidationResult> {
        (len > self.max_bytes).then(|| {
            ValidationResult::invalid(format!(
                "{len} bytes exceeds {} byte limit",
                self.max_bytes
            ))
        })
    }

    /// Checks decoded dimensions against the pixel limit.
    #[must_use]
    pub fn judge_bytes(&self, bytes: &[u8]) -> ValidationResult {
        let reader = match ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
            Ok(reader) => reader,
            Err(e) => return ValidationResult::invalid(format!("unreadable image: {e}")),
        };
        let (width, height) = match reader.into_dimensions() {
            Ok(dims) => dims,
            Err(e) => return ValidationResult::invalid(format!("undecodable image: {e}")),
        };
        if width > self.max_pixels || height > self.max_pixels {
            return ValidationResult {
                valid: false,
                width: Some(width),
                height: Some(height),
                reason: Some(format!(
                    "{width}x{height} exceeds {max} px",
                    max = self.max_pixels
                )),
            };
        }
        ValidationResult::valid(width, height)
    }
}

fn transient(e: &reqwest::Error) -> PlatformError {
    PlatformError::Transient {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

impl ImageValidator for HttpImageValidator {
    async fn validate(&self, src: &str) -> Result<ValidationResult, PlatformError> {
        let head = self.client.head(src).send().await.map_err(|e| transient(&e))?;
        if let Some(verdict) = Self::check_status(head.status(), "HEAD")? {
            return Ok(verdict);
        }
        if let Some(verdict) = head.content_length().and_then(|len| self.oversize(len)) {
            return Ok(verdict);
        }

        let mut response = self.client.get(src).send().await.map_err(|e| transient(&e))?;
        if let Some(verdict) = Self::check_status(response.status(), "GET")? {
            return Ok(verdict);
        }
        if let Some(verdict) = response.content_length().and_then(|len| self.oversize(len)) {
            return Ok(verdict);
        }

        // Servers may omit Content-Length; stop reading once over the cap.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| transient(&e))? {
            bytes.extend_from_slice(&chunk);
            let read = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
            if let Some(verdict) = self.oversize(read) {
                return Ok(verdict);
            }
        }

        let verdict = self.judge_bytes(&bytes);
        tracing::debug!(
            image = src,
            valid = verdict.valid,
            width = verdict.width,
            height = verdict.height,
            "image validated"
        );
        Ok(verdict)
    }
}
