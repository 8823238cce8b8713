//! Embedded image payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const MAX_MIME_LEN: usize = 127;

/// A photo embedded as `data:<mimetype>;base64,<encoded_data>`.
///
/// The payload is checked against the base64 alphabet but never decoded;
/// backends receive it verbatim.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageDataUri {
    raw: String,
    mime_end: usize,
    payload_start: usize,
}

impl ImageDataUri {
    /// Parses and validates a data URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataUri`] when the scheme, MIME type, encoding
    /// marker or payload is missing or malformed.
    pub fn parse(input: impl Into<String>) -> Result<Self> {
        let raw = input.into();
        let rest = raw
            .strip_prefix(SCHEME)
            .ok_or_else(|| invalid("must start with `data:`"))?;
        let marker = rest
            .find(BASE64_MARKER)
            .ok_or_else(|| invalid("must declare `;base64,` encoding"))?;

        let mime = &rest[..marker];
        validate_mime(mime)?;

        let payload = &rest[marker + BASE64_MARKER.len()..];
        validate_payload(payload)?;

        let mime_end = SCHEME.len() + marker;
        let payload_start = mime_end + BASE64_MARKER.len();
        Ok(Self {
            raw,
            mime_end,
            payload_start,
        })
    }

    /// Declared MIME type, e.g. `image/png`.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.raw[SCHEME.len()..self.mime_end]
    }

    /// Base64 payload without the `data:` header.
    #[must_use]
    pub fn base64_payload(&self) -> &str {
        &self.raw[self.payload_start..]
    }

    /// The full URI as supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

// Payloads can be megabytes; keep them out of debug logs.
impl fmt::Debug for ImageDataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDataUri")
            .field("mime_type", &self.mime_type())
            .field("payload_len", &self.base64_payload().len())
            .finish()
    }
}

impl FromStr for ImageDataUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImageDataUri {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<ImageDataUri> for String {
    fn from(value: ImageDataUri) -> Self {
        value.raw
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidDataUri {
        reason: reason.into(),
    }
}

fn validate_mime(mime: &str) -> Result<()> {
    if mime.is_empty() {
        return Err(invalid("MIME type cannot be empty"));
    }
    if mime.len() > MAX_MIME_LEN {
        return Err(invalid(format!("MIME type length must be <= {MAX_MIME_LEN}")));
    }

    let Some((kind, subtype)) = mime.split_once('/') else {
        return Err(invalid(format!("MIME type `{mime}` must be `type/subtype`")));
    };

    let token = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
    };
    if !token(kind) || !token(subtype) {
        return Err(invalid(format!("MIME type `{mime}` contains invalid characters")));
    }

    Ok(())
}

fn validate_payload(payload: &str) -> Result<()> {
    if payload.is_empty() {
        return Err(invalid("payload cannot be empty"));
    }

    let body = payload.trim_end_matches('=');
    let padding = payload.len() - body.len();
    if padding > 2 {
        return Err(invalid("payload has more than two padding characters"));
    }

    if !body
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
    {
        return Err(invalid("payload is not base64 encoded"));
    }

    Ok(())
}
