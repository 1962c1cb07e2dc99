use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Default start marker.
pub const DEFAULT_PREFIX: &[u8] = b"<";

/// Default end marker.
pub const DEFAULT_SUFFIX: &[u8] = b">";

/// Fixed marker bytes wrapping every payload on the radio link.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────────────────────────┬──────────┐
/// │ Prefix   │ Comma-separated text         │ Suffix   │
/// │ "<"      │ "3171,12:00:00,1,F,..."      │ ">"      │
/// └──────────┴──────────────────────────────┴──────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    prefix: Bytes,
    suffix: Bytes,
}

impl Envelope {
    /// Create an envelope with explicit markers.
    pub fn new(prefix: &[u8], suffix: &[u8]) -> Result<Self> {
        if prefix.is_empty() || suffix.is_empty() {
            return Err(FrameError::InvalidEnvelope(
                "prefix and suffix must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            prefix: Bytes::copy_from_slice(prefix),
            suffix: Bytes::copy_from_slice(suffix),
        })
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn suffix(&self) -> &[u8] {
        &self.suffix
    }

    /// Combined width of both markers.
    pub fn width(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }

    /// Last byte of the suffix; the stream splitter's terminator.
    pub fn terminator(&self) -> u8 {
        self.suffix[self.suffix.len() - 1]
    }

    /// Strip the envelope and return the inner field string.
    ///
    /// A single trailing `\n` or `\r\n` after the suffix is tolerated.
    pub fn decode<'a>(&self, raw: &'a [u8]) -> Result<&'a str> {
        let raw = if raw.ends_with(&self.suffix) {
            raw
        } else {
            strip_line_ending(raw)
        };
        if raw.len() < self.width() {
            return Err(FrameError::TooShort {
                len: raw.len(),
                min: self.width(),
            });
        }
        if !raw.starts_with(&self.prefix) {
            return Err(FrameError::MissingStartMarker);
        }
        if !raw.ends_with(&self.suffix) {
            return Err(FrameError::MissingEndMarker);
        }

        let body = &raw[self.prefix.len()..raw.len() - self.suffix.len()];
        Ok(std::str::from_utf8(body)?)
    }

    /// Wrap `payload` in the envelope and append it to `dst`.
    pub fn encode(&self, payload: &str, dst: &mut BytesMut) -> Result<()> {
        if payload.trim().is_empty() {
            return Err(FrameError::EmptyPayload);
        }
        dst.reserve(self.width() + payload.len());
        dst.put_slice(&self.prefix);
        dst.put_slice(payload.as_bytes());
        dst.put_slice(&self.suffix);
        Ok(())
    }

    /// Wrap `payload` in the envelope as a standalone buffer.
    pub fn encode_to_bytes(&self, payload: &str) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.encode(payload, &mut buf)?;
        Ok(buf.freeze())
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            prefix: Bytes::from_static(DEFAULT_PREFIX),
            suffix: Bytes::from_static(DEFAULT_SUFFIX),
        }
    }
}

fn strip_line_ending(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

/// Decode a frame using the default `<`/`>` envelope.
pub fn decode_frame(raw: &[u8]) -> Result<&str> {
    Envelope::default().decode(raw)
}

/// Encode a frame using the default `<`/`>` envelope.
pub fn encode_frame(payload: &str, dst: &mut BytesMut) -> Result<()> {
    Envelope::default().encode(payload, dst)
}
