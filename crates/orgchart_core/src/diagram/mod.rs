//! Org chart diagram generation.
//!
//! # Responsibility
//! - Position a materialized department tree on a shape-sized canvas.
//! - Serialize the layout as SVG and encode it for storage/transport.
//!
//! # Invariants
//! - Canvas is `max_fanout * 350` wide and `levels * 130` tall with the
//!   default style.
//! - Stored diagrams are standard base64 of UTF-8 SVG text.

pub mod layout;
pub mod style;
pub mod svg;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stored diagram could not be decoded back into SVG text.
#[derive(Debug)]
pub enum DiagramDecodeError {
    Base64(base64::DecodeError),
    Utf8(std::string::FromUtf8Error),
}

impl Display for DiagramDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base64(err) => write!(f, "stored diagram is not valid base64: {err}"),
            Self::Utf8(err) => write!(f, "stored diagram is not valid UTF-8: {err}"),
        }
    }
}

impl Error for DiagramDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Base64(err) => Some(err),
            Self::Utf8(err) => Some(err),
        }
    }
}

/// Encodes an SVG document for the `rendered_diagram` field.
pub fn encode_document(svg: &str) -> String {
    STANDARD.encode(svg.as_bytes())
}

/// Decodes a stored `rendered_diagram` back into SVG text.
pub fn decode_document(encoded: &str) -> Result<String, DiagramDecodeError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(DiagramDecodeError::Base64)?;
    String::from_utf8(bytes).map_err(DiagramDecodeError::Utf8)
}
