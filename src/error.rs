//! Structured error types for the conversion core.
//!
//! Everything fatal identifies the offending document index and font tag.
//! OCR misses and group-name collisions are not errors; they are resolved
//! inline by the canonicalizer and the name assigner.

use thiserror::Error;

/// The unified error type returned by all public fontmill API functions.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A font-definition tag is of a variant the converter cannot
    /// faithfully translate. Fatal to the run: skipping it would silently
    /// drop a font the document's text depends on.
    #[error("document {document}: font tag {tag} is an unsupported variant ({kind})")]
    UnsupportedTag {
        document: usize,
        tag: u16,
        kind: String,
    },

    /// A font tag declares kerning data. Fatal rather than skipped, since
    /// ignoring kerning would silently corrupt text layout.
    #[error("document {document}: font tag {tag} declares kerning data, which is unsupported")]
    KerningUnsupported { document: usize, tag: u16 },

    /// The external font-file builder failed for one group.
    #[error("failed to build font file for group \"{group}\": {reason}")]
    Build { group: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON input failed to parse as a valid document.
    #[error("failed to parse document: {source}{hint}")]
    Parse {
        source: serde_json::Error,
        hint: String,
    },
}

impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "\n  Hint: check for trailing commas, missing quotes, or unescaped characters."
            }
            serde_json::error::Category::Data => {
                "\n  Hint: the JSON is valid but doesn't match the document schema. Check field names and types."
            }
            serde_json::error::Category::Eof => {
                "\n  Hint: unexpected end of input — is the JSON truncated?"
            }
            serde_json::error::Category::Io => "",
        };
        ConvertError::Parse {
            source: e,
            hint: hint.to_string(),
        }
    }
}
