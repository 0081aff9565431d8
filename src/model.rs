//! # Boundary Model
//!
//! The input representation for the conversion core. An external container
//! parser turns each legacy vector-graphics file into a [`Document`]: an
//! ordered list of typed font-definition tags whose glyph shapes have
//! already been decoded into outline commands. The types here are plain
//! serde data so fixtures and host applications can exchange them as JSON.
//!
//! Tag variants form a closed set, matched exhaustively by the extractor.
//! A variant the converter cannot faithfully translate is represented
//! explicitly as [`FontTag::Unsupported`] rather than dropped by the parser,
//! so the failure carries the offending tag id.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::glyph::{FontGlyph, OutlineCommand};

/// One parsed source document: the font-definition tags it embeds, in
/// document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub fonts: Vec<FontTag>,
}

impl Document {
    /// Parse a document from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        let document = serde_json::from_str(json)?;
        Ok(document)
    }
}

/// A font-definition tag embedded in a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FontTag {
    /// Outline font at the base em resolution.
    Outline(OutlineFontTag),
    /// Outline font defined at 20x em resolution for higher precision.
    /// Identical layout to [`FontTag::Outline`]; only the geometric scale
    /// of the coordinates differs.
    HighResOutline(OutlineFontTag),
    /// A tag variant the converter cannot faithfully translate. Extraction
    /// fails the whole run when it meets one.
    Unsupported { tag: u16, kind: String },
}

/// Body of a supported outline-font tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineFontTag {
    /// In-document tag identifier.
    pub tag: u16,
    /// Declared font name. May be empty, and may repeat across documents.
    #[serde(default)]
    pub name: String,
    pub ascent: i32,
    pub descent: i32,
    /// Kerning pairs declared by the tag. Translation of kerning is
    /// unsupported; a non-empty list is fatal at extraction.
    #[serde(default)]
    pub kerning: Vec<KerningRecord>,
    /// Decoded glyph entries, in tag order.
    #[serde(default)]
    pub glyphs: Vec<GlyphEntry>,
}

/// A kerning adjustment between two character codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KerningRecord {
    pub left: u32,
    pub right: u32,
    pub adjust: i32,
}

/// One (code, shape) pair from a font tag, with the shape already decoded
/// by the external shape parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphEntry {
    /// The character code the tag declares for this glyph. Legacy documents
    /// routinely declare control codes, duplicates, or other noise here;
    /// canonicalization rewrites those.
    pub code: u32,
    pub advance: u16,
    #[serde(default)]
    pub outline: Vec<OutlineCommand>,
}

/// Globally unique key for a raw font definition. Never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct FontId {
    /// Index of the source document in the conversion run.
    pub document: usize,
    /// In-document tag identifier.
    pub tag: u16,
}

/// Vertical metrics and em resolution of a font. Two fonts must compare
/// equal here, exactly, to be merge-compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the em, in font units.
    pub ascent: i32,
    /// Distance from the baseline to the bottom of the em, as a positive
    /// magnitude (legacy tag convention).
    pub descent: i32,
    /// Integer em-resolution multiplier: 1 for base-resolution tags,
    /// 20 for high-resolution tags. Units per em = 1024 x scale.
    pub scale: u16,
}

/// A font as extracted from one tag: canonicalized glyphs in tag order.
/// Immutable after extraction — the name and output file a font ends up
/// with live on the [`ResolvedFont`](crate::materialize::ResolvedFont)
/// record produced by materialization, joined back by [`FontId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    pub id: FontId,
    pub name: String,
    pub metrics: FontMetrics,
    pub glyphs: Vec<FontGlyph>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_from_json() {
        let json = r#"{
            "fonts": [
                {
                    "type": "outline",
                    "tag": 3,
                    "name": "Arial",
                    "ascent": 800,
                    "descent": 200,
                    "glyphs": [
                        {
                            "code": 65,
                            "advance": 500,
                            "outline": [
                                { "type": "moveTo", "x": 0, "y": 0 },
                                { "type": "lineTo", "x": 100, "y": 200 }
                            ]
                        }
                    ]
                }
            ]
        }"#;
        let doc = Document::from_json(json).expect("valid document");
        assert_eq!(doc.fonts.len(), 1);
        match &doc.fonts[0] {
            FontTag::Outline(tag) => {
                assert_eq!(tag.name, "Arial");
                assert_eq!(tag.glyphs[0].code, 65);
                assert_eq!(tag.glyphs[0].outline.len(), 2);
            }
            other => panic!("expected outline tag, got {other:?}"),
        }
    }

    #[test]
    fn test_document_from_json_reports_bad_input() {
        let err = Document::from_json("{ not json").expect_err("must fail");
        let message = err.to_string();
        assert!(
            message.contains("parse"),
            "error should mention parsing: {message}"
        );
    }

    #[test]
    fn test_unsupported_tag_round_trip() {
        let tag = FontTag::Unsupported {
            tag: 9,
            kind: "bitmap".to_string(),
        };
        let json = serde_json::to_string(&tag).expect("serialize");
        assert!(json.contains("\"type\":\"unsupported\""), "got {json}");
    }
}
