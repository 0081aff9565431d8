//! # Font Extraction
//!
//! Walks one document's font-definition tags and produces one [`Font`] per
//! supported tag, feeding every glyph through the run-scoped
//! [`GlyphResolver`](crate::canonical::GlyphResolver) in tag order.
//!
//! Unsupported tag variants and tags that declare kerning fail the whole
//! run. Both would otherwise silently degrade text fidelity, which this
//! pipeline never does.

use std::collections::HashSet;

use log::debug;

use crate::canonical::{GlyphRecognizer, GlyphResolver};
use crate::error::ConvertError;
use crate::glyph::GlyphData;
use crate::model::{Document, Font, FontId, FontMetrics, FontTag, OutlineFontTag};

/// Extract every font a document defines.
pub fn extract_fonts(
    document: &Document,
    document_index: usize,
    resolver: &mut GlyphResolver,
    ocr: Option<&dyn GlyphRecognizer>,
) -> Result<Vec<Font>, ConvertError> {
    let mut fonts = Vec::with_capacity(document.fonts.len());
    for tag in &document.fonts {
        let (outline, scale) = match tag {
            FontTag::Outline(outline) => (outline, 1),
            FontTag::HighResOutline(outline) => (outline, 20),
            FontTag::Unsupported { tag, kind } => {
                return Err(ConvertError::UnsupportedTag {
                    document: document_index,
                    tag: *tag,
                    kind: kind.clone(),
                });
            }
        };
        fonts.push(extract_font(outline, scale, document_index, resolver, ocr)?);
    }
    debug!(
        "document {document_index}: extracted {} font(s)",
        fonts.len()
    );
    Ok(fonts)
}

fn extract_font(
    tag: &OutlineFontTag,
    scale: u16,
    document_index: usize,
    resolver: &mut GlyphResolver,
    ocr: Option<&dyn GlyphRecognizer>,
) -> Result<Font, ConvertError> {
    if !tag.kerning.is_empty() {
        return Err(ConvertError::KerningUnsupported {
            document: document_index,
            tag: tag.tag,
        });
    }

    // The used set must grow as the font is built: an earlier glyph can
    // force a later duplicate into reassignment.
    let mut used: HashSet<char> = HashSet::new();
    let mut glyphs = Vec::with_capacity(tag.glyphs.len());
    for entry in &tag.glyphs {
        let raw = GlyphData::new(entry.advance, entry.outline.clone());
        let glyph = resolver.resolve(raw, entry.code, &used, ocr);
        // Only the canonical whitespace glyph can come back with a
        // character that is already taken; repeated whitespace entries
        // collapse to the single existing one.
        if used.insert(glyph.character) {
            glyphs.push(glyph);
        }
    }

    Ok(Font {
        id: FontId {
            document: document_index,
            tag: tag.tag,
        },
        name: tag.name.clone(),
        metrics: FontMetrics {
            ascent: tag.ascent,
            descent: tag.descent,
            scale,
        },
        glyphs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::OutlineCommand;
    use crate::model::{GlyphEntry, KerningRecord};

    fn entry(code: u32, seed: i32) -> GlyphEntry {
        GlyphEntry {
            code,
            advance: 500,
            outline: vec![
                OutlineCommand::MoveTo { x: 0, y: 0 },
                OutlineCommand::LineTo { x: seed, y: seed },
            ],
        }
    }

    fn outline_tag(tag: u16, name: &str, glyphs: Vec<GlyphEntry>) -> OutlineFontTag {
        OutlineFontTag {
            tag,
            name: name.to_string(),
            ascent: 800,
            descent: 200,
            kerning: vec![],
            glyphs,
        }
    }

    #[test]
    fn test_extract_supported_variants() {
        let document = Document {
            fonts: vec![
                FontTag::Outline(outline_tag(1, "Arial", vec![entry('A' as u32, 1)])),
                FontTag::HighResOutline(outline_tag(2, "Arial", vec![entry('B' as u32, 2)])),
            ],
        };
        let mut resolver = GlyphResolver::new();
        let fonts = extract_fonts(&document, 0, &mut resolver, None).expect("extract");
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[0].metrics.scale, 1);
        assert_eq!(fonts[1].metrics.scale, 20);
        assert_eq!(fonts[0].id, FontId { document: 0, tag: 1 });
    }

    #[test]
    fn test_unsupported_variant_fails_the_run() {
        let document = Document {
            fonts: vec![FontTag::Unsupported {
                tag: 7,
                kind: "bitmap".to_string(),
            }],
        };
        let mut resolver = GlyphResolver::new();
        let err = extract_fonts(&document, 2, &mut resolver, None).expect_err("must fail");
        match err {
            ConvertError::UnsupportedTag { document, tag, .. } => {
                assert_eq!(document, 2);
                assert_eq!(tag, 7);
            }
            other => panic!("wrong error: {other}"),
        }
    }

    #[test]
    fn test_kerning_is_fatal() {
        let mut tag = outline_tag(3, "Arial", vec![entry('A' as u32, 1)]);
        tag.kerning.push(KerningRecord {
            left: 'A' as u32,
            right: 'V' as u32,
            adjust: -40,
        });
        let document = Document {
            fonts: vec![FontTag::Outline(tag)],
        };
        let mut resolver = GlyphResolver::new();
        let err = extract_fonts(&document, 0, &mut resolver, None).expect_err("must fail");
        assert!(matches!(
            err,
            ConvertError::KerningUnsupported { document: 0, tag: 3 }
        ));
    }

    #[test]
    fn test_codes_unique_within_a_font() {
        // Two glyphs declared at the same code: the second is reassigned.
        let document = Document {
            fonts: vec![FontTag::Outline(outline_tag(
                1,
                "",
                vec![entry('A' as u32, 1), entry('A' as u32, 2)],
            ))],
        };
        let mut resolver = GlyphResolver::new();
        let fonts = extract_fonts(&document, 0, &mut resolver, None).expect("extract");
        let font = &fonts[0];
        assert_eq!(font.glyphs.len(), 2);
        assert_ne!(font.glyphs[0].character, font.glyphs[1].character);
    }

    #[test]
    fn test_repeated_whitespace_entries_collapse() {
        let ws = |code| GlyphEntry {
            code,
            advance: 333,
            outline: vec![],
        };
        let document = Document {
            fonts: vec![FontTag::Outline(outline_tag(
                1,
                "",
                vec![ws(0x20), ws(0xA0), entry('A' as u32, 1)],
            ))],
        };
        let mut resolver = GlyphResolver::new();
        let fonts = extract_fonts(&document, 0, &mut resolver, None).expect("extract");
        let font = &fonts[0];
        assert_eq!(font.glyphs.len(), 2, "both whitespace entries become one");
        assert_eq!(font.glyphs[0].character, ' ');
        assert_eq!(font.glyphs[0].data, GlyphData::whitespace());
    }
}
