//! # Glyph Canonicalization
//!
//! Legacy documents attach glyph outlines to character codes that cannot
//! survive the trip into a real font file: control characters, codes from
//! the Unicode Specials block, whitespace codes carrying visible geometry,
//! or plain duplicates within one font. The resolver rewrites those codes.
//!
//! The key property is run-scoped shape memory: once a shape has been
//! reassigned to a character, every later occurrence of the identical shape
//! (in any font, in any document of the run) prefers that same character.
//! Fonts that share shapes therefore end up sharing codes, which is what
//! makes them mergeable later.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::glyph::{FontGlyph, GlyphData};

/// First code of the Unicode private use area, used for fallback
/// assignment. Nothing plausible in a source document collides with it.
pub const PRIVATE_USE_START: u32 = 0xE000;

/// Recognizes a glyph shape as a character. Implemented by an external OCR
/// service; a `None` result means "unrecognized" and is not an error.
pub trait GlyphRecognizer {
    fn recognize(&self, glyph: &GlyphData) -> Option<char>;
}

/// Run-scoped canonicalization state: the shape-to-character table and the
/// private-use allocation counter. Create one per conversion run; reusing a
/// resolver across runs would leak assignments between unrelated inputs.
#[derive(Debug)]
pub struct GlyphResolver {
    assigned: HashMap<GlyphData, char>,
    next_private: u32,
}

impl Default for GlyphResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphResolver {
    pub fn new() -> Self {
        Self {
            assigned: HashMap::new(),
            next_private: PRIVATE_USE_START,
        }
    }

    /// Resolve one raw glyph to its final `(character, shape)` pair.
    ///
    /// `used` is the set of characters already assigned within the font
    /// under construction; it must grow glyph by glyph, since an earlier
    /// glyph can force a later duplicate into reassignment. Infallible:
    /// some character is always found.
    pub fn resolve(
        &mut self,
        raw: GlyphData,
        original_code: u32,
        used: &HashSet<char>,
        ocr: Option<&dyn GlyphRecognizer>,
    ) -> FontGlyph {
        // All whitespace glyphs collapse to one canonical space, whatever
        // code or advance width the document declared.
        if raw.is_whitespace() {
            return FontGlyph {
                character: ' ',
                data: GlyphData::whitespace(),
            };
        }

        if let Some(character) = usable_original(original_code, used) {
            return FontGlyph {
                character,
                data: raw,
            };
        }

        let character = self.reassign(&raw, used, ocr);
        debug!("reassigned glyph code {original_code:#06x} to {character:?}");
        FontGlyph {
            character,
            data: raw,
        }
    }

    /// Pick a replacement character: a previous assignment of the same
    /// shape if one is free, else OCR, else the next private-use code.
    /// Only the latter two write the table; reuse leaves it untouched.
    fn reassign(
        &mut self,
        raw: &GlyphData,
        used: &HashSet<char>,
        ocr: Option<&dyn GlyphRecognizer>,
    ) -> char {
        if let Some(&character) = self.assigned.get(raw) {
            if !used.contains(&character) {
                return character;
            }
        }

        if let Some(ocr) = ocr {
            if let Some(character) = ocr.recognize(raw) {
                if !used.contains(&character) {
                    self.assigned.insert(raw.clone(), character);
                    return character;
                }
            }
        }

        let character = self.allocate_private(used);
        self.assigned.insert(raw.clone(), character);
        character
    }

    fn allocate_private(&mut self, used: &HashSet<char>) -> char {
        loop {
            let code = self.next_private;
            self.next_private += 1;
            match char::from_u32(code) {
                Some(character) if !used.contains(&character) => return character,
                _ => continue,
            }
        }
    }
}

/// The original code survives only if it is a valid, printable, non-control
/// character outside the Specials block that isn't taken yet. A whitespace
/// character code attached to non-whitespace geometry is encoding noise and
/// gets rewritten too.
fn usable_original(code: u32, used: &HashSet<char>) -> Option<char> {
    if code <= 0x1F || (0xFFF0..=0xFFFF).contains(&code) {
        return None;
    }
    let character = char::from_u32(code)?;
    if character.is_whitespace() || used.contains(&character) {
        return None;
    }
    Some(character)
}
