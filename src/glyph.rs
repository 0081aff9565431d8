//! # Glyph Values
//!
//! The value types everything else keys on. A glyph is an advance width plus
//! an ordered list of outline commands; two glyphs are "the same" exactly
//! when those compare equal, which is what lets identical shapes embedded in
//! unrelated documents collapse onto one character and one output file.
//!
//! Geometry is otherwise opaque to the conversion core — only the TrueType
//! builder ever interprets the commands.

use serde::{Deserialize, Serialize};

/// Em square of a base-resolution embedded font, in font units.
pub const EM_SQUARE: u16 = 1024;

/// Advance width of the canonical whitespace glyph (half an em).
pub const WHITESPACE_ADVANCE: u16 = EM_SQUARE / 2;

/// One outline path command, in integer font units with y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutlineCommand {
    MoveTo { x: i32, y: i32 },
    LineTo { x: i32, y: i32 },
    /// Quadratic curve to (x, y) with control point (cx, cy).
    QuadTo { cx: i32, cy: i32, x: i32, y: i32 },
}

/// One glyph shape: advance width plus outline. Structural equality and the
/// derived hash make this usable as a deduplication key; instances are never
/// modified after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlyphData {
    pub advance: u16,
    pub commands: Vec<OutlineCommand>,
}

impl GlyphData {
    pub fn new(advance: u16, commands: Vec<OutlineCommand>) -> Self {
        Self { advance, commands }
    }

    /// The canonical whitespace glyph: no geometry, fixed advance.
    pub fn whitespace() -> Self {
        Self {
            advance: WHITESPACE_ADVANCE,
            commands: Vec::new(),
        }
    }

    /// A glyph with no geometry is a whitespace glyph, whatever advance
    /// width the source document gave it.
    pub fn is_whitespace(&self) -> bool {
        self.commands.is_empty()
    }
}

/// A glyph bound to its final character code within one font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontGlyph {
    pub character: char,
    pub data: GlyphData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_whitespace_detection_ignores_advance() {
        let wide = GlyphData::new(900, vec![]);
        assert!(wide.is_whitespace());
        assert!(GlyphData::whitespace().is_whitespace());
        let shaped = GlyphData::new(0, vec![OutlineCommand::MoveTo { x: 0, y: 0 }]);
        assert!(!shaped.is_whitespace());
    }

    #[test]
    fn test_glyph_data_is_a_usable_map_key() {
        let a = GlyphData::new(
            500,
            vec![
                OutlineCommand::MoveTo { x: 0, y: 0 },
                OutlineCommand::LineTo { x: 100, y: 0 },
            ],
        );
        let b = a.clone();
        let mut map = HashMap::new();
        map.insert(a, 'x');
        assert_eq!(map.get(&b), Some(&'x'));
    }

    #[test]
    fn test_outline_command_json_shape() {
        let cmd = OutlineCommand::QuadTo {
            cx: 1,
            cy: 2,
            x: 3,
            y: 4,
        };
        let json = serde_json::to_string(&cmd).expect("serialize");
        assert!(json.contains("\"type\":\"quadTo\""), "got {json}");
    }
}
