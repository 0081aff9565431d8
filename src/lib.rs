//! # Fontmill
//!
//! Converts fonts embedded in legacy vector-graphics documents into a
//! minimal set of merged, deduplicated TrueType files.
//!
//! Every input document carries its own, usually subsetted, embedded fonts.
//! Emitting one output font per input font bloats the result by orders of
//! magnitude once many documents share the same underlying typeface.
//! Fontmill instead decides which definitions represent *the same* font,
//! merges them into the smallest possible number of groups, gives every
//! glyph a stable collision-free character code, and builds one font file
//! per group.
//!
//! ## Pipeline
//!
//! ```text
//! Input (parsed documents)
//!       ↓
//!   [extract]     — one Font per supported tag, glyphs canonicalized
//!       ↓
//!   [merge]       — two-phase fixpoint grouping into FontGroups
//!       ↓
//!   [naming]      — unique filesystem-safe group identifiers
//!       ↓
//!   [materialize] — one font file per group, FontId → ResolvedFont map
//! ```
//!
//! Container parsing, OCR glyph recognition and rendering are external
//! collaborators; they meet the core at the traits and types in [`model`],
//! [`canonical`] and [`materialize`]. The [`ttf`] module ships a concrete
//! [`materialize::FontFileBuilder`].

pub mod canonical;
pub mod error;
pub mod extract;
pub mod glyph;
pub mod materialize;
pub mod merge;
pub mod model;
pub mod naming;
pub mod ttf;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use canonical::{GlyphRecognizer, GlyphResolver};
use error::ConvertError;
use materialize::{FontFileBuilder, ResolvedFont};
use merge::FontGroup;
use model::{Document, FontId};

/// Conversion switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Merge compatible fonts into shared groups. Disabling this returns
    /// one group per input font, unmerged and in input order.
    #[serde(default = "default_true")]
    pub group_fonts: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { group_fonts: true }
    }
}

fn default_true() -> bool {
    true
}

/// The result of one conversion run.
#[derive(Debug)]
pub struct Conversion {
    /// Surviving groups, named, one output file each.
    pub groups: Vec<FontGroup>,
    /// Every original font definition, resolved to its group's name and
    /// shared file. Keys cover every font of every input document.
    pub fonts: BTreeMap<FontId, ResolvedFont>,
}

/// Convert the embedded fonts of a set of documents.
///
/// This is the primary entry point. Canonicalization state is created
/// fresh per call: repeated runs over identical input produce identical
/// groups, names and code assignments.
pub fn convert(
    documents: &[Document],
    options: &ConvertOptions,
    ocr: Option<&dyn GlyphRecognizer>,
    builder: &dyn FontFileBuilder,
    out_dir: &Path,
) -> Result<Conversion, ConvertError> {
    let mut resolver = GlyphResolver::new();
    let mut fonts = Vec::new();
    for (index, document) in documents.iter().enumerate() {
        fonts.extend(extract::extract_fonts(document, index, &mut resolver, ocr)?);
    }

    let mut groups = merge::group_fonts(fonts, options.group_fonts);
    naming::assign_names(&mut groups);
    let fonts = materialize::materialize(&groups, builder, out_dir)?;

    Ok(Conversion { groups, fonts })
}
