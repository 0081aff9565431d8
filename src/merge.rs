//! # Font Grouping
//!
//! Clusters extracted fonts into the smallest number of groups that can
//! safely share one output file. Grouping runs in two phases:
//!
//! - **Phase A** buckets fonts by declared name and merges each bucket on
//!   its own, demanding at least one shared, identical, non-whitespace
//!   glyph as evidence that two definitions really are the same face.
//! - **Phase B** pools every Phase A survivor and merges again without the
//!   shared-glyph requirement, catching fonts with different declared
//!   names but compatible content.
//!
//! Within a phase, each pass is first-fit over the accepted list, and
//! passes repeat until the group count stops shrinking. One pass is not
//! enough: merging A into B can newly make the result compatible with C.

use std::collections::BTreeMap;

use log::debug;

use crate::glyph::GlyphData;
use crate::model::{Font, FontMetrics};

/// The unit of output: one physical font file shared by one or more
/// original font definitions. The glyph map is the union of the members'
/// glyphs; the map key always equals the glyph's character.
#[derive(Debug, Clone)]
pub struct FontGroup {
    pub name: String,
    pub metrics: FontMetrics,
    pub fonts: Vec<Font>,
    pub glyphs: BTreeMap<char, GlyphData>,
}

impl FontGroup {
    pub fn from_font(font: Font) -> Self {
        let mut glyphs = BTreeMap::new();
        for glyph in &font.glyphs {
            glyphs.insert(glyph.character, glyph.data.clone());
        }
        Self {
            name: font.name.clone(),
            metrics: font.metrics,
            fonts: vec![font],
            glyphs,
        }
    }

    /// Derived status: every glyph in the map is the whitespace glyph.
    /// Such a group carries no distinguishing shape at all.
    pub fn is_all_whitespace(&self) -> bool {
        self.glyphs.values().all(GlyphData::is_whitespace)
    }

    /// Union the other group into this one. Callers must have checked
    /// compatibility first; colliding keys already hold equal data, so
    /// existing entries are never overwritten.
    fn absorb(&mut self, other: FontGroup) {
        for (character, data) in other.glyphs {
            self.glyphs.entry(character).or_insert(data);
        }
        self.fonts.extend(other.fonts);
    }
}

/// Cluster fonts into groups. With grouping disabled the input comes back
/// unmerged, one group per font, in input order.
pub fn group_fonts(fonts: Vec<Font>, grouping_enabled: bool) -> Vec<FontGroup> {
    let groups: Vec<FontGroup> = fonts.into_iter().map(FontGroup::from_font).collect();
    if !grouping_enabled {
        return groups;
    }

    let mut pooled = Vec::new();
    for bucket in bucket_by_name(groups) {
        pooled.extend(merge_until_stable(bucket, true));
    }
    merge_until_stable(pooled, false)
}

/// Bucket groups by declared name (the empty name is its own bucket),
/// keeping first-encounter order for determinism.
fn bucket_by_name(groups: Vec<FontGroup>) -> Vec<Vec<FontGroup>> {
    let mut buckets: Vec<(String, Vec<FontGroup>)> = Vec::new();
    for group in groups {
        match buckets.iter_mut().find(|(name, _)| *name == group.name) {
            Some((_, bucket)) => bucket.push(group),
            None => buckets.push((group.name.clone(), vec![group])),
        }
    }
    buckets.into_iter().map(|(_, bucket)| bucket).collect()
}

/// Repeat first-fit merge passes until a fixpoint. Terminates: the count
/// is non-increasing and bounded below by 1.
fn merge_until_stable(mut groups: Vec<FontGroup>, require_common: bool) -> Vec<FontGroup> {
    loop {
        let before = groups.len();
        groups = merge_pass(groups, require_common);
        debug!(
            "merge pass (require_common={require_common}): {before} -> {} group(s)",
            groups.len()
        );
        if groups.len() == before {
            return groups;
        }
    }
}

/// One pass: each group merges into the first compatible accepted group,
/// or becomes a new accepted group.
fn merge_pass(groups: Vec<FontGroup>, require_common: bool) -> Vec<FontGroup> {
    let mut accepted: Vec<FontGroup> = Vec::new();
    for group in groups {
        match accepted
            .iter_mut()
            .find(|candidate| compatible(candidate, &group, require_common))
        {
            Some(target) => target.absorb(group),
            None => accepted.push(group),
        }
    }
    accepted
}

/// Structural compatibility of two groups.
///
/// A shared character with differing shapes is a hard rejection, whatever
/// else matches. Otherwise the groups are compatible if a shared identical
/// non-whitespace glyph was found, or if `require_common` is false (no
/// overlap counts as insufficient evidence against).
fn compatible(a: &FontGroup, b: &FontGroup, require_common: bool) -> bool {
    // Probe with the smaller glyph map. Pure optimization.
    let (probe, other) = if a.glyphs.len() <= b.glyphs.len() {
        (a, b)
    } else {
        (b, a)
    };

    if probe.is_all_whitespace() || other.is_all_whitespace() {
        return true;
    }
    if probe.metrics != other.metrics {
        return false;
    }

    let mut common = false;
    for (character, data) in &probe.glyphs {
        if let Some(existing) = other.glyphs.get(character) {
            if existing != data {
                return false;
            }
            if !data.is_whitespace() {
                common = true;
            }
        }
    }
    common || !require_common
}
