//! # Font File Materialization
//!
//! Drives the font-file builder once per group, sequentially and only after
//! grouping has settled, then joins the produced files back to every
//! original font definition. Downstream renderers resolve any [`FontId`]
//! through the returned map and find the shared group name, the shared
//! file, and the font's own canonicalized glyph list in original order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::ConvertError;
use crate::glyph::{FontGlyph, GlyphData};
use crate::merge::FontGroup;
use crate::model::{FontId, FontMetrics};

/// Builds one physical font file from a merged glyph map. The core treats
/// a build as atomic: it either fully succeeds or fails the run.
pub trait FontFileBuilder {
    fn build(
        &self,
        name: &str,
        glyphs: &BTreeMap<char, GlyphData>,
        metrics: &FontMetrics,
        out_dir: &Path,
    ) -> Result<PathBuf, String>;
}

/// A font definition after materialization: the group name and shared file
/// it resolved to, plus its own glyphs in original tag order. Joined to
/// the extracted [`Font`](crate::model::Font) by [`FontId`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFont {
    pub id: FontId,
    /// The assigned group name, shared by every member of the group.
    pub name: String,
    /// The produced font file, shared by every member of the group.
    pub file: PathBuf,
    pub metrics: FontMetrics,
    pub glyphs: Vec<FontGlyph>,
}

/// Build one file per group and map every original font id to its
/// resolved record. Builder failure for any group is fatal to the run.
pub fn materialize(
    groups: &[FontGroup],
    builder: &dyn FontFileBuilder,
    out_dir: &Path,
) -> Result<BTreeMap<FontId, ResolvedFont>, ConvertError> {
    let mut resolved = BTreeMap::new();
    for group in groups {
        let file = builder
            .build(&group.name, &group.glyphs, &group.metrics, out_dir)
            .map_err(|reason| ConvertError::Build {
                group: group.name.clone(),
                reason,
            })?;
        info!(
            "built {} ({} glyphs, {} member font(s))",
            file.display(),
            group.glyphs.len(),
            group.fonts.len()
        );
        for font in &group.fonts {
            resolved.insert(
                font.id,
                ResolvedFont {
                    id: font.id,
                    name: group.name.clone(),
                    file: file.clone(),
                    metrics: font.metrics,
                    glyphs: font.glyphs.clone(),
                },
            );
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Font;

    struct RecordingBuilder;

    impl FontFileBuilder for RecordingBuilder {
        fn build(
            &self,
            name: &str,
            _glyphs: &BTreeMap<char, GlyphData>,
            _metrics: &FontMetrics,
            out_dir: &Path,
        ) -> Result<PathBuf, String> {
            Ok(out_dir.join(format!("{name}.ttf")))
        }
    }

    struct FailingBuilder;

    impl FontFileBuilder for FailingBuilder {
        fn build(
            &self,
            _name: &str,
            _glyphs: &BTreeMap<char, GlyphData>,
            _metrics: &FontMetrics,
            _out_dir: &Path,
        ) -> Result<PathBuf, String> {
            Err("disk full".to_string())
        }
    }

    fn metrics() -> FontMetrics {
        FontMetrics {
            ascent: 800,
            descent: 200,
            scale: 1,
        }
    }

    fn group_with_members(name: &str, tags: &[u16]) -> FontGroup {
        FontGroup {
            name: name.to_string(),
            metrics: metrics(),
            fonts: tags
                .iter()
                .map(|&tag| Font {
                    id: FontId { document: 0, tag },
                    name: name.to_string(),
                    metrics: metrics(),
                    glyphs: vec![],
                })
                .collect(),
            glyphs: BTreeMap::new(),
        }
    }

    #[test]
    fn test_every_member_resolves_to_the_shared_file() {
        let groups = vec![group_with_members("arial", &[1, 2, 3])];
        let resolved =
            materialize(&groups, &RecordingBuilder, Path::new("out")).expect("materialize");
        assert_eq!(resolved.len(), 3);
        for tag in [1u16, 2, 3] {
            let entry = &resolved[&FontId { document: 0, tag }];
            assert_eq!(entry.name, "arial");
            assert_eq!(entry.file, Path::new("out").join("arial.ttf"));
        }
    }

    #[test]
    fn test_builder_failure_is_fatal_with_group_context() {
        let groups = vec![group_with_members("arial", &[1])];
        let err =
            materialize(&groups, &FailingBuilder, Path::new("out")).expect_err("must fail");
        let message = err.to_string();
        assert!(message.contains("arial"), "got {message}");
        assert!(message.contains("disk full"), "got {message}");
    }
}
