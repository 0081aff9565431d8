//! # Group Name Assignment
//!
//! Gives every surviving group a unique, filesystem-safe identifier.
//! Groups are processed in working-list order, which is deterministic, so
//! repeated runs over identical input produce identical names.

use std::collections::HashSet;

use crate::merge::FontGroup;

/// Assign a unique identifier to each group, in place.
///
/// The base identifier is the declared name with spaces replaced and case
/// folded; an empty name gets a generated `font-<n>` token. Collisions are
/// resolved by appending `-2`, `-3`, ... until free.
pub fn assign_names(groups: &mut [FontGroup]) {
    let mut taken: HashSet<String> = HashSet::new();
    let mut anonymous = 0usize;

    for group in groups.iter_mut() {
        let base = match sanitize(&group.name) {
            base if base.is_empty() => {
                anonymous += 1;
                format!("font-{anonymous}")
            }
            base => base,
        };

        let mut candidate = base.clone();
        let mut suffix = 2usize;
        while !taken.insert(candidate.clone()) {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        group.name = candidate;
    }
}

fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == ' ' { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::model::{Font, FontId, FontMetrics};

    fn group(name: &str) -> FontGroup {
        FontGroup {
            name: name.to_string(),
            metrics: FontMetrics {
                ascent: 800,
                descent: 200,
                scale: 1,
            },
            fonts: vec![Font {
                id: FontId { document: 0, tag: 0 },
                name: name.to_string(),
                metrics: FontMetrics {
                    ascent: 800,
                    descent: 200,
                    scale: 1,
                },
                glyphs: vec![],
            }],
            glyphs: BTreeMap::new(),
        }
    }

    #[test]
    fn test_spaces_replaced_and_case_folded() {
        let mut groups = vec![group("Times New Roman")];
        assign_names(&mut groups);
        assert_eq!(groups[0].name, "times-new-roman");
    }

    #[test]
    fn test_collisions_get_numeric_suffixes() {
        let mut groups = vec![group("Arial"), group("arial"), group("ARIAL")];
        assign_names(&mut groups);
        assert_eq!(groups[0].name, "arial");
        assert_eq!(groups[1].name, "arial-2");
        assert_eq!(groups[2].name, "arial-3");
    }

    #[test]
    fn test_empty_names_get_generated_tokens() {
        let mut groups = vec![group(""), group("   "), group("Arial")];
        assign_names(&mut groups);
        assert_eq!(groups[0].name, "font-1");
        assert_eq!(groups[1].name, "font-2");
        assert_eq!(groups[2].name, "arial");
    }

    #[test]
    fn test_generated_token_colliding_with_declared_name() {
        let mut groups = vec![group("font-1"), group("")];
        assign_names(&mut groups);
        assert_eq!(groups[0].name, "font-1");
        assert_eq!(groups[1].name, "font-1-2");
    }
}
