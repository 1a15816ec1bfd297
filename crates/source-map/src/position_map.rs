//! Line/column position maps exchanged between pipeline stages.

use crate::LineCol;

/// Where a generated position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginalLocation {
    /// Index into [`PositionMap::sources`].
    pub source: u32,
    /// Position in that source.
    pub position: LineCol,
}

/// One directed edge from a generated position to an original position.
///
/// Mappings without an original location mark generated text that has no
/// counterpart in any source (v3 single-field segments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionMapping {
    pub generated: LineCol,
    pub original: Option<OriginalLocation>,
}

/// The answer to a generated → original lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPosition<'a> {
    /// The source file name.
    pub source: &'a str,
    /// The position in that source.
    pub position: LineCol,
}

/// The map produced by one transformation stage over one input file.
///
/// Mappings are kept sorted by generated position. Sources are interned:
/// adding the same name twice returns the same index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    file: Option<String>,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    mappings: Vec<PositionMapping>,
}

impl PositionMap {
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name of the generated file.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Returns an iterator over all mappings in generated order.
    pub fn mappings(&self) -> impl Iterator<Item = &PositionMapping> {
        self.mappings.iter()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Returns the name of the source at `index`.
    pub fn source(&self, index: u32) -> Option<&str> {
        self.sources.get(index as usize).map(String::as_str)
    }

    /// Returns the embedded content of the source at `index`, if any.
    pub fn source_content(&self, index: u32) -> Option<&str> {
        self.sources_content
            .get(index as usize)
            .and_then(|content| content.as_deref())
    }

    /// Interns a source name and returns its index.
    pub fn add_source(&mut self, name: &str) -> u32 {
        if let Some(index) = self.sources.iter().position(|s| s == name) {
            return index as u32;
        }
        self.sources.push(name.to_string());
        self.sources_content.push(None);
        (self.sources.len() - 1) as u32
    }

    /// Embeds the original text of a source.
    ///
    /// Ignored when `index` does not name a source of this map.
    pub fn set_source_content(&mut self, index: u32, content: impl Into<String>) {
        if let Some(slot) = self.sources_content.get_mut(index as usize) {
            *slot = Some(content.into());
        }
    }

    /// Adds a mapping from `generated` to `original`.
    ///
    /// Mappings may be added in any order; the map stays sorted by generated
    /// position, and mappings at the same generated position keep their
    /// insertion order.
    pub fn add_mapping(&mut self, generated: LineCol, original: Option<OriginalLocation>) {
        let mapping = PositionMapping {
            generated,
            original,
        };

        match self.mappings.last() {
            Some(last) if last.generated > generated => {
                let index = self.mappings.partition_point(|m| m.generated <= generated);
                self.mappings.insert(index, mapping);
            }
            _ => self.mappings.push(mapping),
        }
    }

    /// Convenience for adding a mapping with a known source.
    pub fn add(&mut self, generated: LineCol, source: u32, original: LineCol) {
        self.add_mapping(
            generated,
            Some(OriginalLocation {
                source,
                position: original,
            }),
        );
    }

    /// Finds the original position of a generated position.
    ///
    /// Uses the closest mapping at or before `generated` on the same
    /// generated line. Returns `None` when the line has no such mapping or
    /// the mapping has no source.
    pub fn original_position_for(&self, generated: LineCol) -> Option<ResolvedPosition<'_>> {
        let upper = self.mappings.partition_point(|m| m.generated <= generated);
        let mut index = upper.checked_sub(1)?;

        // Several mappings can share one generated position; the first wins.
        let found = self.mappings[index].generated;
        while index > 0 && self.mappings[index - 1].generated == found {
            index -= 1;
        }

        let mapping = &self.mappings[index];
        if mapping.generated.line != generated.line {
            return None;
        }

        let original = mapping.original?;
        Some(ResolvedPosition {
            source: self.source(original.source)?,
            position: original.position,
        })
    }

    /// Copies the mappings of a section-local map into this map.
    ///
    /// Generated positions of `other` are read relative to `generated_base`
    /// and original positions relative to `original_base`; every sourced
    /// mapping is attributed to `source` of this map.
    pub fn extend_shifted(
        &mut self,
        other: &PositionMap,
        generated_base: LineCol,
        original_base: LineCol,
        source: u32,
    ) {
        for mapping in &other.mappings {
            let original = mapping.original.map(|original| OriginalLocation {
                source,
                position: original.position.relative_to(original_base),
            });
            self.add_mapping(mapping.generated.relative_to(generated_base), original);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lc(line: u32, col: u32) -> LineCol {
        LineCol::new(line, col)
    }

    #[test]
    fn test_lookup_uses_closest_mapping_on_line() {
        let mut map = PositionMap::new();
        let src = map.add_source("App.svelte");
        map.add(lc(0, 0), src, lc(4, 2));
        map.add(lc(0, 10), src, lc(4, 20));
        map.add(lc(2, 3), src, lc(9, 0));

        let found = map.original_position_for(lc(0, 12)).unwrap();
        assert_eq!(found.source, "App.svelte");
        assert_eq!(found.position, lc(4, 20));
        assert_eq!(map.original_position_for(lc(0, 9)).unwrap().position, lc(4, 2));

        // Line 1 has no mapping; line 2 has none before column 3.
        assert!(map.original_position_for(lc(1, 0)).is_none());
        assert!(map.original_position_for(lc(2, 1)).is_none());
    }

    #[test]
    fn test_sourceless_mapping_resolves_to_none() {
        let mut map = PositionMap::new();
        let src = map.add_source("a.js");
        map.add(lc(0, 0), src, lc(0, 0));
        map.add_mapping(lc(0, 5), None);

        assert!(map.original_position_for(lc(0, 7)).is_none());
        assert!(map.original_position_for(lc(0, 3)).is_some());
    }

    #[test]
    fn test_out_of_order_inserts_stay_sorted() {
        let mut map = PositionMap::new();
        let src = map.add_source("a.js");
        map.add(lc(3, 0), src, lc(3, 0));
        map.add(lc(1, 4), src, lc(1, 4));
        map.add(lc(1, 0), src, lc(1, 0));

        let generated: Vec<_> = map.mappings().map(|m| m.generated).collect();
        assert_eq!(generated, vec![lc(1, 0), lc(1, 4), lc(3, 0)]);
    }

    #[test]
    fn test_first_of_equal_positions_wins() {
        let mut map = PositionMap::new();
        let src = map.add_source("a.js");
        map.add(lc(0, 4), src, lc(7, 7));
        map.add(lc(0, 4), src, lc(8, 8));

        assert_eq!(map.original_position_for(lc(0, 4)).unwrap().position, lc(7, 7));
    }

    #[test]
    fn test_sources_are_interned() {
        let mut map = PositionMap::new();
        let a = map.add_source("a.svelte");
        let b = map.add_source("b.svelte");
        assert_eq!(map.add_source("a.svelte"), a);
        assert_ne!(a, b);

        map.set_source_content(b, "<div/>");
        assert_eq!(map.source_content(b), Some("<div/>"));
        assert_eq!(map.source_content(a), None);
        map.set_source_content(9, "ignored");
        assert_eq!(map.sources().len(), 2);
    }

    #[test]
    fn test_extend_shifted_lifts_section_map() {
        let mut section = PositionMap::new();
        let local = section.add_source("script");
        section.add(lc(0, 0), local, lc(0, 0));
        section.add(lc(1, 2), local, lc(1, 0));
        section.add_mapping(lc(2, 0), None);

        let mut document = PositionMap::new();
        let doc = document.add_source("App.svelte");
        document.extend_shifted(&section, lc(5, 8), lc(3, 8), doc);

        let lifted: Vec<_> = document
            .mappings()
            .map(|m| (m.generated, m.original.map(|o| o.position)))
            .collect();
        assert_eq!(
            lifted,
            vec![
                (lc(5, 8), Some(lc(3, 8))),
                (lc(6, 2), Some(lc(4, 0))),
                (lc(7, 0), None),
            ]
        );
    }
}
