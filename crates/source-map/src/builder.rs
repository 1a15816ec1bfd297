//! Span-based map builder for text splicing.
//!
//! Stages that produce their output by splicing text (the reactive rewrite,
//! document preprocessing) append pieces through [`SourceMapBuilder`], which
//! records where every verbatim piece came from. The resulting [`SourceMap`]
//! is converted to a line/column [`PositionMap`] once both texts are known.

use crate::{ByteOffset, LineIndex, PositionMap, Span};
use text_size::TextSize;

/// A single mapping from a generated span to an original span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// The span in the generated output.
    pub generated: Span,
    /// The span in the original source.
    pub original: Span,
}

impl Mapping {
    /// Verbatim copies have equal lengths on both sides.
    fn is_verbatim(&self) -> bool {
        self.generated.len() == self.original.len()
    }
}

/// Byte-span mappings from generated text back to original text.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    /// Sorted by generated position.
    mappings: Vec<Mapping>,
    /// Generated spans with no original counterpart.
    synthetic: Vec<Span>,
}

impl SourceMap {
    pub fn builder() -> SourceMapBuilder {
        SourceMapBuilder::new()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Finds the original offset of a generated offset.
    pub fn original_position(&self, generated: ByteOffset) -> Option<ByteOffset> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.checked_sub(1)?,
        };

        let mapping = self.mappings.get(idx)?;
        if !mapping.generated.contains(generated) {
            return None;
        }

        let offset_in_span = u32::from(generated) - u32::from(mapping.generated.start);
        if mapping.is_verbatim() {
            Some(mapping.original.start + TextSize::from(offset_in_span))
        } else {
            Some(mapping.original.start)
        }
    }

    /// Converts the byte mappings into a line/column map with UTF-16
    /// columns.
    ///
    /// Verbatim pieces get one mapping at every token boundary (identifier
    /// runs, whitespace runs, each punctuation character, each line start),
    /// so later stages that map individual tokens resolve to the exact
    /// original column. Rewritten pieces map from their first byte only.
    /// Synthetic pieces get a source-less mapping so positions inside them
    /// never resolve to a neighbouring piece.
    pub fn to_position_map(&self, generated: &str, original: &str, source: &str) -> PositionMap {
        let generated_index = LineIndex::new(generated);
        let original_index = LineIndex::new(original);

        let mut map = PositionMap::new();
        let source = map.add_source(source);

        for span in &self.synthetic {
            if let Some(start) = generated_index.utf16_line_col(generated, span.start) {
                map.add_mapping(start, None);
            }
        }

        for mapping in &self.mappings {
            let offsets = match mapping.original.slice(original) {
                Some(text) if mapping.is_verbatim() => token_boundaries(text),
                _ => vec![0],
            };

            for offset in offsets {
                let delta = TextSize::from(offset as u32);
                let generated_pos =
                    generated_index.utf16_line_col(generated, mapping.generated.start + delta);
                let original_pos =
                    original_index.utf16_line_col(original, mapping.original.start + delta);
                if let (Some(generated_pos), Some(original_pos)) = (generated_pos, original_pos) {
                    map.add(generated_pos, source, original_pos);
                }
            }
        }

        map
    }
}

/// Accumulates generated text and its mappings.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    code: String,
    mappings: Vec<Mapping>,
    synthetic: Vec<Span>,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generated offset.
    #[inline]
    pub fn generated_offset(&self) -> ByteOffset {
        TextSize::from(self.code.len() as u32)
    }

    /// Returns the text generated so far.
    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Appends text copied unchanged from `original_start` in the original.
    pub fn add_source(&mut self, original_start: ByteOffset, text: &str) {
        if text.is_empty() {
            return;
        }
        let len = TextSize::from(text.len() as u32);
        let generated_start = self.generated_offset();
        self.mappings.push(Mapping {
            generated: Span::new(generated_start, generated_start + len),
            original: Span::new(original_start, original_start + len),
        });
        self.code.push_str(text);
    }

    /// Appends text that has no counterpart in the original.
    pub fn add_generated(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let start = self.generated_offset();
        self.code.push_str(text);
        self.synthetic
            .push(Span::new(start, self.generated_offset()));
    }

    /// Appends text whose mappings are added to the final map separately,
    /// such as a section carrying its own stage map.
    pub fn add_external(&mut self, text: &str) {
        self.code.push_str(text);
    }

    /// Appends text that replaces the `original` span.
    ///
    /// The generated text may differ in length; only its start is mapped.
    pub fn add_transformed(&mut self, original: Span, generated_text: &str) {
        let start = self.generated_offset();
        self.code.push_str(generated_text);
        self.mappings.push(Mapping {
            generated: Span::new(start, self.generated_offset()),
            original,
        });
    }

    /// Returns the generated text and its map.
    pub fn finish(mut self) -> (String, SourceMap) {
        self.mappings.sort_by_key(|m| m.generated.start);
        (
            self.code,
            SourceMap {
                mappings: self.mappings,
                synthetic: self.synthetic,
            },
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Space,
    Punct,
}

fn classify(c: char) -> CharClass {
    if c.is_alphanumeric() || c == '_' || c == '$' || !c.is_ascii() {
        CharClass::Word
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Punct
    }
}

/// Byte offsets in `text` where a new token starts.
fn token_boundaries(text: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut prev: Option<char> = None;

    for (offset, c) in text.char_indices() {
        let starts_token = match prev {
            None => true,
            Some('\n') => true,
            Some(p) => classify(c) != classify(p) || classify(c) == CharClass::Punct,
        };
        if starts_token {
            offsets.push(offset);
        }
        prev = Some(c);
    }

    offsets
}
