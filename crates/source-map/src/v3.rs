//! v3 source map JSON encoding and decoding.
//!
//! Downstream tools exchange maps as v3 JSON. The heavy lifting (VLQ
//! segments, source and name tables) is done by the `sourcemap` crate; this
//! module converts between its token stream and [`PositionMap`].

use crate::{LineCol, PositionMap};
use sourcemap::{SourceMap as RawSourceMap, SourceMapBuilder as RawSourceMapBuilder};
use thiserror::Error;

/// Errors from reading or writing v3 JSON.
#[derive(Debug, Error)]
pub enum MapDecodeError {
    /// The input is not a valid (non-indexed) v3 source map.
    #[error("invalid source map: {0}")]
    Invalid(#[from] sourcemap::Error),

    /// The encoder produced bytes that are not UTF-8.
    #[error("source map output is not valid UTF-8")]
    NotUtf8,
}

impl PositionMap {
    /// Decodes a v3 source map from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, MapDecodeError> {
        let raw = RawSourceMap::from_slice(bytes)?;

        let mut map = match raw.get_file() {
            Some(file) => PositionMap::new().with_file(file),
            None => PositionMap::new(),
        };

        // Raw source ids may collapse when a map lists a name twice.
        let mut source_ids = Vec::new();
        for (index, name) in raw.sources().enumerate() {
            let id = map.add_source(name);
            if let Some(content) = raw.get_source_contents(index as u32) {
                map.set_source_content(id, content);
            }
            source_ids.push(id);
        }

        for token in raw.tokens() {
            let generated = LineCol::new(token.get_dst_line(), token.get_dst_col());
            let source = token
                .get_source()
                .and_then(|_| source_ids.get(token.get_src_id() as usize).copied());

            match source {
                Some(source) => map.add(
                    generated,
                    source,
                    LineCol::new(token.get_src_line(), token.get_src_col()),
                ),
                None => map.add_mapping(generated, None),
            }
        }

        Ok(map)
    }

    /// Encodes this map as v3 JSON.
    pub fn to_json(&self) -> Result<String, MapDecodeError> {
        let mut builder = RawSourceMapBuilder::new(self.file());

        for (index, name) in self.sources().iter().enumerate() {
            let id = builder.add_source(name);
            builder.set_source_contents(id, self.source_content(index as u32));
        }

        for mapping in self.mappings() {
            let generated = mapping.generated;
            match mapping.original {
                Some(original) => {
                    builder.add(
                        generated.line,
                        generated.col,
                        original.position.line,
                        original.position.col,
                        self.source(original.source),
                        None,
                        false,
                    );
                }
                None => {
                    builder.add(generated.line, generated.col, 0, 0, None, None, false);
                }
            }
        }

        let mut bytes = Vec::new();
        builder.into_sourcemap().to_writer(&mut bytes)?;
        String::from_utf8(bytes).map_err(|_| MapDecodeError::NotUtf8)
    }
}
