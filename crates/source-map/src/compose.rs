//! Chaining the maps of two adjacent pipeline stages.

use crate::PositionMap;

/// Composes the map of a later stage with the map of the stage before it.
///
/// `target` maps the later stage's output to the earlier stage's output;
/// `original` maps the earlier stage's output to the true original. The
/// result maps the later stage's output straight to the true original.
///
/// Mappings of `target` without a source, and mappings whose position has
/// no sourced counterpart in `original`, are dropped. The embedded content
/// of `original`'s first source is carried over. Only one input file takes
/// part in a composition, so there is never more than one content entry.
pub fn compose(target: &PositionMap, original: &PositionMap) -> PositionMap {
    let mut result = match target.file() {
        Some(file) => PositionMap::new().with_file(file),
        None => PositionMap::new(),
    };

    for mapping in target.mappings() {
        let Some(intermediate) = mapping.original else {
            continue;
        };

        let Some(resolved) = original.original_position_for(intermediate.position) else {
            continue;
        };

        let source = result.add_source(resolved.source);
        result.add(mapping.generated, source, resolved.position);
    }

    if let (Some(name), Some(content)) = (original.source(0), original.source_content(0)) {
        let source = result.add_source(name);
        result.set_source_content(source, content);
    }

    result
}

/// Composes two optional stage maps.
///
/// A stage that reported no map did not move any text, so the other map is
/// passed through as is.
pub fn compose_optional(
    target: Option<PositionMap>,
    original: Option<PositionMap>,
) -> Option<PositionMap> {
    match (target, original) {
        (Some(target), Some(original)) => Some(compose(&target, &original)),
        (Some(map), None) | (None, Some(map)) => Some(map),
        (None, None) => None,
    }
}
