use serde_json::Map;

use pathstate_types::{Segment, StatePath, Tree};

use crate::traits::PathResolver;

/// Largest run of `null` padding a write may add past the end of a sequence.
///
/// Index segments further out than this address a mapping key instead.
pub const MAX_INDEX_GAP: usize = 1024;

/// String-keyed resolver for dotted paths.
///
/// Segments address mapping keys, or sequence elements when the segment is a
/// canonical index and the container is a sequence. Writing operations clone
/// the input and edit the copy, so the caller's tree is never touched.
#[derive(Clone, Copy, Debug, Default)]
pub struct DottedPathResolver;

impl DottedPathResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }
}

impl PathResolver for DottedPathResolver {
    fn get<'a>(&self, tree: &'a Tree, path: &StatePath) -> Option<&'a Tree> {
        path.segments()
            .iter()
            .try_fold(tree, |node, segment| child(node, segment))
    }

    fn set(&self, tree: &Tree, path: &StatePath, value: Tree) -> Tree {
        let mut out = tree.clone();
        set_in(&mut out, path.segments(), value);
        out
    }

    fn omit(&self, tree: &Tree, path: &StatePath) -> Tree {
        let mut out = tree.clone();
        let Some((parent, last)) = path.split_last() else {
            return out;
        };
        match walk_mut(&mut out, parent) {
            Some(Tree::Object(map)) => {
                map.remove(last.as_key());
            }
            Some(Tree::Array(items)) => {
                if let Some(i) = last.as_index().filter(|i| *i < items.len()) {
                    items.remove(i);
                }
            }
            _ => {}
        }
        out
    }
}

fn child<'a>(node: &'a Tree, segment: &Segment) -> Option<&'a Tree> {
    match node {
        Tree::Object(map) => map.get(segment.as_key()),
        Tree::Array(items) => items.get(segment.as_index()?),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Tree, segment: &Segment) -> Option<&'a mut Tree> {
    match node {
        Tree::Object(map) => map.get_mut(segment.as_key()),
        Tree::Array(items) => items.get_mut(segment.as_index()?),
        _ => None,
    }
}

fn walk_mut<'a>(mut node: &'a mut Tree, segments: &[Segment]) -> Option<&'a mut Tree> {
    for segment in segments {
        node = child_mut(node, segment)?;
    }
    Some(node)
}

fn set_in(node: &mut Tree, segments: &[Segment], value: Tree) {
    match segments.split_first() {
        None => *node = value,
        Some((head, rest)) => set_in(slot_for(node, head), rest, value),
    }
}

/// Reshape `node` so it can hold `segment` and return the child slot.
///
/// Scalars and nulls become a sequence (index segment) or mapping (key
/// segment). A sequence addressed by a key, or by an index more than
/// [`MAX_INDEX_GAP`] past its end, is re-keyed into a mapping whose keys are
/// the element indices, so no element is lost.
fn slot_for<'a>(node: &'a mut Tree, segment: &Segment) -> &'a mut Tree {
    let len = node.as_array().map_or(0, Vec::len);
    let index = segment
        .as_index()
        .filter(|i| *i <= len.saturating_add(MAX_INDEX_GAP));
    *node = match (node.take(), index) {
        (Tree::Object(map), _) => Tree::Object(map),
        (Tree::Array(items), Some(_)) => Tree::Array(items),
        (Tree::Array(items), None) => Tree::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        ),
        (_, Some(_)) => Tree::Array(Vec::new()),
        (_, None) => Tree::Object(Map::new()),
    };
    match node {
        Tree::Array(items) => {
            let i = index.unwrap_or(items.len());
            if items.len() <= i {
                items.resize(i + 1, Tree::Null);
            }
            &mut items[i]
        }
        Tree::Object(map) => map.entry(segment.as_key()).or_insert(Tree::Null),
        other => other,
    }
}
