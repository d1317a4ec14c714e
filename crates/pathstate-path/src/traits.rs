use pathstate_types::{StatePath, Tree};

/// Resolves [`StatePath`]s against a [`Tree`].
///
/// Implementations must satisfy these invariants:
/// - No operation modifies its `tree` argument or anything nested in it.
/// - `get` never fails; a missing location is `None`.
/// - `get(set(tree, p, v), p) == Some(v)` for every well-formed path `p`.
/// - `omit` of a missing location returns a tree equal to the input.
pub trait PathResolver: Send + Sync {
    /// Read the value at `path`.
    fn get<'a>(&self, tree: &'a Tree, path: &StatePath) -> Option<&'a Tree>;

    /// Return a new tree with `value` stored at `path`.
    ///
    /// Missing intermediate containers are created: a sequence when the next
    /// segment is an index, a mapping otherwise.
    fn set(&self, tree: &Tree, path: &StatePath, value: Tree) -> Tree;

    /// Return a new tree without the entry at `path`.
    fn omit(&self, tree: &Tree, path: &StatePath) -> Tree;

    /// Return a new tree with the value at `path` replaced by `f(current)`.
    fn update(&self, tree: &Tree, path: &StatePath, f: &dyn Fn(Option<&Tree>) -> Tree) -> Tree {
        let next = f(self.get(tree, path));
        self.set(tree, path, next)
    }
}
