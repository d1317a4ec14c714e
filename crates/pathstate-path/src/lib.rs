//! Path resolution for pathstate trees.
//!
//! Every resolver operation is pure: it reads a borrowed tree and, for the
//! writing operations, returns a brand-new tree. Callers never observe a tree
//! being modified in place, so a snapshot handed to a reader stays valid no
//! matter what is committed afterwards.
//!
//! # Operations
//!
//! - `get`: value at a path, or `None` if any segment is missing
//! - `set`: new tree with a value placed at a path, creating containers
//! - `update`: `set(tree, path, f(get(tree, path)))`
//! - `omit`: new tree without the entry at a path
//!
//! All resolvers implement the [`PathResolver`] trait so callers can swap the
//! string-keyed [`DottedPathResolver`] for another strategy.

pub mod dotted;
pub mod traits;

pub use dotted::DottedPathResolver;
pub use traits::PathResolver;
