//! Directory-tree command hierarchy and its declarative specifications
//!
//! Every command is a directory under the command root holding one handler
//! artifact and one spec artifact. Specs are loaded per level and merged from
//! the root down: cascading flags and options flow to every descendant, while
//! everything else is visible only at the level that declares it.

pub mod accepts;
pub mod inherit;
pub mod loader;
pub mod spec;
pub mod tree;
