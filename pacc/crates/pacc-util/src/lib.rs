//! pacc-util - Shared infrastructure for the pacc compiler front-end.
//!
//! This crate holds the small, dependency-free building blocks every phase
//! of the front-end uses:
//!
//! - [`span::SourceLocation`] - dual-use source coordinates (physical and
//!   logical positions are both represented by this type)
//! - [`cursor::Cursor`] - a copyable cursor over a slice, the speculative
//!   parsing primitive
//! - [`index_vec::IndexVec`] - a typed arena vector used for type and block
//!   arenas

pub mod cursor;
pub mod index_vec;
pub mod span;

pub use cursor::Cursor;
pub use index_vec::{Idx, IndexVec};
pub use span::SourceLocation;
