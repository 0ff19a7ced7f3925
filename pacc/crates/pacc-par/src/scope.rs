//! Lexical scopes.
//!
//! A [`Block`] owns four tag/alias namespaces (C keeps `struct`, `union`
//! and `enum` tags apart from ordinary type names), a symbol map, and its
//! statement list. Blocks form a tree through parent handles; name lookup
//! walks outward, so inner definitions shadow outer ones without touching
//! them.

use indexmap::IndexMap;

use pacc_util::define_index;

use crate::ast::Statement;
use crate::types::{Sym, TypeId};

define_index! {
    /// Handle of a block in the block arena.
    pub struct BlockId;
}

/// Which namespace a type-name lookup targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagNamespace {
    /// Typedef aliases and primitive names.
    Ordinary,
    Struct,
    Union,
    Enum,
}

/// One lexical scope.
#[derive(Debug, Default)]
pub struct Block {
    /// Ordinary type names: primitives and typedef aliases.
    pub types: IndexMap<String, TypeId>,
    pub struct_tags: IndexMap<String, TypeId>,
    pub union_tags: IndexMap<String, TypeId>,
    pub enum_tags: IndexMap<String, TypeId>,

    pub symbols: IndexMap<String, Sym>,

    pub statements: Vec<Statement>,

    /// Enclosing scope; `None` only for the translation unit's root block.
    pub parent: Option<BlockId>,
}

impl Block {
    /// An empty block under `parent`.
    pub fn with_parent(parent: Option<BlockId>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }
}
