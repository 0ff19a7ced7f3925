//! pacc-par - Parser and semantic analysis for the pacc C front-end.
//!
//! A hand-written recursive-descent parser (translation phase 7) that
//! builds the AST and resolves types, fields and symbol references in one
//! pass. Scopes and types live in arenas ([`scope::BlockId`],
//! [`types::TypeId`]); speculative parsing works by copying the token
//! cursor, never by rewinding shared state.
//!
//! The input is the preprocessor's flat token stream (whitespace and
//! comments already gone, strings already concatenated).

pub mod ast;
mod decl;
mod expr;
pub mod scope;
mod stmt;
pub mod types;

use thiserror::Error;

use pacc_lex::{Token, TokenKind};
use pacc_util::{Cursor, IndexVec, SourceLocation};

pub use ast::{AstValue, LitValue, OperationKind, Statement, SymbolDef};
pub use scope::{Block, BlockId, TagNamespace};
pub use types::{
    CType, CTypeKind, ConstFnBuiltin, ConstFnType, FieldInfo, FuncType, Primitive, Sym, TypeArena,
    TypeId,
};

/// Cursor over the parser's token stream.
pub(crate) type TokenCursor<'t> = Cursor<'t, Token>;

/// Errors produced during parsing and semantic analysis.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The token stream ended where more input was required.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// A specific token or construct was required.
    #[error("{loc}: expected {expected}, got instead '{found}'")]
    Expected {
        loc: SourceLocation,
        expected: String,
        found: String,
    },

    /// A construct that must parse to a value did not.
    #[error("{loc}: invalid {what}")]
    InvalidValue {
        loc: SourceLocation,
        what: &'static str,
    },

    /// A type-level violation (bad member access, incomplete type use,
    /// call of a non-function, invalid cast target).
    #[error("{loc}: {message}")]
    Type {
        loc: SourceLocation,
        message: String,
    },

    /// Member access to a field the record does not have.
    #[error("{loc}: no field {field} in type {type_name}")]
    UnknownField {
        loc: SourceLocation,
        field: String,
        type_name: String,
    },

    /// A call with more arguments than the function accepts.
    #[error("{loc}: too many arguments to function")]
    TooManyArguments { loc: SourceLocation },

    /// Input remained after the top-level statement list.
    #[error("{loc}: leftover tokens at end of file: '{found}'")]
    LeftoverTokens {
        loc: SourceLocation,
        found: String,
    },

    /// `typedef` with an initializer.
    #[error("assigning value in typedef statement is not allowed")]
    AssignInTypedef,

    /// A `(` in a declarator that never closes.
    #[error("{loc}: unclosed parenthesis")]
    UnclosedParenthesis { loc: SourceLocation },

    /// A code path the front-end does not cover.
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// The result of parsing one translation unit: the arenas plus the root
/// block.
#[derive(Debug)]
pub struct Ast {
    pub types: TypeArena,
    pub blocks: IndexVec<BlockId, Block>,
    pub root: BlockId,
}

impl Ast {
    /// Convenience lookup of a top-level symbol.
    pub fn root_symbol(&self, name: &str) -> Option<&Sym> {
        self.blocks[self.root].symbols.get(name)
    }
}

/// Parse a preprocessed token stream into an [`Ast`].
///
/// Leftover tokens after the statement list are fatal.
pub fn parse(tokens: &[Token]) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(tokens);
    let root = parser.new_root_block();

    let mut cur = Cursor::new(parser.tokens);
    cur = parser.parse_block_statements(root, cur)?;

    if let Some(tok) = cur.item() {
        return Err(ParseError::LeftoverTokens {
            loc: tok.src_loc.clone(),
            found: tok.text.clone(),
        });
    }

    Ok(Ast {
        types: parser.types,
        blocks: parser.blocks,
        root,
    })
}

/// Parser state: the token stream plus the growing arenas.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pub types: TypeArena,
    pub blocks: IndexVec<BlockId, Block>,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            types: TypeArena::new(),
            blocks: IndexVec::new(),
        }
    }

    /// The root block, pre-populated with the primitive type names and the
    /// built-in symbols available without any include.
    pub fn new_root_block(&mut self) -> BlockId {
        let mut block = Block::default();

        for prim in [
            Primitive::Void,
            Primitive::Int,
            Primitive::Char,
            Primitive::Float,
            Primitive::Double,
            Primitive::Bool,
            Primitive::VaList,
        ] {
            block
                .types
                .insert(prim.name().to_string(), self.types.primitive(prim));
        }

        let void_ty = self.types.primitive(Primitive::Void);
        let ty_any = self.types.primitive(Primitive::TyAny);
        let ty_type = self.types.primitive(Primitive::Type);
        let any_ty = self.types.primitive(Primitive::Any);
        let va_list = self.types.primitive(Primitive::VaList);
        let int_ty = self.types.primitive(Primitive::Int);

        // sizeof: a compile-time function over any type
        let sizeof_ty = self.types.alloc_kind(CTypeKind::ConstFn(ConstFnType {
            func: FuncType {
                return_type: int_ty,
                params: vec![Sym::anon(ty_any)],
                has_vararg: false,
            },
            builtin: ConstFnBuiltin::Sizeof,
        }));
        block.symbols.insert("sizeof".to_string(), Sym::anon(sizeof_ty));

        let void_ptr = self.types.alloc_kind(CTypeKind::Pointer(void_ty));
        block.symbols.insert(
            "nullptr".to_string(),
            Sym::named(Token::synthesized("nullptr", TokenKind::Symbol), void_ptr),
        );

        let builtins: [(&str, Vec<Sym>); 4] = [
            ("__builtin_va_start", vec![Sym::anon(va_list), Sym::anon(any_ty)]),
            ("__builtin_va_end", vec![Sym::anon(va_list)]),
            ("__builtin_va_arg", vec![Sym::anon(va_list), Sym::anon(ty_type)]),
            ("__builtin_va_copy", vec![Sym::anon(va_list), Sym::anon(va_list)]),
        ];
        for (name, params) in builtins {
            let func_ty = self.types.alloc_kind(CTypeKind::Function(FuncType {
                return_type: void_ty,
                params,
                has_vararg: false,
            }));
            block.symbols.insert(
                name.to_string(),
                Sym::named(Token::synthesized(name, TokenKind::Symbol), func_ty),
            );
        }

        self.blocks.push(block)
    }

    /// A fresh block scoped under `parent`.
    pub(crate) fn new_block(&mut self, parent: Option<BlockId>) -> BlockId {
        self.blocks.push(Block::with_parent(parent))
    }

    // ------------------------------------------------------------------
    // cursor helpers
    // ------------------------------------------------------------------

    pub(crate) fn tok(&self, cur: &TokenCursor<'t>) -> Result<&'t Token, ParseError> {
        cur.item().ok_or(ParseError::UnexpectedEnd)
    }

    pub(crate) fn expect(
        &self,
        cur: &mut TokenCursor<'t>,
        text: &str,
    ) -> Result<(), ParseError> {
        let tok = self.tok(cur)?;
        if !tok.is(text) {
            return Err(ParseError::Expected {
                loc: tok.src_loc.clone(),
                expected: format!("'{text}'"),
                found: tok.text.clone(),
            });
        }
        cur.bump();
        Ok(())
    }

    // ------------------------------------------------------------------
    // scope operations
    // ------------------------------------------------------------------

    /// Look up a symbol, walking outward through enclosing scopes.
    pub fn get_symbol(&self, mut block: BlockId, name: &str) -> Option<&Sym> {
        loop {
            if let Some(sym) = self.blocks[block].symbols.get(name) {
                return Some(sym);
            }
            block = self.blocks[block].parent?;
        }
    }

    /// Look up a type name in one of the four namespaces, walking outward.
    pub fn get_type_by_name(
        &self,
        mut block: BlockId,
        name: &str,
        namespace: TagNamespace,
    ) -> Option<TypeId> {
        loop {
            let scope = &self.blocks[block];
            let map = match namespace {
                TagNamespace::Ordinary => &scope.types,
                TagNamespace::Struct => &scope.struct_tags,
                TagNamespace::Union => &scope.union_tags,
                TagNamespace::Enum => &scope.enum_tags,
            };
            if let Some(id) = map.get(name) {
                return Some(*id);
            }
            block = scope.parent?;
        }
    }

    /// Publicize a type: named records land in their tag namespace, enum
    /// members are injected as symbols, and builder/pointer bases are
    /// walked recursively.
    pub(crate) fn add_type(&mut self, block: BlockId, ty: TypeId) {
        let mut enum_members: Vec<Sym> = Vec::new();
        let mut recurse: Option<TypeId> = None;

        match &self.types[ty].kind {
            CTypeKind::Struct(record) => {
                if let Some(name) = &record.name {
                    let text = name.text.clone();
                    self.blocks[block].struct_tags.insert(text, ty);
                }
            }
            CTypeKind::Union(record) => {
                if let Some(name) = &record.name {
                    let text = name.text.clone();
                    self.blocks[block].union_tags.insert(text, ty);
                }
            }
            CTypeKind::Enum(e) => {
                if let Some(name) = &e.name {
                    let text = name.text.clone();
                    self.blocks[block].enum_tags.insert(text, ty);
                }
                if let Some(members) = &e.members {
                    enum_members = members.iter().map(|(sym, _)| sym.clone()).collect();
                }
                recurse = Some(e.base);
            }
            CTypeKind::Alias(base) | CTypeKind::Pointer(base) => recurse = Some(*base),
            CTypeKind::Array(array) => recurse = Some(array.base),
            _ => {}
        }

        for member in enum_members {
            self.add_symbol(block, member);
        }
        if let Some(base) = recurse {
            self.add_type(block, base);
        }
    }

    /// Add a symbol to a scope, publicizing its type on the way.
    pub(crate) fn add_symbol(&mut self, block: BlockId, sym: Sym) {
        self.add_type(block, sym.ctype);
        if let Some(name) = &sym.name {
            let text = name.text.clone();
            self.blocks[block].symbols.insert(text, sym);
        }
    }

    /// Append a statement, ingesting the names it defines unless told
    /// otherwise (function definitions were registered at declaration
    /// time).
    pub(crate) fn add_statement(&mut self, block: BlockId, statement: Statement, ingest: bool) {
        if ingest {
            match &statement {
                Statement::SymbolDef(def) => {
                    let symbols: Vec<Sym> =
                        def.symbols.iter().map(|(sym, _)| sym.clone()).collect();
                    for sym in symbols {
                        self.add_symbol(block, sym);
                    }
                }
                Statement::Typedef(syms) => {
                    let aliases: Vec<Sym> = syms.clone();
                    for sym in aliases {
                        // the referenced type first, then the alias itself
                        self.add_type(block, sym.ctype);
                        if let Some(name) = &sym.name {
                            self.blocks[block]
                                .types
                                .insert(name.text.clone(), sym.ctype);
                        }
                    }
                }
                _ => {}
            }
        }

        self.blocks[block].statements.push(statement);
    }
}
