//! The in-memory representation of C types.
//!
//! Types live in a [`TypeArena`] and refer to each other through
//! [`TypeId`] handles; a field's back-reference to its parent record is
//! such a handle too, so the representation has no owning cycles.
//!
//! A declaration is built up in a *builder* type whose kind starts out
//! [`CTypeKind::Empty`]: declaration specifiers set the flags, the type
//! kernel (`int`, `struct S { ... }`, a typedef name) turns the kind into
//! an [`CTypeKind::Alias`] of the kernel, and declarator operators wrap
//! the symbol's chain around it. Because the builder itself lives in the
//! arena, a parenthesised declarator such as `int (*fp)(int)` composes by
//! rewriting the builder slot the symbol's pointer chain already points
//! through. [`TypeArena::flatten`] collapses the alias wrappers when the
//! finished type is stored on a symbol.

use std::ops::{Index, IndexMut};

use pacc_lex::Token;
use pacc_util::{define_index, IndexVec};

use crate::ast::AstValue;

define_index! {
    /// Handle of a type in the [`TypeArena`].
    pub struct TypeId;
}

/// The built-in primitive type names.
///
/// `__type` and `__ty_any` are marker types used by compile-time
/// functions: a `__type` parameter only accepts a type value, `__ty_any`
/// accepts anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Void = 0,
    Char = 1,
    Int = 2,
    Float = 3,
    Double = 4,
    Bool = 5,
    VaList = 6,
    Type = 7,
    TyAny = 8,
    Any = 9,
}

impl Primitive {
    /// Every primitive, in [`TypeId`] order.
    pub const ALL: [Primitive; 10] = [
        Primitive::Void,
        Primitive::Char,
        Primitive::Int,
        Primitive::Float,
        Primitive::Double,
        Primitive::Bool,
        Primitive::VaList,
        Primitive::Type,
        Primitive::TyAny,
        Primitive::Any,
    ];

    /// The C spelling of the primitive.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Bool => "bool",
            Primitive::VaList => "__builtin_va_list",
            Primitive::Type => "__type",
            Primitive::TyAny => "__ty_any",
            Primitive::Any => "__any",
        }
    }
}

/// A named slot with a type: a variable, a function parameter, a typedef
/// alias or an enumerator.
#[derive(Clone, Debug)]
pub struct Sym {
    /// Declared name; `None` for anonymous declarations such as unnamed
    /// function parameters.
    pub name: Option<Token>,
    /// The symbol's type.
    pub ctype: TypeId,
}

impl Sym {
    /// An anonymous symbol.
    pub fn anon(ctype: TypeId) -> Self {
        Self { name: None, ctype }
    }

    /// A named symbol.
    pub fn named(name: Token, ctype: TypeId) -> Self {
        Self {
            name: Some(name),
            ctype,
        }
    }
}

/// One field of a struct or union.
///
/// `parent` is a non-owning handle back into the arena; the record owns
/// its fields, never the other way around.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: Option<Token>,
    pub ctype: TypeId,
    pub parent: TypeId,
}

/// Struct or union shape. `fields: None` marks an incomplete type
/// (forward declaration or opaque type).
#[derive(Clone, Debug)]
pub struct RecordType {
    pub name: Option<Token>,
    pub fields: Option<Vec<FieldInfo>>,
}

/// Enum shape; members carry their (possibly synthesized) value
/// expressions.
#[derive(Clone, Debug)]
pub struct EnumType {
    pub base: TypeId,
    pub name: Option<Token>,
    pub members: Option<Vec<(Sym, AstValue)>>,
}

/// Array shape; `length: None` is an unsized array (`[]`).
#[derive(Clone, Debug)]
pub struct ArrayType {
    pub base: TypeId,
    pub length: Option<Box<AstValue>>,
    /// True for the `[static N]` parameter form.
    pub length_is_static: bool,
}

/// Function shape.
#[derive(Clone, Debug)]
pub struct FuncType {
    pub return_type: TypeId,
    pub params: Vec<Sym>,
    pub has_vararg: bool,
}

/// The compile-time functions the parser can evaluate in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstFnBuiltin {
    Sizeof,
}

/// A function evaluated by the parser itself; calling one produces an
/// [`AstValue`] instead of a call node.
#[derive(Clone, Debug)]
pub struct ConstFnType {
    pub func: FuncType,
    pub builtin: ConstFnBuiltin,
}

/// Type shape discriminant.
#[derive(Clone, Debug, Default)]
pub enum CTypeKind {
    /// A declaration-specifier builder with no kernel yet.
    #[default]
    Empty,
    /// A builder wrapping its kernel (or another builder).
    Alias(TypeId),
    Primitive(Primitive),
    Pointer(TypeId),
    Array(ArrayType),
    Function(FuncType),
    Struct(RecordType),
    Union(RecordType),
    Enum(EnumType),
    ConstFn(ConstFnType),
}

/// A C type: qualifier/storage flags plus a shape.
#[derive(Clone, Debug, Default)]
pub struct CType {
    pub is_static: bool,
    pub is_extern: bool,
    pub is_thread_local: bool,
    pub is_noreturn: bool,
    pub is_atomic: bool,
    pub is_const: bool,

    /// `short`/`long` count: -2 ..= 2.
    pub length_mod: Option<i8>,
    pub is_signed: Option<bool>,

    pub kind: CTypeKind,
}

impl CType {
    /// A flag-free type of the given shape.
    pub fn of(kind: CTypeKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// True if every field still has its default value, i.e. the builder
    /// never saw a specifier or kernel. A declaration parse reaching its
    /// end in this state means "no declaration here".
    pub fn is_empty_default(&self) -> bool {
        !self.is_static
            && !self.is_extern
            && !self.is_atomic
            && !self.is_const
            && self.is_signed.is_none()
            && self.length_mod.is_none()
            && matches!(self.kind, CTypeKind::Empty)
    }
}

/// Arena of all types of one translation unit.
///
/// The primitives are preallocated at fixed indices so that
/// [`TypeArena::primitive`] is a constant lookup.
#[derive(Debug)]
pub struct TypeArena {
    types: IndexVec<TypeId, CType>,
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    pub fn new() -> Self {
        let mut types = IndexVec::new();
        for prim in Primitive::ALL {
            types.push(CType::of(CTypeKind::Primitive(prim)));
        }
        Self { types }
    }

    /// The preallocated id of a primitive.
    pub fn primitive(&self, prim: Primitive) -> TypeId {
        TypeId(prim as u32)
    }

    /// Add a type, returning its handle.
    pub fn alloc(&mut self, ty: CType) -> TypeId {
        self.types.push(ty)
    }

    /// Add a flag-free type of the given shape.
    pub fn alloc_kind(&mut self, kind: CTypeKind) -> TypeId {
        self.alloc(CType::of(kind))
    }

    /// Copy a type into a fresh slot (a shallow snapshot; inner handles
    /// are shared).
    pub fn snapshot(&mut self, id: TypeId) -> TypeId {
        let copied = self.types[id].clone();
        self.alloc(copied)
    }

    /// Resolve builder nesting: follow `Alias` links to the kernel.
    ///
    /// Qualifier flags on the collapsed wrappers are dropped, which is the
    /// contract declaration storage relies on.
    pub fn flatten(&self, mut id: TypeId) -> TypeId {
        loop {
            match &self.types[id].kind {
                CTypeKind::Alias(base) => id = *base,
                _ => return id,
            }
        }
    }

    /// Check the structural invariants, returning an error message for the
    /// first violation.
    pub fn validate(&self, id: TypeId) -> Option<String> {
        let ty = &self.types[id];

        if let Some(length_mod) = ty.length_mod {
            if length_mod < -2 {
                return Some("type cannot be shorter than short short".to_string());
            }
            if length_mod > 2 {
                return Some("type cannot be longer than long long".to_string());
            }
        }

        match &ty.kind {
            CTypeKind::Empty => {
                if ty.is_empty_default() {
                    Some("type is basic and invalid".to_string())
                } else {
                    None
                }
            }
            CTypeKind::Alias(base) | CTypeKind::Pointer(base) => self.validate(*base),
            CTypeKind::Array(array) => self.validate(array.base),
            CTypeKind::Function(func) | CTypeKind::ConstFn(ConstFnType { func, .. }) => {
                if let Some(message) = self.validate(func.return_type) {
                    return Some(message);
                }
                for param in &func.params {
                    if let Some(message) = self.validate(param.ctype) {
                        return Some(message);
                    }
                }
                None
            }
            CTypeKind::Primitive(_)
            | CTypeKind::Struct(_)
            | CTypeKind::Union(_)
            | CTypeKind::Enum(_) => None,
        }
    }

    /// Can a value of type `from` be used where `to` is expected?
    ///
    /// Deliberately narrow: only identical primitives, plus the
    /// `__type` -> `__ty_any` widening the compile-time-function machinery
    /// uses.
    pub fn can_assign(&self, from: TypeId, to: TypeId) -> bool {
        match (&self.types[from].kind, &self.types[to].kind) {
            (CTypeKind::Primitive(a), CTypeKind::Primitive(b)) => {
                a == b || (*a == Primitive::Type && *b == Primitive::TyAny)
            }
            _ => false,
        }
    }

    /// Look up a field by name, recursing through builders, pointers,
    /// arrays and enum bases (which is what gives `->` its implicit
    /// dereference).
    ///
    /// `Err` carries a message for types that cannot have fields at all or
    /// are incomplete; `Ok(None)` means the record simply lacks the field.
    pub fn get_field_by_name(
        &self,
        id: TypeId,
        field_name: &str,
    ) -> Result<Option<FieldInfo>, String> {
        match &self.types[id].kind {
            CTypeKind::Struct(record) | CTypeKind::Union(record) => {
                let fields = record
                    .fields
                    .as_ref()
                    .ok_or_else(|| "type is incomplete, cannot have any fields".to_string())?;
                Ok(fields
                    .iter()
                    .find(|field| {
                        field
                            .name
                            .as_ref()
                            .is_some_and(|name| name.text == field_name)
                    })
                    .cloned())
            }
            CTypeKind::Alias(base) | CTypeKind::Pointer(base) => {
                self.get_field_by_name(*base, field_name)
            }
            CTypeKind::Array(array) => self.get_field_by_name(array.base, field_name),
            CTypeKind::Enum(e) => self.get_field_by_name(e.base, field_name),
            _ => Err("type does not have any fields".to_string()),
        }
    }

    /// A short human-readable rendering for diagnostics.
    pub fn describe(&self, id: TypeId) -> String {
        let ty = &self.types[id];
        match &ty.kind {
            CTypeKind::Empty => "<no type>".to_string(),
            CTypeKind::Alias(base) => self.describe(*base),
            CTypeKind::Primitive(prim) => prim.name().to_string(),
            CTypeKind::Pointer(base) => format!("pointer to {}", self.describe(*base)),
            CTypeKind::Array(array) => format!("array of {}", self.describe(array.base)),
            CTypeKind::Function(func) => {
                format!("function returning {}", self.describe(func.return_type))
            }
            CTypeKind::ConstFn(_) => "compile-time function".to_string(),
            CTypeKind::Struct(record) => match &record.name {
                Some(name) => format!("struct {}", name.text),
                None => "struct <anon>".to_string(),
            },
            CTypeKind::Union(record) => match &record.name {
                Some(name) => format!("union {}", name.text),
                None => "union <anon>".to_string(),
            },
            CTypeKind::Enum(e) => match &e.name {
                Some(name) => format!("enum {}", name.text),
                None => "enum <anon>".to_string(),
            },
        }
    }
}

impl Index<TypeId> for TypeArena {
    type Output = CType;

    fn index(&self, id: TypeId) -> &CType {
        &self.types[id]
    }
}

impl IndexMut<TypeId> for TypeArena {
    fn index_mut(&mut self, id: TypeId) -> &mut CType {
        &mut self.types[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_lookup_is_stable() {
        let arena = TypeArena::new();
        let int_id = arena.primitive(Primitive::Int);
        assert!(matches!(
            arena[int_id].kind,
            CTypeKind::Primitive(Primitive::Int)
        ));
    }

    #[test]
    fn test_flatten_collapses_builders() {
        let mut arena = TypeArena::new();
        let int_id = arena.primitive(Primitive::Int);
        let builder = arena.alloc_kind(CTypeKind::Alias(int_id));
        let outer = arena.alloc_kind(CTypeKind::Alias(builder));
        assert_eq!(arena.flatten(outer), int_id);
    }

    #[test]
    fn test_flatten_stops_at_pointers() {
        let mut arena = TypeArena::new();
        let int_id = arena.primitive(Primitive::Int);
        let ptr = arena.alloc_kind(CTypeKind::Pointer(int_id));
        assert_eq!(arena.flatten(ptr), ptr);
    }

    #[test]
    fn test_validate_length_mod_range() {
        let mut arena = TypeArena::new();
        let int_id = arena.primitive(Primitive::Int);

        let mut too_long = CType::of(CTypeKind::Alias(int_id));
        too_long.length_mod = Some(3);
        let id = arena.alloc(too_long);
        assert!(arena.validate(id).is_some());

        let mut long_long = CType::of(CTypeKind::Alias(int_id));
        long_long.length_mod = Some(2);
        let id = arena.alloc(long_long);
        assert!(arena.validate(id).is_none());
    }

    #[test]
    fn test_validate_empty_builder() {
        let mut arena = TypeArena::new();
        let id = arena.alloc(CType::default());
        assert!(arena.validate(id).is_some());
    }

    #[test]
    fn test_can_assign_type_markers() {
        let arena = TypeArena::new();
        let ty = arena.primitive(Primitive::Type);
        let ty_any = arena.primitive(Primitive::TyAny);
        let int_id = arena.primitive(Primitive::Int);

        assert!(arena.can_assign(ty, ty));
        assert!(arena.can_assign(ty, ty_any));
        assert!(!arena.can_assign(ty_any, ty));
        assert!(!arena.can_assign(int_id, ty));
        assert!(arena.can_assign(int_id, int_id));
    }

    #[test]
    fn test_field_lookup_through_pointer() {
        let mut arena = TypeArena::new();
        let int_id = arena.primitive(Primitive::Int);

        let record = arena.alloc_kind(CTypeKind::Struct(RecordType {
            name: None,
            fields: None,
        }));
        let field = FieldInfo {
            name: Some(pacc_lex::Token::synthesized("x", pacc_lex::TokenKind::Symbol)),
            ctype: int_id,
            parent: record,
        };
        if let CTypeKind::Struct(rec) = &mut arena[record].kind {
            rec.fields = Some(vec![field]);
        }

        let ptr = arena.alloc_kind(CTypeKind::Pointer(record));
        let found = arena.get_field_by_name(ptr, "x").unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().parent, record);

        assert!(arena.get_field_by_name(ptr, "missing").unwrap().is_none());
    }

    #[test]
    fn test_incomplete_record_field_lookup_fails() {
        let mut arena = TypeArena::new();
        let record = arena.alloc_kind(CTypeKind::Struct(RecordType {
            name: None,
            fields: None,
        }));
        assert!(arena.get_field_by_name(record, "x").is_err());
    }

    #[test]
    fn test_field_lookup_on_primitive_fails() {
        let arena = TypeArena::new();
        let int_id = arena.primitive(Primitive::Int);
        assert!(arena.get_field_by_name(int_id, "x").is_err());
    }
}
