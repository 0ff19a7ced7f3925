//! AST node definitions: values and statements.
//!
//! Both families are sum types. Values carry enough type information to
//! answer [`AstValue::get_ctype`]; statements that open a scope (blocks,
//! for loops, function bodies) hold a [`BlockId`] into the block arena
//! rather than owning the scope directly.

use pacc_lex::Token;

use crate::scope::BlockId;
use crate::types::{CTypeKind, ConstFnType, FieldInfo, Primitive, Sym, TypeArena, TypeId};
use crate::ParseError;

/// Every operation the expression parser can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,

    LogicalNot,
    BitwiseNot,

    LogicalAnd,
    BitwiseAnd,
    LogicalOr,
    BitwiseOr,
    BitwiseXor,

    Add,
    Subtract,
    UnaryPlus,
    UnaryMinus,

    Multiply,
    Divide,
    Modulo,

    Equal,
    Unequal,

    AddAssign,
    SubAssign,
    DivAssign,
    MultAssign,
    ModAssign,
    XorAssign,
    BitwiseOrAssign,
    BitwiseAndAssign,
    ShlAssign,
    ShrAssign,
    ShiftLeft,
    ShiftRight,

    Assign,
    Dot,
    Arrow,

    AddrOf,
    Dereference,

    Conditional,

    PostfixIncrement,
    PostfixDecrement,
    PrefixIncrement,
    PrefixDecrement,

    Subscript,
}

/// A literal payload. Source literals keep their text (suffixes and all);
/// values synthesized by the compiler (sizeof results, enum
/// auto-increments) are integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LitValue {
    Int(i64),
    Text(String),
}

/// A value-producing AST node.
#[derive(Clone, Debug)]
pub enum AstValue {
    /// Number, char or string literal, with its resolved type.
    Literal { value: LitValue, ctype: TypeId },
    /// Reference to a resolved symbol.
    SymbolRef(Sym),
    /// A type used as a value (argument to a compile-time function).
    TypeValue(TypeId),
    /// A resolved field, as the right-hand side of `.`/`->`.
    FieldRef(FieldInfo),
    /// `{ .field = value, positional, ... }`
    CompoundLiteral {
        initializers: Vec<(Option<FieldInfo>, AstValue)>,
    },
    /// A runtime function call.
    Call {
        callee: Box<AstValue>,
        arguments: Vec<AstValue>,
    },
    /// A unary, binary or ternary operation; operand count follows the
    /// operator.
    Operation {
        op: OperationKind,
        operands: Vec<AstValue>,
    },
    /// `(type)value`
    Cast { to: TypeId, value: Box<AstValue> },
}

impl AstValue {
    pub fn unary(op: OperationKind, value: AstValue) -> Self {
        AstValue::Operation {
            op,
            operands: vec![value],
        }
    }

    pub fn binary(op: OperationKind, lhs: AstValue, rhs: AstValue) -> Self {
        AstValue::Operation {
            op,
            operands: vec![lhs, rhs],
        }
    }

    pub fn ternary(op: OperationKind, a: AstValue, b: AstValue, c: AstValue) -> Self {
        AstValue::Operation {
            op,
            operands: vec![a, b, c],
        }
    }

    /// The type this value evaluates to.
    ///
    /// Implicit conversions and pointer arithmetic are not modelled;
    /// operations other than member access default to their first
    /// operand's type.
    pub fn get_ctype(&self, types: &TypeArena) -> Result<TypeId, ParseError> {
        match self {
            AstValue::Literal { ctype, .. } => Ok(*ctype),
            AstValue::SymbolRef(sym) => Ok(sym.ctype),
            AstValue::TypeValue(_) => Ok(types.primitive(Primitive::Type)),
            AstValue::FieldRef(field) => Ok(field.ctype),
            AstValue::CompoundLiteral { .. } => Err(ParseError::Internal {
                message: "compound literal has no standalone type".to_string(),
            }),
            AstValue::Call { callee, .. } => {
                let callee_type = types.flatten(callee.get_ctype(types)?);
                match &types[callee_type].kind {
                    CTypeKind::Function(func)
                    | CTypeKind::ConstFn(ConstFnType { func, .. }) => Ok(func.return_type),
                    _ => Err(ParseError::Internal {
                        message: "attempting to call non-function".to_string(),
                    }),
                }
            }
            AstValue::Operation { op, operands } => match op {
                OperationKind::Dot | OperationKind::Arrow => operands[1].get_ctype(types),
                _ => operands[0].get_ctype(types),
            },
            AstValue::Cast { to, .. } => Ok(*to),
        }
    }
}

/// One statement.
#[derive(Clone, Debug)]
pub enum Statement {
    /// A lone `;`.
    Empty,
    Return(Option<AstValue>),
    /// An expression evaluated for its effects.
    Expression(AstValue),
    Typedef(Vec<Sym>),
    SymbolDef(SymbolDef),
    /// A `{ ... }` scope.
    Block(BlockId),
    If {
        condition: AstValue,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: AstValue,
        body: Box<Statement>,
        do_while: bool,
    },
    /// The loop's block owns exactly two statements: the init statement
    /// and the body; the init's declarations are scoped to the loop.
    For {
        block: BlockId,
        condition: Option<AstValue>,
        step: Option<AstValue>,
    },
    Switch {
        value: AstValue,
        body: Box<Statement>,
    },
    Case(AstValue),
    Default,
    Break,
    Continue,
    Goto(Token),
    Label(Token),
    /// A function definition: its type plus the body block (parameters
    /// are pre-seeded into the block's scope).
    Function { func_type: TypeId, block: BlockId },
}

/// A declaration statement: one or more declarators sharing a base type,
/// each with an optional initializer.
#[derive(Clone, Debug)]
pub struct SymbolDef {
    pub symbols: Vec<(Sym, Option<AstValue>)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CTypeKind, TypeArena};

    #[test]
    fn test_literal_ctype() {
        let arena = TypeArena::new();
        let int_id = arena.primitive(Primitive::Int);
        let lit = AstValue::Literal {
            value: LitValue::Int(3),
            ctype: int_id,
        };
        assert_eq!(lit.get_ctype(&arena).unwrap(), int_id);
    }

    #[test]
    fn test_operation_defaults_to_first_operand() {
        let arena = TypeArena::new();
        let int_id = arena.primitive(Primitive::Int);
        let lhs = AstValue::Literal {
            value: LitValue::Int(1),
            ctype: int_id,
        };
        let rhs = AstValue::Literal {
            value: LitValue::Int(2),
            ctype: arena.primitive(Primitive::Char),
        };
        let sum = AstValue::binary(OperationKind::Add, lhs, rhs);
        assert_eq!(sum.get_ctype(&arena).unwrap(), int_id);
    }

    #[test]
    fn test_dot_takes_field_type() {
        let mut arena = TypeArena::new();
        let int_id = arena.primitive(Primitive::Int);
        let record = arena.alloc_kind(CTypeKind::Struct(crate::types::RecordType {
            name: None,
            fields: None,
        }));
        let field = FieldInfo {
            name: None,
            ctype: int_id,
            parent: record,
        };

        let base = AstValue::SymbolRef(Sym::anon(record));
        let access = AstValue::binary(OperationKind::Dot, base, AstValue::FieldRef(field));
        assert_eq!(access.get_ctype(&arena).unwrap(), int_id);
    }

    #[test]
    fn test_cast_type() {
        let arena = TypeArena::new();
        let double_id = arena.primitive(Primitive::Double);
        let cast = AstValue::Cast {
            to: double_id,
            value: Box::new(AstValue::Literal {
                value: LitValue::Int(1),
                ctype: arena.primitive(Primitive::Int),
            }),
        };
        assert_eq!(cast.get_ctype(&arena).unwrap(), double_id);
    }
}
