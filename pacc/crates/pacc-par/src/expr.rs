//! Expression parsing.
//!
//! `parse_value` accumulates a value left to right: literals and symbol
//! references seed it, operators extend it. `Ok((cur, None))` means "no
//! value starts here" and leaves the decision to the caller, which is how
//! statement/expression ambiguity and speculative cast parsing resolve.
//!
//! `target_type` is supplied by initializers and casts so that braced
//! compound literals can resolve `.field` designators by name.

use pacc_lex::TokenKind;

use crate::ast::{AstValue, LitValue, OperationKind};
use crate::types::{CTypeKind, ConstFnBuiltin, FuncType, Primitive};
use crate::{BlockId, ParseError, Parser, TokenCursor, TypeId};

impl<'t> Parser<'t> {
    pub(crate) fn parse_value(
        &mut self,
        block: BlockId,
        mut cur: TokenCursor<'t>,
        target_type: Option<TypeId>,
    ) -> Result<(TokenCursor<'t>, Option<AstValue>), ParseError> {
        let mut ret: Option<AstValue> = None;

        loop {
            let Some(tok) = cur.item() else { break };

            match tok.kind {
                TokenKind::LiteralChar => {
                    if ret.is_some() {
                        break;
                    }
                    let char_ty = self.primitive_in_scope(block, "char")?;
                    ret = Some(AstValue::Literal {
                        value: LitValue::Text(tok.text.clone()),
                        ctype: char_ty,
                    });
                    cur.bump();
                }

                TokenKind::LiteralNumber => {
                    if ret.is_some() {
                        break;
                    }
                    // suffixes stay textual; every integer literal reads
                    // as int for now
                    let int_ty = self.primitive_in_scope(block, "int")?;
                    ret = Some(AstValue::Literal {
                        value: LitValue::Text(tok.text.clone()),
                        ctype: int_ty,
                    });
                    cur.bump();
                }

                TokenKind::LiteralString => {
                    if ret.is_some() {
                        break;
                    }
                    let char_ty = self.primitive_in_scope(block, "char")?;
                    let str_ty = self.types.alloc_kind(CTypeKind::Pointer(char_ty));
                    ret = Some(AstValue::Literal {
                        value: LitValue::Text(tok.text.clone()),
                        ctype: str_ty,
                    });
                    cur.bump();
                }

                TokenKind::Symbol => {
                    if ret.is_some() {
                        break;
                    }

                    match tok.text.as_str() {
                        "true" | "false" => {
                            let bool_ty = self.types.primitive(Primitive::Bool);
                            ret = Some(AstValue::Literal {
                                value: LitValue::Int((tok.text == "true") as i64),
                                ctype: bool_ty,
                            });
                            cur.bump();
                            continue;
                        }
                        _ => {}
                    }

                    let Some(sym) = self.get_symbol(block, &tok.text) else {
                        break;
                    };
                    let sym = sym.clone();
                    cur.bump();
                    ret = Some(AstValue::SymbolRef(sym));
                }

                TokenKind::OperatorPunctuation => {
                    let text = tok.text.clone();
                    match text.as_str() {
                        "+" => {
                            cur.bump();
                            match ret.take() {
                                None => {
                                    let (after, value) = self.parse_value(block, cur, None)?;
                                    cur = after;
                                    let Some(value) = value else { break };
                                    ret = Some(AstValue::unary(OperationKind::UnaryPlus, value));
                                }
                                Some(lhs) => {
                                    let (after, rhs) = self.parse_value(block, cur, None)?;
                                    cur = after;
                                    let Some(rhs) = rhs else { break };
                                    ret = Some(AstValue::binary(OperationKind::Add, lhs, rhs));
                                }
                            }
                        }

                        "-" => {
                            cur.bump();
                            match ret.take() {
                                None => {
                                    let (after, value) = self.parse_value(block, cur, None)?;
                                    cur = after;
                                    let Some(value) = value else { break };
                                    ret = Some(AstValue::unary(OperationKind::UnaryMinus, value));
                                }
                                Some(lhs) => {
                                    let (after, rhs) = self.parse_value(block, cur, None)?;
                                    cur = after;
                                    let Some(rhs) = rhs else { break };
                                    ret = Some(AstValue::binary(OperationKind::Subtract, lhs, rhs));
                                }
                            }
                        }

                        "*" => {
                            cur.bump();
                            match ret.take() {
                                None => {
                                    let (after, value) = self.parse_value(block, cur, None)?;
                                    cur = after;
                                    let Some(value) = value else { break };
                                    ret = Some(AstValue::unary(OperationKind::Dereference, value));
                                }
                                Some(lhs) => {
                                    let (after, rhs) = self.parse_value(block, cur, None)?;
                                    cur = after;
                                    let Some(rhs) = rhs else { break };
                                    ret = Some(AstValue::binary(OperationKind::Multiply, lhs, rhs));
                                }
                            }
                        }

                        "&" => {
                            cur.bump();
                            match ret.take() {
                                None => {
                                    let (after, value) = self.parse_value(block, cur, None)?;
                                    cur = after;
                                    let Some(value) = value else { break };
                                    ret = Some(AstValue::unary(OperationKind::AddrOf, value));
                                }
                                Some(lhs) => {
                                    let (after, rhs) = self.parse_value(block, cur, None)?;
                                    cur = after;
                                    let Some(rhs) = rhs else { break };
                                    ret =
                                        Some(AstValue::binary(OperationKind::BitwiseAnd, lhs, rhs));
                                    break;
                                }
                            }
                        }

                        "!" | "~" => {
                            if ret.is_some() {
                                break;
                            }
                            cur.bump();

                            let (after, value) = self.parse_value(block, cur, None)?;
                            cur = after;
                            let Some(value) = value else { break };

                            let op = if text == "!" {
                                OperationKind::LogicalNot
                            } else {
                                OperationKind::BitwiseNot
                            };
                            ret = Some(AstValue::unary(op, value));
                        }

                        "/" | "%" | "<" | "<=" | ">" | ">=" | "==" | "!=" | "&&" | "||" | "|"
                        | "^" | "<<" | ">>" => {
                            let Some(lhs) = ret.take() else { break };
                            cur.bump();

                            let (after, rhs) = self.parse_value(block, cur, None)?;
                            cur = after;
                            let Some(rhs) = rhs else { break };

                            let op = match text.as_str() {
                                "/" => OperationKind::Divide,
                                "%" => OperationKind::Modulo,
                                "<" => OperationKind::LessThan,
                                "<=" => OperationKind::LessThanOrEqual,
                                ">" => OperationKind::GreaterThan,
                                ">=" => OperationKind::GreaterThanOrEqual,
                                "==" => OperationKind::Equal,
                                "!=" => OperationKind::Unequal,
                                "&&" => OperationKind::LogicalAnd,
                                "||" => OperationKind::LogicalOr,
                                "|" => OperationKind::BitwiseOr,
                                "^" => OperationKind::BitwiseXor,
                                "<<" => OperationKind::ShiftLeft,
                                _ => OperationKind::ShiftRight,
                            };
                            ret = Some(AstValue::binary(op, lhs, rhs));
                        }

                        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "|=" | "&=" | "^=" | "<<="
                        | ">>=" => {
                            let Some(lhs) = ret.take() else { break };
                            cur.bump();

                            let err_loc = match cur.item() {
                                Some(t) => t.src_loc.clone(),
                                None => tok.src_loc.clone(),
                            };
                            let (after, rhs) = self.parse_value(block, cur, None)?;
                            cur = after;
                            let Some(rhs) = rhs else {
                                return Err(ParseError::InvalidValue {
                                    loc: err_loc,
                                    what: "value on rhs of assignment",
                                });
                            };

                            let op = match text.as_str() {
                                "=" => OperationKind::Assign,
                                "+=" => OperationKind::AddAssign,
                                "-=" => OperationKind::SubAssign,
                                "*=" => OperationKind::MultAssign,
                                "/=" => OperationKind::DivAssign,
                                "%=" => OperationKind::ModAssign,
                                "|=" => OperationKind::BitwiseOrAssign,
                                "&=" => OperationKind::BitwiseAndAssign,
                                "^=" => OperationKind::XorAssign,
                                "<<=" => OperationKind::ShlAssign,
                                _ => OperationKind::ShrAssign,
                            };
                            ret = Some(AstValue::binary(op, lhs, rhs));
                        }

                        "++" | "--" => {
                            cur.bump();
                            let increment = text == "++";

                            match ret.take() {
                                Some(value) => {
                                    let op = if increment {
                                        OperationKind::PostfixIncrement
                                    } else {
                                        OperationKind::PostfixDecrement
                                    };
                                    ret = Some(AstValue::unary(op, value));
                                }
                                None => {
                                    let (after, value) = self.parse_value(block, cur, None)?;
                                    cur = after;
                                    let Some(value) = value else { break };

                                    let op = if increment {
                                        OperationKind::PrefixIncrement
                                    } else {
                                        OperationKind::PrefixDecrement
                                    };
                                    ret = Some(AstValue::unary(op, value));
                                }
                            }
                        }

                        "." => {
                            cur.bump();
                            let Some(lhs) = ret.take() else { break };

                            let field_tok = self.tok(&cur)?;
                            if field_tok.kind != TokenKind::Symbol {
                                return Err(ParseError::Expected {
                                    loc: field_tok.src_loc.clone(),
                                    expected: "field name".to_string(),
                                    found: field_tok.text.clone(),
                                });
                            }

                            let lhs_ty = lhs.get_ctype(&self.types)?;
                            if !matches!(
                                self.types[lhs_ty].kind,
                                CTypeKind::Struct(_) | CTypeKind::Union(_)
                            ) {
                                return Err(ParseError::Type {
                                    loc: field_tok.src_loc.clone(),
                                    message: format!(
                                        "cannot use dot operator on non-[struct|union] type {}",
                                        self.types.describe(lhs_ty)
                                    ),
                                });
                            }

                            let field = self
                                .types
                                .get_field_by_name(lhs_ty, &field_tok.text)
                                .map_err(|message| ParseError::Type {
                                    loc: field_tok.src_loc.clone(),
                                    message,
                                })?;
                            let Some(field) = field else {
                                return Err(ParseError::UnknownField {
                                    loc: field_tok.src_loc.clone(),
                                    field: field_tok.text.clone(),
                                    type_name: self.types.describe(lhs_ty),
                                });
                            };
                            cur.bump();

                            ret = Some(AstValue::binary(
                                OperationKind::Dot,
                                lhs,
                                AstValue::FieldRef(field),
                            ));
                        }

                        "->" => {
                            cur.bump();
                            let Some(lhs) = ret.take() else { break };

                            let field_tok = self.tok(&cur)?;
                            if field_tok.kind != TokenKind::Symbol {
                                return Err(ParseError::Expected {
                                    loc: field_tok.src_loc.clone(),
                                    expected: "field name".to_string(),
                                    found: field_tok.text.clone(),
                                });
                            }

                            // the pointer is looked through by the field
                            // lookup itself
                            let lhs_ty = lhs.get_ctype(&self.types)?;
                            let field = self
                                .types
                                .get_field_by_name(lhs_ty, &field_tok.text)
                                .map_err(|message| ParseError::Type {
                                    loc: field_tok.src_loc.clone(),
                                    message,
                                })?;
                            let Some(field) = field else {
                                return Err(ParseError::UnknownField {
                                    loc: field_tok.src_loc.clone(),
                                    field: field_tok.text.clone(),
                                    type_name: self.types.describe(lhs_ty),
                                });
                            };
                            cur.bump();

                            ret = Some(AstValue::binary(
                                OperationKind::Arrow,
                                lhs,
                                AstValue::FieldRef(field),
                            ));
                        }

                        "[" => {
                            let Some(lhs) = ret.take() else { break };
                            cur.bump();

                            let err_loc = self.tok(&cur)?.src_loc.clone();
                            let (after, index) = self.parse_value(block, cur, None)?;
                            let Some(index) = index else {
                                return Err(ParseError::InvalidValue {
                                    loc: err_loc,
                                    what: "index",
                                });
                            };
                            cur = after;

                            self.expect(&mut cur, "]")?;
                            ret = Some(AstValue::binary(OperationKind::Subscript, lhs, index));
                        }

                        "?" => {
                            let Some(lhs) = ret.take() else { break };
                            cur.bump();

                            let (after, on_true) = self.parse_value(block, cur, None)?;
                            cur = after;
                            let Some(on_true) = on_true else { break };

                            self.expect(&mut cur, ":")?;

                            let (after, on_false) = self.parse_value(block, cur, None)?;
                            cur = after;
                            let Some(on_false) = on_false else { break };

                            ret = Some(AstValue::ternary(
                                OperationKind::Conditional,
                                lhs,
                                on_true,
                                on_false,
                            ));
                        }

                        "{" => {
                            let Some(target) = target_type else { break };
                            cur.bump();
                            ret = Some(self.parse_compound_literal(block, &mut cur, target)?);
                        }

                        "(" => {
                            cur.bump();

                            match ret.take() {
                                None => {
                                    let parsed =
                                        self.parse_cast_or_nested(block, &mut cur)?;
                                    ret = Some(parsed);
                                    continue;
                                }
                                Some(callee) => {
                                    ret = Some(self.parse_call(block, &mut cur, callee)?);
                                }
                            }
                        }

                        ";" => break,

                        _ => break,
                    }
                }

                TokenKind::Whitespace | TokenKind::Comment | TokenKind::Keyword => {
                    return Err(ParseError::Internal {
                        message: format!(
                            "unfiltered {:?} token reached the expression parser",
                            tok.kind
                        ),
                    });
                }
            }
        }

        Ok((cur, ret))
    }

    fn primitive_in_scope(&self, block: BlockId, name: &str) -> Result<TypeId, ParseError> {
        self.get_type_by_name(block, name, crate::TagNamespace::Ordinary)
            .ok_or_else(|| ParseError::Internal {
                message: format!("primitive type {name} missing from scope"),
            })
    }

    /// `{ .field = value, positional, ... }` with a known target type.
    fn parse_compound_literal(
        &mut self,
        block: BlockId,
        cur: &mut TokenCursor<'t>,
        target: TypeId,
    ) -> Result<AstValue, ParseError> {
        let mut initializers = Vec::new();

        while !self.tok(cur)?.is("}") {
            let mut field_target = None;

            if self.tok(cur)?.is(".") {
                cur.bump();

                let name_tok = self.tok(cur)?;
                let field = self
                    .types
                    .get_field_by_name(target, &name_tok.text)
                    .map_err(|message| ParseError::Type {
                        loc: name_tok.src_loc.clone(),
                        message,
                    })?;
                let Some(field) = field else {
                    return Err(ParseError::UnknownField {
                        loc: name_tok.src_loc.clone(),
                        field: name_tok.text.clone(),
                        type_name: self.types.describe(target),
                    });
                };
                field_target = Some(field);
                cur.bump();

                self.expect(cur, "=")?;
            }

            let err_loc = self.tok(cur)?.src_loc.clone();
            let (after, value) = self.parse_value(block, *cur, None)?;
            let Some(value) = value else {
                return Err(ParseError::InvalidValue {
                    loc: err_loc,
                    what: "field initializer",
                });
            };
            *cur = after;

            initializers.push((field_target, value));

            if self.tok(cur)?.is(",") {
                cur.bump();
                continue;
            }
            break;
        }

        self.expect(cur, "}")?;
        Ok(AstValue::CompoundLiteral { initializers })
    }

    /// After an opening parenthesis with no value yet: a cast if a
    /// type-only declaration parses, otherwise precedence grouping.
    fn parse_cast_or_nested(
        &mut self,
        block: BlockId,
        cur: &mut TokenCursor<'t>,
    ) -> Result<AstValue, ParseError> {
        let (after, type_def) = self.parse_symbol_definition(block, *cur, false, false)?;

        if let Some(type_def) = type_def {
            *cur = after;

            let (sym, _) = type_def
                .symbols
                .into_iter()
                .next()
                .ok_or_else(|| ParseError::Internal {
                    message: "empty declaration from cast speculation".to_string(),
                })?;

            if let Some(name) = &sym.name {
                return Err(ParseError::Type {
                    loc: name.src_loc.clone(),
                    message: "cast to symbol declaration is invalid".to_string(),
                });
            }

            self.expect(cur, ")")?;

            let err_loc = match cur.item() {
                Some(t) => t.src_loc.clone(),
                None => pacc_util::SourceLocation::placeholder(),
            };
            let (after, value) = self.parse_value(block, *cur, Some(sym.ctype))?;
            let Some(value) = value else {
                return Err(ParseError::InvalidValue {
                    loc: err_loc,
                    what: "cast operand",
                });
            };
            *cur = after;

            return Ok(AstValue::Cast {
                to: sym.ctype,
                value: Box::new(value),
            });
        }

        let err_loc = self.tok(cur)?.src_loc.clone();
        let (after, nested) = self.parse_value(block, *cur, None)?;
        let Some(nested) = nested else {
            return Err(ParseError::InvalidValue {
                loc: err_loc,
                what: "nested value",
            });
        };
        *cur = after;

        self.expect(cur, ")")?;
        Ok(nested)
    }

    /// A call operator applied to `callee`, cursor past the opening
    /// parenthesis. Compile-time functions are evaluated on the spot.
    fn parse_call(
        &mut self,
        block: BlockId,
        cur: &mut TokenCursor<'t>,
        callee: AstValue,
    ) -> Result<AstValue, ParseError> {
        let callee_ty = self.types.flatten(callee.get_ctype(&self.types)?);

        let (func, const_builtin): (FuncType, Option<ConstFnBuiltin>) =
            match &self.types[callee_ty].kind {
                CTypeKind::Function(func) => (func.clone(), None),
                CTypeKind::ConstFn(const_fn) => {
                    (const_fn.func.clone(), Some(const_fn.builtin))
                }
                _ => {
                    return Err(ParseError::Type {
                        loc: self.tok(cur)?.src_loc.clone(),
                        message: format!(
                            "attempting to call non-function type {}",
                            self.types.describe(callee_ty)
                        ),
                    })
                }
            };

        let type_marker = self.types.primitive(Primitive::Type);

        let mut arguments: Vec<AstValue> = Vec::new();
        let mut arg_index = 0usize;

        loop {
            let tok = self.tok(cur)?;
            if tok.is(")") {
                break;
            }

            if !(arg_index < func.params.len() || func.has_vararg) {
                return Err(ParseError::TooManyArguments {
                    loc: tok.src_loc.clone(),
                });
            }

            // parameters of the marker types receive a *type* argument;
            // strict for __type, best-effort for __ty_any
            let mut type_as_arg: Option<AstValue> = None;
            if arg_index < func.params.len() {
                let param = &func.params[arg_index];

                if self.types.can_assign(type_marker, param.ctype) {
                    let (after, type_def) =
                        self.parse_symbol_definition(block, *cur, false, false)?;

                    match type_def {
                        None => {
                            if self.types.can_assign(param.ctype, type_marker) {
                                return Err(ParseError::Expected {
                                    loc: self.tok(cur)?.src_loc.clone(),
                                    expected: "type argument".to_string(),
                                    found: self.tok(cur)?.text.clone(),
                                });
                            }
                        }
                        Some(type_def) => {
                            let (sym, _) = type_def.symbols.into_iter().next().ok_or_else(
                                || ParseError::Internal {
                                    message: "empty declaration from type argument".to_string(),
                                },
                            )?;
                            type_as_arg = Some(AstValue::TypeValue(sym.ctype));
                            *cur = after;
                        }
                    }
                }
            }

            let argument = match type_as_arg {
                Some(value) => value,
                None => {
                    let (after, value) = self.parse_value(block, *cur, None)?;
                    *cur = after;
                    match value {
                        Some(value) => value,
                        None => break,
                    }
                }
            };

            arguments.push(argument);
            arg_index += 1;

            if self.tok(cur)?.is(",") {
                cur.bump();
                continue;
            }
            break;
        }

        self.expect(cur, ")")?;

        if let Some(builtin) = const_builtin {
            return self.eval_const_fn(block, builtin, &func, arguments);
        }

        Ok(AstValue::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    /// Evaluate a compile-time function against its parsed arguments.
    fn eval_const_fn(
        &mut self,
        block: BlockId,
        builtin: ConstFnBuiltin,
        func: &FuncType,
        arguments: Vec<AstValue>,
    ) -> Result<AstValue, ParseError> {
        match builtin {
            ConstFnBuiltin::Sizeof => {
                if arguments.len() != func.params.len() {
                    return Err(ParseError::Internal {
                        message: "wrong number of arguments to sizeof".to_string(),
                    });
                }

                // TODO derive the size from the argument type once layout
                // exists
                let int_ty = self.primitive_in_scope(block, "int")?;
                Ok(AstValue::Literal {
                    value: LitValue::Int(4),
                    ctype: int_ty,
                })
            }
        }
    }
}
