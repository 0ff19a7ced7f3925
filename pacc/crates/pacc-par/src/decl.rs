//! Declaration parsing.
//!
//! `parse_symbol_definition` tries to read one or more declarators
//! sharing a base type (`int a, *b, c[4];`). The base type is built in an
//! arena slot that the declarator chain points through, so parenthesised
//! declarators (`int (*fp)(int)`) bind their modifiers to the symbol while
//! the shared kernel stays rewritable. Failure to find any declaration
//! rewinds to the input cursor and returns `None`; a structurally invalid
//! declarator backtracks the same way rather than aborting, because the
//! caller may be speculating (cast syntax, compile-time type arguments).

use pacc_lex::TokenKind;

use crate::ast::{AstValue, LitValue, OperationKind, SymbolDef};
use crate::types::{
    ArrayType, CType, CTypeKind, EnumType, FieldInfo, FuncType, RecordType, Sym,
};
use crate::{BlockId, ParseError, Parser, TagNamespace, TokenCursor, TypeId};

impl<'t> Parser<'t> {
    /// Try to parse a symbol definition.
    ///
    /// Returns the cursor past the declaration when a definition was
    /// found, or the input cursor and `None` when not.
    pub(crate) fn parse_symbol_definition(
        &mut self,
        block: BlockId,
        cur_in: TokenCursor<'t>,
        allow_multiple: bool,
        allow_init: bool,
    ) -> Result<(TokenCursor<'t>, Option<SymbolDef>), ParseError> {
        let mut cur = cur_in;

        // snapshot of the shared base type, taken when the first
        // declarator commits to its kernel
        let mut base_ctype: Option<TypeId> = None;

        let mut ret: Vec<(Sym, Option<AstValue>)> = Vec::new();

        'declarators: loop {
            let mut symbol: Option<Sym> = None;
            let mut sym_init: Option<AstValue> = None;

            let builder = self.types.alloc(CType::of(match base_ctype {
                Some(base) => CTypeKind::Alias(base),
                None => CTypeKind::Empty,
            }));

            let mut nesting_depth = 0usize;

            while let Some(tok) = cur.item() {
                match tok.text.as_str() {
                    "extern" => {
                        self.types[builder].is_extern = true;
                        cur.bump();
                    }
                    "_Noreturn" => {
                        self.types[builder].is_noreturn = true;
                        cur.bump();
                    }
                    "thread_local" => {
                        self.types[builder].is_thread_local = true;
                        cur.bump();
                    }
                    "const" => {
                        self.types[builder].is_const = true;
                        cur.bump();
                    }
                    "static" => {
                        self.types[builder].is_static = true;
                        cur.bump();
                    }
                    "signed" => {
                        self.types[builder].is_signed = Some(true);
                        cur.bump();
                    }
                    "unsigned" => {
                        self.types[builder].is_signed = Some(false);
                        cur.bump();
                    }
                    "long" => {
                        let slot = &mut self.types[builder];
                        slot.length_mod = Some(slot.length_mod.unwrap_or(0) + 1);
                        cur.bump();
                    }
                    "short" => {
                        let slot = &mut self.types[builder];
                        slot.length_mod = Some(slot.length_mod.unwrap_or(0) - 1);
                        cur.bump();
                    }

                    "*" => {
                        if nesting_depth == 0 {
                            // cannot point at nothing
                            if self.types[builder].is_empty_default() {
                                break;
                            }
                            if base_ctype.is_none() {
                                base_ctype = Some(self.types.snapshot(builder));
                            }
                        }

                        let sym = symbol.get_or_insert_with(|| Sym::anon(builder));
                        let wrapped = self.types.alloc_kind(CTypeKind::Pointer(sym.ctype));
                        sym.ctype = wrapped;
                        cur.bump();
                    }

                    "[" => {
                        cur.bump();

                        let length_is_static = cur.item().is_some_and(|t| t.is("static"));
                        if length_is_static {
                            cur.bump();
                        }

                        let (after, length) = self.parse_value(block, cur, None)?;
                        cur = after;

                        // anonymous arrays are allowed in certain contexts
                        if base_ctype.is_none() {
                            base_ctype = Some(self.types.snapshot(builder));
                        }

                        let sym = symbol.get_or_insert_with(|| Sym::anon(builder));
                        let wrapped = self.types.alloc_kind(CTypeKind::Array(ArrayType {
                            base: sym.ctype,
                            length: length.map(Box::new),
                            length_is_static,
                        }));
                        sym.ctype = wrapped;

                        self.expect(&mut cur, "]")?;
                    }

                    "struct" => {
                        cur.bump();
                        cur = self.parse_record_kernel(block, cur, builder, false)?;
                    }
                    "union" => {
                        cur.bump();
                        cur = self.parse_record_kernel(block, cur, builder, true)?;
                    }
                    "enum" => {
                        cur.bump();
                        cur = self.parse_enum_kernel(block, cur, builder)?;
                    }

                    "(" => {
                        cur.bump();

                        // a parameter list makes this a function
                        // declarator; otherwise it is precedence grouping
                        let before = cur;
                        let mut params: Vec<Sym> = Vec::new();
                        let mut has_vararg = false;
                        let mut found_func_decl = true;

                        loop {
                            match cur.item() {
                                None => break,
                                Some(t) if t.is(")") => break,
                                Some(t) if t.is("...") => {
                                    // the vararg closes the list
                                    has_vararg = true;
                                    cur.bump();
                                    break;
                                }
                                Some(_) => {}
                            }

                            let (after, param_def) =
                                self.parse_symbol_definition(block, cur, false, false)?;
                            let Some(param_def) = param_def else { break };
                            cur = after;

                            let Some((param, _)) = param_def.symbols.into_iter().next() else {
                                break;
                            };
                            params.push(param);

                            if cur.item().is_some_and(|t| t.is(",")) {
                                cur.bump();
                                continue;
                            }
                            break;
                        }

                        if !cur.item().is_some_and(|t| t.is(")")) {
                            cur = before;
                            found_func_decl = false;
                        }

                        if found_func_decl {
                            cur.bump();

                            // nest: the builder's current content becomes
                            // the return type, the slot itself the function
                            let return_type = self.types.snapshot(builder);
                            let func = self.types.alloc_kind(CTypeKind::Function(FuncType {
                                return_type,
                                params,
                                has_vararg,
                            }));
                            self.types[builder] = CType::of(CTypeKind::Alias(func));

                            if symbol.is_none() {
                                symbol = Some(Sym::anon(builder));
                            }
                            continue;
                        }

                        // nested declarator: modifiers inside bind to the
                        // symbol, not the base type
                        nesting_depth += 1;
                        if symbol.is_none() {
                            symbol = Some(Sym::anon(builder));
                        }
                    }

                    ")" if nesting_depth > 0 => {
                        nesting_depth -= 1;
                        cur.bump();
                    }

                    other => {
                        // an existing type name acts as the kernel
                        if let Some(existing) =
                            self.get_type_by_name(block, other, TagNamespace::Ordinary)
                        {
                            self.types[builder].kind = CTypeKind::Alias(existing);
                            cur.bump();
                            continue;
                        }

                        if other == "=" && allow_init && symbol.is_some() {
                            cur.bump();

                            let target = symbol.as_ref().map(|sym| sym.ctype);
                            let err_loc = tok.src_loc.clone();
                            let (after, value) = self.parse_value(block, cur, target)?;
                            cur = after;

                            let Some(value) = value else {
                                return Err(ParseError::InvalidValue {
                                    loc: err_loc,
                                    what: "symbol initializer",
                                });
                            };
                            sym_init = Some(value);
                            continue;
                        }

                        if !tok.is_valid_symbol() {
                            break;
                        }
                        if self.types[builder].is_empty_default() {
                            break;
                        }

                        if base_ctype.is_none() {
                            base_ctype = Some(self.types.snapshot(builder));
                        }

                        // the name binds to the innermost declarator
                        symbol = match symbol.take() {
                            Some(mut sym) => {
                                sym.name = Some(tok.clone());
                                Some(sym)
                            }
                            None => Some(Sym::named(tok.clone(), builder)),
                        };
                        cur.bump();
                    }
                }
            }

            if self.types[builder].is_empty_default() {
                break 'declarators;
            }

            if nesting_depth > 0 {
                let loc = match cur.item() {
                    Some(tok) => tok.src_loc.clone(),
                    None => pacc_util::SourceLocation::placeholder(),
                };
                return Err(ParseError::UnclosedParenthesis { loc });
            }

            let mut sym = symbol.unwrap_or_else(|| Sym::anon(builder));

            // an invalid declarator is a failed speculation, not an abort
            if self.types.validate(sym.ctype).is_some() {
                break 'declarators;
            }

            sym.ctype = self.types.flatten(sym.ctype);
            ret.push((sym, sym_init.take()));

            if allow_multiple && cur.item().is_some_and(|t| t.is(",")) {
                cur.bump();
                if base_ctype.is_none() {
                    return Err(ParseError::Internal {
                        message: "multi-declarator without base type".to_string(),
                    });
                }
                continue 'declarators;
            }

            break 'declarators;
        }

        if ret.is_empty() {
            return Ok((cur_in, None));
        }

        Ok((cur, Some(SymbolDef { symbols: ret })))
    }

    /// Parse a `struct`/`union` kernel after its keyword, installing it as
    /// the builder's kernel.
    fn parse_record_kernel(
        &mut self,
        block: BlockId,
        mut cur: TokenCursor<'t>,
        builder: TypeId,
        is_union: bool,
    ) -> Result<TokenCursor<'t>, ParseError> {
        let mut record_name = None;
        if let Some(tok) = cur.item() {
            if tok.kind == TokenKind::Symbol {
                record_name = Some(tok.clone());
                cur.bump();
            }
        }

        let record = RecordType {
            name: record_name.clone(),
            fields: None,
        };
        let record_id = self.types.alloc_kind(if is_union {
            CTypeKind::Union(record)
        } else {
            CTypeKind::Struct(record)
        });
        self.types[builder].kind = CTypeKind::Alias(record_id);

        if cur.item().is_some_and(|t| t.is("{")) {
            cur.bump();

            let mut fields: Vec<FieldInfo> = Vec::new();
            loop {
                let (after, field_def) =
                    self.parse_symbol_definition(block, cur, true, is_union)?;
                let Some(field_def) = field_def else { break };
                cur = after;

                self.expect(&mut cur, ";")?;

                for (sym, _) in field_def.symbols {
                    fields.push(FieldInfo {
                        name: sym.name,
                        ctype: sym.ctype,
                        parent: record_id,
                    });
                }
            }

            match &mut self.types[record_id].kind {
                CTypeKind::Struct(rec) | CTypeKind::Union(rec) => rec.fields = Some(fields),
                _ => {}
            }

            self.expect(&mut cur, "}")?;
        } else {
            // not defined inline: the tag must be named, and may refer to
            // a complete type already in scope
            let Some(name) = &record_name else {
                let found = match cur.item() {
                    Some(tok) => tok.text.clone(),
                    None => "<end of input>".to_string(),
                };
                return Err(ParseError::Expected {
                    loc: match cur.item() {
                        Some(tok) => tok.src_loc.clone(),
                        None => pacc_util::SourceLocation::placeholder(),
                    },
                    expected: "record name or body".to_string(),
                    found,
                });
            };

            let namespace = if is_union {
                TagNamespace::Union
            } else {
                TagNamespace::Struct
            };
            if let Some(complete) = self.get_type_by_name(block, &name.text, namespace) {
                self.types[builder].kind = CTypeKind::Alias(complete);
            }
        }

        Ok(cur)
    }

    /// Parse an `enum` kernel after its keyword.
    fn parse_enum_kernel(
        &mut self,
        block: BlockId,
        mut cur: TokenCursor<'t>,
        builder: TypeId,
    ) -> Result<TokenCursor<'t>, ParseError> {
        let int_ty = self
            .get_type_by_name(block, "int", TagNamespace::Ordinary)
            .ok_or_else(|| ParseError::Internal {
                message: "int primitive missing from root scope".to_string(),
            })?;

        let mut enum_name = None;
        if let Some(tok) = cur.item() {
            if tok.kind == TokenKind::Symbol {
                enum_name = Some(tok.clone());
                cur.bump();
            }
        }

        let mut members: Option<Vec<(Sym, AstValue)>> = None;

        if cur.item().is_some_and(|t| t.is("{")) {
            cur.bump();

            let mut list: Vec<(Sym, AstValue)> = Vec::new();
            let mut last_value = AstValue::Literal {
                value: LitValue::Int(0),
                ctype: int_ty,
            };

            while cur.item().is_some_and(|t| !t.is("}")) {
                let tok = self.tok(&cur)?;
                if tok.kind != TokenKind::Symbol {
                    return Err(ParseError::Expected {
                        loc: tok.src_loc.clone(),
                        expected: "enumerator name".to_string(),
                        found: tok.text.clone(),
                    });
                }
                let member_name = tok.clone();
                cur.bump();

                let mut member_value: Option<AstValue> = None;
                if cur.item().is_some_and(|t| t.is("=")) {
                    cur.bump();

                    let err_loc = self.tok(&cur)?.src_loc.clone();
                    let (after, value) = self.parse_value(block, cur, None)?;
                    let Some(value) = value else {
                        return Err(ParseError::InvalidValue {
                            loc: err_loc,
                            what: "enumerator value",
                        });
                    };
                    cur = after;
                    member_value = Some(value);
                }

                // unvalued enumerators count up from their predecessor
                let value = member_value.unwrap_or_else(|| {
                    AstValue::binary(
                        OperationKind::Add,
                        last_value.clone(),
                        AstValue::Literal {
                            value: LitValue::Int(1),
                            ctype: int_ty,
                        },
                    )
                });
                last_value = value.clone();

                list.push((Sym::named(member_name, int_ty), value));

                if cur.item().is_some_and(|t| t.is(",")) {
                    cur.bump();
                    continue;
                }
                break;
            }

            self.expect(&mut cur, "}")?;
            members = Some(list);
        }

        let enum_id = self.types.alloc_kind(CTypeKind::Enum(EnumType {
            base: int_ty,
            name: enum_name,
            members,
        }));
        self.types[builder].kind = CTypeKind::Alias(enum_id);

        Ok(cur)
    }
}
