//! Statement parsing.
//!
//! One token of lookahead decides the statement form; everything that is
//! not introduced by a keyword falls through to declaration parsing, then
//! label detection, then expression parsing, mirroring how ambiguous C
//! statements resolve.

use pacc_lex::TokenKind;

use crate::ast::Statement;
use crate::types::CTypeKind;
use crate::{BlockId, ParseError, Parser, TokenCursor};

impl<'t> Parser<'t> {
    /// Parse statements into `block` until something that is not a
    /// statement is encountered; returns the cursor at the first
    /// unconsumed token.
    pub(crate) fn parse_block_statements(
        &mut self,
        block: BlockId,
        mut cur: TokenCursor<'t>,
    ) -> Result<TokenCursor<'t>, ParseError> {
        while !cur.is_empty() {
            let (next, statement) = self.parse_statement(block, cur)?;
            let Some(statement) = statement else { break };
            cur = next;

            let ingest = !matches!(statement, Statement::Function { .. });
            self.add_statement(block, statement, ingest);
        }

        Ok(cur)
    }

    /// Parse one terminated statement. `Ok((cur, None))` means "no
    /// statement here" with the cursor unmoved.
    pub(crate) fn parse_statement(
        &mut self,
        block: BlockId,
        mut cur: TokenCursor<'t>,
    ) -> Result<(TokenCursor<'t>, Option<Statement>), ParseError> {
        let Some(tok) = cur.item() else {
            return Ok((cur, None));
        };

        match tok.text.as_str() {
            ";" => {
                cur.bump();
                Ok((cur, Some(Statement::Empty)))
            }

            "{" => {
                cur.bump();

                let child = self.new_block(Some(block));
                cur = self.parse_block_statements(child, cur)?;

                self.expect(&mut cur, "}")?;
                Ok((cur, Some(Statement::Block(child))))
            }

            "typedef" => {
                cur.bump();

                let (after, def) = self.parse_symbol_definition(block, cur, true, true)?;
                if def.is_some() {
                    cur = after;
                }

                self.expect(&mut cur, ";")?;

                let Some(def) = def else {
                    return Ok((cur, Some(Statement::Typedef(Vec::new()))));
                };

                for (_, value) in &def.symbols {
                    if value.is_some() {
                        return Err(ParseError::AssignInTypedef);
                    }
                }

                let syms = def.symbols.into_iter().map(|(sym, _)| sym).collect();
                Ok((cur, Some(Statement::Typedef(syms))))
            }

            "switch" => {
                cur.bump();
                self.expect(&mut cur, "(")?;

                let err_loc = self.tok(&cur)?.src_loc.clone();
                let (after, value) = self.parse_value(block, cur, None)?;
                let Some(value) = value else {
                    return Err(ParseError::InvalidValue {
                        loc: err_loc,
                        what: "switch value",
                    });
                };
                cur = after;

                self.expect(&mut cur, ")")?;

                let (after, body) = self.parse_statement(block, cur)?;
                let Some(body) = body else {
                    return Err(ParseError::InvalidValue {
                        loc: self.tok(&cur)?.src_loc.clone(),
                        what: "switch body",
                    });
                };
                cur = after;

                Ok((
                    cur,
                    Some(Statement::Switch {
                        value,
                        body: Box::new(body),
                    }),
                ))
            }

            "case" => {
                cur.bump();

                let err_loc = self.tok(&cur)?.src_loc.clone();
                let (after, value) = self.parse_value(block, cur, None)?;
                let Some(value) = value else {
                    return Err(ParseError::InvalidValue {
                        loc: err_loc,
                        what: "case value",
                    });
                };
                cur = after;

                self.expect(&mut cur, ":")?;
                Ok((cur, Some(Statement::Case(value))))
            }

            "default" => {
                cur.bump();
                self.expect(&mut cur, ":")?;
                Ok((cur, Some(Statement::Default)))
            }

            "break" => {
                cur.bump();
                self.expect(&mut cur, ";")?;
                Ok((cur, Some(Statement::Break)))
            }

            "continue" => {
                cur.bump();
                self.expect(&mut cur, ";")?;
                Ok((cur, Some(Statement::Continue)))
            }

            "if" => {
                cur.bump();
                self.expect(&mut cur, "(")?;

                let err_loc = self.tok(&cur)?.src_loc.clone();
                let (after, condition) = self.parse_value(block, cur, None)?;
                let Some(condition) = condition else {
                    return Err(ParseError::InvalidValue {
                        loc: err_loc,
                        what: "if condition",
                    });
                };
                cur = after;

                self.expect(&mut cur, ")")?;

                let (after, then_branch) = self.parse_statement(block, cur)?;
                let Some(then_branch) = then_branch else {
                    return Err(ParseError::InvalidValue {
                        loc: self.tok(&cur)?.src_loc.clone(),
                        what: "if body",
                    });
                };
                cur = after;

                let mut else_branch = None;
                if cur.item().is_some_and(|t| t.is("else")) {
                    cur.bump();
                    let (after, parsed) = self.parse_statement(block, cur)?;
                    let Some(parsed) = parsed else {
                        return Err(ParseError::InvalidValue {
                            loc: self.tok(&cur)?.src_loc.clone(),
                            what: "else statement",
                        });
                    };
                    cur = after;
                    else_branch = Some(Box::new(parsed));
                }

                Ok((
                    cur,
                    Some(Statement::If {
                        condition,
                        then_branch: Box::new(then_branch),
                        else_branch,
                    }),
                ))
            }

            "do" => {
                cur.bump();

                let (after, body) = self.parse_statement(block, cur)?;
                let Some(body) = body else {
                    return Err(ParseError::InvalidValue {
                        loc: self.tok(&cur)?.src_loc.clone(),
                        what: "do while body",
                    });
                };
                cur = after;

                self.expect(&mut cur, "while")?;
                self.expect(&mut cur, "(")?;

                let err_loc = self.tok(&cur)?.src_loc.clone();
                let (after, condition) = self.parse_value(block, cur, None)?;
                let Some(condition) = condition else {
                    return Err(ParseError::InvalidValue {
                        loc: err_loc,
                        what: "do while condition",
                    });
                };
                cur = after;

                self.expect(&mut cur, ")")?;

                Ok((
                    cur,
                    Some(Statement::While {
                        condition,
                        body: Box::new(body),
                        do_while: true,
                    }),
                ))
            }

            "while" => {
                cur.bump();
                self.expect(&mut cur, "(")?;

                let err_loc = self.tok(&cur)?.src_loc.clone();
                let (after, condition) = self.parse_value(block, cur, None)?;
                let Some(condition) = condition else {
                    return Err(ParseError::InvalidValue {
                        loc: err_loc,
                        what: "while condition",
                    });
                };
                cur = after;

                self.expect(&mut cur, ")")?;

                let (after, body) = self.parse_statement(block, cur)?;
                let Some(body) = body else {
                    return Err(ParseError::InvalidValue {
                        loc: self.tok(&cur)?.src_loc.clone(),
                        what: "while body",
                    });
                };
                cur = after;

                Ok((
                    cur,
                    Some(Statement::While {
                        condition,
                        body: Box::new(body),
                        do_while: false,
                    }),
                ))
            }

            "for" => {
                cur.bump();
                self.expect(&mut cur, "(")?;

                // the init statement gets the loop's own scope
                let for_block = self.new_block(Some(block));

                let (after, init) = self.parse_statement(for_block, cur)?;
                let Some(init) = init else {
                    return Err(ParseError::InvalidValue {
                        loc: self.tok(&cur)?.src_loc.clone(),
                        what: "for loop init statement",
                    });
                };
                cur = after;
                self.add_statement(for_block, init, true);

                let (after, condition) = self.parse_value(for_block, cur, None)?;
                cur = after;
                self.expect(&mut cur, ";")?;

                let (after, step) = self.parse_value(for_block, cur, None)?;
                cur = after;
                self.expect(&mut cur, ")")?;

                let (after, body) = self.parse_statement(for_block, cur)?;
                let Some(body) = body else {
                    return Err(ParseError::InvalidValue {
                        loc: self.tok(&cur)?.src_loc.clone(),
                        what: "for loop body",
                    });
                };
                cur = after;
                self.add_statement(for_block, body, true);

                Ok((
                    cur,
                    Some(Statement::For {
                        block: for_block,
                        condition,
                        step,
                    }),
                ))
            }

            "return" => {
                cur.bump();

                let (after, value) = self.parse_value(block, cur, None)?;
                cur = after;

                self.expect(&mut cur, ";")?;
                Ok((cur, Some(Statement::Return(value))))
            }

            "goto" => {
                cur.bump();

                let label = self.tok(&cur)?;
                if label.kind != TokenKind::Symbol {
                    return Err(ParseError::Expected {
                        loc: label.src_loc.clone(),
                        expected: "label name".to_string(),
                        found: label.text.clone(),
                    });
                }
                let label = label.clone();
                cur.bump();

                self.expect(&mut cur, ";")?;
                Ok((cur, Some(Statement::Goto(label))))
            }

            _ => self.parse_other_statement(block, cur),
        }
    }

    /// Declarations, function definitions, labels and expression
    /// statements.
    fn parse_other_statement(
        &mut self,
        block: BlockId,
        mut cur: TokenCursor<'t>,
    ) -> Result<(TokenCursor<'t>, Option<Statement>), ParseError> {
        let (after, def) = self.parse_symbol_definition(block, cur, true, true)?;
        if let Some(def) = def {
            cur = after;

            for (sym, _) in &def.symbols {
                self.add_symbol(block, sym.clone());
            }

            // a function declarator followed by '{' starts a definition
            for (sym, _) in &def.symbols {
                let flat = self.types.flatten(sym.ctype);
                if matches!(self.types[flat].kind, CTypeKind::Function(_))
                    && cur.item().is_some_and(|t| t.is("{"))
                {
                    let (after, func) = self.parse_function_definition(block, flat, cur)?;
                    let Some(func) = func else {
                        return Err(ParseError::InvalidValue {
                            loc: self.tok(&cur)?.src_loc.clone(),
                            what: "function definition",
                        });
                    };
                    return Ok((after, Some(func)));
                }
            }

            self.expect(&mut cur, ";")?;
            return Ok((cur, Some(Statement::SymbolDef(def))));
        }

        // label definition: a fresh name directly followed by ':'
        let tok = self.tok(&cur)?;
        if tok.kind == TokenKind::Symbol
            && cur.peek(1).is_some_and(|t| t.is(":"))
            && self.get_symbol(block, &tok.text).is_none()
        {
            let label = tok.clone();
            cur.advance(2);
            return Ok((cur, Some(Statement::Label(label))));
        }

        let (after, value) = self.parse_value(block, cur, None)?;
        if let Some(value) = value {
            cur = after;
            self.expect(&mut cur, ";")?;
            return Ok((cur, Some(Statement::Expression(value))));
        }

        Ok((cur, None))
    }

    /// Parse a function body following its declarator.
    pub(crate) fn parse_function_definition(
        &mut self,
        parent: BlockId,
        func_type: crate::TypeId,
        mut cur: TokenCursor<'t>,
    ) -> Result<(TokenCursor<'t>, Option<Statement>), ParseError> {
        if !cur.item().is_some_and(|t| t.is("{")) {
            return Ok((cur, None));
        }
        cur.bump();

        let body = self.new_block(Some(parent));

        // parameters become symbols of the body scope
        let params = match &self.types[func_type].kind {
            CTypeKind::Function(func) => func.params.clone(),
            _ => {
                return Err(ParseError::Internal {
                    message: "function definition without function type".to_string(),
                })
            }
        };
        for param in params {
            self.add_symbol(body, param);
        }

        cur = self.parse_block_statements(body, cur)?;
        self.expect(&mut cur, "}")?;

        Ok((
            cur,
            Some(Statement::Function {
                func_type,
                block: body,
            }),
        ))
    }
}
