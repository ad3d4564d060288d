//! Postgres statement parser.

use super::error::ParseError;
use super::pratt::{infix_binding_power, token_to_binary_op, token_to_unary_op};
use crate::ast::{
    ConflictAction, ConflictTarget, DataType, Expr, ExprKind, FunctionCall, InList, InsertSource,
    InsertStatement, IsTest, JoinClause, JoinType, Literal, NullOrdering, ObjectName, OnConflict,
    OrderBy, OrderDirection, PatternOp, SelectColumn, SelectStatement, TableRef, UpdateAssignment,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Recursive descent parser with Pratt expression parsing.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::new(TokenKind::Eof, Span::default()),
        }
    }

    /// Parses exactly one INSERT statement, optionally followed by
    /// semicolons.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a single INSERT statement
    /// this parser understands.
    pub fn parse_insert(&mut self) -> Result<InsertStatement, ParseError> {
        let statement = self.parse_insert_statement()?;

        while self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        if !self.current.is_eof() {
            return Err(ParseError::unexpected(
                "end of statement",
                self.current.kind.clone(),
                self.current.span,
            ));
        }
        Ok(statement)
    }

    // SELECT

    fn parse_select_statement(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        let distinct = if self.eat_keyword(Keyword::Distinct) {
            if self.eat_keyword(Keyword::On) {
                self.expect(&TokenKind::LeftParen)?;
                self.parse_expression_list()?;
                self.expect(&TokenKind::RightParen)?;
            }
            true
        } else {
            self.eat_keyword(Keyword::All);
            false
        };

        let columns = self.parse_select_columns()?;

        let from = if self.eat_keyword(Keyword::From) {
            Some(self.parse_from_list()?)
        } else {
            None
        };

        let where_clause = self.parse_optional_where()?;

        let group_by = if self.eat_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            self.parse_expression_list()?
        } else {
            vec![]
        };

        let having = if self.eat_keyword(Keyword::Having) {
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let order_by = if self.eat_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?
        } else {
            vec![]
        };

        let limit = if self.eat_keyword(Keyword::Limit) {
            if self.eat_keyword(Keyword::All) {
                None
            } else {
                Some(self.parse_expression(0)?)
            }
        } else {
            None
        };

        let offset = if self.eat_keyword(Keyword::Offset) {
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        Ok(SelectStatement {
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
        })
    }

    /// Parses a projection list (SELECT columns or RETURNING items).
    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        let mut columns = vec![];
        loop {
            let expr = self.parse_expression(0)?;
            let alias = if self.eat_keyword(Keyword::As) {
                Some(self.expect_identifier()?)
            } else if let TokenKind::Identifier(name) = &self.current.kind {
                let name = name.clone();
                self.advance();
                Some(name)
            } else {
                None
            };
            columns.push(SelectColumn { expr, alias });

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(columns)
    }

    /// Parses `a, b JOIN c ON ...`; commas become cross joins.
    fn parse_from_list(&mut self) -> Result<TableRef, ParseError> {
        let mut table_ref = self.parse_table_ref()?;
        while self.eat(&TokenKind::Comma) {
            let right = self.parse_table_ref()?;
            table_ref = TableRef::Join {
                left: Box::new(table_ref),
                join: Box::new(JoinClause {
                    join_type: JoinType::Cross,
                    table: right,
                    on: None,
                    using: vec![],
                }),
            };
        }
        Ok(table_ref)
    }

    fn parse_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let mut table_ref = self.parse_table_primary()?;

        while let Some(join_type) = self.parse_join_type()? {
            let right = self.parse_table_primary()?;

            let (on, using) = if join_type == JoinType::Cross {
                (None, vec![])
            } else if self.eat_keyword(Keyword::On) {
                (Some(self.parse_expression(0)?), vec![])
            } else if self.eat_keyword(Keyword::Using) {
                self.expect(&TokenKind::LeftParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                (None, columns)
            } else {
                return Err(ParseError::new("Expected ON or USING clause", self.current.span));
            };

            table_ref = TableRef::Join {
                left: Box::new(table_ref),
                join: Box::new(JoinClause {
                    join_type,
                    table: right,
                    on,
                    using,
                }),
            };
        }

        Ok(table_ref)
    }

    fn parse_table_primary(&mut self) -> Result<TableRef, ParseError> {
        if self.eat(&TokenKind::LeftParen) {
            if self.check_keyword(Keyword::Select) {
                let query = self.parse_select_statement()?;
                self.expect(&TokenKind::RightParen)?;
                let alias = self.parse_optional_alias()?;
                return Ok(TableRef::Subquery {
                    query: Box::new(query),
                    alias,
                });
            }
            let inner = self.parse_table_ref()?;
            self.expect(&TokenKind::RightParen)?;
            return Ok(inner);
        }

        let start = self.current.span.start;
        let name = self.parse_object_name()?;
        if self.check(&TokenKind::LeftParen) {
            let call = self.parse_function_call(name.to_string(), start)?;
            let alias = self.parse_optional_alias()?;
            if alias.is_some() && self.eat(&TokenKind::LeftParen) {
                self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
            }
            return Ok(TableRef::Function { call, alias });
        }

        let alias = self.parse_optional_alias()?;
        Ok(TableRef::Table { name, alias })
    }

    /// Consumes a join operator, returning `None` when the next token does
    /// not start one.
    fn parse_join_type(&mut self) -> Result<Option<JoinType>, ParseError> {
        let join_type = match &self.current.kind {
            TokenKind::Keyword(Keyword::Join) => JoinType::Inner,
            TokenKind::Keyword(Keyword::Inner) => {
                self.advance();
                JoinType::Inner
            }
            TokenKind::Keyword(kw @ (Keyword::Left | Keyword::Right | Keyword::Full)) => {
                let join_type = match kw {
                    Keyword::Left => JoinType::Left,
                    Keyword::Right => JoinType::Right,
                    _ => JoinType::Full,
                };
                self.advance();
                self.eat_keyword(Keyword::Outer);
                join_type
            }
            TokenKind::Keyword(Keyword::Cross) => {
                self.advance();
                JoinType::Cross
            }
            _ => return Ok(None),
        };
        self.expect_keyword(Keyword::Join)?;
        Ok(Some(join_type))
    }

    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.eat_keyword(Keyword::As) {
            return Ok(Some(self.expect_identifier()?));
        }
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            return Ok(Some(name));
        }
        Ok(None)
    }

    // INSERT

    fn parse_insert_statement(&mut self) -> Result<InsertStatement, ParseError> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;

        let table = self.parse_object_name()?;
        let alias = if self.eat_keyword(Keyword::As) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        let columns = if self.eat(&TokenKind::LeftParen) {
            let columns = self.parse_identifier_list()?;
            self.expect(&TokenKind::RightParen)?;
            columns
        } else {
            vec![]
        };

        let source = if self.eat_keyword(Keyword::Values) {
            let mut rows = vec![];
            loop {
                self.expect(&TokenKind::LeftParen)?;
                rows.push(self.parse_expression_list()?);
                self.expect(&TokenKind::RightParen)?;
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            InsertSource::Values(rows)
        } else if self.check_keyword(Keyword::Select) {
            InsertSource::Query(Box::new(self.parse_select_statement()?))
        } else if self.eat_keyword(Keyword::Default) {
            self.expect_keyword(Keyword::Values)?;
            InsertSource::DefaultValues
        } else {
            return Err(ParseError::unexpected(
                "VALUES, SELECT or DEFAULT VALUES",
                self.current.kind.clone(),
                self.current.span,
            ));
        };

        let on_conflict = if self.eat_keyword(Keyword::On) {
            self.expect_keyword(Keyword::Conflict)?;
            Some(self.parse_on_conflict()?)
        } else {
            None
        };

        let returning = self.parse_optional_returning()?;

        Ok(InsertStatement {
            table,
            alias,
            columns,
            source,
            on_conflict,
            returning,
        })
    }

    fn parse_on_conflict(&mut self) -> Result<OnConflict, ParseError> {
        let target = if self.eat(&TokenKind::LeftParen) {
            let columns = self.parse_expression_list()?;
            self.expect(&TokenKind::RightParen)?;
            let where_clause = self.parse_optional_where()?;
            ConflictTarget::Columns {
                columns,
                where_clause,
            }
        } else if self.eat_keyword(Keyword::On) {
            self.expect_word("constraint")?;
            ConflictTarget::Constraint(self.expect_identifier()?)
        } else {
            ConflictTarget::Any
        };

        self.expect_keyword(Keyword::Do)?;
        let action = if self.eat_keyword(Keyword::Nothing) {
            ConflictAction::DoNothing
        } else {
            self.expect_keyword(Keyword::Update)?;
            self.expect_keyword(Keyword::Set)?;
            let assignments = self.parse_assignments()?;
            let where_clause = self.parse_optional_where()?;
            ConflictAction::DoUpdate {
                assignments,
                where_clause,
            }
        };

        Ok(OnConflict { target, action })
    }

    fn parse_assignments(&mut self) -> Result<Vec<UpdateAssignment>, ParseError> {
        let mut assignments = vec![];
        loop {
            let column = self.expect_identifier()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expression(0)?;
            assignments.push(UpdateAssignment { column, value });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(assignments)
    }

    fn parse_optional_where(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.eat_keyword(Keyword::Where) {
            Ok(Some(self.parse_expression(0)?))
        } else {
            Ok(None)
        }
    }

    fn parse_optional_returning(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        if self.eat_keyword(Keyword::Returning) {
            self.parse_select_columns()
        } else {
            Ok(vec![])
        }
    }

    fn parse_order_by_list(&mut self) -> Result<Vec<OrderBy>, ParseError> {
        let mut items = vec![];
        loop {
            let expr = self.parse_expression(0)?;
            let direction = if self.eat_keyword(Keyword::Desc) {
                OrderDirection::Desc
            } else {
                self.eat_keyword(Keyword::Asc);
                OrderDirection::Asc
            };
            let nulls = if self.eat_keyword(Keyword::Nulls) {
                if self.eat_keyword(Keyword::First) {
                    Some(NullOrdering::First)
                } else {
                    self.expect_keyword(Keyword::Last)?;
                    Some(NullOrdering::Last)
                }
            } else {
                None
            };
            items.push(OrderBy {
                expr,
                direction,
                nulls,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    // Expressions

    /// Parses an expression using Pratt parsing.
    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some((l_bp, r_bp)) = infix_binding_power(&self.current.kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }

            let kind = match &self.current.kind {
                TokenKind::DoubleColon => {
                    self.advance();
                    let data_type = self.parse_data_type()?;
                    ExprKind::Cast {
                        expr: Box::new(lhs),
                        data_type,
                    }
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression(0)?;
                    let upper = if self.eat(&TokenKind::Colon) {
                        Some(Box::new(self.parse_expression(0)?))
                    } else {
                        None
                    };
                    self.expect(&TokenKind::RightBracket)?;
                    ExprKind::Subscript {
                        expr: Box::new(lhs),
                        index: Box::new(index),
                        upper,
                    }
                }
                TokenKind::Keyword(Keyword::Is) => {
                    self.advance();
                    self.parse_is(lhs, r_bp)?
                }
                TokenKind::Keyword(Keyword::Not) => {
                    self.advance();
                    self.parse_negatable(lhs, r_bp, true)?
                }
                TokenKind::Keyword(Keyword::Between | Keyword::In | Keyword::Like | Keyword::Ilike) => {
                    self.parse_negatable(lhs, r_bp, false)?
                }
                other => {
                    let Some(op) = token_to_binary_op(other) else {
                        break;
                    };
                    self.advance();
                    let right = self.parse_expression(r_bp)?;
                    ExprKind::Binary {
                        left: Box::new(lhs),
                        op,
                        right: Box::new(right),
                    }
                }
            };
            lhs = Expr::new(kind, self.span_from(start));
        }

        Ok(lhs)
    }

    fn parse_is(&mut self, lhs: Expr, r_bp: u8) -> Result<ExprKind, ParseError> {
        let negated = self.eat_keyword(Keyword::Not);
        if self.eat_keyword(Keyword::Distinct) {
            self.expect_keyword(Keyword::From)?;
            let right = self.parse_expression(r_bp)?;
            return Ok(ExprKind::IsDistinctFrom {
                left: Box::new(lhs),
                right: Box::new(right),
                negated,
            });
        }
        let test = match &self.current.kind {
            TokenKind::Keyword(Keyword::Null) => IsTest::Null,
            TokenKind::Keyword(Keyword::True) => IsTest::True,
            TokenKind::Keyword(Keyword::False) => IsTest::False,
            other => {
                return Err(ParseError::unexpected(
                    "NULL, TRUE, FALSE or DISTINCT FROM",
                    other.clone(),
                    self.current.span,
                ))
            }
        };
        self.advance();
        Ok(ExprKind::Is {
            expr: Box::new(lhs),
            test,
            negated,
        })
    }

    /// Parses the operators that accept a leading NOT.
    fn parse_negatable(&mut self, lhs: Expr, r_bp: u8, negated: bool) -> Result<ExprKind, ParseError> {
        let expr = Box::new(lhs);
        match &self.current.kind {
            TokenKind::Keyword(Keyword::In) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let list = if self.check_keyword(Keyword::Select) {
                    InList::Subquery(Box::new(self.parse_select_statement()?))
                } else {
                    InList::Exprs(self.parse_expression_list()?)
                };
                self.expect(&TokenKind::RightParen)?;
                Ok(ExprKind::In {
                    expr,
                    list,
                    negated,
                })
            }
            TokenKind::Keyword(Keyword::Between) => {
                self.advance();
                let low = self.parse_expression(r_bp)?;
                self.expect_keyword(Keyword::And)?;
                let high = self.parse_expression(r_bp)?;
                Ok(ExprKind::Between {
                    expr,
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                })
            }
            TokenKind::Keyword(kw @ (Keyword::Like | Keyword::Ilike)) => {
                let op = if *kw == Keyword::Like {
                    PatternOp::Like
                } else {
                    PatternOp::Ilike
                };
                self.advance();
                let pattern = self.parse_expression(r_bp)?;
                Ok(ExprKind::Pattern {
                    expr,
                    op,
                    pattern: Box::new(pattern),
                    negated,
                })
            }
            other => Err(ParseError::unexpected(
                "IN, BETWEEN, LIKE or ILIKE",
                other.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        if let Some((op, bp)) = token_to_unary_op(&self.current.kind) {
            let start = self.current.span.start;
            self.advance();
            let operand = self.parse_expression(bp)?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;

        if let Some(name) = self.current_identifier() {
            self.advance();
            return self.parse_identifier_expression(name, start);
        }

        let kind = match &self.current.kind {
            TokenKind::Integer(n) => ExprKind::Literal(Literal::Integer(*n)),
            TokenKind::Float(f) => ExprKind::Literal(Literal::Float(*f)),
            TokenKind::String(s) => ExprKind::Literal(Literal::String(s.clone())),
            TokenKind::Keyword(Keyword::True) => ExprKind::Literal(Literal::Boolean(true)),
            TokenKind::Keyword(Keyword::False) => ExprKind::Literal(Literal::Boolean(false)),
            TokenKind::Keyword(Keyword::Null) => ExprKind::Literal(Literal::Null),
            TokenKind::Keyword(Keyword::Default) => ExprKind::Default,
            TokenKind::Parameter(n) => ExprKind::Parameter(*n),
            TokenKind::Star => ExprKind::Wildcard { table: None },
            TokenKind::LeftParen => return self.parse_parenthesized(start),
            TokenKind::LeftBracket => return self.parse_array_elements(start),
            TokenKind::Keyword(Keyword::Case) => return self.parse_case_expression(),
            TokenKind::Keyword(Keyword::Cast) => return self.parse_cast_expression(),
            TokenKind::Keyword(Keyword::Exists) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let query = self.parse_select_statement()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(Expr::new(
                    ExprKind::Exists {
                        query: Box::new(query),
                        negated: false,
                    },
                    self.span_from(start),
                ));
            }
            TokenKind::Keyword(Keyword::Array) => {
                self.advance();
                if self.check(&TokenKind::LeftBracket) {
                    return self.parse_array_elements(start);
                }
                return self.parse_function_call(String::from("array"), start);
            }
            // `= ALL (...)`
            TokenKind::Keyword(Keyword::All) => {
                self.advance();
                return self.parse_function_call(String::from("all"), start);
            }
            other => {
                return Err(ParseError::unexpected(
                    "expression",
                    other.clone(),
                    self.current.span,
                ))
            }
        };

        self.advance();
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// Continues an expression that started with a name: a column, a
    /// qualified column, a function call or a typed literal.
    fn parse_identifier_expression(&mut self, name: String, start: usize) -> Result<Expr, ParseError> {
        if let TokenKind::String(value) = &self.current.kind {
            let literal = Expr::new(
                ExprKind::Literal(Literal::String(value.clone())),
                self.current.span,
            );
            self.advance();
            return Ok(Expr::new(
                ExprKind::Cast {
                    expr: Box::new(literal),
                    data_type: DataType::named(name),
                },
                self.span_from(start),
            ));
        }

        if self.check(&TokenKind::LeftParen) {
            return self.parse_function_call(name, start);
        }

        if self.eat(&TokenKind::Dot) {
            if self.eat(&TokenKind::Star) {
                return Ok(Expr::new(
                    ExprKind::Wildcard { table: Some(name) },
                    self.span_from(start),
                ));
            }
            let column = self.expect_identifier()?;
            if self.check(&TokenKind::LeftParen) {
                return self.parse_function_call(format!("{name}.{column}"), start);
            }
            return Ok(Expr::new(
                ExprKind::Column {
                    table: Some(name),
                    name: column,
                },
                self.span_from(start),
            ));
        }

        Ok(Expr::new(
            ExprKind::Column { table: None, name },
            self.span_from(start),
        ))
    }

    fn parse_parenthesized(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        if self.check_keyword(Keyword::Select) {
            let query = self.parse_select_statement()?;
            self.expect(&TokenKind::RightParen)?;
            return Ok(Expr::new(
                ExprKind::Subquery(Box::new(query)),
                self.span_from(start),
            ));
        }

        let first = self.parse_expression(0)?;
        let kind = if self.eat(&TokenKind::Comma) {
            let mut items = vec![first];
            items.extend(self.parse_expression_list()?);
            ExprKind::Row(items)
        } else {
            ExprKind::Paren(Box::new(first))
        };
        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// Parses `[a, b, ...]`, the body of `ARRAY[...]` and of nested arrays.
    fn parse_array_elements(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftBracket)?;
        let items = if self.check(&TokenKind::RightBracket) {
            vec![]
        } else {
            self.parse_expression_list()?
        };
        self.expect(&TokenKind::RightBracket)?;
        Ok(Expr::new(ExprKind::Array(items), self.span_from(start)))
    }

    fn parse_function_call(&mut self, name: String, start: usize) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let distinct = self.eat_keyword(Keyword::Distinct);

        let mut args = vec![];
        if self.check(&TokenKind::Star) {
            let star = self.current.span;
            self.advance();
            args.push(Expr::new(ExprKind::Wildcard { table: None }, star));
        } else if self.check_keyword(Keyword::Select) {
            let arg_start = self.current.span.start;
            let query = self.parse_select_statement()?;
            args.push(Expr::new(
                ExprKind::Subquery(Box::new(query)),
                self.span_from(arg_start),
            ));
        } else if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression(0)?);
                // `extract(field FROM source)` style arguments
                if !(self.eat(&TokenKind::Comma) || self.eat_keyword(Keyword::From)) {
                    break;
                }
            }
        }

        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::new(
            ExprKind::Function(FunctionCall {
                name,
                args,
                distinct,
            }),
            self.span_from(start),
        ))
    }

    fn parse_cast_expression(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        self.expect_keyword(Keyword::Cast)?;
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expression(0)?;
        self.expect_keyword(Keyword::As)?;
        let data_type = self.parse_data_type()?;
        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::new(
            ExprKind::Cast {
                expr: Box::new(expr),
                data_type,
            },
            self.span_from(start),
        ))
    }

    fn parse_case_expression(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        self.expect_keyword(Keyword::Case)?;

        let operand = if self.check_keyword(Keyword::When) {
            None
        } else {
            Some(Box::new(self.parse_expression(0)?))
        };

        let mut when_clauses = vec![];
        while self.eat_keyword(Keyword::When) {
            let when_expr = self.parse_expression(0)?;
            self.expect_keyword(Keyword::Then)?;
            let then_expr = self.parse_expression(0)?;
            when_clauses.push((when_expr, then_expr));
        }
        if when_clauses.is_empty() {
            return Err(ParseError::unexpected(
                "WHEN",
                self.current.kind.clone(),
                self.current.span,
            ));
        }

        let else_clause = if self.eat_keyword(Keyword::Else) {
            Some(Box::new(self.parse_expression(0)?))
        } else {
            None
        };

        self.expect_keyword(Keyword::End)?;

        Ok(Expr::new(
            ExprKind::Case {
                operand,
                when_clauses,
                else_clause,
            },
            self.span_from(start),
        ))
    }

    /// Parses a type name: `int4`, `pg_catalog.int4`, `varchar(20)`,
    /// `double precision`, `character varying`, `timestamp(3) with time zone`,
    /// `text[]`.
    fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let mut name = self.expect_identifier()?;
        if self.eat(&TokenKind::Dot) {
            let inner = self.expect_identifier()?;
            name = format!("{name}.{inner}");
        }

        match name.as_str() {
            "double" => {
                if self.eat_word("precision") {
                    name.push_str(" precision");
                }
            }
            "character" | "char" | "bit" => {
                if self.eat_word("varying") {
                    name.push_str(" varying");
                }
            }
            _ => {}
        }

        let mut modifiers = vec![];
        if self.eat(&TokenKind::LeftParen) {
            loop {
                match &self.current.kind {
                    TokenKind::Integer(n) => modifiers.push(*n),
                    other => {
                        return Err(ParseError::unexpected(
                            "type modifier",
                            other.clone(),
                            self.current.span,
                        ))
                    }
                }
                self.advance();
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen)?;
        }

        if name == "timestamp" || name == "time" {
            if self.eat_keyword(Keyword::With) {
                self.expect_word("time")?;
                self.expect_word("zone")?;
                name.push_str(" with time zone");
            } else if self.eat_word("without") {
                self.expect_word("time")?;
                self.expect_word("zone")?;
                name.push_str(" without time zone");
            }
        }

        let mut array_dims = 0;
        while self.eat(&TokenKind::LeftBracket) {
            if matches!(self.current.kind, TokenKind::Integer(_)) {
                self.advance();
            }
            self.expect(&TokenKind::RightBracket)?;
            array_dims += 1;
        }

        Ok(DataType {
            name,
            modifiers,
            array_dims,
        })
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expression(0)?];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_expression(0)?);
        }
        Ok(exprs)
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = vec![self.expect_identifier()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }

    fn parse_object_name(&mut self) -> Result<ObjectName, ParseError> {
        let first = self.expect_identifier()?;
        if self.eat(&TokenKind::Dot) {
            let name = self.expect_identifier()?;
            Ok(ObjectName {
                schema: Some(first),
                name,
            })
        } else {
            Ok(ObjectName::bare(first))
        }
    }

    // Token helpers

    fn advance(&mut self) {
        let next = self.lexer.next_token();
        self.previous = core::mem::replace(&mut self.current, next);
    }

    fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current.kind) == core::mem::discriminant(kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.as_keyword() == Some(keyword)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes an unquoted word that is not in the keyword table.
    fn eat_word(&mut self, word: &str) -> bool {
        if matches!(&self.current.kind, TokenKind::Identifier(w) if w == word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(ParseError::unexpected(
                format!("{kind:?}"),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(ParseError::unexpected(
                keyword.as_str(),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), ParseError> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(ParseError::unexpected(
                word.to_ascii_uppercase(),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    /// The current token as a name, if it can be one.
    fn current_identifier(&self) -> Option<String> {
        match &self.current.kind {
            TokenKind::Identifier(name) => Some(name.clone()),
            TokenKind::Keyword(kw) if !kw.is_reserved() => Some(kw.as_str().to_ascii_lowercase()),
            _ => None,
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.current_identifier() {
            Some(name) => {
                self.advance();
                Ok(name)
            }
            None => Err(ParseError::unexpected(
                "identifier",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    const fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.previous.span.end)
    }
}
