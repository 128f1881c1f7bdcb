//! Recursive descent parser with precedence climbing for `.hk`.
//!
//! Statement-level parsing pushes into [`Block`] arenas rather than
//! returning owned trees (see `ast.rs`); expression-level parsing follows
//! the language's precedence table from loosest to tightest: assignment,
//! infix identifier calls, the `if`/`else` ternary, `and`, `or`, unary `not`,
//! the nonassoc `in` test, comparisons (chainable), `+ -`, `* .* / %`,
//! `^ .^`, unary `-` and postfix transpose `'`, then call/index.

use hk_core::Span;

use super::ast::{
    AssignOp, AssignTarget, BinaryOp, Block, Expression, ExpressionKind, FnBody, Param, Program,
    StatementKind, UnaryOp,
};
use super::tokens::{Token, TokenKind};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected {found} at line {line}, column {col}; expected {expected}")]
    UnexpectedToken { found: String, expected: String, line: usize, col: usize },
    #[error("unexpected end of input; expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("'{0}' at line {1} is not a valid assignment target")]
    InvalidAssignTarget(String, usize),
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. } => *line,
            ParseError::UnexpectedEof { .. } => 0,
            ParseError::InvalidAssignTarget(_, line) => *line,
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse_program(mut self) -> PResult<Program> {
        let body = self.parse_block_top()?;
        Ok(Program { body })
    }

    // ---- token plumbing ----

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.kind()) == std::mem::discriminant(kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else if matches!(self.kind(), TokenKind::Eof) {
            Err(ParseError::UnexpectedEof { expected: expected.to_string() })
        } else {
            let tok = self.current();
            Err(ParseError::UnexpectedToken {
                found: tok.kind.to_string(),
                expected: expected.to_string(),
                line: tok.span.line,
                col: tok.span.col,
            })
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof | TokenKind::Dedent)
    }

    // ---- blocks & statements ----

    fn parse_block_top(&mut self) -> PResult<Block> {
        let mut block = Block::new();
        let mut last: Option<usize> = None;
        self.skip_separators();
        while !matches!(self.kind(), TokenKind::Eof) {
            let (kind, sp) = self.parse_statement()?;
            last = Some(block.push(kind, sp, None, last));
            self.skip_separators();
        }
        Ok(block)
    }

    fn parse_indented_block(&mut self) -> PResult<Block> {
        self.skip_separators();
        self.expect(&TokenKind::Indent, "an indented block")?;
        let mut block = Block::new();
        let mut last: Option<usize> = None;
        self.skip_separators();
        while !matches!(self.kind(), TokenKind::Dedent | TokenKind::Eof) {
            let (kind, sp) = self.parse_statement()?;
            last = Some(block.push(kind, sp, None, last));
            self.skip_separators();
        }
        self.expect(&TokenKind::Dedent, "a dedent closing the block")?;
        Ok(block)
    }

    fn parse_statement(&mut self) -> PResult<(StatementKind, Span)> {
        let start = self.span();
        match self.kind().clone() {
            TokenKind::Pass => {
                self.advance();
                Ok((StatementKind::Pass, start))
            }
            TokenKind::Continue => {
                self.advance();
                Ok((StatementKind::Continue, start))
            }
            TokenKind::Del => {
                self.advance();
                let expr = self.parse_expr()?;
                let target = Self::expr_to_target(expr, start.line)?;
                Ok((StatementKind::Del(target), start))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok((StatementKind::Return(value), start))
            }
            TokenKind::If => self.parse_if(start),
            TokenKind::While => self.parse_while(start),
            TokenKind::For => self.parse_for(start),
            TokenKind::Infix => {
                self.advance();
                self.expect(&TokenKind::Fn, "'fn' after 'infix'")?;
                self.parse_fn_def(start, true)
            }
            TokenKind::Fn => {
                self.advance();
                self.parse_fn_def(start, false)
            }
            _ => self.parse_simple_statement(start),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> PResult<String> {
        match self.kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => {
                let tok = self.current();
                Err(ParseError::UnexpectedToken {
                    found: tok.kind.to_string(),
                    expected: expected.to_string(),
                    line: tok.span.line,
                    col: tok.span.col,
                })
            }
        }
    }

    fn parse_if(&mut self, start: Span) -> PResult<(StatementKind, Span)> {
        self.advance(); // if
        let mut branches = Vec::new();
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::Colon, "':' after 'if' condition")?;
        let body = self.parse_indented_block()?;
        branches.push((cond, body));
        let mut else_block = None;
        loop {
            self.skip_separators();
            match self.kind() {
                TokenKind::Elif => {
                    self.advance();
                    let cond = self.parse_expr()?;
                    self.expect(&TokenKind::Colon, "':' after 'elif' condition")?;
                    let body = self.parse_indented_block()?;
                    branches.push((cond, body));
                }
                TokenKind::Else => {
                    self.advance();
                    self.expect(&TokenKind::Colon, "':' after 'else'")?;
                    else_block = Some(self.parse_indented_block()?);
                    break;
                }
                _ => break,
            }
        }
        Ok((StatementKind::If { branches, else_block }, start))
    }

    fn parse_while(&mut self, start: Span) -> PResult<(StatementKind, Span)> {
        self.advance();
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::Colon, "':' after 'while' condition")?;
        let body = self.parse_indented_block()?;
        Ok((StatementKind::While { cond, body }, start))
    }

    fn parse_for(&mut self, start: Span) -> PResult<(StatementKind, Span)> {
        self.advance();
        let var = self.expect_ident("a loop variable")?;
        self.expect(&TokenKind::In, "'in' after loop variable")?;
        let iterable = self.parse_expr()?;
        self.expect(&TokenKind::Colon, "':' after 'for' header")?;
        let body = self.parse_indented_block()?;
        Ok((StatementKind::For { var, iterable, body }, start))
    }

    fn parse_fn_def(&mut self, start: Span, infix: bool) -> PResult<(StatementKind, Span)> {
        let name = self.expect_ident("a function name")?;
        let (params, body) = self.parse_fn_tail()?;
        Ok((StatementKind::FnDef { name, params, infix, body }, start))
    }

    /// Parses the parameter list, `:`, and body shared by both a named
    /// `fn name(...):` statement and an anonymous `fn(...):` expression.
    /// A single-ID parameter list may omit the parentheses (`fn x: x + 1`).
    fn parse_fn_tail(&mut self) -> PResult<(Vec<Param>, FnBody)> {
        let mut params = Vec::new();
        if self.check(&TokenKind::LParen) {
            self.advance();
            if !self.check(&TokenKind::RParen) {
                loop {
                    let pspan = self.span();
                    let pname = self.expect_ident("a parameter name")?;
                    params.push(Param { name: pname, span: pspan });
                    if self.check(&TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RParen, "')' closing parameter list")?;
        } else if let TokenKind::Ident(_) = self.kind() {
            let pspan = self.span();
            let pname = self.expect_ident("a parameter name")?;
            params.push(Param { name: pname, span: pspan });
        }
        self.expect(&TokenKind::Colon, "':' after function signature")?;
        let body = if self.at_statement_end() {
            FnBody::Block(self.parse_indented_block()?)
        } else {
            FnBody::Expr(Box::new(self.parse_expr()?))
        };
        Ok((params, body))
    }

    fn parse_simple_statement(&mut self, start: Span) -> PResult<(StatementKind, Span)> {
        let expr = self.parse_expr()?;
        let kind = match self.kind().clone() {
            TokenKind::Assign => {
                self.advance();
                let value = self.parse_expr()?;
                StatementKind::Assign { target: Self::expr_to_target(expr, start.line)?, op: AssignOp::Assign, value }
            }
            TokenKind::PlusAssign => {
                self.advance();
                let value = self.parse_expr()?;
                StatementKind::Assign { target: Self::expr_to_target(expr, start.line)?, op: AssignOp::AddAssign, value }
            }
            TokenKind::MinusAssign => {
                self.advance();
                let value = self.parse_expr()?;
                StatementKind::Assign { target: Self::expr_to_target(expr, start.line)?, op: AssignOp::SubAssign, value }
            }
            TokenKind::PlusPlus => {
                self.advance();
                StatementKind::IncDec { name: Self::expr_to_name(expr, start.line)?, increment: true }
            }
            TokenKind::MinusMinus => {
                self.advance();
                StatementKind::IncDec { name: Self::expr_to_name(expr, start.line)?, increment: false }
            }
            _ => StatementKind::Expr(expr),
        };
        Ok((kind, start))
    }

    /// A bare `Call` target (`m(i, j) = v`) is also a valid assignment
    /// target: whether `m` is a Matrix (element write) or an ordinary
    /// function (an error) is a runtime question, not a parse-time one
    /// (§4.5 "Change on FunctionCall").
    fn expr_to_target(expr: Expression, line: usize) -> PResult<AssignTarget> {
        match expr.kind {
            ExpressionKind::Ident(name) => Ok(AssignTarget::Name(name)),
            ExpressionKind::Index { target, indices } => Ok(AssignTarget::Index(*target, indices)),
            ExpressionKind::Call { callee, args } => Ok(AssignTarget::Index(*callee, args)),
            _ => Err(ParseError::InvalidAssignTarget("expression".to_string(), line)),
        }
    }

    fn expr_to_name(expr: Expression, line: usize) -> PResult<String> {
        match expr.kind {
            ExpressionKind::Ident(name) => Ok(name),
            _ => Err(ParseError::InvalidAssignTarget("expression".to_string(), line)),
        }
    }

    // ---- expressions: loosest to tightest ----

    pub fn parse_expr(&mut self) -> PResult<Expression> {
        self.parse_infix_call()
    }

    fn parse_infix_call(&mut self) -> PResult<Expression> {
        let mut left = self.parse_ternary()?;
        while let TokenKind::Ident(name) = self.kind().clone() {
            // Only a call if another operand plausibly follows; an Ident at
            // statement end belongs to the *next* statement, not this one.
            if self.at_statement_end() {
                break;
            }
            let save = self.pos;
            self.advance();
            match self.parse_ternary() {
                Ok(right) => {
                    let span = left.span.merge(right.span);
                    left = Expression::new(
                        ExpressionKind::InfixCall { lhs: Box::new(left), name, rhs: Box::new(right) },
                        span,
                    );
                }
                Err(_) => {
                    self.pos = save;
                    break;
                }
            }
        }
        Ok(left)
    }

    fn parse_ternary(&mut self) -> PResult<Expression> {
        let then_expr = self.parse_or()?;
        if self.check(&TokenKind::If) {
            self.advance();
            let cond = self.parse_or()?;
            if self.check(&TokenKind::Else) {
                self.advance();
                let else_expr = self.parse_ternary()?;
                let span = then_expr.span.merge(else_expr.span);
                return Ok(Expression::new(
                    ExpressionKind::Ternary { cond: Box::new(cond), then_expr: Box::new(then_expr), else_expr: Box::new(else_expr) },
                    span,
                ));
            }
            // No `else`: the short-circuit "left if right" form (§4.5).
            let span = then_expr.span.merge(cond.span);
            return Ok(Expression::new(
                ExpressionKind::ShortIf { left: Box::new(then_expr), cond: Box::new(cond) },
                span,
            ));
        }
        Ok(then_expr)
    }

    fn parse_or(&mut self) -> PResult<Expression> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            let span = left.span.merge(right.span);
            left = Expression::new(ExpressionKind::Binary { op: BinaryOp::Or, lhs: Box::new(left), rhs: Box::new(right) }, span);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> PResult<Expression> {
        let mut left = self.parse_not()?;
        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_not()?;
            let span = left.span.merge(right.span);
            left = Expression::new(ExpressionKind::Binary { op: BinaryOp::And, lhs: Box::new(left), rhs: Box::new(right) }, span);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> PResult<Expression> {
        if self.check(&TokenKind::Not) {
            let start = self.span();
            self.advance();
            let expr = self.parse_not()?;
            let span = start.merge(expr.span);
            return Ok(Expression::new(ExpressionKind::Unary { op: UnaryOp::Not, expr: Box::new(expr) }, span));
        }
        self.parse_in()
    }

    fn parse_in(&mut self) -> PResult<Expression> {
        let left = self.parse_comparison()?;
        if self.check(&TokenKind::In) {
            self.advance();
            let right = self.parse_comparison()?;
            let span = left.span.merge(right.span);
            return Ok(Expression::new(ExpressionKind::In { item: Box::new(left), collection: Box::new(right) }, span));
        }
        Ok(left)
    }

    fn comparison_op(kind: &TokenKind) -> Option<BinaryOp> {
        match kind {
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        }
    }

    /// Chained comparisons (`a < b < c`) desugar to a conjunction of the
    /// adjacent pairwise comparisons, as in `a < b and b < c`.
    fn parse_comparison(&mut self) -> PResult<Expression> {
        let first = self.parse_additive()?;
        let mut chain: Option<Expression> = None;
        let mut left = first;
        while let Some(op) = Self::comparison_op(self.kind()) {
            self.advance();
            let right = self.parse_additive()?;
            let span = left.span.merge(right.span);
            let pair = Expression::new(
                ExpressionKind::Binary { op, lhs: Box::new(left.clone()), rhs: Box::new(right.clone()) },
                span,
            );
            chain = Some(match chain {
                None => pair,
                Some(prev) => {
                    let span = prev.span.merge(pair.span);
                    Expression::new(ExpressionKind::Binary { op: BinaryOp::And, lhs: Box::new(prev), rhs: Box::new(pair) }, span)
                }
            });
            left = right;
        }
        Ok(chain.unwrap_or(left))
    }

    fn parse_additive(&mut self) -> PResult<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = left.span.merge(right.span);
            left = Expression::new(ExpressionKind::Binary { op, lhs: Box::new(left), rhs: Box::new(right) }, span);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expression> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::DotStar => BinaryOp::DotMul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            let span = left.span.merge(right.span);
            left = Expression::new(ExpressionKind::Binary { op, lhs: Box::new(left), rhs: Box::new(right) }, span);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> PResult<Expression> {
        let left = self.parse_unary()?;
        let op = match self.kind() {
            TokenKind::Caret => BinaryOp::Pow,
            TokenKind::DotCaret => BinaryOp::DotPow,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_power()?; // right-assoc
        let span = left.span.merge(right.span);
        Ok(Expression::new(ExpressionKind::Binary { op, lhs: Box::new(left), rhs: Box::new(right) }, span))
    }

    fn parse_unary(&mut self) -> PResult<Expression> {
        if self.check(&TokenKind::Minus) {
            let start = self.span();
            self.advance();
            let expr = self.parse_unary()?;
            let span = start.merge(expr.span);
            return Ok(Expression::new(ExpressionKind::Unary { op: UnaryOp::Neg, expr: Box::new(expr) }, span));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<Expression> {
        let mut expr = self.parse_call_index()?;
        while self.check(&TokenKind::Apostrophe) {
            let end = self.span();
            self.advance();
            let span = expr.span.merge(end);
            expr = Expression::new(ExpressionKind::Unary { op: UnaryOp::Transpose, expr: Box::new(expr) }, span);
        }
        Ok(expr)
    }

    fn parse_call_index(&mut self) -> PResult<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.kind() {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.check(&TokenKind::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    let end = self.expect(&TokenKind::RParen, "')' closing call arguments")?.span;
                    let span = expr.span.merge(end);
                    expr = Expression::new(ExpressionKind::Call { callee: Box::new(expr), args }, span);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let mut indices = Vec::new();
                    loop {
                        indices.push(self.parse_index_component()?);
                        if self.check(&TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    let end = self.expect(&TokenKind::RBracket, "']' closing index")?.span;
                    let span = expr.span.merge(end);
                    expr = Expression::new(ExpressionKind::Index { target: Box::new(expr), indices }, span);
                }
                TokenKind::Dot => {
                    self.advance();
                    self.expect(&TokenKind::LParen, "'(' after '.' for a spread call")?;
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.check(&TokenKind::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    let end = self.expect(&TokenKind::RParen, "')' closing spread call arguments")?.span;
                    let span = expr.span.merge(end);
                    expr = Expression::new(ExpressionKind::SpreadCall { callee: Box::new(expr), args }, span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_index_component(&mut self) -> PResult<Expression> {
        let start = self.span();
        let start_expr = if self.check(&TokenKind::Colon) { None } else { Some(self.parse_expr()?) };
        if !self.check(&TokenKind::Colon) {
            return start_expr.ok_or_else(|| ParseError::UnexpectedToken {
                found: self.kind().to_string(),
                expected: "an index expression".to_string(),
                line: self.span().line,
                col: self.span().col,
            });
        }
        self.advance(); // first colon
        let stop_expr = if matches!(self.kind(), TokenKind::Colon | TokenKind::RBracket | TokenKind::Comma) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let step_expr = if self.check(&TokenKind::Colon) {
            self.advance();
            if matches!(self.kind(), TokenKind::RBracket | TokenKind::Comma) { None } else { Some(self.parse_expr()?) }
        } else {
            None
        };
        let end = self.span();
        Ok(Expression::new(
            ExpressionKind::SliceLit {
                start: start_expr.map(Box::new),
                stop: stop_expr.map(Box::new),
                step: step_expr.map(Box::new),
            },
            start.merge(end),
        ))
    }

    fn parse_primary(&mut self) -> PResult<Expression> {
        let start = self.span();
        match self.kind().clone() {
            TokenKind::IntLit(n) => {
                self.advance();
                self.fold_implicit_mul(Expression::new(ExpressionKind::IntLit(n), start))
            }
            TokenKind::FloatLit(n) => {
                self.advance();
                self.fold_implicit_mul(Expression::new(ExpressionKind::FloatLit(n), start))
            }
            TokenKind::ImaginaryLit(n) => {
                self.advance();
                Ok(Expression::new(ExpressionKind::ImaginaryLit(n), start))
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Ok(Expression::new(ExpressionKind::StringLit(s), start))
            }
            TokenKind::BoolLit(b) => {
                self.advance();
                Ok(Expression::new(ExpressionKind::BoolLit(b), start))
            }
            TokenKind::NoneLit => {
                self.advance();
                Ok(Expression::new(ExpressionKind::NoneLit, start))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expression::new(ExpressionKind::Ident(name), start))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let end = self.expect(&TokenKind::RParen, "')' closing a parenthesized expression")?.span;
                let mut inner = inner;
                inner.span = start.merge(end);
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_matrix_literal(start),
            TokenKind::Infix => {
                self.advance();
                self.expect(&TokenKind::Fn, "'fn' after 'infix'")?;
                let (params, body) = self.parse_fn_tail()?;
                let end = self.span();
                Ok(Expression::new(ExpressionKind::FnLit { params, infix: true, body }, start.merge(end)))
            }
            TokenKind::Fn => {
                self.advance();
                let (params, body) = self.parse_fn_tail()?;
                let end = self.span();
                Ok(Expression::new(ExpressionKind::FnLit { params, infix: false, body }, start.merge(end)))
            }
            _ => {
                let tok = self.current();
                Err(ParseError::UnexpectedToken {
                    found: tok.kind.to_string(),
                    expected: "an expression".to_string(),
                    line: tok.span.line,
                    col: tok.span.col,
                })
            }
        }
    }

    /// Folds the `3x` leading-numeric-coefficient form into `3 * x`. Only
    /// applies when the identifier is glued directly onto the number with no
    /// separating whitespace — `2 plus 3` stays an infix call, not `2 * plus`.
    fn fold_implicit_mul(&mut self, number: Expression) -> PResult<Expression> {
        let glued = matches!(self.kind(), TokenKind::Ident(_)) && self.span().start == number.span.end;
        if let TokenKind::Ident(name) = self.kind().clone() {
            if !glued {
                return Ok(number);
            }
            let ident_span = self.span();
            self.advance();
            let rhs = Expression::new(ExpressionKind::Ident(name), ident_span);
            let span = number.span.merge(rhs.span);
            return Ok(Expression::new(
                ExpressionKind::Binary { op: BinaryOp::Mul, lhs: Box::new(number), rhs: Box::new(rhs) },
                span,
            ));
        }
        Ok(number)
    }

    /// `[` elements separated by `,` (same row) and `;` (new row) `]`
    /// (§4.4). An element may itself be any expression, including a nested
    /// matrix literal or a variable bound to a Matrix — the evaluator
    /// generalizes row/column assembly to matrix concatenation, so
    /// `[[1,2],[3,4]]` (row-per-bracket) and `[A, B]` (concatenating two
    /// existing matrices) both fall out of the same grammar as the plain
    /// `[1,2;3,4]` form.
    fn parse_matrix_literal(&mut self, start: Span) -> PResult<Expression> {
        self.advance(); // [
        if self.check(&TokenKind::RBracket) {
            let end = self.advance().span;
            return Ok(Expression::new(ExpressionKind::MatrixLit { rows: vec![] }, start.merge(end)));
        }
        let mut rows = Vec::new();
        let mut row = vec![self.parse_expr()?];
        loop {
            match self.kind() {
                TokenKind::Comma => {
                    self.advance();
                    row.push(self.parse_expr()?);
                }
                TokenKind::Semicolon => {
                    self.advance();
                    rows.push(std::mem::take(&mut row));
                    row.push(self.parse_expr()?);
                }
                _ => break,
            }
        }
        rows.push(row);
        let end = self.expect(&TokenKind::RBracket, "']' closing a matrix literal")?.span;
        Ok(Expression::new(ExpressionKind::MatrixLit { rows }, start.merge(end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(tokens).parse_program().unwrap()
    }

    #[test]
    fn parses_assignment() {
        let prog = parse("x = 1 + 2\n");
        assert_eq!(prog.body.nodes.len(), 1);
        assert!(matches!(prog.body.nodes[0].kind, StatementKind::Assign { .. }));
    }

    #[test]
    fn parses_if_elif_else() {
        let prog = parse("if x:\n\tpass\nelif y:\n\tpass\nelse:\n\tpass\n");
        match &prog.body.nodes[0].kind {
            StatementKind::If { branches, else_block } => {
                assert_eq!(branches.len(), 2);
                assert!(else_block.is_some());
            }
            _ => panic!("expected if"),
        }
    }

    #[test]
    fn parses_matrix_literal() {
        let prog = parse("A = [1, 2; 3, 4]\n");
        match &prog.body.nodes[0].kind {
            StatementKind::Assign { value, .. } => match &value.kind {
                ExpressionKind::MatrixLit { rows } => {
                    assert_eq!(rows.len(), 2);
                    assert_eq!(rows[0].len(), 2);
                }
                _ => panic!("expected matrix literal"),
            },
            _ => panic!("expected assign"),
        }
    }

    #[test]
    fn chains_comparisons_into_conjunction() {
        let prog = parse("x = 1 < 2 < 3\n");
        match &prog.body.nodes[0].kind {
            StatementKind::Assign { value, .. } => {
                assert!(matches!(value.kind, ExpressionKind::Binary { op: BinaryOp::And, .. }));
            }
            _ => panic!("expected assign"),
        }
    }

    #[test]
    fn folds_leading_numeric_coefficient() {
        let prog = parse("y = 3x\n");
        match &prog.body.nodes[0].kind {
            StatementKind::Assign { value, .. } => {
                assert!(matches!(value.kind, ExpressionKind::Binary { op: BinaryOp::Mul, .. }));
            }
            _ => panic!("expected assign"),
        }
    }

    #[test]
    fn parses_transpose_after_identifier() {
        let prog = parse("print(A')\n");
        match &prog.body.nodes[0].kind {
            StatementKind::Expr(e) => match &e.kind {
                ExpressionKind::Call { args, .. } => {
                    assert!(matches!(args[0].kind, ExpressionKind::Unary { op: UnaryOp::Transpose, .. }));
                }
                _ => panic!("expected call"),
            },
            _ => panic!("expected expr statement"),
        }
    }

    #[test]
    fn parses_anonymous_function_expression() {
        let prog = parse("f = fn(a, b): a + b\n");
        match &prog.body.nodes[0].kind {
            StatementKind::Assign { value, .. } => {
                assert!(matches!(value.kind, ExpressionKind::FnLit { .. }));
            }
            _ => panic!("expected assign"),
        }
    }

    #[test]
    fn parses_spread_call() {
        let prog = parse("f.(x, y)\n");
        match &prog.body.nodes[0].kind {
            StatementKind::Expr(e) => assert!(matches!(e.kind, ExpressionKind::SpreadCall { .. })),
            _ => panic!("expected expr statement"),
        }
    }

    #[test]
    fn parses_short_if_without_else() {
        let prog = parse("x = 1 if y\n");
        match &prog.body.nodes[0].kind {
            StatementKind::Assign { value, .. } => assert!(matches!(value.kind, ExpressionKind::ShortIf { .. })),
            _ => panic!("expected assign"),
        }
    }

    #[test]
    fn parses_del_on_matrix_index() {
        let prog = parse("del a[1]\n");
        match &prog.body.nodes[0].kind {
            StatementKind::Del(AssignTarget::Index(..)) => {}
            _ => panic!("expected del of an index target"),
        }
    }
}
