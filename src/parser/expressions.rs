//! Expressions: precedence climbing, unary and cast forms, primaries and
//! the path chain that follows them.

use super::error::{ParseError, ParseResult};
use super::lexer::{self, Token};
use super::parser::Parser;
use super::predicates;
use super::span::{Location, Spanned};
use super::types::TypeScan;
use crate::ast::*;

// Binding power of each operator class, loosest first
pub(super) const ASSIGNMENT: u8 = 1;
pub(super) const CONDITIONAL: u8 = 3;
const OR: u8 = 4;
const AND: u8 = 5;
const BIT_OR: u8 = 6;
const XOR: u8 = 7;
const BIT_AND: u8 = 8;
const REGEX: u8 = 9;
const EQUALITY: u8 = 10;
const RELATIONAL: u8 = 11;
const TYPE_TEST: u8 = 12;
const SHIFT: u8 = 13;
const ADDITIVE: u8 = 14;
const MULTIPLICATIVE: u8 = 15;
pub(super) const POWER: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operator {
    Binary(BinaryOp),
    Power,
    Range { exclusive: bool },
    InstanceOf { negated: bool },
    As,
    Ternary,
    Elvis,
    Assign(AssignOp),
}

/// An operator found in the token stream
#[derive(Debug, Clone, Copy)]
struct OperatorMatch {
    operator: Operator,
    precedence: u8,
    right_assoc: bool,
    /// Tokens the operator occupies; shifts are built from several
    width: usize,
}

impl OperatorMatch {
    fn left(operator: Operator, precedence: u8) -> Self {
        Self { operator, precedence, right_assoc: false, width: 1 }
    }

    fn right(operator: Operator, precedence: u8) -> Self {
        Self { operator, precedence, right_assoc: true, width: 1 }
    }
}

/// The last element applied by the path chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PathElement {
    Primary,
    /// The primary was a parenthesised expression
    Parens,
    Member,
    Call,
    Index,
}

fn assign_op(token: Token) -> Option<AssignOp> {
    Some(match token {
        Token::Assign => AssignOp::Assign,
        Token::AddAssign => AssignOp::Add,
        Token::SubAssign => AssignOp::Sub,
        Token::MulAssign => AssignOp::Mul,
        Token::DivAssign => AssignOp::Div,
        Token::ModAssign => AssignOp::Mod,
        Token::AndAssign => AssignOp::BitAnd,
        Token::OrAssign => AssignOp::BitOr,
        Token::XorAssign => AssignOp::BitXor,
        Token::LShiftAssign => AssignOp::LShift,
        Token::RShiftAssign => AssignOp::RShift,
        Token::URShiftAssign => AssignOp::URShift,
        Token::PowerAssign => AssignOp::Power,
        Token::ElvisAssign => AssignOp::Elvis,
        _ => return None,
    })
}

impl Parser {
    fn expr(&self, kind: ExprKind, start: Location) -> Expr {
        Spanned::new(kind, self.span_from(start))
    }

    /// Binary, ternary and assignment operator at token `index`
    fn operator_at(&self, index: usize) -> Option<OperatorMatch> {
        use OperatorMatch as M;
        let kind = self.kind_at(index);
        let found = match kind {
            Token::Lt if self.kind_at(index + 1) == Token::Lt && self.adjacent(index, index + 1) => M {
                width: 2,
                ..M::left(Operator::Binary(BinaryOp::LShift), SHIFT)
            },
            Token::Gt if self.kind_at(index + 1) == Token::Gt && self.adjacent(index, index + 1) => {
                if self.kind_at(index + 2) == Token::Gt && self.adjacent(index + 1, index + 2) {
                    M { width: 3, ..M::left(Operator::Binary(BinaryOp::URShift), SHIFT) }
                } else {
                    M { width: 2, ..M::left(Operator::Binary(BinaryOp::RShift), SHIFT) }
                }
            }
            Token::Range => M::left(Operator::Range { exclusive: false }, SHIFT),
            Token::RangeExclusive => M::left(Operator::Range { exclusive: true }, SHIFT),
            Token::Power => M::right(Operator::Power, POWER),
            Token::Star => M::left(Operator::Binary(BinaryOp::Mul), MULTIPLICATIVE),
            Token::Slash => M::left(Operator::Binary(BinaryOp::Div), MULTIPLICATIVE),
            Token::Percent => M::left(Operator::Binary(BinaryOp::Mod), MULTIPLICATIVE),
            Token::Plus => M::left(Operator::Binary(BinaryOp::Add), ADDITIVE),
            Token::Minus => M::left(Operator::Binary(BinaryOp::Sub), ADDITIVE),
            Token::As => M::left(Operator::As, TYPE_TEST),
            Token::Instanceof => M::left(Operator::InstanceOf { negated: false }, TYPE_TEST),
            Token::NotInstanceof => M::left(Operator::InstanceOf { negated: true }, TYPE_TEST),
            Token::Lt => M::left(Operator::Binary(BinaryOp::Lt), RELATIONAL),
            Token::Gt => M::left(Operator::Binary(BinaryOp::Gt), RELATIONAL),
            Token::Le => M::left(Operator::Binary(BinaryOp::Le), RELATIONAL),
            Token::Ge => M::left(Operator::Binary(BinaryOp::Ge), RELATIONAL),
            Token::In => M::left(Operator::Binary(BinaryOp::In), RELATIONAL),
            Token::NotIn => M::left(Operator::Binary(BinaryOp::NotIn), RELATIONAL),
            Token::Eq => M::left(Operator::Binary(BinaryOp::Eq), EQUALITY),
            Token::Ne => M::left(Operator::Binary(BinaryOp::Ne), EQUALITY),
            Token::Spaceship => M::left(Operator::Binary(BinaryOp::Spaceship), EQUALITY),
            Token::Identical => M::left(Operator::Binary(BinaryOp::Identical), EQUALITY),
            Token::NotIdentical => M::left(Operator::Binary(BinaryOp::NotIdentical), EQUALITY),
            Token::RegexFind => M::left(Operator::Binary(BinaryOp::RegexFind), REGEX),
            Token::RegexMatch => M::left(Operator::Binary(BinaryOp::RegexMatch), REGEX),
            Token::Amp => M::left(Operator::Binary(BinaryOp::BitAnd), BIT_AND),
            Token::Caret => M::left(Operator::Binary(BinaryOp::BitXor), XOR),
            Token::Pipe => M::left(Operator::Binary(BinaryOp::BitOr), BIT_OR),
            Token::AndAnd => M::left(Operator::Binary(BinaryOp::And), AND),
            Token::PipePipe => M::left(Operator::Binary(BinaryOp::Or), OR),
            Token::Question => M::right(Operator::Ternary, CONDITIONAL),
            Token::Elvis => M::right(Operator::Elvis, CONDITIONAL),
            other => M::right(Operator::Assign(assign_op(other)?), ASSIGNMENT),
        };
        Some(found)
    }

    /// The next operator, which may sit on a following line unless it could
    /// also start a new statement (`+`, `-`, a generic method header) or is `**`
    fn next_operator(&self) -> Option<(usize, OperatorMatch)> {
        let index = self.skip_newlines_from(self.current);
        let found = self.operator_at(index)?;
        if index != self.current {
            match self.kind_at(index) {
                Token::Plus | Token::Minus | Token::Power => return None,
                Token::Lt if self.method_name_index(index).is_some() => {
                    log::trace!("'<' at token {} opens a generic method header", index);
                    return None;
                }
                _ => {}
            }
        }
        Some((index, found))
    }

    /// Precedence climbing over every binary form, starting at `min_prec`
    pub(super) fn parse_expression(&mut self, min_prec: u8) -> ParseResult<Expr> {
        self.nested(|p| p.parse_expression_inner(min_prec))
    }

    fn parse_expression_inner(&mut self, min_prec: u8) -> ParseResult<Expr> {
        if min_prec <= ASSIGNMENT {
            if let Some(multiple) = self.try_parse_multiple_assignment()? {
                return Ok(multiple);
            }
            if self.is_lambda_start() {
                return self.parse_lambda();
            }
        }

        let mut left = self.parse_unary()?;
        while let Some((index, found)) = self.next_operator() {
            if found.precedence < min_prec {
                break;
            }
            self.current = index + found.width;
            self.nls();
            let start = left.span.start;
            let next_min = if found.right_assoc { found.precedence } else { found.precedence + 1 };

            let kind = match found.operator {
                Operator::Binary(op) => {
                    let right = self.parse_expression(next_min)?;
                    ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) }
                }
                Operator::Power => {
                    let exponent = self.parse_expression(next_min)?;
                    ExprKind::Power { base: Box::new(left), exponent: Box::new(exponent) }
                }
                Operator::Range { exclusive } => {
                    let to = self.parse_expression(next_min)?;
                    ExprKind::Range { from: Box::new(left), to: Box::new(to), exclusive }
                }
                Operator::InstanceOf { negated } => {
                    let target_type = self.parse_type()?;
                    ExprKind::InstanceOf { expr: Box::new(left), target_type, negated }
                }
                Operator::As => {
                    let target_type = self.parse_type()?;
                    ExprKind::Cast { target_type, operand: Box::new(left), coerce: true }
                }
                Operator::Ternary => {
                    let then_branch = self.parse_expression(0)?;
                    self.nls();
                    self.consume(&Token::Colon, "':' in conditional expression")?;
                    self.nls();
                    let else_branch = self.parse_expression(CONDITIONAL)?;
                    ExprKind::Ternary {
                        condition: Box::new(left),
                        then_branch: Box::new(then_branch),
                        else_branch: Box::new(else_branch),
                    }
                }
                Operator::Elvis => {
                    let right = self.parse_expression(CONDITIONAL)?;
                    ExprKind::Elvis { left: Box::new(left), right: Box::new(right) }
                }
                Operator::Assign(op) => {
                    let value = self.parse_command_expression()?;
                    ExprKind::Assignment { target: Box::new(left), op, value: Box::new(value) }
                }
            };
            left = self.expr(kind, start);
        }
        Ok(left)
    }

    /// Matching `)` for the `(` at `open`, and whether a comma appears at its top level
    pub(super) fn scan_parens(&self, open: usize) -> Option<(usize, bool)> {
        let limit = open.saturating_add(self.config.max_lookahead);
        let mut depth = 0usize;
        let mut top_comma = false;
        let mut i = open;
        while i <= limit {
            match self.kind_at(i) {
                Token::LParen | Token::LBracket | Token::SafeIndex | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((i, top_comma));
                    }
                }
                Token::Comma if depth == 1 => top_comma = true,
                Token::Eof => return None,
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// `(a, b) = value`
    fn try_parse_multiple_assignment(&mut self) -> ParseResult<Option<Expr>> {
        if !self.check(&Token::LParen) {
            return Ok(None);
        }
        let Some((close, true)) = self.scan_parens(self.current) else {
            return Ok(None);
        };
        if self.kind_at(self.skip_newlines_from(close + 1)) != Token::Assign {
            return Ok(None);
        }

        let start = self.current_location();
        self.advance();
        let mut targets = Vec::new();
        loop {
            let element = self.peek();
            let follows = self.peek_kind(1);
            if !element.token.is_identifier_like() || !matches!(follows, Token::Comma | Token::RParen) {
                return Err(ParseError::invalid_declaration(
                    "multiple assignment",
                    format!("assignment targets must be plain identifiers, found {}", element.describe()),
                    element.location,
                ));
            }
            targets.push(self.advance().lexeme.clone());
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::RParen, "')' after assignment targets")?;
        self.nls();
        self.consume(&Token::Assign, "'='")?;
        self.nls();
        let value = self.parse_command_expression()?;
        Ok(Some(self.expr(ExprKind::MultipleAssignment { targets, value: Box::new(value) }, start)))
    }

    pub(super) fn is_lambda_start(&self) -> bool {
        let kind = self.peek().token;
        if kind.is_identifier_like() {
            return self.peek_kind(1) == Token::Arrow;
        }
        if kind != Token::LParen {
            return false;
        }
        match self.scan_parens(self.current) {
            Some((close, _)) => self.kind_at(self.skip_newlines_from(close + 1)) == Token::Arrow,
            None => false,
        }
    }

    /// `x -> body`, `(a, int b) -> body` or `() -> { ... }`
    fn parse_lambda(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        let params = if self.check(&Token::LParen) {
            self.advance();
            let params = if self.check(&Token::RParen) { Vec::new() } else { self.parse_formal_parameters()? };
            self.consume(&Token::RParen, "')' after lambda parameters")?;
            params
        } else {
            vec![Parameter {
                modifiers: Vec::new(),
                param_type: None,
                varargs: false,
                name: self.parse_identifier()?,
                default_value: None,
                is_receiver: false,
            }]
        };
        self.nls();
        self.consume(&Token::Arrow, "'->'")?;
        self.nls();
        let body = if self.check(&Token::LBrace) {
            LambdaBody::Block(self.parse_block()?)
        } else {
            LambdaBody::Expr(Box::new(self.parse_command_expression()?))
        };
        Ok(self.expr(ExprKind::Lambda { params, body }, start))
    }

    // Unary level

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        let op = match self.peek().token {
            Token::Plus => UnaryOp::Plus,
            Token::Minus => UnaryOp::Minus,
            Token::Inc => UnaryOp::Inc,
            Token::Dec => UnaryOp::Dec,
            Token::Bang | Token::Tilde => {
                let op = if self.check(&Token::Bang) { UnaryOp::Not } else { UnaryOp::BitNot };
                self.advance();
                self.nls();
                let operand = self.nested(Self::parse_unary)?;
                return Ok(self.expr(ExprKind::Unary { op, operand: Box::new(operand), prefix: true }, start));
            }
            Token::LParen => {
                if let Some(cast) = self.try_parse_cast()? {
                    return Ok(cast);
                }
                return self.parse_postfix();
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        // prefix `+ - ++ --` bind looser than `**`: -2 ** 2 is -(2 ** 2)
        let operand = self.parse_expression(POWER)?;
        Ok(self.expr(ExprKind::Unary { op, operand: Box::new(operand), prefix: true }, start))
    }

    /// `(Type) operand`, or `None` when the parentheses hold an expression
    fn try_parse_cast(&mut self) -> ParseResult<Option<Expr>> {
        let open = self.current;
        let location = self.current_location();
        let end = match self.scan_type(open + 1) {
            TypeScan::Type(end) if self.kind_at(end) == Token::RParen => end,
            TypeScan::TooLong => {
                return Err(ParseError::ambiguous(
                    "cast",
                    "parenthesised type runs past the lookahead limit",
                    location,
                ));
            }
            _ => return Ok(None),
        };

        let primitive = end == open + 2 && self.kind_at(open + 1).is_primitive_type();
        let window = &self.tokens[(end + 1).min(self.tokens.len() - 1)..];
        if !predicates::is_cast_operand_start(window, primitive) {
            log::trace!("'(' at {} is a parenthesised expression", location);
            return Ok(None);
        }

        self.advance();
        let target_type = match self.parse_type() {
            Ok(target_type) if self.check(&Token::RParen) => target_type,
            _ => {
                log::trace!("cast trial at {} failed, reparsing as expression", location);
                self.current = open;
                return Ok(None);
            }
        };
        self.advance();
        log::debug!("cast at {}", location);
        let operand = self.nested(Self::parse_cast_operand)?;
        Ok(Some(self.expr(
            ExprKind::Cast { target_type, operand: Box::new(operand), coerce: false },
            location,
        )))
    }

    fn parse_cast_operand(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        let op = match self.peek().token {
            Token::Plus => UnaryOp::Plus,
            Token::Minus => UnaryOp::Minus,
            Token::Inc => UnaryOp::Inc,
            Token::Dec => UnaryOp::Dec,
            _ => return self.parse_unary(),
        };
        self.advance();
        let operand = self.nested(Self::parse_cast_operand)?;
        Ok(self.expr(ExprKind::Unary { op, operand: Box::new(operand), prefix: true }, start))
    }

    /// Primary, path chain and postfix `++`/`--`
    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        let first = if self.check(&Token::LParen) { PathElement::Parens } else { PathElement::Primary };
        let primary = self.parse_primary()?;
        let mut expr = self.parse_path_chain(primary, first)?.0;
        while matches!(self.peek().token, Token::Inc | Token::Dec) {
            let op = if self.check(&Token::Inc) { UnaryOp::Inc } else { UnaryOp::Dec };
            self.advance();
            expr = self.expr(ExprKind::Unary { op, operand: Box::new(expr), prefix: false }, start);
        }
        Ok(expr)
    }

    // Path chain

    fn is_path_operator(token: Token) -> bool {
        matches!(
            token,
            Token::Dot | Token::SafeDot | Token::SpreadDot | Token::MethodPointer | Token::DoubleColon
        )
    }

    /// Apply path elements to `expr` until none follows
    pub(super) fn parse_path_chain(&mut self, mut expr: Expr, mut last: PathElement) -> ParseResult<(Expr, PathElement)> {
        let start = expr.span.start;
        loop {
            let ahead = self.skip_newlines_from(self.current);
            let kind = self.kind_at(ahead);
            if Self::is_path_operator(kind) {
                self.current = ahead;
                let (next, element) = self.parse_member_element(expr, start)?;
                expr = next;
                last = element;
                continue;
            }

            match self.peek().token {
                Token::LParen => {
                    let args = self.parse_arguments()?;
                    expr = self.apply_call(expr, last, args, false, start);
                    last = PathElement::Call;
                }
                Token::LBracket | Token::SafeIndex => {
                    let safe = self.check(&Token::SafeIndex);
                    self.advance();
                    let args = self.parse_argument_list(&Token::RBracket)?;
                    self.consume(&Token::RBracket, "']'")?;
                    expr = self.expr(ExprKind::IndexAccess { receiver: Box::new(expr), args, safe }, start);
                    last = PathElement::Index;
                }
                Token::LBrace if self.accepts_trailing_closure(&expr, last) => {
                    let closure = self.parse_closure()?;
                    expr = self.apply_call(expr, last, vec![closure], true, start);
                    last = PathElement::Call;
                }
                _ => return Ok((expr, last)),
            }
        }
    }

    fn accepts_trailing_closure(&self, expr: &Expr, last: PathElement) -> bool {
        match &expr.value {
            ExprKind::Identifier(_) => last == PathElement::Primary,
            ExprKind::PropertyAccess { attribute, .. } => last == PathElement::Member && !attribute,
            ExprKind::MethodCall { .. } | ExprKind::Call { .. } => last == PathElement::Call,
            _ => false,
        }
    }

    /// Attach arguments to `expr`: names become method calls, a preceding
    /// call takes trailing closures, anything else is invoked as a value
    pub(super) fn apply_call(&self, expr: Expr, last: PathElement, mut args: Vec<Expr>, trailing: bool, start: Location) -> Expr {
        let kind = match expr.value {
            ExprKind::Identifier(name) if last == PathElement::Primary => ExprKind::MethodCall {
                receiver: None,
                name: MemberName::Ident(name),
                type_args: Vec::new(),
                args,
                safe: false,
                spread: false,
            },
            ExprKind::This | ExprKind::Super if last == PathElement::Primary => {
                let name = if expr.value == ExprKind::This { "this" } else { "super" };
                ExprKind::MethodCall {
                    receiver: None,
                    name: MemberName::Ident(name.to_string()),
                    type_args: Vec::new(),
                    args,
                    safe: false,
                    spread: false,
                }
            }
            ExprKind::PropertyAccess { receiver, name, safe, spread, attribute: false } if last == PathElement::Member => {
                ExprKind::MethodCall { receiver: Some(receiver), name, type_args: Vec::new(), args, safe, spread }
            }
            ExprKind::MethodCall { receiver, name, type_args, args: mut existing, safe, spread }
                if last == PathElement::Call && trailing =>
            {
                existing.append(&mut args);
                ExprKind::MethodCall { receiver, name, type_args, args: existing, safe, spread }
            }
            ExprKind::Call { callee, args: mut existing } if last == PathElement::Call && trailing => {
                existing.append(&mut args);
                ExprKind::Call { callee, args: existing }
            }
            other => ExprKind::Call { callee: Box::new(Spanned::new(other, expr.span)), args },
        };
        self.expr(kind, start)
    }

    /// One `.name`, `?.name`, `*.name`, `.@name`, `.&name`, `::name`,
    /// `.new Inner()` or `.<T>name(...)` element
    fn parse_member_element(&mut self, receiver: Expr, start: Location) -> ParseResult<(Expr, PathElement)> {
        let operator = self.advance().token;
        self.nls();

        match operator {
            Token::MethodPointer | Token::DoubleColon => {
                let name = self.parse_member_name()?;
                let kind = if operator == Token::MethodPointer {
                    ExprKind::MethodPointer { receiver: Box::new(receiver), name }
                } else {
                    ExprKind::MethodReference { receiver: Box::new(receiver), name }
                };
                return Ok((self.expr(kind, start), PathElement::Member));
            }
            Token::Dot if self.check(&Token::New) => {
                let creator = self.parse_creator(Some(receiver), start)?;
                return Ok((creator, PathElement::Call));
            }
            _ => {}
        }

        let safe = operator == Token::SafeDot;
        let spread = operator == Token::SpreadDot;
        let attribute = self.match_token(&Token::At);
        let type_args = if !attribute && self.check(&Token::Lt) { self.parse_type_arguments()? } else { Vec::new() };
        let name = self.parse_member_name()?;

        if !attribute && (self.check(&Token::LParen) || self.check(&Token::LBrace)) {
            let args = if self.check(&Token::LParen) { self.parse_arguments()? } else { vec![self.parse_closure()?] };
            let kind = ExprKind::MethodCall { receiver: Some(Box::new(receiver)), name, type_args, args, safe, spread };
            return Ok((self.expr(kind, start), PathElement::Call));
        }
        if !type_args.is_empty() {
            return Err(self.error_here("'(' after explicit type arguments"));
        }
        let kind = ExprKind::PropertyAccess { receiver: Box::new(receiver), name, safe, spread, attribute };
        Ok((self.expr(kind, start), PathElement::Member))
    }

    /// Identifier, keyword, string literal, GString or `(expr)` after a path operator
    pub(super) fn parse_member_name(&mut self) -> ParseResult<MemberName> {
        let token = self.peek();
        match token.token {
            Token::StringLiteral => {
                let name = lexer::string_value(&token.lexeme);
                self.advance();
                Ok(MemberName::Ident(name))
            }
            Token::GStringBegin => Ok(MemberName::Dynamic(Box::new(self.parse_gstring()?))),
            Token::LParen => {
                self.advance();
                let name = self.parse_expression(0)?;
                self.consume(&Token::RParen, "')' after dynamic member name")?;
                Ok(MemberName::Dynamic(Box::new(name)))
            }
            kind if kind == Token::Identifier || kind.is_keyword() => {
                Ok(MemberName::Ident(self.advance().lexeme.clone()))
            }
            _ => Err(self.error_here("member name")),
        }
    }

    // Arguments

    /// `(args)` with named arguments gathered into one leading map
    pub(super) fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        self.consume(&Token::LParen, "'('")?;
        let args = self.parse_argument_list(&Token::RParen)?;
        self.consume(&Token::RParen, "')' after arguments")?;
        Ok(args)
    }

    /// Arguments up to (not including) `close`
    pub(super) fn parse_argument_list(&mut self, close: &Token) -> ParseResult<Vec<Expr>> {
        let mut positional = Vec::new();
        let mut named: Vec<MapEntry> = Vec::new();
        let mut named_start = None;
        self.nls();
        if self.check(close) {
            return Ok(positional);
        }
        loop {
            if self.is_map_entry_start(self.current) {
                named_start.get_or_insert(self.current_location());
                named.push(self.parse_map_entry()?);
            } else {
                positional.push(self.parse_argument()?);
            }
            self.nls();
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.nls();
        }
        Ok(self.gather_named(positional, named, named_start))
    }

    pub(super) fn gather_named(&self, positional: Vec<Expr>, named: Vec<MapEntry>, start: Option<Location>) -> Vec<Expr> {
        let Some(start) = start else {
            return positional;
        };
        let mut args = Vec::with_capacity(positional.len() + 1);
        args.push(self.expr(ExprKind::Map(named), start));
        args.extend(positional);
        args
    }

    /// A positional argument or list element, `*spread` included
    pub(super) fn parse_argument(&mut self) -> ParseResult<Expr> {
        if self.check(&Token::Star) {
            let start = self.current_location();
            self.advance();
            let inner = self.parse_expression(CONDITIONAL)?;
            return Ok(self.expr(ExprKind::Spread(Box::new(inner)), start));
        }
        self.parse_expression(0)
    }

    /// Whether a `key:` map entry or named argument starts at `index`
    pub(super) fn is_map_entry_start(&self, index: usize) -> bool {
        match self.kind_at(index) {
            Token::Star => self.kind_at(index + 1) == Token::Colon,
            Token::IntegerLiteral | Token::FloatLiteral | Token::StringLiteral => {
                self.kind_at(index + 1) == Token::Colon
            }
            Token::LParen => match self.scan_parens(index) {
                Some((close, _)) => self.kind_at(close + 1) == Token::Colon,
                None => false,
            },
            Token::GStringBegin => {
                let limit = index.saturating_add(self.config.max_lookahead);
                let mut i = index + 1;
                while i <= limit {
                    match self.kind_at(i) {
                        Token::GStringEnd => return self.kind_at(i + 1) == Token::Colon,
                        Token::Eof => return false,
                        _ => i += 1,
                    }
                }
                false
            }
            _ => self.is_name_at(index) && self.kind_at(index + 1) == Token::Colon,
        }
    }

    pub(super) fn parse_map_entry(&mut self) -> ParseResult<MapEntry> {
        let start = self.current_location();
        let token = self.peek().clone();
        let key = match token.token {
            Token::Star => {
                self.advance();
                MapKey::Spread
            }
            Token::LParen => {
                self.advance();
                let key = self.parse_expression(0)?;
                self.consume(&Token::RParen, "')' after map key")?;
                MapKey::Expr(key)
            }
            Token::GStringBegin => MapKey::Expr(self.parse_gstring()?),
            Token::IntegerLiteral | Token::FloatLiteral | Token::StringLiteral => {
                self.advance();
                MapKey::Expr(self.expr(ExprKind::Literal(literal_of(&token.token, &token.lexeme)), start))
            }
            _ => {
                self.advance();
                MapKey::Name(token.lexeme)
            }
        };
        self.consume(&Token::Colon, "':' after map key")?;
        self.nls();
        let value = self.parse_expression(0)?;
        Ok(MapEntry { key, value })
    }

    // Primaries

    pub(super) fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        let token = self.peek().clone();
        match token.token {
            Token::IntegerLiteral
            | Token::FloatLiteral
            | Token::StringLiteral
            | Token::True
            | Token::False
            | Token::Null => {
                self.advance();
                Ok(self.expr(ExprKind::Literal(literal_of(&token.token, &token.lexeme)), start))
            }
            Token::GStringBegin => self.parse_gstring(),
            Token::This => {
                self.advance();
                Ok(self.expr(ExprKind::This, start))
            }
            Token::Super => {
                self.advance();
                Ok(self.expr(ExprKind::Super, start))
            }
            Token::LParen => {
                self.advance();
                self.nls();
                let inner = self.parse_command_expression()?;
                self.nls();
                self.consume(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => self.parse_list_or_map(),
            Token::LBrace => self.parse_closure(),
            Token::New => self.parse_creator(None, start),
            // `int.class`, `String[].class`-style receivers
            kind if kind.is_primitive_type() && self.peek_kind(1) == Token::Dot => {
                self.advance();
                Ok(self.expr(ExprKind::Identifier(token.lexeme), start))
            }
            kind if kind.is_identifier_like() => {
                self.advance();
                Ok(self.expr(ExprKind::Identifier(token.lexeme), start))
            }
            _ => Err(self.error_here("expression")),
        }
    }

    /// `[]`, `[:]`, `[a, b]` or `[k: v, *: m]`
    fn parse_list_or_map(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        self.consume(&Token::LBracket, "'['")?;
        self.nls();
        if self.check(&Token::Colon) && self.peek_kind(1) == Token::RBracket {
            self.advance();
            self.advance();
            return Ok(self.expr(ExprKind::Map(Vec::new()), start));
        }

        let is_map = self.is_map_entry_start(self.current);
        let mut elements = Vec::new();
        let mut entries = Vec::new();
        while !self.check(&Token::RBracket) {
            if is_map {
                entries.push(self.parse_map_entry()?);
            } else {
                elements.push(self.parse_argument()?);
            }
            self.nls();
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.nls();
        }
        self.consume(&Token::RBracket, "']'")?;
        let kind = if is_map { ExprKind::Map(entries) } else { ExprKind::List(elements) };
        Ok(self.expr(kind, start))
    }

    /// `{ params -> statements }`
    pub(super) fn parse_closure(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        self.consume(&Token::LBrace, "'{'")?;
        let window = &self.tokens[self.skip_newlines_from(self.current)..];
        let params = if predicates::has_closure_parameters(window) {
            self.nls();
            let params = if self.check(&Token::Arrow) { Vec::new() } else { self.parse_formal_parameters()? };
            self.consume(&Token::Arrow, "'->' after closure parameters")?;
            Some(params)
        } else {
            None
        };
        let statements = self.parse_block_statements()?;
        self.consume(&Token::RBrace, "'}' closing closure")?;
        Ok(self.expr(ExprKind::Closure(Closure { params, body: Block { statements } }), start))
    }

    /// `new T(args)`, `new T(args) { members }`, `new T<>()`, `new int[n][]`,
    /// `new int[] {1, 2}`; `outer` is set for `outer.new Inner()`
    fn parse_creator(&mut self, outer: Option<Expr>, start: Location) -> ParseResult<Expr> {
        self.consume(&Token::New, "'new'")?;
        self.nls();
        let type_start = self.current_location();
        let annotations = self.parse_annotations()?;

        let (base, diamond) = if self.peek().token.is_primitive_type() {
            (self.parse_non_array_type()?, false)
        } else {
            let name = self.parse_qualified_name()?;
            let mut diamond = false;
            let mut type_args = Vec::new();
            if self.check(&Token::Lt) && self.peek_kind(1) == Token::Gt {
                self.advance();
                self.advance();
                diamond = true;
            } else if self.check(&Token::Lt) {
                type_args = self.parse_type_arguments()?;
            }
            (self.expr_type(TypeKind::Named { name, type_args }, type_start), diamond)
        };
        let target_type = if annotations.is_empty() {
            base
        } else {
            self.expr_type(TypeKind::Annotated { annotations, inner: Box::new(base) }, type_start)
        };

        if self.check(&Token::LBracket) {
            if outer.is_some() || diamond {
                return Err(self.error_here("'(' after inner class creator"));
            }
            return self.parse_array_creator(target_type, start);
        }

        let args = self.parse_arguments()?;
        let anonymous_body = if self.check(&Token::LBrace) {
            self.advance();
            let members = self.parse_class_members(None)?;
            self.consume(&Token::RBrace, "'}' closing anonymous class body")?;
            Some(members)
        } else {
            None
        };
        Ok(self.expr(
            ExprKind::New {
                outer: outer.map(Box::new),
                target_type,
                diamond,
                args,
                anonymous_body,
            },
            start,
        ))
    }

    fn expr_type(&self, kind: TypeKind, start: Location) -> TypeRef {
        Spanned::new(kind, self.span_from(start))
    }

    fn parse_array_creator(&mut self, element_type: TypeRef, start: Location) -> ParseResult<Expr> {
        let mut dims = Vec::new();
        while self.check(&Token::LBracket) {
            self.advance();
            if self.match_token(&Token::RBracket) {
                dims.push(None);
            } else {
                let size = self.parse_expression(0)?;
                self.consume(&Token::RBracket, "']'")?;
                dims.push(Some(size));
            }
        }

        let initializer = if self.check(&Token::LBrace) { Some(self.parse_array_initializer()?) } else { None };
        let sized = dims.iter().any(Option::is_some);
        if initializer.is_some() && sized {
            return Err(ParseError::invalid_declaration(
                "array creator",
                "an array with an initializer cannot declare dimension sizes",
                start,
            ));
        }
        if initializer.is_none() && !matches!(dims.first(), Some(Some(_))) {
            return Err(ParseError::invalid_declaration(
                "array creator",
                "the first dimension needs a size or an initializer must follow",
                start,
            ));
        }
        Ok(self.expr(ExprKind::NewArray { element_type, dims, initializer }, start))
    }

    /// `{a, {b, c}}`; nested braces become list literals
    fn parse_array_initializer(&mut self) -> ParseResult<Vec<Expr>> {
        self.consume(&Token::LBrace, "'{'")?;
        self.nls();
        let mut values = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.check(&Token::LBrace) {
                let start = self.current_location();
                let inner = self.nested(Self::parse_array_initializer)?;
                values.push(self.expr(ExprKind::List(inner), start));
            } else {
                values.push(self.parse_expression(0)?);
            }
            self.nls();
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.nls();
        }
        self.consume(&Token::RBrace, "'}' closing array initializer")?;
        Ok(values)
    }

    /// `"text ${expr} text $path"` from its begin/part/end tokens
    pub(super) fn parse_gstring(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        let begin = self.consume(&Token::GStringBegin, "string")?.lexeme.clone();
        let mut parts = Vec::new();
        push_text(&mut parts, &begin);

        loop {
            let value = if self.check(&Token::LBrace) {
                self.parse_interpolation_block()?
            } else {
                self.parse_interpolation_path()?
            };
            parts.push(StringPart::Expr(value));

            let token = self.peek().clone();
            match token.token {
                Token::GStringPart => {
                    self.advance();
                    push_text(&mut parts, &token.lexeme);
                }
                Token::GStringEnd => {
                    self.advance();
                    push_text(&mut parts, &token.lexeme);
                    break;
                }
                _ => return Err(self.error_here("end of interpolated value")),
            }
        }
        Ok(self.expr(ExprKind::InterpolatedString(parts), start))
    }

    /// `${expr}`, `${}` or `${ -> closure }`
    fn parse_interpolation_block(&mut self) -> ParseResult<Expr> {
        if predicates::has_closure_parameters(&self.tokens[(self.current + 1).min(self.tokens.len() - 1)..]) {
            return self.parse_closure();
        }
        let start = self.current_location();
        self.advance();
        self.skip_separators();
        if self.match_token(&Token::RBrace) {
            let null = Literal { kind: LiteralKind::Null, raw: "null".to_string() };
            return Ok(self.expr(ExprKind::Literal(null), start));
        }
        let value = self.parse_command_expression()?;
        self.skip_separators();
        self.consume(&Token::RBrace, "'}' closing interpolated expression")?;
        Ok(value)
    }

    /// `$a.b.c`
    fn parse_interpolation_path(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        let name = self.consume(&Token::Identifier, "interpolated name")?.lexeme.clone();
        let root = match name.as_str() {
            "this" => ExprKind::This,
            "super" => ExprKind::Super,
            "true" | "false" => ExprKind::Literal(literal_of(&Token::True, &name)),
            "null" => ExprKind::Literal(literal_of(&Token::Null, &name)),
            _ => ExprKind::Identifier(name),
        };
        let mut expr = self.expr(root, start);
        while self.check(&Token::Dot) && self.peek_kind(1) == Token::Identifier {
            self.advance();
            let name = self.advance().lexeme.clone();
            expr = self.expr(
                ExprKind::PropertyAccess {
                    receiver: Box::new(expr),
                    name: MemberName::Ident(name),
                    safe: false,
                    spread: false,
                    attribute: false,
                },
                start,
            );
        }
        Ok(expr)
    }
}

fn push_text(parts: &mut Vec<StringPart>, raw: &str) {
    if !raw.is_empty() {
        parts.push(StringPart::Text(lexer::unescape(raw)));
    }
}

pub(super) fn literal_of(token: &Token, raw: &str) -> Literal {
    let kind = match token {
        Token::IntegerLiteral => LiteralKind::Integer,
        Token::FloatLiteral => LiteralKind::Float,
        Token::True | Token::False => LiteralKind::Boolean,
        Token::Null => LiteralKind::Null,
        _ => LiteralKind::String,
    };
    Literal { kind, raw: raw.to_string() }
}
