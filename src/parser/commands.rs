//! Command expressions: method calls written without parentheses.
//!
//! `println a, b` is `println(a, b)`, and `move a to b` chains into
//! `move(a).to(b)`.

use super::error::ParseResult;
use super::expressions::PathElement;
use super::lexer::{self, Token};
use super::parser::Parser;
use super::predicates;
use super::span::{Location, Spanned};
use crate::ast::*;

impl Parser {
    /// An expression that may be a command expression; used wherever a
    /// statement-level expression is allowed
    pub(super) fn parse_command_expression(&mut self) -> ParseResult<Expr> {
        let start = self.current_location();
        let head = self.parse_expression(0)?;

        let mut expr = if predicates::is_following_arguments_or_closure(&head) {
            head
        } else if Self::can_head_command(&head) && predicates::can_start_command_argument(self.peek().token) {
            log::debug!("command expression at {}", start);
            let args = self.parse_command_arguments()?;
            self.command_call(head, args, start)
        } else {
            return Ok(head);
        };

        while self.is_command_name(self.current) {
            expr = self.parse_command_argument(expr, start)?;
        }
        Ok(expr)
    }

    /// Expressions that can be invoked as the head of a command
    fn can_head_command(head: &Expr) -> bool {
        match &head.value {
            ExprKind::Identifier(_) | ExprKind::IndexAccess { .. } => true,
            ExprKind::PropertyAccess { attribute, .. } => !attribute,
            _ => false,
        }
    }

    /// Comma separated arguments running to the end of the command
    fn parse_command_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        let mut named_start = None;
        loop {
            if self.is_map_entry_start(self.current) {
                named_start.get_or_insert(self.current_location());
                named.push(self.parse_map_entry()?);
            } else {
                positional.push(self.parse_argument()?);
            }
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.nls();
        }
        Ok(self.gather_named(positional, named, named_start))
    }

    /// Invoke `head` with `args`
    fn command_call(&self, head: Expr, args: Vec<Expr>, start: Location) -> Expr {
        let kind = match head.value {
            ExprKind::Identifier(name) => ExprKind::MethodCall {
                receiver: None,
                name: MemberName::Ident(name),
                type_args: Vec::new(),
                args,
                safe: false,
                spread: false,
            },
            ExprKind::PropertyAccess { receiver, name, safe, spread, .. } => {
                ExprKind::MethodCall { receiver: Some(receiver), name, type_args: Vec::new(), args, safe, spread }
            }
            other => ExprKind::MethodCall {
                receiver: Some(Box::new(Spanned::new(other, head.span))),
                name: MemberName::Ident("call".to_string()),
                type_args: Vec::new(),
                args,
                safe: false,
                spread: false,
            },
        };
        Spanned::new(kind, self.span_from(start))
    }

    /// A name that continues a command chain, on the same line
    fn is_command_name(&self, index: usize) -> bool {
        matches!(self.kind_at(index), Token::StringLiteral) || self.kind_at(index).is_identifier_like()
    }

    /// `name args`, `name(args)...` or a bare `name` applied to `receiver`
    fn parse_command_argument(&mut self, receiver: Expr, start: Location) -> ParseResult<Expr> {
        let token = self.advance().clone();
        let name = match token.token {
            Token::StringLiteral => lexer::string_value(&token.lexeme),
            _ => token.lexeme,
        };

        if predicates::can_start_command_argument(self.peek().token) && !self.check(&Token::LBrace) {
            let args = self.parse_command_arguments()?;
            let kind = ExprKind::MethodCall {
                receiver: Some(Box::new(receiver)),
                name: MemberName::Ident(name),
                type_args: Vec::new(),
                args,
                safe: false,
                spread: false,
            };
            return Ok(Spanned::new(kind, self.span_from(start)));
        }

        let property = Spanned::new(
            ExprKind::PropertyAccess {
                receiver: Box::new(receiver),
                name: MemberName::Ident(name),
                safe: false,
                spread: false,
                attribute: false,
            },
            self.span_from(start),
        );
        Ok(self.parse_path_chain(property, PathElement::Member)?.0)
    }
}
