//! Type references and the lookahead that recognises them.

use super::error::ParseResult;
use super::lexer::Token;
use super::parser::Parser;
use super::span::Spanned;
use crate::ast::*;

/// Outcome of scanning ahead for a type without consuming it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TypeScan {
    /// A type ends just before this token index
    Type(usize),
    NotType,
    /// The scan ran past the lookahead limit
    TooLong,
}

impl TypeScan {
    pub(super) fn end(self) -> Option<usize> {
        match self {
            TypeScan::Type(end) => Some(end),
            _ => None,
        }
    }
}

fn primitive_of(token: Token) -> Option<PrimitiveType> {
    Some(match token {
        Token::Boolean => PrimitiveType::Boolean,
        Token::Byte => PrimitiveType::Byte,
        Token::Short => PrimitiveType::Short,
        Token::Int => PrimitiveType::Int,
        Token::Long => PrimitiveType::Long,
        Token::Char => PrimitiveType::Char,
        Token::Float => PrimitiveType::Float,
        Token::Double => PrimitiveType::Double,
        _ => return None,
    })
}

impl Parser {
    /// `annotations? (primitive | Name<args>) dims`
    pub(super) fn parse_type(&mut self) -> ParseResult<TypeRef> {
        let start = self.current_location();
        let annotations = self.parse_annotations()?;
        let base = self.parse_non_array_type()?;
        let typed = self.parse_array_suffix(base)?;
        if annotations.is_empty() {
            Ok(typed)
        } else {
            let span = self.span_from(start);
            Ok(Spanned::new(
                TypeKind::Annotated { annotations, inner: Box::new(typed) },
                span,
            ))
        }
    }

    /// A method return type: `void` or any type
    pub(super) fn parse_return_type(&mut self) -> ParseResult<TypeRef> {
        if self.check(&Token::Void) {
            let start = self.current_location();
            self.advance();
            return Ok(Spanned::new(TypeKind::Void, self.span_from(start)));
        }
        self.parse_type()
    }

    pub(super) fn parse_non_array_type(&mut self) -> ParseResult<TypeRef> {
        let start = self.current_location();
        if let Some(primitive) = primitive_of(self.peek().token) {
            self.advance();
            return Ok(Spanned::new(TypeKind::Primitive(primitive), self.span_from(start)));
        }
        self.parse_class_type()
    }

    /// `a.b.C<T, U>`
    pub(super) fn parse_class_type(&mut self) -> ParseResult<TypeRef> {
        let start = self.current_location();
        if !self.peek().token.is_identifier_like() {
            return Err(self.error_here("type"));
        }
        let name = self.parse_qualified_name()?;
        let type_args = if self.check(&Token::Lt) && self.peek_kind(1) != Token::Gt {
            self.parse_type_arguments()?
        } else {
            Vec::new()
        };
        Ok(Spanned::new(TypeKind::Named { name, type_args }, self.span_from(start)))
    }

    /// Wrap `element` in the `[]` groups that follow it, if any
    pub(super) fn parse_array_suffix(&mut self, element: TypeRef) -> ParseResult<TypeRef> {
        let dims = self.parse_dims()?;
        if dims.is_empty() {
            return Ok(element);
        }
        let span = element.span.merge(self.span_from(element.span.start));
        Ok(Spanned::new(TypeKind::Array { element: Box::new(element), dims }, span))
    }

    /// `[]` groups, each optionally preceded by type-use annotations
    pub(super) fn parse_dims(&mut self) -> ParseResult<Vec<ArrayDim>> {
        let mut dims = Vec::new();
        loop {
            if self.check(&Token::LBracket) && self.peek_kind(1) == Token::RBracket {
                self.advance();
                self.advance();
                dims.push(ArrayDim { annotations: Vec::new() });
                continue;
            }
            if self.check(&Token::At) {
                let save = self.current;
                let annotations = self.parse_annotations()?;
                if self.check(&Token::LBracket) && self.peek_kind(1) == Token::RBracket {
                    self.advance();
                    self.advance();
                    dims.push(ArrayDim { annotations });
                    continue;
                }
                self.current = save;
            }
            return Ok(dims);
        }
    }

    /// `<A, ? extends B, C<D>>`
    ///
    /// The lexer never produces `>>`, so every closing bracket of a nested
    /// argument list is its own `>` token.
    pub(super) fn parse_type_arguments(&mut self) -> ParseResult<Vec<TypeRef>> {
        self.consume(&Token::Lt, "'<'")?;
        self.nls();
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type_argument()?);
            self.nls();
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.nls();
        }
        self.consume(&Token::Gt, "'>' closing type arguments")?;
        Ok(args)
    }

    fn parse_type_argument(&mut self) -> ParseResult<TypeRef> {
        let start = self.current_location();
        let annotations = self.parse_annotations()?;
        if !self.check(&Token::Question) {
            let inner = self.nested(Self::parse_type)?;
            if annotations.is_empty() {
                return Ok(inner);
            }
            return Ok(Spanned::new(
                TypeKind::Annotated { annotations, inner: Box::new(inner) },
                self.span_from(start),
            ));
        }
        self.advance();
        let bound = if self.match_token(&Token::Extends) {
            self.nls();
            Some((BoundKind::Extends, Box::new(self.nested(Self::parse_type)?)))
        } else if self.match_token(&Token::Super) {
            self.nls();
            Some((BoundKind::Super, Box::new(self.nested(Self::parse_type)?)))
        } else {
            None
        };
        let wildcard = Spanned::new(TypeKind::Wildcard { bound }, self.span_from(start));
        if annotations.is_empty() {
            Ok(wildcard)
        } else {
            Ok(Spanned::new(
                TypeKind::Annotated { annotations, inner: Box::new(wildcard) },
                self.span_from(start),
            ))
        }
    }

    /// `<T extends A & B, U>`
    pub(super) fn parse_type_parameters(&mut self) -> ParseResult<Vec<TypeParam>> {
        self.consume(&Token::Lt, "'<'")?;
        self.nls();
        let mut params = Vec::new();
        loop {
            let annotations = self.parse_annotations()?;
            let name = self.parse_identifier()?;
            let mut bounds = Vec::new();
            if self.match_token(&Token::Extends) {
                self.nls();
                bounds.push(self.parse_type()?);
                while self.match_token(&Token::Amp) {
                    self.nls();
                    bounds.push(self.parse_type()?);
                }
            }
            params.push(TypeParam { annotations, name, bounds });
            self.nls();
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.nls();
        }
        self.consume(&Token::Gt, "'>' closing type parameters")?;
        Ok(params)
    }

    /// Comma separated types, line breaks allowed after each comma
    pub(super) fn parse_type_list(&mut self) -> ParseResult<Vec<TypeRef>> {
        let mut types = vec![self.parse_type()?];
        while self.check(&Token::Comma) {
            self.advance();
            self.nls();
            types.push(self.parse_type()?);
        }
        Ok(types)
    }

    // Lookahead

    /// Scan a type starting at token `start` without consuming anything
    pub(super) fn scan_type(&self, start: usize) -> TypeScan {
        let limit = start.saturating_add(self.config.max_lookahead);
        let mut i = start;

        while self.kind_at(i) == Token::At {
            match self.scan_annotation(i, limit) {
                TypeScan::Type(end) => i = self.skip_newlines_from(end),
                other => return other,
            }
        }

        let kind = self.kind_at(i);
        if kind.is_primitive_type() {
            i += 1;
        } else if kind.is_identifier_like() {
            i += 1;
            while self.kind_at(i) == Token::Dot && self.kind_at(i + 1).is_identifier_like() {
                i += 2;
            }
            if self.kind_at(i) == Token::Lt {
                match self.scan_type_arguments(i, limit) {
                    TypeScan::Type(end) => i = end,
                    other => return other,
                }
            }
        } else {
            return TypeScan::NotType;
        }

        while self.kind_at(i) == Token::LBracket && self.kind_at(i + 1) == Token::RBracket {
            i += 2;
        }
        if i > limit {
            TypeScan::TooLong
        } else {
            TypeScan::Type(i)
        }
    }

    /// Balanced `<...>` made only of tokens that can appear in type arguments
    fn scan_type_arguments(&self, open: usize, limit: usize) -> TypeScan {
        let mut depth = 0usize;
        let mut i = open;
        loop {
            if i > limit {
                return TypeScan::TooLong;
            }
            match self.kind_at(i) {
                Token::Lt => depth += 1,
                Token::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return TypeScan::Type(i + 1);
                    }
                }
                Token::Comma
                | Token::Dot
                | Token::Question
                | Token::Extends
                | Token::Super
                | Token::LBracket
                | Token::RBracket
                | Token::Amp
                | Token::At
                | Token::Newline => {}
                kind if kind.is_identifier_like() || kind.is_primitive_type() => {}
                _ => return TypeScan::NotType,
            }
            i += 1;
        }
    }

    /// `@a.b.C` with an optional balanced argument list
    pub(super) fn scan_annotation(&self, at: usize, limit: usize) -> TypeScan {
        let mut i = at + 1;
        if !self.kind_at(i).is_identifier_like() {
            return TypeScan::NotType;
        }
        i += 1;
        while self.kind_at(i) == Token::Dot && self.is_name_at(i + 1) {
            i += 2;
        }
        if self.kind_at(i) != Token::LParen {
            return TypeScan::Type(i);
        }
        let mut depth = 0usize;
        loop {
            if i > limit {
                return TypeScan::TooLong;
            }
            match self.kind_at(i) {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return TypeScan::Type(i + 1);
                    }
                }
                Token::Eof => return TypeScan::NotType,
                _ => {}
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    fn parser(source: &str) -> Parser {
        Parser::new(source).unwrap()
    }

    #[test]
    fn scans_nested_generics() {
        let p = parser("Map<String, List<int[]>> m");
        assert_eq!(p.scan_type(0), TypeScan::Type(11));
        assert_eq!(p.kind_at(11), Token::Identifier);
    }

    #[test]
    fn comparison_is_not_a_type() {
        assert_eq!(parser("a < b + c").scan_type(0), TypeScan::NotType);
        assert_eq!(parser("1 + 2").scan_type(0), TypeScan::NotType);
    }

    #[test]
    fn long_type_arguments_exhaust_the_scan() {
        let source = format!("Map<{}> m", vec!["A"; 40].join(", "));
        let p = Parser::with_config(&source, ParserConfig::default().with_max_lookahead(16)).unwrap();
        assert_eq!(p.scan_type(0), TypeScan::TooLong);
    }
}
