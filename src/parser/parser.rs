//! Recursive descent parser for Groovy source.
//!
//! The parser is split over several files that each add an `impl Parser`
//! block: expressions, command expressions, statements, declarations and
//! types. This file holds the token cursor, separator handling and the
//! compilation unit.

use super::error::{ParseError, ParseResult};
use super::lexer::{Lexer, LexicalToken, Token};
use super::span::{Location, Span, Spanned};
use crate::ast::*;
use crate::config::ParserConfig;

/// Parser over one compilation unit
pub struct Parser {
    pub(super) tokens: Vec<LexicalToken>,
    pub(super) current: usize,
    pub(super) config: ParserConfig,
    depth: usize,
}

impl Parser {
    /// Create a new parser from source code
    pub fn new(source: &str) -> ParseResult<Self> {
        Self::with_config(source, ParserConfig::default())
    }

    pub fn with_config(source: &str, config: ParserConfig) -> ParseResult<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self::from_tokens(tokens, config))
    }

    /// Build a parser over an already lexed stream; the stream must end with `Eof`
    pub fn from_tokens(mut tokens: Vec<LexicalToken>, config: ParserConfig) -> Self {
        if !matches!(tokens.last(), Some(last) if last.token == Token::Eof) {
            let end = tokens.last().map(|t| t.end_location()).unwrap_or_default();
            tokens.push(LexicalToken::new(Token::Eof, "", end));
        }
        Self {
            tokens,
            current: 0,
            config,
            depth: 0,
        }
    }

    /// Parse the whole source into a compilation unit
    pub fn parse(mut self) -> ParseResult<CompilationUnit> {
        log::debug!("parsing compilation unit of {} tokens", self.tokens.len());
        let mut unit = CompilationUnit::default();

        self.skip_separators();
        unit.package_decl = self.parse_package_decl()?;

        loop {
            self.skip_separators();
            if self.is_at_end() {
                break;
            }
            if self.check(&Token::Import) {
                unit.imports.push(self.parse_import_decl()?);
            } else {
                unit.items.push(self.parse_script_item()?);
            }
            if !self.is_at_end() {
                self.consume_separator()?;
            }
        }

        log::debug!(
            "parsed compilation unit: {} imports, {} items",
            unit.imports.len(),
            unit.items.len()
        );
        Ok(unit)
    }

    /// Parse a single expression that must span the whole input
    pub fn parse_standalone_expression(mut self) -> ParseResult<Expr> {
        self.skip_separators();
        let expr = self.parse_expression(0)?;
        self.expect_end()?;
        Ok(expr)
    }

    /// Parse a single statement that must span the whole input
    pub fn parse_standalone_statement(mut self) -> ParseResult<Stmt> {
        self.skip_separators();
        let stmt = self.parse_statement()?;
        self.expect_end()?;
        Ok(stmt)
    }

    /// Parse a single type that must span the whole input
    pub fn parse_standalone_type(mut self) -> ParseResult<TypeRef> {
        self.skip_separators();
        let type_ref = self.parse_type()?;
        self.expect_end()?;
        Ok(type_ref)
    }

    fn expect_end(&mut self) -> ParseResult<()> {
        self.skip_separators();
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.error_here("end of input"))
        }
    }

    // Helper methods

    pub(super) fn is_at_end(&self) -> bool {
        self.peek().token == Token::Eof
    }

    pub(super) fn check(&self, token_type: &Token) -> bool {
        self.peek().token == *token_type
    }

    pub(super) fn advance(&mut self) -> &LexicalToken {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    pub(super) fn peek(&self) -> &LexicalToken {
        self.token_at(self.current)
    }

    /// Token `offset` positions ahead of the cursor, clamped to `Eof`
    pub(super) fn peek_at(&self, offset: usize) -> &LexicalToken {
        self.token_at(self.current + offset)
    }

    pub(super) fn token_at(&self, index: usize) -> &LexicalToken {
        let last = self.tokens.len() - 1;
        &self.tokens[index.min(last)]
    }

    /// Kind of the token at absolute `index`
    pub(super) fn kind_at(&self, index: usize) -> Token {
        self.token_at(index).token
    }

    pub(super) fn peek_kind(&self, offset: usize) -> Token {
        self.peek_at(offset).token
    }

    pub(super) fn previous(&self) -> &LexicalToken {
        if self.current == 0 {
            &self.tokens[0]
        } else {
            &self.tokens[self.current - 1]
        }
    }

    pub(super) fn current_location(&self) -> Location {
        self.peek().location
    }

    /// Span from `start` to the end of the last consumed token
    pub(super) fn span_from(&self, start: Location) -> Span {
        let end = if self.current == 0 { start } else { self.previous().end_location() };
        Span::new(start, end.max(start))
    }

    pub(super) fn consume(&mut self, token_type: &Token, expected: &str) -> ParseResult<&LexicalToken> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_here(expected))
        }
    }

    pub(super) fn match_token(&mut self, token_type: &Token) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn error_here(&self, expected: &str) -> ParseError {
        let current = self.peek();
        ParseError::unexpected_token(expected, current.describe(), current.location)
    }

    /// Adjacent tokens with no whitespace between them
    pub(super) fn adjacent(&self, first: usize, second: usize) -> bool {
        let a = self.token_at(first);
        let b = self.token_at(second);
        a.location.offset + a.lexeme.len() == b.location.offset
    }

    /// Run `f` one nesting level deeper
    pub(super) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= self.config.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.config.max_depth,
                location: self.current_location(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // Separators

    /// Skip any line breaks
    pub(super) fn nls(&mut self) {
        while self.check(&Token::Newline) {
            self.advance();
        }
    }

    /// Skip any line breaks and semicolons
    pub(super) fn skip_separators(&mut self) {
        while matches!(self.peek().token, Token::Newline | Token::Semicolon) {
            self.advance();
        }
    }

    /// Consume at least one line break or semicolon
    pub(super) fn consume_separator(&mut self) -> ParseResult<()> {
        if !matches!(self.peek().token, Token::Newline | Token::Semicolon) {
            return Err(self.error_here("newline or ';'"));
        }
        self.skip_separators();
        Ok(())
    }

    /// Index of the first token at or after `index` that is not a line break
    pub(super) fn skip_newlines_from(&self, mut index: usize) -> usize {
        while self.kind_at(index) == Token::Newline {
            index += 1;
        }
        index
    }

    /// Kind of the next token that is not a line break
    pub(super) fn peek_past_newlines(&self) -> Token {
        self.kind_at(self.skip_newlines_from(self.current))
    }

    // Names

    /// An identifier in a declaring position
    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        if self.peek().token.is_identifier_like() {
            Ok(self.advance().lexeme.clone())
        } else {
            Err(self.error_here("identifier"))
        }
    }

    /// `a.b.c`; segments after the first may be keywords
    pub(super) fn parse_qualified_name(&mut self) -> ParseResult<String> {
        let mut name = self.parse_identifier()?;
        while self.check(&Token::Dot) && self.is_name_at(self.current + 1) {
            self.advance();
            name.push('.');
            name.push_str(&self.advance().lexeme);
        }
        Ok(name)
    }

    pub(super) fn is_name_at(&self, index: usize) -> bool {
        let kind = self.kind_at(index);
        kind == Token::Identifier || kind.is_keyword()
    }

    // Compilation unit

    fn parse_package_decl(&mut self) -> ParseResult<Option<Spanned<PackageDecl>>> {
        let save = self.current;
        let start = self.current_location();
        let annotations = if self.check(&Token::At) { self.parse_annotations()? } else { Vec::new() };
        if !self.match_token(&Token::Package) {
            self.current = save;
            return Ok(None);
        }
        let name = self.parse_qualified_name()?;
        let span = self.span_from(start);
        if !self.is_at_end() {
            self.consume_separator()?;
        }
        Ok(Some(Spanned::new(PackageDecl { annotations, name }, span)))
    }

    fn parse_import_decl(&mut self) -> ParseResult<Spanned<ImportDecl>> {
        let start = self.current_location();
        self.consume(&Token::Import, "'import'")?;
        let is_static = self.match_token(&Token::Static);

        let mut name = self.parse_identifier()?;
        let mut is_wildcard = false;
        while self.check(&Token::Dot) {
            if self.peek_kind(1) == Token::Star {
                self.advance();
                self.advance();
                is_wildcard = true;
                break;
            }
            if !self.is_name_at(self.current + 1) {
                self.advance();
                return Err(self.error_here("name or '*' after '.' in import"));
            }
            self.advance();
            name.push('.');
            name.push_str(&self.advance().lexeme);
        }

        let alias = if !is_wildcard && self.match_token(&Token::As) {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        let span = self.span_from(start);
        Ok(Spanned::new(ImportDecl { name, is_static, is_wildcard, alias }, span))
    }

    /// One top-level item: a class-like declaration, a script method or a statement
    fn parse_script_item(&mut self) -> ParseResult<TopLevelItem> {
        if self.is_class_declaration_start() {
            let start = self.current_location();
            let modifiers = self.parse_modifiers()?;
            let class = self.parse_class_declaration(modifiers)?;
            let span = self.span_from(start);
            return Ok(TopLevelItem::Declaration(Spanned::new(DeclarationKind::ClassLike(class), span)));
        }
        if self.is_script_method_start() {
            log::debug!("script method at {}", self.current_location());
            let start = self.current_location();
            let modifiers = self.parse_modifiers()?;
            let method = self.parse_method_declaration(modifiers, None, false)?;
            let span = self.span_from(start);
            return Ok(TopLevelItem::Declaration(Spanned::new(DeclarationKind::Method(method), span)));
        }
        Ok(TopLevelItem::Statement(self.parse_statement()?))
    }

    // Annotations

    /// Zero or more annotations, each optionally followed by line breaks
    pub(super) fn parse_annotations(&mut self) -> ParseResult<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while self.check(&Token::At) && self.peek_kind(1) != Token::Interface {
            annotations.push(self.parse_annotation()?);
            self.nls();
        }
        Ok(annotations)
    }

    pub(super) fn parse_annotation(&mut self) -> ParseResult<Annotation> {
        self.consume(&Token::At, "'@'")?;
        let name = self.parse_qualified_name()?;
        let mut args = Vec::new();
        if self.check(&Token::LParen) {
            self.advance();
            if !self.check(&Token::RParen) {
                loop {
                    args.push(self.parse_annotation_arg()?);
                    if !self.match_token(&Token::Comma) {
                        break;
                    }
                }
            }
            self.consume(&Token::RParen, "')' after annotation arguments")?;
        }
        Ok(Annotation { name, args })
    }

    fn parse_annotation_arg(&mut self) -> ParseResult<AnnotationArg> {
        if self.is_name_at(self.current) && self.peek_kind(1) == Token::Assign {
            let name = self.advance().lexeme.clone();
            self.advance();
            let value = self.parse_element_value()?;
            return Ok(AnnotationArg::Named(name, value));
        }
        Ok(AnnotationArg::Value(self.parse_element_value()?))
    }

    pub(super) fn parse_element_value(&mut self) -> ParseResult<ElementValue> {
        if self.check(&Token::At) {
            Ok(ElementValue::Annotation(self.nested(Self::parse_annotation)?))
        } else {
            Ok(ElementValue::Expr(self.parse_expression(0)?))
        }
    }
}

/// Parse a complete compilation unit
pub fn parse(source: &str) -> ParseResult<CompilationUnit> {
    Parser::new(source)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_package_and_imports() {
        let unit = parse("package a.b\nimport java.util.*\nimport static x.Y.z as w\n").unwrap();
        assert_eq!(unit.package_decl.unwrap().name, "a.b");
        assert_eq!(unit.imports.len(), 2);
        assert!(unit.imports[0].is_wildcard);
        assert_eq!(unit.imports[0].name, "java.util");
        assert!(unit.imports[1].is_static);
        assert_eq!(unit.imports[1].alias.as_deref(), Some("w"));
    }

    #[test]
    fn statements_need_separators() {
        let err = parse("a = 1 b = 2").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        assert!(parse("a = 1; b = 2").is_ok());
    }

    #[test]
    fn nesting_is_bounded() {
        let source = format!("x = {}1{}", "(".repeat(200), ")".repeat(200));
        let err = Parser::with_config(&source, ParserConfig::default().with_max_depth(32))
            .unwrap()
            .parse()
            .unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { limit: 32, .. }));
    }
}
