//! Modifiers, class-like declarations and their members, methods,
//! parameters and variable declarations.

use super::error::{ParseError, ParseResult};
use super::lexer::{self, Token};
use super::parser::Parser;
use super::span::Spanned;
use super::types::TypeScan;
use crate::ast::*;

fn modifier_of(token: Token) -> Option<Modifier> {
    Some(match token {
        Token::Public => Modifier::Public,
        Token::Protected => Modifier::Protected,
        Token::Private => Modifier::Private,
        Token::Static => Modifier::Static,
        Token::Abstract => Modifier::Abstract,
        Token::Final => Modifier::Final,
        Token::Native => Modifier::Native,
        Token::Synchronized => Modifier::Synchronized,
        Token::Transient => Modifier::Transient,
        Token::Volatile => Modifier::Volatile,
        Token::Strictfp => Modifier::Strictfp,
        Token::Default => Modifier::Default,
        Token::Def => Modifier::Def,
        Token::Var => Modifier::Var,
        _ => return None,
    })
}

impl Parser {
    // Modifiers

    /// Whether the token at `index` is a modifier or starts an annotation
    pub(super) fn is_modifier_at(&self, index: usize) -> bool {
        let next = self.kind_at(index + 1);
        match self.kind_at(index) {
            Token::At => next != Token::Interface,
            // `var` is also a plain name: `var = 1`
            Token::Var => next.is_identifier_like() || next.is_primitive_type(),
            Token::Synchronized => next != Token::LParen,
            kind => kind.is_modifier(),
        }
    }

    /// Modifiers and annotations in any order, each optionally followed by
    /// line breaks
    pub(super) fn parse_modifiers(&mut self) -> ParseResult<Vec<Modifier>> {
        let mut modifiers = Vec::new();
        while self.is_modifier_at(self.current) {
            if self.check(&Token::At) {
                modifiers.push(Modifier::Annotation(self.parse_annotation()?));
            } else {
                let Some(modifier) = modifier_of(self.peek().token) else {
                    break;
                };
                self.advance();
                modifiers.push(modifier);
            }
            self.nls();
        }
        Ok(modifiers)
    }

    /// Skip modifiers and annotations by lookahead, returning the index of
    /// the first other token and whether any were found
    fn scan_modifiers(&self, start: usize) -> Option<(usize, bool)> {
        let limit = start.saturating_add(self.config.max_lookahead);
        let mut i = start;
        let mut found = false;
        while i <= limit {
            match self.kind_at(i) {
                Token::At if self.kind_at(i + 1) != Token::Interface => match self.scan_annotation(i, limit) {
                    TypeScan::Type(end) => i = end,
                    _ => return None,
                },
                Token::Newline if found => i += 1,
                _ if self.is_modifier_at(i) => i += 1,
                _ => return Some((i, found)),
            }
            found = true;
        }
        None
    }

    // Class-like declarations

    pub(super) fn is_class_declaration_start(&self) -> bool {
        let Some((i, _)) = self.scan_modifiers(self.current) else {
            return false;
        };
        match self.kind_at(i) {
            Token::Class | Token::Interface | Token::Enum => true,
            Token::At => self.kind_at(i + 1) == Token::Interface,
            Token::Trait => {
                self.kind_at(i + 1) == Token::Identifier
                    && matches!(
                        self.kind_at(i + 2),
                        Token::LBrace | Token::Lt | Token::Extends | Token::Implements | Token::Newline
                    )
            }
            _ => false,
        }
    }

    /// `class`, `interface`, `enum`, `@interface` or `trait` after its modifiers
    pub(super) fn parse_class_declaration(&mut self, modifiers: Vec<Modifier>) -> ParseResult<ClassDecl> {
        let location = self.current_location();
        let kind = match self.peek().token {
            Token::Class => DeclKind::Class,
            Token::Interface => DeclKind::Interface,
            Token::Enum => DeclKind::Enum,
            Token::Trait => DeclKind::Trait,
            Token::At if self.peek_kind(1) == Token::Interface => {
                self.advance();
                DeclKind::Annotation
            }
            _ => return Err(self.error_here("class, interface, enum, trait or @interface")),
        };
        self.advance();
        let name = self.parse_identifier()?;
        log::debug!("{} {} at {}", kind.keyword(), name, location);

        let type_params = if self.check(&Token::Lt) { self.parse_type_parameters()? } else { Vec::new() };
        self.nls();

        let mut superclass = None;
        let mut interfaces = Vec::new();
        if self.match_token(&Token::Extends) {
            self.nls();
            let mut types = self.parse_type_list()?;
            match kind {
                DeclKind::Interface => interfaces = types,
                DeclKind::Class | DeclKind::Trait => {
                    if types.len() > 1 {
                        return Err(ParseError::invalid_declaration(
                            kind.keyword(),
                            format!("{} can extend only one type", name),
                            location,
                        ));
                    }
                    superclass = types.pop();
                }
                DeclKind::Enum | DeclKind::Annotation => {
                    return Err(ParseError::invalid_declaration(
                        kind.keyword(),
                        format!("{} cannot extend a type", name),
                        location,
                    ));
                }
            }
            self.nls();
        }
        if self.match_token(&Token::Implements) {
            if matches!(kind, DeclKind::Interface | DeclKind::Annotation) {
                return Err(ParseError::invalid_declaration(
                    kind.keyword(),
                    format!("{} cannot implement types; interfaces extend them", name),
                    location,
                ));
            }
            self.nls();
            interfaces = self.parse_type_list()?;
            self.nls();
        }

        self.consume(&Token::LBrace, "'{' opening class body")?;
        let enum_constants = if kind == DeclKind::Enum { self.parse_enum_constants()? } else { Vec::new() };
        let members = self.parse_class_members(Some(name.as_str()))?;
        self.consume(&Token::RBrace, "'}' closing class body")?;

        Ok(ClassDecl {
            kind,
            modifiers,
            name,
            type_params,
            superclass,
            interfaces,
            enum_constants,
            members,
        })
    }

    fn is_enum_constant_start(&self) -> bool {
        let mut i = self.current;
        let limit = i.saturating_add(self.config.max_lookahead);
        while self.kind_at(i) == Token::At {
            match self.scan_annotation(i, limit) {
                TypeScan::Type(end) => i = self.skip_newlines_from(end),
                _ => return false,
            }
        }
        self.kind_at(i).is_identifier_like()
            && matches!(
                self.kind_at(i + 1),
                Token::Comma | Token::LParen | Token::LBrace | Token::Semicolon | Token::Newline | Token::RBrace
            )
    }

    /// `A, B(1), C { members }` up to the optional `;`
    fn parse_enum_constants(&mut self) -> ParseResult<Vec<EnumConstant>> {
        let mut constants = Vec::new();
        self.nls();
        while self.is_enum_constant_start() {
            let annotations = self.parse_annotations()?;
            let name = self.parse_identifier()?;
            let args = if self.check(&Token::LParen) { self.parse_arguments()? } else { Vec::new() };
            let body = if self.check(&Token::LBrace) {
                self.advance();
                let members = self.parse_class_members(None)?;
                self.consume(&Token::RBrace, "'}' closing enum constant body")?;
                Some(members)
            } else {
                None
            };
            constants.push(EnumConstant { annotations, name, args, body });
            self.nls();
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.nls();
        }
        Ok(constants)
    }

    /// Members up to, not including, the closing `}`. `class_name` names the
    /// enclosing class, and is `None` in anonymous and enum constant bodies.
    pub(super) fn parse_class_members(&mut self, class_name: Option<&str>) -> ParseResult<Vec<Declaration>> {
        let mut members = Vec::new();
        self.skip_separators();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            members.push(self.parse_member(class_name)?);
            if self.check(&Token::RBrace) {
                break;
            }
            self.consume_separator()?;
        }
        Ok(members)
    }

    fn parse_member(&mut self, class_name: Option<&str>) -> ParseResult<Declaration> {
        let start = self.current_location();
        let kind = if self.check(&Token::LBrace) {
            DeclarationKind::Initializer { is_static: false, body: self.parse_block()? }
        } else if self.check(&Token::Static) && self.kind_at(self.skip_newlines_from(self.current + 1)) == Token::LBrace {
            self.advance();
            self.nls();
            DeclarationKind::Initializer { is_static: true, body: self.parse_block()? }
        } else if self.is_class_declaration_start() {
            let modifiers = self.parse_modifiers()?;
            DeclarationKind::ClassLike(self.parse_class_declaration(modifiers)?)
        } else {
            let modifiers = self.parse_modifiers()?;
            if self.is_method_start(self.current) {
                DeclarationKind::Method(self.parse_method_declaration(modifiers, class_name, true)?)
            } else {
                let var_type = if self.has_type_before_name() {
                    Some(self.parse_type()?)
                } else if modifiers.is_empty() {
                    return Err(self.error_here("member declaration"));
                } else {
                    None
                };
                DeclarationKind::Field(self.parse_variable_declaration(modifiers, var_type)?)
            }
        };
        Ok(Spanned::new(kind, self.span_from(start)))
    }

    /// Identifier or string literal naming a method
    fn is_method_name_at(&self, index: usize) -> bool {
        let kind = self.kind_at(index);
        kind.is_identifier_like() || kind == Token::StringLiteral
    }

    /// Index just past a balanced `<...>` starting at `open`
    fn skip_angle_brackets(&self, open: usize) -> Option<usize> {
        let limit = open.saturating_add(self.config.max_lookahead);
        let mut depth = 0usize;
        let mut i = open;
        while i <= limit {
            match self.kind_at(i) {
                Token::Lt => depth += 1,
                Token::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                Token::Eof | Token::LBrace | Token::RBrace | Token::Semicolon => return None,
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// Whether a method header (after modifiers) starts at `index`:
    /// `<T>`, `void`, `name(` or `Type name(`
    fn is_method_start(&self, index: usize) -> bool {
        self.method_name_index(index).is_some()
    }

    /// Index of the name of a method whose header starts at `index`
    pub(super) fn method_name_index(&self, index: usize) -> Option<usize> {
        let mut i = index;
        if self.kind_at(i) == Token::Lt {
            i = self.skip_newlines_from(self.skip_angle_brackets(i)?);
        }
        if self.is_method_name_at(i) && self.kind_at(i + 1) == Token::LParen {
            return Some(i);
        }
        let name = if self.kind_at(i) == Token::Void {
            i + 1
        } else {
            self.scan_type(i).end()?
        };
        (self.is_method_name_at(name) && self.kind_at(name + 1) == Token::LParen).then_some(name)
    }

    /// A script method needs modifiers or a return type that is primitive,
    /// `void`, qualified, generic or capitalised, and must have a body
    pub(super) fn is_script_method_start(&self) -> bool {
        let Some((header, has_modifiers)) = self.scan_modifiers(self.current) else {
            return false;
        };
        let Some(name) = self.method_name_index(header) else {
            return false;
        };
        if !has_modifiers {
            if name == header {
                return false;
            }
            let first = self.token_at(header);
            let type_shaped = first.token.is_primitive_type()
                || first.token == Token::Void
                || first.token == Token::Lt
                || first.lexeme.chars().next().is_some_and(char::is_uppercase)
                || (header..name).any(|i| matches!(self.kind_at(i), Token::Dot | Token::Lt | Token::LBracket));
            if !type_shaped {
                return false;
            }
        }

        let Some((close, _)) = self.scan_parens(name + 1) else {
            return false;
        };
        let mut i = self.skip_newlines_from(close + 1);
        if self.kind_at(i) == Token::Throws {
            i += 1;
            while matches!(
                self.kind_at(i),
                Token::Identifier | Token::Dot | Token::Comma | Token::Lt | Token::Gt | Token::Question | Token::Newline
            ) {
                i += 1;
            }
        }
        self.kind_at(i) == Token::LBrace
    }

    // Methods

    /// A method or constructor after its modifiers. Without a body the
    /// method is abstract, which `body_optional` permits.
    pub(super) fn parse_method_declaration(
        &mut self,
        modifiers: Vec<Modifier>,
        class_name: Option<&str>,
        body_optional: bool,
    ) -> ParseResult<MethodDecl> {
        let location = self.current_location();
        let type_params = if self.check(&Token::Lt) {
            let params = self.parse_type_parameters()?;
            self.nls();
            params
        } else {
            Vec::new()
        };

        let return_type = if self.is_method_name_at(self.current) && self.peek_kind(1) == Token::LParen {
            None
        } else {
            Some(self.parse_return_type()?)
        };
        let name = self.parse_method_name()?;
        let is_constructor = return_type.is_none() && class_name == Some(name.as_str());
        if return_type.is_none() && !is_constructor && modifiers.is_empty() {
            return Err(ParseError::invalid_declaration(
                "method",
                format!("{} needs a return type or a modifier, or must be named after its class", name),
                location,
            ));
        }

        self.consume(&Token::LParen, "'(' after method name")?;
        let params = if self.check(&Token::RParen) { Vec::new() } else { self.parse_formal_parameters()? };
        self.consume(&Token::RParen, "')' after parameters")?;

        let throws = if self.peek_past_newlines() == Token::Throws {
            self.nls();
            self.advance();
            self.nls();
            self.parse_type_list()?
        } else {
            Vec::new()
        };

        let default_value = if self.match_token(&Token::Default) {
            self.nls();
            Some(self.parse_element_value()?)
        } else {
            None
        };

        let body = if self.peek_past_newlines() == Token::LBrace {
            self.nls();
            Some(self.parse_block()?)
        } else if body_optional {
            None
        } else {
            return Err(self.error_here("method body"));
        };

        Ok(MethodDecl {
            modifiers,
            type_params,
            return_type,
            name,
            params,
            throws,
            default_value,
            body,
            is_constructor,
        })
    }

    fn parse_method_name(&mut self) -> ParseResult<String> {
        if self.check(&Token::StringLiteral) {
            let name = lexer::string_value(&self.peek().lexeme);
            self.advance();
            return Ok(name);
        }
        self.parse_identifier()
    }

    /// Comma separated parameters, stopping before `)` or `->`
    pub(super) fn parse_formal_parameters(&mut self) -> ParseResult<Vec<Parameter>> {
        let mut params: Vec<Parameter> = Vec::new();
        let mut varargs_at = None;
        loop {
            let location = self.current_location();
            let param = self.parse_formal_parameter()?;
            if param.varargs && varargs_at.is_none() {
                varargs_at = Some((params.len(), location));
            }
            params.push(param);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.nls();
        }
        if let Some((index, location)) = varargs_at {
            if index + 1 != params.len() {
                return Err(ParseError::invalid_declaration(
                    "parameter",
                    format!("varargs parameter {} must be the last parameter", params[index].name),
                    location,
                ));
            }
        }
        Ok(params)
    }

    /// `final String... names`, `x = 1`, `Outer this`
    fn parse_formal_parameter(&mut self) -> ParseResult<Parameter> {
        let modifiers = self.parse_modifiers()?;
        let typed = match self.scan_type(self.current) {
            TypeScan::Type(end) => {
                let next = self.kind_at(end);
                next.is_identifier_like() || matches!(next, Token::Ellipsis | Token::This)
            }
            _ => false,
        };
        let param_type = if typed { Some(self.parse_type()?) } else { None };
        let varargs = typed && self.match_token(&Token::Ellipsis);

        let is_receiver = typed && self.match_token(&Token::This);
        let name = if is_receiver { "this".to_string() } else { self.parse_identifier()? };

        let default_value = if !is_receiver && self.match_token(&Token::Assign) {
            self.nls();
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        Ok(Parameter { modifiers, param_type, varargs, name, default_value, is_receiver })
    }

    // Variables

    /// `a = 1, b` after the modifiers and optional type
    pub(super) fn parse_variable_declaration(
        &mut self,
        modifiers: Vec<Modifier>,
        var_type: Option<TypeRef>,
    ) -> ParseResult<VariableDecl> {
        let mut declarators = Vec::new();
        loop {
            let name = self.parse_identifier()?;
            let initializer = if self.match_token(&Token::Assign) {
                self.nls();
                Some(self.parse_command_expression()?)
            } else {
                None
            };
            declarators.push(VariableDeclarator { name, initializer });
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.nls();
        }
        Ok(VariableDecl { modifiers, var_type, declarators })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(source: &str) -> Parser {
        Parser::new(source).unwrap()
    }

    #[test]
    fn var_is_a_modifier_only_before_a_name() {
        assert!(parser("var x = 1").is_modifier_at(0));
        assert!(!parser("var = 1").is_modifier_at(0));
        assert!(!parser("synchronized (lock) {}").is_modifier_at(0));
        assert!(parser("@Field int x").is_modifier_at(0));
    }

    #[test]
    fn class_declaration_lookahead_skips_modifiers() {
        assert!(parser("@CompileStatic\npublic final class A {}").is_class_declaration_start());
        assert!(parser("@interface Marker {}").is_class_declaration_start());
        assert!(parser("trait Named {}").is_class_declaration_start());
        assert!(!parser("trait = 1").is_class_declaration_start());
        assert!(!parser("trait x = 1").is_class_declaration_start());
        assert!(!parser("def x = 1").is_class_declaration_start());
    }

    #[test]
    fn script_method_shapes() {
        assert!(parser("def foo() {}").is_script_method_start());
        assert!(parser("int foo(x) {\n}").is_script_method_start());
        assert!(parser("String foo()\n{}").is_script_method_start());
        assert!(parser("java.util.List foo() {}").is_script_method_start());
        assert!(parser("void foo() throws IOException {}").is_script_method_start());
        assert!(!parser("foo() {}").is_script_method_start());
        assert!(!parser("foo bar() {}").is_script_method_start());
        assert!(!parser("def foo()").is_script_method_start());
        assert!(!parser("def x = 1").is_script_method_start());
    }

    #[test]
    fn varargs_must_come_last() {
        let mut p = parser("String... a, int b");
        let err = p.parse_formal_parameters().unwrap_err();
        assert!(matches!(err, ParseError::InvalidDeclarationContext { ref decl_kind, .. } if decl_kind == "parameter"));

        let params = parser("int b, String... a").parse_formal_parameters().unwrap();
        assert!(params[1].varargs);
    }

    #[test]
    fn receiver_parameter() {
        let params = parser("Outer this, int x").parse_formal_parameters().unwrap();
        assert!(params[0].is_receiver);
        assert_eq!(params[0].name, "this");
        assert_eq!(params[1].name, "x");
    }
}
