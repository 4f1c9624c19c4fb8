//! Statements and the dispatcher that tells declarations from expressions.

use super::error::{ParseError, ParseResult};
use super::lexer::Token;
use super::parser::Parser;
use super::predicates;
use super::span::Spanned;
use super::types::TypeScan;
use crate::ast::*;

impl Parser {
    pub(super) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        self.nested(|p| p.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> ParseResult<Stmt> {
        let start = self.current_location();
        let kind = match self.peek().token {
            Token::LBrace => StmtKind::Block(self.parse_block()?),
            Token::Semicolon => {
                self.advance();
                StmtKind::Empty
            }
            Token::If => self.parse_if_stmt()?,
            Token::Switch => self.parse_switch_stmt()?,
            Token::For => self.parse_for_stmt()?,
            Token::While => self.parse_while_stmt()?,
            Token::Do => self.parse_do_while_stmt()?,
            Token::Try => self.parse_try_stmt()?,
            Token::Return => {
                self.advance();
                let value = if self.at_statement_end() { None } else { Some(self.parse_expression(0)?) };
                StmtKind::Return(value)
            }
            Token::Throw => {
                self.advance();
                StmtKind::Throw(self.parse_expression(0)?)
            }
            Token::Break | Token::Continue => {
                let is_break = self.check(&Token::Break);
                self.advance();
                let label = if self.peek().token.is_identifier_like() { Some(self.parse_identifier()?) } else { None };
                if is_break {
                    StmtKind::Break(label)
                } else {
                    StmtKind::Continue(label)
                }
            }
            Token::Assert => self.parse_assert_stmt()?,
            Token::Synchronized if self.peek_kind(1) == Token::LParen => {
                self.advance();
                let lock = self.parse_par_expression()?;
                self.nls();
                StmtKind::Synchronized { lock, body: self.parse_block()? }
            }
            kind if kind.is_identifier_like() && self.peek_kind(1) == Token::Colon => {
                let label = self.parse_identifier()?;
                self.advance();
                self.nls();
                StmtKind::Labeled { label, body: Box::new(self.parse_statement()?) }
            }
            _ if self.is_class_declaration_start() => {
                let modifiers = self.parse_modifiers()?;
                StmtKind::ClassDecl(self.parse_class_declaration(modifiers)?)
            }
            _ if self.is_modifier_at(self.current) => self.parse_declaration_stmt()?,
            _ if self.is_typed_declaration_start()? => {
                let var_type = self.parse_type()?;
                StmtKind::LocalVarDecl(self.parse_variable_declaration(Vec::new(), Some(var_type))?)
            }
            _ => StmtKind::Expression(self.parse_command_expression()?),
        };
        Ok(Spanned::new(kind, self.span_from(start)))
    }

    /// `{ statements }`
    pub(super) fn parse_block(&mut self) -> ParseResult<Block> {
        self.consume(&Token::LBrace, "'{'")?;
        let statements = self.parse_block_statements()?;
        self.consume(&Token::RBrace, "'}'")?;
        Ok(Block { statements })
    }

    /// Separated statements up to, not including, the closing `}`
    pub(super) fn parse_block_statements(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        self.skip_separators();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
            if self.check(&Token::RBrace) {
                break;
            }
            self.consume_separator()?;
        }
        Ok(statements)
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().token,
            Token::Newline | Token::Semicolon | Token::RBrace | Token::Else | Token::Eof
        )
    }

    /// Index of the first token at or after `index` that is not a separator
    fn skip_separators_from(&self, mut index: usize) -> usize {
        while matches!(self.kind_at(index), Token::Newline | Token::Semicolon) {
            index += 1;
        }
        index
    }

    /// `( expr )`
    fn parse_par_expression(&mut self) -> ParseResult<Expr> {
        self.consume(&Token::LParen, "'('")?;
        let expr = self.parse_expression(0)?;
        self.consume(&Token::RParen, "')'")?;
        Ok(expr)
    }

    /// Whether a `Type name` local variable declaration starts here.
    ///
    /// A primitive type always declares; any other type only when the
    /// statement does not read as a command expression.
    pub(super) fn is_typed_declaration_start(&self) -> ParseResult<bool> {
        let kind = self.peek().token;
        if !kind.is_identifier_like() && !kind.is_primitive_type() {
            return Ok(false);
        }
        let end = match self.scan_type(self.current) {
            TypeScan::Type(end) => end,
            TypeScan::NotType => return Ok(false),
            TypeScan::TooLong => {
                return Err(ParseError::ambiguous(
                    "generic type",
                    "type arguments run past the lookahead limit",
                    self.current_location(),
                ));
            }
        };
        if !self.kind_at(end).is_identifier_like() {
            return Ok(false);
        }
        if kind.is_primitive_type() {
            return Ok(true);
        }
        let declaration = !predicates::is_invalid_local_variable_declaration(&self.tokens[self.current..]);
        log::debug!(
            "'{}' at {} starts a {}",
            self.peek().lexeme,
            self.current_location(),
            if declaration { "local variable declaration" } else { "command expression" }
        );
        Ok(declaration)
    }

    /// Local declarations introduced by modifiers or annotations:
    /// `def x = 1`, `final String s`, `def (a, b) = pair`
    fn parse_declaration_stmt(&mut self) -> ParseResult<StmtKind> {
        let modifiers = self.parse_modifiers()?;
        if self.check(&Token::LParen) {
            return Ok(StmtKind::Destructuring(self.parse_tuple_declaration(modifiers)?));
        }
        let var_type = if self.has_type_before_name() { Some(self.parse_type()?) } else { None };
        Ok(StmtKind::LocalVarDecl(self.parse_variable_declaration(modifiers, var_type)?))
    }

    /// After modifiers: whether a type precedes the declared name
    pub(super) fn has_type_before_name(&self) -> bool {
        match self.scan_type(self.current) {
            TypeScan::Type(end) => self.kind_at(end).is_identifier_like(),
            _ => false,
        }
    }

    /// `(a, String b) = value`
    fn parse_tuple_declaration(&mut self, modifiers: Vec<Modifier>) -> ParseResult<TupleDecl> {
        self.consume(&Token::LParen, "'('")?;
        let mut targets = Vec::new();
        loop {
            let untyped = self.peek().token.is_identifier_like()
                && matches!(self.peek_kind(1), Token::Comma | Token::RParen);
            let var_type = if untyped { None } else { Some(self.parse_type()?) };
            let name = self.parse_identifier()?;
            targets.push(TupleTarget { var_type, name });
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::RParen, "')' after declared names")?;
        self.nls();
        self.consume(&Token::Assign, "'=' after declared names")?;
        self.nls();
        let initializer = self.parse_command_expression()?;
        Ok(TupleDecl { modifiers, targets, initializer })
    }

    fn parse_if_stmt(&mut self) -> ParseResult<StmtKind> {
        self.consume(&Token::If, "'if'")?;
        let condition = self.parse_par_expression()?;
        self.nls();
        let then_branch = Box::new(self.parse_statement()?);

        let ahead = self.skip_separators_from(self.current);
        let else_branch = if self.kind_at(ahead) == Token::Else {
            self.current = ahead + 1;
            self.nls();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StmtKind::If { condition, then_branch, else_branch })
    }

    fn parse_switch_stmt(&mut self) -> ParseResult<StmtKind> {
        self.consume(&Token::Switch, "'switch'")?;
        let subject = self.parse_par_expression()?;
        self.nls();
        self.consume(&Token::LBrace, "'{' after switch")?;
        self.skip_separators();

        let mut groups = Vec::new();
        while !self.check(&Token::RBrace) {
            let mut labels = Vec::new();
            while self.is_case_label() {
                labels.push(self.parse_case_label()?);
                self.skip_separators();
            }
            if labels.is_empty() {
                return Err(self.error_here("'case' or 'default'"));
            }

            let mut statements = Vec::new();
            while !self.check(&Token::RBrace) && !self.is_case_label() {
                statements.push(self.parse_statement()?);
                if !self.check(&Token::RBrace) {
                    self.consume_separator()?;
                }
            }
            groups.push(CaseGroup { labels, statements });
        }
        self.consume(&Token::RBrace, "'}' closing switch")?;
        Ok(StmtKind::Switch { subject, groups })
    }

    fn is_case_label(&self) -> bool {
        match self.peek().token {
            Token::Case => true,
            Token::Default => self.peek_kind(1) == Token::Colon,
            _ => false,
        }
    }

    fn parse_case_label(&mut self) -> ParseResult<CaseLabel> {
        if self.match_token(&Token::Default) {
            self.consume(&Token::Colon, "':' after default")?;
            return Ok(CaseLabel::Default);
        }
        self.consume(&Token::Case, "'case'")?;
        let value = self.parse_expression(0)?;
        self.consume(&Token::Colon, "':' after case value")?;
        Ok(CaseLabel::Case(value))
    }

    fn parse_for_stmt(&mut self) -> ParseResult<StmtKind> {
        self.consume(&Token::For, "'for'")?;
        let classic = self.is_classic_for(self.current);
        self.consume(&Token::LParen, "'(' after for")?;
        let control = if classic { self.parse_classic_for_control()? } else { self.parse_enhanced_for_control()? };
        self.consume(&Token::RParen, "')' after for control")?;
        self.nls();
        let body = Box::new(self.parse_statement()?);
        Ok(StmtKind::For { control, body })
    }

    /// A `;` directly inside the parentheses at `open`
    fn is_classic_for(&self, open: usize) -> bool {
        let limit = open.saturating_add(self.config.max_lookahead);
        let mut depth = 0usize;
        let mut i = open;
        while i <= limit {
            match self.kind_at(i) {
                Token::LParen | Token::LBracket | Token::SafeIndex | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return false;
                    }
                }
                Token::Semicolon if depth == 1 => return true,
                Token::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_classic_for_control(&mut self) -> ParseResult<ForControl> {
        let init = if self.check(&Token::Semicolon) {
            None
        } else if self.is_modifier_at(self.current) {
            let modifiers = self.parse_modifiers()?;
            let var_type = if self.has_type_before_name() { Some(self.parse_type()?) } else { None };
            Some(ForInit::Declaration(self.parse_variable_declaration(modifiers, var_type)?))
        } else if self.is_typed_declaration_start()? {
            let var_type = self.parse_type()?;
            Some(ForInit::Declaration(self.parse_variable_declaration(Vec::new(), Some(var_type))?))
        } else {
            Some(ForInit::Expressions(self.parse_expression_list()?))
        };
        self.consume(&Token::Semicolon, "';' after for initializer")?;

        let condition = if self.check(&Token::Semicolon) { None } else { Some(self.parse_expression(0)?) };
        self.consume(&Token::Semicolon, "';' after for condition")?;

        let update = if self.check(&Token::RParen) { Vec::new() } else { self.parse_expression_list()? };
        Ok(ForControl::Classic { init, condition, update })
    }

    fn parse_expression_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.parse_expression(0)?];
        while self.match_token(&Token::Comma) {
            exprs.push(self.parse_expression(0)?);
        }
        Ok(exprs)
    }

    /// `x in xs`, `T x : xs`, `final def x in xs`
    fn parse_enhanced_for_control(&mut self) -> ParseResult<ForControl> {
        let modifiers = self.parse_modifiers()?;
        let untyped = self.peek().token.is_identifier_like() && matches!(self.peek_kind(1), Token::In | Token::Colon);
        let var_type = if untyped { None } else { Some(self.parse_type()?) };
        let name = self.parse_identifier()?;
        if !self.match_token(&Token::In) {
            self.consume(&Token::Colon, "'in' or ':' in for loop")?;
        }
        let iterable = self.parse_expression(0)?;
        Ok(ForControl::Enhanced { modifiers, var_type, name, iterable })
    }

    fn parse_while_stmt(&mut self) -> ParseResult<StmtKind> {
        self.consume(&Token::While, "'while'")?;
        let condition = self.parse_par_expression()?;
        self.nls();
        let body = Box::new(self.parse_statement()?);
        Ok(StmtKind::While { condition, body })
    }

    fn parse_do_while_stmt(&mut self) -> ParseResult<StmtKind> {
        self.consume(&Token::Do, "'do'")?;
        self.nls();
        let body = Box::new(self.parse_statement()?);
        self.skip_separators();
        self.consume(&Token::While, "'while' after do body")?;
        let condition = self.parse_par_expression()?;
        Ok(StmtKind::DoWhile { body, condition })
    }

    fn parse_try_stmt(&mut self) -> ParseResult<StmtKind> {
        self.consume(&Token::Try, "'try'")?;
        let resources = if self.check(&Token::LParen) { self.parse_resources()? } else { Vec::new() };
        self.nls();
        let body = self.parse_block()?;

        let mut catches = Vec::new();
        while self.peek_past_newlines() == Token::Catch {
            self.nls();
            catches.push(self.parse_catch_clause()?);
        }
        let finally_block = if self.peek_past_newlines() == Token::Finally {
            self.nls();
            self.advance();
            self.nls();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(StmtKind::Try { resources, body, catches, finally_block })
    }

    /// `(r1 = a; Type r2 = b)`; line breaks separate resources too
    fn parse_resources(&mut self) -> ParseResult<Vec<Resource>> {
        self.consume(&Token::LParen, "'('")?;
        self.skip_separators();
        let mut resources = Vec::new();
        while !self.check(&Token::RParen) {
            resources.push(self.parse_resource()?);
            if !matches!(self.peek().token, Token::Newline | Token::Semicolon) {
                break;
            }
            self.skip_separators();
        }
        self.consume(&Token::RParen, "')' after resources")?;
        Ok(resources)
    }

    fn parse_resource(&mut self) -> ParseResult<Resource> {
        let modifiers = self.parse_modifiers()?;
        let typed = self.is_typed_declaration_start()?;
        if modifiers.is_empty() && !typed {
            return Ok(Resource::Expression(self.parse_expression(0)?));
        }
        let var_type = if typed { Some(self.parse_type()?) } else { None };
        let name = self.parse_identifier()?;
        self.consume(&Token::Assign, "'=' in resource declaration")?;
        self.nls();
        let initializer = self.parse_expression(0)?;
        Ok(Resource::Declaration { modifiers, var_type, name, initializer })
    }

    /// `catch (A | B e) {}` or `catch (e) {}`
    fn parse_catch_clause(&mut self) -> ParseResult<CatchClause> {
        self.consume(&Token::Catch, "'catch'")?;
        self.consume(&Token::LParen, "'(' after catch")?;
        let modifiers = self.parse_modifiers()?;
        let mut types = Vec::new();
        if !(self.peek().token.is_identifier_like() && self.peek_kind(1) == Token::RParen) {
            types.push(self.parse_type()?);
            while self.match_token(&Token::Pipe) {
                types.push(self.parse_type()?);
            }
        }
        let name = self.parse_identifier()?;
        self.consume(&Token::RParen, "')' after catch parameter")?;
        self.nls();
        let body = self.parse_block()?;
        Ok(CatchClause { modifiers, types, name, body })
    }

    /// `assert cond`, `assert cond : message` or `assert cond, message`
    fn parse_assert_stmt(&mut self) -> ParseResult<StmtKind> {
        self.consume(&Token::Assert, "'assert'")?;
        let condition = self.parse_expression(0)?;
        let message = if self.match_token(&Token::Colon) || self.match_token(&Token::Comma) {
            self.nls();
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        Ok(StmtKind::Assert { condition, message })
    }
}
