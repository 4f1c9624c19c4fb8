//! Parser module for Groovy source
//!
//! This module handles lexical analysis and parsing of Groovy source into
//! the syntax tree.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod predicates;
pub mod span;

mod commands;
mod declarations;
mod expressions;
mod statements;
mod types;

pub use error::{ParseError, ParseResult};
pub use lexer::{Lexer, LexicalToken, Token};
pub use parser::Parser;
pub use span::{Location, Span, Spanned};

use crate::ast::{CompilationUnit, Expr, Stmt, TypeRef};
use crate::config::ParserConfig;
use crate::error::Result;

/// Parse Groovy source into a compilation unit
pub fn parse_groovy(source: &str) -> Result<CompilationUnit> {
    parse_groovy_with_config(source, ParserConfig::default())
}

/// Parse Groovy source with explicit lookahead and nesting limits
pub fn parse_groovy_with_config(source: &str, config: ParserConfig) -> Result<CompilationUnit> {
    Ok(Parser::with_config(source, config)?.parse()?)
}

/// Parse a single expression spanning the whole input
pub fn parse_expression(source: &str) -> Result<Expr> {
    Ok(Parser::new(source)?.parse_standalone_expression()?)
}

/// Parse a single statement spanning the whole input
pub fn parse_statement(source: &str) -> Result<Stmt> {
    Ok(Parser::new(source)?.parse_standalone_statement()?)
}

/// Parse a single type spanning the whole input
pub fn parse_type(source: &str) -> Result<TypeRef> {
    Ok(Parser::new(source)?.parse_standalone_type()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclKind, StmtKind};

    #[test]
    fn test_parse_simple_class() {
        let source = r#"
package com.example

class HelloWorld {
    static void main(String[] args) {
        println "Hello, World!"
    }
}
"#;

        let unit = parse_groovy(source).expect("Failed to parse");
        let class = unit.classes().next().expect("class");
        assert_eq!(class.kind, DeclKind::Class);
        assert_eq!(class.methods().count(), 1);
    }

    #[test]
    fn test_parse_script_with_imports() {
        let source = r#"
import java.util.List
import java.util.ArrayList

List<String> items = new ArrayList<>()
items << 'a'
"#;

        let unit = parse_groovy(source).expect("Failed to parse");
        assert_eq!(unit.imports.len(), 2);
        let statements: Vec<_> = unit.statements().collect();
        assert!(matches!(statements[0].value, StmtKind::LocalVarDecl(_)));
        assert!(matches!(statements[1].value, StmtKind::Expression(_)));
    }
}
