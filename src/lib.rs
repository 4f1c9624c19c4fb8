//! Groovy parser (gparse)
//!
//! A hand-written recursive descent parser for Groovy, the Java superset
//! with optional semicolons, command expressions, closures and interpolated
//! strings.
//!
//! ## Architecture
//!
//! - **parser**: tokenizer and recursive descent parser
//! - **ast**: syntax tree and the canonical printer
//! - **config**: lookahead and nesting limits
//! - **bin**: command-line interface
//!
//! ## Parsing Flow
//!
//! ```text
//! Groovy Source → Lexer → Tokens → Parser → CompilationUnit
//!                                    ↓
//!              statements ↔ expressions ↔ declarations ↔ types
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod parser;

pub use ast::{AstPrinter, CompilationUnit};
pub use config::ParserConfig;
pub use error::{Error, Result};
pub use parser::{parse_expression, parse_groovy, parse_statement, parse_type, ParseError};

use std::path::Path;

/// Parse Groovy source with limits taken from the environment
pub fn parse_source(source: &str) -> Result<CompilationUnit> {
    let config = ParserConfig::from_env()?;
    parser::parse_groovy_with_config(source, config)
}

/// Read and parse one Groovy file
pub fn parse_file(path: impl AsRef<Path>) -> Result<CompilationUnit> {
    let path = path.as_ref();
    log::debug!("parsing {}", path.display());
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&source)
}

/// Parse several Groovy files, stopping at the first failure
pub fn parse_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<CompilationUnit>> {
    paths.iter().map(parse_file).collect()
}
