//! Syntax tree produced by the parser.
//!
//! Every node family is a sum type wrapped in [`Spanned`]; spans are
//! ignored by equality so trees can be compared structurally.

mod nodes;
mod printer;

pub use nodes::*;
pub use printer::*;

pub use crate::parser::span::{Location, Span, Spanned};
