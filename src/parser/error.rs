use super::span::Location;
use thiserror::Error;

/// Everything that can stop a parse.
///
/// The parser is fail-fast: the first error aborts the compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No grammar alternative matches the current token
    #[error("{location}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },

    /// A cast-vs-parenthesis or generics-vs-shift form the bounded lookahead could not settle
    #[error("{location}: ambiguous {construct}: {reason}")]
    AmbiguousConstruct {
        construct: String,
        reason: String,
        location: Location,
    },

    /// A well-formed construct used where the language forbids it
    #[error("{location}: invalid {decl_kind}: {reason}")]
    InvalidDeclarationContext {
        decl_kind: String,
        reason: String,
        location: Location,
    },

    #[error("{location}: lexical error: {message}")]
    LexicalError {
        message: String,
        location: Location,
    },

    #[error("{location}: nesting deeper than {limit} levels")]
    NestingTooDeep {
        limit: usize,
        location: Location,
    },
}

impl ParseError {
    pub fn unexpected_token(expected: impl Into<String>, found: impl Into<String>, location: Location) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            location,
        }
    }

    pub fn ambiguous(construct: impl Into<String>, reason: impl Into<String>, location: Location) -> Self {
        ParseError::AmbiguousConstruct {
            construct: construct.into(),
            reason: reason.into(),
            location,
        }
    }

    pub fn invalid_declaration(decl_kind: impl Into<String>, reason: impl Into<String>, location: Location) -> Self {
        ParseError::InvalidDeclarationContext {
            decl_kind: decl_kind.into(),
            reason: reason.into(),
            location,
        }
    }

    pub fn lexical_error(message: impl Into<String>, location: Location) -> Self {
        ParseError::LexicalError {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::AmbiguousConstruct { location, .. }
            | ParseError::InvalidDeclarationContext { location, .. }
            | ParseError::LexicalError { location, .. }
            | ParseError::NestingTooDeep { location, .. } => *location,
        }
    }
}

/// Result type used throughout the parser
pub type ParseResult<T> = std::result::Result<T, ParseError>;
