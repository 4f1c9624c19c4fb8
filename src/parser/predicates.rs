//! Lookahead predicates that pick between otherwise ambiguous alternatives.
//!
//! Each predicate is a pure function over a window of upcoming tokens or
//! over an expression that was just parsed, so it can be tested directly.

use super::lexer::{LexicalToken, Token};
use crate::ast::{Expr, ExprKind};

fn kind(window: &[LexicalToken], index: usize) -> Token {
    window.get(index).map_or(Token::Eof, |t| t.token)
}

/// Whether a statement that starts like `Type name` is not a variable
/// declaration after all.
///
/// `window` starts at the first token of the statement. `println x` and
/// `a.b c` read as command expressions, while `String x`, `int x`,
/// `foo x = 1`, `List<T> x` and `a.B x` stay declarations.
pub fn is_invalid_local_variable_declaration(window: &[LexicalToken]) -> bool {
    // index of the last name segment of the type, and of the token after it
    let mut last = 0;
    if kind(window, 1) == Token::Dot {
        let mut next = 1;
        while kind(window, next) == Token::Dot {
            next += 2;
        }
        if matches!(kind(window, next), Token::Lt | Token::LBracket) {
            return false;
        }
        last = next - 1;
    }

    let Some(token) = window.get(last) else {
        return false;
    };
    let after_type = kind(window, last + 1);
    let after_name = kind(window, last + 2);

    let builtin = token.token.is_primitive_type() || token.token.is_modifier();
    let lowercase = token.lexeme.chars().next().is_some_and(char::is_lowercase);
    let declaration_shaped = after_name == Token::Assign || matches!(after_type, Token::Lt | Token::LBracket);

    !builtin && lowercase && !declaration_shaped
}

/// Whether `expr` already carries its arguments, so a command expression
/// cannot start after it
pub fn is_following_arguments_or_closure(expr: &Expr) -> bool {
    matches!(expr.value, ExprKind::MethodCall { .. } | ExprKind::Call { .. })
}

/// Tokens that can open the first argument of a command expression.
///
/// Operators that could continue a binary expression (`-`, `[`, `(`) are
/// absent, so `a - b` and `a [1]` keep their expression meaning.
pub fn can_start_command_argument(token: Token) -> bool {
    matches!(
        token,
        Token::Identifier
            | Token::Var
            | Token::Trait
            | Token::IntegerLiteral
            | Token::FloatLiteral
            | Token::StringLiteral
            | Token::GStringBegin
            | Token::True
            | Token::False
            | Token::Null
            | Token::New
            | Token::This
            | Token::Super
            | Token::Bang
            | Token::Tilde
            | Token::LBrace
    )
}

/// Whether the tokens after `(Type)` begin an operand, making the
/// parenthesised type a cast.
///
/// `window` starts at the token following `)`. A `{` only follows a cast to a
/// reference type (`(Runnable) { -> }`), while `+`/`-` only follow a cast to
/// a primitive, since `(a) - b` is a subtraction.
pub fn is_cast_operand_start(window: &[LexicalToken], primitive: bool) -> bool {
    match kind(window, 0) {
        Token::Identifier
        | Token::Var
        | Token::Trait
        | Token::IntegerLiteral
        | Token::FloatLiteral
        | Token::StringLiteral
        | Token::GStringBegin
        | Token::True
        | Token::False
        | Token::Null
        | Token::LParen
        | Token::LBracket
        | Token::This
        | Token::Super
        | Token::New
        | Token::Bang
        | Token::Tilde => true,
        Token::LBrace => !primitive,
        Token::Plus | Token::Minus => primitive,
        Token::Inc | Token::Dec => matches!(
            kind(window, 1),
            Token::Identifier | Token::LParen | Token::This
        ),
        _ => false,
    }
}

/// Whether a `{` opens a closure with an explicit parameter list.
///
/// `window` starts after the `{`; the `->` must appear on the same line,
/// outside any nested bracket.
pub fn has_closure_parameters(window: &[LexicalToken]) -> bool {
    let mut depth = 0usize;
    for token in window {
        match token.token {
            Token::Arrow if depth == 0 => return true,
            Token::LParen | Token::LBracket | Token::SafeIndex => depth += 1,
            Token::RParen | Token::RBracket => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Token::LBrace | Token::RBrace | Token::Semicolon | Token::Eof => return false,
            Token::Newline if depth == 0 => return false,
            _ => {}
        }
    }
    false
}
