use logos::Logos;

use super::error::{ParseError, ParseResult};
use super::span::Location;

/// Token kinds of the language
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[logos(skip r"[ \t\f\x{FEFF}]+")]
#[logos(skip r"\\\r?\n")]
pub enum Token {
    // Keywords
    #[token("abstract")]
    Abstract,
    #[token("as")]
    As,
    #[token("assert")]
    Assert,
    #[token("boolean")]
    Boolean,
    #[token("break")]
    Break,
    #[token("byte")]
    Byte,
    #[token("case")]
    Case,
    #[token("catch")]
    Catch,
    #[token("char")]
    Char,
    #[token("class")]
    Class,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("def")]
    Def,
    #[token("default")]
    Default,
    #[token("do")]
    Do,
    #[token("double")]
    Double,
    #[token("else")]
    Else,
    #[token("enum")]
    Enum,
    #[token("extends")]
    Extends,
    #[token("final")]
    Final,
    #[token("finally")]
    Finally,
    #[token("float")]
    Float,
    #[token("for")]
    For,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("implements")]
    Implements,
    #[token("import")]
    Import,
    #[token("in")]
    In,
    #[token("instanceof")]
    Instanceof,
    #[token("int")]
    Int,
    #[token("interface")]
    Interface,
    #[token("long")]
    Long,
    #[token("native")]
    Native,
    #[token("new")]
    New,
    #[token("package")]
    Package,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("public")]
    Public,
    #[token("return")]
    Return,
    #[token("short")]
    Short,
    #[token("static")]
    Static,
    #[token("strictfp")]
    Strictfp,
    #[token("super")]
    Super,
    #[token("switch")]
    Switch,
    #[token("synchronized")]
    Synchronized,
    #[token("this")]
    This,
    #[token("throw")]
    Throw,
    #[token("throws")]
    Throws,
    #[token("trait")]
    Trait,
    #[token("transient")]
    Transient,
    #[token("try")]
    Try,
    #[token("var")]
    Var,
    #[token("void")]
    Void,
    #[token("volatile")]
    Volatile,
    #[token("while")]
    While,

    // Literals
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[regex(r"(0[xX][0-9a-fA-F][0-9a-fA-F_]*|0[bB][01][01_]*|[0-9][0-9_]*)[lLiIgG]?")]
    IntegerLiteral,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[fFdDgG]?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+[fFdDgG]?")]
    #[regex(r"[0-9][0-9_]*[fFdD]")]
    FloatLiteral,
    #[token("'", |lex| close_string(lex, "'", false))]
    #[token("'''", |lex| close_string(lex, "'''", false))]
    StringLiteral,
    /// A double-quoted string as it appears in the source; the `Lexer`
    /// replaces it with `StringLiteral` or a GString token run
    #[token("\"", |lex| close_string(lex, "\"", true))]
    #[token("\"\"\"", |lex| close_string(lex, "\"\"\"", true))]
    DoubleQuoted,
    /// A slashy string `/.../`, built by the `Lexer` from a `/` that sits
    /// where an operand may start
    Slashy,
    /// A dollar-slashy string `$/.../$`; expanded like `DoubleQuoted`
    #[token("$/", close_dollar_slashy)]
    DollarSlashy,
    /// Leading text of an interpolated string
    GStringBegin,
    /// Text between two interpolated values
    GStringPart,
    /// Trailing text of an interpolated string
    GStringEnd,

    #[regex(r"[\p{XID_Start}_$][\p{XID_Continue}$]*")]
    Identifier,

    // Separators
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
    #[regex(r"\r?\n")]
    Newline,

    // Path operators
    #[token("?.")]
    SafeDot,
    #[token("*.")]
    SpreadDot,
    #[token(".&")]
    MethodPointer,
    #[token("::")]
    DoubleColon,
    #[token("?[")]
    SafeIndex,
    #[token("..")]
    Range,
    #[token("..<")]
    RangeExclusive,
    #[token("...")]
    Ellipsis,
    #[token("->")]
    Arrow,

    // Operators
    #[token("=")]
    Assign,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("?:")]
    Elvis,
    #[token("==")]
    Eq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("!=")]
    Ne,
    #[token("<=>")]
    Spaceship,
    #[token("===")]
    Identical,
    #[token("!==")]
    NotIdentical,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    PipePipe,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    Power,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("=~")]
    RegexFind,
    #[token("==~")]
    RegexMatch,
    /// `!in`, merged from `!` and `in`
    NotIn,
    /// `!instanceof`, merged from `!` and `instanceof`
    NotInstanceof,

    // Assignment operators
    #[token("+=")]
    AddAssign,
    #[token("-=")]
    SubAssign,
    #[token("*=")]
    MulAssign,
    #[token("/=")]
    DivAssign,
    #[token("%=")]
    ModAssign,
    #[token("&=")]
    AndAssign,
    #[token("|=")]
    OrAssign,
    #[token("^=")]
    XorAssign,
    #[token("<<=")]
    LShiftAssign,
    #[token(">>=")]
    RShiftAssign,
    #[token(">>>=")]
    URShiftAssign,
    #[token("**=")]
    PowerAssign,
    #[token("?=")]
    ElvisAssign,

    // Trivia, dropped by the Lexer
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    BlockComment,
    #[regex(r"#![^\n]*")]
    Shebang,

    /// End of input, always the last token
    Eof,
}

impl Token {
    /// Declaration modifiers, excluding annotations
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Token::Public
                | Token::Protected
                | Token::Private
                | Token::Abstract
                | Token::Final
                | Token::Native
                | Token::Synchronized
                | Token::Transient
                | Token::Volatile
                | Token::Static
                | Token::Strictfp
                | Token::Default
                | Token::Def
                | Token::Var
        )
    }

    /// Primitive type keywords (not `void`)
    pub fn is_primitive_type(&self) -> bool {
        matches!(
            self,
            Token::Boolean
                | Token::Byte
                | Token::Short
                | Token::Int
                | Token::Long
                | Token::Char
                | Token::Float
                | Token::Double
        )
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::IntegerLiteral
                | Token::FloatLiteral
                | Token::StringLiteral
                | Token::True
                | Token::False
                | Token::Null
        )
    }

    /// Reserved words; all of them may follow a `.` as a member name
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Abstract
                | Token::As
                | Token::Assert
                | Token::Boolean
                | Token::Break
                | Token::Byte
                | Token::Case
                | Token::Catch
                | Token::Char
                | Token::Class
                | Token::Const
                | Token::Continue
                | Token::Def
                | Token::Default
                | Token::Do
                | Token::Double
                | Token::Else
                | Token::Enum
                | Token::Extends
                | Token::Final
                | Token::Finally
                | Token::Float
                | Token::For
                | Token::Goto
                | Token::If
                | Token::Implements
                | Token::Import
                | Token::In
                | Token::Instanceof
                | Token::Int
                | Token::Interface
                | Token::Long
                | Token::Native
                | Token::New
                | Token::Package
                | Token::Private
                | Token::Protected
                | Token::Public
                | Token::Return
                | Token::Short
                | Token::Static
                | Token::Strictfp
                | Token::Super
                | Token::Switch
                | Token::Synchronized
                | Token::This
                | Token::Throw
                | Token::Throws
                | Token::Trait
                | Token::Transient
                | Token::Try
                | Token::Var
                | Token::Void
                | Token::Volatile
                | Token::While
                | Token::True
                | Token::False
                | Token::Null
        )
    }

    /// Tokens that are an identifier everywhere a name is expected
    pub fn is_identifier_like(&self) -> bool {
        matches!(self, Token::Identifier | Token::Var | Token::Trait)
    }

    pub fn is_assignment_operator(&self) -> bool {
        matches!(
            self,
            Token::Assign
                | Token::AddAssign
                | Token::SubAssign
                | Token::MulAssign
                | Token::DivAssign
                | Token::ModAssign
                | Token::AndAssign
                | Token::OrAssign
                | Token::XorAssign
                | Token::LShiftAssign
                | Token::RShiftAssign
                | Token::URShiftAssign
                | Token::PowerAssign
                | Token::ElvisAssign
        )
    }

    fn is_trivia(&self) -> bool {
        matches!(self, Token::LineComment | Token::BlockComment | Token::Shebang)
    }
}

/// Token with its source text and start position
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalToken {
    pub token: Token,
    pub lexeme: String,
    pub location: Location,
}

impl LexicalToken {
    pub fn new(token: Token, lexeme: impl Into<String>, location: Location) -> Self {
        Self { token, lexeme: lexeme.into(), location }
    }

    pub fn token_type(&self) -> &Token {
        &self.token
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Position just past the token
    pub fn end_location(&self) -> Location {
        self.location.after(&self.lexeme)
    }

    pub fn is(&self, token_type: &Token) -> bool {
        self.token == *token_type
    }

    /// How the token reads in an error message
    pub fn describe(&self) -> String {
        match self.token {
            Token::Eof => "end of input".to_string(),
            Token::Newline => "newline".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

/// Tokenizer producing the parser's token stream.
///
/// Line breaks are kept as `Newline` tokens except inside `(...)` and
/// `[...]`; runs of them collapse into one. Double-quoted, slashy and
/// dollar-slashy strings holding `$` interpolation are split into
/// `GStringBegin`/`GStringPart`/`GStringEnd` around the embedded tokens.
/// A `/` starts a slashy string only where an operand may begin.
pub struct Lexer<'a> {
    source: &'a str,
    base: Location,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, base: Location::start() }
    }

    fn at(source: &'a str, base: Location) -> Self {
        Self { source, base }
    }

    /// Every token of the source, terminated by `Eof`
    pub fn tokenize(self) -> ParseResult<Vec<LexicalToken>> {
        let end = self.base.after(self.source);
        let raw = self.lex_raw()?;
        let mut tokens = arrange(raw);
        tokens.push(LexicalToken::new(Token::Eof, "", end));
        log::trace!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }

    fn lex_raw(self) -> ParseResult<Vec<LexicalToken>> {
        let mut tokens = Vec::new();
        let mut lexer = Token::lexer(self.source);
        let mut location = self.base;
        let mut consumed = 0;
        let mut groups: Vec<Group> = Vec::new();
        // last token the parser will see, ignoring line breaks it drops
        let mut last: Option<Token> = None;

        while let Some(mut result) = lexer.next() {
            if matches!(result, Ok(Token::Slash | Token::DivAssign)) && operand_may_follow(last) {
                let open = lexer.span().start;
                result = match slashy_length(&self.source[open + 1..]) {
                    Some(len) => {
                        lexer.bump(open + 1 + len - lexer.span().end);
                        Ok(Token::Slashy)
                    }
                    None => Err(()),
                };
            }
            let range = lexer.span();
            location.advance_str(&self.source[consumed..range.start]);
            let lexeme = lexer.slice();
            let start = location;
            location.advance_str(lexeme);
            consumed = range.end;

            let before = tokens.len();
            match result {
                Ok(Token::DoubleQuoted) => tokens.extend(expand_string(lexeme, start, Quoting::Quoted)?),
                Ok(Token::Slashy) => tokens.extend(expand_string(lexeme, start, Quoting::Slashy)?),
                Ok(Token::DollarSlashy) => tokens.extend(expand_string(lexeme, start, Quoting::DollarSlashy)?),
                Ok(Token::Shebang) if range.start != 0 => {
                    return Err(ParseError::lexical_error("'#!' is only allowed on the first line", start));
                }
                Ok(Token::BlockComment) if lexeme.contains('\n') => {
                    tokens.push(LexicalToken::new(Token::Newline, "\n", start));
                }
                Ok(token) if token.is_trivia() => {}
                Ok(token) => tokens.push(LexicalToken::new(token, lexeme, start)),
                Err(()) => {
                    let message = if lexeme.starts_with('\'') || lexeme.starts_with('"') || lexeme.starts_with("$/") {
                        "unterminated string literal".to_string()
                    } else if lexeme.starts_with('/') {
                        "unterminated slashy string".to_string()
                    } else {
                        format!("unrecognized input '{}'", lexeme)
                    };
                    return Err(ParseError::lexical_error(message, start));
                }
            }
            if let Some(pushed) = tokens[before..].last().map(|t| t.token) {
                if tokens.len() == before + 1 {
                    track_group(&mut groups, pushed, last);
                }
                if !(pushed == Token::Newline && newlines_hidden(&groups)) {
                    last = Some(pushed);
                }
            }
        }
        Ok(tokens)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Group {
    Paren,
    TryParen,
    Bracket,
    Brace,
}

/// Push or pop the group `token` opens or closes; `prev` precedes it
fn track_group(groups: &mut Vec<Group>, token: Token, prev: Option<Token>) {
    match token {
        Token::LParen if prev == Some(Token::Try) => groups.push(Group::TryParen),
        Token::LParen => groups.push(Group::Paren),
        Token::LBracket | Token::SafeIndex => groups.push(Group::Bracket),
        Token::LBrace => groups.push(Group::Brace),
        Token::RParen | Token::RBracket | Token::RBrace => {
            groups.pop();
        }
        _ => {}
    }
}

fn newlines_hidden(groups: &[Group]) -> bool {
    matches!(groups.last(), Some(Group::Paren | Group::Bracket))
}

/// Merge `!in`/`!instanceof`, drop line breaks inside parentheses and
/// brackets, and collapse runs of line breaks.
fn arrange(raw: Vec<LexicalToken>) -> Vec<LexicalToken> {
    let mut out: Vec<LexicalToken> = Vec::with_capacity(raw.len());
    let mut groups: Vec<Group> = Vec::new();

    for token in raw {
        match token.token {
            Token::Newline => {
                let suppressed = newlines_hidden(&groups);
                let repeated = matches!(out.last(), Some(prev) if prev.token == Token::Newline);
                if !suppressed && !repeated {
                    out.push(token);
                }
                continue;
            }
            Token::In | Token::Instanceof => {
                if let Some(prev) = out.last_mut() {
                    if prev.token == Token::Bang && prev.location.offset + 1 == token.location.offset {
                        prev.token = if token.token == Token::In { Token::NotIn } else { Token::NotInstanceof };
                        prev.lexeme.push_str(&token.lexeme);
                        continue;
                    }
                }
            }
            _ => {}
        }
        track_group(&mut groups, token.token, out.last().map(|prev| prev.token));
        out.push(token);
    }
    out
}

/// Length of a string body up to and including its closing `delim`
fn string_length(text: &str, delim: &str, interpolating: bool) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if text[i..].starts_with(delim) {
            return Some(i + delim.len());
        }
        match bytes[i] {
            b'\\' => i += 1 + char_len(text, i + 1),
            b'$' if interpolating && bytes.get(i + 1) == Some(&b'{') => {
                i = closing_brace(text, i + 1)? + 1;
            }
            b'\n' if delim.len() == 1 => return None,
            _ => i += char_len(text, i),
        }
    }
    None
}

/// Index of the `}` matching the `{` at `open`, skipping nested strings
fn closing_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            b'"' => i += 1 + string_length(&text[i + 1..], "\"", true)?,
            b'\'' => i += 1 + string_length(&text[i + 1..], "'", false)?,
            _ => i += char_len(text, i),
        }
    }
    None
}

fn char_len(text: &str, at: usize) -> usize {
    text.get(at..)
        .and_then(|rest| rest.chars().next())
        .map_or(1, char::len_utf8)
}

fn close_string(lex: &mut logos::Lexer<Token>, delim: &str, interpolating: bool) -> bool {
    match string_length(lex.remainder(), delim, interpolating) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

/// Whether an operand, and so a slashy string, may follow `prev`
fn operand_may_follow(prev: Option<Token>) -> bool {
    let Some(prev) = prev else {
        return true;
    };
    !(prev.is_identifier_like()
        || matches!(
            prev,
            Token::Inc
                | Token::Dec
                | Token::This
                | Token::RParen
                | Token::RBracket
                | Token::RBrace
                | Token::GStringEnd
                | Token::StringLiteral
                | Token::IntegerLiteral
                | Token::FloatLiteral
                | Token::True
                | Token::False
                | Token::Null
        ))
}

/// Length of a slashy string body up to and including its closing `/`
fn slashy_length(text: &str) -> Option<usize> {
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with('/') {
            return Some(i + 1);
        }
        if let Some(len) = Quoting::Slashy.escape_len(rest) {
            i += len;
        } else if rest.starts_with("${") {
            i = closing_brace(text, i + 1)? + 1;
        } else {
            i += char_len(text, i);
        }
    }
    None
}

/// Length of a dollar-slashy string body up to and including its closing `/$`
fn dollar_slashy_length(text: &str) -> Option<usize> {
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with("/$") {
            return Some(i + 2);
        }
        if let Some(len) = Quoting::DollarSlashy.escape_len(rest) {
            i += len;
        } else if rest.starts_with("${") {
            i = closing_brace(text, i + 1)? + 1;
        } else {
            i += char_len(text, i);
        }
    }
    None
}

fn close_dollar_slashy(lex: &mut logos::Lexer<Token>) -> bool {
    match dollar_slashy_length(lex.remainder()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

/// How a string literal delimits its body and escapes characters
#[derive(Debug, Clone, Copy, PartialEq)]
enum Quoting {
    /// `'...'`, `"..."` and their triple forms, with backslash escapes
    Quoted,
    /// `/.../`, where only `\/` is an escape
    Slashy,
    /// `$/.../$`, with `$$`, `$/` and `$/$` escapes
    DollarSlashy,
}

impl Quoting {
    fn of(literal: &str) -> Self {
        if literal.starts_with("$/") {
            Quoting::DollarSlashy
        } else if literal.starts_with('/') {
            Quoting::Slashy
        } else {
            Quoting::Quoted
        }
    }

    /// Opening and closing delimiter lengths of `literal`
    fn delimiters(self, literal: &str) -> (usize, usize) {
        match self {
            Quoting::Quoted if (literal.starts_with("'''") || literal.starts_with("\"\"\"")) && literal.len() >= 6 => (3, 3),
            Quoting::Quoted | Quoting::Slashy => (1, 1),
            Quoting::DollarSlashy => (2, 2),
        }
    }

    /// Length of the escape sequence that `rest` starts with, if any
    fn escape_len(self, rest: &str) -> Option<usize> {
        match self {
            Quoting::Quoted => rest
                .strip_prefix('\\')
                .map(|after| 1 + after.chars().next().map_or(0, char::len_utf8)),
            Quoting::Slashy => rest.starts_with("\\/").then_some(2),
            Quoting::DollarSlashy if rest.starts_with("$/$") => Some(3),
            Quoting::DollarSlashy => (rest.starts_with("$$") || rest.starts_with("$/")).then_some(2),
        }
    }

    /// The text `raw` stands for, with escapes resolved
    fn value(self, raw: &str) -> String {
        if self == Quoting::Quoted {
            return unescape(raw);
        }
        // slashy escapes drop their leading character
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(ch) = rest.chars().next() {
            match self.escape_len(rest) {
                Some(len) => {
                    out.push_str(&rest[1..len]);
                    rest = &rest[len..];
                }
                None => {
                    out.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        out
    }
}

/// `value` written with double-quote escapes, so `unescape` reads it back
fn requote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

enum Fragment<'s> {
    Text(&'s str),
    /// Byte range of the source between `${` and `}`
    Block(usize, usize),
    /// `$a.b.c` segments with their byte offsets
    Path(Vec<(usize, &'s str)>),
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte index just past the identifier starting at `start`
fn ident_end(text: &str, start: usize) -> usize {
    text[start..]
        .char_indices()
        .find(|&(_, c)| !is_ident_part(c))
        .map_or(text.len(), |(offset, _)| start + offset)
}

fn starts_ident(text: &str) -> bool {
    text.chars().next().is_some_and(is_ident_start)
}

/// Split a string body into literal text and interpolated values
fn split_interpolation(body: &str, quoting: Quoting) -> Option<Vec<Fragment<'_>>> {
    let mut fragments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;
    while i < body.len() {
        let rest = &body[i..];
        if let Some(len) = quoting.escape_len(rest) {
            i += len;
        } else if rest.starts_with("${") {
            let close = closing_brace(body, i + 1)?;
            fragments.push(Fragment::Text(&body[text_start..i]));
            fragments.push(Fragment::Block(i + 2, close));
            i = close + 1;
            text_start = i;
        } else if rest.starts_with('$') && starts_ident(&rest[1..]) {
            fragments.push(Fragment::Text(&body[text_start..i]));
            let mut segments = Vec::new();
            let mut start = i + 1;
            loop {
                let end = ident_end(body, start);
                segments.push((start, &body[start..end]));
                i = end;
                if body[end..].starts_with('.') && starts_ident(&body[end + 1..]) {
                    start = end + 1;
                } else {
                    break;
                }
            }
            fragments.push(Fragment::Path(segments));
            text_start = i;
        } else {
            i += char_len(body, i);
        }
    }
    fragments.push(Fragment::Text(&body[text_start..]));
    Some(fragments)
}

/// A string literal, or the GString token run of an interpolating one.
/// Text tokens of slashy strings carry their value in double-quote escapes.
fn expand_string(lexeme: &str, start: Location, quoting: Quoting) -> ParseResult<Vec<LexicalToken>> {
    let (open, close) = quoting.delimiters(lexeme);
    let body = &lexeme[open..lexeme.len() - close];
    let body_start = start.after(&lexeme[..open]);

    let fragments = split_interpolation(body, quoting)
        .ok_or_else(|| ParseError::lexical_error("unterminated '${' in string", start))?;
    if fragments.len() == 1 {
        return Ok(vec![LexicalToken::new(Token::StringLiteral, lexeme, start)]);
    }

    let locate = |offset: usize| body_start.after(&body[..offset]);
    let text_count = fragments.iter().filter(|f| matches!(f, Fragment::Text(_))).count();
    let mut texts_seen = 0;
    let mut tokens = Vec::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => {
                let kind = if texts_seen == 0 {
                    Token::GStringBegin
                } else if texts_seen + 1 == text_count {
                    Token::GStringEnd
                } else {
                    Token::GStringPart
                };
                let offset = text.as_ptr() as usize - body.as_ptr() as usize;
                texts_seen += 1;
                let text = match quoting {
                    Quoting::Quoted => text.to_string(),
                    _ => requote(&quoting.value(text)),
                };
                tokens.push(LexicalToken::new(kind, text, locate(offset)));
            }
            Fragment::Block(from, to) => {
                tokens.push(LexicalToken::new(Token::LBrace, "{", locate(from - 1)));
                tokens.extend(Lexer::at(&body[from..to], locate(from)).lex_raw()?);
                tokens.push(LexicalToken::new(Token::RBrace, "}", locate(to)));
            }
            Fragment::Path(segments) => {
                for (index, (offset, name)) in segments.into_iter().enumerate() {
                    if index > 0 {
                        tokens.push(LexicalToken::new(Token::Dot, ".", locate(offset - 1)));
                    }
                    tokens.push(LexicalToken::new(Token::Identifier, name, locate(offset)));
                }
            }
        }
    }
    Ok(tokens)
}

/// Resolve escape sequences in the body of a string literal
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('0') => out.push('\0'),
            Some('\n') => {}
            Some('u') => {
                let hex: String = std::iter::from_fn(|| chars.next_if(|c| c.is_ascii_hexdigit()))
                    .take(4)
                    .collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => out.push(decoded),
                    _ => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other @ ('\\' | '\'' | '"' | '$' | '/')) => out.push(other),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// The content of a string literal with its delimiters removed and escapes resolved
pub fn string_value(literal: &str) -> String {
    let quoting = Quoting::of(literal);
    let (open, close) = quoting.delimiters(literal);
    if literal.len() < open + close {
        return unescape(literal);
    }
    quoting.value(&literal[open..literal.len() - close])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .tokenize()
            .expect("tokenize")
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("def inside in index"),
            vec![Token::Def, Token::Identifier, Token::In, Token::Identifier, Token::Eof]
        );
    }

    #[test]
    fn never_emits_shift_tokens() {
        assert_eq!(
            kinds("a >> b"),
            vec![Token::Identifier, Token::Gt, Token::Gt, Token::Identifier, Token::Eof]
        );
        assert_eq!(kinds("x >>>= 1")[1], Token::URShiftAssign);
    }

    #[test]
    fn merges_negated_keywords() {
        assert_eq!(
            kinds("a !in b"),
            vec![Token::Identifier, Token::NotIn, Token::Identifier, Token::Eof]
        );
        assert_eq!(kinds("a !instanceof B")[1], Token::NotInstanceof);
        assert_eq!(kinds("! in")[0], Token::Bang);
        assert_eq!(kinds("!inside")[..2], [Token::Bang, Token::Identifier]);
    }

    #[test]
    fn newlines_inside_parens_are_dropped() {
        assert_eq!(
            kinds("f(a,\n b)\n\n\nc"),
            vec![
                Token::Identifier,
                Token::LParen,
                Token::Identifier,
                Token::Comma,
                Token::Identifier,
                Token::RParen,
                Token::Newline,
                Token::Identifier,
                Token::Eof
            ]
        );
    }

    #[test]
    fn newlines_inside_closures_in_parens_are_kept() {
        let tokens = kinds("f({\na\n})");
        assert_eq!(tokens.iter().filter(|t| **t == Token::Newline).count(), 2);
    }

    #[test]
    fn try_resources_keep_newlines() {
        let tokens = kinds("try (a\nb) {}");
        assert!(tokens.contains(&Token::Newline));
    }

    #[test]
    fn composite_operators() {
        assert_eq!(
            kinds("a?.b*.c.&d::e ?: f <=> g === h !== i"),
            vec![
                Token::Identifier,
                Token::SafeDot,
                Token::Identifier,
                Token::SpreadDot,
                Token::Identifier,
                Token::MethodPointer,
                Token::Identifier,
                Token::DoubleColon,
                Token::Identifier,
                Token::Elvis,
                Token::Identifier,
                Token::Spaceship,
                Token::Identifier,
                Token::Identical,
                Token::Identifier,
                Token::NotIdentical,
                Token::Identifier,
                Token::Eof
            ]
        );
    }

    #[test]
    fn numbers_and_ranges() {
        assert_eq!(
            kinds("1..10 1..<2 3.5f 0x1F 1_000L 2e10"),
            vec![
                Token::IntegerLiteral,
                Token::Range,
                Token::IntegerLiteral,
                Token::IntegerLiteral,
                Token::RangeExclusive,
                Token::IntegerLiteral,
                Token::FloatLiteral,
                Token::IntegerLiteral,
                Token::IntegerLiteral,
                Token::FloatLiteral,
                Token::Eof
            ]
        );
    }

    #[test]
    fn plain_double_quoted_string_stays_literal() {
        let tokens = Lexer::new(r#""no interpolation \$here""#).tokenize().unwrap();
        assert_eq!(tokens[0].token, Token::StringLiteral);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn gstring_with_block_and_path() {
        let tokens = Lexer::new(r#""Hi ${user.name}, $a.b!""#).tokenize().unwrap();
        let shape: Vec<(Token, &str)> = tokens.iter().map(|t| (t.token, t.lexeme.as_str())).collect();
        assert_eq!(
            shape,
            vec![
                (Token::GStringBegin, "Hi "),
                (Token::LBrace, "{"),
                (Token::Identifier, "user"),
                (Token::Dot, "."),
                (Token::Identifier, "name"),
                (Token::RBrace, "}"),
                (Token::GStringPart, ", "),
                (Token::Identifier, "a"),
                (Token::Dot, "."),
                (Token::Identifier, "b"),
                (Token::GStringEnd, "!"),
                (Token::Eof, ""),
            ]
        );
        assert_eq!(tokens[2].location.column, 7);
    }

    #[test]
    fn gstring_with_nested_string() {
        let tokens = Lexer::new(r#""${m["k"]}""#).tokenize().unwrap();
        assert_eq!(tokens[0].token, Token::GStringBegin);
        assert!(tokens.iter().any(|t| t.token == Token::StringLiteral && t.lexeme == "\"k\""));
        assert_eq!(tokens[tokens.len() - 2].token, Token::GStringEnd);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("#!/usr/bin/env groovy\na // note\n/* one\ntwo */ b /* same line */ c"),
            vec![
                Token::Newline,
                Token::Identifier,
                Token::Newline,
                Token::Identifier,
                Token::Identifier,
                Token::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::new("x = 'open\n'").tokenize().unwrap_err();
        assert!(matches!(err, ParseError::LexicalError { .. }));
    }

    #[test]
    fn slash_after_an_operand_divides() {
        assert_eq!(
            kinds("a / b / c"),
            vec![Token::Identifier, Token::Slash, Token::Identifier, Token::Slash, Token::Identifier, Token::Eof]
        );
        assert_eq!(kinds("f(a\n/ 2 / 3)")[3], Token::Slash);
        assert_eq!(kinds("x /= 2 /3")[1], Token::DivAssign);
    }

    #[test]
    fn slash_where_an_operand_starts_opens_a_slashy_string() {
        let tokens = Lexer::new(r"m = s =~ /a\/b\d+/ && ~/x/").tokenize().unwrap();
        let strings: Vec<&str> = tokens
            .iter()
            .filter(|t| t.token == Token::StringLiteral)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(strings, vec![r"/a\/b\d+/", "/x/"]);
        assert_eq!(kinds("return /=x/\n/y/")[..4], [Token::Return, Token::StringLiteral, Token::Newline, Token::StringLiteral]);
    }

    #[test]
    fn slashy_strings_interpolate() {
        let tokens = Lexer::new(r"/a$b\d/").tokenize().unwrap();
        let shape: Vec<(Token, &str)> = tokens.iter().map(|t| (t.token, t.lexeme.as_str())).collect();
        assert_eq!(
            shape,
            vec![
                (Token::GStringBegin, "a"),
                (Token::Identifier, "b"),
                (Token::GStringEnd, r"\\d"),
                (Token::Eof, ""),
            ]
        );
    }

    #[test]
    fn dollar_slashy_strings() {
        let tokens = Lexer::new("p = $/a/b$$c$/$/$").tokenize().unwrap();
        assert_eq!(tokens[2].token, Token::StringLiteral);
        assert_eq!(tokens[2].lexeme, "$/a/b$$c$/$/$");
        assert_eq!(string_value(&tokens[2].lexeme), "a/b$c/$");

        let tokens = Lexer::new("$/x ${y}/$").tokenize().unwrap();
        assert_eq!(tokens[0].token, Token::GStringBegin);
        assert_eq!(tokens[0].lexeme, "x ");
    }

    #[test]
    fn unterminated_slashy_string_is_an_error() {
        let err = Lexer::new("x = /open").tokenize().unwrap_err();
        assert!(matches!(err, ParseError::LexicalError { ref message, .. } if message.contains("slashy")));
        assert!(Lexer::new("x = $/open").tokenize().is_err());
    }

    #[test]
    fn unicode_identifiers() {
        let tokens = Lexer::new("def café = \"$naïve\"").tokenize().unwrap();
        assert_eq!(tokens[1].token, Token::Identifier);
        assert_eq!(tokens[1].lexeme, "café");
        assert_eq!(tokens[3].token, Token::GStringBegin);
        assert_eq!(tokens[4].lexeme, "naïve");
    }

    #[test]
    fn unescape_sequences() {
        assert_eq!(unescape(r"a\tb\n\$A\q"), "a\tb\n$A\\q");
        assert_eq!(string_value("'''x'y'''"), "x'y");
        assert_eq!(string_value("'it\\'s'"), "it's");
        assert_eq!(string_value(r"/a\/b\d/"), r"a/b\d");
    }
}
