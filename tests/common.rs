// Common test utilities
#![allow(dead_code)]

use gparse::ast::*;

/// Route `log` output through the test harness
pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub fn expr(source: &str) -> Expr {
    init_logger();
    gparse::parse_expression(source).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
}

pub fn stmt(source: &str) -> Stmt {
    init_logger();
    gparse::parse_statement(source).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
}

pub fn unit(source: &str) -> CompilationUnit {
    init_logger();
    gparse::parse_groovy(source).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
}

/// The expression of an expression statement
pub fn stmt_expr(source: &str) -> Expr {
    match stmt(source).value {
        StmtKind::Expression(expr) => expr,
        other => panic!("expected an expression statement for {:?}, got {:?}", source, other),
    }
}

/// The only class-like declaration of a unit
pub fn class(source: &str) -> ClassDecl {
    let unit = unit(source);
    let class = unit.classes().next().cloned();
    class.unwrap_or_else(|| panic!("no class in {:?}", source))
}

fn node(kind: ExprKind) -> Expr {
    Spanned::new(kind, Span::default())
}

pub fn ident(name: &str) -> Expr {
    node(ExprKind::Identifier(name.to_string()))
}

pub fn int(raw: &str) -> Expr {
    node(ExprKind::Literal(Literal { kind: LiteralKind::Integer, raw: raw.to_string() }))
}

pub fn string(raw: &str) -> Expr {
    node(ExprKind::Literal(Literal { kind: LiteralKind::String, raw: raw.to_string() }))
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    node(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) })
}

pub fn call(receiver: Option<Expr>, name: &str, args: Vec<Expr>) -> Expr {
    node(ExprKind::MethodCall {
        receiver: receiver.map(Box::new),
        name: MemberName::Ident(name.to_string()),
        type_args: Vec::new(),
        args,
        safe: false,
        spread: false,
    })
}

pub fn property(receiver: Expr, name: &str) -> Expr {
    node(ExprKind::PropertyAccess {
        receiver: Box::new(receiver),
        name: MemberName::Ident(name.to_string()),
        safe: false,
        spread: false,
        attribute: false,
    })
}

pub fn named_type(name: &str) -> TypeRef {
    Spanned::new(TypeKind::named(name), Span::default())
}

/// Print `unit` and parse the output again
pub fn reparse(unit: &CompilationUnit) -> CompilationUnit {
    let printed = AstPrinter::new().print(unit);
    gparse::parse_groovy(&printed).unwrap_or_else(|e| panic!("printed source does not parse: {}\n{}", e, printed))
}
