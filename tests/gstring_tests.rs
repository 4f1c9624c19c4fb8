mod common;

use common::*;
use gparse::ast::*;

fn parts(source: &str) -> Vec<StringPart> {
    match expr(source).value {
        ExprKind::InterpolatedString(parts) => parts,
        other => panic!("expected interpolated string for {:?}, got {:?}", source, other),
    }
}

fn text(value: &str) -> StringPart {
    StringPart::Text(value.to_string())
}

#[test]
fn block_interpolation_between_text() {
    assert_eq!(
        parts(r#""Hello ${name}!""#),
        vec![text("Hello "), StringPart::Expr(ident("name")), text("!")]
    );
}

#[test]
fn dotted_path_and_expression() {
    assert_eq!(
        parts(r#""$a.b and ${x + 1}""#),
        vec![
            StringPart::Expr(property(ident("a"), "b")),
            text(" and "),
            StringPart::Expr(binary(BinaryOp::Add, ident("x"), int("1"))),
        ]
    );
}

#[test]
fn empty_interpolation_is_null() {
    let parts = parts(r#""${}""#);
    assert_eq!(parts.len(), 1);
    assert!(matches!(
        parts[0],
        StringPart::Expr(ref e) if matches!(e.value, ExprKind::Literal(ref l) if l.kind == LiteralKind::Null)
    ));
}

#[test]
fn closure_interpolation() {
    let parts = parts(r#""${ -> 1 }""#);
    let StringPart::Expr(ref value) = parts[0] else {
        panic!("expected expression part");
    };
    let ExprKind::Closure(closure) = &value.value else {
        panic!("expected closure");
    };
    assert_eq!(closure.params, Some(Vec::new()));
}

#[test]
fn command_inside_interpolation() {
    assert_eq!(
        parts(r#""${foo 1}""#),
        vec![StringPart::Expr(call(None, "foo", vec![int("1")]))]
    );
}

#[test]
fn dynamic_member_name() {
    let ExprKind::PropertyAccess { receiver, name, .. } = expr(r#"obj."$name""#).value else {
        panic!("expected property access");
    };
    assert_eq!(*receiver, ident("obj"));
    let MemberName::Dynamic(name) = name else {
        panic!("expected dynamic member name");
    };
    assert!(matches!(name.value, ExprKind::InterpolatedString(_)));
}

#[test]
fn strings_without_interpolation_stay_literals() {
    assert_eq!(expr("'no $interp'"), string("'no $interp'"));
    assert!(matches!(expr(r#""plain""#).value, ExprKind::Literal(ref l) if l.kind == LiteralKind::String));
}

#[test]
fn interpolation_in_a_command_argument() {
    let ExprKind::MethodCall { args, .. } = stmt_expr(r#"println "total: ${a + b}""#).value else {
        panic!("expected method call");
    };
    assert!(matches!(args[0].value, ExprKind::InterpolatedString(ref p) if p.len() == 2));
}

fn declared_value(source: &str) -> Expr {
    match stmt(source).value {
        StmtKind::LocalVarDecl(decl) => decl.declarators[0].initializer.clone().expect("initializer"),
        other => panic!("expected a declaration for {:?}, got {:?}", source, other),
    }
}

#[test]
fn slashy_string_as_a_regex_operand() {
    assert_eq!(
        declared_value("def m = 'abc' =~ /b/"),
        binary(BinaryOp::RegexFind, string("'abc'"), string("/b/"))
    );
    let ExprKind::Assignment { value, .. } = stmt_expr(r"x = ~/a\/b/").value else {
        panic!("expected assignment");
    };
    let ExprKind::Unary { op: UnaryOp::BitNot, operand, .. } = value.value else {
        panic!("expected '~' pattern");
    };
    assert_eq!(*operand, string(r"/a\/b/"));
}

#[test]
fn slashy_literal_value() {
    let ExprKind::Literal(literal) = expr(r"/a\/b\d+/").value else {
        panic!("expected literal");
    };
    assert_eq!(literal.string_value().as_deref(), Some(r"a/b\d+"));
}

#[test]
fn dollar_slashy_string() {
    assert_eq!(declared_value("def p = $/x/$"), string("$/x/$"));
    assert_eq!(
        parts("$/$dir-$$1/$"),
        vec![StringPart::Expr(ident("dir")), text("-$1")]
    );
}

#[test]
fn slashy_string_interpolation_keeps_backslashes() {
    assert_eq!(
        parts(r"/a$b\d/"),
        vec![text("a"), StringPart::Expr(ident("b")), text(r"\d")]
    );
}

#[test]
fn unicode_names_in_paths() {
    assert_eq!(parts(r#""$café!""#), vec![StringPart::Expr(ident("café")), text("!")]);
}
