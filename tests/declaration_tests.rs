mod common;

use common::*;
use gparse::ast::*;

fn method<'a>(class: &'a ClassDecl, name: &str) -> &'a MethodDecl {
    class
        .methods()
        .find(|m| m.name == name)
        .unwrap_or_else(|| panic!("no method {} in {}", name, class.name))
}

#[test]
fn class_with_method_returning_a_sum() {
    let class = class("class Foo { int bar(int x) { return x + 1 } }");
    assert_eq!(class.kind, DeclKind::Class);
    assert_eq!(class.name, "Foo");
    assert_eq!(class.members.len(), 1);

    let bar = method(&class, "bar");
    assert_eq!(bar.return_type.as_ref().map(|t| &t.value), Some(&TypeKind::Primitive(PrimitiveType::Int)));
    assert_eq!(bar.params.len(), 1);
    assert_eq!(bar.params[0].name, "x");
    assert!(!bar.is_constructor);

    let body = bar.body.as_ref().expect("method body");
    assert_eq!(
        body.statements[0].value,
        StmtKind::Return(Some(binary(BinaryOp::Add, ident("x"), int("1"))))
    );
}

#[test]
fn class_header_with_generics_and_supertypes() {
    let class = class("public abstract class Repo<T extends Entity> extends Base<T> implements Closeable, Serializable {}");
    assert_eq!(class.modifiers, vec![Modifier::Public, Modifier::Abstract]);
    assert_eq!(class.type_params.len(), 1);
    assert_eq!(class.type_params[0].bounds, vec![named_type("Entity")]);
    assert!(matches!(
        class.superclass.as_ref().map(|t| &t.value),
        Some(TypeKind::Named { name, type_args }) if name == "Base" && type_args.len() == 1
    ));
    assert_eq!(class.interfaces, vec![named_type("Closeable"), named_type("Serializable")]);
}

#[test]
fn fields_constructors_and_initializers() {
    let class = class(
        r#"
@CompileStatic
class Point {
    private final int x, y
    static int count

    static {
        count = 0
    }

    {
        count++
    }

    Point(int x, int y) {
        this.x = x
        this.y = y
    }
}
"#,
    );
    assert!(matches!(class.modifiers[0], Modifier::Annotation(ref a) if a.name == "CompileStatic"));

    let fields: Vec<&VariableDecl> = class.fields().collect();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].modifiers, vec![Modifier::Private, Modifier::Final]);
    assert_eq!(fields[0].declarators.len(), 2);

    let initializers: Vec<bool> = class
        .members
        .iter()
        .filter_map(|m| match &m.value {
            DeclarationKind::Initializer { is_static, .. } => Some(*is_static),
            _ => None,
        })
        .collect();
    assert_eq!(initializers, vec![true, false]);

    let constructor = method(&class, "Point");
    assert!(constructor.is_constructor);
    assert!(constructor.return_type.is_none());
    assert_eq!(constructor.params.len(), 2);
}

#[test]
fn def_methods_and_untyped_fields() {
    let class = class("class Greeter {\n    def name\n    def greet(who = 'world') {\n        \"Hello $who\"\n    }\n}");
    let field = class.fields().next().expect("field");
    assert_eq!(field.modifiers, vec![Modifier::Def]);
    assert!(field.var_type.is_none());

    let greet = method(&class, "greet");
    assert!(greet.return_type.is_none());
    assert_eq!(greet.modifiers, vec![Modifier::Def]);
    assert!(greet.params[0].param_type.is_none());
    assert_eq!(greet.params[0].default_value, Some(string("'world'")));
}

#[test]
fn method_headers() {
    let class = class(
        r#"
class Util {
    static <T> List<T> listOf(T... items) { items as List }

    void write(String path)
        throws IOException, InterruptedException
    {
        save(path)
    }
}
"#,
    );
    let list_of = method(&class, "listOf");
    assert_eq!(list_of.type_params.len(), 1);
    assert!(list_of.params[0].varargs);
    assert_eq!(list_of.modifiers, vec![Modifier::Static]);

    let write = method(&class, "write");
    assert_eq!(write.return_type.as_ref().map(|t| &t.value), Some(&TypeKind::Void));
    assert_eq!(write.throws, vec![named_type("IOException"), named_type("InterruptedException")]);
    assert!(write.body.is_some());
}

#[test]
fn enum_with_constants_and_members() {
    let class = class(
        r#"
enum Planet {
    MERCURY(3.303, 2.4397),
    EARTH(5.976, 6.37814)

    final double mass
    final double radius

    Planet(double mass, double radius) {
        this.mass = mass
        this.radius = radius
    }
}
"#,
    );
    assert_eq!(class.kind, DeclKind::Enum);
    let names: Vec<&str> = class.enum_constants.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["MERCURY", "EARTH"]);
    assert_eq!(class.enum_constants[0].args.len(), 2);
    assert_eq!(class.fields().count(), 2);
    assert!(method(&class, "Planet").is_constructor);
}

#[test]
fn enum_constant_bodies() {
    let class = class("enum Op {\n    PLUS { int apply(int a, int b) { a + b } },\n    MINUS;\n    abstract int apply(int a, int b)\n}");
    assert_eq!(class.enum_constants.len(), 2);
    assert_eq!(class.enum_constants[0].body.as_ref().map(Vec::len), Some(1));
    assert!(class.enum_constants[1].body.is_none());
    assert!(method(&class, "apply").body.is_none());
}

#[test]
fn interface_extends_several_types() {
    let class = class("interface Shape extends Comparable<Shape>, Cloneable {\n    double area()\n    default String label() { 'shape' }\n}");
    assert_eq!(class.kind, DeclKind::Interface);
    assert!(class.superclass.is_none());
    assert_eq!(class.interfaces.len(), 2);
    assert!(method(&class, "area").body.is_none());
    assert_eq!(method(&class, "label").modifiers, vec![Modifier::Default]);
}

#[test]
fn annotation_type_with_defaults() {
    let class = class("@interface Retry {\n    int times() default 3\n    String[] on() default []\n}");
    assert_eq!(class.kind, DeclKind::Annotation);
    let times = method(&class, "times");
    assert!(matches!(times.default_value, Some(ElementValue::Expr(ref e)) if *e == int("3")));
    assert!(times.body.is_none());
    assert_eq!(method(&class, "on").return_type.as_ref().map(|t| t.value.array_dims()), Some(1));
}

#[test]
fn annotations_with_arguments() {
    let class = class("@Table(name = 'users', indexes = ['email', 'name'])\n@Deprecated\nclass User {}");
    let Modifier::Annotation(table) = &class.modifiers[0] else {
        panic!("expected annotation");
    };
    assert_eq!(table.name, "Table");
    assert!(matches!(table.args[0], AnnotationArg::Named(ref name, _) if name == "name"));
    assert!(matches!(class.modifiers[1], Modifier::Annotation(ref a) if a.name == "Deprecated" && a.args.is_empty()));
}

#[test]
fn traits() {
    let class = class("trait Flying implements Moving {\n    String fly() { 'flying' }\n}");
    assert_eq!(class.kind, DeclKind::Trait);
    assert_eq!(class.interfaces, vec![named_type("Moving")]);
    assert!(method(&class, "fly").body.is_some());
}

#[test]
fn nested_classes() {
    let outer = class("class Outer {\n    static class Inner {\n        enum Mode { ON, OFF }\n    }\n}");
    let DeclarationKind::ClassLike(inner) = &outer.members[0].value else {
        panic!("expected nested class");
    };
    assert_eq!(inner.modifiers, vec![Modifier::Static]);
    assert!(matches!(inner.members[0].value, DeclarationKind::ClassLike(ref e) if e.kind == DeclKind::Enum));
}

#[test]
fn script_methods_and_statements_mix() {
    let unit = unit(
        r#"#!/usr/bin/env groovy
def twice(x) { x * 2 }

int square(int n) {
    n * n
}

def "does it work"() { true }

println twice(square(3))
"#,
    );
    let methods: Vec<&str> = unit
        .items
        .iter()
        .filter_map(|item| match item {
            TopLevelItem::Declaration(decl) => match &decl.value {
                DeclarationKind::Method(m) => Some(m.name.as_str()),
                _ => None,
            },
            TopLevelItem::Statement(_) => None,
        })
        .collect();
    assert_eq!(methods, vec!["twice", "square", "does it work"]);
    assert_eq!(unit.statements().count(), 1);
}

#[test]
fn call_followed_by_block_is_not_a_method() {
    let unit = unit("foo()\n{\n    bar()\n}");
    let statements: Vec<&Stmt> = unit.statements().collect();
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[1].value, StmtKind::Block(_)));
}

#[test]
fn receiver_parameter_and_final_parameters() {
    let class = class("class Outer {\n    class Inner {\n        Inner(Outer this, final int n) {}\n    }\n}");
    let DeclarationKind::ClassLike(inner) = &class.members[0].value else {
        panic!("expected nested class");
    };
    let constructor = method(inner, "Inner");
    assert!(constructor.params[0].is_receiver);
    assert_eq!(constructor.params[1].modifiers, vec![Modifier::Final]);
    assert_eq!(constructor.params[1].name, "n");
}

#[test]
fn package_and_imports() {
    let unit = unit("@Grab('x')\npackage com.example.app\n\nimport java.util.*\nimport static java.lang.Math.PI\nimport java.util.concurrent.TimeUnit as Unit\n");
    let package = unit.package_decl.expect("package");
    assert_eq!(package.name, "com.example.app");
    assert_eq!(package.annotations.len(), 1);
    assert_eq!(unit.imports.len(), 3);
    assert!(unit.imports[0].is_wildcard);
    assert!(unit.imports[1].is_static);
    assert_eq!(unit.imports[1].name, "java.lang.Math.PI");
    assert_eq!(unit.imports[2].alias.as_deref(), Some("Unit"));
}

#[test]
fn generic_method_after_a_field_initializer() {
    let class = class("class A {\n    int x = 1\n    <T> T foo() { null }\n}");
    let field = class.fields().next().expect("field");
    assert_eq!(field.declarators[0].initializer, Some(int("1")));
    let foo = method(&class, "foo");
    assert_eq!(foo.type_params.len(), 1);
    assert_eq!(foo.return_type, Some(named_type("T")));
}

#[test]
fn generic_script_method_after_a_statement() {
    let unit = unit("def x = 1\n<T> T foo() { null }\n");
    assert_eq!(unit.statements().count(), 1);
    assert!(matches!(
        &unit.items[1],
        TopLevelItem::Declaration(decl) if matches!(&decl.value, DeclarationKind::Method(m) if m.name == "foo")
    ));
}

#[test]
fn comparison_may_continue_on_the_next_line() {
    let unit = unit("def b = a\n< limit\n");
    assert_eq!(unit.statements().count(), 1);
}
