mod common;

use common::*;
use gparse::ast::*;

fn if_parts(stmt: Stmt) -> (Stmt, Option<Stmt>) {
    match stmt.value {
        StmtKind::If { then_branch, else_branch, .. } => (*then_branch, else_branch.map(|b| *b)),
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn if_else_tolerates_line_breaks_and_semicolons() {
    let sources = [
        "if (ready) {\n    go()\n} else {\n    wait()\n}",
        "if (ready) {\n    go()\n}\nelse {\n    wait()\n}",
        "if (ready)\n    go()\nelse\n    wait()",
        "if (ready) go(); else wait()",
    ];
    for source in sources {
        let (then_branch, else_branch) = if_parts(stmt(source));
        assert!(
            matches!(then_branch.value, StmtKind::Block(_) | StmtKind::Expression(_)),
            "then branch of {:?}",
            source
        );
        assert!(else_branch.is_some(), "else branch of {:?}", source);
    }
}

#[test]
fn else_if_chains_nest() {
    let (_, else_branch) = if_parts(stmt("if (a) x()\nelse if (b) y()\nelse z()"));
    let (_, last) = if_parts(else_branch.expect("else if"));
    assert!(last.is_some());
}

#[test]
fn a_statement_after_if_is_not_an_else() {
    let unit = unit("if (a) x()\ny()");
    assert_eq!(unit.statements().count(), 2);
}

#[test]
fn local_variable_declarations() {
    let StmtKind::LocalVarDecl(decl) = stmt("int a = 1, b, c = 3").value else {
        panic!("expected declaration");
    };
    assert_eq!(decl.var_type.map(|t| t.value), Some(TypeKind::Primitive(PrimitiveType::Int)));
    let names: Vec<&str> = decl.declarators.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert!(decl.declarators[1].initializer.is_none());

    let StmtKind::LocalVarDecl(decl) = stmt("final String s = 'a'").value else {
        panic!("expected declaration");
    };
    assert_eq!(decl.modifiers, vec![Modifier::Final]);
    assert_eq!(decl.var_type, Some(named_type("String")));

    let StmtKind::LocalVarDecl(decl) = stmt("def x = 1").value else {
        panic!("expected declaration");
    };
    assert_eq!(decl.modifiers, vec![Modifier::Def]);
    assert!(decl.var_type.is_none());

    let StmtKind::LocalVarDecl(decl) = stmt("var count = 0").value else {
        panic!("expected declaration");
    };
    assert_eq!(decl.modifiers, vec![Modifier::Var]);
}

#[test]
fn generic_declaration_is_not_a_comparison() {
    let StmtKind::LocalVarDecl(decl) = stmt("List<List<String>> rows = []").value else {
        panic!("expected declaration");
    };
    let Some(TypeKind::Named { name, type_args }) = decl.var_type.map(|t| t.value) else {
        panic!("expected named type");
    };
    assert_eq!(name, "List");
    assert_eq!(type_args.len(), 1);

    assert!(matches!(stmt_expr("a < b").value, ExprKind::Binary { op: BinaryOp::Lt, .. }));
}

#[test]
fn annotated_local_variable() {
    let StmtKind::LocalVarDecl(decl) = stmt("@Field int limit = 10").value else {
        panic!("expected declaration");
    };
    assert!(matches!(decl.modifiers[0], Modifier::Annotation(ref a) if a.name == "Field"));
}

#[test]
fn destructuring_declaration() {
    let StmtKind::Destructuring(tuple) = stmt("def (String name, int age) = person").value else {
        panic!("expected destructuring");
    };
    assert_eq!(tuple.targets.len(), 2);
    assert_eq!(tuple.targets[0].name, "name");
    assert_eq!(tuple.targets[1].var_type.as_ref().map(|t| &t.value), Some(&TypeKind::Primitive(PrimitiveType::Int)));
    assert_eq!(tuple.initializer, ident("person"));

    let StmtKind::Destructuring(tuple) = stmt("def (a, b) = [1, 2]").value else {
        panic!("expected destructuring");
    };
    assert!(tuple.targets.iter().all(|t| t.var_type.is_none()));
}

#[test]
fn labeled_loop_with_break_and_continue() {
    let StmtKind::Labeled { label, body } = stmt("outer:\nwhile (true) {\n    continue outer\n    break\n}").value else {
        panic!("expected labeled statement");
    };
    assert_eq!(label, "outer");
    let StmtKind::While { body, .. } = body.value else {
        panic!("expected while");
    };
    let StmtKind::Block(block) = body.value else {
        panic!("expected block");
    };
    assert_eq!(block.statements[0].value, StmtKind::Continue(Some("outer".to_string())));
    assert_eq!(block.statements[1].value, StmtKind::Break(None));
}

#[test]
fn do_while_on_separate_lines() {
    let StmtKind::DoWhile { body, condition } = stmt("do {\n    i++\n}\nwhile (i < 3)").value else {
        panic!("expected do-while");
    };
    assert!(matches!(body.value, StmtKind::Block(_)));
    assert_eq!(condition, binary(BinaryOp::Lt, ident("i"), int("3")));
}

#[test]
fn for_loops() {
    let StmtKind::For { control, .. } = stmt("for (i = 0, j = 10; i < j; i++, j--) {}").value else {
        panic!("expected for");
    };
    let ForControl::Classic { init, update, .. } = control else {
        panic!("expected classic for");
    };
    assert!(matches!(init, Some(ForInit::Expressions(ref exprs)) if exprs.len() == 2));
    assert_eq!(update.len(), 2);

    let StmtKind::For { control, .. } = stmt("for (;;) break").value else {
        panic!("expected for");
    };
    assert_eq!(control, ForControl::Classic { init: None, condition: None, update: Vec::new() });

    let StmtKind::For { control, .. } = stmt("for (final String s in names) println(s)").value else {
        panic!("expected for");
    };
    let ForControl::Enhanced { modifiers, var_type, name, iterable } = control else {
        panic!("expected enhanced for");
    };
    assert_eq!(modifiers, vec![Modifier::Final]);
    assert_eq!(var_type, Some(named_type("String")));
    assert_eq!(name, "s");
    assert_eq!(iterable, ident("names"));
}

#[test]
fn return_with_and_without_value() {
    assert_eq!(stmt("return").value, StmtKind::Return(None));
    assert_eq!(stmt("return x").value, StmtKind::Return(Some(ident("x"))));

    let StmtKind::Block(block) = stmt("{\n    return\n    x\n}").value else {
        panic!("expected block");
    };
    assert_eq!(block.statements.len(), 2);
    assert_eq!(block.statements[0].value, StmtKind::Return(None));
}

#[test]
fn throw_and_assert() {
    assert!(matches!(stmt("throw new IllegalStateException('bad')").value, StmtKind::Throw(_)));

    let StmtKind::Assert { condition, message } = stmt("assert x > 0 : 'positive'").value else {
        panic!("expected assert");
    };
    assert_eq!(condition, binary(BinaryOp::Gt, ident("x"), int("0")));
    assert_eq!(message, Some(string("'positive'")));

    let StmtKind::Assert { message, .. } = stmt("assert ok, 'message'").value else {
        panic!("expected assert");
    };
    assert!(message.is_some());
    assert!(matches!(stmt("assert ok").value, StmtKind::Assert { message: None, .. }));
}

#[test]
fn synchronized_block() {
    let StmtKind::Synchronized { lock, body } = stmt("synchronized (this) {\n    count++\n}").value else {
        panic!("expected synchronized");
    };
    assert_eq!(lock.value, ExprKind::This);
    assert_eq!(body.statements.len(), 1);
}

#[test]
fn try_catch_forms() {
    let StmtKind::Try { catches, finally_block, .. } = stmt("try {\n    risky()\n}\ncatch (e) {\n}\nfinally {\n    done()\n}").value else {
        panic!("expected try");
    };
    assert_eq!(catches.len(), 1);
    assert!(catches[0].types.is_empty());
    assert_eq!(catches[0].name, "e");
    assert!(finally_block.is_some());

    let StmtKind::Try { resources, .. } = stmt("try (Reader r = open(); def w = writer()) {\n}").value else {
        panic!("expected try");
    };
    assert_eq!(resources.len(), 2);
    assert!(matches!(resources[0], Resource::Declaration { ref var_type, .. } if var_type.is_some()));
    assert!(matches!(resources[1], Resource::Declaration { ref var_type, .. } if var_type.is_none()));

    assert!(matches!(stmt("try {\n}").value, StmtKind::Try { ref catches, .. } if catches.is_empty()));
}

#[test]
fn local_class_declaration() {
    let StmtKind::ClassDecl(class) = stmt("class Local {\n    int x\n}").value else {
        panic!("expected class declaration");
    };
    assert_eq!(class.name, "Local");
    assert_eq!(class.fields().count(), 1);
}

#[test]
fn statements_need_separators() {
    assert!(gparse::parse_groovy("a = 1 b = 2").is_err());
    assert_eq!(unit("a = 1; b = 2\n\nc = 3").statements().count(), 3);
    assert_eq!(unit(";;\n;a = 1;;\n").statements().count(), 1);
}
