use super::nodes::*;
use crate::parser::lexer::{Lexer, Token};

/// Renders a tree back to source.
///
/// The output is canonical rather than faithful: every call keeps its
/// parentheses, compound operands are parenthesised and named arguments
/// appear as a leading map literal. Parsing the output yields a tree equal
/// to the one printed.
pub struct AstPrinter {
    indent_level: usize,
    output: String,
}

impl Default for AstPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl AstPrinter {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            output: String::new(),
        }
    }

    pub fn print(&mut self, unit: &CompilationUnit) -> String {
        self.output.clear();
        self.indent_level = 0;
        self.write_unit(unit);
        std::mem::take(&mut self.output)
    }

    pub fn print_expr(expr: &Expr) -> String {
        AstPrinter::new().expr(expr)
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        let mut printer = AstPrinter::new();
        printer.write_stmt(stmt);
        printer.output
    }

    pub fn print_type(type_ref: &TypeRef) -> String {
        AstPrinter::new().type_ref(type_ref)
    }

    fn nested(&self) -> AstPrinter {
        AstPrinter {
            indent_level: self.indent_level,
            output: String::new(),
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str("    ");
        }
    }

    fn push(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn end_line(&mut self) {
        self.output.push('\n');
    }

    fn writeln(&mut self, s: &str) {
        self.write_indent();
        self.output.push_str(s);
        self.output.push('\n');
    }

    // -- compilation unit ---------------------------------------------------

    fn write_unit(&mut self, unit: &CompilationUnit) {
        if let Some(package) = &unit.package_decl {
            let annotations = self.annotations_prefix(&package.annotations);
            self.writeln(&format!("{}package {}", annotations, package.name));
            self.end_line();
        }
        for import in &unit.imports {
            let mut line = String::from("import ");
            if import.is_static {
                line.push_str("static ");
            }
            line.push_str(&import.name);
            if import.is_wildcard {
                line.push_str(".*");
            }
            if let Some(alias) = &import.alias {
                line.push_str(" as ");
                line.push_str(alias);
            }
            self.writeln(&line);
        }
        if !unit.imports.is_empty() {
            self.end_line();
        }
        for item in &unit.items {
            match item {
                TopLevelItem::Declaration(decl) => self.write_declaration(decl, None),
                TopLevelItem::Statement(stmt) => self.write_stmt(stmt),
            }
        }
    }

    // -- declarations -------------------------------------------------------

    fn write_declaration(&mut self, decl: &Declaration, enclosing: Option<&str>) {
        match &decl.value {
            DeclarationKind::ClassLike(class) => self.write_class(class),
            DeclarationKind::Method(method) => self.write_method(method, enclosing),
            DeclarationKind::Field(field) => {
                self.write_indent();
                let text = self.variable_decl(field);
                self.push(&text);
                self.end_line();
            }
            DeclarationKind::Initializer { is_static, body } => {
                self.write_indent();
                if *is_static {
                    self.push("static ");
                }
                self.write_block(body);
                self.end_line();
            }
        }
    }

    fn write_class(&mut self, class: &ClassDecl) {
        self.write_indent();
        let mut header = self.modifiers(&class.modifiers);
        header.push_str(class.kind.keyword());
        header.push(' ');
        header.push_str(&class.name);
        header.push_str(&self.type_params(&class.type_params));
        if let Some(superclass) = &class.superclass {
            header.push_str(" extends ");
            header.push_str(&self.type_ref(superclass));
        }
        if !class.interfaces.is_empty() {
            let keyword = if class.kind == DeclKind::Interface { " extends " } else { " implements " };
            header.push_str(keyword);
            header.push_str(&self.type_list(&class.interfaces));
        }
        header.push_str(" {");
        self.push(&header);
        self.end_line();
        self.indent();
        self.write_class_body(&class.enum_constants, &class.members, Some(class.name.as_str()));
        self.dedent();
        self.writeln("}");
    }

    fn write_class_body(&mut self, constants: &[EnumConstant], members: &[Declaration], enclosing: Option<&str>) {
        for (index, constant) in constants.iter().enumerate() {
            self.write_indent();
            let annotations = self.annotations_prefix(&constant.annotations);
            self.push(&annotations);
            self.push(&constant.name);
            if !constant.args.is_empty() {
                let args = self.args(&constant.args);
                self.push(&format!("({})", args));
            }
            if let Some(body) = &constant.body {
                self.push(" {");
                self.end_line();
                self.indent();
                self.write_class_body(&[], body, None);
                self.dedent();
                self.write_indent();
                self.push("}");
            }
            if index + 1 < constants.len() {
                self.push(",");
            }
            self.end_line();
        }
        for member in members {
            self.write_declaration(member, enclosing);
        }
    }

    fn write_method(&mut self, method: &MethodDecl, enclosing: Option<&str>) {
        self.write_indent();
        let mut header = self.modifiers(&method.modifiers);
        if !method.type_params.is_empty() {
            header.push_str(&self.type_params(&method.type_params));
            header.push(' ');
        }
        if let Some(return_type) = &method.return_type {
            header.push_str(&self.type_ref(return_type));
            header.push(' ');
        }
        let name = if method.is_constructor {
            enclosing.unwrap_or(&method.name).to_string()
        } else {
            declared_name(&method.name)
        };
        header.push_str(&name);
        header.push('(');
        header.push_str(&self.params(&method.params));
        header.push(')');
        if !method.throws.is_empty() {
            header.push_str(" throws ");
            header.push_str(&self.type_list(&method.throws));
        }
        if let Some(default) = &method.default_value {
            header.push_str(" default ");
            header.push_str(&self.element_value(default));
        }
        self.push(&header);
        if let Some(body) = &method.body {
            self.push(" ");
            self.write_block(body);
        }
        self.end_line();
    }

    fn variable_decl(&self, decl: &VariableDecl) -> String {
        let mut text = self.modifiers(&decl.modifiers);
        if let Some(var_type) = &decl.var_type {
            text.push_str(&self.type_ref(var_type));
            text.push(' ');
        }
        let declarators: Vec<String> = decl
            .declarators
            .iter()
            .map(|d| match &d.initializer {
                Some(init) => format!("{} = {}", d.name, self.expr(init)),
                None => d.name.clone(),
            })
            .collect();
        text.push_str(&declarators.join(", "));
        text
    }

    fn modifiers(&self, modifiers: &[Modifier]) -> String {
        let mut text = String::new();
        for modifier in modifiers {
            match modifier {
                Modifier::Annotation(annotation) => text.push_str(&self.annotation(annotation)),
                other => text.push_str(other.keyword().unwrap_or_default()),
            }
            text.push(' ');
        }
        text
    }

    fn annotations_prefix(&self, annotations: &[Annotation]) -> String {
        annotations
            .iter()
            .map(|a| format!("{} ", self.annotation(a)))
            .collect()
    }

    fn annotation(&self, annotation: &Annotation) -> String {
        if annotation.args.is_empty() {
            return format!("@{}", annotation.name);
        }
        let args: Vec<String> = annotation
            .args
            .iter()
            .map(|arg| match arg {
                AnnotationArg::Value(value) => self.element_value(value),
                AnnotationArg::Named(name, value) => format!("{} = {}", name, self.element_value(value)),
            })
            .collect();
        format!("@{}({})", annotation.name, args.join(", "))
    }

    fn element_value(&self, value: &ElementValue) -> String {
        match value {
            ElementValue::Expr(expr) => self.expr(expr),
            ElementValue::Annotation(annotation) => self.annotation(annotation),
        }
    }

    fn type_params(&self, params: &[TypeParam]) -> String {
        if params.is_empty() {
            return String::new();
        }
        let rendered: Vec<String> = params
            .iter()
            .map(|p| {
                let mut text = self.annotations_prefix(&p.annotations);
                text.push_str(&p.name);
                if !p.bounds.is_empty() {
                    let bounds: Vec<String> = p.bounds.iter().map(|b| self.type_ref(b)).collect();
                    text.push_str(" extends ");
                    text.push_str(&bounds.join(" & "));
                }
                text
            })
            .collect();
        format!("<{}>", rendered.join(", "))
    }

    fn params(&self, params: &[Parameter]) -> String {
        let rendered: Vec<String> = params.iter().map(|p| self.param(p)).collect();
        rendered.join(", ")
    }

    fn param(&self, param: &Parameter) -> String {
        let mut text = self.modifiers(&param.modifiers);
        if let Some(param_type) = &param.param_type {
            text.push_str(&self.type_ref(param_type));
            if param.varargs {
                text.push_str("...");
            }
            text.push(' ');
        }
        text.push_str(&param.name);
        if let Some(default) = &param.default_value {
            text.push_str(" = ");
            text.push_str(&self.expr(default));
        }
        text
    }

    // -- types --------------------------------------------------------------

    fn type_list(&self, types: &[TypeRef]) -> String {
        let rendered: Vec<String> = types.iter().map(|t| self.type_ref(t)).collect();
        rendered.join(", ")
    }

    fn type_ref(&self, type_ref: &TypeRef) -> String {
        match &type_ref.value {
            TypeKind::Primitive(primitive) => primitive.name().to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::Named { name, type_args } => {
                if type_args.is_empty() {
                    name.clone()
                } else {
                    format!("{}<{}>", name, self.type_list(type_args))
                }
            }
            TypeKind::Array { element, dims } => {
                let mut text = self.type_ref(element);
                for dim in dims {
                    if !dim.annotations.is_empty() {
                        text.push(' ');
                        let annotations: Vec<String> = dim.annotations.iter().map(|a| self.annotation(a)).collect();
                        text.push_str(&annotations.join(" "));
                        text.push(' ');
                    }
                    text.push_str("[]");
                }
                text
            }
            TypeKind::Wildcard { bound } => match bound {
                None => "?".to_string(),
                Some((BoundKind::Extends, bound)) => format!("? extends {}", self.type_ref(bound)),
                Some((BoundKind::Super, bound)) => format!("? super {}", self.type_ref(bound)),
            },
            TypeKind::Annotated { annotations, inner } => {
                format!("{}{}", self.annotations_prefix(annotations), self.type_ref(inner))
            }
        }
    }

    // -- statements ---------------------------------------------------------

    fn write_block(&mut self, block: &Block) {
        if block.statements.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{");
        self.end_line();
        self.indent();
        for stmt in &block.statements {
            self.write_stmt(stmt);
        }
        self.dedent();
        self.write_indent();
        self.push("}");
    }

    fn write_stmt(&mut self, stmt: &Stmt) {
        self.write_indent();
        self.write_stmt_inline(stmt);
        self.end_line();
    }

    /// A branch of `if`/`for`/`while`: blocks stay on the header line,
    /// other statements go on their own indented line
    fn write_branch(&mut self, stmt: &Stmt) {
        match &stmt.value {
            StmtKind::Block(block) => {
                self.push(" ");
                self.write_block(block);
            }
            _ => {
                self.end_line();
                self.indent();
                self.write_indent();
                self.write_stmt_inline(stmt);
                self.dedent();
            }
        }
    }

    fn write_stmt_inline(&mut self, stmt: &Stmt) {
        match &stmt.value {
            StmtKind::Block(block) => self.write_block(block),
            StmtKind::If { condition, then_branch, else_branch } => {
                let header = format!("if ({})", self.expr(condition));
                self.push(&header);
                self.write_branch(then_branch);
                if let Some(else_branch) = else_branch {
                    if matches!(then_branch.value, StmtKind::Block(_)) {
                        self.push(" else");
                    } else {
                        self.end_line();
                        self.write_indent();
                        self.push("else");
                    }
                    if matches!(else_branch.value, StmtKind::If { .. }) {
                        self.push(" ");
                        self.write_stmt_inline(else_branch);
                    } else {
                        self.write_branch(else_branch);
                    }
                }
            }
            StmtKind::Switch { subject, groups } => {
                let header = format!("switch ({}) {{", self.expr(subject));
                self.push(&header);
                self.end_line();
                self.indent();
                for group in groups {
                    for label in &group.labels {
                        let text = match label {
                            CaseLabel::Case(value) => format!("case {}:", self.expr(value)),
                            CaseLabel::Default => "default:".to_string(),
                        };
                        self.writeln(&text);
                    }
                    self.indent();
                    for stmt in &group.statements {
                        self.write_stmt(stmt);
                    }
                    self.dedent();
                }
                self.dedent();
                self.write_indent();
                self.push("}");
            }
            StmtKind::For { control, body } => {
                let header = match control {
                    ForControl::Classic { init, condition, update } => {
                        let init = match init {
                            Some(ForInit::Declaration(decl)) => self.variable_decl(decl),
                            Some(ForInit::Expressions(exprs)) => self.args(exprs),
                            None => String::new(),
                        };
                        let condition = condition.as_ref().map(|c| self.expr(c)).unwrap_or_default();
                        format!("for ({}; {}; {})", init, condition, self.args(update))
                    }
                    ForControl::Enhanced { modifiers, var_type, name, iterable } => {
                        let mut variable = self.modifiers(modifiers);
                        if let Some(var_type) = var_type {
                            variable.push_str(&self.type_ref(var_type));
                            variable.push(' ');
                        }
                        variable.push_str(name);
                        format!("for ({} in {})", variable, self.expr(iterable))
                    }
                };
                self.push(&header);
                self.write_branch(body);
            }
            StmtKind::While { condition, body } => {
                let header = format!("while ({})", self.expr(condition));
                self.push(&header);
                self.write_branch(body);
            }
            StmtKind::DoWhile { body, condition } => {
                self.push("do");
                self.write_branch(body);
                if !matches!(body.value, StmtKind::Block(_)) {
                    self.end_line();
                    self.write_indent();
                } else {
                    self.push(" ");
                }
                let tail = format!("while ({})", self.expr(condition));
                self.push(&tail);
            }
            StmtKind::Try { resources, body, catches, finally_block } => {
                self.push("try ");
                if !resources.is_empty() {
                    let rendered: Vec<String> = resources
                        .iter()
                        .map(|r| match r {
                            Resource::Declaration { modifiers, var_type, name, initializer } => {
                                let mut text = self.modifiers(modifiers);
                                if let Some(var_type) = var_type {
                                    text.push_str(&self.type_ref(var_type));
                                    text.push(' ');
                                }
                                format!("{}{} = {}", text, name, self.expr(initializer))
                            }
                            Resource::Expression(expr) => self.expr(expr),
                        })
                        .collect();
                    let text = format!("({}) ", rendered.join("; "));
                    self.push(&text);
                }
                self.write_block(body);
                for clause in catches {
                    let mut header = String::from(" catch (");
                    header.push_str(&self.modifiers(&clause.modifiers));
                    if !clause.types.is_empty() {
                        let types: Vec<String> = clause.types.iter().map(|t| self.type_ref(t)).collect();
                        header.push_str(&types.join(" | "));
                        header.push(' ');
                    }
                    header.push_str(&clause.name);
                    header.push_str(") ");
                    self.push(&header);
                    self.write_block(&clause.body);
                }
                if let Some(finally_block) = finally_block {
                    self.push(" finally ");
                    self.write_block(finally_block);
                }
            }
            StmtKind::Return(value) => match value {
                Some(value) => {
                    let text = format!("return {}", self.expr(value));
                    self.push(&text);
                }
                None => self.push("return"),
            },
            StmtKind::Throw(value) => {
                let text = format!("throw {}", self.expr(value));
                self.push(&text);
            }
            StmtKind::Break(label) => match label {
                Some(label) => self.push(&format!("break {}", label)),
                None => self.push("break"),
            },
            StmtKind::Continue(label) => match label {
                Some(label) => self.push(&format!("continue {}", label)),
                None => self.push("continue"),
            },
            StmtKind::Labeled { label, body } => {
                self.push(&format!("{}: ", label));
                self.write_stmt_inline(body);
            }
            StmtKind::LocalVarDecl(decl) => {
                let text = self.variable_decl(decl);
                self.push(&text);
            }
            StmtKind::Destructuring(tuple) => {
                let targets: Vec<String> = tuple
                    .targets
                    .iter()
                    .map(|t| match &t.var_type {
                        Some(var_type) => format!("{} {}", self.type_ref(var_type), t.name),
                        None => t.name.clone(),
                    })
                    .collect();
                let text = format!(
                    "{}({}) = {}",
                    self.modifiers(&tuple.modifiers),
                    targets.join(", "),
                    self.expr(&tuple.initializer)
                );
                self.push(&text);
            }
            StmtKind::Assert { condition, message } => {
                let mut text = format!("assert {}", self.expr(condition));
                if let Some(message) = message {
                    text.push_str(" : ");
                    text.push_str(&self.expr(message));
                }
                self.push(&text);
            }
            StmtKind::Synchronized { lock, body } => {
                let header = format!("synchronized ({}) ", self.expr(lock));
                self.push(&header);
                self.write_block(body);
            }
            StmtKind::ClassDecl(class) => {
                let mut nested = self.nested();
                nested.write_class(class);
                let text = nested.output.trim_start().trim_end_matches('\n').to_string();
                self.push(&text);
            }
            StmtKind::Expression(expr) => {
                let text = match &expr.value {
                    ExprKind::Closure(_) => format!("({})", self.expr(expr)),
                    _ => self.expr(expr),
                };
                self.push(&text);
            }
            StmtKind::Empty => self.push(";"),
        }
    }

    // -- expressions --------------------------------------------------------

    fn args(&self, args: &[Expr]) -> String {
        let rendered: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        rendered.join(", ")
    }

    /// An expression in operand position, parenthesised unless atomic
    fn operand(&self, expr: &Expr) -> String {
        if is_atomic(&expr.value) {
            self.expr(expr)
        } else {
            format!("({})", self.expr(expr))
        }
    }

    /// The receiver of a path element
    fn receiver(&self, expr: &Expr) -> String {
        match &expr.value {
            ExprKind::NewArray { .. } => format!("({})", self.expr(expr)),
            _ => self.operand(expr),
        }
    }

    fn member_name(&self, name: &MemberName) -> String {
        match name {
            MemberName::Ident(name) if is_name_shaped(name) => name.clone(),
            MemberName::Ident(name) => quote(name),
            MemberName::Dynamic(expr) => format!("({})", self.expr(expr)),
        }
    }

    fn closure(&self, closure: &Closure) -> String {
        let mut text = String::from("{");
        if let Some(params) = &closure.params {
            if params.is_empty() {
                text.push_str(" ->");
            } else {
                text.push(' ');
                text.push_str(&self.params(params));
                text.push_str(" ->");
            }
        }
        if closure.body.statements.is_empty() {
            text.push_str(" }");
            return text;
        }
        let mut nested = self.nested();
        nested.end_line();
        nested.indent();
        for stmt in &closure.body.statements {
            nested.write_stmt(stmt);
        }
        nested.dedent();
        nested.write_indent();
        text.push_str(&nested.output);
        text.push('}');
        text
    }

    fn class_body_text(&self, members: &[Declaration]) -> String {
        let mut nested = self.nested();
        nested.push("{");
        nested.end_line();
        nested.indent();
        nested.write_class_body(&[], members, None);
        nested.dedent();
        nested.write_indent();
        nested.push("}");
        nested.output
    }

    pub fn expr(&self, expr: &Expr) -> String {
        match &expr.value {
            ExprKind::Literal(literal) => literal.raw.clone(),
            ExprKind::Identifier(name) => name.clone(),
            ExprKind::This => "this".to_string(),
            ExprKind::Super => "super".to_string(),
            ExprKind::InterpolatedString(parts) => {
                let mut text = String::from("\"");
                for part in parts {
                    match part {
                        StringPart::Text(raw) => text.push_str(&escape_gstring_text(raw)),
                        StringPart::Expr(value) => match &value.value {
                            ExprKind::Closure(closure) if closure.params.is_some() => {
                                text.push('$');
                                text.push_str(&self.closure(closure));
                            }
                            _ => {
                                text.push_str("${");
                                text.push_str(&self.operand_in_interpolation(value));
                                text.push('}');
                            }
                        },
                    }
                }
                text.push('"');
                text
            }
            ExprKind::Binary { op, left, right } => {
                format!("{} {} {}", self.operand(left), op.symbol(), self.operand(right))
            }
            ExprKind::Unary { op, operand, prefix } => {
                if *prefix {
                    format!("{}{}", op.symbol(), self.operand(operand))
                } else {
                    format!("{}{}", self.operand(operand), op.symbol())
                }
            }
            ExprKind::Power { base, exponent } => {
                format!("{} ** {}", self.operand(base), self.operand(exponent))
            }
            ExprKind::Range { from, to, exclusive } => {
                let op = if *exclusive { "..<" } else { ".." };
                format!("{}{}{}", self.operand(from), op, self.operand(to))
            }
            ExprKind::Ternary { condition, then_branch, else_branch } => format!(
                "{} ? {} : {}",
                self.operand(condition),
                self.operand(then_branch),
                self.operand(else_branch)
            ),
            ExprKind::Elvis { left, right } => {
                format!("{} ?: {}", self.operand(left), self.operand(right))
            }
            ExprKind::Assignment { target, op, value } => {
                format!("{} {} {}", self.operand(target), op.symbol(), self.expr(value))
            }
            ExprKind::MultipleAssignment { targets, value } => {
                format!("({}) = {}", targets.join(", "), self.expr(value))
            }
            ExprKind::Cast { target_type, operand, coerce } => {
                if *coerce {
                    format!("{} as {}", self.operand(operand), self.type_ref(target_type))
                } else {
                    format!("({}) {}", self.type_ref(target_type), self.operand(operand))
                }
            }
            ExprKind::InstanceOf { expr, target_type, negated } => {
                let op = if *negated { "!instanceof" } else { "instanceof" };
                format!("{} {} {}", self.operand(expr), op, self.type_ref(target_type))
            }
            ExprKind::MethodCall { receiver, name, type_args, args, safe, spread } => {
                let mut text = String::new();
                if let Some(receiver) = receiver {
                    text.push_str(&self.receiver(receiver));
                    text.push_str(path_operator(*safe, *spread));
                    if !type_args.is_empty() {
                        text.push_str(&format!("<{}>", self.type_list(type_args)));
                    }
                }
                text.push_str(&self.member_name(name));
                text.push_str(&format!("({})", self.args(args)));
                text
            }
            ExprKind::Call { callee, args } => {
                let callee_text = match &callee.value {
                    ExprKind::MethodCall { .. } | ExprKind::Call { .. } | ExprKind::IndexAccess { .. } => {
                        self.expr(callee)
                    }
                    _ => format!("(({}))", self.expr(callee)),
                };
                format!("{}({})", callee_text, self.args(args))
            }
            ExprKind::PropertyAccess { receiver, name, safe, spread, attribute } => {
                let mut text = self.receiver(receiver);
                text.push_str(path_operator(*safe, *spread));
                if *attribute {
                    text.push('@');
                }
                text.push_str(&self.member_name(name));
                text
            }
            ExprKind::MethodPointer { receiver, name } => {
                format!("{}.&{}", self.receiver(receiver), self.member_name(name))
            }
            ExprKind::MethodReference { receiver, name } => {
                format!("{}::{}", self.receiver(receiver), self.member_name(name))
            }
            ExprKind::IndexAccess { receiver, args, safe } => {
                let open = if *safe { "?[" } else { "[" };
                format!("{}{}{}]", self.receiver(receiver), open, self.args(args))
            }
            ExprKind::Closure(closure) => self.closure(closure),
            ExprKind::Lambda { params, body } => {
                let body_text = match body {
                    LambdaBody::Expr(value) => self.expr(value),
                    LambdaBody::Block(block) => {
                        let mut nested = self.nested();
                        nested.write_block(block);
                        nested.output
                    }
                };
                format!("({}) -> {}", self.params(params), body_text)
            }
            ExprKind::List(elements) => format!("[{}]", self.args(elements)),
            ExprKind::Map(entries) => {
                if entries.is_empty() {
                    return "[:]".to_string();
                }
                let rendered: Vec<String> = entries
                    .iter()
                    .map(|entry| {
                        let key = match &entry.key {
                            MapKey::Name(name) => name.clone(),
                            MapKey::Spread => "*".to_string(),
                            MapKey::Expr(key) => match &key.value {
                                ExprKind::Literal(_) | ExprKind::InterpolatedString(_) => self.expr(key),
                                _ => format!("({})", self.expr(key)),
                            },
                        };
                        format!("{}: {}", key, self.expr(&entry.value))
                    })
                    .collect();
                format!("[{}]", rendered.join(", "))
            }
            ExprKind::Spread(inner) => format!("*{}", self.operand(inner)),
            ExprKind::New { outer, target_type, diamond, args, anonymous_body } => {
                let mut text = String::new();
                if let Some(outer) = outer {
                    text.push_str(&self.receiver(outer));
                    text.push('.');
                }
                text.push_str("new ");
                text.push_str(&self.type_ref(target_type));
                if *diamond {
                    text.push_str("<>");
                }
                text.push_str(&format!("({})", self.args(args)));
                if let Some(body) = anonymous_body {
                    text.push(' ');
                    text.push_str(&self.class_body_text(body));
                }
                text
            }
            ExprKind::NewArray { element_type, dims, initializer } => {
                let mut text = format!("new {}", self.type_ref(element_type));
                for dim in dims {
                    match dim {
                        Some(size) => text.push_str(&format!("[{}]", self.expr(size))),
                        None => text.push_str("[]"),
                    }
                }
                if let Some(values) = initializer {
                    text.push_str(&format!(" {{{}}}", self.args(values)));
                }
                text
            }
        }
    }

    fn operand_in_interpolation(&self, value: &Expr) -> String {
        match &value.value {
            ExprKind::Closure(_) => format!("({})", self.expr(value)),
            _ => self.expr(value),
        }
    }
}

/// Expressions that never need parentheses in operand position
fn is_atomic(kind: &ExprKind) -> bool {
    matches!(
        kind,
        ExprKind::Literal(_)
            | ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::InterpolatedString(_)
            | ExprKind::MethodCall { .. }
            | ExprKind::Call { .. }
            | ExprKind::PropertyAccess { .. }
            | ExprKind::MethodPointer { .. }
            | ExprKind::MethodReference { .. }
            | ExprKind::IndexAccess { .. }
            | ExprKind::List(_)
            | ExprKind::Map(_)
            | ExprKind::New { .. }
    )
}

fn path_operator(safe: bool, spread: bool) -> &'static str {
    if safe {
        "?."
    } else if spread {
        "*."
    } else {
        "."
    }
}

/// Identifier-shaped text; keywords included
fn is_name_shaped(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A declared name, quoted unless it lexes as a plain identifier
fn declared_name(name: &str) -> String {
    let plain = Lexer::new(name)
        .tokenize()
        .map(|tokens| tokens.len() == 2 && tokens[0].token == Token::Identifier)
        .unwrap_or(false);
    if plain {
        name.to_string()
    } else {
        quote(name)
    }
}

fn quote(text: &str) -> String {
    let mut out = String::from("'");
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

fn escape_gstring_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}
