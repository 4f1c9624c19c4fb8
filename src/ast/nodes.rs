use crate::parser::span::Spanned;

pub type Expr = Spanned<ExprKind>;
pub type Stmt = Spanned<StmtKind>;
pub type TypeRef = Spanned<TypeKind>;
pub type Declaration = Spanned<DeclarationKind>;

/// Root of a parsed source file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnit {
    pub package_decl: Option<Spanned<PackageDecl>>,
    pub imports: Vec<Spanned<ImportDecl>>,
    pub items: Vec<TopLevelItem>,
}

impl CompilationUnit {
    /// Class-like declarations at the top level
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.items.iter().filter_map(|item| match item {
            TopLevelItem::Declaration(decl) => match &decl.value {
                DeclarationKind::ClassLike(class) => Some(class),
                _ => None,
            },
            TopLevelItem::Statement(_) => None,
        })
    }

    /// Script statements at the top level
    pub fn statements(&self) -> impl Iterator<Item = &Stmt> {
        self.items.iter().filter_map(|item| match item {
            TopLevelItem::Statement(stmt) => Some(stmt),
            TopLevelItem::Declaration(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevelItem {
    Declaration(Declaration),
    Statement(Stmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageDecl {
    pub annotations: Vec<Annotation>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub name: String,
    pub is_static: bool,
    pub is_wildcard: bool,
    pub alias: Option<String>,
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// The five class-like declaration forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Trait,
}

impl DeclKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DeclKind::Class => "class",
            DeclKind::Interface => "interface",
            DeclKind::Enum => "enum",
            DeclKind::Annotation => "@interface",
            DeclKind::Trait => "trait",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    ClassLike(ClassDecl),
    Method(MethodDecl),
    Field(VariableDecl),
    /// `{ ... }` or `static { ... }` inside a class body
    Initializer { is_static: bool, body: Block },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub kind: DeclKind,
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub superclass: Option<TypeRef>,
    /// `implements` list, or the `extends` list of an interface
    pub interfaces: Vec<TypeRef>,
    /// Only populated for enums
    pub enum_constants: Vec<EnumConstant>,
    pub members: Vec<Declaration>,
}

impl ClassDecl {
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match &m.value {
            DeclarationKind::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &VariableDecl> {
        self.members.iter().filter_map(|m| match &m.value {
            DeclarationKind::Field(field) => Some(field),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub args: Vec<Expr>,
    pub body: Option<Vec<Declaration>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub modifiers: Vec<Modifier>,
    pub type_params: Vec<TypeParam>,
    /// `None` for constructors and for methods declared with `def` alone
    pub return_type: Option<TypeRef>,
    pub name: String,
    pub params: Vec<Parameter>,
    pub throws: Vec<TypeRef>,
    /// `default` value of an annotation member
    pub default_value: Option<ElementValue>,
    pub body: Option<Block>,
    pub is_constructor: bool,
}

/// A formal parameter of a method, constructor, closure or lambda
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub modifiers: Vec<Modifier>,
    pub param_type: Option<TypeRef>,
    pub varargs: bool,
    pub name: String,
    pub default_value: Option<Expr>,
    /// `Type this`
    pub is_receiver: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub bounds: Vec<TypeRef>,
}

/// Fields and local variables: `modifiers type? a = 1, b`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub modifiers: Vec<Modifier>,
    pub var_type: Option<TypeRef>,
    pub declarators: Vec<VariableDeclarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub name: String,
    pub initializer: Option<Expr>,
}

/// `def (a, String b) = value`
#[derive(Debug, Clone, PartialEq)]
pub struct TupleDecl {
    pub modifiers: Vec<Modifier>,
    pub targets: Vec<TupleTarget>,
    pub initializer: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleTarget {
    pub var_type: Option<TypeRef>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    Default,
    Def,
    Var,
    Annotation(Annotation),
}

impl Modifier {
    /// Source keyword, `None` for annotations
    pub fn keyword(&self) -> Option<&'static str> {
        Some(match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Native => "native",
            Modifier::Synchronized => "synchronized",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Default => "default",
            Modifier::Def => "def",
            Modifier::Var => "var",
            Modifier::Annotation(_) => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub args: Vec<AnnotationArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationArg {
    Value(ElementValue),
    Named(String, ElementValue),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Expr(Expr),
    Annotation(Annotation),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Char => "char",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Extends,
    Super,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDim {
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(PrimitiveType),
    /// Dotted name with type arguments on its last segment
    Named { name: String, type_args: Vec<TypeRef> },
    Array { element: Box<TypeRef>, dims: Vec<ArrayDim> },
    Void,
    Wildcard { bound: Option<(BoundKind, Box<TypeRef>)> },
    /// Type-use annotations in front of a type
    Annotated { annotations: Vec<Annotation>, inner: Box<TypeRef> },
}

impl TypeKind {
    pub fn named(name: impl Into<String>) -> Self {
        TypeKind::Named { name: name.into(), type_args: Vec::new() }
    }

    pub fn is_primitive(&self) -> bool {
        match self {
            TypeKind::Primitive(_) => true,
            TypeKind::Annotated { inner, .. } => inner.is_primitive(),
            _ => false,
        }
    }

    /// Number of `[]` groups
    pub fn array_dims(&self) -> usize {
        match self {
            TypeKind::Array { dims, .. } => dims.len(),
            TypeKind::Annotated { inner, .. } => inner.array_dims(),
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Block),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Switch {
        subject: Expr,
        groups: Vec<CaseGroup>,
    },
    For {
        control: ForControl,
        body: Box<Stmt>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    Try {
        resources: Vec<Resource>,
        body: Block,
        catches: Vec<CatchClause>,
        finally_block: Option<Block>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Break(Option<String>),
    Continue(Option<String>),
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    LocalVarDecl(VariableDecl),
    Destructuring(TupleDecl),
    Assert {
        condition: Expr,
        message: Option<Expr>,
    },
    Synchronized {
        lock: Expr,
        body: Block,
    },
    ClassDecl(ClassDecl),
    Expression(Expr),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseGroup {
    pub labels: Vec<CaseLabel>,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseLabel {
    Case(Expr),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForControl {
    Classic {
        init: Option<ForInit>,
        condition: Option<Expr>,
        update: Vec<Expr>,
    },
    /// `for (x in xs)` and `for (T x : xs)`
    Enhanced {
        modifiers: Vec<Modifier>,
        var_type: Option<TypeRef>,
        name: String,
        iterable: Expr,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Declaration(VariableDecl),
    Expressions(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Declaration {
        modifiers: Vec<Modifier>,
        var_type: Option<TypeRef>,
        name: String,
        initializer: Expr,
    },
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub modifiers: Vec<Modifier>,
    /// Empty for `catch (e)`
    pub types: Vec<TypeRef>,
    pub name: String,
    pub body: Block,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Integer,
    Float,
    String,
    Boolean,
    Null,
}

/// A literal with its source text; string literals keep their quotes
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub raw: String,
}

impl Literal {
    /// Unquoted, unescaped value of a string literal
    pub fn string_value(&self) -> Option<String> {
        match self.kind {
            LiteralKind::String => Some(crate::parser::lexer::string_value(&self.raw)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    LShift,
    RShift,
    URShift,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
    Eq,
    Ne,
    Spaceship,
    Identical,
    NotIdentical,
    RegexFind,
    RegexMatch,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::URShift => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::NotIn => "!in",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Spaceship => "<=>",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::RegexFind => "=~",
            BinaryOp::RegexMatch => "==~",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    Inc,
    Dec,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    URShift,
    Power,
    Elvis,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
            AssignOp::LShift => "<<=",
            AssignOp::RShift => ">>=",
            AssignOp::URShift => ">>>=",
            AssignOp::Power => "**=",
            AssignOp::Elvis => "?=",
        }
    }
}

/// Name following a path operator
#[derive(Debug, Clone, PartialEq)]
pub enum MemberName {
    Ident(String),
    /// `a."$name"` or `a.(expr)`
    Dynamic(Box<Expr>),
}

impl MemberName {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MemberName::Ident(name) => Some(name),
            MemberName::Dynamic(_) => None,
        }
    }
}

impl PartialEq<&str> for MemberName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    /// `None` when the closure has no `->` and takes the implicit parameter
    pub params: Option<Vec<Parameter>>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapKey {
    /// Bare identifier or keyword label
    Name(String),
    Expr(Expr),
    /// `*: otherMap`
    Spread,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: MapKey,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    This,
    Super,
    InterpolatedString(Vec<StringPart>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        prefix: bool,
    },
    Power {
        base: Box<Expr>,
        exponent: Box<Expr>,
    },
    Range {
        from: Box<Expr>,
        to: Box<Expr>,
        exclusive: bool,
    },
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Elvis {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assignment {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },
    MultipleAssignment {
        targets: Vec<String>,
        value: Box<Expr>,
    },
    /// `(Type) x`, or `x as Type` when `coerce` is set
    Cast {
        target_type: TypeRef,
        operand: Box<Expr>,
        coerce: bool,
    },
    InstanceOf {
        expr: Box<Expr>,
        target_type: TypeRef,
        negated: bool,
    },
    MethodCall {
        receiver: Option<Box<Expr>>,
        name: MemberName,
        type_args: Vec<TypeRef>,
        args: Vec<Expr>,
        safe: bool,
        spread: bool,
    },
    /// Invocation of a value that is not a named method: `(a.b)(1)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    PropertyAccess {
        receiver: Box<Expr>,
        name: MemberName,
        safe: bool,
        spread: bool,
        /// `.@name` direct field access
        attribute: bool,
    },
    MethodPointer {
        receiver: Box<Expr>,
        name: MemberName,
    },
    MethodReference {
        receiver: Box<Expr>,
        name: MemberName,
    },
    IndexAccess {
        receiver: Box<Expr>,
        args: Vec<Expr>,
        safe: bool,
    },
    Closure(Closure),
    Lambda {
        params: Vec<Parameter>,
        body: LambdaBody,
    },
    List(Vec<Expr>),
    Map(Vec<MapEntry>),
    /// `*items` in an argument or list
    Spread(Box<Expr>),
    New {
        outer: Option<Box<Expr>>,
        target_type: TypeRef,
        diamond: bool,
        args: Vec<Expr>,
        anonymous_body: Option<Vec<Declaration>>,
    },
    NewArray {
        element_type: TypeRef,
        /// One entry per `[]`; `None` for an unsized dimension
        dims: Vec<Option<Expr>>,
        initializer: Option<Vec<Expr>>,
    },
}

impl ExprKind {
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, ExprKind::MethodCall { .. } | ExprKind::Call { .. })
    }
}
