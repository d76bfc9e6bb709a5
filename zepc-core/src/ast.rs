//! Typed AST produced by the `Compact` stage.
//!
//! Every IR node kind is its own variant carrying exactly the fields the
//! emitter needs, so emission is an exhaustive match rather than a lookup.

use crate::error::Location;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub entries: Vec<TopLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    Comment(Comment),
    Namespace { name: String, location: Location },
    Use { aliases: Vec<UseAlias>, location: Location },
    Class(ClassDef),
    Interface(InterfaceDef),
    Function(FunctionDef),
    Statement(Stmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseAlias {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub is_abstract: bool,
    pub is_final: bool,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub docblock: Option<String>,
    pub constants: Vec<Constant>,
    pub properties: Vec<Property>,
    pub methods: Vec<Method>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDef {
    pub name: String,
    pub extends: Vec<String>,
    pub docblock: Option<String>,
    pub constants: Vec<Constant>,
    pub methods: Vec<Method>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub default: Expr,
    pub docblock: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub visibility: Vec<String>,
    pub name: String,
    pub default: Option<Expr>,
    pub shortcuts: Vec<Shortcut>,
    pub docblock: Option<String>,
    pub location: Location,
}

impl Property {
    pub fn is_static(&self) -> bool {
        self.visibility.iter().any(|v| v == "static")
    }
}

/// Accessor declared inline on a property (`get`, `set`, `toString`).
#[derive(Debug, Clone, PartialEq)]
pub struct Shortcut {
    pub name: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub visibility: Vec<String>,
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// `None` for abstract and interface methods.
    pub statements: Option<Vec<Stmt>>,
    pub docblock: Option<String>,
    pub location: Location,
}

impl Method {
    pub fn is_static(&self) -> bool {
        self.visibility.iter().any(|v| v == "static")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expr>,
    pub reference: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub statements: Vec<Stmt>,
    pub docblock: Option<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let(Vec<Assignment>),
    Declare(Vec<Declaration>),
    /// Call in statement position (`mcall`, `fcall`, `scall`).
    Expression(Expr),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_ifs: Vec<ElseIf>,
        else_branch: Option<Vec<Stmt>>,
    },
    Loop(Vec<Stmt>),
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    DoWhile {
        body: Vec<Stmt>,
        condition: Expr,
    },
    For {
        key: Option<String>,
        value: Option<String>,
        reverse: bool,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Switch {
        subject: Expr,
        clauses: Vec<Clause>,
    },
    Continue,
    Break,
    Return(Option<Expr>),
    Throw(Expr),
    Unset(Expr),
    Echo(Vec<Expr>),
    Require(Expr),
    TryCatch {
        body: Vec<Stmt>,
        catches: Vec<Catch>,
    },
    Comment(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIf {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Case { test: Expr, body: Vec<Stmt> },
    Default { body: Vec<Stmt> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    pub classes: Vec<String>,
    pub variable: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: Location,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            location: Location::default(),
        }
    }

    pub fn at(kind: ExprKind, location: Location) -> Self {
        Expr { kind, location }
    }

    pub fn variable(name: &str) -> Self {
        Expr::new(ExprKind::Variable(name.to_string()))
    }

    /// Whether evaluating this expression reads the variable `name`.
    /// Closure bodies run in their own scope and are not inspected.
    pub fn reads_variable(&self, name: &str) -> bool {
        let any = |exprs: &[Expr]| exprs.iter().any(|e| e.reads_variable(name));
        match &self.kind {
            ExprKind::Variable(v) => v == name,
            ExprKind::Int(_)
            | ExprKind::Double(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::String(_)
            | ExprKind::IString(_)
            | ExprKind::Char(_)
            | ExprKind::EmptyArray
            | ExprKind::Constant(_)
            | ExprKind::StaticPropertyAccess { .. }
            | ExprKind::StaticConstantAccess { .. }
            | ExprKind::NewType { .. }
            | ExprKind::Closure { .. } => false,
            ExprKind::Array(items) => items.iter().any(|item| {
                item.value.reads_variable(name)
                    || item.key.as_ref().is_some_and(|k| k.reads_variable(name))
            }),
            ExprKind::Unary { operand, .. } => operand.reads_variable(name),
            ExprKind::Binary { left, right, .. } => {
                left.reads_variable(name) || right.reads_variable(name)
            }
            ExprKind::Range { start, end, .. } => {
                start.reads_variable(name) || end.reads_variable(name)
            }
            ExprKind::PropertyAccess { object, .. }
            | ExprKind::PropertyStringAccess { object, .. } => object.reads_variable(name),
            ExprKind::PropertyDynamicAccess { object, property } => {
                object.reads_variable(name) || property.reads_variable(name)
            }
            ExprKind::ArrayAccess { array, index } => {
                array.reads_variable(name) || index.reads_variable(name)
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                receiver.reads_variable(name) || any(args)
            }
            ExprKind::FunctionCall { args, .. } | ExprKind::StaticCall { args, .. } => any(args),
            ExprKind::New {
                class,
                dynamic,
                args,
            } => (*dynamic && class == name) || any(args),
            ExprKind::Cast { expr, .. } | ExprKind::TypeHint { expr, .. } => {
                expr.reads_variable(name)
            }
            ExprKind::Ternary {
                condition,
                then,
                otherwise,
            } => {
                condition.reads_variable(name)
                    || then.reads_variable(name)
                    || otherwise.reads_variable(name)
            }
            ExprKind::ClosureArrow { parameter, body } => {
                parameter != name && body.reads_variable(name)
            }
            ExprKind::Fetch { expr, .. } => expr.reads_variable(name),
        }
    }

    /// Kind name as the parser spells it, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Int(_) => "int",
            ExprKind::Double(_) => "double",
            ExprKind::Bool(_) => "bool",
            ExprKind::Null => "null",
            ExprKind::String(_) => "string",
            ExprKind::IString(_) => "istring",
            ExprKind::Char(_) => "char",
            ExprKind::Array(_) => "array",
            ExprKind::EmptyArray => "empty-array",
            ExprKind::Constant(_) => "constant",
            ExprKind::Variable(_) => "variable",
            ExprKind::Unary { op, .. } => op.kind_name(),
            ExprKind::Binary { op, .. } => op.kind_name(),
            ExprKind::Range { inclusive: true, .. } => "irange",
            ExprKind::Range { inclusive: false, .. } => "erange",
            ExprKind::PropertyAccess { .. } => "property-access",
            ExprKind::PropertyDynamicAccess { .. } => "property-dynamic-access",
            ExprKind::PropertyStringAccess { .. } => "property-string-access",
            ExprKind::StaticPropertyAccess { .. } => "static-property-access",
            ExprKind::StaticConstantAccess { .. } => "static-constant-access",
            ExprKind::ArrayAccess { .. } => "array-access",
            ExprKind::MethodCall { .. } => "mcall",
            ExprKind::FunctionCall { .. } => "fcall",
            ExprKind::StaticCall { .. } => "scall",
            ExprKind::New { .. } => "new",
            ExprKind::NewType { .. } => "new-type",
            ExprKind::Cast { .. } => "cast",
            ExprKind::TypeHint { .. } => "type-hint",
            ExprKind::Ternary { .. } => "ternary",
            ExprKind::Closure { .. } => "closure",
            ExprKind::ClosureArrow { .. } => "closure-arrow",
            ExprKind::Fetch { .. } => "fetch",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(String),
    Double(String),
    Bool(bool),
    Null,
    String(String),
    IString(String),
    Char(String),
    Array(Vec<ArrayItem>),
    EmptyArray,
    Constant(String),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Range {
        inclusive: bool,
        start: Box<Expr>,
        end: Box<Expr>,
    },
    PropertyAccess {
        object: Box<Expr>,
        property: String,
    },
    PropertyDynamicAccess {
        object: Box<Expr>,
        property: Box<Expr>,
    },
    PropertyStringAccess {
        object: Box<Expr>,
        property: String,
    },
    StaticPropertyAccess {
        class: String,
        property: String,
    },
    StaticConstantAccess {
        class: String,
        constant: String,
    },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
    StaticCall {
        class: String,
        method: String,
        args: Vec<Expr>,
    },
    New {
        class: String,
        /// `new {var}()`: the class name is held in a variable.
        dynamic: bool,
        args: Vec<Expr>,
    },
    NewType {
        type_name: NewTypeKind,
    },
    Cast {
        target: String,
        expr: Box<Expr>,
    },
    TypeHint {
        hint: String,
        expr: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Closure {
        parameters: Vec<Parameter>,
        body: Vec<Stmt>,
    },
    ClosureArrow {
        parameter: String,
        body: Box<Expr>,
    },
    Fetch {
        variable: String,
        expr: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayItem {
    pub key: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewTypeKind {
    Array,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    BitwiseNot,
    Minus,
    Plus,
    Isset,
    Empty,
    Typeof,
    Require,
    Clone,
    List,
    Likely,
    Unlikely,
}

impl UnaryOp {
    pub fn from_kind(kind: &str) -> Option<Self> {
        Some(match crate::ir::handler_key(kind).as_str() {
            "Not" => UnaryOp::Not,
            "BitwiseNot" => UnaryOp::BitwiseNot,
            "Minus" => UnaryOp::Minus,
            "Plus" => UnaryOp::Plus,
            "Isset" => UnaryOp::Isset,
            "Empty" => UnaryOp::Empty,
            "Typeof" => UnaryOp::Typeof,
            "Require" => UnaryOp::Require,
            "Clone" => UnaryOp::Clone,
            "List" => UnaryOp::List,
            "Likely" => UnaryOp::Likely,
            "Unlikely" => UnaryOp::Unlikely,
            _ => return None,
        })
    }

    pub fn kind_name(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::BitwiseNot => "bitwise_not",
            UnaryOp::Minus => "minus",
            UnaryOp::Plus => "plus",
            UnaryOp::Isset => "isset",
            UnaryOp::Empty => "empty",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Require => "require",
            UnaryOp::Clone => "clone",
            UnaryOp::List => "list",
            UnaryOp::Likely => "likely",
            UnaryOp::Unlikely => "unlikely",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    And,
    Or,
    BitwiseOr,
    BitwiseAnd,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    Equals,
    NotEquals,
    Identical,
    NotIdentical,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Instanceof,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 22] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::Concat,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::BitwiseOr,
        BinaryOp::BitwiseAnd,
        BinaryOp::BitwiseXor,
        BinaryOp::ShiftLeft,
        BinaryOp::ShiftRight,
        BinaryOp::Equals,
        BinaryOp::NotEquals,
        BinaryOp::Identical,
        BinaryOp::NotIdentical,
        BinaryOp::Less,
        BinaryOp::Greater,
        BinaryOp::LessEqual,
        BinaryOp::GreaterEqual,
        BinaryOp::Instanceof,
    ];

    /// Matches on the handler key so that `not-equals` and `not_equals`
    /// resolve alike.
    pub fn from_kind(kind: &str) -> Option<Self> {
        let key = crate::ir::handler_key(kind);
        Self::ALL
            .into_iter()
            .find(|op| crate::ir::handler_key(op.kind_name()) == key)
    }

    pub fn kind_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::Concat => "concat",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::BitwiseOr => "bitwise_or",
            BinaryOp::BitwiseAnd => "bitwise_and",
            BinaryOp::BitwiseXor => "bitwise_xor",
            BinaryOp::ShiftLeft => "bitwise_shiftleft",
            BinaryOp::ShiftRight => "bitwise_shiftright",
            BinaryOp::Equals => "equals",
            BinaryOp::NotEquals => "not-equals",
            BinaryOp::Identical => "identical",
            BinaryOp::NotIdentical => "not-identical",
            BinaryOp::Less => "less",
            BinaryOp::Greater => "greater",
            BinaryOp::LessEqual => "less-equal",
            BinaryOp::GreaterEqual => "greater-equal",
            BinaryOp::Instanceof => "instanceof",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Concat => ".",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Instanceof => "instanceof",
        }
    }
}

/// A single target of a `let` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub kind: AssignKind,
    pub operator: Option<AssignOp>,
    pub variable: String,
    pub property: Option<String>,
    pub index: Vec<Expr>,
    pub expr: Option<Expr>,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignKind {
    Variable,
    VariableAppend,
    ArrayIndex,
    ArrayIndexAppend,
    ObjectProperty,
    ObjectPropertyAppend,
    ObjectPropertyArrayIndex,
    ObjectPropertyArrayIndexAppend,
    VariableDynamicObjectProperty,
    StringDynamicObjectProperty,
    StaticProperty,
    StaticPropertyAppend,
    StaticPropertyArrayIndex,
    StaticPropertyArrayIndexAppend,
    Incr,
    Decr,
    ObjectPropertyIncr,
    ObjectPropertyDecr,
    DynamicVariable,
    DynamicVariableString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignFamily {
    /// Whole-variable writes.
    Simple,
    /// Writes into an element or member of an existing value.
    Container,
    /// Increment and decrement, no right-hand side.
    MutationOnly,
    /// Class-level storage, no local symbol involved.
    Static,
}

/// How the target variable has to be looked up before the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    ForWrite,
    ForUpdate,
    None,
}

impl AssignKind {
    pub const ALL: [AssignKind; 20] = [
        AssignKind::Variable,
        AssignKind::VariableAppend,
        AssignKind::ArrayIndex,
        AssignKind::ArrayIndexAppend,
        AssignKind::ObjectProperty,
        AssignKind::ObjectPropertyAppend,
        AssignKind::ObjectPropertyArrayIndex,
        AssignKind::ObjectPropertyArrayIndexAppend,
        AssignKind::VariableDynamicObjectProperty,
        AssignKind::StringDynamicObjectProperty,
        AssignKind::StaticProperty,
        AssignKind::StaticPropertyAppend,
        AssignKind::StaticPropertyArrayIndex,
        AssignKind::StaticPropertyArrayIndexAppend,
        AssignKind::Incr,
        AssignKind::Decr,
        AssignKind::ObjectPropertyIncr,
        AssignKind::ObjectPropertyDecr,
        AssignKind::DynamicVariable,
        AssignKind::DynamicVariableString,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        use AssignKind::*;
        match self {
            Variable => "variable",
            VariableAppend => "variable-append",
            ArrayIndex => "array-index",
            ArrayIndexAppend => "array-index-append",
            ObjectProperty => "object-property",
            ObjectPropertyAppend => "object-property-append",
            ObjectPropertyArrayIndex => "object-property-array-index",
            ObjectPropertyArrayIndexAppend => "object-property-array-index-append",
            VariableDynamicObjectProperty => "variable-dynamic-object-property",
            StringDynamicObjectProperty => "string-dynamic-object-property",
            StaticProperty => "static-property",
            StaticPropertyAppend => "static-property-append",
            StaticPropertyArrayIndex => "static-property-array-index",
            StaticPropertyArrayIndexAppend => "static-property-array-index-append",
            Incr => "incr",
            Decr => "decr",
            ObjectPropertyIncr => "object-property-incr",
            ObjectPropertyDecr => "object-property-decr",
            DynamicVariable => "dynamic-variable",
            DynamicVariableString => "dynamic-variable-string",
        }
    }

    pub fn family(self) -> AssignFamily {
        use AssignKind::*;
        match self {
            Variable | DynamicVariable | DynamicVariableString => AssignFamily::Simple,
            VariableAppend
            | ArrayIndex
            | ArrayIndexAppend
            | ObjectProperty
            | ObjectPropertyAppend
            | ObjectPropertyArrayIndex
            | ObjectPropertyArrayIndexAppend
            | VariableDynamicObjectProperty
            | StringDynamicObjectProperty => AssignFamily::Container,
            Incr | Decr | ObjectPropertyIncr | ObjectPropertyDecr => AssignFamily::MutationOnly,
            StaticProperty
            | StaticPropertyAppend
            | StaticPropertyArrayIndex
            | StaticPropertyArrayIndexAppend => AssignFamily::Static,
        }
    }

    pub fn binding(self) -> Binding {
        use AssignKind::*;
        match self {
            Variable | DynamicVariable | Incr | Decr | ObjectPropertyIncr | ObjectPropertyDecr => {
                Binding::ForWrite
            }
            DynamicVariableString => Binding::None,
            _ => match self.family() {
                AssignFamily::Container => Binding::ForUpdate,
                _ => Binding::None,
            },
        }
    }

    pub fn takes_expression(self) -> bool {
        self.family() != AssignFamily::MutationOnly
    }

    /// Variants whose target path includes `index-expr` steps.
    pub fn takes_index(self) -> bool {
        matches!(
            self,
            AssignKind::ArrayIndex
                | AssignKind::ArrayIndexAppend
                | AssignKind::ObjectPropertyArrayIndex
                | AssignKind::ObjectPropertyArrayIndexAppend
                | AssignKind::StaticPropertyArrayIndex
                | AssignKind::StaticPropertyArrayIndexAppend
        )
    }

    /// Variants that name a property next to the variable.
    pub fn takes_property(self) -> bool {
        use AssignKind::*;
        matches!(
            self,
            ObjectProperty
                | ObjectPropertyAppend
                | ObjectPropertyArrayIndex
                | ObjectPropertyArrayIndexAppend
                | VariableDynamicObjectProperty
                | StringDynamicObjectProperty
                | StaticProperty
                | StaticPropertyAppend
                | StaticPropertyArrayIndex
                | StaticPropertyArrayIndexAppend
                | ObjectPropertyIncr
                | ObjectPropertyDecr
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ConcatAssign,
}

impl AssignOp {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "assign" => AssignOp::Assign,
            "add-assign" => AssignOp::AddAssign,
            "sub-assign" => AssignOp::SubAssign,
            "mul-assign" => AssignOp::MulAssign,
            "div-assign" => AssignOp::DivAssign,
            "mod-assign" => AssignOp::ModAssign,
            "concat-assign" => AssignOp::ConcatAssign,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
            AssignOp::ConcatAssign => ".=",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_assign_kind_round_trips_its_name() {
        for kind in AssignKind::ALL {
            assert_eq!(AssignKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(AssignKind::parse("swap"), None);
    }

    #[test]
    fn binds_variants_per_family() {
        assert_eq!(AssignKind::Variable.binding(), Binding::ForWrite);
        assert_eq!(AssignKind::ObjectPropertyIncr.binding(), Binding::ForWrite);
        assert_eq!(AssignKind::ArrayIndexAppend.binding(), Binding::ForUpdate);
        assert_eq!(AssignKind::DynamicVariable.binding(), Binding::ForWrite);
        assert_eq!(AssignKind::DynamicVariableString.binding(), Binding::None);
        assert_eq!(AssignKind::StaticPropertyAppend.binding(), Binding::None);
        assert!(!AssignKind::Decr.takes_expression());
        assert!(AssignKind::StaticProperty.takes_expression());
    }

    #[test]
    fn resolves_binary_operators_by_key() {
        assert_eq!(BinaryOp::from_kind("not-equals"), Some(BinaryOp::NotEquals));
        assert_eq!(BinaryOp::from_kind("bitwise_and"), Some(BinaryOp::BitwiseAnd));
        assert_eq!(BinaryOp::from_kind("spaceship"), None);
        assert_eq!(BinaryOp::Concat.symbol(), ".");
        for op in BinaryOp::ALL {
            assert_eq!(BinaryOp::from_kind(op.kind_name()), Some(op));
        }
    }

    #[test]
    fn detects_reads_of_the_target() {
        let sum = Expr::new(ExprKind::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expr::variable("a")),
            right: Box::new(Expr::new(ExprKind::Int("1".into()))),
        });
        assert!(sum.reads_variable("a"));
        assert!(!sum.reads_variable("b"));

        let call = Expr::new(ExprKind::FunctionCall {
            name: "strlen".into(),
            args: vec![Expr::new(ExprKind::ArrayAccess {
                array: Box::new(Expr::variable("items")),
                index: Box::new(Expr::variable("i")),
            })],
        });
        assert!(call.reads_variable("i"));
    }
}
