//! `Compact`: decodes the parser's open IR nodes into the typed AST.
//!
//! This is the only place a node kind is looked up by name. Kinds are
//! normalized with [`crate::ir::handler_key`] and an unknown kind is reported per
//! handler family.

use serde_json::Value;

use crate::ast::{
    ArrayItem, AssignKind, AssignOp, Assignment, BinaryOp, Catch, ClassDef, Clause, Comment,
    Constant, Declaration, ElseIf, Expr, ExprKind, FunctionDef, InterfaceDef, Method, NewTypeKind,
    Parameter, Program, Property, Shortcut, Stmt, StmtKind, TopLevel, UnaryOp, UseAlias,
};
use crate::error::CoreError;
use crate::ir::Node;
use crate::stage::{Stage, Unit, unexpected};

const TOP_LEVEL: &str = "top-level";
const STATEMENT: &str = "statement";
const EXPRESSION: &str = "expression";
const CLAUSE: &str = "clause";
const CLASS_MEMBER: &str = "class-member";

#[derive(Debug, Default)]
pub struct Compact;

impl Compact {
    pub fn new() -> Self {
        Compact
    }
}

impl Stage for Compact {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn compile(&mut self, unit: Unit) -> Result<Unit, CoreError> {
        match unit {
            Unit::Ir(nodes) => Ok(Unit::Ast(decode_program(&nodes)?)),
            other => Err(unexpected(self.name(), &other)),
        }
    }
}

pub fn decode_program(nodes: &[Node]) -> Result<Program, CoreError> {
    let entries = nodes
        .iter()
        .map(decode_top_level)
        .collect::<Result<_, _>>()?;
    Ok(Program { entries })
}

fn no_handler(family: &'static str, node: &Node) -> CoreError {
    CoreError::NoHandler {
        family,
        kind: node.handler_key(),
        location: node.location(),
    }
}

/// Names show up either as bare strings or as `variable` nodes carrying the
/// name in `value`.
fn ident_attr(node: &Node, name: &str) -> Result<String, CoreError> {
    opt_ident_attr(node, name)?.ok_or_else(|| node.malformed(name))
}

fn opt_ident_attr(node: &Node, name: &str) -> Result<Option<String>, CoreError> {
    match node.attributes.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Object(_)) => Ok(Some(node.node_attr(name)?.scalar_attr("value")?)),
        Some(_) => Err(node.malformed(name)),
    }
}

fn idents_attr(node: &Node, name: &str) -> Result<Vec<String>, CoreError> {
    match node.attributes.get(name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Object(map) => map
                    .get("value")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| node.malformed(name)),
                _ => Err(node.malformed(name)),
            })
            .collect(),
        Some(_) => Err(node.malformed(name)),
    }
}

fn docblock(node: &Node) -> Result<Option<String>, CoreError> {
    Ok(node.opt_str_attr("docblock")?.map(str::to_string))
}

fn decode_top_level(node: &Node) -> Result<TopLevel, CoreError> {
    let location = node.location();
    Ok(match node.handler_key().as_str() {
        "Comment" => TopLevel::Comment(Comment {
            text: node.scalar_attr("value")?,
            location,
        }),
        "Namespace" => TopLevel::Namespace {
            name: node.str_attr("name")?.to_string(),
            location,
        },
        "Use" => {
            let aliases = node
                .records_attr("aliases", "use-alias")?
                .iter()
                .map(|alias| {
                    Ok(UseAlias {
                        name: alias.str_attr("name")?.to_string(),
                        alias: alias.opt_str_attr("alias")?.map(str::to_string),
                    })
                })
                .collect::<Result<_, CoreError>>()?;
            TopLevel::Use { aliases, location }
        }
        "Class" => TopLevel::Class(decode_class(node)?),
        "Interface" => TopLevel::Interface(decode_interface(node)?),
        "Function" => TopLevel::Function(FunctionDef {
            name: node.str_attr("name")?.to_string(),
            parameters: decode_parameters(node, "parameters")?,
            statements: decode_block(node, "statements")?,
            docblock: docblock(node)?,
            location,
        }),
        "Require" => TopLevel::Statement(decode_stmt(node)?),
        _ => return Err(no_handler(TOP_LEVEL, node)),
    })
}

/// Members of a class or interface `definition`, each section checked for
/// the member kind it may hold.
struct Definition {
    constants: Vec<Constant>,
    properties: Vec<Property>,
    methods: Vec<Method>,
}

fn decode_definition(node: &Node) -> Result<Definition, CoreError> {
    let mut definition = Definition {
        constants: Vec::new(),
        properties: Vec::new(),
        methods: Vec::new(),
    };
    let Some(body) = node.record_attr("definition", "definition")? else {
        return Ok(definition);
    };
    for member in body.nodes_attr("constants")? {
        if member.handler_key() != "Const" {
            return Err(no_handler(CLASS_MEMBER, &member));
        }
        definition.constants.push(Constant {
            name: member.str_attr("name")?.to_string(),
            default: decode_expr(&member.node_attr("default")?)?,
            docblock: docblock(&member)?,
        });
    }
    for member in body.nodes_attr("properties")? {
        if member.handler_key() != "Property" {
            return Err(no_handler(CLASS_MEMBER, &member));
        }
        definition.properties.push(decode_property(&member)?);
    }
    for member in body.nodes_attr("methods")? {
        if member.handler_key() != "Method" {
            return Err(no_handler(CLASS_MEMBER, &member));
        }
        definition.methods.push(decode_method(&member)?);
    }
    Ok(definition)
}

fn decode_class(node: &Node) -> Result<ClassDef, CoreError> {
    let definition = decode_definition(node)?;
    Ok(ClassDef {
        name: node.str_attr("name")?.to_string(),
        is_abstract: node.bool_attr("abstract")?,
        is_final: node.bool_attr("final")?,
        extends: opt_ident_attr(node, "extends")?,
        implements: idents_attr(node, "implements")?,
        docblock: docblock(node)?,
        constants: definition.constants,
        properties: definition.properties,
        methods: definition.methods,
        location: node.location(),
    })
}

fn decode_interface(node: &Node) -> Result<InterfaceDef, CoreError> {
    let definition = decode_definition(node)?;
    if let Some(property) = definition.properties.first() {
        return Err(CoreError::NoHandler {
            family: CLASS_MEMBER,
            kind: "Property".to_string(),
            location: property.location.clone(),
        });
    }
    Ok(InterfaceDef {
        name: node.str_attr("name")?.to_string(),
        extends: idents_attr(node, "extends")?,
        docblock: docblock(node)?,
        constants: definition.constants,
        methods: definition.methods,
        location: node.location(),
    })
}

fn decode_property(node: &Node) -> Result<Property, CoreError> {
    let default = node.opt_node_attr("default")?.map(|d| decode_expr(&d)).transpose()?;
    let shortcuts = node
        .nodes_attr("shortcuts")?
        .iter()
        .map(|shortcut| {
            Ok(Shortcut {
                name: shortcut.str_attr("name")?.to_string(),
                location: shortcut.location(),
            })
        })
        .collect::<Result<_, CoreError>>()?;
    Ok(Property {
        visibility: node.strings_attr("visibility")?,
        name: node.str_attr("name")?.to_string(),
        default,
        shortcuts,
        docblock: docblock(node)?,
        location: node.location(),
    })
}

fn decode_method(node: &Node) -> Result<Method, CoreError> {
    let statements = if node.has("statements") {
        Some(decode_block(node, "statements")?)
    } else {
        None
    };
    Ok(Method {
        visibility: node.strings_attr("visibility")?,
        name: node.str_attr("name")?.to_string(),
        parameters: decode_parameters(node, "parameters")?,
        statements,
        docblock: docblock(node)?,
        location: node.location(),
    })
}

fn decode_parameters(node: &Node, name: &str) -> Result<Vec<Parameter>, CoreError> {
    node.records_attr(name, "parameter")?
        .iter()
        .map(|parameter| {
            Ok(Parameter {
                name: parameter.str_attr("name")?.to_string(),
                default: parameter
                    .opt_node_attr("default")?
                    .map(|d| decode_expr(&d))
                    .transpose()?,
                reference: parameter.bool_attr("reference")?,
            })
        })
        .collect()
}

fn decode_block(node: &Node, name: &str) -> Result<Vec<Stmt>, CoreError> {
    node.nodes_attr(name)?.iter().map(decode_stmt).collect()
}

fn decode_stmt(node: &Node) -> Result<Stmt, CoreError> {
    let expr = |name: &str| decode_expr(&node.node_attr(name)?);
    let kind = match node.handler_key().as_str() {
        "Let" => StmtKind::Let(
            node.records_attr("assignments", "assignment")?
                .iter()
                .map(decode_assignment)
                .collect::<Result<_, _>>()?,
        ),
        "Declare" => StmtKind::Declare(
            node.records_attr("variables", "declaration")?
                .iter()
                .map(|variable| {
                    Ok(Declaration {
                        name: ident_attr(variable, "variable")?,
                        init: variable
                            .opt_node_attr("expr")?
                            .map(|e| decode_expr(&e))
                            .transpose()?,
                    })
                })
                .collect::<Result<_, CoreError>>()?,
        ),
        "Mcall" | "Fcall" | "Scall" => StmtKind::Expression(expr("expr")?),
        "If" => StmtKind::If {
            condition: expr("expr")?,
            then_branch: decode_block(node, "statements")?,
            else_ifs: node
                .records_attr("elseif_statements", "elseif")?
                .iter()
                .map(|branch| {
                    Ok(ElseIf {
                        condition: decode_expr(&branch.node_attr("expr")?)?,
                        body: decode_block(branch, "statements")?,
                    })
                })
                .collect::<Result<_, CoreError>>()?,
            else_branch: if node.has("else_statements") {
                Some(decode_block(node, "else_statements")?)
            } else {
                None
            },
        },
        // A bare `fetch v, expr;` assigns only when the value is set.
        "Fetch" => StmtKind::If {
            condition: expr("expr")?,
            then_branch: Vec::new(),
            else_ifs: Vec::new(),
            else_branch: None,
        },
        "Loop" => StmtKind::Loop(decode_block(node, "statements")?),
        "While" => StmtKind::While {
            condition: expr("expr")?,
            body: decode_block(node, "statements")?,
        },
        "DoWhile" => StmtKind::DoWhile {
            body: decode_block(node, "statements")?,
            condition: expr("expr")?,
        },
        "For" => StmtKind::For {
            key: node.opt_str_attr("key")?.map(str::to_string),
            value: node.opt_str_attr("value")?.map(str::to_string),
            reverse: node.bool_attr("reverse")?,
            iterable: expr("expr")?,
            body: decode_block(node, "statements")?,
        },
        "Switch" => StmtKind::Switch {
            subject: expr("expr")?,
            clauses: node
                .nodes_attr("clauses")?
                .iter()
                .map(decode_clause)
                .collect::<Result<_, _>>()?,
        },
        "Continue" => StmtKind::Continue,
        "Break" => StmtKind::Break,
        "Return" => StmtKind::Return(
            node.opt_node_attr("expr")?
                .map(|e| decode_expr(&e))
                .transpose()?,
        ),
        "Throw" => StmtKind::Throw(expr("expr")?),
        "Unset" => StmtKind::Unset(expr("expr")?),
        "Echo" => StmtKind::Echo(
            node.nodes_attr("expressions")?
                .iter()
                .map(decode_expr)
                .collect::<Result<_, _>>()?,
        ),
        "Require" => StmtKind::Require(expr("expr")?),
        "TryCatch" => StmtKind::TryCatch {
            body: decode_block(node, "statements")?,
            catches: node
                .records_attr("catches", "catch")?
                .iter()
                .map(|catch| {
                    Ok(Catch {
                        classes: idents_attr(catch, "classes")?,
                        variable: opt_ident_attr(catch, "variable")?,
                        body: decode_block(catch, "statements")?,
                    })
                })
                .collect::<Result<_, CoreError>>()?,
        },
        "Comment" => StmtKind::Comment(node.scalar_attr("value")?),
        "Empty" => StmtKind::Empty,
        _ => return Err(no_handler(STATEMENT, node)),
    };
    Ok(Stmt {
        kind,
        location: node.location(),
    })
}

fn decode_clause(node: &Node) -> Result<Clause, CoreError> {
    match node.handler_key().as_str() {
        "Case" => Ok(Clause::Case {
            test: decode_expr(&node.node_attr("expr")?)?,
            body: decode_block(node, "statements")?,
        }),
        "Default" => Ok(Clause::Default {
            body: decode_block(node, "statements")?,
        }),
        _ => Err(no_handler(CLAUSE, node)),
    }
}

fn decode_assignment(node: &Node) -> Result<Assignment, CoreError> {
    let location = node.location();
    let variant = node.str_attr("assign-type")?;
    let kind = AssignKind::parse(variant).ok_or_else(|| CoreError::UnknownAssignment {
        variant: variant.to_string(),
        location: location.clone(),
    })?;
    let operator = match node.opt_str_attr("operator")? {
        Some(operator) => Some(AssignOp::parse(operator).ok_or_else(|| {
            CoreError::UnknownOperator {
                operator: operator.to_string(),
                location: location.clone(),
            }
        })?),
        None => None,
    };

    // increments never carry a value, every other form needs one
    if node.has("expr") != kind.takes_expression() {
        return Err(CoreError::MalformedNode {
            kind: kind.name().to_string(),
            attribute: "expr".to_string(),
            location,
        });
    }
    let expr = node.opt_node_attr("expr")?.map(|e| decode_expr(&e)).transpose()?;
    let property = if kind.takes_property() {
        Some(ident_attr(node, "property")?)
    } else {
        None
    };
    let index = if kind.takes_index() {
        node.nodes_attr("index-expr")?
            .iter()
            .map(decode_expr)
            .collect::<Result<_, _>>()?
    } else {
        Vec::new()
    };
    Ok(Assignment {
        kind,
        operator,
        variable: ident_attr(node, "variable")?,
        property,
        index,
        expr,
        location,
    })
}

fn decode_expr(node: &Node) -> Result<Expr, CoreError> {
    let child = |name: &str| -> Result<Box<Expr>, CoreError> {
        Ok(Box::new(decode_expr(&node.node_attr(name)?)?))
    };
    let key = node.handler_key();
    let kind = match key.as_str() {
        "Int" | "Uint" | "Long" | "Ulong" => ExprKind::Int(node.scalar_attr("value")?),
        "Double" => ExprKind::Double(node.scalar_attr("value")?),
        "Bool" => ExprKind::Bool(node.bool_attr("value")?),
        "Null" => ExprKind::Null,
        "String" => ExprKind::String(node.scalar_attr("value")?),
        "Istring" => ExprKind::IString(node.scalar_attr("value")?),
        "Char" => ExprKind::Char(node.scalar_attr("value")?),
        "Array" => ExprKind::Array(
            node.records_attr("left", "array-item")?
                .iter()
                .map(|item| {
                    Ok(ArrayItem {
                        key: item
                            .opt_node_attr("key")?
                            .map(|k| decode_expr(&k))
                            .transpose()?,
                        value: decode_expr(&item.node_attr("value")?)?,
                    })
                })
                .collect::<Result<_, CoreError>>()?,
        ),
        "EmptyArray" => ExprKind::EmptyArray,
        "Constant" => ExprKind::Constant(node.scalar_attr("value")?),
        "Variable" => ExprKind::Variable(node.scalar_attr("value")?),
        "Irange" | "Erange" => ExprKind::Range {
            inclusive: key == "Irange",
            start: child("left")?,
            end: child("right")?,
        },
        "PropertyAccess" => ExprKind::PropertyAccess {
            object: child("left")?,
            property: ident_attr(node, "right")?,
        },
        "PropertyDynamicAccess" => ExprKind::PropertyDynamicAccess {
            object: child("left")?,
            property: child("right")?,
        },
        "PropertyStringAccess" => ExprKind::PropertyStringAccess {
            object: child("left")?,
            property: ident_attr(node, "right")?,
        },
        "StaticPropertyAccess" => ExprKind::StaticPropertyAccess {
            class: ident_attr(node, "left")?,
            property: ident_attr(node, "right")?,
        },
        "StaticConstantAccess" => ExprKind::StaticConstantAccess {
            class: ident_attr(node, "left")?,
            constant: ident_attr(node, "right")?,
        },
        "ArrayAccess" => ExprKind::ArrayAccess {
            array: child("left")?,
            index: child("right")?,
        },
        "Mcall" => ExprKind::MethodCall {
            receiver: child("variable")?,
            method: node.str_attr("name")?.to_string(),
            args: decode_arguments(node)?,
        },
        "Fcall" => ExprKind::FunctionCall {
            name: node.str_attr("name")?.to_string(),
            args: decode_arguments(node)?,
        },
        "Scall" => ExprKind::StaticCall {
            class: ident_attr(node, "class")?,
            method: node.str_attr("name")?.to_string(),
            args: decode_arguments(node)?,
        },
        "New" => ExprKind::New {
            class: ident_attr(node, "class")?,
            dynamic: node.bool_attr("dynamic")?,
            args: decode_arguments(node)?,
        },
        "NewType" => ExprKind::NewType {
            type_name: match node.str_attr("internal-type")? {
                "array" => NewTypeKind::Array,
                "string" => NewTypeKind::String,
                _ => return Err(node.malformed("internal-type")),
            },
        },
        "Cast" => ExprKind::Cast {
            target: ident_attr(node, "left")?,
            expr: child("right")?,
        },
        "TypeHint" => ExprKind::TypeHint {
            hint: ident_attr(node, "left")?,
            expr: child("right")?,
        },
        "Ternary" => ExprKind::Ternary {
            condition: child("left")?,
            then: child("right")?,
            otherwise: child("extra")?,
        },
        "Closure" => {
            let (params, body) = if node.has("parameters") || node.has("statements") {
                ("parameters", "statements")
            } else {
                ("left", "right")
            };
            ExprKind::Closure {
                parameters: decode_parameters(node, params)?,
                body: decode_block(node, body)?,
            }
        }
        "ClosureArrow" => ExprKind::ClosureArrow {
            parameter: ident_attr(node, "left")?,
            body: child("right")?,
        },
        "Fetch" => ExprKind::Fetch {
            variable: ident_attr(node, "left")?,
            expr: child("right")?,
        },
        _ => {
            if let Some(op) = UnaryOp::from_kind(&node.kind) {
                ExprKind::Unary {
                    op,
                    operand: child("left")?,
                }
            } else if let Some(op) = BinaryOp::from_kind(&node.kind) {
                ExprKind::Binary {
                    op,
                    left: child("left")?,
                    right: child("right")?,
                }
            } else {
                return Err(no_handler(EXPRESSION, node));
            }
        }
    };
    Ok(Expr::at(kind, node.location()))
}

/// Call arguments arrive as `{"parameter": expr}` wrappers.
fn decode_arguments(node: &Node) -> Result<Vec<Expr>, CoreError> {
    node.records_attr("parameters", "argument")?
        .iter()
        .map(|argument| decode_expr(&argument.node_attr("parameter")?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::decode_ir;
    use serde_json::json;
    use std::path::Path;

    fn var(name: &str) -> Value {
        json!({"type": "variable", "value": name})
    }

    fn int(value: i64) -> Value {
        json!({"type": "int", "value": value.to_string()})
    }

    fn decode(value: Value) -> Result<Program, CoreError> {
        let nodes = decode_ir(&value.to_string(), Path::new("t.js"))?;
        decode_program(&nodes)
    }

    fn method(statements: Value) -> Value {
        json!([{
            "type": "class",
            "name": "A",
            "definition": {
                "methods": [{
                    "type": "method",
                    "visibility": ["public"],
                    "name": "run",
                    "statements": statements
                }]
            }
        }])
    }

    fn first_statement(program: &Program) -> &Stmt {
        match &program.entries[0] {
            TopLevel::Class(class) => &class.methods[0].statements.as_ref().expect("body")[0],
            other => panic!("unexpected entry {other:?}"),
        }
    }

    #[test]
    fn decodes_class_definition() {
        let program = decode(json!([
            {"type": "namespace", "name": "App"},
            {
                "type": "class",
                "name": "Box",
                "abstract": 0,
                "final": 1,
                "extends": "Base",
                "implements": [var("Countable")],
                "definition": {
                    "constants": [{"type": "const", "name": "MAX", "default": int(3)}],
                    "properties": [{
                        "type": "property",
                        "visibility": ["protected"],
                        "name": "size",
                        "default": int(0),
                        "shortcuts": [{"type": "shortcut", "name": "get"}]
                    }],
                    "methods": [{
                        "type": "method",
                        "visibility": ["abstract", "public"],
                        "name": "open",
                        "parameters": [{"type": "parameter", "name": "force", "reference": 0}]
                    }]
                }
            }
        ]))
        .expect("decode");
        let TopLevel::Class(class) = &program.entries[1] else {
            panic!("expected class");
        };
        assert!(class.is_final);
        assert_eq!(class.extends.as_deref(), Some("Base"));
        assert_eq!(class.implements, vec!["Countable".to_string()]);
        assert_eq!(class.constants[0].name, "MAX");
        assert_eq!(class.properties[0].shortcuts[0].name, "get");
        assert_eq!(class.methods[0].parameters[0].name, "force");
        assert!(class.methods[0].statements.is_none());
    }

    #[test]
    fn decodes_let_assignments() {
        let program = decode(method(json!([{
            "type": "let",
            "assignments": [
                {
                    "assign-type": "object-property-array-index",
                    "operator": "assign",
                    "variable": "this",
                    "property": "items",
                    "index-expr": [int(0)],
                    "expr": int(1)
                },
                {"assign-type": "incr", "variable": "i"}
            ]
        }])))
        .expect("decode");
        let StmtKind::Let(assignments) = &first_statement(&program).kind else {
            panic!("expected let");
        };
        assert_eq!(assignments[0].kind, AssignKind::ObjectPropertyArrayIndex);
        assert_eq!(assignments[0].property.as_deref(), Some("items"));
        assert_eq!(assignments[0].index.len(), 1);
        assert_eq!(assignments[1].kind, AssignKind::Incr);
        assert!(assignments[1].expr.is_none());
    }

    #[test]
    fn unknown_assignment_and_operator() {
        let err = decode(method(json!([{
            "type": "let",
            "assignments": [{"assign-type": "swap", "variable": "a", "expr": int(1)}]
        }])))
        .unwrap_err();
        assert!(err.to_string().starts_with("unknown assignment: swap"));

        let err = decode(method(json!([{
            "type": "let",
            "assignments": [{
                "assign-type": "variable",
                "operator": "pow-assign",
                "variable": "a",
                "expr": int(1)
            }]
        }])))
        .unwrap_err();
        assert!(matches!(err, CoreError::UnknownOperator { ref operator, .. } if operator == "pow-assign"));
    }

    #[test]
    fn increments_must_not_carry_a_value() {
        let err = decode(method(json!([{
            "type": "let",
            "assignments": [{"assign-type": "decr", "variable": "a", "expr": int(1)}]
        }])))
        .unwrap_err();
        assert!(matches!(err, CoreError::MalformedNode { ref attribute, .. } if attribute == "expr"));

        let err = decode(method(json!([{
            "type": "let",
            "assignments": [{"assign-type": "variable", "variable": "a"}]
        }])))
        .unwrap_err();
        assert!(matches!(err, CoreError::MalformedNode { .. }));
    }

    #[test]
    fn unknown_kinds_name_their_family() {
        let err = decode(method(json!([{"type": "goto", "line": 3}]))).unwrap_err();
        assert_eq!(err.to_string(), "handler for statement kind [Goto] not found at :3");

        let err = decode(method(json!([{
            "type": "return",
            "expr": {"type": "spaceship-op", "left": int(1), "right": int(2)}
        }])))
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::NoHandler { family: "expression", ref kind, .. } if kind == "SpaceshipOp"
        ));

        let err = decode(json!([{"type": "trait", "name": "T"}])).unwrap_err();
        assert!(matches!(err, CoreError::NoHandler { family: "top-level", .. }));
    }

    #[test]
    fn decodes_operators_and_calls() {
        let program = decode(method(json!([{
            "type": "return",
            "expr": {
                "type": "not-identical",
                "left": {
                    "type": "mcall",
                    "variable": {"type": "string", "value": "abc"},
                    "name": "length",
                    "parameters": []
                },
                "right": {"type": "bitwise_not", "left": var("mask")}
            }
        }])))
        .expect("decode");
        let StmtKind::Return(Some(expr)) = &first_statement(&program).kind else {
            panic!("expected return");
        };
        let ExprKind::Binary { op, left, right } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::NotIdentical);
        assert!(matches!(left.kind, ExprKind::MethodCall { .. }));
        assert!(matches!(
            right.kind,
            ExprKind::Unary {
                op: UnaryOp::BitwiseNot,
                ..
            }
        ));
    }

    #[test]
    fn decodes_control_flow() {
        let program = decode(method(json!([{
            "type": "if",
            "expr": {"type": "fetch", "left": var("v"), "right": var("data")},
            "statements": [{"type": "break"}],
            "elseif_statements": [{"expr": {"type": "bool", "value": "true"}, "statements": []}],
            "else_statements": [{
                "type": "switch",
                "expr": var("v"),
                "clauses": [
                    {"type": "case", "expr": int(1), "statements": []},
                    {"type": "default", "statements": [{"type": "continue"}]}
                ]
            }]
        }])))
        .expect("decode");
        let StmtKind::If {
            condition,
            else_ifs,
            else_branch,
            ..
        } = &first_statement(&program).kind
        else {
            panic!("expected if");
        };
        assert!(matches!(condition.kind, ExprKind::Fetch { ref variable, .. } if variable == "v"));
        assert!(matches!(else_ifs[0].condition.kind, ExprKind::Bool(true)));
        let else_branch = else_branch.as_ref().expect("else");
        assert!(matches!(else_branch[0].kind, StmtKind::Switch { ref clauses, .. } if clauses.len() == 2));
    }

    #[test]
    fn fetch_statement_becomes_if() {
        let program = decode(method(json!([{
            "type": "fetch",
            "expr": {"type": "fetch", "left": var("v"), "right": var("data")}
        }])))
        .expect("decode");
        let StmtKind::If {
            condition,
            then_branch,
            else_ifs,
            else_branch,
        } = &first_statement(&program).kind
        else {
            panic!("expected if");
        };
        assert!(matches!(condition.kind, ExprKind::Fetch { ref variable, .. } if variable == "v"));
        assert!(then_branch.is_empty() && else_ifs.is_empty() && else_branch.is_none());
    }

    #[test]
    fn bad_clause_and_new_type() {
        let err = decode(method(json!([{
            "type": "switch",
            "expr": var("v"),
            "clauses": [{"type": "otherwise", "statements": []}]
        }])))
        .unwrap_err();
        assert!(matches!(err, CoreError::NoHandler { family: "clause", .. }));

        let err = decode(method(json!([{
            "type": "return",
            "expr": {"type": "new-type", "internal-type": "object"}
        }])))
        .unwrap_err();
        assert!(matches!(err, CoreError::MalformedNode { ref attribute, .. } if attribute == "internal-type"));
    }

    #[test]
    fn stage_rejects_wrong_unit() {
        let mut stage = Compact::new();
        let err = stage.compile(Unit::Source(String::new())).unwrap_err();
        assert!(matches!(err, CoreError::UnexpectedUnit { stage: "compact", .. }));
    }
}
