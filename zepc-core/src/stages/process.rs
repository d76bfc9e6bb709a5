//! `Process`: AST to AST rewrites that run before emission.

use tracing::debug;

use crate::ast::{
    AssignKind, AssignOp, Assignment, ClassDef, Expr, ExprKind, Method, Parameter, Program,
    Property, Shortcut, Stmt, StmtKind, TopLevel,
};
use crate::error::CoreError;
use crate::stage::{Stage, Unit, unexpected};

/// One rewrite applied to the whole program.
pub trait Phase {
    fn name(&self) -> &'static str;
    fn run(&mut self, program: &mut Program) -> Result<(), CoreError>;
}

pub struct Process {
    phases: Vec<Box<dyn Phase>>,
}

impl Default for Process {
    fn default() -> Self {
        Self::new()
    }
}

impl Process {
    pub fn new() -> Self {
        Process {
            phases: vec![Box::new(InlineComments), Box::new(InlineShortcuts)],
        }
    }

    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|phase| phase.name()).collect()
    }
}

impl Stage for Process {
    fn name(&self) -> &'static str {
        "process"
    }

    fn compile(&mut self, unit: Unit) -> Result<Unit, CoreError> {
        let mut program = match unit {
            Unit::Ast(program) => program,
            other => return Err(unexpected(self.name(), &other)),
        };
        for phase in &mut self.phases {
            debug!(phase = phase.name(), "running phase");
            phase.run(&mut program)?;
        }
        Ok(Unit::Ast(program))
    }
}

/// A comment directly in front of a class or interface becomes its
/// docblock, unless it already has one.
pub struct InlineComments;

impl Phase for InlineComments {
    fn name(&self) -> &'static str {
        "inline-comments"
    }

    fn run(&mut self, program: &mut Program) -> Result<(), CoreError> {
        let mut entries = Vec::with_capacity(program.entries.len());
        let mut pending = None;
        for entry in program.entries.drain(..) {
            let entry = match (entry, pending.take()) {
                (TopLevel::Comment(comment), previous) => {
                    entries.extend(previous.map(TopLevel::Comment));
                    pending = Some(comment);
                    continue;
                }
                (TopLevel::Class(mut class), Some(comment)) if class.docblock.is_none() => {
                    class.docblock = Some(comment.text);
                    TopLevel::Class(class)
                }
                (TopLevel::Interface(mut interface), Some(comment))
                    if interface.docblock.is_none() =>
                {
                    interface.docblock = Some(comment.text);
                    TopLevel::Interface(interface)
                }
                (entry, previous) => {
                    entries.extend(previous.map(TopLevel::Comment));
                    entry
                }
            };
            entries.push(entry);
        }
        entries.extend(pending.map(TopLevel::Comment));
        program.entries = entries;
        Ok(())
    }
}

/// Expands property shortcuts (`get`, `set`, `toString`) into public
/// methods appended to the class.
pub struct InlineShortcuts;

impl Phase for InlineShortcuts {
    fn name(&self) -> &'static str {
        "inline-shortcuts"
    }

    fn run(&mut self, program: &mut Program) -> Result<(), CoreError> {
        for entry in &mut program.entries {
            if let TopLevel::Class(class) = entry {
                expand_class(class)?;
            }
        }
        Ok(())
    }
}

fn expand_class(class: &mut ClassDef) -> Result<(), CoreError> {
    for index in 0..class.properties.len() {
        let shortcuts = std::mem::take(&mut class.properties[index].shortcuts);
        let property = &class.properties[index];
        let mut seen: Vec<&str> = Vec::new();
        let mut added = Vec::with_capacity(shortcuts.len());
        for shortcut in &shortcuts {
            if seen.contains(&shortcut.name.as_str()) {
                return Err(CoreError::Shortcut(format!(
                    "Shortcut [{}] is used multiple times in Property [{}]",
                    shortcut.name, property.name
                )));
            }
            seen.push(&shortcut.name);
            added.push(expand_shortcut(property, shortcut)?);
        }
        for method in added {
            if class.methods.iter().any(|existing| existing.name == method.name) {
                return Err(CoreError::Shortcut(format!(
                    "Class Method [{}] already exists",
                    method.name
                )));
            }
            class.methods.push(method);
        }
    }
    Ok(())
}

fn expand_shortcut(property: &Property, shortcut: &Shortcut) -> Result<Method, CoreError> {
    let location = shortcut.location.clone();
    let stmt = |kind| Stmt {
        kind,
        location: location.clone(),
    };
    let this = Expr::at(ExprKind::Variable("this".to_string()), location.clone());
    let read = Expr::at(
        ExprKind::PropertyAccess {
            object: Box::new(this),
            property: property.name.clone(),
        },
        location.clone(),
    );
    let (name, parameters, statements) = match shortcut.name.as_str() {
        "get" => (
            format!("get{}", upper_first(&property.name)),
            Vec::new(),
            vec![stmt(StmtKind::Return(Some(read)))],
        ),
        "toString" => (
            "__toString".to_string(),
            Vec::new(),
            vec![stmt(StmtKind::Return(Some(read)))],
        ),
        "set" => {
            let parameter = format!("__p_{}__", property.name);
            let assign = Assignment {
                kind: AssignKind::ObjectProperty,
                operator: Some(AssignOp::Assign),
                variable: "this".to_string(),
                property: Some(property.name.clone()),
                index: Vec::new(),
                expr: Some(Expr::at(
                    ExprKind::Variable(parameter.clone()),
                    location.clone(),
                )),
                location: location.clone(),
            };
            (
                format!("set{}", upper_first(&property.name)),
                vec![Parameter {
                    name: parameter,
                    default: None,
                    reference: false,
                }],
                vec![stmt(StmtKind::Let(vec![assign]))],
            )
        }
        other => {
            return Err(CoreError::Shortcut(format!(
                "Shortcut [{other}] is not supported in Property [{}]",
                property.name
            )));
        }
    };
    Ok(Method {
        visibility: vec!["public".to_string()],
        name,
        parameters,
        statements: Some(statements),
        docblock: None,
        location,
    })
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
