//! `let` statement compilation.
//!
//! Every assignment variant turns into one PHP statement. The variant
//! decides the target path, the symbol binding that must happen before the
//! write, and whether a right-hand side is compiled at all.

use crate::ast::{AssignKind, AssignOp, Assignment, Binding};
use crate::error::CoreError;

use super::Emitter;
use super::expr::{CompiledExpr, ExprContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledAssignment {
    pub code: String,
    /// The compiled right-hand side; `None` for increments and decrements.
    pub expr: Option<CompiledExpr>,
}

pub struct LetCompiler<'e, 'a> {
    emitter: &'e mut Emitter<'a>,
}

impl<'e, 'a> LetCompiler<'e, 'a> {
    pub fn new(emitter: &'e mut Emitter<'a>) -> Self {
        LetCompiler { emitter }
    }

    /// Compiles the assignments of one `let` in order. The first failure
    /// aborts the statement.
    pub fn compile(
        &mut self,
        assignments: &[Assignment],
    ) -> Result<Vec<CompiledAssignment>, CoreError> {
        assignments
            .iter()
            .map(|assignment| self.compile_assignment(assignment))
            .collect()
    }

    pub fn compile_assignment(
        &mut self,
        assignment: &Assignment,
    ) -> Result<CompiledAssignment, CoreError> {
        let kind = assignment.kind;
        match kind.binding() {
            Binding::ForWrite => {
                self.emitter
                    .symbols
                    .variable_for_write(&assignment.variable, &assignment.location);
            }
            Binding::ForUpdate => {
                self.emitter
                    .symbols
                    .variable_for_update(&assignment.variable, &assignment.location)?;
            }
            Binding::None => {}
        }

        let target = self.target(assignment)?;
        if !kind.takes_expression() {
            return Ok(CompiledAssignment {
                code: format!("{target};"),
                expr: None,
            });
        }

        let value = assignment
            .expr
            .as_ref()
            .ok_or_else(|| CoreError::MalformedNode {
                kind: kind.name().to_string(),
                attribute: "expr".to_string(),
                location: assignment.location.clone(),
            })?;
        let operator = assignment.operator.unwrap_or(AssignOp::Assign);
        let plain = kind == AssignKind::Variable && operator == AssignOp::Assign;
        let context = ExprContext {
            expect_return: true,
            target: plain.then_some(assignment.variable.as_str()),
            read_only: false,
        };
        let compiled = self.emitter.compile_expr(value, &context)?;
        if compiled.code.trim().is_empty() {
            return Err(CoreError::InvalidExpression {
                location: assignment.location.clone(),
            });
        }
        Ok(CompiledAssignment {
            code: format!("{target} {} {};", operator.symbol(), compiled.code),
            expr: Some(compiled),
        })
    }

    /// Left-hand side of the PHP statement. For increments and decrements it
    /// already carries the operator.
    fn target(&mut self, assignment: &Assignment) -> Result<String, CoreError> {
        use AssignKind::*;
        let variable = &assignment.variable;
        let property = || {
            assignment
                .property
                .as_deref()
                .ok_or_else(|| CoreError::MalformedNode {
                    kind: assignment.kind.name().to_string(),
                    attribute: "property".to_string(),
                    location: assignment.location.clone(),
                })
        };
        let index = if assignment.kind.takes_index() {
            self.index_path(assignment)?
        } else {
            String::new()
        };
        Ok(match assignment.kind {
            Variable => format!("${variable}"),
            VariableAppend => format!("${variable}[]"),
            ArrayIndex => format!("${variable}{index}"),
            ArrayIndexAppend => format!("${variable}{index}[]"),
            ObjectProperty => format!("${variable}->{}", property()?),
            ObjectPropertyAppend => format!("${variable}->{}[]", property()?),
            ObjectPropertyArrayIndex => format!("${variable}->{}{index}", property()?),
            ObjectPropertyArrayIndexAppend => format!("${variable}->{}{index}[]", property()?),
            VariableDynamicObjectProperty => format!("${variable}->{{${}}}", property()?),
            StringDynamicObjectProperty => format!("${variable}->{{\"{}\"}}", property()?),
            StaticProperty => format!("{variable}::${}", property()?),
            StaticPropertyAppend => format!("{variable}::${}[]", property()?),
            StaticPropertyArrayIndex => format!("{variable}::${}{index}", property()?),
            StaticPropertyArrayIndexAppend => format!("{variable}::${}{index}[]", property()?),
            Incr => format!("${variable}++"),
            Decr => format!("${variable}--"),
            ObjectPropertyIncr => format!("${variable}->{}++", property()?),
            ObjectPropertyDecr => format!("${variable}->{}--", property()?),
            DynamicVariable => format!("$${variable}"),
            DynamicVariableString => format!("${{\"{variable}\"}}"),
        })
    }

    fn index_path(&mut self, assignment: &Assignment) -> Result<String, CoreError> {
        let mut path = String::new();
        for step in &assignment.index {
            path.push('[');
            path.push_str(&self.emitter.render_expr(step)?);
            path.push(']');
        }
        Ok(path)
    }
}
