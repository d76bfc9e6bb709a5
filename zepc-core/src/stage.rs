use crate::ast::Program;
use crate::error::CoreError;
use crate::ir::Node;

/// Value threaded through the stage pipeline for one source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    /// Raw parser output.
    Ir(Vec<Node>),
    Ast(Program),
    /// Rendered PHP text.
    Source(String),
}

impl Unit {
    pub fn form(&self) -> &'static str {
        match self {
            Unit::Ir(_) => "ir",
            Unit::Ast(_) => "ast",
            Unit::Source(_) => "source",
        }
    }

    pub fn into_source(self) -> Option<String> {
        match self {
            Unit::Source(text) => Some(text),
            _ => None,
        }
    }
}

/// One transformation step of the compiler.
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Called once before the first unit.
    fn initialize(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    fn compile(&mut self, unit: Unit) -> Result<Unit, CoreError>;

    /// Drops per-file state so the stage can be reused for the next file.
    fn reset(&mut self) {}
}

pub(crate) fn unexpected(stage: &'static str, unit: &Unit) -> CoreError {
    CoreError::UnexpectedUnit {
        stage,
        found: unit.form(),
    }
}
