use crate::config::EmitterConfig;
use crate::emit::emit_program;
use crate::error::CoreError;
use crate::globals::ExtensionGlobals;
use crate::stage::{Stage, Unit, unexpected};

/// Final stage: renders the AST as PHP text.
pub struct EmitCode {
    config: EmitterConfig,
    globals: ExtensionGlobals,
}

impl EmitCode {
    pub fn new(config: EmitterConfig, globals: ExtensionGlobals) -> Self {
        EmitCode { config, globals }
    }
}

impl Stage for EmitCode {
    fn name(&self) -> &'static str {
        "emit-code"
    }

    fn compile(&mut self, unit: Unit) -> Result<Unit, CoreError> {
        match unit {
            Unit::Ast(program) => Ok(Unit::Source(emit_program(
                &program,
                &self.config,
                &self.globals,
            )?)),
            other => Err(unexpected(self.name(), &other)),
        }
    }
}
