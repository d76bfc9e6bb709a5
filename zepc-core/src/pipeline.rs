//! Ordered list of stages applied to every compilation unit.

use tracing::{debug, info_span};

use crate::config::CompilerOptions;
use crate::error::CoreError;
use crate::stage::{Stage, Unit};
use crate::stages::{Compact, EmitCode, Process};

#[derive(Default)]
pub struct StagePipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl StagePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Compact`, `Process`, `EmitCode`.
    pub fn standard(options: &CompilerOptions) -> Self {
        let mut pipeline = Self::new();
        pipeline
            .add_stage(Box::new(Compact::new()))
            .add_stage(Box::new(Process::new()))
            .add_stage(Box::new(EmitCode::new(
                options.emitter.clone(),
                options.globals.clone(),
            )));
        pipeline
    }

    pub fn add_stage(&mut self, stage: Box<dyn Stage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Removes the stage at `index`. An out-of-range index leaves the list
    /// untouched.
    pub fn remove_stage(&mut self, index: usize) -> Result<Box<dyn Stage>, CoreError> {
        if index >= self.stages.len() {
            return Err(CoreError::StageNotFound(index));
        }
        Ok(self.stages.remove(index))
    }

    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn initialize(&mut self) -> Result<(), CoreError> {
        for stage in &mut self.stages {
            stage.initialize()?;
        }
        Ok(())
    }

    /// Runs `unit` through every stage in order, stopping at the first error.
    pub fn compile(&mut self, unit: Unit) -> Result<Unit, CoreError> {
        let mut unit = unit;
        for stage in &mut self.stages {
            let span = info_span!("stage", name = stage.name());
            let _guard = span.enter();
            debug!(input = unit.form(), "running stage");
            unit = stage.compile(unit)?;
        }
        Ok(unit)
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}
