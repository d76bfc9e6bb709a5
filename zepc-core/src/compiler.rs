//! Compilation driver: parser invocation, cache checks and the stage
//! pipeline, file after file.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cache::CacheRecord;
use crate::config::CompilerOptions;
use crate::error::CoreError;
use crate::fs::{FileSystem, RootKind};
use crate::ir::decode_ir;
use crate::pipeline::StagePipeline;
use crate::stage::Unit;

/// Extension of the source files picked up by [`Compiler::files`].
pub const SOURCE_EXTENSION: &str = "zep";

/// Outcome of [`Compiler::file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFile {
    pub source: PathBuf,
    pub output: PathBuf,
    /// The parser ran for this file.
    pub reparsed: bool,
    /// `None` when the existing output was up to date.
    pub php: Option<String>,
}

/// Result of a directory build with `keep_going`.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub compiled: Vec<CompiledFile>,
    pub failures: Vec<(PathBuf, CoreError)>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Compiler {
    fs: Box<dyn FileSystem>,
    pipeline: StagePipeline,
    options: CompilerOptions,
    initialized: bool,
}

impl Compiler {
    /// Compiler with the standard `Compact, Process, EmitCode` pipeline.
    pub fn new(fs: Box<dyn FileSystem>, options: CompilerOptions) -> Self {
        let pipeline = StagePipeline::standard(&options);
        Self::with_pipeline(fs, pipeline, options)
    }

    pub fn with_pipeline(
        fs: Box<dyn FileSystem>,
        pipeline: StagePipeline,
        options: CompilerOptions,
    ) -> Self {
        Compiler {
            fs,
            pipeline,
            options,
            initialized: false,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn pipeline(&self) -> &StagePipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut StagePipeline {
        &mut self.pipeline
    }

    /// Resolves the parser binary, failing when it is not installed.
    pub fn parser(&self) -> Result<PathBuf, CoreError> {
        let parser = self
            .fs
            .realpath(&self.options.parser_path(), RootKind::System);
        if self.fs.exists(&parser) {
            Ok(parser)
        } else {
            Err(CoreError::MissingParser(parser))
        }
    }

    /// Compiles one source file, reusing the cached IR and PHP when they are
    /// newer than their inputs.
    pub fn file(&mut self, path: &Path) -> Result<CompiledFile, CoreError> {
        let parser = self.parser()?;
        self.compile_source(path, &parser)
    }

    fn compile_source(&mut self, path: &Path, parser: &Path) -> Result<CompiledFile, CoreError> {
        let source = self.fs.realpath(path, RootKind::Input);
        if !self.fs.exists(&source) {
            return Err(CoreError::MissingSource(source));
        }
        let record = CacheRecord::load(self.fs.as_ref(), &source, parser);

        let mut changed = false;
        if record.needs_reparse() {
            debug!(source = %source.display(), ir = %record.ir_path.display(), "parsing");
            let status = self.fs.system(parser, &[source.as_path()], &record.ir_path)?;
            if !status.success() {
                // A truncated IR would be newer than the source and pass
                // the next cache check.
                self.fs.remove(&record.ir_path)?;
                return Err(CoreError::ParserFailed {
                    source_path: source,
                    status: status.describe(),
                });
            }
            changed = true;
        }

        if !record.needs_recompile(changed) {
            debug!(source = %source.display(), "output is up to date");
            return Ok(CompiledFile {
                source,
                output: record.output_path,
                reparsed: false,
                php: None,
            });
        }

        let text = self.fs.read(&record.ir_path)?;
        let nodes = decode_ir(&text, &record.ir_path)?;
        if !self.initialized {
            self.pipeline.initialize()?;
            self.initialized = true;
        }
        let result = self.pipeline.compile(Unit::Ir(nodes));
        self.pipeline.reset();
        let unit = result?;
        let form = unit.form();
        let php = unit.into_source().ok_or(CoreError::UnexpectedUnit {
            stage: "output",
            found: form,
        })?;
        self.fs.write(&record.output_path, &php)?;
        info!(
            source = %source.display(),
            output = %record.output_path.display(),
            "compiled"
        );
        Ok(CompiledFile {
            source,
            output: record.output_path,
            reparsed: changed,
            php: Some(php),
        })
    }

    /// All `.zep` files under the input root, in file-name order.
    pub fn files(&self) -> Result<Vec<PathBuf>, CoreError> {
        let mut files = Vec::new();
        self.fs.enumerate_files(&mut |path| {
            if path
                .extension()
                .is_some_and(|ext| ext == SOURCE_EXTENSION)
            {
                files.push(path.to_path_buf());
            }
            true
        })?;
        Ok(files)
    }

    /// Compiles every source file. Without `keep_going` the first error is
    /// returned; with it, errors confined to one file are collected and the
    /// build moves on.
    pub fn compile_all(&mut self, keep_going: bool) -> Result<BuildReport, CoreError> {
        let parser = self.parser()?;
        let mut report = BuildReport::default();
        for file in self.files()? {
            match self.compile_source(&file, &parser) {
                Ok(compiled) => report.compiled.push(compiled),
                Err(err) if keep_going && err.is_unit_fatal() => {
                    warn!(source = %file.display(), error = %err, "skipping file");
                    report.failures.push((file, err));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(report)
    }
}
