//! Core of the zepc Zephir-to-PHP compiler.
//!
//! The pipeline is roughly:
//!
//!   source .zep
//!     -> zephir-parser  (external binary, JSON IR cached on disk)
//!     -> Compact        (IR nodes -> typed AST)
//!     -> Process        (docblocks, property shortcuts)
//!     -> EmitCode       (PHP text)
//!
//! Higher-level tools (the CLI) should drive [`Compiler`] rather than
//! reimplementing the cache and stage handling.

// ---------------------------------------------------------------------
// Error handling and configuration
// ---------------------------------------------------------------------

pub mod error;
pub mod config;
pub mod globals;

// ---------------------------------------------------------------------
// Front-end: parser IR and the typed AST
// ---------------------------------------------------------------------

pub mod ir;
pub mod ast;

// ---------------------------------------------------------------------
// Stages and the pipeline that runs them
// ---------------------------------------------------------------------

pub mod stage;
pub mod stages;
pub mod pipeline;

// ---------------------------------------------------------------------
// Back-end: PHP emission
// ---------------------------------------------------------------------

pub mod symbols;
pub mod builtins;
pub mod emit;

// ---------------------------------------------------------------------
// Driver: file system, incremental cache, compiler orchestration
// ---------------------------------------------------------------------

pub mod fs;
pub mod cache;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{BuildReport, CompiledFile, Compiler};
pub use config::{CompilerOptions, EmitterConfig, IndentStyle};
pub use error::{CoreError, Location};
pub use fs::{FileSystem, HardDisk, RootKind};
pub use globals::ExtensionGlobals;
pub use pipeline::StagePipeline;
pub use stage::{Stage, Unit};
