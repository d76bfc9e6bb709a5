//! The three standard stages of the compiler.

pub mod compact;
pub mod emit_code;
pub mod process;

pub use compact::Compact;
pub use emit_code::EmitCode;
pub use process::{InlineComments, InlineShortcuts, Phase, Process};
