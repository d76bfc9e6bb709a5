use std::path::PathBuf;

use crate::globals::ExtensionGlobals;

/// Largest indent unit accepted for space indentation.
pub const MAX_INDENT_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStyle {
    Spaces(usize),
    Tabs,
}

/// Layout of the generated PHP text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    pub indent: IndentStyle,
    /// Nesting deeper than this is rendered at this depth.
    pub max_depth: usize,
    /// Opening brace of class, interface and function bodies on its own line.
    /// Control structures always keep it on the header line.
    pub brace_on_new_line: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        EmitterConfig {
            indent: IndentStyle::Spaces(2),
            max_depth: 10,
            brace_on_new_line: true,
        }
    }
}

impl EmitterConfig {
    pub fn indent_unit(&self) -> String {
        match self.indent {
            IndentStyle::Spaces(size) => " ".repeat(size.min(MAX_INDENT_SIZE)),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }
}

/// Everything a compilation run needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Directory scanned for `.zep` files.
    pub input_root: PathBuf,
    /// Directory receiving the IR and PHP artifacts.
    pub output_root: PathBuf,
    /// Installation directory holding `bin/zephir-parser`.
    pub system_root: PathBuf,
    /// Explicit parser binary, overriding the one under `system_root`.
    pub parser: Option<PathBuf>,
    pub emitter: EmitterConfig,
    pub globals: ExtensionGlobals,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            input_root: PathBuf::from("."),
            output_root: PathBuf::from("build"),
            system_root: PathBuf::from("."),
            parser: None,
            emitter: EmitterConfig::default(),
            globals: ExtensionGlobals::new(),
        }
    }
}

impl CompilerOptions {
    pub fn parser_path(&self) -> PathBuf {
        match &self.parser {
            Some(path) => path.clone(),
            None => self.system_root.join(default_parser_relative()),
        }
    }
}

fn default_parser_relative() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("bin").join("zephir-parser.exe")
    } else {
        PathBuf::from("bin").join("zephir-parser")
    }
}
