use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Position of a node in the original `.zep` source, as reported by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl Location {
    pub fn is_known(&self) -> bool {
        self.file.is_some() || self.line.is_some()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_known() {
            return Ok(());
        }
        f.write_str(" at ")?;
        if let Some(file) = &self.file {
            f.write_str(file)?;
        }
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        if let Some(column) = self.column {
            write!(f, ":{column}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("stage with index [{0}] doesn't exist in the compiler")]
    StageNotFound(usize),
    #[error("parser binary {0} was not found")]
    MissingParser(PathBuf),
    #[error("parser exited with {status} while parsing {source_path}")]
    ParserFailed { source_path: PathBuf, status: String },
    #[error("source file {0} doesn't exist")]
    MissingSource(PathBuf),
    #[error("failed to parse source file {path}: {reason}")]
    InvalidIr { path: PathBuf, reason: String },
    #[error("handler for {family} kind [{kind}] not found{location}")]
    NoHandler {
        family: &'static str,
        kind: String,
        location: Location,
    },
    #[error("node [{kind}] is missing or has an invalid attribute [{attribute}]{location}")]
    MalformedNode {
        kind: String,
        attribute: String,
        location: Location,
    },
    #[error("unknown assignment: {variant}{location}")]
    UnknownAssignment { variant: String, location: Location },
    #[error("unknown assignment operator [{operator}]{location}")]
    UnknownOperator { operator: String, location: Location },
    #[error("method [{method}] does not exist for [{receiver}] receiver type{location}")]
    UnknownBuiltinMethod {
        method: String,
        receiver: String,
        location: Location,
    },
    #[error("resolved expression is not valid{location}")]
    InvalidExpression { location: Location },
    #[error("cannot mutate undeclared variable [{name}]{location}")]
    UndeclaredVariable { name: String, location: Location },
    #[error("invalid shortcut: {0}")]
    Shortcut(String),
    #[error("extension globals are not initialized")]
    GlobalsNotInitialized,
    #[error("extension global [{name}] is not defined{location}")]
    UnknownGlobal { name: String, location: Location },
    #[error("stage [{stage}] cannot compile a unit in the {found} form")]
    UnexpectedUnit { stage: &'static str, found: &'static str },
}

impl CoreError {
    /// Whether the error only affects the file being compiled. Everything else
    /// is fatal to the whole run.
    pub fn is_unit_fatal(&self) -> bool {
        !matches!(
            self,
            CoreError::StageNotFound(_)
                | CoreError::MissingParser(_)
                | CoreError::GlobalsNotInitialized
                | CoreError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_location_suffix() {
        let err = CoreError::NoHandler {
            family: "statement",
            kind: "Goto".to_string(),
            location: Location {
                file: Some("test/flow.zep".to_string()),
                line: Some(12),
                column: Some(4),
            },
        };
        assert_eq!(
            err.to_string(),
            "handler for statement kind [Goto] not found at test/flow.zep:12:4"
        );
    }

    #[test]
    fn omits_unknown_location() {
        let err = CoreError::InvalidExpression {
            location: Location::default(),
        };
        assert_eq!(err.to_string(), "resolved expression is not valid");
    }

    #[test]
    fn classifies_configuration_errors() {
        assert!(!CoreError::StageNotFound(3).is_unit_fatal());
        assert!(
            CoreError::UnknownAssignment {
                variant: "swap".to_string(),
                location: Location::default(),
            }
            .is_unit_fatal()
        );
    }
}
