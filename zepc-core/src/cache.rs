//! Incremental rebuild decisions.
//!
//! Each source file maps to an IR file (`<base>.js`) and a PHP file
//! (`<base>.php`) in the output root. Whether the parser has to run again
//! and whether the PHP has to be regenerated is decided from modification
//! times alone, recomputed on every run.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::fs::{FileSystem, RootKind};

/// Flattens an absolute source path into a single file name.
pub fn output_base_name(source: &Path) -> String {
    source
        .to_string_lossy()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub source: PathBuf,
    pub ir_path: PathBuf,
    pub output_path: PathBuf,
    pub source_time: Option<SystemTime>,
    pub ir_time: Option<SystemTime>,
    pub output_time: Option<SystemTime>,
    pub parser_time: Option<SystemTime>,
}

impl CacheRecord {
    /// `source` must already be resolved to its absolute path.
    pub fn load(fs: &dyn FileSystem, source: &Path, parser: &Path) -> Self {
        let base = output_base_name(source);
        let ir_path = fs.realpath(Path::new(&format!("{base}.js")), RootKind::Output);
        let output_path = fs.realpath(Path::new(&format!("{base}.php")), RootKind::Output);
        CacheRecord {
            source: source.to_path_buf(),
            source_time: fs.modification_time(source),
            ir_time: fs.modification_time(&ir_path),
            output_time: fs.modification_time(&output_path),
            parser_time: fs.modification_time(parser),
            ir_path,
            output_path,
        }
    }

    /// The IR is missing or older than the source or the parser binary.
    pub fn needs_reparse(&self) -> bool {
        let Some(ir) = self.ir_time else {
            return true;
        };
        self.source_time.is_some_and(|source| ir < source)
            || self.parser_time.is_some_and(|parser| ir < parser)
    }

    /// `changed` is set when the IR was regenerated during this run.
    pub fn needs_recompile(&self, changed: bool) -> bool {
        changed || self.output_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::MemoryFs;

    const PARSER: &str = "/zephir/bin/zephir-parser";

    #[test]
    fn base_name_flattens_separators() {
        assert_eq!(
            output_base_name(Path::new("/home/dev/app/router.zep")),
            "_home_dev_app_router.zep"
        );
        assert_eq!(
            output_base_name(Path::new(r"C:\work\a.zep")),
            "C__work_a.zep"
        );
    }

    #[test]
    fn fresh_source_needs_everything() {
        let fs = MemoryFs::new();
        fs.put(PARSER, "");
        fs.put("/src/a.zep", "namespace A;");
        let record = CacheRecord::load(&fs, Path::new("/src/a.zep"), Path::new(PARSER));
        assert_eq!(record.ir_path, PathBuf::from("/build/_src_a.zep.js"));
        assert_eq!(record.output_path, PathBuf::from("/build/_src_a.zep.php"));
        assert!(record.needs_reparse());
        assert!(record.needs_recompile(false));
    }

    #[test]
    fn up_to_date_ir_and_output_are_kept() {
        let fs = MemoryFs::new();
        fs.put(PARSER, "");
        fs.put("/src/a.zep", "namespace A;");
        fs.put("/build/_src_a.zep.js", "[]");
        fs.put("/build/_src_a.zep.php", "<?php");
        let record = CacheRecord::load(&fs, Path::new("/src/a.zep"), Path::new(PARSER));
        assert!(!record.needs_reparse());
        assert!(!record.needs_recompile(false));
        assert!(record.needs_recompile(true));
    }

    #[test]
    fn touched_source_or_parser_invalidates_ir() {
        let fs = MemoryFs::new();
        fs.put(PARSER, "");
        fs.put("/build/_src_a.zep.js", "[]");
        fs.put("/src/a.zep", "namespace B;");
        let record = CacheRecord::load(&fs, Path::new("/src/a.zep"), Path::new(PARSER));
        assert!(record.needs_reparse());

        fs.put("/src/a.zep", "namespace B;");
        fs.put("/build/_src_a.zep.js", "[]");
        fs.put(PARSER, "v2");
        let record = CacheRecord::load(&fs, Path::new("/src/a.zep"), Path::new(PARSER));
        assert!(record.needs_reparse());
    }

    #[test]
    fn missing_output_forces_recompile() {
        let fs = MemoryFs::new();
        fs.put(PARSER, "");
        fs.put("/src/a.zep", "");
        fs.put("/build/_src_a.zep.js", "[]");
        let record = CacheRecord::load(&fs, Path::new("/src/a.zep"), Path::new(PARSER));
        assert!(!record.needs_reparse());
        assert!(record.needs_recompile(false));
    }
}
