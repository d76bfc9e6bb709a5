use crate::config::EmitterConfig;

/// Line-buffered text sink that applies indentation when a line is flushed.
#[derive(Debug)]
pub struct CodeWriter {
    unit: String,
    max_depth: usize,
    depth: usize,
    line: String,
    out: String,
}

impl CodeWriter {
    pub fn new(config: &EmitterConfig) -> Self {
        CodeWriter {
            unit: config.indent_unit(),
            max_depth: config.max_depth,
            depth: 0,
            line: String::new(),
            out: String::new(),
        }
    }

    /// Appends to the pending line.
    pub fn append(&mut self, text: &str) {
        self.line.push_str(text);
    }

    /// Writes `text` as a complete line.
    pub fn line(&mut self, text: &str) {
        self.append(text);
        self.flush();
    }

    /// Writes a multi-line block verbatim except for re-indentation.
    pub fn lines(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line.trim_end());
        }
    }

    /// Emits the pending line. Fragments spanning several lines (closure
    /// bodies) get the current indentation prefixed to each of their lines.
    pub fn flush(&mut self) {
        let pending = std::mem::take(&mut self.line);
        for line in pending.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            for _ in 0..self.depth.min(self.max_depth) {
                self.out.push_str(&self.unit);
            }
            self.out.push_str(line);
            self.out.push('\n');
        }
    }

    pub fn blank_line(&mut self) {
        self.flush();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn unindent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Writes `header {` (or the brace on its own line) and indents.
    pub fn open_block(&mut self, header: &str, brace_on_new_line: bool) {
        if brace_on_new_line {
            self.line(header);
            self.line("{");
        } else {
            self.line(&format!("{header} {{"));
        }
        self.indent();
    }

    /// Unindents and writes the closing brace followed by `suffix`.
    pub fn close_block(&mut self, suffix: &str) {
        self.flush();
        self.unindent();
        self.line(&format!("}}{suffix}"));
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the text with exactly one trailing newline.
    pub fn finish(mut self) -> String {
        self.flush();
        let mut out = self.out.trim_end().to_string();
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndentStyle;

    #[test]
    fn indents_nested_blocks() {
        let mut writer = CodeWriter::new(&EmitterConfig::default());
        writer.open_block("class A", true);
        writer.open_block("if ($a)", false);
        writer.line("return 1;");
        writer.close_block("");
        writer.close_block("");
        assert_eq!(
            writer.finish(),
            "class A\n{\n  if ($a) {\n    return 1;\n  }\n}\n"
        );
    }

    #[test]
    fn caps_depth() {
        let config = EmitterConfig {
            indent: IndentStyle::Tabs,
            max_depth: 1,
            brace_on_new_line: false,
        };
        let mut writer = CodeWriter::new(&config);
        writer.indent();
        writer.indent();
        writer.indent();
        writer.line("x();");
        assert_eq!(writer.finish(), "\tx();\n");
    }

    #[test]
    fn indents_each_line_of_a_fragment() {
        let mut writer = CodeWriter::new(&EmitterConfig::default());
        writer.indent();
        writer.line("$f = function ($a) {\n  return $a;\n};");
        assert_eq!(
            writer.finish(),
            "  $f = function ($a) {\n    return $a;\n  };\n"
        );
    }

    #[test]
    fn skips_empty_lines_and_collapses_blanks() {
        let mut writer = CodeWriter::new(&EmitterConfig::default());
        writer.line("<?php");
        writer.flush();
        writer.blank_line();
        writer.blank_line();
        writer.line("namespace A;");
        assert_eq!(writer.finish(), "<?php\n\nnamespace A;\n");
    }
}
