use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use zepc_core::{
    CompiledFile, Compiler, CompilerOptions, EmitterConfig, ExtensionGlobals, HardDisk,
    IndentStyle,
};

/// Compiles Zephir sources to PHP.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// A `.zep` file, or a directory compiled recursively
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    #[arg(
        short,
        long,
        value_name = "DIR",
        default_value = "build",
        help = "Directory receiving the cached IR and the generated PHP"
    )]
    output: PathBuf,

    #[arg(
        short = 't',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Installation root holding bin/zephir-parser"
    )]
    system: PathBuf,

    #[arg(long, value_name = "PATH", help = "Explicit path to the zephir-parser binary")]
    parser: Option<PathBuf>,

    #[arg(long, value_name = "N", default_value_t = 2, help = "Spaces per indentation level")]
    indent: usize,

    #[arg(long, conflicts_with = "indent", help = "Indent with tabs instead of spaces")]
    tabs: bool,

    #[arg(long, value_name = "N", default_value_t = 10, help = "Deepest indentation level rendered")]
    max_indent: usize,

    #[arg(
        long,
        help = "Put the opening brace of class and function bodies on the header line \
                (control structures always keep it there)"
    )]
    same_line_braces: bool,

    #[arg(
        long = "global",
        value_name = "NAME=VALUE",
        value_parser = parse_global,
        help = "Declare an extension global (repeatable)"
    )]
    globals: Vec<(String, String)>,

    #[arg(long, help = "Keep compiling other files after a file fails")]
    keep_going: bool,

    #[arg(long, help = "Print the generated PHP to stdout")]
    print: bool,

    #[arg(short, long, help = "Log cache decisions and stage runs")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn parse_global(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}

fn options(cli: &Cli, input_root: PathBuf) -> CompilerOptions {
    let indent = if cli.tabs {
        IndentStyle::Tabs
    } else {
        IndentStyle::Spaces(cli.indent)
    };
    let globals = if cli.globals.is_empty() {
        ExtensionGlobals::new()
    } else {
        ExtensionGlobals::initialized(cli.globals.iter().cloned())
    };
    CompilerOptions {
        input_root,
        output_root: cli.output.clone(),
        system_root: cli.system.clone(),
        parser: cli.parser.clone(),
        emitter: EmitterConfig {
            indent,
            max_depth: cli.max_indent,
            brace_on_new_line: !cli.same_line_braces,
        },
        globals,
    }
}

fn execute(cli: Cli) -> Result<()> {
    if cli.source.is_dir() {
        let options = options(&cli, cli.source.clone());
        let mut compiler = Compiler::new(Box::new(HardDisk::from_options(&options)), options);
        let report = compiler
            .compile_all(cli.keep_going)
            .with_context(|| format!("failed to compile {}", cli.source.display()))?;
        for compiled in &report.compiled {
            report_file(compiled, cli.print)?;
        }
        if !report.is_success() {
            for (path, err) in &report.failures {
                eprintln!("error: {}: {err}", path.display());
            }
            return Err(anyhow!(
                "{} of {} files failed to compile",
                report.failures.len(),
                report.failures.len() + report.compiled.len()
            ));
        }
    } else {
        let options = options(&cli, PathBuf::from("."));
        let mut compiler = Compiler::new(Box::new(HardDisk::from_options(&options)), options);
        let compiled = compiler
            .file(&cli.source)
            .with_context(|| format!("failed to compile {}", cli.source.display()))?;
        report_file(&compiled, cli.print)?;
    }
    Ok(())
}

fn report_file(compiled: &CompiledFile, print: bool) -> Result<()> {
    if !print {
        return Ok(());
    }
    match &compiled.php {
        Some(php) => print!("{php}"),
        None => print!("{}", read_output(&compiled.output)?),
    }
    Ok(())
}

fn read_output(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read output file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::{TempDir, tempdir};

    #[test]
    fn parses_globals() {
        assert_eq!(
            parse_global("db.host=localhost").unwrap(),
            ("db.host".to_string(), "localhost".to_string())
        );
        assert_eq!(parse_global("flag=").unwrap().1, "");
        assert!(parse_global("novalue").is_err());
        assert!(parse_global("=1").is_err());
    }

    #[test]
    fn rejects_malformed_global_argument() {
        Command::cargo_bin("zepc")
            .expect("binary exists")
            .arg("a.zep")
            .arg("--global")
            .arg("oops")
            .assert()
            .failure()
            .stderr(predicate::str::contains("expected NAME=VALUE"));
    }

    #[test]
    fn reports_missing_parser() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.zep"), "namespace App;").expect("write source");

        Command::cargo_bin("zepc")
            .expect("binary exists")
            .current_dir(dir.path())
            .arg("a.zep")
            .arg("--system")
            .arg(dir.path().join("nowhere"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("parser binary"));
    }

    #[cfg(unix)]
    mod with_parser {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        const GREETER: &str = r#"[
  {"type": "namespace", "name": "App"},
  {"type": "class", "name": "Greeter", "definition": {"methods": [{
    "type": "method", "visibility": ["public"], "name": "greet",
    "statements": [{"type": "return", "expr": {"type": "fcall", "name": "globals_get",
      "parameters": [{"parameter": {"type": "string", "value": "app.greeting"}}]}}]
  }]}}
]"#;

        /// Installs a fake `bin/zephir-parser` that prints fixed IR, or an
        /// unknown top-level node for files named `broken.zep`.
        fn install_parser(root: &Path) -> TempDir {
            let system = tempdir().expect("tempdir");
            let bin = system.path().join("bin");
            fs::create_dir_all(&bin).expect("create bin");
            let script = format!(
                "#!/bin/sh\ncase \"$1\" in\n  *broken.zep) echo '[{{\"type\": \"goto\"}}]' ;;\n  *) cat <<'EOF'\n{GREETER}\nEOF\n  ;;\nesac\n"
            );
            let parser = bin.join("zephir-parser");
            fs::write(&parser, script).expect("write parser");
            fs::set_permissions(&parser, fs::Permissions::from_mode(0o755)).expect("chmod");
            fs::write(root.join("greeter.zep"), "class Greeter {}").expect("write source");
            system
        }

        fn php_files(dir: &Path) -> Vec<PathBuf> {
            fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(|entry| entry.ok().map(|e| e.path()))
                        .filter(|path| path.extension().is_some_and(|ext| ext == "php"))
                        .collect()
                })
                .unwrap_or_default()
        }

        #[test]
        fn compiles_file_and_prints_php() {
            let dir = tempdir().expect("tempdir");
            let system = install_parser(dir.path());
            let output = dir.path().join("out");

            Command::cargo_bin("zepc")
                .expect("binary exists")
                .current_dir(dir.path())
                .arg("greeter.zep")
                .arg("-o")
                .arg(&output)
                .arg("-t")
                .arg(system.path())
                .arg("--global")
                .arg("app.greeting=hi")
                .arg("--print")
                .assert()
                .success()
                .stdout(predicate::str::contains("namespace App;"))
                .stdout(predicate::str::contains(
                    "  public function greet()\n  {\n    return globals_get(\"app.greeting\");\n  }",
                ));

            assert_eq!(php_files(&output).len(), 1, "php output was not created");
        }

        #[test]
        fn uses_tabs_when_asked() {
            let dir = tempdir().expect("tempdir");
            let system = install_parser(dir.path());

            Command::cargo_bin("zepc")
                .expect("binary exists")
                .current_dir(dir.path())
                .arg("greeter.zep")
                .arg("-t")
                .arg(system.path())
                .arg("--tabs")
                .arg("--print")
                .assert()
                .success()
                .stdout(predicate::str::contains("\tpublic function greet()"));
        }

        #[test]
        fn same_line_braces_for_bodies() {
            let dir = tempdir().expect("tempdir");
            let system = install_parser(dir.path());

            Command::cargo_bin("zepc")
                .expect("binary exists")
                .current_dir(dir.path())
                .arg("greeter.zep")
                .arg("-t")
                .arg(system.path())
                .arg("--same-line-braces")
                .arg("--global")
                .arg("app.greeting=hi")
                .arg("--print")
                .assert()
                .success()
                .stdout(predicate::str::contains("class Greeter {\n"))
                .stdout(predicate::str::contains("  public function greet() {\n"));
        }

        #[test]
        fn help_describes_brace_placement() {
            Command::cargo_bin("zepc")
                .expect("binary exists")
                .arg("--help")
                .assert()
                .success()
                .stdout(predicate::str::contains("control structures always keep it there"));
        }

        #[test]
        fn undeclared_global_fails() {
            let dir = tempdir().expect("tempdir");
            let system = install_parser(dir.path());

            Command::cargo_bin("zepc")
                .expect("binary exists")
                .current_dir(dir.path())
                .arg("greeter.zep")
                .arg("-t")
                .arg(system.path())
                .arg("--global")
                .arg("app.other=1")
                .assert()
                .failure()
                .stderr(predicate::str::contains("extension global [app.greeting] is not defined"));
        }

        #[test]
        fn keep_going_reports_failures() {
            let dir = tempdir().expect("tempdir");
            let sources = dir.path().join("src");
            fs::create_dir_all(&sources).expect("create src");
            let system = install_parser(&sources);
            fs::write(sources.join("broken.zep"), "goto;").expect("write broken");
            let output = dir.path().join("out");

            Command::cargo_bin("zepc")
                .expect("binary exists")
                .arg(&sources)
                .arg("-o")
                .arg(&output)
                .arg("-t")
                .arg(system.path())
                .arg("--keep-going")
                .assert()
                .failure()
                .stderr(predicate::str::contains("handler for top-level kind [Goto] not found"))
                .stderr(predicate::str::contains("1 of 2 files failed to compile"));

            assert_eq!(php_files(&output).len(), 1);
        }

        #[test]
        fn failing_reparse_never_reports_stale_output() {
            let dir = tempdir().expect("tempdir");
            let system = install_parser(dir.path());
            let parser = system.path().join("bin/zephir-parser");
            let script = fs::read_to_string(&parser).expect("read parser");
            fs::write(
                &parser,
                script.replacen("case", "[ -f fail.flag ] && exit 1\ncase", 1),
            )
            .expect("rewrite parser");
            let output = dir.path().join("out");
            let run = || {
                Command::cargo_bin("zepc")
                    .expect("binary exists")
                    .current_dir(dir.path())
                    .arg("greeter.zep")
                    .arg("-o")
                    .arg(&output)
                    .arg("-t")
                    .arg(system.path())
                    .assert()
            };
            run().success();

            std::thread::sleep(std::time::Duration::from_millis(1100));
            fs::write(dir.path().join("greeter.zep"), "class Greeter { broken").expect("edit");
            fs::write(dir.path().join("fail.flag"), "").expect("flag");
            run().failure().stderr(predicate::str::contains("exit code 1"));
            run().failure().stderr(predicate::str::contains("exit code 1"));

            fs::remove_file(dir.path().join("fail.flag")).expect("unflag");
            run().success();
        }

        #[test]
        fn second_run_reuses_output() {
            let dir = tempdir().expect("tempdir");
            let system = install_parser(dir.path());
            let output = dir.path().join("out");
            let run = || {
                Command::cargo_bin("zepc")
                    .expect("binary exists")
                    .current_dir(dir.path())
                    .arg("greeter.zep")
                    .arg("-o")
                    .arg(&output)
                    .arg("-t")
                    .arg(system.path())
                    .arg("--print")
                    .arg("-v")
                    .assert()
                    .success()
            };
            run().stderr(predicate::str::contains("parsing"));
            run()
                .stderr(predicate::str::contains("output is up to date"))
                .stdout(predicate::str::contains("class Greeter"));
        }
    }
}
