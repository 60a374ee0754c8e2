//! CLI for the greeting demo.
//!
//! ## Usage
//!
//! ```bash
//! # Print the greeting
//! greeting
//!
//! # Token table of the Java source the demo was written in
//! greeting tokens
//!
//! # Token table of another file, as JSON
//! greeting tokens --file Prueba.java --json
//!
//! # Syntax tree, semantic checks and Python translation
//! greeting ast --file Prueba.java
//! greeting check --file Prueba.java
//! greeting py > ejemplo.py
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::engine::{ArgValueCompleter, PathCompleter};
use color_eyre::eyre::{WrapErr, bail};
use greeting::{
    DEMO_SOURCE, GreetingPrinter, Program, Token, check, parse_source, read_source, to_python,
    tokenize,
};
use tracing::debug;

/// Print the greeting demo
#[derive(Parser, Debug)]
#[command(name = "greeting", version, about, long_about = None)]
#[command(after_help = "\
SHELL COMPLETIONS:
  Bash (~/.bashrc):
    source <(COMPLETE=bash greeting)

  Zsh (~/.zshrc):
    source <(COMPLETE=zsh greeting)

  Fish (~/.config/fish/config.fish):
    COMPLETE=fish greeting | source
")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token table of Java source
    ///
    /// Without --file, tokenizes the Java program the greeting was first
    /// written in. Comments and whitespace are not listed.
    Tokens {
        /// Java source file to tokenize
        #[arg(short, long, value_name = "PATH", add = ArgValueCompleter::new(java_completer()))]
        file: Option<PathBuf>,

        /// Output the token table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the syntax tree of Java source as JSON
    Ast {
        /// Java source file to parse
        #[arg(short, long, value_name = "PATH", add = ArgValueCompleter::new(java_completer()))]
        file: Option<PathBuf>,
    },

    /// Check Java source for scope and type errors
    ///
    /// Reports undeclared or unassigned variables, redeclarations, writes to
    /// final variables, type mismatches, non-boolean conditions and missing
    /// returns. Exits with an error when anything is reported.
    Check {
        /// Java source file to check
        #[arg(short, long, value_name = "PATH", add = ArgValueCompleter::new(java_completer()))]
        file: Option<PathBuf>,

        /// Output the diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate Java source to Python
    Py {
        /// Java source file to translate
        #[arg(short, long, value_name = "PATH", add = ArgValueCompleter::new(java_completer()))]
        file: Option<PathBuf>,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Must run before anything writes to stdout
    clap_complete::CompleteEnv::with_factory(Args::command).complete();

    // Logs go to stderr so stdout stays exactly the program output
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }

    let args = Args::parse();

    match args.command {
        Some(Command::Tokens { file, json }) => print_tokens(file, json),
        Some(Command::Ast { file }) => print_ast(file),
        Some(Command::Check { file, json }) => print_diagnostics(file, json),
        Some(Command::Py { file }) => print_python(file),
        None => GreetingPrinter::default()
            .run()
            .wrap_err("Failed to print greeting"),
    }
}

/// Reads `file`, or falls back to the demo's Java source.
fn load_source(file: Option<PathBuf>) -> color_eyre::Result<String> {
    match file {
        Some(path) => {
            debug!(path = %path.display(), "reading source");
            Ok(read_source(&path)?)
        }
        None => Ok(DEMO_SOURCE.to_string()),
    }
}

fn load_program(file: Option<PathBuf>) -> color_eyre::Result<Program> {
    let source = load_source(file)?;
    parse_source(&source).wrap_err("Failed to parse source")
}

fn print_tokens(file: Option<PathBuf>, json: bool) -> color_eyre::Result<()> {
    let tokens = tokenize(&load_source(file)?);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &tokens)?;
        writeln!(out)?;
    } else {
        for token in &tokens {
            writeln!(out, "{}", table_row(token))?;
        }
    }
    out.flush()?;
    Ok(())
}

fn print_ast(file: Option<PathBuf>) -> color_eyre::Result<()> {
    let program = load_program(file)?;
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &program)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn print_diagnostics(file: Option<PathBuf>, json: bool) -> color_eyre::Result<()> {
    let program = load_program(file)?;
    let diagnostics = check(&program);

    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &diagnostics)?;
        writeln!(out)?;
    } else if diagnostics.is_empty() {
        writeln!(out, "No problems found")?;
    } else {
        for diagnostic in &diagnostics {
            writeln!(out, "{diagnostic}")?;
        }
    }
    out.flush()?;

    if !diagnostics.is_empty() {
        bail!("{} semantic error(s) found", diagnostics.len());
    }
    Ok(())
}

fn print_python(file: Option<PathBuf>) -> color_eyre::Result<()> {
    let program = load_program(file)?;
    let python = to_python(&program).wrap_err("Failed to translate to Python")?;
    let mut out = io::stdout().lock();
    out.write_all(python.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// `line:column  KIND  lexeme`, padded so the columns line up.
fn table_row(token: &Token) -> String {
    let kind: &'static str = token.kind.into();
    let position = format!("{}:{}", token.line, token.column);
    format!("{position:<8}{kind:<22}{}", token.lexeme)
}

/// Completes `.java` files and directories.
fn java_completer() -> PathCompleter {
    PathCompleter::any().filter(|path| {
        path.is_dir()
            || path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("java"))
    })
}
