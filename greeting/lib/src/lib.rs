//! # greeting
//!
//! The classic introductory demo: print a formatted summary line, pick one of
//! two lines with a single comparison, then count to three.
//!
//! ```
//! use greeting::GreetingPrinter;
//!
//! let lines = GreetingPrinter::default().lines();
//! assert_eq!(lines[0], "Nombre: Juan | Edad: 30 | Salario: 2500.75");
//! assert_eq!(lines.len(), 5);
//! ```
//!
//! The crate also carries the Java source the demo was first written in
//! ([`DEMO_SOURCE`]) and a small front end for that Java subset: tokenizer,
//! parser, semantic checks and a translator to Python.
//!
//! ```
//! use greeting::{DEMO_SOURCE, check, parse_source, to_python};
//!
//! let program = parse_source(DEMO_SOURCE).unwrap();
//! assert!(check(&program).is_empty());
//! assert!(to_python(&program).unwrap().contains("for i in range(0, 3):"));
//! ```
//!
//! ## Modules
//!
//! - [`profile`] - the three demo values and the age rule
//! - [`printer`] - line formatting and output
//! - [`lexer`] - token table for Java-subset source
//! - [`ast`] / [`parser`] - syntax tree and recursive-descent parser
//! - [`semantic`] - symbol table, scope and type checks
//! - [`codegen`] - Python output

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod profile;
pub mod semantic;

pub use ast::{Position, Program};
pub use codegen::to_python;
pub use error::{GreetingError, Result};
pub use lexer::{DEMO_SOURCE, Token, TokenKind, read_source, tokenize, tokenize_file};
pub use parser::{parse, parse_source};
pub use printer::{COUNTER_LIMIT, GreetingPrinter, counter_lines, format_salary, summary_line};
pub use profile::{ADULT_AGE, AgeCategory, Profile};
pub use semantic::{Diagnostic, DiagnosticKind, SymbolTable, ValueType, check};
