//! Go front end for goop.
//!
//! This crate provides the lexer, the arena-allocated AST, the parser and the
//! source printer for the Go subset goop understands.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use goop_core::ExprIdGen;
//! use goop_parser::{Parser, PrintConfig, print_file};
//!
//! let arena = Bump::new();
//! let mut ids = ExprIdGen::new();
//! let source = "package main\n\nfunc add(a, b int) int {\n\treturn a + b\n}\n";
//!
//! match Parser::parse_file(source, &arena, &mut ids) {
//!     Ok(file) => assert_eq!(print_file(&file, &PrintConfig::default()), source),
//!     Err(errors) => panic!("parse errors: {errors}"),
//! }
//! ```

// Lexer module
pub mod lexer;

// AST module
pub mod ast;

// Printer module
pub mod printer;

// Re-export commonly used types at crate root
pub use ast::{Parser, SourceFile};
pub use lexer::{Lexer, Token, TokenKind};
pub use printer::{Indent, PrintConfig, expr_string, print_file};
