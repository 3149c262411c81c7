//! Abstract syntax tree for Go sources.
//!
//! All nodes live in a [`bumpalo::Bump`] arena and borrow it for `'ast`.
//! Nodes are immutable; passes that change the tree build new nodes.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use goop_core::ExprIdGen;
//! use goop_parser::Parser;
//!
//! let arena = Bump::new();
//! let mut ids = ExprIdGen::new();
//! let file = Parser::parse_file("package main\n\nfunc main() {}\n", &arena, &mut ids).unwrap();
//! assert_eq!(file.package.name, "main");
//! assert_eq!(file.decls.len(), 1);
//! ```

pub mod decl;
pub mod expr;
pub mod ops;
pub mod stmt;

mod decl_parser;
mod expr_parser;
mod parser;
mod stmt_parser;
mod type_parser;

pub use decl::*;
pub use expr::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;

pub use goop_core::{ParseError, ParseErrorKind, ParseErrors};

use goop_core::Span;

/// One parsed source file.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'ast> {
    /// The name from the `package` clause.
    pub package: Ident<'ast>,
    /// Declarations in source order, imports included.
    pub decls: &'ast [Decl<'ast>],
    pub span: Span,
}

impl<'ast> SourceFile<'ast> {
    /// Every import spec of the file, in source order.
    pub fn imports(&self) -> impl Iterator<Item = &'ast ImportSpec<'ast>> + 'ast {
        self.decls
            .iter()
            .filter_map(|decl| match decl {
                Decl::Gen(gen_decl) if gen_decl.keyword == DeclKeyword::Import => {
                    Some(gen_decl.specs)
                }
                _ => None,
            })
            .flatten()
            .filter_map(|spec| match spec {
                Spec::Import(import) => Some(*import),
                _ => None,
            })
    }

    /// Function and method declarations, in source order.
    pub fn funcs(&self) -> impl Iterator<Item = &'ast FuncDecl<'ast>> + 'ast {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(*func),
            Decl::Gen(_) => None,
        })
    }
}
