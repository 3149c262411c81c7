//! goop: operator overloading for Go.
//!
//! goop reads the Go files of one package, type-checks them, and replaces
//! every operator applied to a type with a matching `Op_*` method by an
//! explicit method call. The output is ordinary Go.
//!
//! ```
//! let source = r#"package main
//!
//! type Meters float64
//!
//! func (m Meters) Op_Add(o Meters) Meters {
//! 	return Meters(float64(m) + float64(o))
//! }
//!
//! func total(a, b Meters) Meters {
//! 	return a + b
//! }
//! "#;
//! let out = goop::transform_source("meters.go", source)?;
//! assert!(out.contains("return a.Op_Add(b)"));
//! # Ok::<(), goop::GoopError>(())
//! ```
//!
//! ## Crates
//!
//! - `goop-core`: spans, ids and errors
//! - `goop-parser`: lexer, AST, parser and printer
//! - `goop-checker`: type checker and overload resolver
//! - `goop-rewrite`: the rewrite pass

mod sources;
mod unit;

pub use sources::{discover_sources, read_sources, write_outputs};
pub use unit::{Output, Source, Unit, transform_source};

pub use goop_checker::{CheckResult, CheckerConfig, OverloadTable, PackageRegistry};
pub use goop_core::{GoopError, TypeError, TypeErrors};
pub use goop_parser::{Indent, PrintConfig};

/// Render type errors as `file:line:col: message` with source excerpts.
pub fn render_type_errors<'e>(errors: impl IntoIterator<Item = &'e TypeError>, sources: &[Source]) -> String {
    errors
        .into_iter()
        .map(|error| match sources.get(error.file.0 as usize) {
            Some(source) => error.display_with_source(&source.name, &source.text),
            None => format!("{}: {}\n", error.span, error.message),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use goop_core::{FileId, Span, TypeErrorKind};

    #[test]
    fn errors_render_with_file_names() {
        let sources = [
            Source::new("a.go", "package main\n"),
            Source::new("b.go", "package main\n\nvar x = y\n"),
        ];
        let error = TypeError::new(TypeErrorKind::Undeclared, FileId(1), Span::new(3, 9, 1), "undefined: y");
        let rendered = render_type_errors([&error], &sources);
        assert!(rendered.starts_with("b.go:3:9: undefined: y\n"), "{rendered}");
        assert!(rendered.contains("var x = y"), "{rendered}");
    }
}
