//! One package moving through the pipeline.
//!
//! ```
//! use bumpalo::Bump;
//! use goop::{CheckerConfig, PrintConfig, Source, Unit};
//!
//! let arena = Bump::new();
//! let mut unit = Unit::new(&arena);
//! unit.parse_sources(&[Source::new("main.go", "package main\n\nfunc main() {}\n")])?;
//! let outputs = unit.transform(&CheckerConfig::default(), &PrintConfig::default())?;
//! assert_eq!(outputs[0].name, "main.go");
//! # Ok::<(), goop::GoopError>(())
//! ```

use bumpalo::Bump;
use goop_checker::{CheckResult, CheckerConfig, OverloadTable, check_package};
use goop_core::{ExprIdGen, GoopError};
use goop_parser::{Parser, PrintConfig, SourceFile, print_file};
use goop_rewrite::{OverloadRule, rewrite_file};

/// A named source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// File name without directory.
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A transformed file, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub name: String,
    pub text: String,
}

/// The files of one package.
///
/// Every file is parsed with the same id generator, so expression ids are
/// unique across the package and the rewrite pass can keep drawing from it.
pub struct Unit<'ast> {
    arena: &'ast Bump,
    ids: ExprIdGen,
    names: Vec<String>,
    files: Vec<SourceFile<'ast>>,
}

impl<'ast> Unit<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            ids: ExprIdGen::new(),
            names: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn files(&self) -> &[SourceFile<'ast>] {
        &self.files
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Parse `sources` in order. File ids follow the same order.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_sources(&mut self, sources: &[Source]) -> Result<(), GoopError> {
        for source in sources {
            let file = Parser::parse_file(&source.text, self.arena, &mut self.ids).map_err(|errors| {
                GoopError::Parse {
                    file: source.name.clone(),
                    errors,
                }
            })?;
            tracing::debug!(file = %source.name, decls = file.decls.len(), "parsed");
            self.names.push(source.name.clone());
            self.files.push(file);
        }
        Ok(())
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check(&self, config: &CheckerConfig) -> CheckResult {
        check_package(&self.files, config)
    }

    /// Replace every overloaded operator with its method call.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn rewrite(&mut self, overloads: &OverloadTable) -> Vec<SourceFile<'ast>> {
        let rule = OverloadRule::new(overloads);
        self.files
            .iter()
            .map(|file| rewrite_file(self.arena, file, &mut self.ids, rule))
            .collect()
    }

    /// Check, rewrite and print every file.
    pub fn transform(&mut self, config: &CheckerConfig, print: &PrintConfig) -> Result<Vec<Output>, GoopError> {
        let package = self.check(config).into_result()?;
        tracing::debug!(
            package = %package.name,
            overloads = package.overloads.len(),
            "checked"
        );
        let rewritten = self.rewrite(&package.overloads);
        Ok(self
            .names
            .iter()
            .zip(&rewritten)
            .map(|(name, file)| Output {
                name: name.clone(),
                text: print_file(file, print),
            })
            .collect())
    }
}

/// Transform a single-file package.
pub fn transform_source(name: &str, source: &str) -> Result<String, GoopError> {
    let arena = Bump::new();
    let mut unit = Unit::new(&arena);
    unit.parse_sources(&[Source::new(name, source)])?;
    let mut outputs = unit.transform(&CheckerConfig::default(), &PrintConfig::default())?;
    Ok(outputs.pop().map(|output| output.text).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALAR: &str = "package main\n\ntype Meters float64\n\nfunc (m Meters) Op_Add(o Meters) Meters {\n\treturn Meters(float64(m) + float64(o))\n}\n\nfunc total(a, b Meters) Meters {\n\treturn a + b\n}\n";

    #[test]
    fn single_file() {
        let out = transform_source("meters.go", SCALAR).unwrap();
        assert!(out.contains("return a.Op_Add(b)"), "{out}");
    }

    #[test]
    fn files_share_one_package() {
        let arena = Bump::new();
        let mut unit = Unit::new(&arena);
        unit.parse_sources(&[
            Source::new("a.go", "package main\n\ntype Meters float64\n\nfunc (m Meters) Op_Add(o Meters) Meters {\n\treturn m\n}\n"),
            Source::new("b.go", "package main\n\nfunc total(a, b Meters) Meters {\n\treturn a + b\n}\n"),
        ])
        .unwrap();
        assert_eq!(unit.names(), ["a.go", "b.go"]);

        let outputs = unit.transform(&CheckerConfig::default(), &PrintConfig::default()).unwrap();
        assert_eq!(outputs.len(), 2);
        assert!(outputs[1].text.contains("return a.Op_Add(b)"), "{}", outputs[1].text);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = transform_source("broken.go", "package main\n\nfunc {\n").unwrap_err();
        assert!(matches!(err, GoopError::Parse { ref file, .. } if file == "broken.go"));
    }

    #[test]
    fn type_errors_fail_the_transform() {
        let err = transform_source("bad.go", "package main\n\nfunc f() int {\n\treturn \"s\"\n}\n").unwrap_err();
        assert!(matches!(err, GoopError::Type(_)));
    }
}
