//! Type checker and operator overload resolver for goop.
//!
//! [`check_package`] checks the parsed files of one package the way the Go
//! type checker would, with one addition: a binary or unary operator whose
//! operand type declares a suitable `Op_*` method is checked as a call of
//! that method, and the resolution is recorded in the package's
//! [`OverloadTable`].
//!
//! ## Modules
//!
//! - [`types`]: interned types, method sets and type hashes
//! - [`constant`]: untyped constant arithmetic
//! - [`objects`]: declared objects and scopes
//! - [`registry`]: importable package descriptions
//! - [`operand`]: results of evaluating expressions
//! - [`info`]: types recorded for every expression
//! - [`overload`]: operator overload resolution and its table
//! - [`diagnostics`]: where type errors go

pub mod config;
pub mod constant;
pub mod diagnostics;
pub mod info;
pub mod objects;
pub mod operand;
pub mod overload;
pub mod registry;
pub mod types;

mod checker;
mod suppress;
mod universe;

pub use config::CheckerConfig;
pub use diagnostics::{DiagnosticSink, Diagnostics, DiscardSink};
pub use info::{Info, TypeAndValue};
pub use overload::{MethodCandidate, OverloadOp, OverloadRecord, OverloadTable};
pub use registry::{PackageDesc, PackageRegistry};
pub use types::{TypeId, TypeTable};

pub use goop_core::{TypeError, TypeErrors};

use goop_parser::SourceFile;

use crate::checker::Checker;

/// Everything known about a checked package.
#[derive(Debug)]
pub struct Package {
    pub name: String,
    pub types: TypeTable,
    /// Type and value of every checked expression.
    pub info: Info,
    pub overloads: OverloadTable,
}

/// Result of checking a package.
#[derive(Debug)]
pub struct CheckResult {
    pub package: Package,
    pub errors: Vec<TypeError>,
}

impl CheckResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The package, or every error found.
    pub fn into_result(self) -> Result<Package, TypeErrors> {
        if self.errors.is_empty() {
            Ok(self.package)
        } else {
            Err(TypeErrors::new(self.errors))
        }
    }
}

/// Type-check the files of one package.
///
/// `files` must have been parsed with one shared `ExprIdGen` so expression
/// ids are unique across the package. File ids are the indices into
/// `files`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn check_package(files: &[SourceFile<'_>], config: &CheckerConfig) -> CheckResult {
    let mut diagnostics = Diagnostics::new(config.max_errors);
    let (package, error_count) = {
        let mut checker = Checker::new(config, files, Box::new(&mut diagnostics));
        checker.check_files();
        let package = Package {
            name: std::mem::take(&mut checker.pkg_name),
            types: std::mem::take(&mut checker.types),
            info: std::mem::take(&mut checker.info),
            overloads: std::mem::take(&mut checker.overloads),
        };
        (package, checker.error_count)
    };
    tracing::debug!(
        package = %package.name,
        errors = error_count,
        overloads = package.overloads.len(),
        "package checked"
    );
    CheckResult {
        package,
        errors: diagnostics.into_errors(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use goop_core::ExprIdGen;
    use goop_parser::Parser;
    use goop_parser::ast::{Decl, Expr, Stmt};
    use types::BasicKind;

    const VEC4: &str = r#"package main

import (
	"fmt"
)

type vec4 [4]float32

func (v vec4) Op_Multiply(o vec4) vec4 {
	return vec4{v[0] * o[0], v[1] * o[1], v[2] * o[2], v[3] * o[3]}
}

func (v vec4) Op_MultiplyScalar(o float32) vec4 {
	return vec4{v[0] * o, v[1] * o, v[2] * o, v[3] * o}
}

func (v vec4) Op_PreMultiplyScalar(o float32) vec4 {
	return v.Op_MultiplyScalar(o)
}

func (v vec4) Op_Add(o vec4) vec4 {
	return vec4{v[0] + o[0], v[1] + o[1], v[2] + o[2], v[3] + o[3]}
}

func (v vec4) Op_Subtract(o vec4) vec4 {
	return vec4{v[0] - o[0], v[1] - o[1], v[2] - o[2], v[3] - o[3]}
}

func (v vec4) Op_SubtractScalar(o float32) vec4 {
	return vec4{v[0] - o, v[1] - o, v[2] - o, v[3] - o}
}

func main() {
	v1 := vec4{1, 2, 3, 4}
	v2 := vec4{5, 6, 7, 8}
	ret := 2*v1*v2 + v1 - 4
	fmt.Println(ret)
}
"#;

    fn check(source: &str) -> CheckResult {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let file = match Parser::parse_file(source, &arena, &mut ids) {
            Ok(file) => file,
            Err(errors) => panic!("parse errors: {errors}"),
        };
        check_package(&[file], &CheckerConfig::default())
    }

    fn messages(result: &CheckResult) -> Vec<&str> {
        result.errors.iter().map(|e| e.message.as_str()).collect()
    }

    fn methods(result: &CheckResult) -> Vec<(&str, bool)> {
        result
            .package
            .overloads
            .iter()
            .map(|(_, r)| (r.method.name.as_str(), r.reversed))
            .collect()
    }

    #[test]
    fn vec4_expression_resolves_every_operator() {
        let result = check(VEC4);
        assert!(result.is_success(), "{:?}", messages(&result));
        assert_eq!(
            methods(&result),
            [
                ("Op_PreMultiplyScalar", true),
                ("Op_Multiply", false),
                ("Op_Add", false),
                ("Op_SubtractScalar", false),
            ]
        );
    }

    #[test]
    fn untyped_operand_takes_parameter_type() {
        let result = check(VEC4);
        let package = &result.package;
        let float32 = TypeId::basic(BasicKind::Float32);
        for (_, record) in package.overloads.iter() {
            let operand = record.operand.expect("binary record has an operand");
            if record.method.name.ends_with("Scalar") {
                assert_eq!(package.info.type_of(operand), Some(float32));
            }
            assert_eq!(package.types.display(record.result(), "main"), "vec4");
        }
    }

    #[test]
    fn repeated_checks_agree() {
        let first = check(VEC4);
        let second = check(VEC4);
        assert_eq!(methods(&first), methods(&second));
        assert_eq!(first.errors.len(), second.errors.len());
    }

    #[test]
    fn untyped_constants_are_never_overloaded() {
        let result = check(
            r#"package main

type num int

func (n num) Op_Add(o num) num { return n }

func main() {
	x := 1 + 2
	_ = x
}
"#,
        );
        assert!(result.is_success(), "{:?}", messages(&result));
        assert!(result.package.overloads.is_empty());
    }

    #[test]
    fn pointer_receivers_need_addressable_operands() {
        let result = check(
            r#"package main

type Counter struct{ n int }

func (c *Counter) Op_Add(o Counter) Counter { return Counter{c.n + o.n} }

func fresh() Counter { return Counter{} }

func sum(xs []Counter, a Counter, p *Counter) Counter {
	b := a + a
	c := xs[0] + a
	d := *p + a
	_ = d
	_ = fresh() + a
	return b + c
}
"#,
        );
        assert_eq!(methods(&result).len(), 4);
        assert_eq!(
            messages(&result),
            ["invalid operation: operator + not defined on fresh() (value of struct type Counter)"]
        );
    }

    #[test]
    fn variadic_and_multi_result_methods_are_skipped() {
        let result = check(
            r#"package main

type M int

func (m M) Op_AddMany(o ...M) M { return m }
func (m M) Op_AddPair(o M) (M, bool) { return m, true }
func (m M) Op_AddExact(o M) M { return m }

func f(a, b M) M {
	return a + b
}
"#,
        );
        assert!(result.is_success(), "{:?}", messages(&result));
        assert_eq!(methods(&result), [("Op_AddExact", false)]);
    }

    #[test]
    fn unary_operator_overload() {
        let result = check(
            r#"package main

type V [2]float64

func (v V) Op_Subtract() V { return V{-v[0], -v[1]} }

func neg(v V) V {
	return -v
}
"#,
        );
        assert!(result.is_success(), "{:?}", messages(&result));
        let records: Vec<_> = result.package.overloads.iter().map(|(_, r)| r.clone()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].op, OverloadOp::Subtract);
        assert_eq!(records[0].operand, None);
    }

    #[test]
    fn typed_arguments_must_match_exactly() {
        let result = check(
            r#"package main

type V float64

func (v V) Op_MultiplyScalar(s float32) V { return v }

func scale(v V, s float64) V {
	return v * s
}
"#,
        );
        assert!(result.package.overloads.is_empty());
        assert_eq!(
            messages(&result),
            ["invalid operation: v * s (mismatched types V and float64)"]
        );
    }

    #[test]
    fn ordinary_errors_are_reported() {
        let result = check(
            r#"package main

func f() int {
	return y
}
"#,
        );
        assert_eq!(messages(&result), ["undefined: y"]);
        assert!(result.into_result().is_err());
    }

    #[test]
    fn reversed_record_swaps_receiver_and_operand() {
        let source = r#"package main

type V [4]float32

func (v V) Op_PreMultiplyScalar(s float32) V { return v }

func scale(s float32, v V) V {
	return s * v
}
"#;
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let file = Parser::parse_file(source, &arena, &mut ids).unwrap();
        let result = check_package(&[file], &CheckerConfig::default());
        assert!(result.is_success(), "{:?}", messages(&result));

        let Some(Decl::Func(scale)) = file.decls.last() else {
            panic!("expected a function");
        };
        let Some(Stmt::Return(ret)) = scale.body.and_then(|b| b.stmts.first()) else {
            panic!("expected a return");
        };
        let Expr::Binary(product) = ret.results[0] else {
            panic!("expected a binary expression");
        };

        let record = result.package.overloads.get(product.id).unwrap();
        assert_eq!(record.method.name, "Op_PreMultiplyScalar");
        assert!(record.reversed);
        assert_eq!(record.receiver, product.right.id());
        assert_eq!(record.operand, Some(product.left.id()));
        assert_eq!(result.package.overloads.len(), 1);
    }

    #[test]
    fn interface_methods_may_mention_their_own_type() {
        let result = check(
            r#"package main

type N interface {
	Op_Add(o N) N
	Next() N
}

func sum(x, y N) N {
	return x + y
}
"#,
        );
        assert!(result.is_success(), "{:?}", messages(&result));
        assert_eq!(methods(&result), [("Op_Add", false)]);
    }

    #[test]
    fn self_referencing_results_keep_their_type() {
        let result = check(
            r#"package main

type N interface {
	Next() N
}

func bump(x N) N {
	return x.Next() + 1
}
"#,
        );
        assert!(result.package.overloads.is_empty());
        assert_eq!(result.errors.len(), 1, "{:?}", messages(&result));
        let error = result.errors.iter().next().unwrap();
        assert_eq!(error.span.line, 8);
    }

    #[test]
    fn interface_embedding_itself_is_rejected() {
        let result = check(
            r#"package main

type N interface {
	N
}
"#,
        );
        assert_eq!(
            messages(&result),
            ["invalid recursive type: N embeds itself"]
        );
    }

    #[test]
    fn map_elements_are_not_addressable() {
        let result = check(
            r#"package main

type C struct{ n int }

func (c *C) Op_Add(o C) C { return C{c.n + o.n} }

func get(m map[string]C, a C) C {
	return m["k"] + a
}
"#,
        );
        assert!(result.package.overloads.is_empty());
        let messages = messages(&result);
        assert_eq!(messages.len(), 1, "{messages:?}");
        assert!(
            messages[0].starts_with(r#"invalid operation: operator + not defined on m["k"]"#),
            "{messages:?}"
        );
    }

    #[test]
    fn unary_operators_on_constants_are_never_overloaded() {
        let result = check(
            r#"package main

type V int

func (v V) Op_Subtract() V { return v }

func f() V {
	const k = 3
	return -k
}
"#,
        );
        assert!(result.is_success(), "{:?}", messages(&result));
        assert!(result.package.overloads.is_empty());
    }
}
