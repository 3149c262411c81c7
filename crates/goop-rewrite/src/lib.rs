//! Rewriting of checked goop sources.
//!
//! The pass rebuilds a file bottom-up and lets a [`RewriteRule`] replace
//! expressions along the way. [`OverloadRule`] turns every operator with a
//! resolved overload into an explicit method call:
//!
//! ```text
//! 2*v1*v2 + v1 - 4
//! v1.Op_PreMultiplyScalar(2).Op_Multiply(v2).Op_Add(v1).Op_SubtractScalar(4)
//! ```

mod pass;
mod rule;

pub use pass::{RewritePass, rewrite_file};
pub use rule::{OverloadRule, RewriteCx, RewriteRule};

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use goop_checker::{CheckerConfig, check_package};
    use goop_core::ExprIdGen;
    use goop_parser::{Parser, PrintConfig, print_file};

    fn transform(source: &str) -> String {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let file = Parser::parse_file(source, &arena, &mut ids).unwrap();
        let result = check_package(&[file], &CheckerConfig::default());
        assert!(result.is_success(), "{:?}", result.errors);
        let rule = OverloadRule::new(&result.package.overloads);
        let rewritten = rewrite_file(&arena, &file, &mut ids, rule);
        print_file(&rewritten, &PrintConfig::default())
    }

    #[test]
    fn vec4_chain() {
        let out = transform(
            r#"package main

type vec4 [4]float32

func (v vec4) Op_Multiply(o vec4) vec4 { return v }
func (v vec4) Op_MultiplyScalar(o float32) vec4 { return v }
func (v vec4) Op_PreMultiplyScalar(o float32) vec4 { return v.Op_MultiplyScalar(o) }
func (v vec4) Op_Add(o vec4) vec4 { return v }
func (v vec4) Op_Subtract(o vec4) vec4 { return v }
func (v vec4) Op_SubtractScalar(o float32) vec4 { return v }

func f(v1, v2 vec4) vec4 {
	ret := 2*v1*v2 + v1 - 4
	return ret
}
"#,
        );
        assert!(
            out.contains("ret := v1.Op_PreMultiplyScalar(2).Op_Multiply(v2).Op_Add(v1).Op_SubtractScalar(4)"),
            "{out}"
        );
    }

    #[test]
    fn unary_and_nested_operands() {
        let out = transform(
            r#"package main

type V [2]float64

func (v V) Op_Add(o V) V { return v }
func (v V) Op_Subtract() V { return v }
func (v V) Op_Equal(o V) bool { return v[0] == o[0] }

func f(a, b V, p *V) bool {
	c := -(a + b)
	d := *p + c
	return d == a
}
"#,
        );
        assert!(out.contains("c := (a.Op_Add(b)).Op_Subtract()"), "{out}");
        assert!(out.contains("d := (*p).Op_Add(c)"), "{out}");
        assert!(out.contains("return d.Op_Equal(a)"), "{out}");
    }

    #[test]
    fn sources_without_overloads_print_unchanged() {
        let source = "package main\n\nfunc add(a, b int) int {\n\treturn a + b\n}\n";
        assert_eq!(transform(source), source);
    }
}
