//! End-to-end tests over the fixture packages in `test_scripts/`.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use goop::{GoopError, Source, read_sources, render_type_errors, transform_source};

fn scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_scripts")
}

fn load(filename: &str) -> Source {
    let path = scripts_dir().join(filename);
    let text = fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    Source::new(filename, text)
}

fn transform(filename: &str) -> String {
    let source = load(filename);
    transform_source(&source.name, &source.text).unwrap_or_else(|e| panic!("{filename}: {e}"))
}

#[test]
fn vec4_expression_becomes_method_chain() {
    let out = transform("vec4.go");
    assert!(
        out.contains("ret := v1.Op_PreMultiplyScalar(2).Op_Multiply(v2).Op_Add(v1).Op_SubtractScalar(4)"),
        "{out}"
    );
    assert!(out.contains("return v.Op_MultiplyScalar(o)"), "{out}");
    assert!(out.contains("fmt.Println(ret)"), "{out}");
}

#[test]
fn pointer_receiver_on_addressable_operand() {
    let out = transform("pointer.go");
    assert!(out.contains("return c.Op_Add(1)"), "{out}");
}

#[test]
fn type_errors_render_with_excerpt() {
    let source = load("undefined.go");
    let err = transform_source(&source.name, &source.text).unwrap_err();
    let GoopError::Type(errors) = err else {
        panic!("expected type errors, got {err}");
    };
    let rendered = render_type_errors(errors.iter(), std::slice::from_ref(&source));
    assert!(rendered.starts_with("undefined.go:4:9: undefined: y"), "{rendered}");
    assert!(rendered.contains("return y / 2"), "{rendered}");
}

#[test]
fn package_directory_skips_test_files() {
    let sources = read_sources(&scripts_dir().join("meters")).unwrap();
    let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["route.go", "units.go"]);
}

#[test]
fn binary_writes_transformed_package() {
    let out = tempfile::tempdir().unwrap();
    let status = Command::new(env!("CARGO_BIN_EXE_goop"))
        .arg("--output")
        .arg(out.path())
        .arg(scripts_dir().join("meters"))
        .status()
        .unwrap();
    assert!(status.success());

    let route = fs::read_to_string(out.path().join("route.go")).unwrap();
    assert!(route.contains("sum = sum.Op_Add(leg)"), "{route}");
    assert!(route.contains("return a.Op_Less(b)"), "{route}");
    assert!(out.path().join("units.go").exists());
    assert!(!out.path().join("route_test.go").exists());
}

#[test]
fn binary_fails_on_type_errors() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fs::copy(scripts_dir().join("undefined.go"), src.path().join("undefined.go")).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_goop"))
        .arg("-o")
        .arg(out.path())
        .arg(src.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("undefined.go:4:9: undefined: y"), "{stderr}");
    assert!(!out.path().join("undefined.go").exists());
}
