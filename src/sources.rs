//! Reading package sources and writing transformed files.

use std::fs;
use std::path::{Path, PathBuf};

use goop_core::GoopError;

use crate::unit::{Output, Source};

/// The `.go` files of `dir`, sorted by name. Test files (`_test.go`) and
/// subdirectories are skipped.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>, GoopError> {
    let entries = fs::read_dir(dir).map_err(|e| GoopError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GoopError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".go") && !name.ends_with("_test.go") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read every source file of the package in `dir`.
pub fn read_sources(dir: &Path) -> Result<Vec<Source>, GoopError> {
    let paths = discover_sources(dir)?;
    if paths.is_empty() {
        return Err(GoopError::NoSources(dir.to_path_buf()));
    }
    paths
        .into_iter()
        .map(|path| {
            let text = fs::read_to_string(&path).map_err(|e| GoopError::io(&path, e))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(Source { name, text })
        })
        .collect()
}

/// Write `outputs` into `dir`, creating it if needed. Returns the written
/// paths in order.
pub fn write_outputs(dir: &Path, outputs: &[Output]) -> Result<Vec<PathBuf>, GoopError> {
    fs::create_dir_all(dir).map_err(|e| GoopError::io(dir, e))?;
    outputs
        .iter()
        .map(|output| {
            let path = dir.join(&output.name);
            fs::write(&path, &output.text).map_err(|e| GoopError::io(&path, e))?;
            tracing::debug!(path = %path.display(), "written");
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.go", "a.go", "a_test.go", "notes.txt"] {
            fs::write(dir.path().join(name), "package main\n").unwrap();
        }
        fs::create_dir(dir.path().join("sub.go")).unwrap();

        let names: Vec<_> = discover_sources(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.go", "b.go"]);
    }

    #[test]
    fn empty_directory_has_no_sources() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_sources(dir.path()).unwrap_err();
        assert!(matches!(err, GoopError::NoSources(_)));
    }

    #[test]
    fn outputs_land_in_a_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let outputs = [Output {
            name: "main.go".into(),
            text: "package main\n".into(),
        }];
        let written = write_outputs(&out, &outputs).unwrap();
        assert_eq!(written, [out.join("main.go")]);
        assert_eq!(fs::read_to_string(out.join("main.go")).unwrap(), "package main\n");
    }
}
