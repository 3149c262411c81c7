//! Importable packages.
//!
//! Imports are resolved against a [`PackageRegistry`] rather than by reading
//! other source trees. Each registered package describes its exported
//! functions, constants and variables with [`TypeDesc`]s; the checker turns
//! them into objects the first time a file imports the package.
//!
//! ```
//! use goop_checker::registry::{FuncDesc, PackageDesc, PackageRegistry, TypeDesc};
//! use goop_checker::types::BasicKind;
//!
//! let mut registry = PackageRegistry::with_std();
//! registry
//!     .register(PackageDesc::new("geom").func(
//!         "Dot",
//!         FuncDesc::new(
//!             vec![TypeDesc::Basic(BasicKind::Float64); 2],
//!             vec![TypeDesc::Basic(BasicKind::Float64)],
//!         ),
//!     ))
//!     .unwrap();
//! assert!(registry.get("geom").is_some());
//! assert!(registry.get("fmt").is_some());
//! ```

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::constant::ConstValue;
use crate::types::BasicKind;

/// Type of a registered member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    Basic(BasicKind),
    Slice(Box<TypeDesc>),
    /// The empty interface.
    Any,
    /// The predeclared `error` interface.
    Error,
}

impl TypeDesc {
    pub fn slice_of(elem: TypeDesc) -> Self {
        TypeDesc::Slice(Box::new(elem))
    }
}

/// Signature of a registered function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDesc {
    pub params: Vec<TypeDesc>,
    pub results: Vec<TypeDesc>,
    /// The last parameter is `...T`; it is described by its slice type.
    pub variadic: bool,
}

impl FuncDesc {
    pub fn new(params: Vec<TypeDesc>, results: Vec<TypeDesc>) -> Self {
        Self {
            params,
            results,
            variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberDesc {
    Func(FuncDesc),
    Const { ty: BasicKind, value: ConstValue },
    Var(TypeDesc),
}

/// One importable package.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDesc {
    pub path: String,
    /// Name the package is referred to by; the last path element.
    pub name: String,
    members: Vec<(String, MemberDesc)>,
}

impl PackageDesc {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            path,
            name,
            members: Vec::new(),
        }
    }

    pub fn func(mut self, name: impl Into<String>, desc: FuncDesc) -> Self {
        self.members.push((name.into(), MemberDesc::Func(desc)));
        self
    }

    pub fn constant(mut self, name: impl Into<String>, ty: BasicKind, value: ConstValue) -> Self {
        self.members
            .push((name.into(), MemberDesc::Const { ty, value }));
        self
    }

    pub fn var(mut self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.members.push((name.into(), MemberDesc::Var(ty)));
        self
    }

    /// Members in registration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &MemberDesc)> {
        self.members.iter().map(|(name, desc)| (name.as_str(), desc))
    }

    pub fn member(&self, name: &str) -> Option<&MemberDesc> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, desc)| desc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("package {0:?} is already registered")]
    DuplicatePackage(String),
}

/// Packages available to `import`.
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: FxHashMap<String, PackageDesc>,
}

impl PackageRegistry {
    /// An empty registry: every import is an error.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with `fmt`, `math` and `strings`.
    pub fn with_std() -> Self {
        let mut registry = Self::new();
        for package in [fmt_package(), math_package(), strings_package()] {
            registry.packages.insert(package.path.clone(), package);
        }
        registry
    }

    pub fn register(&mut self, package: PackageDesc) -> Result<(), RegistryError> {
        if self.packages.contains_key(&package.path) {
            return Err(RegistryError::DuplicatePackage(package.path));
        }
        self.packages.insert(package.path.clone(), package);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&PackageDesc> {
        self.packages.get(path)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

// =========================================
// Standard packages
// =========================================

const INT: TypeDesc = TypeDesc::Basic(BasicKind::Int);
const FLOAT64: TypeDesc = TypeDesc::Basic(BasicKind::Float64);
const STRING: TypeDesc = TypeDesc::Basic(BasicKind::String);
const BOOL: TypeDesc = TypeDesc::Basic(BasicKind::Bool);

fn any_slice() -> TypeDesc {
    TypeDesc::slice_of(TypeDesc::Any)
}

fn fmt_package() -> PackageDesc {
    let print = || FuncDesc::new(vec![any_slice()], vec![INT, TypeDesc::Error]).variadic();
    let printf = || FuncDesc::new(vec![STRING, any_slice()], vec![INT, TypeDesc::Error]).variadic();
    let sprint = || FuncDesc::new(vec![any_slice()], vec![STRING]).variadic();
    PackageDesc::new("fmt")
        .func("Print", print())
        .func("Println", print())
        .func("Printf", printf())
        .func("Sprint", sprint())
        .func("Sprintln", sprint())
        .func(
            "Sprintf",
            FuncDesc::new(vec![STRING, any_slice()], vec![STRING]).variadic(),
        )
        .func(
            "Errorf",
            FuncDesc::new(vec![STRING, any_slice()], vec![TypeDesc::Error]).variadic(),
        )
}

fn math_package() -> PackageDesc {
    let unary = || FuncDesc::new(vec![FLOAT64], vec![FLOAT64]);
    let binary = || FuncDesc::new(vec![FLOAT64, FLOAT64], vec![FLOAT64]);
    PackageDesc::new("math")
        .func("Abs", unary())
        .func("Sqrt", unary())
        .func("Floor", unary())
        .func("Ceil", unary())
        .func("Max", binary())
        .func("Min", binary())
        .func("Pow", binary())
        .constant(
            "Pi",
            BasicKind::UntypedFloat,
            ConstValue::Float(OrderedFloat(std::f64::consts::PI)),
        )
        .constant(
            "E",
            BasicKind::UntypedFloat,
            ConstValue::Float(OrderedFloat(std::f64::consts::E)),
        )
}

fn strings_package() -> PackageDesc {
    let transform = || FuncDesc::new(vec![STRING], vec![STRING]);
    PackageDesc::new("strings")
        .func("Repeat", FuncDesc::new(vec![STRING, INT], vec![STRING]))
        .func("ToUpper", transform())
        .func("ToLower", transform())
        .func("TrimSpace", transform())
        .func("Contains", FuncDesc::new(vec![STRING, STRING], vec![BOOL]))
        .func(
            "Join",
            FuncDesc::new(vec![TypeDesc::slice_of(STRING), STRING], vec![STRING]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_packages() {
        let registry = PackageRegistry::with_std();
        assert_eq!(registry.len(), 3);
        let fmt = registry.get("fmt").unwrap();
        assert_eq!(fmt.name, "fmt");
        match fmt.member("Println") {
            Some(MemberDesc::Func(desc)) => {
                assert!(desc.variadic);
                assert_eq!(desc.results.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            registry.get("math").unwrap().member("Pi"),
            Some(MemberDesc::Const { ty: BasicKind::UntypedFloat, .. })
        ));
        assert!(registry.get("os").is_none());
    }

    #[test]
    fn package_name_is_last_path_element() {
        assert_eq!(PackageDesc::new("example.com/lin/geom").name, "geom");
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = PackageRegistry::with_std();
        let err = registry.register(PackageDesc::new("fmt")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicatePackage("fmt".into()));
    }

    #[test]
    fn members_keep_order() {
        let desc = PackageDesc::new("p")
            .var("Count", INT)
            .func("F", FuncDesc::new(vec![], vec![]));
        let names: Vec<_> = desc.members().map(|(n, _)| n).collect();
        assert_eq!(names, ["Count", "F"]);
    }
}
