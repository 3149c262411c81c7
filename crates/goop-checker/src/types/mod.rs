//! The type table.
//!
//! Structural types are interned: building the same type twice yields the
//! same [`TypeId`], so type identity is id equality. Named types are created
//! once per declaration and are never merged.
//!
//! The first ids are reserved for the basic kinds in [`BasicKind`] order,
//! followed by the predeclared `error` interface and the empty interface.

mod basic;
mod hash;
pub mod methodset;

pub use basic::{BasicInfo, BasicKind};
pub use hash::TypeHash;
pub use methodset::{LookupResult, MethodSet, MethodSetCache, Selection};

use rustc_hash::FxHashMap;
use std::fmt::Write as _;

/// Identity of an interned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const INVALID: TypeId = TypeId(0);

    #[inline]
    pub const fn basic(kind: BasicKind) -> TypeId {
        TypeId(kind as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a named type within the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedId(u32);

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub embedded: bool,
    pub tag: Option<String>,
}

/// A function type. The receiver of a method is not part of its signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Box<[TypeId]>,
    pub results: Box<[TypeId]>,
    /// The last parameter is `...T`, stored as `[]T`.
    pub variadic: bool,
}

/// An interface method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfaceMethod {
    pub name: String,
    pub sig: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Basic(BasicKind),
    Named(NamedId),
    Pointer(TypeId),
    Array { len: u64, elem: TypeId },
    Slice(TypeId),
    Map { key: TypeId, value: TypeId },
    Struct(Box<[Field]>),
    Signature(Signature),
    /// Methods sorted by name, embedded interfaces already flattened.
    Interface(Box<[IfaceMethod]>),
    /// Result list of a multi-value call.
    Tuple(Box<[TypeId]>),
}

/// A method declared on a named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub sig: TypeId,
    pub ptr_recv: bool,
}

/// A defined type.
#[derive(Debug, Clone)]
pub struct NamedType {
    pub name: String,
    /// Declaring package; `None` for predeclared types.
    pub pkg: Option<String>,
    /// `None` while the declaration is still being resolved.
    pub underlying: Option<TypeId>,
    /// Methods in declaration order.
    pub methods: Vec<Method>,
}

/// Interned storage for every type of one checking run.
#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<Type>,
    index: FxHashMap<Type, TypeId>,
    named: Vec<NamedType>,
    error_type: TypeId,
    empty_interface: TypeId,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            types: Vec::new(),
            index: FxHashMap::default(),
            named: Vec::new(),
            error_type: TypeId::INVALID,
            empty_interface: TypeId::INVALID,
        };
        for kind in BasicKind::ALL {
            let id = table.intern(Type::Basic(kind));
            debug_assert_eq!(id, TypeId::basic(kind));
        }

        let string = TypeId::basic(BasicKind::String);
        let error_sig = table.signature(Vec::new(), vec![string], false);
        let error_iface = table.interface(vec![IfaceMethod {
            name: "Error".to_string(),
            sig: error_sig,
        }]);
        let error_type = table.new_named("error", None);
        table.set_underlying(error_type, error_iface);
        table.error_type = error_type;
        table.empty_interface = table.interface(Vec::new());
        table
    }

    /// Intern a structural type.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.index.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.index.insert(ty, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // =========================================
    // Constructors
    // =========================================

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Pointer(elem))
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Slice(elem))
    }

    pub fn array(&mut self, len: u64, elem: TypeId) -> TypeId {
        self.intern(Type::Array { len, elem })
    }

    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(Type::Map { key, value })
    }

    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.intern(Type::Tuple(elems.into_boxed_slice()))
    }

    pub fn signature(&mut self, params: Vec<TypeId>, results: Vec<TypeId>, variadic: bool) -> TypeId {
        self.intern(Type::Signature(Signature {
            params: params.into_boxed_slice(),
            results: results.into_boxed_slice(),
            variadic,
        }))
    }

    pub fn struct_type(&mut self, fields: Vec<Field>) -> TypeId {
        self.intern(Type::Struct(fields.into_boxed_slice()))
    }

    /// Intern an interface; methods are sorted by name here.
    pub fn interface(&mut self, mut methods: Vec<IfaceMethod>) -> TypeId {
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        self.intern(Type::Interface(methods.into_boxed_slice()))
    }

    /// Create a new defined type with no underlying type yet.
    pub fn new_named(&mut self, name: impl Into<String>, pkg: Option<&str>) -> TypeId {
        let named = NamedId(self.named.len() as u32);
        self.named.push(NamedType {
            name: name.into(),
            pkg: pkg.map(str::to_string),
            underlying: None,
            methods: Vec::new(),
        });
        // Named entries never collide in the index.
        self.intern(Type::Named(named))
    }

    pub fn named(&self, id: TypeId) -> Option<&NamedType> {
        match self.get(id) {
            Type::Named(n) => self.named.get(n.0 as usize),
            _ => None,
        }
    }

    fn named_mut(&mut self, id: TypeId) -> Option<&mut NamedType> {
        match self.types[id.index()] {
            Type::Named(n) => self.named.get_mut(n.0 as usize),
            _ => None,
        }
    }

    /// Set the underlying type of a named type. The underlying type of a
    /// named type is never itself named.
    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) {
        let underlying = self.underlying(underlying);
        if let Some(n) = self.named_mut(named) {
            n.underlying = Some(underlying);
        }
    }

    pub fn add_method(&mut self, named: TypeId, method: Method) {
        if let Some(n) = self.named_mut(named) {
            n.methods.push(method);
        }
    }

    pub fn error_type(&self) -> TypeId {
        self.error_type
    }

    pub fn empty_interface(&self) -> TypeId {
        self.empty_interface
    }

    // =========================================
    // Structure queries
    // =========================================

    /// The underlying type; invalid for named types still being resolved.
    pub fn underlying(&self, id: TypeId) -> TypeId {
        match self.named(id) {
            Some(named) => named.underlying.unwrap_or(TypeId::INVALID),
            None => id,
        }
    }

    pub fn basic_kind(&self, id: TypeId) -> Option<BasicKind> {
        match self.get(id) {
            Type::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Basic kind of the underlying type.
    pub fn under_basic(&self, id: TypeId) -> Option<BasicKind> {
        self.basic_kind(self.underlying(id))
    }

    pub fn signature_of(&self, id: TypeId) -> Option<&Signature> {
        match self.get(self.underlying(id)) {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn struct_fields(&self, id: TypeId) -> Option<&[Field]> {
        match self.get(self.underlying(id)) {
            Type::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn interface_methods(&self, id: TypeId) -> Option<&[IfaceMethod]> {
        match self.get(self.underlying(id)) {
            Type::Interface(methods) => Some(methods),
            _ => None,
        }
    }

    pub fn tuple_elems(&self, id: TypeId) -> Option<&[TypeId]> {
        match self.get(id) {
            Type::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    /// Pointer base type, if `id` is a pointer (not through a name).
    pub fn pointer_elem(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Pointer(elem) => Some(*elem),
            _ => None,
        }
    }

    /// Pointer base type of the underlying type.
    pub fn under_pointer_elem(&self, id: TypeId) -> Option<TypeId> {
        self.pointer_elem(self.underlying(id))
    }

    /// `*T` becomes `(T, true)`; anything else is returned unchanged.
    pub fn deref(&self, id: TypeId) -> (TypeId, bool) {
        match self.pointer_elem(id) {
            Some(elem) => (elem, true),
            None => (id, false),
        }
    }

    // =========================================
    // Predicates
    // =========================================

    fn under_info(&self, id: TypeId) -> BasicInfo {
        self.under_basic(id)
            .map(BasicKind::info)
            .unwrap_or(BasicInfo::empty())
    }

    pub fn is_valid(&self, id: TypeId) -> bool {
        self.underlying(id) != TypeId::INVALID
    }

    /// Whether `id` is a named type whose declaration is still being
    /// resolved.
    pub fn is_pending(&self, id: TypeId) -> bool {
        self.named(id).is_some_and(|named| named.underlying.is_none())
    }

    pub fn is_untyped(&self, id: TypeId) -> bool {
        self.basic_kind(id).is_some_and(BasicKind::is_untyped)
    }

    pub fn is_typed(&self, id: TypeId) -> bool {
        !self.is_untyped(id)
    }

    pub fn is_boolean(&self, id: TypeId) -> bool {
        self.under_info(id).contains(BasicInfo::BOOLEAN)
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        self.under_info(id).contains(BasicInfo::INTEGER)
    }

    pub fn is_unsigned(&self, id: TypeId) -> bool {
        self.under_info(id).contains(BasicInfo::UNSIGNED)
    }

    pub fn is_float(&self, id: TypeId) -> bool {
        self.under_info(id).contains(BasicInfo::FLOAT)
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.under_info(id).intersects(BasicInfo::NUMERIC)
    }

    pub fn is_string(&self, id: TypeId) -> bool {
        self.under_info(id).contains(BasicInfo::STRING)
    }

    pub fn is_ordered(&self, id: TypeId) -> bool {
        self.under_info(id).intersects(BasicInfo::ORDERED)
    }

    pub fn is_numeric_or_string(&self, id: TypeId) -> bool {
        self.under_info(id)
            .intersects(BasicInfo::NUMERIC | BasicInfo::STRING)
    }

    pub fn is_const_type(&self, id: TypeId) -> bool {
        self.under_info(id).intersects(BasicInfo::CONST_TYPE)
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        matches!(self.get(self.underlying(id)), Type::Interface(_))
    }

    pub fn is_named(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Named(_))
    }

    /// Basic and named types carry a name.
    pub fn has_name(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Basic(_) | Type::Named(_))
    }

    pub fn has_nil(&self, id: TypeId) -> bool {
        match self.get(self.underlying(id)) {
            Type::Basic(kind) => *kind == BasicKind::UntypedNil,
            Type::Pointer(_)
            | Type::Slice(_)
            | Type::Map { .. }
            | Type::Signature(_)
            | Type::Interface(_) => true,
            _ => false,
        }
    }

    pub fn comparable(&self, id: TypeId) -> bool {
        match self.get(self.underlying(id)) {
            Type::Basic(kind) => *kind != BasicKind::UntypedNil,
            Type::Pointer(_) | Type::Interface(_) => true,
            Type::Struct(fields) => fields.iter().all(|f| self.comparable(f.ty)),
            Type::Array { elem, .. } => self.comparable(*elem),
            _ => false,
        }
    }

    /// `[]byte` or `[]rune`.
    pub fn is_bytes_or_runes(&self, id: TypeId) -> bool {
        match self.get(self.underlying(id)) {
            Type::Slice(elem) => matches!(
                self.under_basic(*elem),
                Some(BasicKind::Uint8 | BasicKind::Int32)
            ),
            _ => false,
        }
    }

    /// Default type of an untyped type; typed types are returned unchanged.
    pub fn default_type(&self, id: TypeId) -> TypeId {
        match self.basic_kind(id) {
            Some(kind) => TypeId::basic(kind.default_kind()),
            None => id,
        }
    }

    /// Type identity, ignoring struct tags.
    pub fn identical_ignore_tags(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Type::Pointer(x), Type::Pointer(y)) | (Type::Slice(x), Type::Slice(y)) => {
                self.identical_ignore_tags(*x, *y)
            }
            (Type::Array { len: l1, elem: e1 }, Type::Array { len: l2, elem: e2 }) => {
                l1 == l2 && self.identical_ignore_tags(*e1, *e2)
            }
            (Type::Map { key: k1, value: v1 }, Type::Map { key: k2, value: v2 }) => {
                self.identical_ignore_tags(*k1, *k2) && self.identical_ignore_tags(*v1, *v2)
            }
            (Type::Struct(f1), Type::Struct(f2)) => {
                f1.len() == f2.len()
                    && f1.iter().zip(f2.iter()).all(|(x, y)| {
                        x.name == y.name
                            && x.embedded == y.embedded
                            && self.identical_ignore_tags(x.ty, y.ty)
                    })
            }
            (Type::Signature(s1), Type::Signature(s2)) => {
                s1.variadic == s2.variadic
                    && self.all_identical_ignore_tags(&s1.params, &s2.params)
                    && self.all_identical_ignore_tags(&s1.results, &s2.results)
            }
            (Type::Tuple(t1), Type::Tuple(t2)) => self.all_identical_ignore_tags(t1, t2),
            _ => false,
        }
    }

    fn all_identical_ignore_tags(&self, a: &[TypeId], b: &[TypeId]) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b.iter())
                .all(|(x, y)| self.identical_ignore_tags(*x, *y))
    }

    // =========================================
    // Strings
    // =========================================

    /// Canonical spelling with every named type package-qualified.
    pub fn type_string(&self, id: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, id, None);
        out
    }

    /// Spelling for diagnostics: types of `local_pkg` are not qualified.
    pub fn display(&self, id: TypeId, local_pkg: &str) -> String {
        let mut out = String::new();
        self.write_type(&mut out, id, Some(local_pkg));
        out
    }

    /// Hash of the canonical spelling.
    pub fn type_hash(&self, id: TypeId) -> TypeHash {
        TypeHash::from_type_string(&self.type_string(id))
    }

    /// `"array"`, `"struct"`, ... for composite underlying types.
    pub fn composite_kind(&self, id: TypeId) -> Option<&'static str> {
        let kind = match self.get(self.underlying(id)) {
            Type::Basic(_) | Type::Named(_) => return None,
            Type::Pointer(_) => "pointer",
            Type::Array { .. } => "array",
            Type::Slice(_) => "slice",
            Type::Map { .. } => "map",
            Type::Struct(_) => "struct",
            Type::Signature(_) => "func",
            Type::Interface(_) => "interface",
            Type::Tuple(_) => "tuple",
        };
        Some(kind)
    }

    fn write_type(&self, out: &mut String, id: TypeId, local: Option<&str>) {
        match self.get(id) {
            Type::Basic(kind) => out.push_str(kind.name()),
            Type::Named(n) => {
                let named = &self.named[n.0 as usize];
                if let Some(pkg) = &named.pkg
                    && local != Some(pkg.as_str())
                {
                    out.push_str(pkg);
                    out.push('.');
                }
                out.push_str(&named.name);
            }
            Type::Pointer(elem) => {
                out.push('*');
                self.write_type(out, *elem, local);
            }
            Type::Array { len, elem } => {
                let _ = write!(out, "[{len}]");
                self.write_type(out, *elem, local);
            }
            Type::Slice(elem) => {
                out.push_str("[]");
                self.write_type(out, *elem, local);
            }
            Type::Map { key, value } => {
                out.push_str("map[");
                self.write_type(out, *key, local);
                out.push(']');
                self.write_type(out, *value, local);
            }
            Type::Struct(fields) => {
                out.push_str("struct{");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if !field.embedded {
                        out.push_str(&field.name);
                        out.push(' ');
                    }
                    self.write_type(out, field.ty, local);
                    if let Some(tag) = &field.tag {
                        out.push(' ');
                        out.push_str(tag);
                    }
                }
                out.push('}');
            }
            Type::Signature(sig) => {
                out.push_str("func");
                self.write_signature(out, sig, local);
            }
            Type::Interface(methods) => {
                out.push_str("interface{");
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    out.push_str(&method.name);
                    if let Type::Signature(sig) = self.get(method.sig) {
                        self.write_signature(out, sig, local);
                    }
                }
                out.push('}');
            }
            Type::Tuple(elems) => {
                out.push('(');
                self.write_list(out, elems, false, local);
                out.push(')');
            }
        }
    }

    fn write_signature(&self, out: &mut String, sig: &Signature, local: Option<&str>) {
        out.push('(');
        self.write_list(out, &sig.params, sig.variadic, local);
        out.push(')');
        match sig.results.as_ref() {
            [] => {}
            [single] if !matches!(self.get(*single), Type::Tuple(_)) => {
                out.push(' ');
                self.write_type(out, *single, local);
            }
            results => {
                out.push_str(" (");
                self.write_list(out, results, false, local);
                out.push(')');
            }
        }
    }

    fn write_list(&self, out: &mut String, list: &[TypeId], variadic: bool, local: Option<&str>) {
        for (i, ty) in list.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if variadic && i + 1 == list.len() {
                out.push_str("...");
                match self.get(*ty) {
                    Type::Slice(elem) => self.write_type(out, *elem, local),
                    _ => self.write_type(out, *ty, local),
                }
            } else {
                self.write_type(out, *ty, local);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT: TypeId = TypeId::basic(BasicKind::Int);
    const FLOAT32: TypeId = TypeId::basic(BasicKind::Float32);
    const STRING: TypeId = TypeId::basic(BasicKind::String);

    #[test]
    fn basics_have_fixed_ids() {
        let table = TypeTable::new();
        assert_eq!(table.basic_kind(INT), Some(BasicKind::Int));
        assert_eq!(table.get(TypeId::INVALID), &Type::Basic(BasicKind::Invalid));
        assert!(!table.is_valid(TypeId::INVALID));
    }

    #[test]
    fn structural_types_are_interned() {
        let mut table = TypeTable::new();
        let a = table.slice(INT);
        let b = table.slice(INT);
        assert_eq!(a, b);
        let p1 = table.pointer(a);
        let p2 = table.pointer(b);
        assert_eq!(p1, p2);
        assert_ne!(table.array(4, INT), table.array(3, INT));
    }

    #[test]
    fn named_types_are_distinct() {
        let mut table = TypeTable::new();
        let a = table.new_named("T", Some("main"));
        let b = table.new_named("T", Some("main"));
        assert_ne!(a, b);
        assert_eq!(table.type_string(a), table.type_string(b));
    }

    #[test]
    fn underlying_of_named() {
        let mut table = TypeTable::new();
        let vec4 = table.new_named("vec4", Some("main"));
        assert_eq!(table.underlying(vec4), TypeId::INVALID);
        assert!(table.is_pending(vec4));
        let arr = table.array(4, FLOAT32);
        table.set_underlying(vec4, arr);
        assert_eq!(table.underlying(vec4), arr);
        assert!(!table.is_pending(vec4));
        assert!(!table.is_pending(arr));

        let other = table.new_named("other", Some("main"));
        table.set_underlying(other, vec4);
        assert_eq!(table.underlying(other), arr);
    }

    #[test]
    fn type_strings() {
        let mut table = TypeTable::new();
        let vec4 = table.new_named("vec4", Some("main"));
        let arr = table.array(4, FLOAT32);
        table.set_underlying(vec4, arr);

        let ptr = table.pointer(vec4);
        assert_eq!(table.type_string(ptr), "*main.vec4");
        assert_eq!(table.display(ptr, "main"), "*vec4");
        assert_eq!(table.type_string(arr), "[4]float32");

        let strs = table.slice(STRING);
        let err = table.error_type();
        let sig = table.signature(vec![INT, strs], vec![INT, err], true);
        assert_eq!(table.type_string(sig), "func(int, ...string) (int, error)");

        let m = table.map(STRING, INT);
        assert_eq!(table.type_string(m), "map[string]int");

        let s = table.struct_type(vec![
            Field {
                name: "x".into(),
                ty: INT,
                embedded: false,
                tag: None,
            },
            Field {
                name: "vec4".into(),
                ty: vec4,
                embedded: true,
                tag: Some("`json:\"v\"`".into()),
            },
        ]);
        assert_eq!(table.display(s, "main"), "struct{x int; vec4 `json:\"v\"`}");
    }

    #[test]
    fn predicates() {
        let mut table = TypeTable::new();
        let untyped = TypeId::basic(BasicKind::UntypedFloat);
        assert!(table.is_untyped(untyped));
        assert_eq!(table.default_type(untyped), TypeId::basic(BasicKind::Float64));
        assert!(table.is_numeric(FLOAT32));
        assert!(table.is_ordered(STRING));

        let bytes = table.slice(TypeId::basic(BasicKind::Uint8));
        assert!(table.is_bytes_or_runes(bytes));
        assert!(table.has_nil(bytes));
        assert!(!table.comparable(bytes));

        let err = table.error_type();
        assert!(table.is_interface(err));
        assert!(table.comparable(err));
    }

    #[test]
    fn identical_ignoring_tags() {
        let mut table = TypeTable::new();
        let field = |tag: Option<&str>| Field {
            name: "x".into(),
            ty: INT,
            embedded: false,
            tag: tag.map(str::to_string),
        };
        let a = table.struct_type(vec![field(Some("`a`"))]);
        let b = table.struct_type(vec![field(None)]);
        assert_ne!(a, b);
        assert!(table.identical_ignore_tags(a, b));
        let pa = table.pointer(a);
        let pb = table.pointer(b);
        assert!(table.identical_ignore_tags(pa, pb));
    }
}
