//! Method sets and field/method lookup through embedded fields.
//!
//! Both walks proceed breadth-first by embedding depth. A name found at a
//! shallower depth hides the same name further down; the same name found
//! twice at one depth is a collision.

use super::{Type, TypeId, TypeTable};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

/// A method reachable from some receiver type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    /// Signature without the receiver.
    pub sig: TypeId,
    /// Field indices walked through embedded fields, then the method index.
    pub index: Vec<usize>,
    /// A pointer was dereferenced on the way to the method.
    pub indirect: bool,
    /// The method is declared with a pointer receiver.
    pub ptr_recv: bool,
}

/// Methods of a type, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet {
    entries: Vec<Selection>,
}

impl MethodSet {
    /// Compute the method set of `ty`.
    ///
    /// Methods with pointer receivers belong to the set of `*T` and of any
    /// type reaching them through an embedded pointer.
    pub fn new(types: &TypeTable, ty: TypeId) -> Self {
        let (base, is_ptr) = types.deref(ty);
        if is_ptr && types.is_interface(base) {
            return Self::default();
        }

        // `None` marks a collision.
        let mut found: FxHashMap<String, Option<Selection>> = FxHashMap::default();
        let mut seen = FxHashSet::default();
        let mut current = vec![Embedded {
            ty: base,
            index: Vec::new(),
            indirect: is_ptr,
            multiples: false,
        }];

        while !current.is_empty() {
            let mut next = Vec::new();
            let mut fields: FxHashSet<&str> = FxHashSet::default();
            let mut methods: FxHashMap<String, Option<Selection>> = FxHashMap::default();

            for e in &current {
                if let Some(named) = types.named(e.ty) {
                    if !seen.insert(e.ty) {
                        continue;
                    }
                    for (i, m) in named.methods.iter().enumerate() {
                        let entry = methods.get(&m.name);
                        if !e.multiples && entry.is_none() && (e.indirect || !m.ptr_recv) {
                            methods.insert(
                                m.name.clone(),
                                Some(Selection {
                                    name: m.name.clone(),
                                    sig: m.sig,
                                    index: concat(&e.index, i),
                                    indirect: e.indirect,
                                    ptr_recv: m.ptr_recv,
                                }),
                            );
                        } else {
                            methods.insert(m.name.clone(), None);
                        }
                    }
                }

                match types.get(types.underlying(e.ty)) {
                    Type::Struct(struct_fields) => {
                        for (i, f) in struct_fields.iter().enumerate() {
                            fields.insert(f.name.as_str());
                            if f.embedded {
                                let (fty, fptr) = types.deref(f.ty);
                                next.push(Embedded {
                                    ty: fty,
                                    index: concat(&e.index, i),
                                    indirect: e.indirect || fptr,
                                    multiples: e.multiples,
                                });
                            }
                        }
                    }
                    Type::Interface(iface) => {
                        for (i, m) in iface.iter().enumerate() {
                            let selection = (!e.multiples && !methods.contains_key(&m.name))
                                .then(|| Selection {
                                    name: m.name.clone(),
                                    sig: m.sig,
                                    index: concat(&e.index, i),
                                    indirect: true,
                                    ptr_recv: false,
                                });
                            methods.insert(m.name.clone(), selection);
                        }
                    }
                    _ => {}
                }
            }

            for (name, m) in methods {
                if !found.contains_key(&name) {
                    let m = if fields.contains(name.as_str()) { None } else { m };
                    found.insert(name, m);
                }
            }
            for name in fields {
                if !found.contains_key(name) {
                    found.insert(name.to_string(), None);
                }
            }
            current = consolidate_multiples(next);
        }

        let mut entries: Vec<Selection> = found.into_values().flatten().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.entries.iter()
    }

    pub fn lookup(&self, name: &str) -> Option<&Selection> {
        self.entries
            .binary_search_by(|s| s.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Every method whose name starts with `prefix`, in name order.
    pub fn with_prefix(&self, prefix: &str) -> &[Selection] {
        let start = self.entries.partition_point(|s| s.name.as_str() < prefix);
        let len = self.entries[start..]
            .iter()
            .take_while(|s| s.name.starts_with(prefix))
            .count();
        &self.entries[start..start + len]
    }
}

/// Method sets computed once per type.
///
/// Adding a method to any named type invalidates the whole cache, since the
/// type may be embedded anywhere.
#[derive(Debug, Default)]
pub struct MethodSetCache {
    sets: FxHashMap<TypeId, Rc<MethodSet>>,
}

impl MethodSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, types: &TypeTable, ty: TypeId) -> Rc<MethodSet> {
        self.sets
            .entry(ty)
            .or_insert_with(|| Rc::new(MethodSet::new(types, ty)))
            .clone()
    }

    pub fn invalidate(&mut self) {
        self.sets.clear();
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Outcome of looking up `x.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    Field {
        ty: TypeId,
        index: Vec<usize>,
        indirect: bool,
    },
    Method(Selection),
    /// The method needs a pointer receiver and the operand is neither a
    /// pointer nor addressable.
    NeedsPointerReceiver,
    /// The name occurs more than once at the shallowest depth.
    Ambiguous,
    NotFound,
}

/// Find the field or method `name` of `ty`.
pub fn lookup_field_or_method(
    types: &TypeTable,
    ty: TypeId,
    addressable: bool,
    name: &str,
) -> LookupResult {
    if name == "_" {
        return LookupResult::NotFound;
    }
    let (base, is_ptr) = types.deref(ty);
    if is_ptr && types.is_interface(base) {
        return LookupResult::NotFound;
    }

    let mut seen = FxHashSet::default();
    let mut current = vec![Embedded {
        ty: base,
        index: Vec::new(),
        indirect: is_ptr,
        multiples: false,
    }];

    while !current.is_empty() {
        let mut next = Vec::new();
        let mut result: Option<LookupResult> = None;

        for e in &current {
            if let Some(named) = types.named(e.ty) {
                if !seen.insert(e.ty) {
                    continue;
                }
                if let Some((i, m)) = named.methods.iter().enumerate().find(|(_, m)| m.name == name)
                {
                    if result.is_some() || e.multiples {
                        return LookupResult::Ambiguous;
                    }
                    result = Some(LookupResult::Method(Selection {
                        name: m.name.clone(),
                        sig: m.sig,
                        index: concat(&e.index, i),
                        indirect: e.indirect,
                        ptr_recv: m.ptr_recv,
                    }));
                    continue;
                }
            }

            match types.get(types.underlying(e.ty)) {
                Type::Struct(fields) => {
                    for (i, f) in fields.iter().enumerate() {
                        if f.name == name {
                            if result.is_some() || e.multiples {
                                return LookupResult::Ambiguous;
                            }
                            result = Some(LookupResult::Field {
                                ty: f.ty,
                                index: concat(&e.index, i),
                                indirect: e.indirect,
                            });
                            continue;
                        }
                        if result.is_none() && f.embedded {
                            let (fty, fptr) = types.deref(f.ty);
                            next.push(Embedded {
                                ty: fty,
                                index: concat(&e.index, i),
                                indirect: e.indirect || fptr,
                                multiples: e.multiples,
                            });
                        }
                    }
                }
                Type::Interface(methods) => {
                    if let Some((i, m)) = methods.iter().enumerate().find(|(_, m)| m.name == name) {
                        if result.is_some() || e.multiples {
                            return LookupResult::Ambiguous;
                        }
                        result = Some(LookupResult::Method(Selection {
                            name: m.name.clone(),
                            sig: m.sig,
                            index: concat(&e.index, i),
                            indirect: e.indirect,
                            ptr_recv: false,
                        }));
                    }
                }
                _ => {}
            }
        }

        if let Some(result) = result {
            if let LookupResult::Method(sel) = &result
                && sel.ptr_recv
                && !sel.indirect
                && !addressable
            {
                return LookupResult::NeedsPointerReceiver;
            }
            return result;
        }
        current = consolidate_multiples(next);
    }
    LookupResult::NotFound
}

struct Embedded {
    ty: TypeId,
    index: Vec<usize>,
    indirect: bool,
    /// The type was reached along more than one path at this depth.
    multiples: bool,
}

fn concat(index: &[usize], i: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(index.len() + 1);
    out.extend_from_slice(index);
    out.push(i);
    out
}

fn consolidate_multiples(list: Vec<Embedded>) -> Vec<Embedded> {
    let mut out: Vec<Embedded> = Vec::with_capacity(list.len());
    let mut positions: FxHashMap<TypeId, usize> = FxHashMap::default();
    for e in list {
        match positions.get(&e.ty) {
            Some(&i) => out[i].multiples = true,
            None => {
                positions.insert(e.ty, out.len());
                out.push(e);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BasicKind, Field, Method};

    const FLOAT32: TypeId = TypeId::basic(BasicKind::Float32);

    fn method(table: &mut TypeTable, name: &str, arg: TypeId, ptr_recv: bool) -> Method {
        let sig = table.signature(vec![arg], vec![arg], false);
        Method {
            name: name.to_string(),
            sig,
            ptr_recv,
        }
    }

    fn vec4(table: &mut TypeTable) -> TypeId {
        let vec4 = table.new_named("vec4", Some("main"));
        let arr = table.array(4, FLOAT32);
        table.set_underlying(vec4, arr);
        for (name, ptr) in [
            ("Op_SubtractScalar", false),
            ("Op_Add", false),
            ("Op_Multiply", true),
            ("Op_Subtract", false),
        ] {
            let m = method(table, name, vec4, ptr);
            table.add_method(vec4, m);
        }
        vec4
    }

    fn field(name: &str, ty: TypeId, embedded: bool) -> Field {
        Field {
            name: name.to_string(),
            ty,
            embedded,
            tag: None,
        }
    }

    #[test]
    fn value_set_excludes_pointer_methods() {
        let mut table = TypeTable::new();
        let v = vec4(&mut table);
        let set = MethodSet::new(&table, v);
        let names: Vec<_> = set.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Op_Add", "Op_Subtract", "Op_SubtractScalar"]);

        let ptr = table.pointer(v);
        let set = MethodSet::new(&table, ptr);
        assert_eq!(set.len(), 4);
        assert!(set.lookup("Op_Multiply").is_some_and(|s| s.ptr_recv));
    }

    #[test]
    fn prefix_queries_are_sorted() {
        let mut table = TypeTable::new();
        let v = vec4(&mut table);
        let set = MethodSet::new(&table, v);
        let names: Vec<_> = set
            .with_prefix("Op_Subtract")
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, ["Op_Subtract", "Op_SubtractScalar"]);
        assert!(set.with_prefix("Op_Divide").is_empty());
        assert!(set.with_prefix("Z").is_empty());
    }

    #[test]
    fn promoted_through_embedded_pointer() {
        let mut table = TypeTable::new();
        let v = vec4(&mut table);
        let pv = table.pointer(v);
        let outer = table.new_named("outer", Some("main"));
        let s = table.struct_type(vec![field("vec4", pv, true)]);
        table.set_underlying(outer, s);

        let set = MethodSet::new(&table, outer);
        let sel = set.lookup("Op_Multiply").unwrap();
        assert!(sel.indirect);
        assert_eq!(sel.index, [0, 2]);
    }

    #[test]
    fn field_hides_method_at_same_depth() {
        let mut table = TypeTable::new();
        let v = vec4(&mut table);
        let s = table.struct_type(vec![field("vec4", v, true), field("Op_Add", FLOAT32, false)]);
        let set = MethodSet::new(&table, s);
        assert!(set.lookup("Op_Add").is_none());
        assert!(set.lookup("Op_Subtract").is_some());
    }

    #[test]
    fn interface_methods() {
        let table = TypeTable::new();
        let set = MethodSet::new(&table, table.error_type());
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().name, "Error");
    }

    #[test]
    fn lookup_fields_and_methods() {
        let mut table = TypeTable::new();
        let v = vec4(&mut table);
        let s = table.struct_type(vec![field("x", FLOAT32, false), field("vec4", v, true)]);

        assert!(matches!(
            lookup_field_or_method(&table, s, false, "x"),
            LookupResult::Field { ty, .. } if ty == FLOAT32
        ));
        assert!(matches!(
            lookup_field_or_method(&table, s, false, "Op_Add"),
            LookupResult::Method(ref sel) if sel.index == [1, 1]
        ));
        assert_eq!(
            lookup_field_or_method(&table, s, false, "Op_Multiply"),
            LookupResult::NeedsPointerReceiver
        );
        assert!(matches!(
            lookup_field_or_method(&table, s, true, "Op_Multiply"),
            LookupResult::Method(_)
        ));
        assert_eq!(lookup_field_or_method(&table, s, true, "y"), LookupResult::NotFound);
    }

    #[test]
    fn same_depth_collision_is_ambiguous() {
        let mut table = TypeTable::new();
        let a = table.new_named("A", Some("main"));
        let b = table.new_named("B", Some("main"));
        let inner = table.struct_type(vec![field("n", FLOAT32, false)]);
        table.set_underlying(a, inner);
        table.set_underlying(b, inner);
        let s = table.struct_type(vec![field("A", a, true), field("B", b, true)]);
        assert_eq!(
            lookup_field_or_method(&table, s, false, "n"),
            LookupResult::Ambiguous
        );
    }

    #[test]
    fn cache_reuses_and_invalidates() {
        let mut table = TypeTable::new();
        let v = vec4(&mut table);
        let mut cache = MethodSetCache::new();
        let first = cache.get(&table, v);
        let second = cache.get(&table, v);
        assert!(Rc::ptr_eq(&first, &second));
        cache.invalidate();
        assert!(cache.is_empty());
    }
}
