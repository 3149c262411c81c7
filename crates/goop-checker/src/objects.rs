//! Declared entities and the scopes that name them.

use goop_core::{FileId, Span};
use rustc_hash::FxHashMap;
use std::ops::{Index, IndexMut};

use crate::constant::ConstValue;
use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

/// Predeclared functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Copy,
    Delete,
    Len,
    Make,
    New,
    Panic,
    Print,
    Println,
}

impl Builtin {
    pub const ALL: [Builtin; 10] = [
        Builtin::Append,
        Builtin::Cap,
        Builtin::Copy,
        Builtin::Delete,
        Builtin::Len,
        Builtin::Make,
        Builtin::New,
        Builtin::Panic,
        Builtin::Print,
        Builtin::Println,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
        }
    }

    /// Calls of these may stand alone as statements.
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            Builtin::Copy | Builtin::Delete | Builtin::Panic | Builtin::Print | Builtin::Println
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Var { used: bool },
    /// `value` is `None` until the declaration is checked.
    Const { value: Option<ConstValue> },
    TypeName { alias: bool },
    Func,
    PkgName { path: String, used: bool },
    Builtin(Builtin),
    Nil,
}

/// Declaration state used to detect cycles among package-level objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Not yet checked.
    White,
    /// Being checked.
    Grey,
    /// Done.
    Black,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    /// `None` until the declaration is checked.
    pub ty: Option<TypeId>,
    pub file: FileId,
    pub pos: Span,
    pub color: Color,
}

impl Object {
    pub fn new(name: impl Into<String>, kind: ObjectKind, file: FileId, pos: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty: None,
            file,
            pos,
            color: Color::White,
        }
    }

    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.ty = Some(ty);
        self.color = Color::Black;
        self
    }

    pub fn is_var(&self) -> bool {
        matches!(self.kind, ObjectKind::Var { .. })
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    /// A word for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Var { .. } => "variable",
            ObjectKind::Const { .. } => "constant",
            ObjectKind::TypeName { .. } => "type",
            ObjectKind::Func => "function",
            ObjectKind::PkgName { .. } => "package",
            ObjectKind::Builtin(_) => "built-in",
            ObjectKind::Nil => "nil",
        }
    }
}

/// Arena of every object of one checking run.
#[derive(Debug, Default)]
pub struct Objects {
    objects: Vec<Object>,
}

impl Objects {
    pub fn alloc(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Mark a variable or package name as used.
    pub fn mark_used(&mut self, id: ObjectId) {
        match &mut self[id].kind {
            ObjectKind::Var { used } | ObjectKind::PkgName { used, .. } => *used = true,
            _ => {}
        }
    }

    pub fn is_used(&self, id: ObjectId) -> bool {
        match &self[id].kind {
            ObjectKind::Var { used } | ObjectKind::PkgName { used, .. } => *used,
            _ => true,
        }
    }
}

impl Index<ObjectId> for Objects {
    type Output = Object;

    fn index(&self, id: ObjectId) -> &Object {
        &self.objects[id.0 as usize]
    }
}

impl IndexMut<ObjectId> for Objects {
    fn index_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.0 as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    File,
    Function,
    Block,
}

#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    names: FxHashMap<String, ObjectId>,
    /// Insertion order, for deterministic reporting.
    order: Vec<ObjectId>,
}

/// Arena of scopes linked to their parents.
#[derive(Debug, Default)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    pub fn new_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            kind,
            names: FxHashMap::default(),
            order: Vec::new(),
        });
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Insert `name`. Returns the existing object if the name is already
    /// declared in this scope; the blank name is never inserted.
    pub fn insert(&mut self, id: ScopeId, name: &str, object: ObjectId) -> Result<(), ObjectId> {
        if name == "_" {
            return Ok(());
        }
        let scope = &mut self.scopes[id.0 as usize];
        if let Some(&alt) = scope.names.get(name) {
            return Err(alt);
        }
        scope.names.insert(name.to_string(), object);
        scope.order.push(object);
        Ok(())
    }

    pub fn lookup_local(&self, id: ScopeId, name: &str) -> Option<ObjectId> {
        self.get(id).names.get(name).copied()
    }

    /// Look `name` up through the parent chain.
    pub fn lookup(&self, id: ScopeId, name: &str) -> Option<(ScopeId, ObjectId)> {
        let mut current = Some(id);
        while let Some(scope) = current {
            if let Some(object) = self.lookup_local(scope, name) {
                return Some((scope, object));
            }
            current = self.get(scope).parent;
        }
        None
    }

    /// Objects declared directly in `id`, in declaration order.
    pub fn objects(&self, id: ScopeId) -> &[ObjectId] {
        &self.get(id).order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(objects: &mut Objects, name: &str) -> ObjectId {
        objects.alloc(Object::new(
            name,
            ObjectKind::Var { used: false },
            FileId(0),
            Span::point(1, 1),
        ))
    }

    #[test]
    fn lookup_walks_parents() {
        let mut objects = Objects::default();
        let mut scopes = Scopes::default();
        let outer = scopes.new_scope(None, ScopeKind::Package);
        let inner = scopes.new_scope(Some(outer), ScopeKind::Block);

        let x = var(&mut objects, "x");
        scopes.insert(outer, "x", x).unwrap();
        assert_eq!(scopes.lookup(inner, "x"), Some((outer, x)));
        assert_eq!(scopes.lookup_local(inner, "x"), None);

        let shadow = var(&mut objects, "x");
        scopes.insert(inner, "x", shadow).unwrap();
        assert_eq!(scopes.lookup(inner, "x"), Some((inner, shadow)));
    }

    #[test]
    fn redeclaration_reports_existing() {
        let mut objects = Objects::default();
        let mut scopes = Scopes::default();
        let scope = scopes.new_scope(None, ScopeKind::Block);
        let a = var(&mut objects, "a");
        let b = var(&mut objects, "a");
        scopes.insert(scope, "a", a).unwrap();
        assert_eq!(scopes.insert(scope, "a", b), Err(a));
    }

    #[test]
    fn blank_is_never_declared() {
        let mut objects = Objects::default();
        let mut scopes = Scopes::default();
        let scope = scopes.new_scope(None, ScopeKind::Block);
        let a = var(&mut objects, "_");
        let b = var(&mut objects, "_");
        assert!(scopes.insert(scope, "_", a).is_ok());
        assert!(scopes.insert(scope, "_", b).is_ok());
        assert!(scopes.lookup(scope, "_").is_none());
    }

    #[test]
    fn usage_tracking() {
        let mut objects = Objects::default();
        let x = var(&mut objects, "x");
        assert!(!objects.is_used(x));
        objects.mark_used(x);
        assert!(objects.is_used(x));
    }
}
