//! Collection of package-level objects and the top-level checking phases.

use goop_core::{FileId, Span, TypeErrorKind};
use goop_parser::ast::{Decl, DeclKeyword, Expr, FuncDecl, GenDecl, ImportSpec, Spec, ValueSpec};

use super::{Checker, DeclInfo};
use crate::objects::{Object, ObjectId, ObjectKind, ScopeId, ScopeKind};
use crate::registry::{MemberDesc, TypeDesc};
use crate::types::TypeId;

/// Name of the receiver base type: `T` for `T`, `*T` and `(*T)`.
fn receiver_base_name<'ast>(e: Expr<'ast>) -> Option<&'ast str> {
    match e.unparen() {
        Expr::Star(star) => match star.x.unparen() {
            Expr::Ident(ident) => Some(ident.name),
            _ => None,
        },
        Expr::Ident(ident) => Some(ident.name),
        _ => None,
    }
}

impl<'a, 'ast> Checker<'a, 'ast> {
    /// Run every checking phase over the package.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn check_files(&mut self) {
        self.collect_objects();
        self.package_objects();
        self.orphan_methods();

        while let Some(body) = self.bodies.pop_front() {
            self.func_body(body);
        }

        self.check_map_keys();
        self.unused_imports();
        self.record_untyped();
    }

    // =========================================
    // Collection
    // =========================================

    fn collect_objects(&mut self) {
        let files = self.files;
        for (i, file) in files.iter().enumerate() {
            let file_id = FileId(i as u32);
            let scope = self.scopes.new_scope(Some(self.pkg_scope), ScopeKind::File);
            self.file_scopes.push(scope);
            self.env.file = file_id;
            self.env.scope = scope;

            if file.package.name != self.pkg_name {
                let msg = format!(
                    "package {}; expected package {}",
                    file.package.name, self.pkg_name
                );
                self.error(TypeErrorKind::Other, file.package.span, msg);
                continue;
            }

            for decl in file.decls {
                match decl {
                    Decl::Gen(g) => self.collect_gen_decl(file_id, scope, g),
                    Decl::Func(f) => self.collect_func(file_id, f),
                }
            }
        }

        // Imports and package members share one namespace.
        for i in 0..self.file_scopes.len() {
            let scope = self.file_scopes[i];
            self.env.file = FileId(i as u32);
            for &obj in self.scopes.objects(scope).to_vec().iter() {
                let name = self.objects[obj].name.clone();
                if let Some(alt) = self.scopes.lookup_local(self.pkg_scope, &name) {
                    let path = match &self.objects[obj].kind {
                        ObjectKind::PkgName { path, .. } => path.clone(),
                        _ => continue,
                    };
                    let pos = self.objects[alt].pos;
                    self.env.file = self.objects[alt].file;
                    let msg = format!("{name} already declared through import of package {path}");
                    self.error(TypeErrorKind::Redeclared, pos, msg);
                }
            }
        }
    }

    fn collect_gen_decl(&mut self, file: FileId, scope: ScopeId, g: &'ast GenDecl<'ast>) {
        match g.keyword {
            DeclKeyword::Import => {
                for spec in g.specs {
                    if let Spec::Import(s) = spec {
                        self.collect_import(scope, s);
                    }
                }
            }
            DeclKeyword::Const => {
                let mut last: Option<&'ast ValueSpec<'ast>> = None;
                for spec in g.specs {
                    let Spec::Value(s) = spec else {
                        continue;
                    };
                    let inherited = s.ty.is_none() && s.values.is_empty() && last.is_some();
                    if !inherited {
                        last = Some(s);
                    }
                    let source = last.unwrap_or(s);
                    for (i, name) in s.names.iter().enumerate() {
                        let obj = self.objects.alloc(Object::new(
                            name.name,
                            ObjectKind::Const { value: None },
                            file,
                            name.span,
                        ));
                        self.declare(self.pkg_scope, obj);
                        self.decls.insert(
                            obj,
                            DeclInfo::Const {
                                file,
                                ty: source.ty,
                                init: source.values.get(i).copied(),
                                iota: s.iota,
                                inherited,
                            },
                        );
                    }
                    self.arity(s, source.values, true, inherited);
                }
            }
            DeclKeyword::Var => {
                for spec in g.specs {
                    let Spec::Value(s) = spec else {
                        continue;
                    };
                    let lhs: Vec<ObjectId> = s
                        .names
                        .iter()
                        .map(|name| {
                            self.objects.alloc(Object::new(
                                name.name,
                                ObjectKind::Var { used: false },
                                file,
                                name.span,
                            ))
                        })
                        .collect();
                    // One multi-value initializer is shared by every name.
                    let shared = (s.values.len() == 1 && lhs.len() > 1).then(|| lhs.clone());
                    for (i, &obj) in lhs.iter().enumerate() {
                        let init = match &shared {
                            Some(_) => s.values.first().copied(),
                            None => s.values.get(i).copied(),
                        };
                        self.declare(self.pkg_scope, obj);
                        self.decls.insert(
                            obj,
                            DeclInfo::Var {
                                file,
                                lhs: shared.clone(),
                                ty: s.ty,
                                init,
                            },
                        );
                    }
                    if s.ty.is_none() || !s.values.is_empty() {
                        self.arity(s, s.values, false, false);
                    }
                }
            }
            DeclKeyword::Type => {
                for spec in g.specs {
                    let Spec::Type(s) = spec else {
                        continue;
                    };
                    let obj = self.objects.alloc(Object::new(
                        s.name.name,
                        ObjectKind::TypeName { alias: s.alias },
                        file,
                        s.name.span,
                    ));
                    self.declare(self.pkg_scope, obj);
                    self.decls.insert(obj, DeclInfo::Type { file, spec: s });
                }
            }
        }
    }

    fn collect_import(&mut self, file_scope: ScopeId, s: &'ast ImportSpec<'ast>) {
        let path = s.path_value();
        let Some(pkg_scope) = self.import_package(path) else {
            let msg = format!("could not import {path} (unknown package)");
            self.error(TypeErrorKind::UnknownImport, s.span, msg);
            return;
        };
        let Some(desc) = self.config.registry.get(path) else {
            return;
        };
        let default_name = desc.name.clone();

        match s.name.map(|n| n.name) {
            Some("_") => {}
            Some(".") => {
                // Dot imports copy the exported members into the file scope.
                for &member in self.scopes.objects(pkg_scope).to_vec().iter() {
                    let name = self.objects[member].name.clone();
                    if self.scopes.insert(file_scope, &name, member).is_err() {
                        let msg = format!("{name} redeclared in this block");
                        self.error(TypeErrorKind::Redeclared, s.span, msg);
                    }
                }
            }
            name => {
                let (name, pos) = match (name, s.name) {
                    (Some(name), Some(ident)) => (name.to_string(), ident.span),
                    _ => (default_name, s.span),
                };
                let obj = self.objects.alloc(Object::new(
                    name,
                    ObjectKind::PkgName {
                        path: path.to_string(),
                        used: false,
                    },
                    self.env.file,
                    pos,
                ));
                self.declare(file_scope, obj);
            }
        }
    }

    /// The scope holding an importable package's members, built on first use.
    fn import_package(&mut self, path: &str) -> Option<ScopeId> {
        if let Some(&scope) = self.imports.get(path) {
            return Some(scope);
        }
        let config = self.config;
        let desc = config.registry.get(path)?;
        tracing::debug!(path, "importing package");

        let scope = self.scopes.new_scope(None, ScopeKind::Package);
        for (name, member) in desc.members() {
            let object = match member {
                MemberDesc::Func(f) => {
                    let params = f.params.iter().map(|t| self.type_from_desc(t)).collect();
                    let results = f.results.iter().map(|t| self.type_from_desc(t)).collect();
                    let sig = self.types.signature(params, results, f.variadic);
                    Object::new(name, ObjectKind::Func, FileId::default(), Span::default()).with_type(sig)
                }
                MemberDesc::Const { ty, value } => Object::new(
                    name,
                    ObjectKind::Const {
                        value: Some(value.clone()),
                    },
                    FileId::default(),
                    Span::default(),
                )
                .with_type(TypeId::basic(*ty)),
                MemberDesc::Var(desc) => {
                    let ty = self.type_from_desc(desc);
                    Object::new(name, ObjectKind::Var { used: true }, FileId::default(), Span::default())
                        .with_type(ty)
                }
            };
            let id = self.objects.alloc(object);
            let _ = self.scopes.insert(scope, name, id);
        }
        self.imports.insert(path.to_string(), scope);
        Some(scope)
    }

    fn type_from_desc(&mut self, desc: &TypeDesc) -> TypeId {
        match desc {
            TypeDesc::Basic(kind) => TypeId::basic(*kind),
            TypeDesc::Slice(elem) => {
                let elem = self.type_from_desc(elem);
                self.types.slice(elem)
            }
            TypeDesc::Any => self.types.empty_interface(),
            TypeDesc::Error => self.types.error_type(),
        }
    }

    fn collect_func(&mut self, file: FileId, f: &'ast FuncDecl<'ast>) {
        let name = f.name.name;

        if let Some(recv) = f.recv {
            match receiver_base_name(recv.ty) {
                Some(base) => self.methods.entry(base.to_string()).or_default().push((file, f)),
                None => self.methods.entry(String::new()).or_default().push((file, f)),
            }
            return;
        }

        if name == "init" || (name == "main" && self.pkg_name == "main") {
            if !f.ty.params.is_empty() || !f.ty.results.is_empty() {
                let msg = format!("func {name} must have no arguments and no return values");
                self.error(TypeErrorKind::Other, f.name.span, msg);
            }
        }

        let obj = self
            .objects
            .alloc(Object::new(name, ObjectKind::Func, file, f.name.span));
        if name == "init" {
            // init functions are not visible.
            if f.body.is_none() {
                self.error(TypeErrorKind::Other, f.name.span, "missing function body");
            }
        } else {
            self.declare(self.pkg_scope, obj);
        }
        self.decls.insert(obj, DeclInfo::Func { file, decl: f });
    }

    // =========================================
    // Phases
    // =========================================

    /// Declare every package-level object in source order.
    fn package_objects(&mut self) {
        let mut objects: Vec<ObjectId> = self.decls.keys().copied().collect();
        objects.sort();
        for id in objects {
            self.obj_decl(id);
        }
    }

    /// Methods whose receiver base is not a type of this package.
    fn orphan_methods(&mut self) {
        let mut orphans: Vec<(FileId, &'ast FuncDecl<'ast>)> =
            self.methods.drain().flat_map(|(_, group)| group).collect();
        orphans.sort_by_key(|(file, decl)| (file.0, decl.span.line, decl.span.col));
        for (file, decl) in orphans {
            self.env.file = file;
            self.env.scope = self.file_scopes[file.0 as usize];
            self.orphan_method(file, decl);
        }
    }

    fn check_map_keys(&mut self) {
        for (file, span, key) in std::mem::take(&mut self.map_keys) {
            if self.types.is_valid(key) && !self.types.comparable(key) {
                self.env.file = file;
                let msg = format!("invalid map key type {}", self.type_str(key));
                self.error(TypeErrorKind::InvalidOperation, span, msg);
            }
        }
    }

    fn unused_imports(&mut self) {
        if !self.config.report_unused {
            return;
        }
        for i in 0..self.file_scopes.len() {
            let scope = self.file_scopes[i];
            for &obj in self.scopes.objects(scope).to_vec().iter() {
                let object = &self.objects[obj];
                let ObjectKind::PkgName { path, used: false } = &object.kind else {
                    continue;
                };
                let default_name = self
                    .config
                    .registry
                    .get(path)
                    .map(|desc| desc.name.as_str())
                    .unwrap_or(path.as_str());
                let msg = if object.name == default_name {
                    format!("{path:?} imported and not used")
                } else {
                    format!("{path:?} imported as {} and not used", object.name)
                };
                let pos = object.pos;
                self.env.file = FileId(i as u32);
                self.error(TypeErrorKind::UnusedImport, pos, msg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use goop_core::ExprId;
    use goop_parser::ast::{IdentExpr, ParenExpr, StarExpr};

    #[test]
    fn receiver_base_names() {
        let arena = Bump::new();
        let span = Span::default();
        let t = Expr::Ident(arena.alloc(IdentExpr {
            id: ExprId::from_raw(1),
            name: "vec4",
            span,
        }));
        let ptr = Expr::Star(arena.alloc(StarExpr {
            id: ExprId::from_raw(2),
            x: t,
            span,
        }));
        let paren = Expr::Paren(arena.alloc(ParenExpr {
            id: ExprId::from_raw(3),
            x: ptr,
            span,
        }));
        assert_eq!(receiver_base_name(t), Some("vec4"));
        assert_eq!(receiver_base_name(ptr), Some("vec4"));
        assert_eq!(receiver_base_name(paren), Some("vec4"));

        let ptr_ptr = Expr::Star(arena.alloc(StarExpr {
            id: ExprId::from_raw(4),
            x: ptr,
            span,
        }));
        assert_eq!(receiver_base_name(ptr_ptr), None);
    }
}
