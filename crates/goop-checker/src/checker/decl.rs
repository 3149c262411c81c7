//! Package-level declarations: constants, variables, types, functions and
//! methods.

use goop_core::{FileId, Span, TypeErrorKind};
use goop_parser::ast::{Expr, FuncDecl, TypeSpec};

use super::{Checker, DeclInfo, Environment, Param, PendingBody};
use crate::constant::ConstValue;
use crate::objects::{Color, ObjectId, ObjectKind};
use crate::operand::Operand;
use crate::types::{Method, Type, TypeId};

impl<'a, 'ast> Checker<'a, 'ast> {
    /// Determine the type (and value) of a package-level object.
    ///
    /// Objects move from white to grey while their declaration is checked
    /// and to black once it is done. Reaching a grey object again means the
    /// declaration refers to itself.
    pub(crate) fn obj_decl(&mut self, id: ObjectId) {
        let (color, has_type) = (self.objects[id].color, self.objects[id].ty.is_some());
        if color == Color::White && has_type {
            self.objects[id].color = Color::Black;
            return;
        }
        match color {
            Color::Black => return,
            Color::Grey => {
                if !has_type {
                    let object = &self.objects[id];
                    let (name, pos) = (object.name.clone(), object.pos);
                    let (kind, msg) = match object.kind {
                        ObjectKind::TypeName { .. } => (
                            TypeErrorKind::InvalidRecursiveType,
                            format!("invalid recursive type: {name} refers to itself"),
                        ),
                        _ => (
                            TypeErrorKind::InitializationCycle,
                            format!("initialization cycle: {name} refers to itself"),
                        ),
                    };
                    self.error(kind, pos, msg);
                    self.objects[id].ty = Some(TypeId::INVALID);
                }
                return;
            }
            Color::White => {}
        }

        let Some(decl) = self.decls.get(&id).cloned() else {
            self.objects[id].ty.get_or_insert(TypeId::INVALID);
            return;
        };
        tracing::trace!(name = %self.objects[id].name, "declaring");

        self.objects[id].color = Color::Grey;
        let file = decl.file();
        let saved = std::mem::replace(
            &mut self.env,
            Environment {
                file,
                scope: self.file_scopes[file.0 as usize],
                iota: None,
                sig: None,
                result_vars: Vec::new(),
                has_call_or_recv: false,
                err_pos: None,
            },
        );

        match decl {
            DeclInfo::Const {
                ty,
                init,
                iota,
                inherited,
                ..
            } => self.const_decl(id, ty, init, iota, inherited),
            DeclInfo::Var { lhs, ty, init, .. } => self.var_decl(id, lhs.as_deref(), ty, init),
            DeclInfo::Type { spec, .. } => {
                self.type_decl(id, spec);
                self.collect_methods(id);
            }
            DeclInfo::Func { decl, .. } => self.func_decl(id, file, decl),
        }

        self.env = saved;
        self.objects[id].color = Color::Black;
    }

    pub(crate) fn const_decl(
        &mut self,
        id: ObjectId,
        ty: Option<Expr<'ast>>,
        init: Option<Expr<'ast>>,
        iota: u32,
        inherited: bool,
    ) {
        let saved_iota = self.env.iota.replace(ConstValue::Int(i128::from(iota)));
        let saved_err_pos = self.env.err_pos.take();

        let mut valid = true;
        if let Some(ty) = ty {
            let t = self.type_expr(ty);
            if !self.types.is_const_type(t) {
                if self.types.is_valid(self.types.underlying(t)) {
                    let msg = format!("invalid constant type {}", self.type_str(t));
                    self.error(TypeErrorKind::InvalidOperation, ty.span(), msg);
                }
                self.objects[id].ty = Some(TypeId::INVALID);
                valid = false;
            } else {
                self.objects[id].ty = Some(t);
            }
        }

        if valid {
            let mut x = Operand::invalid();
            if let Some(init) = init {
                if inherited {
                    // Errors in a repeated initializer point at the constant.
                    self.env.err_pos = Some(self.objects[id].pos);
                }
                x = self.expr(init);
            }
            self.init_const(id, &mut x);
        }

        self.env.iota = saved_iota;
        self.env.err_pos = saved_err_pos;
    }

    pub(crate) fn var_decl(
        &mut self,
        id: ObjectId,
        lhs: Option<&[ObjectId]>,
        ty: Option<Expr<'ast>>,
        init: Option<Expr<'ast>>,
    ) {
        if let Some(ty) = ty {
            let t = self.var_type(ty);
            self.objects[id].ty = Some(t);
        }

        let Some(init) = init else {
            if ty.is_none() {
                self.objects[id].ty = Some(TypeId::INVALID);
            }
            return;
        };

        match lhs {
            Some(lhs) if lhs.len() > 1 => {
                if ty.is_some() {
                    let t = self.objects[id].ty;
                    for &v in lhs {
                        self.objects[v].ty = t;
                    }
                }
                self.init_vars(lhs, &[init], None);
            }
            _ => {
                let mut x = self.expr(init);
                self.init_var(id, &mut x, "variable declaration");
            }
        }
    }

    pub(crate) fn type_decl(&mut self, id: ObjectId, spec: &'ast TypeSpec<'ast>) {
        if spec.alias {
            let rhs = self.type_expr(spec.ty);
            self.objects[id].ty = Some(rhs);
            return;
        }

        let named = self.types.new_named(spec.name.name, Some(&self.pkg_name));
        self.objects[id].ty = Some(named);

        let rhs = self.type_expr(spec.ty);
        if self.types.is_pending(rhs) {
            // The right-hand side is a named type still being declared.
            let msg = format!("invalid recursive type {}", spec.name.name);
            self.error(TypeErrorKind::InvalidRecursiveType, spec.name.span, msg);
            self.types.set_underlying(named, TypeId::INVALID);
            return;
        }
        self.types.set_underlying(named, rhs);
        self.valid_type(named, spec.name.span);
    }

    /// Reject types that contain themselves without an indirection.
    fn valid_type(&mut self, root: TypeId, pos: Span) {
        let mut path = vec![root];
        if self.contains_named(self.types.underlying(root), root, &mut path) {
            let names: Vec<String> = path.iter().map(|&t| self.type_str(t)).collect();
            let msg = if names.len() == 1 {
                format!("invalid recursive type: {} refers to itself", names[0])
            } else {
                let mut msg = format!("invalid recursive type {}", names[0]);
                for (i, name) in names.iter().enumerate() {
                    let next = &names[(i + 1) % names.len()];
                    msg.push_str(&format!("\n\t{name} refers to {next}"));
                }
                msg
            };
            self.error(TypeErrorKind::InvalidRecursiveType, pos, msg);
            self.types.set_underlying(root, TypeId::INVALID);
        }
    }

    fn contains_named(&self, ty: TypeId, root: TypeId, path: &mut Vec<TypeId>) -> bool {
        match self.types.get(ty) {
            Type::Named(_) => {
                if ty == root {
                    return true;
                }
                if path.contains(&ty) {
                    return false;
                }
                path.push(ty);
                if self.contains_named(self.types.underlying(ty), root, path) {
                    return true;
                }
                path.pop();
                false
            }
            Type::Array { elem, .. } => self.contains_named(*elem, root, path),
            Type::Struct(fields) => fields
                .iter()
                .any(|f| self.contains_named(f.ty, root, path)),
            _ => false,
        }
    }

    /// Attach the methods declared for the type `id`.
    fn collect_methods(&mut self, id: ObjectId) {
        let name = self.objects[id].name.clone();
        let Some(methods) = self.methods.remove(&name) else {
            return;
        };
        let base = self.objects[id].ty.filter(|&t| self.is_local_named(t));

        let saved_file = self.env.file;
        let saved_scope = self.env.scope;
        for (file, decl) in methods {
            self.env.file = file;
            self.env.scope = self.file_scopes[file.0 as usize];
            match base {
                Some(base) => self.method_decl(base, &name, file, decl),
                None => self.orphan_method(file, decl),
            }
        }
        self.env.file = saved_file;
        self.env.scope = saved_scope;

        let Some(base) = base else {
            return;
        };
        self.method_sets.invalidate();
        if let Some(fields) = self.types.struct_fields(self.types.underlying(base)).map(<[_]>::to_vec)
            && let Some(named) = self.types.named(base)
        {
            let clashes: Vec<String> = fields
                .iter()
                .filter(|f| f.name != "_" && named.methods.iter().any(|m| m.name == f.name))
                .map(|f| f.name.clone())
                .collect();
            let pos = self.objects[id].pos;
            for field in clashes {
                let msg = format!("field and method with the same name {field}");
                self.error(TypeErrorKind::Redeclared, pos, msg);
            }
        }
    }

    fn is_local_named(&self, ty: TypeId) -> bool {
        self.types
            .named(ty)
            .is_some_and(|n| n.pkg.as_deref() == Some(self.pkg_name.as_str()))
    }

    /// A method whose receiver is not a type of this package. The body is
    /// still checked.
    pub(crate) fn orphan_method(&mut self, file: FileId, decl: &'ast FuncDecl<'ast>) {
        let Some(recv) = decl.recv else {
            return;
        };
        let recv_ty = self.var_type(recv.ty);
        let (base, _) = self.types.deref(recv_ty);
        if self.types.is_valid(base) {
            let msg = if self.types.has_name(base) {
                format!("cannot define new methods on non-local type {}", self.type_str(base))
            } else {
                format!("invalid receiver type {}", self.type_str(recv_ty))
            };
            self.error(TypeErrorKind::InvalidOperation, recv.ty.span(), msg);
        }
        let sig = self.func_type(decl.ty);
        let recv = Param {
            name: recv.names.first().copied(),
            ty: recv_ty,
        };
        self.queue_body(file, decl, sig.ty, Some(recv), sig.params, sig.results);
    }

    fn method_decl(&mut self, base: TypeId, base_name: &str, file: FileId, decl: &'ast FuncDecl<'ast>) {
        let Some(recv) = decl.recv else {
            return;
        };
        let recv_ty = self.var_type(recv.ty);
        let sig = self.func_type(decl.ty);
        let (rbase, ptr_recv) = self.types.deref(recv_ty);

        if self.types.is_valid(rbase) {
            let cause = match self.types.get(self.types.underlying(rbase)) {
                Type::Pointer(_) | Type::Interface(_) => Some("pointer or interface type"),
                _ => None,
            };
            if let Some(cause) = cause {
                let msg = format!("invalid receiver type {} ({cause})", self.type_str(recv_ty));
                self.error(TypeErrorKind::InvalidOperation, recv.ty.span(), msg);
            }
        }

        let method = decl.name.name;
        if method == "_" {
            // Blank methods are checked but never attached.
        } else if self
            .types
            .named(base)
            .is_some_and(|n| n.methods.iter().any(|m| m.name == method))
        {
            let msg = format!("method {base_name}.{method} already declared");
            self.error(TypeErrorKind::Redeclared, decl.name.span, msg);
        } else {
            self.types.add_method(
                base,
                Method {
                    name: method.to_string(),
                    sig: sig.ty,
                    ptr_recv,
                },
            );
            tracing::trace!(ty = base_name, method, ptr_recv, "method declared");
        }

        let recv = Param {
            name: recv.names.first().copied(),
            ty: recv_ty,
        };
        self.queue_body(file, decl, sig.ty, Some(recv), sig.params, sig.results);
    }

    fn func_decl(&mut self, id: ObjectId, file: FileId, decl: &'ast FuncDecl<'ast>) {
        // Recursive references inside the signature are not cycles.
        self.objects[id].color = Color::Black;
        let sig = self.func_type(decl.ty);
        self.objects[id].ty = Some(sig.ty);
        self.queue_body(file, decl, sig.ty, None, sig.params, sig.results);
    }

    fn queue_body(
        &mut self,
        file: FileId,
        decl: &'ast FuncDecl<'ast>,
        sig: TypeId,
        recv: Option<Param<'ast>>,
        params: Vec<Param<'ast>>,
        results: Vec<Param<'ast>>,
    ) {
        if decl.body.is_none() {
            return;
        }
        self.bodies.push_back(PendingBody {
            file,
            decl,
            sig,
            recv,
            params,
            results,
        });
    }
}
