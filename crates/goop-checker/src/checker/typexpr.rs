//! Type expressions.

use goop_core::TypeErrorKind;
use goop_parser::ast::{Expr, FuncTypeExpr, InterfaceElem, InterfaceTypeExpr, StructTypeExpr};
use goop_parser::expr_string;
use rustc_hash::FxHashSet;

use super::{Checker, Param};
use crate::objects::ObjectKind;
use crate::operand::{Mode, ModeKind};
use crate::types::{BasicKind, Field, IfaceMethod, TypeId};

/// A checked function signature with its parameter names.
#[derive(Debug, Clone)]
pub(crate) struct FuncSig<'ast> {
    pub params: Vec<Param<'ast>>,
    pub results: Vec<Param<'ast>>,
    /// The signature type; variadic-ness lives there.
    pub ty: TypeId,
}

impl<'a, 'ast> Checker<'a, 'ast> {
    /// Evaluate `e` as a type. Errors yield the invalid type.
    pub(crate) fn type_expr(&mut self, e: Expr<'ast>) -> TypeId {
        let ty = self.type_internal(e);
        self.record_type_and_value(e.id(), ModeKind::TypeExpr, ty, None);
        ty
    }

    /// The type of a variable, field or element.
    pub(crate) fn var_type(&mut self, e: Expr<'ast>) -> TypeId {
        self.type_expr(e)
    }

    fn type_internal(&mut self, e: Expr<'ast>) -> TypeId {
        match e {
            Expr::Ident(_) | Expr::Selector(_) => {
                let x = self.expr_or_type(e);
                match x.mode {
                    Mode::TypeExpr => return x.ty,
                    Mode::Invalid => {}
                    Mode::NoValue => {
                        let msg = format!("{} used as type", self.describe(&x));
                        self.error_at(&x, TypeErrorKind::NotAType, msg);
                    }
                    _ => {
                        let msg = format!("{} is not a type", self.describe(&x));
                        self.error_at(&x, TypeErrorKind::NotAType, msg);
                    }
                }
            }
            Expr::Paren(p) => return self.type_expr(p.x),
            Expr::Star(star) => {
                let elem = self.var_type(star.x);
                return self.types.pointer(elem);
            }
            Expr::ArrayType(at) => {
                let len = match at.len {
                    None => {
                        let elem = self.var_type(at.elem);
                        return self.types.slice(elem);
                    }
                    Some(Expr::Ellipsis(_)) => {
                        self.error(
                            TypeErrorKind::InvalidOperation,
                            at.span,
                            "invalid use of [...] array (outside a composite literal)",
                        );
                        None
                    }
                    Some(len) => self.array_length(len),
                };
                let elem = self.var_type(at.elem);
                if let Some(len) = len {
                    return self.types.array(len, elem);
                }
            }
            Expr::MapType(mt) => {
                let key = self.var_type(mt.key);
                let value = self.var_type(mt.value);
                // Comparability needs complete types; checked at the end.
                self.map_keys.push((self.env.file, mt.key.span(), key));
                return self.types.map(key, value);
            }
            Expr::StructType(st) => return self.struct_type(st),
            Expr::FuncType(ft) => return self.func_type(ft).ty,
            Expr::InterfaceType(it) => return self.interface_type(it),
            Expr::Ellipsis(dots) => {
                self.error(TypeErrorKind::Other, dots.span, "invalid use of '...'");
                if let Some(elem) = dots.elem {
                    self.use_exprs(&[elem]);
                }
            }
            _ => {
                let msg = format!("{} is not a type", expr_string(e));
                self.error(TypeErrorKind::NotAType, e.span(), msg);
                self.use_exprs(&[e]);
            }
        }
        TypeId::INVALID
    }

    fn array_length(&mut self, e: Expr<'ast>) -> Option<u64> {
        if let Some(name) = e.as_ident() {
            match self.lookup(name.name) {
                None => {
                    let msg = format!("undefined array length {}", name.name);
                    self.error(TypeErrorKind::Undeclared, name.span, msg);
                    return None;
                }
                Some(id) if !matches!(self.objects[id].kind, ObjectKind::Const { .. }) => {
                    let msg = format!("invalid array length {}", name.name);
                    self.error(TypeErrorKind::InvalidIndex, name.span, msg);
                    return None;
                }
                Some(_) => {}
            }
        }

        let x = self.expr(e);
        let Some(value) = x.value() else {
            if !x.is_invalid() {
                let msg = format!("array length {} must be constant", self.describe(&x));
                self.error_at(&x, TypeErrorKind::InvalidIndex, msg);
            }
            return None;
        };
        if (self.types.is_untyped(x.ty) || self.types.is_integer(x.ty))
            && let Some(n) = value.to_int()
            && value.represent(BasicKind::Int).is_ok()
            && n >= 0
        {
            return Some(n as u64);
        }
        let msg = if self.types.is_integer(x.ty) {
            format!("invalid array length {}", self.describe(&x))
        } else {
            format!("array length {} must be integer", self.describe(&x))
        };
        self.error_at(&x, TypeErrorKind::InvalidIndex, msg);
        None
    }

    fn struct_type(&mut self, st: &'ast StructTypeExpr<'ast>) -> TypeId {
        let mut fields: Vec<Field> = Vec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();

        for f in st.fields {
            let ty = self.var_type(f.ty);
            let tag = f.tag.map(|t| t.trim_matches(['"', '`']).to_string());

            if f.names.is_empty() {
                let Some(name) = embedded_field_name(f.ty) else {
                    let msg = format!("invalid embedded field type {}", expr_string(f.ty));
                    self.error(TypeErrorKind::InvalidOperation, f.ty.span(), msg);
                    continue;
                };
                let (base, is_ptr) = self.types.deref(ty);
                if self.types.under_pointer_elem(base).is_some() {
                    self.error(
                        TypeErrorKind::InvalidOperation,
                        f.ty.span(),
                        "embedded field type cannot be a pointer",
                    );
                } else if is_ptr && self.types.is_interface(base) {
                    self.error(
                        TypeErrorKind::InvalidOperation,
                        f.ty.span(),
                        "embedded field type cannot be a pointer to an interface",
                    );
                }
                if !seen.insert(name) {
                    let msg = format!("{name} redeclared");
                    self.error(TypeErrorKind::Redeclared, f.ty.span(), msg);
                    continue;
                }
                fields.push(Field {
                    name: name.to_string(),
                    ty,
                    embedded: true,
                    tag,
                });
                continue;
            }

            for name in f.names {
                if !name.is_blank() && !seen.insert(name.name) {
                    let msg = format!("{} redeclared", name.name);
                    self.error(TypeErrorKind::Redeclared, name.span, msg);
                    continue;
                }
                fields.push(Field {
                    name: name.name.to_string(),
                    ty,
                    embedded: false,
                    tag: tag.clone(),
                });
            }
        }
        self.types.struct_type(fields)
    }

    /// Check a signature, expanding grouped parameter names.
    pub(crate) fn func_type(&mut self, ft: &'ast FuncTypeExpr<'ast>) -> FuncSig<'ast> {
        let (params, variadic) = self.collect_params(ft.params, true);
        let (results, _) = self.collect_params(ft.results, false);
        let ty = self.types.signature(
            params.iter().map(|p| p.ty).collect(),
            results.iter().map(|p| p.ty).collect(),
            variadic,
        );
        self.record_type_and_value(ft.id, ModeKind::TypeExpr, ty, None);
        FuncSig { params, results, ty }
    }

    fn collect_params(
        &mut self,
        list: &'ast [goop_parser::ast::Field<'ast>],
        variadic_ok: bool,
    ) -> (Vec<Param<'ast>>, bool) {
        let mut params = Vec::new();
        let mut variadic = false;

        for (i, field) in list.iter().enumerate() {
            let mut ty = match field.ty {
                Expr::Ellipsis(dots) => {
                    let elem = match dots.elem {
                        Some(elem) => self.var_type(elem),
                        None => TypeId::INVALID,
                    };
                    if variadic_ok && i == list.len() - 1 && field.names.len() <= 1 {
                        variadic = true;
                        self.types.slice(elem)
                    } else {
                        self.error(
                            TypeErrorKind::Other,
                            dots.span,
                            "can only use ... with final parameter in list",
                        );
                        elem
                    }
                }
                ty => self.var_type(ty),
            };
            // A type still being declared keeps its id.
            if !self.types.is_valid(ty) && !self.types.is_pending(ty) {
                ty = TypeId::INVALID;
            }

            if field.names.is_empty() {
                params.push(Param { name: None, ty });
            } else {
                for &name in field.names {
                    params.push(Param { name: Some(name), ty });
                }
            }
        }
        (params, variadic)
    }

    fn interface_type(&mut self, it: &'ast InterfaceTypeExpr<'ast>) -> TypeId {
        let mut methods: Vec<IfaceMethod> = Vec::new();

        for elem in it.elems {
            match *elem {
                InterfaceElem::Method { name, ty } => {
                    let sig = self.func_type(ty).ty;
                    if name.is_blank() {
                        self.error(TypeErrorKind::Other, name.span, "methods must have a unique non-blank name");
                        continue;
                    }
                    if methods.iter().any(|m| m.name == name.name) {
                        let msg = format!("duplicate method {}", name.name);
                        self.error(TypeErrorKind::Redeclared, name.span, msg);
                        continue;
                    }
                    methods.push(IfaceMethod {
                        name: name.name.to_string(),
                        sig,
                    });
                }
                InterfaceElem::Embedded(e) => {
                    let ty = self.type_expr(e);
                    if self.types.is_pending(ty) {
                        let msg = format!("invalid recursive type: {} embeds itself", self.type_str(ty));
                        self.error(TypeErrorKind::InvalidRecursiveType, e.span(), msg);
                        continue;
                    }
                    if !self.types.is_valid(ty) {
                        continue;
                    }
                    let Some(embedded) = self.types.interface_methods(ty).map(<[_]>::to_vec) else {
                        let msg = format!("{} is not an interface", self.type_str(ty));
                        self.error(TypeErrorKind::NotAType, e.span(), msg);
                        continue;
                    };
                    for m in embedded {
                        match methods.iter().find(|have| have.name == m.name) {
                            Some(have) if have.sig != m.sig => {
                                let msg = format!("duplicate method {}", m.name);
                                self.error(TypeErrorKind::Redeclared, e.span(), msg);
                            }
                            Some(_) => {}
                            None => methods.push(m),
                        }
                    }
                }
            }
        }
        self.types.interface(methods)
    }
}

/// The implicit field name of an embedded field `T`, `*T` or `pkg.T`.
fn embedded_field_name<'ast>(e: Expr<'ast>) -> Option<&'ast str> {
    match e {
        Expr::Ident(ident) => Some(ident.name),
        Expr::Star(star) if !matches!(star.x, Expr::Star(_)) => embedded_field_name(star.x),
        Expr::Selector(sel) => Some(sel.sel.name),
        Expr::Paren(p) => embedded_field_name(p.x),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use goop_core::{ExprId, Span};
    use goop_parser::ast::{IdentExpr, SelectorExpr, StarExpr};

    #[test]
    fn embedded_names() {
        let arena = Bump::new();
        let span = Span::default();
        let t = Expr::Ident(arena.alloc(IdentExpr {
            id: ExprId::from_raw(0),
            name: "Vec",
            span,
        }));
        assert_eq!(embedded_field_name(t), Some("Vec"));

        let ptr = Expr::Star(arena.alloc(StarExpr {
            id: ExprId::from_raw(0),
            x: t,
            span,
        }));
        assert_eq!(embedded_field_name(ptr), Some("Vec"));

        let ptr_ptr = Expr::Star(arena.alloc(StarExpr {
            id: ExprId::from_raw(0),
            x: ptr,
            span,
        }));
        assert_eq!(embedded_field_name(ptr_ptr), None);

        let qualified = Expr::Selector(arena.alloc(SelectorExpr {
            id: ExprId::from_raw(0),
            x: t,
            sel: goop_parser::ast::Ident::new("Builder", span),
            span,
        }));
        assert_eq!(embedded_field_name(qualified), Some("Builder"));
    }
}
