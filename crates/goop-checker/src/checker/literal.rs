//! Composite literals.

use goop_core::TypeErrorKind;
use goop_parser::ast::{CompositeLit, Expr};
use goop_parser::expr_string;
use rustc_hash::FxHashSet;

use super::Checker;
use crate::constant::ConstValue;
use crate::operand::{Mode, ModeKind, Operand};
use crate::types::{Type, TypeId};

impl<'a, 'ast> Checker<'a, 'ast> {
    /// `T{...}`. Inside another literal the type may be elided, in which
    /// case `hint` is the element type of the enclosing literal.
    pub(crate) fn composite_lit(
        &mut self,
        x: &mut Operand<'ast>,
        e: &'ast CompositeLit<'ast>,
        hint: Option<TypeId>,
    ) {
        let mut is_elem = false;
        let (typ, base) = match (e.ty, hint) {
            (Some(Expr::ArrayType(at)), _) if matches!(at.len, Some(Expr::Ellipsis(_))) => {
                // [...]T: the length comes from the elements.
                let elem = self.var_type(at.elem);
                let n = self.indexed_elts(e.elts, elem, None);
                let typ = self.types.array(n as u64, elem);
                if let Some(ty) = e.ty {
                    self.record_type_and_value(ty.id(), ModeKind::TypeExpr, typ, None);
                }
                *x = Operand::new(Mode::Value, Some(Expr::CompositeLit(e)), typ);
                return;
            }
            (Some(ty), _) => {
                let typ = self.type_expr(ty);
                (typ, typ)
            }
            (None, Some(hint)) => {
                is_elem = true;
                let base = self.types.under_pointer_elem(hint).unwrap_or(hint);
                (hint, base)
            }
            (None, None) => {
                self.error(
                    TypeErrorKind::InvalidOperation,
                    e.span,
                    "invalid composite literal type: missing type",
                );
                x.invalidate();
                return;
            }
        };

        let under = self.types.underlying(base);
        match self.types.get(under).clone() {
            Type::Struct(fields) => self.struct_lit(e, base, &fields),
            Type::Array { len, elem } => {
                self.indexed_elts(e.elts, elem, Some(len as i128));
            }
            Type::Slice(elem) => {
                self.indexed_elts(e.elts, elem, None);
            }
            Type::Map { key, value } => self.map_lit(e, key, value),
            _ => {
                for &elt in e.elts {
                    let elt = match elt {
                        Expr::KeyValue(kv) => kv.value,
                        other => other,
                    };
                    self.use_exprs(&[elt]);
                }
                if self.types.is_valid(under) {
                    let qualifier = if is_elem { " element" } else { "" };
                    let msg = format!(
                        "invalid composite literal{qualifier} type {}",
                        self.type_str(typ)
                    );
                    self.error(TypeErrorKind::InvalidOperation, e.span, msg);
                    x.invalidate();
                    return;
                }
            }
        }

        *x = Operand::new(Mode::Value, Some(Expr::CompositeLit(e)), typ);
    }

    fn struct_lit(&mut self, e: &'ast CompositeLit<'ast>, base: TypeId, fields: &[crate::types::Field]) {
        let Some(first) = e.elts.first() else {
            return;
        };

        if matches!(first, Expr::KeyValue(_)) {
            let mut visited = vec![false; fields.len()];
            for &elt in e.elts {
                let Expr::KeyValue(kv) = elt else {
                    self.error(
                        TypeErrorKind::InvalidOperation,
                        elt.span(),
                        "mixture of field:value and value elements in struct literal",
                    );
                    continue;
                };
                let mut x = self.expr(kv.value);
                let Some(key) = kv.key.as_ident() else {
                    let msg = format!(
                        "invalid field name {} in struct literal",
                        expr_string(kv.key)
                    );
                    self.error(TypeErrorKind::MissingFieldOrMethod, kv.span, msg);
                    continue;
                };
                let Some(i) = fields.iter().position(|f| f.name == key.name) else {
                    let msg = format!(
                        "unknown field {} in struct literal of type {}",
                        key.name,
                        self.type_str(base)
                    );
                    self.error(TypeErrorKind::MissingFieldOrMethod, key.span, msg);
                    continue;
                };
                self.record_type_and_value(kv.key.id(), ModeKind::Variable, fields[i].ty, None);
                self.assignment(&mut x, Some(fields[i].ty), "struct literal");
                if visited[i] {
                    let msg = format!("duplicate field name {} in struct literal", key.name);
                    self.error(TypeErrorKind::Redeclared, kv.span, msg);
                    continue;
                }
                visited[i] = true;
            }
            return;
        }

        for (i, &elt) in e.elts.iter().enumerate() {
            if let Expr::KeyValue(kv) = elt {
                self.error(
                    TypeErrorKind::InvalidOperation,
                    kv.span,
                    "mixture of field:value and value elements in struct literal",
                );
                continue;
            }
            let mut x = self.expr(elt);
            let Some(field) = fields.get(i) else {
                self.error_at(&x, TypeErrorKind::WrongCount, "too many values in struct literal");
                break;
            };
            self.assignment(&mut x, Some(field.ty), "struct literal");
        }
        if e.elts.len() < fields.len() {
            let end = e.span.end();
            self.error(TypeErrorKind::WrongCount, end, "too few values in struct literal");
        }
    }

    fn map_lit(&mut self, e: &'ast CompositeLit<'ast>, key: TypeId, value: TypeId) {
        let mut visited: FxHashSet<ConstValue> = FxHashSet::default();
        for &elt in e.elts {
            let Expr::KeyValue(kv) = elt else {
                self.error(TypeErrorKind::InvalidOperation, elt.span(), "missing key in map literal");
                continue;
            };
            let mut k = self.expr_with_hint(kv.key, Some(key));
            self.assignment(&mut k, Some(key), "map literal");
            if let Some(v) = k.value().cloned()
                && !visited.insert(v.clone())
            {
                let msg = format!("duplicate key {v} in map literal");
                self.error_at(&k, TypeErrorKind::Redeclared, msg);
                continue;
            }
            let mut v = self.expr_with_hint(kv.value, Some(value));
            self.assignment(&mut v, Some(value), "map literal");
        }
    }

    /// Check the elements of an array or slice literal. Returns the length
    /// the literal implies.
    fn indexed_elts(&mut self, elts: &'ast [Expr<'ast>], elem: TypeId, length: Option<i128>) -> i128 {
        let mut visited = FxHashSet::default();
        let (mut index, mut max) = (0i128, 0i128);

        for &e in elts {
            let mut valid_index = false;
            let mut eval = e;
            if let Expr::KeyValue(kv) = e {
                let (ty, i) = self.index(kv.key, length);
                if self.types.is_valid(ty) {
                    match i {
                        Some(i) => {
                            index = i;
                            valid_index = true;
                        }
                        None => {
                            let msg = format!(
                                "index {} must be integer constant",
                                expr_string(kv.key)
                            );
                            self.error(TypeErrorKind::InvalidIndex, e.span(), msg);
                        }
                    }
                }
                eval = kv.value;
            } else if let Some(length) = length
                && index >= length
            {
                let msg = format!("index {index} is out of bounds (>= {length})");
                self.error(TypeErrorKind::InvalidIndex, e.span(), msg);
            } else {
                valid_index = true;
            }

            if valid_index && !visited.insert(index) {
                let msg = format!("duplicate index {index} in array or slice literal");
                self.error(TypeErrorKind::Redeclared, e.span(), msg);
            }
            index += 1;
            max = max.max(index);

            let mut x = self.expr_with_hint(eval, Some(elem));
            self.assignment(&mut x, Some(elem), "array or slice literal");
        }
        max
    }
}
