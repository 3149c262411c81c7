//! Assignability, convertibility and the typing of untyped values.

use goop_core::TypeErrorKind;

use super::Checker;
use crate::constant::{ConstValue, Unrepresentable};
use crate::operand::{Mode, Operand};
use crate::types::{BasicKind, TypeId};

/// Why an untyped value cannot take a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImplicitError {
    Truncated,
    Overflows,
    Invalid,
}

impl<'a, 'ast> Checker<'a, 'ast> {
    /// The type and value `x` would have if used where `target` is expected.
    pub(crate) fn implicit_type_and_value(
        &self,
        x: &Operand<'ast>,
        target: TypeId,
    ) -> Result<(TypeId, Option<ConstValue>), ImplicitError> {
        if x.is_invalid() || self.types.is_typed(x.ty) || !self.types.is_valid(target) {
            return Ok((x.ty, None));
        }
        if self.types.is_untyped(target) {
            return self.max_type(x.ty, target).map(|t| (t, None)).ok_or(ImplicitError::Invalid);
        }

        let under = self.types.underlying(target);
        if let Some(kind) = self.types.basic_kind(under) {
            if let Some(value) = x.value() {
                let value = self.representation(x, value, kind)?;
                return Ok((target, Some(value)));
            }
            let ok = match self.types.basic_kind(x.ty) {
                Some(BasicKind::UntypedBool) => self.types.is_boolean(target),
                Some(BasicKind::UntypedInt | BasicKind::UntypedRune | BasicKind::UntypedFloat) => {
                    self.types.is_numeric(target)
                }
                Some(BasicKind::UntypedString) => self.types.is_string(target),
                Some(BasicKind::UntypedNil) => {
                    if !self.types.has_nil(target) {
                        return Err(ImplicitError::Invalid);
                    }
                    return Ok((TypeId::basic(BasicKind::UntypedNil), None));
                }
                _ => false,
            };
            return if ok { Ok((target, None)) } else { Err(ImplicitError::Invalid) };
        }

        if self.types.is_interface(under) {
            if x.is_nil() {
                return Ok((TypeId::basic(BasicKind::UntypedNil), None));
            }
            let empty = self.types.interface_methods(under).is_none_or(|m| m.is_empty());
            if !empty {
                return Err(ImplicitError::Invalid);
            }
            return Ok((self.types.default_type(x.ty), None));
        }

        if self.types.has_nil(under) && x.is_nil() {
            return Ok((TypeId::basic(BasicKind::UntypedNil), None));
        }
        Err(ImplicitError::Invalid)
    }

    /// The larger of two untyped types, if they are compatible.
    fn max_type(&self, x: TypeId, y: TypeId) -> Option<TypeId> {
        if self.types.is_numeric(x) && self.types.is_numeric(y) {
            let (a, b) = (self.types.basic_kind(x)?, self.types.basic_kind(y)?);
            return Some(if (a as u8) >= (b as u8) { x } else { y });
        }
        (x == y).then_some(x)
    }

    fn representation(
        &self,
        x: &Operand<'ast>,
        value: &ConstValue,
        kind: BasicKind,
    ) -> Result<ConstValue, ImplicitError> {
        value.represent(kind).map_err(|err| {
            let target = TypeId::basic(kind);
            if self.types.is_numeric(x.ty) && self.types.is_numeric(target) {
                if !self.types.is_integer(x.ty) && self.types.is_integer(target) {
                    ImplicitError::Truncated
                } else {
                    ImplicitError::Overflows
                }
            } else if err == Unrepresentable::Overflows {
                ImplicitError::Overflows
            } else {
                ImplicitError::Invalid
            }
        })
    }

    fn invalid_conversion(&mut self, x: &Operand<'ast>, target: TypeId, err: ImplicitError) {
        let (desc, target) = (self.describe(x), self.type_str(target));
        let (kind, msg) = match err {
            ImplicitError::Truncated => (
                TypeErrorKind::ConstantOverflow,
                format!("{desc} truncated to {target}"),
            ),
            ImplicitError::Overflows => (
                TypeErrorKind::ConstantOverflow,
                format!("{desc} overflows {target}"),
            ),
            ImplicitError::Invalid => (
                TypeErrorKind::InvalidConversion,
                format!("cannot convert {desc} to type {target}"),
            ),
        };
        self.error_at(x, kind, msg);
    }

    /// Give an untyped operand the type `target` requires.
    pub(crate) fn convert_untyped(&mut self, x: &mut Operand<'ast>, target: TypeId) {
        match self.implicit_type_and_value(x, target) {
            Err(err) => {
                let under = self.types.underlying(target);
                self.invalid_conversion(x, under, err);
                x.invalidate();
            }
            Ok((ty, value)) => {
                if let Some(value) = value {
                    self.update_expr_val(x.expr, &value);
                    x.mode = Mode::Constant(value);
                }
                if ty != x.ty {
                    x.ty = ty;
                    if let Some(expr) = x.expr {
                        self.update_expr_type(expr, ty, false);
                    }
                }
            }
        }
    }

    /// Check that the constant `x` fits `kind`, rounding its value.
    pub(crate) fn representable(&mut self, x: &mut Operand<'ast>, kind: BasicKind) {
        let Some(value) = x.value().cloned() else {
            return;
        };
        match self.representation(x, &value, kind) {
            Ok(value) => x.mode = Mode::Constant(value),
            Err(err) => {
                self.invalid_conversion(x, TypeId::basic(kind), err);
                x.invalidate();
            }
        }
    }

    /// Typed constants must stay representable after every operation.
    pub(crate) fn overflow(&mut self, x: &mut Operand<'ast>) {
        if self.types.is_typed(x.ty)
            && let Some(kind) = self.types.under_basic(x.ty)
        {
            self.representable(x, kind);
        }
    }

    /// Whether `x` may be assigned to a variable of type `t`. On failure the
    /// second element may explain why.
    pub(crate) fn assignable_to(&mut self, x: &Operand<'ast>, t: TypeId) -> (bool, Option<String>) {
        if x.is_invalid() || !self.types.is_valid(t) {
            return (true, None);
        }
        let v = x.ty;
        if v == t {
            return (true, None);
        }
        let (vu, tu) = (self.types.underlying(v), self.types.underlying(t));
        if self.types.is_untyped(vu) {
            return (self.implicit_type_and_value(x, t).is_ok(), None);
        }
        if vu == tu && (!self.types.has_name(v) || !self.types.has_name(t)) {
            return (true, None);
        }
        if self.types.is_interface(tu) {
            return match self.implements(v, t) {
                Ok(()) => (true, None),
                Err(cause) => (false, Some(cause)),
            };
        }
        (false, None)
    }

    /// Whether `v` has every method of the interface `t`.
    pub(crate) fn implements(&mut self, v: TypeId, t: TypeId) -> Result<(), String> {
        let wanted = self.types.interface_methods(t).map(<[_]>::to_vec).unwrap_or_default();
        if wanted.is_empty() {
            return Ok(());
        }
        let not_implemented = |this: &Self, detail: String| {
            format!(
                "{} does not implement {} ({detail})",
                this.type_str(v),
                this.type_str(t)
            )
        };

        if self.types.is_interface(v) {
            let have = self.types.interface_methods(v).map(<[_]>::to_vec).unwrap_or_default();
            for m in &wanted {
                match have.iter().find(|h| h.name == m.name) {
                    None => return Err(not_implemented(self, format!("missing method {}", m.name))),
                    Some(h) if h.sig != m.sig => {
                        return Err(not_implemented(self, format!("wrong type for method {}", m.name)));
                    }
                    Some(_) => {}
                }
            }
            return Ok(());
        }

        let set = self.method_sets.get(&self.types, v);
        for m in &wanted {
            match set.lookup(&m.name) {
                Some(sel) if sel.sig == m.sig => {}
                Some(_) => {
                    return Err(not_implemented(self, format!("wrong type for method {}", m.name)));
                }
                None => {
                    let ptr = self.types.pointer(v);
                    let ptr_set = self.method_sets.get(&self.types, ptr);
                    let detail = if ptr_set.lookup(&m.name).is_some() {
                        format!("method {} has pointer receiver", m.name)
                    } else {
                        format!("missing method {}", m.name)
                    };
                    return Err(not_implemented(self, detail));
                }
            }
        }
        Ok(())
    }

    fn convertible_to(&mut self, x: &Operand<'ast>, t: TypeId) -> bool {
        if self.assignable_to(x, t).0 {
            return true;
        }
        let types = &self.types;
        let v = x.ty;
        let (vu, tu) = (types.underlying(v), types.underlying(t));
        if types.identical_ignore_tags(vu, tu) {
            return true;
        }
        if let (Some(vb), Some(tb)) = (types.pointer_elem(v), types.pointer_elem(t))
            && types.identical_ignore_tags(types.underlying(vb), types.underlying(tb))
        {
            return true;
        }
        let int_or_float = |id| types.is_integer(id) || types.is_float(id);
        if int_or_float(vu) && int_or_float(tu) {
            return true;
        }
        if (types.is_integer(vu) || types.is_bytes_or_runes(vu)) && types.is_string(tu) {
            return true;
        }
        types.is_string(vu) && types.is_bytes_or_runes(tu)
    }

    /// The conversion `T(x)`.
    pub(crate) fn conversion(&mut self, x: &mut Operand<'ast>, t: TypeId) {
        let const_arg = x.is_constant();
        let const_type = self.types.is_const_type(t);

        let ok = if const_arg && const_type {
            let converted = self.const_convert(x, t);
            if converted.is_none() && self.types.is_integer(x.ty) && self.types.is_integer(t) {
                let value = x.value().map(ToString::to_string).unwrap_or_default();
                let msg = format!("constant {value} overflows {}", self.type_str(t));
                self.error_at(x, TypeErrorKind::ConstantOverflow, msg);
                x.invalidate();
                return;
            }
            match converted {
                Some(value) => {
                    x.mode = Mode::Constant(value);
                    true
                }
                None => false,
            }
        } else if self.convertible_to(x, t) {
            x.mode = Mode::Value;
            true
        } else {
            false
        };

        if !ok {
            let msg = format!("cannot convert {} to type {}", self.describe(x), self.type_str(t));
            self.error_at(x, TypeErrorKind::InvalidConversion, msg);
            x.invalidate();
            return;
        }

        if self.types.is_untyped(x.ty) {
            let mut final_ty = t;
            if self.types.is_interface(t) || (const_arg && !const_type) || x.is_nil() {
                final_ty = self.types.default_type(x.ty);
            } else if x.is_constant() && self.types.is_integer(x.ty) && self.types.is_string(t) {
                final_ty = x.ty;
            }
            if let Some(expr) = x.expr {
                self.update_expr_type(expr, final_ty, true);
            }
        }
        x.ty = t;
    }

    /// Value of the constant `x` converted to the constant type `t`.
    fn const_convert(&self, x: &Operand<'ast>, t: TypeId) -> Option<ConstValue> {
        let kind = self.types.under_basic(t)?;
        let value = x.value()?;
        if let Ok(value) = value.represent(kind) {
            return Some(value);
        }
        if self.types.is_integer(x.ty) && self.types.is_string(t) {
            let c = value
                .to_int()
                .and_then(|i| u32::try_from(i).ok())
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Some(ConstValue::String(c.to_string()));
        }
        None
    }
}
