//! Expression evaluation.
//!
//! Every expression is evaluated into an [`Operand`] by [`Checker::raw_expr`],
//! which also records the result. The wrappers (`expr`, `expr_or_type`,
//! `multi_expr`) restrict which modes are acceptable in their context.
//!
//! Binary and unary operators consult the overload resolver once their
//! operands are known and before any built-in operator rules apply.

use goop_core::TypeErrorKind;
use goop_parser::ast::{
    BasicLit, BinaryOp, Expr, IdentExpr, IndexExpr, SliceExpr, StarExpr, UnaryExpr, UnaryOp,
};
use goop_parser::expr_string;

use super::Checker;
use crate::constant::{ConstError, ConstValue};
use crate::objects::ObjectKind;
use crate::operand::{Mode, ModeKind, Operand};
use crate::types::{BasicKind, Type, TypeId};

/// How an expression may appear at statement level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExprKind {
    Conversion,
    Expression,
    Statement,
}

fn const_error_message(op: &str, err: ConstError) -> String {
    match err {
        ConstError::Overflow if op.is_empty() => "constant overflow".to_string(),
        ConstError::Overflow => format!("constant {op} overflow"),
        ConstError::DivisionByZero => "invalid operation: division by zero".to_string(),
        ConstError::Invalid => "constant result is not representable".to_string(),
    }
}

fn binary_op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "addition",
        BinaryOp::Sub => "subtraction",
        BinaryOp::Xor => "bitwise XOR",
        BinaryOp::Mul => "multiplication",
        BinaryOp::Shl => "shift",
        _ => "",
    }
}

impl<'a, 'ast> Checker<'a, 'ast> {
    // =========================================
    // Entry points
    // =========================================

    /// Evaluate `e` and record the result.
    pub(crate) fn raw_expr(&mut self, e: Expr<'ast>, hint: Option<TypeId>) -> (Operand<'ast>, ExprKind) {
        let mut x = Operand::invalid();
        let kind = self.expr_internal(&mut x, e, hint);
        self.record(&x);
        (x, kind)
    }

    fn expr_internal(&mut self, x: &mut Operand<'ast>, e: Expr<'ast>, hint: Option<TypeId>) -> ExprKind {
        *x = Operand::invalid();
        x.expr = Some(e);

        match e {
            Expr::Ident(ident) => self.ident(x, ident),
            Expr::BasicLit(lit) => self.basic_lit(x, lit),
            Expr::CompositeLit(lit) => self.composite_lit(x, lit, hint),
            Expr::Paren(p) => {
                let (inner, kind) = self.raw_expr(p.x, hint);
                *x = inner;
                x.expr = Some(e);
                return kind;
            }
            Expr::Selector(sel) => self.selector(x, sel),
            Expr::Index(index) => self.index_expr(x, index),
            Expr::Slice(slice) => self.slice_expr(x, slice),
            Expr::Call(call) => {
                let kind = self.call_expr(x, call);
                x.expr = Some(e);
                return kind;
            }
            Expr::Star(star) => self.star(x, star),
            Expr::Unary(unary) => self.unary(x, unary),
            Expr::Binary(b) => {
                self.binary(x, Some(e), b.left, b.right, b.op);
            }
            Expr::KeyValue(kv) => {
                self.error(TypeErrorKind::Other, kv.span, "no key:value expected");
                x.invalidate();
            }
            Expr::Ellipsis(dots) => {
                self.error(TypeErrorKind::Other, dots.span, "invalid use of ...");
                x.invalidate();
            }
            Expr::ArrayType(_)
            | Expr::MapType(_)
            | Expr::StructType(_)
            | Expr::FuncType(_)
            | Expr::InterfaceType(_) => {
                let ty = self.type_expr(e);
                *x = Operand::new(Mode::TypeExpr, Some(e), ty);
            }
        }

        x.expr = Some(e);
        if x.is_invalid() {
            x.ty = TypeId::INVALID;
            return ExprKind::Statement;
        }
        ExprKind::Expression
    }

    /// Reject operands in modes the context does not allow.
    pub(crate) fn exclude(&mut self, x: &mut Operand<'ast>, modes: &[ModeKind]) {
        let kind = x.mode.kind();
        if !modes.contains(&kind) {
            return;
        }
        let msg = match kind {
            ModeKind::NoValue if modes.contains(&ModeKind::TypeExpr) => "used as value",
            ModeKind::NoValue => "used as value or type",
            ModeKind::Builtin => "must be called",
            ModeKind::TypeExpr => "is not an expression",
            _ => return,
        };
        let msg = format!("{} {msg}", self.describe(x));
        let code = match kind {
            ModeKind::TypeExpr => TypeErrorKind::NotAType,
            _ => TypeErrorKind::InvalidOperation,
        };
        self.error_at(x, code, msg);
        x.invalidate();
    }

    pub(crate) fn single_value(&mut self, x: &mut Operand<'ast>) {
        if x.mode == Mode::Value && self.types.tuple_elems(x.ty).is_some() {
            let msg = format!("multiple-value {} in single-value context", self.describe(x));
            self.error_at(x, TypeErrorKind::WrongCount, msg);
            x.invalidate();
        }
    }

    /// A single value.
    pub(crate) fn expr(&mut self, e: Expr<'ast>) -> Operand<'ast> {
        self.expr_with_hint(e, None)
    }

    /// A single value; `hint` types elided composite literals.
    pub(crate) fn expr_with_hint(&mut self, e: Expr<'ast>, hint: Option<TypeId>) -> Operand<'ast> {
        let (mut x, _) = self.raw_expr(e, hint);
        self.exclude(&mut x, &[ModeKind::NoValue, ModeKind::Builtin, ModeKind::TypeExpr]);
        self.single_value(&mut x);
        x
    }

    /// A single value or a type.
    pub(crate) fn expr_or_type(&mut self, e: Expr<'ast>) -> Operand<'ast> {
        let (mut x, _) = self.raw_expr(e, None);
        self.exclude(&mut x, &[ModeKind::NoValue]);
        self.single_value(&mut x);
        x
    }

    /// Every value of `e`, expanding multi-value calls. With `allow_comma_ok`
    /// a map index yields a second untyped boolean.
    pub(crate) fn multi_expr(&mut self, e: Expr<'ast>, allow_comma_ok: bool) -> Vec<Operand<'ast>> {
        let (mut x, _) = self.raw_expr(e, None);
        self.exclude(&mut x, &[ModeKind::NoValue, ModeKind::Builtin, ModeKind::TypeExpr]);

        if !x.is_invalid()
            && let Some(elems) = self.types.tuple_elems(x.ty)
        {
            return elems
                .iter()
                .map(|&ty| Operand::new(Mode::Value, Some(e), ty))
                .collect();
        }

        if allow_comma_ok && x.mode == Mode::MapIndex {
            x.mode = Mode::Value;
            let ok = Operand::new(Mode::Value, Some(e), self.untyped_bool());
            return vec![x, ok];
        }
        vec![x]
    }

    pub(crate) fn expr_list(&mut self, exprs: &[Expr<'ast>]) -> Vec<Operand<'ast>> {
        match exprs {
            [] => Vec::new(),
            [e] => self.multi_expr(*e, false),
            _ => exprs.iter().map(|&e| self.expr(e)).collect(),
        }
    }

    /// Evaluate expressions only for their errors and uses. Returns whether
    /// all of them were valid.
    pub(crate) fn use_exprs(&mut self, exprs: &[Expr<'ast>]) -> bool {
        self.use_n(exprs, false)
    }

    /// Like [`Self::use_exprs`] for assignment targets: a variable on the
    /// left-hand side is not marked used.
    pub(crate) fn use_lhs(&mut self, exprs: &[Expr<'ast>]) -> bool {
        self.use_n(exprs, true)
    }

    fn use_n(&mut self, exprs: &[Expr<'ast>], lhs: bool) -> bool {
        let mut ok = true;
        for &e in exprs {
            let valid = match e.unparen() {
                Expr::Ident(ident) if ident.name == "_" => true,
                Expr::Ident(ident) => {
                    let mut restore = None;
                    if lhs
                        && let Some(id) = self.lookup(ident.name)
                        && let ObjectKind::Var { used } = self.objects[id].kind
                    {
                        restore = Some((id, used));
                    }
                    let x = self.expr_or_type(e);
                    if let Some((id, used)) = restore {
                        self.objects[id].kind = ObjectKind::Var { used };
                    }
                    !x.is_invalid()
                }
                _ => !self.raw_expr(e, None).0.is_invalid(),
            };
            ok &= valid;
        }
        ok
    }

    // =========================================
    // Operands
    // =========================================

    fn ident(&mut self, x: &mut Operand<'ast>, e: &'ast IdentExpr<'ast>) {
        let Some(id) = self.lookup(e.name) else {
            let msg = if e.name == "_" {
                "cannot use _ as value".to_string()
            } else {
                format!("undefined: {}", e.name)
            };
            self.error(TypeErrorKind::Undeclared, e.span, msg);
            return;
        };

        if self.objects[id].ty.is_none() {
            self.obj_decl(id);
        }
        let ty = self.objects[id].ty.unwrap_or(TypeId::INVALID);

        match self.objects[id].kind.clone() {
            ObjectKind::PkgName { .. } => {
                self.error(
                    TypeErrorKind::InvalidOperation,
                    e.span,
                    format!("use of package {} not in selector", e.name),
                );
                return;
            }
            ObjectKind::Const { value } => {
                if !self.types.is_valid(ty) {
                    return;
                }
                let value = if id == self.universe.iota {
                    match self.env.iota.clone() {
                        Some(iota) => iota,
                        None => {
                            self.error(
                                TypeErrorKind::InvalidOperation,
                                e.span,
                                "cannot use iota outside constant declaration",
                            );
                            return;
                        }
                    }
                } else {
                    match value {
                        Some(value) => value,
                        None => return,
                    }
                };
                x.mode = Mode::Constant(value);
            }
            ObjectKind::TypeName { .. } => x.mode = Mode::TypeExpr,
            ObjectKind::Var { .. } => {
                self.objects.mark_used(id);
                if !self.types.is_valid(ty) {
                    return;
                }
                x.mode = Mode::Variable;
            }
            ObjectKind::Func => x.mode = Mode::Value,
            ObjectKind::Builtin(builtin) => x.mode = Mode::Builtin(builtin),
            ObjectKind::Nil => x.mode = Mode::Value,
        }
        x.ty = ty;
    }

    fn basic_lit(&mut self, x: &mut Operand<'ast>, lit: &'ast BasicLit<'ast>) {
        use goop_parser::ast::LitKind;

        let kind = match lit.kind {
            LitKind::Int => BasicKind::UntypedInt,
            LitKind::Float => BasicKind::UntypedFloat,
            LitKind::Rune => BasicKind::UntypedRune,
            LitKind::String => BasicKind::UntypedString,
        };
        match ConstValue::from_literal(lit.kind, lit.value) {
            Some(value) => {
                x.mode = Mode::Constant(value);
                x.ty = TypeId::basic(kind);
            }
            None => {
                self.error(
                    TypeErrorKind::ConstantOverflow,
                    lit.span,
                    format!("malformed constant: {}", lit.value),
                );
            }
        }
    }

    fn star(&mut self, x: &mut Operand<'ast>, e: &'ast StarExpr<'ast>) {
        *x = self.expr_or_type(e.x);
        match x.mode {
            Mode::Invalid => {}
            Mode::TypeExpr => {
                x.ty = self.types.pointer(x.ty);
            }
            _ => match self.types.under_pointer_elem(x.ty) {
                Some(base) => {
                    x.mode = Mode::Variable;
                    x.ty = base;
                }
                None => {
                    let msg = format!("invalid operation: cannot indirect {}", self.describe(x));
                    self.error_at(x, TypeErrorKind::InvalidOperation, msg);
                    x.invalidate();
                }
            },
        }
    }

    // =========================================
    // Operators
    // =========================================

    fn unary(&mut self, x: &mut Operand<'ast>, e: &'ast UnaryExpr<'ast>) {
        *x = self.expr(e.x);
        if x.is_invalid() {
            return;
        }

        if e.op == UnaryOp::Addr {
            if !matches!(e.x.unparen(), Expr::CompositeLit(_)) && x.mode != Mode::Variable {
                let msg = format!("invalid operation: cannot take address of {}", self.describe(x));
                self.error_at(x, TypeErrorKind::NotAddressable, msg);
                x.invalidate();
                return;
            }
            x.mode = Mode::Value;
            x.ty = self.types.pointer(x.ty);
            return;
        }

        if self.overload_unary(x, Expr::Unary(e)) {
            return;
        }

        let ok = match e.op {
            UnaryOp::Pos | UnaryOp::Neg => self.types.is_numeric(x.ty),
            UnaryOp::Xor => self.types.is_integer(x.ty),
            UnaryOp::Not => self.types.is_boolean(x.ty),
            UnaryOp::Addr => true,
        };
        if !ok {
            let msg = format!(
                "invalid operation: operator {} not defined on {}",
                e.op,
                self.describe(x)
            );
            self.error_at(x, TypeErrorKind::InvalidOperation, msg);
            x.invalidate();
            return;
        }

        if let Some(value) = x.value().cloned() {
            let unsigned_bits = if self.types.is_unsigned(x.ty) {
                self.types.under_basic(x.ty).and_then(BasicKind::bits)
            } else {
                None
            };
            x.expr = Some(Expr::Unary(e));
            match ConstValue::unary_op(e.op, &value, unsigned_bits) {
                Ok(value) => {
                    x.mode = Mode::Constant(value);
                    self.overflow(x);
                }
                Err(err) => {
                    let op = if e.op == UnaryOp::Xor { "bitwise complement" } else { "" };
                    self.error(TypeErrorKind::ConstantOverflow, e.span, const_error_message(op, err));
                    x.invalidate();
                }
            }
            return;
        }
        x.mode = Mode::Value;
    }

    /// `lhs op rhs`. `e` is absent for the operation of a compound
    /// assignment, which is never overloaded.
    pub(crate) fn binary(
        &mut self,
        x: &mut Operand<'ast>,
        e: Option<Expr<'ast>>,
        lhs: Expr<'ast>,
        rhs: Expr<'ast>,
        op: BinaryOp,
    ) {
        *x = self.expr(lhs);
        let mut y = self.expr(rhs);
        if x.is_invalid() {
            return;
        }
        if y.is_invalid() {
            x.invalidate();
            x.expr = y.expr;
            return;
        }

        if let Some(e) = e
            && self.overload_binary(x, &mut y, e)
        {
            return;
        }

        if op.is_shift() {
            self.shift(x, &mut y, e, op);
            return;
        }

        self.match_types(x, &mut y);
        if x.is_invalid() {
            return;
        }

        if op.is_comparison() {
            self.comparison(x, &mut y, op, false);
            return;
        }

        if x.ty != y.ty {
            if self.types.is_valid(x.ty) && self.types.is_valid(y.ty) {
                let (xt, yt) = (self.type_str(x.ty), self.type_str(y.ty));
                let msg = match e {
                    Some(e) => format!(
                        "invalid operation: {} (mismatched types {xt} and {yt})",
                        expr_string(e)
                    ),
                    None => format!(
                        "invalid operation: {} {op}= {} (mismatched types {xt} and {yt})",
                        expr_string(lhs),
                        expr_string(rhs)
                    ),
                };
                self.error_at(x, TypeErrorKind::MismatchedTypes, msg);
            }
            x.invalidate();
            return;
        }

        let ok = match op {
            BinaryOp::Add => self.types.is_numeric_or_string(x.ty),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Quo => self.types.is_numeric(x.ty),
            BinaryOp::Rem | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor | BinaryOp::AndNot => {
                self.types.is_integer(x.ty)
            }
            BinaryOp::LAnd | BinaryOp::LOr => self.types.is_boolean(x.ty),
            _ => false,
        };
        if !ok {
            let msg = format!(
                "invalid operation: operator {op} not defined on {}",
                self.describe(x)
            );
            self.error_at(x, TypeErrorKind::InvalidOperation, msg);
            x.invalidate();
            return;
        }

        if matches!(op, BinaryOp::Quo | BinaryOp::Rem)
            && (x.is_constant() || self.types.is_integer(x.ty))
            && y.value().is_some_and(ConstValue::is_zero)
        {
            self.error_at(&y, TypeErrorKind::DivisionByZero, "invalid operation: division by zero");
            x.invalidate();
            return;
        }

        if let (Some(xv), Some(yv)) = (x.value().cloned(), y.value().cloned()) {
            let integer_division = op == BinaryOp::Quo && self.types.is_integer(x.ty);
            if let Some(e) = e {
                x.expr = Some(e);
            }
            match ConstValue::binary_op(&xv, op, &yv, integer_division) {
                Ok(value) => {
                    x.mode = Mode::Constant(value);
                    self.overflow(x);
                }
                Err(err) => {
                    let span = e.map(|e| e.span()).unwrap_or_else(|| lhs.span());
                    let kind = if err == ConstError::DivisionByZero {
                        TypeErrorKind::DivisionByZero
                    } else {
                        TypeErrorKind::ConstantOverflow
                    };
                    self.error(kind, span, const_error_message(binary_op_name(op), err));
                    x.invalidate();
                }
            }
            return;
        }

        x.mode = Mode::Value;
    }

    /// Give untyped operands of a binary operation the type of the other
    /// operand where the combination allows it.
    pub(crate) fn match_types(&mut self, x: &mut Operand<'ast>, y: &mut Operand<'ast>) {
        let may_convert = {
            let t = &self.types;
            if t.is_typed(x.ty) && t.is_typed(y.ty) {
                false
            } else if t.is_interface(x.ty) || t.is_interface(y.ty) {
                true
            } else if t.is_boolean(x.ty) != t.is_boolean(y.ty) || t.is_string(x.ty) != t.is_string(y.ty) {
                false
            } else if x.is_nil() {
                t.has_nil(y.ty)
            } else if y.is_nil() {
                t.has_nil(x.ty)
            } else {
                t.under_pointer_elem(x.ty).is_none() && t.under_pointer_elem(y.ty).is_none()
            }
        };
        if !may_convert {
            return;
        }
        self.convert_untyped(x, y.ty);
        if x.is_invalid() {
            return;
        }
        self.convert_untyped(y, x.ty);
        if y.is_invalid() {
            x.invalidate();
        }
    }

    fn kind_string(&self, ty: TypeId) -> String {
        match self.types.composite_kind(ty) {
            Some(kind) if kind != "tuple" => kind.to_string(),
            _ => self.type_str(ty),
        }
    }

    fn incomparable_cause(&self, ty: TypeId) -> String {
        match self.types.get(self.types.underlying(ty)) {
            Type::Slice(_) | Type::Signature(_) | Type::Map { .. } => {
                format!("{} can only be compared to nil", self.kind_string(ty))
            }
            Type::Struct(fields) => fields
                .iter()
                .find(|f| !self.types.comparable(f.ty))
                .map(|f| format!("struct containing {} cannot be compared", self.type_str(f.ty)))
                .unwrap_or_default(),
            Type::Array { elem, .. } => {
                format!("{} cannot be compared", self.type_str(*elem))
            }
            _ => String::new(),
        }
    }

    /// A comparison. With `switch_case`, `x` is a case value compared
    /// against the tag `y`.
    pub(crate) fn comparison(
        &mut self,
        x: &mut Operand<'ast>,
        y: &mut Operand<'ast>,
        op: BinaryOp,
        switch_case: bool,
    ) {
        if !self.types.is_valid(x.ty) || !self.types.is_valid(y.ty) {
            x.invalidate();
            return;
        }
        let op = if switch_case { BinaryOp::Eql } else { op };

        let mut err_on_y = false;
        let mut cause = String::new();
        let mut kind = TypeErrorKind::MismatchedTypes;

        let assignable = self.assignable_to(x, y.ty).0 || self.assignable_to(y, x.ty).0;
        let failed = if !assignable {
            err_on_y = true;
            cause = format!(
                "mismatched types {} and {}",
                self.type_str(x.ty),
                self.type_str(y.ty)
            );
            true
        } else {
            kind = TypeErrorKind::InvalidOperation;
            match op {
                BinaryOp::Eql | BinaryOp::Neq => {
                    if x.is_nil() || y.is_nil() {
                        let ty = if x.is_nil() { y.ty } else { x.ty };
                        err_on_y = true;
                        !self.types.has_nil(ty)
                    } else if !self.types.comparable(x.ty) {
                        cause = self.incomparable_cause(x.ty);
                        true
                    } else if !self.types.comparable(y.ty) {
                        err_on_y = true;
                        cause = self.incomparable_cause(y.ty);
                        true
                    } else {
                        false
                    }
                }
                _ => {
                    if !self.types.is_ordered(x.ty) {
                        true
                    } else if !self.types.is_ordered(y.ty) {
                        err_on_y = true;
                        true
                    } else {
                        false
                    }
                }
            }
        };

        if failed {
            let err_ty = if err_on_y { y.ty } else { x.ty };
            if cause.is_empty() {
                cause = format!("operator {op} not defined on {}", self.kind_string(err_ty));
            }
            let (xs, ys) = (self.expr_text(x), self.expr_text(y));
            if switch_case {
                let msg = format!("invalid case {xs} in switch on {ys} ({cause})");
                self.error_at(x, kind, msg);
            } else {
                let msg = format!("invalid operation: {xs} {op} {ys} ({cause})");
                let at = if err_on_y { y.clone() } else { x.clone() };
                self.error_at(&at, kind, msg);
            }
            x.invalidate();
            return;
        }

        match (x.value().cloned(), y.value().cloned()) {
            (Some(xv), Some(yv)) => {
                let result = ConstValue::compare(&xv, op, &yv).unwrap_or(false);
                x.mode = Mode::Constant(ConstValue::Bool(result));
            }
            _ => {
                x.mode = Mode::Value;
                if let Some(expr) = x.expr {
                    let ty = self.types.default_type(x.ty);
                    self.update_expr_type(expr, ty, true);
                }
                if let Some(expr) = y.expr {
                    let ty = self.types.default_type(y.ty);
                    self.update_expr_type(expr, ty, true);
                }
            }
        }
        x.ty = self.untyped_bool();
    }

    fn shift(&mut self, x: &mut Operand<'ast>, y: &mut Operand<'ast>, e: Option<Expr<'ast>>, op: BinaryOp) {
        let xval = x.value().and_then(ConstValue::to_int);
        let integral = self.types.is_integer(x.ty) || (self.types.is_untyped(x.ty) && xval.is_some());
        if !integral {
            let msg = format!(
                "invalid operation: shifted operand {} must be integer",
                self.describe(x)
            );
            self.error_at(x, TypeErrorKind::InvalidOperation, msg);
            x.invalidate();
            return;
        }

        let mut yval = None;
        if let Some(value) = y.value().cloned() {
            yval = value.to_int();
            if yval.is_some_and(|v| v < 0) {
                let msg = format!("invalid operation: negative shift count {}", self.describe(y));
                self.error_at(y, TypeErrorKind::InvalidOperation, msg);
                x.invalidate();
                return;
            }
            if self.types.is_untyped(y.ty) {
                self.representable(y, BasicKind::Uint);
                if y.is_invalid() {
                    x.invalidate();
                    return;
                }
            }
        } else if self.types.is_untyped(y.ty) {
            self.convert_untyped(y, TypeId::basic(BasicKind::Uint));
            if y.is_invalid() {
                x.invalidate();
                return;
            }
        } else if !self.types.is_integer(y.ty) {
            let msg = format!("invalid operation: shift count {} must be integer", self.describe(y));
            self.error_at(y, TypeErrorKind::InvalidOperation, msg);
            x.invalidate();
            return;
        }

        if let Some(xv) = xval
            && x.is_constant()
        {
            if y.is_constant() {
                const SHIFT_BOUND: i128 = 1023 - 1 + 52;
                let count = match yval {
                    Some(s) if s <= SHIFT_BOUND => s as u32,
                    _ => {
                        let msg = format!("invalid operation: invalid shift count {}", self.describe(y));
                        self.error_at(y, TypeErrorKind::InvalidOperation, msg);
                        x.invalidate();
                        return;
                    }
                };
                if !self.types.is_integer(x.ty) {
                    x.ty = TypeId::basic(BasicKind::UntypedInt);
                }
                if let Some(e) = e {
                    x.expr = Some(e);
                }
                match ConstValue::shift(&ConstValue::Int(xv), op, count) {
                    Ok(value) => {
                        x.mode = Mode::Constant(value);
                        self.overflow(x);
                    }
                    Err(err) => {
                        let span = x.expr.map(|e| e.span()).unwrap_or_default();
                        self.error(TypeErrorKind::ConstantOverflow, span, const_error_message("shift", err));
                        x.invalidate();
                    }
                }
                return;
            }

            if self.types.is_untyped(x.ty) {
                // The type of the shifted constant is decided by its context.
                if let Some(expr) = x.expr
                    && let Some(entry) = self.untyped.get_mut(&expr.id())
                {
                    entry.is_lhs = true;
                }
                x.mode = Mode::Value;
                return;
            }
        }

        if !self.types.is_integer(x.ty) {
            let msg = format!(
                "invalid operation: shifted operand {} must be integer",
                self.describe(x)
            );
            self.error_at(x, TypeErrorKind::InvalidOperation, msg);
            x.invalidate();
            return;
        }
        x.mode = Mode::Value;
    }

    // =========================================
    // Index and slice expressions
    // =========================================

    fn index_expr(&mut self, x: &mut Operand<'ast>, e: &'ast IndexExpr<'ast>) {
        *x = self.expr_or_type(e.x);
        match x.mode {
            Mode::Invalid => {
                self.use_exprs(&[e.index]);
                return;
            }
            Mode::TypeExpr => {
                let msg = format!("{} is not a generic type", self.type_str(x.ty));
                self.error_at(x, TypeErrorKind::NotAType, msg);
                self.use_exprs(&[e.index]);
                x.invalidate();
                return;
            }
            _ => {}
        }

        let mut length: Option<i128> = None;
        let under = self.types.underlying(x.ty);
        let valid = match self.types.get(under).clone() {
            Type::Basic(_) if self.types.is_string(under) => {
                if let Some(s) = x.value().and_then(ConstValue::as_str) {
                    length = Some(s.len() as i128);
                }
                x.mode = Mode::Value;
                x.ty = TypeId::basic(BasicKind::Uint8);
                true
            }
            Type::Array { len, elem } => {
                length = Some(len as i128);
                if x.mode != Mode::Variable {
                    x.mode = Mode::Value;
                }
                x.ty = elem;
                true
            }
            Type::Pointer(base) => match self.types.get(self.types.underlying(base)).clone() {
                Type::Array { len, elem } => {
                    length = Some(len as i128);
                    x.mode = Mode::Variable;
                    x.ty = elem;
                    true
                }
                _ => false,
            },
            Type::Slice(elem) => {
                x.mode = Mode::Variable;
                x.ty = elem;
                true
            }
            Type::Map { key, value } => {
                let mut k = self.expr(e.index);
                self.assignment(&mut k, Some(key), "map index");
                x.mode = Mode::MapIndex;
                x.ty = value;
                return;
            }
            _ => false,
        };

        if !valid {
            let msg = format!("invalid operation: cannot index {}", self.describe(x));
            self.error(TypeErrorKind::InvalidIndex, e.span, msg);
            self.use_exprs(&[e.index]);
            x.invalidate();
            return;
        }
        self.index(e.index, length);
    }

    /// Check an index against an optional length. Returns the constant index
    /// value when there is one.
    pub(crate) fn index(&mut self, index: Expr<'ast>, max: Option<i128>) -> (TypeId, Option<i128>) {
        let mut x = self.expr(index);
        if !self.is_valid_index(&mut x, "index", false) {
            return (TypeId::INVALID, None);
        }
        let Some(v) = x.value().and_then(ConstValue::to_int) else {
            return (x.ty, None);
        };
        if let Some(max) = max
            && v >= max
        {
            let msg = format!("invalid argument: index {v} out of bounds [0:{max}]");
            self.error_at(&x, TypeErrorKind::InvalidIndex, msg);
            return (TypeId::INVALID, None);
        }
        (x.ty, Some(v))
    }

    pub(crate) fn is_valid_index(&mut self, x: &mut Operand<'ast>, what: &str, allow_negative: bool) -> bool {
        if x.is_invalid() {
            return false;
        }
        self.convert_untyped(x, TypeId::basic(BasicKind::Int));
        if x.is_invalid() {
            return false;
        }
        if !self.types.is_integer(x.ty) {
            let msg = format!("invalid argument: {what} {} must be integer", self.describe(x));
            self.error_at(x, TypeErrorKind::InvalidIndex, msg);
            return false;
        }
        if let Some(value) = x.value().cloned() {
            if !allow_negative && value.sign() == Some(std::cmp::Ordering::Less) {
                let msg = format!("invalid argument: {what} {} must not be negative", self.describe(x));
                self.error_at(x, TypeErrorKind::InvalidIndex, msg);
                return false;
            }
            if value.represent(BasicKind::Int).is_err() {
                let msg = format!("invalid argument: {what} {} overflows int", self.describe(x));
                self.error_at(x, TypeErrorKind::InvalidIndex, msg);
                return false;
            }
        }
        true
    }

    fn slice_expr(&mut self, x: &mut Operand<'ast>, e: &'ast SliceExpr<'ast>) {
        let indices = [e.low, e.high, e.max];
        *x = self.expr(e.x);
        if x.is_invalid() {
            let present: Vec<_> = indices.iter().flatten().copied().collect();
            self.use_exprs(&present);
            return;
        }

        let mut length: Option<i128> = None;
        let under = self.types.underlying(x.ty);
        let valid = match self.types.get(under).clone() {
            Type::Basic(_) if self.types.is_string(under) => {
                if e.slice3 {
                    let span = e.max.map(|m| m.span()).unwrap_or(e.span);
                    self.error(
                        TypeErrorKind::InvalidOperation,
                        span,
                        "invalid operation: 3-index slice of string",
                    );
                    x.invalidate();
                    return;
                }
                if let Some(s) = x.value().and_then(ConstValue::as_str) {
                    length = Some(s.len() as i128);
                }
                if self.types.is_untyped(x.ty) {
                    x.ty = TypeId::basic(BasicKind::String);
                }
                true
            }
            Type::Array { len, elem } => {
                length = Some(len as i128);
                if x.mode != Mode::Variable {
                    let msg = format!(
                        "invalid operation: cannot slice {} (value not addressable)",
                        self.describe(x)
                    );
                    self.error_at(x, TypeErrorKind::NotAddressable, msg);
                    x.invalidate();
                    return;
                }
                x.ty = self.types.slice(elem);
                true
            }
            Type::Pointer(base) => match self.types.get(self.types.underlying(base)).clone() {
                Type::Array { len, elem } => {
                    length = Some(len as i128);
                    x.ty = self.types.slice(elem);
                    true
                }
                _ => false,
            },
            Type::Slice(_) => true,
            _ => false,
        };

        if !valid {
            let msg = format!("cannot slice {}", self.describe(x));
            self.error_at(x, TypeErrorKind::InvalidOperation, msg);
            x.invalidate();
            return;
        }
        x.mode = Mode::Value;

        if e.slice3 && (e.high.is_none() || e.max.is_none()) {
            self.error(
                TypeErrorKind::Other,
                e.span,
                "2nd and 3rd index required in 3-index slice",
            );
            x.invalidate();
            return;
        }

        let mut ind: [Option<i128>; 3] = [None; 3];
        for (i, index) in indices.iter().enumerate() {
            ind[i] = match index {
                Some(index) => self.index(*index, length.map(|l| l + 1)).1,
                None if i == 0 => Some(0),
                None => length,
            };
        }

        'outer: for i in 0..ind.len() - 1 {
            let Some(lo) = ind[i].filter(|&v| v > 0) else {
                continue;
            };
            for j in i + 1..ind.len() {
                if let Some(hi) = ind[j]
                    && hi < lo
                {
                    let span = indices[j].map(|x| x.span()).unwrap_or(e.span);
                    self.error(
                        TypeErrorKind::InvalidIndex,
                        span,
                        format!("invalid slice indices: {hi} < {lo}"),
                    );
                    break 'outer;
                }
            }
        }
    }
}
