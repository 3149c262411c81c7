//! The type checker.
//!
//! Checking happens in three phases:
//!
//! 1. Every file's top-level declarations are collected into the package
//!    scope without looking at their right-hand sides.
//! 2. Package-level objects are declared lazily in dependency order; a type
//!    declaration also resolves the methods of that type.
//! 3. Function bodies are checked once every package-level object has a
//!    type, so method sets are complete when operator overloads are looked up.
//!
//! Expression evaluation produces [`Operand`]s. Untyped expressions are kept
//! in a side map until their final type is known and then recorded.

mod assign;
mod call;
mod conversion;
mod decl;
mod expr;
mod literal;
mod resolver;
mod selector;
mod stmt;
mod typexpr;

pub(crate) use expr::ExprKind;

use std::collections::VecDeque;

use goop_core::{ExprId, FileId, Span, TypeError, TypeErrorKind};
use goop_parser::ast::{Expr, FuncDecl, Ident, TypeSpec};
use goop_parser::{SourceFile, expr_string};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::CheckerConfig;
use crate::constant::ConstValue;
use crate::diagnostics::DiagnosticSink;
use crate::info::{Info, TypeAndValue};
use crate::objects::{Object, ObjectId, ObjectKind, Objects, ScopeId, ScopeKind, Scopes};
use crate::operand::{Mode, ModeKind, Operand};
use crate::overload::OverloadTable;
use crate::types::{MethodSetCache, TypeId, TypeTable};
use crate::universe::Universe;

/// An untyped expression whose final type is not yet known.
#[derive(Debug, Clone)]
pub(crate) struct UntypedEntry<'ast> {
    pub expr: Expr<'ast>,
    /// The expression is the left operand of a non-constant shift.
    pub is_lhs: bool,
    pub mode: ModeKind,
    pub ty: TypeId,
    pub value: Option<ConstValue>,
}

/// Unchecked right-hand side of a package-level object.
#[derive(Debug, Clone)]
pub(crate) enum DeclInfo<'ast> {
    Const {
        file: FileId,
        ty: Option<Expr<'ast>>,
        init: Option<Expr<'ast>>,
        iota: u32,
        inherited: bool,
    },
    Var {
        file: FileId,
        /// Every variable sharing a single multi-value initializer.
        lhs: Option<Vec<ObjectId>>,
        ty: Option<Expr<'ast>>,
        init: Option<Expr<'ast>>,
    },
    Type {
        file: FileId,
        spec: &'ast TypeSpec<'ast>,
    },
    Func {
        file: FileId,
        decl: &'ast FuncDecl<'ast>,
    },
}

impl DeclInfo<'_> {
    fn file(&self) -> FileId {
        match self {
            DeclInfo::Const { file, .. }
            | DeclInfo::Var { file, .. }
            | DeclInfo::Type { file, .. }
            | DeclInfo::Func { file, .. } => *file,
        }
    }
}

/// A parameter, result or receiver.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Param<'ast> {
    pub name: Option<Ident<'ast>>,
    pub ty: TypeId,
}

/// A function or method whose body is checked in the last phase.
#[derive(Debug, Clone)]
pub(crate) struct PendingBody<'ast> {
    pub file: FileId,
    pub decl: &'ast FuncDecl<'ast>,
    pub sig: TypeId,
    pub recv: Option<Param<'ast>>,
    pub params: Vec<Param<'ast>>,
    pub results: Vec<Param<'ast>>,
}

/// Context of the declaration or function body being checked.
#[derive(Debug, Clone)]
pub(crate) struct Environment {
    pub file: FileId,
    pub scope: ScopeId,
    /// Value of `iota` inside a constant declaration.
    pub iota: Option<ConstValue>,
    /// Signature of the enclosing function.
    pub sig: Option<TypeId>,
    pub result_vars: Vec<ObjectId>,
    /// The current expression contains a function call.
    pub has_call_or_recv: bool,
    /// Position used for errors in inherited constant initializers.
    pub err_pos: Option<Span>,
}

pub(crate) struct Checker<'a, 'ast> {
    pub(crate) config: &'a CheckerConfig,
    pub(crate) files: &'a [SourceFile<'ast>],
    pub(crate) pkg_name: String,

    pub(crate) types: TypeTable,
    pub(crate) objects: Objects,
    pub(crate) scopes: Scopes,
    pub(crate) universe: Universe,
    pub(crate) pkg_scope: ScopeId,
    pub(crate) file_scopes: Vec<ScopeId>,
    /// Scopes of imported packages, by path.
    pub(crate) imports: FxHashMap<String, ScopeId>,
    pub(crate) method_sets: MethodSetCache,

    pub(crate) decls: FxHashMap<ObjectId, DeclInfo<'ast>>,
    /// Method declarations grouped by receiver base type name.
    pub(crate) methods: FxHashMap<String, Vec<(FileId, &'ast FuncDecl<'ast>)>>,
    pub(crate) bodies: VecDeque<PendingBody<'ast>>,
    /// Map key types to check once all types are complete.
    pub(crate) map_keys: Vec<(FileId, Span, TypeId)>,

    pub(crate) info: Info,
    pub(crate) overloads: OverloadTable,
    pub(crate) untyped: FxHashMap<ExprId, UntypedEntry<'ast>>,
    /// Calls of `panic` inside functions with results.
    pub(crate) is_panic: FxHashSet<ExprId>,
    /// Local variables of the function being checked.
    pub(crate) func_vars: Vec<ObjectId>,

    pub(crate) env: Environment,

    pub(crate) sink: Box<dyn DiagnosticSink + 'a>,
    pub(crate) error_count: usize,
    pub(crate) first_error: Option<TypeError>,
}

impl<'a, 'ast> Checker<'a, 'ast> {
    pub(crate) fn new(
        config: &'a CheckerConfig,
        files: &'a [SourceFile<'ast>],
        sink: Box<dyn DiagnosticSink + 'a>,
    ) -> Self {
        let types = TypeTable::new();
        let mut objects = Objects::default();
        let mut scopes = Scopes::default();
        let universe = Universe::new(&mut objects, &mut scopes, &types);
        let pkg_scope = scopes.new_scope(Some(universe.scope), ScopeKind::Package);
        let pkg_name = files
            .first()
            .map(|f| f.package.name.to_string())
            .unwrap_or_default();

        Self {
            config,
            files,
            pkg_name,
            types,
            objects,
            scopes,
            universe,
            pkg_scope,
            file_scopes: Vec::new(),
            imports: FxHashMap::default(),
            method_sets: MethodSetCache::new(),
            decls: FxHashMap::default(),
            methods: FxHashMap::default(),
            bodies: VecDeque::new(),
            map_keys: Vec::new(),
            info: Info::default(),
            overloads: OverloadTable::new(),
            untyped: FxHashMap::default(),
            is_panic: FxHashSet::default(),
            func_vars: Vec::new(),
            env: Environment {
                file: FileId(0),
                scope: pkg_scope,
                iota: None,
                sig: None,
                result_vars: Vec::new(),
                has_call_or_recv: false,
                err_pos: None,
            },
            sink,
            error_count: 0,
            first_error: None,
        }
    }

    // =========================================
    // Diagnostics
    // =========================================

    pub(crate) fn error(&mut self, kind: TypeErrorKind, span: Span, message: impl Into<String>) {
        let span = self.env.err_pos.unwrap_or(span);
        let error = TypeError::new(kind, self.env.file, span, message);
        self.error_count += 1;
        if self.first_error.is_none() {
            self.first_error = Some(error.clone());
        }
        self.sink.report(error);
    }

    /// Report at the operand's expression.
    pub(crate) fn error_at(&mut self, x: &Operand<'ast>, kind: TypeErrorKind, message: impl Into<String>) {
        let span = x.expr.map(|e| e.span()).unwrap_or_default();
        self.error(kind, span, message);
    }

    /// Spelling of a type for diagnostics.
    pub(crate) fn type_str(&self, ty: TypeId) -> String {
        self.types.display(ty, &self.pkg_name)
    }

    /// Source text of the operand's expression.
    pub(crate) fn expr_text(&self, x: &Operand<'ast>) -> String {
        x.expr.map(expr_string).unwrap_or_else(|| "true".to_string())
    }

    /// `2 (untyped int constant)`, `v (variable of array type vec4)`, ...
    pub(crate) fn describe(&self, x: &Operand<'ast>) -> String {
        let expr = x.expr.map(expr_string);
        let kind = x.mode.kind();
        let mut out = String::new();
        if let Some(expr) = &expr {
            out.push_str(expr);
            out.push_str(" (");
        }

        let has_type = !matches!(
            kind,
            ModeKind::Invalid | ModeKind::NoValue | ModeKind::Builtin | ModeKind::TypeExpr
        );
        let untyped = has_type && self.types.is_untyped(x.ty);
        if untyped {
            out.push_str(&self.type_str(x.ty));
            out.push(' ');
        }
        out.push_str(kind.as_str());
        if let Mode::Constant(value) = &x.mode {
            let spelled = value.to_string();
            if expr.as_deref() != Some(spelled.as_str()) {
                out.push(' ');
                out.push_str(&spelled);
            }
        }
        if has_type && !untyped {
            if self.types.is_valid(x.ty) {
                out.push_str(" of ");
                if self.types.is_named(x.ty)
                    && let Some(kind) = self.types.composite_kind(x.ty)
                {
                    out.push_str(kind);
                    out.push(' ');
                }
                out.push_str("type ");
                out.push_str(&self.type_str(x.ty));
            } else {
                out.push_str(" with invalid type");
            }
        }
        if expr.is_some() {
            out.push(')');
        }
        out
    }

    // =========================================
    // Scopes and objects
    // =========================================

    pub(crate) fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.scopes.lookup(self.env.scope, name).map(|(_, id)| id)
    }

    pub(crate) fn open_scope(&mut self) {
        self.env.scope = self.scopes.new_scope(Some(self.env.scope), ScopeKind::Block);
    }

    pub(crate) fn close_scope(&mut self) {
        if let Some(parent) = self.scopes.get(self.env.scope).parent {
            self.env.scope = parent;
        }
    }

    /// Insert `id` into `scope`, reporting a redeclaration.
    pub(crate) fn declare(&mut self, scope: ScopeId, id: ObjectId) {
        let name = self.objects[id].name.clone();
        if name.is_empty() {
            return;
        }
        if self.scopes.insert(scope, &name, id).is_err() {
            let pos = self.objects[id].pos;
            self.error(
                TypeErrorKind::Redeclared,
                pos,
                format!("{name} redeclared in this block"),
            );
        }
    }

    /// A new local variable without a type.
    pub(crate) fn new_var(&mut self, name: &str, pos: Span) -> ObjectId {
        let id = self.objects.alloc(Object::new(
            name,
            ObjectKind::Var { used: false },
            self.env.file,
            pos,
        ));
        if self.env.sig.is_some() && name != "_" {
            self.func_vars.push(id);
        }
        id
    }

    // =========================================
    // Recording
    // =========================================

    /// Record the outcome of evaluating `x.expr`.
    pub(crate) fn record(&mut self, x: &Operand<'ast>) {
        let Some(expr) = x.expr else {
            return;
        };
        let (ty, value) = match &x.mode {
            Mode::Invalid => (TypeId::INVALID, None),
            Mode::Constant(value) => (x.ty, Some(value.clone())),
            _ => (x.ty, None),
        };
        if self.types.is_untyped(ty) {
            self.untyped.insert(
                expr.id(),
                UntypedEntry {
                    expr,
                    is_lhs: false,
                    mode: x.mode.kind(),
                    ty,
                    value,
                },
            );
        } else {
            self.record_type_and_value(expr.id(), x.mode.kind(), ty, value);
        }
    }

    pub(crate) fn record_type_and_value(
        &mut self,
        id: ExprId,
        mode: ModeKind,
        ty: TypeId,
        value: Option<ConstValue>,
    ) {
        if mode == ModeKind::Invalid {
            return;
        }
        self.info.record(id, TypeAndValue { mode, ty, value });
    }

    /// Give an untyped expression (and the untyped operands it was built
    /// from) a new type. A final type removes the expression from the
    /// untyped map and records it.
    pub(crate) fn update_expr_type(&mut self, expr: Expr<'ast>, ty: TypeId, is_final: bool) {
        let Some(old) = self.untyped.get(&expr.id()).cloned() else {
            return;
        };

        match expr {
            Expr::Paren(p) => self.update_expr_type(p.x, ty, is_final),
            Expr::Unary(u) => {
                if old.value.is_none() {
                    self.update_expr_type(u.x, ty, is_final);
                }
            }
            Expr::Binary(b) => {
                if old.value.is_none() {
                    if b.op.is_comparison() {
                        // Operands of comparisons have their own types.
                    } else if b.op.is_shift() {
                        self.update_expr_type(b.left, ty, is_final);
                    } else {
                        self.update_expr_type(b.left, ty, is_final);
                        self.update_expr_type(b.right, ty, is_final);
                    }
                }
            }
            _ => {}
        }

        if !is_final && self.types.is_untyped(ty) {
            if let Some(entry) = self.untyped.get_mut(&expr.id()) {
                entry.ty = self.types.underlying(ty);
            }
            return;
        }

        self.untyped.remove(&expr.id());
        if old.is_lhs && !self.types.is_integer(ty) {
            let msg = format!(
                "invalid operation: shifted operand {} (type {}) must be integer",
                expr_string(expr),
                self.type_str(ty)
            );
            self.error(TypeErrorKind::InvalidOperation, expr.span(), msg);
            return;
        }
        if let Some(value) = &old.value {
            let mut c = Operand::new(Mode::Constant(value.clone()), Some(expr), old.ty);
            self.convert_untyped(&mut c, ty);
            if c.is_invalid() {
                return;
            }
        }
        self.record_type_and_value(expr.id(), old.mode, ty, old.value);
    }

    /// Replace the constant value remembered for an untyped expression.
    pub(crate) fn update_expr_val(&mut self, expr: Option<Expr<'ast>>, value: &ConstValue) {
        if let Some(expr) = expr
            && let Some(entry) = self.untyped.get_mut(&expr.id())
        {
            entry.value = Some(value.clone());
        }
    }

    /// Record every expression that never received a final type.
    pub(crate) fn record_untyped(&mut self) {
        let mut entries: Vec<_> = self.untyped.drain().map(|(_, entry)| entry).collect();
        entries.sort_by_key(|e| e.expr.id());
        for entry in entries {
            self.record_type_and_value(entry.expr.id(), entry.mode, entry.ty, entry.value);
        }
    }
}
