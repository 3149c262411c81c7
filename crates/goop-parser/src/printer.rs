//! Source printer.
//!
//! Turns an AST back into Go source. Layout follows gofmt where it can be
//! decided from the tree alone: tab indentation, one blank line between
//! top-level declarations, and gofmt's rules for spacing binary operators
//! (`a*b + c` rather than `a * b + c`). Line breaks inside expressions and
//! comments are not reproduced.
//!
//! Parentheses are inserted wherever operator precedence requires them, so a
//! rewritten tree whose selector operands are binary expressions still prints
//! as valid source.

use crate::ast::*;

/// Indentation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indent {
    #[default]
    Tab,
    Spaces(usize),
}

/// Configuration for printed output.
#[derive(Debug, Clone, Default)]
pub struct PrintConfig {
    pub indent: Indent,
}

/// Print a whole source file.
pub fn print_file(file: &SourceFile<'_>, config: &PrintConfig) -> String {
    let mut printer = Printer::new(config);
    printer.file(file);
    printer.out
}

/// Print a single expression on one line, as used in diagnostics.
pub fn expr_string(expr: Expr<'_>) -> String {
    let config = PrintConfig::default();
    let mut printer = Printer::new(&config);
    printer.expr(expr);
    printer.out
}

/// Precedence of postfix forms; operands printed at this level get
/// parenthesised unless they are primary expressions.
const HIGHEST_PREC: u8 = 7;
const UNARY_PREC: u8 = 6;
const LOWEST_PREC: u8 = 0;

struct Printer<'c> {
    out: String,
    level: usize,
    config: &'c PrintConfig,
}

impl<'c> Printer<'c> {
    fn new(config: &'c PrintConfig) -> Self {
        Self {
            out: String::new(),
            level: 0,
            config,
        }
    }

    fn text(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.level {
            match self.config.indent {
                Indent::Tab => self.out.push('\t'),
                Indent::Spaces(n) => self.out.extend(std::iter::repeat_n(' ', n)),
            }
        }
    }

    // =========================================
    // Declarations
    // =========================================

    fn file(&mut self, file: &SourceFile<'_>) {
        self.text("package ");
        self.text(file.package.name);
        self.text("\n");
        for decl in file.decls {
            self.text("\n");
            match decl {
                Decl::Gen(gen_decl) => self.gen_decl(gen_decl),
                Decl::Func(func) => self.func_decl(func),
            }
            self.text("\n");
        }
    }

    fn gen_decl(&mut self, decl: &GenDecl<'_>) {
        self.text(decl.keyword.as_str());
        if !decl.grouped {
            if let Some(spec) = decl.specs.first() {
                self.text(" ");
                self.spec(spec);
            }
            return;
        }
        if decl.specs.is_empty() {
            self.text(" ()");
            return;
        }
        self.text(" (");
        self.level += 1;
        for spec in decl.specs {
            self.newline();
            self.spec(spec);
        }
        self.level -= 1;
        self.newline();
        self.text(")");
    }

    fn spec(&mut self, spec: &Spec<'_>) {
        match spec {
            Spec::Import(import) => {
                if let Some(name) = import.name {
                    self.text(name.name);
                    self.text(" ");
                }
                self.text(import.path);
            }
            Spec::Value(value) => {
                self.ident_list(value.names);
                if let Some(ty) = value.ty {
                    self.text(" ");
                    self.expr(ty);
                }
                if !value.values.is_empty() {
                    self.text(" = ");
                    self.expr_list(value.values, 1);
                }
            }
            Spec::Type(spec) => {
                self.text(spec.name.name);
                self.text(if spec.alias { " = " } else { " " });
                self.expr(spec.ty);
            }
        }
    }

    fn func_decl(&mut self, func: &FuncDecl<'_>) {
        self.text("func ");
        if let Some(recv) = func.recv {
            self.text("(");
            self.field(recv);
            self.text(") ");
        }
        self.text(func.name.name);
        self.signature(func.ty);
        if let Some(body) = func.body {
            self.text(" ");
            self.block(body);
        }
    }

    fn ident_list(&mut self, names: &[Ident<'_>]) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.text(", ");
            }
            self.text(name.name);
        }
    }

    /// `(params) results`
    fn signature(&mut self, ty: &FuncTypeExpr<'_>) {
        self.text("(");
        self.field_list(ty.params);
        self.text(")");
        match ty.results {
            [] => {}
            [single] if single.names.is_empty() => {
                self.text(" ");
                self.expr(single.ty);
            }
            results => {
                self.text(" (");
                self.field_list(results);
                self.text(")");
            }
        }
    }

    fn field_list(&mut self, fields: &[Field<'_>]) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.text(", ");
            }
            self.field(field);
        }
    }

    fn field(&mut self, field: &Field<'_>) {
        if !field.names.is_empty() {
            self.ident_list(field.names);
            self.text(" ");
        }
        self.expr(field.ty);
        if let Some(tag) = field.tag {
            self.text(" ");
            self.text(tag);
        }
    }

    // =========================================
    // Statements
    // =========================================

    fn block(&mut self, block: &BlockStmt<'_>) {
        let stmts: Vec<_> = block
            .stmts
            .iter()
            .filter(|s| !matches!(s, Stmt::Empty(_)))
            .collect();
        if stmts.is_empty() && block.span.line == block.rbrace.line {
            self.text("{}");
            return;
        }
        self.text("{");
        self.stmt_list(stmts.into_iter().copied());
        self.newline();
        self.text("}");
    }

    fn stmt_list<'a>(&mut self, stmts: impl IntoIterator<Item = Stmt<'a>>) {
        self.level += 1;
        for stmt in stmts {
            if matches!(stmt, Stmt::Empty(_)) {
                continue;
            }
            self.newline();
            self.stmt(stmt);
        }
        self.level -= 1;
    }

    fn stmt(&mut self, stmt: Stmt<'_>) {
        match stmt {
            Stmt::Decl(decl) => self.gen_decl(decl),
            Stmt::Expr(s) => self.expr0(s.x, 1),
            Stmt::IncDec(s) => {
                self.expr0(s.x, 1);
                self.text(if s.inc { "++" } else { "--" });
            }
            Stmt::Assign(s) => {
                let depth = if s.lhs.len() > 1 && s.rhs.len() > 1 { 2 } else { 1 };
                self.expr_list(s.lhs, depth);
                self.text(" ");
                self.text(&s.op.to_string());
                self.text(" ");
                self.expr_list(s.rhs, depth);
            }
            Stmt::Call(s) => {
                self.text(match s.keyword {
                    CallKeyword::Go => "go ",
                    CallKeyword::Defer => "defer ",
                });
                self.expr(s.call);
            }
            Stmt::Return(s) => {
                self.text("return");
                if !s.results.is_empty() {
                    self.text(" ");
                    self.expr_list(s.results, 1);
                }
            }
            Stmt::Branch(s) => self.text(s.kind.as_str()),
            Stmt::Block(b) => self.block(b),
            Stmt::If(s) => self.if_stmt(s),
            Stmt::Switch(s) => {
                self.text("switch ");
                if let Some(init) = s.init {
                    self.stmt(init);
                    self.text("; ");
                }
                if let Some(tag) = s.tag {
                    self.expr(tag);
                    self.text(" ");
                }
                self.text("{");
                for clause in s.clauses {
                    self.newline();
                    if clause.is_default() {
                        self.text("default:");
                    } else {
                        self.text("case ");
                        self.expr_list(clause.list, 1);
                        self.text(":");
                    }
                    self.stmt_list(clause.body.iter().copied());
                }
                self.newline();
                self.text("}");
            }
            Stmt::For(s) => {
                self.text("for ");
                if s.init.is_some() || s.post.is_some() {
                    if let Some(init) = s.init {
                        self.stmt(init);
                    }
                    self.text("; ");
                    if let Some(cond) = s.cond {
                        self.expr(cond);
                    }
                    self.text("; ");
                    if let Some(post) = s.post {
                        self.stmt(post);
                        self.text(" ");
                    }
                } else if let Some(cond) = s.cond {
                    self.expr(cond);
                    self.text(" ");
                }
                self.block(s.body);
            }
            Stmt::Range(s) => {
                self.text("for ");
                if let Some(key) = s.key {
                    self.expr(key);
                    if let Some(value) = s.value {
                        self.text(", ");
                        self.expr(value);
                    }
                    self.text(if s.define { " := " } else { " = " });
                }
                self.text("range ");
                self.expr(s.x);
                self.text(" ");
                self.block(s.body);
            }
            Stmt::Empty(_) => {}
        }
    }

    fn if_stmt(&mut self, s: &IfStmt<'_>) {
        self.text("if ");
        if let Some(init) = s.init {
            self.stmt(init);
            self.text("; ");
        }
        self.expr(s.cond);
        self.text(" ");
        self.block(s.then);
        match s.els {
            Some(Stmt::If(nested)) => {
                self.text(" else ");
                self.if_stmt(nested);
            }
            Some(Stmt::Block(block)) => {
                self.text(" else ");
                self.block(block);
            }
            Some(other) => {
                self.text(" else ");
                self.stmt(other);
            }
            None => {}
        }
    }

    // =========================================
    // Expressions
    // =========================================

    fn expr(&mut self, x: Expr<'_>) {
        self.expr1(x, LOWEST_PREC, 1);
    }

    fn expr0(&mut self, x: Expr<'_>, depth: u32) {
        self.expr1(x, LOWEST_PREC, depth);
    }

    fn expr_list(&mut self, list: &[Expr<'_>], depth: u32) {
        for (i, x) in list.iter().enumerate() {
            if i > 0 {
                self.text(", ");
            }
            self.expr0(*x, depth);
        }
    }

    /// Print `x` as the operand of an operator with precedence `prec1`.
    fn expr1(&mut self, x: Expr<'_>, prec1: u8, depth: u32) {
        match x {
            Expr::Ident(ident) => self.text(ident.name),
            Expr::BasicLit(lit) => self.text(lit.value),
            Expr::Binary(bin) => {
                let depth = depth.max(1);
                self.binary(bin, prec1, cutoff(bin, depth), depth);
            }
            Expr::Unary(unary) => {
                if UNARY_PREC < prec1 {
                    self.text("(");
                    self.expr(x);
                    self.text(")");
                } else {
                    self.text(unary.op.as_str());
                    if let Expr::Unary(inner) = unary.x
                        && matches!(
                            (unary.op, inner.op),
                            (UnaryOp::Neg, UnaryOp::Neg) | (UnaryOp::Pos, UnaryOp::Pos)
                        )
                    {
                        self.text(" ");
                    }
                    self.expr1(unary.x, UNARY_PREC, depth);
                }
            }
            Expr::Star(star) => {
                if UNARY_PREC < prec1 {
                    self.text("(");
                    self.expr(x);
                    self.text(")");
                } else {
                    self.text("*");
                    self.expr(star.x);
                }
            }
            Expr::Paren(paren) => {
                if let Expr::Paren(_) = paren.x {
                    self.expr0(paren.x, depth);
                } else {
                    self.text("(");
                    self.expr0(paren.x, reduce_depth(depth));
                    self.text(")");
                }
            }
            Expr::Selector(sel) => {
                self.expr1(sel.x, HIGHEST_PREC, depth);
                self.text(".");
                self.text(sel.sel.name);
            }
            Expr::Index(index) => {
                self.expr1(index.x, HIGHEST_PREC, 1);
                self.text("[");
                self.expr0(index.index, depth + 1);
                self.text("]");
            }
            Expr::Slice(slice) => self.slice(slice, depth),
            Expr::Call(call) => {
                let depth = if call.args.len() > 1 { depth + 1 } else { depth };
                if let Expr::FuncType(_) = call.fun {
                    self.text("(");
                    self.expr1(call.fun, HIGHEST_PREC, depth);
                    self.text(")");
                } else {
                    self.expr1(call.fun, HIGHEST_PREC, depth);
                }
                self.text("(");
                self.expr_list(call.args, depth);
                if call.has_ellipsis {
                    self.text("...");
                }
                self.text(")");
            }
            Expr::CompositeLit(lit) => {
                if let Some(ty) = lit.ty {
                    self.expr1(ty, HIGHEST_PREC, depth);
                }
                self.text("{");
                self.expr_list(lit.elts, 1);
                self.text("}");
            }
            Expr::KeyValue(kv) => {
                self.expr(kv.key);
                self.text(": ");
                self.expr(kv.value);
            }
            Expr::ArrayType(array) => {
                self.text("[");
                if let Some(len) = array.len {
                    self.expr(len);
                }
                self.text("]");
                self.expr(array.elem);
            }
            Expr::MapType(map) => {
                self.text("map[");
                self.expr(map.key);
                self.text("]");
                self.expr(map.value);
            }
            Expr::StructType(st) => {
                if st.fields.is_empty() {
                    self.text("struct{}");
                    return;
                }
                self.text("struct {");
                self.level += 1;
                for field in st.fields {
                    self.newline();
                    self.field(field);
                }
                self.level -= 1;
                self.newline();
                self.text("}");
            }
            Expr::FuncType(func) => {
                self.text("func");
                self.signature(func);
            }
            Expr::InterfaceType(iface) => {
                if iface.elems.is_empty() {
                    self.text("interface{}");
                    return;
                }
                self.text("interface {");
                self.level += 1;
                for elem in iface.elems {
                    self.newline();
                    match elem {
                        InterfaceElem::Method { name, ty } => {
                            self.text(name.name);
                            self.signature(ty);
                        }
                        InterfaceElem::Embedded(ty) => self.expr(*ty),
                    }
                }
                self.level -= 1;
                self.newline();
                self.text("}");
            }
            Expr::Ellipsis(ellipsis) => {
                self.text("...");
                if let Some(elem) = ellipsis.elem {
                    self.expr(elem);
                }
            }
        }
    }

    fn binary(&mut self, bin: &BinaryExpr<'_>, prec1: u8, cutoff: u8, depth: u32) {
        let prec = bin.op.precedence();
        if prec < prec1 {
            self.text("(");
            self.expr0(Expr::Binary(bin), reduce_depth(depth));
            self.text(")");
            return;
        }

        let blank = prec < cutoff;
        self.expr1(bin.left, prec, depth + diff_prec(bin.left, prec));
        if blank {
            self.text(" ");
        }
        self.text(bin.op.as_str());
        if blank {
            self.text(" ");
        }
        self.expr1(bin.right, prec + 1, depth + 1);
    }

    fn slice(&mut self, slice: &SliceExpr<'_>, depth: u32) {
        self.expr1(slice.x, HIGHEST_PREC, 1);
        self.text("[");
        let mut indices = vec![slice.low, slice.high];
        if slice.slice3 {
            indices.push(slice.max);
        }

        let needs_blanks = depth <= 1
            && indices.iter().flatten().count() > 1
            && indices.iter().flatten().any(|x| matches!(x, Expr::Binary(_)));

        for (i, index) in indices.iter().enumerate() {
            if i > 0 {
                if indices[i - 1].is_some() && needs_blanks {
                    self.text(" ");
                }
                self.text(":");
                if index.is_some() && needs_blanks {
                    self.text(" ");
                }
            }
            if let Some(x) = index {
                self.expr0(*x, depth + 1);
            }
        }
        self.text("]");
    }
}

fn reduce_depth(depth: u32) -> u32 {
    depth.saturating_sub(1).max(1)
}

/// 0 if `x` is a binary expression at precedence `prec`, else 1.
fn diff_prec(x: Expr<'_>, prec: u8) -> u32 {
    match x {
        Expr::Binary(bin) if bin.op.precedence() == prec => 0,
        _ => 1,
    }
}

/// The precedence below which operators in `bin` are surrounded by blanks.
fn cutoff(bin: &BinaryExpr<'_>, depth: u32) -> u8 {
    let (has4, has5, max_problem) = walk_binary(bin);
    if max_problem > 0 {
        return max_problem + 1;
    }
    match (has4 && has5, depth == 1) {
        (true, true) => 5,
        (true, false) => 4,
        (false, true) => 6,
        (false, false) => 4,
    }
}

/// Scan a binary chain for the precedence levels it mixes, and for operator
/// pairs that would lex differently without a blank (`a / *p`, `a - -b`).
fn walk_binary(bin: &BinaryExpr<'_>) -> (bool, bool, u8) {
    let prec = bin.op.precedence();
    let mut has4 = prec == 4;
    let mut has5 = prec == 5;
    let mut max_problem = 0;

    if let Expr::Binary(left) = bin.left
        && left.op.precedence() >= prec
    {
        let (h4, h5, mp) = walk_binary(left);
        has4 |= h4;
        has5 |= h5;
        max_problem = max_problem.max(mp);
    }

    match bin.right {
        Expr::Binary(right) if right.op.precedence() > prec => {
            let (h4, h5, mp) = walk_binary(right);
            has4 |= h4;
            has5 |= h5;
            max_problem = max_problem.max(mp);
        }
        Expr::Star(_) if bin.op == BinaryOp::Quo => max_problem = 5,
        Expr::Unary(unary) => match (bin.op, unary.op) {
            (BinaryOp::And, UnaryOp::Addr) | (BinaryOp::And, UnaryOp::Xor) => max_problem = 5,
            (BinaryOp::Add, UnaryOp::Pos) | (BinaryOp::Sub, UnaryOp::Neg) => {
                max_problem = max_problem.max(4)
            }
            _ => {}
        },
        _ => {}
    }

    (has4, has5, max_problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use goop_core::ExprIdGen;

    fn reprint_expr(source: &str) -> String {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let x = Parser::parse_expression(source, &arena, &mut ids).unwrap();
        expr_string(x)
    }

    fn reprint(source: &str) -> String {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let file = Parser::parse_file(source, &arena, &mut ids).unwrap();
        print_file(&file, &PrintConfig::default())
    }

    #[test]
    fn binary_spacing_follows_gofmt() {
        assert_eq!(reprint_expr("2 * v1 * v2 + v1 - 4"), "2*v1*v2 + v1 - 4");
        assert_eq!(reprint_expr("a*b"), "a * b");
        assert_eq!(reprint_expr("a+b"), "a + b");
        assert_eq!(reprint_expr("x == y && z < 3"), "x == y && z < 3");
    }

    #[test]
    fn nested_call_arguments_are_compact() {
        assert_eq!(reprint_expr("f(a + b, c * d)"), "f(a+b, c*d)");
        assert_eq!(reprint_expr("f(a + b)"), "f(a + b)");
    }

    #[test]
    fn operator_pairs_keep_blanks() {
        assert_eq!(reprint_expr("a - -b"), "a - -b");
        assert_eq!(reprint_expr("a / *p"), "a / *p");
        assert_eq!(reprint_expr("- -x"), "- -x");
    }

    #[test]
    fn parentheses_kept() {
        assert_eq!(reprint_expr("(a + b) * c"), "(a + b) * c");
        assert_eq!(reprint_expr("((x))"), "(x)");
    }

    #[test]
    fn slices_and_literals() {
        assert_eq!(reprint_expr("s[i+1 : j]"), "s[i+1 : j]");
        assert_eq!(reprint_expr("s[:n]"), "s[:n]");
        assert_eq!(reprint_expr("[]int{1, 2, 3}"), "[]int{1, 2, 3}");
        assert_eq!(reprint_expr("T{X: 1, Y: 2}"), "T{X: 1, Y: 2}");
        assert_eq!(reprint_expr("map[string][]int{}"), "map[string][]int{}");
    }

    #[test]
    fn prints_file_layout() {
        let source = "package main\n\nimport \"fmt\"\n\ntype vec4 [4]float64\n\nfunc (v vec4) Op_Add(o vec4) vec4 {\n\tfor i := range v {\n\t\tv[i] += o[i]\n\t}\n\treturn v\n}\n\nfunc main() {}\n";
        assert_eq!(reprint(source), source);
    }

    #[test]
    fn prints_control_flow() {
        let source = "package p\n\nfunc f(x int) int {\n\tif y := x * 2; y > 3 {\n\t\treturn y\n\t} else if x < 0 {\n\t\treturn -x\n\t}\n\tswitch x {\n\tcase 1, 2:\n\t\tx++\n\tdefault:\n\t\tx = 0\n\t}\n\tfor i := 0; i < 3; i++ {\n\t\tx += i\n\t}\n\treturn x\n}\n";
        assert_eq!(reprint(source), source);
    }

    #[test]
    fn prints_grouped_declarations() {
        let source = "package p\n\nconst (\n\tA = iota\n\tB\n)\n\nvar (\n\tx, y int\n\tz = \"s\"\n)\n\ntype P struct {\n\tX, Y float64\n\tname string `json:\"name\"`\n}\n";
        assert_eq!(reprint(source), source);
    }

    #[test]
    fn spaces_indent() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let file =
            Parser::parse_file("package p\n\nfunc f() {\n\treturn\n}\n", &arena, &mut ids).unwrap();
        let config = PrintConfig {
            indent: Indent::Spaces(4),
        };
        assert_eq!(print_file(&file, &config), "package p\n\nfunc f() {\n    return\n}\n");
    }
}
