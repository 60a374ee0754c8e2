//! Java to Python translation of a parsed [`Program`].
//!
//! Classes become Python classes with `@staticmethod` for static methods,
//! locals become plain assignments and `System.out` calls become `print`.
//! Counting `for` loops turn into `for ... in range(...)`; anything else is
//! rewritten as a `while` loop. A class with a `main` entry point gets an
//! `if __name__ == "__main__":` guard at the end of the file.
//!
//! Increments and assignments are only translated as whole statements;
//! Python has no expression form for them, so they fail with
//! [`GreetingError::Untranslatable`] anywhere else.

use std::collections::HashSet;

use tracing::debug;

use crate::ast::{
    BinaryOp, Block, CatchClause, ClassDecl, Expr, Item, Literal, Member, MethodDecl, Position,
    PrintKind, Program, StepOp, Stmt, SwitchCase, TypeRef, UnaryOp, VarDecl,
};
use crate::error::{GreetingError, Result};
use crate::semantic::{Symbol, SymbolTable, Typing, ValueType, binary_typing, unary_typing};

const INDENT: &str = "    ";

/// Translates `program` to Python source text.
///
/// ## Errors
///
/// Returns [`GreetingError::Untranslatable`] for assignments or `++`/`--`
/// used inside a larger expression, and for `>>>`.
pub fn to_python(program: &Program) -> Result<String> {
    let mut generator = Generator::default();
    let mut previous_was_class = false;
    for (index, item) in program.items.iter().enumerate() {
        let is_class = matches!(item, Item::Class(_));
        if index > 0 && (is_class || previous_was_class) {
            generator.out.push_str("\n\n");
        }
        match item {
            Item::Class(class) => generator.class(class)?,
            Item::Statement(stmt) => generator.statement(stmt)?,
        }
        previous_was_class = is_class;
    }

    let entry = program.classes().find(|class| {
        class.members.iter().any(|member| {
            matches!(member, Member::Method(method) if method.is_entry_point())
        })
    });
    if let Some(class) = entry {
        generator.out.push_str("\n\nif __name__ == \"__main__\":\n");
        generator.out.push_str(&format!("{INDENT}{}.main([])\n", class.name));
    }

    debug!(bytes = generator.out.len(), "generated python");
    Ok(generator.out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MethodKind {
    Static,
    Instance,
}

struct ClassContext {
    name: String,
    field_scope: usize,
}

#[derive(Default)]
struct Generator {
    out: String,
    indent: usize,
    symbols: SymbolTable,
    classes: Vec<ClassContext>,
    method: Option<MethodKind>,
}

/// Python binding strength of a binary operator; larger binds tighter.
fn python_precedence(op: BinaryOp) -> u8 {
    use BinaryOp::*;
    match op {
        Or => 1,
        And => 2,
        Eq | Ne | Lt | Le | Gt | Ge => 4,
        BitOr => 5,
        BitXor => 6,
        BitAnd => 7,
        Shl | Shr | UShr => 8,
        Add | Sub => 9,
        Mul | Div | Rem => 10,
    }
}

const NOT_PRECEDENCE: u8 = 3;
const UNARY_PRECEDENCE: u8 = 11;
const ATOM_PRECEDENCE: u8 = 12;

fn expr_precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => python_precedence(*op),
        Expr::Unary {
            op: UnaryOp::Not, ..
        } => NOT_PRECEDENCE,
        Expr::Unary { .. } => UNARY_PRECEDENCE,
        _ => ATOM_PRECEDENCE,
    }
}

fn default_value(ty: &TypeRef) -> &'static str {
    match ValueType::from_type_ref(ty) {
        ValueType::Float | ValueType::Double => "0.0",
        ty if ty.is_numeric() => "0",
        ValueType::Boolean => "False",
        _ => "None",
    }
}

fn python_exception(java: &TypeRef) -> &'static str {
    match java.name.as_str() {
        "ArithmeticException" => "ZeroDivisionError",
        "ArrayIndexOutOfBoundsException" | "IndexOutOfBoundsException" => "IndexError",
        "NumberFormatException" | "IllegalArgumentException" => "ValueError",
        "NullPointerException" => "AttributeError",
        _ => "Exception",
    }
}

/// Rewrites a `printf` format for Python's `%` operator.
fn python_format(format: &str) -> String {
    let mut converted = String::with_capacity(format.len());
    let mut chars = format.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            converted.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => converted.push_str("\\n"),
            Some(next) => {
                converted.push('%');
                converted.push(next);
            }
            None => converted.push('%'),
        }
    }
    converted
}

fn untranslatable(construct: &str, position: Position) -> GreetingError {
    GreetingError::Untranslatable {
        construct: construct.to_string(),
        line: position.line,
        column: position.column,
    }
}

/// A `for` loop that counts one variable by a constant step.
struct RangeLoop<'a> {
    var: &'a str,
    ty: ValueType,
    start: &'a Expr,
    end: &'a Expr,
    step: i64,
    inclusive: bool,
}

impl<'a> RangeLoop<'a> {
    fn detect(
        init: Option<&'a Stmt>,
        condition: Option<&'a Expr>,
        update: &'a [Expr],
        body: &Stmt,
    ) -> Option<Self> {
        let (var, ty, start) = match init? {
            Stmt::VarDecl(decl) => {
                let ty = ValueType::from_type_ref(&decl.ty);
                if !ty.is_integral() {
                    return None;
                }
                (decl.name.as_str(), ty, decl.init.as_ref()?)
            }
            Stmt::Expr(Expr::Assign {
                target,
                op: None,
                value,
                ..
            }) => (target.as_str(), ValueType::Int, value.as_ref()),
            _ => return None,
        };

        let Expr::Binary {
            op: comparison,
            lhs,
            rhs: end,
        } = condition?
        else {
            return None;
        };
        if !matches!(lhs.as_ref(), Expr::Ident { name, .. } if name == var) {
            return None;
        }

        let step = match update {
            [Expr::Step { target, op, .. }] if target == var => match op {
                StepOp::Increment => 1,
                StepOp::Decrement => -1,
            },
            [Expr::Assign {
                target,
                op: Some(op),
                value,
                ..
            }] if target == var => {
                let Expr::Literal {
                    value: Literal::Number(amount),
                    ..
                } = value.as_ref()
                else {
                    return None;
                };
                let amount: i64 = amount.parse().ok()?;
                match op {
                    BinaryOp::Add => amount,
                    BinaryOp::Sub => -amount,
                    _ => return None,
                }
            }
            _ => return None,
        };
        let inclusive = match comparison {
            BinaryOp::Lt if step > 0 => false,
            BinaryOp::Gt if step < 0 => false,
            BinaryOp::Le if step > 0 => true,
            BinaryOp::Ge if step < 0 => true,
            _ => return None,
        };

        // `range` fixes its bounds up front, so the body must leave them alone.
        let mut assigned = HashSet::new();
        assigned_names(body, &mut assigned);
        let mut read = HashSet::new();
        read_names(end, &mut read);
        if assigned.contains(var) || !assigned.is_disjoint(&read) {
            return None;
        }

        Some(Self {
            var,
            ty,
            start,
            end: end.as_ref(),
            step,
            inclusive,
        })
    }
}

fn assigned_in_expr(expr: &Expr, names: &mut HashSet<String>) {
    match expr {
        Expr::Assign { target, value, .. } => {
            names.insert(target.clone());
            assigned_in_expr(value, names);
        }
        Expr::Step { target, .. } => {
            names.insert(target.clone());
        }
        Expr::Binary { lhs, rhs, .. } => {
            assigned_in_expr(lhs, names);
            assigned_in_expr(rhs, names);
        }
        Expr::Unary { operand, .. } => assigned_in_expr(operand, names),
        Expr::Literal { .. } | Expr::Ident { .. } => {}
    }
}

fn assigned_names(stmt: &Stmt, names: &mut HashSet<String>) {
    let all = |stmts: &[Stmt], names: &mut HashSet<String>| {
        stmts.iter().for_each(|s| assigned_names(s, names));
    };
    match stmt {
        Stmt::VarDecl(decl) => {
            if let Some(init) = &decl.init {
                assigned_in_expr(init, names);
            }
        }
        Stmt::Expr(expr) => assigned_in_expr(expr, names),
        Stmt::Block(block) => all(&block.statements, names),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            assigned_in_expr(condition, names);
            assigned_names(then_branch, names);
            if let Some(else_branch) = else_branch {
                assigned_names(else_branch, names);
            }
        }
        Stmt::While { condition, body } | Stmt::DoWhile { body, condition } => {
            assigned_in_expr(condition, names);
            assigned_names(body, names);
        }
        Stmt::For {
            init,
            condition,
            update,
            body,
        } => {
            if let Some(init) = init {
                assigned_names(init, names);
            }
            if let Some(condition) = condition {
                assigned_in_expr(condition, names);
            }
            update.iter().for_each(|e| assigned_in_expr(e, names));
            assigned_names(body, names);
        }
        Stmt::Switch {
            scrutinee,
            cases,
            default,
        } => {
            assigned_in_expr(scrutinee, names);
            for case in cases {
                all(&case.body, names);
            }
            if let Some(default) = default {
                all(default, names);
            }
        }
        Stmt::Try {
            body,
            catches,
            finally,
        } => {
            all(&body.statements, names);
            for catch in catches {
                all(&catch.body.statements, names);
            }
            if let Some(finally) = finally {
                all(&finally.statements, names);
            }
        }
        Stmt::Print { args, .. } => args.iter().for_each(|e| assigned_in_expr(e, names)),
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                assigned_in_expr(value, names);
            }
        }
        Stmt::Break | Stmt::Continue | Stmt::Empty => {}
    }
}

fn read_names(expr: &Expr, names: &mut HashSet<String>) {
    match expr {
        Expr::Ident { name, .. } => {
            names.insert(name.clone());
        }
        Expr::Binary { lhs, rhs, .. } => {
            read_names(lhs, names);
            read_names(rhs, names);
        }
        Expr::Unary { operand, .. } => read_names(operand, names),
        Expr::Assign { value, .. } => read_names(value, names),
        Expr::Literal { .. } | Expr::Step { .. } => {}
    }
}

/// Top-level statements of a case up to its first `break`.
fn case_statements(body: &[Stmt]) -> &[Stmt] {
    let end = body
        .iter()
        .position(|stmt| matches!(stmt, Stmt::Break))
        .unwrap_or(body.len());
    &body[..end]
}

impl Generator {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn declare(&mut self, name: &str, ty: ValueType) {
        // Redeclarations were already reported by the checker; keep the first.
        let _ = self.symbols.declare(
            name,
            Symbol {
                ty,
                position: Position::default(),
                initialized: true,
                constant: false,
            },
        );
    }

    /// Runs `emit` one level deeper inside a fresh scope, writing `pass`
    /// when it produced nothing.
    fn indented(&mut self, emit: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.indent += 1;
        self.symbols.enter_scope();
        let start = self.out.len();
        let result = emit(self);
        if result.is_ok() && self.out.len() == start {
            self.line("pass");
        }
        self.symbols.exit_scope();
        self.indent -= 1;
        result
    }

    fn statements(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn suite(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.indented(|this| this.statements(stmts))
    }

    /// Body of `if`/loops, which Java allows to be a single statement.
    fn branch(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(block) => self.suite(&block.statements),
            other => self.suite(std::slice::from_ref(other)),
        }
    }

    fn class(&mut self, class: &ClassDecl) -> Result<()> {
        self.line(&format!("class {}:", class.name));
        let outer_method = self.method.take();
        self.indent += 1;
        self.symbols.enter_scope();
        self.classes.push(ClassContext {
            name: class.name.clone(),
            field_scope: self.symbols.depth() - 1,
        });

        let result = self.class_body(class);

        self.classes.pop();
        self.symbols.exit_scope();
        self.indent -= 1;
        self.method = outer_method;
        result
    }

    /// Fields first, so every method sees all of them.
    fn class_body(&mut self, class: &ClassDecl) -> Result<()> {
        let start = self.out.len();
        for member in &class.members {
            if let Member::Field(field) = member {
                self.field(field)?;
            }
        }
        for member in &class.members {
            let separate = self.out.len() > start;
            match member {
                Member::Method(method) => {
                    if separate {
                        self.out.push('\n');
                    }
                    self.method(method)?;
                }
                Member::Class(nested) => {
                    if separate {
                        self.out.push('\n');
                    }
                    self.class(nested)?;
                }
                Member::Field(_) => {}
            }
        }
        if self.out.len() == start {
            self.line("pass");
        }
        Ok(())
    }

    fn field(&mut self, field: &VarDecl) -> Result<()> {
        let value = match &field.init {
            Some(init) => self.expr(init)?,
            None => default_value(&field.ty).to_string(),
        };
        self.line(&format!("{} = {value}", field.name));
        self.declare(&field.name, ValueType::from_type_ref(&field.ty));
        Ok(())
    }

    fn method(&mut self, method: &MethodDecl) -> Result<()> {
        let kind = if method.is_static() {
            MethodKind::Static
        } else {
            MethodKind::Instance
        };
        let name = if method.return_type.is_none() {
            "__init__"
        } else {
            method.name.as_str()
        };
        let mut params: Vec<&str> = method.params.iter().map(|p| p.name.as_str()).collect();
        if kind == MethodKind::Instance {
            params.insert(0, "self");
        } else {
            self.line("@staticmethod");
        }
        self.line(&format!("def {name}({}):", params.join(", ")));

        let outer = self.method.replace(kind);
        let result = self.indented(|this| {
            for param in &method.params {
                this.declare(&param.name, ValueType::from_type_ref(&param.ty));
            }
            this.statements(&method.body.statements)
        });
        self.method = outer;
        result
    }

    /// How a field is reached from the current method, if at all.
    fn field_prefix(&self, name: &str) -> Option<String> {
        let class = self.classes.last()?;
        let (depth, _) = self.symbols.resolve(name)?;
        if depth != class.field_scope {
            return None;
        }
        match self.method? {
            MethodKind::Static => Some(class.name.clone()),
            MethodKind::Instance => Some("self".to_string()),
        }
    }

    fn name(&self, name: &str) -> String {
        match self.field_prefix(name) {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        }
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::VarDecl(decl) => {
                let value = match &decl.init {
                    Some(init) => self.expr(init)?,
                    None => default_value(&decl.ty).to_string(),
                };
                self.declare(&decl.name, ValueType::from_type_ref(&decl.ty));
                let target = self.name(&decl.name);
                self.line(&format!("{target} = {value}"));
            }
            Stmt::Expr(expr) => self.expr_statement(expr)?,
            Stmt::Block(block) => {
                self.symbols.enter_scope();
                let result = self.statements(&block.statements);
                self.symbols.exit_scope();
                result?;
            }
            Stmt::If { .. } => self.if_chain(stmt, "if")?,
            Stmt::While { condition, body } => {
                let condition = self.expr(condition)?;
                self.line(&format!("while {condition}:"));
                self.branch(body)?;
            }
            Stmt::DoWhile { body, condition } => {
                self.line("while True:");
                self.indented(|this| {
                    match body.as_ref() {
                        Stmt::Block(block) => this.statements(&block.statements)?,
                        other => this.statement(other)?,
                    }
                    let condition = this.negated(condition)?;
                    this.line(&format!("if {condition}:"));
                    this.indented(|this| {
                        this.line("break");
                        Ok(())
                    })
                })?;
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => self.for_loop(init.as_deref(), condition.as_ref(), update, body)?,
            Stmt::Switch {
                scrutinee,
                cases,
                default,
            } => self.switch(scrutinee, cases, default.as_deref())?,
            Stmt::Try {
                body,
                catches,
                finally,
            } => self.try_statement(body, catches, finally.as_ref())?,
            Stmt::Print { kind, args, .. } => self.print(*kind, args)?,
            Stmt::Return { value, .. } => match value {
                Some(value) => {
                    let value = self.expr(value)?;
                    self.line(&format!("return {value}"));
                }
                None => self.line("return"),
            },
            Stmt::Break => self.line("break"),
            Stmt::Continue => self.line("continue"),
            Stmt::Empty => {}
        }
        Ok(())
    }

    /// `if` followed by any `else if` links as `elif`.
    fn if_chain(&mut self, stmt: &Stmt, keyword: &str) -> Result<()> {
        let Stmt::If {
            condition,
            then_branch,
            else_branch,
        } = stmt
        else {
            return self.statement(stmt);
        };
        let condition = self.expr(condition)?;
        self.line(&format!("{keyword} {condition}:"));
        self.branch(then_branch)?;
        match else_branch.as_deref() {
            Some(nested @ Stmt::If { .. }) => self.if_chain(nested, "elif"),
            Some(other) => {
                self.line("else:");
                self.branch(other)
            }
            None => Ok(()),
        }
    }

    fn for_loop(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: &[Expr],
        body: &Stmt,
    ) -> Result<()> {
        self.symbols.enter_scope();
        let result = match RangeLoop::detect(init, condition, update, body) {
            Some(range) => self.range_loop(&range, body),
            None => self.while_loop(init, condition, update, body),
        };
        self.symbols.exit_scope();
        result
    }

    fn range_loop(&mut self, range: &RangeLoop<'_>, body: &Stmt) -> Result<()> {
        let start = self.expr(range.start)?;
        let literal_bound = match range.end {
            Expr::Literal {
                value: Literal::Number(n),
                ..
            } => n.parse::<i64>().ok(),
            _ => None,
        };
        let end = match (range.inclusive, literal_bound) {
            (false, _) => self.expr(range.end)?,
            (true, Some(bound)) => (bound + range.step.signum()).to_string(),
            (true, None) => {
                let end = self.operand(range.end, python_precedence(BinaryOp::Add), false)?;
                if range.step > 0 {
                    format!("{end} + 1")
                } else {
                    format!("{end} - 1")
                }
            }
        };
        self.declare(range.var, range.ty.clone());
        let var = self.name(range.var);
        let bounds = if range.step == 1 {
            format!("{start}, {end}")
        } else {
            format!("{start}, {end}, {}", range.step)
        };
        self.line(&format!("for {var} in range({bounds}):"));
        self.branch(body)
    }

    fn while_loop(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: &[Expr],
        body: &Stmt,
    ) -> Result<()> {
        if let Some(init) = init {
            self.statement(init)?;
        }
        let condition = match condition {
            Some(condition) => self.expr(condition)?,
            None => "True".to_string(),
        };
        self.line(&format!("while {condition}:"));
        self.indented(|this| {
            match body {
                Stmt::Block(block) => this.statements(&block.statements)?,
                other => this.statement(other)?,
            }
            for expr in update {
                this.expr_statement(expr)?;
            }
            Ok(())
        })
    }

    fn switch(
        &mut self,
        scrutinee: &Expr,
        cases: &[SwitchCase],
        default: Option<&[Stmt]>,
    ) -> Result<()> {
        let subject = self.operand(scrutinee, python_precedence(BinaryOp::Eq), true)?;
        let mut keyword = "if";
        // Empty cases fall through into the next one, so they share its body.
        let mut pending = Vec::new();
        for case in cases {
            let value = self.operand(&case.value, python_precedence(BinaryOp::Eq), true)?;
            pending.push(format!("{subject} == {value}"));
            if case.body.is_empty() {
                continue;
            }
            self.line(&format!("{keyword} {}:", pending.join(" or ")));
            pending.clear();
            self.suite(case_statements(&case.body))?;
            keyword = "elif";
        }
        match default {
            Some(default) if keyword == "if" => {
                self.symbols.enter_scope();
                let result = self.statements(case_statements(default));
                self.symbols.exit_scope();
                result
            }
            Some(default) => {
                self.line("else:");
                self.suite(case_statements(default))
            }
            None => Ok(()),
        }
    }

    fn try_statement(
        &mut self,
        body: &Block,
        catches: &[CatchClause],
        finally: Option<&Block>,
    ) -> Result<()> {
        self.line("try:");
        self.suite(&body.statements)?;
        for catch in catches {
            let exception = python_exception(&catch.exception);
            self.line(&format!("except {exception} as {}:", catch.name));
            self.indented(|this| {
                this.declare(&catch.name, ValueType::from_type_ref(&catch.exception));
                this.statements(&catch.body.statements)
            })?;
        }
        if let Some(finally) = finally {
            self.line("finally:");
            self.suite(&finally.statements)?;
        }
        Ok(())
    }

    fn print(&mut self, kind: PrintKind, args: &[Expr]) -> Result<()> {
        let call = match kind {
            PrintKind::Println => match args.first() {
                Some(arg) => format!("print({})", self.expr(arg)?),
                None => "print()".to_string(),
            },
            PrintKind::Print => match args.first() {
                Some(arg) => format!("print({}, end=\"\")", self.expr(arg)?),
                None => "print(end=\"\")".to_string(),
            },
            PrintKind::Printf => {
                let Some((format, rest)) = args.split_first() else {
                    return Ok(());
                };
                let format = match format {
                    Expr::Literal {
                        value: Literal::String(text),
                        ..
                    } => format!("\"{}\"", python_format(text)),
                    other => self.operand(other, python_precedence(BinaryOp::Rem), false)?,
                };
                let values = rest
                    .iter()
                    .map(|arg| self.expr(arg))
                    .collect::<Result<Vec<_>>>()?;
                let tuple = match values.as_slice() {
                    [single] => format!("({single},)"),
                    _ => format!("({})", values.join(", ")),
                };
                format!("print({format} % {tuple}, end=\"\")")
            }
        };
        self.line(&call);
        Ok(())
    }

    /// Assignments and steps are statements in Python.
    fn expr_statement(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Assign {
                target,
                op,
                value,
                position,
            } => {
                let operator = match op {
                    None => "=".to_string(),
                    Some(BinaryOp::UShr) => return Err(untranslatable("'>>>='", *position)),
                    Some(BinaryOp::Div) if self.integral_division(&self.target_expr(target), value) => {
                        "//=".to_string()
                    }
                    Some(op) => format!("{op}="),
                };
                let value = self.expr(value)?;
                let target = self.name(target);
                self.line(&format!("{target} {operator} {value}"));
            }
            Expr::Step { target, op, .. } => {
                let operator = match op {
                    StepOp::Increment => "+=",
                    StepOp::Decrement => "-=",
                };
                let target = self.name(target);
                self.line(&format!("{target} {operator} 1"));
            }
            other => {
                let text = self.expr(other)?;
                self.line(&text);
            }
        }
        Ok(())
    }

    fn target_expr(&self, target: &str) -> Expr {
        Expr::Ident {
            name: target.to_string(),
            position: Position::default(),
        }
    }

    fn expr_type(&self, expr: &Expr) -> Option<ValueType> {
        let typing = match expr {
            Expr::Literal { value, .. } => return Some(ValueType::of_literal(value)),
            Expr::Ident { name, .. }
            | Expr::Assign { target: name, .. }
            | Expr::Step { target: name, .. } => {
                return self.symbols.lookup(name).map(|symbol| symbol.ty.clone());
            }
            Expr::Binary { op, lhs, rhs } => binary_typing(
                *op,
                self.expr_type(lhs).as_ref(),
                self.expr_type(rhs).as_ref(),
            ),
            Expr::Unary { op, operand } => unary_typing(*op, self.expr_type(operand).as_ref()),
        };
        match typing {
            Typing::Typed(ty) => Some(ty),
            Typing::Unknown | Typing::Invalid => None,
        }
    }

    fn integral_division(&self, lhs: &Expr, rhs: &Expr) -> bool {
        let integral = |expr: &Expr| self.expr_type(expr).is_some_and(|ty: ValueType| ty.is_integral());
        integral(lhs) && integral(rhs)
    }

    /// `not` form of a condition, without doubling parentheses.
    fn negated(&mut self, condition: &Expr) -> Result<String> {
        let inner = self.operand(condition, NOT_PRECEDENCE, false)?;
        Ok(format!("not {inner}"))
    }

    /// Translates `expr` as an operand of an operator with `parent`
    /// precedence, adding parentheses where Python would regroup it.
    fn operand(&mut self, expr: &Expr, parent: u8, right_side: bool) -> Result<String> {
        let text = self.expr(expr)?;
        let own = expr_precedence(expr);
        let comparison = python_precedence(BinaryOp::Eq);
        let needs_parens = own < parent
            || (right_side && own == parent)
            // Python chains `a < b < c`; Java compares the boolean.
            || (own == comparison && parent == comparison);
        Ok(if needs_parens { format!("({text})") } else { text })
    }

    fn expr(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Number(text) => text.clone(),
                Literal::String(text) => format!("\"{text}\""),
                Literal::Char(text) => format!("'{text}'"),
                Literal::Bool(true) => "True".to_string(),
                Literal::Bool(false) => "False".to_string(),
                Literal::Null => "None".to_string(),
            }),
            Expr::Ident { name, .. } => Ok(self.name(name)),
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            Expr::Unary { op, operand } => {
                let (symbol, parent) = match op {
                    UnaryOp::Not => ("not ", NOT_PRECEDENCE),
                    UnaryOp::Neg => ("-", UNARY_PRECEDENCE),
                    UnaryOp::Plus => ("+", UNARY_PRECEDENCE),
                    UnaryOp::BitNot => ("~", UNARY_PRECEDENCE),
                };
                let operand = self.operand(operand, parent, false)?;
                Ok(format!("{symbol}{operand}"))
            }
            Expr::Assign { position, .. } => {
                Err(untranslatable("an assignment inside an expression", *position))
            }
            Expr::Step { op, position, .. } => Err(untranslatable(
                &format!("'{op}' inside an expression"),
                *position,
            )),
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<String> {
        let precedence = python_precedence(op);
        let operator = match op {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Div if self.integral_division(lhs, rhs) => "//",
            BinaryOp::UShr => return Err(untranslatable("'>>>'", lhs.position())),
            other => other.into(),
        };

        let concatenation = op == BinaryOp::Add
            && [lhs, rhs]
                .iter()
                .any(|side| self.expr_type(side) == Some(ValueType::String));
        let side = |this: &mut Self, expr: &Expr, right_side: bool| -> Result<String> {
            if concatenation && this.expr_type(expr) != Some(ValueType::String) {
                Ok(format!("str({})", this.expr(expr)?))
            } else {
                this.operand(expr, precedence, right_side)
            }
        };
        let left = side(self, lhs, false)?;
        let right = side(self, rhs, true)?;
        Ok(format!("{left} {operator} {right}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::DEMO_SOURCE;
    use crate::parser::parse_source;

    fn python(source: &str) -> String {
        to_python(&parse_source(source).unwrap()).unwrap()
    }

    #[test]
    fn demo_source_translates() {
        let expected = r#"class EjemploPatterns:
    @staticmethod
    def main(args):
        nombre = "Juan"
        edad = 30
        salario = 2500.75
        print("Nombre: %s | Edad: %d | Salario: %.2f\n" % (nombre, edad, salario), end="")
        if edad > 18:
            print("Mayor de edad")
        else:
            print("Menor de edad")
        for i in range(0, 3):
            print("Contador: " + str(i))


if __name__ == "__main__":
    EjemploPatterns.main([])
"#;
        assert_eq!(python(DEMO_SOURCE), expected);
    }

    #[test]
    fn declarations_without_initializer_get_defaults() {
        assert_eq!(
            python("int a; double b; boolean c; String d;"),
            "a = 0\nb = 0.0\nc = False\nd = None\n"
        );
    }

    #[test]
    fn operators_map_to_python() {
        assert_eq!(
            python("boolean ok = !(1 < 2) && true || false;"),
            "ok = not 1 < 2 and True or False\n"
        );
        assert_eq!(python("String s = null;"), "s = None\n");
    }

    #[test]
    fn integer_division_floors() {
        assert_eq!(
            python("int a = 7; int b = a / 2; double c = a / 2.0; a /= 2;"),
            "a = 7\nb = a // 2\nc = a / 2.0\na //= 2\n"
        );
    }

    #[test]
    fn precedence_is_preserved_with_parentheses() {
        assert_eq!(python("int x = (1 + 2) * 3;"), "x = (1 + 2) * 3\n");
        assert_eq!(python("int x = 1 - (2 - 3);"), "x = 1 - (2 - 3)\n");
        assert_eq!(python("int x = 1 + 2 * 3;"), "x = 1 + 2 * 3\n");
        // Java `&` binds looser than `==`; Python's binds tighter.
        assert_eq!(
            python("boolean b = true == false & true;"),
            "b = (True == False) & True\n"
        );
    }

    #[test]
    fn concatenation_wraps_non_strings() {
        assert_eq!(
            python("int n = 2; String s = \"n=\" + n + 1;"),
            "n = 2\ns = \"n=\" + str(n) + str(1)\n"
        );
        assert_eq!(
            python("int n = 2; String s = n + 1 + \"!\";"),
            "n = 2\ns = str(n + 1) + \"!\"\n"
        );
    }

    #[test]
    fn steps_become_augmented_assignments() {
        assert_eq!(python("int i = 0; i++; --i; i *= 3;"), "i = 0\ni += 1\ni -= 1\ni *= 3\n");
    }

    #[test]
    fn steps_inside_expressions_are_rejected() {
        let program = parse_source("int i = 0;\nint j = i++;").unwrap();
        let err = to_python(&program).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot translate '++' inside an expression at line 2, column 9"
        );
    }

    #[test]
    fn if_else_if_becomes_elif() {
        let source = "int n = 5;
            if (n > 3) { n = 1; } else if (n > 1) { n = 2; } else { n = 3; }";
        assert_eq!(
            python(source),
            "n = 5\nif n > 3:\n    n = 1\nelif n > 1:\n    n = 2\nelse:\n    n = 3\n"
        );
    }

    #[test]
    fn empty_bodies_get_pass() {
        assert_eq!(python("while (true) { }"), "while True:\n    pass\n");
        assert_eq!(python("class Vacia { }"), "class Vacia:\n    pass\n");
    }

    #[test]
    fn do_while_checks_at_the_end() {
        assert_eq!(
            python("int n = 0; do { n++; } while (n < 3);"),
            "n = 0\nwhile True:\n    n += 1\n    if not n < 3:\n        break\n"
        );
    }

    #[test]
    fn counting_loops_use_range() {
        assert_eq!(
            python("for (int i = 1; i <= 10; i += 2) { }"),
            "for i in range(1, 11, 2):\n    pass\n"
        );
        assert_eq!(
            python("for (int i = 5; i > 0; i--) { }"),
            "for i in range(5, 0, -1):\n    pass\n"
        );
        assert_eq!(
            python("int n = 4; for (int i = 0; i <= n; i++) { }"),
            "n = 4\nfor i in range(0, n + 1):\n    pass\n"
        );
    }

    #[test]
    fn other_loops_fall_back_to_while() {
        assert_eq!(
            python("for (int i = 0; i < 8; i *= 2) { }"),
            "i = 0\nwhile i < 8:\n    i *= 2\n"
        );
        // The body moves the bound, so `range` would freeze it too early.
        assert_eq!(
            python("int n = 3; for (int i = 0; i < n; i++) { n--; }"),
            "n = 3\ni = 0\nwhile i < n:\n    n -= 1\n    i += 1\n"
        );
    }

    #[test]
    fn switch_becomes_if_chain() {
        let source = "int d = 2;
            switch (d) {
                case 1: d = 10; break;
                case 2:
                case 3: d = 20; break;
                default: d = 0;
            }";
        assert_eq!(
            python(source),
            "d = 2\nif d == 1:\n    d = 10\nelif d == 2 or d == 3:\n    d = 20\nelse:\n    d = 0\n"
        );
    }

    #[test]
    fn try_catch_finally() {
        let source = "try { int x = 1 / 0; } catch (ArithmeticException e) { } finally { }";
        assert_eq!(
            python(source),
            "try:\n    x = 1 // 0\nexcept ZeroDivisionError as e:\n    pass\nfinally:\n    pass\n"
        );
    }

    #[test]
    fn print_variants() {
        assert_eq!(
            python("System.out.print(\"a\"); System.out.println(); System.out.printf(\"%d%%%n\", 5);"),
            "print(\"a\", end=\"\")\nprint()\nprint(\"%d%%\\n\" % (5,), end=\"\")\n"
        );
    }

    #[test]
    fn fields_are_reached_through_self_or_class() {
        let source = "class Contador {
            int total = 0;
            static int creados;
            void sumar(int n) { total += n; }
            static void crear() { creados++; }
        }";
        let expected = "class Contador:
    total = 0
    creados = 0

    def sumar(self, n):
        self.total += n

    @staticmethod
    def crear():
        Contador.creados += 1
";
        assert_eq!(python(source), expected);
    }

    #[test]
    fn locals_shadow_fields() {
        let source = "class A { int x; void f() { int x = 1; x = 2; } }";
        assert_eq!(
            python(source),
            "class A:\n    x = 0\n\n    def f(self):\n        x = 1\n        x = 2\n"
        );
    }

    #[test]
    fn constructors_become_init() {
        let source = "class P { int edad; P(int e) { edad = e; } int leer() { return edad; } }";
        assert_eq!(
            python(source),
            "class P:\n    edad = 0\n\n    def __init__(self, e):\n        self.edad = e\n\n    def leer(self):\n        return self.edad\n"
        );
    }

    #[test]
    fn format_conversion_handles_newline_and_percent() {
        assert_eq!(python_format("%s%n"), "%s\\n");
        assert_eq!(python_format("100%%"), "100%%");
        assert_eq!(python_format("end%"), "end%");
    }
}
