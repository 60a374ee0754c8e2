//! Semantic checks over a parsed [`Program`].
//!
//! A scoped [`SymbolTable`] tracks every variable, its type and whether it
//! has been assigned. The checker walks statements in source order and
//! collects [`Diagnostic`]s instead of stopping at the first problem:
//!
//! - redeclaration in the same scope
//! - use of an undeclared name, or of a local before it is assigned
//! - assignment to an already-initialized `final`
//! - incompatible types in declarations, assignments, operators and returns
//! - non-boolean conditions in `if`, `while`, `do`-`while` and `for`
//! - non-`void` methods without any `return`
//!
//! Initialization is tracked in source order, not per control-flow path: an
//! assignment inside one branch of an `if` counts from then on.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use tracing::debug;

use crate::ast::{
    BinaryOp, ClassDecl, Expr, Item, Literal, Member, MethodDecl, Position, Program, Stmt,
    TypeRef, UnaryOp, VarDecl,
};

/// Static type of a value as far as the checker can tell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    String,
    Null,
    Void,
    /// Class and array types, compared by written name only.
    Reference(String),
}

impl ValueType {
    pub fn from_type_ref(ty: &TypeRef) -> Self {
        if ty.array_dims > 0 {
            return ValueType::Reference(ty.to_string());
        }
        match ty.name.as_str() {
            "byte" => ValueType::Byte,
            "short" => ValueType::Short,
            "char" => ValueType::Char,
            "int" => ValueType::Int,
            "long" => ValueType::Long,
            "float" => ValueType::Float,
            "double" => ValueType::Double,
            "boolean" => ValueType::Boolean,
            "String" | "string" => ValueType::String,
            "void" => ValueType::Void,
            other => ValueType::Reference(other.to_string()),
        }
    }

    pub fn of_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Number(_) if literal.is_integral_number() => ValueType::Int,
            Literal::Number(_) => ValueType::Double,
            Literal::String(_) => ValueType::String,
            Literal::Char(_) => ValueType::Char,
            Literal::Bool(_) => ValueType::Boolean,
            Literal::Null => ValueType::Null,
        }
    }

    /// Widening order; `None` for non-numeric types.
    fn numeric_rank(&self) -> Option<u8> {
        Some(match self {
            ValueType::Byte => 1,
            ValueType::Short | ValueType::Char => 2,
            ValueType::Int => 3,
            ValueType::Long => 4,
            ValueType::Float => 5,
            ValueType::Double => 6,
            _ => return None,
        })
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_integral(&self) -> bool {
        self.numeric_rank().is_some_and(|rank| rank <= 4)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, ValueType::String | ValueType::Reference(_))
    }

    /// Binary numeric promotion: at least `int`, otherwise the wider side.
    fn promote(lhs: &ValueType, rhs: &ValueType) -> ValueType {
        [lhs, rhs, &ValueType::Int]
            .into_iter()
            .max_by_key(|ty| ty.numeric_rank().unwrap_or(0))
            .cloned()
            .unwrap_or(ValueType::Int)
    }

    /// Whether a value of type `source` may be stored in `self`.
    pub fn accepts(&self, source: &ValueType) -> bool {
        if self == source {
            return true;
        }
        match (self, source) {
            (_, ValueType::Null) => self.is_reference(),
            (ValueType::Reference(_), ValueType::Reference(_)) => true,
            // char widens to int and up, but byte/short never become char
            (ValueType::Char, _) | (ValueType::Short, ValueType::Char) => false,
            (target, source) => match (target.numeric_rank(), source.numeric_rank()) {
                (Some(target), Some(source)) => source <= target,
                _ => false,
            },
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Byte => "byte",
            ValueType::Short => "short",
            ValueType::Char => "char",
            ValueType::Int => "int",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::Boolean => "boolean",
            ValueType::String => "String",
            ValueType::Null => "null",
            ValueType::Void => "void",
            ValueType::Reference(name) => name,
        };
        f.write_str(name)
    }
}

/// Outcome of typing an operator application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Typing {
    Typed(ValueType),
    /// An operand's type is unknown, so nothing can be said.
    Unknown,
    Invalid,
}

pub(crate) fn binary_typing(op: BinaryOp, lhs: Option<&ValueType>, rhs: Option<&ValueType>) -> Typing {
    use BinaryOp::*;

    if op == Add && (lhs == Some(&ValueType::String) || rhs == Some(&ValueType::String)) {
        return Typing::Typed(ValueType::String);
    }
    if matches!(op, Eq | Ne) {
        return Typing::Typed(ValueType::Boolean);
    }
    let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
        return if op.is_comparison() || op.is_logical() {
            Typing::Typed(ValueType::Boolean)
        } else {
            Typing::Unknown
        };
    };

    match op {
        Or | And if *lhs == ValueType::Boolean && *rhs == ValueType::Boolean => {
            Typing::Typed(ValueType::Boolean)
        }
        Lt | Le | Gt | Ge if lhs.is_numeric() && rhs.is_numeric() => {
            Typing::Typed(ValueType::Boolean)
        }
        Add | Sub | Mul | Div | Rem if lhs.is_numeric() && rhs.is_numeric() => {
            Typing::Typed(ValueType::promote(lhs, rhs))
        }
        BitAnd | BitOr | BitXor if *lhs == ValueType::Boolean && *rhs == ValueType::Boolean => {
            Typing::Typed(ValueType::Boolean)
        }
        BitAnd | BitOr | BitXor if lhs.is_integral() && rhs.is_integral() => {
            Typing::Typed(ValueType::promote(lhs, rhs))
        }
        Shl | Shr | UShr if lhs.is_integral() && rhs.is_integral() => {
            Typing::Typed(ValueType::promote(lhs, &ValueType::Int))
        }
        _ => Typing::Invalid,
    }
}

pub(crate) fn unary_typing(op: UnaryOp, operand: Option<&ValueType>) -> Typing {
    let Some(operand) = operand else {
        return match op {
            UnaryOp::Not => Typing::Typed(ValueType::Boolean),
            _ => Typing::Unknown,
        };
    };
    match op {
        UnaryOp::Not if *operand == ValueType::Boolean => Typing::Typed(ValueType::Boolean),
        UnaryOp::Neg | UnaryOp::Plus if operand.is_numeric() => {
            Typing::Typed(ValueType::promote(operand, &ValueType::Int))
        }
        UnaryOp::BitNot if operand.is_integral() => {
            Typing::Typed(ValueType::promote(operand, &ValueType::Int))
        }
        _ => Typing::Invalid,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub ty: ValueType,
    pub position: Position,
    pub initialized: bool,
    pub constant: bool,
}

/// Stack of scopes; the outermost (global) scope is never popped.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Adds `name` to the innermost scope.
    ///
    /// ## Errors
    ///
    /// Returns the position of the earlier declaration when `name` already
    /// exists in the innermost scope; the table is left unchanged.
    pub fn declare(&mut self, name: &str, symbol: Symbol) -> Result<(), Position> {
        let scope = self
            .scopes
            .last_mut()
            .expect("symbol table always has a global scope");
        if let Some(existing) = scope.get(name) {
            return Err(existing.position);
        }
        scope.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Innermost visible symbol named `name`.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.resolve(name).map(|(_, symbol)| symbol)
    }

    /// Like [`SymbolTable::lookup`], also returning the index of the scope
    /// that holds the symbol (0 is the global scope).
    pub fn resolve(&self, name: &str) -> Option<(usize, &Symbol)> {
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, scope)| scope.get(name).map(|symbol| (depth, symbol)))
    }

    pub fn mark_initialized(&mut self, name: &str) -> bool {
        match self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(name)) {
            Some(symbol) => {
                symbol.initialized = true;
                true
            }
            None => false,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    Redeclared,
    Undeclared,
    Uninitialized,
    AssignToFinal,
    TypeMismatch,
    NonBooleanCondition,
    MissingReturn,
    ReturnMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub position: Position,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: error[{}]: {}", self.position, self.kind, self.message)
    }
}

/// Runs every check over `program`; an empty result means it is clean.
pub fn check(program: &Program) -> Vec<Diagnostic> {
    let mut checker = Checker::default();
    for item in &program.items {
        match item {
            Item::Class(class) => checker.class(class),
            Item::Statement(stmt) => checker.statement(stmt),
        }
    }
    debug!(diagnostics = checker.diagnostics.len(), "semantic check finished");
    checker.diagnostics
}

#[derive(Default)]
struct Checker {
    symbols: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    /// Declared return type of the method being checked.
    return_type: Option<ValueType>,
}

impl Checker {
    fn report(&mut self, kind: DiagnosticKind, position: Position, message: String) {
        self.diagnostics.push(Diagnostic {
            kind,
            message,
            position,
        });
    }

    fn declare(&mut self, name: &str, symbol: Symbol) {
        let position = symbol.position;
        if let Err(previous) = self.symbols.declare(name, symbol) {
            self.report(
                DiagnosticKind::Redeclared,
                position,
                format!("variable '{name}' is already declared in this scope (at {previous})"),
            );
        }
    }

    fn class(&mut self, class: &ClassDecl) {
        self.symbols.enter_scope();
        for member in &class.members {
            if let Member::Field(field) = member {
                // Fields get default values, so they always count as assigned.
                self.var_decl(field, true);
            }
        }
        for member in &class.members {
            match member {
                Member::Method(method) => self.method(method),
                Member::Class(nested) => self.class(nested),
                Member::Field(_) => {}
            }
        }
        self.symbols.exit_scope();
    }

    fn method(&mut self, method: &MethodDecl) {
        let return_type = method
            .return_type
            .as_ref()
            .map_or(ValueType::Void, ValueType::from_type_ref);
        let outer = self.return_type.replace(return_type.clone());

        self.symbols.enter_scope();
        for param in &method.params {
            self.declare(
                &param.name,
                Symbol {
                    ty: ValueType::from_type_ref(&param.ty),
                    position: param.position,
                    initialized: true,
                    constant: false,
                },
            );
        }
        // Parameters and top-level locals share one scope, as in Java.
        for stmt in &method.body.statements {
            self.statement(stmt);
        }
        self.symbols.exit_scope();

        if return_type != ValueType::Void && !contains_return(&method.body.statements) {
            self.report(
                DiagnosticKind::MissingReturn,
                method.position,
                format!(
                    "method '{}' must return a value of type '{return_type}'",
                    method.name
                ),
            );
        }
        self.return_type = outer;
    }

    fn var_decl(&mut self, decl: &VarDecl, always_initialized: bool) {
        let ty = ValueType::from_type_ref(&decl.ty);
        if let Some(init) = &decl.init {
            let source = self.expr(init);
            self.check_assignable(&ty, source.as_ref(), init, decl.position);
        }
        self.declare(
            &decl.name,
            Symbol {
                ty,
                position: decl.position,
                initialized: always_initialized || decl.init.is_some(),
                constant: decl.is_final(),
            },
        );
    }

    fn check_assignable(
        &mut self,
        target: &ValueType,
        source: Option<&ValueType>,
        value: &Expr,
        position: Position,
    ) {
        let Some(source) = source else {
            return;
        };
        // An int constant narrows implicitly into byte, short and char.
        let narrowing_constant = matches!(target, ValueType::Byte | ValueType::Short | ValueType::Char)
            && matches!(value, Expr::Literal { value, .. } if value.is_integral_number());
        if !target.accepts(source) && !narrowing_constant {
            self.report(
                DiagnosticKind::TypeMismatch,
                position,
                format!("cannot assign a value of type '{source}' to a variable of type '{target}'"),
            );
        }
    }

    fn condition(&mut self, condition: &Expr, construct: &str) {
        if let Some(ty) = self.expr(condition)
            && ty != ValueType::Boolean
        {
            self.report(
                DiagnosticKind::NonBooleanCondition,
                condition.position(),
                format!("condition of '{construct}' must be boolean, found '{ty}'"),
            );
        }
    }

    fn scoped(&mut self, stmts: &[Stmt]) {
        self.symbols.enter_scope();
        for stmt in stmts {
            self.statement(stmt);
        }
        self.symbols.exit_scope();
    }

    fn statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(decl) => self.var_decl(decl, false),
            Stmt::Expr(expr) => {
                self.expr(expr);
            }
            Stmt::Block(block) => self.scoped(&block.statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.condition(condition, "if");
                self.statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.statement(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.condition(condition, "while");
                self.statement(body);
            }
            Stmt::DoWhile { body, condition } => {
                self.statement(body);
                self.condition(condition, "do-while");
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                self.symbols.enter_scope();
                if let Some(init) = init {
                    self.statement(init);
                }
                if let Some(condition) = condition {
                    self.condition(condition, "for");
                }
                for expr in update {
                    self.expr(expr);
                }
                self.statement(body);
                self.symbols.exit_scope();
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
            } => {
                self.expr(scrutinee);
                // The whole switch body is one scope.
                self.symbols.enter_scope();
                for case in cases {
                    self.expr(&case.value);
                    for stmt in &case.body {
                        self.statement(stmt);
                    }
                }
                for stmt in default.iter().flatten() {
                    self.statement(stmt);
                }
                self.symbols.exit_scope();
            }
            Stmt::Try {
                body,
                catches,
                finally,
            } => {
                self.scoped(&body.statements);
                for catch in catches {
                    self.symbols.enter_scope();
                    self.declare(
                        &catch.name,
                        Symbol {
                            ty: ValueType::from_type_ref(&catch.exception),
                            position: catch.position,
                            initialized: true,
                            constant: false,
                        },
                    );
                    for stmt in &catch.body.statements {
                        self.statement(stmt);
                    }
                    self.symbols.exit_scope();
                }
                if let Some(finally) = finally {
                    self.scoped(&finally.statements);
                }
            }
            Stmt::Print { args, .. } => {
                for arg in args {
                    self.expr(arg);
                }
            }
            Stmt::Return { value, position } => self.return_statement(value.as_ref(), *position),
            Stmt::Break | Stmt::Continue | Stmt::Empty => {}
        }
    }

    fn return_statement(&mut self, value: Option<&Expr>, position: Position) {
        let Some(expected) = self.return_type.clone() else {
            if let Some(value) = value {
                self.expr(value);
            }
            return;
        };
        match value {
            Some(value) => {
                let actual = self.expr(value);
                if expected == ValueType::Void {
                    self.report(
                        DiagnosticKind::ReturnMismatch,
                        position,
                        "cannot return a value from a void method".to_string(),
                    );
                } else if let Some(actual) = actual
                    && !expected.accepts(&actual)
                {
                    self.report(
                        DiagnosticKind::ReturnMismatch,
                        position,
                        format!("cannot return '{actual}' from a method returning '{expected}'"),
                    );
                }
            }
            None if expected != ValueType::Void => self.report(
                DiagnosticKind::ReturnMismatch,
                position,
                format!("missing return value of type '{expected}'"),
            ),
            None => {}
        }
    }

    /// Resolves a name for reading, reporting undeclared or unassigned use.
    fn read_variable(&mut self, name: &str, position: Position) -> Option<ValueType> {
        let Some(symbol) = self.symbols.lookup(name) else {
            self.report(
                DiagnosticKind::Undeclared,
                position,
                format!("variable '{name}' is not declared"),
            );
            return None;
        };
        let (ty, initialized) = (symbol.ty.clone(), symbol.initialized);
        if !initialized {
            self.report(
                DiagnosticKind::Uninitialized,
                position,
                format!("variable '{name}' is used before being initialized"),
            );
        }
        Some(ty)
    }

    /// Resolves a name for writing; `None` when undeclared.
    fn write_variable(&mut self, name: &str, position: Position) -> Option<Symbol> {
        let Some(symbol) = self.symbols.lookup(name).cloned() else {
            self.report(
                DiagnosticKind::Undeclared,
                position,
                format!("variable '{name}' is not declared"),
            );
            return None;
        };
        if symbol.constant && symbol.initialized {
            self.report(
                DiagnosticKind::AssignToFinal,
                position,
                format!("cannot assign to final variable '{name}'"),
            );
        }
        Some(symbol)
    }

    fn expr(&mut self, expr: &Expr) -> Option<ValueType> {
        match expr {
            Expr::Literal { value, .. } => Some(ValueType::of_literal(value)),
            Expr::Ident { name, position } => self.read_variable(name, *position),
            Expr::Binary { op, lhs, rhs } => {
                let left = self.expr(lhs);
                let right = self.expr(rhs);
                match binary_typing(*op, left.as_ref(), right.as_ref()) {
                    Typing::Typed(ty) => Some(ty),
                    Typing::Unknown => None,
                    Typing::Invalid => {
                        let (left, right) = (left.unwrap_or(ValueType::Void), right.unwrap_or(ValueType::Void));
                        self.report(
                            DiagnosticKind::TypeMismatch,
                            expr.position(),
                            format!("operator '{op}' cannot be applied to '{left}' and '{right}'"),
                        );
                        None
                    }
                }
            }
            Expr::Unary { op, operand } => {
                let inner = self.expr(operand);
                match unary_typing(*op, inner.as_ref()) {
                    Typing::Typed(ty) => Some(ty),
                    Typing::Unknown => None,
                    Typing::Invalid => {
                        let inner = inner.unwrap_or(ValueType::Void);
                        self.report(
                            DiagnosticKind::TypeMismatch,
                            expr.position(),
                            format!("operator '{op}' cannot be applied to '{inner}'"),
                        );
                        None
                    }
                }
            }
            Expr::Assign {
                target,
                op,
                value,
                position,
            } => {
                let symbol = self.write_variable(target, *position);
                if op.is_some() && symbol.as_ref().is_some_and(|s| !s.initialized) {
                    self.report(
                        DiagnosticKind::Uninitialized,
                        *position,
                        format!("variable '{target}' is used before being initialized"),
                    );
                }
                let source = self.expr(value);
                let symbol = symbol?;
                match op {
                    None => self.check_assignable(&symbol.ty, source.as_ref(), value, *position),
                    Some(op) => {
                        if binary_typing(*op, Some(&symbol.ty), source.as_ref()) == Typing::Invalid {
                            let source = source.unwrap_or(ValueType::Void);
                            self.report(
                                DiagnosticKind::TypeMismatch,
                                *position,
                                format!(
                                    "operator '{op}=' cannot be applied to '{}' and '{source}'",
                                    symbol.ty
                                ),
                            );
                        }
                    }
                }
                self.symbols.mark_initialized(target);
                Some(symbol.ty)
            }
            Expr::Step {
                target,
                op,
                position,
                ..
            } => {
                let ty = self.read_variable(target, *position)?;
                self.write_variable(target, *position);
                if !ty.is_numeric() {
                    self.report(
                        DiagnosticKind::TypeMismatch,
                        *position,
                        format!("operator '{op}' cannot be applied to '{ty}'"),
                    );
                }
                Some(ty)
            }
        }
    }
}

fn contains_return(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Return { .. } => true,
        Stmt::Block(block) => contains_return(&block.statements),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            contains_return(std::slice::from_ref(then_branch))
                || else_branch
                    .as_deref()
                    .is_some_and(|s| contains_return(std::slice::from_ref(s)))
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } | Stmt::For { body, .. } => {
            contains_return(std::slice::from_ref(body))
        }
        Stmt::Switch { cases, default, .. } => {
            cases.iter().any(|case| contains_return(&case.body))
                || default.as_deref().is_some_and(contains_return)
        }
        Stmt::Try {
            body,
            catches,
            finally,
        } => {
            contains_return(&body.statements)
                || catches.iter().any(|c| contains_return(&c.body.statements))
                || finally.as_ref().is_some_and(|f| contains_return(&f.statements))
        }
        _ => false,
    })
}
