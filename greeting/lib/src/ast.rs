//! Syntax tree for the Java subset accepted by [`crate::parser`].
//!
//! Every node that names something carries the 1-based [`Position`] of the
//! token it came from so later passes can report where a problem is.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A parsed source file: classes and loose statements in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Class(class) => Some(class),
            Item::Statement(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum Item {
    Class(ClassDecl),
    Statement(Stmt),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Static,
    Final,
    Abstract,
}

impl Modifier {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "public" => Some(Modifier::Public),
            "private" => Some(Modifier::Private),
            "protected" => Some(Modifier::Protected),
            "static" => Some(Modifier::Static),
            "final" => Some(Modifier::Final),
            "abstract" => Some(Modifier::Abstract),
            _ => None,
        }
    }
}

/// A written type such as `int`, `String[]` or `Exception`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    pub array_dims: usize,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array_dims: 0,
        }
    }

    pub fn is_void(&self) -> bool {
        self.name == "void" && self.array_dims == 0
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub members: Vec<Member>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum Member {
    Field(VarDecl),
    Method(MethodDecl),
    Class(ClassDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub modifiers: Vec<Modifier>,
    /// `None` for constructors.
    pub return_type: Option<TypeRef>,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub position: Position,
}

impl MethodDecl {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }

    /// `public static void main(String[] args)` or close enough to run.
    pub fn is_entry_point(&self) -> bool {
        self.name == "main"
            && self.is_static()
            && self.return_type.as_ref().is_some_and(TypeRef::is_void)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub ty: TypeRef,
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub name: String,
    pub init: Option<Expr>,
    pub position: Position,
}

impl VarDecl {
    pub fn is_final(&self) -> bool {
        self.modifiers.contains(&Modifier::Final)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub value: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub exception: TypeRef,
    pub name: String,
    pub body: Block,
    pub position: Position,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PrintKind {
    Print,
    Println,
    Printf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    VarDecl(VarDecl),
    Expr(Expr),
    Block(Block),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        scrutinee: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
    },
    Try {
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    },
    Print {
        kind: PrintKind,
        args: Vec<Expr>,
        position: Position,
    },
    Return {
        value: Option<Expr>,
        position: Position,
    },
    Break,
    Continue,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "literal", content = "value", rename_all = "snake_case")]
pub enum Literal {
    /// Lexeme as written; integral when it has no `.` or exponent.
    Number(String),
    /// Contents without the surrounding quotes, escapes untouched.
    String(String),
    Char(String),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn is_integral_number(&self) -> bool {
        matches!(self, Literal::Number(n) if !n.contains(['.', 'e', 'E']))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "^")]
    BitXor,
    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "<<")]
    Shl,
    #[strum(serialize = ">>")]
    Shr,
    #[strum(serialize = ">>>")]
    UShr,
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Rem,
}

impl BinaryOp {
    /// Java binding strength; larger binds tighter.
    pub fn precedence(self) -> u8 {
        use BinaryOp::*;
        match self {
            Or => 1,
            And => 2,
            BitOr => 3,
            BitXor => 4,
            BitAnd => 5,
            Eq | Ne => 6,
            Lt | Le | Gt | Ge => 7,
            Shl | Shr | UShr => 8,
            Add | Sub => 9,
            Mul | Div | Rem => 10,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 6 || self.precedence() == 7
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::And)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        use BinaryOp::*;
        Some(match lexeme {
            "||" => Or,
            "&&" => And,
            "|" => BitOr,
            "^" => BitXor,
            "&" => BitAnd,
            "==" => Eq,
            "!=" => Ne,
            "<" => Lt,
            "<=" => Le,
            ">" => Gt,
            ">=" => Ge,
            "<<" => Shl,
            ">>" => Shr,
            ">>>" => UShr,
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Rem,
            _ => return None,
        })
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "~")]
    BitNot,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum StepOp {
    #[strum(serialize = "++")]
    Increment,
    #[strum(serialize = "--")]
    Decrement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Literal,
        position: Position,
    },
    Ident {
        name: String,
        position: Position,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `x = v`, or `x += v` with `op` set to the arithmetic part.
    Assign {
        target: String,
        op: Option<BinaryOp>,
        value: Box<Expr>,
        position: Position,
    },
    Step {
        target: String,
        op: StepOp,
        prefix: bool,
        position: Position,
    },
}

impl Expr {
    pub fn position(&self) -> Position {
        match self {
            Expr::Literal { position, .. }
            | Expr::Ident { position, .. }
            | Expr::Assign { position, .. }
            | Expr::Step { position, .. } => *position,
            Expr::Binary { lhs, .. } => lhs.position(),
            Expr::Unary { operand, .. } => operand.position(),
        }
    }
}
