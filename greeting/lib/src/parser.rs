//! Recursive-descent parser from the token table to a [`Program`].
//!
//! The accepted language is a Java subset: classes with fields, methods and
//! constructors; local declarations; `if`/`else`, `while`, `do`-`while`,
//! `for`, `switch`, `try`/`catch`/`finally`, `return`, `break`, `continue`;
//! `System.out` print calls; and expressions over literals and plain names
//! with Java operator precedence. Loose statements outside a class are
//! accepted too, so a snippet parses without a surrounding class.
//!
//! ```
//! use greeting::{parse_source, ast::{Item, Stmt}};
//!
//! let program = parse_source("int edad = 30;").unwrap();
//! assert!(matches!(&program.items[0], Item::Statement(Stmt::VarDecl(d)) if d.name == "edad"));
//! ```

use tracing::debug;

use crate::ast::{
    BinaryOp, Block, CatchClause, ClassDecl, Expr, Item, Literal, Member, MethodDecl, Modifier,
    Param, Position, PrintKind, Program, StepOp, Stmt, SwitchCase, TypeRef, UnaryOp, VarDecl,
};
use crate::error::{GreetingError, Result};
use crate::lexer::{Token, TokenKind, tokenize};

/// Parses a token table produced by [`tokenize`].
///
/// ## Errors
///
/// - [`GreetingError::InvalidCharacter`] when the parser reaches a
///   [`TokenKind::Error`] token
/// - [`GreetingError::UnexpectedToken`] / [`GreetingError::UnexpectedEnd`]
///   for anything the grammar does not allow
pub fn parse(tokens: &[Token]) -> Result<Program> {
    let mut parser = Parser::new(tokens);
    let program = parser.program()?;
    debug!(items = program.items.len(), "parsed program");
    Ok(program)
}

/// Tokenizes and parses `source` in one step.
pub fn parse_source(source: &str) -> Result<Program> {
    parse(&tokenize(source))
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

fn position_of(token: &Token) -> Position {
    Position::new(token.line, token.column)
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Keywords, operators and delimiters are matched by lexeme alone: quoted
    /// literals always carry their quotes, so they never collide.
    fn check(&self, lexeme: &str) -> bool {
        self.peek().is_some_and(|t| t.lexeme == lexeme)
    }

    fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn eat(&mut self, lexeme: &str) -> bool {
        if self.check(lexeme) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, lexeme: &str) -> Result<&'a Token> {
        match self.peek() {
            Some(token) if token.lexeme == lexeme => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(&format!("'{lexeme}'"))),
        }
    }

    fn expect_identifier(&mut self) -> Result<&'a Token> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> GreetingError {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Error => GreetingError::InvalidCharacter {
                ch: token.lexeme.chars().next().unwrap_or_default(),
                line: token.line,
                column: token.column,
            },
            Some(token) => GreetingError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.lexeme.clone(),
                line: token.line,
                column: token.column,
            },
            None => GreetingError::UnexpectedEnd {
                expected: expected.to_string(),
            },
        }
    }

    fn program(&mut self) -> Result<Program> {
        let mut items = Vec::new();
        while self.peek().is_some() {
            let start = self.pos;
            let modifiers = self.modifiers();
            if self.check("class") {
                items.push(Item::Class(self.class_decl(modifiers)?));
            } else {
                // Re-read the modifiers as part of a local declaration.
                self.pos = start;
                items.push(Item::Statement(self.statement()?));
            }
        }
        Ok(Program { items })
    }

    fn modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        while let Some(modifier) = self.peek().and_then(|t| Modifier::from_keyword(&t.lexeme)) {
            self.pos += 1;
            modifiers.push(modifier);
        }
        modifiers
    }

    fn class_decl(&mut self, modifiers: Vec<Modifier>) -> Result<ClassDecl> {
        let keyword = self.expect("class")?;
        let name = self.expect_identifier()?.lexeme.clone();
        self.expect("{")?;

        let mut members = Vec::new();
        while !self.check("}") {
            if self.peek().is_none() {
                return Err(self.unexpected("'}' closing the class"));
            }
            if self.eat(";") {
                continue;
            }
            members.push(self.member(&name)?);
        }
        self.expect("}")?;

        Ok(ClassDecl {
            modifiers,
            name,
            members,
            position: position_of(keyword),
        })
    }

    fn member(&mut self, class_name: &str) -> Result<Member> {
        let modifiers = self.modifiers();
        if self.check("class") {
            return Ok(Member::Class(self.class_decl(modifiers)?));
        }

        let is_constructor = self.peek().is_some_and(|t| t.lexeme == class_name)
            && self.peek_at(1).is_some_and(|t| t.lexeme == "(");
        if is_constructor {
            let name = self.expect_identifier()?;
            return Ok(Member::Method(self.method_rest(modifiers, None, name)?));
        }

        let ty = self.type_ref()?;
        let name = self.expect_identifier()?;
        if self.check("(") {
            Ok(Member::Method(self.method_rest(modifiers, Some(ty), name)?))
        } else {
            let decl = self.var_decl_rest(modifiers, ty, name)?;
            self.expect(";")?;
            Ok(Member::Field(decl))
        }
    }

    fn method_rest(
        &mut self,
        modifiers: Vec<Modifier>,
        return_type: Option<TypeRef>,
        name: &Token,
    ) -> Result<MethodDecl> {
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.check(")") {
            loop {
                let ty = self.type_ref()?;
                let param = self.expect_identifier()?;
                params.push(Param {
                    ty,
                    name: param.lexeme.clone(),
                    position: position_of(param),
                });
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        let body = self.block()?;

        Ok(MethodDecl {
            modifiers,
            return_type,
            name: name.lexeme.clone(),
            params,
            body,
            position: position_of(name),
        })
    }

    fn type_ref(&mut self) -> Result<TypeRef> {
        let name = match self.peek() {
            Some(t)
                if matches!(t.kind, TokenKind::DataType | TokenKind::Identifier)
                    || t.lexeme == "void" =>
            {
                self.pos += 1;
                t.lexeme.clone()
            }
            _ => return Err(self.unexpected("a type")),
        };
        let mut array_dims = 0;
        while self.eat("[") {
            self.expect("]")?;
            array_dims += 1;
        }
        Ok(TypeRef { name, array_dims })
    }

    /// Whether the upcoming tokens start `Type name`.
    fn starts_declaration(&self) -> bool {
        let Some(first) = self.peek() else {
            return false;
        };
        if first.kind == TokenKind::DataType {
            return true;
        }
        if first.kind != TokenKind::Identifier {
            return false;
        }
        let mut offset = 1;
        while self.peek_at(offset).is_some_and(|t| t.lexeme == "[")
            && self.peek_at(offset + 1).is_some_and(|t| t.lexeme == "]")
        {
            offset += 2;
        }
        self.peek_at(offset)
            .is_some_and(|t| t.kind == TokenKind::Identifier)
    }

    fn var_decl_rest(
        &mut self,
        modifiers: Vec<Modifier>,
        ty: TypeRef,
        name: &Token,
    ) -> Result<VarDecl> {
        let init = if self.eat("=") {
            Some(self.expression()?)
        } else {
            None
        };
        Ok(VarDecl {
            modifiers,
            ty,
            name: name.lexeme.clone(),
            init,
            position: position_of(name),
        })
    }

    fn local_var_decl(&mut self, modifiers: Vec<Modifier>) -> Result<VarDecl> {
        let ty = self.type_ref()?;
        let name = self.expect_identifier()?;
        self.var_decl_rest(modifiers, ty, name)
    }

    fn block(&mut self) -> Result<Block> {
        self.expect("{")?;
        let mut statements = Vec::new();
        while !self.check("}") {
            if self.peek().is_none() {
                return Err(self.unexpected("'}' closing the block"));
            }
            statements.push(self.statement()?);
        }
        self.expect("}")?;
        Ok(Block { statements })
    }

    fn parenthesized(&mut self) -> Result<Expr> {
        self.expect("(")?;
        let expr = self.expression()?;
        self.expect(")")?;
        Ok(expr)
    }

    fn statement(&mut self) -> Result<Stmt> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("a statement"));
        };

        match token.lexeme.as_str() {
            "{" => return Ok(Stmt::Block(self.block()?)),
            ";" => {
                self.pos += 1;
                return Ok(Stmt::Empty);
            }
            "if" => return self.if_statement(),
            "while" => {
                self.pos += 1;
                let condition = self.parenthesized()?;
                let body = Box::new(self.statement()?);
                return Ok(Stmt::While { condition, body });
            }
            "do" => {
                self.pos += 1;
                let body = Box::new(self.statement()?);
                self.expect("while")?;
                let condition = self.parenthesized()?;
                self.expect(";")?;
                return Ok(Stmt::DoWhile { body, condition });
            }
            "for" => return self.for_statement(),
            "switch" => return self.switch_statement(),
            "try" => return self.try_statement(),
            "return" => {
                self.pos += 1;
                let value = if self.check(";") {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(";")?;
                return Ok(Stmt::Return {
                    value,
                    position: position_of(token),
                });
            }
            "break" | "continue" => {
                self.pos += 1;
                self.expect(";")?;
                return Ok(if token.lexeme == "break" {
                    Stmt::Break
                } else {
                    Stmt::Continue
                });
            }
            _ => {}
        }

        if token.kind == TokenKind::PrintCall {
            return self.print_statement();
        }

        let modifiers = self.modifiers();
        if !modifiers.is_empty() || self.starts_declaration() {
            let decl = self.local_var_decl(modifiers)?;
            self.expect(";")?;
            return Ok(Stmt::VarDecl(decl));
        }

        let expr = self.expression()?;
        self.expect(";")?;
        Ok(Stmt::Expr(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.expect("if")?;
        let condition = self.parenthesized()?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.eat("else") {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.expect("for")?;
        self.expect("(")?;

        let init = if self.check(";") {
            None
        } else if self.starts_declaration() || self.check("final") {
            let modifiers = self.modifiers();
            Some(Box::new(Stmt::VarDecl(self.local_var_decl(modifiers)?)))
        } else {
            Some(Box::new(Stmt::Expr(self.expression()?)))
        };
        self.expect(";")?;

        let condition = if self.check(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(";")?;

        let mut update = Vec::new();
        if !self.check(")") {
            loop {
                update.push(self.expression()?);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn switch_statement(&mut self) -> Result<Stmt> {
        self.expect("switch")?;
        let scrutinee = self.parenthesized()?;
        self.expect("{")?;

        let mut cases = Vec::new();
        let mut default = None;
        loop {
            if self.eat("case") {
                let value = self.expression()?;
                self.expect(":")?;
                cases.push(SwitchCase {
                    value,
                    body: self.case_body()?,
                });
            } else if self.eat("default") {
                self.expect(":")?;
                default = Some(self.case_body()?);
            } else if self.check("}") {
                break;
            } else {
                return Err(self.unexpected("'case', 'default' or '}'"));
            }
        }
        self.expect("}")?;

        Ok(Stmt::Switch {
            scrutinee,
            cases,
            default,
        })
    }

    fn case_body(&mut self) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        while !(self.check("case") || self.check("default") || self.check("}")) {
            if self.peek().is_none() {
                return Err(self.unexpected("'}' closing the switch"));
            }
            body.push(self.statement()?);
        }
        Ok(body)
    }

    fn try_statement(&mut self) -> Result<Stmt> {
        self.expect("try")?;
        let body = self.block()?;

        let mut catches = Vec::new();
        while self.eat("catch") {
            self.expect("(")?;
            let exception = self.type_ref()?;
            let name = self.expect_identifier()?;
            self.expect(")")?;
            catches.push(CatchClause {
                exception,
                name: name.lexeme.clone(),
                body: self.block()?,
                position: position_of(name),
            });
        }
        let finally = if self.eat("finally") {
            Some(self.block()?)
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() {
            return Err(self.unexpected("'catch' or 'finally'"));
        }

        Ok(Stmt::Try {
            body,
            catches,
            finally,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let Some(call) = self.advance() else {
            return Err(self.unexpected("a print call"));
        };
        let kind = match call.lexeme.rsplit('.').next() {
            Some("println") => PrintKind::Println,
            Some("printf") => PrintKind::Printf,
            _ => PrintKind::Print,
        };

        self.expect("(")?;
        let mut args = Vec::new();
        if !self.check(")") {
            loop {
                args.push(self.expression()?);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        self.expect(";")?;

        Ok(Stmt::Print {
            kind,
            args,
            position: position_of(call),
        })
    }

    fn expression(&mut self) -> Result<Expr> {
        let is_assignment = self.check_kind(TokenKind::Identifier)
            && self.peek_at(1).is_some_and(|t| {
                matches!(
                    t.kind,
                    TokenKind::AssignmentOperator | TokenKind::CompoundOperator
                )
            });
        if !is_assignment {
            return self.binary(1);
        }

        let target = self.expect_identifier()?;
        let op = match self.advance().map(|t| t.lexeme.as_str()) {
            Some("=") => None,
            // `+=` → `+`, `>>>=` → `>>>`
            Some(compound) => BinaryOp::from_lexeme(&compound[..compound.len() - 1]),
            None => None,
        };
        let value = Box::new(self.expression()?);
        Ok(Expr::Assign {
            target: target.lexeme.clone(),
            op,
            value,
            position: position_of(target),
        })
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::ArithmeticOperator
            | TokenKind::RelationalOperator
            | TokenKind::LogicalOperator
            | TokenKind::BitwiseOperator => BinaryOp::from_lexeme(&token.lexeme),
            _ => None,
        }
    }

    /// Precedence climbing; every binary operator is left-associative.
    fn binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek_binary_op() {
            if op.precedence() < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(op.precedence() + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek().map(|t| t.lexeme.as_str()) {
            Some("!") => Some(UnaryOp::Not),
            Some("-") => Some(UnaryOp::Neg),
            Some("+") => Some(UnaryOp::Plus),
            Some("~") => Some(UnaryOp::BitNot),
            Some("++") | Some("--") => return self.prefix_step(),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(self.unary()?),
                })
            }
            None => self.postfix(),
        }
    }

    fn prefix_step(&mut self) -> Result<Expr> {
        let op = match self.advance().map(|t| t.lexeme.as_str()) {
            Some("++") => StepOp::Increment,
            _ => StepOp::Decrement,
        };
        let target = self.expect_identifier()?;
        Ok(Expr::Step {
            target: target.lexeme.clone(),
            op,
            prefix: true,
            position: position_of(target),
        })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let expr = self.primary()?;
        let op = match self.peek().map(|t| t.lexeme.as_str()) {
            Some("++") => StepOp::Increment,
            Some("--") => StepOp::Decrement,
            _ => return Ok(expr),
        };
        match expr {
            Expr::Ident { name, position } => {
                self.pos += 1;
                Ok(Expr::Step {
                    target: name,
                    op,
                    prefix: false,
                    position,
                })
            }
            other => Ok(other),
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("an expression"));
        };
        let position = position_of(token);
        let value = match token.kind {
            TokenKind::Number => Literal::Number(token.lexeme.clone()),
            TokenKind::StringLiteral => Literal::String(unquote(&token.lexeme)),
            TokenKind::CharLiteral => Literal::Char(unquote(&token.lexeme)),
            TokenKind::BooleanLiteral => Literal::Bool(token.lexeme == "true"),
            TokenKind::NullLiteral => Literal::Null,
            TokenKind::Identifier => {
                self.pos += 1;
                return Ok(Expr::Ident {
                    name: token.lexeme.clone(),
                    position,
                });
            }
            _ if token.lexeme == "(" => return self.parenthesized(),
            _ => return Err(self.unexpected("an expression")),
        };
        self.pos += 1;
        Ok(Expr::Literal { value, position })
    }
}

/// Strips the surrounding quote characters from a string or char lexeme.
fn unquote(lexeme: &str) -> String {
    lexeme[1..lexeme.len() - 1].to_string()
}
