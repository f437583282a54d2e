use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Expr, Stmt};
use crate::diag::Position;
use crate::token::{Token, TokenKind};

/// A runtime value.  Exactly four things are representable.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    /// Only `nil` and `false` are falsy; `0`, `""` and `NaN` are all truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            // f64's Display never prints a trailing ".0", so integral
            // numbers already render as integers.
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Errors raised while evaluating, attributed to the operator or name token
/// that raised them.  `Display` is the two-line runtime diagnostic.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Operand must be a number.\n[line {0}]")]
    OperandMustBeNumber(Position),

    #[error("Operands must be numbers.\n[line {0}]")]
    OperandsMustBeNumbers(Position),

    #[error("Operands must be two numbers or two strings.\n[line {0}]")]
    OperandsMustBeNumbersOrStrings(Position),

    #[error("Undefined variable '{1}'.\n[line {0}]")]
    UndefinedVariable(Position, String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Walks the statement list, writing `print` output to `W`.
#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
    globals: Rc<Env>,
}

impl<'a, W: Write> Evaluator<'a, W> {
    pub fn new(output: &'a mut W) -> Evaluator<'a, W> {
        Evaluator {
            output,
            globals: Env::new(),
        }
    }

    /// Evaluate statements against the global environment, which persists
    /// across calls.  Stops at the first runtime error; the error is never
    /// caught below this boundary.
    pub fn eval_stmts_in_global_env(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        self.eval_stmts(stmts, self.globals.clone())
    }

    fn eval_stmts(&mut self, stmts: &[Stmt], env: Rc<Env>) -> Result<(), RuntimeError> {
        for stmt in stmts {
            self.eval_stmt(stmt, env.clone())?;
        }
        Ok(())
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: Rc<Env>) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::Expr(e) => {
                self.eval_expr(e, env)?;
            }
            Stmt::Print(e) => {
                let v = self.eval_expr(e, env)?;
                writeln!(self.output, "{}", v)?;
            }
            Stmt::VarDecl(name, init) => {
                let value = match init {
                    Some(e) => self.eval_expr(e, env.clone())?,
                    None => Value::Nil,
                };
                env.define(&name.lexeme, value);
            }
            Stmt::Block(stmts) => {
                // The fresh scope lives only in this call frame, so the
                // caller's environment is back in force on every exit path,
                // error unwinds included.
                self.eval_stmts(stmts, Env::with_parent(Some(env)))?;
            }
            Stmt::If(cond, then_branch, else_branch) => {
                if self.eval_expr(cond, env.clone())?.is_truthy() {
                    self.eval_stmt(then_branch, env)?;
                } else if let Some(else_branch) = else_branch {
                    self.eval_stmt(else_branch, env)?;
                }
            }
            Stmt::While(cond, body) => {
                while self.eval_expr(cond, env.clone())?.is_truthy() {
                    self.eval_stmt(body, env.clone())?;
                }
            }
        };
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr, env: Rc<Env>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Nil => Ok(Value::Nil),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Group(e) => self.eval_expr(e, env),
            Expr::Var(name) => env
                .get(&name.lexeme)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.line, name.lexeme.clone())),
            Expr::Assign(name, rhs) => {
                let value = self.eval_expr(rhs, env.clone())?;
                if env.assign(&name.lexeme, value.clone()) {
                    Ok(value)
                } else {
                    Err(RuntimeError::UndefinedVariable(name.line, name.lexeme.clone()))
                }
            }
            Expr::Unary(op, operand) => {
                let v = self.eval_expr(operand, env)?;
                match op.kind {
                    TokenKind::Minus => match v {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::OperandMustBeNumber(op.line)),
                    },
                    TokenKind::Bang => Ok(Value::Bool(!v.is_truthy())),
                    _ => unreachable!(),
                }
            }
            Expr::Binary(lhs, op, rhs) => {
                // Left before right, both before the operand check.
                let l = self.eval_expr(lhs, env.clone())?;
                let r = self.eval_expr(rhs, env)?;
                match op.kind {
                    TokenKind::Plus => match (l, r) {
                        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                        (Value::Str(l), Value::Str(r)) => Ok(Value::Str(l + &r)),
                        _ => Err(RuntimeError::OperandsMustBeNumbersOrStrings(op.line)),
                    },
                    TokenKind::Minus => {
                        let (l, r) = number_operands(l, r, op)?;
                        Ok(Value::Number(l - r))
                    }
                    TokenKind::Star => {
                        let (l, r) = number_operands(l, r, op)?;
                        Ok(Value::Number(l * r))
                    }
                    TokenKind::Slash => {
                        // Division by zero is not an error: it yields an
                        // IEEE-754 infinity.
                        let (l, r) = number_operands(l, r, op)?;
                        Ok(Value::Number(l / r))
                    }
                    TokenKind::Greater => {
                        let (l, r) = number_operands(l, r, op)?;
                        Ok(Value::Bool(l > r))
                    }
                    TokenKind::GreaterEqual => {
                        let (l, r) = number_operands(l, r, op)?;
                        Ok(Value::Bool(l >= r))
                    }
                    TokenKind::Less => {
                        let (l, r) = number_operands(l, r, op)?;
                        Ok(Value::Bool(l < r))
                    }
                    TokenKind::LessEqual => {
                        let (l, r) = number_operands(l, r, op)?;
                        Ok(Value::Bool(l <= r))
                    }
                    // Values of different kinds are simply unequal.
                    TokenKind::EqualEqual => Ok(Value::Bool(l == r)),
                    TokenKind::BangEqual => Ok(Value::Bool(l != r)),
                    _ => unreachable!(),
                }
            }
            Expr::Logical(lhs, op, rhs) => {
                // The result is the deciding operand itself, not a bool.
                let l = self.eval_expr(lhs, env.clone())?;
                let keep_left = if op.kind == TokenKind::Or {
                    l.is_truthy()
                } else {
                    !l.is_truthy()
                };
                if keep_left {
                    Ok(l)
                } else {
                    self.eval_expr(rhs, env)
                }
            }
        }
    }
}

fn number_operands(l: Value, r: Value, op: &Token) -> Result<(f64, f64), RuntimeError> {
    match (l, r) {
        (Value::Number(l), Value::Number(r)) => Ok((l, r)),
        _ => Err(RuntimeError::OperandsMustBeNumbers(op.line)),
    }
}

/// One scope: bindings plus a link to the enclosing scope.  Scopes chain
/// from innermost out to the global environment.
#[derive(Debug)]
struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<HashMap<String, Value>>,
}

impl Env {
    fn new() -> Rc<Env> {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Rc<Env>>) -> Rc<Env> {
        Rc::new(Env {
            parent,
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Bind in this scope.  Redeclaring a name here overwrites it silently.
    fn define(&self, name: &str, val: Value) {
        self.bindings.borrow_mut().insert(name.to_string(), val);
    }

    /// Overwrite in the innermost scope that already binds `name`.
    /// Returns false when no scope does: assignment never declares.
    fn assign(&self, name: &str, val: Value) -> bool {
        if let Some(slot) = self.bindings.borrow_mut().get_mut(name) {
            *slot = val;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign(name, val),
            None => false,
        }
    }

    fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.borrow().get(name) {
            Some(v) => Some(v.clone()),
            None => self.parent.as_ref().and_then(|p| p.get(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme.to_string(), None, 1)
    }

    fn ident(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name.to_string(), None, 1)
    }

    fn binary(l: Expr, o: Token, r: Expr) -> Expr {
        Expr::Binary(Box::new(l), o, Box::new(r))
    }

    fn eval_expr(expr: &Expr) -> Result<Value, RuntimeError> {
        let mut out: Vec<u8> = Vec::new();
        let mut evaluator = Evaluator::new(&mut out);
        let globals = evaluator.globals.clone();
        let val = evaluator.eval_expr(expr, globals)?;
        assert!(out.is_empty());
        Ok(val)
    }

    fn eval_prg(prg: &[Stmt]) -> Result<String, RuntimeError> {
        let mut out: Vec<u8> = Vec::new();
        let mut e = Evaluator::new(&mut out);
        e.eval_stmts_in_global_env(prg)?;
        Ok(String::from_utf8(out).expect("error while converting output"))
    }

    #[test]
    fn literals() -> Result<(), RuntimeError> {
        assert_eq!(eval_expr(&Expr::Number(1.0))?, Value::Number(1.0));
        assert_eq!(eval_expr(&Expr::Bool(true))?, Value::Bool(true));
        assert_eq!(eval_expr(&Expr::Nil)?, Value::Nil);
        assert_eq!(
            eval_expr(&Expr::Str("hi".to_string()))?,
            Value::Str("hi".to_string())
        );
        Ok(())
    }

    #[test]
    fn unary_minus() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_expr(&Expr::Unary(
                op(TokenKind::Minus, "-"),
                Box::new(Expr::Number(1.0))
            ))?,
            Value::Number(-1.0)
        );
        Ok(())
    }

    #[test]
    fn unary_minus_on_string() {
        match eval_expr(&Expr::Unary(
            op(TokenKind::Minus, "-"),
            Box::new(Expr::Str("x".to_string())),
        )) {
            Err(RuntimeError::OperandMustBeNumber(1)) => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn bang_follows_truthiness() -> Result<(), RuntimeError> {
        let bang = |e| Expr::Unary(op(TokenKind::Bang, "!"), Box::new(e));
        assert_eq!(eval_expr(&bang(Expr::Bool(true)))?, Value::Bool(false));
        assert_eq!(eval_expr(&bang(Expr::Nil))?, Value::Bool(true));
        // 0 and "" are truthy.
        assert_eq!(eval_expr(&bang(Expr::Number(0.0)))?, Value::Bool(false));
        assert_eq!(
            eval_expr(&bang(Expr::Str(String::new())))?,
            Value::Bool(false)
        );
        Ok(())
    }

    #[test]
    fn arithmetic() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_expr(&binary(
                Expr::Number(1.0),
                op(TokenKind::Plus, "+"),
                binary(
                    Expr::Number(2.0),
                    op(TokenKind::Star, "*"),
                    Expr::Number(3.0)
                )
            ))?,
            Value::Number(7.0)
        );
        assert_eq!(
            eval_expr(&binary(
                Expr::Number(1.0),
                op(TokenKind::Minus, "-"),
                Expr::Number(3.0)
            ))?,
            Value::Number(-2.0)
        );
        Ok(())
    }

    #[test]
    fn division_by_zero_yields_infinity() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_expr(&binary(
                Expr::Number(1.0),
                op(TokenKind::Slash, "/"),
                Expr::Number(0.0)
            ))?,
            Value::Number(f64::INFINITY)
        );
        Ok(())
    }

    #[test]
    fn string_concatenation() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_expr(&binary(
                Expr::Str("foo".to_string()),
                op(TokenKind::Plus, "+"),
                Expr::Str("bar".to_string())
            ))?,
            Value::Str("foobar".to_string())
        );
        Ok(())
    }

    #[test]
    fn adding_string_and_number_fails() {
        match eval_expr(&binary(
            Expr::Str("a".to_string()),
            op(TokenKind::Plus, "+"),
            Expr::Number(1.0),
        )) {
            Err(RuntimeError::OperandsMustBeNumbersOrStrings(1)) => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn subtracting_strings_fails() {
        match eval_expr(&binary(
            Expr::Str("a".to_string()),
            op(TokenKind::Minus, "-"),
            Expr::Str("b".to_string()),
        )) {
            Err(RuntimeError::OperandsMustBeNumbers(1)) => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn comparisons() -> Result<(), RuntimeError> {
        let cmp = |l: f64, kind, lexeme, r: f64| {
            eval_expr(&binary(Expr::Number(l), op(kind, lexeme), Expr::Number(r)))
        };
        assert_eq!(cmp(1.0, TokenKind::Less, "<", 2.0)?, Value::Bool(true));
        assert_eq!(cmp(2.0, TokenKind::Less, "<", 2.0)?, Value::Bool(false));
        assert_eq!(cmp(2.0, TokenKind::LessEqual, "<=", 2.0)?, Value::Bool(true));
        assert_eq!(cmp(3.0, TokenKind::Greater, ">", 2.0)?, Value::Bool(true));
        assert_eq!(
            cmp(2.0, TokenKind::GreaterEqual, ">=", 3.0)?,
            Value::Bool(false)
        );
        Ok(())
    }

    #[test]
    fn comparing_strings_fails() {
        match eval_expr(&binary(
            Expr::Str("a".to_string()),
            op(TokenKind::Less, "<"),
            Expr::Str("b".to_string()),
        )) {
            Err(RuntimeError::OperandsMustBeNumbers(1)) => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn equality_within_a_kind() -> Result<(), RuntimeError> {
        let eq = |l, r| eval_expr(&binary(l, op(TokenKind::EqualEqual, "=="), r));
        assert_eq!(eq(Expr::Number(2.0), Expr::Number(2.0))?, Value::Bool(true));
        assert_eq!(
            eq(Expr::Number(2.0), Expr::Number(6.0))?,
            Value::Bool(false)
        );
        assert_eq!(eq(Expr::Nil, Expr::Nil)?, Value::Bool(true));
        assert_eq!(
            eq(
                Expr::Str("a".to_string()),
                Expr::Str("a".to_string())
            )?,
            Value::Bool(true)
        );
        Ok(())
    }

    #[test]
    fn values_of_different_kinds_are_unequal() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_expr(&binary(
                Expr::Bool(true),
                op(TokenKind::EqualEqual, "=="),
                Expr::Number(1.0)
            ))?,
            Value::Bool(false)
        );
        assert_eq!(
            eval_expr(&binary(
                Expr::Nil,
                op(TokenKind::BangEqual, "!="),
                Expr::Number(0.0)
            ))?,
            Value::Bool(true)
        );
        Ok(())
    }

    #[test]
    fn bang_equal_negates_equal() -> Result<(), RuntimeError> {
        for (l, r) in [
            (Expr::Number(1.0), Expr::Number(1.0)),
            (Expr::Number(1.0), Expr::Number(2.0)),
            (Expr::Bool(true), Expr::Number(1.0)),
        ] {
            let eq = eval_expr(&binary(
                l.clone(),
                op(TokenKind::EqualEqual, "=="),
                r.clone(),
            ))?;
            let ne = eval_expr(&binary(l, op(TokenKind::BangEqual, "!="), r))?;
            match (eq, ne) {
                (Value::Bool(eq), Value::Bool(ne)) => assert_eq!(eq, !ne),
                out => panic!("unexpected output: {:?}", out),
            }
        }
        Ok(())
    }

    #[test]
    fn logical_operators_return_the_deciding_operand() -> Result<(), RuntimeError> {
        let logical = |l, kind, lexeme, r| {
            eval_expr(&Expr::Logical(Box::new(l), op(kind, lexeme), Box::new(r)))
        };
        assert_eq!(
            logical(
                Expr::Nil,
                TokenKind::Or,
                "or",
                Expr::Str("fallback".to_string())
            )?,
            Value::Str("fallback".to_string())
        );
        assert_eq!(
            logical(Expr::Number(1.0), TokenKind::Or, "or", Expr::Number(2.0))?,
            Value::Number(1.0)
        );
        assert_eq!(
            logical(Expr::Number(1.0), TokenKind::And, "and", Expr::Number(2.0))?,
            Value::Number(2.0)
        );
        assert_eq!(
            logical(Expr::Bool(false), TokenKind::And, "and", Expr::Number(2.0))?,
            Value::Bool(false)
        );
        Ok(())
    }

    #[test]
    fn logical_operators_short_circuit() -> Result<(), RuntimeError> {
        // The right operand would blow up if it were evaluated.
        let boom = || {
            Box::new(Expr::Unary(
                op(TokenKind::Minus, "-"),
                Box::new(Expr::Str("x".to_string())),
            ))
        };
        assert_eq!(
            eval_expr(&Expr::Logical(
                Box::new(Expr::Bool(true)),
                op(TokenKind::Or, "or"),
                boom()
            ))?,
            Value::Bool(true)
        );
        assert_eq!(
            eval_expr(&Expr::Logical(
                Box::new(Expr::Bool(false)),
                op(TokenKind::And, "and"),
                boom()
            ))?,
            Value::Bool(false)
        );
        Ok(())
    }

    #[test]
    fn print_stmt() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[Stmt::Print(Box::new(Expr::Number(42.0)))])?,
            "42\n"
        );
        Ok(())
    }

    #[test]
    fn print_formats_values() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[
                Stmt::Print(Box::new(Expr::Number(1.0))),
                Stmt::Print(Box::new(Expr::Number(1.5))),
                Stmt::Print(Box::new(Expr::Bool(true))),
                Stmt::Print(Box::new(Expr::Nil)),
                Stmt::Print(Box::new(Expr::Str("x".to_string()))),
            ])?,
            "1\n1.5\ntrue\nnil\nx\n"
        );
        Ok(())
    }

    #[test]
    fn set_and_get_var() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[
                Stmt::VarDecl(ident("foo"), Some(Box::new(Expr::Number(42.0)))),
                Stmt::Print(Box::new(Expr::Var(ident("foo"))))
            ])?,
            "42\n"
        );
        Ok(())
    }

    #[test]
    fn var_without_initializer_is_nil() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[
                Stmt::VarDecl(ident("foo"), None),
                Stmt::Print(Box::new(Expr::Var(ident("foo"))))
            ])?,
            "nil\n"
        );
        Ok(())
    }

    #[test]
    fn redeclaring_overwrites() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[
                Stmt::VarDecl(ident("foo"), Some(Box::new(Expr::Number(42.0)))),
                Stmt::VarDecl(ident("foo"), Some(Box::new(Expr::Number(24.0)))),
                Stmt::Print(Box::new(Expr::Var(ident("foo")))),
            ])?,
            "24\n"
        );
        Ok(())
    }

    #[test]
    fn reading_unknown_var_fails() {
        match eval_prg(&[Stmt::Print(Box::new(Expr::Var(ident("foo"))))]) {
            Err(RuntimeError::UndefinedVariable(1, name)) if name == "foo" => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn assigning_unknown_var_fails() {
        match eval_prg(&[Stmt::Expr(Box::new(Expr::Assign(
            ident("foo"),
            Box::new(Expr::Number(42.0)),
        )))]) {
            Err(RuntimeError::UndefinedVariable(1, name)) if name == "foo" => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn assignment_yields_the_assigned_value() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[
                Stmt::VarDecl(ident("a"), Some(Box::new(Expr::Number(1.0)))),
                Stmt::Print(Box::new(Expr::Assign(
                    ident("a"),
                    Box::new(Expr::Number(2.0))
                ))),
                Stmt::Print(Box::new(Expr::Var(ident("a")))),
            ])?,
            "2\n2\n"
        );
        Ok(())
    }

    #[test]
    fn operands_evaluate_left_to_right() -> Result<(), RuntimeError> {
        // (a = 2) + a reads the freshly assigned value on the right.
        assert_eq!(
            eval_prg(&[
                Stmt::VarDecl(ident("a"), Some(Box::new(Expr::Number(1.0)))),
                Stmt::Print(Box::new(binary(
                    Expr::Group(Box::new(Expr::Assign(
                        ident("a"),
                        Box::new(Expr::Number(2.0))
                    ))),
                    op(TokenKind::Plus, "+"),
                    Expr::Var(ident("a"))
                ))),
            ])?,
            "4\n"
        );
        Ok(())
    }

    #[test]
    fn block_shadows_and_restores() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[
                Stmt::VarDecl(ident("a"), Some(Box::new(Expr::Str("outer".to_string())))),
                Stmt::Block(vec![
                    Stmt::VarDecl(ident("a"), Some(Box::new(Expr::Str("inner".to_string())))),
                    Stmt::Print(Box::new(Expr::Var(ident("a")))),
                ]),
                Stmt::Print(Box::new(Expr::Var(ident("a")))),
            ])?,
            "inner\nouter\n"
        );
        Ok(())
    }

    #[test]
    fn block_assignment_reaches_outer_scope() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[
                Stmt::VarDecl(ident("a"), Some(Box::new(Expr::Number(2.0)))),
                Stmt::Block(vec![Stmt::Expr(Box::new(Expr::Assign(
                    ident("a"),
                    Box::new(binary(
                        Expr::Var(ident("a")),
                        op(TokenKind::Plus, "+"),
                        Expr::Number(1.0)
                    ))
                )))]),
                Stmt::Print(Box::new(Expr::Var(ident("a")))),
            ])?,
            "3\n"
        );
        Ok(())
    }

    #[test]
    fn env_is_restored_after_a_runtime_error_in_a_block() {
        let mut out: Vec<u8> = Vec::new();
        let mut e = Evaluator::new(&mut out);

        let failing_block = [
            Stmt::VarDecl(ident("a"), Some(Box::new(Expr::Number(1.0)))),
            Stmt::Block(vec![
                Stmt::VarDecl(ident("a"), Some(Box::new(Expr::Number(2.0)))),
                Stmt::Expr(Box::new(Expr::Var(ident("missing")))),
            ]),
        ];
        match e.eval_stmts_in_global_env(&failing_block) {
            Err(RuntimeError::UndefinedVariable(..)) => (),
            out => panic!("unexpected output: {:?}", out),
        }

        // The inner scope is gone: `a` is the global one.
        e.eval_stmts_in_global_env(&[Stmt::Print(Box::new(Expr::Var(ident("a"))))])
            .expect("global environment should have survived");
        assert_eq!(out, b"1\n");
    }

    #[test]
    fn if_else() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[Stmt::If(
                Box::new(Expr::Bool(true)),
                Box::new(Stmt::Print(Box::new(Expr::Number(1.0)))),
                Some(Box::new(Stmt::Print(Box::new(Expr::Number(2.0))))),
            )])?,
            "1\n"
        );
        assert_eq!(
            eval_prg(&[Stmt::If(
                Box::new(Expr::Nil),
                Box::new(Stmt::Print(Box::new(Expr::Number(1.0)))),
                Some(Box::new(Stmt::Print(Box::new(Expr::Number(2.0))))),
            )])?,
            "2\n"
        );
        Ok(())
    }

    #[test]
    fn if_without_else() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_prg(&[Stmt::If(
                Box::new(Expr::Bool(false)),
                Box::new(Stmt::Print(Box::new(Expr::Number(1.0)))),
                None,
            )])?,
            ""
        );
        Ok(())
    }

    #[test]
    fn while_loop() -> Result<(), RuntimeError> {
        let incr = Stmt::Expr(Box::new(Expr::Assign(
            ident("i"),
            Box::new(binary(
                Expr::Var(ident("i")),
                op(TokenKind::Plus, "+"),
                Expr::Number(1.0),
            )),
        )));
        assert_eq!(
            eval_prg(&[
                Stmt::VarDecl(ident("i"), Some(Box::new(Expr::Number(0.0)))),
                Stmt::While(
                    Box::new(binary(
                        Expr::Var(ident("i")),
                        op(TokenKind::Less, "<"),
                        Expr::Number(3.0)
                    )),
                    Box::new(Stmt::Block(vec![
                        Stmt::Print(Box::new(Expr::Var(ident("i")))),
                        incr,
                    ]))
                ),
            ])?,
            "0\n1\n2\n"
        );
        Ok(())
    }
}
