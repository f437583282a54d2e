use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Expr, Stmt};
use crate::char_reader::CharReaderError;
use crate::diag::{At, FullParseError, ParseError, Reporter};
use crate::scanner::Scanner;
use crate::token::{Literal, Token, TokenKind};

#[derive(Debug, Error)]
pub enum ParserError {
    /// Syntax error, already reported to the sink.  `declaration` catches
    /// this signal and synchronizes to the next statement boundary.
    #[error("{0}")]
    Parse(FullParseError),

    /// Read failure from the underlying stream.  Aborts the parse.
    #[error("read error: {0}")]
    Read(#[from] CharReaderError),
}

pub struct Parser<R: BufRead, W: Write> {
    scanner: Scanner<R, W>,
    current_token: Token,
    reporter: Rc<Reporter<W>>,
}

impl<R: BufRead, W: Write> Parser<R, W> {
    pub fn new(input: R, reporter: Rc<Reporter<W>>) -> Parser<R, W> {
        Parser {
            scanner: Scanner::new(input, Rc::clone(&reporter)),
            current_token: Token::eof(1), // we haven't scanned anything yet
            reporter,
        }
    }

    /// Parse a whole program.
    ///
    /// Syntax errors are reported as they are found and parsing resumes at
    /// the next statement boundary, so one pass surfaces as many errors as
    /// possible.  The returned list holds the declarations that parsed
    /// cleanly; callers consult the reporter before evaluating it.
    pub fn parse_program(&mut self) -> Result<Vec<Stmt>, ParserError> {
        let mut prg = vec![];
        self.advance()?;
        while self.current_token.kind != TokenKind::Eof {
            if let Some(stmt) = self.declaration()? {
                prg.push(stmt);
            }
        }
        Ok(prg)
    }

    #[allow(dead_code)]
    fn parse_expression(&mut self) -> Result<Expr, ParserError> {
        self.advance()?;
        self.expression()
    }

    /// One declaration, or `None` for a faulty one that was skipped.
    ///
    /// This is the recovery boundary: a parse-error signal raised anywhere
    /// below lands here and the parser synchronizes.
    fn declaration(&mut self) -> Result<Option<Stmt>, ParserError> {
        let result = match self.current_token.kind {
            TokenKind::Var => self.var_decl(),
            _ => self.statement(),
        };
        match result {
            Ok(stmt) => Ok(Some(stmt)),
            Err(ParserError::Parse(_)) => {
                self.synchronize()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Current token is `var`.
    fn var_decl(&mut self) -> Result<Stmt, ParserError> {
        self.advance()?;
        if self.current_token.kind != TokenKind::Identifier {
            return Err(self.error(ParseError::Expected("Expect variable name.")));
        }
        let name = self.current_token.clone();
        self.advance()?;

        let init = if self.current_token.kind == TokenKind::Equal {
            self.advance()?;
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::VarDecl(name, init))
    }

    fn statement(&mut self) -> Result<Stmt, ParserError> {
        match self.current_token.kind {
            TokenKind::Print => {
                self.advance()?;
                let expr = Box::new(self.expression()?);
                self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
                Ok(Stmt::Print(expr))
            }
            TokenKind::LeftCurly => self.block(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::For => self.for_stmt(),
            _ => {
                let expr = Box::new(self.expression()?);
                self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// Current token is `{`.
    fn block(&mut self) -> Result<Stmt, ParserError> {
        self.advance()?;
        let mut stmts = vec![];
        loop {
            match self.current_token.kind {
                TokenKind::RightCurly => {
                    self.advance()?;
                    break;
                }
                TokenKind::Eof => {
                    return Err(self.error(ParseError::Expected("Expect '}' after block.")));
                }
                _ => {
                    if let Some(stmt) = self.declaration()? {
                        stmts.push(stmt);
                    }
                }
            }
        }
        Ok(Stmt::Block(stmts))
    }

    fn if_stmt(&mut self) -> Result<Stmt, ParserError> {
        self.advance()?;
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let cond = Box::new(self.expression()?);
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.current_token.kind == TokenKind::Else {
            self.advance()?;
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(cond, then_branch, else_branch))
    }

    fn while_stmt(&mut self) -> Result<Stmt, ParserError> {
        self.advance()?;
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let cond = Box::new(self.expression()?);
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(cond, body))
    }

    /// `for` has no AST shape of its own; it parses into the equivalent
    /// `{ init; while (cond) { body; incr; } }`, so the evaluator never
    /// learns that `for` exists.
    fn for_stmt(&mut self) -> Result<Stmt, ParserError> {
        self.advance()?;
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let init = match self.current_token.kind {
            TokenKind::Semicolon => {
                self.advance()?;
                None
            }
            TokenKind::Var => Some(self.var_decl()?),
            _ => {
                let expr = Box::new(self.expression()?);
                self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
                Some(Stmt::Expr(expr))
            }
        };

        let cond = if self.current_token.kind == TokenKind::Semicolon {
            Box::new(Expr::Bool(true))
        } else {
            Box::new(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let incr = if self.current_token.kind == TokenKind::RightParen {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;
        if let Some(incr) = incr {
            body = Stmt::Block(vec![body, Stmt::Expr(incr)]);
        }
        body = Stmt::While(cond, Box::new(body));
        if let Some(init) = init {
            body = Stmt::Block(vec![init, body]);
        }
        Ok(body)
    }

    fn expression(&mut self) -> Result<Expr, ParserError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParserError> {
        let lhs = self.logic_or()?;
        if self.current_token.kind != TokenKind::Equal {
            return Ok(lhs);
        }

        let equals = self.current_token.clone();
        self.advance()?;
        let rhs = self.assignment()?;
        match lhs {
            Expr::Var(name) => Ok(Expr::Assign(name, Box::new(rhs))),
            lhs => {
                // Reported but not raised: the parser is not lost, so there
                // is nothing to synchronize past.
                self.reporter.syntax_error(&FullParseError {
                    pos: equals.line,
                    at: At::Token(equals.lexeme),
                    error: ParseError::InvalidAssignmentTarget,
                });
                Ok(lhs)
            }
        }
    }

    fn logic_or(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.logic_and()?;
        while self.current_token.kind == TokenKind::Or {
            let op = self.current_token.clone();
            self.advance()?;
            expr = Expr::Logical(Box::new(expr), op, Box::new(self.logic_and()?));
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.equality()?;
        while self.current_token.kind == TokenKind::And {
            let op = self.current_token.clone();
            self.advance()?;
            expr = Expr::Logical(Box::new(expr), op, Box::new(self.equality()?));
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.comparison()?;
        while matches!(
            self.current_token.kind,
            TokenKind::BangEqual | TokenKind::EqualEqual
        ) {
            let op = self.current_token.clone();
            self.advance()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(self.comparison()?));
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.term()?;
        while matches!(
            self.current_token.kind,
            TokenKind::Greater | TokenKind::GreaterEqual | TokenKind::Less | TokenKind::LessEqual
        ) {
            let op = self.current_token.clone();
            self.advance()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(self.term()?));
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.factor()?;
        while matches!(self.current_token.kind, TokenKind::Minus | TokenKind::Plus) {
            let op = self.current_token.clone();
            self.advance()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(self.factor()?));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.unary()?;
        while matches!(self.current_token.kind, TokenKind::Slash | TokenKind::Star) {
            let op = self.current_token.clone();
            self.advance()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(self.unary()?));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParserError> {
        match self.current_token.kind {
            TokenKind::Bang | TokenKind::Minus => {
                let op = self.current_token.clone();
                self.advance()?;
                Ok(Expr::Unary(op, Box::new(self.unary()?)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, ParserError> {
        let expr = match (&self.current_token.kind, &self.current_token.literal) {
            (TokenKind::Nil, _) => Expr::Nil,
            (TokenKind::True, _) => Expr::Bool(true),
            (TokenKind::False, _) => Expr::Bool(false),
            (TokenKind::Number, Some(Literal::Number(n))) => Expr::Number(*n),
            (TokenKind::Str, Some(Literal::Str(s))) => Expr::Str(s.clone()),
            (TokenKind::Identifier, _) => Expr::Var(self.current_token.clone()),
            (TokenKind::LeftParen, _) => {
                self.advance()?;
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Group(Box::new(expr)));
            }
            _ => return Err(self.error(ParseError::ExpectedExpression)),
        };
        self.advance()?;
        Ok(expr)
    }

    fn advance(&mut self) -> Result<(), ParserError> {
        self.current_token = self.scanner.get_token()?;
        Ok(())
    }

    fn consume(&mut self, expected: TokenKind, message: &'static str) -> Result<(), ParserError> {
        if self.current_token.kind == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(ParseError::Expected(message)))
        }
    }

    /// Report a syntax error at the current token and return the signal
    /// the caller propagates up to `declaration`.
    fn error(&mut self, error: ParseError) -> ParserError {
        let at = if self.current_token.kind == TokenKind::Eof {
            At::End
        } else {
            At::Token(self.current_token.lexeme.clone())
        };
        let full = FullParseError {
            pos: self.current_token.line,
            at,
            error,
        };
        self.reporter.syntax_error(&full);
        ParserError::Parse(full)
    }

    /// Skip tokens to the next statement boundary: just past a `;`, or just
    /// before a keyword that can start a statement.
    fn synchronize(&mut self) -> Result<(), ParserError> {
        let mut past_semicolon = self.current_token.kind == TokenKind::Semicolon;
        self.advance()?;
        loop {
            if past_semicolon {
                return Ok(());
            }
            match self.current_token.kind {
                TokenKind::Eof
                | TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return Ok(()),
                kind => {
                    past_semicolon = kind == TokenKind::Semicolon;
                    self.advance()?;
                }
            }
        }
    }
}
