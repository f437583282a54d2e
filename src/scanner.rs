//! Lexical analyzer

use std::io::prelude::*;
use std::iter::Peekable;
use std::rc::Rc;

use crate::char_reader::{CharReader, CharReaderError};
use crate::diag::{At, FullParseError, ParseError, Position, Reporter};
use crate::token::{Literal, Token, TokenKind};

/// Turn a sequence of bytes into a sequence of tokens.
///
/// Lexical errors are reported to the shared [`Reporter`] and the offending
/// text is skipped, so scanning always reaches the `Eof` sentinel.  Only
/// read failures from the underlying stream abort a scan.
pub struct Scanner<R: BufRead, W: Write> {
    input: Peekable<CharReader<R>>,
    line: Position,
    reporter: Rc<Reporter<W>>,

    // One rescanned character.  The number grammar needs two characters of
    // lookahead ("1.x" is NUMBER DOT IDENTIFIER) while the stream gives one.
    pending: Option<char>,

    // Buffer used when scanning longer tokens.  Allocated here to reuse memory.
    buf: String,
}

impl<R: BufRead, W: Write> Scanner<R, W> {
    /// Creates a new scanner operating on `input`.
    pub fn new(input: R, reporter: Rc<Reporter<W>>) -> Scanner<R, W> {
        Scanner {
            input: CharReader::new(input).peekable(),
            line: 1,
            reporter,
            pending: None,
            buf: String::new(),
        }
    }

    /// Scan and return the next token.
    ///
    /// At end of input this returns the `Eof` sentinel; the sentinel is not
    /// consumed, so further calls keep returning it.
    pub fn get_token(&mut self) -> Result<Token, CharReaderError> {
        loop {
            let ch = match self.next_char()? {
                None => return Ok(Token::eof(self.line)),
                Some(ch) => ch,
            };
            match ch {
                '\n' => self.line += 1,
                ' ' | '\t' | '\r' => (),
                '(' => return Ok(self.fixed(TokenKind::LeftParen, "(")),
                ')' => return Ok(self.fixed(TokenKind::RightParen, ")")),
                '{' => return Ok(self.fixed(TokenKind::LeftCurly, "{")),
                '}' => return Ok(self.fixed(TokenKind::RightCurly, "}")),
                ',' => return Ok(self.fixed(TokenKind::Comma, ",")),
                '.' => return Ok(self.fixed(TokenKind::Dot, ".")),
                '-' => return Ok(self.fixed(TokenKind::Minus, "-")),
                '+' => return Ok(self.fixed(TokenKind::Plus, "+")),
                ';' => return Ok(self.fixed(TokenKind::Semicolon, ";")),
                '*' => return Ok(self.fixed(TokenKind::Star, "*")),
                '!' => {
                    return Ok(if self.match_char('=')? {
                        self.fixed(TokenKind::BangEqual, "!=")
                    } else {
                        self.fixed(TokenKind::Bang, "!")
                    });
                }
                '=' => {
                    return Ok(if self.match_char('=')? {
                        self.fixed(TokenKind::EqualEqual, "==")
                    } else {
                        self.fixed(TokenKind::Equal, "=")
                    });
                }
                '<' => {
                    return Ok(if self.match_char('=')? {
                        self.fixed(TokenKind::LessEqual, "<=")
                    } else {
                        self.fixed(TokenKind::Less, "<")
                    });
                }
                '>' => {
                    return Ok(if self.match_char('=')? {
                        self.fixed(TokenKind::GreaterEqual, ">=")
                    } else {
                        self.fixed(TokenKind::Greater, ">")
                    });
                }
                '/' => {
                    if self.match_char('/')? {
                        self.skip_line_comment()?;
                    } else if self.match_char('*')? {
                        self.skip_block_comment()?;
                    } else {
                        return Ok(self.fixed(TokenKind::Slash, "/"));
                    }
                }
                '"' => {
                    if let Some(token) = self.scan_string()? {
                        return Ok(token);
                    }
                }
                '0'..='9' => {
                    if let Some(token) = self.scan_number(ch)? {
                        return Ok(token);
                    }
                }
                'a'..='z' | 'A'..='Z' | '_' => return self.scan_identifier(ch),
                _ => self.report(ParseError::UnexpectedChar),
            };
        }
    }

    fn fixed(&self, kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme.to_string(), None, self.line)
    }

    fn report(&self, error: ParseError) {
        self.reporter.syntax_error(&FullParseError {
            pos: self.line,
            at: At::Source,
            error,
        });
    }

    fn skip_line_comment(&mut self) -> Result<(), CharReaderError> {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.next_char()?;
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), CharReaderError> {
        loop {
            match self.next_char()? {
                None => {
                    self.report(ParseError::UnterminatedBlockComment);
                    return Ok(());
                }
                Some('\n') => self.line += 1,
                Some('*') if self.peek_char() == Some('/') => {
                    self.next_char()?;
                    return Ok(());
                }
                Some(_) => (),
            }
        }
    }

    /// The opening `"` has been consumed.  Returns `None` when the literal
    /// is unterminated; the partial token is discarded.
    fn scan_string(&mut self) -> Result<Option<Token>, CharReaderError> {
        self.buf.clear();
        self.buf.push('"');
        loop {
            match self.next_char()? {
                None => {
                    self.report(ParseError::UnterminatedString);
                    return Ok(None);
                }
                Some('"') => break,
                Some(ch) => {
                    if ch == '\n' {
                        self.line += 1;
                    }
                    self.buf.push(ch);
                }
            }
        }
        let literal = self.buf[1..].to_string();
        self.buf.push('"');
        Ok(Some(Token::new(
            TokenKind::Str,
            self.buf.clone(),
            Some(Literal::Str(literal)),
            self.line,
        )))
    }

    /// Maximal digit run, with a fraction only when the `.` is followed by
    /// another digit.  A trailing `.` is rescanned as its own token.
    fn scan_number(&mut self, first_digit: char) -> Result<Option<Token>, CharReaderError> {
        self.buf.clear();
        self.buf.push(first_digit);
        self.scan_digits()?;

        if self.peek_char() == Some('.') {
            self.next_char()?;
            if self.peek_char().map_or(false, |ch| ch.is_ascii_digit()) {
                self.buf.push('.');
                self.scan_digits()?;
            } else {
                self.pending = Some('.');
            }
        }

        match self.buf.parse::<f64>() {
            Ok(n) => Ok(Some(Token::new(
                TokenKind::Number,
                self.buf.clone(),
                Some(Literal::Number(n)),
                self.line,
            ))),
            Err(_) => {
                self.report(ParseError::BadNumberLiteral);
                Ok(None)
            }
        }
    }

    fn scan_digits(&mut self) -> Result<(), CharReaderError> {
        while self.peek_char().map_or(false, |ch| ch.is_ascii_digit()) {
            if let Some(ch) = self.next_char()? {
                self.buf.push(ch);
            }
        }
        Ok(())
    }

    fn scan_identifier(&mut self, first_char: char) -> Result<Token, CharReaderError> {
        self.buf.clear();
        self.buf.push(first_char);
        while self
            .peek_char()
            .map_or(false, |ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            if let Some(ch) = self.next_char()? {
                self.buf.push(ch);
            }
        }

        let kind = keyword(&self.buf).unwrap_or(TokenKind::Identifier);
        Ok(Token::new(kind, self.buf.clone(), None, self.line))
    }

    fn next_char(&mut self) -> Result<Option<char>, CharReaderError> {
        if let Some(ch) = self.pending.take() {
            return Ok(Some(ch));
        }
        self.input.next().transpose()
    }

    fn peek_char(&mut self) -> Option<char> {
        if let Some(ch) = self.pending {
            return Some(ch);
        }
        match self.input.peek() {
            Some(Ok(ch)) => Some(*ch),
            // A read failure here resurfaces on the next `next_char` call.
            _ => None,
        }
    }

    fn match_char(&mut self, expected: char) -> Result<bool, CharReaderError> {
        if self.peek_char() == Some(expected) {
            self.next_char()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

impl<R: BufRead, W: Write> Iterator for Scanner<R, W> {
    type Item = Result<Token, CharReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.get_token() {
            Ok(token) if token.kind == TokenKind::Eof => None,
            Ok(token) => Some(Ok(token)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Fixed keyword table.  Identifiers are case-sensitive.
fn keyword(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "and" => TokenKind::And,
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "for" => TokenKind::For,
        "fun" => TokenKind::Fun,
        "if" => TokenKind::If,
        "nil" => TokenKind::Nil,
        "or" => TokenKind::Or,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}
