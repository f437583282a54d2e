//! Convert byte reader to utf8 character iterator.
//!
//! For some reason there is no such facility in `std::*`.

use std::io::prelude::*;
use std::io::{self, Bytes};
use std::iter::Peekable;
use std::str::{self, Utf8Error};

use thiserror::Error;

/// An iterator over a buffered reader that produces characters rather than bytes.
#[derive(Debug)]
pub struct CharReader<R: BufRead> {
    input: Peekable<Bytes<R>>,

    // Conversion buffer stored here to avoid reallocation.
    buf: Vec<u8>,
}

impl<R: BufRead> CharReader<R> {
    pub fn new(input: R) -> CharReader<R> {
        CharReader {
            input: input.bytes().peekable(),
            buf: vec![],
        }
    }

    fn convert_multi_byte_char(&mut self, first_byte: u8) -> Result<char, CharReaderError> {
        self.buf.clear();
        self.buf.push(first_byte);
        loop {
            match self.input.peek() {
                Some(Err(_)) => {
                    if let Some(Err(e)) = self.input.next() {
                        return Err(CharReaderError::from(e));
                    }
                }
                Some(Ok(b)) if (b & 0b1100_0000) == 0b1000_0000 => {
                    if let Some(Ok(b)) = self.input.next() {
                        self.buf.push(b);
                    }
                }
                // EOF or start of next char
                _ => break,
            }
        }
        let s = str::from_utf8(&self.buf)?;
        // buf is non-empty valid UTF-8 at this point
        Ok(s.chars().next().unwrap())
    }
}

impl<R: BufRead> Iterator for CharReader<R> {
    type Item = Result<char, CharReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.input.next() {
            Some(Ok(b)) => {
                if b.is_ascii() {
                    Some(Ok(b as char))
                } else if (b & 0b1100_0000) == 0b1100_0000 {
                    Some(self.convert_multi_byte_char(b))
                } else {
                    Some(Err(CharReaderError::BadStartByte(b)))
                }
            }
            Some(Err(e)) => Some(Err(CharReaderError::from(e))),
            _ => None,
        }
    }
}

/// Errors raised when reading and converting to UTF-8.
#[derive(Debug, Error)]
pub enum CharReaderError {
    #[error("failed to read bytes: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected UTF-8 start byte: {0:b}")]
    BadStartByte(u8),

    #[error("failed to convert byte sequence to UTF-8: {0}")]
    Utf8(#[from] Utf8Error),
}
