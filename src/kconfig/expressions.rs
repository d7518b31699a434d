//! Expression grammar
//!
//! Recursive descent with the usual Kconfig precedence:
//!
//! ```text
//! expr    := or
//! or      := and ('||' and)*
//! and     := cmp ('&&' cmp)*
//! cmp     := term (('=' | '!=' | '<' | '<=' | '>' | '>=') term)?
//! term    := '!' cmp | '(' expr ')' | quoted-string | word
//! ```
//!
//! `!A = y` therefore reads as `!(A = y)`.
//!
//! A word is a symbol reference unless it reads as `y`/`m`/`n` or a number.

use super::errors::KconfigError;
use super::expr::{CompareOp, Expr, Literal};
use super::scanner::Scanner;

impl Scanner {
    /// Parse a full expression starting at the cursor.
    pub fn parse_expr(&mut self) -> Result<Expr, KconfigError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, KconfigError> {
        let mut left = self.parse_and()?;
        while self.try_consume("||") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, KconfigError> {
        let mut left = self.parse_comparison()?;
        while self.try_consume("&&") {
            let right = self.parse_comparison()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, KconfigError> {
        let lhs = self.parse_term()?;

        // Two-character operators first so '<=' is not read as '<'
        let op = if self.try_consume("!=") {
            CompareOp::Ne
        } else if self.try_consume("<=") {
            CompareOp::Le
        } else if self.try_consume(">=") {
            CompareOp::Ge
        } else if self.try_consume("=") {
            CompareOp::Eq
        } else if self.try_consume("<") {
            CompareOp::Lt
        } else if self.try_consume(">") {
            CompareOp::Gt
        } else {
            return Ok(lhs);
        };

        let rhs = self.parse_term()?;
        Ok(Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_term(&mut self) -> Result<Expr, KconfigError> {
        if self.eol() {
            return Err(self.fail("expected an expression"));
        }

        if let Some(text) = self.try_quoted_string()? {
            return Ok(Expr::Literal(Literal::String(text)));
        }

        if self.try_consume("!") {
            let inner = self.parse_comparison()?;
            return Ok(Expr::Not(Box::new(inner)));
        }

        if self.try_consume("(") {
            let inner = self.parse_expr()?;
            self.must_consume(")")?;
            return Ok(inner);
        }

        let word = self.ident()?;
        Ok(match Literal::from_word(&word) {
            Some(literal) => Expr::Literal(literal),
            None => Expr::Symbol(word),
        })
    }
}
