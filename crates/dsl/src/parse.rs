use crate::{Arg, Expr};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected character {ch:?} at offset {at}")]
    Unexpected { ch: char, at: usize },
    #[error("unterminated string literal starting at offset {at}")]
    UnterminatedString { at: usize },
    #[error("invalid number {text:?} at offset {at}")]
    BadNumber { text: String, at: usize },
    #[error("expected {wanted} at offset {at}")]
    Expected { wanted: &'static str, at: usize },
    #[error("unexpected end of expression")]
    Eof,
    #[error("trailing input at offset {at}")]
    Trailing { at: usize },
}

/// Parse one expression. Grammar, lowest precedence first:
///
/// ```text
/// expr    := and ( "||" and )*
/// and     := unary ( "&&" unary )*
/// unary   := "!"? primary
/// primary := call | "(" expr ")"
/// call    := Ident "(" [ arg ( "," arg )* ] ")"
/// arg     := string | number | true | false | bare-word
/// ```
pub fn parse(input: &str) -> Result<Expr, Error> {
    let tokens = lex(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    match parser.peek() {
        Some(tok) => Err(Error::Trailing { at: tok.at }),
        None => Ok(expr),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Ident(String),
    Str(String),
    Number(String),
    LParen,
    RParen,
    Comma,
    AndAnd,
    OrOr,
    Bang,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: Kind,
    at: usize,
}

fn lex(input: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let at = i;
        match ch {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token { kind: Kind::LParen, at });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: Kind::RParen, at });
                i += 1;
            }
            ',' => {
                tokens.push(Token { kind: Kind::Comma, at });
                i += 1;
            }
            '!' => {
                tokens.push(Token { kind: Kind::Bang, at });
                i += 1;
            }
            '&' if chars.get(i + 1) == Some(&'&') => {
                tokens.push(Token { kind: Kind::AndAnd, at });
                i += 2;
            }
            '|' if chars.get(i + 1) == Some(&'|') => {
                tokens.push(Token { kind: Kind::OrOr, at });
                i += 2;
            }
            '"' | '\'' => {
                let quote = ch;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(Error::UnterminatedString { at }),
                        Some(&c) if c == quote => {
                            i += 1;
                            break;
                        }
                        Some(&'\\') => {
                            i += 1;
                            match chars.get(i) {
                                None => return Err(Error::UnterminatedString { at }),
                                Some(&'n') => text.push('\n'),
                                Some(&'t') => text.push('\t'),
                                Some(&'r') => text.push('\r'),
                                Some(&c) => text.push(c),
                            }
                            i += 1;
                        }
                        Some(&c) => {
                            text.push(c);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token {
                    kind: Kind::Str(text),
                    at,
                });
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                text.push(c);
                i += 1;
                while let Some(&c) = chars.get(i) {
                    if c.is_ascii_digit() || c == '.' {
                        text.push(c);
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: Kind::Number(text),
                    at,
                });
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut text = String::new();
                text.push(c);
                i += 1;
                while let Some(&c) = chars.get(i) {
                    if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                        text.push(c);
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: Kind::Ident(text),
                    at,
                });
            }
            // Comparison operators travel as quoted strings; anything
            // else is an author error surfaced with its position.
            c => return Err(Error::Unexpected { ch: c, at }),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: Kind, wanted: &'static str) -> Result<(), Error> {
        match self.next() {
            Some(tok) if tok.kind == kind => Ok(()),
            Some(tok) => Err(Error::Expected { wanted, at: tok.at }),
            None => Err(Error::Eof),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.and_expr()?;
        while matches!(self.peek(), Some(tok) if tok.kind == Kind::OrOr) {
            self.next();
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.unary()?;
        while matches!(self.peek(), Some(tok) if tok.kind == Kind::AndAnd) {
            self.next();
            let rhs = self.unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, Error> {
        if matches!(self.peek(), Some(tok) if tok.kind == Kind::Bang) {
            self.next();
            let inner = self.unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, Error> {
        match self.next() {
            Some(Token {
                kind: Kind::LParen, ..
            }) => {
                let expr = self.or_expr()?;
                self.expect(Kind::RParen, "')'")?;
                Ok(expr)
            }
            Some(Token {
                kind: Kind::Ident(name),
                ..
            }) => {
                self.expect(Kind::LParen, "'('")?;
                let mut args = Vec::new();
                if matches!(self.peek(), Some(tok) if tok.kind == Kind::RParen) {
                    self.next();
                    return Ok(Expr::Call { name, args });
                }
                loop {
                    args.push(self.arg()?);
                    match self.next() {
                        Some(Token {
                            kind: Kind::Comma, ..
                        }) => continue,
                        Some(Token {
                            kind: Kind::RParen, ..
                        }) => break,
                        Some(tok) => {
                            return Err(Error::Expected {
                                wanted: "',' or ')'",
                                at: tok.at,
                            })
                        }
                        None => return Err(Error::Eof),
                    }
                }
                Ok(Expr::Call { name, args })
            }
            Some(tok) => Err(Error::Expected {
                wanted: "a call or '('",
                at: tok.at,
            }),
            None => Err(Error::Eof),
        }
    }

    fn arg(&mut self) -> Result<Arg, Error> {
        match self.next() {
            Some(Token {
                kind: Kind::Str(s), ..
            }) => Ok(Arg::Str(s)),
            Some(Token {
                kind: Kind::Number(text),
                at,
            }) => {
                if text.contains('.') {
                    text.parse::<f64>()
                        .map(Arg::Float)
                        .map_err(|_| Error::BadNumber { text, at })
                } else {
                    text.parse::<i64>()
                        .map(Arg::Int)
                        .map_err(|_| Error::BadNumber { text, at })
                }
            }
            Some(Token {
                kind: Kind::Ident(word),
                ..
            }) => Ok(match word.as_str() {
                "true" => Arg::Bool(true),
                "false" => Arg::Bool(false),
                _ => Arg::Str(word),
            }),
            Some(tok) => Err(Error::Expected {
                wanted: "an argument",
                at: tok.at,
            }),
            None => Err(Error::Eof),
        }
    }
}

#[cfg(test)]
mod test {
    use super::parse;
    use crate::{Arg, Expr};

    fn call(name: &str, args: Vec<Arg>) -> Expr {
        Expr::Call {
            name: name.to_string(),
            args,
        }
    }

    #[test]
    fn single_calls() {
        assert_eq!(
            parse("StatusCode(200)").unwrap(),
            call("StatusCode", vec![Arg::Int(200)]),
        );
        assert_eq!(
            parse(r#"ContentContains("root:")"#).unwrap(),
            call("ContentContains", vec![Arg::Str("root:".to_string())]),
        );
        assert_eq!(
            parse(r#"ResponseSize(">", 1000)"#).unwrap(),
            call(
                "ResponseSize",
                vec![Arg::Str(">".to_string()), Arg::Int(1000)]
            ),
        );
        assert_eq!(parse("Timestamp()").unwrap(), call("Timestamp", vec![]));
    }

    #[test]
    fn bare_words_and_booleans() {
        assert_eq!(
            parse("Identity(payload)").unwrap(),
            call("Identity", vec![Arg::Str("payload".to_string())]),
        );
        assert_eq!(
            parse("Flag(true, false)").unwrap(),
            call("Flag", vec![Arg::Bool(true), Arg::Bool(false)]),
        );
    }

    #[test]
    fn combinators_short_circuit_left_to_right() {
        let expr = parse(r#"A(1) && !B("x") || C()"#).unwrap();
        // Precedence: (A(1) && !B("x")) || C()
        let mut calls = Vec::new();
        let matched = expr.eval(&mut |name, _| {
            calls.push(name.to_string());
            name == "C"
        });
        assert!(matched);
        assert_eq!(calls, vec!["A", "B", "C"]);

        let mut calls = Vec::new();
        let expr = parse("A(1) && B(2)").unwrap();
        assert!(!expr.eval(&mut |name, _| {
            calls.push(name.to_string());
            false
        }));
        assert_eq!(calls, vec!["A"]);
    }

    #[test]
    fn string_escapes_and_quotes() {
        assert_eq!(
            parse(r#"F("a\"b", 'c\'d')"#).unwrap(),
            call(
                "F",
                vec![Arg::Str(r#"a"b"#.to_string()), Arg::Str("c'd".to_string())]
            ),
        );
    }

    #[test]
    fn negative_and_float_numbers() {
        assert_eq!(
            parse("F(-3, 0.5)").unwrap(),
            call("F", vec![Arg::Int(-3), Arg::Float(0.5)]),
        );
    }

    #[test]
    fn malformed_expressions_error_without_panic() {
        assert!(parse("").is_err());
        assert!(parse("StatusCode(200").is_err());
        assert!(parse("200()").is_err());
        assert!(parse(r#"F("unterminated)"#).is_err());
        assert!(parse("A(1) garbage").is_err());
    }
}
