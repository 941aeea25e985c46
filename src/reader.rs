//! Reader for playground call lines.
//!
//! A call line is a function name followed by literal arguments:
//!
//! ```text
//! add 1 2
//! concat "a" "b" "c"
//! len [1 2.5 "x" true nil]
//! ```
//!
//! Commas count as whitespace inside lists, strings use the usual escape
//! sequences.

use logos::Logos;

use crate::error::Error;
use crate::value::Value;

/// Unescapes a string literal body by converting escape sequences to their
/// actual characters. Unknown escapes keep the backslash and character.
fn unescape_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('"') => result.push('"'),
                Some('\\') => result.push('\\'),
                Some('0') => result.push('\0'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }

    result
}

//===----------------------------------------------------------------------===//
// Token
//===----------------------------------------------------------------------===//

#[derive(Logos, Debug, PartialEq, Clone)]
enum Token {
    // Whitespace and commas are both separators.
    #[regex(r"[ \t\r\n,]+", logos::skip)]
    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let slice = lex.slice();
        unescape_string(&slice[1..slice.len() - 1])
    })]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_-]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(input);
    while let Some(token) = lexer.next() {
        match token {
            Ok(t) => tokens.push(t),
            Err(()) => {
                return Err(Error::Syntax {
                    message: format!("unexpected input \"{}\"", lexer.slice()),
                });
            }
        }
    }
    Ok(tokens)
}

//===----------------------------------------------------------------------===//
// Parsing
//===----------------------------------------------------------------------===//

/// Reads a call line into the function name and its argument values.
pub fn read_call(input: &str) -> Result<(String, Vec<Value>), Error> {
    let tokens = tokenize(input)?;
    let mut pos = 0;

    let name = match tokens.first() {
        Some(Token::Ident(name)) => name.clone(),
        Some(other) => {
            return Err(Error::Syntax {
                message: format!("expected a function name, found {:?}", other),
            });
        }
        None => {
            return Err(Error::Syntax {
                message: "expected a function name".to_string(),
            });
        }
    };
    pos += 1;

    let mut args = Vec::new();
    while pos < tokens.len() {
        args.push(parse_value(&tokens, &mut pos)?);
    }

    Ok((name, args))
}

fn parse_value(tokens: &[Token], pos: &mut usize) -> Result<Value, Error> {
    let token = tokens.get(*pos).ok_or_else(|| Error::Syntax {
        message: "unexpected end of input".to_string(),
    })?;
    *pos += 1;

    match token {
        Token::Int(n) => Ok(Value::Int(*n)),
        Token::Float(x) => Ok(Value::Float(*x)),
        Token::Str(s) => Ok(Value::String(s.clone())),
        Token::Ident(word) => match word.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "nil" => Ok(Value::Nil),
            other => Err(Error::Syntax {
                message: format!("unknown literal \"{}\"", other),
            }),
        },
        Token::LBracket => {
            let mut items = Vec::new();
            loop {
                match tokens.get(*pos) {
                    Some(Token::RBracket) => {
                        *pos += 1;
                        return Ok(Value::List(items));
                    }
                    Some(_) => items.push(parse_value(tokens, pos)?),
                    None => {
                        return Err(Error::Syntax {
                            message: "unterminated list".to_string(),
                        });
                    }
                }
            }
        }
        Token::RBracket => Err(Error::Syntax {
            message: "unexpected ']'".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_scalars() {
        let (name, args) = read_call("add 1 -2.5 \"hi\" true nil").unwrap();
        assert_eq!(name, "add");
        assert_eq!(
            args,
            vec![
                Value::Int(1),
                Value::Float(-2.5),
                Value::String("hi".into()),
                Value::Bool(true),
                Value::Nil,
            ]
        );
    }

    #[test]
    fn reads_nested_lists_with_commas() {
        let (_, args) = read_call("f [1, 2, [3 4]]").unwrap();
        assert_eq!(args, vec![crate::list![1, 2, crate::list![3, 4]]]);
    }

    #[test]
    fn unescapes_strings() {
        let (_, args) = read_call(r#"f "a\nb\"c""#).unwrap();
        assert_eq!(args, vec![Value::String("a\nb\"c".into())]);
    }

    #[test]
    fn rejects_missing_name_and_bad_literals() {
        assert!(matches!(read_call(""), Err(Error::Syntax { .. })));
        assert!(matches!(read_call("42"), Err(Error::Syntax { .. })));
        assert!(matches!(read_call("f oops"), Err(Error::Syntax { .. })));
        assert!(matches!(read_call("f [1 2"), Err(Error::Syntax { .. })));
    }
}
