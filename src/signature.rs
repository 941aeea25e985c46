use logos::Logos;
use std::fmt;

use crate::error::Error;
use crate::types::ANY;

//===----------------------------------------------------------------------===//
// Token
//
// Uses the logos crate to tokenize signature strings. Whitespace around
// commas and pipes is insignificant and skipped by the lexer.
//===----------------------------------------------------------------------===//

#[derive(Logos, Debug, PartialEq, Clone)]
enum Token {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    #[token(",")]
    Comma,

    #[token("|")]
    Pipe,

    #[token("...")]
    Ellipsis,

    // Anything the registry could accept as a type name: no separators,
    // no whitespace, no dots.
    #[regex(r"[^,|.\s]+", |lex| lex.slice().to_string())]
    Name(String),
}

//===----------------------------------------------------------------------===//
// Param
//===----------------------------------------------------------------------===//

/// One position of a signature: the union of type names it accepts.
///
/// The list is duplicate-free and preserves the order the names were
/// written in, which is also the order used by canonical stringification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub types: Vec<String>,
}

impl Param {
    pub fn new(types: Vec<String>) -> Self {
        Self { types }
    }

    pub fn has(&self, name: &str) -> bool {
        self.types.iter().any(|t| t == name)
    }

    pub fn has_any(&self) -> bool {
        self.has(ANY)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.types.join("|"))
    }
}

//===----------------------------------------------------------------------===//
// Signature
//===----------------------------------------------------------------------===//

/// The declared input shape of one overload: an ordered list of parameter
/// type unions plus a rest flag.
///
/// With `rest_param` set, the last param applies to every trailing argument
/// and the signature accepts `params.len() - 1` or more arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub rest_param: bool,
}

impl Signature {
    /// Parses a textual signature such as `"int, int|string, ...list"`.
    /// The empty string parses to the zero-arity signature.
    ///
    /// # Errors
    ///
    /// Returns `Syntax` on a rest marker before the last param, an empty
    /// param, or any character the grammar does not know.
    pub fn parse(input: &str) -> Result<Signature, Error> {
        let mut tokens = Vec::new();
        let mut lexer = Token::lexer(input);
        while let Some(token) = lexer.next() {
            match token {
                Ok(t) => tokens.push(t),
                Err(()) => {
                    return Err(Error::Syntax {
                        message: format!(
                            "unexpected character \"{}\" in \"{}\"",
                            lexer.slice(),
                            input
                        ),
                    });
                }
            }
        }

        if tokens.is_empty() {
            return Ok(Signature { params: Vec::new(), rest_param: false });
        }

        let groups: Vec<&[Token]> = tokens.split(|t| *t == Token::Comma).collect();
        let last = groups.len() - 1;

        let mut params = Vec::with_capacity(groups.len());
        let mut rest_param = false;
        for (index, group) in groups.iter().enumerate() {
            let (types, rest) = parse_param(group, input)?;
            if rest {
                if index != last {
                    return Err(Error::Syntax {
                        message: format!(
                            "rest parameter must be last in \"{}\"",
                            input
                        ),
                    });
                }
                rest_param = true;
            }
            params.push(Param::new(types));
        }

        Ok(Signature { params, rest_param })
    }

    /// The param covering argument position `index`: the positional param
    /// when in range, the rest param for trailing positions, `None` past the
    /// end of a fixed-arity signature.
    pub fn param_at(&self, index: usize) -> Option<&Param> {
        if index < self.params.len() {
            self.params.get(index)
        } else if self.rest_param {
            self.params.last()
        } else {
            None
        }
    }

    /// Fewest arguments the signature accepts.
    pub fn min_arity(&self) -> usize {
        if self.rest_param { self.params.len() - 1 } else { self.params.len() }
    }
}

/// Canonical stringification: params rendered as `types.join("|")`, joined
/// by `,`, rest param prefixed with `...`. Used as the key in a typed
/// function's `signatures` map.
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let last = self.params.len().wrapping_sub(1);
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            if self.rest_param && index == last {
                write!(f, "...")?;
            }
            write!(f, "{}", param)?;
        }
        Ok(())
    }
}

/// Parses one comma-separated group into its type union and rest flag.
/// Dangling pipes are tolerated (empty union segments are dropped); a fully
/// empty param is not.
fn parse_param(group: &[Token], input: &str) -> Result<(Vec<String>, bool), Error> {
    let mut rest = false;
    let mut names: Vec<String> = Vec::new();
    let mut expect_name = true;

    for (index, token) in group.iter().enumerate() {
        match token {
            Token::Ellipsis => {
                if index != 0 {
                    return Err(Error::Syntax {
                        message: format!(
                            "\"...\" must prefix its parameter in \"{}\"",
                            input
                        ),
                    });
                }
                rest = true;
            }
            Token::Name(name) => {
                if !expect_name {
                    return Err(Error::Syntax {
                        message: format!(
                            "expected '|' or ',' before \"{}\" in \"{}\"",
                            name, input
                        ),
                    });
                }
                expect_name = false;
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
            Token::Pipe => expect_name = true,
            Token::Comma => unreachable!("groups are split on commas"),
        }
    }

    if names.is_empty() {
        if rest {
            // A bare "..." defaults to any.
            names.push(ANY.to_string());
        } else {
            return Err(Error::Syntax {
                message: format!("empty parameter in \"{}\"", input),
            });
        }
    }

    Ok((names, rest))
}
