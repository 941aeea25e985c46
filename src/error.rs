use std::fmt;

use itertools::Itertools;

//===----------------------------------------------------------------------===//
// Error
//===----------------------------------------------------------------------===//

/// Errors raised while building a typed function or managing registries.
///
/// Call-time failures are wrapped in [`Error::Dispatch`] and carry the
/// structured payload of a [`DispatchError`].
#[derive(Debug, Clone)]
pub enum Error {
    /// Malformed signature string (misplaced rest marker, stray token, ...).
    Syntax { message: String },
    /// A signature references a type name missing from the registry.
    UnknownType { name: String, suggestion: Option<String> },
    /// No registered predicate matched a value during classification.
    UnknownValueType,
    /// The signatures map was empty, or every signature was filtered away.
    NoSignatures,
    /// Two different implementations bound to the same canonical signature.
    DuplicateSignature { signature: String },
    /// A merge input carries no signature metadata.
    NotTyped,
    /// Merge inputs disagree on the function name.
    NameMismatch { expected: String, actual: String },
    /// Malformed type or conversion registration.
    InvalidArgument { message: String },
    /// Exact signature lookup failed.
    NotFound { signature: String },
    /// No registered conversion covers the requested pair.
    NoConversion { from: String, to: String },
    /// No signature matched the runtime argument types.
    Dispatch(DispatchError),
    /// Failure raised from inside a user implementation.
    Runtime(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Syntax { message } => {
                write!(f, "Syntax error in signature: {}", message)
            }
            Error::UnknownType { name, suggestion } => {
                write!(f, "Unknown type \"{}\"", name)?;
                if let Some(hint) = suggestion {
                    write!(f, ". Did you mean \"{}\"?", hint)?;
                }
                Ok(())
            }
            Error::UnknownValueType => write!(f, "Value has unknown type"),
            Error::NoSignatures => write!(f, "No signatures provided"),
            Error::DuplicateSignature { signature } => {
                write!(f, "Signature \"{}\" is defined twice", signature)
            }
            Error::NotTyped => write!(f, "Function is not typed"),
            Error::NameMismatch { expected, actual } => {
                write!(
                    f,
                    "Function names do not match (expected: {}, actual: {})",
                    expected, actual
                )
            }
            Error::InvalidArgument { message } => {
                write!(f, "Invalid argument: {}", message)
            }
            Error::NotFound { signature } => {
                write!(f, "Signature not found ({})", signature)
            }
            Error::NoConversion { from, to } => {
                write!(f, "Cannot convert {} to {}", from, to)
            }
            Error::Dispatch(e) => write!(f, "{}", e),
            Error::Runtime(e) => write!(f, "Runtime error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

//===----------------------------------------------------------------------===//
// DispatchError
//===----------------------------------------------------------------------===//

/// A structured description of why a call matched no signature.
///
/// Every variant names the function and carries enough data for a caller to
/// react programmatically, mirroring what the message renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// An argument had a type no viable signature accepts at its position.
    WrongType {
        fn_name: String,
        index: usize,
        actual: String,
        expected: Vec<String>,
    },
    /// The call supplied fewer arguments than any viable signature takes.
    TooFewArgs { fn_name: String, index: usize, expected: Vec<String> },
    /// The call supplied more arguments than any viable signature takes.
    TooManyArgs { fn_name: String, actual: usize, expected_len: usize },
    /// Positional narrowing succeeded but no full predicate matched.
    Mismatch { fn_name: String, actual: Vec<String> },
}

impl DispatchError {
    /// Stable category tag (`wrongType`, `tooFewArgs`, `tooManyArgs`,
    /// `mismatch`).
    pub fn category(&self) -> &'static str {
        match self {
            DispatchError::WrongType { .. } => "wrongType",
            DispatchError::TooFewArgs { .. } => "tooFewArgs",
            DispatchError::TooManyArgs { .. } => "tooManyArgs",
            DispatchError::Mismatch { .. } => "mismatch",
        }
    }

    /// The name of the function the call was dispatched on.
    pub fn fn_name(&self) -> &str {
        match self {
            DispatchError::WrongType { fn_name, .. }
            | DispatchError::TooFewArgs { fn_name, .. }
            | DispatchError::TooManyArgs { fn_name, .. }
            | DispatchError::Mismatch { fn_name, .. } => fn_name,
        }
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "unnamed" } else { name }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DispatchError::WrongType { fn_name, index, actual, expected } => {
                write!(
                    f,
                    "Unexpected type of argument in function {} \
                     (expected: {}, actual: {}, index: {})",
                    display_name(fn_name),
                    expected.iter().join(" or "),
                    actual,
                    index
                )
            }
            DispatchError::TooFewArgs { fn_name, index, expected } => {
                write!(
                    f,
                    "Too few arguments in function {} (expected: {}, index: {})",
                    display_name(fn_name),
                    expected.iter().join(" or "),
                    index
                )
            }
            DispatchError::TooManyArgs { fn_name, actual, expected_len } => {
                write!(
                    f,
                    "Too many arguments in function {} (expected: {}, actual: {})",
                    display_name(fn_name),
                    expected_len,
                    actual
                )
            }
            DispatchError::Mismatch { fn_name, actual } => {
                write!(
                    f,
                    "Arguments of type ({}) do not match any signature of function {}",
                    actual.iter().join(", "),
                    display_name(fn_name)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_type_message_lists_expected_union() {
        let err = DispatchError::WrongType {
            fn_name: "add".to_string(),
            index: 0,
            actual: "boolean".to_string(),
            expected: vec!["int".to_string(), "string".to_string()],
        };
        assert_eq!(err.category(), "wrongType");
        assert_eq!(
            err.to_string(),
            "Unexpected type of argument in function add \
             (expected: int or string, actual: boolean, index: 0)"
        );
    }

    #[test]
    fn unnamed_functions_render_as_unnamed() {
        let err = DispatchError::TooManyArgs {
            fn_name: String::new(),
            actual: 3,
            expected_len: 2,
        };
        assert!(err.to_string().contains("function unnamed"));
    }

    #[test]
    fn unknown_type_hint_is_optional() {
        let bare = Error::UnknownType { name: "Number".to_string(), suggestion: None };
        assert_eq!(bare.to_string(), "Unknown type \"Number\"");

        let hinted = Error::UnknownType {
            name: "Number".to_string(),
            suggestion: Some("number".to_string()),
        };
        assert_eq!(
            hinted.to_string(),
            "Unknown type \"Number\". Did you mean \"number\"?"
        );
    }
}
