//! Runtime multiple dispatch for dynamically typed function calls.
//!
//! `morphic` compiles a map of textual signatures (`"int, int"`,
//! `"string|list"`, `"...float"`) into a single callable that routes each
//! call to the right implementation based on the runtime types of its
//! arguments, applying declared conversions when no exact overload matches,
//! and reporting structured errors when nothing does.
//!
//! ```
//! use morphic::{Engine, Handler, Value, Error};
//!
//! let engine = Engine::new();
//! let add = engine
//!     .function("add", vec![
//!         ("int, int", Handler::new(|args| match args {
//!             [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
//!             _ => Err(Error::Runtime("expected ints".to_string())),
//!         })),
//!         ("string, string", Handler::new(|args| match args {
//!             [Value::String(a), Value::String(b)] => {
//!                 Ok(Value::String(format!("{}{}", a, b)))
//!             }
//!             _ => Err(Error::Runtime("expected strings".to_string())),
//!         })),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(add.call(&[Value::Int(1), Value::Int(2)]).unwrap(), Value::Int(3));
//! assert!(add.call(&[Value::Bool(true)]).is_err());
//! ```
//!
//! Dispatch order is deterministic: signatures are sorted by the registry
//! specificity of their types, exact matches always beat conversions, and
//! rest-param catch-alls come last. An [`Engine`] owns its type and
//! conversion registries; the crate-level free functions ([`function`],
//! [`add_type`], ...) operate on a process-wide default engine.

pub mod convert;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod reader;
pub mod repl;
pub mod signature;
pub mod types;
pub mod value;

mod compiler;
mod mismatch;

pub use convert::{Conversion, ConvertFn};
pub use dispatcher::{Handler, TypedFn};
pub use engine::{
    add_conversion, add_type, convert as convert_value, function, function_anon,
    ignore_type, merge, Engine, DEFAULT_FAST_PATH_LIMIT,
};
pub use error::{DispatchError, Error};
pub use signature::{Param, Signature};
pub use types::{Type, TypeTable, TypeTest, ANY, OBJECT};
pub use value::Value;
