use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::value::Value;

/// Predicate deciding whether a value belongs to a named type.
pub type TypeTest = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Reserved catch-all type name. Its predicate accepts every value and it
/// sorts after every other type when signatures are ordered.
pub const ANY: &str = "any";

/// Reserved structured-value type name. Sorts just before [`ANY`] regardless
/// of its registry position.
pub const OBJECT: &str = "object";

//===----------------------------------------------------------------------===//
// Type
//===----------------------------------------------------------------------===//

/// A named type predicate. Identity is the name; the position in the
/// registry decides specificity (lower index = more specific).
#[derive(Clone)]
pub struct Type {
    pub name: String,
    pub test: TypeTest,
}

impl Type {
    pub fn new(
        name: &str,
        test: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self { name: name.to_string(), test: Arc::new(test) }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type").field("name", &self.name).finish()
    }
}

//===----------------------------------------------------------------------===//
// TypeTable
//===----------------------------------------------------------------------===//

/// Ordered registry of type predicates plus the set of ignored type names.
///
/// Append-only: types are never removed, and a duplicate name may be
/// appended but the first registration wins on lookup.
#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<Type>,
    ignore: Vec<String>,
}

impl TypeTable {
    /// An empty table, for engines with a fully custom type universe.
    pub fn new() -> Self {
        Self { types: Vec::new(), ignore: Vec::new() }
    }

    /// The built-in table. Classification walks this order, so it is part of
    /// the public contract: `nil`, `boolean`, `int`, `float`, `string`,
    /// `list`, `object`, `any`.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        let builtins = [
            Type::new("nil", |v| matches!(v, Value::Nil)),
            Type::new("boolean", |v| matches!(v, Value::Bool(_))),
            Type::new("int", |v| matches!(v, Value::Int(_))),
            Type::new("float", |v| matches!(v, Value::Float(_))),
            Type::new("string", |v| matches!(v, Value::String(_))),
            Type::new("list", |v| matches!(v, Value::List(_))),
            Type::new(OBJECT, |v| matches!(v, Value::Object(_))),
            Type::new(ANY, |_| true),
        ];
        for ty in builtins {
            table.types.push(ty);
        }
        table
    }

    /// Appends a type. The name must be usable inside a signature string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the name is empty or contains
    /// signature syntax (`,`, `|`, `.`, whitespace).
    pub fn add(&mut self, ty: Type) -> Result<(), Error> {
        validate_name(&ty.name)?;
        self.types.push(ty);
        Ok(())
    }

    /// Marks a type name as ignored: the normalizer strips it from params.
    pub fn ignore(&mut self, name: &str) {
        if !self.is_ignored(name) {
            self.ignore.push(name.to_string());
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered names in registry order (duplicates included).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.name.as_str())
    }

    /// Returns the predicate registered first under `name`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType`, with a case-insensitive did-you-mean hint
    /// drawn from the registered names.
    pub fn find_test(&self, name: &str) -> Result<TypeTest, Error> {
        match self.types.iter().find(|t| t.name == name) {
            Some(ty) => Ok(ty.test.clone()),
            None => Err(Error::UnknownType {
                name: name.to_string(),
                suggestion: self.suggest(name),
            }),
        }
    }

    /// Classifies a value: the first predicate matching in registry order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownValueType` when nothing matches. Unreachable on
    /// tables that register `any`.
    pub fn find_type(&self, value: &Value) -> Result<&str, Error> {
        self.types
            .iter()
            .find(|t| (t.test)(value))
            .map(|t| t.name.as_str())
            .ok_or(Error::UnknownValueType)
    }

    /// Classification that never fails, for mismatch reporting.
    pub fn type_name_or_unknown(&self, value: &Value) -> String {
        match self.find_type(value) {
            Ok(name) => name.to_string(),
            Err(_) => "unknown".to_string(),
        }
    }

    /// Position of `name` in the specificity order used for sorting
    /// signatures. `object` and `any` take the two conceptual slots past the
    /// end of the table; everything else uses its first registry index.
    pub fn specificity_index(&self, name: &str) -> usize {
        if name == OBJECT {
            return self.types.len();
        }
        if name == ANY {
            return self.types.len() + 1;
        }
        match self.types.iter().position(|t| t.name == name) {
            Some(index) => index,
            None => self.types.len() + 2,
        }
    }

    fn suggest(&self, name: &str) -> Option<String> {
        self.types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .map(|t| t.name.clone())
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidArgument {
            message: "type name must not be empty".to_string(),
        });
    }
    if name.chars().any(|c| c == ',' || c == '|' || c == '.' || c.is_whitespace()) {
        return Err(Error::InvalidArgument {
            message: format!(
                "type name \"{}\" must not contain ',', '|', '.' or whitespace",
                name
            ),
        });
    }
    Ok(())
}
