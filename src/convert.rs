use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::types::TypeTable;
use crate::value::Value;

/// Function applied to turn a value of the `from` type into the `to` type.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A declared conversion between two registered types.
///
/// Conversions are applied exactly as written; the engine computes no
/// transitive closure.
#[derive(Clone)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub convert: ConvertFn,
}

impl Conversion {
    pub fn new(
        from: &str,
        to: &str,
        convert: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            convert: Arc::new(convert),
        }
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

//===----------------------------------------------------------------------===//
// ConversionTable
//===----------------------------------------------------------------------===//

/// Append-only registry of conversions. Declared priority is insertion
/// order: the first applicable conversion wins.
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    conversions: Vec<Conversion>,
}

impl ConversionTable {
    pub fn new() -> Self {
        Self { conversions: Vec::new() }
    }

    /// Appends a conversion between two known, distinct type names.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` (with a did-you-mean hint) when `from` or `to`
    /// is not registered, and `InvalidArgument` when they are equal.
    pub fn add(&mut self, conv: Conversion, types: &TypeTable) -> Result<(), Error> {
        if conv.from == conv.to {
            return Err(Error::InvalidArgument {
                message: format!(
                    "conversion from \"{}\" to itself is not allowed",
                    conv.from
                ),
            });
        }
        types.find_test(&conv.from)?;
        types.find_test(&conv.to)?;
        self.conversions.push(conv);
        Ok(())
    }

    /// Registered conversions in insertion order.
    pub fn all(&self) -> &[Conversion] {
        &self.conversions
    }

    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }

    /// Converts `value` to the `target` type.
    ///
    /// A value already of the target type is returned unchanged; otherwise
    /// the first conversion declared for `(actual, target)` is applied.
    ///
    /// # Errors
    ///
    /// Returns `NoConversion` when no declared conversion covers the pair.
    pub fn convert(
        &self,
        value: &Value,
        target: &str,
        types: &TypeTable,
    ) -> Result<Value, Error> {
        let actual = types.find_type(value)?;
        if actual == target {
            return Ok(value.clone());
        }
        match self
            .conversions
            .iter()
            .find(|c| c.from == actual && c.to == target)
        {
            Some(conv) => Ok((conv.convert)(value)),
            None => Err(Error::NoConversion {
                from: actual.to_string(),
                to: target.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_bool_to_int() -> (TypeTable, ConversionTable) {
        let types = TypeTable::builtin();
        let mut conversions = ConversionTable::new();
        conversions
            .add(
                Conversion::new("boolean", "int", |v| match v {
                    Value::Bool(b) => Value::Int(if *b { 1 } else { 0 }),
                    other => other.clone(),
                }),
                &types,
            )
            .unwrap();
        (types, conversions)
    }

    #[test]
    fn convert_applies_declared_conversion() {
        let (types, conversions) = table_with_bool_to_int();
        let out = conversions.convert(&Value::Bool(true), "int", &types).unwrap();
        assert_eq!(out, Value::Int(1));
    }

    #[test]
    fn convert_is_identity_on_target_type() {
        let (types, conversions) = table_with_bool_to_int();
        let out = conversions.convert(&Value::Int(7), "int", &types).unwrap();
        assert_eq!(out, Value::Int(7));
    }

    #[test]
    fn convert_without_declaration_fails() {
        let (types, conversions) = table_with_bool_to_int();
        match conversions.convert(&Value::String("x".into()), "int", &types) {
            Err(Error::NoConversion { from, to }) => {
                assert_eq!(from, "string");
                assert_eq!(to, "int");
            }
            other => panic!("Expected NoConversion, got {:?}", other),
        }
    }

    #[test]
    fn add_rejects_unknown_and_self_pairs() {
        let types = TypeTable::builtin();
        let mut conversions = ConversionTable::new();

        match conversions.add(Conversion::new("bool", "int", |v| v.clone()), &types) {
            Err(Error::UnknownType { name, suggestion: _ }) => assert_eq!(name, "bool"),
            other => panic!("Expected UnknownType, got {:?}", other),
        }
        match conversions.add(Conversion::new("int", "int", |v| v.clone()), &types) {
            Err(Error::InvalidArgument { .. }) => {}
            other => panic!("Expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn first_declared_conversion_wins() {
        let types = TypeTable::builtin();
        let mut conversions = ConversionTable::new();
        conversions
            .add(Conversion::new("boolean", "int", |_| Value::Int(1)), &types)
            .unwrap();
        conversions
            .add(Conversion::new("boolean", "int", |_| Value::Int(99)), &types)
            .unwrap();

        let out = conversions.convert(&Value::Bool(false), "int", &types).unwrap();
        assert_eq!(out, Value::Int(1));
    }
}
