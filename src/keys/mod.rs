//! Cache key derivation.
//!
//! A [`KeyGenerator`] turns an [`OperationCall`] into the pair of keys the
//! interceptor needs: the operation key, naming the namespace, and the
//! argument key, naming the slot inside it.

pub mod encoding;

use std::hash::{DefaultHasher, Hash, Hasher};

use serde_json::{Map, Value};

use crate::Result;
use crate::types::{CacheArgument, OperationCall};

/// Strategy for deriving cache keys from a call.
///
/// Implementations must be deterministic: equal calls yield byte-identical
/// keys for the lifetime of the process.
pub trait KeyGenerator: Send + Sync {
    /// Key of the namespace holding results of this operation.
    fn operation_key(&self, call: &OperationCall<'_>) -> String;

    /// Key of one argument list within its namespace.
    ///
    /// `None` for an empty argument list: every zero-argument invocation of
    /// an operation shares one slot.
    fn argument_key(&self, arguments: &[&dyn CacheArgument]) -> Result<Option<String>>;
}

/// Canonical, collision-free key generation.
///
/// - operation key: the call's signature, verbatim, so overloads differing
///   only in a declared parameter type never share a namespace.
/// - argument key: the tagged encoding of each argument, wrapped with its
///   type name. One argument is rendered on its own, two or more as an
///   ordered array.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyGenerator;

impl DefaultKeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl KeyGenerator for DefaultKeyGenerator {
    fn operation_key(&self, call: &OperationCall<'_>) -> String {
        call.signature().to_string()
    }

    fn argument_key(&self, arguments: &[&dyn CacheArgument]) -> Result<Option<String>> {
        let key = match arguments {
            [] => return Ok(None),
            [single] => serde_json::to_string(&typed(*single)?)?,
            many => {
                let encoded = many
                    .iter()
                    .map(|argument| typed(*argument))
                    .collect::<Result<Vec<_>>>()?;
                serde_json::to_string(&Value::Array(encoded))?
            }
        };
        Ok(Some(key))
    }
}

fn typed(argument: &dyn CacheArgument) -> Result<Value> {
    let mut object = Map::new();
    object.insert(argument.type_name().to_string(), argument.encode()?);
    Ok(Value::Object(object))
}

/// Short keys at the cost of guaranteed uniqueness.
///
/// Argument keys are a 64-bit hash of the canonical key, rendered as 16 hex
/// digits; operation keys stay verbatim. Two argument lists may collide, in
/// which case they share a slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedKeyGenerator {
    inner: DefaultKeyGenerator,
}

impl HashedKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyGenerator for HashedKeyGenerator {
    fn operation_key(&self, call: &OperationCall<'_>) -> String {
        self.inner.operation_key(call)
    }

    fn argument_key(&self, arguments: &[&dyn CacheArgument]) -> Result<Option<String>> {
        Ok(self.inner.argument_key(arguments)?.map(|canonical| {
            let mut hasher = DefaultHasher::new();
            canonical.hash(&mut hasher);
            format!("{:016x}", hasher.finish())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_yield_no_key() {
        assert_eq!(DefaultKeyGenerator.argument_key(&[]).unwrap(), None);
        assert_eq!(HashedKeyGenerator::new().argument_key(&[]).unwrap(), None);
    }

    #[test]
    fn single_argument_is_not_wrapped_in_an_array() {
        let key = DefaultKeyGenerator.argument_key(&[&5i32]).unwrap().unwrap();
        assert_eq!(key, r#"{"i32":5}"#);
    }

    #[test]
    fn multiple_arguments_are_an_ordered_array() {
        let key = DefaultKeyGenerator
            .argument_key(&[&1u8, &"a"])
            .unwrap()
            .unwrap();
        assert_eq!(key, r#"[{"u8":1},{"&str":"a"}]"#);

        let swapped = DefaultKeyGenerator
            .argument_key(&[&"a", &1u8])
            .unwrap()
            .unwrap();
        assert_ne!(key, swapped);
    }

    #[test]
    fn runtime_type_is_part_of_the_key() {
        let signed = DefaultKeyGenerator.argument_key(&[&1i64]).unwrap();
        let unsigned = DefaultKeyGenerator.argument_key(&[&1u64]).unwrap();
        assert_ne!(signed, unsigned);
    }

    #[test]
    fn hashed_keys_are_short_and_stable() {
        let generator = HashedKeyGenerator::new();
        let first = generator.argument_key(&[&"some long argument"]).unwrap().unwrap();
        let second = generator.argument_key(&[&"some long argument"]).unwrap().unwrap();
        assert_eq!(first.len(), 16);
        assert_eq!(first, second);
    }
}
