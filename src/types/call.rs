//! Description of an intercepted call.
//!
//! [`OperationCall`] is what an interception mechanism hands the
//! [`CacheInterceptor`](crate::CacheInterceptor): who owns the operation, its
//! name, the declared parameter types, and borrowed argument values. It does
//! not outlive the call.

use serde::Serialize;
use serde_json::Value;

use crate::Result;
use crate::keys::encoding;

/// An argument value that can take part in a cache key.
///
/// Implemented for every [`Serialize`] type; the type name recorded is the
/// full Rust path of the concrete argument type.
pub trait CacheArgument {
    /// Fully-qualified type name of the value.
    fn type_name(&self) -> &'static str;

    /// Canonical, type-tagged encoding of the value.
    fn encode(&self) -> Result<Value>;
}

impl<T: Serialize> CacheArgument for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn encode(&self) -> Result<Value> {
        encoding::to_tagged_value(self)
    }
}

/// Identity of the concrete type that owns a cached operation.
///
/// Blanket-implemented for every sized type. Make a service trait extend it
/// (`trait Greeter: CacheOwner`) and calls made through `&dyn Greeter` still
/// report the concrete implementation, so two implementations of one trait
/// never share a namespace.
///
/// Call it on the trait object itself, not on a `Box` or reference to it:
/// those are sized types of their own.
pub trait CacheOwner {
    fn owner_type_name(&self) -> &'static str;
}

impl<T> CacheOwner for T {
    fn owner_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Immutable record of one intercepted call.
///
/// The operation signature is derived once at construction:
/// `owner.operation(param1,param2)`, or `owner.operation` when there are no
/// parameters.
pub struct OperationCall<'a> {
    owner_type: String,
    operation: String,
    parameter_types: Vec<String>,
    arguments: Vec<&'a dyn CacheArgument>,
    signature: String,
}

impl<'a> OperationCall<'a> {
    /// Build a call descriptor from its raw parts.
    ///
    /// `parameter_types` are the declared types, which may differ from the
    /// runtime types of `arguments` (an overload taking a wider type).
    pub fn new(
        owner_type: impl Into<String>,
        operation: impl Into<String>,
        parameter_types: Vec<String>,
        arguments: Vec<&'a dyn CacheArgument>,
    ) -> Self {
        let owner_type = owner_type.into();
        let operation = operation.into();
        let signature = build_signature(&owner_type, &operation, &parameter_types);
        Self {
            owner_type,
            operation,
            parameter_types,
            arguments,
            signature,
        }
    }

    /// Start describing a call on an explicitly named owner type.
    pub fn builder(
        owner_type: impl Into<String>,
        operation: impl Into<String>,
    ) -> OperationCallBuilder<'a> {
        OperationCallBuilder {
            owner_type: owner_type.into(),
            operation: operation.into(),
            parameter_types: Vec::new(),
            arguments: Vec::new(),
        }
    }

    /// Start describing a call on `receiver`, owned by its concrete type.
    pub fn on<R>(receiver: &R, operation: impl Into<String>) -> OperationCallBuilder<'a>
    where
        R: CacheOwner + ?Sized,
    {
        Self::builder(receiver.owner_type_name(), operation)
    }

    pub fn owner_type(&self) -> &str {
        &self.owner_type
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    pub fn arguments(&self) -> &[&'a dyn CacheArgument] {
        &self.arguments
    }

    /// Canonical operation signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl std::fmt::Debug for OperationCall<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationCall")
            .field("signature", &self.signature)
            .field("arguments", &self.arguments.len())
            .finish()
    }
}

/// Builder for [`OperationCall`].
pub struct OperationCallBuilder<'a> {
    owner_type: String,
    operation: String,
    parameter_types: Vec<String>,
    arguments: Vec<&'a dyn CacheArgument>,
}

impl<'a> OperationCallBuilder<'a> {
    /// Add an argument whose declared type is its own type.
    pub fn arg<T: Serialize>(mut self, value: &'a T) -> Self {
        self.parameter_types
            .push(std::any::type_name::<T>().to_string());
        self.arguments.push(value);
        self
    }

    /// Add an argument under a different declared parameter type.
    pub fn arg_as(mut self, declared_type: impl Into<String>, value: &'a dyn CacheArgument) -> Self {
        self.parameter_types.push(declared_type.into());
        self.arguments.push(value);
        self
    }

    pub fn build(self) -> OperationCall<'a> {
        OperationCall::new(
            self.owner_type,
            self.operation,
            self.parameter_types,
            self.arguments,
        )
    }
}

fn build_signature(owner_type: &str, operation: &str, parameter_types: &[String]) -> String {
    if parameter_types.is_empty() {
        format!("{owner_type}.{operation}")
    } else {
        format!("{owner_type}.{operation}({})", parameter_types.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Service;

    #[test]
    fn signature_without_parameters_has_no_parentheses() {
        let call = OperationCall::new("com.example.Service", "count", vec![], vec![]);
        assert_eq!(call.signature(), "com.example.Service.count");
    }

    #[test]
    fn signature_lists_parameter_types_in_order() {
        let call = OperationCall::new(
            "com.example.Service",
            "find",
            vec!["i32".to_string(), "alloc::string::String".to_string()],
            vec![],
        );
        assert_eq!(
            call.signature(),
            "com.example.Service.find(i32,alloc::string::String)"
        );
    }

    #[test]
    fn builder_records_argument_types() {
        let id = 7u32;
        let name = String::from("x");
        let call = OperationCall::builder("Svc", "get")
            .arg(&id)
            .arg(&name)
            .build();

        assert_eq!(call.parameter_types(), ["u32", "alloc::string::String"]);
        assert_eq!(call.arguments().len(), 2);
        assert_eq!(call.arguments()[0].type_name(), "u32");
    }

    #[test]
    fn on_uses_concrete_receiver_type() {
        let call = OperationCall::on(&Service, "run").build();
        assert!(call.owner_type().ends_with("Service"));
        assert_eq!(call.operation(), "run");
    }
}
