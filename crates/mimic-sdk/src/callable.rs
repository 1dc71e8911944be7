//! Implementation closures and their parameter metadata
//!
//! A `Callable` pairs a closure with the formal parameter list it was
//! declared with. Rust closures carry no runtime parameter names, so the
//! metadata is supplied when the callable is built; a callable built without
//! it is opaque and cannot be inspected.

use std::fmt;
use std::sync::Arc;

use crate::error::CallResult;
use crate::value::Value;

/// Keyword used for array-constrained parameters
pub const ARRAY_KEYWORD: &str = "array";

/// Closure signature shared by every implementation
pub type NativeFn = Arc<dyn Fn(&[Value]) -> CallResult + Send + Sync>;

/// Constraint declared on a formal parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeConstraint {
    /// Generic array container
    Array,
    /// Class or interface, by fully qualified name
    Named(String),
}

impl TypeConstraint {
    /// Create a constraint from a type name, dropping a leading namespace separator.
    ///
    /// The `array` keyword (any case) yields [`TypeConstraint::Array`].
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.eq_ignore_ascii_case(ARRAY_KEYWORD) {
            return TypeConstraint::Array;
        }
        match name.strip_prefix('\\') {
            Some(stripped) => TypeConstraint::Named(stripped.to_string()),
            None => TypeConstraint::Named(name),
        }
    }

    /// Check whether a value satisfies the constraint
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeConstraint::Array, Value::Array(_)) => true,
            (TypeConstraint::Named(name), Value::Object(obj)) => obj.is_a(name),
            _ => false,
        }
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeConstraint::Array => f.write_str(ARRAY_KEYWORD),
            TypeConstraint::Named(name) => f.write_str(name),
        }
    }
}

/// One formal parameter: optional constraint plus name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterDescriptor {
    /// Declared constraint, if any
    pub constraint: Option<TypeConstraint>,
    /// Parameter name (without the `$` sigil)
    pub name: String,
    /// Whether the parameter has a default and may be omitted
    pub optional: bool,
}

impl ParameterDescriptor {
    /// Unconstrained parameter
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            constraint: None,
            name: name.into(),
            optional: false,
        }
    }

    /// Array-constrained parameter
    pub fn array(name: impl Into<String>) -> Self {
        Self {
            constraint: Some(TypeConstraint::Array),
            name: name.into(),
            optional: false,
        }
    }

    /// Class/interface-constrained parameter
    pub fn typed(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            constraint: Some(TypeConstraint::named(type_name)),
            name: name.into(),
            optional: false,
        }
    }

    /// Mark as optional (defaults to null)
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Renders the descriptor form used in generated signatures:
/// `$x`, `array $x`, `Fully\Qualified $x`, with ` = null` for optional ones.
impl fmt::Display for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(constraint) = &self.constraint {
            write!(f, "{} ", constraint)?;
        }
        write!(f, "${}", self.name)?;
        if self.optional {
            f.write_str(" = null")?;
        }
        Ok(())
    }
}

/// An implementation closure with optional parameter metadata
#[derive(Clone)]
pub struct Callable {
    parameters: Option<Arc<[ParameterDescriptor]>>,
    func: NativeFn,
}

impl Callable {
    /// Create a callable with a declared parameter list
    pub fn new<F>(parameters: Vec<ParameterDescriptor>, func: F) -> Self
    where
        F: Fn(&[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self {
            parameters: Some(parameters.into()),
            func: Arc::new(func),
        }
    }

    /// Create a callable with no parameter metadata
    pub fn opaque<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self {
            parameters: None,
            func: Arc::new(func),
        }
    }

    /// Wrap an existing shared closure
    pub fn from_native(parameters: Option<Vec<ParameterDescriptor>>, func: NativeFn) -> Self {
        Self {
            parameters: parameters.map(Into::into),
            func,
        }
    }

    /// Callable that ignores its arguments and returns a fixed value
    pub fn returning(value: Value) -> Self {
        Self::new(Vec::new(), move |_| Ok(value.clone()))
    }

    /// Declared parameters, `None` if the callable is opaque
    pub fn parameters(&self) -> Option<&[ParameterDescriptor]> {
        self.parameters.as_deref()
    }

    /// Whether parameter metadata is available
    pub fn is_inspectable(&self) -> bool {
        self.parameters.is_some()
    }

    /// Invoke the closure
    pub fn call(&self, args: &[Value]) -> CallResult {
        (self.func)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parameters() {
            Some(params) => {
                let rendered: Vec<String> = params.iter().map(ToString::to_string).collect();
                write!(f, "Callable({})", rendered.join(", "))
            }
            None => write!(f, "Callable(<opaque>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::arg;

    #[test]
    fn test_descriptor_display() {
        assert_eq!(ParameterDescriptor::untyped("x").to_string(), "$x");
        assert_eq!(ParameterDescriptor::array("items").to_string(), "array $items");
        assert_eq!(
            ParameterDescriptor::typed("\\App\\Clock", "clock").to_string(),
            "App\\Clock $clock"
        );
        assert_eq!(
            ParameterDescriptor::untyped("limit").optional().to_string(),
            "$limit = null"
        );
    }

    #[test]
    fn test_constraint_accepts() {
        assert!(TypeConstraint::Array.accepts(&Value::Array(vec![])));
        assert!(!TypeConstraint::Array.accepts(&Value::Int(1)));
        assert!(!TypeConstraint::named("Foo").accepts(&Value::Null));
    }

    #[test]
    fn test_array_keyword_is_not_a_class_name() {
        assert_eq!(TypeConstraint::named("array"), TypeConstraint::Array);
        assert_eq!(TypeConstraint::named("Array"), TypeConstraint::Array);
        assert_eq!(
            TypeConstraint::named("App\\ArrayAccess"),
            TypeConstraint::Named("App\\ArrayAccess".into())
        );

        let rows = ParameterDescriptor::typed("array", "rows");
        assert_eq!(rows, ParameterDescriptor::array("rows"));
        assert!(rows.constraint.unwrap().accepts(&Value::Array(vec![])));
    }

    #[test]
    fn test_callable_call() {
        let multiply = Callable::new(
            vec![ParameterDescriptor::untyped("a"), ParameterDescriptor::untyped("b")],
            |args| Ok(Value::Int(arg::<i64>(args, 0)? * arg::<i64>(args, 1)?)),
        );
        assert!(multiply.is_inspectable());
        assert_eq!(multiply.parameters().unwrap().len(), 2);
        assert_eq!(multiply.call(&[Value::Int(2), Value::Int(5)]).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_opaque_callable() {
        let c = Callable::opaque(|_| Ok(Value::Null));
        assert!(!c.is_inspectable());
        assert!(c.parameters().is_none());
        assert_eq!(format!("{:?}", c), "Callable(<opaque>)");
    }

    #[test]
    fn test_returning() {
        let c = Callable::returning(Value::Str("fixed".into()));
        assert_eq!(c.call(&[Value::Int(1)]).unwrap(), Value::Str("fixed".into()));
        assert_eq!(c.parameters().unwrap().len(), 0);
    }
}
