//! Synthesized classes, their instances and method dispatch

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mimic_sdk::{CallError, CallResult, Callable, DecoratorChain, Object, ParameterDescriptor, Value};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::inspect::{normalize_type_name, render_signature};
use crate::options::SynthOptions;
use crate::registry::ClassId;

/// Global counter for instance identities
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// A method as exposed by a synthesized class
#[derive(Debug, Clone)]
pub struct BoundMethod {
    /// Method name
    pub name: String,
    /// Whether the method dispatches without an instance
    pub is_static: bool,
    /// Declared or inferred parameters
    pub parameters: Arc<[ParameterDescriptor]>,
    /// Class that supplied the implementation
    pub declaring_class: String,
    pub(crate) implementation: Callable,
    pub(crate) chain: DecoratorChain,
}

impl BoundMethod {
    /// Number of parameters a call must supply
    pub fn required_arguments(&self) -> usize {
        self.parameters
            .iter()
            .rposition(|p| !p.optional)
            .map_or(0, |i| i + 1)
    }

    /// Number of decorators wrapping this method
    pub fn decorator_count(&self) -> usize {
        self.chain.len()
    }

    fn check_arguments(&self, class: &str, args: &[Value], options: &SynthOptions) -> Result<(), CallError> {
        if options.check_arity {
            let required = self.required_arguments();
            if args.len() < required {
                return Err(CallError::ArgumentCount {
                    class: class.to_string(),
                    method: self.name.clone(),
                    expected: required,
                    given: args.len(),
                });
            }
        }

        if options.check_argument_types {
            for (i, (param, arg)) in self.parameters.iter().zip(args).enumerate() {
                let Some(constraint) = &param.constraint else {
                    continue;
                };
                if arg.is_null() && param.optional {
                    continue;
                }
                if !constraint.accepts(arg) {
                    return Err(CallError::ArgumentType {
                        class: class.to_string(),
                        method: self.name.clone(),
                        position: i + 1,
                        expected: constraint.to_string(),
                        given: arg.type_name(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Runtime representation of a synthesized class
pub(crate) struct SynthesizedClass {
    pub(crate) id: ClassId,
    pub(crate) name: String,
    pub(crate) parent: Option<String>,
    pub(crate) interfaces: Vec<String>,
    /// Own name plus every ancestor and interface
    pub(crate) supertypes: FxHashSet<String>,
    pub(crate) instance_methods: FxHashMap<String, BoundMethod>,
    pub(crate) static_methods: FxHashMap<String, BoundMethod>,
    pub(crate) options: SynthOptions,
}

impl SynthesizedClass {
    fn dispatch(&self, receiver: Option<&Value>, method: &str, args: &[Value]) -> CallResult {
        let bound = match receiver {
            Some(_) => self
                .instance_methods
                .get(method)
                .or_else(|| self.static_methods.get(method)),
            None => match self.static_methods.get(method) {
                Some(bound) => Some(bound),
                None if self.instance_methods.contains_key(method) => {
                    return Err(CallError::NonStaticCall {
                        class: self.name.clone(),
                        method: method.to_string(),
                    })
                }
                None => None,
            },
        };
        let bound = bound.ok_or_else(|| CallError::UndefinedMethod {
            class: self.name.clone(),
            method: method.to_string(),
        })?;

        bound.check_arguments(&self.name, args, &self.options)?;

        trace!(
            target: "mimic::dispatch",
            class = %self.name,
            method,
            is_static = bound.is_static,
            args = args.len(),
            decorators = bound.chain.len(),
            "dispatch"
        );

        let receiver = if bound.is_static { None } else { receiver };
        bound
            .chain
            .invoke(&self.name, method, receiver, args, &bound.implementation)
    }
}

/// Shared handle to a synthesized class
#[derive(Clone)]
pub struct ClassHandle(Arc<SynthesizedClass>);

impl ClassHandle {
    pub(crate) fn new(class: SynthesizedClass) -> Self {
        Self(Arc::new(class))
    }

    /// Registry ID of the class
    pub fn id(&self) -> ClassId {
        self.0.id
    }

    /// Generated class name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name of the extended class, if any
    pub fn parent(&self) -> Option<&str> {
        self.0.parent.as_deref()
    }

    /// Directly implemented interfaces, in declaration order
    pub fn interfaces(&self) -> &[String] {
        &self.0.interfaces
    }

    /// Whether the class is, extends or implements `type_name`
    pub fn is_a(&self, type_name: &str) -> bool {
        self.0.supertypes.contains(normalize_type_name(type_name))
    }

    /// Whether an instance method with this name exists
    pub fn has_method(&self, name: &str) -> bool {
        self.0.instance_methods.contains_key(name)
    }

    /// Whether a static method with this name exists
    pub fn has_static_method(&self, name: &str) -> bool {
        self.0.static_methods.contains_key(name)
    }

    /// Instance method names, sorted
    pub fn method_names(&self) -> Vec<String> {
        sorted_names(&self.0.instance_methods)
    }

    /// Static method names, sorted
    pub fn static_method_names(&self) -> Vec<String> {
        sorted_names(&self.0.static_methods)
    }

    /// Exposed method by name; instance methods take precedence
    pub fn method(&self, name: &str) -> Option<&BoundMethod> {
        self.0
            .instance_methods
            .get(name)
            .or_else(|| self.0.static_methods.get(name))
    }

    /// Static method by name, even when an instance method shares it
    pub fn static_method(&self, name: &str) -> Option<&BoundMethod> {
        self.0.static_methods.get(name)
    }

    /// Rendered signature of a method, e.g. `"array $items, $x = null"`.
    ///
    /// Follows the precedence of [`ClassHandle::method`]; use
    /// [`ClassHandle::static_signature_of`] for the static side of a shared name.
    pub fn signature_of(&self, name: &str) -> Option<String> {
        self.method(name).map(|m| render_signature(&m.parameters))
    }

    /// Rendered signature of a static method
    pub fn static_signature_of(&self, name: &str) -> Option<String> {
        self.static_method(name).map(|m| render_signature(&m.parameters))
    }

    /// Create a new instance
    pub fn instantiate(&self) -> Instance {
        Instance {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            class: self.clone(),
        }
    }

    /// Invoke a static method
    pub fn call_static(&self, method: &str, args: &[Value]) -> CallResult {
        self.0.dispatch(None, method, args)
    }

    pub(crate) fn methods(&self) -> (&FxHashMap<String, BoundMethod>, &FxHashMap<String, BoundMethod>) {
        (&self.0.instance_methods, &self.0.static_methods)
    }
}

fn sorted_names(table: &FxHashMap<String, BoundMethod>) -> Vec<String> {
    let mut names: Vec<String> = table.keys().cloned().collect();
    names.sort();
    names
}

impl PartialEq for ClassHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ClassHandle {}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassHandle")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("parent", &self.0.parent)
            .field("methods", &self.0.instance_methods.len())
            .field("static_methods", &self.0.static_methods.len())
            .finish()
    }
}

/// An instance of a synthesized class
#[derive(Clone)]
pub struct Instance {
    id: u64,
    class: ClassHandle,
}

impl Instance {
    /// Process-unique identity
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Class of the instance
    pub fn class(&self) -> &ClassHandle {
        &self.class
    }

    /// Invoke a method on the instance
    pub fn call(&self, method: &str, args: &[Value]) -> CallResult {
        let receiver = self.clone().into_value();
        self.class.0.dispatch(Some(&receiver), method, args)
    }

    /// Wrap the instance as a value
    pub fn into_value(self) -> Value {
        Value::Object(Arc::new(self))
    }
}

impl Object for Instance {
    fn object_id(&self) -> u64 {
        self.id
    }

    fn class_name(&self) -> &str {
        self.class.name()
    }

    fn is_a(&self, type_name: &str) -> bool {
        self.class.is_a(type_name)
    }

    fn call(&self, method: &str, args: &[Value]) -> CallResult {
        Instance::call(self, method, args)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class.name(), self.id)
    }
}
