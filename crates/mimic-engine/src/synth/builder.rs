//! Class Builder
//!
//! Accumulates methods, a superclass, interfaces and decorators, then
//! synthesizes a freshly named class from them. A builder may be used for
//! any number of `create()` calls; each yields a distinct class.

use std::fmt;
use std::sync::Arc;

use mimic_sdk::{Callable, Decorator, DecoratorChain, ParameterDescriptor};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{SynthError, SynthResult};
use crate::inspect::{inspect_for, is_identifier, normalize_type_name, parse_signature};
use crate::options::SynthOptions;
use crate::registry::{ClassDecl, MethodDecl, TypeRegistry};
use crate::synth::class::{BoundMethod, ClassHandle, SynthesizedClass};
use crate::synth::validate::{self, DeclaredMethod};

/// Anything that can stand in for an explicit method signature
pub trait IntoSignature {
    /// Convert into parameter descriptors
    fn into_signature(self) -> SynthResult<Vec<ParameterDescriptor>>;
}

impl IntoSignature for Vec<ParameterDescriptor> {
    fn into_signature(self) -> SynthResult<Vec<ParameterDescriptor>> {
        Ok(self)
    }
}

impl IntoSignature for &str {
    fn into_signature(self) -> SynthResult<Vec<ParameterDescriptor>> {
        parse_signature(self)
    }
}

impl IntoSignature for String {
    fn into_signature(self) -> SynthResult<Vec<ParameterDescriptor>> {
        parse_signature(&self)
    }
}

/// One descriptor per element, e.g. `&["array $items", "$x"]`
impl IntoSignature for &[&str] {
    fn into_signature(self) -> SynthResult<Vec<ParameterDescriptor>> {
        parse_signature(&self.join(", "))
    }
}

impl<const N: usize> IntoSignature for [&str; N] {
    fn into_signature(self) -> SynthResult<Vec<ParameterDescriptor>> {
        parse_signature(&self.join(", "))
    }
}

struct PendingMethod {
    name: String,
    is_static: bool,
    implementation: Callable,
    /// Inspection or parse failures are reported by `create()`
    signature: SynthResult<Vec<ParameterDescriptor>>,
}

/// Builder for synthesized classes
pub struct ClassBuilder {
    registry: Arc<TypeRegistry>,
    options: SynthOptions,
    extends: Option<String>,
    interfaces: Vec<String>,
    methods: Vec<PendingMethod>,
    decorators: Vec<Arc<dyn Decorator>>,
}

impl ClassBuilder {
    /// Create a builder over the process-global registry
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::global())
    }

    /// Create a builder over a specific registry
    pub fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            options: SynthOptions::default(),
            extends: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            decorators: Vec::new(),
        }
    }

    /// Replace the synthesis options
    pub fn with_options(mut self, options: SynthOptions) -> Self {
        self.options = options;
        self
    }

    /// Registry the builder resolves names against
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Set the superclass; the last call wins
    pub fn set_extends(&mut self, class_name: impl Into<String>) -> &mut Self {
        let class_name: String = class_name.into();
        self.extends = Some(normalize_type_name(&class_name).to_string());
        self
    }

    /// Add an interface to implement; adding the same one twice has no effect
    pub fn add_interface(&mut self, interface: impl Into<String>) -> &mut Self {
        let interface: String = interface.into();
        let interface = normalize_type_name(&interface);
        if !self.interfaces.iter().any(|i| i == interface) {
            self.interfaces.push(interface.to_string());
        }
        self
    }

    /// Add an instance method, inferring its signature
    pub fn add_method(&mut self, name: impl Into<String>, implementation: Callable) -> &mut Self {
        let name = name.into();
        let signature = inspect_for(&name, &implementation);
        self.push_method(name, false, implementation, signature)
    }

    /// Add an instance method with an explicit signature
    pub fn add_method_with_signature(
        &mut self,
        name: impl Into<String>,
        implementation: Callable,
        signature: impl IntoSignature,
    ) -> &mut Self {
        let signature = signature.into_signature();
        self.push_method(name.into(), false, implementation, signature)
    }

    /// Add a static method, inferring its signature
    pub fn add_static_method(&mut self, name: impl Into<String>, implementation: Callable) -> &mut Self {
        let name = name.into();
        let signature = inspect_for(&name, &implementation);
        self.push_method(name, true, implementation, signature)
    }

    /// Add a static method with an explicit signature
    pub fn add_static_method_with_signature(
        &mut self,
        name: impl Into<String>,
        implementation: Callable,
        signature: impl IntoSignature,
    ) -> &mut Self {
        let signature = signature.into_signature();
        self.push_method(name.into(), true, implementation, signature)
    }

    /// Append a decorator; the first added runs outermost
    pub fn add_decorator(&mut self, decorator: impl Decorator + 'static) -> &mut Self {
        self.decorators.push(Arc::new(decorator));
        self
    }

    fn push_method(
        &mut self,
        name: String,
        is_static: bool,
        implementation: Callable,
        signature: SynthResult<Vec<ParameterDescriptor>>,
    ) -> &mut Self {
        let pending = PendingMethod {
            name,
            is_static,
            implementation,
            signature,
        };
        match self
            .methods
            .iter_mut()
            .find(|m| m.name == pending.name && m.is_static == is_static)
        {
            Some(existing) => {
                debug!(target: "mimic::synth", method = %pending.name, is_static, "method redefined");
                *existing = pending;
            }
            None => self.methods.push(pending),
        }
        self
    }

    /// Synthesize and register a new class.
    ///
    /// Nothing is registered when this fails.
    pub fn create(&self) -> SynthResult<ClassHandle> {
        self.options.validate()?;

        let mut declared = Vec::with_capacity(self.methods.len());
        for pending in &self.methods {
            if !is_identifier(&pending.name) {
                return Err(SynthError::InvalidName {
                    name: pending.name.clone(),
                });
            }
            if self.options.is_reserved(&pending.name) {
                return Err(SynthError::ReservedName {
                    name: pending.name.clone(),
                });
            }
            declared.push(DeclaredMethod {
                name: pending.name.clone(),
                is_static: pending.is_static,
                parameters: pending.signature.clone()?,
                implementation: pending.implementation.clone(),
            });
        }

        let plan = validate::plan(
            &self.registry,
            self.extends.as_deref(),
            &self.interfaces,
            &declared,
        )?;
        let chain = DecoratorChain::new(self.decorators.clone());
        let options = self.options.clone();

        let handle = self
            .registry
            .register_synthesized(&self.options.class_name_prefix, |id, name| {
                let mut instance_methods = FxHashMap::default();
                let mut static_methods = FxHashMap::default();
                let own = declared.into_iter().map(|m| BoundMethod {
                    name: m.name,
                    is_static: m.is_static,
                    parameters: m.parameters.into(),
                    declaring_class: name.clone(),
                    implementation: m.implementation,
                    chain: chain.clone(),
                });
                for bound in plan.inherited.into_iter().chain(own) {
                    let table = if bound.is_static {
                        &mut static_methods
                    } else {
                        &mut instance_methods
                    };
                    table.insert(bound.name.clone(), bound);
                }

                let mut decl = ClassDecl::new(name.clone());
                decl.parent = plan.parent.clone();
                decl.interfaces = plan.interfaces.clone();
                decl.methods = instance_methods
                    .values()
                    .chain(static_methods.values())
                    .map(|bound: &BoundMethod| MethodDecl {
                        name: bound.name.clone(),
                        is_static: bound.is_static,
                        is_final: false,
                        parameters: bound.parameters.to_vec(),
                        body: Some(bound.implementation.clone()),
                    })
                    .collect();

                let mut supertypes = plan.supertypes;
                supertypes.insert(name.clone());

                let class = SynthesizedClass {
                    id,
                    name,
                    parent: plan.parent,
                    interfaces: plan.interfaces,
                    supertypes,
                    instance_methods,
                    static_methods,
                    options,
                };
                Ok((decl, ClassHandle::new(class)))
            })?;

        debug!(
            target: "mimic::synth",
            class = %handle.name(),
            id = %handle.id(),
            parent = ?handle.parent(),
            methods = handle.method_names().len(),
            static_methods = handle.static_method_names().len(),
            decorators = self.decorators.len(),
            "synthesized class"
        );
        Ok(handle)
    }
}

impl Default for ClassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBuilder")
            .field("extends", &self.extends)
            .field("interfaces", &self.interfaces)
            .field(
                "methods",
                &self.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            )
            .field("decorators", &self.decorators.len())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_sdk::{arg, CallError, Value};

    fn builder() -> ClassBuilder {
        ClassBuilder::with_registry(Arc::new(TypeRegistry::new()))
    }

    fn multiply() -> Callable {
        Callable::new(
            vec![ParameterDescriptor::untyped("a"), ParameterDescriptor::untyped("b")],
            |args| Ok(Value::Int(arg::<i64>(args, 0)? * arg::<i64>(args, 1)?)),
        )
    }

    #[test]
    fn test_static_method() {
        let mut b = builder();
        b.add_static_method("multiply", multiply());
        let class = b.create().unwrap();
        assert_eq!(
            class.call_static("multiply", &[Value::Int(2), Value::Int(5)]).unwrap(),
            Value::Int(10)
        );
        assert_eq!(class.signature_of("multiply").unwrap(), "$a, $b");
    }

    #[test]
    fn test_redefinition_replaces() {
        let mut b = builder();
        b.add_method("answer", Callable::returning(Value::Int(1)))
            .add_method("answer", Callable::returning(Value::Int(42)));
        let class = b.create().unwrap();
        assert_eq!(class.method_names(), vec!["answer"]);
        assert_eq!(class.instantiate().call("answer", &[]).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_same_name_in_both_namespaces() {
        let mut b = builder();
        b.add_method("make", Callable::returning(Value::Str("instance".into())))
            .add_static_method("make", Callable::returning(Value::Str("static".into())));
        let class = b.create().unwrap();
        assert_eq!(class.call_static("make", &[]).unwrap(), Value::Str("static".into()));
        assert_eq!(
            class.instantiate().call("make", &[]).unwrap(),
            Value::Str("instance".into())
        );
    }

    #[test]
    fn test_shared_name_signatures_reachable() {
        let mut b = builder();
        b.add_method_with_signature("make", Callable::returning(Value::Null), "$seed")
            .add_static_method_with_signature("make", Callable::returning(Value::Null), "array $rows");
        let class = b.create().unwrap();

        assert_eq!(class.signature_of("make").unwrap(), "$seed");
        assert_eq!(class.static_signature_of("make").unwrap(), "array $rows");
        assert!(class.static_method("make").unwrap().is_static);
        assert!(!class.method("make").unwrap().is_static);
        assert!(class.static_method("missing").is_none());
    }

    #[test]
    fn test_name_errors_surface_at_create() {
        let mut b = builder();
        b.add_method("__construct", Callable::returning(Value::Null));
        assert_eq!(
            b.create().unwrap_err(),
            SynthError::ReservedName {
                name: "__construct".to_string()
            }
        );

        let mut b = builder();
        b.add_method("not valid", Callable::returning(Value::Null));
        assert!(matches!(b.create(), Err(SynthError::InvalidName { .. })));
    }

    #[test]
    fn test_uninspectable_without_signature() {
        let mut b = builder();
        b.add_method("opaque", Callable::opaque(|_| Ok(Value::Null)));
        assert_eq!(
            b.create().unwrap_err(),
            SynthError::UninspectableCallable {
                subject: "opaque".to_string()
            }
        );

        let mut b = builder();
        b.add_method_with_signature("opaque", Callable::opaque(|_| Ok(Value::Null)), ["$x", "array $y"]);
        let class = b.create().unwrap();
        assert_eq!(class.signature_of("opaque").unwrap(), "$x, array $y");
    }

    #[test]
    fn test_add_interface_is_idempotent() {
        let mut b = builder();
        b.add_interface("Countable").add_interface("\\Countable");
        assert_eq!(b.interfaces, vec!["Countable".to_string()]);
    }

    #[test]
    fn test_failed_create_registers_nothing() {
        let registry = Arc::new(TypeRegistry::new());
        let mut b = ClassBuilder::with_registry(registry.clone());
        b.set_extends("Missing");
        assert!(b.create().is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_instance_method_called_statically() {
        let mut b = builder();
        b.add_method("run", Callable::returning(Value::Null));
        let class = b.create().unwrap();
        assert!(matches!(
            class.call_static("run", &[]),
            Err(CallError::NonStaticCall { .. })
        ));
    }
}
