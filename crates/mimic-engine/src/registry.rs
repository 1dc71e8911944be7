//! Type registry: the class namespace synthesis resolves names against
//!
//! Host programs declare the classes and interfaces their mocks must extend
//! or implement; every synthesized class is registered here as well, so it
//! can be extended in turn. Declarations are append-only.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mimic_sdk::{Callable, ParameterDescriptor};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::error::{SynthError, SynthResult};
use crate::inspect::{is_identifier, is_qualified_name, normalize_type_name, parse_signature};
use crate::synth::ClassHandle;

/// Process-global registry used by `ClassBuilder::new()`
static GLOBAL_REGISTRY: Lazy<Arc<TypeRegistry>> = Lazy::new(|| Arc::new(TypeRegistry::new()));

/// Suffix counter for generated class names, shared by every registry
static NEXT_CLASS_SUFFIX: AtomicUsize = AtomicUsize::new(1);

/// Index of a type within its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub usize);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Instantiable (possibly abstract) class
    Class,
    /// Interface
    Interface,
}

/// A method declared by a host class or interface
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Whether this is a static method
    pub is_static: bool,
    /// Whether subclasses may not override it
    pub is_final: bool,
    /// Formal parameters
    pub parameters: Vec<ParameterDescriptor>,
    /// Implementation; `None` makes the method abstract
    pub body: Option<Callable>,
}

impl MethodDecl {
    /// Create an abstract method declaration
    pub fn new(name: impl Into<String>, parameters: Vec<ParameterDescriptor>) -> Self {
        Self {
            name: name.into(),
            is_static: false,
            is_final: false,
            parameters,
            body: None,
        }
    }

    /// Create a declaration from an explicit signature string
    pub fn parse(name: impl Into<String>, signature: &str) -> SynthResult<Self> {
        Ok(Self::new(name, parse_signature(signature)?))
    }

    /// Give the method a concrete implementation
    pub fn with_body(mut self, body: Callable) -> Self {
        self.body = Some(body);
        self
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Whether the method has no implementation
    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }
}

/// A host class declaration
#[derive(Debug, Clone)]
pub struct ClassDecl {
    /// Fully qualified class name
    pub name: String,
    /// Parent class name
    pub parent: Option<String>,
    /// Directly implemented interfaces
    pub interfaces: Vec<String>,
    /// Whether the class may not be extended
    pub is_final: bool,
    /// Whether the class is abstract
    pub is_abstract: bool,
    /// Declared methods
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    /// Create a class declaration with no parent and no methods
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: normalized(name),
            parent: None,
            interfaces: Vec::new(),
            is_final: false,
            is_abstract: false,
            methods: Vec::new(),
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(normalized(parent));
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(normalized(interface));
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Mark as abstract
    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}

/// A host interface declaration
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    /// Fully qualified interface name
    pub name: String,
    /// Extended interfaces
    pub extends: Vec<String>,
    /// Required methods
    pub methods: Vec<MethodDecl>,
}

impl InterfaceDecl {
    /// Create an interface declaration with no methods
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: normalized(name),
            extends: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Extend another interface
    pub fn extends(mut self, interface: impl Into<String>) -> Self {
        self.extends.push(normalized(interface));
        self
    }

    /// Add a required method
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}

/// A registered class or interface
#[derive(Debug, Clone)]
pub enum TypeDecl {
    /// Class
    Class(ClassDecl),
    /// Interface
    Interface(InterfaceDecl),
}

impl TypeDecl {
    /// Type name
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Class(c) => &c.name,
            TypeDecl::Interface(i) => &i.name,
        }
    }

    /// Class or interface
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeDecl::Class(_) => TypeKind::Class,
            TypeDecl::Interface(_) => TypeKind::Interface,
        }
    }

    /// Methods declared directly on this type
    pub fn methods(&self) -> &[MethodDecl] {
        match self {
            TypeDecl::Class(c) => &c.methods,
            TypeDecl::Interface(i) => &i.methods,
        }
    }

    /// Direct supertypes: parent class first, then interfaces
    pub fn direct_supertypes(&self) -> Vec<&str> {
        match self {
            TypeDecl::Class(c) => c
                .parent
                .iter()
                .chain(c.interfaces.iter())
                .map(String::as_str)
                .collect(),
            TypeDecl::Interface(i) => i.extends.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    /// Types indexed by ID
    types: Vec<Arc<TypeDecl>>,
    /// Type name to ID mapping
    name_to_id: FxHashMap<String, ClassId>,
    /// Dispatch handles of synthesized classes
    handles: FxHashMap<ClassId, ClassHandle>,
}

impl RegistryInner {
    fn get(&self, name: &str) -> Option<&Arc<TypeDecl>> {
        self.name_to_id
            .get(normalize_type_name(name))
            .and_then(|id| self.types.get(id.0))
    }

    fn insert(&mut self, decl: TypeDecl) -> ClassId {
        let id = ClassId(self.types.len());
        self.name_to_id.insert(decl.name().to_string(), id);
        self.types.push(Arc::new(decl));
        id
    }
}

/// Registry of host and synthesized types
pub struct TypeRegistry {
    inner: RwLock<RegistryInner>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// The process-global registry
    pub fn global() -> Arc<TypeRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Declare a host class.
    ///
    /// The parent and interfaces must already be declared.
    pub fn declare_class(&self, decl: ClassDecl) -> SynthResult<ClassId> {
        let mut inner = self.inner.write();
        check_new_type_name(&inner, &decl.name)?;

        if let Some(parent) = &decl.parent {
            match inner.get(parent).map(|t| t.as_ref()) {
                None => {
                    return Err(SynthError::structural(format!(
                        "parent class {} of {} is not declared",
                        parent, decl.name
                    )))
                }
                Some(TypeDecl::Interface(_)) => {
                    return Err(SynthError::structural(format!(
                        "{} cannot extend interface {}",
                        decl.name, parent
                    )))
                }
                Some(TypeDecl::Class(p)) if p.is_final => {
                    return Err(SynthError::structural(format!(
                        "{} cannot extend final class {}",
                        decl.name, parent
                    )))
                }
                Some(TypeDecl::Class(_)) => {}
            }
        }
        for interface in &decl.interfaces {
            require_interface(&inner, &decl.name, interface)?;
        }
        check_method_decls(&decl.name, &decl.methods)?;
        if !decl.is_abstract {
            if let Some(m) = decl.methods.iter().find(|m| m.is_abstract()) {
                return Err(SynthError::structural(format!(
                    "non-abstract class {} declares abstract method {}()",
                    decl.name, m.name
                )));
            }
        }

        debug!(target: "mimic::synth", class = %decl.name, methods = decl.methods.len(), "declared host class");
        Ok(inner.insert(TypeDecl::Class(decl)))
    }

    /// Declare a host interface.
    ///
    /// Extended interfaces must already be declared.
    pub fn declare_interface(&self, decl: InterfaceDecl) -> SynthResult<ClassId> {
        let mut inner = self.inner.write();
        check_new_type_name(&inner, &decl.name)?;
        for parent in &decl.extends {
            require_interface(&inner, &decl.name, parent)?;
        }
        check_method_decls(&decl.name, &decl.methods)?;
        if let Some(m) = decl.methods.iter().find(|m| !m.is_abstract() || m.is_final) {
            return Err(SynthError::structural(format!(
                "interface method {}::{}() cannot have a body or be final",
                decl.name, m.name
            )));
        }

        debug!(target: "mimic::synth", interface = %decl.name, methods = decl.methods.len(), "declared host interface");
        Ok(inner.insert(TypeDecl::Interface(decl)))
    }

    /// ID of a registered type
    pub fn resolve(&self, name: &str) -> Option<ClassId> {
        self.inner
            .read()
            .name_to_id
            .get(normalize_type_name(name))
            .copied()
    }

    /// Declaration of a registered type
    pub fn get(&self, name: &str) -> Option<Arc<TypeDecl>> {
        self.inner.read().get(name).cloned()
    }

    /// Declaration by ID
    pub fn get_by_id(&self, id: ClassId) -> Option<Arc<TypeDecl>> {
        self.inner.read().types.get(id.0).cloned()
    }

    /// Whether a type with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Dispatch handle of a synthesized class
    pub fn class_handle(&self, name: &str) -> Option<ClassHandle> {
        let inner = self.inner.read();
        let id = inner.name_to_id.get(normalize_type_name(name))?;
        inner.handles.get(id).cloned()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.inner.read().types.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The type itself plus every ancestor class and implemented interface.
    ///
    /// Empty if the type is unknown.
    pub fn supertypes_of(&self, name: &str) -> Vec<String> {
        let inner = self.inner.read();
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut pending = vec![normalize_type_name(name).to_string()];
        while let Some(current) = pending.pop() {
            let Some(decl) = inner.get(&current) else {
                continue;
            };
            if !seen.insert(current.clone()) {
                continue;
            }
            pending.extend(
                decl.direct_supertypes()
                    .into_iter()
                    .rev()
                    .map(str::to_string),
            );
            order.push(current);
        }
        order
    }

    /// Whether `sub` is, extends or implements `sup`
    pub fn is_subtype_of(&self, sub: &str, sup: &str) -> bool {
        let sup = normalize_type_name(sup);
        self.supertypes_of(sub).iter().any(|t| t == sup)
    }

    /// Register a synthesized class under a freshly generated name.
    ///
    /// `build` receives the ID and name and returns the class's declaration
    /// and dispatch handle. It runs under the registry's write lock and must
    /// not call back into the registry.
    pub(crate) fn register_synthesized<F>(&self, prefix: &str, build: F) -> SynthResult<ClassHandle>
    where
        F: FnOnce(ClassId, String) -> SynthResult<(ClassDecl, ClassHandle)>,
    {
        let mut inner = self.inner.write();
        let name = loop {
            let candidate = format!("{}{}", prefix, NEXT_CLASS_SUFFIX.fetch_add(1, Ordering::Relaxed));
            if inner.name_to_id.contains_key(&candidate) {
                warn!(target: "mimic::synth", name = %candidate, "generated class name already taken, skipping");
                continue;
            }
            break candidate;
        };

        let id = ClassId(inner.types.len());
        let (decl, handle) = build(id, name)?;
        let inserted = inner.insert(TypeDecl::Class(decl));
        debug_assert_eq!(inserted, id);
        inner.handles.insert(id, handle.clone());
        Ok(handle)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("TypeRegistry")
            .field("types", &inner.types.len())
            .field("synthesized", &inner.handles.len())
            .finish()
    }
}

fn normalized(name: impl Into<String>) -> String {
    let name: String = name.into();
    normalize_type_name(&name).to_string()
}

fn check_new_type_name(inner: &RegistryInner, name: &str) -> SynthResult<()> {
    if !is_qualified_name(name) {
        return Err(SynthError::InvalidName {
            name: name.to_string(),
        });
    }
    if inner.name_to_id.contains_key(name) {
        return Err(SynthError::structural(format!(
            "type {} is already declared",
            name
        )));
    }
    Ok(())
}

fn require_interface(inner: &RegistryInner, owner: &str, name: &str) -> SynthResult<()> {
    match inner.get(name).map(|t| t.kind()) {
        Some(TypeKind::Interface) => Ok(()),
        Some(TypeKind::Class) => Err(SynthError::structural(format!(
            "{} is a class, {} cannot implement it",
            name, owner
        ))),
        None => Err(SynthError::structural(format!(
            "interface {} required by {} is not declared",
            name, owner
        ))),
    }
}

fn check_method_decls(owner: &str, methods: &[MethodDecl]) -> SynthResult<()> {
    let mut seen = FxHashSet::default();
    for m in methods {
        if !is_identifier(&m.name) {
            return Err(SynthError::InvalidName {
                name: m.name.clone(),
            });
        }
        if !seen.insert((m.name.as_str(), m.is_static)) {
            return Err(SynthError::structural(format!(
                "{}::{}() is declared twice",
                owner, m.name
            )));
        }
    }
    Ok(())
}
