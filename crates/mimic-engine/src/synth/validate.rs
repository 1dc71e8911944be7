//! Structural validation of a requested class shape
//!
//! Resolves the superclass and interfaces, collects inherited methods and
//! checks the declared methods against everything the supertypes require.

use std::sync::Arc;

use mimic_sdk::{Callable, DecoratorChain, ParameterDescriptor, TypeConstraint};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{SynthError, SynthResult};
use crate::inspect::render_signature;
use crate::registry::{MethodDecl, TypeDecl, TypeKind, TypeRegistry};
use crate::synth::class::BoundMethod;

type MethodKey = (String, bool);

/// A method declared through the builder, ready for synthesis
pub(crate) struct DeclaredMethod {
    pub name: String,
    pub is_static: bool,
    pub parameters: Vec<ParameterDescriptor>,
    pub implementation: Callable,
}

/// Everything synthesis needs besides the declared methods
pub(crate) struct ClassPlan {
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    /// Ancestors and interfaces, excluding the new class itself
    pub supertypes: FxHashSet<String>,
    /// Inherited concrete methods the builder does not override
    pub inherited: Vec<BoundMethod>,
}

enum Inherited {
    Concrete(BoundMethod),
    Abstract { owner: String, decl: MethodDecl },
}

impl Inherited {
    fn parameters(&self) -> &[ParameterDescriptor] {
        match self {
            Inherited::Concrete(bound) => &bound.parameters,
            Inherited::Abstract { decl, .. } => &decl.parameters,
        }
    }

    fn owner(&self) -> &str {
        match self {
            Inherited::Concrete(bound) => &bound.declaring_class,
            Inherited::Abstract { owner, .. } => owner,
        }
    }
}

pub(crate) fn plan(
    registry: &TypeRegistry,
    extends: Option<&str>,
    interfaces: &[String],
    declared: &[DeclaredMethod],
) -> SynthResult<ClassPlan> {
    let parent = extends.map(|name| resolve_parent(registry, name)).transpose()?;
    for name in interfaces {
        resolve_interface(registry, name)?;
    }

    let mut supertypes = FxHashSet::default();
    if let Some(parent) = &parent {
        supertypes.extend(registry.supertypes_of(parent));
    }
    for name in interfaces {
        supertypes.extend(registry.supertypes_of(name));
    }

    let (mut inherited, finals) = collect_inherited(registry, parent.as_deref())?;
    let required = collect_interface_methods(registry, &supertypes);

    let declared_keys: FxHashSet<MethodKey> = declared
        .iter()
        .map(|m| (m.name.clone(), m.is_static))
        .collect();

    for method in declared {
        let key = (method.name.clone(), method.is_static);
        if let Some(owner) = finals.get(&key) {
            return Err(SynthError::structural(format!(
                "cannot override final method {}::{}()",
                owner, method.name
            )));
        }
        if let Some(existing) = inherited.get(&key) {
            check_compatible(
                registry,
                &method.name,
                &method.parameters,
                existing.owner(),
                existing.parameters(),
            )?;
        }
        let same_method = |decl: &MethodDecl| decl.name == method.name && decl.is_static == method.is_static;
        for (owner, decl) in required.iter().filter(|(_, decl)| same_method(decl)) {
            check_compatible(registry, &method.name, &method.parameters, owner, &decl.parameters)?;
        }
    }

    for (key, entry) in &inherited {
        if let Inherited::Abstract { owner, .. } = entry {
            if !declared_keys.contains(key) {
                return Err(unimplemented(owner, &key.0));
            }
        }
    }
    for (owner, decl) in &required {
        let key = (decl.name.clone(), decl.is_static);
        if declared_keys.contains(&key) {
            continue;
        }
        match inherited.get(&key) {
            // An inherited body satisfies the interface only if callable through it
            Some(Inherited::Concrete(bound)) => check_compatible(
                registry,
                &decl.name,
                &bound.parameters,
                owner,
                &decl.parameters,
            )?,
            _ => return Err(unimplemented(owner, &decl.name)),
        }
    }

    let mut kept: Vec<BoundMethod> = inherited
        .drain()
        .filter(|(key, _)| !declared_keys.contains(key))
        .filter_map(|(_, entry)| match entry {
            Inherited::Concrete(bound) => Some(bound),
            Inherited::Abstract { .. } => None,
        })
        .collect();
    kept.sort_by(|a, b| (a.is_static, &a.name).cmp(&(b.is_static, &b.name)));

    Ok(ClassPlan {
        parent,
        interfaces: interfaces.to_vec(),
        supertypes,
        inherited: kept,
    })
}

fn resolve_parent(registry: &TypeRegistry, name: &str) -> SynthResult<String> {
    match registry.get(name).as_deref() {
        None => Err(SynthError::structural(format!(
            "superclass {} does not exist",
            name
        ))),
        Some(TypeDecl::Interface(_)) => Err(SynthError::structural(format!(
            "{} is an interface and cannot be extended",
            name
        ))),
        Some(TypeDecl::Class(decl)) if decl.is_final => Err(SynthError::structural(format!(
            "cannot extend final class {}",
            name
        ))),
        Some(TypeDecl::Class(decl)) => Ok(decl.name.clone()),
    }
}

fn resolve_interface(registry: &TypeRegistry, name: &str) -> SynthResult<()> {
    match registry.get(name).map(|decl| decl.kind()) {
        Some(TypeKind::Interface) => Ok(()),
        Some(TypeKind::Class) => Err(SynthError::structural(format!(
            "{} is a class and cannot be implemented",
            name
        ))),
        None => Err(SynthError::structural(format!(
            "interface {} does not exist",
            name
        ))),
    }
}

/// Walk the superclass chain; closer ancestors shadow farther ones
fn collect_inherited(
    registry: &TypeRegistry,
    parent: Option<&str>,
) -> SynthResult<(FxHashMap<MethodKey, Inherited>, FxHashMap<MethodKey, String>)> {
    let mut ancestors: Vec<Arc<TypeDecl>> = Vec::new();
    let mut next = parent.map(str::to_string);
    while let Some(name) = next.take() {
        let decl = registry
            .get(&name)
            .ok_or_else(|| SynthError::structural(format!("superclass {} does not exist", name)))?;
        if let TypeDecl::Class(class) = decl.as_ref() {
            next = class.parent.clone();
        }
        ancestors.push(decl);
    }

    let mut inherited = FxHashMap::default();
    let mut finals = FxHashMap::default();
    for decl in ancestors.iter().rev() {
        let owner = decl.name();
        if let Some(handle) = registry.class_handle(owner) {
            let (instance, statics) = handle.methods();
            for bound in instance.values().chain(statics.values()) {
                inherited.insert(
                    (bound.name.clone(), bound.is_static),
                    Inherited::Concrete(bound.clone()),
                );
            }
            continue;
        }

        for method in decl.methods() {
            let key = (method.name.clone(), method.is_static);
            if method.is_final {
                finals.insert(key.clone(), owner.to_string());
            }
            let entry = match &method.body {
                Some(body) => Inherited::Concrete(BoundMethod {
                    name: method.name.clone(),
                    is_static: method.is_static,
                    parameters: method.parameters.clone().into(),
                    declaring_class: owner.to_string(),
                    implementation: body.clone(),
                    chain: DecoratorChain::empty(),
                }),
                None => Inherited::Abstract {
                    owner: owner.to_string(),
                    decl: method.clone(),
                },
            };
            inherited.insert(key, entry);
        }
    }
    Ok((inherited, finals))
}

fn collect_interface_methods(
    registry: &TypeRegistry,
    supertypes: &FxHashSet<String>,
) -> Vec<(String, MethodDecl)> {
    let mut names: Vec<&String> = supertypes.iter().collect();
    names.sort();

    let mut required = Vec::new();
    for name in names {
        if let Some(decl) = registry.get(name) {
            if let TypeDecl::Interface(interface) = decl.as_ref() {
                required.extend(
                    interface
                        .methods
                        .iter()
                        .map(|m| (interface.name.clone(), m.clone())),
                );
            }
        }
    }
    required
}

fn check_compatible(
    registry: &TypeRegistry,
    name: &str,
    parameters: &[ParameterDescriptor],
    owner: &str,
    required: &[ParameterDescriptor],
) -> SynthResult<()> {
    if is_compatible(registry, parameters, required) {
        return Ok(());
    }
    Err(SynthError::structural(format!(
        "declaration of {}({}) must be compatible with {}::{}({})",
        name,
        render_signature(parameters),
        owner,
        name,
        render_signature(required)
    )))
}

/// Parameters may be widened but never narrowed or made mandatory
fn is_compatible(
    registry: &TypeRegistry,
    declared: &[ParameterDescriptor],
    required: &[ParameterDescriptor],
) -> bool {
    if declared.len() < required.len() {
        return false;
    }
    let positional = declared.iter().zip(required).all(|(d, r)| {
        if r.optional && !d.optional {
            return false;
        }
        match (&d.constraint, &r.constraint) {
            (None, _) => true,
            (Some(TypeConstraint::Array), Some(TypeConstraint::Array)) => true,
            (Some(TypeConstraint::Named(wide)), Some(TypeConstraint::Named(narrow))) => {
                wide == narrow || registry.is_subtype_of(narrow, wide)
            }
            _ => false,
        }
    });
    positional && declared[required.len()..].iter().all(|p| p.optional)
}

fn unimplemented(owner: &str, method: &str) -> SynthError {
    SynthError::structural(format!(
        "method {}::{}() is not implemented",
        owner, method
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ClassDecl, InterfaceDecl};

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.declare_interface(InterfaceDecl::new("Shape")).unwrap();
        registry
            .declare_class(ClassDecl::new("Circle").implements("Shape"))
            .unwrap();
        registry
    }

    fn params(sig: &str) -> Vec<ParameterDescriptor> {
        crate::inspect::parse_signature(sig).unwrap()
    }

    #[test]
    fn test_identical_and_widened_signatures_are_compatible() {
        let registry = registry();
        assert!(is_compatible(&registry, &params("Circle $c"), &params("Circle $c")));
        assert!(is_compatible(&registry, &params("$c"), &params("Circle $c")));
        assert!(is_compatible(&registry, &params("Shape $c"), &params("Circle $c")));
        assert!(is_compatible(&registry, &params("$a, $b = null"), &params("$a")));
    }

    #[test]
    fn test_narrowed_signatures_are_incompatible() {
        let registry = registry();
        assert!(!is_compatible(&registry, &params("Circle $c"), &params("Shape $c")));
        assert!(!is_compatible(&registry, &params("Circle $c"), &params("$c")));
        assert!(!is_compatible(&registry, &params("array $c"), &params("Shape $c")));
        assert!(!is_compatible(&registry, &params("$a"), &params("$a, $b")));
        assert!(!is_compatible(&registry, &params("$a, $b"), &params("$a")));
        assert!(!is_compatible(&registry, &params("$a"), &params("$a = null")));
    }
}
