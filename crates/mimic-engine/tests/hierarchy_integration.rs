//! Host Type Hierarchy Tests
//!
//! Synthesis against richer host hierarchies:
//! - Abstract superclasses and inherited interfaces
//! - Final methods
//! - Extending synthesized classes
//! - Options loaded from TOML

use mimic_engine::{
    ClassBuilder, ClassDecl, InterfaceDecl, MethodDecl, SynthError, SynthOptions, TypeKind,
    TypeRegistry,
};
use mimic_sdk::{around, Callable, ParameterDescriptor, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Route synthesis logs to the test harness; set `RUST_LOG=mimic=debug` to see them
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn registry() -> Arc<TypeRegistry> {
    let registry = Arc::new(TypeRegistry::new());
    registry
        .declare_interface(InterfaceDecl::new("Countable").method(MethodDecl::new("count", vec![])))
        .unwrap();
    registry
        .declare_interface(
            InterfaceDecl::new("Repo\\Repository")
                .extends("Countable")
                .method(MethodDecl::parse("find", "$id").unwrap()),
        )
        .unwrap();
    registry
        .declare_class(
            ClassDecl::new("Repo\\AbstractRepository")
                .implements("Repo\\Repository")
                .as_abstract()
                .method(MethodDecl::parse("save", "Repo\\Entity $entity").unwrap())
                .method(
                    MethodDecl::new("table", vec![])
                        .with_body(Callable::returning(Value::Str("entities".into())))
                        .as_final(),
                ),
        )
        .unwrap();
    registry.declare_class(ClassDecl::new("Repo\\Entity")).unwrap();
    registry
        .declare_class(ClassDecl::new("Repo\\User").extends("Repo\\Entity"))
        .unwrap();
    registry
}

fn complete_repository(builder: &mut ClassBuilder) {
    builder
        .set_extends("Repo\\AbstractRepository")
        .add_method("count", Callable::new(vec![], |_| Ok(Value::Int(3))))
        .add_method(
            "find",
            Callable::new(vec![ParameterDescriptor::untyped("id")], |args| {
                Ok(args.first().cloned().unwrap_or_default())
            }),
        )
        .add_method(
            "save",
            Callable::new(vec![ParameterDescriptor::typed("Repo\\Entity", "entity")], |_| {
                Ok(Value::Bool(true))
            }),
        );
}

// ===== Abstract Superclasses =====

#[test]
fn test_abstract_superclass_completed() {
    init_tracing();
    let mut builder = ClassBuilder::with_registry(registry());
    complete_repository(&mut builder);
    let class = builder.create().unwrap();

    assert!(class.is_a("Repo\\AbstractRepository"));
    assert!(class.is_a("Repo\\Repository"));
    assert!(class.is_a("Countable"));
    assert_eq!(
        class.method_names(),
        vec!["count", "find", "save", "table"]
    );

    let repo = class.instantiate();
    assert_eq!(repo.call("count", &[]).unwrap(), Value::Int(3));
    assert_eq!(repo.call("find", &[Value::Int(9)]).unwrap(), Value::Int(9));
    assert_eq!(
        repo.call("table", &[]).unwrap(),
        Value::Str("entities".into())
    );
}

#[test]
fn test_unimplemented_abstract_method_fails() {
    let mut builder = ClassBuilder::with_registry(registry());
    builder
        .set_extends("Repo\\AbstractRepository")
        .add_method("count", Callable::new(vec![], |_| Ok(Value::Int(0))))
        .add_method(
            "find",
            Callable::new(vec![ParameterDescriptor::untyped("id")], |_| Ok(Value::Null)),
        );
    let err = builder.create().unwrap_err();
    assert_eq!(
        err,
        SynthError::StructuralConstraint {
            reason: "method Repo\\AbstractRepository::save() is not implemented".to_string()
        }
    );
}

#[test]
fn test_inherited_interface_requirement_fails() {
    let mut builder = ClassBuilder::with_registry(registry());
    builder.add_interface("Repo\\Repository").add_method(
        "find",
        Callable::new(vec![ParameterDescriptor::untyped("id")], |_| Ok(Value::Null)),
    );
    let err = builder.create().unwrap_err();
    assert_eq!(
        err,
        SynthError::StructuralConstraint {
            reason: "method Countable::count() is not implemented".to_string()
        }
    );
}

#[test]
fn test_final_method_cannot_be_overridden() {
    let mut builder = ClassBuilder::with_registry(registry());
    complete_repository(&mut builder);
    builder.add_method("table", Callable::returning(Value::Str("other".into())));
    assert!(matches!(
        builder.create(),
        Err(SynthError::StructuralConstraint { .. })
    ));
}

#[test]
fn test_parameter_widening_and_narrowing() {
    let registry = registry();

    let mut widened = ClassBuilder::with_registry(registry.clone());
    complete_repository(&mut widened);
    widened.add_method("save", Callable::new(vec![ParameterDescriptor::untyped("entity")], |_| Ok(Value::Null)));
    assert!(widened.create().is_ok());

    let mut narrowed = ClassBuilder::with_registry(registry);
    complete_repository(&mut narrowed);
    narrowed.add_method(
        "save",
        Callable::new(vec![ParameterDescriptor::typed("Repo\\User", "entity")], |_| Ok(Value::Null)),
    );
    assert!(matches!(
        narrowed.create(),
        Err(SynthError::StructuralConstraint { .. })
    ));
}

#[test]
fn test_inherited_method_must_match_interface() {
    let registry = registry();
    registry
        .declare_interface(
            InterfaceDecl::new("Calc").method(MethodDecl::parse("add", "array $a, array $b").unwrap()),
        )
        .unwrap();
    registry
        .declare_class(
            ClassDecl::new("WideBase").method(
                MethodDecl::parse("add", "$a, $b")
                    .unwrap()
                    .with_body(Callable::returning(Value::Int(0))),
            ),
        )
        .unwrap();
    registry
        .declare_class(
            ClassDecl::new("ArityBase").method(
                MethodDecl::parse("add", "$x, $y, $z")
                    .unwrap()
                    .with_body(Callable::returning(Value::Int(0))),
            ),
        )
        .unwrap();

    let mut compatible = ClassBuilder::with_registry(registry.clone());
    compatible.set_extends("WideBase").add_interface("Calc");
    let class = compatible.create().unwrap();
    assert!(class.is_a("Calc"));

    let mut incompatible = ClassBuilder::with_registry(registry.clone());
    incompatible.set_extends("ArityBase").add_interface("Calc");
    assert_eq!(
        incompatible.create().unwrap_err(),
        SynthError::StructuralConstraint {
            reason: "declaration of add($x, $y, $z) must be compatible with Calc::add(array $a, array $b)"
                .to_string()
        }
    );

    // an override in the builder replaces the incompatible inherited body
    let mut overridden = ClassBuilder::with_registry(registry);
    overridden
        .set_extends("ArityBase")
        .add_interface("Calc")
        .add_method_with_signature(
            "add",
            Callable::returning(Value::Int(1)),
            "$a, $b, $z = null",
        );
    assert!(overridden.create().is_ok());
}

// ===== Extending Synthesized Classes =====

#[test]
fn test_extend_synthesized_class_keeps_parent_decorators() {
    init_tracing();
    let registry = registry();
    let parent_hits = Arc::new(AtomicUsize::new(0));
    let child_hits = Arc::new(AtomicUsize::new(0));

    let hits = parent_hits.clone();
    let mut parent = ClassBuilder::with_registry(registry.clone());
    parent
        .add_method("greet", Callable::returning(Value::Str("hello".into())))
        .add_decorator(around(move |jp| {
            hits.fetch_add(1, Ordering::SeqCst);
            jp.execute()
        }));
    let parent = parent.create().unwrap();
    assert_eq!(registry.get(parent.name()).unwrap().kind(), TypeKind::Class);

    let hits = child_hits.clone();
    let mut child = ClassBuilder::with_registry(registry.clone());
    child
        .set_extends(parent.name())
        .add_method("wave", Callable::returning(Value::Str("bye".into())))
        .add_decorator(around(move |jp| {
            hits.fetch_add(1, Ordering::SeqCst);
            jp.execute()
        }));
    let child = child.create().unwrap();

    assert!(child.is_a(parent.name()));
    let instance = child.instantiate();
    assert_eq!(instance.call("greet", &[]).unwrap(), Value::Str("hello".into()));
    assert_eq!(instance.call("wave", &[]).unwrap(), Value::Str("bye".into()));
    assert_eq!(parent_hits.load(Ordering::SeqCst), 1);
    assert_eq!(child_hits.load(Ordering::SeqCst), 1);
    assert_eq!(child.method("greet").unwrap().declaring_class, parent.name());
}

#[test]
fn test_extend_synthesized_class_checks_final_host_methods() {
    let registry = registry();
    let mut parent = ClassBuilder::with_registry(registry.clone());
    complete_repository(&mut parent);
    let parent = parent.create().unwrap();

    let mut child = ClassBuilder::with_registry(registry);
    child
        .set_extends(parent.name())
        .add_method("table", Callable::returning(Value::Null));
    assert!(matches!(
        child.create(),
        Err(SynthError::StructuralConstraint { .. })
    ));
}

// ===== Options =====

#[test]
fn test_options_from_toml() {
    let options = SynthOptions::from_toml_str(
        r#"
        class_name_prefix = "Double_"
        extra_reserved_names = ["shouldReceive"]
        "#,
    )
    .unwrap();

    let mut builder = ClassBuilder::with_registry(registry()).with_options(options.clone());
    builder.add_method("find", Callable::returning(Value::Null));
    let class = builder.create().unwrap();
    assert!(class.name().starts_with("Double_"));

    let mut reserved = ClassBuilder::with_registry(registry()).with_options(options);
    reserved.add_method("shouldReceive", Callable::returning(Value::Null));
    assert_eq!(
        reserved.create().unwrap_err(),
        SynthError::ReservedName {
            name: "shouldReceive".to_string()
        }
    );
}

#[test]
fn test_reserved_prefix_rejected() {
    let mut builder = ClassBuilder::with_registry(registry());
    builder.add_static_method("__mimicState", Callable::returning(Value::Null));
    assert!(matches!(
        builder.create(),
        Err(SynthError::ReservedName { .. })
    ));
}
