//! Mimic engine - runtime class synthesis for mocks and proxies
//!
//! Given method names, implementing closures and structural constraints
//! (superclass, interfaces, static/instance qualifiers), the engine
//! synthesizes a new class whose methods dispatch through a decorator chain
//! before reaching the supplied behaviour.
//!
//! # Modules
//!
//! - `inspect` - signature inspection and explicit signature parsing
//! - `registry` - host classes and interfaces, plus every synthesized class
//! - `synth` - the class builder, validation and dispatch
//! - `options` - synthesis options
//!
//! # Example
//!
//! ```ignore
//! use mimic_engine::ClassBuilder;
//! use mimic_sdk::{arg, Callable, ParameterDescriptor, Value};
//!
//! let mut builder = ClassBuilder::new();
//! builder.add_static_method(
//!     "multiply",
//!     Callable::new(
//!         vec![ParameterDescriptor::untyped("a"), ParameterDescriptor::untyped("b")],
//!         |args| Ok(Value::Int(arg::<i64>(args, 0)? * arg::<i64>(args, 1)?)),
//!     ),
//! );
//! let class = builder.create()?;
//! assert_eq!(class.call_static("multiply", &[Value::Int(2), Value::Int(5)])?, Value::Int(10));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod inspect;
pub mod options;
pub mod registry;
pub mod synth;

pub use error::{SynthError, SynthResult};
pub use inspect::{inspect, parse_signature, signature_args};
pub use options::SynthOptions;
pub use registry::{ClassDecl, ClassId, InterfaceDecl, MethodDecl, TypeDecl, TypeKind, TypeRegistry};
pub use synth::{BoundMethod, ClassBuilder, ClassHandle, Instance, IntoSignature};

pub use mimic_sdk;
