//! Mimic SDK - values, callables and interception primitives
//!
//! This crate holds the types shared between the synthesis engine and code
//! that supplies method implementations or decorators, so decorators can be
//! written without depending on `mimic-engine`.
//!
//! # Example
//!
//! ```ignore
//! use mimic_sdk::{around, arg, Callable, DecoratorChain, ParameterDescriptor, Value};
//! use std::sync::Arc;
//!
//! let add = Callable::new(
//!     vec![ParameterDescriptor::untyped("a"), ParameterDescriptor::untyped("b")],
//!     |args| Ok(Value::Int(arg::<i64>(args, 0)? + arg::<i64>(args, 1)?)),
//! );
//! let chain = DecoratorChain::new(vec![Arc::new(around(|jp| jp.execute()))]);
//! let sum = chain.invoke("Calc", "add", None, &[Value::Int(1), Value::Int(2)], &add)?;
//! ```

#![warn(missing_docs)]

pub mod callable;
pub mod chain;
pub mod decorator;
pub mod error;
pub mod join_point;
pub mod value;

pub use callable::{Callable, NativeFn, ParameterDescriptor, TypeConstraint, ARRAY_KEYWORD};
pub use chain::DecoratorChain;
pub use decorator::{after, around, before, on_error, After, Around, Before, Decorator, OnError};
pub use error::{CallError, CallResult};
pub use join_point::JoinPoint;
pub use value::{arg, FromValue, IntoValue, Object, ObjectRef, Value};
