//! Runtime class synthesis
//!
//! A synthesized class is a pair of dispatch tables (instance and static)
//! mapping method names to bound methods. Each bound method carries its
//! implementation, its parameter descriptors and the decorator chain that
//! was frozen when the class was created.

mod builder;
mod class;
mod validate;

pub use builder::{ClassBuilder, IntoSignature};
pub use class::{BoundMethod, ClassHandle, Instance};
