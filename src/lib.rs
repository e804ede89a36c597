//! abi-conform - ABI conformance checks for native structure bindings
//!
//! Verifies that structure bindings have the same layout as the structures
//! in the platform's system headers. For every binding, a C translation unit
//! of `_Static_assert`s about offsets and sizes is generated and compiled
//! (never linked or run) against the real headers; a clean compile proves
//! conformance and a failed one names the field that diverged.

pub mod builder;
pub mod catalog;
pub mod core;
pub mod ops;
pub mod util;

pub use builder::{CapabilityOracle, CompilerPipeline};
pub use catalog::{BindingCatalog, FieldEnumerator};
pub use crate::core::{FieldDescriptor, HeaderSet, LayoutMismatch, StructureDescriptor};
pub use ops::conform::{conform, ConformOptions, ConformReport};
