//! Core data model: descriptors, name resolution, skip list and mismatch reports.

pub mod descriptor;
pub mod mismatch;
pub mod naming;
pub mod skip;

pub use descriptor::{
    DescriptorError, ElementType, FieldDescriptor, HeaderSet, RawField, StructureDescriptor,
};
pub use mismatch::{LayoutMismatch, MismatchKind};
pub use naming::{resolve_field_name, NameStyle};
pub use skip::SkipList;
