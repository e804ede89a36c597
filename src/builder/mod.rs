//! Generating and compiling conformance checks.
//!
//! This module holds everything between a structure descriptor and a
//! compiler verdict: the assertion source generator, the compile-only
//! pipeline, the capability oracle that gates checks, and the toolchain
//! abstraction underneath.

pub mod capabilities;
pub mod compile;
pub mod source;
pub mod toolchain;

pub use capabilities::{Capability, CapabilityOracle, UnknownPolicy};
pub use compile::{CompileError, CompilerPipeline, HeaderProbe};
pub use source::{generate, AssertionUnit};
pub use toolchain::{detect_toolchain_with, GccToolchain, Toolchain, ToolchainPlatform};
