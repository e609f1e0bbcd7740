//! Classes Module
//!
//! The class/spec registry and the layout index derived from it.

pub mod layout;
pub mod registry;

pub use layout::{build_index, LayoutIndex, LayoutTable};
pub use registry::{ClassSpecEntry, ClassSpecRegistry};
