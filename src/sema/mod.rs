// src/sema/mod.rs
//! Semantic analysis for Shrike: the two-pass type checker, the type
//! lattice, symbol tables, and the node side-table handed to the code
//! generator.

pub mod analyzer;
pub mod class_table;
pub mod compatibility;
pub mod node_data;
pub mod scope;
pub mod types;

pub use analyzer::{Analysis, Analyzer, ImportError, TypeError, check_program};
pub use class_table::{ClassId, ClassTable};
pub use node_data::NodeData;
pub use scope::{NameInfo, Scope, ScopeKind};
pub use types::{FunctionType, Type};
