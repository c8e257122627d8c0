// src/errors/mod.rs
//! Structured diagnostics for the Shrike checker.

pub mod sema;

pub use sema::SemanticError;
