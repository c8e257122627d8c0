// src/sema/node_data.rs
//! Node-level metadata produced by the checker.
//!
//! NodeData is the sole channel between the checker and the code
//! generator: per-expression static types, coercion markers, and the
//! symbol table of each scope-introducing node. Entries are written
//! only during the second pass and are write-once.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::frontend::NodeId;
use crate::sema::Scope;
use crate::sema::Type;

#[derive(Debug, Default, Clone)]
pub struct NodeData {
    types: FxHashMap<NodeId, Type>,
    coercions: FxHashSet<NodeId>,
    scopes: FxHashMap<NodeId, Scope>,
}

impl NodeData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the static type of an expression; the first write wins.
    pub fn set_type(&mut self, node: NodeId, ty: Type) {
        self.types.entry(node).or_insert(ty);
    }

    pub fn get_type(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }

    /// Mark an expression as needing a runtime adapter at its
    /// boundary. Every marked node also ends the pass with a recorded
    /// static type.
    pub fn set_coercion(&mut self, node: NodeId) {
        self.coercions.insert(node);
    }

    pub fn has_coercion(&self, node: NodeId) -> bool {
        self.coercions.contains(&node)
    }

    /// Attach the symbol table the code generator must use for a
    /// scope-introducing node (program, block, for, function body).
    pub fn set_scope(&mut self, node: NodeId, scope: Scope) {
        self.scopes.entry(node).or_insert(scope);
    }

    pub fn get_scope(&self, node: NodeId) -> Option<&Scope> {
        self.scopes.get(&node)
    }

    pub fn typed_nodes(&self) -> impl Iterator<Item = (&NodeId, &Type)> {
        self.types.iter()
    }
}
