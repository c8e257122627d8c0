// src/sema/scope.rs

use rustc_hash::FxHashMap;

use crate::frontend::Symbol;
use crate::sema::Type;

/// Per-identifier record held in a symbol table
#[derive(Debug, Clone)]
pub struct NameInfo {
    pub ty: Type,
    pub is_const: bool,
    pub is_function: bool,
    pub is_type_name: bool,
    pub is_exported: bool,
}

impl NameInfo {
    pub fn var(ty: Type) -> Self {
        Self {
            ty,
            is_const: false,
            is_function: false,
            is_type_name: false,
            is_exported: false,
        }
    }

    pub fn constant(ty: Type) -> Self {
        Self {
            is_const: true,
            ..Self::var(ty)
        }
    }

    pub fn function(ty: Type) -> Self {
        Self {
            is_function: true,
            ..Self::var(ty)
        }
    }

    pub fn type_name(ty: Type) -> Self {
        Self {
            is_type_name: true,
            ..Self::var(ty)
        }
    }

    pub fn exported(mut self) -> Self {
        self.is_exported = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum ScopeKind {
    Global,
    /// Declared or inferred return type of the enclosing function;
    /// None until inference concludes
    Function { return_type: Option<Type> },
    Block,
}

/// One symbol table in the global/function/block chain.
///
/// The chain is owned: entering a scope takes the current table as
/// the new table's parent, leaving hands it back (`into_parent`).
#[derive(Debug, Clone)]
pub struct Scope {
    kind: ScopeKind,
    names: FxHashMap<Symbol, NameInfo>,
    parent: Option<Box<Scope>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            kind: ScopeKind::Block,
            names: FxHashMap::default(),
            parent: None,
        }
    }
}

impl Scope {
    pub fn global() -> Self {
        Self {
            kind: ScopeKind::Global,
            names: FxHashMap::default(),
            parent: None,
        }
    }

    pub fn function(parent: Scope) -> Self {
        Self {
            kind: ScopeKind::Function { return_type: None },
            names: FxHashMap::default(),
            parent: Some(Box::new(parent)),
        }
    }

    pub fn block(parent: Scope) -> Self {
        Self {
            kind: ScopeKind::Block,
            names: FxHashMap::default(),
            parent: Some(Box::new(parent)),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self.kind, ScopeKind::Global)
    }

    /// Record a name. A name may be recorded once per scope;
    /// re-recording fails.
    pub fn define(&mut self, name: Symbol, info: NameInfo) -> bool {
        if self.names.contains_key(&name) {
            return false;
        }
        self.names.insert(name, info);
        true
    }

    /// Search the chain to the root
    pub fn get(&self, name: Symbol) -> Option<&NameInfo> {
        self.names
            .get(&name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(name)))
    }

    /// Query only this table
    pub fn get_local(&self, name: Symbol) -> Option<&NameInfo> {
        self.names.get(&name)
    }

    /// The return-type slot of the nearest enclosing function scope
    pub fn return_type(&self) -> Option<&Option<Type>> {
        match &self.kind {
            ScopeKind::Function { return_type } => Some(return_type),
            _ => self.parent.as_ref().and_then(|p| p.return_type()),
        }
    }

    /// Fix the return type of the nearest enclosing function scope
    pub fn set_return_type(&mut self, ty: Type) {
        match &mut self.kind {
            ScopeKind::Function { return_type } => *return_type = Some(ty),
            _ => {
                if let Some(parent) = self.parent.as_mut() {
                    parent.set_return_type(ty);
                }
            }
        }
    }

    /// Copy a single symbol produced by an importer into this (global)
    /// table under the imported name.
    pub fn import_symbol(&mut self, name: Symbol, info: &NameInfo) -> bool {
        debug_assert!(self.is_global());
        self.define(name, info.clone())
    }

    pub fn into_parent(self) -> Option<Scope> {
        self.parent.map(|b| *b)
    }

    /// Snapshot of this table alone, for the side-table; the parent
    /// chain is not carried along.
    pub fn detach(&self) -> Scope {
        Scope {
            kind: self.kind.clone(),
            names: self.names.clone(),
            parent: None,
        }
    }

    /// Iterate the names recorded directly in this table
    pub fn local_names(&self) -> impl Iterator<Item = (&Symbol, &NameInfo)> {
        self.names.iter()
    }
}
