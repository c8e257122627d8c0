// src/sema/class_table.rs
//! Registry of declared classes.
//!
//! `Type::Instance` carries only a `ClassId`; everything the checker
//! knows about a class lives here. A class is mutable while its
//! declaration is being visited and is sealed (properties sorted,
//! unboxed cutoff computed) at the end of that visit.

use rustc_hash::FxHashMap;

use crate::frontend::Symbol;
use crate::sema::types::{FunctionType, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

#[derive(Debug, Clone)]
pub struct PropertySlot {
    pub name: Symbol,
    pub ty: Type,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct MethodSlot {
    pub name: Symbol,
    pub ty: FunctionType,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    /// Resolved source name, for diagnostics and the code generator
    pub name: String,
    pub symbol: Symbol,
    /// None means the class extends the root object type
    pub superclass: Option<ClassId>,
    pub properties: Vec<PropertySlot>,
    pub methods: Vec<MethodSlot>,
    pub constructor: Option<FunctionType>,
    /// Leaf classes cannot be extended
    pub is_leaf: bool,
    /// Properties at indices below this are stored unboxed
    pub unboxed_count: usize,
    pub sealed: bool,
}

impl ClassDef {
    fn new(name: String, symbol: Symbol, superclass: Option<ClassId>) -> Self {
        Self {
            name,
            symbol,
            superclass,
            properties: Vec::new(),
            methods: Vec::new(),
            constructor: None,
            is_leaf: false,
            unboxed_count: 0,
            sealed: false,
        }
    }
}

/// Where a named member was found on a class
#[derive(Debug, Clone)]
pub enum FoundMember {
    /// Property type, its slot index, and the unboxed cutoff of the
    /// class that declares it
    Property(Type, usize, usize),
    Method(FunctionType),
}

#[derive(Debug, Default, Clone)]
pub struct ClassTable {
    classes: Vec<ClassDef>,
    by_symbol: FxHashMap<Symbol, ClassId>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, symbol: Symbol, superclass: Option<ClassId>) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassDef::new(name.to_string(), symbol, superclass));
        self.by_symbol.insert(symbol, id);
        id
    }

    pub fn get(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0 as usize]
    }

    pub fn find(&self, symbol: Symbol) -> Option<ClassId> {
        self.by_symbol.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Add a declared property. Fails on a duplicate member name.
    pub fn add_property(&mut self, id: ClassId, name: Symbol, ty: Type) -> bool {
        let def = self.get_mut(id);
        if def.properties.iter().any(|p| p.name == name)
            || def.methods.iter().any(|m| m.name == name)
        {
            return false;
        }
        let index = def.properties.len();
        def.properties.push(PropertySlot { name, ty, index });
        true
    }

    /// Add a method signature. Fails on a duplicate member name.
    pub fn add_method(&mut self, id: ClassId, name: Symbol, ty: FunctionType) -> bool {
        let def = self.get_mut(id);
        if def.properties.iter().any(|p| p.name == name)
            || def.methods.iter().any(|m| m.name == name)
        {
            return false;
        }
        let index = def.methods.len();
        def.methods.push(MethodSlot { name, ty, index });
        true
    }

    /// Patch a method's return type once pass-1 inference concludes.
    pub fn set_method_return(&mut self, id: ClassId, name: Symbol, ret: Type) {
        if let Some(slot) = self.get_mut(id).methods.iter_mut().find(|m| m.name == name) {
            slot.ty.return_type = Box::new(ret);
        }
    }

    /// Freeze a class at the end of its declaration visit: unboxed
    /// primitive properties move to the leading indices and the
    /// cutoff is recorded.
    pub fn seal(&mut self, id: ClassId) {
        let def = self.get_mut(id);
        def.properties.sort_by_key(|p| !p.ty.is_unboxed());
        for (index, prop) in def.properties.iter_mut().enumerate() {
            prop.index = index;
        }
        def.unboxed_count = def.properties.iter().filter(|p| p.ty.is_unboxed()).count();
        def.sealed = true;
    }

    /// Resolve a named member along the superclass chain.
    pub fn find_member(&self, id: ClassId, name: Symbol) -> Option<FoundMember> {
        let mut current = Some(id);
        while let Some(class_id) = current {
            let def = self.get(class_id);
            if let Some(prop) = def.properties.iter().find(|p| p.name == name) {
                return Some(FoundMember::Property(
                    prop.ty.clone(),
                    prop.index,
                    def.unboxed_count,
                ));
            }
            if let Some(method) = def.methods.iter().find(|m| m.name == name) {
                return Some(FoundMember::Method(method.ty.clone()));
            }
            current = def.superclass;
        }
        None
    }

    /// The constructor a `new` or `super()` call resolves against;
    /// inherited from the superclass chain, implicit zero-argument
    /// when nothing in the chain declares one.
    pub fn constructor_of(&self, id: ClassId) -> FunctionType {
        let mut current = Some(id);
        while let Some(class_id) = current {
            let def = self.get(class_id);
            if let Some(ctor) = &def.constructor {
                return ctor.clone();
            }
            current = def.superclass;
        }
        FunctionType::new(Vec::new(), Type::Void)
    }

    /// Walk the superclass chain from `sub` looking for `sup`.
    pub fn is_descendant(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut current = Some(sub);
        while let Some(class_id) = current {
            if class_id == sup {
                return true;
            }
            current = self.get(class_id).superclass;
        }
        false
    }

    /// Nearest common ancestor of two classes, if any.
    pub fn common_ancestor(&self, a: ClassId, b: ClassId) -> Option<ClassId> {
        let mut current = Some(a);
        while let Some(class_id) = current {
            if self.is_descendant(b, class_id) {
                return Some(class_id);
            }
            current = self.get(class_id).superclass;
        }
        None
    }
}
