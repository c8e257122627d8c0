// src/sema/analyzer/builtins.rs
//! Builtin types seeded into a parentless global scope before pass 1.
//! Currently only the byte-array class: leaf, exported, with a
//! two-argument (size, fill) constructor, an integer element type on
//! indexed access, and a read-only integer `.length`.

use crate::sema::scope::NameInfo;
use crate::sema::types::{FunctionType, Type};

use super::Analyzer;

pub(crate) const BYTE_ARRAY_CLASS: &str = "Uint8Array";

impl Analyzer<'_> {
    pub(crate) fn install_builtins(&mut self) {
        if !self.scope.is_global() {
            return;
        }
        // The interner is the parser's; a program that never mentions
        // the class has no symbol for it and nothing to bind.
        let Some(sym) = self.interner.get(BYTE_ARRAY_CLASS) else {
            return;
        };
        if self.classes.find(sym).is_some() {
            return;
        }

        let id = self.classes.declare(BYTE_ARRAY_CLASS, sym, None);
        let def = self.classes.get_mut(id);
        def.constructor = Some(FunctionType::new(
            vec![Type::Integer, Type::Integer],
            Type::Void,
        ));
        def.is_leaf = true;
        def.sealed = true;
        self.byte_array = Some(id);

        self.scope
            .define(sym, NameInfo::type_name(Type::Instance(id)).exported());
    }
}
