// src/sema/analyzer/imports.rs
//! Named imports, resolved through the caller-supplied importer.
//! Imports happen only during pass 1 and only at the global scope;
//! the resolver copies exported infos into the local global table.

use crate::errors::SemanticError;
use crate::frontend::ast::ImportDecl;

use super::{Analyzer, ImportError};

impl Analyzer<'_> {
    pub(crate) fn process_import(&mut self, decl: &ImportDecl) {
        if !self.first_pass {
            return;
        }
        if !self.scope.is_global() || self.function_depth > 0 {
            self.add_error(
                SemanticError::ImportNotAtTopLevel {
                    span: decl.span.into(),
                },
                decl.span,
            );
            return;
        }
        let Some(importer) = self.importer.as_mut() else {
            self.add_error(
                SemanticError::ImportFailed {
                    message: "imports are not available".to_string(),
                    span: decl.span.into(),
                },
                decl.span,
            );
            return;
        };

        match importer(&decl.source) {
            Ok(table) => {
                for import in &decl.names {
                    match table.get_local(import.name) {
                        Some(info) if info.is_exported => {
                            if !self.scope.import_symbol(import.name, info) {
                                let name = self.name_str(import.name).to_string();
                                self.add_error(
                                    SemanticError::DuplicateDeclaration {
                                        name,
                                        span: import.span.into(),
                                    },
                                    import.span,
                                );
                            }
                        }
                        Some(_) => {
                            let name = self.name_str(import.name).to_string();
                            self.add_error(
                                SemanticError::NotExported {
                                    name,
                                    span: import.span.into(),
                                },
                                import.span,
                            );
                        }
                        None => {
                            let name = self.name_str(import.name).to_string();
                            self.add_error(
                                SemanticError::ImportSymbolNotFound {
                                    name,
                                    span: import.span.into(),
                                },
                                import.span,
                            );
                        }
                    }
                }
            }
            Err(ImportError::Log(log)) => {
                // The imported file's own diagnostics come through
                // verbatim, headed by the file that produced them
                self.add_error(
                    SemanticError::ImportFailed {
                        message: format!("errors in imported file: {}", decl.source),
                        span: decl.span.into(),
                    },
                    decl.span,
                );
                self.errors.extend(log);
            }
            Err(ImportError::Message(message)) => {
                self.add_error(
                    SemanticError::ImportFailed {
                        message,
                        span: decl.span.into(),
                    },
                    decl.span,
                );
            }
        }
    }
}
