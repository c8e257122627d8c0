// src/sema/analyzer/declarations.rs
//! Declaration handling for both passes.
//!
//! Pass 1 records names and signatures (and is where constructors are
//! validated); pass 2 re-enters bodies with fresh tables and checks
//! them fully. Class name shells are registered before pass 1 proper
//! so top-level declarations can reference classes in any order.

use crate::errors::SemanticError;
use crate::frontend::ast::{
    ClassDecl, ClassMember, FuncDecl, MethodDef, MethodKind, Param, Program, Stmt, VarDecl,
    VarKind,
};
use crate::frontend::Symbol;
use crate::sema::class_table::ClassId;
use crate::sema::compatibility::{is_consistent, is_subtype};
use crate::sema::scope::NameInfo;
use crate::sema::types::{FunctionType, Type};

use super::Analyzer;

impl Analyzer<'_> {
    /// Register a shell for every top-level class so forward
    /// references resolve regardless of declaration order.
    pub(crate) fn declare_class_shells(&mut self, program: &Program) {
        for stmt in &program.body {
            let Stmt::ClassDecl(decl) = stmt else {
                continue;
            };
            if self.classes.find(decl.name).is_some() {
                let name = self.name_str(decl.name).to_string();
                self.add_error(
                    SemanticError::DuplicateDeclaration {
                        name,
                        span: decl.span.into(),
                    },
                    decl.span,
                );
                continue;
            }
            let name = self.name_str(decl.name).to_string();
            let id = self.classes.declare(&name, decl.name, None);
            let mut info = NameInfo::type_name(Type::Instance(id));
            if decl.exported {
                info = info.exported();
            }
            self.define_or_duplicate(decl.name, info, decl.span);
        }
    }

    // ----- variables -------------------------------------------------------

    pub(crate) fn check_var_decl(&mut self, decl: &VarDecl) {
        for declarator in &decl.decls {
            let declared = declarator.ty.as_ref().map(|t| self.resolve_type_ann(t));
            let init_ty = declarator.init.as_ref().map(|init| self.check_expr(init));

            if let (Some(declared), Some(init_ty)) = (&declared, &init_ty)
                && !is_subtype(init_ty, declared, &self.classes)
            {
                if is_consistent(init_ty, declared) {
                    if let Some(init) = &declarator.init {
                        self.mark_coercion(init);
                    }
                } else {
                    self.add_error(
                        SemanticError::NotAssignable {
                            from: self.type_display(init_ty),
                            to: self.type_display(declared),
                            span: declarator.span.into(),
                        },
                        declarator.span,
                    );
                }
            }

            let var_ty = declared.or(init_ty).unwrap_or(Type::Any);
            let mut info = match decl.kind {
                VarKind::Const => NameInfo::constant(var_ty),
                VarKind::Let => NameInfo::var(var_ty),
            };
            if decl.exported {
                info = info.exported();
            }

            // Globals are bound in pass 1 and stay bound; local names
            // are re-recorded in each freshly built table of pass 2.
            if self.scope.is_global() {
                if self.first_pass {
                    self.define_or_duplicate(declarator.name, info, declarator.span);
                }
            } else {
                self.define_or_duplicate(declarator.name, info, declarator.span);
            }
        }
    }

    // ----- functions -------------------------------------------------------

    pub(crate) fn check_func_decl(&mut self, decl: &FuncDecl) {
        if self.function_depth > 0 || !self.scope.is_global() {
            self.add_error(
                SemanticError::NestedFunction {
                    span: decl.span.into(),
                },
                decl.span,
            );
            return;
        }
        if decl.is_async || decl.is_generator {
            self.add_error(
                SemanticError::UnsupportedSyntax {
                    what: if decl.is_async {
                        "async functions"
                    } else {
                        "generator functions"
                    },
                    span: decl.span.into(),
                },
                decl.span,
            );
            return;
        }

        let params = self.resolve_params(&decl.params);
        let declared_ret = decl.return_type.as_ref().map(|t| self.resolve_type_ann(t));

        if self.first_pass {
            let ret = self.infer_function_body(decl, &params, declared_ret);
            let mut info =
                NameInfo::function(Type::Function(FunctionType::new(params, ret)));
            if decl.exported {
                info = info.exported();
            }
            self.define_or_duplicate(decl.name, info, decl.span);
        } else {
            // The signature was fixed in pass 1; check the body
            // against it and hand the fresh table to the generator.
            let ret = match self.scope.get(decl.name).map(|info| &info.ty) {
                Some(Type::Function(sig)) => (*sig.return_type).clone(),
                _ => Type::Void,
            };
            self.enter_function();
            self.scope.set_return_type(ret);
            self.bind_params(&decl.params, &params);
            self.check_block_stmts(&decl.body);
            let snapshot = self.leave_function();
            self.node_data.set_scope(decl.id, snapshot);
        }
    }

    pub(crate) fn resolve_params(&mut self, params: &[Param]) -> Vec<Type> {
        params
            .iter()
            .map(|p| {
                p.ty.as_ref()
                    .map(|t| self.resolve_type_ann(t))
                    .unwrap_or(Type::Any)
            })
            .collect()
    }

    pub(crate) fn bind_params(&mut self, params: &[Param], types: &[Type]) {
        for (param, ty) in params.iter().zip(types) {
            self.define_or_duplicate(param.name, NameInfo::var(ty.clone()), param.span);
        }
    }

    /// Pass-1 descent into a function body: bind parameters, let the
    /// first `return` fix an undeclared return type, and otherwise
    /// run with unknown-name suppression.
    fn infer_function_body(
        &mut self,
        decl: &FuncDecl,
        params: &[Type],
        declared_ret: Option<Type>,
    ) -> Type {
        self.enter_function();
        if let Some(ret) = &declared_ret {
            self.scope.set_return_type(ret.clone());
        }
        self.bind_params(&decl.params, params);
        self.check_block_stmts(&decl.body);
        let inferred = self.scope.return_type().cloned().flatten();
        self.leave_function();
        declared_ret.or(inferred).unwrap_or(Type::Void)
    }

    // ----- classes ---------------------------------------------------------

    pub(crate) fn check_class_decl(&mut self, decl: &ClassDecl) {
        if self.function_depth > 0 || !self.scope.is_global() {
            self.add_error(
                SemanticError::ClassNotTopLevel {
                    span: decl.span.into(),
                },
                decl.span,
            );
            return;
        }
        if !decl.implements.is_empty() {
            self.add_error(
                SemanticError::UnsupportedSyntax {
                    what: "implements clauses",
                    span: decl.span.into(),
                },
                decl.span,
            );
            return;
        }
        if decl.is_abstract {
            self.add_error(
                SemanticError::UnsupportedSyntax {
                    what: "abstract classes",
                    span: decl.span.into(),
                },
                decl.span,
            );
            return;
        }

        let Some(id) = self.classes.find(decl.name) else {
            // Shell registration failed (duplicate); already reported
            return;
        };

        if self.first_pass {
            self.collect_class_signature(decl, id);
        } else {
            self.check_class_bodies(decl, id);
        }
    }

    fn collect_class_signature(&mut self, decl: &ClassDecl, id: ClassId) {
        if let Some(super_sym) = decl.superclass {
            match self.classes.find(super_sym) {
                Some(super_id) => {
                    if self.classes.get(super_id).is_leaf {
                        let name = self.name_str(super_sym).to_string();
                        self.add_error(
                            SemanticError::LeafClassExtended {
                                name,
                                span: decl.span.into(),
                            },
                            decl.span,
                        );
                    } else {
                        self.classes.get_mut(id).superclass = Some(super_id);
                    }
                }
                None => {
                    let name = self.name_str(super_sym).to_string();
                    self.add_error(
                        SemanticError::UnknownTypeName {
                            name,
                            span: decl.span.into(),
                        },
                        decl.span,
                    );
                }
            }
        }

        // Properties first, so method bodies visited below can see
        // every `this.p`.
        for member in &decl.members {
            if let ClassMember::Property(prop) = member {
                let ty = prop
                    .ty
                    .as_ref()
                    .map(|t| self.resolve_type_ann(t))
                    .unwrap_or(Type::Any);
                if !self.classes.add_property(id, prop.name, ty) {
                    let name = self.name_str(prop.name).to_string();
                    self.add_error(
                        SemanticError::DuplicateDeclaration {
                            name,
                            span: prop.span.into(),
                        },
                        prop.span,
                    );
                }
            }
        }

        // Record every method signature before visiting any body, so
        // methods can call each other regardless of order. A method
        // without a declared return type starts as `any` and is
        // patched once its body has been visited.
        let mut ctor_body = None;
        for member in &decl.members {
            let ClassMember::Method(method) = member else {
                continue;
            };
            match method.kind {
                MethodKind::Get | MethodKind::Set => {
                    self.add_error(
                        SemanticError::UnsupportedSyntax {
                            what: "getters and setters",
                            span: method.span.into(),
                        },
                        method.span,
                    );
                }
                MethodKind::Constructor => {
                    let params = self.resolve_params(&method.params);
                    self.classes.get_mut(id).constructor =
                        Some(FunctionType::new(params, Type::Void));
                    ctor_body = Some(&method.body);
                }
                MethodKind::Method => {
                    let params = self.resolve_params(&method.params);
                    let declared_ret = method
                        .return_type
                        .as_ref()
                        .map(|t| self.resolve_type_ann(t))
                        .unwrap_or(Type::Any);
                    if !self
                        .classes
                        .add_method(id, method.name, FunctionType::new(params, declared_ret))
                    {
                        let name = self.name_str(method.name).to_string();
                        self.add_error(
                            SemanticError::DuplicateDeclaration {
                                name,
                                span: method.span.into(),
                            },
                            method.span,
                        );
                    }
                }
            }
        }

        for member in &decl.members {
            let ClassMember::Method(method) = member else {
                continue;
            };
            match method.kind {
                MethodKind::Get | MethodKind::Set => {}
                MethodKind::Constructor => {
                    let params = self.resolve_params(&method.params);
                    self.visit_method_body(id, method, &params, Some(Type::Void));
                }
                MethodKind::Method => {
                    let params = self.resolve_params(&method.params);
                    let declared_ret =
                        method.return_type.as_ref().map(|t| self.resolve_type_ann(t));
                    let ret = self.visit_method_body(id, method, &params, declared_ret.clone());
                    if declared_ret.is_none() {
                        self.classes.set_method_return(id, method.name, ret);
                    }
                }
            }
        }

        self.classes.seal(id);
        self.validate_constructor(decl, id, ctor_body);
    }

    /// Pass-1 body descent shared by methods and constructors; infers
    /// an undeclared return type the same way functions do.
    fn visit_method_body(
        &mut self,
        id: ClassId,
        method: &MethodDef,
        params: &[Type],
        declared_ret: Option<Type>,
    ) -> Type {
        let outer_class = self.current_class.replace(id);
        let was_ctor = self.in_constructor;
        self.in_constructor = method.kind == MethodKind::Constructor;

        self.enter_function();
        if let Some(ret) = &declared_ret {
            self.scope.set_return_type(ret.clone());
        }
        self.bind_params(&method.params, params);
        self.check_block_stmts(&method.body);
        let inferred = self.scope.return_type().cloned().flatten();
        self.leave_function();

        self.current_class = outer_class;
        self.in_constructor = was_ctor;
        declared_ret.or(inferred).unwrap_or(Type::Void)
    }

    /// Pass 2: type-check method bodies with fresh tables.
    fn check_class_bodies(&mut self, decl: &ClassDecl, id: ClassId) {
        for member in &decl.members {
            let ClassMember::Method(method) = member else {
                continue;
            };
            if matches!(method.kind, MethodKind::Get | MethodKind::Set) {
                continue;
            }

            let params = self.resolve_params(&method.params);
            let ret = match method.kind {
                MethodKind::Constructor => Type::Void,
                _ => self
                    .method_signature(id, method.name)
                    .map(|sig| (*sig.return_type).clone())
                    .unwrap_or(Type::Void),
            };

            let outer_class = self.current_class.replace(id);
            let was_ctor = self.in_constructor;
            self.in_constructor = method.kind == MethodKind::Constructor;

            self.enter_function();
            self.scope.set_return_type(ret);
            self.bind_params(&method.params, &params);
            self.check_block_stmts(&method.body);
            let snapshot = self.leave_function();
            self.node_data.set_scope(method.id, snapshot);

            self.current_class = outer_class;
            self.in_constructor = was_ctor;
        }
    }

    fn method_signature(&self, id: ClassId, name: Symbol) -> Option<FunctionType> {
        match self.classes.find_member(id, name) {
            Some(crate::sema::class_table::FoundMember::Method(sig)) => Some(sig),
            _ => None,
        }
    }
}
