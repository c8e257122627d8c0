// src/sema/analyzer/stmt.rs

use crate::errors::SemanticError;
use crate::frontend::ast::{
    Block, ForStmt, IfStmt, JumpStmt, ReturnStmt, Stmt, WhileStmt,
};
use crate::sema::Type;
use crate::sema::compatibility::{is_consistent, is_subtype};

use super::Analyzer;

impl Analyzer<'_> {
    pub(crate) fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr_stmt) => {
                self.check_expr(&expr_stmt.expr);
            }
            Stmt::VarDecl(decl) => self.check_var_decl(decl),
            Stmt::FuncDecl(decl) => self.check_func_decl(decl),
            Stmt::ClassDecl(decl) => self.check_class_decl(decl),
            Stmt::Import(decl) => self.process_import(decl),
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::If(if_stmt) => self.check_if(if_stmt),
            Stmt::While(while_stmt) => self.check_while(while_stmt),
            Stmt::For(for_stmt) => self.check_for(for_stmt),
            Stmt::Block(block) => {
                self.enter_block();
                self.check_block_stmts(block);
                let snapshot = self.leave_scope();
                if !self.first_pass {
                    self.node_data.set_scope(block.id, snapshot);
                }
            }
            Stmt::Break(jump) | Stmt::Continue(jump) => self.check_jump(jump),
            Stmt::Throw(throw) => {
                self.check_expr(&throw.value);
                self.add_error(
                    SemanticError::UnsupportedSyntax {
                        what: "throw",
                        span: throw.span.into(),
                    },
                    throw.span,
                );
            }
            Stmt::Empty(_) => {}
        }
    }

    /// Check a block's statements in the current scope. The caller
    /// decides whether the block introduces a table of its own.
    pub(crate) fn check_block_stmts(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_jump(&mut self, jump: &JumpStmt) {
        if jump.label.is_some() {
            self.add_error(
                SemanticError::UnsupportedSyntax {
                    what: "labelled jumps",
                    span: jump.span.into(),
                },
                jump.span,
            );
        }
    }

    fn check_return(&mut self, ret: &ReturnStmt) {
        let value_ty = match &ret.value {
            Some(value) => self.check_expr(value),
            None => Type::Void,
        };

        let Some(slot) = self.scope.return_type().cloned() else {
            self.add_error(
                SemanticError::UnsupportedSyntax {
                    what: "return outside a function",
                    span: ret.span.into(),
                },
                ret.span,
            );
            return;
        };

        match slot {
            // The first return fixes an undeclared return type
            None => self.scope.set_return_type(value_ty),
            Some(expected) => {
                if is_subtype(&value_ty, &expected, &self.classes) {
                    return;
                }
                if is_consistent(&value_ty, &expected) {
                    if let Some(value) = &ret.value {
                        self.mark_coercion(value);
                    }
                    return;
                }
                self.add_error(
                    SemanticError::NotAssignable {
                        from: self.type_display(&value_ty),
                        to: self.type_display(&expected),
                        span: ret.span.into(),
                    },
                    ret.span,
                );
            }
        }
    }

    fn check_if(&mut self, if_stmt: &IfStmt) {
        // Tests coerce to boolean; any type is accepted
        self.check_expr(&if_stmt.test);

        let narrowing = self.narrowing_from_test(&if_stmt.test);
        let saved = self.type_overrides.clone();

        if let Some((sym, positive, _)) = &narrowing {
            self.type_overrides.insert(*sym, positive.clone());
        }
        self.check_stmt(&if_stmt.consequent);
        self.type_overrides = saved.clone();

        if let Some(alternate) = &if_stmt.alternate {
            if let Some((sym, _, negative)) = &narrowing {
                self.type_overrides.insert(*sym, negative.clone());
            }
            self.check_stmt(alternate);
            self.type_overrides = saved;
        }
    }

    fn check_while(&mut self, while_stmt: &WhileStmt) {
        self.check_expr(&while_stmt.test);

        // Narrowing is preserved across the loop body on the
        // positive side
        let narrowing = self.narrowing_from_test(&while_stmt.test);
        let saved = self.type_overrides.clone();
        if let Some((sym, positive, _)) = &narrowing {
            self.type_overrides.insert(*sym, positive.clone());
        }
        self.check_stmt(&while_stmt.body);
        self.type_overrides = saved;
    }

    fn check_for(&mut self, for_stmt: &ForStmt) {
        self.enter_block();

        if let Some(init) = &for_stmt.init {
            self.check_stmt(init);
        }
        let narrowing = for_stmt.test.as_ref().and_then(|test| {
            self.check_expr(test);
            self.narrowing_from_test(test)
        });

        let saved = self.type_overrides.clone();
        if let Some((sym, positive, _)) = &narrowing {
            self.type_overrides.insert(*sym, positive.clone());
        }
        self.check_stmt(&for_stmt.body);
        if let Some(update) = &for_stmt.update {
            self.check_expr(update);
        }
        self.type_overrides = saved;

        let snapshot = self.leave_scope();
        if !self.first_pass {
            self.node_data.set_scope(for_stmt.id, snapshot);
        }
    }
}
