// src/sema/analyzer/ctor.rs
//! Constructor discipline: every declared property must be assigned
//! by a top-level `this.p = ...` in the constructor, and `super()`
//! must appear exactly once at the top level when the class extends
//! anything but the root object type.
//!
//! The walk runs during pass 1, driven by delegation from the class
//! declaration visit. Only statements that are direct children of
//! the constructor body count as top-level.

use crate::errors::SemanticError;
use crate::frontend::ast::{
    ArrowBody, AssignOp, Block, ClassDecl, Expr, ExprKind, MemberProp, Stmt,
};
use crate::frontend::{Span, Symbol};
use crate::sema::class_table::ClassId;

use super::Analyzer;

struct CtorValidator {
    /// Own declared properties, each with an initialised flag
    properties: Vec<(Symbol, bool)>,
    super_called: bool,
    misplaced_super: Vec<Span>,
}

impl CtorValidator {
    fn new(properties: Vec<Symbol>) -> Self {
        Self {
            properties: properties.into_iter().map(|p| (p, false)).collect(),
            super_called: false,
            misplaced_super: Vec::new(),
        }
    }

    fn mark_initialised(&mut self, name: Symbol) {
        if let Some(slot) = self.properties.iter_mut().find(|(p, _)| *p == name) {
            slot.1 = true;
        }
    }

    fn visit_top_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr_stmt) => self.visit_top_expr(&expr_stmt.expr),
            other => self.visit_nested_stmt(other),
        }
    }

    /// A statement that is a direct child of the constructor body
    fn visit_top_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Assign(assign)
                if assign.op == AssignOp::Assign && this_property(&assign.target).is_some() =>
            {
                let name = this_property(&assign.target).unwrap();
                self.mark_initialised(name);
                self.visit_expr(&assign.value);
            }
            ExprKind::Call(call) if matches!(call.callee.kind, ExprKind::Super) => {
                if self.super_called {
                    self.misplaced_super.push(expr.span);
                } else {
                    self.super_called = true;
                }
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            _ => self.visit_expr(expr),
        }
    }

    fn visit_nested_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr_stmt) => self.visit_expr(&expr_stmt.expr),
            Stmt::VarDecl(decl) => {
                for declarator in &decl.decls {
                    if let Some(init) = &declarator.init {
                        self.visit_expr(init);
                    }
                }
            }
            Stmt::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.visit_expr(value);
                }
            }
            Stmt::If(if_stmt) => {
                self.visit_expr(&if_stmt.test);
                self.visit_nested_stmt(&if_stmt.consequent);
                if let Some(alternate) = &if_stmt.alternate {
                    self.visit_nested_stmt(alternate);
                }
            }
            Stmt::While(while_stmt) => {
                self.visit_expr(&while_stmt.test);
                self.visit_nested_stmt(&while_stmt.body);
            }
            Stmt::For(for_stmt) => {
                if let Some(init) = &for_stmt.init {
                    self.visit_nested_stmt(init);
                }
                if let Some(test) = &for_stmt.test {
                    self.visit_expr(test);
                }
                if let Some(update) = &for_stmt.update {
                    self.visit_expr(update);
                }
                self.visit_nested_stmt(&for_stmt.body);
            }
            Stmt::Block(block) => {
                for stmt in &block.stmts {
                    self.visit_nested_stmt(stmt);
                }
            }
            Stmt::Throw(throw) => self.visit_expr(&throw.value),
            Stmt::FuncDecl(_)
            | Stmt::ClassDecl(_)
            | Stmt::Import(_)
            | Stmt::Break(_)
            | Stmt::Continue(_)
            | Stmt::Empty(_) => {}
        }
    }

    /// Any `super(...)` reached through here is not a top-level call
    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Call(call) => {
                if matches!(call.callee.kind, ExprKind::Super) {
                    self.misplaced_super.push(expr.span);
                } else {
                    self.visit_expr(&call.callee);
                }
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::Assign(assign) => {
                self.visit_expr(&assign.target);
                self.visit_expr(&assign.value);
            }
            ExprKind::Unary(unary) => self.visit_expr(&unary.operand),
            ExprKind::Update(update) => self.visit_expr(&update.operand),
            ExprKind::Binary(binary) => {
                self.visit_expr(&binary.left);
                self.visit_expr(&binary.right);
            }
            ExprKind::Logical(logical) => {
                self.visit_expr(&logical.left);
                self.visit_expr(&logical.right);
            }
            ExprKind::Member(member) => {
                self.visit_expr(&member.object);
                if let MemberProp::Computed(index) = &member.property {
                    self.visit_expr(index);
                }
            }
            ExprKind::New(new_expr) => {
                for arg in &new_expr.args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::Conditional(cond) => {
                self.visit_expr(&cond.test);
                self.visit_expr(&cond.consequent);
                self.visit_expr(&cond.alternate);
            }
            ExprKind::Array(elements) => {
                for element in elements {
                    self.visit_expr(element);
                }
            }
            ExprKind::Paren(inner) => self.visit_expr(inner),
            ExprKind::Arrow(arrow) => match &arrow.body {
                ArrowBody::Expr(body) => self.visit_expr(body),
                ArrowBody::Block(block) => {
                    for stmt in &block.stmts {
                        self.visit_nested_stmt(stmt);
                    }
                }
            },
            ExprKind::Number(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::Super => {}
        }
    }
}

/// `this.p` as an assignment target
fn this_property(target: &Expr) -> Option<Symbol> {
    let ExprKind::Member(member) = &target.kind else {
        return None;
    };
    if !matches!(member.object.kind, ExprKind::This) {
        return None;
    }
    match &member.property {
        MemberProp::Named { name, .. } => Some(*name),
        MemberProp::Computed(_) => None,
    }
}

impl Analyzer<'_> {
    pub(crate) fn validate_constructor(
        &mut self,
        decl: &ClassDecl,
        id: ClassId,
        ctor_body: Option<&Block>,
    ) {
        let own_properties: Vec<Symbol> = self
            .classes
            .get(id)
            .properties
            .iter()
            .map(|p| p.name)
            .collect();
        let superclass = self.classes.get(id).superclass;

        let report_span = ctor_body.map(|b| b.span).unwrap_or(decl.span);
        let mut validator = CtorValidator::new(own_properties);

        match ctor_body {
            Some(body) => {
                for stmt in &body.stmts {
                    validator.visit_top_stmt(stmt);
                }
                if let Some(_super_id) = superclass
                    && !validator.super_called
                {
                    self.add_error(
                        SemanticError::SuperNotCalled {
                            span: report_span.into(),
                        },
                        report_span,
                    );
                }
            }
            None => {
                // The implicit constructor initialises nothing and
                // calls super() only when the superclass constructor
                // takes no parameters.
                if let Some(super_id) = superclass
                    && !self.classes.constructor_of(super_id).params.is_empty()
                {
                    self.add_error(
                        SemanticError::SuperNotCalled {
                            span: report_span.into(),
                        },
                        report_span,
                    );
                }
            }
        }

        for (name, initialised) in &validator.properties {
            if !initialised {
                let name = self.name_str(*name).to_string();
                self.add_error(
                    SemanticError::UninitializedProperty {
                        name,
                        span: report_span.into(),
                    },
                    report_span,
                );
            }
        }
        for span in validator.misplaced_super {
            self.add_error(
                SemanticError::CannotCallSuperHere { span: span.into() },
                span,
            );
        }
    }
}
