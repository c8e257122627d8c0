// src/sema/analyzer/expr.rs

use smallvec::SmallVec;

use crate::errors::SemanticError;
use crate::frontend::ast::{
    ArrowBody, ArrowFunc, AssignExpr, AssignOp, BinaryExpr, BinaryOp, CallExpr, ConditionalExpr,
    Expr, ExprKind, LogicalExpr, LogicalOp, MemberExpr, MemberProp, NewExpr, UnaryExpr, UnaryOp,
    UpdateExpr,
};
use crate::frontend::Span;
use crate::sema::compatibility::{
    actual_element_type, common_super_type, is_consistent, is_subtype,
};
use crate::sema::types::{FunctionType, Type};

use super::Analyzer;

impl Analyzer<'_> {
    pub(crate) fn check_expr(&mut self, expr: &Expr) -> Type {
        let ty = self.check_expr_inner(expr);
        self.record_expr_type(expr, ty.clone());
        ty
    }

    fn check_expr_inner(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::Number(lit) => {
                if lit.is_integer() {
                    Type::Integer
                } else {
                    Type::Float
                }
            }
            ExprKind::Str(_) => Type::String,
            ExprKind::Bool(_) => Type::Boolean,
            ExprKind::Null => Type::Null,

            ExprKind::Identifier(sym) => {
                if let Some(ty) = self.type_overrides.get(sym) {
                    return ty.clone();
                }
                if let Some(info) = self.scope.get(*sym) {
                    let ty = info.ty.clone();
                    if info.is_type_name {
                        let name = self.name_str(*sym).to_string();
                        self.add_error(
                            SemanticError::TypeNameAsValue {
                                name,
                                span: expr.span.into(),
                            },
                            expr.span,
                        );
                    }
                    return ty;
                }
                if self.name_str(*sym) == "undefined" {
                    return Type::Null;
                }
                // Forward references must succeed during pass 1
                if !self.first_pass {
                    let name = self.name_str(*sym).to_string();
                    self.add_error(
                        SemanticError::UnknownName {
                            name,
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                }
                Type::Any
            }

            ExprKind::This => match self.current_class {
                Some(id) => Type::Instance(id),
                None => {
                    self.add_error(
                        SemanticError::ThisOutsideClass {
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                    Type::Any
                }
            },

            ExprKind::Super => {
                self.add_error(
                    SemanticError::UnsupportedSyntax {
                        what: "super outside a call",
                        span: expr.span.into(),
                    },
                    expr.span,
                );
                Type::Any
            }

            ExprKind::Array(elements) => {
                let mut element_ty: Option<Type> = None;
                for element in elements {
                    let ty = self.check_expr(element);
                    element_ty = Some(match element_ty {
                        None => ty,
                        Some(prev) => match common_super_type(&prev, &ty, &self.classes) {
                            Some(joined) => joined,
                            None => Type::Any,
                        },
                    });
                }
                Type::array(element_ty.unwrap_or(Type::Any))
            }

            ExprKind::Paren(inner) => self.check_expr(inner),

            ExprKind::Unary(unary) => self.check_unary(expr, unary),
            ExprKind::Update(update) => self.check_update(expr, update),
            ExprKind::Binary(binary) => self.check_binary(expr, binary),
            ExprKind::Logical(logical) => self.check_logical(expr, logical),
            ExprKind::Assign(assign) => self.check_assign(expr, assign),
            ExprKind::Member(member) => self.check_member(expr, member),
            ExprKind::Call(call) => self.check_call(expr, call),
            ExprKind::New(new_expr) => self.check_new(expr, new_expr),
            ExprKind::Conditional(cond) => self.check_conditional(expr, cond),
            ExprKind::Arrow(arrow) => self.check_arrow(arrow),
        }
    }

    // ----- operators -------------------------------------------------------

    fn check_unary(&mut self, expr: &Expr, unary: &UnaryExpr) -> Type {
        let operand_ty = self.check_expr(&unary.operand);
        match unary.op {
            UnaryOp::Plus | UnaryOp::Minus => {
                if operand_ty.is_numeric() || operand_ty == Type::Any {
                    operand_ty
                } else {
                    self.add_error(
                        SemanticError::InvalidOperands {
                            op: unary.op.as_str(),
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                    Type::Any
                }
            }
            // `!` forces boolean coercion of any operand
            UnaryOp::Not => Type::Boolean,
            UnaryOp::BitNot => {
                if operand_ty != Type::Integer {
                    self.add_error(
                        SemanticError::InvalidOperands {
                            op: unary.op.as_str(),
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                }
                Type::Integer
            }
            UnaryOp::TypeOf => Type::String,
            UnaryOp::Void | UnaryOp::Delete => {
                self.add_error(
                    SemanticError::UnsupportedSyntax {
                        what: if unary.op == UnaryOp::Void {
                            "the void operator"
                        } else {
                            "the delete operator"
                        },
                        span: expr.span.into(),
                    },
                    expr.span,
                );
                Type::Any
            }
        }
    }

    fn check_update(&mut self, expr: &Expr, update: &UpdateExpr) -> Type {
        if !matches!(
            update.operand.kind,
            ExprKind::Identifier(_) | ExprKind::Member(_)
        ) {
            self.add_error(
                SemanticError::InvalidLValue {
                    span: update.operand.span.into(),
                },
                update.operand.span,
            );
        } else if let ExprKind::Identifier(sym) = &update.operand.kind
            && let Some(info) = self.scope.get(*sym)
            && info.is_const
        {
            self.add_error(
                SemanticError::AssignmentToConstant {
                    span: expr.span.into(),
                },
                expr.span,
            );
        }

        let operand_ty = self.check_expr(&update.operand);
        if operand_ty.is_numeric() || operand_ty == Type::Any {
            operand_ty
        } else {
            self.add_error(
                SemanticError::InvalidOperands {
                    op: update.op.as_str(),
                    span: expr.span.into(),
                },
                expr.span,
            );
            Type::Any
        }
    }

    fn check_binary(&mut self, expr: &Expr, binary: &BinaryExpr) -> Type {
        // The right side of instanceof names a type, not a value
        if binary.op == BinaryOp::InstanceOf {
            let left_ty = self.check_expr(&binary.left);
            return self.check_instanceof(expr, binary, &left_ty);
        }

        let left_ty = self.check_expr(&binary.left);
        let right_ty = self.check_expr(&binary.right);
        let op = binary.op;

        if op.is_equality() {
            let ok = left_ty == Type::Any
                || right_ty == Type::Any
                || (left_ty == Type::Boolean && right_ty == Type::Boolean)
                || (left_ty == Type::String && right_ty == Type::String)
                || is_subtype(&left_ty, &right_ty, &self.classes)
                || is_subtype(&right_ty, &left_ty, &self.classes);
            if !ok {
                self.invalid_operands(op.as_str(), expr.span);
            }
            self.mark_any_operand(binary, &left_ty, &right_ty);
            return Type::Boolean;
        }

        if op.is_relational() {
            let ok = (left_ty.is_numeric() && right_ty.is_numeric())
                || (left_ty == Type::String && right_ty == Type::String)
                || left_ty == Type::Any
                || right_ty == Type::Any;
            if !ok {
                self.invalid_operands(op.as_str(), expr.span);
            }
            self.mark_any_operand(binary, &left_ty, &right_ty);
            return Type::Boolean;
        }

        if op.is_arithmetic() {
            let left_ok = left_ty.is_numeric() || left_ty == Type::Any;
            let right_ok = right_ty.is_numeric() || right_ty == Type::Any;
            if !left_ok || !right_ok {
                self.invalid_operands(op.as_str(), expr.span);
                return Type::Any;
            }
            self.mark_any_operand(binary, &left_ty, &right_ty);
            if left_ty == Type::Any || right_ty == Type::Any {
                return Type::Any;
            }
            return if left_ty == Type::Float || right_ty == Type::Float {
                Type::Float
            } else {
                Type::Integer
            };
        }

        if op == BinaryOp::Mod {
            let left_ok = left_ty == Type::Integer || left_ty == Type::Any;
            let right_ok = right_ty == Type::Integer || right_ty == Type::Any;
            if !left_ok || !right_ok {
                self.invalid_operands(op.as_str(), expr.span);
                return Type::Any;
            }
            self.mark_any_operand(binary, &left_ty, &right_ty);
            if left_ty == Type::Any || right_ty == Type::Any {
                return Type::Any;
            }
            return Type::Integer;
        }

        if op.is_bitwise() {
            // Strictly integer: no `any` coercion for bit patterns
            if left_ty != Type::Integer || right_ty != Type::Integer {
                self.invalid_operands(op.as_str(), expr.span);
            }
            return Type::Integer;
        }

        unreachable!("instanceof is handled before operand checking")
    }

    fn check_instanceof(&mut self, expr: &Expr, binary: &BinaryExpr, left_ty: &Type) -> Type {
        if left_ty.is_primitive() {
            self.invalid_operands("instanceof", expr.span);
        }
        let tested = match &binary.right.kind {
            ExprKind::Identifier(sym) => match self.name_str(*sym) {
                // A declared element type is not preserved here
                "Array" => Some(Type::array(Type::Any)),
                "string" => Some(Type::String),
                _ => self.classes.find(*sym).map(Type::Instance),
            },
            _ => None,
        };
        match tested {
            Some(tested) => self.record_expr_type(&binary.right, tested),
            None => {
                self.add_error(
                    SemanticError::BadInstanceOf {
                        span: binary.right.span.into(),
                    },
                    binary.right.span,
                );
                self.record_expr_type(&binary.right, Type::Any);
            }
        }
        Type::Boolean
    }

    fn check_logical(&mut self, expr: &Expr, logical: &LogicalExpr) -> Type {
        self.check_expr(&logical.left);
        self.check_expr(&logical.right);
        match logical.op {
            // Both operands coerce to boolean
            LogicalOp::And | LogicalOp::Or => Type::Boolean,
            LogicalOp::NullishCoalesce => {
                self.add_error(
                    SemanticError::UnsupportedSyntax {
                        what: "the ?? operator",
                        span: expr.span.into(),
                    },
                    expr.span,
                );
                Type::Any
            }
        }
    }

    fn invalid_operands(&mut self, op: &'static str, span: Span) {
        self.add_error(
            SemanticError::InvalidOperands {
                op,
                span: span.into(),
            },
            span,
        );
    }

    /// When exactly one operand is `any`, the generator needs an
    /// adapter on that side of the boundary.
    fn mark_any_operand(&mut self, binary: &BinaryExpr, left_ty: &Type, right_ty: &Type) {
        if *left_ty == Type::Any && *right_ty != Type::Any {
            self.mark_coercion(&binary.left);
        } else if *right_ty == Type::Any && *left_ty != Type::Any {
            self.mark_coercion(&binary.right);
        }
    }

    // ----- assignment ------------------------------------------------------

    fn check_assign(&mut self, expr: &Expr, assign: &AssignExpr) -> Type {
        if matches!(
            assign.op,
            AssignOp::Pow | AssignOp::And | AssignOp::Or | AssignOp::Nullish
        ) {
            self.add_error(
                SemanticError::UnsupportedSyntax {
                    what: assign.op.as_str(),
                    span: expr.span.into(),
                },
                expr.span,
            );
            self.check_expr(&assign.value);
            return Type::Any;
        }

        let Some(target_ty) = self.resolve_assign_target(expr, assign) else {
            self.check_expr(&assign.value);
            return Type::Any;
        };
        self.record_expr_type(&assign.target, target_ty.clone());
        let value_ty = self.check_expr(&assign.value);

        match assign.op {
            AssignOp::Assign => {
                self.check_assignment_types(
                    &assign.target,
                    &assign.value,
                    &value_ty,
                    &target_ty,
                    expr.span,
                );
                if let ExprKind::Identifier(sym) = &assign.target.kind {
                    self.discard_narrowing_on_assign(*sym, &value_ty);
                }
            }
            AssignOp::Add | AssignOp::Sub | AssignOp::Mul | AssignOp::Div => {
                let target_ok = target_ty.is_numeric() || target_ty == Type::Any;
                let value_ok = value_ty.is_numeric() || value_ty == Type::Any;
                if !target_ok || !value_ok {
                    self.invalid_operands(assign.op.as_str(), expr.span);
                } else {
                    self.mark_any_assign_side(assign, &target_ty, &value_ty);
                }
            }
            AssignOp::Mod => {
                let target_ok = target_ty == Type::Integer || target_ty == Type::Any;
                let value_ok = value_ty == Type::Integer || value_ty == Type::Any;
                if !target_ok || !value_ok {
                    self.invalid_operands(assign.op.as_str(), expr.span);
                } else {
                    self.mark_any_assign_side(assign, &target_ty, &value_ty);
                }
            }
            AssignOp::BitAnd
            | AssignOp::BitOr
            | AssignOp::BitXor
            | AssignOp::Shl
            | AssignOp::Shr
            | AssignOp::UShr => {
                if target_ty != Type::Integer || value_ty != Type::Integer {
                    self.invalid_operands(assign.op.as_str(), expr.span);
                }
            }
            _ => unreachable!("rejected compound operators are handled above"),
        }

        target_ty
    }

    fn mark_any_assign_side(&mut self, assign: &AssignExpr, target_ty: &Type, value_ty: &Type) {
        if *target_ty == Type::Any && *value_ty != Type::Any {
            self.mark_coercion(&assign.target);
        } else if *value_ty == Type::Any && *target_ty != Type::Any {
            self.mark_coercion(&assign.value);
        }
    }

    /// Pure `=` permits subtype or consistency; consistency marks a
    /// coercion on both sides of the boundary.
    pub(crate) fn check_assignment_types(
        &mut self,
        target_node: &Expr,
        value_node: &Expr,
        value_ty: &Type,
        target_ty: &Type,
        span: Span,
    ) {
        if is_subtype(value_ty, target_ty, &self.classes) {
            return;
        }
        if is_consistent(value_ty, target_ty) {
            self.mark_coercion(target_node);
            self.mark_coercion(value_node);
            return;
        }
        self.add_error(
            SemanticError::NotAssignable {
                from: self.type_display(value_ty),
                to: self.type_display(target_ty),
                span: span.into(),
            },
            span,
        );
    }

    /// Resolve the left side of an assignment to the type it stores.
    /// Reports flag and structure errors; None means no meaningful
    /// target type exists.
    fn resolve_assign_target(&mut self, expr: &Expr, assign: &AssignExpr) -> Option<Type> {
        match &assign.target.kind {
            ExprKind::Identifier(sym) => {
                let Some(info) = self.scope.get(*sym) else {
                    if !self.first_pass {
                        let name = self.name_str(*sym).to_string();
                        self.add_error(
                            SemanticError::UnknownName {
                                name,
                                span: assign.target.span.into(),
                            },
                            assign.target.span,
                        );
                    }
                    return Some(Type::Any);
                };
                let (ty, is_const, is_function, is_type_name) = (
                    info.ty.clone(),
                    info.is_const,
                    info.is_function,
                    info.is_type_name,
                );
                if is_type_name {
                    let name = self.name_str(*sym).to_string();
                    self.add_error(
                        SemanticError::TypeNameAsValue {
                            name,
                            span: assign.target.span.into(),
                        },
                        assign.target.span,
                    );
                } else if is_const {
                    self.add_error(
                        SemanticError::AssignmentToConstant {
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                } else if is_function {
                    self.add_error(
                        SemanticError::AssignmentToFunction {
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                }
                Some(ty)
            }
            ExprKind::Member(member) => self.resolve_member_target(assign, member),
            _ => {
                self.add_error(
                    SemanticError::InvalidLValue {
                        span: assign.target.span.into(),
                    },
                    assign.target.span,
                );
                None
            }
        }
    }

    fn resolve_member_target(&mut self, assign: &AssignExpr, member: &MemberExpr) -> Option<Type> {
        let object_ty = self.check_expr(&member.object);
        match &member.property {
            MemberProp::Named { name, span } => {
                if self.name_str(*name) == "length" && self.is_length_bearer(&object_ty) {
                    self.add_error(
                        SemanticError::CannotChangeLength { span: (*span).into() },
                        *span,
                    );
                    return None;
                }
                match &object_ty {
                    Type::Any => Some(Type::Any),
                    Type::Instance(id) => {
                        use crate::sema::class_table::FoundMember;
                        match self.classes.find_member(*id, *name) {
                            Some(FoundMember::Property(ty, index, cutoff)) => {
                                // Writes into tagged slots go through
                                // a runtime adapter
                                if index >= cutoff {
                                    self.mark_coercion(&assign.value);
                                }
                                Some(ty)
                            }
                            Some(FoundMember::Method(_)) => {
                                self.add_error(
                                    SemanticError::InvalidLValue { span: (*span).into() },
                                    *span,
                                );
                                None
                            }
                            None => {
                                if !self.first_pass {
                                    let name = self.name_str(*name).to_string();
                                    self.add_error(
                                        SemanticError::UnknownProperty {
                                            name,
                                            span: (*span).into(),
                                        },
                                        *span,
                                    );
                                }
                                None
                            }
                        }
                    }
                    _ => {
                        let name = self.name_str(*name).to_string();
                        self.add_error(
                            SemanticError::UnknownProperty {
                                name,
                                span: (*span).into(),
                            },
                            *span,
                        );
                        None
                    }
                }
            }
            MemberProp::Computed(index) => {
                let index_ty = self.check_expr(index);
                self.check_index_type(&index_ty, index);
                match &object_ty {
                    Type::Array(element) => {
                        // Tagged cells take adapted writes
                        if actual_element_type(element) == Type::Any
                            && **element != Type::Any
                        {
                            self.mark_coercion(&assign.value);
                        }
                        Some((**element).clone())
                    }
                    Type::Instance(id) if Some(*id) == self.byte_array => Some(Type::Integer),
                    Type::Any => Some(Type::Any),
                    _ => {
                        self.add_error(
                            SemanticError::NotAnArray {
                                found: self.type_display(&object_ty),
                                span: member.object.span.into(),
                            },
                            member.object.span,
                        );
                        None
                    }
                }
            }
        }
    }

    // ----- member access ---------------------------------------------------

    fn check_member(&mut self, expr: &Expr, member: &MemberExpr) -> Type {
        let object_ty = self.check_expr(&member.object);
        match &member.property {
            MemberProp::Named { name, .. } => {
                let name_str = self.name_str(*name);
                if name_str == "length" && self.is_length_bearer(&object_ty) {
                    return Type::Integer;
                }
                match &object_ty {
                    Type::Any => Type::Any,
                    Type::Instance(id) => {
                        use crate::sema::class_table::FoundMember;
                        match self.classes.find_member(*id, *name) {
                            Some(FoundMember::Property(ty, index, cutoff)) => {
                                // Reads at or above the unboxed cutoff
                                // come out of a tagged slot
                                if index >= cutoff {
                                    self.mark_coercion(expr);
                                }
                                ty
                            }
                            Some(FoundMember::Method(sig)) => Type::Function(sig),
                            None => {
                                // Members of classes declared later in
                                // the file are not recorded yet during
                                // pass 1
                                if !self.first_pass {
                                    let name = name_str.to_string();
                                    self.add_error(
                                        SemanticError::UnknownProperty {
                                            name,
                                            span: expr.span.into(),
                                        },
                                        expr.span,
                                    );
                                }
                                Type::Any
                            }
                        }
                    }
                    _ => {
                        let name = name_str.to_string();
                        self.add_error(
                            SemanticError::UnknownProperty {
                                name,
                                span: expr.span.into(),
                            },
                            expr.span,
                        );
                        Type::Any
                    }
                }
            }
            MemberProp::Computed(index) => {
                let index_ty = self.check_expr(index);
                self.check_index_type(&index_ty, index);
                match &object_ty {
                    Type::Array(element) => (**element).clone(),
                    Type::Instance(id) if Some(*id) == self.byte_array => Type::Integer,
                    Type::Any => Type::Any,
                    _ => {
                        self.add_error(
                            SemanticError::NotAnArray {
                                found: self.type_display(&object_ty),
                                span: member.object.span.into(),
                            },
                            member.object.span,
                        );
                        Type::Any
                    }
                }
            }
        }
    }

    fn is_length_bearer(&self, ty: &Type) -> bool {
        match ty {
            Type::Array(_) => true,
            Type::Instance(id) => Some(*id) == self.byte_array,
            _ => false,
        }
    }

    fn check_index_type(&mut self, index_ty: &Type, index: &Expr) {
        if *index_ty == Type::Integer {
            return;
        }
        if *index_ty == Type::Any {
            self.mark_coercion(index);
            return;
        }
        self.add_error(
            SemanticError::BadIndexType {
                found: self.type_display(index_ty),
                span: index.span.into(),
            },
            index.span,
        );
    }

    // ----- calls -----------------------------------------------------------

    fn check_call(&mut self, expr: &Expr, call: &CallExpr) -> Type {
        if matches!(call.callee.kind, ExprKind::Super) {
            return self.check_super_call(expr, call);
        }

        let callee_ty = self.check_expr(&call.callee);
        match callee_ty {
            Type::Function(sig) => {
                self.check_args(&sig.params, &call.args, expr.span);
                (*sig.return_type).clone()
            }
            Type::Any => {
                for arg in &call.args {
                    self.check_expr(arg);
                }
                // Unresolved callees are fine in pass 1 only
                if !self.first_pass {
                    self.add_error(
                        SemanticError::NotCallable {
                            found: "any".to_string(),
                            span: call.callee.span.into(),
                        },
                        call.callee.span,
                    );
                }
                Type::Any
            }
            other => {
                for arg in &call.args {
                    self.check_expr(arg);
                }
                self.add_error(
                    SemanticError::NotCallable {
                        found: self.type_display(&other),
                        span: call.callee.span.into(),
                    },
                    call.callee.span,
                );
                Type::Any
            }
        }
    }

    fn check_super_call(&mut self, expr: &Expr, call: &CallExpr) -> Type {
        let Some(class_id) = self.current_class.filter(|_| self.in_constructor) else {
            self.add_error(
                SemanticError::CannotCallSuperHere {
                    span: expr.span.into(),
                },
                expr.span,
            );
            for arg in &call.args {
                self.check_expr(arg);
            }
            return Type::Void;
        };
        // The implicit zero-argument constructor stands in when the
        // chain declares none
        let ctor = match self.classes.get(class_id).superclass {
            Some(super_id) => self.classes.constructor_of(super_id),
            None => FunctionType::new(Vec::new(), Type::Void),
        };
        self.check_args(&ctor.params, &call.args, expr.span);
        Type::Void
    }

    fn check_args(&mut self, params: &[Type], args: &[Expr], call_span: Span) {
        if params.len() != args.len() {
            self.add_error(
                SemanticError::WrongArgumentCount {
                    expected: params.len(),
                    found: args.len(),
                    span: call_span.into(),
                },
                call_span,
            );
        }
        let arg_types: SmallVec<[Type; 4]> =
            args.iter().map(|arg| self.check_expr(arg)).collect();
        for ((arg, arg_ty), param) in args.iter().zip(arg_types.iter()).zip(params.iter()) {
            if is_subtype(arg_ty, param, &self.classes) {
                continue;
            }
            if is_consistent(arg_ty, param) {
                self.mark_coercion(arg);
                continue;
            }
            // Array element types may still be settling in pass 1
            if self.first_pass && self.tentative_array_pairing(arg_ty, param) {
                continue;
            }
            self.add_error(
                SemanticError::NotAssignable {
                    from: self.type_display(arg_ty),
                    to: self.type_display(param),
                    span: arg.span.into(),
                },
                arg.span,
            );
        }
    }

    fn tentative_array_pairing(&self, a: &Type, b: &Type) -> bool {
        match (a, b) {
            (Type::Array(x), Type::Array(y)) => **x == Type::Any || **y == Type::Any,
            _ => false,
        }
    }

    // ----- new -------------------------------------------------------------

    fn check_new(&mut self, expr: &Expr, new_expr: &NewExpr) -> Type {
        if self.name_str(new_expr.callee) == "Array" {
            return self.check_new_array(expr, new_expr);
        }

        match self.classes.find(new_expr.callee) {
            Some(id) => {
                let ctor = self.classes.constructor_of(id);
                self.check_args(&ctor.params, &new_expr.args, expr.span);
                Type::Instance(id)
            }
            None => {
                for arg in &new_expr.args {
                    self.check_expr(arg);
                }
                if !self.first_pass {
                    let name = self.name_str(new_expr.callee).to_string();
                    self.add_error(
                        SemanticError::UnknownTypeName {
                            name,
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                }
                Type::Any
            }
        }
    }

    /// `new Array<T>(n)` or `new Array<T>(n, init)`; the second form
    /// is required unless `T` has an unboxed (or `any`) cell
    /// representation with a defined default.
    fn check_new_array(&mut self, expr: &Expr, new_expr: &NewExpr) -> Type {
        let element = match new_expr.type_args.len() {
            0 => Type::Any,
            1 => self.resolve_type_ann(&new_expr.type_args[0]),
            _ => {
                self.add_error(
                    SemanticError::UnsupportedSyntax {
                        what: "Array takes a single type argument",
                        span: expr.span.into(),
                    },
                    expr.span,
                );
                self.resolve_type_ann(&new_expr.type_args[0])
            }
        };

        if new_expr.args.is_empty() || new_expr.args.len() > 2 {
            self.add_error(
                SemanticError::WrongArgumentCount {
                    expected: 2,
                    found: new_expr.args.len(),
                    span: expr.span.into(),
                },
                expr.span,
            );
            for arg in &new_expr.args {
                self.check_expr(arg);
            }
            return Type::array(element);
        }

        let size = &new_expr.args[0];
        let size_ty = self.check_expr(size);
        if size_ty == Type::Any {
            self.mark_coercion(size);
        } else if size_ty != Type::Integer {
            self.add_error(
                SemanticError::NotAssignable {
                    from: self.type_display(&size_ty),
                    to: "integer".to_string(),
                    span: size.span.into(),
                },
                size.span,
            );
        }

        match new_expr.args.get(1) {
            Some(init) => {
                let init_ty = self.check_expr(init);
                if !is_subtype(&init_ty, &element, &self.classes) {
                    if is_consistent(&init_ty, &element) {
                        self.mark_coercion(init);
                    } else {
                        self.add_error(
                            SemanticError::NotAssignable {
                                from: self.type_display(&init_ty),
                                to: self.type_display(&element),
                                span: init.span.into(),
                            },
                            init.span,
                        );
                    }
                }
            }
            None => {
                if !matches!(
                    element,
                    Type::Integer | Type::Float | Type::Boolean | Type::Any
                ) {
                    self.add_error(
                        SemanticError::ArrayNewNeedsInit {
                            element: self.type_display(&element),
                            span: expr.span.into(),
                        },
                        expr.span,
                    );
                }
            }
        }

        Type::array(element)
    }

    // ----- conditional and arrows ------------------------------------------

    fn check_conditional(&mut self, expr: &Expr, cond: &ConditionalExpr) -> Type {
        self.check_expr(&cond.test);

        let narrowing = self.narrowing_from_test(&cond.test);
        let saved = self.type_overrides.clone();

        if let Some((sym, positive, _)) = &narrowing {
            self.type_overrides.insert(*sym, positive.clone());
        }
        let consequent_ty = self.check_expr(&cond.consequent);
        self.type_overrides = saved.clone();

        if let Some((sym, _, negative)) = &narrowing {
            self.type_overrides.insert(*sym, negative.clone());
        }
        let alternate_ty = self.check_expr(&cond.alternate);
        self.type_overrides = saved;

        match common_super_type(&consequent_ty, &alternate_ty, &self.classes) {
            Some(joined) => joined,
            None => {
                self.add_error(
                    SemanticError::NoCommonType {
                        left: self.type_display(&consequent_ty),
                        right: self.type_display(&alternate_ty),
                        span: expr.span.into(),
                    },
                    expr.span,
                );
                alternate_ty
            }
        }
    }

    fn check_arrow(&mut self, arrow: &ArrowFunc) -> Type {
        if arrow.is_async {
            let span = match &arrow.body {
                ArrowBody::Expr(e) => e.span,
                ArrowBody::Block(b) => b.span,
            };
            self.add_error(
                SemanticError::UnsupportedSyntax {
                    what: "async functions",
                    span: span.into(),
                },
                span,
            );
        }

        let params = self.resolve_params(&arrow.params);
        let declared_ret = arrow.return_type.as_ref().map(|t| self.resolve_type_ann(t));

        self.enter_function();
        if let Some(ret) = &declared_ret {
            self.scope.set_return_type(ret.clone());
        }
        self.bind_params(&arrow.params, &params);

        match &arrow.body {
            ArrowBody::Expr(body) => {
                let body_ty = self.check_expr(body);
                match self.scope.return_type().cloned().flatten() {
                    None => self.scope.set_return_type(body_ty),
                    Some(expected) => {
                        if !is_subtype(&body_ty, &expected, &self.classes) {
                            if is_consistent(&body_ty, &expected) {
                                self.mark_coercion(body);
                            } else {
                                self.add_error(
                                    SemanticError::NotAssignable {
                                        from: self.type_display(&body_ty),
                                        to: self.type_display(&expected),
                                        span: body.span.into(),
                                    },
                                    body.span,
                                );
                            }
                        }
                    }
                }
            }
            ArrowBody::Block(body) => self.check_block_stmts(body),
        }

        let ret = self
            .scope
            .return_type()
            .cloned()
            .flatten()
            .unwrap_or(Type::Void);
        let snapshot = self.leave_function();
        if !self.first_pass {
            self.node_data.set_scope(arrow.id, snapshot);
        }

        Type::Function(FunctionType::new(params, ret))
    }
}
