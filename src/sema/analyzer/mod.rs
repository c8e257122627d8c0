// src/sema/analyzer/mod.rs
//! The two-pass type checker.
//!
//! Pass 1 records every top-level name (variables, functions,
//! classes, imports) with its declared or inferred type, so that
//! mutually recursive top-level declarations resolve. Pass 2 walks
//! the whole program again with every global bound, builds fresh
//! block/function tables, checks every expression, and marks every
//! coercion boundary in the side-table.

mod builtins;
mod ctor;
mod declarations;
mod expr;
mod imports;
mod stmt;


use rustc_hash::FxHashMap;

use crate::errors::SemanticError;
use crate::frontend::ast::{Expr, ExprKind, Program, TypeAnn, TypeAnnKind};
use crate::frontend::{Interner, Span, Symbol};
use crate::sema::class_table::{ClassId, ClassTable};
use crate::sema::node_data::NodeData;
use crate::sema::scope::{NameInfo, Scope};
use crate::sema::types::{FunctionType, Type};

/// A located semantic error
#[derive(Debug, Clone)]
pub struct TypeError {
    pub error: SemanticError,
    pub span: Span,
}

impl TypeError {
    pub fn new(error: SemanticError, span: Span) -> Self {
        Self { error, span }
    }
}

/// Failure modes of the importer callback
#[derive(Debug)]
pub enum ImportError {
    /// The imported file type-checked with its own errors; the log is
    /// absorbed verbatim with the file name as context.
    Log(Vec<TypeError>),
    /// A plain message (missing file, unreadable, ...), pushed at the
    /// import declaration's location.
    Message(String),
}

pub type Importer<'a> = dyn FnMut(&str) -> Result<Scope, ImportError> + 'a;

/// Everything the checker hands to the code generator
#[derive(Debug)]
pub struct Analysis {
    pub globals: Scope,
    pub classes: ClassTable,
    pub node_data: NodeData,
}

pub struct Analyzer<'a> {
    pub(crate) interner: &'a Interner,
    pub(crate) scope: Scope,
    pub(crate) classes: ClassTable,
    pub(crate) node_data: NodeData,
    pub(crate) errors: Vec<TypeError>,
    /// Pass 1 suppresses unknown-name diagnostics and is the only
    /// pass that records declarations and processes imports.
    pub(crate) first_pass: bool,
    /// Flow-sensitive narrowing: identifier -> locally refined type.
    /// Saved and restored around branches.
    pub(crate) type_overrides: FxHashMap<Symbol, Type>,
    /// Class whose method body is being checked
    pub(crate) current_class: Option<ClassId>,
    pub(crate) in_constructor: bool,
    /// Non-zero inside any function body; nested declarations are
    /// rejected against it.
    pub(crate) function_depth: u32,
    /// The builtin byte-array class, when the program mentions it
    pub(crate) byte_array: Option<ClassId>,
    pub(crate) importer: Option<&'a mut Importer<'a>>,
}

impl<'a> Analyzer<'a> {
    pub fn new(globals: Scope, interner: &'a Interner) -> Self {
        Self {
            interner,
            scope: globals,
            classes: ClassTable::new(),
            node_data: NodeData::new(),
            errors: Vec::new(),
            first_pass: true,
            type_overrides: FxHashMap::default(),
            current_class: None,
            in_constructor: false,
            function_depth: 0,
            byte_array: None,
            importer: None,
        }
    }

    pub fn with_importer(mut self, importer: &'a mut Importer<'a>) -> Self {
        self.importer = Some(importer);
        self
    }

    pub(crate) fn add_error(&mut self, error: SemanticError, span: Span) {
        self.errors.push(TypeError::new(error, span));
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn name_str(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub(crate) fn type_display(&self, ty: &Type) -> String {
        ty.display(&self.classes)
    }

    /// Record an expression's static type in the side-table (pass 2)
    pub(crate) fn record_expr_type(&mut self, expr: &Expr, ty: Type) {
        if !self.first_pass {
            self.node_data.set_type(expr.id, ty);
        }
    }

    /// Mark a coercion boundary in the side-table (pass 2)
    pub(crate) fn mark_coercion(&mut self, expr: &Expr) {
        if !self.first_pass {
            self.node_data.set_coercion(expr.id);
        }
    }

    // ----- scope entry/exit ------------------------------------------------

    pub(crate) fn enter_block(&mut self) {
        let parent = std::mem::take(&mut self.scope);
        self.scope = Scope::block(parent);
    }

    pub(crate) fn enter_function(&mut self) {
        let parent = std::mem::take(&mut self.scope);
        self.scope = Scope::function(parent);
        self.function_depth += 1;
    }

    /// Leave the current scope, returning its detached snapshot for
    /// the side-table.
    pub(crate) fn leave_scope(&mut self) -> Scope {
        let child = std::mem::take(&mut self.scope);
        let snapshot = child.detach();
        if let Some(parent) = child.into_parent() {
            self.scope = parent;
        }
        snapshot
    }

    pub(crate) fn leave_function(&mut self) -> Scope {
        self.function_depth -= 1;
        self.leave_scope()
    }

    // ----- type annotation resolution --------------------------------------

    /// Resolve a source-level type annotation to a static type.
    /// Unsupported forms are diagnosed and recover as `any`.
    pub(crate) fn resolve_type_ann(&mut self, ann: &TypeAnn) -> Type {
        match &ann.kind {
            TypeAnnKind::Named(sym) => match self.name_str(*sym) {
                "integer" | "number" => Type::Integer,
                "float" => Type::Float,
                "boolean" => Type::Boolean,
                "string" => Type::String,
                "void" => Type::Void,
                "null" | "undefined" => Type::Null,
                "any" => Type::Any,
                "object" => Type::Object,
                name => {
                    if let Some(id) = self.classes.find(*sym) {
                        Type::Instance(id)
                    } else {
                        let name = name.to_string();
                        if !self.first_pass {
                            self.add_error(
                                SemanticError::UnknownTypeName {
                                    name,
                                    span: ann.span.into(),
                                },
                                ann.span,
                            );
                        }
                        Type::Any
                    }
                }
            },
            TypeAnnKind::Array(element) => Type::array(self.resolve_type_ann(element)),
            TypeAnnKind::Function {
                params,
                return_type,
            } => {
                let params = params.iter().map(|p| self.resolve_type_ann(p)).collect();
                let ret = self.resolve_type_ann(return_type);
                Type::Function(FunctionType::new(params, ret))
            }
            TypeAnnKind::Union(arms) => self.resolve_union_ann(arms, ann.span),
        }
    }

    /// Only the two-option forms `T | null` and `null | T` build a
    /// type; everything else is a diagnostic.
    fn resolve_union_ann(&mut self, arms: &[TypeAnn], span: Span) -> Type {
        let resolved: Vec<Type> = arms.iter().map(|a| self.resolve_type_ann(a)).collect();
        let shown = resolved
            .iter()
            .map(|t| self.type_display(t))
            .collect::<Vec<_>>()
            .join(" | ");

        if resolved.len() != 2 {
            self.add_error(
                SemanticError::OnlyOptionalTypes {
                    what: shown,
                    span: span.into(),
                },
                span,
            );
            return Type::Any;
        }

        let element = match (&resolved[0], &resolved[1]) {
            (Type::Null, Type::Null) => None,
            (Type::Null, other) | (other, Type::Null) if other.can_be_optional_element() => {
                Some(other.clone())
            }
            _ => None,
        };
        match element {
            Some(element) => Type::optional(element),
            None => {
                self.add_error(
                    SemanticError::OnlyOptionalTypes {
                        what: shown,
                        span: span.into(),
                    },
                    span,
                );
                Type::Any
            }
        }
    }

    // ----- flow-sensitive narrowing ----------------------------------------

    /// Recognize `x != undefined`-shaped tests of an optional-typed
    /// identifier. Returns the identifier with its refinement on the
    /// positive branch and on the complementary branch.
    pub(crate) fn narrowing_from_test(&self, test: &Expr) -> Option<(Symbol, Type, Type)> {
        let ExprKind::Binary(bin) = &test.kind else {
            return None;
        };
        if !bin.op.is_equality() {
            return None;
        }
        let ident = match (&bin.left.kind, &bin.right.kind) {
            (ExprKind::Identifier(sym), _) if self.is_absence_literal(&bin.right) => *sym,
            (_, ExprKind::Identifier(sym)) if self.is_absence_literal(&bin.left) => *sym,
            _ => return None,
        };
        let declared = self.scope.get(ident)?.ty.clone();
        let element = declared.optional_element()?.clone();
        // `!=`-family tests establish presence on the positive side,
        // `==`-family tests establish absence.
        use crate::frontend::ast::BinaryOp;
        match bin.op {
            BinaryOp::Ne | BinaryOp::StrictNe => Some((ident, element, Type::Null)),
            BinaryOp::Eq | BinaryOp::StrictEq => Some((ident, Type::Null, element)),
            _ => None,
        }
    }

    /// `undefined` identifier or `null` literal
    fn is_absence_literal(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Null => true,
            ExprKind::Identifier(sym) => self.name_str(*sym) == "undefined",
            _ => false,
        }
    }

    /// Assigning null or another optional value to a narrowed
    /// identifier discards the narrowing for the rest of the block.
    pub(crate) fn discard_narrowing_on_assign(&mut self, target: Symbol, assigned: &Type) {
        if self.type_overrides.contains_key(&target)
            && matches!(assigned, Type::Null | Type::Optional(_) | Type::Any)
        {
            self.type_overrides.remove(&target);
        }
    }
}

/// Run both checker passes over a program.
///
/// `globals` is the caller-seeded global symbol table (usually
/// empty); builtin types are installed into it when it has no parent.
/// On success the populated global table, the class table, and the
/// node side-table are returned together.
pub fn check_program<'a>(
    program: &Program,
    globals: Scope,
    interner: &'a Interner,
    importer: Option<&'a mut Importer<'a>>,
) -> Result<Analysis, Vec<TypeError>> {
    let mut analyzer = Analyzer::new(globals, interner);
    analyzer.importer = importer;
    analyzer.install_builtins();

    analyzer.first_pass = true;
    analyzer.run_pass(program);
    if analyzer.has_error() {
        return Err(std::mem::take(&mut analyzer.errors));
    }

    analyzer.first_pass = false;
    analyzer.run_pass(program);
    analyzer
        .node_data
        .set_scope(program.id, analyzer.scope.detach());
    if analyzer.has_error() {
        return Err(std::mem::take(&mut analyzer.errors));
    }

    Ok(Analysis {
        globals: analyzer.scope,
        classes: analyzer.classes,
        node_data: analyzer.node_data,
    })
}

impl Analyzer<'_> {
    pub(crate) fn run_pass(&mut self, program: &Program) {
        if self.first_pass {
            self.declare_class_shells(program);
        }
        for stmt in &program.body {
            self.check_stmt(stmt);
        }
        self.type_overrides.clear();
    }

    pub(crate) fn define_or_duplicate(&mut self, name: Symbol, info: NameInfo, span: Span) {
        if !self.scope.define(name, info) {
            let name = self.name_str(name).to_string();
            self.add_error(
                SemanticError::DuplicateDeclaration {
                    name,
                    span: span.into(),
                },
                span,
            );
        }
    }
}
