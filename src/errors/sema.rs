// src/errors/sema.rs
//! Semantic analysis errors (E2xxx).
//!
//! Several format strings below are load-bearing: the test suite and
//! downstream tooling match on them verbatim.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SemanticError {
    #[error("Type '{from}' is not assignable to type '{to}'")]
    #[diagnostic(code(E2001))]
    NotAssignable {
        from: String,
        to: String,
        #[label("type mismatch")]
        span: SourceSpan,
    },

    #[error("unknown name: {name}")]
    #[diagnostic(code(E2002))]
    UnknownName {
        name: String,
        #[label("not found in scope")]
        span: SourceSpan,
    },

    #[error("duplicate declaration: {name}")]
    #[diagnostic(code(E2003))]
    DuplicateDeclaration {
        name: String,
        #[label("already declared")]
        span: SourceSpan,
    },

    #[error("unknown type name: {name}")]
    #[diagnostic(code(E2004))]
    UnknownTypeName {
        name: String,
        #[label("no such type")]
        span: SourceSpan,
    },

    #[error("assignment to constant variable")]
    #[diagnostic(code(E2005))]
    AssignmentToConstant {
        #[label("declared const")]
        span: SourceSpan,
    },

    #[error("assignment to top-level function")]
    #[diagnostic(code(E2006))]
    AssignmentToFunction {
        #[label("functions cannot be reassigned")]
        span: SourceSpan,
    },

    #[error("invalid operands to {op}")]
    #[diagnostic(code(E2007))]
    InvalidOperands {
        op: &'static str,
        #[label("operand types do not fit this operator")]
        span: SourceSpan,
    },

    #[error("wrong number of arguments")]
    #[diagnostic(code(E2008))]
    WrongArgumentCount {
        expected: usize,
        found: usize,
        #[label("expected {expected}, found {found}")]
        span: SourceSpan,
    },

    #[error("not a function: {found}")]
    #[diagnostic(code(E2009))]
    NotCallable {
        found: String,
        #[label("cannot be called")]
        span: SourceSpan,
    },

    #[error("only optional types are supported -- {what}")]
    #[diagnostic(code(E2010), help("the accepted union forms are 'T | null' and 'null | T'"))]
    OnlyOptionalTypes {
        what: String,
        #[label("unsupported type form")]
        span: SourceSpan,
    },

    #[error("not supported: {what}")]
    #[diagnostic(code(E2011))]
    UnsupportedSyntax {
        what: &'static str,
        #[label("outside the supported subset")]
        span: SourceSpan,
    },

    #[error("nested function declarations are not supported")]
    #[diagnostic(code(E2012))]
    NestedFunction {
        #[label("move this to the top level")]
        span: SourceSpan,
    },

    #[error("class declarations are allowed only at the top level")]
    #[diagnostic(code(E2013))]
    ClassNotTopLevel {
        #[label("nested class")]
        span: SourceSpan,
    },

    #[error("unknown property: {name}")]
    #[diagnostic(code(E2014))]
    UnknownProperty {
        name: String,
        #[label("no such property")]
        span: SourceSpan,
    },

    #[error("cannot change .length")]
    #[diagnostic(code(E2015))]
    CannotChangeLength {
        #[label(".length is read-only")]
        span: SourceSpan,
    },

    #[error("array index must be an integer, found {found}")]
    #[diagnostic(code(E2016))]
    BadIndexType {
        found: String,
        #[label("not an integer")]
        span: SourceSpan,
    },

    #[error("not an array: {found}")]
    #[diagnostic(code(E2017))]
    NotAnArray {
        found: String,
        #[label("indexed access needs an array")]
        span: SourceSpan,
    },

    #[error("types '{left}' and '{right}' have no common type")]
    #[diagnostic(code(E2018))]
    NoCommonType {
        left: String,
        right: String,
        #[label("branches disagree")]
        span: SourceSpan,
    },

    #[error("super() is not called")]
    #[diagnostic(code(E2019))]
    SuperNotCalled {
        #[label("constructor must call super()")]
        span: SourceSpan,
    },

    #[error("cannot call super() here")]
    #[diagnostic(code(E2020))]
    CannotCallSuperHere {
        #[label("super() only at the top level of a constructor, once")]
        span: SourceSpan,
    },

    #[error("uninitialized property: {name}")]
    #[diagnostic(code(E2021))]
    UninitializedProperty {
        name: String,
        #[label("assign this.{name} in the constructor")]
        span: SourceSpan,
    },

    #[error("not exported: {name}")]
    #[diagnostic(code(E2022))]
    NotExported {
        name: String,
        #[label("the imported file does not export this")]
        span: SourceSpan,
    },

    #[error("symbol is not declared: {name}")]
    #[diagnostic(code(E2023))]
    ImportSymbolNotFound {
        name: String,
        #[label("not found in the imported file")]
        span: SourceSpan,
    },

    #[error("{message}")]
    #[diagnostic(code(E2024))]
    ImportFailed {
        message: String,
        #[label("import failed")]
        span: SourceSpan,
    },

    #[error("import declarations are allowed only at the top level")]
    #[diagnostic(code(E2025))]
    ImportNotAtTopLevel {
        #[label("nested import")]
        span: SourceSpan,
    },

    #[error("cannot use a type name as a value: {name}")]
    #[diagnostic(code(E2026))]
    TypeNameAsValue {
        name: String,
        #[label("type names are not expressions")]
        span: SourceSpan,
    },

    #[error("invalid assignment target")]
    #[diagnostic(code(E2027))]
    InvalidLValue {
        #[label("not assignable")]
        span: SourceSpan,
    },

    #[error("'this' is used outside a class")]
    #[diagnostic(code(E2028))]
    ThisOutsideClass {
        #[label("no enclosing class")]
        span: SourceSpan,
    },

    #[error("class {name} cannot be extended")]
    #[diagnostic(code(E2029))]
    LeafClassExtended {
        name: String,
        #[label("sealed class")]
        span: SourceSpan,
    },

    #[error("an initial value is required for an array of {element}")]
    #[diagnostic(
        code(E2030),
        help("new Array<T>(n, init) is required unless T is integer, float, boolean, or any")
    )]
    ArrayNewNeedsInit {
        element: String,
        #[label("missing initial value")]
        span: SourceSpan,
    },

    #[error("instanceof needs a class name, Array, or string")]
    #[diagnostic(code(E2031))]
    BadInstanceOf {
        #[label("not a type test target")]
        span: SourceSpan,
    },
}
