// src/sema/types.rs

use crate::sema::class_table::{ClassId, ClassTable};

/// Resolved static types
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Integer,
    Float,
    Boolean,
    String,
    /// Function-return "no value"
    Void,
    /// The unified absence type; `null` and `undefined` both land here
    Null,
    /// Dynamically typed value
    Any,
    /// Structural root of all class instance types
    Object,
    /// Named class instance; metadata lives in the ClassTable
    Instance(ClassId),
    Function(FunctionType),
    /// Invariant element type
    Array(Box<Type>),
    /// element ∪ { null }; the element is never null, any, or optional
    Optional(Box<Type>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub return_type: Box<Type>,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, return_type: Type) -> Self {
        Self {
            params,
            return_type: Box::new(return_type),
        }
    }
}

impl Type {
    /// Check if this type is numeric (can do arithmetic)
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    /// The primitive scalars of the language
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Integer
                | Type::Float
                | Type::Boolean
                | Type::String
                | Type::Void
                | Type::Null
                | Type::Any
        )
    }

    /// Types whose array cells and property slots are stored unboxed
    pub fn is_unboxed(&self) -> bool {
        matches!(self, Type::Integer | Type::Float | Type::Boolean)
    }

    /// Legal element for an optional type: non-null, non-any, non-optional
    pub fn can_be_optional_element(&self) -> bool {
        !matches!(self, Type::Null | Type::Any | Type::Optional(_) | Type::Void)
    }

    /// Wrap in an optional. Callers validate the element first.
    pub fn optional(element: Type) -> Type {
        Type::Optional(Box::new(element))
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Type::Optional(_))
    }

    /// The wrapped type of an optional, if this is one
    pub fn optional_element(&self) -> Option<&Type> {
        match self {
            Type::Optional(element) => Some(element),
            _ => None,
        }
    }

    /// Fallback name without class-table access; `display` is the
    /// form used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Type::Integer => "integer",
            Type::Float => "float",
            Type::Boolean => "boolean",
            Type::String => "string",
            Type::Void => "void",
            Type::Null => "null",
            Type::Any => "any",
            Type::Object => "object",
            Type::Instance(_) => "class",
            Type::Function(_) => "function",
            Type::Array(_) => "array",
            Type::Optional(_) => "optional",
        }
    }

    /// Render for error messages, resolving class names through the table
    pub fn display(&self, classes: &ClassTable) -> String {
        match self {
            Type::Instance(id) => classes.get(*id).name.clone(),
            Type::Function(f) => {
                let params: Vec<String> = f.params.iter().map(|p| p.display(classes)).collect();
                format!("({}) => {}", params.join(", "), f.return_type.display(classes))
            }
            Type::Array(element) => format!("Array<{}>", element.display(classes)),
            Type::Optional(element) => format!("{}|null", element.display(classes)),
            _ => self.name().to_string(),
        }
    }
}
