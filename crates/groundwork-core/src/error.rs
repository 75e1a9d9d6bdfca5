//! Error kinds raised while grounding a lifted task.
//!
//! None of these are recoverable: the first error aborts the compilation run.

use crate::index::GroundVariable;

/// Errors from the grounding stages (symbol table through constraint catalog).
#[derive(Debug, thiserror::Error)]
pub enum GroundError {
    #[error("unknown symbol '{symbol}' referenced in {context}")]
    UnknownSymbol { symbol: String, context: String },
    #[error("unknown type '{type_name}' used by symbol '{symbol}'")]
    UnknownType { type_name: String, symbol: String },
    #[error("type '{type_name}' of fluent symbol '{symbol}' has no finite object listing")]
    UnboundedDomain { type_name: String, symbol: String },
    #[error("object '{object}' of type '{type_name}' is missing from the object list")]
    UndeclaredObject { object: String, type_name: String },
    #[error("symbol '{0}' is declared more than once")]
    DuplicateSymbol(String),
    #[error("ground variable {0} registered twice")]
    DuplicateRegistration(GroundVariable),
    #[error("{variable} initialized twice (second occurrence: {element})")]
    DuplicateInitialization {
        variable: GroundVariable,
        element: String,
    },
    #[error("invalid initialization '{element}': {reason}")]
    InvalidInit { element: String, reason: String },
    #[error("{0} lies outside the declared argument domains")]
    OutOfDomain(GroundVariable),
    #[error("unsupported constraint '{0}'")]
    UnsupportedConstraint(String),
    #[error("invalid instantiation of constraint '{name}': {reason}")]
    InvalidConstraint { name: String, reason: String },
    #[error("unimplemented effect shape in action '{action}': {detail}")]
    UnimplementedEffectShape { action: String, detail: String },
    #[error("unknown parameter '{param}' in action '{action}'")]
    UnknownParameter { action: String, param: String },
}

impl GroundError {
    pub(crate) fn unknown_symbol(symbol: &str, context: impl Into<String>) -> Self {
        Self::UnknownSymbol {
            symbol: symbol.to_string(),
            context: context.into(),
        }
    }
}

pub type GroundResult<T> = Result<T, GroundError>;
