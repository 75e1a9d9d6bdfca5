//! Constraint catalog: the fixed set of relations generated code can instantiate.

use crate::error::{GroundError, GroundResult};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Pairwise distinct values.
    AllDifferent,
    /// The last variable equals the sum of the others.
    Sum,
    /// `x >= y`.
    GreaterEqual,
    /// A relation implemented by the runtime, named by the first parameter.
    External,
}

impl ConstraintKind {
    /// Name of the runtime class that implements the constraint.
    pub fn runtime_class(self) -> &'static str {
        match self {
            Self::AllDifferent => "AlldiffConstraint",
            Self::Sum => "SumConstraint",
            Self::GreaterEqual => "GeqConstraint",
            Self::External => "ExternalConstraint",
        }
    }

    fn check_arity(self, parameters: &[String], variables: &[String]) -> Result<(), String> {
        match self {
            Self::AllDifferent | Self::Sum if variables.len() < 2 => {
                Err(format!("needs at least 2 variables, got {}", variables.len()))
            }
            Self::GreaterEqual if variables.len() != 2 => {
                Err(format!("needs exactly 2 variables, got {}", variables.len()))
            }
            Self::External if parameters.first().is_none_or(|p| p.is_empty()) => {
                Err("first parameter must name the external relation".to_string())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = CATALOG
            .iter()
            .find(|(_, kind)| kind == self)
            .map_or("?", |(name, _)| name);
        write!(f, "{name}")
    }
}

/// Registered constraint names.
pub const CATALOG: &[(&str, ConstraintKind)] = &[
    ("alldiff", ConstraintKind::AllDifferent),
    ("sum", ConstraintKind::Sum),
    ("geq", ConstraintKind::GreaterEqual),
    ("external", ConstraintKind::External),
];

/// A constraint instantiated over concrete variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub kind: ConstraintKind,
    pub parameters: Vec<String>,
    pub variables: Vec<String>,
}

impl ConstraintDescriptor {
    /// For external constraints, the name of the runtime relation.
    pub fn external_relation(&self) -> Option<&str> {
        match self.kind {
            ConstraintKind::External => self.parameters.first().map(String::as_str),
            _ => None,
        }
    }
}

pub fn lookup(name: &str) -> Option<ConstraintKind> {
    CATALOG.iter().find(|(n, _)| *n == name).map(|(_, kind)| *kind)
}

pub fn is_supported(name: &str) -> bool {
    lookup(name).is_some()
}

/// Build a descriptor for a registered constraint name.
pub fn instantiate(
    name: &str,
    parameters: Vec<String>,
    variables: Vec<String>,
) -> GroundResult<ConstraintDescriptor> {
    let kind = lookup(name).ok_or_else(|| GroundError::UnsupportedConstraint(name.to_string()))?;
    kind.check_arity(&parameters, &variables)
        .map_err(|reason| GroundError::InvalidConstraint {
            name: name.to_string(),
            reason,
        })?;
    Ok(ConstraintDescriptor {
        name: name.to_string(),
        kind,
        parameters,
        variables,
    })
}
