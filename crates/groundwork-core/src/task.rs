//! The lifted task as handed over by the external parser.
//!
//! The parser type-checks the domain and problem, resolves subtype inclusion
//! into flat type domains, and serializes the result as JSON. Everything in
//! here is read-only input to the grounding stages.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// A fully type-checked lifted task: symbol declarations, actions and initial facts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    pub domain: String,
    pub instance: String,
    /// Type name → ordered objects, subtypes already folded in.
    #[serde(default)]
    pub type_domains: Vec<TypeDomain>,
    /// All objects in declaration order.
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub predicates: Vec<PredicateDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub init: Vec<InitElement>,
    /// State constraints that hold in every reachable state.
    #[serde(default)]
    pub constraints: Vec<ConstraintUse>,
    /// Carried through from the parser but never processed here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDomain {
    pub name: String,
    pub objects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub codomain: String,
}

/// A lifted action schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ActionParam>,
    #[serde(default)]
    pub precondition: Formula,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Action {
    /// Position of a `?x` parameter in the action's binding.
    pub fn param_position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParam {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A term: action parameter, object constant, integer literal or function application.
///
/// On the wire, `"?x"` is a parameter, any other string an object, a number an
/// integer, and `{"symbol": .., "args": [..]}` an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TermRepr", into = "TermRepr")]
pub enum Term {
    Param(String),
    Object(String),
    Int(i64),
    App { symbol: String, args: Vec<Term> },
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TermRepr {
    Int(i64),
    Name(String),
    App { symbol: String, args: Vec<Term> },
}

impl From<TermRepr> for Term {
    fn from(repr: TermRepr) -> Self {
        match repr {
            TermRepr::Int(n) => Term::Int(n),
            TermRepr::Name(name) if name.starts_with('?') => Term::Param(name),
            TermRepr::Name(name) => Term::Object(name),
            TermRepr::App { symbol, args } => Term::App { symbol, args },
        }
    }
}

impl From<Term> for TermRepr {
    fn from(term: Term) -> Self {
        match term {
            Term::Int(n) => TermRepr::Int(n),
            Term::Param(name) | Term::Object(name) => TermRepr::Name(name),
            Term::App { symbol, args } => TermRepr::App { symbol, args },
        }
    }
}

impl Term {
    /// Whether the term applies any of the given symbols, at any depth.
    pub fn mentions(&self, pred: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Term::App { symbol, args } => pred(symbol) || args.iter().any(|a| a.mentions(pred)),
            _ => false,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Param(name) | Term::Object(name) => write!(f, "{name}"),
            Term::Int(n) => write!(f, "{n}"),
            Term::App { symbol, args } => write!(f, "{symbol}({})", join_display(args)),
        }
    }
}

/// Comparison operators usable in preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl RelOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }
}

/// Precondition formulas. Only conjunctive formulas reach the grounder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formula {
    #[default]
    True,
    Atom {
        symbol: String,
        #[serde(default)]
        args: Vec<Term>,
        #[serde(default)]
        negated: bool,
    },
    Relation {
        op: RelOp,
        lhs: Term,
        rhs: Term,
    },
    And {
        conjuncts: Vec<Formula>,
    },
    Constraint(ConstraintUse),
}

impl Formula {
    /// Flatten nested conjunctions into a list of literals, dropping `true`.
    pub fn conjuncts(&self) -> Vec<&Formula> {
        match self {
            Formula::True => Vec::new(),
            Formula::And { conjuncts } => conjuncts.iter().flat_map(|c| c.conjuncts()).collect(),
            other => vec![other],
        }
    }
}

/// An occurrence of a named constraint over a list of terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintUse {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub args: Vec<Term>,
}

/// A single effect literal. Its shape is validated during code generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub symbol: String,
    #[serde(default)]
    pub args: Vec<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Term>,
    #[serde(default)]
    pub negated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Formula>,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not ")?;
        }
        write!(f, "{}({})", self.symbol, join_display(&self.args))?;
        if let Some(value) = &self.value {
            write!(f, " := {value}")?;
        }
        if self.condition.is_some() {
            write!(f, " [conditional]")?;
        }
        Ok(())
    }
}

/// One element of the problem's initialization list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum InitElement {
    #[serde(rename = "atom")]
    Predicate {
        symbol: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        negated: bool,
    },
    #[serde(rename = "assign")]
    Function {
        symbol: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(deserialize_with = "literal_as_string")]
        value: String,
    },
}

impl InitElement {
    pub fn symbol(&self) -> &str {
        match self {
            InitElement::Predicate { symbol, .. } | InitElement::Function { symbol, .. } => symbol,
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            InitElement::Predicate { args, .. } | InitElement::Function { args, .. } => args,
        }
    }
}

impl fmt::Display for InitElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitElement::Predicate {
                symbol,
                args,
                negated,
            } => {
                if *negated {
                    write!(f, "not ")?;
                }
                write!(f, "{symbol}({})", args.join(","))
            }
            InitElement::Function {
                symbol,
                args,
                value,
            } => write!(f, "{symbol}({}) := {value}", args.join(",")),
        }
    }
}

/// Accept both `"3"` and `3` for assigned values.
fn literal_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Literal {
        Int(i64),
        Text(String),
    }
    Ok(match Literal::deserialize(deserializer)? {
        Literal::Int(n) => n.to_string(),
        Literal::Text(s) => s,
    })
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Deserialize a task from a JSON string.
pub fn from_json(json: &str) -> Result<Task> {
    serde_json::from_str(json).context("failed to deserialize task from JSON")
}

/// Load a task file written by the parser.
pub fn load(path: &Path) -> Result<Task> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read task from {}", path.display()))?;
    from_json(&json).with_context(|| format!("invalid task file {}", path.display()))
}
