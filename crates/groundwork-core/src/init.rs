//! Initial-state compilation.
//!
//! Walks the problem's initialization list once, validating each element
//! against the symbol table and variable index, and records one assignment
//! per symbol. Static symbols are recorded as well: their extensions feed the
//! static data the generated preconditions evaluate against.

use crate::error::{GroundError, GroundResult};
use crate::index::{GroundVariable, Handle, VariableIndex};
use crate::objects::bool_token;
use crate::symbols::{EQUALITY, Symbol, SymbolKind, SymbolTable, is_numeric_type};
use crate::task::InitElement;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// A value in a function's codomain, or a predicate's truth value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Object(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", bool_token(*b)),
            Value::Int(n) => write!(f, "{n}"),
            Value::Object(name) => write!(f, "{name}"),
        }
    }
}

pub type Tuple = Vec<String>;

/// The initial extension of one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// Tuples for which a predicate holds.
    Relation(BTreeSet<Tuple>),
    /// Explicitly assigned function values.
    Function(BTreeMap<Tuple, Value>),
}

impl Assignment {
    fn empty(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Predicate => Assignment::Relation(BTreeSet::new()),
            SymbolKind::Function => Assignment::Function(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Assignment::Relation(tuples) => tuples.len(),
            Assignment::Function(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(tuple, value)` pairs in tuple order.
    pub fn entries(&self) -> Vec<(&Tuple, Value)> {
        match self {
            Assignment::Relation(tuples) => tuples.iter().map(|t| (t, Value::Bool(true))).collect(),
            Assignment::Function(values) => values.iter().map(|(t, v)| (t, v.clone())).collect(),
        }
    }
}

/// Compiled initial assignment of every declared symbol (equality excluded).
#[derive(Debug, Clone, Default)]
pub struct InitialState {
    assignments: BTreeMap<String, Assignment>,
}

impl InitialState {
    pub fn get(&self, symbol: &str) -> Option<&Assignment> {
        self.assignments.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.assignments.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Total number of initialized (symbol, tuple) pairs.
    pub fn atom_count(&self) -> usize {
        self.assignments.values().map(Assignment::len).sum()
    }

    /// Explicitly initialized fluent variables, in handle order.
    pub fn explicit_values(&self, index: &VariableIndex) -> Vec<(Handle, Value)> {
        let mut values: Vec<(Handle, Value)> = self
            .assignments
            .iter()
            .flat_map(|(symbol, assignment)| {
                assignment.entries().into_iter().filter_map(move |(tuple, value)| {
                    let var = GroundVariable::new(symbol.clone(), tuple.clone());
                    index.handle_of(&var).map(|h| (h, value))
                })
            })
            .collect();
        values.sort_by_key(|(h, _)| *h);
        values
    }
}

/// Compile the initialization list against the symbol table and variable index.
pub fn compile_initial_state(
    init: &[InitElement],
    symbols: &SymbolTable,
    index: &VariableIndex,
) -> GroundResult<InitialState> {
    let mut compiler = InitCompiler::new(symbols, index);
    for element in init {
        compiler.add(element)?;
    }
    let state = compiler.state;
    tracing::info!(
        "compiled {} initial atoms over {} symbols",
        state.atom_count(),
        state.assignments.len()
    );
    Ok(state)
}

struct InitCompiler<'a> {
    symbols: &'a SymbolTable,
    index: &'a VariableIndex,
    /// Object listings as sets, built on first use per type.
    domain_sets: HashMap<String, HashSet<&'a str>>,
    state: InitialState,
}

impl<'a> InitCompiler<'a> {
    fn new(symbols: &'a SymbolTable, index: &'a VariableIndex) -> Self {
        let assignments = symbols
            .iter()
            .filter(|s| s.name != EQUALITY)
            .map(|s| (s.name.clone(), Assignment::empty(s.kind)))
            .collect();
        Self {
            symbols,
            index,
            domain_sets: HashMap::new(),
            state: InitialState { assignments },
        }
    }

    fn add(&mut self, element: &InitElement) -> GroundResult<()> {
        let symbols = self.symbols;
        let symbol = symbols.require(element.symbol(), &format!("initial element '{element}'"))?;
        if symbol.name == EQUALITY {
            return Err(invalid(element, "equality cannot be initialized"));
        }
        if element.args().len() != symbol.arity() {
            return Err(invalid(
                element,
                format!("expected {} arguments, got {}", symbol.arity(), element.args().len()),
            ));
        }

        let value = match element {
            InitElement::Predicate { negated, .. } => {
                if symbol.kind != SymbolKind::Predicate {
                    return Err(invalid(element, "function symbol initialized as an atom"));
                }
                if *negated {
                    return Err(invalid(
                        element,
                        "negated atoms are not allowed in the initial state",
                    ));
                }
                None
            }
            InitElement::Function { value, .. } => {
                if symbol.kind != SymbolKind::Function {
                    return Err(invalid(element, "predicate symbol initialized with a value"));
                }
                Some(self.parse_value(symbol, value, element)?)
            }
        };

        self.check_arguments(symbol, element)?;

        let tuple: Tuple = element.args().to_vec();
        let duplicate = match (self.state.assignments.get_mut(&symbol.name), value) {
            (Some(Assignment::Relation(tuples)), None) => !tuples.insert(tuple.clone()),
            (Some(Assignment::Function(values)), Some(value)) => {
                if values.contains_key(&tuple) {
                    true
                } else {
                    values.insert(tuple.clone(), value);
                    false
                }
            }
            _ => unreachable!("assignment shape follows symbol kind"),
        };
        if duplicate {
            return Err(GroundError::DuplicateInitialization {
                variable: GroundVariable::new(&symbol.name, tuple),
                element: element.to_string(),
            });
        }
        Ok(())
    }

    /// Fluent tuples must name an indexed variable; static tuples must lie in their domains.
    fn check_arguments(&mut self, symbol: &Symbol, element: &InitElement) -> GroundResult<()> {
        let variable = GroundVariable::new(&symbol.name, element.args().to_vec());
        if self.index.layout(&symbol.name).is_some() {
            return match self.index.handle_of(&variable) {
                Some(_) => Ok(()),
                None => Err(GroundError::OutOfDomain(variable)),
            };
        }
        for (type_name, arg) in symbol.params.iter().zip(element.args()) {
            if !self.in_domain(type_name, arg) {
                return Err(GroundError::OutOfDomain(variable));
            }
        }
        Ok(())
    }

    fn in_domain(&mut self, type_name: &str, value: &str) -> bool {
        if is_numeric_type(type_name) {
            return value.parse::<i64>().is_ok();
        }
        let symbols = self.symbols;
        self.domain_sets
            .entry(type_name.to_string())
            .or_insert_with(|| {
                symbols
                    .domain(type_name)
                    .unwrap_or_default()
                    .iter()
                    .map(String::as_str)
                    .collect()
            })
            .contains(value)
    }

    fn parse_value(
        &mut self,
        symbol: &Symbol,
        raw: &str,
        element: &InitElement,
    ) -> GroundResult<Value> {
        let codomain = symbol.codomain.as_deref().unwrap_or_default();
        let value = raw.trim();
        if is_numeric_type(codomain) {
            return value
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid(element, format!("'{raw}' is not a valid {codomain}")));
        }
        if self.in_domain(codomain, value) {
            Ok(Value::Object(value.to_string()))
        } else {
            Err(invalid(
                element,
                format!("'{raw}' is not an object of type {codomain}"),
            ))
        }
    }
}

fn invalid(element: &InitElement, reason: impl Into<String>) -> GroundError {
    GroundError::InvalidInit {
        element: element.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::index::{SymbolOrder, index_state_variables};
    use crate::task::{Action, Effect, FunctionDecl, PredicateDecl, Task, TypeDomain};

    fn effect(symbol: &str) -> Effect {
        Effect {
            symbol: symbol.to_string(),
            args: vec![],
            value: None,
            negated: false,
            condition: None,
        }
    }

    fn task() -> Task {
        Task {
            type_domains: vec![
                TypeDomain {
                    name: "block".to_string(),
                    objects: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                },
                TypeDomain {
                    name: "place".to_string(),
                    objects: vec!["table".to_string(), "shelf".to_string()],
                },
            ],
            predicates: vec![
                PredicateDecl {
                    name: "on".to_string(),
                    params: vec!["block".to_string(), "block".to_string()],
                },
                PredicateDecl {
                    name: "heavy".to_string(),
                    params: vec!["block".to_string()],
                },
            ],
            functions: vec![
                FunctionDecl {
                    name: "loc".to_string(),
                    params: vec!["block".to_string()],
                    codomain: "place".to_string(),
                },
                FunctionDecl {
                    name: "weight".to_string(),
                    params: vec!["block".to_string()],
                    codomain: "int".to_string(),
                },
            ],
            actions: vec![Action {
                name: "move".to_string(),
                params: vec![],
                precondition: crate::task::Formula::True,
                effects: vec![effect("on"), effect("loc")],
            }],
            ..Task::default()
        }
    }

    fn atom(symbol: &str, args: &[&str]) -> InitElement {
        InitElement::Predicate {
            symbol: symbol.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            negated: false,
        }
    }

    fn assign(symbol: &str, args: &[&str], value: &str) -> InitElement {
        InitElement::Function {
            symbol: symbol.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            value: value.to_string(),
        }
    }

    fn compile(init: &[InitElement]) -> GroundResult<(InitialState, VariableIndex)> {
        let task = task();
        let symbols = SymbolTable::from_task(&task).unwrap();
        let classification = classify(&task.actions, &symbols).unwrap();
        let index =
            index_state_variables(&symbols, &classification, SymbolOrder::Declaration).unwrap();
        compile_initial_state(init, &symbols, &index).map(|s| (s, index))
    }

    #[test]
    fn test_records_fluent_and_static() {
        let (state, index) = compile(&[
            atom("on", &["a", "b"]),
            atom("heavy", &["c"]),
            assign("loc", &["a"], "table"),
            assign("weight", &["c"], "12"),
        ])
        .unwrap();
        assert_eq!(state.atom_count(), 4);
        assert!(matches!(state.get("heavy"), Some(Assignment::Relation(t)) if t.len() == 1));
        assert!(matches!(
            state.get("weight"),
            Some(Assignment::Function(v)) if v[&vec!["c".to_string()]] == Value::Int(12)
        ));
        assert!(state.get("=").is_none());

        let explicit = state.explicit_values(&index);
        assert_eq!(explicit.len(), 2);
        assert_eq!(explicit[0], (Handle(1), Value::Bool(true)));
        assert_eq!(explicit[1], (Handle(9), Value::Object("table".to_string())));
    }

    #[test]
    fn test_duplicate_atom() {
        let err = compile(&[atom("on", &["a", "b"]), atom("on", &["a", "b"])]).unwrap_err();
        match err {
            GroundError::DuplicateInitialization { variable, .. } => {
                assert_eq!(variable.to_string(), "on(a,b)")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_assignment() {
        let err = compile(&[
            assign("loc", &["a"], "table"),
            assign("loc", &["a"], "shelf"),
        ])
        .unwrap_err();
        assert!(matches!(err, GroundError::DuplicateInitialization { .. }));
    }

    #[test]
    fn test_negated_atom_rejected() {
        let err = compile(&[InitElement::Predicate {
            symbol: "on".to_string(),
            args: vec!["a".to_string(), "b".to_string()],
            negated: true,
        }])
        .unwrap_err();
        assert!(matches!(
            err,
            GroundError::InvalidInit { ref reason, .. } if reason.contains("negated")
        ));
    }

    #[test]
    fn test_unknown_symbol() {
        let err = compile(&[atom("ontable", &["a"])]).unwrap_err();
        assert!(matches!(err, GroundError::UnknownSymbol { .. }));
    }

    #[test]
    fn test_value_outside_codomain() {
        let err = compile(&[assign("loc", &["a"], "floor")]).unwrap_err();
        assert!(err.to_string().contains("not an object of type place"));
        let err = compile(&[assign("weight", &["a"], "heavy")]).unwrap_err();
        assert!(err.to_string().contains("not a valid int"));
    }

    #[test]
    fn test_values_are_trimmed() {
        let (state, _) = compile(&[
            assign("loc", &["a"], " table"),
            assign("weight", &["a"], " 7 "),
        ])
        .unwrap();
        assert!(matches!(
            state.get("loc"),
            Some(Assignment::Function(v))
                if v[&vec!["a".to_string()]] == Value::Object("table".to_string())
        ));
        assert!(matches!(
            state.get("weight"),
            Some(Assignment::Function(v)) if v[&vec!["a".to_string()]] == Value::Int(7)
        ));
    }

    #[test]
    fn test_argument_outside_domain() {
        let err = compile(&[atom("on", &["a", "table"])]).unwrap_err();
        assert!(matches!(err, GroundError::OutOfDomain(_)));
        let err = compile(&[atom("heavy", &["shelf"])]).unwrap_err();
        assert!(matches!(err, GroundError::OutOfDomain(_)));
    }

    #[test]
    fn test_shape_and_arity_mismatch() {
        assert!(matches!(
            compile(&[assign("on", &["a", "b"], "1")]).unwrap_err(),
            GroundError::InvalidInit { .. }
        ));
        assert!(matches!(
            compile(&[atom("loc", &["a"])]).unwrap_err(),
            GroundError::InvalidInit { .. }
        ));
        assert!(matches!(
            compile(&[atom("on", &["a"])]).unwrap_err(),
            GroundError::InvalidInit { .. }
        ));
    }
}
