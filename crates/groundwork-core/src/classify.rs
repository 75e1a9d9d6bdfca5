//! Static/fluent partition of the symbol table.
//!
//! A symbol is fluent iff some action effect targets it. Equality is always
//! static, whatever the effects say.

use crate::error::{GroundError, GroundResult};
use crate::symbols::{EQUALITY, SymbolTable};
use crate::task::Action;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolClass {
    Static,
    Fluent,
}

impl std::fmt::Display for SymbolClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Fluent => write!(f, "fluent"),
        }
    }
}

/// Total, immutable map from symbol name to its class.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Symbol names in declaration order, each with its tag.
    ordered: Vec<(String, SymbolClass)>,
    tags: HashMap<String, SymbolClass>,
}

impl Classification {
    pub fn tag(&self, symbol: &str) -> Option<SymbolClass> {
        self.tags.get(symbol).copied()
    }

    pub fn is_fluent(&self, symbol: &str) -> bool {
        self.tag(symbol) == Some(SymbolClass::Fluent)
    }

    pub fn is_static(&self, symbol: &str) -> bool {
        self.tag(symbol) == Some(SymbolClass::Static)
    }

    /// Fluent symbols in declaration order.
    pub fn fluents(&self) -> Vec<&str> {
        self.with_class(SymbolClass::Fluent)
    }

    /// Static symbols in declaration order.
    pub fn statics(&self) -> Vec<&str> {
        self.with_class(SymbolClass::Static)
    }

    fn with_class(&self, class: SymbolClass) -> Vec<&str> {
        self.ordered
            .iter()
            .filter(|(_, c)| *c == class)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SymbolClass)> {
        self.ordered.iter().map(|(name, c)| (name.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Classify every symbol of the table against the action set.
pub fn classify(actions: &[Action], symbols: &SymbolTable) -> GroundResult<Classification> {
    let mut fluent: HashSet<&str> = HashSet::new();
    for action in actions {
        for effect in &action.effects {
            if !symbols.contains(&effect.symbol) {
                return Err(GroundError::unknown_symbol(
                    &effect.symbol,
                    format!("effect of action '{}'", action.name),
                ));
            }
            fluent.insert(effect.symbol.as_str());
        }
    }
    fluent.remove(EQUALITY);

    let ordered: Vec<(String, SymbolClass)> = symbols
        .names()
        .map(|name| {
            let class = if fluent.contains(name) {
                SymbolClass::Fluent
            } else {
                SymbolClass::Static
            };
            (name.to_string(), class)
        })
        .collect();
    let tags = ordered.iter().cloned().collect();

    let classification = Classification { ordered, tags };
    tracing::debug!(
        "classified {} symbols: {} fluent, {} static",
        classification.len(),
        classification.fluents().len(),
        classification.statics().len()
    );
    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Effect, PredicateDecl, Task, Term, TypeDomain};

    fn effect(symbol: &str) -> Effect {
        Effect {
            symbol: symbol.to_string(),
            args: vec![Term::Param("?x".to_string())],
            value: None,
            negated: false,
            condition: None,
        }
    }

    fn action(name: &str, effects: Vec<Effect>) -> Action {
        Action {
            name: name.to_string(),
            params: vec![],
            precondition: crate::task::Formula::True,
            effects,
        }
    }

    fn table() -> SymbolTable {
        let task = Task {
            type_domains: vec![TypeDomain {
                name: "block".to_string(),
                objects: vec!["a".to_string()],
            }],
            predicates: ["on", "clear", "holding"]
                .iter()
                .map(|n| PredicateDecl {
                    name: n.to_string(),
                    params: vec!["block".to_string()],
                })
                .collect(),
            ..Task::default()
        };
        SymbolTable::from_task(&task).unwrap()
    }

    #[test]
    fn test_precondition_only_symbol_is_static() {
        let actions = vec![
            action("stack", vec![effect("on")]),
            action("noop", vec![]),
        ];
        let c = classify(&actions, &table()).unwrap();
        assert_eq!(c.tag("on"), Some(SymbolClass::Fluent));
        assert_eq!(c.tag("clear"), Some(SymbolClass::Static));
        assert_eq!(c.fluents(), vec!["on"]);
        assert_eq!(c.statics(), vec!["clear", "holding", "="]);
    }

    #[test]
    fn test_classification_is_total() {
        let table = table();
        let c = classify(&[action("a", vec![effect("holding")])], &table).unwrap();
        assert_eq!(c.len(), table.len());
        for name in table.names() {
            assert!(c.is_fluent(name) ^ c.is_static(name), "{name}");
        }
    }

    #[test]
    fn test_equality_forced_static() {
        let c = classify(&[action("weird", vec![effect("=")])], &table()).unwrap();
        assert_eq!(c.tag("="), Some(SymbolClass::Static));
        assert_eq!(c.statics().iter().filter(|n| **n == "=").count(), 1);
    }

    #[test]
    fn test_unknown_effect_target() {
        let err = classify(&[action("a", vec![effect("ontable")])], &table()).unwrap_err();
        assert!(matches!(
            err,
            GroundError::UnknownSymbol { ref symbol, .. } if symbol == "ontable"
        ));
    }

    #[test]
    fn test_independent_of_action_order() {
        let mut actions = vec![
            action("a", vec![effect("holding")]),
            action("b", vec![effect("on")]),
        ];
        let fluents = |actions: &[Action]| -> Vec<String> {
            classify(actions, &table())
                .unwrap()
                .fluents()
                .iter()
                .map(|s| s.to_string())
                .collect()
        };
        let first = fluents(&actions);
        actions.reverse();
        let second = fluents(&actions);
        assert_eq!(first, second);
    }
}
