//! Typed symbol table built from the parser's declarations.

use crate::error::{GroundError, GroundResult};
use crate::task::Task;
use std::collections::HashMap;

/// Name of the built-in equality symbol.
pub const EQUALITY: &str = "=";

/// Type name covering every declared object.
pub const OBJECT_TYPE: &str = "object";

/// Value types that need no object listing.
pub const NUMERIC_TYPES: &[&str] = &["int", "number"];

pub fn is_numeric_type(type_name: &str) -> bool {
    NUMERIC_TYPES.contains(&type_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Predicate,
    Function,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Predicate => write!(f, "predicate"),
            Self::Function => write!(f, "function"),
        }
    }
}

/// A predicate or function symbol with its typed signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Dense id in declaration order.
    pub id: usize,
    pub name: String,
    pub kind: SymbolKind,
    pub params: Vec<String>,
    /// `None` for predicates, whose codomain is boolean.
    pub codomain: Option<String>,
}

impl Symbol {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_predicate(&self) -> bool {
        self.kind == SymbolKind::Predicate
    }

    /// Signature as written in listings, e.g. `on(block,block)` or `loc(block):place`.
    pub fn signature(&self) -> String {
        match &self.codomain {
            Some(codomain) => format!("{}({}):{}", self.name, self.params.join(","), codomain),
            None => format!("{}({})", self.name, self.params.join(",")),
        }
    }
}

/// Read-only catalog of symbols and type domains.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, usize>,
    domains: HashMap<String, Vec<String>>,
}

impl SymbolTable {
    /// Build the table: predicates, then functions, then `=` unless declared.
    pub fn from_task(task: &Task) -> GroundResult<Self> {
        let mut table = Self::default();

        for domain in &task.type_domains {
            table
                .domains
                .insert(domain.name.clone(), domain.objects.clone());
        }
        table
            .domains
            .entry(OBJECT_TYPE.to_string())
            .or_insert_with(|| task.objects.clone());

        for p in &task.predicates {
            table.declare(&p.name, SymbolKind::Predicate, p.params.clone(), None)?;
        }
        for f in &task.functions {
            table.declare(
                &f.name,
                SymbolKind::Function,
                f.params.clone(),
                Some(f.codomain.clone()),
            )?;
        }
        if !table.contains(EQUALITY) {
            table.declare(
                EQUALITY,
                SymbolKind::Predicate,
                vec![OBJECT_TYPE.to_string(), OBJECT_TYPE.to_string()],
                None,
            )?;
        }

        table.check_types()?;
        Ok(table)
    }

    fn declare(
        &mut self,
        name: &str,
        kind: SymbolKind,
        params: Vec<String>,
        codomain: Option<String>,
    ) -> GroundResult<()> {
        if self.by_name.contains_key(name) {
            return Err(GroundError::DuplicateSymbol(name.to_string()));
        }
        let id = self.symbols.len();
        self.by_name.insert(name.to_string(), id);
        self.symbols.push(Symbol {
            id,
            name: name.to_string(),
            kind,
            params,
            codomain,
        });
        Ok(())
    }

    fn check_types(&self) -> GroundResult<()> {
        for symbol in &self.symbols {
            for type_name in symbol.params.iter().chain(symbol.codomain.iter()) {
                if !self.domains.contains_key(type_name) && !is_numeric_type(type_name) {
                    return Err(GroundError::UnknownType {
                        type_name: type_name.clone(),
                        symbol: symbol.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).map(|&id| &self.symbols[id])
    }

    /// Lookup that reports an unknown name as an error.
    pub fn require(&self, name: &str, context: &str) -> GroundResult<&Symbol> {
        self.get(name)
            .ok_or_else(|| GroundError::unknown_symbol(name, context))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Symbols in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Ordered objects of a type. Numeric and undeclared types have no listing.
    pub fn domain(&self, type_name: &str) -> Option<&[String]> {
        self.domains.get(type_name).map(Vec::as_slice)
    }
}
