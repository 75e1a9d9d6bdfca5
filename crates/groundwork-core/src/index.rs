//! State-variable indexing: the bijection between ground fluent variables
//! and dense integer handles.
//!
//! For every fluent symbol, in the order chosen by [`SymbolOrder`], the
//! Cartesian product of its argument domains is enumerated with the leftmost
//! argument varying slowest, and each tuple is appended to the index. Handles
//! are therefore dense, zero-based, and reproducible across runs.

use crate::classify::Classification;
use crate::error::{GroundError, GroundResult};
use crate::symbols::{Symbol, SymbolTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A fluent symbol applied to concrete objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroundVariable {
    pub symbol: String,
    pub args: Vec<String>,
}

impl GroundVariable {
    pub fn new(symbol: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            symbol: symbol.into(),
            args,
        }
    }
}

impl fmt::Display for GroundVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.symbol, self.args.join(","))
    }
}

impl FromStr for GroundVariable {
    type Err = String;

    /// Parse the listing form `symbol(a,b)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let open = s
            .find('(')
            .ok_or_else(|| format!("missing '(' in variable '{s}'"))?;
        let inner = s[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| format!("missing ')' in variable '{s}'"))?;
        let symbol = &s[..open];
        if symbol.is_empty() {
            return Err(format!("missing symbol in variable '{s}'"));
        }
        let args = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|a| a.trim().to_string()).collect()
        };
        Ok(Self::new(symbol, args))
    }
}

/// Dense identifier of a state variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub usize);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order in which fluent symbols receive their handle ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolOrder {
    /// Declaration order of the symbol table.
    #[default]
    Declaration,
    /// Ascending arity; ties keep declaration order.
    Arity,
}

impl FromStr for SymbolOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "declaration" => Ok(Self::Declaration),
            "arity" => Ok(Self::Arity),
            other => Err(format!("unknown symbol order '{other}' (expected declaration|arity)")),
        }
    }
}

impl fmt::Display for SymbolOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declaration => write!(f, "declaration"),
            Self::Arity => write!(f, "arity"),
        }
    }
}

/// Handle range of one fluent symbol: `handle = base + Σ pos_i · strides[i]`,
/// where `pos_i` is the position of argument `i` in its type's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLayout {
    pub symbol: String,
    pub base: usize,
    pub strides: Vec<usize>,
    pub size: usize,
}

/// Append-only bijection between ground variables and handles.
#[derive(Debug, Clone, Default)]
pub struct VariableIndex {
    variables: Vec<GroundVariable>,
    handles: HashMap<GroundVariable, Handle>,
    layouts: Vec<SymbolLayout>,
}

impl VariableIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variable, assigning the next handle.
    pub fn register(&mut self, variable: GroundVariable) -> GroundResult<Handle> {
        if self.handles.contains_key(&variable) {
            return Err(GroundError::DuplicateRegistration(variable));
        }
        let handle = Handle(self.variables.len());
        self.handles.insert(variable.clone(), handle);
        self.variables.push(variable);
        Ok(handle)
    }

    pub fn handle_of(&self, variable: &GroundVariable) -> Option<Handle> {
        self.handles.get(variable).copied()
    }

    pub fn variable(&self, handle: Handle) -> Option<&GroundVariable> {
        self.variables.get(handle.0)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Variables in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &GroundVariable)> {
        self.variables
            .iter()
            .enumerate()
            .map(|(i, v)| (Handle(i), v))
    }

    /// Layouts of the indexed symbols, in handle order.
    pub fn layouts(&self) -> &[SymbolLayout] {
        &self.layouts
    }

    pub fn layout(&self, symbol: &str) -> Option<&SymbolLayout> {
        self.layouts.iter().find(|l| l.symbol == symbol)
    }

    /// One variable per line; the line number is the handle.
    pub fn to_listing(&self) -> String {
        let mut out = String::new();
        for variable in &self.variables {
            out.push_str(&variable.to_string());
            out.push('\n');
        }
        out
    }

    /// Rebuild an index from [`to_listing`](Self::to_listing) output.
    pub fn from_listing(listing: &str) -> Result<Self, String> {
        let mut index = Self::new();
        for (line_no, line) in listing.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let variable: GroundVariable = line
                .parse()
                .map_err(|e| format!("line {}: {}", line_no + 1, e))?;
            index
                .register(variable)
                .map_err(|e| format!("line {}: {}", line_no + 1, e))?;
        }
        Ok(index)
    }
}

/// Fluent symbols in the order their handle ranges are allocated.
pub fn ordered_fluents<'a>(
    symbols: &'a SymbolTable,
    classification: &Classification,
    order: SymbolOrder,
) -> Vec<&'a Symbol> {
    let mut fluents: Vec<&Symbol> = symbols
        .iter()
        .filter(|s| classification.is_fluent(&s.name))
        .collect();
    if order == SymbolOrder::Arity {
        // sort_by_key is stable, so equal arities keep declaration order
        fluents.sort_by_key(|s| s.arity());
    }
    fluents
}

/// Enumerate and register every ground variable of every fluent symbol.
pub fn index_state_variables(
    symbols: &SymbolTable,
    classification: &Classification,
    order: SymbolOrder,
) -> GroundResult<VariableIndex> {
    let mut index = VariableIndex::new();

    for symbol in ordered_fluents(symbols, classification, order) {
        let domains = argument_domains(symbols, symbol)?;
        let base = index.len();
        let mut count = 0;
        for tuple in CartesianProduct::new(&domains) {
            index.register(GroundVariable::new(&symbol.name, tuple))?;
            count += 1;
        }
        tracing::debug!("indexed {} variables for {}", count, symbol.signature());
        index.layouts.push(SymbolLayout {
            symbol: symbol.name.clone(),
            base,
            strides: strides(&domains),
            size: count,
        });
    }

    tracing::info!("indexed {} state variables", index.len());
    Ok(index)
}

fn argument_domains<'a>(
    symbols: &'a SymbolTable,
    symbol: &Symbol,
) -> GroundResult<Vec<&'a [String]>> {
    symbol
        .params
        .iter()
        .map(|type_name| {
            symbols
                .domain(type_name)
                .ok_or_else(|| GroundError::UnboundedDomain {
                    type_name: type_name.clone(),
                    symbol: symbol.name.clone(),
                })
        })
        .collect()
}

fn strides(domains: &[&[String]]) -> Vec<usize> {
    let mut strides = vec![1; domains.len()];
    for i in (0..domains.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * domains[i + 1].len();
    }
    strides
}

/// Odometer over a list of domains; the last position turns fastest.
struct CartesianProduct<'a> {
    domains: &'a [&'a [String]],
    positions: Vec<usize>,
    done: bool,
}

impl<'a> CartesianProduct<'a> {
    fn new(domains: &'a [&'a [String]]) -> Self {
        Self {
            domains,
            positions: vec![0; domains.len()],
            done: domains.iter().any(|d| d.is_empty()),
        }
    }
}

impl Iterator for CartesianProduct<'_> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let tuple = self
            .positions
            .iter()
            .zip(self.domains)
            .map(|(&pos, domain)| domain[pos].clone())
            .collect();

        // Advance; a nullary product yields its single empty tuple once.
        self.done = true;
        for i in (0..self.positions.len()).rev() {
            self.positions[i] += 1;
            if self.positions[i] < self.domains[i].len() {
                self.done = false;
                break;
            }
            self.positions[i] = 0;
        }
        Some(tuple)
    }
}
