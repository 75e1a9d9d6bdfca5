//! Sequential grounding pipeline: symbol table → classification → variable
//! index → initial state. Every stage must succeed before the next starts.

use crate::classify::{Classification, classify};
use crate::config::GroundingConfig;
use crate::error::{GroundError, GroundResult};
use crate::index::{VariableIndex, index_state_variables};
use crate::init::{InitialState, compile_initial_state};
use crate::objects::ObjectIndex;
use crate::symbols::SymbolTable;
use crate::task::Task;

/// The fully resolved, immutable ground model handed to code generation.
#[derive(Debug, Clone)]
pub struct GroundModel {
    pub domain: String,
    pub instance: String,
    pub symbols: SymbolTable,
    pub objects: ObjectIndex,
    pub classification: Classification,
    pub index: VariableIndex,
    pub init: InitialState,
}

impl GroundModel {
    pub fn build(task: &Task, config: &GroundingConfig) -> GroundResult<Self> {
        if task.goal.is_some() {
            tracing::debug!("goal formula present; not processed by the grounder");
        }

        let symbols = SymbolTable::from_task(task)?;
        let objects = ObjectIndex::new(&task.objects);
        check_type_domains(task, &objects)?;
        tracing::info!(
            "loaded {} symbols, {} objects, {} actions",
            symbols.len(),
            task.objects.len(),
            task.actions.len()
        );

        let classification = classify(&task.actions, &symbols)?;
        tracing::info!(
            "classified symbols: {} fluent, {} static",
            classification.fluents().len(),
            classification.statics().len()
        );

        let index = index_state_variables(&symbols, &classification, config.symbol_order)?;
        let init = compile_initial_state(&task.init, &symbols, &index)?;

        Ok(Self {
            domain: task.domain.clone(),
            instance: task.instance.clone(),
            symbols,
            objects,
            classification,
            index,
            init,
        })
    }
}

/// Every object listed under a type must also have an object id.
fn check_type_domains(task: &Task, objects: &ObjectIndex) -> GroundResult<()> {
    for domain in &task.type_domains {
        if let Some(missing) = domain.objects.iter().find(|o| objects.id(o).is_none()) {
            return Err(GroundError::UndeclaredObject {
                object: missing.clone(),
                type_name: domain.name.clone(),
            });
        }
    }
    Ok(())
}
