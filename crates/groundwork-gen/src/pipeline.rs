//! End-to-end compilation: ground the task, then render every unit.

use crate::artifact::{Artifact, ArtifactSet};
use crate::cache::TemplateCache;
use crate::codegen::{ConstraintPlan, Generator, plan_constraints};
use crate::data;
use crate::error::GenResult;
use groundwork_core::GroundModel;
use groundwork_core::config::GroundworkConfig;
use groundwork_core::task::Task;
use rayon::prelude::*;
use serde::Serialize;

/// Result of a successful compilation. Nothing has been written yet.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub model: GroundModel,
    pub plan: ConstraintPlan,
    pub artifacts: ArtifactSet,
}

/// Counts reported after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileSummary {
    pub domain: String,
    pub instance: String,
    pub symbols: usize,
    pub fluents: usize,
    pub statics: usize,
    pub objects: usize,
    pub variables: usize,
    pub initial_atoms: usize,
    pub constraints: usize,
    pub static_constraints: usize,
    pub artifacts: usize,
}

impl CompileOutput {
    pub fn summary(&self) -> CompileSummary {
        CompileSummary {
            domain: self.model.domain.clone(),
            instance: self.model.instance.clone(),
            symbols: self.model.symbols.len(),
            fluents: self.model.classification.fluents().len(),
            statics: self.model.classification.statics().len(),
            objects: self.model.objects.len(),
            variables: self.model.index.len(),
            initial_atoms: self.model.init.atom_count(),
            constraints: self.plan.instances.len(),
            static_constraints: self.plan.statics().count(),
            artifacts: self.artifacts.len(),
        }
    }
}

/// Run the grounding stages and generate every artifact in memory.
///
/// Action and constraint units are rendered on the rayon pool unless
/// `generation.parallel` is off. The first failing unit, in artifact order,
/// aborts the run.
pub fn compile(
    task: &Task,
    config: &GroundworkConfig,
    cache: &TemplateCache,
) -> GenResult<CompileOutput> {
    let model = GroundModel::build(task, &config.grounding)?;
    let plan = plan_constraints(task, &model, config.grounding.resolve_static_externals)?;
    let generator = Generator::new(task, &model, &plan, cache);

    let parallel = config.generation.parallel;
    tracing::info!(
        "generating {} action units and {} constraint units ({})",
        task.actions.len(),
        plan.deferred().count(),
        if parallel { "parallel" } else { "sequential" }
    );

    let actions: Vec<GenResult<Artifact>> = if parallel {
        (0..task.actions.len())
            .into_par_iter()
            .map(|position| generator.action_unit(position))
            .collect()
    } else {
        (0..task.actions.len())
            .map(|position| generator.action_unit(position))
            .collect()
    };

    let deferred: Vec<_> = plan.deferred().collect();
    let constraints: Vec<GenResult<Artifact>> = if parallel {
        deferred
            .par_iter()
            .map(|instance| generator.constraint_unit(instance))
            .collect()
    } else {
        deferred
            .iter()
            .map(|instance| generator.constraint_unit(instance))
            .collect()
    };

    let mut artifacts = actions
        .into_iter()
        .chain(constraints)
        .collect::<GenResult<Vec<_>>>()?;
    artifacts.push(generator.components_unit()?);
    artifacts.extend([
        data::symbols_unit(&model),
        data::variables_unit(&model),
        data::objects_unit(&model),
        data::init_unit(&model)?,
        data::static_constraints_unit(&plan),
    ]);
    artifacts.extend(data::static_units(&model)?);

    let artifacts = ArtifactSet::new(artifacts);
    tracing::info!("rendered {} artifacts", artifacts.len());
    Ok(CompileOutput {
        model,
        plan,
        artifacts,
    })
}
