//! Per-unit code generation over an immutable ground model.
//!
//! Constraint instantiations are numbered up front by [`plan_constraints`]
//! so that action and constraint units can then be rendered independently,
//! in any order, from any thread.

use crate::artifact::Artifact;
use crate::cache::TemplateCache;
use crate::error::{GenError, GenResult};
use crate::template::Bindings;
use groundwork_core::GroundModel;
use groundwork_core::GroundError;
use groundwork_core::constraints::{self, ConstraintDescriptor, ConstraintKind};
use groundwork_core::objects::bool_token;
use groundwork_core::symbols::{EQUALITY, Symbol};
use groundwork_core::task::{Action, ConstraintUse, Effect, Formula, Task, Term};
use std::fmt;

const STATE_SCOPE: &str = "state constraints";
const INDENT: &str = "        ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintOrigin {
    /// Declared at task level; must hold in every state.
    State,
    /// Appears in the precondition of the named action.
    Action(String),
}

impl fmt::Display for ConstraintOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintOrigin::State => write!(f, "state constraint"),
            ConstraintOrigin::Action(name) => write!(f, "action {name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Decided against static data only.
    Static,
    /// Checked against the state at search time.
    Deferred,
}

/// One numbered use of a catalog constraint.
#[derive(Debug, Clone)]
pub struct ConstraintInstance {
    pub id: usize,
    pub descriptor: ConstraintDescriptor,
    pub origin: ConstraintOrigin,
    pub evaluation: Evaluation,
    pub args: Vec<Term>,
}

impl ConstraintInstance {
    pub fn is_static(&self) -> bool {
        self.evaluation == Evaluation::Static
    }
}

/// Every constraint instantiation of a task, with ids assigned.
#[derive(Debug, Clone, Default)]
pub struct ConstraintPlan {
    pub instances: Vec<ConstraintInstance>,
    per_action: Vec<Vec<usize>>,
}

impl ConstraintPlan {
    /// Ids of the constraints in an action's precondition, in conjunct order.
    pub fn for_action(&self, position: usize) -> &[usize] {
        self.per_action
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn deferred(&self) -> impl Iterator<Item = &ConstraintInstance> {
        self.instances.iter().filter(|c| !c.is_static())
    }

    pub fn statics(&self) -> impl Iterator<Item = &ConstraintInstance> {
        self.instances.iter().filter(|c| c.is_static())
    }
}

/// Number the task's constraint uses: state constraints first, then each
/// action's precondition constraints in declaration and conjunct order.
///
/// With `resolve_static_externals`, an external constraint whose arguments
/// apply no fluent symbol is marked [`Evaluation::Static`].
pub fn plan_constraints(
    task: &Task,
    model: &GroundModel,
    resolve_static_externals: bool,
) -> GenResult<ConstraintPlan> {
    let mut plan = ConstraintPlan::default();

    let add = |plan: &mut ConstraintPlan,
               usage: &ConstraintUse,
               origin: ConstraintOrigin|
     -> GenResult<usize> {
        let descriptor = constraints::instantiate(
            &usage.name,
            usage.parameters.clone(),
            usage.args.iter().map(ToString::to_string).collect(),
        )?;
        let reads_state = usage
            .args
            .iter()
            .any(|arg| arg.mentions(&|symbol| model.classification.is_fluent(symbol)));
        let evaluation = if resolve_static_externals
            && descriptor.kind == ConstraintKind::External
            && !reads_state
        {
            Evaluation::Static
        } else {
            Evaluation::Deferred
        };
        let id = plan.instances.len();
        tracing::debug!("constraint {} = {} ({}, {:?})", id, usage.name, origin, evaluation);
        plan.instances.push(ConstraintInstance {
            id,
            descriptor,
            origin,
            evaluation,
            args: usage.args.clone(),
        });
        Ok(id)
    };

    for usage in &task.constraints {
        if let Some(param) = usage.args.iter().find_map(first_param) {
            return Err(GroundError::UnknownParameter {
                action: STATE_SCOPE.to_string(),
                param: param.to_string(),
            }
            .into());
        }
        add(&mut plan, usage, ConstraintOrigin::State)?;
    }

    for action in &task.actions {
        let mut ids = Vec::new();
        for conjunct in action.precondition.conjuncts() {
            if let Formula::Constraint(usage) = conjunct {
                ids.push(add(&mut plan, usage, ConstraintOrigin::Action(action.name.clone()))?);
            }
        }
        plan.per_action.push(ids);
    }

    tracing::info!(
        "planned {} constraint instantiations ({} static)",
        plan.instances.len(),
        plan.statics().count()
    );
    Ok(plan)
}

fn first_param(term: &Term) -> Option<&str> {
    match term {
        Term::Param(name) => Some(name),
        Term::App { args, .. } => args.iter().find_map(first_param),
        Term::Object(_) | Term::Int(_) => None,
    }
}

/// `pick-up` → `PickUpAction`.
pub fn class_name(action: &str) -> String {
    let mut name: String = action
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect();
    name.push_str("Action");
    name
}

/// The action whose parameters bind while rendering its unit.
#[derive(Clone, Copy)]
struct Scope<'s> {
    context: &'s str,
    action: &'s Action,
}

impl<'s> Scope<'s> {
    fn action(action: &'s Action) -> Self {
        Self {
            context: &action.name,
            action,
        }
    }

    fn invalid(&self, detail: String) -> GenError {
        GenError::InvalidTerm {
            context: self.context.to_string(),
            detail,
        }
    }

    fn unimplemented(&self, detail: impl Into<String>) -> GenError {
        GroundError::UnimplementedEffectShape {
            action: self.context.to_string(),
            detail: detail.into(),
        }
        .into()
    }
}

/// Renders code units from a ground model through the template cache.
pub struct Generator<'a> {
    task: &'a Task,
    model: &'a GroundModel,
    plan: &'a ConstraintPlan,
    cache: &'a TemplateCache,
}

impl<'a> Generator<'a> {
    pub fn new(
        task: &'a Task,
        model: &'a GroundModel,
        plan: &'a ConstraintPlan,
        cache: &'a TemplateCache,
    ) -> Self {
        Self {
            task,
            model,
            plan,
            cache,
        }
    }

    fn fill(&self, template: &str, bindings: &Bindings<'_>) -> GenResult<String> {
        self.cache.get(template)?.render(bindings)
    }

    fn header(&self) -> Bindings<'a> {
        Bindings::from([
            ("domain", self.model.domain.clone()),
            ("instance", self.model.instance.clone()),
        ])
    }

    fn source(&self, symbol: &str) -> &'static str {
        if self.model.classification.is_fluent(symbol) {
            "state"
        } else {
            "statics"
        }
    }

    fn check_arity(symbol: &Symbol, args: &[Term], scope: Scope<'_>) -> GenResult<()> {
        if symbol.arity() == args.len() {
            Ok(())
        } else {
            Err(scope.invalid(format!(
                "{} expects {} arguments, got {}",
                symbol.name,
                symbol.arity(),
                args.len()
            )))
        }
    }

    fn render_args(&self, args: &[Term], scope: Scope<'_>) -> GenResult<Vec<String>> {
        args.iter().map(|arg| self.render_term(arg, scope)).collect()
    }

    fn render_term(&self, term: &Term, scope: Scope<'_>) -> GenResult<String> {
        match term {
            Term::Param(name) => scope
                .action
                .param_position(name)
                .map(|position| format!("binding[{position}]"))
                .ok_or_else(|| {
                    GroundError::UnknownParameter {
                        action: scope.context.to_string(),
                        param: name.clone(),
                    }
                    .into()
                }),
            Term::Object(name) => self
                .model
                .objects
                .id(name)
                .map(|id| id.to_string())
                .ok_or_else(|| scope.invalid(format!("unknown object '{name}'"))),
            Term::Int(n) => Ok(n.to_string()),
            Term::App { symbol, args } => {
                let sym = self.model.symbols.require(symbol, scope.context)?;
                if sym.is_predicate() {
                    return Err(scope.invalid(format!("predicate '{symbol}' used as a term")));
                }
                Self::check_arity(sym, args, scope)?;
                let mut bindings = Bindings::from([
                    ("source", self.source(symbol).to_string()),
                    ("symbol_id", sym.id.to_string()),
                ]);
                bindings.insert("args", self.render_args(args, scope)?.join(", "));
                self.fill("term_value", &bindings)
            }
        }
    }

    fn render_atom(
        &self,
        symbol: &str,
        args: &[Term],
        negated: bool,
        scope: Scope<'_>,
    ) -> GenResult<String> {
        let rendered = self.render_args(args, scope)?;
        let expr = if symbol == EQUALITY {
            match rendered.as_slice() {
                [lhs, rhs] => format!("({lhs} == {rhs})"),
                _ => {
                    return Err(scope.invalid(format!(
                        "equality expects 2 arguments, got {}",
                        args.len()
                    )));
                }
            }
        } else {
            let sym = self.model.symbols.require(symbol, scope.context)?;
            if !sym.is_predicate() {
                return Err(scope.invalid(format!("function '{symbol}' used as an atom")));
            }
            Self::check_arity(sym, args, scope)?;
            let mut bindings = Bindings::from([
                ("source", self.source(symbol).to_string()),
                ("symbol_id", sym.id.to_string()),
            ]);
            if let [arg] = rendered.as_slice() {
                bindings.insert("arg", arg.clone());
                self.fill("holds_unary", &bindings)?
            } else {
                bindings.insert("args", rendered.join(", "));
                self.fill("holds_nary", &bindings)?
            }
        };
        Ok(if negated { format!("!({expr})") } else { expr })
    }

    fn render_constraint_check(
        &self,
        instance: &ConstraintInstance,
        scope: Scope<'_>,
    ) -> GenResult<String> {
        let bindings = Bindings::from([
            ("id", instance.id.to_string()),
            ("args", self.render_args(&instance.args, scope)?.join(", ")),
        ]);
        match instance.evaluation {
            Evaluation::Static => self.fill("static_constraint_check", &bindings),
            Evaluation::Deferred => self.fill("constraint_check", &bindings),
        }
    }

    fn render_preconditions(&self, position: usize, action: &Action) -> GenResult<String> {
        let scope = Scope::action(action);
        let mut constraint_ids = self.plan.for_action(position).iter();
        let mut lines = Vec::new();

        for conjunct in action.precondition.conjuncts() {
            let expr = match conjunct {
                Formula::True | Formula::And { .. } => continue,
                Formula::Atom {
                    symbol,
                    args,
                    negated,
                } => self.render_atom(symbol, args, *negated, scope)?,
                Formula::Relation { op, lhs, rhs } => format!(
                    "({} {} {})",
                    self.render_term(lhs, scope)?,
                    op.as_str(),
                    self.render_term(rhs, scope)?
                ),
                Formula::Constraint(usage) => {
                    let instance = constraint_ids
                        .next()
                        .and_then(|id| self.plan.instances.get(*id))
                        .ok_or_else(|| {
                            scope.invalid(format!("constraint '{}' was not planned", usage.name))
                        })?;
                    self.render_constraint_check(instance, scope)?
                }
            };
            lines.push(format!("{INDENT}if (!({expr})) return false;"));
        }
        Ok(lines.join("\n"))
    }

    fn render_effect(&self, effect: &Effect, scope: Scope<'_>) -> GenResult<String> {
        if effect.condition.is_some() {
            return Err(scope.unimplemented(format!("conditional effect {effect}")));
        }
        let sym = self.model.symbols.require(&effect.symbol, scope.context)?;
        if !self.model.classification.is_fluent(&sym.name) {
            return Err(scope.unimplemented(format!("effect on static symbol {effect}")));
        }
        Self::check_arity(sym, &effect.args, scope)?;
        if effect.args.iter().any(|arg| matches!(arg, Term::App { .. })) {
            return Err(scope.unimplemented(format!("nested function term in {effect}")));
        }

        let value = if sym.is_predicate() {
            if effect.value.is_some() {
                return Err(scope.unimplemented(format!("value assigned to predicate in {effect}")));
            }
            bool_token(!effect.negated).to_string()
        } else {
            if effect.negated {
                return Err(scope.unimplemented(format!("negated function effect {effect}")));
            }
            let value = effect.value.as_ref().ok_or_else(|| {
                scope.unimplemented(format!("function effect without value {effect}"))
            })?;
            self.render_term(value, scope)?
        };

        let mut bindings = Bindings::from([
            ("symbol_id", sym.id.to_string()),
            ("value", value),
            ("effect", effect.to_string()),
        ]);
        bindings.insert("args", self.render_args(&effect.args, scope)?.join(", "));
        Ok(format!("{INDENT}{}", self.fill("effect", &bindings)?))
    }

    /// `actions/<name>.hxx` for the action at `position` in the task.
    pub fn action_unit(&self, position: usize) -> GenResult<Artifact> {
        let action = self.task.actions.get(position).ok_or_else(|| {
            GenError::InvalidTerm {
                context: "actions".to_string(),
                detail: format!("no action at position {position}"),
            }
        })?;
        let scope = Scope::action(action);

        let preconditions = self.render_preconditions(position, action)?;
        let effects = action
            .effects
            .iter()
            .map(|effect| self.render_effect(effect, scope))
            .collect::<GenResult<Vec<_>>>()?
            .join("\n");
        let params_doc = action
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_name))
            .collect::<Vec<_>>()
            .join(", ");

        let mut bindings = self.header();
        bindings.extend([
            ("action_name", action.name.clone()),
            ("params_doc", params_doc),
            ("class_name", class_name(&action.name)),
            ("arity", action.params.len().to_string()),
            ("preconditions", preconditions),
            ("effects", effects),
        ]);
        tracing::debug!("generated action unit {}", action.name);
        Ok(Artifact::new(
            format!("actions/{}.hxx", action.name),
            self.fill("action", &bindings)?,
        ))
    }

    /// `constraints/<id>_<name>.hxx` for a deferred instantiation.
    pub fn constraint_unit(&self, instance: &ConstraintInstance) -> GenResult<Artifact> {
        let descriptor = &instance.descriptor;
        let parameters = descriptor
            .parameters
            .iter()
            .map(|p| format!("{p:?}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut bindings = self.header();
        bindings.extend([
            ("origin", instance.origin.to_string()),
            ("name", descriptor.name.clone()),
            ("variables", descriptor.variables.join(", ")),
            ("id", instance.id.to_string()),
            ("arity", descriptor.variables.len().to_string()),
            ("runtime_class", descriptor.kind.runtime_class().to_string()),
            ("parameters", parameters),
        ]);
        Ok(Artifact::new(
            constraint_unit_name(instance),
            self.fill("constraint", &bindings)?,
        ))
    }

    /// `components.hxx`: includes every action and deferred constraint unit.
    pub fn components_unit(&self) -> GenResult<Artifact> {
        let includes = self
            .task
            .actions
            .iter()
            .map(|a| format!("actions/{}.hxx", a.name))
            .chain(self.plan.deferred().map(constraint_unit_name))
            .map(|path| format!("#include \"{path}\""))
            .collect::<Vec<_>>()
            .join("\n");
        let state_constraints = self
            .plan
            .deferred()
            .filter(|c| c.origin == ConstraintOrigin::State)
            .map(|c| c.id.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let mut bindings = self.header();
        bindings.extend([
            ("includes", includes),
            ("num_variables", self.model.index.len().to_string()),
            ("num_actions", self.task.actions.len().to_string()),
            ("num_constraints", self.plan.instances.len().to_string()),
            ("state_constraints", state_constraints),
        ]);
        Ok(Artifact::new("components.hxx", self.fill("components", &bindings)?))
    }
}

pub fn constraint_unit_name(instance: &ConstraintInstance) -> String {
    format!("constraints/{}_{}.hxx", instance.id, instance.descriptor.name)
}
