//! Plain-text data listings read by the generated code at load time.

use crate::artifact::Artifact;
use crate::codegen::ConstraintPlan;
use crate::error::{GenError, GenResult};
use groundwork_core::GroundModel;
use groundwork_core::init::{Assignment, Value};
use groundwork_core::objects::ObjectIndex;

/// `symbols.data`: `id name kind class signature base strides`, one symbol
/// per line. Static symbols have no handles and print `-` for both.
pub fn symbols_unit(model: &GroundModel) -> Artifact {
    let mut out = String::new();
    for symbol in model.symbols.iter() {
        let class = model
            .classification
            .tag(&symbol.name)
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        let (base, strides) = match model.index.layout(&symbol.name) {
            Some(layout) if !layout.strides.is_empty() => (
                layout.base.to_string(),
                layout
                    .strides
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Some(layout) => (layout.base.to_string(), "-".to_string()),
            None => ("-".to_string(), "-".to_string()),
        };
        out.push_str(&format!(
            "{} {} {} {} {} {} {}\n",
            symbol.id,
            symbol.name,
            symbol.kind,
            class,
            symbol.signature(),
            base,
            strides
        ));
    }
    Artifact::new("symbols.data", out)
}

pub fn variables_unit(model: &GroundModel) -> Artifact {
    Artifact::new("variables.data", model.index.to_listing())
}

pub fn objects_unit(model: &GroundModel) -> Artifact {
    Artifact::new("objects.data", model.objects.to_listing())
}

/// `init.data`: `handle value` for every explicitly initialized state variable.
pub fn init_unit(model: &GroundModel) -> GenResult<Artifact> {
    let mut out = String::new();
    for (handle, value) in model.init.explicit_values(&model.index) {
        out.push_str(&format!(
            "{} {}\n",
            handle.0,
            value_code(&value, &model.objects, "init.data")?
        ));
    }
    Ok(Artifact::new("init.data", out))
}

/// `static/<symbol>.data` for every static symbol: one `(ids)` tuple per line,
/// followed by the value for functions.
pub fn static_units(model: &GroundModel) -> GenResult<Vec<Artifact>> {
    model
        .classification
        .statics()
        .into_iter()
        .filter_map(|symbol| model.init.get(symbol).map(|a| (symbol, a)))
        .map(|(symbol, assignment)| {
            let name = format!("static/{symbol}.data");
            let mut out = String::new();
            for (tuple, value) in assignment.entries() {
                let ids = tuple
                    .iter()
                    .map(|arg| object_code(arg, &model.objects, &name))
                    .collect::<GenResult<Vec<_>>>()?
                    .join(" ");
                match assignment {
                    Assignment::Relation(_) => out.push_str(&format!("({ids})\n")),
                    Assignment::Function(_) => out.push_str(&format!(
                        "({ids}) {}\n",
                        value_code(&value, &model.objects, &name)?
                    )),
                }
            }
            Ok(Artifact::new(name, out))
        })
        .collect()
}

/// `static_constraints.data`: `id name parameters variables` for each
/// instantiation resolved against static data.
pub fn static_constraints_unit(plan: &ConstraintPlan) -> Artifact {
    let mut out = String::new();
    for instance in plan.statics() {
        let d = &instance.descriptor;
        let parameters = if d.parameters.is_empty() {
            "-".to_string()
        } else {
            d.parameters.join(",")
        };
        out.push_str(&format!(
            "{} {} {} {}\n",
            instance.id,
            d.name,
            parameters,
            d.variables.join(" ")
        ));
    }
    Artifact::new("static_constraints.data", out)
}

/// Object id of `name`; integer arguments of numeric types pass through.
fn object_code(name: &str, objects: &ObjectIndex, unit: &str) -> GenResult<String> {
    if let Some(id) = objects.id(name) {
        return Ok(id.to_string());
    }
    if name.parse::<i64>().is_ok() {
        return Ok(name.to_string());
    }
    Err(GenError::InvalidTerm {
        context: unit.to_string(),
        detail: format!("object '{name}' has no object id"),
    })
}

fn value_code(value: &Value, objects: &ObjectIndex, unit: &str) -> GenResult<String> {
    match value {
        Value::Object(name) => object_code(name, objects, unit),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::plan_constraints;
    use groundwork_core::config::GroundingConfig;
    use groundwork_core::task::{self, Task};

    const TASK: &str = r#"{
        "domain": "grid",
        "instance": "small",
        "type_domains": [
            { "name": "cell", "objects": ["c1", "c2"] },
            { "name": "robot", "objects": ["r"] }
        ],
        "objects": ["c1", "c2", "r"],
        "predicates": [
            { "name": "adjacent", "params": ["cell", "cell"] },
            { "name": "visited", "params": ["cell"] }
        ],
        "functions": [
            { "name": "pos", "params": ["robot"], "codomain": "cell" },
            { "name": "cost", "params": ["cell"], "codomain": "int" }
        ],
        "actions": [
            {
                "name": "move",
                "params": [{ "name": "?to", "type": "cell" }],
                "precondition": { "kind": "and", "conjuncts": [
                    { "kind": "atom", "symbol": "adjacent", "args": [{ "symbol": "pos", "args": ["r"] }, "?to"] },
                    { "kind": "constraint", "name": "external", "parameters": ["passable"], "args": ["?to"] }
                ]},
                "effects": [
                    { "symbol": "pos", "args": ["r"], "value": "?to" },
                    { "symbol": "visited", "args": ["?to"] }
                ]
            }
        ],
        "init": [
            { "kind": "atom", "symbol": "adjacent", "args": ["c1", "c2"] },
            { "kind": "atom", "symbol": "adjacent", "args": ["c2", "c1"] },
            { "kind": "assign", "symbol": "pos", "args": ["r"], "value": "c1" },
            { "kind": "assign", "symbol": "cost", "args": ["c2"], "value": 4 },
            { "kind": "atom", "symbol": "visited", "args": ["c1"] }
        ]
    }"#;

    fn model() -> (Task, GroundModel) {
        let task = task::from_json(TASK).unwrap();
        let model = GroundModel::build(&task, &GroundingConfig::default()).unwrap();
        (task, model)
    }

    #[test]
    fn test_symbols_listing() {
        let (_, model) = model();
        let listing = symbols_unit(&model).content;
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "0 adjacent predicate static adjacent(cell,cell) - -");
        assert_eq!(lines[1], "1 visited predicate fluent visited(cell) 0 1");
        assert_eq!(lines[2], "2 pos function fluent pos(robot):cell 2 1");
        assert_eq!(lines.len(), model.symbols.len());
    }

    #[test]
    fn test_init_listing_uses_object_ids() {
        let (_, model) = model();
        // visited(c1) is handle 0; pos(r) is handle 2 and holds c1 (object id 2).
        assert_eq!(init_unit(&model).unwrap().content, "0 _true_\n2 2\n");
    }

    #[test]
    fn test_static_extensions() {
        let (_, model) = model();
        let units = static_units(&model).unwrap();
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["static/adjacent.data", "static/cost.data"]);
        assert_eq!(units[0].content, "(2 3)\n(3 2)\n");
        assert_eq!(units[1].content, "(3) 4\n");
    }

    #[test]
    fn test_object_without_id_is_rejected() {
        let (_, mut model) = model();
        // Rebuild the object index without c1, which pos(r) and adjacent refer to.
        let remaining = vec!["c2".to_string(), "r".to_string()];
        model.objects = ObjectIndex::new(&remaining);

        let err = init_unit(&model).unwrap_err();
        assert!(matches!(
            err,
            GenError::InvalidTerm { ref context, ref detail }
                if context == "init.data" && detail.contains("'c1'")
        ));
        assert!(matches!(
            static_units(&model).unwrap_err(),
            GenError::InvalidTerm { ref context, .. } if context == "static/adjacent.data"
        ));
    }

    #[test]
    fn test_static_constraints_listing() {
        let (task, model) = model();
        let plan = plan_constraints(&task, &model, true).unwrap();
        assert_eq!(
            static_constraints_unit(&plan).content,
            "0 external passable ?to\n"
        );
        let plan = plan_constraints(&task, &model, false).unwrap();
        assert!(static_constraints_unit(&plan).content.is_empty());
    }
}
