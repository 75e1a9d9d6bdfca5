use groundwork_core::classify::SymbolClass;
use groundwork_core::config::GroundingConfig;
use groundwork_core::constraints;
use groundwork_core::index::{GroundVariable, Handle, SymbolOrder, VariableIndex};
use groundwork_core::init::Value;
use groundwork_core::task::{self, InitElement, Task};
use groundwork_core::{GroundError, GroundModel};
use std::path::Path;

const BLOCKS: &str = include_str!("fixtures/blocks.json");

fn blocks() -> Task {
    task::from_json(BLOCKS).unwrap()
}

fn var(symbol: &str, args: &[&str]) -> GroundVariable {
    GroundVariable::new(symbol, args.iter().map(|a| a.to_string()).collect())
}

#[test]
fn test_precondition_only_symbols_are_static() {
    let model = GroundModel::build(&blocks(), &GroundingConfig::default()).unwrap();
    assert_eq!(model.classification.tag("clear"), Some(SymbolClass::Static));
    assert_eq!(model.classification.tag("ontable"), Some(SymbolClass::Static));
    assert_eq!(model.classification.tag("on"), Some(SymbolClass::Fluent));
    assert_eq!(model.classification.tag("="), Some(SymbolClass::Static));
    assert_eq!(
        model.classification.fluents(),
        vec!["on", "handempty", "holding"]
    );
}

#[test]
fn test_on_variables_take_first_nine_handles() {
    let model = GroundModel::build(&blocks(), &GroundingConfig::default()).unwrap();
    let blocks = ["a", "b", "c"];
    let mut expected = Vec::new();
    for x in blocks {
        for y in blocks {
            expected.push(var("on", &[x, y]));
        }
    }
    for (i, v) in expected.iter().enumerate() {
        assert_eq!(model.index.handle_of(&v), Some(Handle(i)), "{v}");
    }
    assert_eq!(model.index.len(), 9 + 1 + 3);
}

#[test]
fn test_explicit_initial_values_in_handle_order() {
    let model = GroundModel::build(&blocks(), &GroundingConfig::default()).unwrap();
    let values = model.init.explicit_values(&model.index);
    assert_eq!(
        values,
        vec![(Handle(5), Value::Bool(true)), (Handle(9), Value::Bool(true))]
    );
    // Static facts are kept even though they have no handle.
    assert_eq!(model.init.get("clear").unwrap().len(), 2);
}

#[test]
fn test_duplicate_initial_fact_aborts() {
    let mut task = blocks();
    task.init.push(InitElement::Predicate {
        symbol: "on".to_string(),
        args: vec!["b".to_string(), "c".to_string()],
        negated: false,
    });
    let err = GroundModel::build(&task, &GroundingConfig::default()).unwrap_err();
    match err {
        GroundError::DuplicateInitialization { variable, element } => {
            assert_eq!(variable, var("on", &["b", "c"]));
            assert_eq!(element, "on(b,c)");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_effect_symbol_aborts() {
    let mut task = blocks();
    task.actions[0].effects[0].symbol = "lifted".to_string();
    let err = GroundModel::build(&task, &GroundingConfig::default()).unwrap_err();
    assert!(err.to_string().contains("lifted"));
}

#[test]
fn test_arity_order_changes_handles_only() {
    let config = GroundingConfig {
        symbol_order: SymbolOrder::Arity,
        ..GroundingConfig::default()
    };
    let by_arity = GroundModel::build(&blocks(), &config).unwrap();
    let by_decl = GroundModel::build(&blocks(), &GroundingConfig::default()).unwrap();
    assert_eq!(by_arity.index.variable(Handle(0)), Some(&var("handempty", &[])));
    assert_eq!(by_arity.index.len(), by_decl.index.len());
    assert_eq!(
        by_arity.classification.fluents(),
        by_decl.classification.fluents()
    );
}

#[test]
fn test_listing_reload_matches_handles() {
    let model = GroundModel::build(&blocks(), &GroundingConfig::default()).unwrap();
    let reloaded = VariableIndex::from_listing(&model.index.to_listing()).unwrap();
    for (handle, variable) in model.index.iter() {
        assert_eq!(reloaded.handle_of(variable), Some(handle));
    }
}

#[test]
fn test_catalog_scenario() {
    let xyz: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
    let d = constraints::instantiate("alldiff", vec![], xyz.clone()).unwrap();
    assert_eq!(d.name, "alldiff");
    assert_eq!(d.variables, xyz);
    let err = constraints::instantiate("unknown_rel", vec![], vec!["x".to_string()]).unwrap_err();
    assert!(matches!(err, GroundError::UnsupportedConstraint(_)));
}

#[test]
fn test_load_task_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("task.json");
    std::fs::write(&path, BLOCKS).unwrap();
    let task = task::load(&path).unwrap();
    assert_eq!(task.domain, "blocksworld");
    assert_eq!(task.actions.len(), 3);

    std::fs::write(&path, "{ not json").unwrap();
    let err = task::load(Path::new(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("invalid task file"));
}

#[test]
fn test_type_domain_object_missing_from_object_list() {
    let task = task::from_json(
        r#"{
            "domain": "grid",
            "instance": "unlisted",
            "type_domains": [
                { "name": "cell", "objects": ["c1", "c2"] },
                { "name": "robot", "objects": ["r"] }
            ],
            "objects": [],
            "functions": [{ "name": "pos", "params": ["robot"], "codomain": "cell" }],
            "actions": [{
                "name": "move",
                "params": [{ "name": "?to", "type": "cell" }],
                "effects": [{ "symbol": "pos", "args": ["r"], "value": "?to" }]
            }],
            "init": [{ "kind": "assign", "symbol": "pos", "args": ["r"], "value": "c1" }]
        }"#,
    )
    .unwrap();

    let err = GroundModel::build(&task, &GroundingConfig::default()).unwrap_err();
    match err {
        GroundError::UndeclaredObject { object, type_name } => {
            assert_eq!(object, "c1");
            assert_eq!(type_name, "cell");
        }
        other => panic!("unexpected error: {other}"),
    }
}
