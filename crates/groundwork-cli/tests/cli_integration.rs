//! Integration tests for groundwork-cli functionality.
//! Tests the underlying library functions that the CLI commands invoke.

use groundwork_core::GroundModel;
use groundwork_core::config::GroundworkConfig;
use groundwork_core::index::{Handle, SymbolOrder};
use groundwork_core::task;
use groundwork_gen::{MANIFEST_FILE, TemplateCache, compile};
use std::path::Path;

const BLOCKS: &str = include_str!("../../groundwork-core/tests/fixtures/blocks.json");

fn write_task(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("blocks.json");
    std::fs::write(&path, BLOCKS).unwrap();
    path
}

#[test]
fn test_config_missing_uses_defaults() {
    let tmpdir = tempfile::tempdir().unwrap();
    let config = GroundworkConfig::load(tmpdir.path()).unwrap();
    assert_eq!(config.grounding.symbol_order, SymbolOrder::Declaration);
    assert_eq!(config.output.dir, tmpdir.path().join("generated"));
}

#[test]
fn test_compile_writes_into_configured_output_dir() {
    let tmpdir = tempfile::tempdir().unwrap();
    let config_dir = tmpdir.path().join(".groundwork");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[output]\ndir = \"build/gen\"\n\n[generation]\nparallel = false\n",
    )
    .unwrap();

    let config = GroundworkConfig::load(tmpdir.path()).unwrap();
    let task = task::load(&write_task(tmpdir.path())).unwrap();
    let output = compile(&task, &config, &TemplateCache::builtin()).unwrap();
    output.artifacts.write_to(&config.output.dir).unwrap();

    let out = tmpdir.path().join("build/gen");
    assert!(out.join(MANIFEST_FILE).is_file());
    assert!(out.join("components.hxx").is_file());
    assert!(out.join("actions/pick-up.hxx").is_file());
}

#[test]
fn test_failed_compile_writes_nothing() {
    let tmpdir = tempfile::tempdir().unwrap();
    let mut task = task::load(&write_task(tmpdir.path())).unwrap();
    task.actions[0].effects[0].symbol = "undeclared".to_string();

    let result = compile(&task, &GroundworkConfig::default(), &TemplateCache::builtin());
    assert!(result.is_err());
    assert!(!tmpdir.path().join("generated").exists());
}

#[test]
fn test_variables_listing_by_arity() {
    let tmpdir = tempfile::tempdir().unwrap();
    let mut config = GroundworkConfig::load(tmpdir.path()).unwrap();
    config.grounding.symbol_order = "arity".parse().unwrap();

    let task = task::load(&write_task(tmpdir.path())).unwrap();
    let model = GroundModel::build(&task, &config.grounding).unwrap();
    let first = model.index.iter().next().unwrap();
    assert_eq!(first.0, Handle(0));
    assert_eq!(first.1.to_string(), "handempty()");
}

#[test]
fn test_every_builtin_template_listed() {
    let cache = TemplateCache::builtin();
    let names: Vec<&str> = groundwork_gen::cache::builtin_names().collect();
    assert!(names.contains(&"action"));
    assert!(names.contains(&"components"));
    for name in names {
        assert!(cache.get(name).is_ok(), "{name}");
        assert!(groundwork_gen::cache::builtin_source(name).is_some());
    }
}

#[test]
fn test_task_load_error_names_file() {
    let tmpdir = tempfile::tempdir().unwrap();
    let err = task::load(&tmpdir.path().join("missing.json")).unwrap_err();
    assert!(format!("{err:#}").contains("missing.json"));
}
