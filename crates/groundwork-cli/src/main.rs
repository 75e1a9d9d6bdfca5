//! CLI binary for groundwork: ground lifted planning tasks and generate code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use groundwork_core::GroundModel;
use groundwork_core::config::GroundworkConfig;
use groundwork_core::index::SymbolOrder;
use groundwork_core::task;
use groundwork_gen::TemplateCache;
use groundwork_gen::codegen::plan_constraints;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "groundwork", about = "Grounding and code generation for planning tasks")]
struct Cli {
    /// Project root directory holding .groundwork/config.toml (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ground a task and write the generated artifacts
    Compile {
        /// Task file produced by the parser (JSON)
        task: PathBuf,

        /// Output directory (defaults to output.dir from config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Symbol order for handle assignment: declaration, arity
        #[arg(long)]
        symbol_order: Option<String>,

        /// Directory with <name>.tpl files overriding built-in templates
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Resolve external constraints over static symbols at compile time
        #[arg(long)]
        resolve_static_externals: bool,

        /// Generate units on the calling thread only
        #[arg(long)]
        sequential: bool,
    },

    /// Run grounding only and report the classification and counts
    Check {
        /// Task file produced by the parser (JSON)
        task: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the state-variable index, one `handle variable` per line
    Variables {
        /// Task file produced by the parser (JSON)
        task: PathBuf,

        /// Symbol order for handle assignment: declaration, arity
        #[arg(long)]
        symbol_order: Option<String>,
    },

    /// List built-in templates and their slots
    Templates {
        /// Print the source of one template instead
        #[arg(long)]
        show: Option<String>,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn load_config(project_root: &Path, symbol_order: Option<&str>) -> Result<GroundworkConfig> {
    let mut config = GroundworkConfig::load(project_root).with_context(|| {
        format!(
            "failed to load config from {}",
            project_root.join(".groundwork").display()
        )
    })?;
    if let Some(order) = symbol_order {
        config.grounding.symbol_order = order
            .parse::<SymbolOrder>()
            .map_err(|e| anyhow::anyhow!("--symbol-order: {}", e))?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    tracing::debug!("project root: {}", project_root.display());

    match cli.command {
        Commands::Compile {
            task,
            out,
            symbol_order,
            templates,
            resolve_static_externals,
            sequential,
        } => {
            let mut config = load_config(&project_root, symbol_order.as_deref())?;
            if let Some(dir) = templates {
                config.generation.template_dir = Some(dir);
            }
            if resolve_static_externals {
                config.grounding.resolve_static_externals = true;
            }
            if sequential {
                config.generation.parallel = false;
            }
            cmd_compile(&task, out, &config)
        }
        Commands::Check { task, json } => cmd_check(&project_root, &task, json),
        Commands::Variables { task, symbol_order } => {
            cmd_variables(&project_root, &task, symbol_order.as_deref())
        }
        Commands::Templates { show } => cmd_templates(show.as_deref()),
    }
}

fn cmd_compile(task_path: &Path, out: Option<PathBuf>, config: &GroundworkConfig) -> Result<()> {
    let task = task::load(task_path)?;
    let cache = TemplateCache::new(config.generation.template_dir.clone());

    let output = groundwork_gen::compile(&task, config, &cache)
        .with_context(|| format!("failed to compile {}", task_path.display()))?;
    let out_dir = out.unwrap_or_else(|| config.output.dir.clone());
    output.artifacts.write_to(&out_dir)?;

    let summary = output.summary();
    eprintln!("Compiled {}/{}", summary.domain, summary.instance);
    eprintln!(
        "  symbols: {} ({} fluent, {} static)",
        summary.symbols, summary.fluents, summary.statics
    );
    eprintln!("  objects: {}", summary.objects);
    eprintln!("  state variables: {}", summary.variables);
    eprintln!("  initial atoms: {}", summary.initial_atoms);
    eprintln!(
        "  constraints: {} ({} resolved statically)",
        summary.constraints, summary.static_constraints
    );
    eprintln!("  wrote {} artifacts to {}", summary.artifacts, out_dir.display());
    Ok(())
}

fn cmd_check(project_root: &Path, task_path: &Path, json: bool) -> Result<()> {
    let config = load_config(project_root, None)?;
    let task = task::load(task_path)?;
    let model = GroundModel::build(&task, &config.grounding)
        .with_context(|| format!("failed to ground {}", task_path.display()))?;
    let plan = plan_constraints(&task, &model, config.grounding.resolve_static_externals)
        .with_context(|| format!("invalid constraints in {}", task_path.display()))?;

    if json {
        let report = serde_json::json!({
            "domain": model.domain,
            "instance": model.instance,
            "fluent": model.classification.fluents(),
            "static": model.classification.statics(),
            "objects": model.objects.len(),
            "variables": model.index.len(),
            "initial_atoms": model.init.atom_count(),
            "constraints": plan.instances.len(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Task: {}/{}", model.domain, model.instance);
    println!();
    println!("Fluent symbols:");
    for name in model.classification.fluents() {
        let size = model.index.layout(name).map_or(0, |l| l.size);
        println!("  {} ({} variables)", name, size);
    }
    println!("Static symbols:");
    for name in model.classification.statics() {
        println!("  {}", name);
    }
    println!();
    println!("Objects: {}", model.objects.len());
    println!("State variables: {}", model.index.len());
    println!("Initial atoms: {}", model.init.atom_count());
    println!(
        "Constraints: {} ({} static)",
        plan.instances.len(),
        plan.statics().count()
    );
    Ok(())
}

fn cmd_variables(project_root: &Path, task_path: &Path, symbol_order: Option<&str>) -> Result<()> {
    let config = load_config(project_root, symbol_order)?;
    let task = task::load(task_path)?;
    let model = GroundModel::build(&task, &config.grounding)
        .with_context(|| format!("failed to ground {}", task_path.display()))?;

    for (handle, variable) in model.index.iter() {
        println!("{} {}", handle.0, variable);
    }
    Ok(())
}

fn cmd_templates(show: Option<&str>) -> Result<()> {
    let cache = TemplateCache::builtin();
    if let Some(name) = show {
        let source = groundwork_gen::cache::builtin_source(name)
            .ok_or_else(|| anyhow::anyhow!("no built-in template named '{}'", name))?;
        print!("{}", source);
        return Ok(());
    }

    for name in groundwork_gen::cache::builtin_names() {
        let template = cache.get(name)?;
        println!("{:<24} {}", name, template.slots().join(", "));
    }
    Ok(())
}
