use anyhow::{Context, bail};
use argus::analysis::cpa::precision::PrecisionScope;
use argus::analysis::cpa::reachability::TargetLocations;
use argus::analysis::cpa::reached::WaitlistOrder;
use argus::analysis::interval::IntervalCpa;
use argus::analysis::interval::refinement::{ValueInterpolantManager, ValuePost};
use argus::analysis::location::LocationAnalysis;
use argus::cfa::CfaDescription;
use argus::refinement::cegar::{CegarAlgorithm, RestartStrategy};
use argus::refinement::prefix::PrefixPreference;
use argus::refinement::refiner::InterpolationRefiner;
use argus::refinement::tree::InterpolationStrategy;
use argus::{AnalysisContext, EngineConfig, Verdict};
use clap::{Parser, Subcommand};
use petgraph::dot::Dot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "argus";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ArgusConfig {
    #[serde(default)]
    engine: EngineConfig,
}

impl ArgusConfig {
    /// The stored configuration with every flag given on the command line
    /// applied on top.
    fn updated(mut self, params: &ArgusParams) -> Self {
        let engine = &mut self.engine;
        if let Some(waitlist) = params.waitlist {
            engine.waitlist = waitlist;
        }
        if let Some(interpolation) = params.interpolation {
            engine.interpolation = interpolation;
        }
        if let Some(prefix) = params.prefix {
            engine.prefix_preference = prefix;
        }
        if let Some(restart) = params.restart {
            engine.restart = restart;
        }
        if let Some(scope) = params.scope {
            engine.precision_scope = scope;
        }
        if let Some(max) = params.max_refinements {
            engine.max_refinements = max;
        }
        if let Some(all) = params.all_targets {
            engine.stop_on_first_target = !all;
        }
        self
    }
}

/// A verification task: a CFA and the labels of its error locations.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskDescription {
    cfa: CfaDescription,
    targets: Vec<String>,
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct ArgusParams {
    #[command(subcommand)]
    pub command: Commands,
    #[arg(long, global = true)]
    pub waitlist: Option<WaitlistOrder>,
    #[arg(long, global = true)]
    pub interpolation: Option<InterpolationStrategy>,
    #[arg(long, global = true)]
    pub prefix: Option<PrefixPreference>,
    #[arg(long, global = true)]
    pub restart: Option<RestartStrategy>,
    #[arg(long, global = true)]
    pub scope: Option<PrecisionScope>,
    #[arg(long, global = true)]
    pub max_refinements: Option<usize>,
    /// Collect every reachable target before refining.
    #[arg(long, global = true)]
    pub all_targets: Option<bool>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Checks whether a target location of the task is reachable
    Check {
        task: PathBuf,
        /// Print the final abstract reachability graph in DOT format
        #[arg(long)]
        dot: bool,
    },
    /// Prints the task's CFA in DOT format
    Show { task: PathBuf },
    /// Prints the stored configuration
    Config,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let params = ArgusParams::parse();
    let config = update_config(&params)?;
    match params.command {
        Commands::Check { task, dot } => check(&config, &task, dot),
        Commands::Show { task } => show(&task),
        Commands::Config => {
            let path = confy::get_configuration_file_path(APP_NAME, None)?;
            println!("# {}", path.display());
            println!("{:#?}", config.engine);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn update_config(params: &ArgusParams) -> anyhow::Result<ArgusConfig> {
    let stored: ArgusConfig = confy::load(APP_NAME, None).context("loading configuration")?;
    let new_config = stored.clone().updated(params);
    if stored != new_config {
        confy::store(APP_NAME, None, &new_config).context("storing configuration")?;
    }
    Ok(new_config)
}

fn load_task(path: &Path) -> anyhow::Result<TaskDescription> {
    // `load_path` would create a missing file with default contents
    if !path.is_file() {
        bail!("task file {} does not exist", path.display());
    }
    confy::load_path(path).with_context(|| format!("reading task {}", path.display()))
}

fn check(config: &ArgusConfig, task: &Path, dot: bool) -> anyhow::Result<ExitCode> {
    let task = load_task(task)?;
    let cfa = task.cfa.build()?;
    let targets = task
        .targets
        .iter()
        .map(|label| cfa.node_by_label(label))
        .collect::<Result<Vec<_>, _>>()?;
    if targets.is_empty() {
        bail!("the task names no target locations");
    }

    let ctx = AnalysisContext::new(&cfa, config.engine.clone());
    let cpa = (
        LocationAnalysis,
        IntervalCpa::new(&cfa, config.engine.precision_scope),
    );
    let target = TargetLocations::new(targets);
    let refiner = InterpolationRefiner::new(&ValuePost, &ValueInterpolantManager);
    let mut cegar = CegarAlgorithm::new(&cpa, &ctx, &target, refiner);
    let verdict = cegar.run()?;
    info!("{:?}", cegar.statistics());

    println!("{verdict}");
    if let Verdict::Unsafe(path) = &verdict {
        for edge in path.edges() {
            println!("  {}", cfa.edge(*edge)?);
        }
    }
    if dot {
        if let Some(reached) = cegar.reached() {
            println!("{}", Dot::new(&reached.arg().to_graph()));
        }
    }
    Ok(match verdict {
        Verdict::Safe => ExitCode::SUCCESS,
        Verdict::Unsafe(_) => ExitCode::from(1),
        Verdict::Unknown(_) => ExitCode::from(2),
    })
}

fn show(task: &Path) -> anyhow::Result<ExitCode> {
    let cfa = load_task(task)?.cfa.build()?;
    println!("{}", Dot::new(cfa.graph()));
    Ok(ExitCode::SUCCESS)
}
