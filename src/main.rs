use nbody_registry::{Scenario, ScenarioConfig};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short, default_value = "two_ranks.yaml")]
    file_name: String,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nbody_registry=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let processes = scenario_cfg.domain.processes;

    let scenario = Scenario::build_scenario(scenario_cfg).context("failed to build scenario")?;
    let registry = &scenario.registry;

    tracing::info!(
        count = registry.len(),
        capacity = registry.capacity(),
        indexed = registry.index().len(),
        max_r = registry.max_r(),
        second_max_r = registry.second_max_r(),
        minimum_mass = ?registry.minimum_mass(),
        "registry state"
    );
    for rank in 0..processes {
        let queued = registry.transport().outbound(rank).len();
        if queued > 0 {
            tracing::info!(rank, queued, "outbound queue");
        }
    }

    Ok(())
}
