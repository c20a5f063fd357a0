use gearsim::{ScenarioConfig, Scenario};
use gearsim::write_csv;
use gearsim::{bench_integrators, bench_tolerance_curve};

use clap::Parser;
use anyhow::{Context, Result};
use log::info;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(about = "Planetary gear / crank dynamics: trajectory, engagement kinematics and joint reactions")]
struct Args {
    /// Scenario YAML; the reference run is used when omitted
    #[arg(short, long)]
    file_name: Option<PathBuf>,

    /// CSV output path, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the integrator benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(path: &Path) -> Result<ScenarioConfig> {
    let file = File::open(path).with_context(|| format!("failed to open scenario {}", path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.bench {
        bench_integrators()?;
        bench_tolerance_curve()?;
        return Ok(());
    }

    let scenario_cfg = match &args.file_name {
        Some(path) => load_scenario_from_yaml(path)?,
        None => ScenarioConfig::reference(),
    };

    let scenario = Scenario::build_scenario(&scenario_cfg).context("invalid scenario")?;
    let trajectory = scenario.run().context("simulation failed")?;
    let reports = scenario.report(&trajectory);

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            write_csv(&reports, BufWriter::new(file))?;
            info!("wrote {} samples to {}", reports.len(), path.display());
        }
        None => write_csv(&reports, io::stdout().lock())?,
    }

    Ok(())
}
