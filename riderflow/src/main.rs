use clap::{Parser, Subcommand};
use riderflow::{
    app::{Orchestrator, SimulationContext, SimulationError},
    config::SimulationConfig,
};
use riderflow_route::{
    algorithm::{RouteTopologyBuilder, TopologyStrategy, DEFAULT_SEAM_THRESHOLD_M},
    index::DistanceIndex,
    model::RouteGeometry,
};
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct RiderflowArguments {
    #[command(subcommand)]
    app: App,
}

#[derive(Subcommand)]
pub enum App {
    /// run a demand simulation until interrupted or for a fixed duration
    Run {
        #[arg(long, help = "path to .toml or .json simulation configuration")]
        config: String,
        #[arg(long, help = "stop after this many wall-clock seconds")]
        duration_seconds: Option<u64>,
    },
    /// reconstruct a route backbone and report geometry quality
    Route {
        #[arg(long, help = "path to GeoJSON file with the route geometry")]
        geometry: String,
        #[arg(long, help = "id of the route to build")]
        route_id: String,
        #[arg(long, help = "gap or length difference reported as a seam, in meters")]
        seam_threshold_m: Option<f64>,
    },
}

pub fn run(app: &App) -> Result<(), SimulationError> {
    env_logger::init();
    match app {
        App::Run {
            config,
            duration_seconds,
        } => {
            log::info!("reading simulation configuration from {config}");
            let conf = SimulationConfig::try_from(config)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| {
                    SimulationError::RuntimeError(format!(
                        "failure creating async rust tokio runtime: {e}"
                    ))
                })?;
            runtime.block_on(simulate(conf, *duration_seconds))
        }
        App::Route {
            geometry,
            route_id,
            seam_threshold_m,
        } => {
            let strategy = TopologyStrategy::CrossChecked {
                seam_threshold_m: seam_threshold_m.unwrap_or(DEFAULT_SEAM_THRESHOLD_M),
            };
            let route_geometry = RouteGeometry::from_geojson_file(route_id, geometry)?;
            let topology = RouteTopologyBuilder::new(strategy).build_geometry(&route_geometry)?;
            let warnings = topology
                .report
                .warnings
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>();
            let index = DistanceIndex::new(topology.route);
            let output = serde_json::json!({
                "route_id": route_id,
                "points": index.route().len(),
                "length_m": index.total_length_m(),
                "discarded_length_m": topology.report.discarded_length_m,
                "warnings": warnings,
            });
            let text = serde_json::to_string_pretty(&output)
                .map_err(|e| SimulationError::RuntimeError(e.to_string()))?;
            println!("{text}");
            Ok(())
        }
    }
}

async fn simulate(
    config: SimulationConfig,
    duration_seconds: Option<u64>,
) -> Result<(), SimulationError> {
    let context = SimulationContext::from_config(config)?;
    let mut orchestrator = Orchestrator::new(context)?;
    orchestrator.start()?;
    match duration_seconds {
        Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("failure waiting for interrupt: {e}");
            }
        }
    }
    orchestrator.stop().await;
    for (id, stats) in orchestrator.statistics()?.iter() {
        let line = serde_json::to_string(stats)
            .map_err(|e| SimulationError::RuntimeError(e.to_string()))?;
        println!("{id} {line}");
    }
    Ok(())
}

fn main() {
    let args = RiderflowArguments::parse();
    if let Err(e) = run(&args.app) {
        log::error!("riderflow failed: {e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}
