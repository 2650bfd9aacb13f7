//! Run the terrain pipeline off-screen and print heightfield stats as JSON.
//!
//! Usage: erosion-headless [config.json] [frames]

use std::path::Path;
use std::process::ExitCode;

use erosion::{GpuContext, TerrainSim};
use serde::Serialize;
use terrain::{GridParams, HeightStats};

const DEFAULT_FRAMES: u32 = 120;

#[derive(Serialize)]
struct Report {
    params: GridParams,
    frames: u32,
    generation: u64,
    initial: HeightStats,
    final_stats: HeightStats,
}

fn run() -> Result<Report, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let params = match args.first() {
        Some(path) => GridParams::load_json(Path::new(path))?,
        None => GridParams::default(),
    };
    let frames = match args.get(1) {
        Some(n) => n.parse::<u32>()?,
        None => DEFAULT_FRAMES,
    };

    let ctx = GpuContext::headless_blocking(params.tile_size)?;
    let mut sim = TerrainSim::initialize(&ctx, params.clone(), None)?;
    let initial = sim.stats()?;

    let dt = 1.0 / 60.0;
    for _ in 0..frames {
        sim.tick(dt);
    }
    let final_stats = sim.stats()?;
    let generation = sim.generation();
    sim.shutdown();

    Ok(Report {
        params,
        frames,
        generation,
        initial,
        final_stats,
    })
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Failed to serialize report: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
