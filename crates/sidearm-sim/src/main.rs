use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use sidearm_arena::config::ArenaConfig;
use sidearm_sim::SimSettings;
use sidearm_weapons::WeaponLoadout;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = SimSettings::from_env();
    tracing::info!(
        seconds = settings.seconds,
        seed = ?settings.seed,
        "Sidearm arena simulation starting"
    );

    match sidearm_sim::run(&settings, ArenaConfig::load(), WeaponLoadout::load()) {
        Ok(summary) => {
            tracing::info!(
                ticks = summary.ticks,
                shots = summary.shots,
                spawns = summary.spawns,
                kills = summary.kills,
                deaths = summary.deaths,
                score = summary.score,
                "Simulation finished"
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!("Simulation could not start: {e}");
            ExitCode::FAILURE
        },
    }
}
