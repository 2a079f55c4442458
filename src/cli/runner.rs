use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use radval::core::pairing::{
    CROSS_SENSOR_DAY_DIFFERENCE, L8_DAY_DIFFERENCE, S2_DAY_DIFFERENCE, search_pairs_l8,
    search_pairs_l8_s2, search_pairs_s2,
};
use radval::{Sensor, load_scene_ids, run_validation_from_files};

use super::args::{CliArgs, Command};
use super::errors::AppError;

fn init_logging(debug: bool) {
    let default = if debug { "radval=debug" } else { "radval=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_pairs(
    sensor: Option<Sensor>,
    scenes: &Path,
    cross: Option<&Path>,
    day_difference: Option<i64>,
) -> Result<(), AppError> {
    let ids = load_scene_ids(scenes)?;
    let sensor = match sensor {
        Some(sensor) => sensor,
        None => ids
            .first()
            .and_then(|id| Sensor::detect(id))
            .ok_or_else(|| AppError::UnknownSensor {
                path: scenes.display().to_string(),
            })?,
    };
    let pairs = match (sensor, cross) {
        (Sensor::L8, Some(cross)) => {
            let s2_ids = load_scene_ids(cross)?;
            let days = day_difference.unwrap_or(CROSS_SENSOR_DAY_DIFFERENCE);
            check_days(days)?;
            search_pairs_l8_s2(&ids, &s2_ids, days)?
        }
        (Sensor::S2, Some(_)) => {
            return Err(AppError::CrossNeedsLandsat {
                sensor: sensor.to_string(),
            });
        }
        (Sensor::L8, None) => {
            let days = day_difference.unwrap_or(L8_DAY_DIFFERENCE);
            check_days(days)?;
            search_pairs_l8(&ids, days)?
        }
        (Sensor::S2, None) => {
            let days = day_difference.unwrap_or(S2_DAY_DIFFERENCE);
            check_days(days)?;
            search_pairs_s2(&ids, days)?
        }
    };

    info!("Found {} pairs", pairs.len());
    for pair in &pairs {
        println!("{}", pair.key());
    }
    Ok(())
}

fn check_days(days: i64) -> Result<(), AppError> {
    if days <= 0 {
        return Err(AppError::InvalidDayDifference { days });
    }
    Ok(())
}

fn validate(config: &Path, scenes: &Path, cross: Option<&Path>) -> Result<(), AppError> {
    info!("Loading configuration: {:?}", config);
    let report = run_validation_from_files(config, scenes, cross)?;

    for (pair, reason) in &report.failed {
        warn!("Pair {} skipped: {}", pair, reason);
    }
    info!("Validation {} complete!", report.routine);
    info!("Evaluated: {}", report.evaluated);
    info!("Failed: {}", report.failed.len());
    println!("{}", report.output_path.display());

    if report.evaluated == 0 && !report.failed.is_empty() {
        return Err(AppError::PairsFailed {
            failed: report.failed.len(),
            total: report.evaluated + report.failed.len(),
        });
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    match args.command {
        Command::Pairs {
            sensor,
            scenes,
            cross,
            day_difference,
        } => print_pairs(sensor, &scenes, cross.as_deref(), day_difference)?,
        Command::Validate {
            config,
            scenes,
            cross,
        } => validate(&config, &scenes, cross.as_deref())?,
    }
    Ok(())
}
