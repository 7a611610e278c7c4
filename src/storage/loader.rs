use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{error, info};

use crate::error::{ModelError, Result};
use crate::models::*;
use crate::storage::ObservationLog;
use crate::utils::validation::validate_observation;

/// Reads `user,item,rating` triples, one per line.
///
/// Fields may be separated by commas, tabs or spaces. Blank lines and lines
/// starting with `#` are skipped.
pub fn load_observations(
    path: impl AsRef<Path>,
    universe: &Universe,
    scale: &RatingScale,
) -> Result<ObservationLog> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        error!("Failed to open ratings file {}: {}", path.display(), e);
        ModelError::io(path, e)
    })?;

    let log = read_observations(BufReader::new(file), universe, scale)?;
    info!("Loaded {} observations from {}", log.len(), path.display());
    Ok(log)
}

pub fn read_observations<R: BufRead>(
    reader: R,
    universe: &Universe,
    scale: &RatingScale,
) -> Result<ObservationLog> {
    let mut log = ObservationLog::default();

    for (number, line) in reader.lines().enumerate() {
        let line_number = number + 1;
        let line = line.map_err(|e| ModelError::Parse {
            line: line_number,
            message: e.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let observation = parse_line(trimmed).map_err(|message| ModelError::Parse {
            line: line_number,
            message,
        })?;
        validate_observation(&observation, universe, scale).map_err(|e| ModelError::Parse {
            line: line_number,
            message: e.to_string(),
        })?;
        log.push(observation);
    }

    Ok(log)
}

fn parse_line(line: &str) -> std::result::Result<Observation, String> {
    let fields: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
        .collect();

    let [user, item, rating] = fields.as_slice() else {
        return Err(format!("expected 3 fields, found {}", fields.len()));
    };

    let user = user
        .parse::<UserId>()
        .map_err(|e| format!("bad user id {:?}: {}", user, e))?;
    let item = item
        .parse::<ItemId>()
        .map_err(|e| format!("bad item id {:?}: {}", item, e))?;
    let rating = rating
        .parse::<Rating>()
        .map_err(|e| format!("bad rating {:?}: {}", rating, e))?;

    Ok(Observation::new(user, item, rating))
}
