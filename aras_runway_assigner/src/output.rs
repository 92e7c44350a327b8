use std::{
    io::{BufWriter, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::{assign::AssignmentResult, error::ApplicationResult};

/// Pulse that marks `icao` as an active airport.
pub fn format_active_airport(icao: &str) -> Vec<String> {
    [1, 0]
        .iter()
        .map(|flag| format!("ACTIVE_AIRPORT:{icao}:{flag}"))
        .collect()
}

/// Departure then arrival, primary pair first.
pub fn format_runway_output(result: &AssignmentResult<'_>) -> Vec<String> {
    let configuration = result.configuration;
    let mut runways = vec![configuration.departure.as_str(), configuration.arrival.as_str()];
    if let Some(secondary) = &configuration.secondary {
        runways.extend([secondary.departure.as_str(), secondary.arrival.as_str()]);
    }

    runways
        .iter()
        .zip([1, 0].iter().cycle())
        .map(|(runway, flag)| format!("ACTIVE_RUNWAY:{}:{}:{}", result.airport, runway, flag))
        .collect()
}

/// Replaces the rwy file with `lines`. The file is written next to its target
/// and renamed into place, so readers never see a partial file.
pub fn write_rwy_file(path: &Path, lines: &[String]) -> ApplicationResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;

    let mut writer = BufWriter::new(file.as_file_mut());
    write_lines(&mut writer, lines)?;
    writer.flush()?;
    drop(writer);

    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), lines = lines.len(), "Wrote rwy file");
    Ok(())
}

fn write_lines<T: Write>(writer: &mut T, lines: &[String]) -> ApplicationResult<()> {
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}
