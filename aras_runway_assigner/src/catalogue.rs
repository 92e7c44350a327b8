use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{debug, warn};
use tracing_unwrap::ResultExt;

use crate::{
    error::{ApplicationError, ApplicationResult},
    runway::{RunwayConfiguration, SecondaryRunways},
    util::normalize_icao,
};

/// A `[[runways.<ICAO>]]` entry as written in the config file.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunwayConfigurationEntry {
    pub departure: String,
    pub arrival: String,
    pub heading: u16,
    pub preferential: u16,
    #[serde(alias = "departurebis")]
    pub departure_bis: Option<String>,
    #[serde(alias = "arrivalbis")]
    pub arrival_bis: Option<String>,
    #[serde(default, rename = "has4runways")]
    pub has_four_runways: bool,
}

impl RunwayConfigurationEntry {
    fn into_configuration(self, airport: &str) -> ApplicationResult<RunwayConfiguration> {
        let invalid = |reason: String| ApplicationError::InvalidRunwayConfiguration {
            airport: airport.to_string(),
            reason,
        };

        if self.heading >= 360 {
            return Err(invalid(format!("heading {} is not below 360", self.heading)));
        }

        let secondary = match (self.has_four_runways, self.departure_bis, self.arrival_bis) {
            (true, Some(departure), Some(arrival)) => {
                Some(SecondaryRunways { departure, arrival })
            }
            (true, _, _) => {
                return Err(invalid(
                    "has4runways is set but departureBis or arrivalBis is missing".to_string(),
                ));
            }
            (false, departure, arrival) => {
                if departure.is_some() || arrival.is_some() {
                    warn!(
                        airport,
                        departure = %self.departure,
                        "departureBis/arrivalBis given without has4runways, ignoring them"
                    );
                }
                None
            }
        };

        Ok(RunwayConfiguration {
            airport: airport.to_string(),
            departure: self.departure,
            arrival: self.arrival,
            heading: self.heading,
            preferential: self.preferential,
            secondary,
        })
    }
}

/// Runway configurations per airport, in preference order. Read-only once
/// built.
#[derive(Debug, Default)]
pub struct RunwayCatalogue {
    airports: IndexMap<String, Vec<RunwayConfiguration>>,
}

impl RunwayCatalogue {
    pub(crate) fn from_entries(entries: &IndexMap<String, Vec<RunwayConfigurationEntry>>) -> Self {
        let mut airports: IndexMap<String, Vec<RunwayConfiguration>> = IndexMap::new();

        for (raw_icao, rows) in entries {
            let Some(icao) = normalize_icao(raw_icao) else {
                warn!(airport = %raw_icao, "Invalid airport identifier in runway catalogue");
                continue;
            };
            let configurations = rows
                .iter()
                .cloned()
                .map(|row| row.into_configuration(&icao))
                .filter_map(Result::ok_or_log)
                .collect::<Vec<_>>();

            airports.entry(icao).or_default().extend(configurations);
        }

        airports.retain(|icao, configurations| {
            if configurations.is_empty() {
                warn!(airport = %icao, "No usable runway configuration");
            }
            !configurations.is_empty()
        });

        debug!(airports = airports.len(), "Runway catalogue loaded");
        Self { airports }
    }

    /// Configurations for `icao`, preferential first. Empty if the airport is
    /// unknown.
    pub fn get_configurations(&self, icao: &str) -> &[RunwayConfiguration] {
        self.airports.get(icao).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, icao: &str) -> bool {
        self.airports.contains_key(icao)
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }
}
