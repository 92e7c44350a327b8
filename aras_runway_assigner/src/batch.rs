use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    assign::{AssignmentResult, assign},
    catalogue::RunwayCatalogue,
    error::AssignmentError,
    output::{format_active_airport, format_runway_output},
    wind::{GustPolicy, WindObservation, WindSource},
};

/// Outcome of one FIR run.
#[derive(Debug, Default)]
pub struct BatchOutcome<'a> {
    pub assigned: Vec<AssignmentResult<'a>>,
    pub skipped: IndexMap<String, AssignmentError>,
}

impl BatchOutcome<'_> {
    /// Output lines for every assigned airport, in airport order.
    pub fn lines(&self) -> Vec<String> {
        self.assigned
            .iter()
            .flat_map(|result| {
                format_active_airport(&result.airport)
                    .into_iter()
                    .chain(format_runway_output(result))
            })
            .collect()
    }
}

/// Fetches wind for all `airports` concurrently. The result is in the same
/// order as `airports`. Failed or timed out fetches give an unknown
/// observation.
pub async fn gather_winds<S: WindSource>(
    source: &S,
    airports: &[String],
    fetch_timeout: Duration,
) -> Vec<WindObservation> {
    join_all(airports.iter().map(|icao| async move {
        match timeout(fetch_timeout, source.fetch_wind(icao)).await {
            Ok(Ok(wind)) => wind,
            Ok(Err(e)) => {
                warn!(airport = %icao, "Failed to get wind: {}", e);
                WindObservation::unknown()
            }
            Err(_) => {
                warn!(airport = %icao, ?fetch_timeout, "Timed out getting wind");
                WindObservation::unknown()
            }
        }
    }))
    .await
}

/// Assigns a configuration to every airport that can get one. Airports that
/// cannot are recorded in `skipped` and do not stop the others.
pub fn assign_airports<'a>(
    airports: &[String],
    winds: &[WindObservation],
    catalogue: &'a RunwayCatalogue,
    gust_policy: GustPolicy,
) -> BatchOutcome<'a> {
    let mut outcome = BatchOutcome::default();
    for (icao, wind) in airports.iter().zip(winds) {
        match assign(icao, wind, catalogue, gust_policy) {
            Ok(result) => {
                info!(
                    airport = %icao,
                    departure = %result.configuration.departure,
                    arrival = %result.configuration.arrival,
                    four_runways = result.configuration.has_four_runways(),
                    ?wind,
                    "Runway assigned"
                );
                outcome.assigned.push(result);
            }
            Err(e) => {
                warn!(airport = %icao, ?wind, "No runway assigned: {}", e);
                outcome.skipped.insert(icao.clone(), e);
            }
        }
    }
    outcome
}

pub async fn run_batch<'a, S: WindSource>(
    source: &S,
    airports: &[String],
    catalogue: &'a RunwayCatalogue,
    gust_policy: GustPolicy,
    fetch_timeout: Duration,
) -> BatchOutcome<'a> {
    let winds = gather_winds(source, airports, fetch_timeout).await;
    assign_airports(airports, &winds, catalogue, gust_policy)
}

#[cfg(test)]
mod tests {
    use std::future::{Future, pending};

    use tracing_test::traced_test;

    use super::*;
    use crate::{
        error::{ApplicationError, ApplicationResult},
        runway::tests::configuration,
    };

    struct FixedWinds(IndexMap<&'static str, WindObservation>);

    impl WindSource for FixedWinds {
        async fn fetch_wind(&self, icao: &str) -> ApplicationResult<WindObservation> {
            self.0
                .get(icao)
                .copied()
                .ok_or_else(|| ApplicationError::MetarParseError(icao.to_string()))
        }
    }

    /// Never answers for `LFPB`.
    struct HangingSource;

    impl WindSource for HangingSource {
        fn fetch_wind(
            &self,
            icao: &str,
        ) -> impl Future<Output = ApplicationResult<WindObservation>> + Send {
            let hang = icao == "LFPB";
            async move {
                if hang {
                    pending::<()>().await;
                }
                Ok(WindObservation::new(270, 5, 0))
            }
        }
    }

    fn catalogue() -> RunwayCatalogue {
        [
            configuration("LFPG", "08L", "08R", 85, 5),
            configuration("LFPG", "26R", "26L", 265, 0),
            configuration("LFPO", "24", "25", 242, 5),
            configuration("LFPO", "06", "07", 62, 0),
            configuration("LFPB", "27", "27", 267, 5),
            configuration("LFPB", "09", "09", 87, 0),
        ]
        .into_iter()
        .collect()
    }

    fn airports(icaos: &[&str]) -> Vec<String> {
        icaos.iter().map(|icao| icao.to_string()).collect()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_missing_wind_does_not_abort_batch() {
        let catalogue = catalogue();
        let source = FixedWinds(IndexMap::from([
            ("LFPG", WindObservation::from_raw(-1, 10, 0)),
            ("LFPO", WindObservation::new(240, 12, 0)),
        ]));
        let airports = airports(&["LFPG", "LFPO"]);

        let outcome = run_batch(
            &source,
            &airports,
            &catalogue,
            GustPolicy::Ignore,
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(
            outcome.lines(),
            [
                "ACTIVE_AIRPORT:LFPO:1",
                "ACTIVE_AIRPORT:LFPO:0",
                "ACTIVE_RUNWAY:LFPO:24:1",
                "ACTIVE_RUNWAY:LFPO:25:0",
            ]
        );
        assert_eq!(
            outcome.skipped.get("LFPG"),
            Some(&AssignmentError::MissingWindData)
        );
        assert!(logs_contain("No runway assigned"));
    }

    #[tokio::test]
    async fn test_lines_follow_airport_order() {
        let catalogue = catalogue();
        let source = FixedWinds(IndexMap::from([
            ("LFPG", WindObservation::new(90, 10, 0)),
            ("LFPO", WindObservation::new(60, 20, 0)),
        ]));
        let airports = airports(&["LFPO", "LFPG"]);

        let outcome = run_batch(
            &source,
            &airports,
            &catalogue,
            GustPolicy::Ignore,
            Duration::from_secs(1),
        )
        .await;

        assert!(outcome.skipped.is_empty());
        assert_eq!(
            outcome.lines(),
            [
                "ACTIVE_AIRPORT:LFPO:1",
                "ACTIVE_AIRPORT:LFPO:0",
                "ACTIVE_RUNWAY:LFPO:06:1",
                "ACTIVE_RUNWAY:LFPO:07:0",
                "ACTIVE_AIRPORT:LFPG:1",
                "ACTIVE_AIRPORT:LFPG:0",
                "ACTIVE_RUNWAY:LFPG:08L:1",
                "ACTIVE_RUNWAY:LFPG:08R:0",
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_error_and_unknown_airport_are_skipped() {
        let catalogue = catalogue();
        let source = FixedWinds(IndexMap::from([("EGLL", WindObservation::new(270, 8, 0))]));
        let airports = airports(&["LFPG", "EGLL"]);

        let outcome = run_batch(
            &source,
            &airports,
            &catalogue,
            GustPolicy::Ignore,
            Duration::from_secs(1),
        )
        .await;

        assert!(outcome.assigned.is_empty());
        assert!(outcome.lines().is_empty());
        assert_eq!(
            outcome.skipped,
            IndexMap::from([
                ("LFPG".to_string(), AssignmentError::MissingWindData),
                ("EGLL".to_string(), AssignmentError::NoConfiguration),
            ])
        );
    }

    #[tokio::test]
    async fn test_timed_out_fetch_counts_as_missing_wind() {
        let airports = airports(&["LFPG", "LFPB", "LFPO"]);
        let winds = gather_winds(&HangingSource, &airports, Duration::from_millis(20)).await;

        assert_eq!(winds.len(), 3);
        assert_eq!(winds[0], WindObservation::new(270, 5, 0));
        assert_eq!(winds[1], WindObservation::unknown());
        assert_eq!(winds[2], WindObservation::new(270, 5, 0));
    }
}
