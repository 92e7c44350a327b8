use tracing::trace;

use crate::{
    catalogue::RunwayCatalogue,
    error::AssignmentError,
    runway::{RunwayConfiguration, RunwayPair},
    util::diff_angle,
    wind::{GustPolicy, WindObservation},
};

/// The configuration chosen for an airport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult<'a> {
    pub airport: String,
    pub configuration: &'a RunwayConfiguration,
}

/// Signed wind component along `heading`. Negative is tailwind. Headwind and
/// pure crosswind give 0.
pub fn tailwind_component(direction: u16, speed: u16, heading: u16) -> f64 {
    let alpha = f64::from(diff_angle(direction, heading));
    let component = f64::from(speed) * alpha.to_radians().cos();
    component.min(0.0)
}

/// Picks the active configuration for `icao`. The preferential configuration
/// is kept unless the tailwind on it is stronger than its threshold.
pub fn assign<'a>(
    icao: &str,
    wind: &WindObservation,
    catalogue: &'a RunwayCatalogue,
    gust_policy: GustPolicy,
) -> Result<AssignmentResult<'a>, AssignmentError> {
    let (Some(direction), Some(speed)) = (wind.direction, wind.speed) else {
        return Err(AssignmentError::MissingWindData);
    };

    let pair = RunwayPair::from_configurations(catalogue.get_configurations(icao))
        .ok_or(AssignmentError::NoConfiguration)?;

    let speed = gust_policy.effective_speed(speed, wind.gust);
    let preferred = pair.preferential;
    let tailwind = tailwind_component(direction, speed, preferred.heading);
    trace!(
        airport = icao,
        direction,
        speed,
        heading = preferred.heading,
        tailwind,
        "Tailwind on preferential configuration"
    );

    let configuration = if tailwind < -f64::from(preferred.preferential) {
        pair.alternate.ok_or(AssignmentError::InsufficientConfigurations)?
    } else {
        preferred
    };

    Ok(AssignmentResult {
        airport: icao.to_string(),
        configuration,
    })
}
