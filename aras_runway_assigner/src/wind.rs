use std::future::Future;

use nom::{
    Finish, IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::char,
    combinator::{all_consuming, map, map_res, opt, value},
    sequence::preceded,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApplicationError, ApplicationResult};

const KNOTS_PER_METER_PER_SECOND: f64 = 1.943_844;

/// Wind reported for one airport. `None` means the value is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindObservation {
    pub direction: Option<u16>,
    pub speed: Option<u16>,
    pub gust: u16,
}

impl WindObservation {
    #[allow(dead_code)] // used in tests
    pub fn new(direction: u16, speed: u16, gust: u16) -> Self {
        Self {
            direction: Some(direction % 360),
            speed: Some(speed),
            gust,
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    /// Builds an observation from the `-1` means unknown convention used by
    /// weather providers. Any negative value is unknown.
    #[allow(dead_code)] // used in tests
    pub fn from_raw(direction: i32, speed: i32, gust: i32) -> Self {
        let known = |v: i32| u16::try_from(v).ok();
        Self {
            direction: known(direction).and_then(normalize_direction),
            speed: known(speed),
            gust: known(gust).unwrap_or(0),
        }
    }

    #[allow(dead_code)] // used in tests
    pub fn is_usable(&self) -> bool {
        self.direction.is_some() && self.speed.is_some()
    }
}

/// Reported directions are in `[0, 360]` with 360 meaning north. Anything
/// larger is unknown.
fn normalize_direction(direction: u16) -> Option<u16> {
    match direction {
        0..360 => Some(direction),
        360 => Some(0),
        _ => None,
    }
}

/// How gusts are taken into account when judging tailwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GustPolicy {
    /// Only the mean wind speed counts.
    #[default]
    Ignore,
    /// The gust speed counts when it is higher than the mean speed.
    Peak,
}

impl GustPolicy {
    pub fn effective_speed(self, speed: u16, gust: u16) -> u16 {
        match self {
            Self::Ignore => speed,
            Self::Peak => speed.max(gust),
        }
    }
}

/// Something that can tell the current wind at an airport.
pub trait WindSource {
    fn fetch_wind(
        &self,
        icao: &str,
    ) -> impl Future<Output = ApplicationResult<WindObservation>> + Send;
}

#[derive(Debug, Clone, Copy)]
enum SpeedUnit {
    Knots,
    MetersPerSecond,
}

impl SpeedUnit {
    fn to_knots(self, value: u16) -> u16 {
        match self {
            Self::Knots => value,
            Self::MetersPerSecond => (f64::from(value) * KNOTS_PER_METER_PER_SECOND).round() as u16,
        }
    }
}

fn nom_number<const MIN: usize, const MAX: usize>(input: &str) -> IResult<&str, u16> {
    map_res(
        take_while_m_n(MIN, MAX, |c: char| c.is_ascii_digit()),
        str::parse::<u16>,
    )
    .parse(input)
}

fn nom_wind_direction(input: &str) -> IResult<&str, Option<u16>> {
    alt((
        value(None, tag("VRB")),
        value(None, tag("///")),
        map(nom_number::<3, 3>, normalize_direction),
    ))
    .parse(input)
}

fn nom_wind_speed(input: &str) -> IResult<&str, Option<u16>> {
    alt((value(None, tag("//")), map(nom_number::<2, 3>, Some))).parse(input)
}

fn nom_speed_unit(input: &str) -> IResult<&str, SpeedUnit> {
    alt((
        value(SpeedUnit::Knots, tag("KT")),
        value(SpeedUnit::MetersPerSecond, tag("MPS")),
    ))
    .parse(input)
}

/// Parses a METAR wind group such as `27015G25KT`, `VRB03KT` or `09008MPS`.
pub fn nom_wind_group(input: &str) -> IResult<&str, WindObservation> {
    let (rest, (direction, speed, gust, unit)) = (
        nom_wind_direction,
        nom_wind_speed,
        opt(preceded(char('G'), nom_number::<2, 3>)),
        nom_speed_unit,
    )
        .parse(input)?;

    Ok((
        rest,
        WindObservation {
            direction,
            speed: speed.map(|s| unit.to_knots(s)),
            gust: gust.map(|g| unit.to_knots(g)).unwrap_or(0),
        },
    ))
}

/// Finds the wind group in a raw METAR line.
pub fn wind_from_metar(metar: &str) -> ApplicationResult<WindObservation> {
    metar
        .split_whitespace()
        .skip(1)
        .find_map(|token| {
            all_consuming(nom_wind_group)
                .parse(token)
                .finish()
                .ok()
                .map(|(_, wind)| wind)
        })
        .ok_or_else(|| ApplicationError::MetarParseError(metar.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_sentinels() {
        let wind = WindObservation::from_raw(-1, 12, 0);
        assert_eq!(wind.direction, None);
        assert!(!wind.is_usable());

        let wind = WindObservation::from_raw(270, -1, -1);
        assert_eq!(wind.speed, None);
        assert_eq!(wind.gust, 0);
        assert!(!wind.is_usable());

        let wind = WindObservation::from_raw(360, 10, 18);
        assert_eq!(wind, WindObservation::new(0, 10, 18));
        assert!(wind.is_usable());
    }

    #[test]
    fn test_out_of_range_direction_is_unknown() {
        assert_eq!(WindObservation::from_raw(361, 10, 0).direction, None);
        assert_eq!(WindObservation::from_raw(990, 10, 0).direction, None);
        assert_eq!(WindObservation::from_raw(359, 10, 0).direction, Some(359));

        let (_, wind) = nom_wind_group("99015KT").unwrap();
        assert_eq!(wind.direction, None);
        assert_eq!(wind.speed, Some(15));
        assert!(!wind.is_usable());
    }

    #[test]
    fn test_gust_policy() {
        assert_eq!(GustPolicy::Ignore.effective_speed(10, 25), 10);
        assert_eq!(GustPolicy::Peak.effective_speed(10, 25), 25);
        assert_eq!(GustPolicy::Peak.effective_speed(10, 0), 10);
    }

    #[test]
    fn test_wind_group() {
        let (rest, wind) = nom_wind_group("27015G25KT").unwrap();
        assert!(rest.is_empty());
        assert_eq!(wind, WindObservation::new(270, 15, 25));

        let (_, wind) = nom_wind_group("00000KT").unwrap();
        assert_eq!(wind, WindObservation::new(0, 0, 0));

        let (_, wind) = nom_wind_group("36005KT").unwrap();
        assert_eq!(wind.direction, Some(0));

        let (_, wind) = nom_wind_group("VRB03KT").unwrap();
        assert_eq!(wind.direction, None);
        assert_eq!(wind.speed, Some(3));
    }

    #[test]
    fn test_wind_group_meters_per_second() {
        let (_, wind) = nom_wind_group("09008MPS").unwrap();
        assert_eq!(wind, WindObservation::new(90, 16, 0));
    }

    #[test]
    fn test_wind_from_metar() {
        let metar = "LFPG 191030Z 26012G22KT 230V290 9999 FEW030 14/08 Q1012 NOSIG";
        assert_eq!(
            wind_from_metar(metar).unwrap(),
            WindObservation::new(260, 12, 22)
        );

        let metar = "ENHV 081620Z AUTO /////KT 9999 OVC006/// 08/07 Q1001";
        assert!(!wind_from_metar(metar).unwrap().is_usable());
    }

    #[test]
    fn test_wind_from_metar_without_wind_group() {
        assert!(wind_from_metar("LFPG 191030Z 9999 Q1012").is_err());
        assert!(wind_from_metar("").is_err());
    }
}
