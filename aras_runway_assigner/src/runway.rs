#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryRunways {
    pub departure: String,
    pub arrival: String,
}

/// One named way of running an airport: which runway ends are used for
/// departures and arrivals, and the tailwind the configuration tolerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunwayConfiguration {
    pub airport: String,
    pub departure: String,
    pub arrival: String,
    pub heading: u16,
    /// Tailwind in knots above which this configuration is abandoned.
    pub preferential: u16,
    /// Second departure/arrival pair, for airports with four runway ends.
    pub secondary: Option<SecondaryRunways>,
}

impl RunwayConfiguration {
    pub fn has_four_runways(&self) -> bool {
        self.secondary.is_some()
    }
}

/// The preferential configuration and the one used when the tailwind on it
/// is too strong.
#[derive(Debug, Clone, Copy)]
pub struct RunwayPair<'a> {
    pub preferential: &'a RunwayConfiguration,
    pub alternate: Option<&'a RunwayConfiguration>,
}

impl<'a> RunwayPair<'a> {
    /// First entry is preferential, second is the alternate. Further entries
    /// are never selected.
    pub fn from_configurations(configurations: &'a [RunwayConfiguration]) -> Option<Self> {
        let (preferential, rest) = configurations.split_first()?;
        Some(Self {
            preferential,
            alternate: rest.first(),
        })
    }
}
