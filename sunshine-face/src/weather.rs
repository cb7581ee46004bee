//! Cached weather snapshot

use heapless::String;

/// Longest temperature string kept, e.g. `"25°"` or `"-12°C"`
pub const MAX_TEMPERATURE_LEN: usize = 16;

pub type Temperature = String<MAX_TEMPERATURE_LEN>;

/// Temperatures carried by one weather payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeatherUpdate {
    pub high: Option<Temperature>,
    pub low: Option<Temperature>,
}

/// Most recently received high and low temperatures.
///
/// Lives in memory only; starts empty and is lost on restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeatherSnapshot {
    high: Option<Temperature>,
    low: Option<Temperature>,
}

impl WeatherSnapshot {
    pub const fn new() -> Self {
        Self {
            high: None,
            low: None,
        }
    }

    pub fn high(&self) -> Option<&str> {
        self.high.as_deref()
    }

    pub fn low(&self) -> Option<&str> {
        self.low.as_deref()
    }

    /// Both temperatures, only once each has been received
    pub fn both(&self) -> Option<(&str, &str)> {
        Some((self.high()?, self.low()?))
    }

    /// Overwrite the fields present in `update`; absent fields keep their value
    pub fn apply(&mut self, update: WeatherUpdate) {
        if let Some(high) = update.high {
            self.high = Some(high);
        }
        if let Some(low) = update.low {
            self.low = Some(low);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(s: &str) -> Option<Temperature> {
        Some(Temperature::try_from(s).unwrap())
    }

    #[test]
    fn test_starts_empty() {
        let snapshot = WeatherSnapshot::new();
        assert_eq!(snapshot.high(), None);
        assert_eq!(snapshot.low(), None);
        assert_eq!(snapshot.both(), None);
    }

    #[test]
    fn test_high_only_keeps_low() {
        let mut snapshot = WeatherSnapshot::new();
        snapshot.apply(WeatherUpdate {
            high: temp("21°"),
            low: temp("9°"),
        });
        snapshot.apply(WeatherUpdate {
            high: temp("24°"),
            low: None,
        });
        assert_eq!(snapshot.both(), Some(("24°", "9°")));
    }

    #[test]
    fn test_partial_snapshot_is_incomplete() {
        let mut snapshot = WeatherSnapshot::new();
        snapshot.apply(WeatherUpdate {
            high: None,
            low: temp("3°"),
        });
        assert_eq!(snapshot.low(), Some("3°"));
        assert_eq!(snapshot.both(), None);
    }
}
