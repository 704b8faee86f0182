use serde::{Deserialize, Serialize};

use crate::{ColorReading, ConfigError, SensorColor};

/// Hue interval in degrees, `[min, max)` unless `inclusive_max` is set.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HueRange {
    pub min: f64,
    pub max: f64,
    /// Whether `max` itself belongs to the range.
    #[serde(default)]
    pub inclusive_max: bool,
}

impl HueRange {
    /// `[min, max)`
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            inclusive_max: false,
        }
    }

    /// `[min, max]`
    pub const fn inclusive(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            inclusive_max: true,
        }
    }

    pub fn contains(&self, hue: f64) -> bool {
        hue >= self.min && (hue < self.max || (self.inclusive_max && hue == self.max))
    }

    pub fn is_empty(&self) -> bool {
        if self.inclusive_max {
            !(self.min <= self.max)
        } else {
            !(self.min < self.max)
        }
    }
}

/// A pile that sorted cards end up on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PileRule {
    pub name: String,
    /// Where the turret faces to drop a card on this pile.
    pub heading_deg: f64,
    #[serde(default)]
    pub hues: Vec<HueRange>,
    #[serde(default)]
    pub colors: Vec<SensorColor>,
}

impl PileRule {
    fn matches(&self, reading: ColorReading) -> bool {
        match reading {
            ColorReading::Hue(hue) => self.hues.iter().any(|range| range.contains(hue)),
            ColorReading::Named(color) => self.colors.contains(&color),
        }
    }
}

/// Classification rules for the sort loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub piles: Vec<PileRule>,
    /// Readings in this range mean the sensor is looking at the empty tray.
    pub empty_tray_hue: Option<HueRange>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        use SensorColor::{Blue, BlueGreen, Cyan, Green, Red, RedViolet, Yellow, YellowGreen};
        let pile = |name: &str, heading_deg, hue: HueRange, colors: &[SensorColor]| PileRule {
            name: String::from(name),
            heading_deg,
            hues: vec![hue],
            colors: colors.to_vec(),
        };
        Self {
            piles: vec![
                pile("hearts", 0.0, HueRange::new(0.0, 20.0), &[Red, RedViolet]),
                pile("spades", 90.0, HueRange::new(20.0, 45.0), &[Blue, Cyan]),
                pile(
                    "diamonds",
                    180.0,
                    HueRange::new(215.0, 360.0),
                    &[Green, BlueGreen, YellowGreen],
                ),
                pile("clubs", 270.0, HueRange::inclusive(45.0, 150.0), &[Yellow]),
            ],
            empty_tray_hue: Some(HueRange::new(180.0, 205.0)),
        }
    }
}

impl ColorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.piles.is_empty() {
            return Err(ConfigError::NoPiles);
        }
        let ranges = self.piles.iter().flat_map(|pile| pile.hues.iter());
        for range in ranges.chain(self.empty_tray_hue.iter()) {
            if range.is_empty() {
                return Err(ConfigError::EmptyHueRange {
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

/// Result of classifying one reading.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorBucket {
    /// Index into [`ColorConfig::piles`].
    Pile(usize),
    Unknown,
}

#[derive(Clone, Debug, Default)]
pub struct ColorClassifier {
    pub config: ColorConfig,
}

impl ColorClassifier {
    pub fn new(config: ColorConfig) -> Self {
        Self { config }
    }

    /// The first pile whose rule matches, or [`ColorBucket::Unknown`].
    pub fn classify(&self, reading: ColorReading) -> ColorBucket {
        self.config
            .piles
            .iter()
            .position(|pile| pile.matches(reading))
            .map_or(ColorBucket::Unknown, ColorBucket::Pile)
    }

    pub fn is_empty_tray(&self, reading: ColorReading) -> bool {
        match (reading, self.config.empty_tray_hue) {
            (ColorReading::Hue(hue), Some(range)) => range.contains(hue),
            _ => false,
        }
    }

    pub fn pile(&self, bucket: ColorBucket) -> Option<&PileRule> {
        match bucket {
            ColorBucket::Pile(idx) => self.config.piles.get(idx),
            ColorBucket::Unknown => None,
        }
    }

    pub fn num_piles(&self) -> usize {
        self.config.piles.len()
    }
}

/// How many cards went where during one sort.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortReport {
    pub per_pile: Vec<usize>,
    pub unknown: usize,
    /// `true` if sorting ended because the tray ran out of cards.
    pub stopped_on_empty_tray: bool,
}

impl SortReport {
    pub fn new(num_piles: usize) -> Self {
        Self {
            per_pile: vec![0; num_piles],
            unknown: 0,
            stopped_on_empty_tray: false,
        }
    }

    pub fn tally(&mut self, bucket: ColorBucket) {
        match bucket {
            ColorBucket::Pile(idx) => self.per_pile[idx] += 1,
            ColorBucket::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.per_pile.iter().sum::<usize>() + self.unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_ranges() {
        let classifier = ColorClassifier::default();
        assert_eq!(classifier.classify(ColorReading::Hue(0.0)), ColorBucket::Pile(0));
        assert_eq!(classifier.classify(ColorReading::Hue(19.9)), ColorBucket::Pile(0));
        assert_eq!(classifier.classify(ColorReading::Hue(20.0)), ColorBucket::Pile(1));
        assert_eq!(classifier.classify(ColorReading::Hue(300.0)), ColorBucket::Pile(2));
        assert_eq!(classifier.classify(ColorReading::Hue(100.0)), ColorBucket::Pile(3));
    }

    #[test]
    fn clubs_include_their_upper_bound() {
        let classifier = ColorClassifier::default();
        assert_eq!(classifier.classify(ColorReading::Hue(150.0)), ColorBucket::Pile(3));
        assert_eq!(classifier.classify(ColorReading::Hue(150.5)), ColorBucket::Unknown);
        // Every other default range stays half-open.
        assert_eq!(classifier.classify(ColorReading::Hue(45.0)), ColorBucket::Pile(3));
        assert!(!classifier.is_empty_tray(ColorReading::Hue(205.0)));
    }

    #[test]
    fn unmapped_hue_is_unknown() {
        let classifier = ColorClassifier::default();
        for hue in [160.0, 210.0, 360.0, -5.0, f64::NAN] {
            assert_eq!(classifier.classify(ColorReading::Hue(hue)), ColorBucket::Unknown);
        }
    }

    #[test]
    fn named_colors() {
        let classifier = ColorClassifier::default();
        let named = |c| classifier.classify(ColorReading::Named(c));
        assert_eq!(named(SensorColor::RedViolet), ColorBucket::Pile(0));
        assert_eq!(named(SensorColor::Cyan), ColorBucket::Pile(1));
        assert_eq!(named(SensorColor::YellowGreen), ColorBucket::Pile(2));
        assert_eq!(named(SensorColor::Yellow), ColorBucket::Pile(3));
        assert_eq!(named(SensorColor::Orange), ColorBucket::Unknown);
        assert_eq!(named(SensorColor::None), ColorBucket::Unknown);
    }

    #[test]
    fn empty_tray_only_by_hue() {
        let classifier = ColorClassifier::default();
        assert!(classifier.is_empty_tray(ColorReading::Hue(192.0)));
        assert!(!classifier.is_empty_tray(ColorReading::Hue(10.0)));
        assert!(!classifier.is_empty_tray(ColorReading::Named(SensorColor::Cyan)));
        assert_eq!(classifier.classify(ColorReading::Hue(192.0)), ColorBucket::Unknown);
    }

    #[test]
    fn validation() {
        assert!(ColorConfig::default().validate().is_ok());
        let mut config = ColorConfig::default();
        config.empty_tray_hue = Some(HueRange::new(30.0, 30.0));
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyHueRange { min: 30.0, max: 30.0 })
        );
        let config = ColorConfig {
            piles: vec![],
            empty_tray_hue: None,
        };
        assert_eq!(config.validate(), Err(ConfigError::NoPiles));

        let mut config = ColorConfig::default();
        config.empty_tray_hue = Some(HueRange::inclusive(30.0, 30.0));
        assert!(config.validate().is_ok());
        config.empty_tray_hue = Some(HueRange::inclusive(31.0, 30.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn inclusive_flag_defaults_to_false_in_json() {
        let range: HueRange = serde_json::from_str(r#"{ "min": 10.0, "max": 20.0 }"#).unwrap();
        assert_eq!(range, HueRange::new(10.0, 20.0));
        let range: HueRange =
            serde_json::from_str(r#"{ "min": 10.0, "max": 20.0, "inclusive_max": true }"#).unwrap();
        assert!(range.contains(20.0));
    }

    #[test]
    fn report_tallies_unknown() {
        let mut report = SortReport::new(4);
        report.tally(ColorBucket::Pile(2));
        report.tally(ColorBucket::Unknown);
        report.tally(ColorBucket::Unknown);
        assert_eq!(report.per_pile, vec![0, 0, 1, 0]);
        assert_eq!(report.unknown, 2);
        assert_eq!(report.total(), 3);
    }
}
