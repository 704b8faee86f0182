/// The error type for [`DealerConfig::validate()`](crate::DealerConfig::validate).
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    PowerLimitsInverted { min_power: f64, max_power: f64 },
    NegativeTolerance { tolerance_deg: f64 },
    ZeroLoopPeriod,
    ZeroPollPeriod,
    NonPositiveCardTravel { deg_per_card: f64 },
    DispensePhaseTooLong { name: &'static str, ms: u64 },
    NoPiles,
    EmptyHueRange { min: f64, max: f64 },
}

impl std::error::Error for ConfigError {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::PowerLimitsInverted { min_power, max_power } => write!(
                f,
                "Minimum drive power {} is larger than the maximum {}",
                min_power, max_power
            ),
            ConfigError::NegativeTolerance { tolerance_deg } => {
                write!(f, "Heading tolerance must not be negative, got {}", tolerance_deg)
            }
            ConfigError::ZeroLoopPeriod => write!(f, "The control loop period must be at least 1 ms"),
            ConfigError::ZeroPollPeriod => write!(f, "The dispense poll period must be at least 1 ms"),
            ConfigError::NonPositiveCardTravel { deg_per_card } => write!(
                f,
                "The feeder must travel a positive distance per card, got {} degrees",
                deg_per_card
            ),
            ConfigError::DispensePhaseTooLong { name, ms } => write!(
                f,
                "The dispense {} of {} ms exceeds the limit of {} ms",
                name,
                ms,
                crate::MAX_DISPENSE_PHASE_MS
            ),
            ConfigError::NoPiles => write!(f, "At least one sort pile must be configured"),
            ConfigError::EmptyHueRange { min, max } => {
                write!(f, "Hue range from {} to {} does not contain any hue", min, max)
            }
        }
    }
}

/// The error type for setting up a deal.
#[derive(Debug, PartialEq, Eq)]
pub enum DealError {
    NoSeats,
    TooManyCards { num_seats: usize, cards_per_seat: usize },
}

impl std::error::Error for DealError {}

impl std::fmt::Display for DealError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DealError::NoSeats => write!(f, "Cannot deal to zero seats"),
            DealError::TooManyCards {
                num_seats,
                cards_per_seat,
            } => write!(
                f,
                "Dealing {} cards to each of {} seats overflows the card count",
                cards_per_seat, num_seats
            ),
        }
    }
}
