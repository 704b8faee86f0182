use serde::{Deserialize, Serialize};

use crate::{
    ColorConfig, ConfigError, ControllerGains, DispenseConfig, DriveLimits, MAX_DISPENSE_PHASE_MS,
};

/// Pauses that let the mechanism settle between actions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    pub after_card_ms: u64,
    /// Only used by the shuffled deal, between two seat visits.
    pub between_bursts_ms: u64,
    pub sort_after_rotation_ms: u64,
    pub sort_after_card_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_card_ms: 80,
            between_bursts_ms: 100,
            sort_after_rotation_ms: 200,
            sort_after_card_ms: 100,
        }
    }
}

/// Extra attempts after a soft failure. The default makes no retries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Re-run the heading controller this many more times after a timeout.
    pub rotation_retries: u32,
    /// Feed again this many more times after the dispense watchdog fires.
    /// A partially pushed card may then leave together with the next one.
    pub dispense_retries: u32,
}

/// All tunables of the turret. Every field has a default, so a config file
/// only needs to mention what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealerConfig {
    pub gains: ControllerGains,
    pub drive: DriveLimits,
    pub dispense: DispenseConfig,
    pub settle: SettleDelays,
    pub retry: RetryPolicy,
    pub colors: ColorConfig,
    /// Where [`DealScheduler::park`](crate::DealScheduler::park) turns to.
    pub park_heading_deg: f64,
}

impl Default for DealerConfig {
    fn default() -> Self {
        Self {
            gains: ControllerGains::default(),
            drive: DriveLimits::default(),
            dispense: DispenseConfig::default(),
            settle: SettleDelays::default(),
            retry: RetryPolicy::default(),
            colors: ColorConfig::default(),
            park_heading_deg: 0.0,
        }
    }
}

impl DealerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let drive = &self.drive;
        if !(drive.min_power <= drive.max_power) {
            return Err(ConfigError::PowerLimitsInverted {
                min_power: drive.min_power,
                max_power: drive.max_power,
            });
        }
        if !(self.gains.tolerance_deg >= 0.0) {
            return Err(ConfigError::NegativeTolerance {
                tolerance_deg: self.gains.tolerance_deg,
            });
        }
        if drive.loop_period_ms == 0 {
            return Err(ConfigError::ZeroLoopPeriod);
        }
        if self.dispense.poll_ms == 0 {
            return Err(ConfigError::ZeroPollPeriod);
        }
        if !(self.dispense.deg_per_card > 0.0) {
            return Err(ConfigError::NonPositiveCardTravel {
                deg_per_card: self.dispense.deg_per_card,
            });
        }
        let phases = [
            ("watchdog", self.dispense.watchdog_ms),
            ("reverse margin", self.dispense.reverse_margin_ms),
        ];
        for (name, ms) in phases {
            if ms > MAX_DISPENSE_PHASE_MS {
                return Err(ConfigError::DispensePhaseTooLong { name, ms });
            }
        }
        self.colors.validate()
    }
}
