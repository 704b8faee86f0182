use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Direction, Hardware, Motor, StopMode, Timer};

/// Upper bound for the watchdog and the reverse margin.
pub const MAX_DISPENSE_PHASE_MS: u64 = 60_000;

/// Tuning for the card feeder.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispenseConfig {
    /// Feeder speed in both directions, in percent.
    pub velocity_pct: f64,
    /// Forward travel that pushes exactly one card out.
    pub deg_per_card: f64,
    /// Hard limit on the forward phase.
    pub watchdog_ms: u64,
    /// Added to the measured forward duration for the back-off phase.
    /// Zero backs off for exactly as long as the card was pushed.
    pub reverse_margin_ms: u64,
    pub poll_ms: u64,
}

impl Default for DispenseConfig {
    fn default() -> Self {
        Self {
            velocity_pct: 90.0,
            deg_per_card: 240.0,
            watchdog_ms: 240,
            reverse_margin_ms: 200,
            poll_ms: 2,
        }
    }
}

/// What happened during one [`DispenseActuator::dispense_one_card`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispenseOutcome {
    pub forward_duration_ms: u64,
    /// `false` if the watchdog fired before the feeder travelled far enough.
    pub success: bool,
}

/// Pushes a single card out of the tray, then backs off so the next card
/// can't follow it into the gap.
#[derive(Copy, Clone, Debug, Default)]
pub struct DispenseActuator {
    pub config: DispenseConfig,
}

impl DispenseActuator {
    pub fn new(config: DispenseConfig) -> Self {
        Self { config }
    }

    pub fn dispense_one_card<H: Hardware>(&self, hw: &mut H) -> DispenseOutcome {
        let cfg = &self.config;
        let start_deg = hw.dispenser().position_deg();
        hw.dispenser().set_velocity_percent(cfg.velocity_pct);
        hw.dispenser().spin(Direction::Forward);

        let timer = Timer::start(&*hw);
        while hw.dispenser().position_deg() - start_deg < cfg.deg_per_card
            && timer.elapsed_ms(&*hw) < cfg.watchdog_ms
        {
            hw.sleep_ms(cfg.poll_ms);
        }
        hw.dispenser().stop(StopMode::Brake);

        let forward_duration_ms = timer.elapsed_ms(&*hw);
        let travelled_deg = hw.dispenser().position_deg() - start_deg;
        let success = travelled_deg >= cfg.deg_per_card;

        hw.dispenser().set_velocity_percent(cfg.velocity_pct);
        hw.dispenser().spin(Direction::Reverse);
        hw.sleep_ms(forward_duration_ms.saturating_add(cfg.reverse_margin_ms));
        hw.dispenser().stop(StopMode::Brake);

        if success {
            debug!(forward_duration_ms, travelled_deg, "Dispensed card");
        } else {
            warn!(
                forward_duration_ms,
                travelled_deg, "Dispense watchdog fired before the card was fully pushed"
            );
        }
        DispenseOutcome {
            forward_duration_ms,
            success,
        }
    }
}
