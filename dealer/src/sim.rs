//! A simulated turret for tests and dry runs.
//!
//! Time only advances in [`Hardware::sleep_ms`], during which the motors move
//! at their commanded velocities. There is no inertia: a motor reaches its
//! commanded velocity instantly and stops dead.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{ColorReading, Direction, Hardware, Motor, StopMode};

/// An ideal motor.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SimMotor {
    velocity_pct: f64,
    direction: Option<Direction>,
    position_deg: f64,
}

impl SimMotor {
    pub fn is_spinning(&self) -> bool {
        self.direction.is_some()
    }

    /// Signed speed in percent, zero when stopped.
    pub fn effective_velocity(&self) -> f64 {
        match self.direction {
            Some(Direction::Forward) => self.velocity_pct,
            Some(Direction::Reverse) => -self.velocity_pct,
            None => 0.0,
        }
    }

    /// Rotates the shaft for `dt_ms` at `deg_per_sec_per_pct` degrees per
    /// second per percent, and returns the travel.
    fn advance(&mut self, dt_ms: u64, deg_per_sec_per_pct: f64) -> f64 {
        let travel = self.effective_velocity() * deg_per_sec_per_pct * dt_ms as f64 / 1000.0;
        self.position_deg += travel;
        travel
    }
}

impl Motor for SimMotor {
    fn set_velocity_percent(&mut self, pct: f64) {
        self.velocity_pct = pct;
    }

    fn spin(&mut self, direction: Direction) {
        self.direction = Some(direction);
    }

    fn stop(&mut self, _mode: StopMode) {
        self.direction = None;
    }

    fn position_deg(&self) -> f64 {
        self.position_deg
    }
}

/// A card that left the tray.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EjectedCard {
    /// The turret heading at the moment the card dropped, in `[0, 360)`.
    pub heading_deg: f64,
    pub reading: ColorReading,
    pub at_ms: u64,
}

/// Simulated turret with two drive motors, a feeder and a card tray.
#[derive(Clone, Debug)]
pub struct SimTurret {
    now_ms: u64,
    heading_deg: f64,
    min_heading_seen: f64,
    left: SimMotor,
    right: SimMotor,
    dispenser: SimMotor,
    /// Degrees per second per percent of `(left - right) / 2`.
    turn_rate: f64,
    /// Feeder degrees per second per percent.
    feed_rate: f64,
    feed_deg_per_card: f64,
    /// Forward feeder travel since the last reversal.
    feed_progress_deg: f64,
    tray: VecDeque<ColorReading>,
    empty_tray_reading: ColorReading,
    ejected: Vec<EjectedCard>,
}

impl Default for SimTurret {
    fn default() -> Self {
        Self::new()
    }
}

impl SimTurret {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            heading_deg: 0.0,
            min_heading_seen: 0.0,
            left: SimMotor::default(),
            right: SimMotor::default(),
            dispenser: SimMotor::default(),
            turn_rate: 6.0,
            feed_rate: 12.0,
            feed_deg_per_card: 200.0,
            feed_progress_deg: 0.0,
            tray: VecDeque::new(),
            empty_tray_reading: ColorReading::Hue(192.0),
            ejected: Vec::new(),
        }
    }

    pub fn set_heading(&mut self, heading_deg: f64) {
        self.heading_deg = heading_deg.rem_euclid(360.0);
        self.min_heading_seen = self.heading_deg;
    }

    pub fn heading(&self) -> f64 {
        self.heading_deg
    }

    /// Lowest heading reached since the last [`set_heading`](Self::set_heading).
    pub fn min_heading_seen(&self) -> f64 {
        self.min_heading_seen
    }

    /// Zero simulates a stalled drive.
    pub fn set_turn_rate(&mut self, deg_per_sec_per_pct: f64) {
        self.turn_rate = deg_per_sec_per_pct;
    }

    /// Zero simulates a jammed feeder.
    pub fn set_feed_rate(&mut self, deg_per_sec_per_pct: f64) {
        self.feed_rate = deg_per_sec_per_pct;
    }

    /// Puts cards into the tray, top card first.
    pub fn load_deck(&mut self, cards: impl IntoIterator<Item = ColorReading>) {
        self.tray.extend(cards);
    }

    /// Takes every card out of the tray.
    pub fn clear_tray(&mut self) -> Vec<ColorReading> {
        self.tray.drain(..).collect()
    }

    pub fn cards_in_tray(&self) -> usize {
        self.tray.len()
    }

    pub fn ejected(&self) -> &[EjectedCard] {
        &self.ejected
    }

    pub fn take_ejected(&mut self) -> Vec<EjectedCard> {
        std::mem::take(&mut self.ejected)
    }

    fn feed(&mut self, travel_deg: f64) {
        if travel_deg < 0.0 {
            self.feed_progress_deg = 0.0;
            return;
        }
        self.feed_progress_deg += travel_deg;
        let cards = (self.feed_progress_deg / self.feed_deg_per_card).floor();
        self.feed_progress_deg -= cards * self.feed_deg_per_card;
        let num_ejected = cards.min(self.tray.len() as f64) as usize;
        for reading in self.tray.drain(..num_ejected) {
            self.ejected.push(EjectedCard {
                heading_deg: self.heading_deg,
                reading,
                at_ms: self.now_ms,
            });
        }
    }
}

impl Hardware for SimTurret {
    type Motor = SimMotor;

    fn heading_deg(&mut self) -> f64 {
        self.heading_deg
    }

    fn left_drive(&mut self) -> &mut SimMotor {
        &mut self.left
    }

    fn right_drive(&mut self) -> &mut SimMotor {
        &mut self.right
    }

    fn dispenser(&mut self) -> &mut SimMotor {
        &mut self.dispenser
    }

    fn color_reading(&mut self) -> ColorReading {
        self.tray
            .front()
            .copied()
            .unwrap_or(self.empty_tray_reading)
    }

    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep_ms(&mut self, ms: u64) {
        let left = self.left.advance(ms, 1.0);
        let right = self.right.advance(ms, 1.0);
        let turn = (left - right) / 2.0 * self.turn_rate;
        self.heading_deg = (self.heading_deg + turn).rem_euclid(360.0);
        self.min_heading_seen = self.min_heading_seen.min(self.heading_deg);

        let travel = self.dispenser.advance(ms, self.feed_rate);
        self.now_ms = self.now_ms.saturating_add(ms);
        self.feed(travel);
    }
}
