use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Burst, CardAssignment, ColorBucket, ColorClassifier, ColorReading, ConfigError,
    ControllerGains, DealError, DealerConfig, DispenseActuator, DispenseOutcome, Hardware,
    HeadingController, SeatLayout, SortReport,
};

/// How cards are distributed over the seats.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Round-robin in seat order, one rotation per card.
    Sequential,
    /// Uniformly random seat per card, skipping full seats. One rotation per card.
    WeightedRandom,
    /// Fisher-Yates shuffled deck, one rotation per run of same-seat cards.
    ShuffledBursts,
}

/// Something the turret did, for the session journal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurretEvent {
    Rotated {
        target_deg: f64,
        converged: bool,
        attempts: u32,
        at_ms: u64,
    },
    Dispensed {
        seat: Option<usize>,
        outcome: DispenseOutcome,
        attempts: u32,
        at_ms: u64,
    },
    Sorted {
        reading: ColorReading,
        bucket: ColorBucket,
        at_ms: u64,
    },
    TrayEmpty {
        at_ms: u64,
    },
}

/// Summary of one deal cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealReport {
    pub strategy: Strategy,
    /// Cards handed to each seat, counting dispenses whose watchdog fired.
    pub per_seat: Vec<usize>,
    /// Number of rotations, i.e. seat visits.
    pub visits: usize,
    /// Visits where the heading was still out of tolerance when dealing began.
    pub missed_headings: usize,
    pub dispense_timeouts: usize,
}

impl DealReport {
    fn new(strategy: Strategy, num_seats: usize) -> Self {
        Self {
            strategy,
            per_seat: vec![0; num_seats],
            visits: 0,
            missed_headings: 0,
            dispense_timeouts: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.per_seat.iter().sum()
    }
}

/// Drives the turret through deals and sorts.
///
/// Owns the hardware and lends it to the [`HeadingController`] and the
/// [`DispenseActuator`] for one call at a time, so a rotation always finishes
/// before a card is fed and vice versa.
pub struct DealScheduler<H> {
    hw: H,
    config: DealerConfig,
    controller: HeadingController,
    actuator: DispenseActuator,
    classifier: ColorClassifier,
    events: Vec<TurretEvent>,
}

impl<H: Hardware> DealScheduler<H> {
    pub fn new(hw: H, config: DealerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            hw,
            controller: HeadingController::new(config.drive),
            actuator: DispenseActuator::new(config.dispense),
            classifier: ColorClassifier::new(config.colors.clone()),
            config,
            events: Vec::new(),
        })
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn config(&self) -> &DealerConfig {
        &self.config
    }

    /// Drains the journal of everything done since the last call.
    pub fn take_events(&mut self) -> Vec<TurretEvent> {
        std::mem::take(&mut self.events)
    }

    /// One run of the heading controller with explicit gains, no retries.
    pub fn rotate_with_gains(&mut self, target_deg: f64, gains: &ControllerGains) -> bool {
        self.controller.rotate_to_heading(&mut self.hw, target_deg, gains)
    }

    /// Turns to `target_deg` with the configured gains and retry policy.
    ///
    /// Returns whether the turret ended up within tolerance. Callers are free
    /// to carry on regardless.
    pub fn rotate_to_heading(&mut self, target_deg: f64) -> bool {
        let gains = self.config.gains;
        let max_attempts = self.config.retry.rotation_retries.saturating_add(1);
        let mut attempts = 0;
        let mut converged = false;
        while !converged && attempts < max_attempts {
            attempts += 1;
            converged = self.rotate_with_gains(target_deg, &gains);
        }
        if !converged {
            warn!(target_deg, attempts, "Heading not reached before timeout");
        }
        self.events.push(TurretEvent::Rotated {
            target_deg,
            converged,
            attempts,
            at_ms: self.hw.now_ms(),
        });
        converged
    }

    /// Feeds one card, retrying per the configured policy if the watchdog fires.
    pub fn dispense_one_card(&mut self) -> DispenseOutcome {
        self.dispense_for(None)
    }

    fn dispense_for(&mut self, seat: Option<usize>) -> DispenseOutcome {
        let max_attempts = self.config.retry.dispense_retries.saturating_add(1);
        let mut attempts = 0;
        let outcome = loop {
            attempts += 1;
            let outcome = self.actuator.dispense_one_card(&mut self.hw);
            if outcome.success || attempts >= max_attempts {
                break outcome;
            }
        };
        self.events.push(TurretEvent::Dispensed {
            seat,
            outcome,
            attempts,
            at_ms: self.hw.now_ms(),
        });
        outcome
    }

    /// Rotates once to `heading_deg` and feeds `num_cards` cards there.
    ///
    /// Returns whether the heading was reached and how many dispenses timed out.
    pub fn deal_to_position(&mut self, heading_deg: f64, num_cards: usize) -> (bool, usize) {
        self.visit(None, heading_deg, num_cards)
    }

    fn visit(&mut self, seat: Option<usize>, heading_deg: f64, num_cards: usize) -> (bool, usize) {
        let converged = self.rotate_to_heading(heading_deg);
        let mut timeouts = 0;
        for _ in 0..num_cards {
            if !self.dispense_for(seat).success {
                timeouts += 1;
            }
            self.hw.sleep_ms(self.config.settle.after_card_ms);
        }
        (converged, timeouts)
    }

    fn execute(
        &mut self,
        strategy: Strategy,
        seats: &SeatLayout,
        bursts: impl Iterator<Item = Burst>,
        pause_between_bursts_ms: u64,
    ) -> DealReport {
        let mut report = DealReport::new(strategy, seats.len());
        for Burst { seat, cards } in bursts {
            let heading_deg = seats.heading(seat);
            debug!(seat, cards, heading_deg, "Visiting seat");
            let (converged, timeouts) = self.visit(Some(seat), heading_deg, cards);
            report.visits += 1;
            report.per_seat[seat] += cards;
            report.dispense_timeouts += timeouts;
            if !converged {
                report.missed_headings += 1;
            }
            if pause_between_bursts_ms > 0 {
                self.hw.sleep_ms(pause_between_bursts_ms);
            }
        }
        info!(
            ?strategy,
            cards = report.total(),
            visits = report.visits,
            missed_headings = report.missed_headings,
            dispense_timeouts = report.dispense_timeouts,
            "Deal finished"
        );
        report
    }

    pub fn deal_sequential(
        &mut self,
        seats: &SeatLayout,
        cards_per_seat: usize,
    ) -> Result<DealReport, DealError> {
        let assignment = CardAssignment::sequential(seats.len(), cards_per_seat)?;
        Ok(self.execute(Strategy::Sequential, seats, assignment.single_cards(), 0))
    }

    pub fn deal_weighted_random<R: Rng + ?Sized>(
        &mut self,
        seats: &SeatLayout,
        cards_per_seat: usize,
        rng: &mut R,
    ) -> Result<DealReport, DealError> {
        let assignment = CardAssignment::weighted_random(rng, seats.len(), cards_per_seat)?;
        Ok(self.execute(Strategy::WeightedRandom, seats, assignment.single_cards(), 0))
    }

    pub fn deal_shuffled_bursts<R: Rng + ?Sized>(
        &mut self,
        seats: &SeatLayout,
        cards_per_seat: usize,
        rng: &mut R,
    ) -> Result<DealReport, DealError> {
        let assignment = CardAssignment::shuffled(rng, seats.len(), cards_per_seat)?;
        let pause = self.config.settle.between_bursts_ms;
        Ok(self.execute(Strategy::ShuffledBursts, seats, assignment.bursts(), pause))
    }

    pub fn deal<R: Rng + ?Sized>(
        &mut self,
        strategy: Strategy,
        seats: &SeatLayout,
        cards_per_seat: usize,
        rng: &mut R,
    ) -> Result<DealReport, DealError> {
        info!(?strategy, num_seats = seats.len(), cards_per_seat, "Dealing");
        match strategy {
            Strategy::Sequential => self.deal_sequential(seats, cards_per_seat),
            Strategy::WeightedRandom => self.deal_weighted_random(seats, cards_per_seat, rng),
            Strategy::ShuffledBursts => self.deal_shuffled_bursts(seats, cards_per_seat, rng),
        }
    }

    pub fn tray_is_empty(&mut self) -> bool {
        let reading = self.hw.color_reading();
        self.classifier.is_empty_tray(reading)
    }

    /// Sorts up to `max_cards` cards onto the configured piles.
    ///
    /// Cards of an unrecognized color are fed wherever the turret happens to
    /// point and counted as [`ColorBucket::Unknown`]. Stops early once the
    /// tray reads as empty.
    pub fn classify_and_sort(&mut self, max_cards: usize) -> SortReport {
        let settle = self.config.settle;
        let mut report = SortReport::new(self.classifier.num_piles());
        for _ in 0..max_cards {
            let reading = self.hw.color_reading();
            if self.classifier.is_empty_tray(reading) {
                report.stopped_on_empty_tray = true;
                self.events.push(TurretEvent::TrayEmpty {
                    at_ms: self.hw.now_ms(),
                });
                break;
            }

            let bucket = self.classifier.classify(reading);
            match self.classifier.pile(bucket).map(|pile| pile.heading_deg) {
                Some(heading_deg) => {
                    self.rotate_to_heading(heading_deg);
                    self.hw.sleep_ms(settle.sort_after_rotation_ms);
                }
                None => warn!(?reading, "Unrecognized card color"),
            }
            self.dispense_one_card();
            self.hw.sleep_ms(settle.sort_after_card_ms);

            report.tally(bucket);
            self.events.push(TurretEvent::Sorted {
                reading,
                bucket,
                at_ms: self.hw.now_ms(),
            });
        }
        info!(
            per_pile = ?report.per_pile,
            unknown = report.unknown,
            stopped_on_empty_tray = report.stopped_on_empty_tray,
            "Sort finished"
        );
        report
    }

    /// Returns to the configured rest heading.
    pub fn park(&mut self) -> bool {
        self.rotate_to_heading(self.config.park_heading_deg)
    }
}
