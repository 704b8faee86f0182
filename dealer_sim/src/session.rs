use dealer::{
    total_cards, ColorConfig, ColorReading, DealReport, DealScheduler, SeatLayout, SensorColor,
    SimTurret, SortReport, Strategy,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Recorder;

pub const DECK_SIZE: usize = 52;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Deal(Strategy),
    Sort,
}

/// What to do in one session.
#[derive(Clone, Debug)]
pub struct SessionSpec {
    pub mode: Mode,
    pub seats: SeatLayout,
    pub cards_per_seat: usize,
    /// Number of consecutive deals. Ignored when sorting.
    pub cycles: usize,
    pub max_sort_cards: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionOutcome {
    Dealt { cycles: Vec<DealReport> },
    Sorted(SortReport),
}

/// A shuffled 52-card deck whose cards are spread evenly over the sort
/// piles, each reading as its pile's color.
pub fn simulated_deck<R: Rng + ?Sized>(rng: &mut R, colors: &ColorConfig) -> Vec<ColorReading> {
    let representatives: Vec<ColorReading> = colors
        .piles
        .iter()
        .map(|pile| {
            if let Some(range) = pile.hues.first() {
                ColorReading::Hue((range.min + range.max) / 2.0)
            } else if let Some(&color) = pile.colors.first() {
                ColorReading::Named(color)
            } else {
                ColorReading::Named(SensorColor::None)
            }
        })
        .collect();
    let mut deck: Vec<ColorReading> = (0..DECK_SIZE)
        .map(|i| representatives[i % representatives.len()])
        .collect();
    deck.shuffle(rng);
    deck
}

fn reload_deck<R: Rng + ?Sized>(scheduler: &mut DealScheduler<SimTurret>, rng: &mut R) {
    let deck = simulated_deck(rng, &scheduler.config().colors);
    let hw = scheduler.hardware_mut();
    hw.clear_tray();
    hw.load_deck(deck);
}

/// Runs one session on the simulated turret and parks it afterwards.
///
/// Returns an error only for impossible requests or recording failures,
/// never for soft failures of the turret.
pub fn run_session<R: Rng + ?Sized>(
    scheduler: &mut DealScheduler<SimTurret>,
    spec: &SessionSpec,
    rng: &mut R,
    recorder: &mut Option<Recorder>,
) -> anyhow::Result<SessionOutcome> {
    let outcome = match spec.mode {
        Mode::Deal(strategy) => {
            let needed = total_cards(spec.seats.len(), spec.cards_per_seat)?;
            if needed > DECK_SIZE {
                anyhow::bail!(
                    "Cannot deal {} cards to each of {} seats from a {}-card deck",
                    spec.cards_per_seat,
                    spec.seats.len(),
                    DECK_SIZE
                );
            }
            let mut cycles = Vec::with_capacity(spec.cycles);
            for cycle in 1..=spec.cycles {
                if scheduler.hardware().cards_in_tray() < needed {
                    info!(cycle, "Not enough cards in the tray, reloading the deck");
                    reload_deck(scheduler, rng);
                }
                info!(cycle, "Dealing");
                let report = scheduler.deal(strategy, &spec.seats, spec.cards_per_seat, rng)?;
                // The players pick up their cards.
                scheduler.hardware_mut().take_ejected();
                cycles.push(report);
            }
            SessionOutcome::Dealt { cycles }
        }
        Mode::Sort => {
            if scheduler.tray_is_empty() {
                info!("No cards detected, loading a deck");
                reload_deck(scheduler, rng);
            }
            SessionOutcome::Sorted(scheduler.classify_and_sort(spec.max_sort_cards))
        }
    };

    if !scheduler.park() {
        warn!("Could not return to the rest heading");
    }

    let events = scheduler.take_events();
    if let Some(rec) = recorder {
        rec.store_events(events);
        let path = rec.write_session_recording(&outcome)?;
        info!(path = %path.display(), "Recorded session");
    }
    Ok(outcome)
}
