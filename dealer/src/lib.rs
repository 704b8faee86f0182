//! Control code for a card-dealing turret: heading control, single-card
//! feeding, deal scheduling and color sorting.
pub use assignment::*;
pub use color::*;
pub use config::*;
pub use dispense::*;
pub use errors::*;
pub use hardware::*;
pub use heading::*;
pub use scheduler::*;
pub use sim::*;

#[cfg(test)]
mod arbitrary;
mod assignment;
mod color;
mod config;
mod dispense;
mod errors;
mod hardware;
mod heading;
mod scheduler;
mod sim;
