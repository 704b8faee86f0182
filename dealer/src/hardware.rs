use serde::{Deserialize, Serialize};

/// Which way a [`Motor`] turns when spun.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
}

/// What a [`Motor`] does with its shaft once stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopMode {
    Coast,
    Brake,
    Hold,
}

/// A single smart motor, as seen by the control code.
pub trait Motor {
    /// Sets the velocity used by the next (or current) [`spin`](Motor::spin),
    /// as a signed percentage of full speed.
    fn set_velocity_percent(&mut self, pct: f64);
    fn spin(&mut self, direction: Direction);
    fn stop(&mut self, mode: StopMode);
    /// Accumulated shaft rotation in degrees.
    fn position_deg(&self) -> f64;
}

/// The discrete colors reported by the optical sensor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorColor {
    Red,
    Green,
    Blue,
    White,
    Yellow,
    Orange,
    Purple,
    Cyan,
    Black,
    Transparent,
    RedViolet,
    Violet,
    BlueViolet,
    BlueGreen,
    YellowGreen,
    YellowOrange,
    RedOrange,
    None,
}

/// One sample from the color sensor.
///
/// Depending on how the sensor is configured it reports either a continuous
/// hue in degrees or one of its built-in [`SensorColor`]s.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ColorReading {
    Hue(f64),
    Named(SensorColor),
}

/// Everything the turret needs from the outside world.
///
/// Implementations own the motors and sensors. All waiting goes through
/// [`sleep_ms`](Hardware::sleep_ms), so a simulated implementation can advance
/// its physics and its clock together.
pub trait Hardware {
    type Motor: Motor;

    /// Absolute heading in degrees. Assumed calibrated and zeroed beforehand.
    fn heading_deg(&mut self) -> f64;
    fn left_drive(&mut self) -> &mut Self::Motor;
    fn right_drive(&mut self) -> &mut Self::Motor;
    fn dispenser(&mut self) -> &mut Self::Motor;
    fn color_reading(&mut self) -> ColorReading;
    /// Monotonic milliseconds since an arbitrary origin.
    fn now_ms(&self) -> u64;
    fn sleep_ms(&mut self, ms: u64);
}

/// A restartable stopwatch on top of [`Hardware::now_ms`].
#[derive(Copy, Clone, Debug)]
pub struct Timer {
    started_at: u64,
}

impl Timer {
    pub fn start<H: Hardware + ?Sized>(hw: &H) -> Self {
        Self {
            started_at: hw.now_ms(),
        }
    }

    pub fn restart<H: Hardware + ?Sized>(&mut self, hw: &H) {
        self.started_at = hw.now_ms();
    }

    pub fn elapsed_ms<H: Hardware + ?Sized>(&self, hw: &H) -> u64 {
        hw.now_ms().saturating_sub(self.started_at)
    }
}
