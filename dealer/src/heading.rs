use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Direction, Hardware, Motor, StopMode, Timer};

/// PID gains and termination criteria for one rotation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Largest `|error|` that counts as converged.
    pub tolerance_deg: f64,
    pub timeout_ms: u64,
}

impl Default for ControllerGains {
    fn default() -> Self {
        Self {
            kp: 1.25,
            ki: 0.02,
            kd: 0.15,
            tolerance_deg: 1.0,
            timeout_ms: 2000,
        }
    }
}

/// Properties of the drive train that don't change between rotations.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveLimits {
    /// Smallest command magnitude that still overcomes static friction.
    pub min_power: f64,
    pub max_power: f64,
    /// The integral only accumulates while `|error|` is below this.
    pub integral_guard_deg: f64,
    pub loop_period_ms: u64,
}

impl Default for DriveLimits {
    fn default() -> Self {
        Self {
            min_power: 7.0,
            max_power: 70.0,
            integral_guard_deg: 20.0,
            loop_period_ms: 15,
        }
    }
}

/// Brings an angle into `[-180, 180]` while keeping it congruent mod 360.
///
/// The result is the signed shortest turn for a heading error.
/// ```
/// # use dealer::normalize_deg;
/// assert_eq!(normalize_deg(170.0 - (-170.0)), -20.0);
/// assert_eq!(normalize_deg(-190.0), 170.0);
/// ```
pub fn normalize_deg(angle: f64) -> f64 {
    let mut angle = angle % 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle < -180.0 {
        angle += 360.0;
    }
    angle
}

/// Forces the magnitude of `power` into `[min_power, max_power]`, keeping its sign.
///
/// Small commands are raised to `min_power` rather than dropped, so a motor
/// that is actively correcting never stalls on friction.
/// ```
/// # use dealer::clamp_power;
/// assert_eq!(clamp_power(0.001, 7.0, 70.0), 7.0);
/// assert_eq!(clamp_power(-120.0, 7.0, 70.0), -70.0);
/// ```
pub fn clamp_power(power: f64, min_power: f64, max_power: f64) -> f64 {
    power.abs().max(min_power).min(max_power).copysign(power)
}

/// Working state of a single rotation request.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeadingState {
    pub target_deg: f64,
    /// Always within `[-180, 180]`.
    pub error_deg: f64,
    pub integral: f64,
    pub prev_error_deg: f64,
}

impl HeadingState {
    fn new(target_deg: f64, heading_deg: f64) -> Self {
        let error_deg = normalize_deg(target_deg - heading_deg);
        Self {
            target_deg,
            error_deg,
            integral: 0.0,
            prev_error_deg: error_deg,
        }
    }

    /// Computes the control effort for the current error.
    fn effort(&mut self, gains: &ControllerGains, limits: &DriveLimits) -> f64 {
        let dt = limits.loop_period_ms as f64 / 1000.0;
        if self.error_deg.abs() < limits.integral_guard_deg {
            self.integral += self.error_deg * dt;
        } else {
            self.integral = 0.0;
        }
        let derivative = (self.error_deg - self.prev_error_deg) / dt;
        gains.kp * self.error_deg + gains.ki * self.integral + gains.kd * derivative
    }

    fn update(&mut self, heading_deg: f64) {
        self.prev_error_deg = self.error_deg;
        self.error_deg = normalize_deg(self.target_deg - heading_deg);
    }
}

/// Closed-loop turn-in-place controller for the two drive motors.
#[derive(Copy, Clone, Debug, Default)]
pub struct HeadingController {
    pub limits: DriveLimits,
}

impl HeadingController {
    pub fn new(limits: DriveLimits) -> Self {
        Self { limits }
    }

    /// Turns the turret to `target_deg` the short way round.
    ///
    /// Returns `true` if the error dropped within tolerance before the
    /// timeout. A timeout is not an error; the drive is stopped either way.
    pub fn rotate_to_heading<H: Hardware>(
        &self,
        hw: &mut H,
        target_deg: f64,
        gains: &ControllerGains,
    ) -> bool {
        let limits = &self.limits;
        hw.left_drive().spin(Direction::Forward);
        hw.right_drive().spin(Direction::Forward);

        let timer = Timer::start(&*hw);
        let heading = hw.heading_deg();
        let mut state = HeadingState::new(target_deg, heading);

        while state.error_deg.abs() > gains.tolerance_deg
            && timer.elapsed_ms(&*hw) < gains.timeout_ms
        {
            let u = state.effort(gains, limits);
            let left = clamp_power(u, limits.min_power, limits.max_power);
            let right = clamp_power(-u, limits.min_power, limits.max_power);
            trace!(error = state.error_deg, u, left, right);
            hw.left_drive().set_velocity_percent(left);
            hw.right_drive().set_velocity_percent(right);

            hw.sleep_ms(limits.loop_period_ms);
            let heading = hw.heading_deg();
            state.update(heading);
        }

        hw.left_drive().stop(StopMode::Brake);
        hw.right_drive().stop(StopMode::Brake);

        let converged = state.error_deg.abs() <= gains.tolerance_deg;
        debug!(
            target_deg,
            error = state.error_deg,
            elapsed_ms = timer.elapsed_ms(&*hw),
            converged,
            "Rotation finished"
        );
        converged
    }
}
