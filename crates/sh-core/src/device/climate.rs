use serde::{Deserialize, Serialize};

/// Temperature change per adjustment step, in °C
const TEMPERATURE_STEP: f64 = 0.5;

/// Humidity change per adjustment step, in %
const HUMIDITY_STEP: f64 = 1.0;

const HUMIDITY_LOW: f64 = 45.0;
const HUMIDITY_HIGH: f64 = 55.0;

/// Thermostat payload of a climate-control device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateState {
    pub target_temperature: f64,
    pub current_temperature: f64,
    pub humidity: f64,
    pub auto_mode: bool,
}

impl Default for ClimateState {
    fn default() -> Self {
        Self {
            target_temperature: 22.0,
            current_temperature: 20.0,
            humidity: 50.0,
            auto_mode: true,
        }
    }
}

impl ClimateState {
    pub fn with_target(target_temperature: f64) -> Self {
        Self {
            target_temperature,
            ..Self::default()
        }
    }

    /// Absolute distance between current and target temperature
    pub fn temperature_delta(&self) -> f64 {
        (self.current_temperature - self.target_temperature).abs()
    }

    /// Efficiency multiplier by temperature delta band
    pub fn efficiency_factor(&self) -> f64 {
        let delta = self.temperature_delta();
        if delta < 2.0 {
            0.9
        } else if delta < 5.0 {
            0.7
        } else {
            0.5
        }
    }

    /// Move temperature one step toward target and humidity toward the comfort band
    ///
    /// A step never overshoots the target.
    pub(crate) fn adjust(&mut self) {
        let diff = self.target_temperature - self.current_temperature;
        if diff != 0.0 {
            let step = diff.abs().min(TEMPERATURE_STEP);
            self.current_temperature += step.copysign(diff);
        }

        if self.humidity < HUMIDITY_LOW {
            self.humidity += HUMIDITY_STEP;
        } else if self.humidity > HUMIDITY_HIGH {
            self.humidity -= HUMIDITY_STEP;
        }
    }
}
