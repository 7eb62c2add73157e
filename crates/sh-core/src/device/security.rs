use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Shortest accepted access code
pub const MIN_ACCESS_CODE_LEN: usize = 4;

const MIN_SENSITIVITY: u8 = 1;
const MAX_SENSITIVITY: u8 = 10;
const DEFAULT_SENSITIVITY: u8 = 5;
const DEFAULT_ACCESS_CODE: &str = "0000";

/// Alarm payload of a security device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityState {
    pub is_armed: bool,
    pub motion_detected: bool,
    sensitivity_level: u8,
    access_codes: IndexSet<String>,
}

impl Default for SecurityState {
    fn default() -> Self {
        let mut access_codes = IndexSet::new();
        access_codes.insert(DEFAULT_ACCESS_CODE.to_string());
        Self {
            is_armed: false,
            motion_detected: false,
            sensitivity_level: DEFAULT_SENSITIVITY,
            access_codes,
        }
    }
}

impl SecurityState {
    pub fn sensitivity_level(&self) -> u8 {
        self.sensitivity_level
    }

    /// Set the sensitivity level; values outside 1..=10 are rejected
    pub fn set_sensitivity(&mut self, level: i64) -> bool {
        match u8::try_from(level) {
            Ok(level) if (MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&level) => {
                self.sensitivity_level = level;
                true
            }
            _ => {
                warn!(
                    "Rejected sensitivity level {}: must be between {} and {}",
                    level, MIN_SENSITIVITY, MAX_SENSITIVITY
                );
                false
            }
        }
    }

    /// Add an access code; returns false if it is too short or already present
    pub fn add_access_code(&mut self, code: impl Into<String>) -> bool {
        let code = code.into();
        if code.chars().count() < MIN_ACCESS_CODE_LEN {
            warn!(
                "Rejected access code: must be at least {} characters",
                MIN_ACCESS_CODE_LEN
            );
            return false;
        }
        self.access_codes.insert(code)
    }

    pub fn remove_access_code(&mut self, code: &str) -> bool {
        self.access_codes.shift_remove(code)
    }

    pub fn check_access_code(&self, code: &str) -> bool {
        self.access_codes.contains(code)
    }

    /// Access codes in insertion order
    pub fn access_codes(&self) -> impl Iterator<Item = &str> {
        self.access_codes.iter().map(String::as_str)
    }

    pub fn access_code_count(&self) -> usize {
        self.access_codes.len()
    }

    /// Drop every access code, including the default one
    pub fn clear_access_codes(&mut self) {
        self.access_codes.clear();
    }

    /// Disarm and clear the motion flag
    pub fn disarm(&mut self) {
        self.is_armed = false;
        self.motion_detected = false;
    }

    /// Efficiency multiplier: armed devices draw more, scaled by sensitivity
    pub fn efficiency_factor(&self) -> f64 {
        let armed = if self.is_armed { 1.5 } else { 1.0 };
        armed * f64::from(self.sensitivity_level) / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = SecurityState::default();
        assert!(!state.is_armed);
        assert_eq!(state.sensitivity_level(), 5);
        assert!(state.check_access_code("0000"));
        assert_eq!(state.access_code_count(), 1);
    }

    #[test]
    fn test_sensitivity_range() {
        let mut state = SecurityState::default();
        assert!(state.set_sensitivity(1));
        assert!(state.set_sensitivity(10));
        assert!(!state.set_sensitivity(0));
        assert!(!state.set_sensitivity(11));
        assert!(!state.set_sensitivity(-3));
        assert_eq!(state.sensitivity_level(), 10);
    }

    #[test]
    fn test_access_codes() {
        let mut state = SecurityState::default();
        assert!(!state.add_access_code("123"));
        assert!(state.add_access_code("1234"));
        assert!(!state.add_access_code("1234"));
        assert_eq!(state.access_codes().collect::<Vec<_>>(), vec!["0000", "1234"]);

        assert!(state.remove_access_code("0000"));
        assert!(!state.check_access_code("0000"));

        state.clear_access_codes();
        assert_eq!(state.access_code_count(), 0);
    }
}
