use serde::{Deserialize, Serialize};

/// largest accepted radius, keeps r^2 exact in the scanline math
pub const MAX_RADIUS: u32 = 65_535;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutateConfig {
    // population
    pub population_size: usize, // candidates per generation (100 in the classic run)

    // mutation probabilities
    pub p_add: f64,      // chance a single edit appends a circle (otherwise it removes one)
    pub p_continue: f64, // chance to apply another edit after each one (geometric edit count)

    // new-circle bounds (inclusive)
    pub radius_min: u32,
    pub radius_max: u32,
    pub alpha_min: u8,
    pub alpha_max: u8,
}

impl Default for MutateConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            p_add: 0.5,
            p_continue: 0.5,
            radius_min: 1,
            radius_max: 50,
            alpha_min: 20,
            alpha_max: 119,
        }
    }
}

impl MutateConfig {
    /// check internal consistency, returns a human-readable reason on failure
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size == 0 {
            return Err("population_size must be at least 1".into());
        }
        if self.radius_min == 0 {
            return Err("radius_min must be positive".into());
        }
        if self.radius_min > self.radius_max {
            return Err(format!(
                "radius_min ({}) exceeds radius_max ({})",
                self.radius_min, self.radius_max
            ));
        }
        if self.radius_max > MAX_RADIUS {
            return Err(format!("radius_max ({}) exceeds {MAX_RADIUS}", self.radius_max));
        }
        if self.alpha_min > self.alpha_max {
            return Err(format!(
                "alpha_min ({}) exceeds alpha_max ({})",
                self.alpha_min, self.alpha_max
            ));
        }
        for (name, p) in [("p_add", self.p_add), ("p_continue", self.p_continue)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{name} must be within [0, 1], got {p}"));
            }
        }
        // p_continue == 1 would never terminate
        if self.p_continue >= 1.0 {
            return Err("p_continue must be below 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(MutateConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_bounds() {
        let cfg = MutateConfig { radius_min: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = MutateConfig { radius_min: 60, radius_max: 50, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = MutateConfig { alpha_min: 200, alpha_max: 100, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = MutateConfig { population_size: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_huge_radius() {
        let cfg = MutateConfig { radius_max: u32::MAX, ..Default::default() };
        assert!(cfg.validate().unwrap_err().contains("radius_max"));
        let cfg = MutateConfig { radius_max: MAX_RADIUS + 1, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = MutateConfig { radius_max: MAX_RADIUS, ..Default::default() };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_probabilities() {
        let cfg = MutateConfig { p_add: 1.5, ..Default::default() };
        assert!(cfg.validate().unwrap_err().contains("p_add"));
        let cfg = MutateConfig { p_continue: 1.0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
