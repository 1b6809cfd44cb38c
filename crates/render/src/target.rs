/// Number of concentric rings drawn around the target.
pub const RING_COUNT: usize = 10;

/// Overlay drawn around the camera target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDisplay {
    rings_enabled: bool,
    ring_size: i32,
}

impl Default for TargetDisplay {
    fn default() -> Self {
        Self {
            rings_enabled: false,
            ring_size: 1,
        }
    }
}

impl TargetDisplay {
    pub fn enable_rings(&mut self, enabled: bool) {
        self.rings_enabled = enabled;
    }

    /// Rings are drawn `10^n` metres apart.
    pub fn set_ring_size(&mut self, n: i32) {
        self.ring_size = n;
    }

    pub fn rings_enabled(&self) -> bool {
        self.rings_enabled
    }

    pub fn ring_size(&self) -> i32 {
        self.ring_size
    }

    /// Spacing between rings in metres.
    pub fn ring_spacing(&self) -> f64 {
        10f64.powi(self.ring_size)
    }

    /// Radii of the rings to draw; empty when disabled.
    pub fn ring_radii(&self) -> Vec<f64> {
        if !self.rings_enabled {
            return Vec::new();
        }
        let spacing = self.ring_spacing();
        (1..=RING_COUNT).map(|k| k as f64 * spacing).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_by_default() {
        let target = TargetDisplay::default();
        assert!(!target.rings_enabled());
        assert!(target.ring_radii().is_empty());
    }

    #[test]
    fn ring_size_is_decimal_exponent() {
        let mut target = TargetDisplay::default();
        target.enable_rings(true);
        target.set_ring_size(0);
        assert_eq!(target.ring_radii()[..3], [1.0, 2.0, 3.0]);
        target.set_ring_size(2);
        assert_eq!(target.ring_radii()[0], 100.0);
        assert_eq!(target.ring_radii().len(), RING_COUNT);
    }
}
