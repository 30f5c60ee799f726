use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::mutation_config::MutateConfig;

/// a translucent filled circle. center may lie outside the canvas, it gets clipped at render time.
/// alpha is a blend weight (0..=255), not a stored alpha channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub x: i32,
    pub y: i32,
    pub radius: u32,
    pub alpha: u8,
    pub rgb: [u8; 3],
}

impl Circle {
    pub fn new(x: i32, y: i32, radius: u32, alpha: u8, rgb: [u8; 3]) -> Self {
        Self { x, y, radius, alpha, rgb }
    }

    /// uniformly random circle: center in [0,w)x[0,h), radius/alpha within the configured bounds
    pub fn random<R: Rng>(rng: &mut R, width: u32, height: u32, cfg: &MutateConfig) -> Self {
        profiling::scope!("Circle::random");
        Self {
            x: rng.random_range(0..width.max(1)) as i32,
            y: rng.random_range(0..height.max(1)) as i32,
            radius: rng.random_range(cfg.radius_min..=cfg.radius_max),
            alpha: rng.random_range(cfg.alpha_min..=cfg.alpha_max),
            rgb: [rng.random(), rng.random(), rng.random()],
        }
    }

    /// horizontal half-width of the scanline at row `y`, or None if the row misses the circle.
    /// stepped approximation: floor(sqrt(r^2 - dy^2)), no antialiasing.
    #[inline]
    pub fn half_width(&self, y: i64) -> Option<i64> {
        // i128: a u32 radius squared does not fit in i64
        let r = self.radius as i128;
        let dy = y as i128 - self.y as i128;
        let rem = r * r - dy * dy;
        if rem < 0 {
            return None;
        }
        Some((rem as f64).sqrt() as i64)
    }
}

/// ordered circles, painter's order: later circles cover earlier ones.
/// plain Vec of Copy values, so cloning a set never aliases another set's storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleSet {
    pub circles: Vec<Circle>,
}

impl CircleSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.circles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    pub fn push(&mut self, circle: Circle) {
        self.circles.push(circle);
    }

    /// remove the circle at `index`, keeping the order of the rest. None if out of range.
    pub fn remove(&mut self, index: usize) -> Option<Circle> {
        if index < self.circles.len() {
            Some(self.circles.remove(index))
        } else {
            None
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Circle> {
        self.circles.iter()
    }
}

impl From<Vec<Circle>> for CircleSet {
    fn from(circles: Vec<Circle>) -> Self {
        Self { circles }
    }
}

impl<'a> IntoIterator for &'a CircleSet {
    type Item = &'a Circle;
    type IntoIter = std::slice::Iter<'a, Circle>;

    fn into_iter(self) -> Self::IntoIter {
        self.circles.iter()
    }
}
