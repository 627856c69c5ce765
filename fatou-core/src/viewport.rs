use serde::{Deserialize, Serialize};

/// Complex number in f64 precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Component-wise (Hadamard) product, used to scale a unit offset by a
    /// per-axis zoom.
    pub fn hadamard(&self, other: Complex) -> Complex {
        Complex::new(self.re * other.re, self.im * other.im)
    }
}

impl std::ops::Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

/// Logical viewport of a fractal: center position plus horizontal zoom.
///
/// `zoom` is the half-width of the visible region in fractal space; the
/// vertical extent follows the output aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub position: Complex,
    pub zoom: f64,
}

impl View {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self {
            position: Complex::new(x, y),
            zoom,
        }
    }

    /// Per-axis zoom handed to samplers: `(zoom, zoom * aspect)` where
    /// `aspect` is height over width.
    pub fn zoom_factor(&self, aspect: f64) -> Complex {
        Complex::new(self.zoom, self.zoom * aspect)
    }

    /// Zoom depth as a base-2 exponent, for display.
    pub fn zoom_log2(&self) -> f64 {
        self.zoom.log2()
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_factor_follows_aspect() {
        let view = View::new(-0.5, 0.0, 2.0);
        let z = view.zoom_factor(0.5);
        assert_eq!(z, Complex::new(2.0, 1.0));
    }

    #[test]
    fn hadamard_and_add() {
        let a = Complex::new(2.0, 3.0);
        let b = Complex::new(0.5, -1.0);
        assert_eq!(a.hadamard(b), Complex::new(1.0, -3.0));
        assert_eq!(a + b, Complex::new(2.5, 2.0));
    }

    #[test]
    fn zoom_log2() {
        let view = View::new(0.0, 0.0, 2f64.powf(-22.0));
        assert!((view.zoom_log2() + 22.0).abs() < 1e-9);
    }

    #[test]
    fn view_serialization_roundtrip() {
        let original = View::new(-0.743643887037158, 0.131825904205311, 2f64.powi(-32));
        let json = serde_json::to_string(&original).unwrap();
        let restored: View = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }
}
