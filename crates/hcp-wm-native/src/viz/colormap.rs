//! Diverging "cold-hot" colormap
//!
//! Negative values run from black through blue to cyan, positive values
//! from black through red to yellow. Zero is black. Values beyond the
//! saturation bound are clipped.

/// RGB triple
pub type Rgb = [u8; 3];

/// Color for vertices without a region
pub const UNASSIGNED: Rgb = [128, 128, 128];

/// Symmetric cold-hot colormap over `[-vmax, vmax]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColdHot {
    vmax: f64,
}

impl ColdHot {
    /// Colormap saturating at `±vmax`
    ///
    /// A non-positive or non-finite bound is replaced by 1.
    #[must_use]
    pub fn new(vmax: f64) -> Self {
        let vmax = if vmax.is_finite() && vmax > 0.0 { vmax } else { 1.0 };
        Self { vmax }
    }

    /// Bound fitted to the largest magnitude in `values`
    #[must_use]
    pub fn fitted(values: &[f64]) -> Self {
        Self::new(values.iter().filter(|v| v.is_finite()).fold(0.0f64, |m, v| m.max(v.abs())))
    }

    /// Saturation bound
    #[must_use]
    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    /// Position of `value` on the map in [0, 1]
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        (0.5 + value / (2.0 * self.vmax)).clamp(0.0, 1.0)
    }

    /// Color for `value`; NaN maps to [`UNASSIGNED`]
    #[must_use]
    pub fn sample(&self, value: f64) -> Rgb {
        if value.is_nan() {
            return UNASSIGNED;
        }
        let t = self.normalize(value);
        if t >= 0.5 {
            hot((t - 0.5) * 2.0)
        } else {
            let [r, g, b] = hot((0.5 - t) * 2.0);
            [b, g, r]
        }
    }
}

/// Black → red → yellow over s in [0, 1]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hot(s: f64) -> Rgb {
    let channel = |offset: f64| ((s * 2.0 - offset).clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(0.0), channel(1.0), 0]
}

/// `#rrggbb`
#[must_use]
pub fn to_hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}
