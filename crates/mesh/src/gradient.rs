use serde::{Deserialize, Serialize};

/// Height-based color ramp used by the solid surface pass.
///
/// The vertical coordinate is mapped to `t = (z - min) / (max - min)`, clamped
/// to `[0, 1]`, and the color is `mix(low, high, t)`. The gradient shader
/// receives these values as uniforms, so [`HeightGradient::color_at`] matches
/// what ends up on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightGradient {
    pub min: f32,
    pub max: f32,
    pub low: [f32; 3],
    pub high: [f32; 3],
}

impl Default for HeightGradient {
    fn default() -> Self {
        Self {
            min: -2.0,
            max: 2.0,
            low: [0.0, 0.0, 1.0],
            high: [1.0, 0.0, 0.0],
        }
    }
}

impl HeightGradient {
    /// Interpolation factor for height `z`, clamped to the ramp.
    pub fn factor(&self, z: f32) -> f32 {
        let span = self.max - self.min;
        if span.abs() <= f32::EPSILON {
            return if z >= self.max { 1.0 } else { 0.0 };
        }
        ((z - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn color_at(&self, z: f32) -> [f32; 3] {
        let t = self.factor(z);
        [
            self.low[0] + (self.high[0] - self.low[0]) * t,
            self.low[1] + (self.high[1] - self.low[1]) * t,
            self.low[2] + (self.high[2] - self.low[2]) * t,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_map_to_endpoint_colors() {
        let g = HeightGradient::default();
        assert_eq!(g.color_at(-2.0), g.low);
        assert_eq!(g.color_at(2.0), g.high);
    }

    #[test]
    fn midpoint_is_an_even_mix() {
        let g = HeightGradient::default();
        assert_eq!(g.color_at(0.0), [0.5, 0.0, 0.5]);
    }

    #[test]
    fn out_of_range_clamps() {
        let g = HeightGradient::default();
        assert_eq!(g.color_at(-10.0), g.low);
        assert_eq!(g.color_at(7.5), g.high);
    }

    #[test]
    fn zero_span_does_not_divide_by_zero() {
        let g = HeightGradient {
            min: 1.0,
            max: 1.0,
            ..HeightGradient::default()
        };
        assert_eq!(g.factor(0.0), 0.0);
        assert_eq!(g.factor(1.0), 1.0);
    }
}
