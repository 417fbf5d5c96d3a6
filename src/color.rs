use serde::{Deserialize, Serialize};

/// RGBA color with floating point channels in linear space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl LinearColor {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_array(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for LinearColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for LinearColor {
    fn from(values: [f32; 4]) -> Self {
        Self::from_array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_round_trip() {
        let color = LinearColor::new(0.25, 0.5, 0.75, 1.0);
        assert_eq!(LinearColor::from_array(color.to_array()), color);
    }

    #[test]
    fn default_is_white() {
        assert_eq!(LinearColor::default(), LinearColor::WHITE);
    }
}
