/// A RGBA `Color`. Each color component is a floating point value
/// with a range from 0 to 1.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32, pub f32);

impl Color {
    pub fn white() -> Self {
        Color(1.0, 1.0, 1.0, 1.0)
    }

    pub fn black() -> Self {
        Color(0.0, 0.0, 0.0, 1.0)
    }

    pub fn transparent() -> Self {
        Color(0.0, 0.0, 0.0, 0.0)
    }

    /// Returns the RGB components, dropping alpha.
    pub fn rgb(&self) -> [f32; 3] {
        [self.0, self.1, self.2]
    }

    /// Clip to [0.0, 1.0] range.
    pub fn clip(&self) -> Color {
        Color(
            clamp(self.0),
            clamp(self.1),
            clamp(self.2),
            clamp(self.3),
        )
    }
}

impl From<[f32; 4]> for Color {
    fn from(v: [f32; 4]) -> Self {
        Color(v[0], v[1], v[2], v[3])
    }
}

impl From<[f32; 3]> for Color {
    fn from(v: [f32; 3]) -> Self {
        Color(v[0], v[1], v[2], 1.0)
    }
}

impl Into<[f32; 4]> for Color {
    fn into(self) -> [f32; 4] {
        [self.0, self.1, self.2, self.3]
    }
}

fn clamp(v: f32) -> f32 {
    v.max(0.0).min(1.0)
}
