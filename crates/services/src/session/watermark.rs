use proctor_core::model::Identity;

const GRID: usize = 5;
const FIRST_OFFSET_PCT: f32 = 10.0;
const STEP_PCT: f32 = 20.0;

/// One repetition of the watermark text, positioned by percentage of the
/// viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkTile {
    pub top_pct: f32,
    pub left_pct: f32,
}

/// Tiled identity overlay drawn above the test content.
///
/// Pure data; the view layer decides how to draw it but must keep it
/// non-interactive.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkLayout {
    pub text: String,
    pub tiles: Vec<WatermarkTile>,
    pub rotation_deg: f32,
    pub opacity: f32,
}

impl WatermarkLayout {
    pub const ROTATION_DEG: f32 = -20.0;
    pub const OPACITY: f32 = 0.25;

    #[must_use]
    pub fn for_identity(identity: &Identity) -> Self {
        Self::with_text(identity.watermark_text())
    }

    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut tiles = Vec::with_capacity(GRID * GRID);
        for row in 0..GRID {
            for col in 0..GRID {
                tiles.push(WatermarkTile {
                    top_pct: FIRST_OFFSET_PCT + STEP_PCT * row as f32,
                    left_pct: FIRST_OFFSET_PCT + STEP_PCT * col as f32,
                });
            }
        }
        Self {
            text: text.into(),
            tiles,
            rotation_deg: Self::ROTATION_DEG,
            opacity: Self::OPACITY,
        }
    }
}
