use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Group palette
// ---------------------------------------------------------------------------

/// `n` colours running blue → cyan → green → yellow → red, like a jet colormap.
///
/// The first group is blue and the last red, so ascending group keys read as
/// a cold-to-hot ramp in the legend.
pub fn group_palette(n: usize) -> Vec<(u8, u8, u8)> {
    match n {
        0 => Vec::new(),
        1 => vec![hsl_to_rgb(240.0, 0.85, 0.5)],
        _ => (0..n)
            .map(|i| {
                let u = i as f32 / (n - 1) as f32;
                hsl_to_rgb(240.0 * (1.0 - u), 0.85, 0.5)
            })
            .collect(),
    }
}

/// Blend `rgb` towards black by `factor` (0 = unchanged, 1 = black).
pub fn dim((r, g, b): (u8, u8, u8), factor: f32) -> (u8, u8, u8) {
    let keep = (1.0 - factor).clamp(0.0, 1.0);
    (
        (r as f32 * keep).round() as u8,
        (g as f32 * keep).round() as u8,
        (b as f32 * keep).round() as u8,
    )
}

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> (u8, u8, u8) {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    (
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_runs_from_blue_to_red() {
        let colors = group_palette(3);
        assert_eq!(colors.len(), 3);

        let (r, _, b) = colors[0];
        assert!(b > 200 && r < 40, "first colour should be blue: {:?}", colors[0]);
        let (r, _, b) = colors[2];
        assert!(r > 200 && b < 40, "last colour should be red: {:?}", colors[2]);
    }

    #[test]
    fn dimming_scales_channels() {
        assert_eq!(dim((200, 100, 0), 0.5), (100, 50, 0));
        assert_eq!(dim((10, 20, 30), 0.0), (10, 20, 30));
    }
}
