use crate::config::Color;

/// The color of regions without usable data.
pub const NO_DATA_COLOR: Color = Color::rgb(0xd3, 0xd3, 0xd3);

/// Margin -1: every counted vote went to the Republican candidate.
pub const REPUBLICAN_COLOR: Color = Color::rgb(0xff, 0x00, 0x00);
/// Margin 0.
pub const TIED_COLOR: Color = Color::rgb(0x80, 0x00, 0x80);
/// Margin +1: every counted vote went to the Democratic candidate.
pub const DEMOCRAT_COLOR: Color = Color::rgb(0x00, 0x00, 0xff);

/// Maps a margin to the color of the region.
///
/// The scale is linear in RGB between red (-1), purple (0) and blue (+1).
/// Margins outside of [-1, 1] get the color of the closest end of the scale.
/// A missing margin (or NaN) is painted with `NO_DATA_COLOR`.
pub fn color_for(margin: Option<f64>) -> Color {
    match margin {
        Some(m) if !m.is_nan() => {
            let m = m.clamp(-1.0, 1.0);
            if m < 0.0 {
                interpolate(TIED_COLOR, REPUBLICAN_COLOR, -m)
            } else {
                interpolate(TIED_COLOR, DEMOCRAT_COLOR, m)
            }
        }
        _ => NO_DATA_COLOR,
    }
}

// t = 0 gives `from`, t = 1 gives `to`.
fn interpolate(from: Color, to: Color, t: f64) -> Color {
    let channel = |a: u8, b: u8| -> u8 {
        let x = (a as f64) + ((b as f64) - (a as f64)) * t;
        x.round().clamp(0.0, 255.0) as u8
    };
    Color {
        r: channel(from.r, to.r),
        g: channel(from.g, to.g),
        b: channel(from.b, to.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_points() {
        assert_eq!(color_for(Some(-1.0)), REPUBLICAN_COLOR);
        assert_eq!(color_for(Some(0.0)), TIED_COLOR);
        assert_eq!(color_for(Some(1.0)), DEMOCRAT_COLOR);
        assert_eq!(color_for(Some(-0.0)), TIED_COLOR);
    }

    #[test]
    fn midpoints() {
        assert_eq!(color_for(Some(0.5)), Color::rgb(64, 0, 192));
        assert_eq!(color_for(Some(-0.5)), Color::rgb(192, 0, 64));
    }

    #[test]
    fn clamping() {
        assert_eq!(color_for(Some(-5.0)), color_for(Some(-1.0)));
        assert_eq!(color_for(Some(5.0)), color_for(Some(1.0)));
        assert_eq!(color_for(Some(f64::INFINITY)), DEMOCRAT_COLOR);
        assert_eq!(color_for(Some(f64::NEG_INFINITY)), REPUBLICAN_COLOR);
    }

    #[test]
    fn no_data_is_not_on_the_scale() {
        assert_eq!(color_for(None), NO_DATA_COLOR);
        assert_eq!(color_for(Some(f64::NAN)), NO_DATA_COLOR);
        // The partisan scale never has any green.
        for i in -100..=100 {
            let c = color_for(Some(i as f64 / 100.0));
            assert_eq!(c.g, 0);
            assert_ne!(c, NO_DATA_COLOR);
        }
    }

    #[test]
    fn shift_follows_sign() {
        for i in 1..=100 {
            let m = i as f64 / 100.0;
            let blue = color_for(Some(m));
            assert!(blue.b > blue.r, "margin {} gives {}", m, blue);
            let red = color_for(Some(-m));
            assert!(red.r > red.b, "margin {} gives {}", -m, red);
        }
    }

    #[test]
    fn monotonic_and_idempotent() {
        let margins: Vec<f64> = (-20..=20).map(|i| i as f64 / 20.0).collect();
        for w in margins.windows(2) {
            let (c1, c2) = (color_for(Some(w[0])), color_for(Some(w[1])));
            assert!(c1.b <= c2.b && c1.r >= c2.r);
            let ratio = |c: Color| (c.b as f64 + 1.0) / (c.r as f64 + 1.0);
            assert!(ratio(c1) < ratio(c2), "{} -> {}, {} -> {}", w[0], c1, w[1], c2);
            assert_eq!(color_for(Some(w[0])), c1);
        }
    }

    #[test]
    fn hex_display() {
        assert_eq!(NO_DATA_COLOR.to_string(), "#d3d3d3");
        assert_eq!(TIED_COLOR.to_string(), "#800080");
    }
}
