const ONE_THIRD: f64 = 1.0 / 3.0;
const ONE_SIXTH: f64 = 1.0 / 6.0;
const TWO_THIRDS: f64 = 2.0 / 3.0;

pub const START_HUE: f64 = 0.0;
pub const HUE_INCREMENT: f64 = 0.1;
pub const SATURATION: f64 = 1.0;
pub const LIGHTNESS: f64 = 0.5;
pub const TEXT_COLOR: &str = "#000000";

/// Hue in `[0.0, 1.0)`, derived only from the row index.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Hue(f64);

impl Hue {
    pub fn for_index(index: usize) -> Self {
        Hue((START_HUE + HUE_INCREMENT * index as f64) % 1.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fill color of a record: full saturation, medium lightness.
    pub fn fill_color(&self) -> String {
        hsl_to_hex(self.0, SATURATION, LIGHTNESS)
    }
}

/// HSL to `#rrggbb`. Channels are truncated, not rounded, after scaling to 255.
pub fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
    let (r, g, b) = hsl_to_rgb(hue, saturation, lightness);
    format!(
        "#{:02x}{:02x}{:02x}",
        channel_to_byte(r),
        channel_to_byte(g),
        channel_to_byte(b)
    )
}

fn channel_to_byte(channel: f64) -> u8 {
    (channel * 255.0) as u8
}

pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (f64, f64, f64) {
    if saturation == 0.0 {
        return (lightness, lightness, lightness);
    }

    let m2 = if lightness <= 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - (lightness * saturation)
    };
    let m1 = 2.0 * lightness - m2;

    (
        hue_to_channel(m1, m2, hue + ONE_THIRD),
        hue_to_channel(m1, m2, hue),
        hue_to_channel(m1, m2, hue - ONE_THIRD),
    )
}

fn hue_to_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < ONE_SIXTH {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < TWO_THIRDS {
        m1 + (m2 - m1) * (TWO_THIRDS - hue) * 6.0
    } else {
        m1
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn test_hue_advances_by_tenth_and_wraps() {
        assert_eq!(Hue::for_index(0).value(), 0.0);
        assert_eq!(Hue::for_index(1).value(), 0.1);
        assert_eq!(Hue::for_index(5).value(), 0.5);
        assert_eq!(Hue::for_index(10), Hue::for_index(0));
        assert_eq!(Hue::for_index(20), Hue::for_index(0));
    }

    #[test]
    fn test_hue_stays_in_unit_interval() {
        for index in 0..1000 {
            let hue = Hue::for_index(index).value();
            assert!((0.0..1.0).contains(&hue), "hue {} out of range at {}", hue, index);
        }
    }

    #[test]
    fn test_fill_colors_for_first_ten_rows() {
        let expected = [
            "#ff0000", "#ff9900", "#cbff00", "#32ff00", "#00ff66", "#00feff", "#0065ff",
            "#3300ff", "#cb00ff", "#ff0098",
        ];
        for (index, color) in expected.iter().enumerate() {
            assert_eq!(&Hue::for_index(index).fill_color(), color, "row {}", index);
        }
    }

    #[test]
    fn test_fill_color_format() {
        let pattern = Regex::new("^#[0-9a-f]{6}$").unwrap();
        for index in 0..100 {
            let color = Hue::for_index(index).fill_color();
            assert!(pattern.is_match(&color), "{} is not #rrggbb", color);
        }
    }

    #[test]
    fn test_greyscale_when_unsaturated() {
        assert_eq!(hsl_to_hex(0.3, 0.0, 0.0), "#000000");
        assert_eq!(hsl_to_hex(0.3, 0.0, 1.0), "#ffffff");
    }

    #[test]
    fn test_light_colors_use_upper_branch() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.75), (1.0, 0.5, 0.5));
    }
}
