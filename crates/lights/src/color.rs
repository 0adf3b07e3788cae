//! Color conversion between bridge and hub representations.

/// Converts a bridge hue/sat/bri triple to 8-bit RGB.
///
/// `hue` spans the full wheel over 0-65535; `sat` and `bri` are on the
/// bridge's 0-254 scale and are clamped to it.
pub fn hsv_to_rgb(hue: u16, sat: u8, bri: u8) -> [u8; 3] {
    let h = f64::from(hue) / f64::from(u16::MAX) * 360.0;
    let s = (f64::from(sat) / 254.0).min(1.0);
    let v = (f64::from(bri) / 254.0).min(1.0);

    let c = v * s;
    let sector = (h / 60.0) % 6.0;
    let x = c * (1.0 - ((sector % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match sector as u8 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [to_byte(r + m), to_byte(g + m), to_byte(b + m)]
}

fn to_byte(channel: f64) -> u8 {
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}
