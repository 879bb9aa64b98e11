//! Clock-face tray icon rendering
//!
//! Rasterizes an analog clock face (hour hand, minute hand, center dot)
//! onto a small RGBA canvas for the system tray.

use tray_icon::Icon;

/// Icon canvas edge length in pixels
pub const ICON_SIZE: u32 = 128;

const CENTER: f32 = ICON_SIZE as f32 / 2.0;
const RADIUS: f32 = 60.0;

/// Hour hand: shorter and thicker
const HOUR_HAND_LENGTH: f32 = RADIUS * 0.6;
const HOUR_HAND_WIDTH: f32 = 10.0;

/// Minute hand: longer and thinner
const MINUTE_HAND_LENGTH: f32 = RADIUS * 0.85;
const MINUTE_HAND_WIDTH: f32 = 6.0;

const CENTER_DOT_RADIUS: f32 = 4.0;

/// White, used when the persisted color is missing or unparsable
pub const FALLBACK_COLOR: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Build the tray icon for the given wall-clock time
pub fn clock_face_icon(hours: u32, minutes: u32, color: [u8; 3]) -> anyhow::Result<Icon> {
    let rgba = render_clock_face(hours, minutes, color);
    Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE)
        .map_err(|e| anyhow::anyhow!("Failed to create icon: {}", e))
}

/// Hand angles in radians for the given time. Zero points right; the
/// offset by a quarter turn starts both hands at 12 o'clock. The hour
/// hand advances continuously with the minutes.
pub fn hand_angles(hours: u32, minutes: u32) -> (f32, f32) {
    let minute_angle =
        (minutes as f32 / 60.0) * std::f32::consts::TAU - std::f32::consts::FRAC_PI_2;
    let hour_angle = (((hours % 12) as f32 + minutes as f32 / 60.0) / 12.0)
        * std::f32::consts::TAU
        - std::f32::consts::FRAC_PI_2;
    (hour_angle, minute_angle)
}

/// Render the clock face as tightly packed RGBA bytes
pub fn render_clock_face(hours: u32, minutes: u32, color: [u8; 3]) -> Vec<u8> {
    let mut buf = vec![0u8; (ICON_SIZE * ICON_SIZE * 4) as usize];
    // Opaque black background
    for px in buf.chunks_exact_mut(4) {
        px[3] = 0xFF;
    }

    let (hour_angle, minute_angle) = hand_angles(hours, minutes);
    draw_hand(&mut buf, hour_angle, HOUR_HAND_LENGTH, HOUR_HAND_WIDTH, color);
    draw_hand(&mut buf, minute_angle, MINUTE_HAND_LENGTH, MINUTE_HAND_WIDTH, color);
    fill_disc(&mut buf, CENTER, CENTER, CENTER_DOT_RADIUS, color);

    buf
}

/// Parse a "#RRGGBB" color string
pub fn parse_icon_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    // Length alone is not enough: the value comes from a user-edited file
    // and multibyte text must not land in the slices below
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Draw a hand from the center outwards by stamping discs along the
/// segment, which also gives the rounded caps.
fn draw_hand(buf: &mut [u8], angle: f32, length: f32, width: f32, color: [u8; 3]) {
    let steps = length.ceil() as u32 * 2;
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = CENTER + angle.cos() * length * t;
        let y = CENTER + angle.sin() * length * t;
        fill_disc(buf, x, y, width / 2.0, color);
    }
}

fn fill_disc(buf: &mut [u8], cx: f32, cy: f32, radius: f32, color: [u8; 3]) {
    let min_x = ((cx - radius).floor().max(0.0)) as u32;
    let max_x = ((cx + radius).ceil().min(ICON_SIZE as f32 - 1.0)) as u32;
    let min_y = ((cy - radius).floor().max(0.0)) as u32;
    let max_y = ((cy + radius).ceil().min(ICON_SIZE as f32 - 1.0)) as u32;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= radius * radius {
                let idx = ((y * ICON_SIZE + x) * 4) as usize;
                buf[idx] = color[0];
                buf[idx + 1] = color[1];
                buf[idx + 2] = color[2];
                buf[idx + 3] = 0xFF;
            }
        }
    }
}
