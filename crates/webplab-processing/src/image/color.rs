use image::Rgba;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(hex: &str) -> Option<Rgba<u8>> {
    let digits = hex.trim().strip_prefix('#')?;
    if !digits.is_ascii() {
        return None;
    }

    let channels: Vec<u8> = match digits.len() {
        3 | 4 => digits
            .chars()
            .map(|c| c.to_digit(16).map(|v| (v * 17) as u8))
            .collect::<Option<_>>()?,
        6 | 8 => (0..digits.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
            .collect::<Option<_>>()?,
        _ => return None,
    };

    let alpha = channels.get(3).copied().unwrap_or(255);
    Some(Rgba([channels[0], channels[1], channels[2], alpha]))
}

/// Background for padding and rotation, transparent unless configured.
pub fn background_or_transparent(background: Option<&str>) -> Rgba<u8> {
    background.and_then(parse_hex_color).unwrap_or(TRANSPARENT)
}
