//! CSS color strings to RGBA bytes for legend swatches.

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(...)`, `rgba(...)` and a few names.
/// Returns `None` for anything else (including expressions).
pub fn parse_css_color(input: &str) -> Option<[u8; 4]> {
    let s = input.trim().to_ascii_lowercase();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(body) = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |part: &str| part.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
        let alpha = match parts.get(3) {
            Some(a) => (a.parse::<f64>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
            None => 255,
        };
        return Some([channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha]);
    }

    match s.as_str() {
        "transparent" => Some([0, 0, 0, 0]),
        "black" => Some([0, 0, 0, 255]),
        "white" => Some([255, 255, 255, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 128, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        "orange" => Some([255, 165, 0, 255]),
        "purple" => Some([128, 0, 128, 255]),
        "gray" | "grey" => Some([128, 128, 128, 255]),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    let nibble = |c: char| c.to_digit(16).map(|d| d as u8);
    let chars: Vec<char> = hex.chars().collect();
    match chars.len() {
        3 => {
            let r = nibble(chars[0])?;
            let g = nibble(chars[1])?;
            let b = nibble(chars[2])?;
            Some([r * 17, g * 17, b * 17, 255])
        }
        6 | 8 => {
            let byte = |i: usize| Some(nibble(chars[i])? * 16 + nibble(chars[i + 1])?);
            let alpha = if chars.len() == 8 { byte(6)? } else { 255 };
            Some([byte(0)?, byte(2)?, byte(4)?, alpha])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_css_color("#fff"), Some([255, 255, 255, 255]));
        assert_eq!(parse_css_color("#1a2B3c"), Some([0x1a, 0x2b, 0x3c, 255]));
        assert_eq!(parse_css_color("#00000080"), Some([0, 0, 0, 0x80]));
        assert_eq!(parse_css_color("#12345"), None);
    }

    #[test]
    fn test_functional_colors() {
        assert_eq!(parse_css_color("rgb(0,28,58)"), Some([0, 28, 58, 255]));
        assert_eq!(parse_css_color("rgba(0, 0, 0, 0)"), Some([0, 0, 0, 0]));
        assert_eq!(parse_css_color("rgba(90,185,255,0.5)"), Some([90, 185, 255, 128]));
        assert_eq!(parse_css_color("rgb(1,2)"), None);
    }

    #[test]
    fn test_named_and_unknown() {
        assert_eq!(parse_css_color("Transparent"), Some([0, 0, 0, 0]));
        assert_eq!(parse_css_color("hsl(0, 50%, 50%)"), None);
    }
}
