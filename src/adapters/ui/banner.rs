//! Welcome banner: HEALTHVAL in figlet's standard font, shaded teal to blue.

use crossterm::QueueableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{self, Write, stdout};

const TITLE: &str = "HEALTHVAL";
const TAGLINE: &str = "DCF · Comparables · VC Method for digital health";

/// Clinical Teal (#00b3a4).
const CLINICAL_TEAL: Color = Color::Rgb {
    r: 0x00,
    g: 0xb3,
    b: 0xa4,
};
/// Pulse Blue (#2e86ab).
const PULSE_BLUE: Color = Color::Rgb {
    r: 0x2e,
    g: 0x86,
    b: 0xab,
};

/// `steps` colors evenly spaced from `from` to `to`, both ends included.
/// Non-RGB colors are returned unchanged.
fn gradient(from: Color, to: Color, steps: usize) -> Vec<Color> {
    let ((r0, g0, b0), (r1, g1, b1)) = match (from, to) {
        (Color::Rgb { r, g, b }, Color::Rgb { r: r1, g: g1, b: b1 }) => ((r, g, b), (r1, g1, b1)),
        _ => return vec![from; steps],
    };
    let channel = |a: u8, b: u8, t: f64| {
        (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
    };
    (0..steps)
        .map(|i| {
            let t = if steps > 1 {
                i as f64 / (steps - 1) as f64
            } else {
                1.0
            };
            Color::Rgb {
                r: channel(r0, r1, t),
                g: channel(g0, g1, t),
                b: channel(b0, b1, t),
            }
        })
        .collect()
}

/// ASCII art for the title, or the plain title if the font cannot render it.
fn title_art() -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert(TITLE).map(|fig| fig.to_string()))
        .unwrap_or_else(|| TITLE.to_string())
}

fn write_banner(out: &mut impl Write) -> io::Result<()> {
    let art = title_art();
    let lines: Vec<&str> = art.lines().filter(|l| !l.trim().is_empty()).collect();
    for (line, color) in lines.iter().zip(gradient(CLINICAL_TEAL, PULSE_BLUE, lines.len())) {
        out.queue(SetForegroundColor(color))?
            .queue(Print(line))?
            .queue(Print("\r\n"))?;
    }
    out.queue(SetForegroundColor(CLINICAL_TEAL))?
        .queue(Print(format!("v{}\r\n", env!("CARGO_PKG_VERSION"))))?
        .queue(Print(format!("{}\r\n", TAGLINE)))?
        .queue(ResetColor)?;
    out.flush()
}

/// Prints the welcome banner. Terminal write errors are ignored.
pub fn print_welcome() {
    let _ = write_banner(&mut stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints() {
        let shades = gradient(CLINICAL_TEAL, PULSE_BLUE, 6);
        assert_eq!(shades.len(), 6);
        assert_eq!(shades.first(), Some(&CLINICAL_TEAL));
        assert_eq!(shades.last(), Some(&PULSE_BLUE));
        assert_eq!(gradient(CLINICAL_TEAL, PULSE_BLUE, 1), vec![PULSE_BLUE]);
    }

    #[test]
    fn test_banner_contains_version_and_tagline() {
        let mut buf = Vec::new();
        write_banner(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains(env!("CARGO_PKG_VERSION")));
        assert!(text.contains(TAGLINE));
    }
}
