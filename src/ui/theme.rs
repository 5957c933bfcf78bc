//! Color palette and style helpers for the detail screen
//!
//! A warm "cinema" palette: amber titles on a near-black screen, with
//! gold stars and a red accent for selection.

use ratatui::style::{Color, Modifier, Style};

/// Palette and named styles
pub struct Theme;

impl Theme {
    // ═══════════════════════════════════════════════════════════════════════
    // PALETTE
    // ═══════════════════════════════════════════════════════════════════════

    /// Background: #0d0b0a (projection-room black)
    pub const BACKGROUND: Color = Color::Rgb(0x0d, 0x0b, 0x0a);

    /// Panel background: #1a1614
    pub const PANEL: Color = Color::Rgb(0x1a, 0x16, 0x14);

    /// Primary: #ffb347 (marquee amber)
    pub const PRIMARY: Color = Color::Rgb(0xff, 0xb3, 0x47);

    /// Accent: #e50914 (curtain red)
    pub const ACCENT: Color = Color::Rgb(0xe5, 0x09, 0x14);

    /// Star: #ffd700 (gold)
    pub const STAR: Color = Color::Rgb(0xff, 0xd7, 0x00);

    /// Text: #ece6e0
    pub const TEXT: Color = Color::Rgb(0xec, 0xe6, 0xe0);

    /// Dim: #8a7f78
    pub const DIM: Color = Color::Rgb(0x8a, 0x7f, 0x78);

    /// Border: #5c4a3a
    pub const BORDER: Color = Color::Rgb(0x5c, 0x4a, 0x3a);

    pub const BORDER_FOCUSED: Color = Self::PRIMARY;

    // ═══════════════════════════════════════════════════════════════════════
    // STYLES
    // ═══════════════════════════════════════════════════════════════════════

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT)
    }

    pub fn dimmed() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    pub fn border_focused() -> Style {
        Style::default()
            .fg(Self::BORDER_FOCUSED)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected list row
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::TEXT)
            .bg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn star() -> Style {
        Style::default().fg(Self::STAR)
    }

    pub fn star_empty() -> Style {
        Style::default().fg(Self::DIM)
    }

    /// Loading indicator for a collection still in flight
    pub fn loading() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::ITALIC)
    }

    /// Errors from actions the user triggered
    pub fn error() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn keybind() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::PANEL)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// COLOR UTILITIES
// ═══════════════════════════════════════════════════════════════════════════

/// WCAG relative luminance of an sRGB color
pub fn relative_luminance((r, g, b): (u8, u8, u8)) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Contrast ratio between two colors, 1.0 to 21.0
pub fn contrast_ratio(a: (u8, u8, u8), b: (u8, u8, u8)) -> f64 {
    let (la, lb) = (relative_luminance(a), relative_luminance(b));
    let (hi, lo) = if la > lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

pub fn color_to_rgb(color: Color) -> Option<(u8, u8, u8)> {
    match color {
        Color::Rgb(r, g, b) => Some((r, g, b)),
        _ => None,
    }
}
