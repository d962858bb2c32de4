use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Palette choice, persisted in the preferences file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColorScheme {
    /// Dark matte surface with the blue accent
    #[default]
    Matte,
    /// Light grey surface, closest to the web client
    Light,
}

impl ColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Matte => "Matte",
            ColorScheme::Light => "Light",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ColorScheme::Matte => ColorScheme::Light,
            ColorScheme::Light => ColorScheme::Matte,
        }
    }
}

pub struct ThemeColors {
    pub primary: Color,
    pub accent: Color,
    pub text: Color,
    pub text_dim: Color,
    pub background: Color,
    pub border: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub highlight_bg: Color,
}

pub fn theme_colors(scheme: ColorScheme) -> ThemeColors {
    match scheme {
        ColorScheme::Matte => ThemeColors {
            primary: Color::Rgb(232, 232, 232),
            accent: Color::Rgb(74, 144, 226),
            text: Color::Rgb(232, 232, 232),
            text_dim: Color::Rgb(158, 158, 158),
            background: Color::Rgb(42, 42, 42),
            border: Color::Rgb(139, 139, 139),
            success: Color::Rgb(39, 174, 96),
            warning: Color::Rgb(241, 196, 15),
            error: Color::Rgb(231, 76, 60),
            highlight_bg: Color::Rgb(60, 60, 64),
        },

        ColorScheme::Light => ThemeColors {
            primary: Color::Rgb(26, 26, 26),
            accent: Color::Rgb(74, 144, 226),
            text: Color::Rgb(26, 26, 26),
            text_dim: Color::Rgb(110, 110, 110),
            background: Color::Rgb(232, 232, 232),
            border: Color::Rgb(208, 208, 208),
            success: Color::Rgb(39, 174, 96),
            warning: Color::Rgb(200, 150, 0),
            error: Color::Rgb(231, 76, 60),
            highlight_bg: Color::Rgb(214, 228, 245),
        },
    }
}
