use anyhow::Result;
use ratatui::style::Color;
use ratatui::widgets::BorderType;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::config_dir;

pub fn hex_to_color(hex: &str) -> Color {
    let h = hex.trim_start_matches('#');
    if h.len() != 6 || !h.is_ascii() { return Color::Reset; }
    let r = u8::from_str_radix(&h[0..2], 16).unwrap_or(0);
    let g = u8::from_str_radix(&h[2..4], 16).unwrap_or(0);
    let b = u8::from_str_radix(&h[4..6], 16).unwrap_or(0);
    Color::Rgb(r, g, b)
}

fn default_border_style() -> String { "rounded".to_owned() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    // Backgrounds
    pub background: String, pub status_bar: String, pub popup: String,
    // Borders
    pub border: String, pub border_focus: String,
    // Text
    pub text: String, pub text_dim: String, pub accent: String,
    // Selection
    pub selected_bg: String, pub selected_fg: String,
    // Dashboard
    pub bookings_bar: String, pub revenue_fg: String,
    pub warning: String, pub error: String,
    /// "rounded" | "double" | "thick" | "plain"
    #[serde(default = "default_border_style")]
    pub border_style: String,
}

impl Theme {
    pub fn bg(&self)            -> Color { hex_to_color(&self.background) }
    pub fn bar_bg(&self)        -> Color { hex_to_color(&self.status_bar) }
    pub fn popup_bg(&self)      -> Color { hex_to_color(&self.popup) }
    pub fn border(&self)        -> Color { hex_to_color(&self.border) }
    pub fn border_active(&self) -> Color { hex_to_color(&self.border_focus) }
    pub fn fg(&self)            -> Color { hex_to_color(&self.text) }
    pub fn fg_dim(&self)        -> Color { hex_to_color(&self.text_dim) }
    pub fn accent(&self)        -> Color { hex_to_color(&self.accent) }
    pub fn bookings(&self)      -> Color { hex_to_color(&self.bookings_bar) }
    pub fn revenue(&self)       -> Color { hex_to_color(&self.revenue_fg) }
    pub fn warning(&self)       -> Color { hex_to_color(&self.warning) }
    pub fn error(&self)         -> Color { hex_to_color(&self.error) }

    pub fn selected_highlight(&self) -> (Color, Color) {
        (hex_to_color(&self.selected_bg), hex_to_color(&self.selected_fg))
    }

    pub fn border_type(&self) -> BorderType {
        match self.border_style.as_str() {
            "double" => BorderType::Double,
            "thick"  => BorderType::Thick,
            "plain"  => BorderType::Plain,
            _        => BorderType::Rounded,
        }
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir().join("theme.toml"))
    }

    /// Writes the default theme the first time so users have a file to edit.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            Ok(toml::from_str(&std::fs::read_to_string(path)?)?)
        } else {
            let t = Theme::default();
            t.save_to(path)?;
            Ok(t)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir().join("theme.toml"))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    // ── Built-in themes ───────────────────────────────────────────────────────

    pub fn all_themes() -> Vec<Theme> {
        vec![Theme::default(), Theme::paper(), Theme::lagoon()]
    }

    /// Light theme for bright terminals.
    pub fn paper() -> Self { Self {
        name: "paper".into(),
        background: "#fafafa".into(), status_bar: "#eeeeee".into(), popup: "#ffffff".into(),
        border: "#c0c0c0".into(), border_focus: "#1565c0".into(),
        text: "#212121".into(), text_dim: "#757575".into(), accent: "#1565c0".into(),
        selected_bg: "#1565c0".into(), selected_fg: "#ffffff".into(),
        bookings_bar: "#2e7d32".into(), revenue_fg: "#ef6c00".into(),
        warning: "#f9a825".into(), error: "#c62828".into(),
        border_style: "plain".into(),
    }}

    pub fn lagoon() -> Self { Self {
        name: "lagoon".into(),
        background: "#0b1d26".into(), status_bar: "#081419".into(), popup: "#12303d".into(),
        border: "#1f4a5a".into(), border_focus: "#4dd0e1".into(),
        text: "#e0f7fa".into(), text_dim: "#5f8a96".into(), accent: "#4dd0e1".into(),
        selected_bg: "#4dd0e1".into(), selected_fg: "#0b1d26".into(),
        bookings_bar: "#80cbc4".into(), revenue_fg: "#ffcc80".into(),
        warning: "#ffd54f".into(), error: "#ef5350".into(),
        border_style: "rounded".into(),
    }}
}

impl Default for Theme {
    fn default() -> Self { Self {
        name: "dusk".into(),
        background: "#1e1e2e".into(), status_bar: "#181825".into(), popup: "#313244".into(),
        border: "#45475a".into(), border_focus: "#89b4fa".into(),
        text: "#cdd6f4".into(), text_dim: "#6c7086".into(), accent: "#89b4fa".into(),
        selected_bg: "#89b4fa".into(), selected_fg: "#1e1e2e".into(),
        bookings_bar: "#a6e3a1".into(), revenue_fg: "#fab387".into(),
        warning: "#f9e2af".into(), error: "#f38ba8".into(),
        border_style: "rounded".into(),
    }}
}
