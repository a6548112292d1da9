use std::path::{Path, PathBuf};

use serde::Deserialize;

// --- Config ---

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub color_file: Option<String>,
    pub font: Option<String>,
    pub label_size: f32,
    pub day_size: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color_file: Some("~/.cache/wal/colors-almanac.toml".into()),
            font: None,
            label_size: 20.0,
            day_size: 15.0,
        }
    }
}

pub fn load_config() -> Config {
    load_config_from(&config_dir().join("almanac.toml"))
}

fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(s) => match toml::from_str(&s) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("failed to parse {}: {e}", path.display());
                Config::default()
            }
        },
        Err(_) => Config::default(),
    }
}

fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home().join(".config"));
    base.join("widgets")
}

fn home() -> PathBuf {
    std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default()
}

pub fn expand_path(p: &str) -> PathBuf {
    if let Some(rest) = p.strip_prefix("~/") {
        home().join(rest)
    } else {
        PathBuf::from(p)
    }
}

// --- Colors ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colors {
    pub background: [u8; 3],
    pub background_alpha: u8,
    pub border: [u8; 3],
    pub text: [u8; 3],
    pub dim: [u8; 3],
    pub accent: [u8; 3],
    pub today: [u8; 3],
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            background: [0x1e, 0x1e, 0x2e],
            background_alpha: 0xe6, // ~0.9
            border: [0xcd, 0xd6, 0xf4],
            text: [0xcd, 0xd6, 0xf4],
            dim: [0x6c, 0x70, 0x86],
            accent: [0x89, 0xb4, 0xfa],
            today: [0xf9, 0xe2, 0xaf],
        }
    }
}

fn parse_hex(s: &str) -> Option<[u8; 3]> {
    let s = s.trim_matches('"');
    let s = s.strip_prefix('#').unwrap_or(s);
    if s.len() != 6 || !s.is_ascii() { return None; }
    Some([u8::from_str_radix(&s[0..2], 16).ok()?,
          u8::from_str_radix(&s[2..4], 16).ok()?,
          u8::from_str_radix(&s[4..6], 16).ok()?])
}

pub fn load_colors(path: Option<&str>) -> Colors {
    match path {
        Some(p) => parse_colors(&std::fs::read_to_string(expand_path(p)).unwrap_or_default()),
        None => Colors::default(),
    }
}

fn parse_colors(content: &str) -> Colors {
    let mut colors = Colors::default();
    for line in content.lines() {
        let Some((key, val)) = line.split_once('=') else { continue };
        let (key, val) = (key.trim(), val.trim());
        if key == "background_opacity" {
            if let Ok(f) = val.parse::<f32>() {
                colors.background_alpha = (f.clamp(0.0, 1.0) * 255.0) as u8;
            }
            continue;
        }
        let Some(c) = parse_hex(val) else { continue };
        match key {
            "background" => colors.background = c,
            "border" => colors.border = c,
            "text" => colors.text = c,
            "dim" => colors.dim = c,
            "accent" => colors.accent = c,
            "today" => colors.today = c,
            _ => {}
        }
    }
    colors
}
