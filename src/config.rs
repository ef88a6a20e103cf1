use crate::game::lines::generation::{DEFAULT_LINES_PER_MEASURE, DEFAULT_MAX_TIMING_LINES, LineSettings};
use crate::game::scroll::{ScrollDirection, ScrollOption};
use crate::game::timing::TRACK_ROUNDING;
use ini::Ini;
use log::{info, warn};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const CONFIG_PATH: &str = "linefield.ini";

// Mirrors the ITG playfield metrics on a 480px tall screen.
pub const SCREEN_HEIGHT: f32 = 480.0;
pub const RECEPTOR_Y_OFFSET_FROM_CENTER: f32 = -125.0;
pub const RECEPTOR_Y_OFFSET_FROM_CENTER_REVERSE: f32 = 145.0;
pub const DRAW_DISTANCE_BEFORE_TARGETS_MULTIPLIER: f32 = 1.5;

const DEFAULT_SCROLL_SPEED: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("'{other}' is not a valid LogLevel")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub log_level: LogLevel,
    /// Pixels per millisecond at 1.0x scroll velocity.
    pub scroll_speed: f32,
    pub scroll_option: ScrollOption,
    pub screen_height: f32,
    pub draw_distance_multiplier: f32,
    pub receptor_y_offset: f32,
    pub receptor_y_offset_reverse: f32,
    pub lines_per_measure: u32,
    pub max_timing_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            scroll_speed: DEFAULT_SCROLL_SPEED,
            scroll_option: ScrollOption::Normal,
            screen_height: SCREEN_HEIGHT,
            draw_distance_multiplier: DRAW_DISTANCE_BEFORE_TARGETS_MULTIPLIER,
            receptor_y_offset: RECEPTOR_Y_OFFSET_FROM_CENTER,
            receptor_y_offset_reverse: RECEPTOR_Y_OFFSET_FROM_CENTER_REVERSE,
            lines_per_measure: DEFAULT_LINES_PER_MEASURE,
            max_timing_lines: DEFAULT_MAX_TIMING_LINES,
        }
    }
}

impl Config {
    #[inline(always)]
    fn effective_scroll_speed(&self) -> f32 {
        if self.scroll_speed.is_finite() && self.scroll_speed > 0.0 {
            self.scroll_speed
        } else {
            DEFAULT_SCROLL_SPEED
        }
    }

    /// Screen distance drawn ahead of the receptors, in pixels.
    #[inline(always)]
    pub fn draw_distance(&self) -> f32 {
        self.screen_height * self.draw_distance_multiplier
    }

    /// Track distance equivalent of the draw distance at the configured speed.
    pub fn render_threshold(&self) -> i64 {
        let threshold = (self.draw_distance() * TRACK_ROUNDING / self.effective_scroll_speed()).ceil();
        if threshold.is_finite() { (threshold as i64).max(1) } else { 1 }
    }

    pub fn receptor_position(&self, direction: ScrollDirection) -> f32 {
        let center = self.screen_height * 0.5;
        match direction {
            ScrollDirection::Up => center + self.receptor_y_offset,
            ScrollDirection::Down => center + self.receptor_y_offset_reverse,
        }
    }

    #[inline(always)]
    pub fn line_settings(&self) -> LineSettings {
        LineSettings { lines_per_measure: self.lines_per_measure.max(1), max_lines: self.max_timing_lines }
    }

    pub fn from_ini(conf: &Ini) -> Self {
        for (section, key) in unknown_keys(conf) {
            warn!("Ignoring unknown key [{section}] {key}");
        }
        let default = Self::default();
        Self {
            log_level: read(conf, "Options", "LogLevel", default.log_level),
            scroll_speed: read_positive(conf, "Playfield", "ScrollSpeed", default.scroll_speed),
            scroll_option: read(conf, "Playfield", "ScrollOption", default.scroll_option),
            screen_height: read_positive(conf, "Playfield", "ScreenHeight", default.screen_height),
            draw_distance_multiplier: read_positive(
                conf,
                "Playfield",
                "DrawDistanceMultiplier",
                default.draw_distance_multiplier,
            ),
            receptor_y_offset: read(conf, "Playfield", "ReceptorYOffset", default.receptor_y_offset),
            receptor_y_offset_reverse: read(
                conf,
                "Playfield",
                "ReceptorYOffsetReverse",
                default.receptor_y_offset_reverse,
            ),
            lines_per_measure: read(conf, "Playfield", "LinesPerMeasure", default.lines_per_measure).max(1),
            max_timing_lines: read(conf, "Playfield", "MaxTimingLines", default.max_timing_lines),
        }
    }

    pub fn to_ini(&self) -> Ini {
        let mut conf = Ini::new();
        conf.with_section(Some("Options")).set("LogLevel", self.log_level.to_string());
        // Keys in alphabetical order.
        conf.with_section(Some("Playfield"))
            .set("DrawDistanceMultiplier", self.draw_distance_multiplier.to_string())
            .set("LinesPerMeasure", self.lines_per_measure.to_string())
            .set("MaxTimingLines", self.max_timing_lines.to_string())
            .set("ReceptorYOffset", self.receptor_y_offset.to_string())
            .set("ReceptorYOffsetReverse", self.receptor_y_offset_reverse.to_string())
            .set("ScreenHeight", self.screen_height.to_string())
            .set("ScrollOption", self.scroll_option.to_string())
            .set("ScrollSpeed", self.scroll_speed.to_string());
        conf
    }
}

const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("Options", &["LogLevel"]),
    (
        "Playfield",
        &[
            "DrawDistanceMultiplier",
            "LinesPerMeasure",
            "MaxTimingLines",
            "ReceptorYOffset",
            "ReceptorYOffsetReverse",
            "ScreenHeight",
            "ScrollOption",
            "ScrollSpeed",
        ],
    ),
];

/// Keys in known sections that `from_ini` would never look up.
fn unknown_keys(conf: &Ini) -> Vec<(&'static str, String)> {
    let mut unknown = Vec::new();
    for &(section, keys) in KNOWN_KEYS {
        let Some(props) = conf.section(Some(section)) else {
            continue;
        };
        for (key, _) in props.iter() {
            if !keys.contains(&key) {
                unknown.push((section, key.to_string()));
            }
        }
    }
    unknown
}

fn read<T>(conf: &Ini, section: &str, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let Some(raw) = conf.get_from(Some(section), key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(e) => {
            warn!("Ignoring [{section}] {key}={raw}: {e}");
            default
        }
    }
}

fn read_positive(conf: &Ini, section: &str, key: &str, default: f32) -> f32 {
    let v = read(conf, section, key, default);
    if v.is_finite() && v > 0.0 {
        v
    } else {
        warn!("Ignoring [{section}] {key}={v}: must be a positive number");
        default
    }
}

fn create_default_config_file(path: &Path) -> Result<(), std::io::Error> {
    info!("'{}' not found, creating with default values.", path.display());
    Config::default().to_ini().write_to_file(path)
}

/// Reads the config file, writing a default one first when it is missing.
/// Any failure falls back to defaults.
pub fn load<P: AsRef<Path>>(path: P) -> Config {
    let path = path.as_ref();
    if !path.exists()
        && let Err(e) = create_default_config_file(path)
    {
        warn!("Failed to create default config file: {e}");
    }

    match Ini::load_from_file(path) {
        Ok(conf) => {
            let cfg = Config::from_ini(&conf);
            info!("Configuration loaded from '{}'.", path.display());
            cfg
        }
        Err(e) => {
            warn!("Failed to load '{}': {e}. Using defaults.", path.display());
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, LogLevel, unknown_keys};
    use crate::game::scroll::{ScrollDirection, ScrollOption};
    use ini::Ini;

    fn parse(text: &str) -> Config {
        Config::from_ini(&Ini::load_from_str(text).expect("valid ini"))
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        assert_eq!(parse(""), Config::default());
    }

    #[test]
    fn reads_every_key() {
        let cfg = parse(
            "[Options]\nLogLevel=debug\n\n[Playfield]\nScrollSpeed=2\nScrollOption=Split\n\
             ScreenHeight=720\nDrawDistanceMultiplier=2\nLinesPerMeasure=4\nMaxTimingLines=500\n\
             ReceptorYOffset=-200\nReceptorYOffsetReverse=200\n",
        );
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.scroll_speed, 2.0);
        assert_eq!(cfg.scroll_option, ScrollOption::Split);
        assert_eq!(cfg.lines_per_measure, 4);
        assert_eq!(cfg.max_timing_lines, 500);
        assert_eq!(cfg.receptor_position(ScrollDirection::Up), 160.0);
        assert_eq!(cfg.receptor_position(ScrollDirection::Down), 560.0);
        // 720 * 2 px at 2 px/ms is 720ms of track.
        assert_eq!(cfg.render_threshold(), 72_000);
    }

    #[test]
    fn unknown_keys_are_reported() {
        let conf = Ini::load_from_str("[Playfield]\nDrawDistance=300\nScrollSpeed=2\n[Other]\nFoo=1\n")
            .expect("valid ini");
        assert_eq!(unknown_keys(&conf), vec![("Playfield", "DrawDistance".to_string())]);
        assert!(unknown_keys(&Config::default().to_ini()).is_empty(), "written keys must all be known");
        let cfg = Config::from_ini(&conf);
        assert_eq!(cfg.render_threshold(), Config::default().render_threshold() / 2);
    }

    #[test]
    fn malformed_values_are_ignored() {
        let cfg = parse("[Playfield]\nScrollSpeed=-3\nScrollOption=sideways\nLinesPerMeasure=0\n");
        let default = Config::default();
        assert_eq!(cfg.scroll_speed, default.scroll_speed);
        assert_eq!(cfg.scroll_option, default.scroll_option);
        assert_eq!(cfg.lines_per_measure, 1);
    }

    #[test]
    fn written_defaults_read_back_identically() {
        let mut buf = Vec::new();
        Config::default().to_ini().write_to(&mut buf).expect("write to memory");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(parse(&text), Config::default());
    }

    #[test]
    fn default_threshold_covers_draw_distance() {
        let cfg = Config::default();
        assert_eq!(cfg.render_threshold(), 72_000);
        assert_eq!(cfg.line_settings().lines_per_measure, 1);
    }
}
