use crate::game::timing::TRACK_ROUNDING;
use smallvec::{SmallVec, smallvec};
use std::fmt;
use std::str::FromStr;

/// Which way notes travel on screen for one independently scrolling half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Receptors at the bottom; upcoming lines sit above them.
    Down,
    /// Receptors at the top; upcoming lines sit below them.
    Up,
}

impl ScrollDirection {
    #[inline(always)]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Down => 1.0,
            Self::Up => -1.0,
        }
    }

    /// On-screen position of a line at `track_offset` while the playfield sits at `current_offset`.
    #[inline(always)]
    pub fn line_position(self, base: f32, current_offset: i64, track_offset: i64, scroll_speed: f32) -> f32 {
        let distance = (current_offset - track_offset) as f32;
        (self.sign() * distance * scroll_speed / TRACK_ROUNDING) + base
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "Down"),
            Self::Up => write!(f, "Up"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollOption {
    #[default]
    Normal,
    Reverse,
    Split,
}

impl ScrollOption {
    /// Scroll directions that need their own line manager, left half first.
    pub fn directions(self) -> SmallVec<[ScrollDirection; 2]> {
        match self {
            Self::Normal => smallvec![ScrollDirection::Up],
            Self::Reverse => smallvec![ScrollDirection::Down],
            Self::Split => smallvec![ScrollDirection::Down, ScrollDirection::Up],
        }
    }
}

impl FromStr for ScrollOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err("Scroll setting is empty".to_string());
        }
        match raw.to_ascii_lowercase().as_str() {
            "normal" | "up" => Ok(Self::Normal),
            "reverse" | "down" => Ok(Self::Reverse),
            "split" => Ok(Self::Split),
            other => Err(format!("'{other}' is not a valid Scroll setting")),
        }
    }
}

impl fmt::Display for ScrollOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Reverse => write!(f, "Reverse"),
            Self::Split => write!(f, "Split"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ScrollDirection, ScrollOption};

    #[test]
    fn upcoming_lines_sit_on_the_incoming_side() {
        // A line 1000ms (100_000 track units) ahead at 0.5 px/ms is 500px away.
        let down = ScrollDirection::Down.line_position(400.0, 0, 100_000, 0.5);
        let up = ScrollDirection::Up.line_position(100.0, 0, 100_000, 0.5);
        assert!((down - -100.0).abs() < 1e-3, "down-scroll line should be above base, got {down}");
        assert!((up - 600.0).abs() < 1e-3, "up-scroll line should be below base, got {up}");
    }

    #[test]
    fn line_at_current_offset_sits_on_base() {
        for dir in [ScrollDirection::Down, ScrollDirection::Up] {
            let y = dir.line_position(240.0, 12_345, 12_345, 1.7);
            assert!((y - 240.0).abs() < f32::EPSILON, "{dir} line should be on base");
        }
    }

    #[test]
    fn scroll_option_parses_and_round_trips() {
        assert_eq!("reverse".parse::<ScrollOption>(), Ok(ScrollOption::Reverse));
        assert_eq!(" Split ".parse::<ScrollOption>(), Ok(ScrollOption::Split));
        assert!("sideways".parse::<ScrollOption>().is_err());
        assert!("".parse::<ScrollOption>().is_err());
        for opt in [ScrollOption::Normal, ScrollOption::Reverse, ScrollOption::Split] {
            assert_eq!(opt.to_string().parse::<ScrollOption>(), Ok(opt));
        }
    }

    #[test]
    fn split_yields_two_directions() {
        assert_eq!(ScrollOption::Split.directions().as_slice(), &[ScrollDirection::Down, ScrollDirection::Up]);
        assert_eq!(ScrollOption::Normal.directions().len(), 1);
    }
}
