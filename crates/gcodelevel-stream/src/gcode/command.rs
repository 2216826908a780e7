//! Line classification and move-word parsing
//!
//! Only a handful of commands matter for leveling. Everything else is passed
//! through untouched, so classification looks at the leading word alone.

use regex::Regex;
use std::sync::OnceLock;

use super::state::{ExtrusionMode, MoveMode, Plane};

/// What a line of G-code means to the transformer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineKind {
    /// A bare `F` word
    Feed(f64),
    /// G0 / G1
    Linear,
    /// G2 (clockwise) / G3 (counter-clockwise)
    Arc { clockwise: bool },
    /// G90 / G91
    MoveMode(MoveMode),
    /// M82 / M83
    ExtrusionMode(ExtrusionMode),
    /// G92
    SetPosition,
    /// G17 / G18 / G19
    Plane(Plane),
    /// Anything else
    PassThrough,
}

fn command_regex() -> &'static Regex {
    static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r"^\s*([GgMm])0*(\d+)(?:[^\d.]|$)").expect("invalid regex pattern")
    })
}

fn feed_regex() -> &'static Regex {
    static FEED_REGEX: OnceLock<Regex> = OnceLock::new();
    FEED_REGEX.get_or_init(|| {
        Regex::new(r"^\s*[Ff]\s*([-+]?(?:\d+\.?\d*|\.\d+))\s*(?:;.*)?$")
            .expect("invalid regex pattern")
    })
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"(\([^)]*\)?)|([A-Za-z])\s*([-+]?(?:\d+\.?\d*|\.\d+))|(\S+)")
            .expect("invalid regex pattern")
    })
}

/// Classify a line by its leading word
pub fn classify(line: &str) -> LineKind {
    if let Some(caps) = feed_regex().captures(line) {
        if let Ok(feed) = caps[1].parse::<f64>() {
            return LineKind::Feed(feed);
        }
    }

    let Some(caps) = command_regex().captures(line) else {
        return LineKind::PassThrough;
    };
    let letter = caps[1].to_ascii_uppercase();
    let Ok(number) = caps[2].parse::<u32>() else {
        return LineKind::PassThrough;
    };

    match (letter.as_str(), number) {
        ("G", 0 | 1) => LineKind::Linear,
        ("G", 2) => LineKind::Arc { clockwise: true },
        ("G", 3) => LineKind::Arc { clockwise: false },
        ("G", 90) => LineKind::MoveMode(MoveMode::Absolute),
        ("G", 91) => LineKind::MoveMode(MoveMode::Relative),
        ("M", 82) => LineKind::ExtrusionMode(ExtrusionMode::Absolute),
        ("M", 83) => LineKind::ExtrusionMode(ExtrusionMode::Relative),
        ("G", 92) => LineKind::SetPosition,
        ("G", 17) => LineKind::Plane(Plane::XY),
        ("G", 18) => LineKind::Plane(Plane::ZX),
        ("G", 19) => LineKind::Plane(Plane::YZ),
        _ => LineKind::PassThrough,
    }
}

/// A parsed move (or `G92`) line
///
/// The leading command word is kept exactly as written. Words other than
/// `X Y Z E F I J R`, including parenthesised comments, land in `extra` in
/// their original order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveWords {
    pub command: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub f: Option<f64>,
    pub i: Option<f64>,
    pub j: Option<f64>,
    pub r: Option<f64>,
    pub extra: Vec<String>,
    /// Trailing `;` comment including the semicolon
    pub comment: Option<String>,
}

impl MoveWords {
    /// Split a line into its command word, recognised axis words, other
    /// words, and trailing comment
    pub fn parse(line: &str) -> Self {
        let line = line.trim_start();
        let (active, comment) = match line.find(';') {
            Some(pos) => (&line[..pos], Some(line[pos..].trim_end().to_string())),
            None => (line, None),
        };

        let mut words = MoveWords {
            comment,
            ..Default::default()
        };

        let body = match command_regex().captures(active) {
            Some(caps) => {
                // The command word ends where its digits end.
                let end = caps.get(2).map_or(0, |m| m.end());
                words.command = active[..end].trim().to_string();
                &active[end..]
            }
            None => active,
        };

        for caps in word_regex().captures_iter(body) {
            if let (Some(letter), Some(number)) = (caps.get(2), caps.get(3)) {
                let value = number.as_str().parse::<f64>().ok();
                let slot = match letter.as_str() {
                    "X" | "x" => Some(&mut words.x),
                    "Y" | "y" => Some(&mut words.y),
                    "Z" | "z" => Some(&mut words.z),
                    "E" | "e" => Some(&mut words.e),
                    "F" | "f" => Some(&mut words.f),
                    "I" | "i" => Some(&mut words.i),
                    "J" | "j" => Some(&mut words.j),
                    "R" | "r" => Some(&mut words.r),
                    _ => None,
                };
                if let (Some(slot), Some(value)) = (slot, value) {
                    *slot = Some(value);
                    continue;
                }
            }
            words.extra.push(caps[0].to_string());
        }
        words
    }
}
