use std::fmt;

use serde::Serialize;

use crate::gps_processor::HeadingFix;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum HeadingLabel {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

// index 0 covers [337.5, 360) and [0, 22.5)
const LABELS: [HeadingLabel; 8] = [
    HeadingLabel::N,
    HeadingLabel::NE,
    HeadingLabel::E,
    HeadingLabel::SE,
    HeadingLabel::S,
    HeadingLabel::SW,
    HeadingLabel::W,
    HeadingLabel::NW,
];

impl HeadingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLabel::N => "N",
            HeadingLabel::NE => "NE",
            HeadingLabel::E => "E",
            HeadingLabel::SE => "SE",
            HeadingLabel::S => "S",
            HeadingLabel::SW => "SW",
            HeadingLabel::W => "W",
            HeadingLabel::NW => "NW",
        }
    }
}

impl fmt::Display for HeadingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(true_heading: f64) -> HeadingLabel {
    let index = ((true_heading + 22.5) / 45.0).floor().rem_euclid(8.0) as usize;
    LABELS[index % LABELS.len()]
}

/// The latest heading, kept both as a continuous bearing (e.g. for rotating
/// a map) and as a compass label.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Heading {
    pub degrees: f64,
    pub label: HeadingLabel,
}

impl From<HeadingFix> for Heading {
    fn from(fix: HeadingFix) -> Self {
        Heading {
            degrees: fix.true_heading,
            label: classify(fix.true_heading),
        }
    }
}
