//! Placement value type: a side of the trigger crossed with an alignment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Side of the trigger the content is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// The opposite side.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// `true` for top and bottom, whose cross axis is horizontal.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

/// Cross-axis alignment of the content against the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Align {
    /// Leading edges flush.
    Start,
    /// Midpoints aligned.
    #[default]
    Center,
    /// Trailing edges flush.
    End,
}

impl Align {
    pub const ALL: [Align; 3] = [Align::Start, Align::Center, Align::End];

    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Align::Start => Align::End,
            Align::End => Align::Start,
            Align::Center => Align::Center,
        }
    }
}

/// Where floating content is anchored relative to its trigger.
///
/// The twelve variants are every `Side` crossed with every `Align`. The text
/// form is `side` for centered placements and `side-start` / `side-end`
/// otherwise, which is also what serde reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Placement {
    Top,
    TopStart,
    TopEnd,
    Right,
    RightStart,
    RightEnd,
    #[default]
    Bottom,
    BottomStart,
    BottomEnd,
    Left,
    LeftStart,
    LeftEnd,
}

impl Placement {
    pub const ALL: [Placement; 12] = [
        Placement::Top,
        Placement::TopStart,
        Placement::TopEnd,
        Placement::Right,
        Placement::RightStart,
        Placement::RightEnd,
        Placement::Bottom,
        Placement::BottomStart,
        Placement::BottomEnd,
        Placement::Left,
        Placement::LeftStart,
        Placement::LeftEnd,
    ];

    #[must_use]
    pub const fn new(side: Side, align: Align) -> Self {
        match (side, align) {
            (Side::Top, Align::Center) => Placement::Top,
            (Side::Top, Align::Start) => Placement::TopStart,
            (Side::Top, Align::End) => Placement::TopEnd,
            (Side::Right, Align::Center) => Placement::Right,
            (Side::Right, Align::Start) => Placement::RightStart,
            (Side::Right, Align::End) => Placement::RightEnd,
            (Side::Bottom, Align::Center) => Placement::Bottom,
            (Side::Bottom, Align::Start) => Placement::BottomStart,
            (Side::Bottom, Align::End) => Placement::BottomEnd,
            (Side::Left, Align::Center) => Placement::Left,
            (Side::Left, Align::Start) => Placement::LeftStart,
            (Side::Left, Align::End) => Placement::LeftEnd,
        }
    }

    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Placement::Top | Placement::TopStart | Placement::TopEnd => Side::Top,
            Placement::Right | Placement::RightStart | Placement::RightEnd => Side::Right,
            Placement::Bottom | Placement::BottomStart | Placement::BottomEnd => Side::Bottom,
            Placement::Left | Placement::LeftStart | Placement::LeftEnd => Side::Left,
        }
    }

    #[must_use]
    pub const fn align(self) -> Align {
        match self {
            Placement::Top | Placement::Right | Placement::Bottom | Placement::Left => {
                Align::Center
            }
            Placement::TopStart
            | Placement::RightStart
            | Placement::BottomStart
            | Placement::LeftStart => Align::Start,
            Placement::TopEnd | Placement::RightEnd | Placement::BottomEnd | Placement::LeftEnd => {
                Align::End
            }
        }
    }

    /// Mirror both side and alignment. Applying it twice is the identity.
    #[must_use]
    pub const fn flipped(self) -> Self {
        Self::new(self.side().mirrored(), self.align().mirrored())
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = self.side().as_str();
        match self.align() {
            Align::Center => f.write_str(side),
            Align::Start => write!(f, "{side}-start"),
            Align::End => write!(f, "{side}-end"),
        }
    }
}

/// Returned when a string is not one of the twelve placement names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown placement `{0}`")]
pub struct ParsePlacementError(String);

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (side, align) = match s.split_once('-') {
            Some((side, "start")) => (side, Align::Start),
            Some((side, "end")) => (side, Align::End),
            Some(_) => return Err(ParsePlacementError(s.to_string())),
            None => (s, Align::Center),
        };
        let side = match side {
            "top" => Side::Top,
            "right" => Side::Right,
            "bottom" => Side::Bottom,
            "left" => Side::Left,
            _ => return Err(ParsePlacementError(s.to_string())),
        };
        Ok(Self::new(side, align))
    }
}

impl Serialize for Placement {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Placement {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
