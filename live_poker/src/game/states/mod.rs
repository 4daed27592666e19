//! Hand stages.
//!
//! A hand walks PreFlop → Flop → Turn → River → Showdown. A fold-out can
//! end it at any stage.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    #[default]
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Stage {
    /// Stage that follows this one. Showdown is terminal.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::PreFlop => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::River,
            Self::River | Self::Showdown => Self::Showdown,
        }
    }

    /// Community cards on the table once this stage has been dealt.
    #[must_use]
    pub fn board_len(self) -> usize {
        match self {
            Self::PreFlop => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River | Self::Showdown => 5,
        }
    }

    #[must_use]
    pub fn is_betting(self) -> bool {
        self != Self::Showdown
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}
