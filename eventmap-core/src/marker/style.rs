//! Per-marker visual state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::zone::CalendarZone;

const URGENT_COLOR: &str = "#ef4444";
const WARNING_COLOR: &str = "#f59e0b";
const NORMAL_COLOR: &str = "#ffffff";
const MUTED_COLOR: &str = "#94a3b8";

/// How far an event's start day is from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    Today,
    /// One to seven days ahead.
    Soon,
    /// More than seven days ahead.
    Later,
    Past,
}

impl Recency {
    pub fn classify(start: DateTime<Utc>, now: DateTime<Utc>, zone: CalendarZone) -> Self {
        match zone.days_between(now, start) {
            d if d < 0 => Recency::Past,
            0 => Recency::Today,
            1..=7 => Recency::Soon,
            _ => Recency::Later,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recency::Today => "today",
            Recency::Soon => "this week",
            Recency::Later => "later",
            Recency::Past => "past",
        }
    }
}

impl fmt::Display for Recency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub recency: Recency,
    pub border_color: &'static str,
    pub opacity: f32,
}

impl MarkerStyle {
    pub fn for_recency(recency: Recency) -> Self {
        let (border_color, opacity) = match recency {
            Recency::Today => (URGENT_COLOR, 1.0),
            Recency::Soon => (WARNING_COLOR, 1.0),
            Recency::Later => (NORMAL_COLOR, 1.0),
            Recency::Past => (MUTED_COLOR, 0.5),
        };
        MarkerStyle {
            recency,
            border_color,
            opacity,
        }
    }
}

/// Marker counts per recency bucket, for a map legend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Legend {
    pub today: usize,
    pub soon: usize,
    pub later: usize,
    pub past: usize,
    pub saved: usize,
}

impl Legend {
    pub fn count(&mut self, recency: Recency, saved: bool) {
        match recency {
            Recency::Today => self.today += 1,
            Recency::Soon => self.soon += 1,
            Recency::Later => self.later += 1,
            Recency::Past => self.past += 1,
        }
        if saved {
            self.saved += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.today + self.soon + self.later + self.past
    }
}
