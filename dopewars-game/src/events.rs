//! Player-facing event feed.
//!
//! Every command leaves a line here. The feed is bounded and newest-first:
//! pushing past capacity drops the oldest entry.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Info,
    Warning,
    Alert,
    Success,
}

impl EventKind {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Alert => "ALERT",
            Self::Success => "OK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// One-based day the event happened on
    pub day: u32,
    pub kind: EventKind,
    pub message: String,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[DAY {:02}] {:<5} {}", self.day, self.kind.tag(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFeed {
    capacity: usize,
    entries: VecDeque<GameEvent>,
}

impl EventFeed {
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, day: u32, kind: EventKind, message: impl Into<String>) {
        self.entries.push_front(GameEvent {
            day,
            kind,
            message: message.into(),
        });
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Most recent event, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&GameEvent> {
        self.entries.front()
    }

    /// Events newest first.
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
