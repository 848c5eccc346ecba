use std::fmt::Display;
use std::str::FromStr;

use crate::route::{PlayRequest, Verses};
use crate::selection::{PickSelection, RangeSelection};

pub const MIN_REPEAT: u32 = 1;
pub const MAX_REPEAT: u32 = 100;
pub const MIN_GAP: f64 = 0.0;
pub const DEFAULT_MAX_GAP: f64 = 30.0;

/// A numeric input with an editable draft and a validated, committed value.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericField<T> {
    draft: String,
    committed: T,
    min: T,
    max: T,
}

impl<T> NumericField<T>
where
    T: Copy + PartialOrd + Display + FromStr,
{
    /// `initial` is clamped into `min..=max` so the committed value starts valid.
    pub fn new(initial: T, min: T, max: T) -> Self {
        let committed = if initial < min {
            min
        } else if initial > max {
            max
        } else {
            initial
        };
        Self {
            draft: committed.to_string(),
            committed,
            min,
            max,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn value(&self) -> T {
        self.committed
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn push_char(&mut self, c: char) {
        if c.is_ascii_digit() || c == '.' {
            self.draft.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        self.draft.pop();
    }

    fn parse_draft(&self) -> Option<T> {
        self.draft
            .trim()
            .parse::<T>()
            .ok()
            .filter(|v| *v >= self.min && *v <= self.max)
    }

    pub fn is_draft_invalid(&self) -> bool {
        self.parse_draft().is_none()
    }

    /// Apply the draft. Invalid drafts revert to the committed value.
    ///
    /// Returns whether the committed value changed.
    pub fn commit(&mut self) -> bool {
        match self.parse_draft() {
            Some(value) => {
                let changed = value != self.committed;
                self.committed = value;
                self.draft = value.to_string();
                changed
            }
            None => {
                self.draft = self.committed.to_string();
                false
            }
        }
    }

    /// Set a committed value directly (preset buttons, sliders).
    pub fn set_value(&mut self, value: T) -> bool {
        if value < self.min || value > self.max {
            return false;
        }
        self.committed = value;
        self.draft = value.to_string();
        true
    }
}

impl NumericField<u32> {
    pub fn invalid_hint(&self) -> String {
        format!("Value must be between {} and {}.", self.min, self.max)
    }
}

impl NumericField<f64> {
    pub fn invalid_hint(&self) -> String {
        format!("Value must be between {} and {} seconds.", self.min, self.max)
    }

    /// Slider-style nudge, clamped to the bounds.
    pub fn nudge(&mut self, delta: f64) {
        let next = (self.committed + delta).clamp(self.min, self.max);
        self.set_value(next);
    }
}

/// Fields of the playback-settings panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    pub repeat: NumericField<u32>,
    pub gap: NumericField<f64>,
    pub show_text: bool,
}

impl PlaybackSettings {
    pub fn new(repeat: u32, gap: f64, max_gap: f64, show_text: bool) -> Self {
        Self {
            repeat: NumericField::new(repeat, MIN_REPEAT, MAX_REPEAT),
            gap: NumericField::new(gap, MIN_GAP, max_gap.max(MIN_GAP)),
            show_text,
        }
    }

    pub fn commit_all(&mut self) {
        self.repeat.commit();
        self.gap.commit();
    }

    fn package(&self, start: u32, verses: Verses) -> PlayRequest {
        PlayRequest {
            start,
            verses,
            gap: self.gap.value(),
            repeat: self.repeat.value(),
            show_text: self.show_text,
        }
    }

    /// Build a play request for a finalized range of a chapter or section
    /// whose first verse is `first_global`.
    pub fn request_range(
        &mut self,
        first_global: u32,
        selection: &RangeSelection,
    ) -> Option<PlayRequest> {
        let range = selection.range()?;
        if first_global == 0 || range.count == 0 {
            return None;
        }
        self.commit_all();
        Some(self.package(first_global + range.min - 1, Verses::Count(range.count)))
    }

    /// Build a play request from individually picked verses.
    pub fn request_picked(
        &mut self,
        first_global: u32,
        selection: &PickSelection,
    ) -> Option<PlayRequest> {
        if first_global == 0 || selection.is_empty() {
            return None;
        }
        self.commit_all();
        Some(self.package(first_global, Verses::Offsets(selection.offsets())))
    }
}
