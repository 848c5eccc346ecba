//! Playback sequencing as a pure state machine.
//!
//! The sequencer never touches audio or clocks itself: callers feed it
//! [`Event`]s stamped with the current [`Instant`] and carry out the
//! returned [`Effect`]s against a playback port.

use std::time::{Duration, Instant};

use crate::playback_settings::{MAX_REPEAT, MIN_REPEAT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerConfig {
    /// Times each track is played before moving on.
    pub repeat_count: u32,
    pub gap: Duration,
    pub looping: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            repeat_count: 1,
            gap: Duration::ZERO,
            looping: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub track: usize,
    /// Completed plays of the current track.
    pub repeat: u32,
    /// Completed trips through the whole queue while looping.
    pub pass: u32,
    pub paused: bool,
    pub done: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            track: 0,
            repeat: 0,
            pass: 0,
            paused: true,
            done: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapAction {
    RepeatTrack,
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingGap {
    pub deadline: Instant,
    pub action: GapAction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    TogglePlay,
    TrackEnded,
    GapElapsed,
    SkipForward,
    SkipBack,
    ToggleLoop,
    SetRepeat(u32),
    SetGap(Duration),
    Reset(usize),
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Switch the port to track `n`; playback starts only on a following `Play`.
    Load(usize),
    Play,
    Pause,
    SeekStart,
    Stop,
    ScheduleGap(Instant),
    CancelGap,
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    config: SequencerConfig,
    cursor: Cursor,
    queue_len: usize,
    pending: Option<PendingGap>,
    /// The port was stopped and holds no source until the next `Load`.
    stopped: bool,
}

impl Sequencer {
    pub fn new(config: SequencerConfig) -> Self {
        let mut config = config;
        config.repeat_count = config.repeat_count.clamp(MIN_REPEAT, MAX_REPEAT);
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn pending_gap(&self) -> Option<&PendingGap> {
        self.pending.as_ref()
    }

    pub fn handle(&mut self, event: Event, now: Instant) -> Vec<Effect> {
        match event {
            Event::TogglePlay => self.toggle_play(),
            Event::TrackEnded => self.track_ended(now),
            Event::GapElapsed => match self.pending.take() {
                Some(pending) => self.apply(pending.action, true),
                None => Vec::new(),
            },
            Event::SkipForward => self.skip(1),
            Event::SkipBack => self.skip(-1),
            Event::ToggleLoop => {
                self.config.looping = !self.config.looping;
                Vec::new()
            }
            Event::SetRepeat(count) => {
                self.config.repeat_count = count.clamp(MIN_REPEAT, MAX_REPEAT);
                Vec::new()
            }
            Event::SetGap(gap) => {
                self.config.gap = gap;
                Vec::new()
            }
            Event::Reset(queue_len) => {
                let mut effects = self.cancel_gap();
                self.queue_len = queue_len;
                self.cursor = Cursor::default();
                self.stopped = false;
                effects.push(Effect::Stop);
                if queue_len > 0 {
                    effects.push(Effect::Load(0));
                }
                effects
            }
            Event::Stop => {
                let mut effects = self.cancel_gap();
                self.cursor.paused = true;
                self.cursor.repeat = 0;
                self.stopped = true;
                effects.push(Effect::Stop);
                effects
            }
        }
    }

    fn toggle_play(&mut self) -> Vec<Effect> {
        if self.queue_len == 0 {
            return Vec::new();
        }

        if self.cursor.paused {
            let mut effects = Vec::new();
            if self.cursor.done {
                self.cursor.track = 0;
                self.cursor.repeat = 0;
                self.cursor.done = false;
                effects.push(Effect::Load(0));
            } else if self.stopped {
                effects.push(Effect::Load(self.cursor.track));
            }
            self.stopped = false;
            self.cursor.paused = false;
            effects.push(Effect::Play);
            return effects;
        }

        let mut effects = Vec::new();
        if let Some(pending) = self.pending.take() {
            effects.push(Effect::CancelGap);
            effects.extend(self.apply(pending.action, false));
        }
        self.cursor.paused = true;
        if !effects.contains(&Effect::Pause) {
            effects.push(Effect::Pause);
        }
        effects
    }

    fn track_ended(&mut self, now: Instant) -> Vec<Effect> {
        if self.cursor.paused || self.queue_len == 0 || self.pending.is_some() {
            return Vec::new();
        }

        self.cursor.repeat += 1;
        let action = if self.cursor.repeat < self.config.repeat_count {
            GapAction::RepeatTrack
        } else {
            GapAction::Advance
        };

        if self.config.gap > Duration::ZERO {
            let deadline = now + self.config.gap;
            self.pending = Some(PendingGap { deadline, action });
            vec![Effect::ScheduleGap(deadline)]
        } else {
            self.apply(action, true)
        }
    }

    fn apply(&mut self, action: GapAction, play: bool) -> Vec<Effect> {
        let mut effects = Vec::new();
        match action {
            GapAction::RepeatTrack => {
                effects.push(Effect::SeekStart);
            }
            GapAction::Advance => {
                self.cursor.repeat = 0;
                if self.cursor.track + 1 < self.queue_len {
                    self.cursor.track += 1;
                    effects.push(Effect::Load(self.cursor.track));
                } else if self.config.looping {
                    self.cursor.pass += 1;
                    self.cursor.track = 0;
                    effects.push(Effect::Load(0));
                } else {
                    self.cursor.paused = true;
                    self.cursor.done = true;
                    effects.push(Effect::Pause);
                    return effects;
                }
            }
        }
        if play {
            effects.push(Effect::Play);
        }
        effects
    }

    fn skip(&mut self, step: isize) -> Vec<Effect> {
        if self.queue_len == 0 {
            return Vec::new();
        }
        let mut effects = self.cancel_gap();
        let len = self.queue_len as isize;
        let next = (self.cursor.track as isize + step).rem_euclid(len);
        self.cursor.track = next as usize;
        self.cursor.repeat = 0;
        self.cursor.paused = false;
        self.cursor.done = false;
        self.stopped = false;
        effects.push(Effect::Load(self.cursor.track));
        effects.push(Effect::Play);
        effects
    }

    fn cancel_gap(&mut self) -> Vec<Effect> {
        match self.pending.take() {
            Some(_) => vec![Effect::CancelGap],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer(repeat_count: u32, gap_secs: u64, looping: bool, len: usize) -> Sequencer {
        let mut seq = Sequencer::new(SequencerConfig {
            repeat_count,
            gap: Duration::from_secs(gap_secs),
            looping,
        });
        seq.handle(Event::Reset(len), Instant::now());
        seq
    }

    #[test]
    fn test_reset_loads_first_track_paused() {
        let mut seq = Sequencer::default();
        let effects = seq.handle(Event::Reset(4), Instant::now());
        assert_eq!(effects, vec![Effect::Stop, Effect::Load(0)]);
        assert_eq!(*seq.cursor(), Cursor::default());
        assert!(seq.cursor().paused);

        let effects = seq.handle(Event::Reset(0), Instant::now());
        assert_eq!(effects, vec![Effect::Stop]);
    }

    #[test]
    fn test_toggle_on_empty_queue_is_noop() {
        let mut seq = sequencer(1, 0, false, 0);
        assert!(seq.handle(Event::TogglePlay, Instant::now()).is_empty());
        assert!(seq.cursor().paused);
        assert!(seq.handle(Event::SkipForward, Instant::now()).is_empty());
    }

    #[test]
    fn test_repeat_three_plays_each_track_three_times() {
        let now = Instant::now();
        let mut seq = sequencer(3, 0, false, 2);
        assert_eq!(seq.handle(Event::TogglePlay, now), vec![Effect::Play]);

        assert_eq!(
            seq.handle(Event::TrackEnded, now),
            vec![Effect::SeekStart, Effect::Play]
        );
        assert_eq!(seq.cursor().repeat, 1);
        assert_eq!(
            seq.handle(Event::TrackEnded, now),
            vec![Effect::SeekStart, Effect::Play]
        );
        assert_eq!(
            seq.handle(Event::TrackEnded, now),
            vec![Effect::Load(1), Effect::Play]
        );
        assert_eq!(seq.cursor().track, 1);
        assert_eq!(seq.cursor().repeat, 0);
    }

    #[test]
    fn test_end_of_queue_without_loop_finishes() {
        let now = Instant::now();
        let mut seq = sequencer(1, 0, false, 2);
        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::TrackEnded, now);
        let effects = seq.handle(Event::TrackEnded, now);
        assert_eq!(effects, vec![Effect::Pause]);
        assert!(seq.cursor().paused);
        assert!(seq.cursor().done);
        assert_eq!(seq.cursor().track, 1);

        // Resuming a finished queue restarts from the top
        let effects = seq.handle(Event::TogglePlay, now);
        assert_eq!(effects, vec![Effect::Load(0), Effect::Play]);
        assert!(!seq.cursor().done);
        assert!(!seq.cursor().paused);
        assert_eq!(seq.cursor().track, 0);
    }

    #[test]
    fn test_loop_wraps_and_counts_passes() {
        let now = Instant::now();
        let mut seq = sequencer(1, 0, true, 2);
        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::TrackEnded, now);
        let effects = seq.handle(Event::TrackEnded, now);
        assert_eq!(effects, vec![Effect::Load(0), Effect::Play]);
        assert_eq!(seq.cursor().pass, 1);
        assert!(!seq.cursor().done);
    }

    #[test]
    fn test_toggle_loop_mid_playback() {
        let now = Instant::now();
        let mut seq = sequencer(1, 0, false, 1);
        seq.handle(Event::ToggleLoop, now);
        assert!(seq.config().looping);
        seq.handle(Event::TogglePlay, now);
        assert_eq!(
            seq.handle(Event::TrackEnded, now),
            vec![Effect::Load(0), Effect::Play]
        );
    }

    #[test]
    fn test_gap_defers_transition() {
        let now = Instant::now();
        let mut seq = sequencer(2, 5, false, 3);
        seq.handle(Event::TogglePlay, now);

        let effects = seq.handle(Event::TrackEnded, now);
        let deadline = now + Duration::from_secs(5);
        assert_eq!(effects, vec![Effect::ScheduleGap(deadline)]);
        assert_eq!(
            seq.pending_gap(),
            Some(&PendingGap {
                deadline,
                action: GapAction::RepeatTrack
            })
        );

        assert_eq!(
            seq.handle(Event::GapElapsed, deadline),
            vec![Effect::SeekStart, Effect::Play]
        );
        assert!(seq.pending_gap().is_none());

        seq.handle(Event::TrackEnded, deadline);
        assert_eq!(
            seq.handle(Event::GapElapsed, deadline + Duration::from_secs(5)),
            vec![Effect::Load(1), Effect::Play]
        );
    }

    #[test]
    fn test_gap_elapsed_without_pending_is_ignored() {
        let mut seq = sequencer(1, 5, false, 3);
        seq.handle(Event::TogglePlay, Instant::now());
        assert!(seq.handle(Event::GapElapsed, Instant::now()).is_empty());
        assert_eq!(seq.cursor().track, 0);
    }

    #[test]
    fn test_gap_before_finish_then_done() {
        let now = Instant::now();
        let mut seq = sequencer(1, 2, false, 1);
        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::TrackEnded, now);
        assert!(!seq.cursor().done);
        assert_eq!(seq.handle(Event::GapElapsed, now), vec![Effect::Pause]);
        assert!(seq.cursor().done);
    }

    #[test]
    fn test_pause_during_gap_applies_transition_silently() {
        let now = Instant::now();
        let mut seq = sequencer(1, 5, false, 3);
        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::TrackEnded, now);

        let effects = seq.handle(Event::TogglePlay, now);
        assert_eq!(
            effects,
            vec![Effect::CancelGap, Effect::Load(1), Effect::Pause]
        );
        assert!(seq.cursor().paused);
        assert_eq!(seq.cursor().track, 1);
        assert!(seq.pending_gap().is_none());

        assert_eq!(seq.handle(Event::TogglePlay, now), vec![Effect::Play]);
    }

    #[test]
    fn test_track_ended_while_paused_is_ignored() {
        let now = Instant::now();
        let mut seq = sequencer(2, 0, false, 3);
        assert!(seq.handle(Event::TrackEnded, now).is_empty());
        assert_eq!(seq.cursor().repeat, 0);

        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::TogglePlay, now);
        assert!(seq.handle(Event::TrackEnded, now).is_empty());
    }

    #[test]
    fn test_skip_wraps_and_resumes() {
        let now = Instant::now();
        let mut seq = sequencer(3, 0, false, 3);

        let effects = seq.handle(Event::SkipBack, now);
        assert_eq!(effects, vec![Effect::Load(2), Effect::Play]);
        assert!(!seq.cursor().paused);

        seq.handle(Event::TrackEnded, now);
        assert_eq!(seq.cursor().repeat, 1);

        let effects = seq.handle(Event::SkipForward, now);
        assert_eq!(effects, vec![Effect::Load(0), Effect::Play]);
        assert_eq!(seq.cursor().repeat, 0);
    }

    #[test]
    fn test_skip_cancels_pending_gap() {
        let now = Instant::now();
        let mut seq = sequencer(1, 5, false, 3);
        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::TrackEnded, now);
        let effects = seq.handle(Event::SkipForward, now);
        assert_eq!(effects, vec![Effect::CancelGap, Effect::Load(1), Effect::Play]);
        assert!(seq.pending_gap().is_none());
    }

    #[test]
    fn test_skip_clears_done() {
        let now = Instant::now();
        let mut seq = sequencer(1, 0, false, 2);
        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::TrackEnded, now);
        seq.handle(Event::TrackEnded, now);
        assert!(seq.cursor().done);
        seq.handle(Event::SkipBack, now);
        assert!(!seq.cursor().done);
        assert_eq!(seq.cursor().track, 0);
    }

    #[test]
    fn test_set_repeat_is_clamped() {
        let mut seq = Sequencer::default();
        seq.handle(Event::SetRepeat(0), Instant::now());
        assert_eq!(seq.config().repeat_count, 1);
        seq.handle(Event::SetRepeat(500), Instant::now());
        assert_eq!(seq.config().repeat_count, 100);
    }

    #[test]
    fn test_set_gap_applies_to_next_end() {
        let now = Instant::now();
        let mut seq = sequencer(1, 0, false, 3);
        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::SetGap(Duration::from_millis(1500)), now);
        assert_eq!(
            seq.handle(Event::TrackEnded, now),
            vec![Effect::ScheduleGap(now + Duration::from_millis(1500))]
        );
    }

    #[test]
    fn test_stop_cancels_and_pauses() {
        let now = Instant::now();
        let mut seq = sequencer(1, 3, false, 3);
        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::TrackEnded, now);
        assert_eq!(
            seq.handle(Event::Stop, now),
            vec![Effect::CancelGap, Effect::Stop]
        );
        assert!(seq.cursor().paused);
        assert!(seq.pending_gap().is_none());
    }

    #[test]
    fn test_resume_after_stop_reloads_current_track() {
        let now = Instant::now();
        let mut seq = sequencer(2, 0, false, 3);
        seq.handle(Event::TogglePlay, now);
        seq.handle(Event::SkipForward, now);
        seq.handle(Event::TrackEnded, now);
        assert_eq!(seq.cursor().repeat, 1);

        assert_eq!(seq.handle(Event::Stop, now), vec![Effect::Stop]);
        assert_eq!(
            seq.handle(Event::TogglePlay, now),
            vec![Effect::Load(1), Effect::Play]
        );
        assert_eq!(seq.cursor().track, 1);
        assert_eq!(seq.cursor().repeat, 0);
        assert!(!seq.cursor().paused);

        // Only the first resume reloads.
        seq.handle(Event::TogglePlay, now);
        assert_eq!(seq.handle(Event::TogglePlay, now), vec![Effect::Play]);
    }
}
