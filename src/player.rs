//! Player controller: drives the sequencer against a playback port.

use std::time::{Duration, Instant};

use crate::audio::{MediaEvent, PlaybackPort};
use crate::catalog::Catalog;
use crate::queue::{PlaybackQueue, TextSlot, Track};
use crate::sequencer::{Cursor, Effect, Event, Sequencer, SequencerConfig};
use crate::settings::MAX_GAP_LIMIT;

/// Repeat counts offered as one-key presets.
pub const REPEAT_PRESETS: [u32; 6] = [1, 2, 3, 4, 5, 7];

/// `MM:SS`, minutes not capped at 59.
pub fn format_time(secs: f64) -> String {
    let secs = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Gap in seconds as a duration, clamped to what the player accepts.
pub fn gap_duration(secs: f64) -> Duration {
    let secs = if secs.is_finite() {
        secs.clamp(0.0, MAX_GAP_LIMIT)
    } else {
        0.0
    };
    Duration::from_secs_f64(secs)
}

pub struct Player<P: PlaybackPort> {
    queue: PlaybackQueue,
    text_slots: Vec<TextSlot>,
    sequencer: Sequencer,
    port: P,
    current_time: Duration,
    duration: Option<Duration>,
    gap_deadline: Option<Instant>,
    show_text: bool,
    last_error: Option<String>,
    /// A media failure not yet handed to the UI.
    unreported_error: Option<String>,
}

impl<P: PlaybackPort> Player<P> {
    pub fn new(
        queue: PlaybackQueue,
        config: SequencerConfig,
        show_text: bool,
        port: P,
        now: Instant,
    ) -> Self {
        let text_slots = queue.text_slots();
        let len = queue.len();
        let mut player = Self {
            queue,
            text_slots,
            sequencer: Sequencer::new(config),
            port,
            current_time: Duration::ZERO,
            duration: None,
            gap_deadline: None,
            show_text,
            last_error: None,
            unreported_error: None,
        };
        player.dispatch(Event::Reset(len), now);
        log::info!(
            "Player ready: {} tracks, repeat {}, gap {:.1}s",
            len,
            config.repeat_count,
            config.gap.as_secs_f64()
        );
        player
    }

    pub fn dispatch(&mut self, event: Event, now: Instant) {
        let effects = self.sequencer.handle(event, now);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Load(index) => {
                    let Some(track) = self.queue.get(index) else {
                        log::error!("Track {} is outside the queue", index);
                        continue;
                    };
                    self.port.load(&track.url);
                    self.current_time = Duration::ZERO;
                    self.duration = None;
                }
                Effect::Play => {
                    if let Err(err) = self.port.play() {
                        log::warn!("Play request rejected: {}", err);
                        self.last_error = Some(err.to_string());
                    }
                }
                Effect::Pause => self.port.pause(),
                Effect::SeekStart => {
                    if let Err(err) = self.port.seek(Duration::ZERO) {
                        log::warn!("Rewind failed: {}", err);
                    }
                    self.current_time = Duration::ZERO;
                }
                Effect::Stop => {
                    self.port.stop();
                    self.current_time = Duration::ZERO;
                }
                Effect::ScheduleGap(deadline) => self.gap_deadline = Some(deadline),
                Effect::CancelGap => self.gap_deadline = None,
            }
        }
    }

    /// Fire the gap timer once its deadline has passed.
    /// Fire the gap timer once its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.gap_deadline {
            Some(deadline) if now >= deadline => {
                self.gap_deadline = None;
                self.dispatch(Event::GapElapsed, now);
                true
            }
            _ => false,
        }
    }

    /// Drain media events from the port; true when anything changed.
    pub fn pump(&mut self, now: Instant) -> bool {
        let events = self.port.poll_events();
        let changed = !events.is_empty();
        for event in events {
            match event {
                MediaEvent::LoadedMetadata { duration } => {
                    self.duration = duration;
                    self.current_time = Duration::ZERO;
                    self.last_error = None;
                }
                MediaEvent::TimeUpdate(position) => self.current_time = position,
                MediaEvent::Ended => {
                    if let Some(duration) = self.duration {
                        self.current_time = duration;
                    }
                    self.dispatch(Event::TrackEnded, now);
                }
                MediaEvent::Failed(message) => {
                    log::warn!("Media failed: {}", message);
                    self.unreported_error = Some(message.clone());
                    self.last_error = Some(message);
                }
            }
        }
        changed
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.gap_deadline
    }

    pub fn toggle_play(&mut self, now: Instant) {
        self.dispatch(Event::TogglePlay, now);
    }

    pub fn skip_forward(&mut self, now: Instant) {
        self.dispatch(Event::SkipForward, now);
    }

    pub fn skip_back(&mut self, now: Instant) {
        self.dispatch(Event::SkipBack, now);
    }

    pub fn toggle_loop(&mut self, now: Instant) {
        self.dispatch(Event::ToggleLoop, now);
    }

    pub fn set_repeat(&mut self, count: u32, now: Instant) {
        self.dispatch(Event::SetRepeat(count), now);
    }

    pub fn set_gap(&mut self, secs: f64, now: Instant) {
        self.dispatch(Event::SetGap(gap_duration(secs)), now);
    }

    pub fn toggle_text(&mut self) {
        self.show_text = !self.show_text;
    }

    pub fn stop(&mut self, now: Instant) {
        self.dispatch(Event::Stop, now);
    }

    /// Jump within the current clip; the sequencer is not involved.
    pub fn seek_to(&mut self, position: Duration) {
        let position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        match self.port.seek(position) {
            Ok(()) => self.current_time = position,
            Err(err) => log::warn!("Seek failed: {}", err),
        }
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn text_slots(&self) -> &[TextSlot] {
        &self.text_slots
    }

    pub fn cursor(&self) -> &Cursor {
        self.sequencer.cursor()
    }

    pub fn config(&self) -> &SequencerConfig {
        self.sequencer.config()
    }

    pub fn show_text(&self) -> bool {
        self.show_text
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.queue.get(self.cursor().track)
    }

    pub fn current_time(&self) -> Duration {
        self.current_time
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The latest media failure, returned once.
    pub fn take_error(&mut self) -> Option<String> {
        self.unreported_error.take()
    }

    /// Playback progress through the current clip, 0.0..=1.0.
    pub fn progress_ratio(&self) -> f64 {
        match self.duration {
            Some(duration) if !duration.is_zero() => {
                (self.current_time.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn time_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.current_time.as_secs_f64()),
            format_time(self.duration.map(|d| d.as_secs_f64()).unwrap_or(0.0))
        )
    }

    /// `chapter:verse` of the current track; a preamble reports the verse it precedes.
    pub fn current_key(&self, catalog: &Catalog) -> String {
        self.current_track()
            .and_then(|track| catalog.verse_key(track.kind.verse()))
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn status_line(&self, catalog: &Catalog) -> String {
        let repeat_count = self.config().repeat_count;
        let shown = (self.cursor().repeat + 1).min(repeat_count);
        format!(
            "Ayah: {} | Repeat: {}/{}",
            self.current_key(catalog),
            shown,
            repeat_count
        )
    }
}

impl<P: PlaybackPort> Drop for Player<P> {
    fn drop(&mut self) {
        self.gap_deadline = None;
        self.port.stop();
    }
}
