//! Audio output behind a small port trait.
//!
//! [`RodioPort`] is the real device. [`OfflinePort`] stands in when no
//! output device can be opened so the rest of the player keeps working.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use eyre::{Result, eyre};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::api;

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LoadedMetadata { duration: Option<Duration> },
    TimeUpdate(Duration),
    Ended,
    Failed(String),
}

pub trait PlaybackPort {
    /// Switch to a new source. Position resets to zero; nothing plays yet.
    fn load(&mut self, url: &str);
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn seek(&mut self, position: Duration) -> Result<()>;
    fn stop(&mut self);
    fn poll_events(&mut self) -> Vec<MediaEvent>;
}

impl<P: PlaybackPort + ?Sized> PlaybackPort for Box<P> {
    fn load(&mut self, url: &str) {
        (**self).load(url)
    }
    fn play(&mut self) -> Result<()> {
        (**self).play()
    }
    fn pause(&mut self) {
        (**self).pause()
    }
    fn seek(&mut self, position: Duration) -> Result<()> {
        (**self).seek(position)
    }
    fn stop(&mut self) {
        (**self).stop()
    }
    fn poll_events(&mut self) -> Vec<MediaEvent> {
        (**self).poll_events()
    }
}

struct Fetched {
    generation: u64,
    result: std::result::Result<Arc<[u8]>, String>,
}

pub struct RodioPort {
    stream: OutputStream,
    sink: Option<Sink>,
    client: reqwest::blocking::Client,
    generation: u64,
    tx: Sender<Fetched>,
    rx: Receiver<Fetched>,
    loading: bool,
    current: Option<Arc<[u8]>>,
    duration: Option<Duration>,
    want_play: bool,
    ended_reported: bool,
}

impl RodioPort {
    pub fn new(fetch_timeout: Duration) -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|err| eyre!("Audio init failed: {err}"))?;
        stream.log_on_drop(false);
        let client = api::build_client(fetch_timeout, "")?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            stream,
            sink: None,
            client,
            generation: 0,
            tx,
            rx,
            loading: false,
            current: None,
            duration: None,
            want_play: false,
            ended_reported: false,
        })
    }

    fn decoder(bytes: Arc<[u8]>) -> Result<Decoder<Cursor<Arc<[u8]>>>> {
        let byte_len = bytes.len() as u64;
        Decoder::builder()
            .with_data(Cursor::new(bytes))
            .with_byte_len(byte_len)
            .with_seekable(true)
            .with_hint("mp3")
            .build()
            .map_err(|err| eyre!("Audio decode failed: {err}"))
    }

    /// Rebuild a paused sink from the cached clip bytes.
    fn rebuild_sink(&mut self) -> Result<()> {
        let bytes = self
            .current
            .clone()
            .ok_or_else(|| eyre!("No audio loaded"))?;
        let source = Self::decoder(bytes)?;
        self.duration = source.total_duration();

        if let Some(old) = self.sink.take() {
            old.stop();
        }
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.append(source);
        self.sink = Some(sink);
        self.ended_reported = false;
        Ok(())
    }

    fn spawn_fetch(&self, url: String) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        let generation = self.generation;
        std::thread::spawn(move || {
            let result = fetch_clip(&client, &url).map_err(|err| err.to_string());
            let _ = tx.send(Fetched { generation, result });
        });
    }
}

fn fetch_clip(client: &reqwest::blocking::Client, url: &str) -> Result<Arc<[u8]>> {
    let response = client.get(url).send()?.error_for_status()?;
    let bytes = response.bytes()?;
    Ok(Arc::from(bytes.to_vec()))
}

impl PlaybackPort for RodioPort {
    fn load(&mut self, url: &str) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.current = None;
        self.duration = None;
        self.want_play = false;
        self.ended_reported = false;
        self.loading = true;
        log::debug!("Fetching {}", url);
        self.spawn_fetch(url.to_string());
    }

    fn play(&mut self) -> Result<()> {
        if self.loading {
            self.want_play = true;
            return Ok(());
        }
        if self.current.is_none() {
            return Err(eyre!("No audio loaded"));
        }
        let drained = self.sink.as_ref().map(Sink::empty).unwrap_or(true);
        if drained {
            self.rebuild_sink()?;
        }
        if let Some(sink) = &self.sink {
            sink.play();
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.want_play = false;
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        if self.loading || self.current.is_none() {
            return Ok(());
        }
        let was_playing = self.sink.as_ref().is_some_and(|sink| !sink.is_paused());
        let drained = self.sink.as_ref().map(Sink::empty).unwrap_or(true);
        if drained || position.is_zero() {
            self.rebuild_sink()?;
            if was_playing {
                if let Some(sink) = &self.sink {
                    sink.play();
                }
            }
        }
        if !position.is_zero() {
            if let Some(sink) = &self.sink {
                sink.try_seek(position)
                    .map_err(|err| eyre!("Audio seek failed: {err}"))?;
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.loading = false;
        self.want_play = false;
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.current = None;
        self.duration = None;
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let mut events = Vec::new();

        while let Ok(fetched) = self.rx.try_recv() {
            if fetched.generation != self.generation {
                log::debug!("Dropping stale clip from load {}", fetched.generation);
                continue;
            }
            self.loading = false;
            match fetched.result {
                Ok(bytes) => {
                    self.current = Some(bytes);
                    match self.rebuild_sink() {
                        Ok(()) => {
                            events.push(MediaEvent::LoadedMetadata {
                                duration: self.duration,
                            });
                            if self.want_play {
                                self.want_play = false;
                                if let Some(sink) = &self.sink {
                                    sink.play();
                                }
                            }
                        }
                        Err(err) => {
                            self.current = None;
                            events.push(MediaEvent::Failed(err.to_string()));
                        }
                    }
                }
                Err(message) => events.push(MediaEvent::Failed(message)),
            }
        }

        if let Some(sink) = &self.sink {
            if !sink.is_paused() {
                if sink.empty() {
                    if !self.ended_reported {
                        self.ended_reported = true;
                        events.push(MediaEvent::Ended);
                    }
                } else {
                    events.push(MediaEvent::TimeUpdate(sink.get_pos()));
                }
            }
        }

        events
    }
}

impl Drop for RodioPort {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Port used when no audio device is available.
#[derive(Debug, Default)]
pub struct OfflinePort {
    loaded: Option<String>,
}

impl OfflinePort {
    pub fn loaded(&self) -> Option<&str> {
        self.loaded.as_deref()
    }
}

impl PlaybackPort for OfflinePort {
    fn load(&mut self, url: &str) {
        self.loaded = Some(url.to_string());
    }

    fn play(&mut self) -> Result<()> {
        Err(eyre!("No audio output device"))
    }

    fn pause(&mut self) {}

    fn seek(&mut self, _position: Duration) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {
        self.loaded = None;
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        Vec::new()
    }
}

/// Open the default device, falling back to [`OfflinePort`].
pub fn open_port(fetch_timeout: Duration) -> Box<dyn PlaybackPort> {
    match RodioPort::new(fetch_timeout) {
        Ok(port) => Box::new(port),
        Err(err) => {
            log::warn!("{}; continuing without audio", err);
            Box::new(OfflinePort::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_port_rejects_play() {
        let mut port = OfflinePort::default();
        port.load("https://cdn.islamic.network/quran/audio/192/ar.abdurrahmaansudais/1.mp3");
        assert!(port.loaded().is_some());
        assert!(port.play().is_err());
        assert!(port.poll_events().is_empty());
        port.stop();
        assert!(port.loaded().is_none());
    }

    #[test]
    fn boxed_port_forwards_calls() {
        let mut port: Box<dyn PlaybackPort> = Box::new(OfflinePort::default());
        port.load("x.mp3");
        assert!(port.play().is_err());
        assert!(port.poll_events().is_empty());
    }

    #[test]
    fn rodio_port_drops_stale_fetches() {
        let Ok(mut port) = RodioPort::new(Duration::from_millis(200)) else {
            return;
        };
        port.load("http://127.0.0.1:9/1.mp3");
        port.load("http://127.0.0.1:9/2.mp3");
        assert!(port.play().is_ok());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let mut failures = 0;
        while std::time::Instant::now() < deadline {
            failures += port
                .poll_events()
                .iter()
                .filter(|e| matches!(e, MediaEvent::Failed(_)))
                .count();
            if failures > 0 {
                std::thread::sleep(Duration::from_millis(200));
                failures += port
                    .poll_events()
                    .iter()
                    .filter(|e| matches!(e, MediaEvent::Failed(_)))
                    .count();
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(failures, 1);
    }
}
