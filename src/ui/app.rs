use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::audio::{self, PlaybackPort};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::dump::EMPTY_QUEUE_MESSAGE;
use crate::models::{DivisionKind, MessageType, WindowType};
use crate::playback_settings::MAX_REPEAT;
use crate::player::REPEAT_PRESETS;
use crate::queue::AudioSource;
use crate::route::Route;
use crate::text::{SectionNames, TextStore};
use crate::ui::views::{DetailView, ListView, PlayerView, SelectMode, SettingsField};
use crate::ui::windows::{
    detail::{DetailWindow, grid_columns},
    help::HelpWindow,
    lists::{ChapterListWindow, SectionListWindow},
    player::PlayerWindow,
    settings::PlaybackSettingsWindow,
};

const PAGE_STEP: usize = 10;
const SEEK_STEP: Duration = Duration::from_secs(5);
const GAP_NUDGE: f64 = 0.5;
const HISTORY_LIMIT: usize = 100;

/// Builds a fresh audio port each time the player route opens.
pub type PortFactory = Box<dyn Fn() -> Box<dyn PlaybackPort>>;

/// What the main area currently shows.
pub enum View {
    Chapters(ListView),
    Sections(ListView),
    Detail(DetailView),
    Player(PlayerView),
}

/// UI-specific state management
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub active_window: WindowType,
    pub help_scroll_offset: u16,
    pub message: Option<String>,
    pub message_type: Option<MessageType>,
    pub message_time: Option<Instant>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_message(&mut self, message: String, message_type: MessageType) {
        self.message = Some(message);
        self.message_type = Some(message_type);
        self.message_time = Some(Instant::now());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
        self.message_time = None;
    }

    /// Returns true if the current message has expired (older than 3 seconds).
    pub fn message_expired(&self) -> bool {
        self.message_time
            .is_some_and(|t| t.elapsed() >= Duration::from_secs(3))
    }

    pub fn open_window(&mut self, window_type: WindowType) {
        if window_type == WindowType::Help {
            self.help_scroll_offset = 0;
        }
        self.active_window = window_type;
    }
}

/// Everything the app knows, independent of the terminal.
pub struct ApplicationState {
    pub config: Config,
    pub catalog: Catalog,
    pub source: AudioSource,
    pub view: View,
    pub ui_state: UiState,
    pub should_quit: bool,
    pub history: Vec<Route>,
    pub history_index: usize,
    pub texts: TextStore,
    pub section_names: SectionNames,
    /// Cells per row of the verse grid, refreshed from the terminal width.
    pub grid_columns: u16,
    port_factory: PortFactory,
}

impl ApplicationState {
    pub fn new(config: Config, catalog: Catalog, route: Route, port_factory: PortFactory) -> Self {
        let settings = &config.settings;
        let timeout = Duration::from_secs(settings.fetch_timeout_secs);
        let mut texts = TextStore::new(settings.text_api_base.clone(), timeout);
        let mut ui_state = UiState::new();
        if let Some(path) = &settings.verse_text_path
            && let Err(err) = texts.load_file(Path::new(path))
        {
            log::warn!("{:#}", err);
            ui_state.set_message(format!("Verse text not loaded: {}", err), MessageType::Warning);
        }

        let mut state = Self {
            source: AudioSource::from_settings(settings),
            view: View::Chapters(ListView::new(catalog.chapters().len(), 0)),
            ui_state,
            should_quit: false,
            history: Vec::new(),
            history_index: 0,
            texts,
            section_names: SectionNames::new(),
            grid_columns: 10,
            port_factory,
            catalog,
            config,
        };
        state.navigate(route, Instant::now());
        state
    }

    pub fn current_route(&self) -> Option<&Route> {
        self.history.get(self.history_index)
    }

    /// Open a route as a new history entry, dropping any forward entries.
    pub fn navigate(&mut self, route: Route, now: Instant) {
        if self.current_route() == Some(&route) {
            return;
        }
        let previous = self.current_route().cloned();
        if !self.history.is_empty() {
            self.history.truncate(self.history_index + 1);
        }
        self.history.push(route.clone());
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history_index = self.history.len() - 1;
        self.open(&route, previous.as_ref(), now);
    }

    pub fn go_back(&mut self, now: Instant) {
        if self.history_index == 0 {
            return;
        }
        let previous = self.current_route().cloned();
        self.history_index -= 1;
        let route = self.history[self.history_index].clone();
        self.open(&route, previous.as_ref(), now);
    }

    pub fn go_forward(&mut self, now: Instant) {
        if self.history_index + 1 >= self.history.len() {
            return;
        }
        let previous = self.current_route().cloned();
        self.history_index += 1;
        let route = self.history[self.history_index].clone();
        self.open(&route, previous.as_ref(), now);
    }

    fn open(&mut self, route: &Route, previous: Option<&Route>, now: Instant) {
        log::info!("Opening {}", route);
        self.ui_state.open_window(WindowType::Main);
        // Drop the old view first so a running player releases its device.
        self.view = View::Chapters(ListView::new(0, 0));
        self.view = match route {
            Route::Chapters => {
                let selected = match previous {
                    Some(Route::Chapter(n)) => n.saturating_sub(1) as usize,
                    _ => 0,
                };
                View::Chapters(ListView::new(self.catalog.chapters().len(), selected))
            }
            Route::Sections => {
                let settings = &self.config.settings;
                self.section_names.start(
                    self.catalog.sections(),
                    &settings.text_api_base,
                    Duration::from_secs(settings.fetch_timeout_secs),
                );
                let selected = match previous {
                    Some(Route::Section(n)) => n.saturating_sub(1) as usize,
                    _ => 0,
                };
                View::Sections(ListView::new(self.catalog.sections().len(), selected))
            }
            Route::Chapter(n) => View::Detail(DetailView::new(
                self.catalog.division(DivisionKind::Chapter, *n),
                &self.config.settings,
            )),
            Route::Section(n) => View::Detail(DetailView::new(
                self.catalog.division(DivisionKind::Section, *n),
                &self.config.settings,
            )),
            Route::Play(request) => {
                let port = (self.port_factory)();
                let view = PlayerView::new(request, &self.catalog, &self.source, port, now);
                let globals: Vec<u32> = view
                    .player
                    .queue()
                    .tracks()
                    .iter()
                    .filter(|track| !track.kind.is_preamble())
                    .map(|track| track.kind.verse())
                    .collect();
                self.texts.request(&globals);
                if view.player.is_empty() {
                    self.ui_state
                        .set_message(EMPTY_QUEUE_MESSAGE.to_string(), MessageType::Warning);
                }
                View::Player(view)
            }
        };
    }

    /// Drain background work and advance playback. True when a redraw is due.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = self.texts.poll();
        changed |= self.section_names.poll();
        if let View::Player(view) = &mut self.view {
            changed |= view.player.pump(now);
            changed |= view.player.tick(now);
            if let Some(error) = view.player.take_error() {
                self.ui_state
                    .set_message(format!("Error: {}", error), MessageType::Error);
            }
        }
        changed
    }

    /// How long the event loop may block before something needs attention.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        let mut timeout = match self.ui_state.message_time {
            Some(t) => {
                let elapsed = now.saturating_duration_since(t);
                let expiry = Duration::from_secs(3);
                if elapsed < expiry {
                    expiry - elapsed
                } else {
                    Duration::from_millis(100)
                }
            }
            None => Duration::from_secs(60),
        };
        if self.texts.is_loading() || self.section_names.is_loading() {
            timeout = timeout.min(Duration::from_millis(100));
        }
        if let View::Player(view) = &self.view {
            let player = &view.player;
            let refresh = if player.cursor().paused {
                Duration::from_millis(250)
            } else {
                Duration::from_millis(100)
            };
            timeout = timeout.min(refresh);
            if let Some(deadline) = player.next_deadline() {
                timeout = timeout.min(deadline.saturating_duration_since(now));
            }
        }
        timeout
    }

    /// Handle keyboard input events
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> eyre::Result<()> {
        if self.ui_state.message.is_some() && self.ui_state.active_window == WindowType::Main {
            self.ui_state.clear_message();
        }

        match self.ui_state.active_window {
            WindowType::Help => self.handle_help_keys(key),
            WindowType::PlaybackSettings => self.handle_settings_keys(key, now),
            WindowType::GapInput => self.handle_gap_input_keys(key, now),
            WindowType::Main => self.handle_main_keys(key, now),
        }
        Ok(())
    }

    fn handle_main_keys(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.go_back(now);
                return;
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') => {
                self.ui_state.open_window(WindowType::Help);
                return;
            }
            KeyCode::Char('S') => {
                self.navigate(Route::Chapters, now);
                return;
            }
            KeyCode::Char('J') => {
                self.navigate(Route::Sections, now);
                return;
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.go_back(now);
                return;
            }
            KeyCode::Tab => {
                self.go_forward(now);
                return;
            }
            _ => {}
        }

        match &mut self.view {
            View::Chapters(list) => {
                if !handle_list_nav(&key, list) && key.code == KeyCode::Enter {
                    let number = list.selected as u32 + 1;
                    self.navigate(Route::Chapter(number), now);
                }
            }
            View::Sections(list) => {
                if !handle_list_nav(&key, list) && key.code == KeyCode::Enter {
                    let number = list.selected as u32 + 1;
                    self.navigate(Route::Section(number), now);
                }
            }
            View::Detail(_) => self.handle_detail_keys(key, now),
            View::Player(_) => self.handle_player_keys(key, now),
        }
    }

    fn handle_detail_keys(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('H') => return self.open_adjacent(-1, now),
            KeyCode::Char('L') => return self.open_adjacent(1, now),
            _ => {}
        }
        let columns = self.grid_columns.max(1) as i64;
        let View::Detail(view) = &mut self.view else {
            return;
        };
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => view.move_cursor(-1),
            KeyCode::Char('l') | KeyCode::Right => view.move_cursor(1),
            KeyCode::Char('j') | KeyCode::Down => view.move_cursor(columns),
            KeyCode::Char('k') | KeyCode::Up => view.move_cursor(-columns),
            KeyCode::Char('g') | KeyCode::Home => view.jump_cursor(1),
            KeyCode::Char('G') | KeyCode::End => view.jump_cursor(view.division.verse_count),
            KeyCode::Char(' ') | KeyCode::Enter => {
                view.activate();
                if view.range.is_finalized() && view.mode == SelectMode::Range {
                    self.ui_state.open_window(WindowType::PlaybackSettings);
                }
            }
            KeyCode::Char('a') => {
                view.toggle_select_all();
                if view.has_selection() {
                    self.ui_state.open_window(WindowType::PlaybackSettings);
                }
            }
            KeyCode::Char('m') => view.switch_mode(),
            KeyCode::Char('c') => view.clear(),
            KeyCode::Char('p') => {
                if view.has_selection() {
                    self.ui_state.open_window(WindowType::PlaybackSettings);
                } else {
                    self.ui_state
                        .set_message("Select ayahs first".to_string(), MessageType::Info);
                }
            }
            _ => {}
        }
    }

    /// Open the previous or next surah or juz, wrapping at either end.
    fn open_adjacent(&mut self, step: i64, now: Instant) {
        let View::Detail(view) = &self.view else {
            return;
        };
        let kind = view.division.kind;
        let count = match kind {
            DivisionKind::Chapter => self.catalog.chapters().len(),
            DivisionKind::Section => self.catalog.sections().len(),
        } as i64;
        if count == 0 {
            return;
        }
        let current = i64::from(view.division.number).clamp(1, count);
        let Ok(next) = u32::try_from((current - 1 + step).rem_euclid(count) + 1) else {
            return;
        };
        let route = match kind {
            DivisionKind::Chapter => Route::Chapter(next),
            DivisionKind::Section => Route::Section(next),
        };
        self.navigate(route, now);
    }

    fn handle_settings_keys(&mut self, key: KeyEvent, now: Instant) {
        let View::Detail(view) = &mut self.view else {
            self.ui_state.open_window(WindowType::Main);
            return;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                view.settings.commit_all();
                self.ui_state.open_window(WindowType::Main);
            }
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => view.set_focus(view.focus.next()),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => {
                view.set_focus(view.focus.previous())
            }
            KeyCode::Char(' ') => {
                if view.focus == SettingsField::ShowText {
                    view.settings.show_text = !view.settings.show_text;
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => view.edit_char(c),
            KeyCode::Backspace => view.backspace(),
            KeyCode::Enter => match view.request() {
                Some(request) => self.navigate(Route::Play(request), now),
                None => {
                    self.ui_state
                        .set_message(EMPTY_QUEUE_MESSAGE.to_string(), MessageType::Warning);
                }
            },
            _ => {}
        }
    }

    fn handle_player_keys(&mut self, key: KeyEvent, now: Instant) {
        let View::Player(view) = &mut self.view else {
            return;
        };
        let player = &mut view.player;
        match key.code {
            KeyCode::Char(' ') => {
                player.toggle_play(now);
                if let Some(error) = player.last_error() {
                    self.ui_state
                        .set_message(error.to_string(), MessageType::Error);
                }
            }
            KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right => player.skip_forward(now),
            KeyCode::Char('p') | KeyCode::Char('h') | KeyCode::Left => player.skip_back(now),
            KeyCode::Char('r') => player.toggle_loop(now),
            KeyCode::Char('t') => player.toggle_text(),
            KeyCode::Char('x') => player.stop(now),
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                player.set_repeat(REPEAT_PRESETS[index], now);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let next = (player.config().repeat_count + 1).min(MAX_REPEAT);
                player.set_repeat(next, now);
            }
            KeyCode::Char('-') => {
                let next = player.config().repeat_count.saturating_sub(1).max(1);
                player.set_repeat(next, now);
            }
            KeyCode::Char('[') => view.nudge_gap(-GAP_NUDGE, now),
            KeyCode::Char(']') => view.nudge_gap(GAP_NUDGE, now),
            KeyCode::Char(',') => {
                let position = player.current_time().saturating_sub(SEEK_STEP);
                player.seek_to(position);
            }
            KeyCode::Char('.') => {
                let position = player.current_time() + SEEK_STEP;
                player.seek_to(position);
            }
            KeyCode::Char('g') => {
                let value = view.gap_field.value();
                view.gap_field.set_draft(value.to_string());
                self.ui_state.open_window(WindowType::GapInput);
            }
            _ => {}
        }
    }

    fn handle_gap_input_keys(&mut self, key: KeyEvent, now: Instant) {
        let View::Player(view) = &mut self.view else {
            self.ui_state.open_window(WindowType::Main);
            return;
        };
        match key.code {
            KeyCode::Esc => {
                let value = view.gap_field.value();
                view.gap_field.set_draft(value.to_string());
                self.ui_state.open_window(WindowType::Main);
            }
            KeyCode::Enter => {
                if view.gap_field.is_draft_invalid() {
                    self.ui_state
                        .set_message(view.gap_field.invalid_hint(), MessageType::Warning);
                }
                view.commit_gap(now);
                self.ui_state.open_window(WindowType::Main);
            }
            KeyCode::Backspace => view.gap_field.pop_char(),
            KeyCode::Char(c) => view.gap_field.push_char(c),
            _ => {}
        }
    }

    fn handle_help_keys(&mut self, key: KeyEvent) {
        let (term_width, term_height) = crossterm::terminal::size().unwrap_or((80, 24));
        let max_offset = HelpWindow::max_scroll_offset(Rect::new(0, 0, term_width, term_height));

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
                self.ui_state.open_window(WindowType::Main);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.ui_state.help_scroll_offset =
                    self.ui_state.help_scroll_offset.saturating_add(1).min(max_offset);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.ui_state.help_scroll_offset = self.ui_state.help_scroll_offset.saturating_sub(1);
            }
            _ => {}
        }
    }
}

/// Handle common list navigation keys.
/// Returns `true` if the key was consumed, `false` if it should be handled by the caller.
fn handle_list_nav(key: &KeyEvent, list: &mut ListView) -> bool {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => list.next(1),
        KeyCode::Char('k') | KeyCode::Up => list.previous(1),
        KeyCode::PageDown => list.next(PAGE_STEP),
        KeyCode::PageUp => list.previous(PAGE_STEP),
        KeyCode::Char('g') | KeyCode::Home => list.first(),
        KeyCode::Char('G') | KeyCode::End => list.last(),
        _ => return false,
    }
    true
}

/// Main application struct
pub struct App {
    state: ApplicationState,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl App {
    pub fn new(config: Config, catalog: Catalog, route: Route) -> eyre::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;

        let timeout = Duration::from_secs(config.settings.fetch_timeout_secs);
        let port_factory: PortFactory = Box::new(move || audio::open_port(timeout));

        Ok(Self {
            state: ApplicationState::new(config, catalog, route, port_factory),
            terminal,
        })
    }

    /// Run the main application loop
    pub fn run(&mut self) -> eyre::Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;

        self.terminal.clear()?;
        self.terminal.hide_cursor()?;

        let result = self.event_loop();

        // Release the audio device before the terminal goes back.
        self.state.view = View::Chapters(ListView::new(0, 0));

        self.terminal.clear()?;
        self.terminal.show_cursor()?;
        crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
        crossterm::terminal::disable_raw_mode()?;

        result
    }

    fn event_loop(&mut self) -> eyre::Result<()> {
        loop {
            if self.state.should_quit {
                return Ok(());
            }

            if self.state.ui_state.message_expired() {
                self.state.ui_state.clear_message();
            }

            let now = Instant::now();
            self.state.poll(now);

            let (term_width, _) = crossterm::terminal::size().unwrap_or((80, 24));
            self.state.grid_columns = grid_columns(term_width);

            let state = &self.state;
            self.terminal.draw(|f| Self::render_static(f, state, now))?;

            let poll_timeout = self.state.poll_timeout(now);
            if !crossterm::event::poll(poll_timeout)? {
                continue;
            }

            if let Ok(Event::Key(key)) = crossterm::event::read()
                && key.kind == KeyEventKind::Press
            {
                self.state.handle_key(key, Instant::now())?;
            }
        }
    }

    fn render_static(frame: &mut Frame, state: &ApplicationState, now: Instant) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(frame.area());

        let route = state
            .current_route()
            .map(|route| route.to_string())
            .unwrap_or_default();
        let header = Self::build_header_line("Hifz", Some(route.as_str()), chunks[0].width);
        frame.render_widget(
            Paragraph::new(header).style(Style::default().add_modifier(Modifier::BOLD)),
            chunks[0],
        );

        match &state.view {
            View::Chapters(list) => {
                ChapterListWindow::render(frame, chunks[1], state.catalog.chapters(), list.selected)
            }
            View::Sections(list) => SectionListWindow::render(
                frame,
                chunks[1],
                state.catalog.sections(),
                &state.section_names,
                list.selected,
            ),
            View::Detail(view) => {
                DetailWindow::render(frame, chunks[1], view);
                if state.ui_state.active_window == WindowType::PlaybackSettings {
                    PlaybackSettingsWindow::render(frame, chunks[1], view);
                }
            }
            View::Player(view) => {
                let rows = state.texts.rows(view.player.text_slots());
                PlayerWindow::render(frame, chunks[1], view, &state.catalog, &rows, now);
                if state.ui_state.active_window == WindowType::GapInput {
                    PlayerWindow::render_gap_input(frame, chunks[1], &view.gap_field);
                }
            }
        }

        if state.ui_state.active_window == WindowType::Help {
            HelpWindow::render(frame, frame.area(), state.ui_state.help_scroll_offset);
        }

        if let Some(ref message) = state.ui_state.message {
            let message_type = state
                .ui_state
                .message_type
                .clone()
                .unwrap_or(MessageType::Info);
            Self::render_message_static(frame, message, &message_type);
        }
    }

    fn build_header_line(title: &str, right_text: Option<&str>, width: u16) -> String {
        let width = width as usize;
        if width == 0 {
            return String::new();
        }

        let mut buffer = vec![' '; width];
        let right_len = right_text.map(|text| text.chars().count()).unwrap_or(0);
        let content_width = if right_len > 0 {
            width.saturating_sub(right_len + 1)
        } else {
            width
        };

        let title_text: String = title.chars().take(content_width).collect();
        let title_len = title_text.chars().count();
        let title_start = (content_width.saturating_sub(title_len)) / 2;
        for (i, ch) in title_text.chars().enumerate() {
            if title_start + i < buffer.len() {
                buffer[title_start + i] = ch;
            }
        }

        if let Some(right_text) = right_text {
            let start = width.saturating_sub(right_len);
            for (i, ch) in right_text.chars().enumerate() {
                if start + i < buffer.len() {
                    buffer[start + i] = ch;
                }
            }
        }

        buffer.into_iter().collect()
    }

    fn render_message_static(frame: &mut Frame, message: &str, message_type: &MessageType) {
        let color = match message_type {
            MessageType::Info => Color::Blue,
            MessageType::Warning => Color::Yellow,
            MessageType::Error => Color::Red,
        };

        let message_paragraph = Paragraph::new(message)
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });

        let frame_area = frame.area();
        let area = Rect {
            x: frame_area.x + 2,
            y: frame_area.y + 2,
            width: frame_area.width.saturating_sub(4),
            height: 3.min(frame_area.height),
        };

        frame.render_widget(Clear, area);
        frame.render_widget(message_paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MediaEvent, OfflinePort};
    use crate::route::{PlayRequest, Verses};
    use crate::settings::Settings;
    use eyre::Result;

    fn offline() -> PortFactory {
        Box::new(|| Box::new(OfflinePort::default()))
    }

    /// Fails every fetch on the first poll after a load.
    #[derive(Default)]
    struct UnreachablePort {
        pending: bool,
    }

    impl PlaybackPort for UnreachablePort {
        fn load(&mut self, _url: &str) {
            self.pending = true;
        }
        fn play(&mut self) -> Result<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn seek(&mut self, _position: Duration) -> Result<()> {
            Ok(())
        }
        fn stop(&mut self) {
            self.pending = false;
        }
        fn poll_events(&mut self) -> Vec<MediaEvent> {
            if std::mem::take(&mut self.pending) {
                vec![MediaEvent::Failed("HTTP status 404 Not Found".to_string())]
            } else {
                Vec::new()
            }
        }
    }

    fn state_at(route: Route) -> Result<ApplicationState> {
        let mut settings = Settings::default();
        // Unroutable so no test ever reaches the network.
        settings.text_api_base = "http://127.0.0.1:9".to_string();
        settings.fetch_timeout_secs = 1;
        let config = Config::with_settings(settings)?;
        Ok(ApplicationState::new(config, Catalog::load()?, route, offline()))
    }

    fn press(state: &mut ApplicationState, code: KeyCode) -> Result<()> {
        state.handle_key(KeyEvent::new(code, KeyModifiers::NONE), Instant::now())
    }

    #[test]
    fn build_header_line_places_right_text() {
        let line = App::build_header_line("Hifz", Some("/juz"), 20);
        assert_eq!(line.chars().count(), 20);
        assert!(line.ends_with("/juz"));
        assert!(line.contains("Hifz"));
        assert_eq!(App::build_header_line("Hifz", None, 0), "");
    }

    #[test]
    fn list_enter_opens_detail_and_back_restores_selection() -> Result<()> {
        let mut state = state_at(Route::Chapters)?;
        press(&mut state, KeyCode::Char('j'))?;
        press(&mut state, KeyCode::Char('j'))?;
        press(&mut state, KeyCode::Enter)?;
        assert_eq!(state.current_route(), Some(&Route::Chapter(3)));
        assert!(matches!(state.view, View::Detail(_)));

        press(&mut state, KeyCode::Esc)?;
        assert_eq!(state.current_route(), Some(&Route::Chapters));
        match &state.view {
            View::Chapters(list) => assert_eq!(list.selected, 2),
            _ => panic!("expected chapter list"),
        }

        press(&mut state, KeyCode::Tab)?;
        assert_eq!(state.current_route(), Some(&Route::Chapter(3)));
        Ok(())
    }

    #[test]
    fn navigating_drops_forward_history() -> Result<()> {
        let mut state = state_at(Route::Chapters)?;
        let now = Instant::now();
        state.navigate(Route::Chapter(1), now);
        state.go_back(now);
        state.navigate(Route::Sections, now);
        assert_eq!(state.history, vec![Route::Chapters, Route::Sections]);
        state.go_forward(now);
        assert_eq!(state.current_route(), Some(&Route::Sections));
        state.go_back(now);
        state.go_back(now);
        assert_eq!(state.current_route(), Some(&Route::Chapters));
        Ok(())
    }

    #[test]
    fn range_selection_opens_panel_and_plays() -> Result<()> {
        let mut state = state_at(Route::Chapter(1))?;
        press(&mut state, KeyCode::Char(' '))?;
        assert_eq!(state.ui_state.active_window, WindowType::Main);
        press(&mut state, KeyCode::Char('l'))?;
        press(&mut state, KeyCode::Char('l'))?;
        press(&mut state, KeyCode::Enter)?;
        assert_eq!(state.ui_state.active_window, WindowType::PlaybackSettings);

        press(&mut state, KeyCode::Backspace)?;
        press(&mut state, KeyCode::Char('3'))?;
        press(&mut state, KeyCode::Down)?;
        if let View::Detail(view) = &state.view {
            assert_eq!(view.focus, SettingsField::Gap);
            assert_eq!(view.settings.repeat.value(), 3);
        }
        press(&mut state, KeyCode::Enter)?;

        let expected = PlayRequest {
            start: 1,
            verses: Verses::Count(3),
            gap: 2.0,
            repeat: 3,
            show_text: true,
        };
        assert_eq!(state.current_route(), Some(&Route::Play(expected)));
        assert_eq!(state.ui_state.active_window, WindowType::Main);
        match &state.view {
            View::Player(view) => assert_eq!(view.player.queue().len(), 3),
            _ => panic!("expected player"),
        }
        Ok(())
    }

    #[test]
    fn player_keys_drive_controls() -> Result<()> {
        let mut state = state_at(Route::Play(PlayRequest::range(8, 3)))?;
        press(&mut state, KeyCode::Char('4'))?;
        press(&mut state, KeyCode::Char('+'))?;
        press(&mut state, KeyCode::Char('r'))?;
        press(&mut state, KeyCode::Char('n'))?;
        press(&mut state, KeyCode::Char(']'))?;
        let View::Player(view) = &state.view else {
            panic!("expected player");
        };
        assert_eq!(view.player.config().repeat_count, 5);
        assert!(view.player.config().looping);
        // 8 is the start of surah 2: preamble, then three verses
        assert_eq!(view.player.queue().len(), 4);
        assert_eq!(view.player.cursor().track, 1);
        assert_eq!(view.gap_field.value(), 0.5);
        Ok(())
    }

    #[test]
    fn offline_play_reports_error() -> Result<()> {
        let mut state = state_at(Route::Play(PlayRequest::range(1, 1)))?;
        press(&mut state, KeyCode::Char(' '))?;
        assert_eq!(state.ui_state.message.as_deref(), Some("No audio output device"));
        Ok(())
    }

    #[test]
    fn gap_input_commits_or_reverts() -> Result<()> {
        let mut state = state_at(Route::Play(PlayRequest::range(1, 2)))?;
        press(&mut state, KeyCode::Char('g'))?;
        assert_eq!(state.ui_state.active_window, WindowType::GapInput);
        press(&mut state, KeyCode::Backspace)?;
        press(&mut state, KeyCode::Char('4'))?;
        press(&mut state, KeyCode::Char('5'))?;
        press(&mut state, KeyCode::Enter)?;
        if let View::Player(view) = &state.view {
            assert_eq!(view.gap_field.value(), 45.0);
        }

        press(&mut state, KeyCode::Char('g'))?;
        press(&mut state, KeyCode::Char('.'))?;
        press(&mut state, KeyCode::Char('.'))?;
        press(&mut state, KeyCode::Enter)?;
        assert_eq!(state.ui_state.message_type, Some(MessageType::Warning));
        if let View::Player(view) = &state.view {
            assert_eq!(view.gap_field.value(), 45.0);
        }
        Ok(())
    }

    #[test]
    fn empty_play_route_warns() -> Result<()> {
        let request = PlayRequest {
            start: 7000,
            ..PlayRequest::range(1, 1)
        };
        let state = state_at(Route::Play(request))?;
        assert_eq!(state.ui_state.message.as_deref(), Some(EMPTY_QUEUE_MESSAGE));
        Ok(())
    }

    #[test]
    fn help_window_opens_and_closes() -> Result<()> {
        let mut state = state_at(Route::Sections)?;
        press(&mut state, KeyCode::Char('?'))?;
        assert_eq!(state.ui_state.active_window, WindowType::Help);
        press(&mut state, KeyCode::Char('q'))?;
        assert_eq!(state.ui_state.active_window, WindowType::Main);
        assert!(!state.should_quit);
        press(&mut state, KeyCode::Char('q'))?;
        assert!(state.should_quit);
        Ok(())
    }

    #[test]
    fn failed_fetch_shows_error_message() -> Result<()> {
        let mut settings = Settings::default();
        settings.text_api_base = "http://127.0.0.1:9".to_string();
        let config = Config::with_settings(settings)?;
        let factory: PortFactory = Box::new(|| Box::new(UnreachablePort::default()));
        let route = Route::Play(PlayRequest::range(1, 2));
        let mut state = ApplicationState::new(config, Catalog::load()?, route, factory);

        press(&mut state, KeyCode::Char(' '))?;
        assert!(state.poll(Instant::now()));
        assert_eq!(
            state.ui_state.message.as_deref(),
            Some("Error: HTTP status 404 Not Found")
        );
        assert_eq!(state.ui_state.message_type, Some(MessageType::Error));
        let View::Player(view) = &state.view else {
            panic!("expected player");
        };
        assert_eq!(view.player.last_error(), Some("HTTP status 404 Not Found"));
        Ok(())
    }

    #[test]
    fn adjacent_keys_wrap_around() -> Result<()> {
        let mut state = state_at(Route::Chapter(114))?;
        press(&mut state, KeyCode::Char('L'))?;
        assert_eq!(state.current_route(), Some(&Route::Chapter(1)));
        press(&mut state, KeyCode::Char('H'))?;
        assert_eq!(state.current_route(), Some(&Route::Chapter(114)));
        press(&mut state, KeyCode::Char('H'))?;
        assert_eq!(state.current_route(), Some(&Route::Chapter(113)));

        let mut state = state_at(Route::Section(1))?;
        press(&mut state, KeyCode::Char('H'))?;
        assert_eq!(state.current_route(), Some(&Route::Section(30)));
        press(&mut state, KeyCode::Char('L'))?;
        assert_eq!(state.current_route(), Some(&Route::Section(1)));
        press(&mut state, KeyCode::Char('L'))?;
        assert_eq!(state.current_route(), Some(&Route::Section(2)));
        Ok(())
    }
}
