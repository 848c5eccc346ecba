use ratatui::{
    Frame,
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};

pub struct HelpWindow;

const HELP_TEXT: &[&str] = &[
    " Navigation:",
    "   S                 Surah List",
    "   J                 Juz List",
    "   Esc / Backspace   Back",
    "   Ctrl+o            Back",
    "   Tab               Forward",
    "   ?                 Help",
    "   q                 Quit",
    "",
    " Lists:",
    "   k / j             Up / Down",
    "   g / G             First / Last",
    "   PageUp / PageDown Scroll Page",
    "   Enter             Open",
    "",
    " Ayah Grid:",
    "   h j k l / Arrows  Move Cursor",
    "   Space / Enter     Select Ayah",
    "   a                 Select All",
    "   m                 Range / Pick Mode",
    "   c                 Clear Selection",
    "   p                 Playback Settings",
    "   H / L             Previous / Next Surah or Juz",
    "",
    " Playback Settings:",
    "   k / j / Tab       Previous / Next Field",
    "   0-9 . Backspace   Edit Value",
    "   Space             Toggle Show Text",
    "   Enter             Play",
    "",
    " Player:",
    "   Space             Play / Pause",
    "   n / l / Right     Next Ayah",
    "   p / h / Left      Previous Ayah",
    "   r                 Loop",
    "   t                 Show / Hide Text",
    "   1-6               Repeat 1 2 3 4 5 7",
    "   + / -             Repeat Count",
    "   g                 Edit Gap",
    "   [ / ]             Gap -0.5s / +0.5s",
    "   , / .             Seek -5s / +5s",
    "   x                 Stop",
];

impl HelpWindow {
    pub fn get_total_lines() -> usize {
        HELP_TEXT.len()
    }

    /// Largest useful scroll offset for a frame of the given size.
    pub fn max_scroll_offset(area: Rect) -> u16 {
        let visible = area.height.saturating_sub(2) as usize;
        Self::get_total_lines().saturating_sub(visible) as u16
    }

    pub fn render(frame: &mut Frame, area: Rect, scroll_offset: u16) {
        let help_content: Vec<Line> = HELP_TEXT.iter().map(|&s| Line::from(s)).collect();

        let max_width = help_content.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
        let popup_area =
            super::fixed_popup_area(area, max_width + 4, help_content.len() as u16 + 2);

        frame.render_widget(Clear, popup_area);

        let help_paragraph = Paragraph::new(help_content)
            .block(Block::default().title("Help").borders(Borders::ALL))
            .scroll((scroll_offset, 0));

        frame.render_widget(help_paragraph, popup_area);
    }
}
