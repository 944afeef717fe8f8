//! # InputBox Component
//!
//! Single-line text entry for composing the next message.
//!
//! ## Responsibilities
//!
//! - Capture typed text and bracketed paste
//! - Handle editing (backspace, delete, cursor movement)
//! - Handle submission (Enter), refusing whitespace-only input
//! - Scroll horizontally so the cursor stays visible in narrow terminals
//!
//! The buffer and cursor are internal state. Submitting takes the buffer
//! (clearing it); a refused submit leaves both buffer and cursor untouched.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Rows/columns taken by the border on each side.
const BORDER_OFFSET: u16 = 1;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted non-empty text (Enter pressed)
    Submit(String),
    /// Text content or cursor changed
    ContentChanged,
}

pub struct InputBox {
    /// Text being composed
    pub buffer: String,
    /// Cursor position as a byte offset into `buffer`
    cursor: usize,
    /// Columns scrolled off the left edge
    scroll: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            scroll: 0,
        }
    }

    fn inner_width(area_width: u16) -> u16 {
        area_width.saturating_sub(BORDER_OFFSET * 2)
    }

    /// Display column of the cursor, in terminal cells.
    fn cursor_col(&self) -> u16 {
        self.buffer[..self.cursor].width() as u16
    }

    /// Keep the cursor inside the visible window.
    fn update_scroll(&mut self, inner_width: u16) {
        if inner_width == 0 {
            return;
        }
        let col = self.cursor_col();
        if col < self.scroll {
            self.scroll = col;
        } else if col >= self.scroll + inner_width {
            self.scroll = col + 1 - inner_width;
        }
    }

    /// Screen position for the terminal cursor (the focus indicator).
    pub fn cursor_screen_pos(&self, area: Rect) -> (u16, u16) {
        let x = area.x + BORDER_OFFSET + self.cursor_col().saturating_sub(self.scroll);
        let y = area.y + BORDER_OFFSET;
        (x, y)
    }
}

fn prev_char_boundary(buffer: &str, pos: usize) -> usize {
    buffer[..pos]
        .chars()
        .next_back()
        .map(|c| pos - c.len_utf8())
        .unwrap_or(0)
}

fn next_char_boundary(buffer: &str, pos: usize) -> usize {
    buffer[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(buffer.len())
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.update_scroll(Self::inner_width(area.width));

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title("Message");

        let input = Paragraph::new(self.buffer.as_str())
            .block(block)
            .style(Style::default().fg(Color::White))
            .scroll((0, self.scroll));

        frame.render_widget(input, area);

        // The input owns the terminal cursor: placing it here after every
        // draw is what "the input keeps focus" means in a terminal.
        frame.set_cursor_position(self.cursor_screen_pos(area));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                // Single-line field: flatten pasted newlines to spaces
                let flat = text.replace(['\r', '\n'], " ");
                self.buffer.insert_str(self.cursor, &flat);
                self.cursor += flat.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => {
                if self.cursor > 0 {
                    let prev = prev_char_boundary(&self.buffer, self.cursor);
                    self.buffer.drain(prev..self.cursor);
                    self.cursor = prev;
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::Delete => {
                if self.cursor < self.buffer.len() {
                    let next = next_char_boundary(&self.buffer, self.cursor);
                    self.buffer.drain(self.cursor..next);
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::CursorLeft => {
                if self.cursor > 0 {
                    self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::CursorRight => {
                if self.cursor < self.buffer.len() {
                    self.cursor = next_char_boundary(&self.buffer, self.cursor);
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::CursorHome => (self.cursor != 0).then(|| {
                self.cursor = 0;
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorEnd => (self.cursor != self.buffer.len()).then(|| {
                self.cursor = self.buffer.len();
                InputEvent::ContentChanged
            }),
            TuiEvent::Submit => {
                if self.buffer.trim().is_empty() {
                    // Whitespace-only: no submit, buffer left as-is
                    None
                } else {
                    let text = std::mem::take(&mut self.buffer);
                    self.cursor = 0;
                    self.scroll = 0;
                    Some(InputEvent::Submit(text))
                }
            }
            _ => None,
        }
    }
}
