//! # TitleBar Component
//!
//! Top status bar: application name, active model, and the current
//! status or error text. Stateless - everything arrives as props.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

pub struct TitleBar<'a> {
    pub model_name: &'a str,
    pub status: &'a str,
    pub error: Option<&'a str>,
}

impl<'a> TitleBar<'a> {
    pub fn new(model_name: &'a str, status: &'a str, error: Option<&'a str>) -> Self {
        Self {
            model_name,
            status,
            error,
        }
    }

    fn line(&self) -> Line<'_> {
        let mut spans = vec![
            Span::styled(" banter ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("· {} ", self.model_name),
                Style::default().fg(Color::DarkGray),
            ),
        ];

        // Errors outrank status text; both are optional
        if let Some(error) = self.error {
            spans.push(Span::styled(
                format!("· {error}"),
                Style::default().fg(Color::Red),
            ));
        } else if !self.status.is_empty() {
            spans.push(Span::styled(
                format!("· {}", self.status),
                Style::default().fg(Color::Yellow),
            ));
        }

        Line::from(spans)
    }
}

impl<'a> Component for TitleBar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}
