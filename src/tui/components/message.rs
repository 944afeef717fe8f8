use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::completion::{Message, Role};
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// Renders a single chat message as a bordered bubble with markdown content.
///
/// `MessageBubble` is a transient component: created fresh each frame with
/// references to the data it needs. The bubble currently receiving streamed
/// fragments gets a non-dimmed border (`is_active`) so the eye is drawn to
/// the reply in progress.
///
/// [`calculate_height`](Self::calculate_height) predicts the rendered height
/// through `Paragraph::line_count` on the same paragraph the render pass
/// uses, so the parent `MessageList` can lay out scrolling without drawing.
#[derive(Clone)]
pub struct MessageBubble<'a> {
    pub message: &'a Message,
    pub is_active: bool,
}

impl<'a> MessageBubble<'a> {
    pub fn new(message: &'a Message, is_active: bool) -> Self {
        Self { message, is_active }
    }

    fn label(role: Role) -> &'static str {
        match role {
            Role::User => "you",
            Role::Assistant => "assistant",
        }
    }

    fn base_color(role: Role) -> Color {
        match role {
            Role::User => Color::Cyan,
            Role::Assistant => Color::Green,
        }
    }

    /// The markdown-rendered paragraph for a message's content.
    ///
    /// `trim: false` on wrapping keeps the indentation of wrapped code lines
    /// intact.
    fn paragraph(message: &Message) -> Paragraph<'static> {
        let text = markdown::render(message.content.trim(), Self::base_color(message.role));
        Paragraph::new(text).wrap(Wrap { trim: false })
    }

    /// Calculate the height this message needs at the given width.
    ///
    /// Must agree exactly with what the render pass produces, which is why
    /// both go through the same [`paragraph`](Self::paragraph) construction.
    pub fn calculate_height(message: &Message, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Terminal too narrow for borders + padding; still occupy a row.
            return 1;
        }

        let paragraph = Self::paragraph(message);
        (paragraph.line_count(content_width) as u16).max(1) + VERTICAL_OVERHEAD
    }
}

impl<'a> Widget for MessageBubble<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let color = Self::base_color(self.message.role);
        let border_style = if self.is_active {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        let block = Block::bordered()
            .title(Self::label(self.message.role))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Self::paragraph(self.message).render(inner_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn label_and_color_by_role() {
        assert_eq!(MessageBubble::label(Role::User), "you");
        assert_eq!(MessageBubble::label(Role::Assistant), "assistant");
        assert_eq!(MessageBubble::base_color(Role::User), Color::Cyan);
        assert_eq!(MessageBubble::base_color(Role::Assistant), Color::Green);
    }

    #[test]
    fn calculate_height_single_line() {
        let msg = Message::user("Hello");
        assert_eq!(
            MessageBubble::calculate_height(&msg, 80),
            1 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_zero_width_returns_minimum() {
        let msg = Message::user("Hello world");
        assert_eq!(MessageBubble::calculate_height(&msg, 0), 1);
        assert_eq!(
            MessageBubble::calculate_height(&msg, HORIZONTAL_OVERHEAD),
            1
        );
    }

    #[test]
    fn calculate_height_counts_markdown_paragraphs() {
        // Two paragraphs render as: line, blank, line
        let msg = Message::assistant("first\n\nsecond");
        assert_eq!(
            MessageBubble::calculate_height(&msg, 80),
            3 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_empty_content_still_occupies_a_row() {
        let msg = Message::assistant("");
        assert_eq!(
            MessageBubble::calculate_height(&msg, 80),
            1 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn renders_role_label_and_content() {
        let backend = TestBackend::new(40, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        let msg = Message::assistant("streamed reply");

        terminal
            .draw(|f| {
                let area = f.area();
                f.render_widget(MessageBubble::new(&msg, false), area);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("assistant"));
        assert!(text.contains("streamed reply"));
    }
}
