use crate::core::state::{App, TurnPhase};
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, TitleBar};

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;

/// Compose one frame: title bar, conversation (or empty-state hint), input.
///
/// The whole conversation is redrawn every frame - no diffing. Sessions are
/// a single page view's worth of messages, so rebuilding is cheap and keeps
/// the streaming path trivial: each fragment just changes app state and the
/// next frame reflects it.
pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(3)]);
    let [title_area, main_area, input_area] = layout.areas(frame.area());

    TitleBar::new(
        &app.model_name,
        &app.status_message,
        app.error.as_deref(),
    )
    .render(frame, title_area);

    if app.conversation.is_empty() {
        draw_empty_hint(frame, main_area);
    } else {
        let is_streaming = app.phase != TurnPhase::Idle;
        MessageList::new(&mut tui.message_list, &app.conversation, is_streaming)
            .render(frame, main_area);
    }

    // Rendered last: the input places the terminal cursor, so it always
    // ends the frame holding focus.
    tui.input_box.render(frame, input_area);
}

fn draw_empty_hint(frame: &mut Frame, area: Rect) {
    let hint = Paragraph::new("Type a message and press Enter")
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )
        .alignment(Alignment::Center);

    // Vertically centered single line
    let row = Rect {
        y: area.y + area.height / 2,
        height: 1.min(area.height),
        ..area
    };
    frame.render_widget(hint, row);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, update};
    use crate::test_support::test_app;
    use crate::tui::TuiState;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_empty_conversation_shows_hint() {
        let backend = TestBackend::new(60, 16);
        let mut terminal = Terminal::new(backend).unwrap();
        let app = test_app();
        let mut tui = TuiState::new();

        terminal.draw(|f| draw_ui(f, &app, &mut tui)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Type a message and press Enter"));
        assert!(text.contains("test-model"));
    }

    #[test]
    fn test_conversation_renders_both_roles() {
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = test_app();
        update(&mut app, Action::Submit("2+2?".to_string()));
        update(&mut app, Action::ResponseDelta("4".to_string()));
        update(&mut app, Action::ResponseDone);
        let mut tui = TuiState::new();

        terminal.draw(|f| draw_ui(f, &app, &mut tui)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("you"));
        assert!(text.contains("2+2?"));
        assert!(text.contains("assistant"));
        assert!(text.contains("4"));
    }

    #[test]
    fn test_input_holds_focus_after_update() {
        let backend = TestBackend::new(60, 16);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = test_app();
        update(&mut app, Action::Submit("hello".to_string()));
        let mut tui = TuiState::new();

        terminal.draw(|f| draw_ui(f, &app, &mut tui)).unwrap();

        // The cursor sits inside the input box (bottom 3 rows, inside border)
        let pos = terminal.get_cursor_position().unwrap();
        assert_eq!(pos.y, 16 - 3 + 1);
        assert_eq!(pos.x, 1);
    }

    #[test]
    fn test_scroll_follows_newest_message() {
        // Small viewport, long conversation: the newest message must be
        // visible and the oldest scrolled away.
        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = test_app();
        for i in 0..6 {
            update(&mut app, Action::Submit(format!("question number {i}")));
            update(&mut app, Action::ResponseDelta(format!("answer number {i}")));
            update(&mut app, Action::ResponseDone);
        }
        let mut tui = TuiState::new();

        // Two frames: the first measures layout, the second draws pinned
        terminal.draw(|f| draw_ui(f, &app, &mut tui)).unwrap();
        terminal.draw(|f| draw_ui(f, &app, &mut tui)).unwrap();

        let text = buffer_text(&terminal);
        assert!(
            text.contains("answer number 5"),
            "newest message should be visible"
        );
        assert!(
            !text.contains("question number 0"),
            "oldest message should be scrolled out"
        );
    }

    #[test]
    fn test_error_shown_in_title_bar() {
        let backend = TestBackend::new(80, 16);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = test_app();
        update(&mut app, Action::Submit("q".to_string()));
        update(
            &mut app,
            Action::ResponseFailed("API error (HTTP 401)".to_string()),
        );
        let mut tui = TuiState::new();

        terminal.draw(|f| draw_ui(f, &app, &mut tui)).unwrap();

        assert!(buffer_text(&terminal).contains("API error (HTTP 401)"));
    }
}
