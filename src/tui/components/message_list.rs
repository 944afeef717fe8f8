//! # MessageList Component
//!
//! Scrollable view of the conversation.
//!
//! ## Responsibilities
//!
//! - Display the message history, newest at the bottom
//! - Follow the bottom while new content streams in (`stick_to_bottom`)
//! - Let the user scroll back without fighting the auto-follow
//! - Cache per-message heights so layout is not recomputed for settled
//!   messages on every frame
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) wrapping
//! `&mut MessageListState` (persistent state) plus the conversation as props.
//! Since `Component::render` takes `&mut self`, the layout cache and scroll
//! state mutate during the render pass, aligning with Ratatui's
//! `StatefulWidget` pattern.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::completion::{Conversation, Message, Role};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageBubble;
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    /// Scroll offset and view state
    pub scroll_state: ScrollViewState,
    /// Cached layout measurements
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on every frame (the scroll-follow
    /// invariant: conversation updates re-engage this)
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true, // Start attached to bottom
            viewport_height: 0,
        }
    }

    /// Re-engage bottom-following. Called whenever the conversation changes
    /// so the newest content is always brought into view.
    pub fn pin_to_bottom(&mut self) {
        self.stick_to_bottom = true;
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    /// Prevents overscrolling past the last message.
    pub fn clamp_scroll(&mut self) {
        let total_content_height: u16 = self.layout.heights.iter().sum();
        let max_y = total_content_height.saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage auto-scroll if a scroll-down landed at (or past) the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let total_content_height: u16 = self.layout.heights.iter().sum();
        let max_y = total_content_height.saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub conversation: &'a Conversation,
    /// True while fragments are arriving for the last message.
    pub is_streaming: bool,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        conversation: &'a Conversation,
        is_streaming: bool,
    ) -> Self {
        Self {
            state,
            conversation,
            is_streaming,
        }
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        let messages = &self.conversation.messages;

        // 1. Update the layout cache: keep settled heights, remeasure the rest
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(messages, content_width);
        layout.heights.truncate(reusable.min(layout.heights.len()));

        for message in messages.iter().skip(layout.heights.len()) {
            layout
                .heights
                .push(MessageBubble::calculate_height(message, content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(messages.len(), content_width);

        let total_height: u16 = layout.heights.iter().sum();

        // 2. Clamp scroll offset unless we are about to jump to the bottom
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible messages into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height.max(1)))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for i in visible_range {
            let height = self.state.layout.heights[i];
            let is_last = i == messages.len().saturating_sub(1);
            let bubble = MessageBubble::new(&messages[i], is_last && self.is_streaming);
            scroll_view.render_widget(bubble, Rect::new(0, y_offset, content_width, height));
            y_offset += height;
        }

        // Auto-scroll: the newest message stays visible while pinned
        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// EventHandler lives on `MessageListState` rather than `MessageList` because
/// scroll handling needs state that outlives the per-frame component.
impl EventHandler for MessageListState {
    type Event = (); // Scrolling is handled internally, nothing to emit

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
                None
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
                None
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
                None
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
                None
            }
            _ => None,
        }
    }
}

/// Cached layout measurements
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    message_count: usize,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            message_count: 0,
            content_width: 0,
        }
    }

    /// How many cached heights are still valid for this frame.
    ///
    /// A trailing assistant message is always treated as volatile - it grows
    /// while its stream is open, and its cached height may be stale for one
    /// frame after streaming ends - so it is remeasured every frame.
    pub fn reusable_count(&self, messages: &[Message], content_width: u16) -> usize {
        if self.content_width != content_width || self.heights.is_empty() {
            return 0;
        }

        // Fewer messages than cached means the conversation was replaced
        if messages.len() < self.message_count {
            return 0;
        }

        let last_is_volatile = messages
            .last()
            .is_some_and(|m| m.role == Role::Assistant);

        if last_is_volatile {
            messages.len().saturating_sub(1)
        } else {
            messages.len()
        }
    }

    pub fn update_metadata(&mut self, message_count: usize, content_width: u16) {
        self.message_count = message_count;
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc += h;
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(
        &self,
        scroll_offset: u16,
        viewport_height: u16,
    ) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled_history() -> Vec<Message> {
        vec![
            Message::user("hello"),
            Message::assistant("hi"),
            Message::user("follow-up"),
        ]
    }

    #[test]
    fn test_cache_reuses_settled_heights() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![3, 3, 3];
        cache.update_metadata(3, 80);

        // Last message is from the user - everything is settled
        assert_eq!(cache.reusable_count(&settled_history(), 80), 3);
    }

    #[test]
    fn test_cache_invalidated_by_width_change() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![3, 3, 3];
        cache.update_metadata(3, 80);

        assert_eq!(cache.reusable_count(&settled_history(), 40), 0);
    }

    #[test]
    fn test_cache_invalidated_by_shrunk_conversation() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![3, 3, 3];
        cache.update_metadata(3, 80);

        let fewer = vec![Message::user("hello")];
        assert_eq!(cache.reusable_count(&fewer, 80), 0);
    }

    #[test]
    fn test_trailing_assistant_message_is_volatile() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![3, 3];
        cache.update_metadata(2, 80);

        // The reply may still be growing (or its height may be stale from
        // the last streaming frame) - it must be remeasured.
        let streaming = vec![Message::user("hello"), Message::assistant("partial rep")];
        assert_eq!(cache.reusable_count(&streaming, 80), 1);
    }

    #[test]
    fn test_grown_reply_gets_remeasured_taller() {
        let width: u16 = 30;
        let user = Message::user("hi");
        let short_reply = Message::assistant("short");

        let mut cache = LayoutCache::new();
        for m in [&user, &short_reply] {
            cache.heights.push(MessageBubble::calculate_height(m, width));
        }
        cache.rebuild_prefix_heights();
        cache.update_metadata(2, width);
        let stale_height = cache.heights[1];

        // More fragments arrived; same message, much longer content.
        let grown_reply = Message::assistant(
            "this reply is long enough to wrap across multiple lines at width thirty",
        );
        let messages = vec![user.clone(), grown_reply.clone()];

        let reusable = cache.reusable_count(&messages, width);
        assert_eq!(reusable, 1, "only the user message height is reusable");
        cache.heights.truncate(reusable);
        for m in messages.iter().skip(cache.heights.len()) {
            cache.heights.push(MessageBubble::calculate_height(m, width));
        }
        cache.rebuild_prefix_heights();

        assert!(
            cache.heights[1] > stale_height,
            "fresh height ({}) should exceed stale height ({})",
            cache.heights[1],
            stale_height
        );
        assert_eq!(
            cache.heights[0],
            MessageBubble::calculate_height(&user, width)
        );
    }

    #[test]
    fn test_visible_range_covers_scrolled_window() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![4; 10]; // 10 messages, 4 rows each
        cache.rebuild_prefix_heights();

        // Viewport of 8 rows scrolled to offset 16 → messages around index 4
        let range = cache.visible_range(16, 8);
        assert!(range.contains(&4));
        assert!(range.start >= 1);
        assert!(range.end <= 10);
    }

    #[test]
    fn test_scroll_up_unpins_and_scroll_to_bottom_repins() {
        let mut state = MessageListState::new();
        state.layout.heights = vec![4; 10];
        state.layout.rebuild_prefix_heights();
        state.viewport_height = 8;
        assert!(state.stick_to_bottom);

        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);

        // Scrolling down past the end re-engages following
        state.scroll_state.set_offset(Position { x: 0, y: 50 });
        state.handle_event(&TuiEvent::ScrollDown);
        assert!(state.stick_to_bottom);
    }

    #[test]
    fn test_pin_to_bottom() {
        let mut state = MessageListState::new();
        state.stick_to_bottom = false;
        state.pin_to_bottom();
        assert!(state.stick_to_bottom);
    }
}
