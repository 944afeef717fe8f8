//! # TUI Components
//!
//! All UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! Two patterns, matching how much state a component carries:
//!
//! - **Stateless (props-based)**: `TitleBar` and `MessageBubble` are created
//!   fresh each frame from references to app data.
//! - **Stateful (event-driven)**: `InputBox` owns its buffer and cursor;
//!   `MessageListState` owns scroll position and the layout cache, with a
//!   transient `MessageList` wrapper created per frame.
//!
//! Components receive external data as props, never by reaching into global
//! state - dependencies stay explicit and everything is testable with a
//! `TestBackend`. Each component file co-locates its state, events,
//! rendering, and tests.

pub mod input_box;
pub mod message;
pub mod message_list;
pub mod title_bar;

pub use input_box::{InputBox, InputEvent};
pub use message::MessageBubble;
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
