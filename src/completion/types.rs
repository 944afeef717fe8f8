use serde::{Deserialize, Serialize};

/// Who authored a message. Serialized with the wire names the provider expects.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn's worth of text from either side of the conversation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered message history for one page-view's worth of chatting.
///
/// Insertion order is turn order. Messages are append-only, with one
/// exception: the assistant message currently being streamed grows through
/// [`Conversation::append_assistant_delta`]. The system prompt is not part of
/// the conversation - it travels separately in the completion request.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: String) {
        self.messages.push(Message::user(content));
    }

    /// Folds one streamed fragment into the reply under construction.
    ///
    /// The first fragment of a turn creates the assistant message; later
    /// fragments concatenate onto it in arrival order, so the final content
    /// is exactly the fragments joined with nothing dropped or reordered.
    pub fn append_assistant_delta(&mut self, fragment: &str) {
        if let Some(last) = self.messages.last_mut()
            && last.role == Role::Assistant
        {
            last.content.push_str(fragment);
            return;
        }
        self.messages.push(Message::assistant(fragment));
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// One event on the streaming handle between provider task and consumer.
///
/// A turn's stream is zero or more `Delta`s followed by exactly one `Done`.
/// Provider failure is not an event - it is the `Err` returned by
/// `stream_completion`, which the spawner translates into a failure action.
#[derive(Debug, PartialEq)]
pub enum StreamEvent {
    /// One incremental chunk of generated text, verbatim from the provider.
    Delta(String),
    /// The provider closed the stream normally.
    Done,
}
