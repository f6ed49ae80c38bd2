use serde::{Deserialize, Serialize};

/// One inbound event from the chat platform, as delivered to the webhook.
///
/// The platform guarantees at most one in-flight update per conversation,
/// which is what makes the single-writer-per-user model safe.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundUpdate {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    #[serde(default)]
    pub message: Option<InboundMessage>,
    /// Raw callback data from an inline button tap.
    #[serde(default)]
    pub callback: Option<String>,
    /// The user's current channel boost count, when the platform reports
    /// it alongside the update.
    #[serde(default)]
    pub boost_count: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub text: Option<String>,
    /// File id of the largest photo variant, if any.
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Outbound message content. Media is referenced by the platform file id
/// collected earlier, never re-uploaded.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text { text: String },
    Photo { file_id: String, caption: String },
    Video { file_id: String, caption: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineButton {
    pub label: String,
    /// Callback data, parsed back into a closed action enum on the way in.
    pub action: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

/// Button layout attached to an outbound message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Keyboard {
    /// Inline buttons under the message; taps come back as callbacks.
    Inline { rows: Vec<Vec<InlineButton>> },
    /// One-time reply keyboard; taps come back as plain text.
    Reply { rows: Vec<Vec<String>> },
    /// Remove any previously shown reply keyboard.
    Remove,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Content::text(text),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}
