//! Message kinds a group robot accepts.

use serde_json::{Value, json};

/// Locale key used for rich-text posts.
pub const POST_LOCALE: &str = "zh_cn";

/// A message to post to a group robot.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Plain text.
    Text {
        /// Message body.
        text: String,
    },
    /// Rich text with a title, one row per line, and user mentions.
    Post {
        /// Post title, may be empty.
        title: String,
        /// Text rows.
        lines: Vec<String>,
        /// User ids mentioned at the end of the last row.
        mentions: Vec<String>,
    },
    /// A shared group card.
    ShareChat {
        /// Id of the shared chat.
        chat_id: String,
    },
    /// An uploaded image.
    Image {
        /// Key of the uploaded image.
        image_key: String,
    },
    /// An interactive card, passed through as-is.
    Interactive {
        /// Card definition.
        card: Value,
    },
}

impl OutboundMessage {
    /// Creates a plain text message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates a single-row rich text post, mentioning `user_id` when it is
    /// not empty.
    #[must_use]
    pub fn post(title: impl Into<String>, text: impl Into<String>, user_id: &str) -> Self {
        let mentions = if user_id.is_empty() {
            Vec::new()
        } else {
            vec![user_id.to_string()]
        };
        Self::Post {
            title: title.into(),
            lines: vec![text.into()],
            mentions,
        }
    }

    /// Returns the `msg_type` value for this kind.
    #[must_use]
    pub const fn msg_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Post { .. } => "post",
            Self::ShareChat { .. } => "share_chat",
            Self::Image { .. } => "image",
            Self::Interactive { .. } => "interactive",
        }
    }

    /// Returns the request key the body is sent under.
    #[must_use]
    pub const fn body_key(&self) -> &'static str {
        match self {
            Self::Interactive { .. } => "card",
            _ => "content",
        }
    }

    /// Builds the JSON body for this message.
    #[must_use]
    pub fn content(&self) -> Value {
        match self {
            Self::Text { text } => json!({ "text": text }),
            Self::Post {
                title,
                lines,
                mentions,
            } => {
                let mut rows: Vec<Vec<Value>> = lines
                    .iter()
                    .map(|line| vec![json!({ "tag": "text", "text": line })])
                    .collect();
                if !mentions.is_empty() {
                    if rows.is_empty() {
                        rows.push(Vec::new());
                    }
                    if let Some(last) = rows.last_mut() {
                        last.extend(
                            mentions
                                .iter()
                                .map(|id| json!({ "tag": "at", "user_id": id })),
                        );
                    }
                }
                json!({ "post": { POST_LOCALE: { "title": title, "content": rows } } })
            }
            Self::ShareChat { chat_id } => json!({ "share_chat_id": chat_id }),
            Self::Image { image_key } => json!({ "image_key": image_key }),
            Self::Interactive { card } => card.clone(),
        }
    }
}
