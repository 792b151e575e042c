//! Redirect signals handed back to the dashboard router.

use serde::{Deserialize, Serialize};

/// "Navigate elsewhere" outcome of an auth check.
///
/// Serializes to the shape the router consumes:
/// `{ "redirectTo": "/sign-up", "message": false }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSignal {
    pub redirect_to: String,
    pub message: RedirectMessage,
}

impl RedirectSignal {
    /// Redirect without showing any notification.
    pub fn silent(redirect_to: impl Into<String>) -> Self {
        Self {
            redirect_to: redirect_to.into(),
            message: RedirectMessage::Suppressed,
        }
    }

    /// Redirect and show `message` to the user.
    pub fn with_message(redirect_to: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            redirect_to: redirect_to.into(),
            message: RedirectMessage::Text(message.into()),
        }
    }
}

impl std::fmt::Display for RedirectSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redirect_to)
    }
}

/// Notification shown alongside a redirect.
///
/// `Suppressed` is encoded as the literal `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage", into = "RawMessage")]
pub enum RedirectMessage {
    Suppressed,
    Text(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawMessage {
    Flag(bool),
    Text(String),
}

impl TryFrom<RawMessage> for RedirectMessage {
    type Error = String;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        match raw {
            RawMessage::Flag(false) => Ok(RedirectMessage::Suppressed),
            RawMessage::Flag(true) => Err("redirect message must be false or a string".to_string()),
            RawMessage::Text(text) => Ok(RedirectMessage::Text(text)),
        }
    }
}

impl From<RedirectMessage> for RawMessage {
    fn from(message: RedirectMessage) -> Self {
        match message {
            RedirectMessage::Suppressed => RawMessage::Flag(false),
            RedirectMessage::Text(text) => RawMessage::Text(text),
        }
    }
}
