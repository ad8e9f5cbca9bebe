use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Pending,
    Success,
    Error,
}

/// A transient notification about the outcome of a mutation. A notice with a `key` replaces any
/// earlier notice with the same key, e.g. "Removing..." is replaced by "Transaction removed!".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    level: NoticeLevel,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
}

impl Notice {
    pub(crate) fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            key: None,
        }
    }

    pub(crate) fn pending(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Pending, message)
    }

    pub(crate) fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub(crate) fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn level(&self) -> NoticeLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}
