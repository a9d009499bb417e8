use std::fmt;

use serde_json::Value;

pub const PULL_REQUEST_EVENT: &str = "pull_request";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,
    Closed,
    Reopened,
    Synchronize,
    Other(String),
}

impl From<&str> for PullRequestAction {
    fn from(value: &str) -> Self {
        match value {
            "opened" => Self::Opened,
            "closed" => Self::Closed,
            "reopened" => Self::Reopened,
            "synchronize" => Self::Synchronize,
            other => Self::Other(other.to_string()),
        }
    }
}

impl PullRequestAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::Synchronize => "synchronize",
            Self::Other(other) => other,
        }
    }
}

/// The handful of `pull_request` event fields we log.
///
/// Payloads are untrusted and only loosely shaped, so every field is optional: a missing
/// field or one with an unexpected JSON type reads as absent instead of failing the
/// delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub action: Option<PullRequestAction>,
    pub number: Option<u64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub merged: Option<bool>,
}

impl PullRequestEvent {
    pub fn from_payload(payload: &Value) -> Self {
        let str_at = |pointer: &str| payload.pointer(pointer).and_then(Value::as_str);
        Self {
            action: str_at("/action").map(PullRequestAction::from),
            number: payload.pointer("/pull_request/number").and_then(Value::as_u64),
            title: str_at("/pull_request/title").map(str::to_string),
            author: str_at("/pull_request/user/login").map(str::to_string),
            merged: payload.pointer("/pull_request/merged").and_then(Value::as_bool),
        }
    }

    pub fn transition(&self) -> PullRequestTransition {
        let number = self.number;
        match &self.action {
            Some(PullRequestAction::Opened) => PullRequestTransition::Opened {
                number,
                title: self.title.clone(),
                author: self.author.clone(),
            },
            Some(PullRequestAction::Closed) => {
                PullRequestTransition::Closed { number, merged: self.merged }
            }
            Some(PullRequestAction::Reopened) => PullRequestTransition::Reopened { number },
            Some(PullRequestAction::Synchronize) => PullRequestTransition::Synchronized { number },
            Some(PullRequestAction::Other(_)) | None => PullRequestTransition::Other {
                number,
                action: self.action.as_ref().map(|a| a.as_str().to_string()),
            },
        }
    }
}

/// A pull request lifecycle change, formatted as the line we log for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestTransition {
    Opened { number: Option<u64>, title: Option<String>, author: Option<String> },
    Closed { number: Option<u64>, merged: Option<bool> },
    Reopened { number: Option<u64> },
    Synchronized { number: Option<u64> },
    Other { number: Option<u64>, action: Option<String> },
}

struct Absent<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Absent<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => fmt::Display::fmt(value, f),
            None => f.write_str("<absent>"),
        }
    }
}

impl fmt::Display for PullRequestTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened { number, title, author } => write!(
                f,
                "PR #{} new PR opened by {}: {}",
                Absent(number),
                Absent(author),
                Absent(title)
            ),
            Self::Closed { number, merged } => {
                write!(f, "PR #{} closed, merged: {}", Absent(number), Absent(merged))
            }
            Self::Reopened { number } => write!(f, "PR #{} reopened", Absent(number)),
            Self::Synchronized { number } => {
                write!(f, "PR #{} updated with new commits", Absent(number))
            }
            Self::Other { number, action } => {
                write!(f, "PR #{} action: {}", Absent(number), Absent(action))
            }
        }
    }
}
