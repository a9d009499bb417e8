//! GitHub side of the PR sandbox service: verifying webhook deliveries, reading
//! pull request events, and commenting on pull requests as a GitHub App.

pub mod comment;
pub mod events;
pub mod webhook;

pub use comment::{CommentError, ReviewComment, publish_comment};
pub use webhook::{WebhookDelivery, WebhookError};
