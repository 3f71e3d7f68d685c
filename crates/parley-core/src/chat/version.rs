//! Edit/version tracking for messages.
//!
//! `apply_edit` is the only way message content is overwritten. It is pure:
//! the caller persists the returned message and handles any cascade (paired
//! replies, conversation timestamps).

use chrono::{DateTime, Utc};
use parley_types::chat::Message;
use parley_types::error::ChatError;

/// Overwrite `message` with `new_content` as a new version.
///
/// - On the first overwrite the pre-edit content is captured in
///   `original_content`; later overwrites leave it alone.
/// - `version_number` grows by exactly one.
///
/// Fails with `Validation` if `new_content` is empty or whitespace-only.
pub fn apply_edit(
    message: &Message,
    new_content: &str,
    now: DateTime<Utc>,
) -> Result<Message, ChatError> {
    if new_content.trim().is_empty() {
        return Err(ChatError::Validation(
            "message content must not be empty".to_string(),
        ));
    }

    let mut edited = message.clone();
    if !message.is_edited {
        edited.original_content = Some(message.content.clone());
    }
    edited.content = new_content.to_string();
    edited.edited_content = Some(new_content.to_string());
    edited.is_edited = true;
    edited.edited_at = Some(now);
    edited.version_number = message.version_number + 1;
    edited.updated_at = now;

    Ok(edited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::chat::MessageRole;
    use uuid::Uuid;

    fn message(content: &str) -> Message {
        Message::new(Uuid::now_v7(), MessageRole::User, content, 0, Utc::now())
    }

    #[test]
    fn first_edit_captures_original() {
        let msg = message("Hi");
        let edited = apply_edit(&msg, "Hi there", Utc::now()).unwrap();

        assert_eq!(edited.content, "Hi there");
        assert_eq!(edited.edited_content.as_deref(), Some("Hi there"));
        assert_eq!(edited.original_content.as_deref(), Some("Hi"));
        assert!(edited.is_edited);
        assert!(edited.edited_at.is_some());
        assert_eq!(edited.version_number, 2);
        assert_eq!(edited.id, msg.id);
        assert_eq!(edited.order_index, msg.order_index);
    }

    #[test]
    fn original_content_never_changes_after_first_edit() {
        let mut msg = message("first");
        for (k, text) in ["second", "third", "fourth"].iter().enumerate() {
            msg = apply_edit(&msg, text, Utc::now()).unwrap();
            assert_eq!(msg.original_content.as_deref(), Some("first"));
            assert_eq!(msg.version_number, 1 + (k as u32 + 1));
        }
        assert_eq!(msg.content, "fourth");
    }

    #[test]
    fn empty_content_is_rejected() {
        let msg = message("Hi");
        let err = apply_edit(&msg, "", Utc::now()).unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));

        let err = apply_edit(&msg, "  \n\t", Utc::now()).unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[test]
    fn edit_sets_timestamps() {
        let msg = message("Hi");
        let now = Utc::now() + chrono::Duration::seconds(5);
        let edited = apply_edit(&msg, "Yo", now).unwrap();
        assert_eq!(edited.edited_at, Some(now));
        assert_eq!(edited.updated_at, now);
        assert_eq!(edited.created_at, msg.created_at);
    }
}
