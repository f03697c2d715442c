//! Partial parsing of push-event payloads.
//!
//! GitHub's push payload is large; we deserialize only the fields the
//! notification needs, and every field is optional. Absent fields degrade
//! to documented placeholders ("unknown repo", "unknown pusher",
//! "unknown branch") instead of failing the request.

use serde::Deserialize;

use crate::notify::Notification;

const UNKNOWN_REPO: &str = "unknown repo";
const UNKNOWN_PUSHER: &str = "unknown pusher";
const UNKNOWN_BRANCH: &str = "unknown branch";

/// The slice of a `push` webhook payload the notifier cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushEvent {
    #[serde(default)]
    repository: Option<Repository>,

    #[serde(default)]
    pusher: Option<Pusher>,

    /// The full ref that was pushed, e.g. `refs/heads/main`.
    #[serde(default, rename = "ref")]
    git_ref: Option<String>,

    #[serde(default)]
    commits: Vec<Commit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Repository {
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Pusher {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Commit {
    #[serde(default)]
    message: Option<String>,
}

impl PushEvent {
    /// The repository's full name, or a placeholder.
    pub fn repo_full_name(&self) -> &str {
        self.repository
            .as_ref()
            .and_then(|r| r.full_name.as_deref())
            .unwrap_or(UNKNOWN_REPO)
    }

    /// The pusher's name, or a placeholder.
    pub fn pusher_name(&self) -> &str {
        self.pusher
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or(UNKNOWN_PUSHER)
    }

    /// The branch name: the last path segment of the pushed ref.
    pub fn branch(&self) -> &str {
        match self.git_ref.as_deref() {
            Some(git_ref) if !git_ref.is_empty() => {
                git_ref.rsplit('/').next().unwrap_or(git_ref)
            }
            _ => UNKNOWN_BRANCH,
        }
    }

    /// Commit messages, each trimmed of surrounding whitespace. A commit
    /// with a missing or null message yields an empty string.
    pub fn commit_messages(&self) -> impl Iterator<Item = &str> {
        self.commits
            .iter()
            .map(|c| c.message.as_deref().unwrap_or("").trim())
    }

    /// Builds the desktop notification for this push.
    ///
    /// Title is `<repo> (<branch>)`; the body names the pusher and lists
    /// one line per commit message.
    pub fn to_notification(&self) -> Notification {
        let title = format!("{} ({})", self.repo_full_name(), self.branch());

        let mut body = format!("Pusher: {}\nCommits:", self.pusher_name());
        for message in self.commit_messages() {
            body.push_str("\n- ");
            body.push_str(message);
        }

        Notification { title, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> PushEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn full_payload_builds_expected_notification() {
        let event = parse(
            r#"{
                "repository": {"full_name": "o/r"},
                "pusher": {"name": "alice"},
                "ref": "refs/heads/main",
                "commits": [{"message": "fix bug"}, {"message": "add test"}]
            }"#,
        );

        let notification = event.to_notification();
        assert_eq!(notification.title, "o/r (main)");

        // Pusher and commit messages appear in order.
        let alice = notification.body.find("alice").unwrap();
        let fix = notification.body.find("fix bug").unwrap();
        let add = notification.body.find("add test").unwrap();
        assert!(alice < fix && fix < add);
    }

    #[test]
    fn commit_messages_are_trimmed() {
        let event = parse(r#"{"commits": [{"message": "  spaced out \n"}]}"#);

        let messages: Vec<&str> = event.commit_messages().collect();
        assert_eq!(messages, vec!["spaced out"]);
    }

    #[test]
    fn missing_fields_degrade_to_placeholders() {
        let event = parse("{}");

        assert_eq!(event.repo_full_name(), "unknown repo");
        assert_eq!(event.pusher_name(), "unknown pusher");
        assert_eq!(event.branch(), "unknown branch");
        assert_eq!(event.commit_messages().count(), 0);

        let notification = event.to_notification();
        assert_eq!(notification.title, "unknown repo (unknown branch)");
        assert_eq!(notification.body, "Pusher: unknown pusher\nCommits:");
    }

    #[test]
    fn branch_is_last_ref_segment() {
        let event = parse(r#"{"ref": "refs/heads/feature/nested"}"#);
        assert_eq!(event.branch(), "nested");

        let event = parse(r#"{"ref": "main"}"#);
        assert_eq!(event.branch(), "main");

        let event = parse(r#"{"ref": ""}"#);
        assert_eq!(event.branch(), "unknown branch");
    }

    #[test]
    fn null_fields_are_tolerated() {
        let event = parse(r#"{"repository": null, "pusher": null, "ref": null, "commits": []}"#);
        assert_eq!(event.repo_full_name(), "unknown repo");
    }

    #[test]
    fn null_commit_message_is_tolerated() {
        let event = parse(r#"{"commits": [{"message": null}, {"message": "ok"}, {}]}"#);

        let messages: Vec<&str> = event.commit_messages().collect();
        assert_eq!(messages, vec!["", "ok", ""]);
    }

    #[test]
    fn unparseable_body_is_an_error() {
        let result: Result<PushEvent, _> = serde_json::from_str("not json");
        assert!(result.is_err());

        // Non-object JSON also fails; the server maps this to a 400.
        let result: Result<PushEvent, _> = serde_json::from_str("[1,2,3]");
        assert!(result.is_err());
    }
}
