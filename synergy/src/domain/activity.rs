// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Inbound activity records pushed by the hosting runtime

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One external interaction as seen by the synergy engine
///
/// The hosting runtime pushes one record per interaction. Only the
/// activity type and the presence of text influence relevance scoring;
/// the correlation id exists for log correlation with the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalActivity {
    pub activity_type: String,
    pub text: Option<String>,
    pub correlation_id: String,
    pub occurred_at: DateTime<Utc>,
}

impl ExternalActivity {
    pub fn new(activity_type: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
            text: None,
            correlation_id: Uuid::new_v4().to_string(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    /// Whether the activity carries non-empty text content
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_defaults() {
        let activity = ExternalActivity::new("message");

        assert_eq!(activity.activity_type, "message");
        assert!(activity.text.is_none());
        assert!(!activity.has_text());
        assert!(!activity.correlation_id.is_empty());
    }

    #[test]
    fn test_empty_text_counts_as_absent() {
        let activity = ExternalActivity::new("message").with_text("");
        assert!(!activity.has_text());

        let with_text = ExternalActivity::new("message").with_text("hello");
        assert!(with_text.has_text());
    }
}
