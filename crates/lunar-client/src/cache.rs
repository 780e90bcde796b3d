use std::collections::HashMap;

use crate::types::ChatSummary;

/// Browser-local mirror of chat summaries.
///
/// Keeps history visible while the database is down: server listings are
/// merged over the cached entries by id, server data winning whenever both
/// sides know a chat.
#[derive(Debug, Default)]
pub struct SummaryCache {
    entries: HashMap<String, ChatSummary>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remember a summary locally (e.g. after creating a chat offline)
    pub fn remember(&mut self, summary: ChatSummary) {
        self.entries.insert(summary.id.clone(), summary);
    }

    pub fn forget(&mut self, id: &str) {
        self.entries.remove(id);
    }

    /// Merge a server listing over the local mirror and return the combined
    /// view, newest-updated first. The merged result is also re-cached.
    pub fn merge(&mut self, server: Vec<ChatSummary>) -> Vec<ChatSummary> {
        for summary in server {
            self.entries.insert(summary.id.clone(), summary);
        }

        let mut combined: Vec<ChatSummary> = self.entries.values().cloned().collect();
        combined.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        combined
    }

    /// The cached view alone, for when the server is unreachable
    pub fn snapshot(&self) -> Vec<ChatSummary> {
        let mut combined: Vec<ChatSummary> = self.entries.values().cloned().collect();
        combined.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn summary(id: &str, title: &str, age_minutes: i64) -> ChatSummary {
        let at = Utc::now() - Duration::minutes(age_minutes);
        ChatSummary {
            id: id.into(),
            title: title.into(),
            created_at: at,
            updated_at: at,
            message_count: 0,
        }
    }

    #[test]
    fn merge_prefers_server_data() {
        let mut cache = SummaryCache::new();
        cache.remember(summary("a", "stale local title", 10));

        let merged = cache.merge(vec![summary("a", "fresh server title", 5)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "fresh server title");
    }

    #[test]
    fn merge_keeps_local_only_chats() {
        let mut cache = SummaryCache::new();
        cache.remember(summary("local", "offline chat", 1));

        let merged = cache.merge(vec![summary("server", "server chat", 2)]);
        assert_eq!(merged.len(), 2);
        // Newest-updated first
        assert_eq!(merged[0].id, "local");
        assert_eq!(merged[1].id, "server");
    }

    #[test]
    fn merge_is_idempotent_without_new_writes() {
        let mut cache = SummaryCache::new();
        let listing = vec![summary("a", "one", 3), summary("b", "two", 1)];

        let first = cache.merge(listing.clone());
        let second = cache.merge(listing);
        assert_eq!(first, second);
    }

    #[test]
    fn forget_removes_deleted_chats() {
        let mut cache = SummaryCache::new();
        cache.remember(summary("gone", "deleted", 1));
        cache.forget("gone");
        assert!(cache.is_empty());
    }
}
