use crate::archive::Message;
use crate::utils::{SortOrder, stable_sort_by_key};

/// Combine a freshly fetched batch with the previously archived messages,
/// newest first.
///
/// The history fetch is boundary-inclusive: its oldest entry re-includes the
/// newest message already archived. That overlap is detected by timestamp,
/// not by identifier — every fetched message whose timestamp equals the
/// newest stored one is dropped. Known limitation: two distinct messages
/// sharing the exact same timestamp would make this drop a legitimate
/// message; identifiers are deliberately not consulted so that merge output
/// stays reproducible against the historical archives.
///
/// Both inputs are stable-sorted descending first, then the deduplicated
/// batch is placed in front of the existing messages. Merging an empty batch
/// returns the existing messages unchanged.
pub fn merge_history(mut existing: Vec<Message>, mut fetched: Vec<Message>) -> Vec<Message> {
    stable_sort_by_key(&mut existing, Message::ts, SortOrder::Descending);
    stable_sort_by_key(&mut fetched, Message::ts, SortOrder::Descending);

    if let Some(boundary_ts) = existing.first().and_then(Message::ts) {
        fetched.retain(|m| m.ts() != Some(boundary_ts));
    }

    fetched.extend(existing);
    fetched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::msg;

    fn ids(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.id().unwrap()).collect()
    }

    #[test]
    fn empty_batch_leaves_archive_unchanged() {
        let existing = vec![
            msg("b", "2024-01-02T00:00:00Z"),
            msg("a", "2024-01-01T00:00:00Z"),
        ];
        let merged = merge_history(existing.clone(), vec![]);
        assert_eq!(merged, existing);
    }

    #[test]
    fn fresh_fetch_with_no_prior_archive_is_sorted_descending() {
        let fetched = vec![
            msg("a", "2024-01-01T00:00:00Z"),
            msg("c", "2024-01-03T00:00:00Z"),
            msg("b", "2024-01-02T00:00:00Z"),
        ];
        let merged = merge_history(vec![], fetched);
        assert_eq!(ids(&merged), vec!["c", "b", "a"]);
    }

    #[test]
    fn boundary_duplicate_is_dropped_not_doubled() {
        let existing = vec![msg("a", "2024-01-05T00:00:00Z")];
        let fetched = vec![
            msg("a", "2024-01-05T00:00:00Z"),
            msg("b", "2024-01-06T00:00:00Z"),
        ];
        let merged = merge_history(existing, fetched);
        assert_eq!(ids(&merged), vec!["b", "a"]);
    }

    #[test]
    fn inclusive_refetch_of_older_history_keeps_every_distinct_message() {
        // Server reports 6 total, archive holds one message at ts=5; the
        // inclusive fetch of 5 returns ts 5,4,3,2,1 and nothing newer. After
        // dropping the ts=5 overlap the batch goes in front of the archive.
        let existing = vec![msg("m5", "2024-01-05T00:00:00Z")];
        let fetched = vec![
            msg("m5", "2024-01-05T00:00:00Z"),
            msg("m4", "2024-01-04T00:00:00Z"),
            msg("m3", "2024-01-03T00:00:00Z"),
            msg("m2", "2024-01-02T00:00:00Z"),
            msg("m1", "2024-01-01T00:00:00Z"),
        ];
        let merged = merge_history(existing, fetched);
        assert_eq!(merged.len(), 5);
        assert_eq!(ids(&merged), vec!["m4", "m3", "m2", "m1", "m5"]);
    }

    #[test]
    fn normal_incremental_merge_is_descending() {
        let existing = vec![
            msg("m2", "2024-01-02T00:00:00Z"),
            msg("m1", "2024-01-01T00:00:00Z"),
        ];
        let fetched = vec![
            msg("m4", "2024-01-04T00:00:00Z"),
            msg("m3", "2024-01-03T00:00:00Z"),
            msg("m2", "2024-01-02T00:00:00Z"),
        ];
        let merged = merge_history(existing, fetched);
        assert_eq!(ids(&merged), vec!["m4", "m3", "m2", "m1"]);
    }

    #[test]
    fn messages_without_timestamps_sort_last_and_survive() {
        let existing = vec![];
        let fetched = vec![
            crate::archive::Message(
                serde_json::json!({ "_id": "orphan" })
                    .as_object()
                    .unwrap()
                    .clone(),
            ),
            msg("a", "2024-01-01T00:00:00Z"),
        ];
        let merged = merge_history(existing, fetched);
        assert_eq!(ids(&merged), vec!["a", "orphan"]);
    }
}
