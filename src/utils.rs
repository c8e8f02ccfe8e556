#![allow(dead_code)]

use std::path::PathBuf;

/// Configuration required to run the backup process.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Clone)]
pub struct BackupConfig {
    pub storage_dir: PathBuf,
    pub username: String,
    pub incremental: bool,
    pub verbose: bool,
    pub quiet: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Descending,
    Ascending,
}

/// Stable sort-by-key, newest-first or oldest-first.
///
/// Descending is the primary order (it is what the Rocket.Chat history API
/// returns); ascending is simply the reverse of the descending output rather
/// than a second algorithm. Equal keys keep their original relative order in
/// the descending case, which matters because the server's own ordering is
/// trusted as the tiebreak.
pub fn stable_sort_by_key<T, K, F>(items: &mut [T], key: F, order: SortOrder)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    if order == SortOrder::Ascending {
        items.reverse();
    }
}

/// Replace anything that could upset a filesystem with '_'.
/// Dots are replaced too, matching the historical archive naming.
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Stable archive filename for a direct-message room: the sorted non-self
/// participant usernames, sanitized and joined by '_'.
pub fn archive_filename(own_username: &str, usernames: &[String]) -> String {
    let mut others: Vec<String> = usernames
        .iter()
        .filter(|u| u.as_str() != own_username)
        .map(|u| sanitize_component(u))
        .collect();
    others.sort();
    others.dedup();
    format!("im_{}.json", others.join("_"))
}
