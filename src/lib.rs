//! # rocketchat-im-backup
//!
//! A CLI tool that backs up [Rocket.Chat](https://rocket.chat) direct-message
//! conversations to local JSON archive files.
//!
//! ## What it does
//!
//! For every two-or-more-party direct-message chat the user is part of, the
//! tool fetches the message history over the Rocket.Chat REST API and writes
//! it to one JSON file per chat (`im_<partner-usernames>.json`), messages
//! ordered newest-first. Message payloads are stored exactly as the server
//! sent them — the schema belongs to Rocket.Chat and is passed through
//! untouched.
//!
//! ## Incremental backup
//!
//! With `-i`, an existing archive file is loaded first and only the delta
//! between the server's message counter and the local count is fetched. The
//! history fetch is boundary-inclusive, so the one overlapping message is
//! detected by timestamp and dropped before the batch is merged in front of
//! the stored history. An archive file that exists but no longer parses is
//! reported as a failed chat rather than silently re-fetched from scratch.
//!
//! ## Usage
//!
//! ```sh
//! # Full backup
//! rocketchat-im-backup jane.doe --server https://chat.example.org
//!
//! # Incremental, custom storage directory
//! rocketchat-im-backup jane.doe -i --storage-dir ~/backups/rocketchat
//! ```
//!
//! Preferences can be persisted in `~/.config/rocketchat-im-backup/config.toml`.
//!
//! ## Caveats
//!
//! The delta computation trusts the server's total message counter; edits or
//! deletions of already-archived messages, or a server-side retention cap
//! shorter than the gap since the last run, can cause messages to be missed.
//! Overlap detection is timestamp-based and assumes no two messages in a chat
//! share the exact same timestamp.
