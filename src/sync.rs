use crate::archive::{self, Archive};
use crate::client::{ChatClient, DirectRoom};
use crate::merge::merge_history;
use crate::plan::FetchPlan;
use crate::utils::{BackupConfig, archive_filename};
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;

/// Keep only genuine conversations: rooms whose participant set holds more
/// than one username. The self-only "notes" room is dropped here.
pub fn conversation_rooms(rooms: Vec<DirectRoom>) -> Vec<DirectRoom> {
    rooms.into_iter().filter(|r| r.usernames.len() > 1).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The server reported no message counter for the room.
    NoMessages,
    /// The server holds no more messages than the local archive.
    NothingNew,
    /// The server answered the history fetch with `success: false`.
    FetchFailed,
}

impl SkipReason {
    fn describe(self) -> &'static str {
        match self {
            SkipReason::NoMessages => "no messages in this chat",
            SkipReason::NothingNew => "no new messages",
            SkipReason::FetchFailed => "server failed to return history",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomOutcome {
    Saved { fetched: u64, total: usize },
    Skipped(SkipReason),
}

/// Back up a single room: plan the delta, fetch it, merge, persist.
///
/// Nothing is written for a skipped room. A corrupt existing archive is an
/// error (the caller reports the room as failed) rather than a reason to
/// re-fetch the full history over it.
fn backup_room(
    client: &dyn ChatClient,
    config: &BackupConfig,
    room: &DirectRoom,
) -> Result<RoomOutcome> {
    let filename = archive_filename(&config.username, &room.usernames);
    let path = config.storage_dir.join(&filename);

    let server_total = client.room_message_counter(&room.id)?;

    let prior = if config.incremental {
        archive::load(&path)?
    } else {
        None
    };
    let stored = prior.as_ref().map_or(0, |a| a.messages.len() as u64);

    let plan = FetchPlan::new(server_total, stored);
    let Some(delta) = plan.delta() else {
        let reason = if plan.server_total.is_none() {
            SkipReason::NoMessages
        } else {
            SkipReason::NothingNew
        };
        return Ok(RoomOutcome::Skipped(reason));
    };

    let history = client.room_history(&room.id, delta)?;
    if !history.success {
        return Ok(RoomOutcome::Skipped(SkipReason::FetchFailed));
    }

    let existing = prior.map_or_else(Vec::new, |a| a.messages);
    let messages = merge_history(existing, history.messages);
    let total = messages.len();

    archive::save(&path, &Archive {
        success: true,
        messages,
    })?;

    Ok(RoomOutcome::Saved {
        fetched: delta,
        total,
    })
}

fn partners(own_username: &str, room: &DirectRoom) -> String {
    room.usernames
        .iter()
        .filter(|u| u.as_str() != own_username)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

/// The main entry point for the backup run: enumerate rooms, then handle
/// them strictly one at a time. No room's failure aborts the run.
pub fn execute(client: &dyn ChatClient, config: &BackupConfig) -> Result<()> {
    fs::create_dir_all(&config.storage_dir).wrap_err_with(|| {
        format!(
            "Failed to create storage directory: {}",
            config.storage_dir.display()
        )
    })?;

    let rooms = conversation_rooms(client.list_direct_rooms()?);

    let pb = if config.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(rooms.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
            )
            .unwrap()
            .progress_chars("=>-"),
        );
        bar.println(format!("Found {} direct-message chats.", rooms.len()));
        bar
    };

    let mut count_saved = 0usize;
    let mut count_skipped = 0usize;
    let mut count_errors = 0usize;

    for room in &rooms {
        let who = partners(&config.username, room);
        match backup_room(client, config, room) {
            Ok(RoomOutcome::Saved { fetched, total }) => {
                count_saved += 1;
                if !config.quiet {
                    pb.println(format!(
                        "Saved {fetched} new message(s) ({total} total) for chat with '{who}'"
                    ));
                }
            }
            Ok(RoomOutcome::Skipped(reason)) => {
                count_skipped += 1;
                if config.verbose {
                    pb.println(format!("Skipped chat with '{who}': {}", reason.describe()));
                }
            }
            Err(e) => {
                count_errors += 1;
                pb.println(format!("Error [chat with '{who}']: {e:#}"));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if !config.quiet {
        let mut summary = format!("Done. {count_saved} saved, {count_skipped} skipped.");
        if count_errors > 0 {
            summary.push_str(&format!(" Completed with {count_errors} error(s)."));
        }
        eprintln!("{summary}");
    }

    Ok(())
}
