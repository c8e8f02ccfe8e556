#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A single chat message, kept as the open JSON object the server sent.
///
/// The message schema belongs to Rocket.Chat, not to us, and gains fields
/// over time; everything is passed through unmodified. Only `_id` and `ts`
/// are ever interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(pub serde_json::Map<String, Value>);

impl Message {
    pub fn id(&self) -> Option<&str> {
        self.0.get("_id").and_then(Value::as_str)
    }

    /// Message timestamp. The REST API reports `ts` as an RFC 3339 string;
    /// older exports carry `{"$date": <epoch ms>}` or a bare millisecond
    /// number. A message without a parseable `ts` yields `None` and sorts
    /// as oldest.
    pub fn ts(&self) -> Option<DateTime<Utc>> {
        self.0.get("ts").and_then(parse_ts)
    }
}

fn parse_ts(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::Object(map) => map.get("$date").and_then(parse_ts),
        _ => None,
    }
}

/// Per-room persisted snapshot: messages ordered newest-first.
/// Matches the on-disk shape `{"success": bool, "messages": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    pub success: bool,
    pub messages: Vec<Message>,
}

/// Load a prior archive if one exists.
///
/// Returns `Ok(None)` when the file is absent. A file that exists but does
/// not parse as an archive is an error, not "no history": silently starting
/// over on corruption would trigger a full re-fetch and could duplicate or
/// lose messages, so the caller must report the room as failed instead.
pub fn load(path: &Path) -> Result<Option<Archive>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .wrap_err_with(|| format!("Failed to read archive: {}", path.display()));
        }
    };
    let archive: Archive = serde_json::from_str(&content).wrap_err_with(|| {
        format!(
            "Existing archive is corrupt (not valid archive JSON): {}",
            path.display()
        )
    })?;
    Ok(Some(archive))
}

/// Persist an archive as indented JSON, replacing any previous file.
///
/// Writes to a temp file in the same directory and renames into place, so a
/// crash mid-write never leaves a half-written archive behind.
pub fn save(path: &Path, archive: &Archive) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .wrap_err_with(|| format!("Failed to create temp file in: {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, archive)
        .wrap_err_with(|| format!("Failed to serialize archive: {}", path.display()))?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .wrap_err_with(|| format!("Failed to replace archive: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn msg(id: &str, ts: &str) -> Message {
    let value = serde_json::json!({ "_id": id, "ts": ts, "msg": format!("body of {id}") });
    match value {
        Value::Object(map) => Message(map),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ts_parses_rfc3339_epoch_and_mongo_shapes() {
        let rfc = msg("a", "2019-03-27T09:19:01.999Z");
        assert_eq!(
            rfc.ts().unwrap(),
            Utc.timestamp_millis_opt(1553678341999).single().unwrap()
        );

        let epoch = Message(
            serde_json::json!({ "_id": "b", "ts": 1553678341999i64 })
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(epoch.ts(), rfc.ts());

        let mongo = Message(
            serde_json::json!({ "_id": "c", "ts": { "$date": 1553678341999i64 } })
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(mongo.ts(), rfc.ts());

        let missing = Message(serde_json::json!({ "_id": "d" }).as_object().unwrap().clone());
        assert_eq!(missing.ts(), None);
    }

    #[test]
    fn save_then_load_round_trips_content_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("im_alice.json");
        let archive = Archive {
            success: true,
            messages: vec![
                msg("m2", "2024-05-02T00:00:00Z"),
                msg("m1", "2024-05-01T00:00:00Z"),
            ],
        };

        save(&path, &archive).unwrap();
        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded, archive);
    }

    #[test]
    fn absent_file_is_none_but_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("im_nobody.json");
        assert!(load(&absent).unwrap().is_none());

        let corrupt = dir.path().join("im_broken.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert!(load(&corrupt).is_err());

        // Wrong shape is corruption too, not "no history"
        let wrong_shape = dir.path().join("im_shape.json");
        fs::write(&wrong_shape, "[1, 2, 3]").unwrap();
        assert!(load(&wrong_shape).is_err());
    }

    #[test]
    fn save_overwrites_previous_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("im_bob.json");
        let first = Archive {
            success: true,
            messages: vec![msg("m1", "2024-05-01T00:00:00Z")],
        };
        let second = Archive {
            success: true,
            messages: vec![
                msg("m2", "2024-05-02T00:00:00Z"),
                msg("m1", "2024-05-01T00:00:00Z"),
            ],
        };

        save(&path, &first).unwrap();
        save(&path, &second).unwrap();
        assert_eq!(load(&path).unwrap().unwrap(), second);
    }
}
