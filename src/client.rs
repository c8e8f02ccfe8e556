use crate::archive::Message;
use eyre::{Context, Result, eyre};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;

/// A direct-message room descriptor as reported by the server.
/// `usernames` includes the acting user.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectRoom {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub usernames: Vec<String>,
}

/// One page of room history. `success: false` means the server refused the
/// fetch; the messages are then meaningless.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomHistory {
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// The chat-service boundary. Transport and authentication live behind it;
/// the sync logic only ever talks to this trait.
pub trait ChatClient {
    fn list_direct_rooms(&self) -> Result<Vec<DirectRoom>>;

    /// Total message count for a room, `None` when the room has none.
    fn room_message_counter(&self, room_id: &str) -> Result<Option<u64>>;

    /// Fetch the latest `count` messages. The fetch is boundary-inclusive:
    /// the oldest returned message may duplicate the newest one already
    /// archived, which the merge step accounts for.
    fn room_history(&self, room_id: &str, count: u64) -> Result<RoomHistory>;
}

#[derive(Deserialize)]
struct LoginResponse {
    status: String,
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Deserialize)]
struct LoginData {
    #[serde(rename = "authToken")]
    auth_token: String,
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Deserialize)]
struct ImListResponse {
    #[serde(default)]
    ims: Vec<DirectRoom>,
}

#[derive(Deserialize)]
struct ImCountersResponse {
    /// Absent when the room holds no messages.
    #[serde(default)]
    msgs: Option<u64>,
}

/// Rocket.Chat REST API client (`/api/v1`).
///
/// Endpoints: `login`, `im.list`, `im.counters`, `im.history` — see
/// <https://developer.rocket.chat/apidocs>. All requests carry the
/// `X-Auth-Token` / `X-User-Id` pair obtained at login.
pub struct RocketChatClient {
    http: Client,
    api_base: String,
    auth_token: String,
    user_id: String,
}

impl RocketChatClient {
    /// Authenticate against the server. Invalid credentials are the one
    /// fatal error of the whole program, so the message names the user.
    pub fn login(server_url: &str, username: &str, password: &str) -> Result<Self> {
        let http = Client::new();
        let api_base = format!("{}/api/v1", server_url.trim_end_matches('/'));

        let response = http
            .post(format!("{api_base}/login"))
            .json(&serde_json::json!({ "user": username, "password": password }))
            .send()
            .wrap_err_with(|| format!("Failed to reach server: {server_url}"))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(eyre!("Invalid credentials for user '{username}'"));
        }
        let login: LoginResponse = response
            .error_for_status()
            .wrap_err("Login request failed")?
            .json()
            .wrap_err("Failed to parse login response")?;

        match (login.status.as_str(), login.data) {
            ("success", Some(data)) => Ok(Self {
                http,
                api_base,
                auth_token: data.auth_token,
                user_id: data.user_id,
            }),
            _ => Err(eyre!("Invalid credentials for user '{username}'")),
        }
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.http
            .get(format!("{}/{endpoint}", self.api_base))
            .header("X-Auth-Token", &self.auth_token)
            .header("X-User-Id", &self.user_id)
    }
}

impl ChatClient for RocketChatClient {
    fn list_direct_rooms(&self) -> Result<Vec<DirectRoom>> {
        let response: ImListResponse = self
            .get("im.list")
            .send()
            .wrap_err("im.list request failed")?
            .error_for_status()
            .wrap_err("im.list returned an error status")?
            .json()
            .wrap_err("Failed to parse im.list response")?;
        Ok(response.ims)
    }

    fn room_message_counter(&self, room_id: &str) -> Result<Option<u64>> {
        let response: ImCountersResponse = self
            .get("im.counters")
            .query(&[("roomId", room_id)])
            .send()
            .wrap_err("im.counters request failed")?
            .error_for_status()
            .wrap_err("im.counters returned an error status")?
            .json()
            .wrap_err("Failed to parse im.counters response")?;
        Ok(response.msgs)
    }

    fn room_history(&self, room_id: &str, count: u64) -> Result<RoomHistory> {
        self.get("im.history")
            .query(&[
                ("roomId", room_id),
                ("count", &count.to_string()),
                ("inclusive", "true"),
            ])
            .send()
            .wrap_err("im.history request failed")?
            .error_for_status()
            .wrap_err("im.history returned an error status")?
            .json()
            .wrap_err("Failed to parse im.history response")
    }
}
