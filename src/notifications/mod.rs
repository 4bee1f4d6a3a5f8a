use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::config::PushConfig;
use crate::db::models::{NotificationPreferences, Platform, Post};
use crate::db::{format_time, new_id};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// Expo accepts at most this many messages per request.
const EXPO_CHUNK: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send_batch(&self, messages: Vec<PushMessage>) -> anyhow::Result<()>;
}

pub struct ExpoPushClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl ExpoPushClient {
    pub fn new(http: reqwest::Client, config: &PushConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            access_token: config.access_token.clone(),
        }
    }
}

#[async_trait]
impl PushSender for ExpoPushClient {
    async fn send_batch(&self, messages: Vec<PushMessage>) -> anyhow::Result<()> {
        for chunk in messages.chunks(EXPO_CHUNK) {
            let mut request = self.http.post(&self.endpoint).json(chunk);
            if let Some(ref token) = self.access_token {
                request = request.bearer_auth(token);
            }
            request.send().await?.error_for_status()?;
        }
        Ok(())
    }
}

// -- Fan-out --

fn title_excerpt(title: &str) -> String {
    title.chars().take(50).collect()
}

pub fn new_post_messages(post: &Post, tokens: Vec<String>) -> Vec<PushMessage> {
    let body = format!("{}: {}...", post.author_name, title_excerpt(&post.title));
    let data = serde_json::json!({
        "type": "new_post",
        "post_id": post.id,
        "category": post.category,
    });
    tokens
        .into_iter()
        .map(|to| PushMessage {
            to,
            title: "New Post in Your Interest".to_string(),
            body: body.clone(),
            data: data.clone(),
        })
        .collect()
}

/// Active tokens of users interested in the post's category, minus the
/// author and anyone who turned new-post notifications off.
pub fn recipient_tokens(conn: &Connection, post: &Post) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.token FROM push_tokens t
         JOIN users u ON u.id = t.user_id
         LEFT JOIN notification_preferences p ON p.user_id = u.id
         WHERE t.is_active = 1
           AND u.id != ?1
           AND COALESCE(p.new_posts, 1) = 1
           AND EXISTS (SELECT 1 FROM json_each(u.interests) WHERE value = ?2)
         ORDER BY t.created_at ASC",
    )?;
    let tokens = stmt
        .query_map(params![post.author_id, post.category], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(tokens)
}

/// Best effort: every failure is logged and swallowed.
pub async fn notify_new_post(db: &DbPool, push: &dyn PushSender, post: &Post) {
    let tokens = {
        let conn = match db.get() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("New-post fan-out could not get a connection: {}", e);
                return;
            }
        };
        match recipient_tokens(&conn, post) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!("New-post fan-out lookup failed: {}", e);
                return;
            }
        }
    };
    if tokens.is_empty() {
        return;
    }

    let count = tokens.len();
    match push.send_batch(new_post_messages(post, tokens)).await {
        Ok(()) => tracing::info!("Sent {} new-post notifications for {}", count, post.id),
        Err(e) => tracing::error!("Sending new-post notifications failed: {:#}", e),
    }
}

// -- Tokens & preferences --

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRegistration {
    pub token: String,
    pub platform: Platform,
}

/// Upsert on the token; the latest registrant owns it and it is reactivated.
pub fn register_token(conn: &Connection, user_id: &str, reg: &TokenRegistration) -> AppResult<()> {
    conn.execute(
        "INSERT INTO push_tokens (token, id, user_id, platform, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)
         ON CONFLICT (token) DO UPDATE SET
            user_id = excluded.user_id,
            platform = excluded.platform,
            is_active = 1",
        params![
            reg.token,
            new_id("token"),
            user_id,
            reg.platform,
            format_time(&Utc::now())
        ],
    )?;
    Ok(())
}

/// Stored preferences, created with defaults on first read.
pub fn get_preferences(conn: &Connection, user_id: &str) -> AppResult<NotificationPreferences> {
    conn.execute(
        "INSERT OR IGNORE INTO notification_preferences (user_id) VALUES (?1)",
        params![user_id],
    )?;
    let prefs = conn
        .query_row(
            "SELECT user_id, new_posts, milestone_reminders, group_updates, premium_notifications
             FROM notification_preferences WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(NotificationPreferences {
                    user_id: row.get(0)?,
                    new_posts: row.get(1)?,
                    milestone_reminders: row.get(2)?,
                    group_updates: row.get(3)?,
                    premium_notifications: row.get(4)?,
                })
            },
        )
        .optional()?;
    prefs.ok_or_else(|| AppError::not_found("Preferences"))
}

/// Unknown keys (e.g. `user_id` echoed back from a GET) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub new_posts: Option<bool>,
    pub milestone_reminders: Option<bool>,
    pub group_updates: Option<bool>,
    pub premium_notifications: Option<bool>,
}

pub fn update_preferences(
    conn: &Connection,
    user_id: &str,
    update: &PreferencesUpdate,
) -> AppResult<NotificationPreferences> {
    conn.execute(
        "INSERT INTO notification_preferences
            (user_id, new_posts, milestone_reminders, group_updates, premium_notifications)
         VALUES (?1, COALESCE(?2, 1), COALESCE(?3, 1), COALESCE(?4, 1), COALESCE(?5, 1))
         ON CONFLICT (user_id) DO UPDATE SET
            new_posts = COALESCE(?2, new_posts),
            milestone_reminders = COALESCE(?3, milestone_reminders),
            group_updates = COALESCE(?4, group_updates),
            premium_notifications = COALESCE(?5, premium_notifications)",
        params![
            user_id,
            update.new_posts,
            update.milestone_reminders,
            update.group_updates,
            update.premium_notifications
        ],
    )?;
    get_preferences(conn, user_id)
}
