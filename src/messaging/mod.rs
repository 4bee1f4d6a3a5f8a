//! Direct messages between two users. A conversation is identified by its
//! sorted participant pair, so either side sending first lands in the same
//! thread.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Deserialize;

use crate::content::users;
use crate::db::models::{Conversation, Message, User};
use crate::db::{format_time, new_id, parse_time};
use crate::error::{AppError, AppResult};

pub const DEFAULT_MESSAGE_LIMIT: i64 = 50;
pub const MAX_MESSAGE_LIMIT: i64 = 200;
const CONVERSATION_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub recipient_id: String,
    pub content: String,
}

/// Order-independent key for a pair of users.
pub fn pair_key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

pub fn send_message(conn: &mut Connection, sender: &User, new: NewMessage) -> AppResult<Message> {
    if new.content.trim().is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".into()));
    }
    if new.recipient_id == sender.id {
        return Err(AppError::BadRequest("Cannot send a message to yourself".into()));
    }
    let recipient = users::find_by_id(conn, &new.recipient_id)?
        .ok_or_else(|| AppError::not_found("Recipient"))?;

    let (a, b) = pair_key(&sender.id, &recipient.id);
    let (first, second) = if a == sender.id {
        (sender, &recipient)
    } else {
        (&recipient, sender)
    };
    let now = format_time(&Utc::now());

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "INSERT INTO conversations (id, participant_a, participant_b, participant_a_name, \
         participant_a_picture, participant_b_name, participant_b_picture, last_message, \
         last_message_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
         ON CONFLICT (participant_a, participant_b) DO UPDATE SET
            last_message = excluded.last_message,
            last_message_at = excluded.last_message_at",
        params![
            new_id("conv"),
            a,
            b,
            first.name,
            first.picture,
            second.name,
            second.picture,
            new.content,
            now
        ],
    )?;

    let conversation_id: String = tx.query_row(
        "SELECT id FROM conversations WHERE participant_a = ?1 AND participant_b = ?2",
        params![a, b],
        |row| row.get(0),
    )?;

    let message = Message {
        id: new_id("msg"),
        conversation_id,
        sender_id: sender.id.clone(),
        sender_name: sender.name.clone(),
        sender_picture: sender.picture.clone(),
        content: new.content,
        read: false,
        created_at: parse_time(&now).unwrap_or_else(Utc::now),
    };

    tx.execute(
        "INSERT INTO messages (id, conversation_id, sender_id, sender_name, sender_picture, \
         content, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![
            message.id,
            message.conversation_id,
            message.sender_id,
            message.sender_name,
            message.sender_picture,
            message.content,
            now
        ],
    )?;
    tx.commit()?;

    Ok(message)
}

/// The user's conversations, most recently active first, each with a live
/// count of messages the user has not read.
pub fn list_conversations(conn: &Connection, user_id: &str) -> AppResult<Vec<Conversation>> {
    let sql = format!(
        "SELECT {},
            (SELECT COUNT(*) FROM messages m
             WHERE m.conversation_id = c.id AND m.sender_id != ?1 AND m.read = 0)
         FROM conversations c
         WHERE c.participant_a = ?1 OR c.participant_b = ?1
         ORDER BY c.last_message_at DESC, c.rowid DESC
         LIMIT ?2",
        Conversation::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let conversations = stmt
        .query_map(params![user_id, CONVERSATION_LIMIT], Conversation::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(conversations)
}

/// Messages oldest first, as they stood before this read; afterwards every
/// message addressed to the viewer is marked read.
pub fn get_messages(
    conn: &mut Connection,
    conversation_id: &str,
    user_id: &str,
    limit: i64,
) -> AppResult<Vec<Message>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let participant = tx
        .query_row(
            "SELECT 1 FROM conversations
             WHERE id = ?1 AND (participant_a = ?2 OR participant_b = ?2)",
            params![conversation_id, user_id],
            |_| Ok(()),
        )
        .optional()?;
    if participant.is_none() {
        return Err(AppError::not_found("Conversation"));
    }

    let messages = {
        let sql = format!(
            "SELECT {} FROM messages WHERE conversation_id = ?1
             ORDER BY created_at ASC, rowid ASC LIMIT ?2",
            Message::COLUMNS
        );
        let mut stmt = tx.prepare(&sql)?;
        let rows = stmt
            .query_map(params![conversation_id, limit], Message::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let marked = tx.execute(
        "UPDATE messages SET read = 1
         WHERE conversation_id = ?1 AND sender_id != ?2 AND read = 0",
        params![conversation_id, user_id],
    )?;
    tx.commit()?;

    if marked > 0 {
        tracing::debug!("Marked {} messages read in {}", marked, conversation_id);
    }
    Ok(messages)
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_MESSAGE_LIMIT)
        .clamp(1, MAX_MESSAGE_LIMIT)
}
