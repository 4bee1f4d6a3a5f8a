use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db::{json_column, optional_time_column, time_column};

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Closed set of string values stored as TEXT and sent as snake_case JSON.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum!(PregnancyStage, "pregnancy stage", {
    Expecting => "expecting",
    Postpartum0To1Year => "postpartum_0_1y",
    Postpartum1To3Years => "postpartum_1_3y",
});

text_enum!(PostCategory, "category", {
    Pregnancy => "pregnancy",
    Childbirth => "childbirth",
    Postpartum => "postpartum",
    BabyMilestones => "baby_milestones",
    General => "general",
});

text_enum!(ModerationStatus, "moderation status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

text_enum!(MilestoneType, "milestone type", {
    Physical => "physical",
    Cognitive => "cognitive",
    Social => "social",
    Language => "language",
});

text_enum!(ResourceType, "resource type", {
    Article => "article",
    Video => "video",
    Guide => "guide",
});

text_enum!(Platform, "platform", {
    Ios => "ios",
    Android => "android",
    Web => "web",
});

// -- Accounts --

/// Stored user. Deliberately not `Serialize`: the wire shape is `UserProfile`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub picture: Option<String>,
    pub bio: Option<String>,
    pub pregnancy_stage: Option<PregnancyStage>,
    pub due_date: Option<String>,
    pub children_count: i64,
    pub interests: Vec<String>,
    pub is_premium: bool,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const COLUMNS: &'static str = "id, email, name, first_name, last_name, phone_number, \
         address, country, picture, bio, pregnancy_stage, due_date, children_count, \
         interests, is_premium, password_hash, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            phone_number: row.get(5)?,
            address: row.get(6)?,
            country: row.get(7)?,
            picture: row.get(8)?,
            bio: row.get(9)?,
            pregnancy_stage: row.get(10)?,
            due_date: row.get(11)?,
            children_count: row.get(12)?,
            interests: json_column(row, 13)?,
            is_premium: row.get(14)?,
            password_hash: row.get(15)?,
            created_at: time_column(row, 16)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub picture: Option<String>,
    pub bio: Option<String>,
    pub pregnancy_stage: Option<PregnancyStage>,
    pub due_date: Option<String>,
    pub children_count: i64,
    pub interests: Vec<String>,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            address: user.address.clone(),
            country: user.country.clone(),
            picture: user.picture.clone(),
            bio: user.bio.clone(),
            pregnancy_stage: user.pregnancy_stage,
            due_date: user.due_date.clone(),
            children_count: user.children_count,
            interests: user.interests.clone(),
            is_premium: user.is_premium,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub session_token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

// -- Content --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "post_id")]
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_picture: Option<String>,
    pub title: String,
    pub content: String,
    pub images: Vec<String>,
    pub category: PostCategory,
    pub tags: Vec<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_moderated: bool,
    pub moderation_status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub const COLUMNS: &'static str = "id, author_id, author_name, author_picture, title, \
         content, images, category, tags, likes_count, comments_count, is_moderated, \
         moderation_status, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            author_id: row.get(1)?,
            author_name: row.get(2)?,
            author_picture: row.get(3)?,
            title: row.get(4)?,
            content: row.get(5)?,
            images: json_column(row, 6)?,
            category: row.get(7)?,
            tags: json_column(row, 8)?,
            likes_count: row.get(9)?,
            comments_count: row.get(10)?,
            is_moderated: row.get(11)?,
            moderation_status: row.get(12)?,
            created_at: time_column(row, 13)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "comment_id")]
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_picture: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub const COLUMNS: &'static str =
        "id, post_id, author_id, author_name, author_picture, content, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            post_id: row.get(1)?,
            author_id: row.get(2)?,
            author_name: row.get(3)?,
            author_picture: row.get(4)?,
            content: row.get(5)?,
            created_at: time_column(row, 6)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub photo_id: String,
    pub post_id: String,
    pub post_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forum {
    #[serde(rename = "forum_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: PostCategory,
    pub members_count: i64,
    pub posts_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Forum {
    pub const COLUMNS: &'static str =
        "id, name, description, category, members_count, posts_count, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            members_count: row.get(4)?,
            posts_count: row.get(5)?,
            created_at: time_column(row, 6)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportGroup {
    #[serde(rename = "group_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub theme: String,
    pub members: Vec<String>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(rename = "milestone_id")]
    pub id: String,
    pub user_id: String,
    pub child_name: String,
    pub milestone_type: MilestoneType,
    pub title: String,
    pub description: String,
    pub age_months: i64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Milestone {
    pub const COLUMNS: &'static str = "id, user_id, child_name, milestone_type, title, \
         description, age_months, completed, completed_at, notes, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            child_name: row.get(2)?,
            milestone_type: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            age_months: row.get(6)?,
            completed: row.get(7)?,
            completed_at: optional_time_column(row, 8)?,
            notes: row.get(9)?,
            created_at: time_column(row, 10)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "resource_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub resource_type: ResourceType,
    pub category: PostCategory,
    pub author: String,
    pub tags: Vec<String>,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    pub const COLUMNS: &'static str =
        "id, title, content, resource_type, category, author, tags, is_premium, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            resource_type: row.get(3)?,
            category: row.get(4)?,
            author: row.get(5)?,
            tags: json_column(row, 6)?,
            is_premium: row.get(7)?,
            created_at: time_column(row, 8)?,
        })
    }
}

// -- Messaging --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "conversation_id")]
    pub id: String,
    /// Canonical pair, sorted.
    pub participants: [String; 2],
    pub participant_names: BTreeMap<String, String>,
    pub participant_pictures: BTreeMap<String, Option<String>>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Columns expected by `from_row`; the caller appends the unread count.
    pub const COLUMNS: &'static str = "c.id, c.participant_a, c.participant_b, \
         c.participant_a_name, c.participant_a_picture, c.participant_b_name, \
         c.participant_b_picture, c.last_message, c.last_message_at, c.created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let a: String = row.get(1)?;
        let b: String = row.get(2)?;

        let mut participant_names = BTreeMap::new();
        participant_names.insert(a.clone(), row.get(3)?);
        participant_names.insert(b.clone(), row.get(5)?);

        let mut participant_pictures = BTreeMap::new();
        participant_pictures.insert(a.clone(), row.get(4)?);
        participant_pictures.insert(b.clone(), row.get(6)?);

        Ok(Self {
            id: row.get(0)?,
            participants: [a, b],
            participant_names,
            participant_pictures,
            last_message: row.get(7)?,
            last_message_at: optional_time_column(row, 8)?,
            unread_count: row.get(10)?,
            created_at: time_column(row, 9)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "message_id")]
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_picture: Option<String>,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub const COLUMNS: &'static str =
        "id, conversation_id, sender_id, sender_name, sender_picture, content, read, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            sender_id: row.get(2)?,
            sender_name: row.get(3)?,
            sender_picture: row.get(4)?,
            content: row.get(5)?,
            read: row.get(6)?,
            created_at: time_column(row, 7)?,
        })
    }
}

// -- Notifications --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub user_id: String,
    pub new_posts: bool,
    pub milestone_reminders: bool,
    pub group_updates: bool,
    pub premium_notifications: bool,
}
