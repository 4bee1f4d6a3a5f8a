use chrono::Utc;
use rusqlite::{params, Connection, TransactionBehavior};
use serde::Deserialize;

use crate::db::models::{Comment, User};
use crate::db::{format_time, new_id};
use crate::error::{AppError, AppResult};

pub const MAX_COMMENT_CHARS: usize = 2_000;
const LIST_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub post_id: String,
    pub content: String,
}

impl NewComment {
    pub fn validate(&self) -> AppResult<()> {
        if self.content.trim().is_empty() {
            return Err(AppError::BadRequest("Comment cannot be empty".into()));
        }
        if self.content.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::BadRequest(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_CHARS
            )));
        }
        Ok(())
    }
}

/// Fail early, before paying for moderation, when the post is gone.
pub fn ensure_post_exists(conn: &Connection, post_id: &str) -> AppResult<()> {
    let found: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1 AND moderation_status = 'approved'",
        params![post_id],
        |row| row.get(0),
    )?;
    if found {
        Ok(())
    } else {
        Err(AppError::not_found("Post"))
    }
}

/// Append a comment and bump the parent's `comments_count` in one transaction.
pub fn insert(conn: &mut Connection, author: &User, new: NewComment) -> AppResult<Comment> {
    let comment = Comment {
        id: new_id("comment"),
        post_id: new.post_id,
        author_id: author.id.clone(),
        author_name: author.name.clone(),
        author_picture: author.picture.clone(),
        content: new.content,
        created_at: Utc::now(),
    };

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let bumped = tx.execute(
        "UPDATE posts SET comments_count = comments_count + 1
         WHERE id = ?1 AND moderation_status = 'approved'",
        params![comment.post_id],
    )?;
    if bumped == 0 {
        return Err(AppError::not_found("Post"));
    }
    tx.execute(
        "INSERT INTO comments (id, post_id, author_id, author_name, author_picture, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            comment.id,
            comment.post_id,
            comment.author_id,
            comment.author_name,
            comment.author_picture,
            comment.content,
            format_time(&comment.created_at)
        ],
    )?;
    tx.commit()?;

    Ok(comment)
}

/// Oldest first.
pub fn list_for_post(conn: &Connection, post_id: &str) -> AppResult<Vec<Comment>> {
    let sql = format!(
        "SELECT {} FROM comments WHERE post_id = ?1 ORDER BY created_at ASC, rowid ASC LIMIT ?2",
        Comment::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let comments = stmt
        .query_map(params![post_id, LIST_LIMIT], Comment::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::posts::{self, tests::new_post};
    use crate::content::users::tests::make_user;
    use crate::db;
    use crate::db::models::PostCategory;

    #[test]
    fn insert_bumps_counter_and_lists_in_order() {
        let pool = db::test_pool();
        let mut conn = pool.get().unwrap();
        let author = make_user(&conn, "ana@example.com", "Ana");
        let post =
            posts::insert_approved(&conn, &author, new_post("Hello", PostCategory::General)).unwrap();

        for text in ["first", "second"] {
            insert(
                &mut conn,
                &author,
                NewComment {
                    post_id: post.id.clone(),
                    content: text.into(),
                },
            )
            .unwrap();
        }

        assert_eq!(posts::get(&conn, &post.id).unwrap().comments_count, 2);
        let listed = list_for_post(&conn, &post.id).unwrap();
        let texts: Vec<_> = listed.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(listed[0].author_name, "Ana");
    }

    #[test]
    fn comment_on_missing_post_is_not_found() {
        let pool = db::test_pool();
        let mut conn = pool.get().unwrap();
        let author = make_user(&conn, "ana@example.com", "Ana");
        assert!(matches!(
            ensure_post_exists(&conn, "post_nope"),
            Err(AppError::NotFound(_))
        ));
        let err = insert(
            &mut conn,
            &author,
            NewComment {
                post_id: "post_nope".into(),
                content: "hi".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(list_for_post(&conn, "post_nope").unwrap().is_empty());
    }

    #[test]
    fn validation_limits() {
        let ok = NewComment {
            post_id: "p".into(),
            content: "c".repeat(2_000),
        };
        assert!(ok.validate().is_ok());
        let long = NewComment {
            post_id: "p".into(),
            content: "c".repeat(2_001),
        };
        assert!(long.validate().is_err());
        let blank = NewComment {
            post_id: "p".into(),
            content: " ".into(),
        };
        assert!(blank.validate().is_err());
    }
}
