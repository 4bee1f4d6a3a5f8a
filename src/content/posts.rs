use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::models::{ModerationStatus, Photo, Post, PostCategory, User};
use crate::db::{format_time, json_column, new_id, time_column};
use crate::error::{AppError, AppResult};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_CONTENT_CHARS: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: PostCategory,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewPost {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title cannot be empty".into()));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::BadRequest(format!(
                "Title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::BadRequest("Content cannot be empty".into()));
        }
        if self.content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::BadRequest(format!(
                "Content must be at most {} characters",
                MAX_CONTENT_CHARS
            )));
        }
        Ok(())
    }

    /// Text handed to the moderation gate.
    pub fn moderation_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i64,
}

/// Persist a post that already passed moderation.
pub fn insert_approved(conn: &Connection, author: &User, new: NewPost) -> AppResult<Post> {
    let post = Post {
        id: new_id("post"),
        author_id: author.id.clone(),
        author_name: author.name.clone(),
        author_picture: author.picture.clone(),
        title: new.title,
        content: new.content,
        images: new.images,
        category: new.category,
        tags: new.tags,
        likes_count: 0,
        comments_count: 0,
        is_moderated: true,
        moderation_status: ModerationStatus::Approved,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO posts (id, author_id, author_name, author_picture, title, content, images, \
         category, tags, likes_count, comments_count, is_moderated, moderation_status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, 0, 1, ?10, ?11)",
        params![
            post.id,
            post.author_id,
            post.author_name,
            post.author_picture,
            post.title,
            post.content,
            serde_json::to_string(&post.images)?,
            post.category,
            serde_json::to_string(&post.tags)?,
            post.moderation_status,
            format_time(&post.created_at)
        ],
    )?;

    Ok(post)
}

/// Approved posts, newest first.
pub fn list(
    conn: &Connection,
    category: Option<PostCategory>,
    limit: i64,
    skip: i64,
) -> AppResult<Vec<Post>> {
    let sql = format!(
        "SELECT {} FROM posts
         WHERE moderation_status = 'approved' AND (?1 IS NULL OR category = ?1)
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3",
        Post::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params![category, limit, skip.max(0)], Post::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn get(conn: &Connection, post_id: &str) -> AppResult<Post> {
    let sql = format!(
        "SELECT {} FROM posts WHERE id = ?1 AND moderation_status = 'approved'",
        Post::COLUMNS
    );
    conn.query_row(&sql, params![post_id], Post::from_row)
        .optional()?
        .ok_or_else(|| AppError::not_found("Post"))
}

/// Like if not yet liked, otherwise unlike. The like row and the counter
/// change commit together.
pub fn toggle_like(conn: &mut Connection, post_id: &str, user_id: &str) -> AppResult<LikeToggle> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let exists: bool = tx
        .query_row(
            "SELECT 1 FROM posts WHERE id = ?1 AND moderation_status = 'approved'",
            params![post_id],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    if !exists {
        return Err(AppError::not_found("Post"));
    }

    let removed = tx.execute(
        "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
        params![post_id, user_id],
    )?;

    let liked = if removed > 0 {
        tx.execute(
            "UPDATE posts SET likes_count = MAX(likes_count - 1, 0) WHERE id = ?1",
            params![post_id],
        )?;
        false
    } else {
        tx.execute(
            "INSERT INTO likes (post_id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![post_id, user_id, format_time(&Utc::now())],
        )?;
        tx.execute(
            "UPDATE posts SET likes_count = likes_count + 1 WHERE id = ?1",
            params![post_id],
        )?;
        true
    };

    let likes_count: i64 = tx.query_row(
        "SELECT likes_count FROM posts WHERE id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;
    tx.commit()?;

    Ok(LikeToggle { liked, likes_count })
}

// -- Gallery --

fn explode_photos(
    post_id: &str,
    title: &str,
    author_name: Option<&str>,
    images: Vec<String>,
    created_at: chrono::DateTime<Utc>,
) -> Vec<Photo> {
    images
        .into_iter()
        .enumerate()
        .map(|(idx, image)| Photo {
            photo_id: format!("{}_{}", post_id, idx),
            post_id: post_id.to_string(),
            post_title: title.to_string(),
            author_name: author_name.map(str::to_string),
            image_url: image,
            created_at,
        })
        .collect()
}

type PhotoRow = (String, String, String, Vec<String>, chrono::DateTime<Utc>);

fn photo_rows(conn: &Connection, sql: &str, param: &dyn rusqlite::ToSql) -> AppResult<Vec<PhotoRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([param], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                json_column(row, 3)?,
                time_column(row, 4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every image on the user's own posts, newest post first.
pub fn photos_by_author(conn: &Connection, author_id: &str) -> AppResult<Vec<Photo>> {
    let rows = photo_rows(
        conn,
        "SELECT id, title, author_name, images, created_at FROM posts
         WHERE author_id = ?1 AND images != '[]'
         ORDER BY created_at DESC, rowid DESC",
        &author_id,
    )?;
    Ok(rows
        .into_iter()
        .flat_map(|(id, title, _, images, created_at)| {
            explode_photos(&id, &title, None, images, created_at)
        })
        .collect())
}

/// Images from the newest `limit` approved posts that have any.
pub fn community_photos(conn: &Connection, limit: i64) -> AppResult<Vec<Photo>> {
    let rows = photo_rows(
        conn,
        "SELECT id, title, author_name, images, created_at FROM posts
         WHERE moderation_status = 'approved' AND images != '[]'
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?1",
        &limit,
    )?;
    Ok(rows
        .into_iter()
        .flat_map(|(id, title, author, images, created_at)| {
            explode_photos(&id, &title, Some(&author), images, created_at)
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::content::users::tests::make_user;
    use crate::db;

    pub(crate) fn new_post(title: &str, category: PostCategory) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "Some thoughts".to_string(),
            images: vec![],
            category,
            tags: vec![],
        }
    }

    #[test]
    fn validation_limits() {
        assert!(new_post("ok", PostCategory::General).validate().is_ok());
        assert!(new_post("  ", PostCategory::General).validate().is_err());
        assert!(new_post(&"t".repeat(201), PostCategory::General)
            .validate()
            .is_err());
        assert!(new_post(&"t".repeat(200), PostCategory::General)
            .validate()
            .is_ok());

        let mut long = new_post("ok", PostCategory::General);
        long.content = "c".repeat(10_001);
        assert!(long.validate().is_err());
    }

    #[test]
    fn moderation_text_joins_title_and_content() {
        assert_eq!(
            new_post("Hi", PostCategory::General).moderation_text(),
            "Hi\nSome thoughts"
        );
    }

    #[test]
    fn insert_snapshots_author_and_marks_approved() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let author = make_user(&conn, "ana@example.com", "Ana");

        let post = insert_approved(&conn, &author, new_post("Hello", PostCategory::Pregnancy)).unwrap();
        assert!(post.id.starts_with("post_"));
        assert_eq!(post.author_name, "Ana");
        assert!(post.is_moderated);

        let fetched = get(&conn, &post.id).unwrap();
        assert_eq!(fetched, post);
    }

    #[test]
    fn list_filters_by_category_and_pages() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let author = make_user(&conn, "ana@example.com", "Ana");
        for i in 0..3 {
            insert_approved(&conn, &author, new_post(&format!("p{}", i), PostCategory::Pregnancy))
                .unwrap();
        }
        insert_approved(&conn, &author, new_post("general", PostCategory::General)).unwrap();

        let pregnancy = list(&conn, Some(PostCategory::Pregnancy), 20, 0).unwrap();
        assert_eq!(pregnancy.len(), 3);
        assert_eq!(pregnancy[0].title, "p2");

        let page = list(&conn, None, 2, 1).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "p2");
    }

    #[test]
    fn rejected_posts_are_invisible() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let author = make_user(&conn, "ana@example.com", "Ana");
        conn.execute(
            "INSERT INTO posts (id, author_id, author_name, title, content, category, \
             is_moderated, moderation_status, created_at)
             VALUES ('post_bad', ?1, 'Ana', 't', 'c', 'general', 1, 'rejected', ?2)",
            params![author.id, format_time(&Utc::now())],
        )
        .unwrap();

        assert!(matches!(get(&conn, "post_bad"), Err(AppError::NotFound(_))));
        assert!(list(&conn, None, 20, 0).unwrap().is_empty());
    }

    #[test]
    fn like_toggles_and_restores_count() {
        let pool = db::test_pool();
        let mut conn = pool.get().unwrap();
        let author = make_user(&conn, "ana@example.com", "Ana");
        let fan = make_user(&conn, "bo@example.com", "Bo");
        let post = insert_approved(&conn, &author, new_post("Hello", PostCategory::General)).unwrap();

        let first = toggle_like(&mut conn, &post.id, &fan.id).unwrap();
        assert_eq!(first, LikeToggle { liked: true, likes_count: 1 });

        let second = toggle_like(&mut conn, &post.id, &fan.id).unwrap();
        assert_eq!(second, LikeToggle { liked: false, likes_count: 0 });
        assert_eq!(get(&conn, &post.id).unwrap().likes_count, 0);
    }

    #[test]
    fn like_counts_are_per_user() {
        let pool = db::test_pool();
        let mut conn = pool.get().unwrap();
        let author = make_user(&conn, "ana@example.com", "Ana");
        let bo = make_user(&conn, "bo@example.com", "Bo");
        let cy = make_user(&conn, "cy@example.com", "Cy");
        let post = insert_approved(&conn, &author, new_post("Hello", PostCategory::General)).unwrap();

        toggle_like(&mut conn, &post.id, &bo.id).unwrap();
        let state = toggle_like(&mut conn, &post.id, &cy.id).unwrap();
        assert_eq!(state.likes_count, 2);
    }

    #[test]
    fn liking_unknown_post_is_not_found() {
        let pool = db::test_pool();
        let mut conn = pool.get().unwrap();
        let fan = make_user(&conn, "bo@example.com", "Bo");
        let err = toggle_like(&mut conn, "post_missing", &fan.id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn gallery_explodes_images() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let author = make_user(&conn, "ana@example.com", "Ana");
        let other = make_user(&conn, "bo@example.com", "Bo");

        let mut with_images = new_post("Bump", PostCategory::Pregnancy);
        with_images.images = vec!["img-a".into(), "img-b".into()];
        let post = insert_approved(&conn, &author, with_images).unwrap();
        insert_approved(&conn, &author, new_post("No pics", PostCategory::General)).unwrap();

        let mut theirs = new_post("Nursery", PostCategory::General);
        theirs.images = vec!["img-c".into()];
        insert_approved(&conn, &other, theirs).unwrap();

        let mine = photos_by_author(&conn, &author.id).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].photo_id, format!("{}_0", post.id));
        assert_eq!(mine[1].image_url, "img-b");
        assert!(mine[0].author_name.is_none());

        let community = community_photos(&conn, 50).unwrap();
        assert_eq!(community.len(), 3);
        assert_eq!(community[0].author_name.as_deref(), Some("Bo"));

        let newest_only = community_photos(&conn, 1).unwrap();
        assert_eq!(newest_only.len(), 1);
    }
}
