use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Forum, SupportGroup};
use crate::db::{format_time, time_column};
use crate::error::{AppError, AppResult};

const LIST_LIMIT: i64 = 100;

pub fn list_forums(conn: &Connection) -> AppResult<Vec<Forum>> {
    let sql = format!(
        "SELECT {} FROM forums ORDER BY created_at ASC, rowid ASC LIMIT ?1",
        Forum::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let forums = stmt
        .query_map(params![LIST_LIMIT], Forum::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(forums)
}

pub fn get_forum(conn: &Connection, forum_id: &str) -> AppResult<Forum> {
    let sql = format!("SELECT {} FROM forums WHERE id = ?1", Forum::COLUMNS);
    conn.query_row(&sql, params![forum_id], Forum::from_row)
        .optional()?
        .ok_or_else(|| AppError::not_found("Forum"))
}

fn members_of(conn: &Connection, group_id: &str) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT user_id FROM group_members WHERE group_id = ?1 ORDER BY joined_at ASC, rowid ASC",
    )?;
    let members = stmt
        .query_map(params![group_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(members)
}

/// Groups with their member ids.
pub fn list_groups(conn: &Connection) -> AppResult<Vec<SupportGroup>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, theme, is_private, created_at
         FROM support_groups ORDER BY created_at ASC, rowid ASC LIMIT ?1",
    )?;
    let groups = stmt
        .query_map(params![LIST_LIMIT], |row| {
            Ok(SupportGroup {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                theme: row.get(3)?,
                members: Vec::new(),
                is_private: row.get(4)?,
                created_at: time_column(row, 5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    groups
        .into_iter()
        .map(|mut group| -> AppResult<SupportGroup> {
            group.members = members_of(conn, &group.id)?;
            Ok(group)
        })
        .collect()
}

/// Add the user to a group. Unknown group is `NotFound`; joining twice is a `Conflict`.
pub fn join_group(conn: &Connection, group_id: &str, user_id: &str) -> AppResult<()> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM support_groups WHERE id = ?1",
        params![group_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(AppError::not_found("Group"));
    }

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO group_members (group_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
        params![group_id, user_id, format_time(&Utc::now())],
    )?;
    if inserted == 0 {
        return Err(AppError::Conflict("Already a member of this group".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::users::tests::make_user;
    use crate::db;
    use crate::db::models::PostCategory;

    fn seed(conn: &Connection) {
        let now = format_time(&Utc::now());
        conn.execute(
            "INSERT INTO forums (id, name, description, category, created_at)
             VALUES ('forum_pregnancy', 'Pregnancy Journey', 'Share', 'pregnancy', ?1)",
            params![now],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO support_groups (id, name, description, theme, created_at)
             VALUES ('group_sleep', 'Sleep Training', 'Tips', 'sleep_training', ?1)",
            params![now],
        )
        .unwrap();
    }

    #[test]
    fn forums_list_and_get() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        let forums = list_forums(&conn).unwrap();
        assert_eq!(forums.len(), 1);
        assert_eq!(forums[0].category, PostCategory::Pregnancy);

        assert_eq!(get_forum(&conn, "forum_pregnancy").unwrap().name, "Pregnancy Journey");
        assert!(matches!(
            get_forum(&conn, "forum_missing"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn join_adds_member_once() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);
        let user = make_user(&conn, "ana@example.com", "Ana");

        join_group(&conn, "group_sleep", &user.id).unwrap();
        let groups = list_groups(&conn).unwrap();
        assert_eq!(groups[0].members, vec![user.id.clone()]);

        let again = join_group(&conn, "group_sleep", &user.id).unwrap_err();
        assert!(matches!(again, AppError::Conflict(_)));
    }

    #[test]
    fn join_unknown_group_is_not_found() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = make_user(&conn, "ana@example.com", "Ana");
        let err = join_group(&conn, "group_missing", &user.id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
