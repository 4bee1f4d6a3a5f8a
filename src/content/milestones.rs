use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use crate::db::models::{Milestone, MilestoneType};
use crate::db::{format_time, new_id};
use crate::error::{AppError, AppResult};

const LIST_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewMilestone {
    pub child_name: String,
    pub milestone_type: MilestoneType,
    pub title: String,
    pub description: String,
    pub age_months: i64,
}

pub fn create(conn: &Connection, user_id: &str, new: NewMilestone) -> AppResult<Milestone> {
    if new.child_name.trim().is_empty() || new.title.trim().is_empty() {
        return Err(AppError::BadRequest(
            "child_name and title are required".into(),
        ));
    }
    if new.age_months < 0 {
        return Err(AppError::BadRequest("age_months cannot be negative".into()));
    }

    let milestone = Milestone {
        id: new_id("milestone"),
        user_id: user_id.to_string(),
        child_name: new.child_name,
        milestone_type: new.milestone_type,
        title: new.title,
        description: new.description,
        age_months: new.age_months,
        completed: false,
        completed_at: None,
        notes: None,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO milestones (id, user_id, child_name, milestone_type, title, description, \
         age_months, completed, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
        params![
            milestone.id,
            milestone.user_id,
            milestone.child_name,
            milestone.milestone_type,
            milestone.title,
            milestone.description,
            milestone.age_months,
            format_time(&milestone.created_at)
        ],
    )?;

    Ok(milestone)
}

/// The user's milestones, youngest age first.
pub fn list_for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<Milestone>> {
    let sql = format!(
        "SELECT {} FROM milestones WHERE user_id = ?1
         ORDER BY age_months ASC, created_at ASC LIMIT ?2",
        Milestone::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let milestones = stmt
        .query_map(params![user_id, LIST_LIMIT], Milestone::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(milestones)
}

fn find_owned(conn: &Connection, milestone_id: &str, user_id: &str) -> AppResult<Option<Milestone>> {
    let sql = format!(
        "SELECT {} FROM milestones WHERE id = ?1 AND user_id = ?2",
        Milestone::COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![milestone_id, user_id], Milestone::from_row)
        .optional()?)
}

/// Mark complete. Only the first completion records a timestamp and notes.
pub fn complete(
    conn: &Connection,
    milestone_id: &str,
    user_id: &str,
    notes: Option<String>,
) -> AppResult<Milestone> {
    conn.execute(
        "UPDATE milestones SET completed = 1, completed_at = ?3, notes = ?4
         WHERE id = ?1 AND user_id = ?2 AND completed = 0",
        params![milestone_id, user_id, format_time(&Utc::now()), notes],
    )?;

    find_owned(conn, milestone_id, user_id)?.ok_or_else(|| AppError::not_found("Milestone"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::users::tests::make_user;
    use crate::db;

    fn new_milestone(title: &str, age_months: i64) -> NewMilestone {
        NewMilestone {
            child_name: "Leo".into(),
            milestone_type: MilestoneType::Physical,
            title: title.into(),
            description: "".into(),
            age_months,
        }
    }

    #[test]
    fn list_orders_by_age() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = make_user(&conn, "ana@example.com", "Ana");
        create(&conn, &user.id, new_milestone("Walks", 12)).unwrap();
        create(&conn, &user.id, new_milestone("Rolls over", 4)).unwrap();

        let titles: Vec<_> = list_for_user(&conn, &user.id)
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["Rolls over", "Walks"]);
    }

    #[test]
    fn completion_is_one_way() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = make_user(&conn, "ana@example.com", "Ana");
        let m = create(&conn, &user.id, new_milestone("Walks", 12)).unwrap();

        let done = complete(&conn, &m.id, &user.id, Some("first steps!".into())).unwrap();
        assert!(done.completed);
        let first_at = done.completed_at.unwrap();

        let again = complete(&conn, &m.id, &user.id, Some("overwrite".into())).unwrap();
        assert_eq!(again.completed_at, Some(first_at));
        assert_eq!(again.notes.as_deref(), Some("first steps!"));
    }

    #[test]
    fn completion_is_owner_scoped() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let owner = make_user(&conn, "ana@example.com", "Ana");
        let stranger = make_user(&conn, "bo@example.com", "Bo");
        let m = create(&conn, &owner.id, new_milestone("Walks", 12)).unwrap();

        let err = complete(&conn, &m.id, &stranger.id, None).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!list_for_user(&conn, &owner.id).unwrap()[0].completed);
    }

    #[test]
    fn create_rejects_negative_age() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = make_user(&conn, "ana@example.com", "Ana");
        assert!(create(&conn, &user.id, new_milestone("Walks", -1)).is_err());
    }
}
