use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use crate::db::models::{PregnancyStage, User};
use crate::db::{format_time, new_id};
use crate::error::{AppError, AppResult};

/// Fields accepted when an account is created.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub picture: Option<String>,
    pub password_hash: Option<String>,
}

/// Every field a user may change on their own profile. Absent means unchanged;
/// any other key in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub pregnancy_stage: Option<PregnancyStage>,
    pub due_date: Option<String>,
    pub children_count: Option<i64>,
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub name: Option<String>,
    pub interest: Option<String>,
    pub pregnancy_stage: Option<PregnancyStage>,
    pub limit: i64,
}

pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS);
    Ok(conn
        .query_row(&sql, params![id], User::from_row)
        .optional()?)
}

pub fn find_by_email(conn: &Connection, email: &str) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?1", User::COLUMNS);
    Ok(conn
        .query_row(&sql, params![email], User::from_row)
        .optional()?)
}

/// Insert a new account. A taken email is a `Conflict`.
pub fn insert(conn: &Connection, new: NewUser) -> AppResult<User> {
    if find_by_email(conn, &new.email)?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let user = User {
        id: new_id("user"),
        email: new.email,
        name: new.name,
        first_name: new.first_name,
        last_name: new.last_name,
        phone_number: new.phone_number,
        address: new.address,
        country: new.country,
        picture: new.picture,
        bio: None,
        pregnancy_stage: None,
        due_date: None,
        children_count: 0,
        interests: Vec::new(),
        is_premium: false,
        password_hash: new.password_hash,
        created_at: Utc::now(),
    };

    let result = conn.execute(
        "INSERT INTO users (id, email, name, first_name, last_name, phone_number, address, \
         country, picture, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            user.id,
            user.email,
            user.name,
            user.first_name,
            user.last_name,
            user.phone_number,
            user.address,
            user.country,
            user.picture,
            user.password_hash,
            format_time(&user.created_at)
        ],
    );

    match result {
        Ok(_) => Ok(user),
        // Lost a race with a concurrent registration for the same email
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(AppError::Conflict("Email already registered".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Look up by email, creating the account on first sight. Used by the
/// external identity login.
pub fn find_or_create(conn: &Connection, new: NewUser) -> AppResult<User> {
    if let Some(user) = find_by_email(conn, &new.email)? {
        return Ok(user);
    }
    match insert(conn, new.clone()) {
        Err(AppError::Conflict(_)) => find_by_email(conn, &new.email)?
            .ok_or_else(|| AppError::Internal("user vanished after conflict".into())),
        other => other,
    }
}

pub fn update_profile(conn: &Connection, user_id: &str, update: &ProfileUpdate) -> AppResult<User> {
    if let Some(ref name) = update.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".into()));
        }
    }
    if matches!(update.children_count, Some(n) if n < 0) {
        return Err(AppError::BadRequest("children_count cannot be negative".into()));
    }
    let interests = update
        .interests
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "UPDATE users SET
            name = COALESCE(?2, name),
            bio = COALESCE(?3, bio),
            picture = COALESCE(?4, picture),
            pregnancy_stage = COALESCE(?5, pregnancy_stage),
            due_date = COALESCE(?6, due_date),
            children_count = COALESCE(?7, children_count),
            interests = COALESCE(?8, interests)
         WHERE id = ?1",
        params![
            user_id,
            update.name.as_deref().map(str::trim),
            update.bio,
            update.picture,
            update.pregnancy_stage,
            update.due_date,
            update.children_count,
            interests
        ],
    )?;

    find_by_id(conn, user_id)?.ok_or_else(|| AppError::not_found("User"))
}

pub fn set_premium(conn: &Connection, user_id: &str, premium: bool) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET is_premium = ?2 WHERE id = ?1",
        params![user_id, premium],
    )?;
    Ok(())
}

/// Other users matching every given filter. Name matching is a
/// case-insensitive substring match.
pub fn search(conn: &Connection, requester_id: &str, filter: &SearchFilter) -> AppResult<Vec<User>> {
    let pattern = filter
        .name
        .as_deref()
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", escape_like(q)));

    let sql = format!(
        "SELECT {} FROM users
         WHERE id != ?1
           AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\\')
           AND (?3 IS NULL OR EXISTS (SELECT 1 FROM json_each(users.interests) WHERE value = ?3))
           AND (?4 IS NULL OR pregnancy_stage = ?4)
         ORDER BY name ASC
         LIMIT ?5",
        User::COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map(
            params![
                requester_id,
                pattern,
                filter.interest,
                filter.pregnancy_stage,
                filter.limit
            ],
            User::from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db;

    pub(crate) fn make_user(conn: &Connection, email: &str, name: &str) -> User {
        insert(
            conn,
            NewUser {
                email: email.to_string(),
                name: name.to_string(),
                ..NewUser::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn insert_then_find() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = make_user(&conn, "ana@example.com", "Ana");
        assert!(user.id.starts_with("user_"));

        let by_id = find_by_id(&conn, &user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "ana@example.com");
        let by_email = find_by_email(&conn, "ana@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(!by_email.is_premium);
        assert!(by_email.interests.is_empty());
    }

    #[test]
    fn duplicate_email_conflicts() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        make_user(&conn, "ana@example.com", "Ana");
        let err = insert(
            &conn,
            NewUser {
                email: "ana@example.com".into(),
                name: "Other".into(),
                ..NewUser::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn find_or_create_reuses_existing_account() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let existing = make_user(&conn, "ana@example.com", "Ana");
        let again = find_or_create(
            &conn,
            NewUser {
                email: "ana@example.com".into(),
                name: "Ana From Elsewhere".into(),
                ..NewUser::default()
            },
        )
        .unwrap();
        assert_eq!(again.id, existing.id);
        assert_eq!(again.name, "Ana");
    }

    #[test]
    fn profile_update_only_touches_given_fields() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = make_user(&conn, "ana@example.com", "Ana");

        let updated = update_profile(
            &conn,
            &user.id,
            &ProfileUpdate {
                bio: Some("Due in spring".into()),
                pregnancy_stage: Some(PregnancyStage::Expecting),
                interests: Some(vec!["pregnancy".into(), "nutrition".into()]),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();

        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.bio.as_deref(), Some("Due in spring"));
        assert_eq!(updated.pregnancy_stage, Some(PregnancyStage::Expecting));
        assert_eq!(updated.interests, vec!["pregnancy", "nutrition"]);
    }

    #[test]
    fn profile_update_ignores_fields_outside_the_allow_list() {
        let parsed: ProfileUpdate = serde_json::from_str(
            r#"{"name": "Renamed", "is_premium": true, "user_id": "someone_else"}"#,
        )
        .unwrap();
        assert_eq!(parsed.name.as_deref(), Some("Renamed"));
        assert!(parsed.bio.is_none());
    }

    #[test]
    fn profile_update_validates_values() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = make_user(&conn, "ana@example.com", "Ana");
        let err = update_profile(
            &conn,
            &user.id,
            &ProfileUpdate {
                children_count: Some(-1),
                ..ProfileUpdate::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn search_filters_and_excludes_requester() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let me = make_user(&conn, "me@example.com", "Maria");
        let ana = make_user(&conn, "ana@example.com", "Anastasia");
        let _bo = make_user(&conn, "bo@example.com", "Bo");
        update_profile(
            &conn,
            &ana.id,
            &ProfileUpdate {
                interests: Some(vec!["breastfeeding".into()]),
                pregnancy_stage: Some(PregnancyStage::Postpartum0To1Year),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();

        let by_name = search(
            &conn,
            &me.id,
            &SearchFilter {
                name: Some("ANA".into()),
                limit: 20,
                ..SearchFilter::default()
            },
        )
        .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, ana.id);

        let by_interest = search(
            &conn,
            &me.id,
            &SearchFilter {
                interest: Some("breastfeeding".into()),
                pregnancy_stage: Some(PregnancyStage::Postpartum0To1Year),
                limit: 20,
                ..SearchFilter::default()
            },
        )
        .unwrap();
        assert_eq!(by_interest.len(), 1);

        let everyone = search(
            &conn,
            &me.id,
            &SearchFilter {
                limit: 20,
                ..SearchFilter::default()
            },
        )
        .unwrap();
        assert_eq!(everyone.len(), 2);
        assert!(everyone.iter().all(|u| u.id != me.id));
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let me = make_user(&conn, "me@example.com", "Me");
        make_user(&conn, "ana@example.com", "Ana");
        let found = search(
            &conn,
            &me.id,
            &SearchFilter {
                name: Some("%".into()),
                limit: 20,
                ..SearchFilter::default()
            },
        )
        .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn set_premium_flips_flag() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = make_user(&conn, "ana@example.com", "Ana");
        set_premium(&conn, &user.id, true).unwrap();
        assert!(find_by_id(&conn, &user.id).unwrap().unwrap().is_premium);
    }
}
