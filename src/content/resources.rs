use rusqlite::{params, Connection};

use crate::db::models::{PostCategory, Resource};
use crate::error::AppResult;

const LIST_LIMIT: i64 = 50;

/// Newest first. Premium resources only reach premium users.
pub fn list(
    conn: &Connection,
    category: Option<PostCategory>,
    include_premium: bool,
) -> AppResult<Vec<Resource>> {
    let sql = format!(
        "SELECT {} FROM resources
         WHERE (?1 IS NULL OR category = ?1) AND (?2 OR is_premium = 0)
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?3",
        Resource::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let resources = stmt
        .query_map(params![category, include_premium, LIST_LIMIT], Resource::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(resources)
}
