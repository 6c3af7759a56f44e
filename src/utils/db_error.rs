//! Helpers for classifying database errors.

/// Name of the primary key constraint on `short_urls.code`.
pub const SHORT_URLS_PKEY: &str = "short_urls_pkey";

/// Returns true if `e` is a unique violation on the short code primary key.
pub fn is_unique_violation_on_code(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), Some(SHORT_URLS_PKEY) | None)
}
