use crate::error::AppError;

/// require_rows
///
/// Turns an empty result set into `NotFound`. Filtered listings go through here, so a
/// search that matches nothing answers 404 rather than an empty list.
pub fn require_rows<T>(rows: Vec<T>, message: impl FnOnce() -> String) -> Result<Vec<T>, AppError> {
    if rows.is_empty() {
        return Err(AppError::NotFound(message()));
    }
    Ok(rows)
}

/// Single-entity counterpart of [`require_rows`].
pub fn require_row<T>(row: Option<T>, message: impl FnOnce() -> String) -> Result<T, AppError> {
    row.ok_or_else(|| AppError::NotFound(message()))
}
