use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::rating::Surface;

/// Stored by name so the table stays readable from the sqlite shell.
impl ToSql for Surface {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Surface {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Surface::parse(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown surface {:?}", text).into()))
    }
}

/// Keys used in the `metadata` table.
pub const META_INITIAL_RATING: &str = "initial_rating";
pub const META_STORE_VERSION: &str = "store_version";
