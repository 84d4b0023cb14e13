use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use std::fmt;
use twilight_model::id::Id;

/// Timestamps are stored without a timezone; everything in the
/// database is UTC.
#[must_use]
pub fn naive_to_dt(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

/// Binds a Discord snowflake to a Postgres `bigint` column.
///
/// Snowflakes fit in 63 bits so the cast in either direction is
/// lossless for any id Discord can hand out.
pub struct SqlSnowflake<M>(Id<M>);

impl<M> SqlSnowflake<M> {
    pub fn new(id: Id<M>) -> Self {
        Self(id)
    }
}

impl<M> From<SqlSnowflake<M>> for Id<M> {
    fn from(value: SqlSnowflake<M>) -> Self {
        value.0
    }
}

impl<M> fmt::Debug for SqlSnowflake<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<M> Clone for SqlSnowflake<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for SqlSnowflake<M> {}

impl<M> sqlx::Type<sqlx::Postgres> for SqlSnowflake<M> {
    fn type_info() -> PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

impl<'q, M> sqlx::Encode<'q, sqlx::Postgres> for SqlSnowflake<M> {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        let value = self.0.get() as i64;
        <i64 as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&value, buf)
    }
}

impl<'r, M> sqlx::Decode<'r, sqlx::Postgres> for SqlSnowflake<M> {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let value = <i64 as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        u64::try_from(value)
            .ok()
            .and_then(Id::new_checked)
            .map(Self)
            .ok_or_else(|| format!("{value} is not a valid snowflake").into())
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use twilight_model::id::marker::GuildMarker;

    #[sqlx::test]
    async fn round_trips_through_bigint(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
        let id = Id::<GuildMarker>::new(613425648685547541);

        let value = sqlx::query_scalar::<_, SqlSnowflake<GuildMarker>>("SELECT $1::bigint")
            .bind(SqlSnowflake::new(id))
            .fetch_one(&pool)
            .await?;

        assert_eq!(Id::from(value), id);
        Ok(())
    }
}
