use chrono::{DateTime, NaiveDateTime, Utc};
use pudding_utils::sql::{naive_to_dt, SqlSnowflake};
use twilight_model::guild::{Permissions, RoleFlags};
use twilight_model::id::marker::{GuildMarker, RoleMarker};
use twilight_model::id::Id;

/// Cached projection of a guild role.
///
/// Rows reflect the last successfully processed gateway event for the
/// `(guild_id, role_id)` key; Discord stays the source of truth for
/// every mirrored field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRole {
    pub guild_id: Id<GuildMarker>,
    pub role_id: Id<RoleMarker>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub icon: Option<String>,
    pub unicode_emoji: Option<String>,
    pub position: i64,
    pub permissions: Permissions,
    pub managed: bool,
    pub mentionable: bool,
    pub flags: RoleFlags,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for GuildRole {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;

        let guild_id = row.try_get::<SqlSnowflake<GuildMarker>, _>("guild_id")?;
        let role_id = row.try_get::<SqlSnowflake<RoleMarker>, _>("role_id")?;
        let created_at = row.try_get::<NaiveDateTime, _>("created_at")?;
        let updated_at = row.try_get::<Option<NaiveDateTime>, _>("updated_at")?;

        let color = row.try_get::<i32, _>("color")?;
        let position = row.try_get::<i64, _>("position")?;
        let permissions = row.try_get::<i64, _>("permissions")?;
        let flags = row.try_get::<i64, _>("flags")?;

        Ok(Self {
            guild_id: guild_id.into(),
            role_id: role_id.into(),
            created_at: naive_to_dt(created_at),
            updated_at: updated_at.map(naive_to_dt),

            name: row.try_get("name")?,
            color: color as u32,
            hoist: row.try_get("hoist")?,
            icon: row.try_get("icon")?,
            unicode_emoji: row.try_get("unicode_emoji")?,
            position,
            permissions: Permissions::from_bits_truncate(permissions as u64),
            managed: row.try_get("managed")?,
            mentionable: row.try_get("mentionable")?,
            flags: RoleFlags::from_bits_truncate(flags as u64),
        })
    }
}
