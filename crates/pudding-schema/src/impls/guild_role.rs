use pudding_utils::error::ResultExt;
use pudding_utils::sql::{QueryError, SqlSnowflake};
use pudding_utils::Result;
use twilight_model::id::marker::{GuildMarker, RoleMarker};
use twilight_model::id::Id;

use crate::forms::UpsertGuildRoleForm;
use crate::types::GuildRole;

impl GuildRole {
    /// Inserts the mirrored row or overwrites every mirrored field if
    /// the `(guild_id, role_id)` key already exists.
    ///
    /// Creates and updates both funnel into this operation so replays
    /// under at-least-once delivery are idempotent.
    pub async fn upsert(
        conn: &mut sqlx::PgConnection,
        form: UpsertGuildRoleForm<'_>,
    ) -> Result<GuildRole, QueryError> {
        sqlx::query_as::<_, GuildRole>(
            r"INSERT INTO discord_guild_roles
                (guild_id, role_id, name, color, hoist, icon, unicode_emoji,
                 position, permissions, managed, mentionable, flags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (guild_id, role_id) DO UPDATE
                SET name = excluded.name,
                    color = excluded.color,
                    hoist = excluded.hoist,
                    icon = excluded.icon,
                    unicode_emoji = excluded.unicode_emoji,
                    position = excluded.position,
                    permissions = excluded.permissions,
                    managed = excluded.managed,
                    mentionable = excluded.mentionable,
                    flags = excluded.flags,
                    updated_at = (now() at time zone 'utc')
            RETURNING *",
        )
        .bind(SqlSnowflake::new(form.guild_id))
        .bind(SqlSnowflake::new(form.role_id))
        .bind(form.name)
        .bind(form.color as i32)
        .bind(form.hoist)
        .bind(form.icon.as_deref())
        .bind(form.unicode_emoji)
        .bind(form.position)
        .bind(form.permissions.bits() as i64)
        .bind(form.managed)
        .bind(form.mentionable)
        .bind(form.flags.bits() as i64)
        .fetch_one(conn)
        .await
        .change_context(QueryError)
        .attach_printable("could not upsert guild role")
    }

    pub async fn get(
        conn: &mut sqlx::PgConnection,
        guild_id: Id<GuildMarker>,
        role_id: Id<RoleMarker>,
    ) -> Result<Option<GuildRole>, QueryError> {
        sqlx::query_as::<_, GuildRole>(
            r"SELECT * FROM discord_guild_roles
            WHERE guild_id = $1 AND role_id = $2",
        )
        .bind(SqlSnowflake::new(guild_id))
        .bind(SqlSnowflake::new(role_id))
        .fetch_optional(conn)
        .await
        .change_context(QueryError)
        .attach_printable("could not get guild role")
    }

    pub async fn get_all(
        conn: &mut sqlx::PgConnection,
        guild_id: Id<GuildMarker>,
    ) -> Result<Vec<GuildRole>, QueryError> {
        sqlx::query_as::<_, GuildRole>(
            r"SELECT * FROM discord_guild_roles
            WHERE guild_id = $1
            ORDER BY position, role_id",
        )
        .bind(SqlSnowflake::new(guild_id))
        .fetch_all(conn)
        .await
        .change_context(QueryError)
        .attach_printable("could not get guild roles from guild id")
    }

    /// Deletes a single mirrored row. Deleting a key that is not
    /// present is a successful no-op.
    pub async fn delete(
        conn: &mut sqlx::PgConnection,
        guild_id: Id<GuildMarker>,
        role_id: Id<RoleMarker>,
    ) -> Result<Option<GuildRole>, QueryError> {
        sqlx::query_as::<_, GuildRole>(
            r"DELETE FROM discord_guild_roles
            WHERE guild_id = $1 AND role_id = $2
            RETURNING *",
        )
        .bind(SqlSnowflake::new(guild_id))
        .bind(SqlSnowflake::new(role_id))
        .fetch_optional(conn)
        .await
        .change_context(QueryError)
        .attach_printable("could not delete guild role")
    }

    /// Deletes every mirrored row under the guild. Used when the bot
    /// permanently loses visibility into a guild.
    pub async fn delete_all(
        conn: &mut sqlx::PgConnection,
        guild_id: Id<GuildMarker>,
    ) -> Result<u64, QueryError> {
        sqlx::query(r"DELETE FROM discord_guild_roles WHERE guild_id = $1")
            .bind(SqlSnowflake::new(guild_id))
            .execute(conn)
            .await
            .map(|v| v.rows_affected())
            .change_context(QueryError)
            .attach_printable("could not delete guild roles from guild id")
    }
}
