use async_trait::async_trait;
use pudding_schema::forms::UpsertGuildRoleForm;
use pudding_schema::types::GuildRole;
use pudding_utils::error::ResultExt;
use pudding_utils::Result;
use sqlx::PgPool;
use tracing::{debug, info};
use twilight_model::guild::Role;
use twilight_model::id::marker::{GuildMarker, RoleMarker};
use twilight_model::id::Id;

use super::EventModule;
use crate::envelope::{topics, GatewayEvent};
use crate::errors::ProcessError;

/// Mirrors guild role state from gateway events into Postgres.
pub struct CacheModule {
    pool: PgPool,
}

impl CacheModule {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventModule for CacheModule {
    fn queue(&self) -> &'static str {
        "discord-cache-module"
    }

    fn topics(&self) -> &'static [&'static str] {
        &[
            topics::GUILD_CREATE,
            topics::GUILD_DELETE,
            topics::GUILD_ROLE_CREATE,
            topics::GUILD_ROLE_UPDATE,
            topics::GUILD_ROLE_DELETE,
        ]
    }

    #[tracing::instrument(skip_all, fields(event.kind = %event.kind()))]
    async fn process(&self, event: &GatewayEvent) -> Result<(), ProcessError> {
        match event {
            GatewayEvent::GuildCreate(guild) => {
                info!(
                    guild.id = %guild.id,
                    guild.roles = %guild.roles.len(),
                    "observed guild; syncing role snapshot"
                );
                self.upsert_roles(guild.id, &guild.roles).await
            }
            GatewayEvent::GuildRoleCreate(change) | GatewayEvent::GuildRoleUpdate(change) => {
                self.upsert_roles(change.guild_id, std::slice::from_ref(&change.role))
                    .await
            }
            GatewayEvent::GuildRoleDelete(removal) => {
                self.delete_role(removal.guild_id, removal.role_id).await
            }
            GatewayEvent::GuildDelete(removal) => {
                // `unavailable` present means a temporary outage; the
                // cached rows stay in place for when it comes back.
                if removal.unavailable.is_none() {
                    self.remove_guild_data(removal.id).await
                } else {
                    debug!(guild.id = %removal.id, "guild became unavailable; keeping cache");
                    Ok(())
                }
            }
            GatewayEvent::Unknown => Ok(()),
        }
    }
}

impl CacheModule {
    /// Writes every role in one transaction so a partially applied
    /// snapshot never becomes visible.
    async fn upsert_roles(
        &self,
        guild_id: Id<GuildMarker>,
        roles: &[Role],
    ) -> Result<(), ProcessError> {
        let mut tx = self.pool.begin().await.change_context(ProcessError)?;
        for role in roles {
            let form = UpsertGuildRoleForm::from_role(guild_id, role);
            GuildRole::upsert(&mut tx, form)
                .await
                .change_context(ProcessError)
                .attach_printable_lazy(|| format!("role.id = {}", role.id))?;
        }

        tx.commit().await.change_context(ProcessError)?;
        Ok(())
    }

    async fn delete_role(
        &self,
        guild_id: Id<GuildMarker>,
        role_id: Id<RoleMarker>,
    ) -> Result<(), ProcessError> {
        let mut tx = self.pool.begin().await.change_context(ProcessError)?;
        let deleted = GuildRole::delete(&mut tx, guild_id, role_id)
            .await
            .change_context(ProcessError)?;

        tx.commit().await.change_context(ProcessError)?;
        if deleted.is_none() {
            debug!(%guild_id, %role_id, "deleted role was not cached");
        }

        Ok(())
    }

    async fn remove_guild_data(&self, guild_id: Id<GuildMarker>) -> Result<(), ProcessError> {
        let mut tx = self.pool.begin().await.change_context(ProcessError)?;
        let deleted = GuildRole::delete_all(&mut tx, guild_id)
            .await
            .change_context(ProcessError)?;

        tx.commit().await.change_context(ProcessError)?;
        debug!(%guild_id, %deleted, "removed cached data for departed guild");
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
#[cfg(test)]
mod tests {
    use super::*;
    use pudding_utils::sql::{QueryError, SqlSnowflake};
    use serde_json::json;

    fn role_json(id: u64, name: &str, position: i64) -> serde_json::Value {
        json!({
            "color": 0,
            "hoist": false,
            "id": id.to_string(),
            "managed": false,
            "mentionable": false,
            "name": name,
            "permissions": "0",
            "position": position,
            "flags": 0
        })
    }

    fn decode(value: serde_json::Value) -> GatewayEvent {
        GatewayEvent::decode(value.to_string().as_bytes()).unwrap()
    }

    async fn count_rows(pool: &PgPool, guild_id: Id<GuildMarker>) -> Result<i64, QueryError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM discord_guild_roles WHERE guild_id = $1",
        )
        .bind(SqlSnowflake::new(guild_id))
        .fetch_one(pool)
        .await
        .change_context(QueryError)
    }

    #[sqlx::test(migrator = "pudding_schema::MIGRATOR")]
    async fn test_role_create_then_update(pool: PgPool) -> Result<(), ProcessError> {
        let module = CacheModule::new(pool.clone());
        let guild_id = Id::<GuildMarker>::new(12345678);

        let created = decode(json!({
            "t": "guild-role-create",
            "d": { "guild_id": "12345678", "role": role_json(1001, "Member", 1) }
        }));
        module.process(&created).await?;

        let updated = decode(json!({
            "t": "guild-role-update",
            "d": { "guild_id": "12345678", "role": role_json(1001, "Members", 4) }
        }));
        module.process(&updated).await?;

        let mut conn = pool.acquire().await.change_context(ProcessError)?;
        let row = GuildRole::get(&mut conn, guild_id, Id::new(1001))
            .await
            .change_context(ProcessError)?
            .unwrap();

        assert_eq!(row.name, "Members");
        assert_eq!(row.position, 4);
        assert!(row.updated_at.is_some());
        assert_eq!(count_rows(&pool, guild_id).await.change_context(ProcessError)?, 1);
        Ok(())
    }

    #[sqlx::test(migrator = "pudding_schema::MIGRATOR")]
    async fn test_update_before_create_converges(pool: PgPool) -> Result<(), ProcessError> {
        let module = CacheModule::new(pool.clone());
        let guild_id = Id::<GuildMarker>::new(12345678);

        // out-of-order arrival; both kinds funnel into the same upsert
        let updated = decode(json!({
            "t": "guild-role-update",
            "d": { "guild_id": "12345678", "role": role_json(1001, "Mods", 2) }
        }));
        module.process(&updated).await?;

        let created = decode(json!({
            "t": "guild-role-create",
            "d": { "guild_id": "12345678", "role": role_json(1001, "Mods", 2) }
        }));
        module.process(&created).await?;

        assert_eq!(count_rows(&pool, guild_id).await.change_context(ProcessError)?, 1);
        Ok(())
    }

    #[sqlx::test(migrator = "pudding_schema::MIGRATOR")]
    async fn test_guild_create_syncs_role_snapshot(pool: PgPool) -> Result<(), ProcessError> {
        let module = CacheModule::new(pool.clone());
        let guild_id = Id::<GuildMarker>::new(12345678);

        let event = decode(json!({
            "t": "guild-create",
            "d": {
                "id": "12345678",
                "name": "Loritta's Paradise",
                "roles": [
                    role_json(1001, "everyone", 0),
                    role_json(1002, "Mods", 1),
                    role_json(1003, "Admins", 2)
                ]
            }
        }));
        module.process(&event).await?;

        assert_eq!(count_rows(&pool, guild_id).await.change_context(ProcessError)?, 3);
        Ok(())
    }

    #[sqlx::test(migrator = "pudding_schema::MIGRATOR")]
    async fn test_snapshot_applies_atomically(pool: PgPool) -> Result<(), ProcessError> {
        let module = CacheModule::new(pool.clone());
        let guild_id = Id::<GuildMarker>::new(12345678);

        // second role's name exceeds the column limit, so the write of
        // the whole snapshot must roll back
        let oversized = "x".repeat(200);
        let event = decode(json!({
            "t": "guild-create",
            "d": {
                "id": "12345678",
                "roles": [
                    role_json(1001, "fine", 0),
                    role_json(1002, &oversized, 1)
                ]
            }
        }));

        assert!(module.process(&event).await.is_err());
        assert_eq!(count_rows(&pool, guild_id).await.change_context(ProcessError)?, 0);
        Ok(())
    }

    #[sqlx::test(migrator = "pudding_schema::MIGRATOR")]
    async fn test_guild_delete_cascades_only_when_permanent(
        pool: PgPool,
    ) -> Result<(), ProcessError> {
        let module = CacheModule::new(pool.clone());
        let guild_id = Id::<GuildMarker>::new(12345678);

        let created = decode(json!({
            "t": "guild-role-create",
            "d": { "guild_id": "12345678", "role": role_json(1001, "Member", 1) }
        }));
        module.process(&created).await?;

        let outage = decode(json!({
            "t": "guild-delete",
            "d": { "id": "12345678", "unavailable": true }
        }));
        module.process(&outage).await?;
        assert_eq!(count_rows(&pool, guild_id).await.change_context(ProcessError)?, 1);

        let removal = decode(json!({
            "t": "guild-delete",
            "d": { "id": "12345678" }
        }));
        module.process(&removal).await?;
        assert_eq!(count_rows(&pool, guild_id).await.change_context(ProcessError)?, 0);
        Ok(())
    }

    #[sqlx::test(migrator = "pudding_schema::MIGRATOR")]
    async fn test_guild_can_be_recached_after_removal(pool: PgPool) -> Result<(), ProcessError> {
        let module = CacheModule::new(pool.clone());
        let guild_id = Id::<GuildMarker>::new(12345678);

        let snapshot = json!({
            "t": "guild-create",
            "d": { "id": "12345678", "roles": [role_json(1001, "Member", 1)] }
        });
        module.process(&decode(snapshot.clone())).await?;

        let removal = decode(json!({ "t": "guild-delete", "d": { "id": "12345678" } }));
        module.process(&removal).await?;
        assert_eq!(count_rows(&pool, guild_id).await.change_context(ProcessError)?, 0);

        module.process(&decode(snapshot)).await?;
        assert_eq!(count_rows(&pool, guild_id).await.change_context(ProcessError)?, 1);
        Ok(())
    }

    #[sqlx::test(migrator = "pudding_schema::MIGRATOR")]
    async fn test_role_delete_for_missing_row_succeeds(pool: PgPool) -> Result<(), ProcessError> {
        let module = CacheModule::new(pool.clone());

        let removal = decode(json!({
            "t": "guild-role-delete",
            "d": { "guild_id": "12345678", "role_id": "1001" }
        }));
        module.process(&removal).await?;
        Ok(())
    }

    #[sqlx::test(migrator = "pudding_schema::MIGRATOR")]
    async fn test_unknown_event_is_a_noop(pool: PgPool) -> Result<(), ProcessError> {
        let module = CacheModule::new(pool);
        module.process(&GatewayEvent::Unknown).await?;
        Ok(())
    }
}
