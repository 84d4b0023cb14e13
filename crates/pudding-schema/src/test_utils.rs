use pudding_utils::sql::QueryError;
use pudding_utils::Result;
use twilight_model::id::marker::{GuildMarker, RoleMarker};
use twilight_model::id::Id;

use crate::forms::UpsertGuildRoleForm;
use crate::types::GuildRole;

pub async fn upsert_test_role(
    conn: &mut sqlx::PgConnection,
    guild_id: Id<GuildMarker>,
    role_id: Id<RoleMarker>,
    name: &str,
) -> Result<GuildRole, QueryError> {
    let form = UpsertGuildRoleForm::builder()
        .guild_id(guild_id)
        .role_id(role_id)
        .name(name)
        .build();

    GuildRole::upsert(conn, form).await
}
