use twilight_model::guild::{Permissions, Role, RoleFlags};
use twilight_model::id::marker::{GuildMarker, RoleMarker};
use twilight_model::id::Id;
use typed_builder::TypedBuilder;

#[derive(Debug, TypedBuilder)]
pub struct UpsertGuildRoleForm<'a> {
    pub guild_id: Id<GuildMarker>,
    pub role_id: Id<RoleMarker>,
    pub name: &'a str,

    #[builder(default = 0)]
    pub color: u32,
    #[builder(default = false)]
    pub hoist: bool,
    #[builder(default)]
    pub icon: Option<String>,
    #[builder(default)]
    pub unicode_emoji: Option<&'a str>,
    #[builder(default = 0)]
    pub position: i64,
    #[builder(default = Permissions::empty())]
    pub permissions: Permissions,
    #[builder(default = false)]
    pub managed: bool,
    #[builder(default = false)]
    pub mentionable: bool,
    #[builder(default = RoleFlags::empty())]
    pub flags: RoleFlags,
}

impl<'a> UpsertGuildRoleForm<'a> {
    /// Projects a gateway role object into the mirrored column set.
    #[must_use]
    pub fn from_role(guild_id: Id<GuildMarker>, role: &'a Role) -> Self {
        Self {
            guild_id,
            role_id: role.id,
            name: &role.name,
            color: role.color,
            hoist: role.hoist,
            icon: role.icon.map(|hash| hash.to_string()),
            unicode_emoji: role.unicode_emoji.as_deref(),
            position: role.position,
            permissions: role.permissions,
            managed: role.managed,
            mentionable: role.mentionable,
            flags: role.flags,
        }
    }
}
