use pudding_utils::error::ResultExt;
use pudding_utils::Result;
use serde::Deserialize;
use twilight_model::guild::Role;
use twilight_model::id::marker::{GuildMarker, RoleMarker};
use twilight_model::id::Id;

use crate::errors::DecodeError;

/// Topics the gateway publishes under, one per event kind.
pub mod topics {
    pub const GUILD_CREATE: &str = "event.guild-create";
    pub const GUILD_DELETE: &str = "event.guild-delete";
    pub const GUILD_ROLE_CREATE: &str = "event.guild-role-create";
    pub const GUILD_ROLE_UPDATE: &str = "event.guild-role-update";
    pub const GUILD_ROLE_DELETE: &str = "event.guild-role-delete";
}

/// One decoded gateway event, tagged by kind.
///
/// Payloads are adjacently tagged JSON: `{"t": "<kind>", "d": {...}}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "t", content = "d", rename_all = "kebab-case")]
pub enum GatewayEvent {
    GuildCreate(GuildSnapshot),
    GuildDelete(GuildRemoval),
    GuildRoleCreate(GuildRoleChange),
    GuildRoleUpdate(GuildRoleChange),
    GuildRoleDelete(GuildRoleRemoval),
    /// Kinds this consumer has no handler for.
    ///
    /// The upstream event vocabulary evolves faster than consumers do;
    /// these are acknowledged untouched instead of failing.
    #[serde(other)]
    Unknown,
}

impl GatewayEvent {
    /// Decodes one raw broker payload into a typed event.
    ///
    /// Unknown fields inside known payloads are ignored so the gateway
    /// can grow its schema without breaking this consumer. Decoding is
    /// pure; no I/O happens here.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(payload)
            .change_context(DecodeError)
            .attach_printable("payload does not match any known event schema")
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GuildCreate(..) => "guild-create",
            Self::GuildDelete(..) => "guild-delete",
            Self::GuildRoleCreate(..) => "guild-role-create",
            Self::GuildRoleUpdate(..) => "guild-role-update",
            Self::GuildRoleDelete(..) => "guild-role-delete",
            Self::Unknown => "unknown",
        }
    }
}

/// Full membership snapshot of a guild, delivered when the guild is
/// first observed and again on every gateway reconnect.
#[derive(Debug, Deserialize)]
pub struct GuildSnapshot {
    pub id: Id<GuildMarker>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize)]
pub struct GuildRemoval {
    pub id: Id<GuildMarker>,
    /// Present (with any value) when the guild went through a
    /// temporary outage. Absent when the bot was removed from the
    /// guild for good.
    #[serde(default)]
    pub unavailable: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct GuildRoleChange {
    pub guild_id: Id<GuildMarker>,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct GuildRoleRemoval {
    pub guild_id: Id<GuildMarker>,
    pub role_id: Id<RoleMarker>,
}

#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_role_create() {
        let payload = json!({
            "t": "guild-role-create",
            "d": {
                "guild_id": "12345678",
                "role": {
                    "color": 0xFF0000,
                    "hoist": true,
                    "id": "23456789",
                    "managed": false,
                    "mentionable": false,
                    "name": "Admin",
                    "permissions": "8",
                    "position": 3,
                    "flags": 0
                }
            }
        });

        let event = GatewayEvent::decode(payload.to_string().as_bytes()).unwrap();
        let GatewayEvent::GuildRoleCreate(change) = event else {
            panic!("expected guild-role-create, got {:?}", event.kind());
        };

        assert_eq!(change.guild_id, Id::new(12345678));
        assert_eq!(change.role.id, Id::new(23456789));
        assert_eq!(change.role.name, "Admin");
        assert_eq!(change.role.position, 3);
    }

    #[test]
    fn guild_delete_distinguishes_outage_from_removal() {
        let outage = json!({ "t": "guild-delete", "d": { "id": "12345678", "unavailable": true } });
        let removal = json!({ "t": "guild-delete", "d": { "id": "12345678" } });

        let GatewayEvent::GuildDelete(outage) =
            GatewayEvent::decode(outage.to_string().as_bytes()).unwrap()
        else {
            panic!("expected guild-delete");
        };
        let GatewayEvent::GuildDelete(removal) =
            GatewayEvent::decode(removal.to_string().as_bytes()).unwrap()
        else {
            panic!("expected guild-delete");
        };

        assert_eq!(outage.unavailable, Some(true));
        assert_eq!(removal.unavailable, None);
    }

    #[test]
    fn unknown_kind_decodes_to_unknown() {
        let payload = json!({ "t": "message-create", "d": { "channel_id": "42" } });
        let event = GatewayEvent::decode(payload.to_string().as_bytes()).unwrap();
        assert!(matches!(event, GatewayEvent::Unknown));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload = json!({
            "t": "guild-delete",
            "d": { "id": "12345678", "brand_new_field": { "nested": true } }
        });
        let event = GatewayEvent::decode(payload.to_string().as_bytes()).unwrap();
        assert!(matches!(event, GatewayEvent::GuildDelete(..)));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(GatewayEvent::decode(b"{{{{ not json").is_err());
        assert!(GatewayEvent::decode(br#"{"d": {}}"#).is_err());
    }
}
