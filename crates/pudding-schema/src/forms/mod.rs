mod guild_role;

pub use self::guild_role::*;
