mod guild_role;
