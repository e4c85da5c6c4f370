/// names of values used in interactions
pub mod value {
    pub const MEMBER: &str = "member";
    pub const REASON: &str = "reason";
    pub const MESSAGE: &str = "message";
    pub const TICKET_ID: &str = "ticket_id";
}

/// names of the registered slash commands
pub mod commands {
    pub const BAN: &str = "ban";
    pub const KICK: &str = "kick";
    pub const SAY: &str = "say";
    pub const LOCK: &str = "lock";
    pub const CREATE_VERIFY_PANEL: &str = "create_verify_panel";
    pub const CREATE_TICKET_PANEL: &str = "create_ticket_panel";
    pub const CLOSE_TICKET: &str = "close_ticket";
}

/// prefixes of component custom ids
pub mod controls {
    pub const VERIFY: &str = "verify";
    pub const CREATE_TICKET: &str = "create_ticket";
    pub const CLOSE_TICKET: &str = "close_ticket";
    pub const NO_ROLE: &str = "none";
}

pub const NO_REASON: &str = "No reason provided.";
pub const CLOSED_PREFIX: &str = "closed-";
pub const CLOSED_TOPIC: &str = "Closed ticket";
