//! Chat command parser
//!
//! Grammar (whitespace separated):
//! - `/start`, `/help`, `/roles`
//! - `/setrole @user [@user ...] role`
//! - `/unsetrole @user [@user ...] role`
//! - `/delrole role`
//! - `/mention role`
//!
//! The command token may carry a `@botname` suffix, as chat platforms add
//! in group chats.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Member, RoleName, MENTION_PREFIX};

pub const SETROLE_USAGE: &str = "Usage: /setrole @username [@username ...] role";
pub const UNSETROLE_USAGE: &str = "Usage: /unsetrole @username [@username ...] role";
pub const DELROLE_USAGE: &str = "Usage: /delrole role";
pub const MENTION_USAGE: &str = "Usage: /mention role";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Help,
    SetRole { members: Vec<Member>, role: RoleName },
    UnsetRole { members: Vec<Member>, role: RoleName },
    DelRole { role: RoleName },
    Mention { role: RoleName },
    Roles,
}

impl ChatCommand {
    /// Commands that change the registry and need authorization
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            ChatCommand::SetRole { .. } | ChatCommand::UnsetRole { .. } | ChatCommand::DelRole { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatCommand::Start => "start",
            ChatCommand::Help => "help",
            ChatCommand::SetRole { .. } => "setrole",
            ChatCommand::UnsetRole { .. } => "unsetrole",
            ChatCommand::DelRole { .. } => "delrole",
            ChatCommand::Mention { .. } => "mention",
            ChatCommand::Roles => "roles",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Command(ChatCommand),
    /// A known command with bad arguments; carries the usage line
    Usage(&'static str),
    /// Plain text, an unknown command, or a command for another bot
    Ignored,
}

fn command_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"^/([A-Za-z_]+)(?:@([A-Za-z0-9_]+))?$").unwrap_or_else(|e| {
            unreachable!("command token pattern is valid: {}", e)
        })
    })
}

fn mention_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"^@?[A-Za-z0-9_]+$")
            .unwrap_or_else(|e| unreachable!("mention token pattern is valid: {}", e))
    })
}

/// Parse one chat message.
///
/// `bot_name` restricts suffixed commands to this bot; with `None` any
/// suffix is accepted.
pub fn parse(text: &str, bot_name: Option<&str>) -> Parsed {
    let mut tokens = text.split_whitespace();
    let head = match tokens.next() {
        Some(head) => head,
        None => return Parsed::Ignored,
    };
    let captures = match command_token().captures(head) {
        Some(captures) => captures,
        None => return Parsed::Ignored,
    };
    if let (Some(addressed), Some(me)) = (captures.get(2), bot_name) {
        if !addressed.as_str().eq_ignore_ascii_case(me.trim_start_matches(MENTION_PREFIX)) {
            return Parsed::Ignored;
        }
    }
    let args: Vec<&str> = tokens.collect();

    match captures[1].to_ascii_lowercase().as_str() {
        "start" => Parsed::Command(ChatCommand::Start),
        "help" => Parsed::Command(ChatCommand::Help),
        "roles" => Parsed::Command(ChatCommand::Roles),
        "setrole" => match members_then_role(&args) {
            Some((members, role)) => Parsed::Command(ChatCommand::SetRole { members, role }),
            None => Parsed::Usage(SETROLE_USAGE),
        },
        "unsetrole" => match members_then_role(&args) {
            Some((members, role)) => Parsed::Command(ChatCommand::UnsetRole { members, role }),
            None => Parsed::Usage(UNSETROLE_USAGE),
        },
        "delrole" => match single_role(&args) {
            Some(role) => Parsed::Command(ChatCommand::DelRole { role }),
            None => Parsed::Usage(DELROLE_USAGE),
        },
        "mention" => match single_role(&args) {
            Some(role) => Parsed::Command(ChatCommand::Mention { role }),
            None => Parsed::Usage(MENTION_USAGE),
        },
        _ => Parsed::Ignored,
    }
}

fn role_token(raw: &str) -> Option<RoleName> {
    if raw.starts_with(MENTION_PREFIX) {
        return None;
    }
    RoleName::parse(raw).ok()
}

fn single_role(args: &[&str]) -> Option<RoleName> {
    match args {
        [role] => role_token(role),
        _ => None,
    }
}

fn members_then_role(args: &[&str]) -> Option<(Vec<Member>, RoleName)> {
    let (role, handles) = args.split_last()?;
    if handles.is_empty() {
        return None;
    }
    let role = role_token(role)?;
    let mut members = Vec::with_capacity(handles.len());
    for handle in handles {
        if !mention_token().is_match(handle) {
            return None;
        }
        members.push(Member::parse(handle).ok()?);
    }
    Some((members, role))
}
