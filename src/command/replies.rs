//! Reply text

use crate::model::{Member, RoleName};

pub const START: &str =
    "✅ Bot is running! Use /setrole, /unsetrole, /delrole, /mention, /roles to manage user roles.";

pub const HELP: &str = "\
/setrole @username [@username ...] role - add members to a role
/unsetrole @username [@username ...] role - remove members from a role
/delrole role - delete a role
/mention role - mention every member of a role
/roles - list roles in this chat";

pub const DENIED: &str = "❌ Only admins can manage roles.";

pub const NO_ROLES: &str = "ℹ️ No roles have been set yet.";

pub const STORE_FAILED: &str = "⚠️ Could not save roles right now. Nothing was changed, please try again.";

fn mentions(members: &[Member], separator: &str) -> String {
    members
        .iter()
        .map(Member::mention)
        .collect::<Vec<_>>()
        .join(separator)
}

pub fn role_not_found(role: &RoleName) -> String {
    format!("❌ No users found for role '{}'.", role)
}

pub fn added(role: &RoleName, added: &[Member], present: &[Member]) -> String {
    let mut lines = Vec::with_capacity(2);
    if !added.is_empty() {
        lines.push(format!("✅ {} added to role *{}*", mentions(added, ", "), role));
    }
    if !present.is_empty() {
        lines.push(format!(
            "ℹ️ {} already in role *{}*",
            mentions(present, ", "),
            role
        ));
    }
    lines.join("\n")
}

pub fn removed(role: &RoleName, removed: &[Member], absent: &[Member]) -> String {
    let mut lines = Vec::with_capacity(2);
    if !removed.is_empty() {
        lines.push(format!(
            "✅ {} removed from role *{}*",
            mentions(removed, ", "),
            role
        ));
    }
    if !absent.is_empty() {
        lines.push(format!("ℹ️ {} not in role *{}*", mentions(absent, ", "), role));
    }
    lines.join("\n")
}

pub fn deleted(role: &RoleName) -> String {
    format!("🗑️ Role *{}* deleted.", role)
}

pub fn mention(role: &RoleName, members: &[Member]) -> String {
    format!("📢 Members with *{}* role:\n{}", role, mentions(members, " "))
}

pub fn roles(roles: &[(RoleName, Vec<Member>)]) -> String {
    if roles.is_empty() {
        return NO_ROLES.to_string();
    }
    let mut message = String::from("📋 *Current Roles:*\n");
    for (role, members) in roles {
        message.push_str(&format!("- *{}*: {}\n", role, mentions(members, ", ")));
    }
    message
}
