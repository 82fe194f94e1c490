//! Snapshot: Group -> Role -> ordered member set

use std::collections::BTreeMap;

use super::names::{GroupId, Member, RoleName};

/// Ordered set of members, first-insertion order, no duplicates.
///
/// Membership checks are linear scans; roles hold a handful of handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberSet {
    members: Vec<Member>,
}

impl MemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member. Returns false if it was already present.
    pub fn insert(&mut self, member: Member) -> bool {
        if self.contains(&member) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// Remove a member. Returns false if it was not present.
    pub fn remove(&mut self, member: &Member) -> bool {
        match self.members.iter().position(|m| m == member) {
            Some(idx) => {
                self.members.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, member: &Member) -> bool {
        self.members.contains(member)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    pub fn to_vec(&self) -> Vec<Member> {
        self.members.clone()
    }
}

impl FromIterator<Member> for MemberSet {
    fn from_iter<I: IntoIterator<Item = Member>>(iter: I) -> Self {
        let mut set = MemberSet::new();
        for member in iter {
            set.insert(member);
        }
        set
    }
}

/// Roles of one group, in role creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRoles {
    roles: Vec<(RoleName, MemberSet)>,
}

impl GroupRoles {
    pub fn get(&self, role: &RoleName) -> Option<&MemberSet> {
        self.roles
            .iter()
            .find(|(name, _)| name == role)
            .map(|(_, members)| members)
    }

    fn get_mut(&mut self, role: &RoleName) -> Option<&mut MemberSet> {
        self.roles
            .iter_mut()
            .find(|(name, _)| name == role)
            .map(|(_, members)| members)
    }

    fn remove_role(&mut self, role: &RoleName) -> Option<MemberSet> {
        let idx = self.roles.iter().position(|(name, _)| name == role)?;
        Some(self.roles.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RoleName, &MemberSet)> {
        self.roles.iter().map(|(name, members)| (name, members))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Complete registry state.
///
/// Invariants held by every mutator:
/// - no role with zero members
/// - no group with zero roles
/// - no duplicate member within a role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    groups: BTreeMap<GroupId, GroupRoles>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, group: &GroupId) -> Option<&GroupRoles> {
        self.groups.get(group)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&GroupId, &GroupRoles)> {
        self.groups.iter()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn role_count(&self) -> usize {
        self.groups.values().map(GroupRoles::len).sum()
    }

    pub fn members_of(&self, group: &GroupId, role: &RoleName) -> Option<&MemberSet> {
        self.groups.get(group)?.get(role)
    }

    /// Roles of a group with their members, in role creation order.
    pub fn list_roles(&self, group: &GroupId) -> Vec<(RoleName, Vec<Member>)> {
        match self.groups.get(group) {
            Some(roles) => roles
                .iter()
                .map(|(name, members)| (name.clone(), members.to_vec()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Append members not already present. Creates the role on first add.
    ///
    /// Returns the members actually added, in input order. A role is never
    /// created empty: if nothing is added, the snapshot is untouched.
    pub fn add_members<I>(&mut self, group: &GroupId, role: &RoleName, members: I) -> Vec<Member>
    where
        I: IntoIterator<Item = Member>,
    {
        let existing = self.members_of(group, role);
        let mut fresh = MemberSet::new();
        for member in members {
            if existing.map_or(true, |set| !set.contains(&member)) {
                fresh.insert(member);
            }
        }
        if fresh.is_empty() {
            return Vec::new();
        }

        let roles = self.groups.entry(group.clone()).or_default();
        if roles.get(role).is_none() {
            roles.roles.push((role.clone(), MemberSet::new()));
        }
        if let Some(set) = roles.get_mut(role) {
            for member in fresh.iter() {
                set.insert(member.clone());
            }
        }
        fresh.to_vec()
    }

    /// Remove listed members. `None` if the role does not exist.
    ///
    /// Prunes the role when it becomes empty, and the group with it.
    pub fn remove_members<I>(
        &mut self,
        group: &GroupId,
        role: &RoleName,
        members: I,
    ) -> Option<Vec<Member>>
    where
        I: IntoIterator<Item = Member>,
    {
        let roles = self.groups.get_mut(group)?;
        let set = roles.get_mut(role)?;

        let mut removed = Vec::new();
        for member in members {
            if set.remove(&member) {
                removed.push(member);
            }
        }

        if set.is_empty() {
            roles.remove_role(role);
        }
        self.prune_group(group);
        Some(removed)
    }

    /// Remove a role regardless of membership. Returns false if absent.
    pub fn delete_role(&mut self, group: &GroupId, role: &RoleName) -> bool {
        let removed = match self.groups.get_mut(group) {
            Some(roles) => roles.remove_role(role).is_some(),
            None => false,
        };
        self.prune_group(group);
        removed
    }

    fn prune_group(&mut self, group: &GroupId) {
        if self.groups.get(group).map_or(false, GroupRoles::is_empty) {
            self.groups.remove(group);
        }
    }
}
