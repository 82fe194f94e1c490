//! Snapshot codec
//!
//! Human-readable JSON so operators can inspect the store and the remote
//! copy directly:
//!
//! ```json
//! {
//!   "-1001234": {
//!     "eng": ["alice", "bob"],
//!     "oncall": ["carol"]
//!   }
//! }
//! ```
//!
//! Role keys keep role creation order and member arrays keep first-insertion
//! order, so encoding goes through ordered serializer calls rather than a
//! `serde_json::Map` (which would sort keys).

mod errors;

pub use errors::{CodecError, CodecResult};

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::{GroupId, GroupRoles, Member, ModelError, RoleName, Snapshot};

/// Encode a snapshot to pretty-printed JSON bytes.
pub fn encode(snapshot: &Snapshot) -> Vec<u8> {
    serde_json::to_vec_pretty(&SnapshotView(snapshot))
        .unwrap_or_else(|e| unreachable!("string-keyed maps serialize into memory: {}", e))
}

/// Decode bytes into a snapshot.
///
/// Empty or whitespace-only input and `{}` both decode to the empty snapshot.
pub fn decode(bytes: &[u8]) -> CodecResult<Snapshot> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Snapshot::new());
    }

    let raw: OrderedMap<OrderedMap<Vec<String>>> = serde_json::from_slice(bytes)?;

    let mut snapshot = Snapshot::new();
    for (group_key, roles) in raw.0 {
        let invalid = |source: ModelError| CodecError::InvalidEntry {
            group: group_key.clone(),
            source,
        };
        let group = GroupId::parse(&group_key).map_err(invalid)?;
        for (role_key, members) in roles.0 {
            let role = RoleName::parse(&role_key).map_err(invalid)?;
            let members = members
                .iter()
                .map(|m| Member::parse(m))
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid)?;
            snapshot.add_members(&group, &role, members);
        }
    }
    Ok(snapshot)
}

struct SnapshotView<'a>(&'a Snapshot);

impl Serialize for SnapshotView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.group_count()))?;
        for (group, roles) in self.0.groups() {
            map.serialize_entry(group.as_str(), &RolesView(roles))?;
        }
        map.end()
    }
}

struct RolesView<'a>(&'a GroupRoles);

impl Serialize for RolesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (role, members) in self.0.iter() {
            let names: Vec<&str> = members.iter().map(Member::as_str).collect();
            map.serialize_entry(role.as_str(), &names)?;
        }
        map.end()
    }
}

/// JSON object read as key/value pairs in document order.
struct OrderedMap<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            entries.push((key, value));
        }
        Ok(OrderedMap(entries))
    }
}
