//! Domain entities: identifiers, field maps and id sources

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Named string fields of a node.
pub type Properties = BTreeMap<String, String>;

/// One assessment attached to a node. Same shape as [`Properties`], but it
/// has no identity beyond its position in the owning node's sequence.
pub type Evaluation = BTreeMap<String, String>;

/// Opaque, stable identifier of a node.
///
/// Assigned once at creation and never reassigned; lookups always go through
/// tree traversal, never through held references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Mint a random (v4) id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The last `len` hex digits of the id.
    ///
    /// Uses the tail so that sequential ids (which share a zero prefix) still
    /// abbreviate to something distinct.
    pub fn short(&self, len: usize) -> String {
        let hex = self.0.simple().to_string();
        let start = hex.len().saturating_sub(len);
        hex[start..].to_string()
    }

    /// Full 32-digit lowercase hex form, used for suffix matching.
    pub fn hex(&self) -> String {
        self.0.simple().to_string()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Source of fresh node ids.
///
/// Implementations must never hand out the same id twice while a tree that
/// could contain it is still referenced.
pub trait IdGenerator {
    fn next_id(&mut self) -> NodeId;
}

/// Random v4 UUIDs; collision probability is negligible.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> NodeId {
        NodeId::random()
    }
}

/// Monotonic counter ids, for reproducible sessions and tests.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u128,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u128) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId::from_uuid(Uuid::from_u128(self.next));
        self.next += 1;
        id
    }
}

/// Build a field map from string pairs.
pub fn fields<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> BTreeMap<String, String>
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
