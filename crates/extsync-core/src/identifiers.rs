use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::source::RemoteSource;

/// Mapping from local handle to a remote identifier.
///
/// Insertion order is kept so results and snapshots come out in a stable order.
pub type IdentifierMap = IndexMap<String, String>;

/// Which remote field a stored identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKey {
    #[default]
    Uuid,
    Id,
}

impl MatchKey {
    /// Read the keyed field off a remote registration.
    pub fn of<'a>(&self, remote: &'a RemoteSource) -> &'a str {
        match self {
            MatchKey::Uuid => &remote.uuid,
            MatchKey::Id => &remote.id,
        }
    }
}

impl std::fmt::Display for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKey::Uuid => write!(f, "uuid"),
            MatchKey::Id => write!(f, "id"),
        }
    }
}

impl std::str::FromStr for MatchKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uuid" => Ok(MatchKey::Uuid),
            "id" => Ok(MatchKey::Id),
            other => Err(format!("unknown match key '{other}', expected uuid or id")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_key_reads_field() {
        let remote = RemoteSource::new("UUID_A", "A", "A", "CHECKOUT_POST_PURCHASE");
        assert_eq!(MatchKey::Uuid.of(&remote), "UUID_A");
        assert_eq!(MatchKey::Id.of(&remote), "A");
    }

    #[test]
    fn test_match_key_parse() {
        assert_eq!("UUID".parse::<MatchKey>().unwrap(), MatchKey::Uuid);
        assert_eq!("id".parse::<MatchKey>().unwrap(), MatchKey::Id);
        assert!("handle".parse::<MatchKey>().is_err());
    }

    #[test]
    fn test_identifier_map_keeps_insertion_order() {
        let mut map = IdentifierMap::new();
        map.insert("zeta".into(), "1".into());
        map.insert("alpha".into(), "2".into());
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
