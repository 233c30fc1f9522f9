use std::collections::BTreeMap;
use std::fmt::Debug;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// IDs exactly as they appear in the feed
pub mod orig {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct StopID(pub String);

    /// The rider-facing code of a stop. Feeds that leave `stop_code` blank fall back to the
    /// `stop_id`.
    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct StopCode(pub String);

    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct TripID(pub String);

    impl fmt::Display for StopCode {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl fmt::Display for TripID {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StopID(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TripID(pub usize);

impl CheapID for StopID {
    fn new(x: usize) -> Self {
        Self(x)
    }
}
impl CheapID for TripID {
    fn new(x: usize) -> Self {
        Self(x)
    }
}

pub trait CheapID: Copy {
    fn new(x: usize) -> Self;
}

#[derive(Debug, thiserror::Error)]
#[error("IDMapping lookup of {0:?} failed")]
pub struct UnknownID<K: Debug>(pub K);

#[derive(Clone, Serialize, Deserialize)]
pub struct IDMapping<K: Ord, V> {
    orig_to_cheap: BTreeMap<K, V>,
    // We don't need to store the inverse. It's more convenient for each object to own that.
}

impl<K: Clone + Debug + Ord, V: CheapID> IDMapping<K, V> {
    pub fn new() -> Self {
        Self {
            orig_to_cheap: BTreeMap::new(),
        }
    }

    pub fn insert_new(&mut self, orig: K) -> Result<V> {
        let cheap = V::new(self.orig_to_cheap.len());
        if self.orig_to_cheap.insert(orig.clone(), cheap).is_some() {
            bail!("IDMapping::insert_new has duplicate input for {:?}", orig);
        }
        Ok(cheap)
    }

    pub fn lookup(&self, orig: &K) -> Result<V, UnknownID<K>> {
        self.orig_to_cheap
            .get(orig)
            .copied()
            .ok_or_else(|| UnknownID(orig.clone()))
    }

    pub fn len(&self) -> usize {
        self.orig_to_cheap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orig_to_cheap.is_empty()
    }

    pub fn borrow(&self) -> &BTreeMap<K, V> {
        &self.orig_to_cheap
    }
}

impl<K: Clone + Debug + Ord, V: CheapID> Default for IDMapping<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
