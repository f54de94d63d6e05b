use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single leasable hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolMember(String);

impl PoolMember {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self(hostname.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PoolMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoolMember {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Membership lists of one named pool.
///
/// Field names are the on-disk keys of the pool document. Keys this crate
/// does not know about (`size`, `requests`, ...) are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    /// Hostnames that can be leased.
    #[serde(rename = "pool_instances", default)]
    pub available: Vec<String>,
    /// Hostnames currently checked out.
    #[serde(rename = "used_instances", default)]
    pub leased: Vec<String>,
    /// Hostnames retired for good.
    #[serde(
        rename = "garbage_collection",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub garbage: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Pool {
    pub fn with_available<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: hosts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Remove a uniformly random member from `available` and record it as leased.
    ///
    /// Returns `None` when nothing is available.
    pub fn lease_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PoolMember> {
        if self.available.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.available.len());
        let host = self.available.remove(idx);
        self.available.retain(|h| h != &host);
        if !self.leased.contains(&host) {
            self.leased.push(host.clone());
        }
        Some(PoolMember(host))
    }

    /// Move `member` from `leased` back to `available`.
    ///
    /// Returns `false` and leaves the pool untouched if the member was not leased.
    pub fn give_back(&mut self, member: &str) -> bool {
        if !self.leased.iter().any(|h| h == member) {
            return false;
        }
        self.leased.retain(|h| h != member);
        if !self.available.iter().any(|h| h == member) {
            self.available.push(member.to_string());
        }
        true
    }

    /// Retire `member`: drop it from `leased` and `available`, append to `garbage` once.
    ///
    /// Returns `false` if the member was already in `garbage`.
    pub fn retire(&mut self, member: &str) -> bool {
        self.leased.retain(|h| h != member);
        self.available.retain(|h| h != member);
        if self.garbage.iter().any(|h| h == member) {
            return false;
        }
        self.garbage.push(member.to_string());
        true
    }

    /// Check the membership invariants: every list is duplicate free and the
    /// three lists are pairwise disjoint.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let lists: [(&'static str, &Vec<String>); 3] = [
            ("pool_instances", &self.available),
            ("used_instances", &self.leased),
            ("garbage_collection", &self.garbage),
        ];

        let mut seen: BTreeMap<&str, &'static str> = BTreeMap::new();
        for (list, hosts) in lists {
            for host in hosts {
                if let Some(first) = seen.insert(host.as_str(), list) {
                    return Err(InvariantViolation {
                        hostname: host.clone(),
                        first,
                        second: list,
                    });
                }
            }
        }
        Ok(())
    }
}

/// A hostname that appears twice across (or within) the membership lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub hostname: String,
    pub first: &'static str,
    pub second: &'static str,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.second {
            write!(f, "'{}' is listed twice in {}", self.hostname, self.first)
        } else {
            write!(
                f,
                "'{}' is listed in both {} and {}",
                self.hostname, self.first, self.second
            )
        }
    }
}

/// Every pool known to a store, keyed by pool name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolCollection {
    pools: BTreeMap<String, Pool>,
}

impl PoolCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, pool: Pool) {
        self.pools.insert(name.into(), pool);
    }

    pub fn get(&self, name: &str) -> Option<&Pool> {
        self.pools.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Pool> {
        self.pools.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pool)> {
        self.pools.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
