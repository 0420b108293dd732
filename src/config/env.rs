//! Environment variable access.
//!
//! Reads go through a lookup function so configuration can be loaded from
//! a fixed map in tests instead of mutating the process environment.

use std::fmt;
use std::str::FromStr;

use super::{ConfigError, ConfigResult};

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Read-only view over environment-style key/value pairs.
pub struct EnvReader {
    lookup: Lookup,
}

impl EnvReader {
    /// Reader over the process environment.
    pub fn process() -> Self {
        Self::new(|key| std::env::var(key).ok())
    }

    pub fn new(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Reader over a fixed set of pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map: std::collections::HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(move |key| map.get(key).cloned())
    }

    /// Value of `key`; empty values count as unset.
    pub fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    pub fn required(&self, key: &str) -> ConfigResult<String> {
        self.optional(key).ok_or_else(|| ConfigError::Missing {
            key: key.to_string(),
        })
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse `key` as `T`, falling back to `default` when unset.
    pub fn parse_or<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(key, format!("{raw:?}: {e}"))),
            None => Ok(default),
        }
    }
}

impl fmt::Debug for EnvReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvReader").finish_non_exhaustive()
    }
}
