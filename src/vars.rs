#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! `${name}` substitution environments.
//!
//! The configuration keeps one base [`Env`]; every testcase receives its own
//! derived copy, so nothing a testcase sets can leak into the next one.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    constants::{DEFAULT_DEBUG, DEFAULT_DIR, DEFAULT_LOG},
    error::ConfigError,
};

/// A set of variables available to `${name}` substitution. Names are case
/// insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Env {
    /// lower-cased variable name to value
    vars: BTreeMap<String, String>,
}

impl Env {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the environment every configuration starts from.
    pub fn with_defaults() -> Self {
        let mut env = Self::new();
        env.set("dir", DEFAULT_DIR);
        env.set("debug", DEFAULT_DEBUG);
        env.set("log", DEFAULT_LOG);
        env
    }

    /// Looks up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Sets (or overwrites) a variable.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.vars
            .insert(name.as_ref().to_lowercase(), value.into());
    }

    /// Sets every `(name, value)` pair, in order.
    pub fn extend<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in pairs {
            self.set(name, value);
        }
    }

    /// Returns a copy of this environment with `overrides` applied on top.
    pub fn derive<I, K, V>(&self, overrides: I) -> Env
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut derived = self.clone();
        derived.extend(overrides);
        derived
    }

    /// Iterates over all variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replaces every `${name}` in `text` with its value.
    pub fn apply(&self, text: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| ConfigError::UnterminatedVariable(text.to_string()))?;
            let name = &after[..end];
            let value = self
                .get(name)
                .ok_or_else(|| ConfigError::UnknownVariable(name.to_lowercase()))?;
            out.push_str(value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}
