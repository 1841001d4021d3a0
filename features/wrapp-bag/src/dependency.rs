use std::{convert::Infallible, str::FromStr};

const LAZY_PREFIX: &str = "lazy_";
const LAGS_PREFIX: &str = "lags_";

/// A declared dependency: the bag name plus its modifiers
///
/// Parsed from an identifier such as `lazy_lags_database`:
/// - `lazy_` defers the computation until the consumer asks for it
/// - `lags_` turns a failure into a [Rejected](crate::types::Rejected) value
///
/// Prefixes are taken in that order, `lags_lazy_x` is a lagged `lazy_x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub name: String,
    pub lazy: bool,
    pub lags: bool,
}

impl Dependency {
    pub fn parse(declared: &str) -> Self {
        let (lazy, rest) = strip_prefix(declared.trim(), LAZY_PREFIX);
        let (lags, name) = strip_prefix(rest, LAGS_PREFIX);

        Dependency {
            name: name.to_string(),
            lazy,
            lags,
        }
    }

    /// A dependency without modifiers
    pub fn named(name: impl Into<String>) -> Self {
        Dependency {
            name: name.into(),
            lazy: false,
            lags: false,
        }
    }
}

// A prefix is only a prefix if a name is left behind
fn strip_prefix<'a>(declared: &'a str, prefix: &str) -> (bool, &'a str) {
    match declared.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() => (true, rest),
        _ => (false, declared),
    }
}

impl FromStr for Dependency {
    type Err = Infallible;

    fn from_str(declared: &str) -> Result<Self, Self::Err> {
        Ok(Dependency::parse(declared))
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lazy {
            f.write_str(LAZY_PREFIX)?;
        }
        if self.lags {
            f.write_str(LAGS_PREFIX)?;
        }
        f.write_str(&self.name)
    }
}
