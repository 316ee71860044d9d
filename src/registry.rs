//! Name-keyed constructor tables.
//!
//! A [`Registry`] maps implementation names (as they appear in configuration)
//! to constructors. Registration happens through `&mut self` while the host is
//! starting up; afterwards the registry is shared behind an `Arc` and only
//! read.

use std::collections::HashMap;
use std::fmt;

use livecam_core::{ConfigNode, Error, Result};

/// Constructor stored in a [`Registry`].
pub type Constructor<T, A> = Box<dyn Fn(ConfigNode, &A) -> Result<T> + Send + Sync>;

/// Name → constructor lookup table.
///
/// `T` is the constructed object (usually a boxed trait object) and `A` the
/// named arguments every constructor receives besides its configuration.
pub struct Registry<T, A> {
    kind: &'static str,
    constructors: HashMap<String, Constructor<T, A>>,
}

impl<T, A> Registry<T, A> {
    /// Create an empty registry. `kind` names it in lookup errors.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            constructors: HashMap::new(),
        }
    }

    /// Register `constructor` under `name`.
    ///
    /// A later registration under an existing name replaces the earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(ConfigNode, &A) -> Result<T> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .constructors
            .insert(name.clone(), Box::new(constructor))
            .is_some()
        {
            tracing::debug!(registry = self.kind, name = %name, "constructor replaced");
        }
        self
    }

    /// Construct the implementation registered under `name`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownName`] if nothing is registered under `name`, otherwise
    /// whatever the constructor returns.
    pub fn resolve(&self, name: &str, config: ConfigNode, args: &A) -> Result<T> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| Error::unknown(self.kind, name))?;
        constructor(config, args)
    }

    /// Whether a constructor is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// What this registry holds ("camera driver", "framework").
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl<T, A> fmt::Debug for Registry<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("names", &self.names())
            .finish()
    }
}
