mod clean;
mod fetch;
mod materialize;

pub(crate) use clean::read_cleaned;

use crate::config::Config;

/// Orchestrates the fetch -> clean -> materialize stages against one set of
/// storage locations.
///
/// Holds no other state: freshness is re-evaluated from disk on every call,
/// so a single instance can be constructed once per process and shared by
/// reference. Stages are synchronous and blocking; nothing here guards
/// against a second process mutating the same data directory.
pub struct Pipeline {
    pub(crate) config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
