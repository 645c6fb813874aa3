use crate::path::DEFAULT_PREFIX;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub cache_scope: CacheScope,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cache_scope: CacheScope::default(),
            cache_enabled: default_cache_enabled(),
            prefix: default_prefix(),
        }
    }
}

/// Whether compilers share the process-wide cache or own one each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    #[default]
    Shared,
    Isolated,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}
