use crate::formatter::OutputFormat;
use csspath_core::CompilerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsspathConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Print the compiled XPath above the matches.
    #[serde(default = "default_show_xpath")]
    pub show_xpath: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            show_xpath: default_show_xpath(),
        }
    }
}

fn default_show_xpath() -> bool {
    false
}

/// A rendering prefix is glued to the first step's element name, so it must
/// end with a `/` (`//`, `.//`, `/html/body//`).
pub fn check_prefix(prefix: &str) -> Result<(), String> {
    if prefix.ends_with('/') {
        Ok(())
    } else {
        Err(format!("prefix {:?} must end with '/'", prefix))
    }
}
