use csspath_core::CacheScope;
use csspath_engine::{ConfigError, ConfigLoader, CsspathConfig, OutputFormat};
use std::io::Write;
use std::path::Path;

#[test]
fn test_default_config() {
    let config = CsspathConfig::default();
    assert_eq!(config.compiler.cache_scope, CacheScope::Shared);
    assert!(config.compiler.cache_enabled);
    assert_eq!(config.compiler.prefix, "//");
    assert_eq!(config.output.format, OutputFormat::Text);
    assert!(!config.output.show_xpath);
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
compiler:
  cache_scope: isolated
  cache_enabled: false
  prefix: ".//"
output:
  format: json
  show_xpath: true
"#
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path()).await.unwrap();
    assert_eq!(config.compiler.cache_scope, CacheScope::Isolated);
    assert!(!config.compiler.cache_enabled);
    assert_eq!(config.compiler.prefix, ".//");
    assert_eq!(config.output.format, OutputFormat::Json);
    assert!(config.output.show_xpath);
}

#[tokio::test]
async fn test_partial_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "output:\n  format: xpath").unwrap();

    let config = ConfigLoader::load_from(file.path()).await.unwrap();
    assert_eq!(config.output.format, OutputFormat::Xpath);
    assert!(!config.output.show_xpath);
    assert_eq!(config.compiler, CsspathConfig::default().compiler);
}

#[tokio::test]
async fn test_invalid_yaml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "output:\n  format: sparkles").unwrap();

    let err = ConfigLoader::load_from(file.path()).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[tokio::test]
async fn test_missing_file() {
    let err = ConfigLoader::load_from(Path::new("/nonexistent/csspath.yaml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_output_format_parsing() {
    assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
    assert_eq!("xpath".parse::<OutputFormat>(), Ok(OutputFormat::Xpath));
    assert!("yaml".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::Text.to_string(), "text");
}

#[test]
fn test_blank_config_is_default() {
    assert_eq!(ConfigLoader::parse("  \n").unwrap(), CsspathConfig::default());
}

#[test]
fn test_prefix_is_validated() {
    let err = ConfigLoader::parse("compiler:\n  prefix: /html/body").unwrap_err();
    assert!(
        matches!(err, ConfigError::Invalid { field: "compiler.prefix", .. }),
        "{}",
        err
    );

    let config = ConfigLoader::parse("compiler:\n  prefix: /html/body//").unwrap();
    assert_eq!(config.compiler.prefix, "/html/body//");
}

#[test]
fn test_search_paths_start_with_working_directory() {
    let paths = ConfigLoader::search_paths();
    assert_eq!(paths[0], Path::new("csspath.yaml"));
    assert!(paths.iter().skip(1).all(|path| path.ends_with(".csspath/config.yaml")));
}
