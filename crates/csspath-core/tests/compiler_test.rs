use csspath_core::{CacheScope, CompileError, Compiler, CompilerConfig, RELATIVE_PREFIX};

#[test]
fn test_default_config() {
    let config = CompilerConfig::default();
    assert_eq!(config.cache_scope, CacheScope::Shared);
    assert!(config.cache_enabled);
    assert_eq!(config.prefix, "//");
}

#[test]
fn test_isolated_compiler_from_config() {
    let config = CompilerConfig {
        cache_scope: CacheScope::Isolated,
        cache_enabled: false,
        prefix: RELATIVE_PREFIX.to_string(),
    };
    let compiler = Compiler::from_config(&config);

    assert_eq!(compiler.prefix(), ".//");
    assert!(!compiler.cache().is_enabled());
    assert_eq!(compiler.xpath_for("div > a").unwrap(), ".//div/a");
    assert!(compiler.cache().is_empty());
}

#[test]
fn test_custom_prefix() {
    let compiler = Compiler::isolated().with_prefix("/html/body//");
    assert_eq!(
        compiler.xpath_for("p.red").unwrap(),
        "/html/body//p[contains(concat(' ', normalize-space(@class), ' '), ' red ')]"
    );
}

#[test]
fn test_syntax_error_reports_position() {
    let compiler = Compiler::isolated();
    let err = compiler.compile("div > > a").unwrap_err();
    assert!(matches!(err, CompileError::Syntax(_)));
    assert_eq!(err.position(), Some(6));
    assert!(err.to_string().starts_with("Syntax error"));
}

#[test]
fn test_unsupported_feature_error() {
    let compiler = Compiler::isolated();
    let err = compiler.compile("input:focus").unwrap_err();
    assert!(matches!(err, CompileError::Unsupported(_)));
    assert!(err.to_string().contains(":focus"), "{}", err);
}

#[test]
fn test_oversized_integer_is_positioned_syntax_error() {
    let err = Compiler::isolated()
        .compile("li:nth-child(99999999999999999999)")
        .unwrap_err();
    assert!(matches!(err, CompileError::Syntax(_)));
    assert_eq!(err.position(), Some(13));
}
