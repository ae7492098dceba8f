//! Configuration loading tests across formats, substitution and overrides

use super::*;
use std::fs;
use tempfile::TempDir;

fn create_test_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let path = dir.path().join(filename);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_detect_format() {
    assert!(matches!(detect_format("w.toml"), Ok(FileFormat::Toml)));
    assert!(matches!(detect_format("w.YML"), Ok(FileFormat::Yaml)));
    assert!(matches!(detect_format("w.json"), Ok(FileFormat::Json)));
    assert!(matches!(
        detect_format("w.ini"),
        Err(ConfigError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        detect_format("hotwidget"),
        Err(ConfigError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_empty_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_test_file(&temp_dir, "hotwidget.toml", "");

    let config: HotwidgetConfig = load_config(&path).unwrap();
    assert_eq!(config, HotwidgetConfig::default());
    assert_eq!(config.script.entry_point, "render");
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let toml = r#"
[script]
max_operations = 5000
max_expr_depth = 0

[watch]
debounce_ms = 250
"#;
    let toml_path = create_test_file(&temp_dir, "hotwidget.toml", toml);
    let config: HotwidgetConfig = load_config(&toml_path).unwrap();
    assert_eq!(config.script.max_operations, 5000);
    assert_eq!(config.script.max_call_levels, 64);
    assert_eq!(config.script.max_expr_depth, 0);
    assert_eq!(config.script.max_function_expr_depth, 256);
    assert_eq!(config.watch.debounce(), Duration::from_millis(250));
    assert_eq!(config.http, HttpConfig::default());

    let yaml = r#"
http:
  timeout_secs: 0
loader:
  temp_dir: /tmp/widgets
"#;
    let yaml_path = create_test_file(&temp_dir, "hotwidget.yaml", yaml);
    let config: HotwidgetConfig = load_config(&yaml_path).unwrap();
    assert_eq!(config.http.timeout(), None);
    assert_eq!(config.loader.temp_dir, Some(PathBuf::from("/tmp/widgets")));

    let json = r#"{ "script": { "entry_point": "draw" } }"#;
    let json_path = create_test_file(&temp_dir, "hotwidget.json", json);
    let config: HotwidgetConfig = load_config(&json_path).unwrap();
    assert_eq!(config.script.entry_point, "draw");
}

#[test]
fn test_env_var_substitution() {
    unsafe { std::env::set_var("HOTWIDGET_TEST_AGENT", "preview-bot"); }

    let substituted = substitute_env_vars("ua=${HOTWIDGET_TEST_AGENT} plain=$HOTWIDGET_TEST_AGENT");
    assert_eq!(substituted, "ua=preview-bot plain=preview-bot");

    let untouched = substitute_env_vars("ua=${HOTWIDGET_TEST_UNSET_VAR}");
    assert_eq!(untouched, "ua=${HOTWIDGET_TEST_UNSET_VAR}");

    let config: HotwidgetConfig = from_str(
        "[http]\nuser_agent = \"${HOTWIDGET_TEST_AGENT}\"\n",
        FileFormat::Toml,
    )
    .unwrap();
    assert_eq!(config.http.user_agent, "preview-bot");

    unsafe { std::env::remove_var("HOTWIDGET_TEST_AGENT"); }
}

#[test]
fn test_env_overrides_file_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_test_file(&temp_dir, "hotwidget.toml", "[http]\ntimeout_secs = 10\n");

    unsafe { std::env::set_var("HWTEST_HTTP__TIMEOUT_SECS", "3"); }
    let config: HotwidgetConfig = load_with_env(&path, "HWTEST").unwrap();
    unsafe { std::env::remove_var("HWTEST_HTTP__TIMEOUT_SECS"); }

    assert_eq!(config.http.timeout(), Some(Duration::from_secs(3)));
}

#[test]
fn test_invalid_content_is_parse_error() {
    let result: ConfigResult<HotwidgetConfig> = from_str("[script\n", FileFormat::Toml);
    assert!(matches!(result, Err(ConfigError::Parse(_))));

    let result: ConfigResult<HotwidgetConfig> =
        from_str("[script]\nmax_operations = \"many\"\n", FileFormat::Toml);
    assert!(matches!(result, Err(ConfigError::Serialization(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let result: ConfigResult<HotwidgetConfig> = load_config("/nonexistent/hotwidget.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));

    let err: WidgetError = result.unwrap_err().into();
    assert!(matches!(err, WidgetError::Config(_)));
}
