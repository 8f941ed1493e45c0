use pl_domain::config::{ClientConfig, Config, ConfigSeverity};

#[test]
fn default_config_has_no_base_url() {
    let config = Config::default();
    assert!(config.client.base_url.is_empty());
    assert_eq!(config.client.api_key_env, "PARALEGAL_API_KEY");
    assert_eq!(config.client.timeout_ms, 30_000);
    assert_eq!(config.client.max_retries, 2);
}

#[test]
fn client_section_parses() {
    let toml_str = r#"
[client]
base_url = "https://host.example.com/"
timeout_ms = 5000
max_retries = 0
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.client.base_url, "https://host.example.com/");
    assert_eq!(config.client.timeout_ms, 5000);
    assert_eq!(config.client.max_retries, 0);
    // Unspecified fields keep their defaults.
    assert_eq!(config.client.connect_timeout_ms, 10_000);
}

#[test]
fn empty_file_parses_to_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert!(config.client.api_key.is_none());
}

#[test]
fn missing_base_url_is_an_error() {
    let issues = Config::default().validate();
    assert!(issues
        .iter()
        .any(|i| i.field == "client.base_url" && i.severity == ConfigSeverity::Error));
}

#[test]
fn non_http_base_url_is_an_error() {
    let config = Config {
        client: ClientConfig::with_base_url("ftp://host"),
    };
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("not an http(s) URL"));
}

#[test]
fn plaintext_key_is_a_warning() {
    let mut client = ClientConfig::with_base_url("https://host");
    client.api_key = Some("sk-test".into());
    let issues = Config { client }.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Warning);
    assert_eq!(issues[0].to_string(), "[WARN] client.api_key: API key stored in plaintext; prefer api_key_env");
}

#[test]
fn explicit_api_key_wins_over_env() {
    let mut client = ClientConfig::with_base_url("https://host");
    client.api_key = Some("sk-explicit".into());
    client.api_key_env = "PL_TEST_KEY_EXPLICIT_WINS".into();
    std::env::set_var("PL_TEST_KEY_EXPLICIT_WINS", "sk-env");
    assert_eq!(client.resolve_api_key().as_deref(), Some("sk-explicit"));
}

#[test]
fn api_key_falls_back_to_env() {
    let mut client = ClientConfig::with_base_url("https://host");
    client.api_key_env = "PL_TEST_KEY_FALLBACK".into();
    std::env::set_var("PL_TEST_KEY_FALLBACK", "sk-env");
    assert_eq!(client.resolve_api_key().as_deref(), Some("sk-env"));
}

#[test]
fn empty_api_key_counts_as_unset() {
    let mut client = ClientConfig::with_base_url("https://host");
    client.api_key = Some(String::new());
    client.api_key_env = "PL_TEST_KEY_NEVER_SET".into();
    assert!(client.resolve_api_key().is_none());
}
