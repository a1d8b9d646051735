use std::io::Write;
use std::time::Duration;

use mimir::config::ProviderKind;
use tokio_test::{assert_err, assert_ok};
use mimir::{ContentGateway, Gateway, GenerationKind, MimirConfig, MimirError, Secrets};

const CONFIG: &str = r#"
[retry]
max_attempts = 3
base_delay_ms = 250

[cache]
capacity = 50

[cache.ttl]
question = 120

[gate]
call_limit = 12

[router]
deadline_secs = 20
default_language = "en"

[[providers]]
name = "sarvam"
kind = "openai-compatible"
base_url = "https://api.sarvam.ai/v1"
model = "sarvam-m"
languages = ["hi", "ta"]

[[providers]]
name = "local"
kind = "llm"
backend = "ollama"
model = "llama3.2"
priority = 2

[[providers]]
name = "disabled"
kind = "llm"
backend = "openai"
model = "gpt-4o-mini"
enabled = false
"#;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn load_from_file_parses_every_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "config.toml", CONFIG);

    let config = assert_ok!(MimirConfig::load_from_file(&path));

    assert_eq!(config.retry.policy().max_attempts, 3);
    assert_eq!(config.retry.policy().base_delay, Duration::from_millis(250));
    let cache = config.cache.cache_config();
    assert_eq!(cache.capacity, 50);
    assert_eq!(
        cache.ttl_for(GenerationKind::Question),
        Duration::from_secs(120)
    );
    assert_eq!(config.gate.call_limit, 12);
    assert_eq!(config.router.deadline_secs, 20);
    assert_eq!(config.providers.len(), 3);
    assert_eq!(config.providers[0].kind, ProviderKind::OpenaiCompatible);
    assert_eq!(config.enabled_providers().count(), 2);
}

#[test]
fn explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = assert_err!(MimirConfig::load(Some(&dir.path().join("nope.toml"))));
    assert!(matches!(err, MimirError::Configuration(_)));
}

#[test]
fn malformed_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "config.toml", "[retry\nmax_attempts = ");
    assert!(matches!(
        MimirConfig::load_from_file(&path),
        Err(MimirError::Configuration(_))
    ));
}

#[tokio::test]
async fn gateway_from_config_orders_and_gates_providers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "config.toml", CONFIG);
    let config = MimirConfig::load_from_file(&path).unwrap();
    let secrets = Secrets::default().with_key("sarvam", "sk-test");

    let gateway = Gateway::from_config(&config, &secrets).unwrap();

    let hindi: Vec<String> = gateway
        .fallback_order(GenerationKind::Question, "hi")
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(hindi, vec!["sarvam", "local"]);
    assert_eq!(gateway.router().deadline(), Duration::from_secs(20));
    assert_eq!(gateway.gate().call_limit(), 12);
    assert_eq!(gateway.cache_stats().capacity, 50);
}

#[cfg(unix)]
#[test]
fn secrets_with_open_permissions_are_rejected() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "secrets.toml", "[sarvam]\napi_key = \"sk-test\"\n");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let err = assert_err!(Secrets::load_from_file(&path));
    assert!(err.to_string().contains("insecure permissions"));

    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
    let secrets = assert_ok!(Secrets::load_from_file(&path));
    assert_eq!(secrets.file_key("sarvam"), Some("sk-test"));
}
