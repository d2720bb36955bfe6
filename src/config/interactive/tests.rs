use super::credential_status as credential_status_impl;
use super::load_existing_config as load_existing_config_impl;
use super::*;
use serial_test::serial;
use tempfile::TempDir;

const TEST_KEY_VAR: &str = "DOC_QA_INTERACTIVE_TEST_KEY";

#[test]
fn load_existing_config_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = load_existing_config_impl(temp_dir.path()).expect("config loaded successfully");

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert!(!config.provider.generation_model().is_empty());
    assert!(config.retrieval.top_k > 0);
}

#[test]
fn load_existing_config_from_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[retrieval]\ntop_k = 7\n",
    )
    .expect("should write config");

    let config = load_existing_config_impl(temp_dir.path()).expect("config loaded successfully");
    assert_eq!(config.retrieval.top_k, 7);
}

#[test]
#[serial]
fn credential_status_never_shows_key() {
    let mut config = Config::default();
    config.provider.api_key_env = Some(TEST_KEY_VAR.to_string());

    // SAFETY: tests touching the environment are serialized with `#[serial]`
    unsafe { std::env::set_var(TEST_KEY_VAR, "sk-very-secret") };
    let status = credential_status_impl(&config);
    assert!(status.starts_with("set"));
    assert!(!status.contains("sk-very-secret"));

    // SAFETY: as above
    unsafe { std::env::remove_var(TEST_KEY_VAR) };
    assert!(credential_status_impl(&config).starts_with("missing"));

    config.provider.kind = ProviderKind::Ollama;
    assert!(credential_status_impl(&config).starts_with("not set"));
}
