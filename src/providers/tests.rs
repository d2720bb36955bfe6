use super::http::error_message;
use super::*;
use crate::DocQaError;
use crate::config::ProviderConfig;
use serial_test::serial;

const TEST_KEY_VAR: &str = "DOC_QA_PROVIDER_TEST_KEY";

fn config_for(kind: ProviderKind) -> Config {
    Config {
        provider: ProviderConfig {
            api_key_env: Some(TEST_KEY_VAR.to_string()),
            ..ProviderConfig::for_kind(kind)
        },
        ..Config::default()
    }
}

#[test]
#[serial]
fn openai_without_key_fails_fast() {
    // SAFETY: tests touching the environment are serialized with `#[serial]`
    unsafe { std::env::remove_var(TEST_KEY_VAR) };

    let result = Provider::from_config(&config_for(ProviderKind::OpenAi));
    assert!(matches!(
        result,
        Err(DocQaError::MissingCredential(ref var)) if var == TEST_KEY_VAR
    ));
}

#[test]
#[serial]
fn openai_with_key() {
    // SAFETY: tests touching the environment are serialized with `#[serial]`
    unsafe { std::env::set_var(TEST_KEY_VAR, "sk-test") };

    let provider =
        Provider::from_config(&config_for(ProviderKind::OpenAi)).expect("provider should build");
    assert_eq!(provider.kind(), ProviderKind::OpenAi);

    // SAFETY: as above
    unsafe { std::env::remove_var(TEST_KEY_VAR) };
}

#[test]
#[serial]
fn ollama_without_key() {
    // SAFETY: tests touching the environment are serialized with `#[serial]`
    unsafe { std::env::remove_var(TEST_KEY_VAR) };

    let provider =
        Provider::from_config(&config_for(ProviderKind::Ollama)).expect("provider should build");
    assert_eq!(provider.kind(), ProviderKind::Ollama);
}

#[test]
fn error_message_formats() {
    assert_eq!(
        error_message(r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#),
        "Incorrect API key provided"
    );
    assert_eq!(
        error_message(r#"{"error": "model 'llama3' not found"}"#),
        "model 'llama3' not found"
    );
    assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    assert_eq!(error_message("   "), "empty response body");
    assert_eq!(error_message(&"x".repeat(500)).len(), 200);
}
