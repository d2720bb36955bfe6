use super::*;
use crate::config::ProviderKind;

#[test]
fn client_configuration() {
    let config = ProviderConfig {
        base_url: Some("http://test-host:1234".to_string()),
        embedding_model: Some("test-model".to_string()),
        ..ProviderConfig::for_kind(ProviderKind::Ollama)
    };
    let client = OllamaClient::new(&config, None).expect("Failed to create client");

    assert_eq!(client.embedding_model, "test-model");
    assert_eq!(client.generation_model, "llama3.2:latest");
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(
        client.endpoint("api/embed").expect("endpoint").as_str(),
        "http://test-host:1234/api/embed"
    );
}

#[test]
fn generate_request_shape() {
    let request = GenerateRequest {
        model: "llama3.2:latest",
        prompt: "prompt text",
        stream: false,
        options: GenerateOptions {
            temperature: 0.0,
            num_predict: 1000,
        },
    };

    let json = serde_json::to_value(&request).expect("should serialize");
    assert_eq!(
        json,
        serde_json::json!({
            "model": "llama3.2:latest",
            "prompt": "prompt text",
            "stream": false,
            "options": { "temperature": 0.0, "num_predict": 1000 }
        })
    );
}

#[test]
fn models_response_parsing() {
    let body = r#"{"models": [{"name": "nomic-embed-text:latest", "size": 274302450, "digest": "0a109f422b47"}, {"name": "llama3.2:latest"}]}"#;
    let response: ModelsResponse = serde_json::from_str(body).expect("should parse");

    assert_eq!(response.models.len(), 2);
    assert_eq!(response.models[0].size, Some(274_302_450));
    assert_eq!(response.models[1].digest, None);
}

#[test]
fn unreachable_server_is_unavailable() {
    let config = ProviderConfig {
        base_url: Some("http://127.0.0.1:9".to_string()),
        timeout_seconds: 2,
        ..ProviderConfig::for_kind(ProviderKind::Ollama)
    };
    let client = OllamaClient::new(&config, None).expect("client");

    assert!(matches!(
        client.embed_batch(&["hello".to_string()]),
        Err(DocQaError::EmbeddingUnavailable(_))
    ));
}
