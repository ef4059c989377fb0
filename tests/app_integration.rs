use std::fs;
use std::time::Duration;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const CURRENCIES: &str = r#"{
        "meta": {"code": 200},
        "response": [
            {"id": 1, "name": "Euro", "short_code": "EUR"},
            {"id": 2, "name": "Pound Sterling", "short_code": "GBP"},
            {"id": 3, "name": "US Dollar", "short_code": "USD"}
        ]
    }"#;

    pub fn conversion(from: &str, to: &str, amount: f64, value: f64) -> String {
        format!(
            r#"{{"meta": {{"code": 200}}, "response": {{"from": "{from}", "to": "{to}", "amount": {amount}, "value": {value}}}}}"#
        )
    }

    pub async fn create_mock_server(currencies_status: u16) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/currencies"))
            .respond_with(ResponseTemplate::new(currencies_status).set_body_string(CURRENCIES))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/convert"))
            .and(query_param("from", "USD"))
            .and(query_param("to", "EUR"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(conversion("USD", "EUR", 100.0, 92.0)),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/convert"))
            .and(query_param("from", "EUR"))
            .and(query_param("to", "USD"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(conversion("EUR", "USD", 50.0, 54.347826)),
            )
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(file: &tempfile::NamedTempFile, base_url: &str) {
        let config_content = format!(
            r#"
            provider:
              base_url: {base_url}
              api_key: "test-key"
              retries: 0
            converter:
              debounce_ms: 20
            "#
        );
        std::fs::write(file.path(), config_content).expect("Failed to write config file");
    }
}

#[test_log::test(tokio::test)]
async fn test_convert_command_with_mock() {
    let mock_server = test_utils::create_mock_server(200).await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let result = fxconv::run_command(
        fxconv::AppCommand::Convert {
            amount: "100".to_string(),
            from: "usd".to_string(),
            to: "eur".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Convert command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_currencies_command_with_mock() {
    let mock_server = test_utils::create_mock_server(200).await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let result = fxconv::run_command(
        fxconv::AppCommand::Currencies,
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Currencies command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_convert_command_fails_without_currency_list() {
    let mock_server = test_utils::create_mock_server(500).await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let result = fxconv::run_command(
        fxconv::AppCommand::Convert {
            amount: "100".to_string(),
            from: "USD".to_string(),
            to: "EUR".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    let error = result.expect_err("Convert should fail").to_string();
    assert!(error.contains("Currency list unavailable"), "{error}");
}

#[test_log::test(tokio::test)]
async fn test_two_way_conversion_through_provider_stack() {
    use fxconv::core::Side;
    use fxconv::core::config::AppConfig;
    use fxconv::core::converter::Converter;

    let mock_server = test_utils::create_mock_server(200).await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());
    let config = AppConfig::load_from_path(config_file.path()).expect("Failed to load config");

    let provider = fxconv::providers::rate_provider(&config).expect("Failed to build provider");
    let mut handle = Converter::spawn(config.converter.settings(), provider);
    let timeout = Duration::from_secs(10);

    handle.on_amount_change(Side::First, "100");
    let view = handle.settled(timeout).await.expect("First conversion");
    info!(?view, "First conversion settled");
    assert_eq!(view.first.amount, "100");
    assert_eq!(view.second.amount, "92.00");
    assert_eq!(view.rate_label.as_deref(), Some("1 USD = 0.92 EUR"));
    assert!(view.inputs_enabled);
    assert_eq!(view.currencies.len(), 3);

    handle.on_amount_change(Side::Second, "50");
    let view = handle.settled(timeout).await.expect("Second conversion");
    assert_eq!(view.active, Side::Second);
    assert_eq!(view.first.amount, "54.35");
    assert_eq!(view.second.amount, "50");
    assert_eq!(view.rate_label.as_deref(), Some("1 USD = 0.92 EUR"));

    handle.on_amount_change(Side::First, "");
    let view = handle.settled(timeout).await.expect("Clear");
    assert_eq!(view.first.amount, "");
    assert_eq!(view.second.amount, "");

    handle.shutdown().await;
}

#[test]
fn test_setup_writes_loadable_config() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.yaml");

    fxconv::cli::setup::setup_at_path(&path).expect("Setup failed");
    let content = fs::read_to_string(&path).expect("Failed to read config");
    assert!(content.contains("debounce_ms"));

    let config = fxconv::core::config::AppConfig::load_from_path(&path).expect("Invalid config");
    assert_eq!(config.converter.first_currency, "USD");
}
