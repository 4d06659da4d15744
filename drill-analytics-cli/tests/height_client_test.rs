use drill_analytics::models::VideoSource;
use drill_analytics::services::HeightEstimator;
use drill_analytics_cli::api::{ApiError, HeightSource, HttpHeightEstimator, RetryConfig};
use drill_analytics_cli::config::ApiConfig;
use mockito::Server;

fn api_config(base_url: String) -> ApiConfig {
    ApiConfig {
        base_url,
        timeout_seconds: 5,
        max_retries: 3,
    }
}

fn fast_retries() -> RetryConfig {
    RetryConfig {
        max_retries: 3,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        backoff_factor: 2.0,
    }
}

fn sample_video() -> VideoSource {
    VideoSource::new("sprint.mp4", vec![0u8, 1, 2, 3])
}

#[tokio::test]
async fn test_estimate_height_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/estimate_height")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"estimated_height": 1.82}"#)
        .expect(1)
        .create_async()
        .await;

    let client =
        HttpHeightEstimator::with_retry_config(&api_config(server.url()), fast_retries()).unwrap();
    let height = client.estimate_height(&sample_video()).await.unwrap();

    assert!((height - 1.82).abs() < 1e-9);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_service_error_body_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/estimate_height")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "no video uploaded"}"#)
        .expect(1)
        .create_async()
        .await;

    let client =
        HttpHeightEstimator::with_retry_config(&api_config(server.url()), fast_retries()).unwrap();
    let err = client.estimate(&sample_video()).await.unwrap_err();

    match err.downcast_ref::<ApiError>() {
        Some(ApiError::BadRequest(message)) => assert_eq!(message, "no video uploaded"),
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/estimate_height")
        .with_status(500)
        .with_body("boom")
        .expect(3)
        .create_async()
        .await;

    let client =
        HttpHeightEstimator::with_retry_config(&api_config(server.url()), fast_retries()).unwrap();
    let err = client.estimate(&sample_video()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::ServerError(_))
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_success_without_height_is_invalid() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/estimate_height")
        .with_status(200)
        .with_body(r#"{"error": "could not find a person"}"#)
        .create_async()
        .await;

    let client =
        HttpHeightEstimator::with_retry_config(&api_config(server.url()), fast_retries()).unwrap();
    let err = client.estimate(&sample_video()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::EstimationFailed(_))
    ));
}

#[tokio::test]
async fn test_fixed_height_source_skips_network() {
    let source = HeightSource::Fixed(1.75);
    let height = source.estimate_height(&sample_video()).await.unwrap();
    assert_eq!(height, 1.75);
}
