//! Shutdown behaviour of a bound listener.

use std::sync::Arc;
use std::time::Duration;

use executor::testing::RecordingRunner;
use executor::PipelineExecutor;
use listener::WebhookListener;
use pipeline::{sign, ConfigInput, ServiceConfig};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

const SECRET: &str = "shutdown-secret";
const PUBLISHED: &str = r#"{"action":"published","repository":{"full_name":"org/repo"},"release":{"tag_name":"4.2.0","assets":[]}}"#;

#[tokio::test]
async fn accepted_run_completes_after_client_hangs_up_and_shutdown_starts() {
    let runner = Arc::new(RecordingRunner::new().with_delay(Duration::from_millis(100)));
    let mut input = ConfigInput::with_secrets(SECRET, "ghp_shutdown");
    input.listen_addr = "127.0.0.1:0".parse().unwrap();
    input.target_repository = "org/repo".to_string();
    let config = Arc::new(ServiceConfig::from_input(input).unwrap());
    let executor = Arc::new(PipelineExecutor::new(config.clone(), runner.clone()));

    let listener = WebhookListener::bind(config, executor).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(listener.run(async move {
        let _ = stop_rx.await;
    }));

    let signature = sign(SECRET.as_bytes(), PUBLISHED.as_bytes()).unwrap();
    let request = format!(
        "POST /webhook HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Content-Type: application/json\r\n\
         X-GitHub-Event: release\r\n\
         X-Hub-Signature-256: {signature}\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {PUBLISHED}",
        PUBLISHED.len()
    );
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    // Hang up while the run is mid-way, then ask the server to stop.
    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(stream);
    stop_tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 8, "run was cut short: {calls:?}");
    assert_eq!(calls.last().map(String::as_str), Some("git push origin main --tags"));
}
