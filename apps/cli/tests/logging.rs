use biogate_cli::logging;
use biogate_kernel::domain::config::LoggingConfig;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_file_logging_setup() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("logs");
    let config = LoggingConfig {
        console: false,
        level: "info".to_owned(),
        directory: Some(dir.clone()),
        json: true,
    };

    let guard = logging::init(&config, false).unwrap();
    assert!(guard.has_file_output());

    tracing::info!(feature = "vault", "hello from the gate");
    std::thread::sleep(Duration::from_millis(20));
    drop(guard);

    let log = fs::read_dir(&dir)
        .unwrap()
        .flatten()
        .find(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("log"))
        .expect("a rolling log file should be created");

    let contents = fs::read_to_string(log.path()).unwrap();
    assert!(contents.contains(r#""feature":"vault""#), "{contents}");
}
