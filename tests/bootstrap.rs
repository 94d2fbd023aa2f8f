//! Startup behaviour: config dump, exit status, fatal configuration and
//! listener errors.

use std::path::PathBuf;

use rproxy::config::UpstreamConfig;
use rproxy::lifecycle::{startup, Outcome, Shutdown, StartupError, StartupOptions};
use rproxy::ProxyConfig;
use tempfile::tempdir;

fn serving_config(address: String) -> ProxyConfig {
    ProxyConfig {
        address,
        api_key: "secret".into(),
        host: vec![UpstreamConfig::new("http://svc-a.internal")],
        ..ProxyConfig::default()
    }
}

#[tokio::test]
async fn test_dumpconfig_writes_log_and_does_not_listen() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("proxy.log");
    let conf_path = dir.path().join("proxy.toml");

    // Occupy the configured address: binding it would fail the run.
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = occupied.local_addr().unwrap();

    std::fs::write(
        &conf_path,
        format!(
            r#"
Address = "{address}"
ApiKey = "secret"
HostHeader = "X-Target"
ApiKeyHeader = "X-Key"
LogFile = "{log}"

[[Host]]
URL = "http://svc-a.internal"
"#,
            address = address,
            log = log_path.display()
        ),
    )
    .unwrap();

    let options = StartupOptions {
        config_path: conf_path,
        dump_config: true,
    };
    let shutdown = Shutdown::new();
    let outcome = startup::run(&options, shutdown.subscribe()).await.unwrap();
    assert_eq!(outcome, Outcome::ConfigDumped);

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("\t\"ApiKey\": \"secret\""));
    assert!(log.contains("\"URL\": \"http://svc-a.internal\""));
    assert!(log.contains(&format!("\"Address\": \"{}\"", address)));
}

#[test]
fn test_dumpconfig_exits_nonzero_even_for_odd_config() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("proxy.log");
    let conf_path = dir.path().join("proxy.toml");

    // No hosts, no key and no address: serving would fail validation.
    std::fs::write(
        &conf_path,
        format!("Address = \"\"\nLogFile = \"{}\"\n", log_path.display()),
    )
    .unwrap();

    let status = std::process::Command::new(env!("CARGO_BIN_EXE_rproxy"))
        .arg("--conf")
        .arg(&conf_path)
        .arg("--dumpconfig")
        .env_remove("RUST_LOG")
        .status()
        .unwrap();
    assert!(!status.success());
    assert_eq!(status.code(), Some(1));

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("\t\"Address\": \"\""));
    assert!(log.contains("\t\"Host\": []"));
    assert!(log.contains("\t\"ApiKey\": \"\""));
}

#[test]
fn test_invalid_config_without_dump_exits_nonzero() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("proxy.log");
    let conf_path = dir.path().join("proxy.toml");
    std::fs::write(
        &conf_path,
        format!(
            "Address = \"\"\nApiKey = \"secret\"\nLogFile = \"{}\"\n",
            log_path.display()
        ),
    )
    .unwrap();

    let status = std::process::Command::new(env!("CARGO_BIN_EXE_rproxy"))
        .arg("--conf")
        .arg(&conf_path)
        .env_remove("RUST_LOG")
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Address must not be empty"));
}

#[tokio::test]
async fn test_missing_config_file_is_fatal() {
    let options = StartupOptions {
        config_path: PathBuf::from("/nonexistent/proxy.toml"),
        dump_config: false,
    };
    let shutdown = Shutdown::new();
    let err = startup::run(&options, shutdown.subscribe()).await.unwrap_err();
    assert!(matches!(err, StartupError::Config { .. }));
}

#[tokio::test]
async fn test_invalid_upstream_is_fatal() {
    let mut config = serving_config("127.0.0.1:0".into());
    config.host.push(UpstreamConfig::new("not a url"));

    let shutdown = Shutdown::new();
    let err = startup::serve(&config, shutdown.subscribe()).await.unwrap_err();
    assert!(matches!(err, StartupError::Server(_)));
}

#[tokio::test]
async fn test_missing_tls_material_is_fatal() {
    let dir = tempdir().unwrap();
    let mut config = serving_config("127.0.0.1:0".into());
    config.tls = true;
    config.cert_file = dir.path().join("cert.pem").display().to_string();
    config.key_file = dir.path().join("key.pem").display().to_string();

    let shutdown = Shutdown::new();
    let err = startup::serve(&config, shutdown.subscribe()).await.unwrap_err();
    assert!(matches!(err, StartupError::Tls(_)));
}

#[tokio::test]
async fn test_config_without_hosts_serves() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let config = ProxyConfig {
        address: addr.to_string(),
        ..ProxyConfig::default()
    };

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = tokio::spawn(async move { startup::serve(&config, rx).await });

    let mut connected = false;
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            connected = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(connected, "proxy with no hosts must still listen");

    shutdown.trigger();
    assert!(server.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_bind_failure_is_fatal() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let config = serving_config(occupied.local_addr().unwrap().to_string());

    let shutdown = Shutdown::new();
    let err = startup::serve(&config, shutdown.subscribe()).await.unwrap_err();
    assert!(matches!(err, StartupError::Listener(_)));
}
