//! Process-level startup behaviour

use std::process::Command;

#[test]
fn test_exits_without_sender_key() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let output = Command::new(env!("CARGO_BIN_EXE_nostr-alert"))
        .env_remove("SENDER_NSEC")
        .env_remove("WEBHOOK_USERNAME")
        .env_remove("WEBHOOK_PASSWORD")
        .env("PORT", port.to_string())
        .output()
        .expect("failed to run nostr-alert");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SENDER_NSEC is not set"), "stderr: {}", stderr);
    assert!(!stderr.contains("started"), "server should not have bound: {}", stderr);

    // The port was never taken
    assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());
}

#[test]
fn test_version_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_nostr-alert"))
        .arg("--version")
        .output()
        .expect("failed to run nostr-alert");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("nostr-alert"));
}
