use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn chatdesk(config_dir: &Path, base_url: &str, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chatdesk"));
    cmd.arg("--config-dir")
        .arg(config_dir)
        .args(args)
        .env("CHATDESK_BASE_URL", base_url)
        .env("CHATDESK__LOGGING__DIR", config_dir.join("logs"))
        .env_remove("CHATDESK_TOKEN")
        .env_remove("CHATDESK__AUTH__STRATEGY")
        .env_remove("RUST_LOG")
        .env_remove("LOG_FORMAT");
    cmd
}

fn run(cmd: &mut Command) -> (Output, String, String) {
    let output = cmd.output().expect("Failed to run chatdesk");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    println!("STDOUT:\n{}", stdout);
    println!("STDERR:\n{}", stderr);
    (output, stdout, stderr)
}

#[test]
fn test_sessions_lists_labels_and_marks_active() {
    let mut server = mockito::Server::new();
    let sessions = server
        .mock("GET", "/sessions")
        .match_header("cookie", "access_token=jwt")
        .with_status(200)
        .with_body(r#"[{"id":"a","name":"Trip"},{"id":"b","name":""}]"#)
        .create();
    let messages = server.mock("GET", "/messages/b").expect(0).create();

    let dir = TempDir::new().unwrap();
    let (output, stdout, _) = run(chatdesk(dir.path(), &server.url(), &["--session", "b", "sessions"])
        .env("CHATDESK_TOKEN", "jwt"));

    assert!(output.status.success());
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("Trip"));
    assert!(!lines[0].contains('*'));
    assert!(lines[1].contains("未命名对话"));
    assert!(lines[1].contains('*'));
    sessions.assert();
    messages.assert();
}

#[test]
fn test_send_prints_answer() {
    let mut server = mockito::Server::new();
    let chat = server
        .mock("POST", "/chat")
        .match_body(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("session_id".into(), "a".into()),
            mockito::Matcher::UrlEncoded("message".into(), "hi".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"answer":"hello"}"#)
        .create();

    let dir = TempDir::new().unwrap();
    let (output, stdout, _) = run(chatdesk(dir.path(), &server.url(), &["--session", "a", "send", "hi"])
        .env("CHATDESK_TOKEN", "jwt"));

    assert!(output.status.success());
    assert_eq!(stdout.trim(), "hello");
    chat.assert();
}

#[test]
fn test_bearer_without_token_never_sends() {
    let mut server = mockito::Server::new();
    let chat = server.mock("POST", "/chat").expect(0).create();

    let dir = TempDir::new().unwrap();
    let (output, _, stderr) = run(chatdesk(dir.path(), &server.url(), &["--session", "a", "send", "hi"])
        .env("CHATDESK__AUTH__STRATEGY", "bearer"));

    assert!(!output.status.success());
    assert!(stderr.contains("/account/login"));
    assert!(stderr.contains("chatdesk login"));
    chat.assert();
}

#[test]
fn test_login_writes_token_file_and_logout_removes_it() {
    let mut server = mockito::Server::new();
    let _login = server
        .mock("POST", "/account/token")
        .with_status(200)
        .with_header("set-cookie", "access_token=jwt-new; HttpOnly; Path=/")
        .with_body(r#"{"msg":"ok"}"#)
        .create();

    let dir = TempDir::new().unwrap();
    let (output, _, _) = run(&mut chatdesk(
        dir.path(),
        &server.url(),
        &["login", "--username", "alice", "--password", "pw"],
    ));
    assert!(output.status.success());
    let token = std::fs::read_to_string(dir.path().join("token")).unwrap();
    assert_eq!(token, "jwt-new");

    let (output, _, _) = run(&mut chatdesk(dir.path(), &server.url(), &["logout"]));
    assert!(output.status.success());
    assert!(!dir.path().join("token").exists());
}

#[test]
fn test_config_show_masks_token() {
    let dir = TempDir::new().unwrap();
    let (output, stdout, _) = run(chatdesk(dir.path(), "http://127.0.0.1:9", &["config", "show"])
        .env("CHATDESK_TOKEN", "secret-token"));

    assert!(output.status.success());
    assert!(stdout.contains("http://127.0.0.1:9"));
    assert!(stdout.contains("********"));
    assert!(!stdout.contains("secret-token"));
}

#[test]
fn test_render_writes_page() {
    let mut server = mockito::Server::new();
    let _sessions = server
        .mock("GET", "/sessions")
        .with_status(200)
        .with_body(r#"[{"id":"a","name":"<b>Trip</b>"}]"#)
        .create();
    let _messages = server
        .mock("GET", "/messages/a")
        .with_status(200)
        .with_body(r#"[{"role":"assistant","content":"<script>alert(1)</script>"}]"#)
        .create();

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("page.html");
    let (output, _, _) = run(chatdesk(
        dir.path(),
        &server.url(),
        &["--session", "a", "render", "--out", out.to_str().unwrap()],
    )
    .env("CHATDESK_TOKEN", "jwt"));

    assert!(output.status.success());
    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("chat-box"));
    assert!(html.contains("&lt;b&gt;Trip&lt;/b&gt;"));
    assert!(!html.contains("<script>"));
}
