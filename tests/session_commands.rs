use assert_cmd::Command;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

fn setup_test_env() -> (tempfile::TempDir, PathBuf) {
    let temp_dir = tempfile::Builder::new()
        .prefix("trtodo_client_test")
        .tempdir()
        .expect("Failed to create temporary directory");
    let config_path = temp_dir.path().join("config.json");
    (temp_dir, config_path)
}

fn client(config_path: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("trtodo-client").unwrap();
    cmd.env("TRTODO_CLIENT_CONFIG", config_path)
        .env_remove("TRTODO_LOG")
        .timeout(std::time::Duration::from_secs(10));
    cmd
}

/// Answers one HTTP request with a canned JSON body and hands back the raw request.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
            request.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut payload = vec![0u8; content_length];
        reader.read_exact(&mut payload).unwrap();
        request.push_str(&String::from_utf8_lossy(&payload));

        write!(
            stream,
            "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
        .unwrap();
        tx.send(request).unwrap();
    });
    (format!("http://{}", addr), rx)
}

fn login(config_path: &PathBuf) {
    client(config_path)
        .args(["login", "-u", "admin", "-p", "123"])
        .assert()
        .success();
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn test_login_rejects_wrong_credentials() {
    let (_temp_dir, config_path) = setup_test_env();
    let assert = client(&config_path)
        .args(["login", "--user", "admin", "--password", "nope"])
        .assert()
        .failure();
    assert!(stderr_of(assert.get_output()).contains("Incorrect username or password"));

    let assert = client(&config_path).arg("status").assert().success();
    assert!(stdout_of(assert.get_output()).contains("Not logged in."));
}

#[test]
fn test_login_status_logout_cycle() {
    let (temp_dir, config_path) = setup_test_env();

    client(&config_path)
        .args(["login", "-u", "admin", "-p", "123"])
        .assert()
        .success();
    let session = std::fs::read_to_string(temp_dir.path().join("session.json")).unwrap();
    assert!(session.contains("\"loggedIn\": \"true\""));

    let assert = client(&config_path).arg("status").assert().success();
    assert!(stdout_of(assert.get_output()).contains("Logged in."));

    let assert = client(&config_path).arg("logout").assert().success();
    assert!(stdout_of(assert.get_output()).contains("Logged out."));

    let assert = client(&config_path).arg("status").assert().success();
    assert!(stdout_of(assert.get_output()).contains("Not logged in."));
}

#[test]
fn test_fetch_requires_login() {
    let (_temp_dir, config_path) = setup_test_env();
    let assert = client(&config_path).arg("fetch").assert().failure();
    assert!(stderr_of(assert.get_output()).contains("Not logged in"));
}

#[test]
fn test_shell_requires_login() {
    let (_temp_dir, config_path) = setup_test_env();
    let assert = client(&config_path)
        .arg("shell")
        .write_stdin("load\n")
        .assert()
        .failure();
    assert!(stderr_of(assert.get_output()).contains("Not logged in"));
}

#[test]
fn test_fetch_reports_unreachable_store() {
    let (_temp_dir, config_path) = setup_test_env();
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    client(&config_path)
        .args(["config", "set", "api.base-url", format!("http://127.0.0.1:{}", port).as_str()])
        .assert()
        .success();
    client(&config_path)
        .args(["login", "-u", "admin", "-p", "123"])
        .assert()
        .success();

    let assert = client(&config_path).arg("fetch").assert().failure();
    assert!(stderr_of(assert.get_output()).contains("Failed to load tasks"));
}

#[test]
fn test_shell_local_session() {
    let (_temp_dir, config_path) = setup_test_env();
    client(&config_path)
        .args(["login", "-u", "admin", "-p", "123"])
        .assert()
        .success();

    let assert = client(&config_path)
        .arg("shell")
        .write_stdin("list\nsearch milk\nhelp\nquit\n")
        .assert()
        .success();
    let output = stdout_of(assert.get_output());
    assert!(output.contains("No tasks loaded."));
    assert!(output.contains("Commands:"));
}

#[test]
fn test_config_commands() {
    let (_temp_dir, config_path) = setup_test_env();

    client(&config_path)
        .args(["config", "set", "default-category", "API"])
        .assert()
        .success();
    let assert = client(&config_path)
        .args(["config", "get", "default-category"])
        .assert()
        .success();
    assert!(stdout_of(assert.get_output()).contains("API"));

    let assert = client(&config_path).args(["config", "list"]).assert().success();
    let output = stdout_of(assert.get_output());
    assert!(output.contains("default-category = API"));
    assert!(output.contains("fetch-limit = 20 (default)"));

    let assert = client(&config_path)
        .args(["config", "set", "fetch-limit", "zero"])
        .assert()
        .failure();
    assert!(stderr_of(assert.get_output()).contains("fetch-limit must be a positive integer"));
}

#[test]
fn test_fetch_and_add_against_local_store() {
    let (_temp_dir, config_path) = setup_test_env();
    login(&config_path);
    client(&config_path)
        .args(["config", "set", "fetch-limit", "2"])
        .assert()
        .success();
    client(&config_path)
        .args(["config", "set", "default-category", "API"])
        .assert()
        .success();

    let (base, requests) = serve_once(
        "HTTP/1.1 200 OK",
        r#"[{"id":1,"title":"Buy milk","completed":false},{"id":2,"title":"Call mom","completed":true,"category":"Family"}]"#,
    );
    client(&config_path)
        .args(["config", "set", "api.base-url", base.as_str()])
        .assert()
        .success();

    let assert = client(&config_path)
        .args(["fetch", "--search", "MILK"])
        .assert()
        .success();
    let output = stdout_of(assert.get_output());
    assert!(output.contains("Filter \"MILK\": 1 of 2 tasks"));
    assert!(output.contains("Buy milk (API)"));
    assert!(!output.contains("Call mom"));
    let request = requests.recv().unwrap();
    assert!(request.starts_with("GET /todos?_limit=2 "));

    let (base, requests) = serve_once(
        "HTTP/1.1 201 Created",
        r#"{"title":"Wash car","completed":false,"category":"Home","id":201}"#,
    );
    client(&config_path)
        .args(["config", "set", "api.base-url", base.as_str()])
        .assert()
        .success();

    let assert = client(&config_path)
        .args(["add", "Wash car", "-c", "Home"])
        .assert()
        .success();
    assert!(stdout_of(assert.get_output()).contains("Added task 201."));
    let request = requests.recv().unwrap();
    assert!(request.starts_with("POST /todos "));
    assert!(request.contains(r#""title":"Wash car""#));
    assert!(request.contains(r#""category":"Home""#));
    assert!(request.contains(r#""completed":false"#));
}

#[test]
fn test_corrupt_session_file_reads_as_logged_out() {
    let (temp_dir, config_path) = setup_test_env();
    std::fs::write(temp_dir.path().join("session.json"), "{not json").unwrap();

    let assert = client(&config_path).arg("status").assert().success();
    assert!(stdout_of(assert.get_output()).contains("Not logged in."));

    let assert = client(&config_path).arg("fetch").assert().failure();
    assert!(stderr_of(assert.get_output()).contains("Not logged in"));

    client(&config_path).arg("logout").assert().success();
    login(&config_path);
    let assert = client(&config_path).arg("status").assert().success();
    assert!(stdout_of(assert.get_output()).contains("Logged in."));
}

#[test]
fn test_shell_guard_runs_before_remote_setup() {
    let (_temp_dir, config_path) = setup_test_env();
    client(&config_path)
        .args(["config", "set", "api.base-url", "http://127.0.0.1:9"])
        .assert()
        .success();

    let assert = client(&config_path)
        .arg("shell")
        .write_stdin("load\n")
        .assert()
        .failure();
    let stderr = stderr_of(assert.get_output());
    assert!(stderr.contains("Not logged in"));
    assert!(!stderr.contains("Failed to load tasks"));
}
