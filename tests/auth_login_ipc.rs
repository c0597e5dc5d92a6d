use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_daemon() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_fitnessd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn fitnessd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn error_code(resp: &serde_json::Value) -> Option<&str> {
    resp.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn seeded_admin_can_log_in_and_bad_passwords_cannot() {
    let workspace = temp_dir("fitnessd-auth");
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "admin", "password": "0000" }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(true));
    let user = resp
        .get("result")
        .and_then(|v| v.get("user"))
        .expect("user");
    assert_eq!(user.get("role").and_then(|v| v.as_str()), Some("ADMIN"));
    assert_eq!(
        user.get("name").and_then(|v| v.as_str()),
        Some("System Administrator")
    );
    // The password never crosses the wire back, and the login is stamped.
    assert!(user.get("password").is_none());
    assert!(user.get("lastLogin").and_then(|v| v.as_str()).is_some());

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "username": "admin", "password": "wrong" }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&resp), Some("invalid_credentials"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn student_login_resolves_by_school_number_without_a_password() {
    let workspace = temp_dir("fitnessd-student-login");
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "studentId": "30001",
            "name": "Login Student",
            "gender": "FEMALE",
            "classId": "c2"
        }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(true));

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.studentLogin",
        json!({ "studentId": "30001" }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(true));
    let user = resp
        .get("result")
        .and_then(|v| v.get("user"))
        .expect("user");
    assert_eq!(user.get("role").and_then(|v| v.as_str()), Some("STUDENT"));
    assert_eq!(
        user.get("studentId").and_then(|v| v.as_str()),
        Some("30001")
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "4",
        "auth.studentLogin",
        json!({ "studentId": "99999" }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&resp), Some("not_found"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn every_store_method_requires_a_workspace() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "admin", "password": "0000" }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&resp), Some("no_workspace"));

    let resp = request(&mut stdin, &mut reader, "2", "reports.school", json!({}));
    assert_eq!(error_code(&resp), Some("no_workspace"));

    drop(stdin);
    let _ = child.wait();
}
