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

fn request_ok(
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
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().expect("result")
}

#[test]
fn class_report_marks_unmeasured_students_pending_and_exports_csv() {
    let workspace = temp_dir("fitnessd-class-report");
    let export_dir = workspace.join("exports");
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Two students in the seeded "Grade 1/1" class, only one measured.
    let measured = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "studentId": "40001",
            "name": "Measured Student",
            "gender": "MALE",
            "classId": "c1"
        }),
    );
    let measured_id = measured
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("studentId")
        .to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({
            "studentId": "40002",
            "name": "Pending Student",
            "gender": "FEMALE",
            "classId": "c1",
            "weight": 38.0,
            "height": 140.0
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "records.saveBatch",
        json!({
            "entries": [{
                "studentId": measured_id,
                "weight": 50.0,
                "height": 150.0,
                "results": [{ "testItemId": "sit_up", "score": 28.0, "level": "GOOD" }]
            }]
        }),
    );

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "reports.class",
        json!({ "classId": "c1" }),
    );
    assert_eq!(
        result.get("className").and_then(|v| v.as_str()),
        Some("Grade 1/1")
    );
    let rows = result
        .get("summary")
        .and_then(|v| v.get("rows"))
        .and_then(|v| v.as_array())
        .expect("rows");
    assert_eq!(rows.len(), 2);
    let row_of = |no: &str| {
        rows.iter()
            .find(|r| r.get("studentNo").and_then(|v| v.as_str()) == Some(no))
            .expect("row")
    };
    assert_eq!(
        row_of("40001").get("status").and_then(|v| v.as_str()),
        Some("DONE")
    );
    assert_eq!(
        row_of("40001").get("bmi").and_then(|v| v.as_f64()),
        Some(22.22)
    );
    let pending = row_of("40002");
    assert_eq!(pending.get("status").and_then(|v| v.as_str()), Some("PENDING"));
    assert!(pending.get("bmi").is_none());
    // Baseline measurements still show for unmeasured students.
    assert_eq!(pending.get("weight").and_then(|v| v.as_f64()), Some(38.0));

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "reports.exportClassCsv",
        json!({ "classId": "c1", "outDir": export_dir.to_string_lossy() }),
    );
    assert_eq!(exported.get("rows").and_then(|v| v.as_u64()), Some(2));
    let path = PathBuf::from(
        exported
            .get("path")
            .and_then(|v| v.as_str())
            .expect("path"),
    );
    let file_name = path.file_name().and_then(|n| n.to_str()).expect("file name");
    // The "/" in the class name must not become a path separator.
    assert!(
        file_name.starts_with("class_fitness_report_Grade 1-1_"),
        "unexpected export name: {}",
        file_name
    );
    assert!(file_name.ends_with(".csv"));

    let content = std::fs::read_to_string(&path).expect("read export");
    assert!(content.starts_with('\u{feff}'));
    let body = content.trim_start_matches('\u{feff}');
    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some("Student ID,Full name,Weight (kg),Height (cm),BMI,Status")
    );
    assert!(body.contains("\"Evaluated\""));
    assert!(body.contains("\"Pending\""));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn individual_export_refuses_students_without_records() {
    let workspace = temp_dir("fitnessd-individual-export");
    let export_dir = workspace.join("exports");
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "studentId": "50001",
            "name": "Unmeasured Student",
            "gender": "MALE",
            "classId": "c2"
        }),
    );
    let student_id = created
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("studentId")
        .to_string();

    let payload = json!({
        "id": "3",
        "method": "reports.exportIndividualCsv",
        "params": { "studentId": student_id, "outDir": export_dir.to_string_lossy() }
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let resp: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_found")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
