use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_marksheetd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn marksheetd");
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

#[test]
fn semester_marksheet_extracts_metadata_and_records() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let path = fixture_path("semester_marksheet.csv");

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "analyze.semester",
        json!({ "path": path.to_str().unwrap() }),
    );
    assert_eq!(resp["ok"], true, "response: {}", resp);
    let result = &resp["result"];

    let metadata = &result["metadata"];
    assert_eq!(metadata["course"], "BSc Applied Accounting - 19B");
    assert_eq!(metadata["exam"], "Semester II Examination");
    assert_eq!(metadata["subject"], "BSAA 32034 Package Based Data Analysis");

    // The fixture exercises every row policy in one pass: row 14 has a
    // non-numeric student number (skipped), row 18 has no grade (sentinel),
    // row 20 has no registration (end of table), and the populated row 22
    // after the terminator must never be read.
    let records = result["records"].as_array().expect("records array");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["studentLabel"], "1");
    assert_eq!(records[0]["registrationId"], "SAB/2023-19B/001");
    assert_eq!(records[0]["grade"], "A+");
    assert_eq!(records[0]["gradePoint"], 4.0);
    assert_eq!(records[1]["studentLabel"], "3");
    assert_eq!(records[1]["grade"], "A-");
    assert_eq!(records[2]["studentLabel"], "4");
    assert_eq!(records[2]["grade"], "N/A");
    assert_eq!(records[2]["gradePoint"], 0.0);
    assert!(records
        .iter()
        .all(|r| r["registrationId"] != "SAB/2023-19B/006"));

    // Semester aggregation uses the Table B ordering: "AB" leads even at
    // zero count, and the off-table "N/A" grade lands between the canonical
    // run and the totals row.
    assert_eq!(result["policy"], "tableB");
    let dist = result["distribution"].as_array().expect("distribution");
    assert_eq!(dist.len(), 15);
    assert_eq!(dist[0]["grade"], "AB");
    assert_eq!(dist[0]["count"], 0);
    assert_eq!(dist[0]["percentage"], 0.0);
    assert_eq!(dist[10]["grade"], "A-");
    assert_eq!(dist[10]["count"], 1);
    assert_eq!(dist[10]["percentage"], 33.3);
    assert_eq!(dist[12]["grade"], "A+");
    assert_eq!(dist[12]["count"], 1);
    assert_eq!(dist[13]["grade"], "N/A");
    assert_eq!(dist[13]["count"], 1);
    assert_eq!(dist[14]["grade"], "Total");
    assert_eq!(dist[14]["count"], 3);
    assert_eq!(dist[14]["percentage"], 100.0);

    let stats = &result["stats"];
    assert_eq!(stats["totalStudents"], 3);
    assert_eq!(stats["passCount"], 2);
    assert_eq!(stats["passRate"], 66.7);
    assert_eq!(stats["averageGradePoints"], 2.57);
    // No numeric marks anywhere in this layout.
    assert!(stats.get("averageMark").is_none());
    assert!(stats.get("highestMark").is_none());

    assert_eq!(result["mismatches"].as_array().map(|a| a.len()), Some(0));

    // health reflects the stored analysis.
    let health = request(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["result"]["hasAnalysis"], true);

    drop(stdin);
    child.wait().expect("child exits");
}

#[test]
fn empty_marksheet_reports_no_valid_records() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let empty = std::env::temp_dir().join("marksheetd_empty_marksheet.csv");
    std::fs::write(&empty, ",,,,,,,,,,,,,\n".repeat(20)).expect("write fixture");

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "analyze.semester",
        json!({ "path": empty.to_str().unwrap() }),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "no_valid_records");

    // The failed run must not leave a stale model behind.
    let resp = request(&mut stdin, &mut reader, "2", "report.model", json!({}));
    assert_eq!(resp["error"]["code"], "no_analysis");

    std::fs::remove_file(&empty).ok();
    drop(stdin);
    child.wait().expect("child exits");
}
