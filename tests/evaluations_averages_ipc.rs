use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar(data_dir: &std::path::Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_notasd");
    let mut child = Command::new(exe)
        .env("NOTASD_DATA_DIR", data_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn notasd");
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
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn escolar_level_blocks_weighted_evaluations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(dir.path());

    let res = request_ok(&mut stdin, &mut reader, "1", "profile.get", json!({}));
    assert_eq!(res["level"], json!("Escolar"));
    assert_eq!(res["weightingEnabled"], json!(false));

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "evaluations.add",
        json!({ "score": 6.0, "weight": 50.0 }),
    );
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("weighting_disabled"));

    // The rejection must not have stored anything.
    let res = request_ok(&mut stdin, &mut reader, "3", "evaluations.list", json!({}));
    assert_eq!(res["evaluations"].as_array().expect("array").len(), 0);

    let _ = child.kill();
}

#[test]
fn set_level_ignores_unknown_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(dir.path());

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "profile.setLevel",
        json!({ "level": "Doctorado" }),
    );
    assert_eq!(res["level"], json!("Escolar"));

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "profile.setLevel",
        json!({ "level": "Universidad" }),
    );
    assert_eq!(res["level"], json!("Universidad"));
    assert_eq!(res["weightingEnabled"], json!(true));

    let _ = child.kill();
}

#[test]
fn weighted_average_and_status_transitions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(dir.path());

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "profile.setLevel",
        json!({ "level": "Universidad" }),
    );

    let res = request_ok(&mut stdin, &mut reader, "2", "averages.subject", json!({}));
    assert_eq!(res["status"], json!("no_data"));
    assert_eq!(res["value"], json!(null));

    for (i, (score, weight)) in [(6.0, 50.0), (4.0, 25.0)].iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("add-{i}"),
            "evaluations.add",
            json!({ "score": score, "weight": weight }),
        );
    }

    // 50 + 25 = 75: outside the +/-0.5 tolerance around 100.
    let res = request_ok(&mut stdin, &mut reader, "3", "averages.subject", json!({}));
    assert_eq!(res["status"], json!("invalid_weights"));
    assert_eq!(res["value"], json!(null));

    request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "evaluations.add",
        json!({ "score": 5.0, "weight": 25.0 }),
    );
    let res = request_ok(&mut stdin, &mut reader, "5", "averages.subject", json!({}));
    assert_eq!(res["status"], json!("ok"));
    let value = res["value"].as_f64().expect("value");
    assert!((value - 5.25).abs() < 1e-9, "got {value}");

    // One unweighted entry makes the list mixed, which is refused.
    request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "evaluations.add",
        json!({ "score": 7.0 }),
    );
    let res = request_ok(&mut stdin, &mut reader, "7", "averages.subject", json!({}));
    assert_eq!(res["status"], json!("incomplete"));
    assert_eq!(res["value"], json!(null));

    let _ = child.kill();
}

#[test]
fn global_average_excludes_subjects_without_ok_status() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(dir.path());

    for (i, score) in [5.0, 5.0].iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("add-{i}"),
            "evaluations.add",
            json!({ "score": score, "subject": "Historia" }),
        );
    }

    // Every other seed subject is empty; only Historia counts.
    let res = request_ok(&mut stdin, &mut reader, "g", "averages.global", json!({}));
    assert_eq!(res["status"], json!("ok"));
    let value = res["value"].as_f64().expect("value");
    assert!((value - 5.0).abs() < 1e-9, "got {value}");

    let _ = child.kill();
}

#[test]
fn delete_and_clear_evaluations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(dir.path());

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "evaluations.delete",
        json!({ "index": 0 }),
    );
    assert_eq!(resp["error"]["code"], json!("no_evaluations"));

    for (i, score) in [4.0, 5.0, 6.0].iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("add-{i}"),
            "evaluations.add",
            json!({ "score": score }),
        );
    }

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "evaluations.delete",
        json!({ "index": 5 }),
    );
    assert_eq!(resp["error"]["code"], json!("index_out_of_range"));

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "evaluations.delete",
        json!({ "index": 1 }),
    );
    assert_eq!(res["count"], json!(2));

    let res = request_ok(&mut stdin, &mut reader, "4", "evaluations.list", json!({}));
    let scores: Vec<f64> = res["evaluations"]
        .as_array()
        .expect("array")
        .iter()
        .map(|e| e["score"].as_f64().expect("score"))
        .collect();
    assert_eq!(scores, vec![4.0, 6.0]);

    let res = request_ok(&mut stdin, &mut reader, "5", "evaluations.clear", json!({}));
    assert_eq!(res["count"], json!(0));
    let res = request_ok(&mut stdin, &mut reader, "6", "evaluations.list", json!({}));
    assert_eq!(res["evaluations"].as_array().expect("array").len(), 0);

    let _ = child.kill();
}

#[test]
fn parse_helpers_mirror_the_validation_rules() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(dir.path());

    let cases = [
        ("input.parseScore", "5,5", json!(5.5)),
        ("input.parseScore", " 7.0 ", json!(7.0)),
        ("input.parseScore", "7.1", json!(null)),
        ("input.parseScore", "abc", json!(null)),
        ("input.parseWeight", "50", json!(50.0)),
        ("input.parseWeight", "50,5", json!(50.5)),
        ("input.parseWeight", "0", json!(null)),
        ("input.parseWeight", "150", json!(null)),
        ("input.parseWeight", "-5", json!(null)),
    ];
    for (i, (method, text, expected)) in cases.iter().enumerate() {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            &format!("p-{i}"),
            method,
            json!({ "text": text }),
        );
        assert_eq!(&res["value"], expected, "{method}({text:?})");
    }

    let _ = child.kill();
}
