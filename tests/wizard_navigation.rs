use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schooldeskd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schooldeskd");
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
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
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

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

const ALL_WIZARDS: [&str; 5] = [
    "onboarding",
    "compulsorySetup",
    "settings",
    "studentProfile",
    "staffProfile",
];

#[test]
fn goto_every_valid_index_updates_state() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    for wizard in ALL_WIZARDS {
        let started = request_ok(
            &mut stdin,
            &mut reader,
            &format!("start-{}", wizard),
            "wizard.start",
            json!({ "wizard": wizard }),
        );
        let steps = started["steps"].as_array().expect("steps array").clone();
        assert!(steps.len() >= 2);
        assert_eq!(started["activeIndex"], json!(0));
        assert_eq!(started["wizard"], json!(wizard));

        for (i, step) in steps.iter().enumerate() {
            let state = request_ok(
                &mut stdin,
                &mut reader,
                &format!("goto-{}-{}", wizard, i),
                "wizard.goto",
                json!({ "wizard": wizard, "index": i }),
            );
            assert_eq!(state["activeIndex"], json!(i));
            assert_eq!(state["current"], step["name"]);
            assert_eq!(state["terminal"], json!(i == steps.len() - 1));
        }
    }
}

#[test]
fn goto_out_of_range_is_rejected_without_movement() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "wizard.start",
        json!({ "wizard": "onboarding" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "wizard.goto",
        json!({ "wizard": "onboarding", "index": 1 }),
    );

    let exact = request(
        &mut stdin,
        &mut reader,
        "3",
        "wizard.goto",
        json!({ "wizard": "onboarding", "index": 3 }),
    );
    assert_eq!(error_code(&exact), "bad_params");

    let far = request(
        &mut stdin,
        &mut reader,
        "4",
        "wizard.goto",
        json!({ "wizard": "onboarding", "index": 99 }),
    );
    assert_eq!(error_code(&far), "bad_params");
    assert_eq!(far["error"]["details"]["stepCount"], json!(3));

    let state = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "wizard.state",
        json!({ "wizard": "onboarding" }),
    );
    assert_eq!(state["activeIndex"], json!(1));
    assert_eq!(state["current"], json!("ownerInformation"));
}

#[test]
fn next_reaches_terminal_and_stays() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let started = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "wizard.start",
        json!({ "wizard": "onboarding" }),
    );
    assert_eq!(started["steps"].as_array().map(|a| a.len()), Some(3));

    let one = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "wizard.next",
        json!({ "wizard": "onboarding" }),
    );
    assert_eq!(one["activeIndex"], json!(1));

    let two = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "wizard.next",
        json!({ "wizard": "onboarding" }),
    );
    assert_eq!(two["activeIndex"], json!(2));
    assert_eq!(two["terminal"], json!(true));

    // Advancing on the terminal step changes nothing.
    let still = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "wizard.next",
        json!({ "wizard": "onboarding" }),
    );
    assert_eq!(still["activeIndex"], json!(2));
    assert_eq!(still["current"], json!("reviewSubmit"));
}

#[test]
fn back_is_a_no_op_on_the_first_step() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "wizard.start",
        json!({ "wizard": "settings" }),
    );
    let held = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "wizard.back",
        json!({ "wizard": "settings" }),
    );
    assert_eq!(held["activeIndex"], json!(0));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "wizard.next",
        json!({ "wizard": "settings" }),
    );
    let back = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "wizard.back",
        json!({ "wizard": "settings" }),
    );
    assert_eq!(back["activeIndex"], json!(0));
    assert_eq!(back["current"], json!("schoolProfile"));
}

#[test]
fn goto_accepts_step_names() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "wizard.start",
        json!({ "wizard": "staffProfile" }),
    );
    let state = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "wizard.goto",
        json!({ "wizard": "staffProfile", "step": "payroll" }),
    );
    assert_eq!(state["activeIndex"], json!(2));
    assert_eq!(state["current"], json!("payroll"));

    let unknown = request(
        &mut stdin,
        &mut reader,
        "3",
        "wizard.goto",
        json!({ "wizard": "staffProfile", "step": "detention" }),
    );
    assert_eq!(error_code(&unknown), "bad_params");

    let state = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "wizard.state",
        json!({ "wizard": "staffProfile" }),
    );
    assert_eq!(state["activeIndex"], json!(2));
}

#[test]
fn ops_require_a_started_wizard() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let missing = request(
        &mut stdin,
        &mut reader,
        "1",
        "wizard.state",
        json!({ "wizard": "compulsorySetup" }),
    );
    assert_eq!(error_code(&missing), "wizard_not_started");

    let unknown = request(
        &mut stdin,
        &mut reader,
        "2",
        "wizard.start",
        json!({ "wizard": "detentionWizard" }),
    );
    assert_eq!(error_code(&unknown), "bad_params");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "wizard.start",
        json!({ "wizard": "compulsorySetup" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "wizard.discard",
        json!({ "wizard": "compulsorySetup" }),
    );
    let gone = request(
        &mut stdin,
        &mut reader,
        "5",
        "wizard.state",
        json!({ "wizard": "compulsorySetup" }),
    );
    assert_eq!(error_code(&gone), "wizard_not_started");
}

#[test]
fn restarting_resets_and_reissues_the_instance() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "wizard.start",
        json!({ "wizard": "studentProfile" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "wizard.next",
        json!({ "wizard": "studentProfile" }),
    );
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "wizard.start",
        json!({ "wizard": "studentProfile" }),
    );
    assert_eq!(second["activeIndex"], json!(0));
    assert_ne!(second["instanceId"], first["instanceId"]);
}

#[test]
fn opening_a_session_discards_live_wizards() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "wizard.start",
        json!({ "wizard": "onboarding" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "wizard.next",
        json!({ "wizard": "onboarding" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.open",
        json!({ "role": "admin" }),
    );
    let gone = request(
        &mut stdin,
        &mut reader,
        "4",
        "wizard.state",
        json!({ "wizard": "onboarding" }),
    );
    assert_eq!(error_code(&gone), "wizard_not_started");
}
