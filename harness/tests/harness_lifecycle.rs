//! End-to-end scenarios for the in-process harness: decode, dispatch,
//! normalize and emit, with output captured in memory.

use anyhow::bail;
use harness::core::arguments::Arguments;
use harness::core::envelope::ResultEnvelope;
use harness::io::config::HarnessConfig;
use harness::io::output::parse_execution_output;
use harness::script::{FnScript, Module};
use harness::scripts;
use harness::test_support::{run_captured, run_captured_with};
use serde_json::{Value, json};

fn sample(name: &str) -> &'static dyn harness::script::Script {
    scripts::find(name).expect("bundled script")
}

#[test]
fn sum_scenario_emits_the_exact_line() {
    let (envelope, stdout) = run_captured(sample("sum"), Some(r#"{"a": 3, "b": 4}"#)).unwrap();
    assert_eq!(envelope.result, json!(r#"{"sum": 7}"#));
    assert_eq!(envelope.error, None);
    assert_eq!(
        stdout,
        concat!(
            r#"{"logs": ["received input: {\"a\": 3, \"b\": 4}", "sum script loaded", "computing 3 + 4"], "#,
            r#""result": "{\"sum\": 7}", "error": null}"#,
            "\n",
        )
    );
}

#[test]
fn scalar_results_pass_through_unchanged() {
    for (kind, expected) in [
        ("string", json!("a string")),
        ("number", json!(12345)),
        ("float", json!(1.5)),
        ("boolean", json!(true)),
        ("null", Value::Null),
    ] {
        let input = json!({ "type": kind }).to_string();
        let (envelope, _) = run_captured(sample("types"), Some(&input)).unwrap();
        assert_eq!(envelope.result, expected, "type {kind}");
        assert!(envelope.is_success());
    }
}

#[test]
fn composite_results_round_trip_through_text() {
    let (envelope, _) = run_captured(sample("types"), Some(r#"{"type": "dict"}"#)).unwrap();
    let text = envelope.result.as_str().expect("text result");
    let reparsed: Value = serde_json::from_str(text).unwrap();
    assert_eq!(reparsed["name"], json!("test user"));
    assert_eq!(reparsed["tags"], json!(["rust", "json"]));

    let (envelope, _) = run_captured(sample("types"), Some(r#"{"type": "list"}"#)).unwrap();
    assert_eq!(envelope.result, json!(r#"[1, 2, 3, "four", true]"#));
}

#[test]
fn params_mapping_is_kept_and_missing_params_mirror_the_input() {
    let (envelope, _) = run_captured(
        sample("params"),
        Some(r#"{"input": "top", "params": {"input": "nested"}}"#),
    )
    .unwrap();
    let report: Value = serde_json::from_str(envelope.result.as_str().unwrap()).unwrap();
    assert_eq!(report["direct_access"], json!("top"));
    assert_eq!(report["nested_access"], json!("nested"));

    let (envelope, _) = run_captured(sample("params"), Some(r#"{"input": "x"}"#)).unwrap();
    let report: Value = serde_json::from_str(envelope.result.as_str().unwrap()).unwrap();
    assert_eq!(report["nested_access"], json!("x"));
    assert_eq!(report["args_structure"]["params"], json!({"input": "x"}));
}

#[test]
fn captured_records_carry_severity_labels() {
    let (envelope, _) = run_captured(sample("log_levels"), Some(r#"{"x": 1}"#)).unwrap();
    assert_eq!(
        envelope.logs,
        vec![
            r#"received input: {"x": 1}"#,
            "[INFO] log_levels script loaded",
            "[INFO] received arguments keys=2",
            "[INFO] info record",
            "[WARNING] warn record",
            "[ERROR] error record",
        ]
    );
}

#[test]
fn lower_threshold_captures_debug_records() {
    let mut config = HarnessConfig::default();
    config.capture.threshold = "trace".to_string();
    let (envelope, _) =
        run_captured_with(sample("log_levels"), &config, Some(r#"{"x": 1}"#)).unwrap();
    assert!(envelope.logs.contains(&"[TRACE] trace record".to_string()));
    assert!(envelope.logs.contains(&"[DEBUG] debug record".to_string()));
}

#[test]
fn unary_handler_without_input_reports_arity_error() {
    let (envelope, _) = run_captured(sample("log_levels"), None).unwrap();
    assert_eq!(envelope.result, Value::Null);
    let error = envelope.error.expect("error");
    assert!(error.contains("requires an argument"), "error: {error}");
}

#[test]
fn error_keeps_logs_written_before_it() {
    let (envelope, _) = run_captured(sample("failing"), None).unwrap();
    assert_eq!(envelope.logs, vec!["about to fail"]);
    assert_eq!(envelope.result, Value::Null);
    assert!(envelope.error.unwrap().starts_with("bad\n"));
}

#[test]
fn blank_writes_are_not_recorded() {
    let script = FnScript::new("blank", "", |module: &mut Module| {
        module.print("   ");
        module.print("");
        module.print("  padded  ");
        module.main(|_args: &Arguments| Ok(0));
        Ok(())
    });
    let (envelope, _) = run_captured(&script, None).unwrap();
    assert_eq!(envelope.logs, vec!["padded"]);
}

#[test]
fn runs_are_independent() {
    let script = FnScript::new("counter", "", |module: &mut Module| {
        let out = module.console();
        module.main(move |args: &Arguments| {
            out.print("called");
            let n = args.get("n").and_then(Value::as_i64).unwrap_or(0);
            if n < 0 {
                bail!("negative");
            }
            Ok(n * 2)
        });
        Ok(())
    });

    let (first, _) = run_captured(&script, Some(r#"{"n": 2}"#)).unwrap();
    let (second, _) = run_captured(&script, Some(r#"{"n": 2}"#)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.result, json!(4));

    let (failed, _) = run_captured(&script, Some(r#"{"n": -1}"#)).unwrap();
    assert!(!failed.is_success());
    let (after, _) = run_captured(&script, Some(r#"{"n": 2}"#)).unwrap();
    assert_eq!(after, first);
}

#[test]
fn show_logs_echoes_text_and_still_emits_one_envelope() {
    let mut config = HarnessConfig::default();
    config.capture.show_logs = true;
    let (envelope, stdout) =
        run_captured_with(sample("sum"), &config, Some(r#"{"a": 1, "b": 1}"#)).unwrap();

    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines.contains(&"sum script loaded"));
    let envelope_lines = lines.iter().filter(|line| line.starts_with(r#"{"logs":"#)).count();
    assert_eq!(envelope_lines, 1);

    let parsed = parse_execution_output(stdout.as_bytes(), b"").unwrap();
    assert_eq!(parsed.logs, envelope.logs);
    assert_eq!(parsed.result, Some(envelope.result));
}

#[test]
fn pass_through_record_as_last_write_keeps_envelope_on_its_own_line() {
    let script = FnScript::new("mixed", "", |module: &mut Module| {
        module.print("loading");
        let out = module.console();
        module.main(move |_args: &Arguments| {
            out.print("step one");
            tracing::info!("step two");
            Ok(1)
        });
        Ok(())
    });
    let mut config = HarnessConfig::default();
    config.capture.show_logs = true;
    let (envelope, stdout) = run_captured_with(&script, &config, None).unwrap();

    assert_eq!(
        stdout,
        concat!(
            "loading\n",
            "step one\n",
            "[INFO] step two\n",
            r#"{"logs": ["loading", "step one", "[INFO] step two"], "result": 1, "error": null}"#,
            "\n",
        )
    );
    let parsed = parse_execution_output(stdout.as_bytes(), b"").unwrap();
    assert!(parsed.success);
    assert_eq!(parsed.result, Some(json!(1)));
    assert_eq!(parsed.logs, envelope.logs);
}

#[test]
fn emitted_line_decodes_to_the_returned_envelope() {
    let (envelope, stdout) = run_captured(sample("done"), None).unwrap();
    let decoded: ResultEnvelope = serde_json::from_str(stdout.trim_end()).unwrap();
    assert_eq!(decoded, envelope);
    assert_eq!(stdout, "{\"logs\": [], \"result\": \"done\", \"error\": null}\n");
}
