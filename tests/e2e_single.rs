
use std::fs;
use std::net::TcpListener;
use std::process::Output;

use tempfile::tempdir;

use support_single::{run_pacer, spawn_http_server};

fn describe(output: &Output) -> String {
    format!(
        "status: {}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn closed_port_url() -> Result<String, String> {
    let listener =
        TcpListener::bind("127.0.0.1:0").map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}

#[test]
fn e2e_single_cli_basic() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;

    let args = vec![
        "-u".to_owned(),
        url,
        "-q".to_owned(),
        "20".to_owned(),
        "-t".to_owned(),
        "1".to_owned(),
        "-c".to_owned(),
        "10".to_owned(),
        "--no-progress".to_owned(),
    ];

    let output = run_pacer(args)?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Outcome: completed") || !stdout.contains("Success: 20 ") {
        return Err(format!("Unexpected summary\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_single_json_summary() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;

    let args = vec![
        "--url".to_owned(),
        url,
        "--rate".to_owned(),
        "10".to_owned(),
        "--duration".to_owned(),
        "1".to_owned(),
        "--warmup-requests".to_owned(),
        "0".to_owned(),
        "--output-format".to_owned(),
        "json".to_owned(),
        "--no-progress".to_owned(),
    ];

    let output = run_pacer(args)?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|err| format!("summary is not JSON ({})\n{}", err, describe(&output)))?;
    if summary["final_state"] != "completed" {
        return Err(format!("Unexpected final state: {}", summary["final_state"]));
    }
    if summary["planned_requests"] != 10 || summary["statistics"]["total_completed"] != 10 {
        return Err(format!("Unexpected counts: {}", summary));
    }
    if summary["statistics"]["counts"]["success"] != 10 {
        return Err(format!("Unexpected categories: {}", summary["statistics"]["counts"]));
    }
    Ok(())
}

#[test]
fn e2e_single_config_toml() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;

    let config_path = dir.path().join("pacer.toml");
    let config = format!(
        r#"url = "{url}"
rate = 4
duration = 1
concurrency = 2
timeout = "2s"
warmup_requests = 0
output_format = "json"
no_progress = true
"#,
        url = url
    );
    fs::write(&config_path, config).map_err(|err| format!("write config failed: {}", err))?;

    let args = vec![
        "--config".to_owned(),
        config_path.to_string_lossy().into_owned(),
    ];

    let output = run_pacer(args)?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|err| format!("summary is not JSON ({})\n{}", err, describe(&output)))?;
    if summary["statistics"]["total_dispatched"] != 4 {
        return Err(format!("Config rate/duration ignored: {}", summary));
    }
    Ok(())
}

#[test]
fn e2e_single_unreachable_target_still_completes() -> Result<(), String> {
    let url = closed_port_url()?;

    let args = vec![
        "-u".to_owned(),
        url,
        "-q".to_owned(),
        "5".to_owned(),
        "-t".to_owned(),
        "1".to_owned(),
        "-c".to_owned(),
        "5".to_owned(),
        "--no-progress".to_owned(),
    ];

    let output = run_pacer(args)?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Success: 0 ") || !stdout.contains("Requests: 5 planned") {
        return Err(format!("Unexpected summary\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_single_deadline_abort_prints_summary_and_fails() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;

    let args = vec![
        "-u".to_owned(),
        url,
        "-q".to_owned(),
        "10".to_owned(),
        "-t".to_owned(),
        "5".to_owned(),
        "--deadline".to_owned(),
        "700ms".to_owned(),
        "--grace-period".to_owned(),
        "1s".to_owned(),
        "--no-progress".to_owned(),
    ];

    let output = run_pacer(args)?;
    if output.status.success() {
        return Err(format!("Aborted run exited zero\n{}", describe(&output)));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Outcome: aborted") || !stdout.contains("Requests: 50 planned") {
        return Err(format!("Summary missing after abort\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_single_rejects_invalid_rate() -> Result<(), String> {
    let output = run_pacer(["-u", "http://127.0.0.1:9/", "-q", "0", "-t", "1"])?;
    if output.status.success() {
        return Err(format!("Expected failure\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_single_rejects_unsupported_scheme() -> Result<(), String> {
    let output = run_pacer(["-u", "ftp://127.0.0.1/file", "-q", "1", "-t", "1"])?;
    if output.status.success() {
        return Err(format!("Expected failure\n{}", describe(&output)));
    }
    Ok(())
}
