
use std::fs;
use std::net::TcpListener;

use tempfile::tempdir;

use support_roles::{combined_output, exit_code, run_bootstrap};

const CONFIGURATION_EXIT: i32 = 2;
const SCRIPT_REJECTED_EXIT: i32 = 3;
const AUTOMATION_EXIT: i32 = 5;

fn expect_exit(code: i32, expected: i32, output: &str) -> Result<(), String> {
    if code != expected {
        return Err(format!(
            "Expected exit {}, got {}. Output:\n{}",
            expected, code, output
        ));
    }
    Ok(())
}

#[test]
fn missing_role_exits_with_configuration_error() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let output = run_bootstrap(dir.path(), &[], &[])?;
    let text = combined_output(&output);
    expect_exit(exit_code(&output)?, CONFIGURATION_EXIT, &text)?;
    if !text.contains("ROLE") {
        return Err(format!("Expected the missing key to be named:\n{}", text));
    }
    Ok(())
}

#[test]
fn unknown_role_exits_with_configuration_error() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let output = run_bootstrap(dir.path(), &[("ROLE", "observer")], &[])?;
    expect_exit(
        exit_code(&output)?,
        CONFIGURATION_EXIT,
        &combined_output(&output),
    )
}

#[test]
fn worker_without_master_host_spawns_nothing() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let output = run_bootstrap(
        dir.path(),
        &[
            ("ROLE", "slave"),
            ("TARGET_HOST", "http://api"),
            ("LOCUST_FILE", "load.py"),
        ],
        &[],
    )?;
    let text = combined_output(&output);
    expect_exit(exit_code(&output)?, CONFIGURATION_EXIT, &text)?;
    if !text.contains("MASTER_HOST") {
        return Err(format!("Expected MASTER_HOST to be named:\n{}", text));
    }
    Ok(())
}

#[test]
fn non_python_script_exits_with_script_rejection() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    fs::write(dir.path().join("load.txt"), "not python")
        .map_err(|err| format!("write failed: {}", err))?;
    let output = run_bootstrap(
        dir.path(),
        &[
            ("ROLE", "master"),
            ("TARGET_HOST", "http://api"),
            ("LOCUST_FILE", "load.txt"),
            ("LOCUST_BIN", "/nonexistent/locust"),
        ],
        &[],
    )?;
    let text = combined_output(&output);
    expect_exit(exit_code(&output)?, SCRIPT_REJECTED_EXIT, &text)?;
    if !text.contains("not a python file") {
        return Err(format!("Expected a format rejection message:\n{}", text));
    }
    Ok(())
}

#[test]
fn controller_without_automation_exits_cleanly() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let output = run_bootstrap(dir.path(), &[("ROLE", "controller")], &[])?;
    expect_exit(exit_code(&output)?, 0, &combined_output(&output))
}

#[test]
fn invalid_multiplier_starts_no_slaves() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    fs::write(dir.path().join("load.py"), "from locust import HttpUser\n")
        .map_err(|err| format!("write failed: {}", err))?;
    let output = run_bootstrap(
        dir.path(),
        &[
            ("ROLE", "slave"),
            ("TARGET_HOST", "http://api"),
            ("LOCUST_FILE", "load.py"),
            ("MASTER_HOST", "locust-master"),
            ("SLAVE_MUL", "lots"),
            ("LOCUST_BIN", "/nonexistent/locust"),
        ],
        &[],
    )?;
    let text = combined_output(&output);
    expect_exit(exit_code(&output)?, 0, &text)?;
    if !text.contains("Invalid SLAVE_MUL") {
        return Err(format!("Expected the multiplier error to be logged:\n{}", text));
    }
    Ok(())
}

#[test]
fn unreachable_master_fails_the_automated_run() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let port = {
        let listener =
            TcpListener::bind("127.0.0.1:0").map_err(|err| format!("bind failed: {}", err))?;
        listener
            .local_addr()
            .map_err(|err| format!("local addr failed: {}", err))?
            .port()
            .to_string()
    };
    let output = run_bootstrap(
        dir.path(),
        &[
            ("ROLE", "controller"),
            ("AUTOMATIC", "true"),
            ("MASTER_HOST", "127.0.0.1"),
            ("MASTER_PORT", port.as_str()),
            ("USERS", "10"),
            ("HATCH_RATE", "2"),
            ("DURATION", "1"),
            ("POLL_ATTEMPTS", "2"),
            ("POLL_INTERVAL", "10ms"),
            ("REQUEST_TIMEOUT", "1s"),
        ],
        &[],
    )?;
    let text = combined_output(&output);
    expect_exit(exit_code(&output)?, AUTOMATION_EXIT, &text)?;
    if dir.path().join("reports").exists() {
        return Err("No report directory may be created".to_owned());
    }
    Ok(())
}

#[test]
fn master_host_with_scheme_exits_before_polling() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let output = run_bootstrap(
        dir.path(),
        &[
            ("ROLE", "controller"),
            ("AUTOMATIC", "true"),
            ("MASTER_HOST", "http://locust-master"),
            ("USERS", "10"),
            ("HATCH_RATE", "2"),
            ("DURATION", "1"),
        ],
        &[],
    )?;
    let text = combined_output(&output);
    expect_exit(exit_code(&output)?, CONFIGURATION_EXIT, &text)?;
    if !text.contains("MASTER_HOST") {
        return Err(format!("Expected MASTER_HOST to be named:\n{}", text));
    }
    if text.contains("Attempt 1") {
        return Err(format!("The master must not be polled:\n{}", text));
    }
    Ok(())
}

#[test]
fn unsupported_config_file_exits_with_configuration_error() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    fs::write(dir.path().join("bootstrap.yaml"), "role: master\n")
        .map_err(|err| format!("write failed: {}", err))?;
    let output = run_bootstrap(dir.path(), &[], &["--config", "bootstrap.yaml"])?;
    expect_exit(
        exit_code(&output)?,
        CONFIGURATION_EXIT,
        &combined_output(&output),
    )
}
