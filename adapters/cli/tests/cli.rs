use std::process::Command;

fn pacing_director() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pacing-director"))
}

#[test]
fn short_encounter_prints_summary() {
    let output = pacing_director()
        .args(["--duration", "60", "--seed", "7"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch pacing-director binary");

    assert!(output.status.success(), "pacing-director should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("encounter finished after 60.0s"));
    assert!(stdout.contains("attack orders:"));
    assert!(stdout.contains("final rate:"));
}

#[test]
fn sample_settings_file_runs() {
    let output = pacing_director()
        .arg("--config")
        .arg(concat!(env!("CARGO_MANIFEST_DIR"), "/encounter.toml"))
        .args(["--duration", "30"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch pacing-director binary");

    assert!(output.status.success(), "sample settings should load");
    assert!(String::from_utf8_lossy(&output.stdout).contains("after 30.0s"));
}

#[test]
fn unreadable_settings_fail_with_context() {
    let output = pacing_director()
        .args(["--config", "does-not-exist.toml"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch pacing-director binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read encounter settings"));
}

#[test]
fn invalid_overrides_are_rejected() {
    let output = pacing_director()
        .args(["--duration", "10", "--dt", "0"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch pacing-director binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("scenario.dt"));
}
