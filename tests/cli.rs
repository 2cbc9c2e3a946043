#![cfg(not(target_os = "wasi"))] // Not supported yet

use log::info;

struct Output {
    status: std::process::ExitStatus,
    stdout: String,
    stderr: String,
}

fn run_vellum(args: &[&str]) -> Result<Output, Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let binary_path = std::env!("CARGO_BIN_EXE_vellum");
    let mut command = std::process::Command::new(binary_path);
    command.args(args);
    info!("Running {command:?}");
    let start = std::time::Instant::now();
    let output = command.output()?;
    info!(
        "{}Exited after {:?} with {:#?}",
        if output.status.success() { "✔️" } else { "❌" },
        start.elapsed(),
        output
    );
    Ok(Output {
        status: output.status,
        stdout: String::from_utf8(output.stdout)?,
        stderr: String::from_utf8(output.stderr)?,
    })
}

#[test]
fn no_argument() -> Result<(), Box<dyn std::error::Error>> {
    // Can't test without a terminal
    let output = run_vellum(&[])?;
    assert!(!output.status.success());
    assert!(output.stderr.contains("fatal:"));
    Ok(())
}

#[test]
fn with_file_name() -> Result<(), Box<dyn std::error::Error>> {
    // Can't test without a terminal
    let output = run_vellum(&["test.txt"])?;
    assert!(!output.status.success());
    assert!(output.stderr.contains("fatal:"));
    Ok(())
}

#[test]
fn extra_arguments_are_ignored_rather_than_rejected() -> Result<(), Box<dyn std::error::Error>> {
    // Can't test without a terminal, but a second argument must not hit a different
    // (argument-parsing) error path than a single one does.
    let one_arg = run_vellum(&["test.txt"])?;
    let two_args = run_vellum(&["test.txt", "extra"])?;
    assert_eq!(one_arg.stderr, two_args.stderr);
    Ok(())
}
