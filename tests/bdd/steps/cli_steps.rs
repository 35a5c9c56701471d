use cucumber::{then, when};

use crate::QuillWorld;

/// Run `quill` with the given space-separated args against the world's
/// database. Stores stdout, stderr, and exit code on the world.
fn run_quill(world: &mut QuillWorld, args: &[&str]) {
    let db_path = world
        .db_path
        .as_ref()
        .expect("db_path not set — did you forget 'Given a quill database is initialized'?");

    let output = assert_cmd::Command::cargo_bin("quill")
        .expect("quill binary not found")
        .env("QUILL_DB", db_path)
        .args(args)
        .output()
        .expect("failed to run quill");

    world.last_stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    world.last_stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    world.last_exit_code = output.status.code().unwrap_or(-1);
}

#[when(expr = "I run quill {string}")]
async fn i_run_quill(world: &mut QuillWorld, args: String) {
    let args: Vec<&str> = args.split_whitespace().collect();
    run_quill(world, &args);
}

#[then("the command succeeds")]
async fn the_command_succeeds(world: &mut QuillWorld) {
    assert_eq!(
        world.last_exit_code, 0,
        "quill exited with {}: {}",
        world.last_exit_code, world.last_stderr
    );
}

#[then("the command fails")]
async fn the_command_fails(world: &mut QuillWorld) {
    assert_ne!(world.last_exit_code, 0, "expected failure but quill succeeded");
}

#[then(expr = "the output contains {string}")]
async fn the_output_contains(world: &mut QuillWorld, needle: String) {
    assert!(
        world.last_stdout.contains(&needle),
        "stdout does not contain {needle:?}:\n{}",
        world.last_stdout
    );
}

#[then(expr = "the error output contains {string}")]
async fn the_error_output_contains(world: &mut QuillWorld, needle: String) {
    assert!(
        world.last_stderr.contains(&needle),
        "stderr does not contain {needle:?}:\n{}",
        world.last_stderr
    );
}
