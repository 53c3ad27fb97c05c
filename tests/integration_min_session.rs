// Minimal integration test that drives the compiled binary through a PTY.
// Covers the real event loop and crossterm input handling on top of the
// bundled question bank.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Unix-only and ignored by default.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn one_question_round_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("kwiz");
    let cmd = format!("{} -n 1 -s 30 --mute", bin.display());

    let mut p = spawn(cmd)?;

    // wait for the ready screen
    std::thread::sleep(Duration::from_millis(300));

    // start, answer, move on to the results screen
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("1")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("\x1b")?; // ESC

    p.expect(Eof)?;
    Ok(())
}
