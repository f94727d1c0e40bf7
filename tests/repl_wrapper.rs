// tests/repl_wrapper.rs
//
// Drives `ReplWrapper` against the `/bin/sh` mock REPL.

mod common;
use crate::common::{drain, init_tracing, mock_disco_config, script_config, with_timeout};

use std::error::Error;

use tokio::sync::mpsc;

use disco_kernel::repl::{ReplError, ReplWrapper};

type TestResult = Result<(), Box<dyn Error>>;

async fn spawn_mock() -> Result<ReplWrapper, ReplError> {
    ReplWrapper::spawn(mock_disco_config().build().repl).await
}

async fn stream(wrapper: &mut ReplWrapper, command: &str) -> Result<Vec<String>, ReplError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    wrapper.run_command_streaming(command, &tx).await?;
    Ok(drain(&mut rx))
}

#[tokio::test]
async fn round_trip_one_plus_one_yields_single_line() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let lines = with_timeout(stream(&mut wrapper, "1+1")).await?;
    assert_eq!(lines, vec!["2\n".to_string()]);
    Ok(())
}

#[tokio::test]
async fn streaming_emits_every_line_in_order() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let lines = with_timeout(stream(&mut wrapper, "lines")).await?;
    assert_eq!(lines, vec!["one\n", "two\n", "three\n"]);

    // The conversation stays in sync for the next command.
    let lines = with_timeout(stream(&mut wrapper, "1+1")).await?;
    assert_eq!(lines, vec!["2\n"]);
    Ok(())
}

#[tokio::test]
async fn trailing_partial_line_is_flushed_at_prompt() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let lines = with_timeout(stream(&mut wrapper, "partial")).await?;
    assert_eq!(lines, vec!["no newline"]);
    Ok(())
}

#[tokio::test]
async fn command_without_output_emits_nothing() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let lines = with_timeout(stream(&mut wrapper, ":{")).await?;
    assert!(lines.is_empty(), "unexpected output: {lines:?}");
    Ok(())
}

#[tokio::test]
async fn crlf_output_and_invalid_bytes_are_normalised() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let lines = with_timeout(stream(&mut wrapper, "crlf")).await?;
    assert_eq!(lines, vec!["a\n", "b\n"]);

    let lines = with_timeout(stream(&mut wrapper, "bytes")).await?;
    assert_eq!(lines, vec!["ok \u{fffd} done\n"]);
    Ok(())
}

#[tokio::test]
async fn prompt_inside_output_ends_the_command_early() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    // The first occurrence of the prompt wins, even mid-line.
    let lines = with_timeout(stream(&mut wrapper, "prompt-inside")).await?;
    assert_eq!(lines, vec!["say "]);

    // The remainder of that line, and the real prompt, are seen by the next
    // command.
    let lines = with_timeout(stream(&mut wrapper, "1+1")).await?;
    assert_eq!(lines, vec!["hi\n"]);
    Ok(())
}

#[tokio::test]
async fn stderr_is_merged_into_the_output() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let lines = with_timeout(stream(&mut wrapper, "stderr")).await?;
    assert_eq!(lines, vec!["oops\n"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stderr_burst_before_prompt_stays_with_its_command() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let expected: Vec<String> = (0..200)
        .map(|i| format!("type error line {i:03}\n"))
        .collect();

    for round in 0..20 {
        let burst = with_timeout(stream(&mut wrapper, "burst")).await?;
        assert_eq!(burst, expected, "round {round}: burst lines split or reordered");

        let next = with_timeout(stream(&mut wrapper, "x")).await?;
        assert_eq!(next, vec!["echo:x\n"], "round {round}: stderr leaked into next command");
    }
    Ok(())
}

#[tokio::test]
async fn buffered_mode_returns_all_output() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let output = with_timeout(wrapper.run_command("lines")).await?;
    assert_eq!(output, "one\ntwo\nthree\n");

    let output = with_timeout(wrapper.run_command("1+1\nx")).await?;
    assert_eq!(output, "2\necho:x\n");
    Ok(())
}

#[tokio::test]
async fn buffered_mode_rejects_empty_command() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let result = wrapper.run_command("").await;
    assert!(matches!(result, Err(ReplError::EmptyCommand)), "{result:?}");
    Ok(())
}

#[tokio::test]
async fn buffered_mode_times_out() -> TestResult {
    init_tracing();
    let config = mock_disco_config().command_timeout_secs(1).build();
    let mut wrapper = with_timeout(ReplWrapper::spawn(config.repl)).await?;

    let result = with_timeout(wrapper.run_command("hang")).await;
    assert!(matches!(result, Err(ReplError::Timeout { .. })), "{result:?}");
    Ok(())
}

#[tokio::test]
async fn child_exit_is_reported_as_eof_with_partial_output() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let result = with_timeout(stream(&mut wrapper, "die")).await;
    match result {
        Err(ReplError::Eof { output }) => assert_eq!(output, "dying"),
        other => panic!("expected Eof, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn restart_brings_back_a_working_child() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;
    let first_pid = wrapper.pid();

    let _ = with_timeout(stream(&mut wrapper, "die")).await;
    with_timeout(wrapper.restart()).await?;

    assert_ne!(wrapper.pid(), first_pid);
    let lines = with_timeout(stream(&mut wrapper, "1+1")).await?;
    assert_eq!(lines, vec!["2\n"]);
    Ok(())
}

/// Dead or reaped: `/proc/<pid>` is gone or the process is a zombie.
#[cfg(target_os = "linux")]
fn process_is_dead(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit_once(") ")
            .is_some_and(|(_, rest)| rest.starts_with('Z')),
        Err(_) => true,
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn shutdown_kills_processes_started_by_the_child() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let lines = with_timeout(stream(&mut wrapper, "background")).await?;
    let helper: u32 = lines[0].trim().parse()?;
    assert!(!process_is_dead(helper), "helper should be running before shutdown");

    with_timeout(wrapper.shutdown()).await?;

    with_timeout(async {
        while !process_is_dead(helper) {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    })
    .await;
    Ok(())
}

#[tokio::test]
async fn interrupt_stops_running_command_and_resyncs() -> TestResult {
    init_tracing();
    let mut wrapper = with_timeout(spawn_mock()).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    {
        let run = wrapper.run_command_streaming("slow", &tx);
        tokio::pin!(run);

        with_timeout(async {
            tokio::select! {
                res = &mut run => panic!("slow command finished on its own: {res:?}"),
                line = rx.recv() => assert_eq!(line.as_deref(), Some("working\n")),
            }
        })
        .await;
    }

    let trailing = with_timeout(wrapper.interrupt()).await?;
    assert_eq!(trailing, "interrupted\n");

    let lines = with_timeout(stream(&mut wrapper, "1+1")).await?;
    assert_eq!(lines, vec!["2\n"]);
    Ok(())
}

#[tokio::test]
async fn missing_binary_is_a_spawn_failure() {
    init_tracing();
    let config = mock_disco_config()
        .binary("/nonexistent/disco-binary")
        .args(Vec::<String>::new())
        .build();

    let result = ReplWrapper::spawn(config.repl).await;
    assert!(matches!(result, Err(ReplError::SpawnFailed { .. })), "{result:?}");
}

#[tokio::test]
async fn child_that_never_prompts_fails_startup() {
    init_tracing();
    let config = script_config("printf 'banner only\\n'; exit 0").build();

    let result = with_timeout(ReplWrapper::spawn(config.repl)).await;
    match result {
        Err(ReplError::StartupFailed { source, .. }) => {
            assert!(matches!(*source, ReplError::Eof { .. }), "{source:?}");
        }
        other => panic!("expected StartupFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn continuation_prompt_on_last_line_is_incomplete_input() -> TestResult {
    init_tracing();
    let script = r#"
printf 'Disco> '
while IFS= read -r line; do
  case "$line" in
    'open') printf '... ' ;;
    *) printf 'Disco> ' ;;
  esac
done
"#;
    let config = script_config(script).continuation_prompt("... ").build();
    let mut wrapper = with_timeout(ReplWrapper::spawn(config.repl)).await?;

    let result = with_timeout(wrapper.run_command("open")).await;
    assert!(
        matches!(result, Err(ReplError::IncompleteInput { .. })),
        "{result:?}"
    );
    Ok(())
}
