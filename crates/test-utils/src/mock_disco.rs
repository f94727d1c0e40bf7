//! A `/bin/sh` stand-in for the Disco REPL.
//!
//! It prints `Disco> `, reads one line at a time and answers a handful of
//! canned commands; anything else is echoed back as `echo:<line>`.

use crate::builders::ConfigFileBuilder;

pub const MOCK_DISCO_SCRIPT: &str = r#"
printf 'Disco> '
while IFS= read -r line; do
  case "$line" in
    '1+1') printf '2\n' ;;
    ':{'|':}') ;;
    'lines') printf 'one\ntwo\nthree\n' ;;
    'partial') printf 'no newline' ;;
    'crlf') printf 'a\r\nb\r\n' ;;
    'prompt-inside') printf 'say Disco> hi\n' ;;
    'bytes') printf 'ok \377 done\n' ;;
    'stderr') printf 'oops\n' >&2 ;;
    'burst')
      i=0
      while [ "$i" -lt 200 ]; do
        printf 'type error line %03d\n' "$i" >&2
        i=$((i + 1))
      done
      ;;
    'background') sleep 30 & printf '%s\n' "$!" ;;
    'die') printf 'dying'; exit 3 ;;
    'hang') sleep 3 ;;
    'slow')
      stop=0
      trap 'printf "interrupted\n"; stop=1' INT
      printf 'working\n'
      while [ "$stop" = 0 ]; do sleep 0.05; done
      trap - INT
      ;;
    *) printf 'echo:%s\n' "$line" ;;
  esac
  printf 'Disco> '
done
"#;

/// Config that launches the mock REPL through `sh -c`.
pub fn mock_disco_config() -> ConfigFileBuilder {
    script_config(MOCK_DISCO_SCRIPT)
}

/// Config that launches an arbitrary shell script as the REPL.
pub fn script_config(script: &str) -> ConfigFileBuilder {
    ConfigFileBuilder::new()
        .binary("sh")
        .args(["-c", script])
        .startup_timeout_secs(5)
        .command_timeout_secs(5)
}
