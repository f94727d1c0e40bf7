// Output scanning must not depend on how the child's bytes were chunked.

use disco_kernel::repl::{MarkerSet, OutputScanner, PromptPattern, ScanMatch};
use proptest::prelude::*;

const PROMPT: &str = "Disco> ";

// Lines that cannot contain a newline or the prompt ('>' is excluded).
fn line_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 :{}=+*\\r-]{0,12}"
}

fn output_strategy() -> impl Strategy<Value = (Vec<String>, String)> {
    (
        proptest::collection::vec(line_strategy(), 0..8),
        "[a-z ]{0,6}",
    )
}

fn render(lines: &[String], tail: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    for line in lines {
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
    }
    bytes.extend_from_slice(tail.as_bytes());
    bytes.extend_from_slice(PROMPT.as_bytes());
    bytes
}

/// Feed `bytes` in pieces cut at `cuts`, collecting every match as soon as
/// it becomes available.
fn scan_chunked(bytes: &[u8], cuts: &[usize]) -> Vec<ScanMatch> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    points.push(0);
    points.push(bytes.len());
    points.sort_unstable();
    points.dedup();

    let mut scanner = OutputScanner::new(PromptPattern::new(PROMPT, ""));
    let mut found = Vec::new();
    for window in points.windows(2) {
        scanner.push(&bytes[window[0]..window[1]]);
        while let Some(m) = scanner.next_match(MarkerSet::PromptsOrLine) {
            found.push(m);
        }
    }
    assert!(scanner.is_empty(), "bytes left after the final prompt");
    found
}

proptest! {
    #[test]
    fn chunking_does_not_change_matches(
        (lines, tail) in output_strategy(),
        cuts in proptest::collection::vec(any::<usize>(), 0..10),
    ) {
        let bytes = render(&lines, &tail);

        let whole = scan_chunked(&bytes, &[]);
        let chunked = scan_chunked(&bytes, &cuts);

        prop_assert_eq!(whole, chunked);
    }

    #[test]
    fn every_line_is_reported_before_the_prompt(
        (lines, tail) in output_strategy(),
    ) {
        let bytes = render(&lines, &tail);
        let found = scan_chunked(&bytes, &[]);

        prop_assert_eq!(found.len(), lines.len() + 1);
        for (m, line) in found.iter().zip(&lines) {
            prop_assert!(!m.is_prompt());
            let expected = line.strip_suffix('\r').unwrap_or(line);
            prop_assert_eq!(&m.before, expected);
        }

        let last = found.last().unwrap();
        prop_assert!(last.is_prompt());
        prop_assert_eq!(&last.before, &tail);
    }
}
