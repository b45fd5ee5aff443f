use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::Context;
use card_sync::CardSyncClient;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Delivers one JSON `ServerEvent` per line, in file order. Blank lines and
/// lines starting with `#` are skipped; lines that fail are logged and counted.
pub fn replay<R: BufRead>(client: &CardSyncClient, reader: R) -> anyhow::Result<ReplayReport> {
    let mut report = ReplayReport::default();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match client.deliver_text(line) {
            Ok(applied) if applied.changed() => report.applied += 1,
            Ok(_) => report.unchanged += 1,
            Err(err) => {
                warn!(line = line_no, error = %err, "replay: skipped event");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

pub fn replay_file(client: &CardSyncClient, path: &Path) -> anyhow::Result<ReplayReport> {
    let file = File::open(path)
        .with_context(|| format!("failed to open replay file '{}'", path.display()))?;
    replay(client, BufReader::new(file))
}

#[cfg(test)]
#[path = "tests/replay_tests.rs"]
mod tests;
