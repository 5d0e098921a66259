//! Live relay of remote stdout/stderr lines

use crate::deploy::transport::BoxedReader;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Receives relayed lines. Implementations must tolerate calls from two
/// tasks at once.
pub trait OutputSink: Send + Sync {
    fn stdout_line(&self, line: &str);
    fn stderr_line(&self, line: &str);
}

/// Drain both streams until each reaches end-of-stream. Stderr is drained by
/// a spawned task while the caller's task drains stdout; the task is joined
/// before returning.
pub async fn relay_output(
    stdout: BoxedReader,
    stderr: BoxedReader,
    sink: Arc<dyn OutputSink>,
) -> io::Result<()> {
    let stderr_sink = Arc::clone(&sink);
    let stderr_task = tokio::spawn(async move {
        drain_lines(stderr, |line| stderr_sink.stderr_line(line)).await
    });

    let stdout_result = drain_lines(stdout, |line| sink.stdout_line(line)).await;
    let stderr_result = stderr_task
        .await
        .map_err(|e| io::Error::other(format!("stderr relay task failed: {e}")))?;

    stdout_result?;
    stderr_result
}

async fn drain_lines<F>(reader: BoxedReader, mut emit: F) -> io::Result<()>
where
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        emit(line.trim_end_matches(['\n', '\r']));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<(bool, String)>>,
    }

    impl OutputSink for Recorder {
        fn stdout_line(&self, line: &str) {
            self.lines.lock().unwrap().push((false, line.to_string()));
        }

        fn stderr_line(&self, line: &str) {
            self.lines.lock().unwrap().push((true, line.to_string()));
        }
    }

    #[tokio::test]
    async fn test_relays_both_streams() {
        let recorder = Arc::new(Recorder::default());
        relay_output(
            Box::new(std::io::Cursor::new(b"one\r\ntwo\nthree".to_vec())),
            Box::new(std::io::Cursor::new(b"warn\n".to_vec())),
            recorder.clone(),
        )
        .await
        .unwrap();

        let lines = recorder.lines.lock().unwrap();
        let stdout: Vec<_> = lines.iter().filter(|(err, _)| !err).map(|(_, l)| l.as_str()).collect();
        let stderr: Vec<_> = lines.iter().filter(|(err, _)| *err).map(|(_, l)| l.as_str()).collect();
        assert_eq!(stdout, vec!["one", "two", "three"]);
        assert_eq!(stderr, vec!["warn"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_relayed_lossily() {
        let recorder = Arc::new(Recorder::default());
        relay_output(
            Box::new(std::io::Cursor::new(vec![b'a', 0xff, b'\n'])),
            Box::new(std::io::Cursor::new(Vec::new())),
            recorder.clone(),
        )
        .await
        .unwrap();

        let lines = recorder.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.starts_with('a'));
    }
}
