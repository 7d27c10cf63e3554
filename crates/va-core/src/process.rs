//! Sous-processus ffmpeg : drainage de stderr en tâche de fond.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};

/// Lignes de stderr conservées pour le message d'erreur.
pub const STDERR_TAIL_LINES: usize = 32;
/// Longueur max d'une ligne conservée (bytes).
const MAX_LINE_BYTES: u64 = 1024;

/// Lit le stderr d'un processus enfant sur un thread dédié.
///
/// The pipe is read continuously, so a chatty child never blocks on a full
/// stderr buffer while its stdout is being consumed. Only the last
/// [`STDERR_TAIL_LINES`] lines are kept.
///
/// # Example
/// ```
/// use va_core::process::StderrTail;
/// let tail = StderrTail::spawn(std::io::Cursor::new(b"a\nb\n".to_vec())).unwrap();
/// assert_eq!(tail.join(), "a\nb");
/// ```
pub struct StderrTail {
    handle: JoinHandle<String>,
}

impl StderrTail {
    /// Start draining `reader` until EOF.
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<R: Read + Send + 'static>(reader: R) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("va-stderr".to_string())
            .spawn(move || collect_tail(reader, STDERR_TAIL_LINES))
            .context("Impossible de spawner le thread stderr")?;
        Ok(Self { handle })
    }

    /// Wait for EOF and return the kept lines, newline-joined.
    ///
    /// Call it once the child has exited, or its stderr stays open.
    #[must_use]
    pub fn join(self) -> String {
        self.handle.join().unwrap_or_default()
    }
}

fn collect_tail<R: Read>(reader: R, keep: usize) -> String {
    let mut reader = BufReader::new(reader);
    let mut tail: VecDeque<String> = VecDeque::with_capacity(keep);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.by_ref().take(MAX_LINE_BYTES).read_until(b'\n', &mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line).trim_end().to_string();
                if text.is_empty() {
                    continue;
                }
                if tail.len() == keep {
                    tail.pop_front();
                }
                tail.push_back(text);
            }
        }
    }
    Vec::from(tail).join("\n")
}
