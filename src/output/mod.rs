//! Shared textual output channel and scoped capture.
//!
//! Agents write their trace lines and response text to a [`Console`]. A UI
//! that wants the text instead of the terminal installs an [`OutputCapture`]
//! for the duration of one query; dropping the guard puts the previous
//! target back.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback receiving the full accumulated text after every write.
pub type RenderCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Destination of console writes.
pub trait OutputTarget: Send {
    fn write_text(&mut self, text: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Process standard output.
#[derive(Debug, Default)]
pub struct StdoutTarget;

impl OutputTarget for StdoutTarget {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullTarget;

impl OutputTarget for NullTarget {
    fn write_text(&mut self, _text: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Appends every write to a shared buffer and re-renders it.
struct BufferTarget {
    buffer: Arc<Mutex<String>>,
    on_write: Option<RenderCallback>,
}

impl OutputTarget for BufferTarget {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        let snapshot = {
            let mut buffer = lock(&self.buffer);
            buffer.push_str(text);
            self.on_write.as_ref().map(|_| buffer.clone())
        };
        if let (Some(callback), Some(snapshot)) = (&self.on_write, snapshot) {
            callback(&snapshot);
        }
        Ok(())
    }
}

/// Cloneable handle to the current output target.
#[derive(Clone)]
pub struct Console {
    target: Arc<Mutex<Box<dyn OutputTarget>>>,
}

impl Console {
    /// Console writing to standard output.
    pub fn stdout() -> Self {
        Self::with_target(Box::new(StdoutTarget))
    }

    /// Console that drops all output.
    pub fn null() -> Self {
        Self::with_target(Box::new(NullTarget))
    }

    pub fn with_target(target: Box<dyn OutputTarget>) -> Self {
        Self {
            target: Arc::new(Mutex::new(target)),
        }
    }

    /// Write text to the current target.
    ///
    /// Write failures are logged and otherwise ignored; losing terminal
    /// output never fails a query.
    pub fn write(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut target = lock(&self.target);
        if let Err(e) = target.write_text(text) {
            tracing::debug!(error = %e, "console write failed");
        }
    }

    pub fn writeln(&self, text: &str) {
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        self.write(&line);
    }

    pub fn flush(&self) {
        if let Err(e) = lock(&self.target).flush() {
            tracing::debug!(error = %e, "console flush failed");
        }
    }

    /// Redirect this console into an accumulating buffer until the returned
    /// guard is dropped.
    ///
    /// `on_write` runs on every write with the whole text so far. It must not
    /// write back to this console.
    pub fn capture(&self, on_write: Option<RenderCallback>) -> OutputCapture {
        let buffer = Arc::new(Mutex::new(String::new()));
        let replacement: Box<dyn OutputTarget> = Box::new(BufferTarget {
            buffer: buffer.clone(),
            on_write,
        });
        let previous = std::mem::replace(&mut *lock(&self.target), replacement);
        OutputCapture {
            console: self.clone(),
            previous: Some(previous),
            buffer,
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// Active redirection of a [`Console`]. Restores the prior target on drop.
pub struct OutputCapture {
    console: Console,
    previous: Option<Box<dyn OutputTarget>>,
    buffer: Arc<Mutex<String>>,
}

impl OutputCapture {
    /// Text captured so far.
    pub fn text(&self) -> String {
        lock(&self.buffer).clone()
    }

    /// Restore the console and return everything captured.
    pub fn finish(self) -> String {
        self.text()
    }
}

impl Drop for OutputCapture {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *lock(&self.console.target) = previous;
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
