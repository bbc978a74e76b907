//! Bounded, append-only diagnostics log.
//!
//! The placement cache writes pre-formatted records here when diagnostics are
//! enabled; the log window renders the text. The log has its own lock, so a
//! slow renderer never contends with placement work.
//!
//! When an append would exceed the capacity, whole lines are dropped from the
//! front (at least [`MIN_TRIM`] bytes at a time) and replaced with a `...`
//! marker line. Appends never block on the reader and never fail.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::Mutex;
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::layer::{Context, Layer};

/// Default capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 32 * 1024;

/// Smallest amount trimmed from the front on overflow, so a full log is not
/// shifted on every single append.
pub const MIN_TRIM: usize = 1024;

/// Line that replaces trimmed content.
const MARKER: &str = "...\n";

/// Narrow sink the placement cache writes diagnostics to.
pub trait DiagSink: Send + Sync {
    /// Whether records should be produced at all.
    fn enabled(&self) -> bool;
    /// Append one pre-formatted record.
    fn append(&self, record: &str);
}

/// Callback invoked after each append (e.g. to request a repaint).
type Invalidate = Arc<dyn Fn() + Send + Sync>;

/// Text log with a byte capacity and an enabled flag.
pub struct DiagLog {
    /// Log text; always newline-terminated when non-empty.
    buf: Mutex<String>,
    /// Upper bound on `buf.len()`.
    capacity: usize,
    /// Whether producers should emit records.
    enabled: AtomicBool,
    /// Invalidation hook.
    on_append: Mutex<Option<Invalidate>>,
}

impl Debug for DiagLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DiagLog")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("enabled", &self.enabled())
            .finish()
    }
}

impl Default for DiagLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DiagLog {
    /// Create a disabled log holding at most `capacity` bytes.
    ///
    /// Capacities smaller than the truncation marker are raised to fit it.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Mutex::new(String::new()),
            capacity: capacity.max(MARKER.len() + 1),
            enabled: AtomicBool::new(false),
            on_append: Mutex::new(None),
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current size in bytes.
    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    /// True if nothing has been logged (or the log was cleared).
    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }

    /// Enable or disable record production.
    pub fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::SeqCst);
    }

    /// Flip the enabled flag, note the change in the log, and return the new state.
    pub fn toggle(&self) -> bool {
        let on = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        self.push(if on {
            "Logging enabled"
        } else {
            "Logging disabled"
        });
        on
    }

    /// Install the callback run after every append.
    pub fn set_on_append<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_append.lock() = Some(Arc::new(f));
    }

    /// Copy of the current text.
    pub fn snapshot(&self) -> String {
        self.buf.lock().clone()
    }

    /// Drop all content.
    pub fn clear(&self) {
        self.buf.lock().clear();
        self.notify();
    }

    /// Append a record regardless of the enabled flag.
    ///
    /// A trailing newline is added when missing.
    pub fn push(&self, record: &str) {
        {
            let mut buf = self.buf.lock();
            append_bounded(&mut buf, record, self.capacity);
        }
        self.notify();
    }

    /// Run the invalidation hook, outside the text lock.
    fn notify(&self) {
        let cb = self.on_append.lock().clone();
        if let Some(cb) = cb {
            cb();
        }
    }
}

impl DiagSink for DiagLog {
    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn append(&self, record: &str) {
        self.push(record);
    }
}

/// Smallest index `>= i` that lies on a char boundary of `s`.
fn ceil_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i.min(s.len())
}

/// Append `record` (newline-terminated) to `buf`, trimming from the front so
/// the result never exceeds `capacity` bytes.
fn append_bounded(buf: &mut String, record: &str, capacity: usize) {
    let newline = usize::from(!record.ends_with('\n'));
    let rec_len = record.len() + newline;

    if rec_len + MARKER.len() > capacity {
        // The record alone does not fit: keep its tail.
        let keep = capacity - MARKER.len();
        let mut full = String::with_capacity(rec_len);
        full.push_str(record);
        if newline == 1 {
            full.push('\n');
        }
        let start = ceil_boundary(&full, full.len() - keep);
        buf.clear();
        buf.push_str(MARKER);
        buf.push_str(&full[start..]);
        return;
    }

    if buf.len() + rec_len > capacity {
        let overflow = buf.len() + rec_len + MARKER.len() - capacity;
        let mut cut = ceil_boundary(buf, overflow.max(MIN_TRIM).min(buf.len()));
        // Drop whole lines so the marker replaces a line, not half of one.
        if cut > 0 && !buf[..cut].ends_with('\n') {
            cut = buf[cut..].find('\n').map_or(buf.len(), |nl| cut + nl + 1);
        }
        buf.replace_range(..cut, MARKER);
    }

    buf.push_str(record);
    if newline == 1 {
        buf.push('\n');
    }
}

/// Tracing layer that mirrors `WARN` and `ERROR` events into a [`DiagLog`]
/// while diagnostics are enabled.
pub struct DiagLayer {
    /// Destination log.
    log: Arc<DiagLog>,
}

impl<S> Layer<S> for DiagLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > Level::WARN || !self.log.enabled() {
            return;
        }

        let mut vis = MsgVisitor::default();
        event.record(&mut vis);
        let rendered = vis.msg.unwrap_or_default();
        let fields = vis.fields.trim_end();
        let line = if fields.is_empty() {
            format!("{} {}: {}", meta.level(), meta.target(), rendered)
        } else {
            format!("{} {}: {} {}", meta.level(), meta.target(), rendered, fields)
        };
        self.log.push(&line);
    }
}

/// Collects the `message` field and renders the rest as `key=value` pairs.
#[derive(Default)]
struct MsgVisitor {
    /// The `message` field, if any.
    msg: Option<String>,
    /// Remaining fields rendered as `key=value `.
    fields: String,
}

impl Visit for MsgVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.msg = Some(value.to_string());
        } else {
            let _ = write!(self.fields, "{}=\"{}\" ", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.msg = Some(format!("{:?}", value));
        } else {
            let _ = write!(self.fields, "{}={:?} ", field.name(), value);
        }
    }
}

/// Create the mirroring layer for `log`.
pub fn layer(log: Arc<DiagLog>) -> DiagLayer {
    DiagLayer { log }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tracing_subscriber::prelude::*;

    use super::*;

    #[test]
    fn push_terminates_lines() {
        let log = DiagLog::new(1024);
        log.push("one");
        log.push("two\n");
        assert_eq!(log.snapshot(), "one\ntwo\n");
    }

    #[test]
    fn overflow_drops_oldest_and_marks() {
        let log = DiagLog::new(2048);
        for i in 0..400 {
            log.push(&format!("line {i:04}"));
        }
        let text = log.snapshot();
        assert!(text.len() <= 2048, "len {}", text.len());
        assert!(text.starts_with("...\n"));
        assert!(text.ends_with("line 0399\n"));
        assert!(!text.contains("line 0000\n"));
        // Every surviving line is intact.
        for l in text.lines().skip(1) {
            assert!(l.starts_with("line ") && l.len() == 9, "{l:?}");
        }
    }

    #[test]
    fn trims_at_least_min_trim() {
        let log = DiagLog::new(MIN_TRIM * 4);
        let line = "x".repeat(99);
        while log.len() + 100 <= log.capacity() {
            log.push(&line);
        }
        let before = log.len();
        log.push(&line);
        assert!(before + 100 - log.len() >= MIN_TRIM - MARKER.len());
    }

    #[test]
    fn oversized_record_keeps_tail() {
        let log = DiagLog::new(64);
        log.push("head");
        let big = format!("{}END", "a".repeat(200));
        log.push(&big);
        let text = log.snapshot();
        assert!(text.len() <= 64);
        assert!(text.starts_with("...\n"));
        assert!(text.ends_with("END\n"));
    }

    #[test]
    fn multibyte_content_is_cut_on_char_boundaries() {
        let log = DiagLog::new(MIN_TRIM * 2);
        for _ in 0..200 {
            log.push("Fenster größe → ändern");
        }
        assert!(log.len() <= log.capacity());
        assert!(log.snapshot().starts_with("...\n"));
    }

    #[test]
    fn toggle_flips_and_records() {
        let log = DiagLog::default();
        assert!(!log.enabled());
        assert!(log.toggle());
        assert!(log.enabled());
        assert!(!log.toggle());
        assert_eq!(log.snapshot(), "Logging enabled\nLogging disabled\n");
    }

    #[test]
    fn invalidation_hook_runs_per_append() {
        let log = DiagLog::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        log.set_on_append(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        log.push("a");
        log.push("b");
        log.clear();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(log.is_empty());
    }

    #[test]
    fn layer_mirrors_warnings_only_when_enabled() {
        let log = Arc::new(DiagLog::default());
        let subscriber = tracing_subscriber::registry().with(layer(log.clone()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("before enable");
            log.set_enabled(true);
            tracing::info!("not mirrored");
            tracing::warn!(code = 5, "write failed");
            tracing::error!("boom");
        });
        let text = log.snapshot();
        assert!(!text.contains("before enable"));
        assert!(!text.contains("not mirrored"));
        assert!(text.contains("WARN"));
        assert!(text.contains("write failed code=5"));
        assert!(text.contains("ERROR"));
        assert!(text.contains("boom"));
    }
}
