//! Operator trace: records each update operator as it is applied.
//!
//! Messages go to the `docops::trace` log target at TRACE and, when enabled, to a
//! thread-local sink so tests can assert on application order without a global logger.

use std::cell::RefCell;

pub const TRACE_TARGET: &str = "docops::trace";

thread_local! {
    static TL_SINK: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Disables the thread-local sink on drop.
pub struct TraceSinkGuard;

impl Drop for TraceSinkGuard {
    fn drop(&mut self) {
        TL_SINK.with(|s| *s.borrow_mut() = None);
    }
}

/// Start capturing trace lines on the current thread.
pub fn enable_thread_sink() -> TraceSinkGuard {
    TL_SINK.with(|s| *s.borrow_mut() = Some(Vec::new()));
    TraceSinkGuard
}

pub fn write_str(msg: &str) {
    TL_SINK.with(|s| {
        if let Some(buf) = s.borrow_mut().as_mut() {
            buf.push(msg.to_owned());
        }
    });
}

/// Take the captured lines, leaving the sink enabled and empty.
pub fn drain() -> Vec<String> {
    TL_SINK.with(|s| s.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

pub fn snapshot() -> Vec<String> {
    TL_SINK.with(|s| s.borrow().as_ref().cloned().unwrap_or_default())
}

#[macro_export]
macro_rules! op_trace {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        $crate::trace::write_str(&__s);
        log::log!(target: $crate::trace::TRACE_TARGET, log::Level::Trace, "{}", __s);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_captures_and_drains() {
        let _g = enable_thread_sink();
        crate::op_trace!("$set {}", "a.b");
        crate::op_trace!("$inc age");
        assert_eq!(snapshot(), vec!["$set a.b".to_string(), "$inc age".to_string()]);
        assert_eq!(drain().len(), 2);
        assert!(snapshot().is_empty());
    }

    #[test]
    fn other_threads_are_not_captured() {
        let _g = enable_thread_sink();
        crate::op_trace!("main");
        let child = std::thread::spawn(|| {
            crate::op_trace!("child");
            snapshot()
        })
        .join()
        .unwrap();
        assert!(child.is_empty());
        assert_eq!(snapshot(), vec!["main".to_string()]);
    }

    #[test]
    fn disabled_after_guard_drops() {
        {
            let _g = enable_thread_sink();
            crate::op_trace!("inside");
        }
        crate::op_trace!("outside");
        assert!(snapshot().is_empty());
    }
}
