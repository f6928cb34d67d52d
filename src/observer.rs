use crate::error::ApiError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Sees every request the client makes. Implementations must be cheap; they
/// run inline on the request path.
pub trait RequestObserver: Send + Sync {
    fn on_request(&self, method: &str, url: &str);
    fn on_response(&self, method: &str, url: &str, status: u16, elapsed: Duration);
    fn on_error(&self, method: &str, url: &str, error: &ApiError);
}

pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_request(&self, method: &str, url: &str) {
        debug!("→ {} {}", method, url);
    }

    fn on_response(&self, method: &str, url: &str, status: u16, elapsed: Duration) {
        debug!("← {} {} {} ({} ms)", status, method, url, elapsed.as_millis());
    }

    fn on_error(&self, method: &str, url: &str, error: &ApiError) {
        warn!("✗ {} {}: {}", method, url, error);
    }
}

const DEBUG_LOG_CAPACITY: usize = 500;

/// Bounded line buffer shown in the debug panel. Also forwards to tracing.
#[derive(Clone, Default)]
pub struct DebugLog {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == DEBUG_LOG_CAPACITY {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    pub fn snapshot(&self) -> String {
        match self.lines.lock() {
            Ok(lines) => lines.iter().fold(String::new(), |mut out, line| {
                out.push_str(line);
                out.push('\n');
                out
            }),
            Err(_) => String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl RequestObserver for DebugLog {
    fn on_request(&self, method: &str, url: &str) {
        TracingObserver.on_request(method, url);
        self.push(format!("→ {} {}", method, url));
    }

    fn on_response(&self, method: &str, url: &str, status: u16, elapsed: Duration) {
        TracingObserver.on_response(method, url, status, elapsed);
        self.push(format!(
            "← {} {} {} ({} ms)",
            status,
            method,
            url,
            elapsed.as_millis()
        ));
    }

    fn on_error(&self, method: &str, url: &str, error: &ApiError) {
        TracingObserver.on_error(method, url, error);
        self.push(format!("✗ {} {}: {}", method, url, error));
    }
}
