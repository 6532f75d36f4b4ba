use instant::Instant;

use crate::prettyprint_usize;

pub fn elapsed_seconds(since: Instant) -> f64 {
    let dt = since.elapsed();
    (dt.as_secs() as f64) + (f64::from(dt.subsec_nanos()) * 1e-9)
}

pub fn prettyprint_time(seconds: f64) -> String {
    format!("{:.4}s", seconds)
}

struct TimerSpan {
    name: String,
    started_at: Instant,
}

/// Hierarchial magic. Brackets phases of a long-running job with log lines, remembers how long
/// each one took, and repeats notes and warnings in a summary when the Timer is dropped.
pub struct Timer {
    outermost_name: String,
    results: Vec<String>,
    stack: Vec<TimerSpan>,

    notes: Vec<String>,
    warnings: Vec<String>,
}

impl Timer {
    pub fn new<I: Into<String>>(raw_name: I) -> Timer {
        let name = raw_name.into();
        let mut t = Timer {
            outermost_name: name.clone(),
            results: Vec::new(),
            stack: Vec::new(),
            notes: Vec::new(),
            warnings: Vec::new(),
        };
        t.start(name);
        t
    }

    /// Log immediately, but also repeat at the end, to avoid having to scroll up and find
    /// interesting stuff.
    pub fn note(&mut self, line: String) {
        info!("{}", line);
        self.notes.push(line);
    }

    pub fn warn(&mut self, line: String) {
        warn!("{}", line);
        self.warnings.push(line);
    }

    pub fn start<I: Into<String>>(&mut self, raw_name: I) {
        let name = raw_name.into();
        info!("{}...", name);
        self.stack.push(TimerSpan {
            name,
            started_at: Instant::now(),
        });
    }

    pub fn stop<I: Into<String>>(&mut self, raw_name: I) {
        let name = raw_name.into();
        let span = match self.stack.pop() {
            Some(span) => span,
            None => panic!("Timer::stop({}) with nothing started", name),
        };
        assert_eq!(span.name, name);
        let took = prettyprint_time(elapsed_seconds(span.started_at));
        info!("{} took {}", name, took);
        self.results.push(format!(
            "{}- {} took {}",
            "  ".repeat(self.stack.len()),
            name,
            took
        ));
    }

    /// Logs a count of items processed in some phase, with thousands separators.
    pub fn count(&mut self, label: &str, items: usize) {
        self.note(format!("{}: {}", label, prettyprint_usize(items)));
    }
}

impl std::ops::Drop for Timer {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let name = self.outermost_name.clone();
        while let Some(span) = self.stack.last() {
            if span.name == name {
                self.stop(name);
                break;
            }
            let inner = span.name.clone();
            self.stop(inner);
        }

        for line in &self.results {
            info!("{}", line);
        }
        if !self.notes.is_empty() {
            info!("{} notes:", self.notes.len());
            for line in &self.notes {
                info!("{}", line);
            }
        }
        if !self.warnings.is_empty() {
            warn!("{} warnings:", self.warnings.len());
            for line in &self.warnings {
                warn!("{}", line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_spans() {
        let mut timer = Timer::new("run");
        timer.start("load tables");
        timer.stop("load tables");
        timer.start("outer");
        timer.start("inner");
        timer.stop("inner");
        timer.stop("outer");
        timer.note("done".to_string());
        assert_eq!(1, timer.stack.len());
        assert_eq!(3, timer.results.len());
        assert!(timer.results[1].starts_with("    - inner took"));
    }

    #[test]
    #[should_panic]
    fn mismatched_stop() {
        let mut timer = Timer::new("mismatched");
        timer.start("a");
        timer.stop("b");
    }
}
