use tracing::info;
use crate::models::{EntryPhase, ProgressSignal, Report};

/// Receives progress and report updates from a running batch.
///
/// Both callbacks fire synchronously on the orchestrator's thread, in entry order.
pub trait ProgressObserver {
    fn on_progress(&self, signal: &ProgressSignal);

    fn on_report(&self, report: &Report);
}

/// Discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_progress(&self, _signal: &ProgressSignal) {}

    fn on_report(&self, _report: &Report) {}
}

/// Adapts a pair of closures into an observer
pub struct FnObserver<P, R> {
    on_progress: P,
    on_report: R,
}

impl<P, R> FnObserver<P, R>
where
    P: Fn(&ProgressSignal),
    R: Fn(&Report),
{
    pub fn new(on_progress: P, on_report: R) -> Self {
        Self { on_progress, on_report }
    }
}

impl<P, R> ProgressObserver for FnObserver<P, R>
where
    P: Fn(&ProgressSignal),
    R: Fn(&Report),
{
    fn on_progress(&self, signal: &ProgressSignal) {
        (self.on_progress)(signal)
    }

    fn on_report(&self, report: &Report) {
        (self.on_report)(report)
    }
}

/// Writes progress to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_progress(&self, signal: &ProgressSignal) {
        // Only settled entries; Processing is noise at info level
        if signal.current_entry_phase == EntryPhase::Processing {
            return;
        }
        info!(
            "[{}/{}] {:.1}% {} ({:?})",
            signal.completed_count,
            signal.total_count,
            signal.fraction() * 100.0,
            signal.current_entry_name,
            signal.current_entry_phase,
        );
    }

    fn on_report(&self, _report: &Report) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_fn_observer_forwards_updates() {
        let names = RefCell::new(Vec::new());
        let reports = RefCell::new(Vec::new());
        let observer = FnObserver::new(
            |s: &ProgressSignal| names.borrow_mut().push(s.current_entry_name.clone()),
            |r: &Report| reports.borrow_mut().push(r.clone()),
        );

        observer.on_progress(&ProgressSignal {
            completed_count: 0,
            total_count: 1,
            current_entry_name: "a.png".to_string(),
            current_entry_phase: EntryPhase::Processing,
        });
        observer.on_report(&Report { converted: 1, skipped: 0, failed: vec![] });

        assert_eq!(names.borrow().as_slice(), ["a.png".to_string()]);
        assert_eq!(reports.borrow()[0].converted, 1);
    }
}
