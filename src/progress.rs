// Progress/telemetry sink: a callable the permutation dispatcher
// invokes once per completed permutation, carrying
// (completed, total, best_R_so_far). Implementations must not block
// meaningfully; side effects are the sink's own responsibility.

/// Implemented as a trait object so callers can hand in closures,
/// channel senders, or a silent no-op. Must be `Send + Sync` because
/// the dispatcher invokes it from whichever rayon worker happens to
/// finish the aggregation reduction.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize, best_radius: Option<f64>);
}

/// Default sink: ignores every event.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_progress(&self, _completed: usize, _total: usize, _best_radius: Option<f64>) {}
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize, Option<f64>) + Send + Sync,
{
    fn on_progress(&self, completed: usize, total: usize, best_radius: Option<f64>) {
        self(completed, total, best_radius)
    }
}
