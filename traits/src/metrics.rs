/// Metrics sink, named only by interface — the concrete exporter (e.g. a
/// Prometheus pusher) is an external collaborator; the pool and consensus
/// engine only need somewhere to report into.
pub trait Metrics: Send + Sync {
    /// Adjusts a monotonic or free-running counter by `delta`.
    fn counter(&self, name: &'static str, delta: i64);

    /// Records the current value of a gauge.
    fn gauge(&self, name: &'static str, value: f64);
}

/// A metrics sink that discards everything, used where no concrete
/// collaborator has been wired (e.g. unit tests that don't care about
/// instrumentation).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetrics;

impl Metrics for NullMetrics {
    fn counter(&self, _name: &'static str, _delta: i64) {}
    fn gauge(&self, _name: &'static str, _value: f64) {}
}
