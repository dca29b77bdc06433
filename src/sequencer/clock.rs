/// Monotonic, drift-free time source.
///
/// The origin is arbitrary; the scheduler only ever looks at differences from
/// the value it sampled at `start`.
pub trait Clock: Send + Sync {
    /// Current time in seconds.
    fn now(&self) -> f64;
}
