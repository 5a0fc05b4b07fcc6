/// A trait for time sources that return a monotonic timestamp in milliseconds.
///
/// This abstraction lets the in-process store compare expiry deadlines against
/// a real monotonic clock, or against a manually advanced clock in tests.
///
/// The origin is implementation defined; only differences between readings
/// of the same source are meaningful.
///
/// # Example
///
/// ```
/// use latchkey::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource: Send + Sync {
    /// Returns the current time in milliseconds since the source's origin.
    fn current_millis(&self) -> u64;
}
