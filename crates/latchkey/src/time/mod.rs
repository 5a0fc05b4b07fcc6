mod interface;
mod manual_clock;
mod mono_clock;

pub use interface::*;
pub use manual_clock::*;
pub use mono_clock::*;

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let before = clock.current_millis();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.current_millis() >= before + 5);
    }

    #[test]
    fn manual_clock_clones_share_readings() {
        let clock = ManualClock::starting_at(10);
        let handle = clock.clone();
        handle.advance(Duration::from_millis(5));
        assert_eq!(clock.current_millis(), 15);
        handle.advance(Duration::MAX);
        assert_eq!(clock.current_millis(), u64::MAX);
    }
}
