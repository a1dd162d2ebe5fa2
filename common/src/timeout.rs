use std::time::{Duration, Instant};

pub struct Timeout {
    instant: Instant,
    duration: Duration,
}

impl Timeout {
    #[inline]
    pub fn new(duration: Duration) -> Self {
        Self {
            instant: Instant::now(),
            duration,
        }
    }

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        Self::new(Duration::from_micros(micros))
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    #[inline]
    pub fn expired(&self) -> bool {
        self.instant.elapsed() >= self.duration
    }

    #[inline]
    pub fn run(&self) -> Result<(), ()> {
        if self.expired() {
            Err(())
        } else {
            // Sleeps in Redox are only evaluated on PIT ticks (a few ms), which is far too coarse
            // for the sub-millisecond holds hardware sequencing needs. The clock itself is
            // accurate, so spin on it.
            std::hint::spin_loop();
            Ok(())
        }
    }
}

/// Busy-waits for at least `duration`.
///
/// Used for hardware-mandated holds such as reset pulse widths. It never yields and cannot be
/// interrupted, and it returns only once the full duration has elapsed.
pub fn hold(duration: Duration) {
    let timeout = Timeout::new(duration);
    while timeout.run().is_ok() {}
}
