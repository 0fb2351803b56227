use std::time::Duration;

use rand::Rng;

/// Returns `base` plus a random extra of up to half of `base`.
///
/// The result always lies in `[base, base * 1.5)`. Concurrent pollers using
/// the same base interval drift apart instead of hitting the backend in
/// lockstep.
pub fn jittered_delay<R: Rng + ?Sized>(base: Duration, rng: &mut R) -> Duration {
    let spread_nanos = base.as_nanos() / 2;
    if spread_nanos == 0 {
        return base;
    }

    let extra_nanos = rng.gen_range(0..spread_nanos);
    base.saturating_add(Duration::from_nanos(
        u64::try_from(extra_nanos).unwrap_or(u64::MAX),
    ))
}

/// Returns a jittered delay drawn from the thread-local generator.
#[must_use]
pub fn jittered(base: Duration) -> Duration {
    jittered_delay(base, &mut rand::thread_rng())
}
