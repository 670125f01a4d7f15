//! Volume fades
//!
//! A smooth fade is a multi-step linear interpolation of the engine
//! handle's volume over a fixed wall-clock duration. The step values are
//! computed by a pure function so the interpolation is unit-testable;
//! the async ramp re-locks the player slot per step and abandons the
//! fade as soon as the handle disappears or the owning session is
//! stopped.

use crate::config::FadeSettings;
use crate::playback::manager::PlayerSlot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Compute the per-step volume targets for a linear fade.
///
/// Returns `steps` values ending at `to` (subject to integer rounding);
/// each is `round(from - (i+1) * (from - to) / steps)`.
pub fn fade_steps(from: u8, to: u8, steps: u32) -> Vec<u8> {
    if steps == 0 {
        return vec![to];
    }
    let step_size = (f64::from(from) - f64::from(to)) / f64::from(steps);
    (1..=steps)
        .map(|i| (f64::from(from) - f64::from(i) * step_size).round().clamp(0.0, 100.0) as u8)
        .collect()
}

/// Smoothly ramp the live engine handle to `target`.
///
/// Reads the handle's current volume as the starting point and writes one
/// interpolated value per step, sleeping `seconds / steps` in between.
/// Every sleep is a cancellation-observation point: the ramp returns
/// early when `stop` is raised or the player slot becomes empty. A no-op
/// when no handle is live.
pub(crate) async fn ramp(
    player: &PlayerSlot,
    target: u8,
    fade: FadeSettings,
    stop: Option<&AtomicBool>,
) {
    let from = match player.lock().await.as_ref() {
        Some(handle) => handle.volume(),
        None => return,
    };

    let delay = Duration::from_secs_f64(fade.seconds / f64::from(fade.steps.max(1)));
    for step in fade_steps(from, target, fade.steps) {
        if stop.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            return;
        }
        match player.lock().await.as_mut() {
            Some(handle) => handle.set_volume(step),
            None => return,
        }
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_down() {
        assert_eq!(fade_steps(100, 20, 4), vec![80, 60, 40, 20]);
    }

    #[test]
    fn test_fade_up() {
        assert_eq!(fade_steps(0, 80, 4), vec![20, 40, 60, 80]);
    }

    #[test]
    fn test_last_step_hits_target() {
        for steps in 1..30 {
            assert_eq!(*fade_steps(73, 12, steps).last().unwrap(), 12);
            assert_eq!(*fade_steps(0, 100, steps).last().unwrap(), 100);
        }
    }

    #[test]
    fn test_rounding_to_nearest() {
        // step size 10/3: 10 - 3.33 = 6.67 -> 7, 10 - 6.67 = 3.33 -> 3
        assert_eq!(fade_steps(10, 0, 3), vec![7, 3, 0]);
    }

    #[test]
    fn test_flat_fade() {
        assert_eq!(fade_steps(50, 50, 4), vec![50, 50, 50, 50]);
    }

    #[test]
    fn test_zero_steps_jumps_to_target() {
        assert_eq!(fade_steps(100, 20, 0), vec![20]);
    }
}
