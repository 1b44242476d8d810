use std::f32::consts::TAU;

use super::model::NodeId;

pub const SPREAD_RADIUS: f32 = 200.0;
const SPREAD_FRAMES: u32 = 30;
const SPREAD_DURATION_SECS: f64 = 1.0;

pub fn ease_out_cubic(progress: f32) -> f32 {
    1.0 - (1.0 - progress).powi(3)
}

/// Resting positions for `count` spawned workers: a radius-200 circle around
/// the coordinator's anchor, evenly spaced starting at angle zero.
pub fn worker_targets(center: (f32, f32), count: usize) -> Vec<(f32, f32)> {
    (0..count)
        .map(|index| {
            let angle = TAU * index as f32 / count as f32;
            (
                center.0 + SPREAD_RADIUS * angle.cos(),
                center.1 + SPREAD_RADIUS * angle.sin(),
            )
        })
        .collect()
}

/// Time-sliced eased repositioning of a spawned subset. Emits at most one
/// eased fraction per elapsed frame; callers move each entry from its
/// *current* position toward the target by that fraction, so a drag during
/// the animation is absorbed rather than fought.
#[derive(Clone, Debug)]
pub struct SpreadAnimation {
    entries: Vec<(NodeId, (f32, f32))>,
    started_at: f64,
    frames_emitted: u32,
}

impl SpreadAnimation {
    pub fn new(now: f64, entries: Vec<(NodeId, (f32, f32))>) -> Self {
        Self {
            entries,
            started_at: now,
            frames_emitted: 0,
        }
    }

    pub fn targets(&self) -> &[(NodeId, (f32, f32))] {
        &self.entries
    }

    pub fn finished(&self) -> bool {
        self.frames_emitted >= SPREAD_FRAMES
    }

    /// Returns the eased fraction for the newest elapsed frame, or `None`
    /// when no new frame is due yet (or the animation is over).
    pub fn tick(&mut self, now: f64) -> Option<f32> {
        if self.finished() {
            return None;
        }

        let elapsed = (now - self.started_at).max(0.0);
        let frame =
            ((elapsed / SPREAD_DURATION_SECS) * f64::from(SPREAD_FRAMES)) as u32;
        let frame = frame.min(SPREAD_FRAMES);
        if frame <= self.frames_emitted {
            return None;
        }

        self.frames_emitted = frame;
        let progress = frame as f32 / SPREAD_FRAMES as f32;
        Some(ease_out_cubic(progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_sit_on_the_circle_at_even_angles() {
        let targets = worker_targets((100.0, 100.0), 3);
        assert_eq!(targets.len(), 3);

        let expected = [
            (100.0 + 200.0, 100.0),
            (100.0 + 200.0 * (TAU / 3.0).cos(), 100.0 + 200.0 * (TAU / 3.0).sin()),
            (
                100.0 + 200.0 * (2.0 * TAU / 3.0).cos(),
                100.0 + 200.0 * (2.0 * TAU / 3.0).sin(),
            ),
        ];
        for (actual, wanted) in targets.iter().zip(expected.iter()) {
            assert!((actual.0 - wanted.0).abs() < 1e-3);
            assert!((actual.1 - wanted.1).abs() < 1e-3);
        }
    }

    #[test]
    fn no_frame_is_emitted_before_the_first_slice_elapses() {
        let mut animation = SpreadAnimation::new(10.0, vec![(NodeId(1), (100.0, 0.0))]);
        assert_eq!(animation.tick(10.0), None);
        assert_eq!(animation.tick(10.01), None);
        assert!(animation.tick(10.04).is_some());
    }

    #[test]
    fn each_frame_fires_once_and_the_last_reaches_one() {
        let mut animation = SpreadAnimation::new(0.0, vec![(NodeId(1), (50.0, 50.0))]);

        let eased = animation.tick(0.5).unwrap();
        assert!(eased > 0.0 && eased < 1.0);
        // same frame again: nothing new
        assert_eq!(animation.tick(0.5), None);

        let last = animation.tick(2.0).unwrap();
        assert_eq!(last, 1.0);
        assert!(animation.finished());
        assert_eq!(animation.tick(3.0), None);
    }

    #[test]
    fn compound_lerp_converges_exactly_on_target() {
        let mut animation = SpreadAnimation::new(0.0, vec![(NodeId(1), (300.0, -120.0))]);
        let (mut x, mut y) = (100.0_f32, 100.0_f32);

        let mut now = 0.0;
        while !animation.finished() {
            now += 1.0 / 30.0;
            if let Some(eased) = animation.tick(now) {
                let (_, target) = animation.targets()[0];
                x = (x + (target.0 - x) * eased).round();
                y = (y + (target.1 - y) * eased).round();
            }
        }

        assert_eq!((x, y), (300.0, -120.0));
    }

    #[test]
    fn easing_is_cubic_ease_out() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-6);
    }
}
