//! Zoom state machine for the interactive viewer.
//!
//! `ViewState` is a plain value: every transition takes `self` by value and
//! returns the next state, so the reconciliation rules between button steps
//! and pinch gestures can be tested without any rendering surface.
//!
//! Two bound sets apply, one per input source:
//! - button steps clamp to [`BUTTON_BOUNDS`] (0.7 – 1.5)
//! - gesture updates clamp to [`GESTURE_BOUNDS`] (0.5 – 2.0)
//!
//! Gesture updates are multiplicative against the scale at the last update
//! and re-base the distance baseline after every update.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl ScaleBounds {
    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }

    pub fn contains(&self, scale: f64) -> bool {
        scale >= self.min && scale <= self.max
    }
}

pub const BUTTON_BOUNDS: ScaleBounds = ScaleBounds { min: 0.7, max: 1.5 };
pub const GESTURE_BOUNDS: ScaleBounds = ScaleBounds { min: 0.5, max: 2.0 };
pub const ZOOM_STEP: f64 = 0.1;

/// A contact point in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &TouchPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Distance between the contact points of a two-finger pinch.
fn pinch_distance(points: &[TouchPoint]) -> Option<f64> {
    match points {
        [a, b] => Some(a.distance(b)).filter(|d| d.is_finite()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ButtonStep {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InputMode {
    Idle,
    Button,
    Gesture {
        /// Inter-point distance at the last start/update.
        baseline_distance: f64,
        /// Scale at the last start/update.
        anchor_scale: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub scale: f64,
    pub mode: InputMode,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            mode: InputMode::Idle,
        }
    }
}

impl ViewState {
    /// One discrete zoom step, clamped to the button bounds. A scale left
    /// outside those bounds by a gesture snaps back into them.
    pub fn apply_button_step(self, step: ButtonStep) -> Self {
        let delta = match step {
            ButtonStep::In => ZOOM_STEP,
            ButtonStep::Out => -ZOOM_STEP,
        };
        Self {
            scale: BUTTON_BOUNDS.clamp(round2(self.scale + delta)),
            mode: InputMode::Button,
        }
    }

    pub fn reset(self) -> Self {
        Self {
            scale: 1.0,
            mode: InputMode::Idle,
        }
    }

    /// Begin a pinch. Anything but exactly two points leaves the state
    /// unchanged.
    pub fn gesture_start(self, points: &[TouchPoint]) -> Self {
        match pinch_distance(points) {
            Some(distance) => Self {
                scale: self.scale,
                mode: InputMode::Gesture {
                    baseline_distance: distance,
                    anchor_scale: self.scale,
                },
            },
            None => self,
        }
    }

    /// Continue a pinch.
    ///
    /// `scale = anchor * (distance / baseline)`, clamped to the gesture
    /// bounds; then the anchor becomes the new scale and the baseline the
    /// current distance. Events without exactly two points are ignored. With
    /// no gesture active the update starts one instead.
    pub fn apply_gesture_update(self, points: &[TouchPoint]) -> Self {
        let Some(distance) = pinch_distance(points) else {
            return self;
        };
        let InputMode::Gesture {
            baseline_distance,
            anchor_scale,
        } = self.mode
        else {
            return self.gesture_start(points);
        };

        let scale = if baseline_distance > 0.0 {
            GESTURE_BOUNDS.clamp(anchor_scale * (distance / baseline_distance))
        } else {
            self.scale
        };

        Self {
            scale,
            mode: InputMode::Gesture {
                baseline_distance: distance,
                anchor_scale: scale,
            },
        }
    }

    /// Contact lifted. Ends the gesture once fewer than two points remain.
    pub fn gesture_end(self, remaining: &[TouchPoint]) -> Self {
        if self.is_gesturing() && remaining.len() < 2 {
            Self {
                scale: self.scale,
                mode: InputMode::Idle,
            }
        } else {
            self
        }
    }

    pub fn is_gesturing(&self) -> bool {
        matches!(self.mode, InputMode::Gesture { .. })
    }

    /// Label for the reset control, e.g. `"120%"`.
    pub fn zoom_label(&self) -> String {
        format!("{}%", (self.scale * 100.0).round() as i64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(distance: f64) -> [TouchPoint; 2] {
        [TouchPoint::new(0.0, 0.0), TouchPoint::new(distance, 0.0)]
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_is_unit_scale_idle() {
        let s = ViewState::default();
        assert_eq!(s.scale, 1.0);
        assert_eq!(s.mode, InputMode::Idle);
    }

    #[test]
    fn zoom_in_never_exceeds_button_max() {
        let mut s = ViewState::default();
        for _ in 0..20 {
            s = s.apply_button_step(ButtonStep::In);
            assert!(s.scale <= 1.5);
        }
        assert_eq!(s.scale, 1.5);
    }

    #[test]
    fn zoom_out_never_below_button_min() {
        let mut s = ViewState::default();
        for _ in 0..20 {
            s = s.apply_button_step(ButtonStep::Out);
            assert!(s.scale >= 0.7);
        }
        assert_eq!(s.scale, 0.7);
    }

    #[test]
    fn button_steps_do_not_drift() {
        let s = ViewState::default()
            .apply_button_step(ButtonStep::In)
            .apply_button_step(ButtonStep::In)
            .apply_button_step(ButtonStep::Out);
        assert_eq!(s.scale, 1.1);
        assert_eq!(s.zoom_label(), "110%");
    }

    #[test]
    fn reset_is_exactly_one() {
        let s = ViewState::default()
            .gesture_start(&pair(100.0))
            .apply_gesture_update(&pair(173.0))
            .reset();
        assert_eq!(s.scale, 1.0);
        assert_eq!(s.mode, InputMode::Idle);
    }

    #[test]
    fn doubling_distance_doubles_anchor() {
        let s = ViewState {
            scale: 0.8,
            mode: InputMode::Idle,
        }
        .gesture_start(&pair(100.0))
        .apply_gesture_update(&pair(200.0));
        assert!(approx(s.scale, 1.6));
    }

    #[test]
    fn sequential_updates_rebase() {
        let s = ViewState::default().gesture_start(&pair(100.0));
        let s = s.apply_gesture_update(&pair(120.0));
        assert!(approx(s.scale, 1.2));
        let s = s.apply_gesture_update(&pair(144.0));
        assert!(approx(s.scale, 1.44));
        match s.mode {
            InputMode::Gesture {
                baseline_distance,
                anchor_scale,
            } => {
                assert_eq!(baseline_distance, 144.0);
                assert!(approx(anchor_scale, 1.44));
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn repeated_same_distance_does_not_accelerate() {
        let mut s = ViewState::default()
            .gesture_start(&pair(100.0))
            .apply_gesture_update(&pair(130.0));
        let after_first = s.scale;
        for _ in 0..10 {
            s = s.apply_gesture_update(&pair(130.0));
        }
        assert!(approx(s.scale, after_first));
    }

    #[test]
    fn clamped_update_rebases_from_clamped_scale() {
        let s = ViewState::default()
            .gesture_start(&pair(100.0))
            .apply_gesture_update(&pair(300.0));
        assert_eq!(s.scale, 2.0);
        let s = s.apply_gesture_update(&pair(150.0));
        assert!(approx(s.scale, 1.0));
    }

    #[test]
    fn gesture_clamps_to_wide_bounds() {
        let s = ViewState::default()
            .gesture_start(&pair(400.0))
            .apply_gesture_update(&pair(10.0));
        assert_eq!(s.scale, 0.5);
    }

    #[test]
    fn single_point_events_are_ignored() {
        let one = [TouchPoint::new(5.0, 5.0)];
        let s = ViewState::default().gesture_start(&one);
        assert_eq!(s, ViewState::default());

        let g = ViewState::default().gesture_start(&pair(100.0));
        assert_eq!(g.apply_gesture_update(&one), g);
        assert_eq!(g.apply_gesture_update(&[]), g);
    }

    #[test]
    fn three_point_events_are_ignored() {
        let three = [
            TouchPoint::new(0.0, 0.0),
            TouchPoint::new(100.0, 0.0),
            TouchPoint::new(0.0, 100.0),
        ];
        assert_eq!(ViewState::default().gesture_start(&three), ViewState::default());
        let g = ViewState::default().gesture_start(&pair(100.0));
        assert_eq!(g.apply_gesture_update(&three), g);
        assert!(g.gesture_end(&three).is_gesturing());
    }

    #[test]
    fn update_without_start_starts_gesture() {
        let s = ViewState::default().apply_gesture_update(&pair(80.0));
        assert_eq!(s.scale, 1.0);
        assert_eq!(
            s.mode,
            InputMode::Gesture {
                baseline_distance: 80.0,
                anchor_scale: 1.0
            }
        );
    }

    #[test]
    fn zero_baseline_rebases_without_scaling() {
        let s = ViewState::default().gesture_start(&pair(0.0));
        let s = s.apply_gesture_update(&pair(50.0));
        assert_eq!(s.scale, 1.0);
        let s = s.apply_gesture_update(&pair(100.0));
        assert!(approx(s.scale, 2.0));
    }

    #[test]
    fn gesture_end_returns_to_idle_and_keeps_scale() {
        let s = ViewState::default()
            .gesture_start(&pair(100.0))
            .apply_gesture_update(&pair(125.0));
        let still = s.gesture_end(&pair(125.0));
        assert!(still.is_gesturing());
        let ended = s.gesture_end(&[TouchPoint::new(1.0, 1.0)]);
        assert_eq!(ended.mode, InputMode::Idle);
        assert!(approx(ended.scale, 1.25));
    }

    #[test]
    fn button_step_after_gesture_snaps_into_button_bounds() {
        let s = ViewState::default()
            .gesture_start(&pair(100.0))
            .apply_gesture_update(&pair(200.0));
        assert_eq!(s.scale, 2.0);
        let s = s.apply_button_step(ButtonStep::In);
        assert_eq!(s.scale, 1.5);
        assert_eq!(s.mode, InputMode::Button);

        let low = ViewState {
            scale: 0.5,
            mode: InputMode::Idle,
        }
        .apply_button_step(ButtonStep::Out);
        assert_eq!(low.scale, 0.7);
    }

    #[test]
    fn gesture_uses_button_scale_as_anchor() {
        let s = ViewState::default()
            .apply_button_step(ButtonStep::In)
            .apply_button_step(ButtonStep::In)
            .gesture_start(&pair(100.0))
            .apply_gesture_update(&pair(150.0));
        assert!(approx(s.scale, 1.8));
    }

    #[test]
    fn bounds_contain() {
        assert!(BUTTON_BOUNDS.contains(1.0));
        assert!(!BUTTON_BOUNDS.contains(1.6));
        assert!(GESTURE_BOUNDS.contains(1.6));
    }
}
