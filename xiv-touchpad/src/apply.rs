//! Per-frame rotation application: drained wheel snapshot in, camera writes
//! out. Stateless; everything it needs arrives as arguments.

use crate::camera::CameraView;
use crate::config::Config;
use crate::wheel::WheelSnapshot;

#[cfg(windows)]
use crate::camera::CameraResolver;

#[derive(Clone, Copy, Debug)]
pub struct RotationConfig {
    pub speed_yaw: f32,
    pub speed_pitch: f32,
    pub invert_yaw: bool,
    pub invert_pitch: bool,
}

impl From<&Config> for RotationConfig {
    fn from(config: &Config) -> Self {
        Self {
            speed_yaw: config.speed_yaw,
            speed_pitch: config.speed_pitch,
            invert_yaw: config.invert_yaw,
            invert_pitch: config.invert_pitch,
        }
    }
}

/// Yaw/pitch increments for one frame. Horizontal scroll steers yaw,
/// vertical steers pitch.
pub fn rotation_deltas(snap: &WheelSnapshot, config: &RotationConfig) -> (f32, f32) {
    let mut yaw = snap.horizontal * config.speed_yaw;
    if config.invert_yaw {
        yaw = -yaw;
    }

    let mut pitch = snap.vertical * config.speed_pitch;
    if config.invert_pitch {
        pitch = -pitch;
    }

    (yaw, pitch)
}

/// A vetoed or empty frame touches the camera not at all. The caller has
/// already drained, so skipped frames don't pile up into the next one.
pub(crate) fn should_apply(snap: &WheelSnapshot, veto: bool) -> bool {
    !veto && !snap.is_zero()
}

/// Adds the snapshot's rotation onto the camera. No clamping: the game keeps
/// pitch inside its own bounds, and yaw wraps on the game side.
pub fn apply_to_view(view: &CameraView, snap: &WheelSnapshot, config: &RotationConfig) {
    let (yaw, pitch) = rotation_deltas(snap, config);
    view.set_current_yaw(view.current_yaw() + yaw);
    view.set_current_pitch(view.current_pitch() + pitch);
}

/// One frame of camera steering. Locate runs fresh each call; a missing
/// camera (login screen, cutscene, zone change) skips silently.
#[cfg(windows)]
pub fn apply_rotation(
    resolver: &CameraResolver,
    snap: &WheelSnapshot,
    config: &RotationConfig,
    veto: bool,
) {
    if !should_apply(snap, veto) {
        return;
    }
    if let Some(view) = resolver.locate() {
        apply_to_view(&view, snap, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraView, CAMERA_BLOCK_LEN};

    fn config() -> RotationConfig {
        RotationConfig {
            speed_yaw: 0.05,
            speed_pitch: 0.05,
            invert_yaw: false,
            invert_pitch: false,
        }
    }

    #[test]
    fn test_deltas_scale_by_speed() {
        let snap = WheelSnapshot {
            vertical: 1.0,
            horizontal: 2.0,
        };
        let (yaw, pitch) = rotation_deltas(&snap, &config());
        assert_eq!(yaw, 0.10);
        assert_eq!(pitch, 0.05);
    }

    #[test]
    fn test_invert_yaw_flips_yaw_only() {
        let snap = WheelSnapshot {
            vertical: 1.0,
            horizontal: 2.0,
        };
        let mut cfg = config();
        cfg.invert_yaw = true;
        let (yaw, pitch) = rotation_deltas(&snap, &cfg);
        assert_eq!(yaw, -0.10);
        assert_eq!(pitch, 0.05);
    }

    #[test]
    fn test_invert_pitch_flips_pitch_only() {
        let snap = WheelSnapshot {
            vertical: 1.0,
            horizontal: 2.0,
        };
        let mut cfg = config();
        cfg.invert_pitch = true;
        let (yaw, pitch) = rotation_deltas(&snap, &cfg);
        assert_eq!(yaw, 0.10);
        assert_eq!(pitch, -0.05);
    }

    #[test]
    fn test_veto_and_empty_frames_skip() {
        let moving = WheelSnapshot {
            vertical: 1.0,
            horizontal: 0.0,
        };
        assert!(should_apply(&moving, false));
        assert!(!should_apply(&moving, true));
        assert!(!should_apply(&WheelSnapshot::default(), false));
    }

    #[test]
    fn test_apply_adds_onto_current_rotation() {
        #[repr(align(8))]
        struct Block([u8; CAMERA_BLOCK_LEN]);
        let mut block = Block([0u8; CAMERA_BLOCK_LEN]);
        let view = unsafe { CameraView::from_raw(block.0.as_mut_ptr() as usize) };
        view.set_current_yaw(1.0);
        view.set_current_pitch(0.5);

        let snap = WheelSnapshot {
            vertical: 1.0,
            horizontal: 2.0,
        };
        apply_to_view(&view, &snap, &config());
        assert_eq!(view.current_yaw(), 1.10);
        assert_eq!(view.current_pitch(), 0.55);
    }
}
