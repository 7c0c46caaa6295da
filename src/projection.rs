//! Maps the visible time/value window to clip space.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::sample::{ScaleEpoch, ViewWindow};

/// Fixed scale applied after the orthographic projection. Shrinks the band to
/// a sub-region of the surface so several streams could later be tiled.
pub const COMPOSITE_SCALE: Vec3 = Vec3::new(0.2, 0.5, 0.5);

/// View window edges in local (epoch/scale normalised) units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalWindow {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl LocalWindow {
    pub fn from_view(view: &ViewWindow, scale: &ScaleEpoch) -> Self {
        let left = scale.local_time(view.time_start);
        let right = left + scale.local_duration(view.time_width);
        Self {
            left: left as f32,
            right: right as f32,
            bottom: scale.local_value(view.value_min) as f32,
            top: scale.local_value(view.value_max) as f32,
        }
    }
}

/// Orthographic projection of `view` onto the canonical clip cube, without
/// the composite scale.
pub fn ortho(view: &ViewWindow, scale: &ScaleEpoch) -> Mat4 {
    let w = LocalWindow::from_view(view, scale);
    Mat4::orthographic_rh_gl(w.left, w.right, w.bottom, w.top, -1.0, 1.0)
}

/// Full per-frame matrix: orthographic projection followed by [`COMPOSITE_SCALE`].
pub fn project(view: &ViewWindow, scale: &ScaleEpoch) -> Mat4 {
    Mat4::from_scale(COMPOSITE_SCALE) * ortho(view, scale)
}

/// Clip-space `(x, y)` of a local `(time, value)` point.
pub fn project_point(matrix: &Mat4, time: f32, value: f32) -> Vec2 {
    let clip = *matrix * Vec4::new(time, value, 0.0, 1.0);
    Vec2::new(clip.x, clip.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_ortho_maps_window_corners() {
        let view = ViewWindow::new(0, 40, -1.0, 1.0);
        let m = ortho(&view, &ScaleEpoch::default());

        assert!(close(project_point(&m, 0.0, -1.0), Vec2::new(-1.0, -1.0)));
        assert!(close(project_point(&m, 40.0, 1.0), Vec2::new(1.0, 1.0)));
        assert!(close(project_point(&m, 20.0, 0.0), Vec2::ZERO));
    }

    #[test]
    fn test_composite_scale_is_applied_after_ortho() {
        let view = ViewWindow::new(0, 40, -1.0, 1.0);
        let m = project(&view, &ScaleEpoch::default());

        assert!(close(project_point(&m, 0.0, -1.0), Vec2::new(-0.2, -0.5)));
        assert!(close(project_point(&m, 40.0, 1.0), Vec2::new(0.2, 0.5)));
    }

    #[test]
    fn test_view_is_normalised_by_scale_epoch() {
        let scale = ScaleEpoch::new(1_000_000, 1_000.0, 5.0, 10.0);
        // local window: time 0..2, value -1..1
        let view = ViewWindow::new(1_000_000, 2_000, -5.0, 15.0);
        let local = LocalWindow::from_view(&view, &scale);
        assert_eq!(
            local,
            LocalWindow {
                left: 0.0,
                right: 2.0,
                bottom: -1.0,
                top: 1.0
            }
        );

        let m = ortho(&view, &scale);
        assert!(close(project_point(&m, 2.0, 1.0), Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_projection_is_pure() {
        let view = ViewWindow::new(-50, 300, -3.0, 7.5);
        let scale = ScaleEpoch::new(10, 2.0, 1.0, 0.5);
        assert_eq!(project(&view, &scale), project(&view, &scale));
    }
}
