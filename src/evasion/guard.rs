//! Viewport guard
//!
//! Runs on every resize. Pulls a moved control back inside the margins if the
//! container shrank underneath it.

use glam::{IVec2, Vec2};

use super::geometry::{Margins, Rect, Size, ValidRange};

/// Corrected top-left position for `control`, or `None` if it already fits.
///
/// Each edge is checked on its own; only the violating axis moves.
pub fn reconcile(control: &Rect, container: Size, margins: Margins) -> Option<IVec2> {
    let size = control.size();
    let mut target = Vec2::new(control.left, control.top);
    let mut out_x = false;
    let mut out_y = false;

    if control.left < margins.x {
        target.x = margins.x;
        out_x = true;
    }
    if control.right > container.width - margins.x {
        target.x = container.width - size.width - margins.x;
        out_x = true;
    }
    if control.top < margins.top {
        target.y = margins.top;
        out_y = true;
    }
    if control.bottom > container.height - margins.bottom {
        target.y = container.height - size.height - margins.bottom;
        out_y = true;
    }

    if !out_x && !out_y {
        return None;
    }

    let range = ValidRange::new(container, size, margins);
    let clamped = range.clamp(target.round());
    let fixed = Vec2::new(
        if out_x { clamped.x } else { control.left },
        if out_y { clamped.y } else { control.top },
    );
    Some(fixed.round().as_ivec2())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: f32, top: f32, width: f32, height: f32) -> Rect {
        Rect::new(left, top, left + width, top + height)
    }

    #[test]
    fn test_left_edge_violation_corrected() {
        let fixed = reconcile(
            &rect(10.0, 200.0, 100.0, 50.0),
            Size::new(1024.0, 768.0),
            Margins::default(),
        )
        .expect("needs correction");
        assert!(fixed.x >= 40);
        assert_eq!(fixed.y, 200);
    }

    #[test]
    fn test_in_bounds_is_noop() {
        assert_eq!(
            reconcile(
                &rect(300.0, 300.0, 100.0, 50.0),
                Size::new(1024.0, 768.0),
                Margins::default(),
            ),
            None
        );
    }

    #[test]
    fn test_shrunk_viewport_pulls_back_from_bottom_right() {
        // Control sat at (900, 700) before the window shrank to 800x600
        let fixed = reconcile(
            &rect(900.0, 700.0, 100.0, 50.0),
            Size::new(800.0, 600.0),
            Margins::default(),
        )
        .unwrap();
        assert_eq!(fixed, IVec2::new(660, 510));
    }

    #[test]
    fn test_only_violating_axis_moves() {
        let fixed = reconcile(
            &rect(333.4, 20.0, 100.0, 50.0),
            Size::new(1024.0, 768.0),
            Margins::default(),
        )
        .unwrap();
        assert_eq!(fixed, IVec2::new(333, 80));
    }

    #[test]
    fn test_tiny_viewport_settles_on_margins() {
        let fixed = reconcile(
            &rect(5.0, 5.0, 100.0, 50.0),
            Size::new(120.0, 100.0),
            Margins::default(),
        )
        .unwrap();
        assert_eq!(fixed, IVec2::new(40, 80));
    }
}
