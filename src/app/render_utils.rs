use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::workflow::GROUP_COLOR_COUNT;

/// Card fill and accent stroke per coordinator group, reused modulo the
/// palette once more groups exist than colors.
pub(super) const GROUP_COLORS: [(Color32, Color32); GROUP_COLOR_COUNT] = [
    (
        Color32::from_rgb(227, 242, 253),
        Color32::from_rgb(25, 118, 210),
    ),
    (
        Color32::from_rgb(243, 229, 245),
        Color32::from_rgb(123, 31, 162),
    ),
    (
        Color32::from_rgb(232, 245, 233),
        Color32::from_rgb(56, 142, 60),
    ),
    (
        Color32::from_rgb(255, 243, 224),
        Color32::from_rgb(245, 124, 0),
    ),
];

pub(super) fn group_fill(color_index: usize) -> Color32 {
    GROUP_COLORS[color_index % GROUP_COLORS.len()].0
}

pub(super) fn group_stroke(color_index: usize) -> Color32 {
    GROUP_COLORS[color_index % GROUP_COLORS.len()].1
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (255.0 * alpha.clamp(0.0, 1.0)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, offset: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    // stage origin: world (0, 0) on screen
    let origin = rect.min + offset;

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Conservative culling for a cubic: the curve never leaves the convex hull
/// of its control points, so the points' bounding box is enough.
pub(super) fn curve_visible(rect: Rect, points: &[Pos2; 4], padding: f32) -> bool {
    let mut bounds = Rect::from_two_pos(points[0], points[3]);
    bounds.extend_with(points[1]);
    bounds.extend_with(points[2]);
    bounds.expand(padding).intersects(rect)
}
