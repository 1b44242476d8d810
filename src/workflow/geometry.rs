use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use super::model::{NODE_HEIGHT, NODE_WIDTH, Node};

pub const MIN_ZOOM: f32 = 0.2;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 1.1;

const MAX_CONTROL_OFFSET: f32 = 150.0;

/// Stage transform: `screen = world * zoom + offset`, both in canvas-local
/// pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub offset: Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        pos2(
            world.x * self.zoom + self.offset.x,
            world.y * self.zoom + self.offset.y,
        )
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        pos2(
            (screen.x - self.offset.x) / self.zoom,
            (screen.y - self.offset.y) / self.zoom,
        )
    }

    /// One wheel step, anchored so the world point under `pointer` stays put
    /// on screen.
    pub fn zoom_at(&mut self, pointer: Pos2, zoom_in: bool) {
        let anchor = self.screen_to_world(pointer);
        let next = if zoom_in {
            self.zoom * ZOOM_STEP
        } else {
            self.zoom / ZOOM_STEP
        };
        self.zoom = next.clamp(MIN_ZOOM, MAX_ZOOM);
        self.offset = pointer.to_vec2() - anchor.to_vec2() * self.zoom;
    }
}

pub fn node_rect(node: &Node) -> Rect {
    Rect::from_min_size(pos2(node.x, node.y), vec2(NODE_WIDTH, NODE_HEIGHT))
}

/// Cubic control points in world space for a link between two nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkCurve {
    pub points: [Pos2; 4],
}

/// Routes center-to-center with control points pushed horizontally toward the
/// other endpoint; offset caps at a fixed maximum so long links stay shallow.
pub fn connection_curve(from: &Node, to: &Node) -> LinkCurve {
    let (sx, sy) = from.center();
    let (ex, ey) = to.center();
    let start = pos2(sx, sy);
    let end = pos2(ex, ey);

    let distance = start.distance(end);
    let offset = (distance * 0.5).min(MAX_CONTROL_OFFSET);
    let direction = if ex >= sx { 1.0 } else { -1.0 };

    LinkCurve {
        points: [
            start,
            start + vec2(offset * direction, 0.0),
            end - vec2(offset * direction, 0.0),
            end,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::model::WorkflowGraph;

    #[test]
    fn transform_round_trips() {
        let camera = Camera {
            offset: vec2(120.0, -48.0),
            zoom: 1.7,
        };
        let world = pos2(33.0, -91.0);
        let back = camera.screen_to_world(camera.world_to_screen(world));
        assert!((back.x - world.x).abs() < 1e-3);
        assert!((back.y - world.y).abs() < 1e-3);
    }

    #[test]
    fn zoom_keeps_world_point_under_pointer() {
        let mut camera = Camera {
            offset: vec2(40.0, 25.0),
            zoom: 0.8,
        };
        let pointer = pos2(213.0, 167.0);
        let before = camera.screen_to_world(pointer);

        camera.zoom_at(pointer, true);
        let after = camera.screen_to_world(pointer);

        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
        assert!((camera.zoom - 0.8 * ZOOM_STEP).abs() < 1e-5);
    }

    #[test]
    fn zoom_clamps_at_both_limits() {
        let mut camera = Camera {
            offset: Vec2::ZERO,
            zoom: MAX_ZOOM,
        };
        camera.zoom_at(pos2(0.0, 0.0), true);
        assert_eq!(camera.zoom, MAX_ZOOM);

        camera.zoom = MIN_ZOOM;
        camera.zoom_at(pos2(0.0, 0.0), false);
        assert_eq!(camera.zoom, MIN_ZOOM);
    }

    fn two_nodes(dx: f32, dy: f32) -> (WorkflowGraph, LinkCurve) {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_coordinator((0.0, 0.0));
        let b = graph.add_coordinator((0.0, 0.0));
        graph.set_position(a, 0.0, 0.0);
        graph.set_position(b, dx, dy);
        let curve = connection_curve(graph.node(a).unwrap(), graph.node(b).unwrap());
        (graph, curve)
    }

    #[test]
    fn control_offset_is_half_distance_for_short_links() {
        let (_, curve) = two_nodes(100.0, 0.0);
        let [start, c1, c2, end] = curve.points;
        assert_eq!(c1.x - start.x, 50.0);
        assert_eq!(end.x - c2.x, 50.0);
        assert_eq!(c1.y, start.y);
        assert_eq!(c2.y, end.y);
    }

    #[test]
    fn control_offset_caps_at_maximum() {
        let (_, curve) = two_nodes(1000.0, 0.0);
        let [start, c1, c2, end] = curve.points;
        assert_eq!(c1.x - start.x, MAX_CONTROL_OFFSET);
        assert_eq!(end.x - c2.x, MAX_CONTROL_OFFSET);
    }

    #[test]
    fn control_points_flip_for_leftward_links() {
        let (_, curve) = two_nodes(-400.0, 60.0);
        let [start, c1, c2, _] = curve.points;
        assert!(c1.x < start.x);
        assert!(c2.x > curve.points[3].x);
    }

    #[test]
    fn node_rect_covers_footprint() {
        let mut graph = WorkflowGraph::new();
        let id = graph.add_coordinator((0.0, 0.0));
        graph.set_position(id, 10.0, 20.0);
        let rect = node_rect(graph.node(id).unwrap());
        assert!(rect.contains(pos2(11.0, 21.0)));
        assert!(rect.contains(pos2(159.0, 99.0)));
        assert!(!rect.contains(pos2(161.0, 99.0)));
    }
}
