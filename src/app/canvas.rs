use eframe::egui::{
    self, Align2, Color32, CornerRadius, FontId, Pos2, Rect, Sense, Stroke, StrokeKind, Ui,
    epaint::CubicBezierShape, pos2,
};

use super::render_utils::{
    blend_color, circle_visible, curve_visible, draw_background, group_fill, group_stroke,
    with_alpha,
};
use super::{SettingsEditor, WorkflowApp};
use crate::util::output_snippet;
use crate::workflow::{
    DragOutcome, DragTracker, Intent, Node, NodeId, connection_curve, node_rect,
};

const PULSE_COLOR: Color32 = Color32::from_rgb(255, 214, 90);
const FAILURE_COLOR: Color32 = Color32::from_rgb(211, 47, 47);

impl WorkflowApp {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui, now: f64) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_canvas_zoom(ui, rect, &response);

        let stage_pointer = ui
            .input(|input| input.pointer.interact_pos())
            .map(|pointer| (pointer - rect.min).to_pos2());
        let mut intents = self.track_pointer(ui, &response, stage_pointer);

        let camera = self.camera;
        let center_stage = (rect.center() - rect.min).to_pos2();
        let world_center = camera.screen_to_world(center_stage);
        self.view_center_world = (world_center.x, world_center.y);

        draw_background(&painter, rect, camera.offset, camera.zoom);

        let preview = self
            .drag
            .as_ref()
            .and_then(|drag| drag.node_preview(camera.zoom));
        let dragged_position = |node: &Node| -> Node {
            let mut node = node.clone();
            if let Some((id, position)) = preview
                && id == node.id
            {
                node.x = position.x;
                node.y = position.y;
            }
            node
        };
        let to_screen = |world: Pos2| rect.min + camera.world_to_screen(world).to_vec2();

        // connections first, under the node cards
        for node in self.graph.nodes() {
            for connection in &node.connections {
                let Some(target) = self.graph.node(connection.target) else {
                    continue;
                };
                let curve =
                    connection_curve(&dragged_position(node), &dragged_position(target));
                let points = curve.points.map(to_screen);
                if !curve_visible(rect, &points, 4.0) {
                    continue;
                }

                let accent = group_stroke(node.color_index);
                let stroke = if connection.active {
                    Stroke::new(3.0 * camera.zoom.max(0.5), accent)
                } else {
                    Stroke::new(2.0 * camera.zoom.max(0.5), with_alpha(accent, 0.55))
                };
                painter.add(CubicBezierShape::from_points_stroke(
                    points,
                    false,
                    Color32::TRANSPARENT,
                    stroke,
                ));
            }
        }

        // link being dragged out of a node
        if let Some(drag) = &self.drag
            && let Some(from) = drag.link_source()
            && let Some(source) = self.graph.node(from)
        {
            let (cx, cy) = source.center();
            let start = to_screen(pos2(cx, cy));
            let end = rect.min + drag.pointer_last().to_vec2();
            painter.line_segment(
                [start, end],
                Stroke::new(1.5, Color32::from_rgba_unmultiplied(230, 230, 230, 160)),
            );
        }

        // traveling delegation pulses
        for event in self.comms.live() {
            let (Some(from), Some(to)) = (self.graph.node(event.from), self.graph.node(event.to))
            else {
                continue;
            };
            let progress = event.age01(now);
            let (fx, fy) = dragged_position(from).center();
            let (tx, ty) = dragged_position(to).center();
            let position = to_screen(pos2(fx + (tx - fx) * progress, fy + (ty - fy) * progress));
            let radius = (5.0 * camera.zoom).clamp(2.5, 8.0);
            if circle_visible(rect, position, radius) {
                painter.circle_filled(
                    position,
                    radius,
                    with_alpha(PULSE_COLOR, 1.0 - progress * 0.6),
                );
            }
        }

        let hovered_node = stage_pointer
            .filter(|_| response.hovered())
            .and_then(|pointer| self.hit_node(camera.screen_to_world(pointer)));
        if hovered_node.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        for node in self.graph.nodes() {
            let node = dragged_position(node);
            let world = node_rect(&node);
            let card = Rect::from_min_max(to_screen(world.min), to_screen(world.max));
            if !card.intersects(rect) {
                continue;
            }
            self.draw_node_card(&painter, &node, card, camera.zoom, now);
        }

        if response.secondary_clicked()
            && let Some(pointer) = stage_pointer
            && let Some(id) = self.hit_node(camera.screen_to_world(pointer))
            && let Some(node) = self.graph.node(id)
        {
            self.settings_editor = Some(SettingsEditor {
                node: id,
                system_prompt: node.system_prompt.clone(),
                temperature: node.temperature,
            });
        }

        for intent in intents.drain(..) {
            self.apply_intent(intent, now);
        }
    }

    fn handle_canvas_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }
        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let stage = (pointer - rect.min).to_pos2();
        self.camera.zoom_at(stage, scroll > 0.0);
    }

    /// Press/track/release lifecycle for the single pointer drag. The graph
    /// is untouched until release; a sub-tolerance release becomes a click.
    fn track_pointer(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        stage_pointer: Option<Pos2>,
    ) -> Vec<Intent> {
        let mut intents = Vec::new();

        let (pressed, released, connect_modifier) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.modifiers.ctrl || input.modifiers.command,
            )
        });

        if pressed
            && response.hovered()
            && let Some(pointer) = stage_pointer
        {
            self.begin_drag(pointer, connect_modifier);
        }

        if let Some(drag) = self.drag.as_mut() {
            if let Some(pointer) = stage_pointer {
                drag.track(pointer);
            }
            if let Some(offset) = drag.pan_offset() {
                self.camera.offset = offset;
            }
        }

        if released
            && let Some(drag) = self.drag.take()
        {
            let pointer = stage_pointer.unwrap_or_else(|| drag.pointer_last());
            let drop_target = self.hit_node(self.camera.screen_to_world(pointer));
            match drag.finish(pointer, self.camera.zoom, drop_target) {
                DragOutcome::Click(id) => intents.push(Intent::NodeClicked(id)),
                DragOutcome::Moved { id, x, y } => intents.push(Intent::NodeMoved { id, x, y }),
                DragOutcome::Connect { from, to } => {
                    intents.push(Intent::ConnectRequested { from, to });
                }
                DragOutcome::Panned | DragOutcome::Cancelled => {}
            }
        }

        intents
    }

    /// Press dispatch: a node press becomes a node (or link) drag, anything
    /// else pans the canvas. While a drag is live, later presses are ignored,
    /// so a node under the pointer cannot start moving mid-pan.
    fn begin_drag(&mut self, pointer: Pos2, connect_modifier: bool) {
        if self.drag.is_some() {
            return;
        }

        let world = self.camera.screen_to_world(pointer);
        self.drag = Some(match self.hit_node(world) {
            Some(id) if connect_modifier => DragTracker::link(id, pointer),
            Some(id) => {
                let node = self.graph.node(id).map(|node| pos2(node.x, node.y));
                match node {
                    Some(origin) => DragTracker::node(id, origin, pointer),
                    None => DragTracker::canvas(self.camera.offset, pointer),
                }
            }
            None => DragTracker::canvas(self.camera.offset, pointer),
        });
    }

    /// Topmost hit wins; nodes later in the draw order cover earlier ones.
    fn hit_node(&self, world: Pos2) -> Option<NodeId> {
        self.graph
            .nodes()
            .iter()
            .rev()
            .find(|node| node_rect(node).contains(world))
            .map(|node| node.id)
    }

    fn draw_node_card(&self, painter: &egui::Painter, node: &Node, card: Rect, zoom: f32, now: f64) {
        let accent = group_stroke(node.color_index);
        let mut fill = group_fill(node.color_index);
        let mut stroke = Stroke::new(2.0, accent);

        if node.is_processing {
            let pulse = ((now * 6.0).sin() * 0.5 + 0.5) as f32;
            fill = blend_color(fill, accent, 0.12 * pulse);
            painter.rect_stroke(
                card.expand(3.0),
                CornerRadius::same(10),
                Stroke::new(2.0, with_alpha(accent, 0.35 + 0.4 * pulse)),
                StrokeKind::Outside,
            );
        }
        if node.failure.is_some() {
            stroke = Stroke::new(2.5, FAILURE_COLOR);
        }

        painter.rect_filled(card, CornerRadius::same(8), fill);
        painter.rect_stroke(card, CornerRadius::same(8), stroke, StrokeKind::Inside);

        let ink = Color32::from_rgb(33, 33, 33);
        let title_font = FontId::proportional((14.0 * zoom).clamp(10.0, 21.0));
        let small_font = FontId::proportional((10.0 * zoom).clamp(7.5, 15.0));

        painter.text(
            pos2(card.center().x, card.top() + 6.0 * zoom),
            Align2::CENTER_TOP,
            &node.label,
            title_font,
            ink,
        );
        painter.text(
            pos2(card.center().x, card.top() + 24.0 * zoom),
            Align2::CENTER_TOP,
            &node.role,
            small_font.clone(),
            with_alpha(ink, 0.6),
        );

        let body = if let Some(failure) = &node.failure {
            Some(format!("failed: {failure}"))
        } else {
            node.output.as_ref().map(|output| {
                let max_lines = ((3.0 / zoom).floor() as usize).max(1);
                output_snippet(output, max_lines)
            })
        };
        if let Some(body) = body {
            let color = if node.failure.is_some() {
                FAILURE_COLOR
            } else {
                with_alpha(ink, 0.85)
            };
            painter.text(
                pos2(card.center().x, card.top() + 40.0 * zoom),
                Align2::CENTER_TOP,
                body,
                small_font,
                color,
            );
        } else if node.is_processing {
            painter.text(
                pos2(card.center().x, card.top() + 40.0 * zoom),
                Align2::CENTER_TOP,
                "working...",
                small_font,
                with_alpha(ink, 0.6),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::WorkflowGraph;

    fn app_with_two_nodes() -> (WorkflowApp, NodeId, NodeId) {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_coordinator((100.0, 100.0));
        let b = graph.add_coordinator((600.0, 100.0));
        let mut app = WorkflowApp::with_generator(std::sync::Arc::new(
            crate::workflow::VerseGenerator::new(std::time::Duration::ZERO),
        ));
        app.graph = graph;
        (app, a, b)
    }

    #[test]
    fn hit_testing_prefers_the_topmost_node() {
        let (mut app, _, b) = app_with_two_nodes();
        // stack both nodes on the same spot; the later one draws on top
        for id in app.graph.nodes().iter().map(|node| node.id).collect::<Vec<_>>() {
            app.graph.set_position(id, 50.0, 50.0);
        }
        assert_eq!(app.hit_node(pos2(60.0, 60.0)), Some(b));
    }

    #[test]
    fn hit_testing_misses_empty_canvas() {
        let (app, ..) = app_with_two_nodes();
        assert_eq!(app.hit_node(pos2(-500.0, -500.0)), None);
    }

    #[test]
    fn node_press_starts_a_node_drag_on_an_idle_canvas() {
        let (mut app, a, _) = app_with_two_nodes();
        let node = app.graph.node(a).unwrap();
        let over_node = pos2(node.x + 10.0, node.y + 10.0);

        app.begin_drag(over_node, false);
        let drag = app.drag.unwrap();
        assert_eq!(drag.node_preview(1.0).map(|(id, _)| id), Some(a));
    }

    #[test]
    fn node_press_during_canvas_pan_does_not_start_a_node_drag() {
        let (mut app, a, _) = app_with_two_nodes();
        let node = app.graph.node(a).unwrap();
        let over_node = pos2(node.x + 10.0, node.y + 10.0);

        app.drag = Some(DragTracker::canvas(app.camera.offset, pos2(500.0, 400.0)));
        app.begin_drag(over_node, false);

        let drag = app.drag.unwrap();
        assert!(drag.node_preview(1.0).is_none());
        assert_eq!(drag.finish(over_node, 1.0, Some(a)), DragOutcome::Panned);
    }
}
