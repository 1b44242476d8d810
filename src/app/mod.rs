use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Align, Context, Layout};

use crate::workflow::{
    Camera, CommunicationLog, DragTracker, Generator, Intent, NodeId, NodeKind, Orchestrator,
    SpreadAnimation, VerseGenerator, WorkflowGraph,
};

mod canvas;
mod render_utils;
mod ui;

pub struct WorkflowApp {
    graph: WorkflowGraph,
    camera: Camera,
    comms: CommunicationLog,
    orchestrator: Orchestrator,
    spreads: Vec<SpreadAnimation>,
    drag: Option<DragTracker>,
    view_center_world: (f32, f32),
    topic_prompt: Option<TopicPrompt>,
    result_view: Option<ResultView>,
    settings_editor: Option<SettingsEditor>,
}

struct TopicPrompt {
    coordinator: NodeId,
    draft: String,
}

struct ResultView {
    text: String,
}

struct SettingsEditor {
    node: NodeId,
    system_prompt: String,
    temperature: f32,
}

impl WorkflowApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, worker_latency: Duration) -> Self {
        Self::with_generator(Arc::new(VerseGenerator::new(worker_latency)))
    }

    fn with_generator(generator: Arc<dyn Generator>) -> Self {
        Self {
            graph: WorkflowGraph::new(),
            camera: Camera::default(),
            comms: CommunicationLog::default(),
            orchestrator: Orchestrator::new(generator),
            spreads: Vec::new(),
            drag: None,
            view_center_world: (400.0, 300.0),
            topic_prompt: None,
            result_view: None,
            settings_editor: None,
        }
    }

    /// Single reducer for every gesture and dialog submission.
    fn apply_intent(&mut self, intent: Intent, now: f64) {
        match intent {
            Intent::AddCoordinator => {
                self.graph.add_coordinator(self.view_center_world);
            }
            Intent::NodeClicked(id) => self.handle_node_click(id),
            Intent::NodeMoved { id, x, y } => self.graph.set_position(id, x, y),
            Intent::ConnectRequested { from, to } => {
                self.graph.add_connection(from, to);
            }
            Intent::TopicSubmitted { coordinator, topic } => {
                if let Some(animation) = self.orchestrator.begin(
                    &mut self.graph,
                    &mut self.comms,
                    coordinator,
                    &topic,
                    now,
                ) {
                    self.spreads.push(animation);
                }
            }
            Intent::SettingsSaved { id, patch } => self.graph.apply_settings(id, patch),
        }
    }

    fn handle_node_click(&mut self, id: NodeId) {
        let Some(node) = self.graph.node(id) else {
            return;
        };
        if node.kind != NodeKind::Coordinator {
            return;
        }
        // a delegating coordinator must not re-enter topic entry
        if node.is_processing || self.orchestrator.is_running(id) {
            return;
        }

        match &node.output {
            Some(output) => {
                self.result_view = Some(ResultView {
                    text: output.clone(),
                });
            }
            None => {
                self.topic_prompt = Some(TopicPrompt {
                    coordinator: id,
                    draft: String::new(),
                });
            }
        }
    }

    /// Applies the newest due frame of every in-flight spread to its own
    /// animated subset. Overlapping delegations each keep their animation;
    /// entries move from their current position, so user drags mid-animation
    /// are absorbed instead of fought.
    fn tick_spread(&mut self, now: f64) -> bool {
        let mut moved = false;
        for animation in &mut self.spreads {
            let Some(eased) = animation.tick(now) else {
                continue;
            };
            for (id, target) in animation.targets().to_vec() {
                if let Some(node) = self.graph.node(id) {
                    let x = node.x + (target.0 - node.x) * eased;
                    let y = node.y + (target.1 - node.y) * eased;
                    self.graph.set_position(id, x, y);
                    moved = true;
                }
            }
        }

        self.spreads.retain(|animation| !animation.finished());
        moved
    }
}

impl eframe::App for WorkflowApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|input| input.time);

        let settled_work = self.orchestrator.pump(&mut self.graph, &mut self.comms, now);
        let animating = self.tick_spread(now);
        self.comms.prune(now);

        egui::TopBottomPanel::top("toolbar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Workflow Canvas");
                    ui.separator();
                    if ui.button("Add coordinator").clicked() {
                        self.apply_intent(Intent::AddCoordinator, now);
                    }
                    ui.label(format!("nodes: {}", self.graph.node_count()));
                    ui.label(format!("connections: {}", self.graph.connection_count()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!("zoom: {:.2}", self.camera.zoom));
                        ui.separator();
                        ui.label("drag background to pan, scroll to zoom, ctrl-drag to connect");
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui, now);
        });

        self.show_windows(ctx, now);

        if settled_work
            || animating
            || !self.spreads.is_empty()
            || self.drag.is_some()
            || !self.comms.is_empty()
            || self.orchestrator.has_active_runs()
        {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn test_app() -> WorkflowApp {
        WorkflowApp::with_generator(Arc::new(VerseGenerator::new(Duration::ZERO)))
    }

    fn settle(app: &mut WorkflowApp, coordinator: NodeId) {
        for _ in 0..500 {
            app.orchestrator.pump(&mut app.graph, &mut app.comms, 1.0);
            if app
                .graph
                .node(coordinator)
                .is_some_and(|node| !node.is_processing)
            {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("workflow did not settle");
    }

    fn submitted_coordinator(app: &mut WorkflowApp) -> NodeId {
        app.apply_intent(Intent::AddCoordinator, 0.0);
        let coordinator = app.graph.nodes()[0].id;
        app.apply_intent(
            Intent::TopicSubmitted {
                coordinator,
                topic: "cake".to_owned(),
            },
            0.0,
        );
        coordinator
    }

    #[test]
    fn clicking_a_fresh_coordinator_asks_for_a_topic() {
        let mut app = test_app();
        app.apply_intent(Intent::AddCoordinator, 0.0);
        let coordinator = app.graph.nodes()[0].id;

        app.apply_intent(Intent::NodeClicked(coordinator), 0.0);
        assert!(app.topic_prompt.is_some());
        assert!(app.result_view.is_none());
    }

    #[test]
    fn clicking_a_delegating_coordinator_is_ignored() {
        let mut app =
            WorkflowApp::with_generator(Arc::new(VerseGenerator::new(Duration::from_millis(50))));
        let coordinator = submitted_coordinator(&mut app);

        app.apply_intent(Intent::NodeClicked(coordinator), 0.1);
        assert!(app.topic_prompt.is_none());
        assert!(app.result_view.is_none());

        settle(&mut app, coordinator);
    }

    #[test]
    fn clicking_a_done_coordinator_surfaces_the_stored_output() {
        let mut app = test_app();
        let coordinator = submitted_coordinator(&mut app);
        settle(&mut app, coordinator);

        let nodes_before = app.graph.node_count();
        let output = app.graph.node(coordinator).unwrap().output.clone().unwrap();

        app.apply_intent(Intent::NodeClicked(coordinator), 2.0);
        assert_eq!(app.graph.node_count(), nodes_before);
        assert!(app.topic_prompt.is_none());
        assert_eq!(
            app.result_view.as_ref().map(|view| view.text.clone()),
            Some(output)
        );
    }

    #[test]
    fn clicking_a_worker_does_nothing() {
        let mut app = test_app();
        let coordinator = submitted_coordinator(&mut app);
        settle(&mut app, coordinator);

        let worker = app
            .graph
            .nodes()
            .iter()
            .find(|node| node.kind == NodeKind::Worker)
            .map(|node| node.id)
            .unwrap();
        app.apply_intent(Intent::NodeClicked(worker), 2.0);
        assert!(app.topic_prompt.is_none());
        assert!(app.result_view.is_none());
    }

    #[test]
    fn spread_moves_only_the_spawned_workers() {
        let mut app = test_app();
        let coordinator = submitted_coordinator(&mut app);
        let bystander = app.graph.add_coordinator((900.0, 900.0));
        let bystander_position = {
            let node = app.graph.node(bystander).unwrap();
            (node.x, node.y)
        };
        let coordinator_position = {
            let node = app.graph.node(coordinator).unwrap();
            (node.x, node.y)
        };

        let mut now = 0.0;
        while !app.spreads.is_empty() {
            now += 1.0 / 30.0;
            app.tick_spread(now);
        }

        let coordinator_node = app.graph.node(coordinator).unwrap();
        assert_eq!(
            (coordinator_node.x, coordinator_node.y),
            coordinator_position
        );
        let bystander_node = app.graph.node(bystander).unwrap();
        assert_eq!((bystander_node.x, bystander_node.y), bystander_position);

        let anchor = app.graph.node(coordinator).unwrap().center();
        for node in app.graph.nodes() {
            if node.kind == NodeKind::Worker {
                let worker_center = node.center();
                let dx = worker_center.0 - anchor.0;
                let dy = worker_center.1 - anchor.1;
                let distance = (dx * dx + dy * dy).sqrt();
                assert!((distance - 200.0).abs() < 1.5, "distance {distance}");
            }
        }

        settle(&mut app, coordinator);
    }

    #[test]
    fn overlapping_delegations_spread_both_worker_rings() {
        let mut app = test_app();
        let first = submitted_coordinator(&mut app);
        app.apply_intent(Intent::AddCoordinator, 0.0);
        let second = app
            .graph
            .nodes()
            .iter()
            .find(|node| node.kind == NodeKind::Coordinator && node.id != first)
            .map(|node| node.id)
            .unwrap();

        // second submission lands while the first spread is still in flight
        app.apply_intent(
            Intent::TopicSubmitted {
                coordinator: second,
                topic: "sea".to_owned(),
            },
            0.1,
        );
        assert_eq!(app.spreads.len(), 2);

        let mut now = 0.1;
        while !app.spreads.is_empty() {
            now += 1.0 / 30.0;
            app.tick_spread(now);
        }

        for coordinator in [first, second] {
            let anchor = {
                let node = app.graph.node(coordinator).unwrap();
                (node.x, node.y)
            };
            for node in app.graph.nodes() {
                if node.kind == NodeKind::Worker && node.group_id == coordinator {
                    let dx = node.x - anchor.0;
                    let dy = node.y - anchor.1;
                    let distance = (dx * dx + dy * dy).sqrt();
                    assert!(
                        (distance - 200.0).abs() < 1.5,
                        "group {coordinator} worker stuck at distance {distance}"
                    );
                }
            }
        }

        settle(&mut app, first);
        settle(&mut app, second);
    }
}
