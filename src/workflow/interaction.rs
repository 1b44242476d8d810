use eframe::egui::{Pos2, Vec2};

use super::model::{NodeId, SettingsPatch};

/// Net pointer travel (stage pixels, per axis) below which a press/release
/// pair counts as a click instead of a move.
pub const CLICK_TOLERANCE: f32 = 3.0;

/// Typed gestures and collaborator submissions, all funneled through the one
/// reducer that owns the graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    AddCoordinator,
    NodeClicked(NodeId),
    NodeMoved { id: NodeId, x: f32, y: f32 },
    ConnectRequested { from: NodeId, to: NodeId },
    TopicSubmitted { coordinator: NodeId, topic: String },
    SettingsSaved { id: NodeId, patch: SettingsPatch },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum DragTarget {
    /// Node drag; `origin` is the node's world position at press time.
    Node { id: NodeId, origin: Pos2 },
    /// Background pan; `origin` is the camera offset at press time.
    Canvas { origin: Vec2 },
    /// Connection drag started from a node (modifier held).
    Link { from: NodeId },
}

#[derive(Debug, PartialEq)]
pub enum DragOutcome {
    Click(NodeId),
    Moved { id: NodeId, x: f32, y: f32 },
    Connect { from: NodeId, to: NodeId },
    Panned,
    /// Link drag released over empty canvas.
    Cancelled,
}

/// One in-flight drag. Pointer positions are stage-space (canvas-local
/// pixels); conversion to world space happens only when a move is committed.
#[derive(Clone, Copy, Debug)]
pub struct DragTracker {
    target: DragTarget,
    pointer_start: Pos2,
    pointer_last: Pos2,
}

impl DragTracker {
    pub fn node(id: NodeId, origin: Pos2, pointer: Pos2) -> Self {
        Self {
            target: DragTarget::Node { id, origin },
            pointer_start: pointer,
            pointer_last: pointer,
        }
    }

    pub fn canvas(offset: Vec2, pointer: Pos2) -> Self {
        Self {
            target: DragTarget::Canvas { origin: offset },
            pointer_start: pointer,
            pointer_last: pointer,
        }
    }

    pub fn link(from: NodeId, pointer: Pos2) -> Self {
        Self {
            target: DragTarget::Link { from },
            pointer_start: pointer,
            pointer_last: pointer,
        }
    }

    pub fn link_source(&self) -> Option<NodeId> {
        match self.target {
            DragTarget::Link { from } => Some(from),
            _ => None,
        }
    }

    pub fn track(&mut self, pointer: Pos2) {
        self.pointer_last = pointer;
    }

    pub fn pointer_last(&self) -> Pos2 {
        self.pointer_last
    }

    /// Live camera offset while panning.
    pub fn pan_offset(&self) -> Option<Vec2> {
        match self.target {
            DragTarget::Canvas { origin } => {
                Some(origin + (self.pointer_last - self.pointer_start))
            }
            _ => None,
        }
    }

    /// Provisional world position of the dragged node; the graph itself is
    /// only mutated on release.
    pub fn node_preview(&self, zoom: f32) -> Option<(NodeId, Pos2)> {
        match self.target {
            DragTarget::Node { id, origin } => {
                let delta = (self.pointer_last - self.pointer_start) / zoom;
                Some((id, origin + delta))
            }
            _ => None,
        }
    }

    pub fn finish(self, pointer: Pos2, zoom: f32, drop_target: Option<NodeId>) -> DragOutcome {
        let delta = pointer - self.pointer_start;
        match self.target {
            DragTarget::Node { id, origin } => {
                if delta.x.abs() < CLICK_TOLERANCE && delta.y.abs() < CLICK_TOLERANCE {
                    DragOutcome::Click(id)
                } else {
                    DragOutcome::Moved {
                        id,
                        x: origin.x + delta.x / zoom,
                        y: origin.y + delta.y / zoom,
                    }
                }
            }
            DragTarget::Canvas { .. } => DragOutcome::Panned,
            DragTarget::Link { from } => match drop_target {
                Some(to) => DragOutcome::Connect { from, to },
                None => DragOutcome::Cancelled,
            },
        }
    }
}
