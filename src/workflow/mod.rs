mod comms;
mod geometry;
mod interaction;
mod model;
mod orchestrate;
mod spread;

pub use comms::CommunicationLog;
pub use geometry::{Camera, connection_curve, node_rect};
pub use interaction::{DragOutcome, DragTracker, Intent};
pub use model::{
    GROUP_COLOR_COUNT, Node, NodeId, NodeKind, SettingsPatch, WorkflowGraph,
};
pub use orchestrate::{Generator, Orchestrator, VerseGenerator};
pub use spread::SpreadAnimation;
