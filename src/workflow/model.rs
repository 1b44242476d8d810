use serde::{Deserialize, Serialize};

pub const NODE_WIDTH: f32 = 150.0;
pub const NODE_HEIGHT: f32 = 80.0;
pub const GROUP_COLOR_COUNT: usize = 4;

const PLACEMENT_STRIDE: f32 = 250.0;
const PLACEMENT_CLEARANCE_X: f32 = 200.0;
const PLACEMENT_CLEARANCE_Y: f32 = 150.0;

const COORDINATOR_LABEL: &str = "Task Coordinator";
const COORDINATOR_PROMPT: &str = "You are a task coordinator. Your task is to delegate work to \
                                  connected nodes and combine their responses.";
const COORDINATOR_TEMPERATURE: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Coordinator,
    Worker,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub target: NodeId,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub label: String,
    pub role: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub connections: Vec<Connection>,
    pub output: Option<String>,
    pub is_processing: bool,
    pub failure: Option<String>,
    pub group_id: NodeId,
    pub color_index: usize,
}

impl Node {
    pub fn center(&self) -> (f32, f32) {
        (self.x + NODE_WIDTH / 2.0, self.y + NODE_HEIGHT / 2.0)
    }

    pub fn connects_to(&self, target: NodeId) -> bool {
        self.connections
            .iter()
            .any(|connection| connection.target == target)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SettingsPatch {
    pub system_prompt: String,
    pub temperature: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    used_colors: Vec<usize>,
    next_id: u64,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.nodes.iter().map(|node| node.connections.len()).sum()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    fn alloc_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    fn next_color_index(&self) -> usize {
        (0..GROUP_COLOR_COUNT)
            .find(|index| !self.used_colors.contains(index))
            // palette exhausted: degrade to reuse instead of failing
            .unwrap_or(self.used_colors.len() % GROUP_COLOR_COUNT)
    }

    /// Places a new coordinator near the viewport center, stepping right in
    /// fixed strides until the spot is clear of every existing node.
    pub fn add_coordinator(&mut self, view_center: (f32, f32)) -> NodeId {
        let base_x = view_center.0 - NODE_WIDTH / 2.0;
        let base_y = view_center.1 - NODE_HEIGHT / 2.0;

        let mut offset = 0.0;
        while self.nodes.iter().any(|node| {
            (node.x - (base_x + offset)).abs() < PLACEMENT_CLEARANCE_X
                && (node.y - base_y).abs() < PLACEMENT_CLEARANCE_Y
        }) {
            offset += PLACEMENT_STRIDE;
        }

        let color_index = self.next_color_index();
        self.used_colors.push(color_index);

        let id = self.alloc_id();
        self.nodes.push(Node {
            id,
            kind: NodeKind::Coordinator,
            x: (base_x + offset).round(),
            y: base_y.round(),
            label: COORDINATOR_LABEL.to_owned(),
            role: "coordinator".to_owned(),
            system_prompt: COORDINATOR_PROMPT.to_owned(),
            temperature: COORDINATOR_TEMPERATURE,
            connections: Vec::new(),
            output: None,
            is_processing: false,
            failure: None,
            group_id: id,
            color_index,
        });
        id
    }

    /// Spawns a worker belonging to `coordinator`'s group at the given world
    /// position. No-op when the coordinator id does not resolve.
    pub fn add_worker(
        &mut self,
        coordinator: NodeId,
        label: &str,
        role: &str,
        system_prompt: &str,
        temperature: f32,
        x: f32,
        y: f32,
    ) -> Option<NodeId> {
        let (group_id, color_index) = {
            let owner = self.node(coordinator)?;
            (owner.group_id, owner.color_index)
        };

        let id = self.alloc_id();
        self.nodes.push(Node {
            id,
            kind: NodeKind::Worker,
            x: x.round(),
            y: y.round(),
            label: label.to_owned(),
            role: role.to_owned(),
            system_prompt: system_prompt.to_owned(),
            temperature,
            connections: Vec::new(),
            output: None,
            is_processing: false,
            failure: None,
            group_id,
            color_index,
        });
        Some(id)
    }

    /// Adds a directed edge. Self-loops, duplicates and dangling endpoints
    /// leave the graph unchanged.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            log::warn!("rejected self-connection on {from}");
            return false;
        }
        if self.node(to).is_none() {
            log::warn!("rejected connection {from} -> {to}: target does not exist");
            return false;
        }
        let Some(source) = self.node_mut(from) else {
            log::warn!("rejected connection {from} -> {to}: source does not exist");
            return false;
        };
        if source.connects_to(to) {
            log::warn!("rejected connection {from} -> {to}: edge already exists");
            return false;
        }

        source.connections.push(Connection {
            target: to,
            active: false,
        });
        true
    }

    /// Rounds to whole world units so repeated float deltas cannot drift.
    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) {
        if let Some(node) = self.node_mut(id) {
            node.x = x.round();
            node.y = y.round();
        }
    }

    pub fn set_connection_active(&mut self, from: NodeId, to: NodeId, active: bool) {
        if let Some(source) = self.node_mut(from)
            && let Some(connection) = source
                .connections
                .iter_mut()
                .find(|connection| connection.target == to)
        {
            connection.active = active;
        }
    }

    pub fn apply_settings(&mut self, id: NodeId, patch: SettingsPatch) {
        if let Some(node) = self.node_mut(id) {
            node.system_prompt = patch.system_prompt;
            node.temperature = patch.temperature;
        }
    }

    pub fn update_node(&mut self, id: NodeId, apply: impl FnOnce(&mut Node)) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                apply(node);
                true
            }
            None => false,
        }
    }
}
