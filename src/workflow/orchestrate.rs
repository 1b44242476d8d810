use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Result;

use super::comms::CommunicationLog;
use super::model::{NodeId, WorkflowGraph};
use super::spread::{SpreadAnimation, worker_targets};
use crate::util::stable_index;

pub const WORKER_TEMPERATURE: f32 = 0.8;

pub struct Persona {
    pub label: &'static str,
    pub role: &'static str,
    pub system_prompt: &'static str,
}

pub const WORKER_PERSONAS: [Persona; 3] = [
    Persona {
        label: "Nature Poet",
        role: "poet",
        system_prompt: "You are a poet specializing in nature imagery. Create verses that \
                        incorporate natural elements and metaphors.",
    },
    Persona {
        label: "Emotion Poet",
        role: "poet",
        system_prompt: "You are a poet focusing on emotional depth. Create verses that explore \
                        feelings and human experience.",
    },
    Persona {
        label: "Abstract Poet",
        role: "poet",
        system_prompt: "You are a poet crafting abstract concepts. Create verses that blend \
                        philosophical and metaphysical elements.",
    },
];

/// Content generation boundary. The built-in generator is deterministic;
/// a real model client can be substituted as long as it returns within the
/// worker's processing window.
pub trait Generator: Send + Sync {
    fn generate(&self, persona_label: &str, system_prompt: &str, topic: &str) -> Result<String>;
}

/// Deterministic verse construction keyed by persona and topic, with an
/// optional artificial latency so the processing states are visible.
pub struct VerseGenerator {
    latency: Duration,
}

impl VerseGenerator {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Generator for VerseGenerator {
    fn generate(&self, persona_label: &str, _system_prompt: &str, topic: &str) -> Result<String> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        Ok(verse_for(persona_label, topic))
    }
}

fn verse_for(persona_label: &str, topic: &str) -> String {
    let lower = topic.to_ascii_lowercase();
    let variant = stable_index(topic, 2);

    match persona_label {
        "Nature Poet" => {
            if variant == 0 {
                if lower.contains("cake") {
                    format!(
                        "Sweet {topic} rises like morning dew,\nIn garden's warmth, a flavor \
                         new.\nThrough layers rich with nature's grace,\nA treat that time \
                         cannot erase."
                    )
                } else {
                    format!(
                        "In {topic}'s dance with morning light,\nNature weaves a tapestry \
                         bright.\nThrough meadow, stream, and forest deep,\nWild wonders start \
                         to softly leap."
                    )
                }
            } else if lower.contains("space") {
                format!(
                    "Among the stars where {topic} roam,\nCelestial gardens make their \
                     home.\nIn cosmic winds that gently sway,\nStardust paints the Milky Way."
                )
            } else {
                format!(
                    "The {topic} blooms in spring's embrace,\nLike wildflowers finding their \
                     place.\nIn mountain streams and valley floors,\nNature opens endless doors."
                )
            }
        }
        "Emotion Poet" => {
            if variant == 0 {
                if lower.contains("cake") {
                    format!(
                        "Each slice of {topic} brings delight,\nJoy bubbles up, pure and \
                         bright.\nIn memories sweet of childhood days,\nLaughter echoes in \
                         countless ways."
                    )
                } else {
                    format!(
                        "Deep within where {topic} dwells,\nEmotions rise like ocean \
                         swells.\nThrough storms of doubt and seas of change,\nFeelings flow in \
                         endless range."
                    )
                }
            } else if lower.contains("space") {
                format!(
                    "The {topic} fill our hearts with awe,\nWonder pure without a flaw.\nIn \
                     dreams that reach beyond Earth's sphere,\nHope conquers every mortal fear."
                )
            } else {
                format!(
                    "When {topic} touches tender hearts,\nA thousand feelings freshly \
                     start.\nIn depths of love and heights of peace,\nSoul's expression finds \
                     release."
                )
            }
        }
        "Abstract Poet" => {
            if variant == 0 {
                if lower.contains("cake") {
                    format!(
                        "Beyond the realm of {topic}'s form,\nTranscendent flavors break the \
                         norm.\nIn quantum taste and time's sweet flow,\nExistence's layers \
                         start to show."
                    )
                } else {
                    format!(
                        "The {topic} transcends our mortal plane,\nWhere thought and form are \
                         split in twain.\nThrough metaphysical design,\nReality's borders \
                         intertwine."
                    )
                }
            } else if lower.contains("space") {
                format!(
                    "Where {topic} bend dimensions thin,\nParadox and truth begin.\nIn cosmic \
                     dance of now and then,\nInfinity loops back again."
                )
            } else {
                format!(
                    "Through {topic}'s abstract paradigm,\nConsciousness weaves space and \
                     time.\nIn patterns none can comprehend,\nBeginning circles back to end."
                )
            }
        }
        _ => format!("A verse about {topic}."),
    }
}

pub fn combine_outputs(theme: &str, verses: &[String]) -> String {
    format!(
        "\u{2728} Poem Complete! \u{2728}\n\nTheme: \"{theme}\"\n\n{}",
        verses.join("\n\n")
    )
}

#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    Combined(String),
    Failed(String),
}

/// Fan-in barrier for one coordinator's delegation. Workers report in any
/// order; the combined output always follows creation order.
#[derive(Debug)]
pub struct DelegationRun {
    coordinator: NodeId,
    workers: Vec<NodeId>,
    outcomes: HashMap<NodeId, Result<String, String>>,
}

impl DelegationRun {
    pub fn new(coordinator: NodeId, workers: Vec<NodeId>) -> Self {
        Self {
            coordinator,
            workers,
            outcomes: HashMap::new(),
        }
    }

    pub fn owns_worker(&self, worker: NodeId) -> bool {
        self.workers.contains(&worker)
    }

    pub fn record(&mut self, worker: NodeId, result: Result<String, String>) {
        if self.owns_worker(worker) {
            self.outcomes.insert(worker, result);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.workers
            .iter()
            .all(|worker| self.outcomes.contains_key(worker))
    }

    /// `None` until every worker has resolved; no partial combines.
    pub fn outcome(&self, theme: &str) -> Option<RunOutcome> {
        if !self.is_complete() {
            return None;
        }

        for worker in &self.workers {
            if let Some(Err(message)) = self.outcomes.get(worker) {
                return Some(RunOutcome::Failed(message.clone()));
            }
        }

        let verses: Vec<String> = self
            .workers
            .iter()
            .filter_map(|worker| self.outcomes.get(worker))
            .filter_map(|result| result.as_ref().ok().cloned())
            .collect();
        Some(RunOutcome::Combined(combine_outputs(theme, &verses)))
    }
}

#[derive(Debug)]
pub struct WorkerEvent {
    pub worker: NodeId,
    pub result: Result<String, String>,
}

/// Drives coordinator workflows: fan-out on topic submission, worker threads
/// reporting over a channel, fan-in drained from the frame loop. All graph
/// mutation happens on the caller's thread.
pub struct Orchestrator {
    generator: Arc<dyn Generator>,
    runs: Vec<DelegationRun>,
    tx: Sender<WorkerEvent>,
    rx: Receiver<WorkerEvent>,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            generator,
            runs: Vec::new(),
            tx,
            rx,
        }
    }

    pub fn is_running(&self, coordinator: NodeId) -> bool {
        self.runs.iter().any(|run| run.coordinator == coordinator)
    }

    pub fn has_active_runs(&self) -> bool {
        !self.runs.is_empty()
    }

    /// Starts delegation for a coordinator: spawns the persona workers at the
    /// coordinator's anchor, wires and highlights the connections, emits the
    /// delegation pulses, and kicks off one generation thread per worker.
    /// Returns the spread animation toward the workers' circle positions.
    pub fn begin(
        &mut self,
        graph: &mut WorkflowGraph,
        comms: &mut CommunicationLog,
        coordinator: NodeId,
        topic: &str,
        now: f64,
    ) -> Option<SpreadAnimation> {
        let topic = topic.trim();
        if topic.is_empty() {
            return None;
        }

        let Some(node) = graph.node(coordinator) else {
            log::warn!("topic submitted for missing coordinator {coordinator}");
            return None;
        };
        if node.is_processing || node.output.is_some() || self.is_running(coordinator) {
            log::debug!("ignoring re-submission on coordinator {coordinator}");
            return None;
        }

        let center = (node.x, node.y);
        graph.update_node(coordinator, |node| {
            node.label = format!("Topic: {topic}");
            node.is_processing = true;
            node.failure = None;
        });

        let targets = worker_targets(center, WORKER_PERSONAS.len());
        let mut workers = Vec::with_capacity(WORKER_PERSONAS.len());
        let mut animated = Vec::with_capacity(WORKER_PERSONAS.len());

        for (persona, target) in WORKER_PERSONAS.iter().zip(targets) {
            let Some(worker) = graph.add_worker(
                coordinator,
                persona.label,
                persona.role,
                persona.system_prompt,
                WORKER_TEMPERATURE,
                center.0,
                center.1,
            ) else {
                continue;
            };

            graph.add_connection(coordinator, worker);
            graph.set_connection_active(coordinator, worker, true);
            graph.update_node(worker, |node| node.is_processing = true);
            comms.push(coordinator, worker, now);
            comms.push(worker, coordinator, now);

            let generator = Arc::clone(&self.generator);
            let tx = self.tx.clone();
            let persona_label = persona.label.to_owned();
            let system_prompt = persona.system_prompt.to_owned();
            let topic = topic.to_owned();
            thread::spawn(move || {
                let result = generator
                    .generate(&persona_label, &system_prompt, &topic)
                    .map_err(|error| error.to_string());
                let _ = tx.send(WorkerEvent { worker, result });
            });

            workers.push(worker);
            animated.push((worker, target));
        }

        self.runs.push(DelegationRun::new(coordinator, workers));
        Some(SpreadAnimation::new(now, animated))
    }

    /// Drains worker completions and settles any run whose barrier is full.
    /// Returns whether anything changed.
    pub fn pump(
        &mut self,
        graph: &mut WorkflowGraph,
        comms: &mut CommunicationLog,
        now: f64,
    ) -> bool {
        let mut progressed = false;

        while let Ok(event) = self.rx.try_recv() {
            let Some(run) = self
                .runs
                .iter_mut()
                .find(|run| run.owns_worker(event.worker))
            else {
                continue;
            };
            progressed = true;
            let coordinator = run.coordinator;

            match &event.result {
                Ok(text) => {
                    let text = text.clone();
                    graph.update_node(event.worker, |node| {
                        node.is_processing = false;
                        node.output = Some(text);
                    });
                }
                Err(message) => {
                    let message = message.clone();
                    graph.update_node(event.worker, |node| {
                        node.is_processing = false;
                        node.failure = Some(message);
                    });
                }
            }
            comms.push(event.worker, coordinator, now);
            graph.set_connection_active(coordinator, event.worker, false);
            run.record(event.worker, event.result);
        }

        let mut index = 0;
        while index < self.runs.len() {
            if !self.runs[index].is_complete() {
                index += 1;
                continue;
            }

            let run = self.runs.remove(index);
            progressed = true;
            let coordinator = run.coordinator;
            let theme = graph
                .node(coordinator)
                .map(|node| node.label.clone())
                .unwrap_or_default();

            match run.outcome(&theme) {
                Some(RunOutcome::Combined(text)) => {
                    graph.update_node(coordinator, |node| {
                        node.output = Some(text);
                        node.is_processing = false;
                    });
                }
                Some(RunOutcome::Failed(message)) => {
                    log::warn!("delegation for {coordinator} failed: {message}");
                    graph.update_node(coordinator, |node| {
                        node.is_processing = false;
                        node.failure = Some(message);
                    });
                }
                None => {}
            }
        }

        progressed
    }
}
