use super::model::NodeId;

/// How long a communication pulse stays visible, independent of whether the
/// underlying task is still running.
pub const COMM_TTL_SECS: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Communication {
    pub from: NodeId,
    pub to: NodeId,
    pub created_at: f64,
}

impl Communication {
    /// 0 at creation, 1 at expiry; drives the traveling pulse.
    pub fn age01(&self, now: f64) -> f32 {
        (((now - self.created_at) / COMM_TTL_SECS).clamp(0.0, 1.0)) as f32
    }
}

/// Append-only log of in-flight message pulses, pruned against the frame
/// clock. Events expire independently in emission order.
#[derive(Clone, Debug, Default)]
pub struct CommunicationLog {
    events: Vec<Communication>,
}

impl CommunicationLog {
    pub fn push(&mut self, from: NodeId, to: NodeId, now: f64) {
        self.events.push(Communication {
            from,
            to,
            created_at: now,
        });
    }

    pub fn prune(&mut self, now: f64) {
        self.events
            .retain(|event| now - event.created_at < COMM_TTL_SECS);
    }

    pub fn live(&self) -> &[Communication] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
