use std::time::Duration;

use meshlink_proto::{Channel, Config, FromRadio, ModuleConfig, NodeInfo};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

/// Nonce asking the radio for its own node only, skipping the node database.
pub const SPECIAL_NONCE: u32 = 69420;

const MAX_NONCE: u32 = 0x7FFF_FFFF;

/// State of a node report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeReportProgress {
    NotStarted,
    InProgress,
    Complete,
    Failed,
}

impl NodeReportProgress {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// One node from the radio's database, flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub num: u32,
    /// This is the node the client is attached to.
    pub is_mine: bool,
    /// Unix time the node was last heard from.
    pub last_heard: u32,
    pub user_id: String,
    pub long_name: String,
    pub short_name: String,
    pub hw_model: i32,
    /// Degrees.
    pub latitude: Option<f64>,
    /// Degrees.
    pub longitude: Option<f64>,
    /// Meters.
    pub altitude: Option<i32>,
    pub battery_level: Option<u32>,
    pub voltage: Option<f32>,
    pub channel_utilization: Option<f32>,
    pub air_util_tx: Option<f32>,
    pub snr: f32,
    pub hops_away: Option<u32>,
}

impl NodeRecord {
    pub fn from_info(info: &NodeInfo, my_node_num: Option<u32>) -> Self {
        let user = info.user.clone().unwrap_or_default();
        let position = info.position.unwrap_or_default();
        let metrics = info.device_metrics.unwrap_or_default();
        Self {
            num: info.num,
            is_mine: my_node_num == Some(info.num),
            last_heard: info.last_heard,
            user_id: user.id,
            long_name: user.long_name,
            short_name: user.short_name,
            hw_model: user.hw_model,
            latitude: position.latitude_i.map(|v| f64::from(v) * 1e-7),
            longitude: position.longitude_i.map(|v| f64::from(v) * 1e-7),
            altitude: position.altitude,
            battery_level: metrics.battery_level,
            voltage: metrics.voltage,
            channel_utilization: metrics.channel_utilization,
            air_util_tx: metrics.air_util_tx,
            snr: info.snr,
            hops_away: info.hops_away,
        }
    }
}

/// A record streamed back in response to a node report request.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRecord {
    Node(NodeRecord),
    Config(Config),
    ModuleConfig(ModuleConfig),
    Channel(Channel),
}

/// Called with each record (`Some`, [`InProgress`](NodeReportProgress::InProgress))
/// and once more with `None` when the report finishes.
pub type NodeReportHandler = Box<dyn FnMut(Option<&ReportRecord>, NodeReportProgress)>;

/// Extracts the nonce from an envelope that ends a node report.
pub type TerminalPredicate = Box<dyn Fn(&FromRadio) -> Option<u32>>;

/// Pick a random request nonce in `[1, 2^31 - 1]`, never [`SPECIAL_NONCE`].
pub fn generate_nonce<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    loop {
        let nonce = rng.gen_range(1..=MAX_NONCE);
        if nonce != SPECIAL_NONCE {
            return nonce;
        }
    }
}

struct ActiveReport {
    nonce: u32,
    handler: NodeReportHandler,
    records: usize,
    last_record_at: Duration,
}

/// Tracks the outstanding node report request.
///
/// Only one request is tracked at a time. Starting a new one finishes the
/// previous request as failed.
pub struct NodeReportTracker {
    active: Option<ActiveReport>,
    last_finished: Option<(u32, NodeReportProgress)>,
    terminal: TerminalPredicate,
    stall_timeout: Option<Duration>,
}

impl NodeReportTracker {
    pub fn new(stall_timeout: Option<Duration>) -> Self {
        Self {
            active: None,
            last_finished: None,
            terminal: Box::new(FromRadio::config_complete_id),
            stall_timeout,
        }
    }

    /// Replace the rule that recognizes the end of a report.
    pub fn set_terminal_predicate<F>(&mut self, predicate: F)
    where
        F: Fn(&FromRadio) -> Option<u32> + 'static,
    {
        self.terminal = Box::new(predicate);
    }

    /// Nonce of the request in progress.
    pub fn active_nonce(&self) -> Option<u32> {
        self.active.as_ref().map(|report| report.nonce)
    }

    /// Progress of the request identified by `nonce`.
    pub fn progress(&self, nonce: u32) -> NodeReportProgress {
        if self.active_nonce() == Some(nonce) {
            return NodeReportProgress::InProgress;
        }
        match self.last_finished {
            Some((finished, progress)) if finished == nonce => progress,
            _ => NodeReportProgress::NotStarted,
        }
    }

    /// Start tracking `nonce` once its request has been sent.
    pub fn begin(&mut self, nonce: u32, handler: NodeReportHandler, now: Duration) {
        if let Some(previous) = self.active.take() {
            debug!(nonce = previous.nonce, "node report superseded");
            self.finish(previous, NodeReportProgress::Failed);
        }
        debug!(nonce, "node report in progress");
        self.active = Some(ActiveReport {
            nonce,
            handler,
            records: 0,
            last_record_at: now,
        });
    }

    /// Nonce carried by `msg` if it ends a report.
    pub fn terminal_nonce(&self, msg: &FromRadio) -> Option<u32> {
        (self.terminal)(msg)
    }

    /// Forward a record to the active handler. Returns whether it was forwarded.
    pub fn on_record(&mut self, record: &ReportRecord, now: Duration) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        active.records += 1;
        active.last_record_at = now;
        (active.handler)(Some(record), NodeReportProgress::InProgress);
        true
    }

    /// Handle a terminal marker. Returns whether it completed the active request.
    pub fn on_terminal(&mut self, nonce: u32) -> bool {
        match self.active.take() {
            Some(active) if active.nonce == nonce => {
                info!(nonce, records = active.records, "node report complete");
                self.finish(active, NodeReportProgress::Complete);
                true
            }
            other => {
                debug!(nonce, "ignoring terminal marker for unknown request");
                self.active = other;
                false
            }
        }
    }

    /// Finish a request that has gone quiet for longer than the stall timeout.
    ///
    /// A report that delivered records is treated as complete; one that
    /// delivered nothing has failed.
    pub fn check_stall(&mut self, now: Duration) -> Option<NodeReportProgress> {
        let timeout = self.stall_timeout?;
        let stalled = self
            .active
            .as_ref()
            .is_some_and(|active| now.saturating_sub(active.last_record_at) >= timeout);
        if !stalled {
            return None;
        }
        let active = self.active.take()?;
        let outcome = if active.records > 0 {
            NodeReportProgress::Complete
        } else {
            NodeReportProgress::Failed
        };
        info!(nonce = active.nonce, records = active.records, ?outcome, "node report stalled");
        self.finish(active, outcome);
        Some(outcome)
    }

    /// Abandon the active request, if any.
    pub fn fail_active(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(nonce = active.nonce, "node report failed");
            self.finish(active, NodeReportProgress::Failed);
        }
    }

    fn finish(&mut self, mut report: ActiveReport, outcome: NodeReportProgress) {
        (report.handler)(None, outcome);
        self.last_finished = Some((report.nonce, outcome));
    }
}

impl std::fmt::Debug for NodeReportTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeReportTracker")
            .field("active_nonce", &self.active_nonce())
            .field("last_finished", &self.last_finished)
            .field("stall_timeout", &self.stall_timeout)
            .finish()
    }
}
