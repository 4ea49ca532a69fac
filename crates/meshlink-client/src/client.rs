use std::time::{Duration, Instant};

use meshlink_frame::{DecoderStats, FrameCodec, ReadSummary};
use meshlink_proto::{
    from_radio, mesh_packet, Data, FromRadio, MeshPacket, PortNum, ToRadio, MAX_DATA_PAYLOAD,
};
use meshlink_transport::{Credentials, HostNetwork, NetworkLink, RadioStream, TcpRadioStream};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::config::{ClientConfig, SocketConfig};
use crate::connection::{
    send_with_reconnect, ConnectionManager, ConnectionState, Delivery, SerialSession,
};
use crate::dispatch::{Handlers, PacketMeta};
use crate::error::{ClientError, FatalError, Result};
use crate::heartbeat::HeartbeatScheduler;
use crate::node_report::{
    generate_nonce, NodeRecord, NodeReportHandler, NodeReportProgress, NodeReportTracker,
    ReportRecord, SPECIAL_NONCE,
};

const MAX_PACKET_ID: u32 = 0x7FFF_FFFF;

/// How the client reaches the radio. Fixed for the life of a client.
pub enum Transport {
    /// A serial byte stream. The port is (re)opened by the client.
    Serial(Box<dyn RadioStream>),
    /// A TCP stream riding on a network link that has to be brought up first.
    Socket {
        stream: Box<dyn RadioStream>,
        network: Box<dyn NetworkLink>,
        credentials: Option<Credentials>,
    },
}

impl Transport {
    /// Serial transport for `config`.
    #[cfg(feature = "serial")]
    pub fn serial(config: &crate::config::SerialConfig) -> Self {
        Self::Serial(Box::new(meshlink_transport::SerialRadioStream::with_settings(
            config.path.clone(),
            config.baud_rate,
            config.timeout,
        )))
    }

    /// TCP transport on a host whose operating system manages networking.
    pub fn socket(config: SocketConfig) -> Self {
        Self::Socket {
            stream: Box::new(TcpRadioStream::with_timeout(
                config.endpoint,
                config.connect_timeout,
            )),
            network: Box::new(HostNetwork),
            credentials: config.credentials,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Serial(_) => "serial",
            Self::Socket { .. } => "socket",
        }
    }
}

enum Link {
    Serial(SerialSession),
    Socket {
        network: Box<dyn NetworkLink>,
        manager: ConnectionManager,
    },
}

/// What one poll step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Frames can be sent after this step.
    pub can_send: bool,
    /// Bytes consumed from the transport.
    pub bytes_read: usize,
    /// Envelopes decoded and dispatched.
    pub messages: usize,
}

impl PollOutcome {
    /// Nothing arrived; the host loop should back off before polling again.
    pub fn is_idle(&self) -> bool {
        self.bytes_read == 0
    }
}

/// Poll-driven client for a mesh radio.
///
/// All work happens inside [`poll`](Self::poll): the link is kept up,
/// heartbeats go out, and buffered bytes are decoded and handed to the
/// registered handlers. Nothing runs in the background.
///
/// Time is measured from construction. Sends made between polls are
/// stamped with the time of the most recent poll.
pub struct MeshClient {
    config: ClientConfig,
    stream: Box<dyn RadioStream>,
    link: Link,
    codec: FrameCodec<ToRadio, FromRadio>,
    heartbeat: HeartbeatScheduler,
    handlers: Handlers,
    node_report: NodeReportTracker,
    rng: StdRng,
    my_node_num: Option<u32>,
    can_send: bool,
    started: Instant,
    now: Duration,
}

impl MeshClient {
    pub fn new(transport: Transport, config: ClientConfig) -> Self {
        debug!(transport = transport.name(), "creating mesh client");
        let (stream, link) = match transport {
            Transport::Serial(stream) => (stream, Link::Serial(SerialSession::new(&config))),
            Transport::Socket {
                stream,
                network,
                credentials,
            } => (
                stream,
                Link::Socket {
                    network,
                    manager: ConnectionManager::new(&config, credentials),
                },
            ),
        };

        Self {
            heartbeat: HeartbeatScheduler::new(config.heartbeat_interval),
            node_report: NodeReportTracker::new(config.node_report_stall_timeout),
            config,
            stream,
            link,
            codec: FrameCodec::new(),
            handlers: Handlers::new(),
            rng: StdRng::from_entropy(),
            my_node_num: None,
            can_send: false,
            started: Instant::now(),
            now: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handler registry for inbound application packets.
    pub fn handlers_mut(&mut self) -> &mut Handlers {
        &mut self.handlers
    }

    /// Register the text message handler, replacing any previous one.
    pub fn on_text<F>(&mut self, handler: F)
    where
        F: FnMut(PacketMeta, &str) + 'static,
    {
        self.handlers.on_text(handler);
    }

    /// Register the decoded payload handler, replacing any previous one.
    pub fn on_port<F>(&mut self, handler: F)
    where
        F: FnMut(PacketMeta, PortNum, &[u8]) + 'static,
    {
        self.handlers.on_port(handler);
    }

    /// Register the encrypted payload handler, replacing any previous one.
    pub fn on_encrypted<F>(&mut self, handler: F)
    where
        F: FnMut(PacketMeta, &[u8], &[u8]) + 'static,
    {
        self.handlers.on_encrypted(handler);
    }

    /// Replace the rule that recognizes the end of a node report.
    pub fn set_node_report_terminal<F>(&mut self, predicate: F)
    where
        F: Fn(&FromRadio) -> Option<u32> + 'static,
    {
        self.node_report.set_terminal_predicate(predicate);
    }

    /// Node number of the attached radio, once it has identified itself.
    pub fn my_node_num(&self) -> Option<u32> {
        self.my_node_num
    }

    /// Whether the last poll step left the transport usable.
    pub fn can_send(&self) -> bool {
        self.can_send
    }

    /// Socket lifecycle state; `None` for serial transports.
    pub fn connection_state(&self) -> Option<ConnectionState> {
        match &self.link {
            Link::Socket { manager, .. } => Some(manager.state()),
            Link::Serial(_) => None,
        }
    }

    pub fn node_report_progress(&self, nonce: u32) -> NodeReportProgress {
        self.node_report.progress(nonce)
    }

    /// The fatal link condition that stopped this client, if any.
    pub fn fatal(&self) -> Option<FatalError> {
        match &self.link {
            Link::Socket { manager, .. } => manager.fatal(),
            Link::Serial(_) => None,
        }
    }

    /// Framing counters for received bytes.
    pub fn decoder_stats(&self) -> DecoderStats {
        self.codec.stats()
    }

    /// Run one poll step at the current time.
    pub fn poll(&mut self) -> Result<PollOutcome> {
        let now = self.started.elapsed();
        self.poll_at(now)
    }

    /// Run one poll step at `now`, measured from an arbitrary fixed origin.
    ///
    /// Only fatal link conditions are returned as errors. Transient
    /// transport failures are logged and retried on later steps.
    pub fn poll_at(&mut self, now: Duration) -> Result<PollOutcome> {
        self.now = now;
        let was_sendable = self.can_send;

        let stepped = match &mut self.link {
            Link::Socket { network, manager } => {
                manager.step(now, network.as_mut(), &mut self.stream)
            }
            Link::Serial(session) => Ok(session.step(now, &mut self.stream)),
        };
        self.can_send = match stepped {
            Ok(can_send) => can_send,
            Err(fatal) => {
                self.can_send = false;
                self.node_report.fail_active();
                return Err(fatal.into());
            }
        };
        if self.can_send && !was_sendable {
            self.codec.reset();
        }

        if self.can_send && self.heartbeat.is_due(now) {
            if let Err(err) = self.send_heartbeat() {
                warn!(error = %err, "heartbeat not sent");
            }
        }

        let mut inbox = Vec::new();
        let summary = self.read_inbound(&mut inbox);
        if summary.bytes > 0 {
            if let Link::Socket { manager, .. } = &mut self.link {
                manager.note_activity(now);
            }
        }
        if summary.closed {
            self.connection_lost();
        }

        let messages = inbox.len();
        for msg in inbox {
            self.handle(msg, now);
        }
        self.node_report.check_stall(now);

        Ok(PollOutcome {
            can_send: self.can_send,
            bytes_read: summary.bytes,
            messages,
        })
    }

    /// Send a text message. Returns the packet id.
    pub fn send_text(&mut self, text: &str, dest: u32, channel: u32) -> Result<u32> {
        self.send_data(PortNum::TextMessageApp, text.as_bytes(), dest, channel)
    }

    /// Send an application payload on `port`, requesting an acknowledgment.
    /// Returns the packet id.
    pub fn send_data(
        &mut self,
        port: PortNum,
        payload: &[u8],
        dest: u32,
        channel: u32,
    ) -> Result<u32> {
        if payload.len() > MAX_DATA_PAYLOAD {
            return Err(ClientError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_DATA_PAYLOAD,
            });
        }

        let id = self.rng.gen_range(1..=MAX_PACKET_ID);
        let packet = MeshPacket {
            to: dest,
            channel,
            id,
            want_ack: true,
            payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                portnum: port as i32,
                payload: payload.to_vec(),
                ..Data::default()
            })),
            ..MeshPacket::default()
        };
        debug!(id, dest, channel, ?port, len = payload.len(), "sending packet");
        self.send_envelope(&ToRadio::packet(packet))?;
        Ok(id)
    }

    /// Send a keepalive envelope now.
    pub fn send_heartbeat(&mut self) -> Result<()> {
        self.send_envelope(&ToRadio::heartbeat(0))?;
        trace!("heartbeat sent");
        self.heartbeat.record_sent(self.now);
        Ok(())
    }

    /// Ask the radio for its full node database. Returns the request nonce.
    ///
    /// `handler` is stored only if the request was sent. A request already
    /// in progress is finished as failed.
    pub fn request_node_report<F>(&mut self, handler: F) -> Result<u32>
    where
        F: FnMut(Option<&ReportRecord>, NodeReportProgress) + 'static,
    {
        let nonce = generate_nonce(&mut self.rng);
        self.start_node_report(nonce, Box::new(handler))
    }

    /// Ask the radio for its own node only.
    pub fn request_own_node_report<F>(&mut self, handler: F) -> Result<u32>
    where
        F: FnMut(Option<&ReportRecord>, NodeReportProgress) + 'static,
    {
        self.start_node_report(SPECIAL_NONCE, Box::new(handler))
    }

    /// Tell the radio the session is ending and close the transport.
    pub fn close(&mut self) {
        if self.stream.is_connected() {
            if let Err(err) = self.send_envelope(&ToRadio::disconnect()) {
                debug!(error = %err, "disconnect notice not sent");
            }
        }
        self.node_report.fail_active();
        self.stream.stop();
        self.connection_lost();
    }

    fn start_node_report(&mut self, nonce: u32, handler: NodeReportHandler) -> Result<u32> {
        debug!(nonce, "requesting node report");
        self.send_envelope(&ToRadio::want_config(nonce))?;
        self.node_report.begin(nonce, handler, self.now);
        Ok(nonce)
    }

    fn send_envelope(&mut self, msg: &ToRadio) -> Result<()> {
        if let Some(fatal) = self.fatal() {
            return Err(fatal.into());
        }
        let frame = self.codec.encode(msg)?;
        match send_with_reconnect(&mut self.stream, frame) {
            Ok(Delivery::Direct) => Ok(()),
            Ok(Delivery::Reconnected) => {
                if let Link::Socket { manager, .. } = &mut self.link {
                    manager.mark_connected(self.now);
                }
                self.codec.reset();
                self.can_send = true;
                Ok(())
            }
            Err(err) => {
                self.connection_lost();
                Err(ClientError::SendFailed(err))
            }
        }
    }

    fn read_inbound(&mut self, inbox: &mut Vec<FromRadio>) -> ReadSummary {
        if !self.stream.is_connected() {
            return ReadSummary::default();
        }
        let budget = self.config.max_read_per_poll;
        match self
            .codec
            .read_from(&mut self.stream, budget, |msg| inbox.push(msg))
        {
            Ok(summary) => summary,
            Err(err) => {
                warn!(error = %err, "read from radio failed");
                self.stream.stop();
                ReadSummary {
                    closed: true,
                    ..ReadSummary::default()
                }
            }
        }
    }

    fn connection_lost(&mut self) {
        match &mut self.link {
            Link::Socket { manager, .. } => manager.mark_disconnected(),
            Link::Serial(session) => session.mark_disconnected(self.now),
        }
        self.codec.reset();
        self.can_send = false;
    }

    fn handle(&mut self, msg: FromRadio, now: Duration) {
        if let Some(nonce) = self.node_report.terminal_nonce(&msg) {
            self.node_report.on_terminal(nonce);
            return;
        }

        let Some(variant) = msg.payload_variant else {
            trace!(id = msg.id, "empty envelope");
            return;
        };
        match variant {
            from_radio::PayloadVariant::Packet(packet) => {
                self.handlers.dispatch(&packet);
            }
            from_radio::PayloadVariant::MyInfo(info) => {
                info!(node = info.my_node_num, "radio identified");
                self.my_node_num = Some(info.my_node_num);
            }
            from_radio::PayloadVariant::NodeInfo(info) => {
                let record = NodeRecord::from_info(&info, self.my_node_num);
                self.node_report.on_record(&ReportRecord::Node(record), now);
            }
            from_radio::PayloadVariant::Config(config) => {
                self.node_report.on_record(&ReportRecord::Config(config), now);
            }
            from_radio::PayloadVariant::ModuleConfig(config) => {
                self.node_report
                    .on_record(&ReportRecord::ModuleConfig(config), now);
            }
            from_radio::PayloadVariant::Channel(channel) => {
                self.node_report.on_record(&ReportRecord::Channel(channel), now);
            }
            from_radio::PayloadVariant::LogRecord(record) => {
                debug!(
                    source = %record.source,
                    level = record.level,
                    "radio log: {}",
                    record.message
                );
            }
            from_radio::PayloadVariant::Rebooted(_) => {
                info!("radio rebooted");
            }
            from_radio::PayloadVariant::ConfigCompleteId(nonce) => {
                debug!(nonce, "config stream ended");
            }
            from_radio::PayloadVariant::QueueStatus(status) => {
                trace!(free = status.free, maxlen = status.maxlen, "radio queue status");
            }
            from_radio::PayloadVariant::Metadata(metadata) => {
                debug!(firmware = %metadata.firmware_version, "radio metadata");
            }
        }
    }
}

impl std::fmt::Debug for MeshClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshClient")
            .field("transport", &self.stream.transport_name())
            .field("connection_state", &self.connection_state())
            .field("can_send", &self.can_send)
            .field("my_node_num", &self.my_node_num)
            .field("handlers", &self.handlers)
            .field("node_report", &self.node_report)
            .finish()
    }
}
