use std::time::Duration;

use meshlink_frame::{write_frame, FrameError};
use meshlink_transport::{Credentials, LinkStatus, NetworkLink, RadioStream};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::FatalError;

/// Lifecycle of the application socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No attempt made yet.
    Idle,
    /// Network association requested; socket not yet open.
    Connecting,
    /// Socket open; frames may be sent.
    Connected,
    /// Explicitly disconnected, or the socket was lost.
    Disconnected,
}

/// Drives the network link and TCP socket of a socket-mode client.
///
/// Each [`step`](Self::step) looks at the link status and acts only when it
/// differs from the status seen on the previous step. Crossing
/// `next_connect_attempt` forces a fresh evaluation as if the link had gone
/// idle, which doubles as the idle timeout once connected.
///
/// A fatal link status is latched: every later step returns the same error
/// without consulting the link again.
#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnectionState,
    last_status: Option<LinkStatus>,
    next_connect_attempt: Duration,
    can_send: bool,
    connect_timeout: Duration,
    idle_timeout: Duration,
    credentials: Option<Credentials>,
    fatal: Option<FatalError>,
}

impl ConnectionManager {
    pub fn new(config: &ClientConfig, credentials: Option<Credentials>) -> Self {
        Self {
            state: ConnectionState::Idle,
            last_status: None,
            next_connect_attempt: Duration::ZERO,
            can_send: false,
            connect_timeout: config.connect_timeout,
            idle_timeout: config.idle_timeout,
            credentials,
            fatal: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the last step left the socket usable.
    pub fn can_send(&self) -> bool {
        self.can_send
    }

    /// The fatal condition that stopped the manager, if any.
    pub fn fatal(&self) -> Option<FatalError> {
        self.fatal
    }

    /// When the next forced re-evaluation happens.
    pub fn next_connect_attempt(&self) -> Duration {
        self.next_connect_attempt
    }

    /// Run one step of the connection state machine at time `now`.
    ///
    /// Returns whether frames can be sent. Hardware-absent and unrecognized
    /// link statuses are fatal.
    pub fn step<L, S>(&mut self, now: Duration, link: &mut L, stream: &mut S) -> Result<bool, FatalError>
    where
        L: NetworkLink + ?Sized,
        S: RadioStream + ?Sized,
    {
        if let Some(fatal) = self.fatal {
            return Err(fatal);
        }

        let mut status = link.status();
        if now >= self.next_connect_attempt {
            self.last_status = None;
            status = LinkStatus::Idle;
        }

        if self.last_status == Some(status) {
            return Ok(self.can_send);
        }
        self.last_status = Some(status);

        if let Some(fatal) = FatalError::from_status(status) {
            error!(%status, "network link unusable");
            self.state = ConnectionState::Disconnected;
            self.can_send = false;
            self.fatal = Some(fatal);
            return Err(fatal);
        }

        match status {
            LinkStatus::Idle | LinkStatus::ConnectFailed | LinkStatus::ConnectionLost => {
                self.next_connect_attempt = now + self.connect_timeout;
                match &self.credentials {
                    Some(creds) => debug!(%status, ssid = %creds.ssid, "attempting network connect"),
                    None => debug!(%status, "attempting network connect without credentials"),
                }
                link.begin(self.credentials.as_ref());
                self.state = ConnectionState::Connecting;
                self.can_send = false;
            }
            LinkStatus::Connected => {
                self.next_connect_attempt = now + self.idle_timeout;
                self.open_socket(now, stream);
            }
            LinkStatus::Disconnected => {
                debug!("network link disconnected");
                self.state = ConnectionState::Disconnected;
                self.can_send = false;
            }
            // latched above
            LinkStatus::HardwareAbsent | LinkStatus::Unknown(_) => {}
        }
        Ok(self.can_send)
    }

    /// Received traffic keeps the idle deadline moving.
    pub fn note_activity(&mut self, now: Duration) {
        if self.state == ConnectionState::Connected {
            self.next_connect_attempt = now + self.idle_timeout;
        }
    }

    /// A send reopened the socket on its own.
    pub fn mark_connected(&mut self, now: Duration) {
        self.state = ConnectionState::Connected;
        self.can_send = true;
        self.next_connect_attempt = now + self.idle_timeout;
    }

    /// The socket was lost; the next step re-evaluates the link.
    pub fn mark_disconnected(&mut self) {
        if self.state != ConnectionState::Disconnected {
            info!("radio connection lost");
        }
        self.state = ConnectionState::Disconnected;
        self.can_send = false;
        self.last_status = None;
    }

    fn open_socket<S: RadioStream + ?Sized>(&mut self, now: Duration, stream: &mut S) {
        match stream.connect() {
            Ok(()) => {
                info!(transport = stream.transport_name(), "radio connection established");
                self.state = ConnectionState::Connected;
                self.can_send = true;
            }
            Err(err) => {
                warn!(error = %err, "failed to open radio connection");
                self.state = ConnectionState::Disconnected;
                self.can_send = false;
                self.next_connect_attempt = now + self.connect_timeout;
            }
        }
    }
}

/// Keeps a serial port open, retrying at the connect interval.
#[derive(Debug)]
pub struct SerialSession {
    next_open_attempt: Duration,
    retry_interval: Duration,
}

impl SerialSession {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            next_open_attempt: Duration::ZERO,
            retry_interval: config.connect_timeout,
        }
    }

    /// Open the port if it is closed and a retry is due. Returns whether
    /// frames can be sent.
    pub fn step<S: RadioStream + ?Sized>(&mut self, now: Duration, stream: &mut S) -> bool {
        if stream.is_connected() {
            return true;
        }
        if now < self.next_open_attempt {
            return false;
        }
        self.next_open_attempt = now + self.retry_interval;
        match stream.connect() {
            Ok(()) => {
                info!(transport = stream.transport_name(), "radio connection established");
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to open radio connection");
                false
            }
        }
    }

    /// Postpone the next open attempt after a failed recovery.
    pub fn mark_disconnected(&mut self, now: Duration) {
        self.next_open_attempt = now + self.retry_interval;
    }
}

/// How a frame reached the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written on the existing connection.
    Direct,
    /// Written after reopening the connection.
    Reconnected,
}

/// Write `frame`, reconnecting and retrying exactly once on failure.
///
/// A short write or write error closes the stream before the retry. When
/// the retry also fails the stream is left closed.
pub fn send_with_reconnect<S: RadioStream + ?Sized>(
    stream: &mut S,
    frame: &[u8],
) -> Result<Delivery, FrameError> {
    if stream.is_connected() {
        match write_frame(stream, frame) {
            Ok(()) => return Ok(Delivery::Direct),
            Err(err) => {
                warn!(error = %err, len = frame.len(), "send failed, reconnecting");
                stream.stop();
            }
        }
    } else {
        debug!("not connected, reconnecting before send");
    }

    let retried = stream
        .connect()
        .map_err(FrameError::from)
        .and_then(|()| write_frame(stream, frame));
    match retried {
        Ok(()) => Ok(Delivery::Reconnected),
        Err(err) => {
            warn!(error = %err, "send retry failed");
            stream.stop();
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use meshlink_transport::TransportError;

    use super::*;

    #[derive(Default)]
    struct FakeLink {
        statuses: VecDeque<LinkStatus>,
        current: Option<LinkStatus>,
        begins: usize,
    }

    impl FakeLink {
        fn fixed(status: LinkStatus) -> Self {
            Self {
                current: Some(status),
                ..Self::default()
            }
        }
    }

    impl NetworkLink for FakeLink {
        fn status(&mut self) -> LinkStatus {
            if let Some(next) = self.statuses.pop_front() {
                self.current = Some(next);
            }
            self.current.unwrap_or(LinkStatus::Idle)
        }

        fn begin(&mut self, _credentials: Option<&Credentials>) {
            self.begins += 1;
        }
    }

    #[derive(Default)]
    struct FakeStream {
        connected: bool,
        connects: usize,
        refuse_connect: bool,
        write_caps: VecDeque<usize>,
        written: Vec<u8>,
    }

    impl RadioStream for FakeStream {
        fn connect(&mut self) -> meshlink_transport::Result<()> {
            self.connects += 1;
            if self.refuse_connect {
                self.connected = false;
                return Err(TransportError::NotConnected);
            }
            self.connected = true;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn available(&mut self) -> meshlink_transport::Result<usize> {
            Ok(0)
        }

        fn read_byte(&mut self) -> meshlink_transport::Result<Option<u8>> {
            Ok(None)
        }

        fn write(&mut self, buf: &[u8]) -> meshlink_transport::Result<usize> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            let n = self.write_caps.pop_front().unwrap_or(buf.len()).min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn stop(&mut self) {
            self.connected = false;
        }

        fn transport_name(&self) -> &'static str {
            "fake"
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn manager() -> ConnectionManager {
        ConnectionManager::new(&ClientConfig::default(), Some(Credentials::open("mesh")))
    }

    #[test]
    fn first_step_starts_network_connect() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::Connected);
        let mut stream = FakeStream::default();

        assert!(!mgr.step(secs(0), &mut link, &mut stream).unwrap());
        assert_eq!(link.begins, 1);
        assert_eq!(stream.connects, 0);
        assert_eq!(mgr.state(), ConnectionState::Connecting);
        assert_eq!(mgr.next_connect_attempt(), secs(10));
    }

    #[test]
    fn connected_status_opens_socket_and_sets_idle_deadline() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::Connected);
        let mut stream = FakeStream::default();

        mgr.step(secs(0), &mut link, &mut stream).unwrap();
        assert!(mgr.step(secs(1), &mut link, &mut stream).unwrap());
        assert_eq!(stream.connects, 1);
        assert_eq!(mgr.state(), ConnectionState::Connected);
        assert_eq!(mgr.next_connect_attempt(), secs(66));
    }

    #[test]
    fn unchanged_status_makes_no_transport_calls() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::Connected);
        let mut stream = FakeStream::default();
        mgr.step(secs(0), &mut link, &mut stream).unwrap();
        mgr.step(secs(1), &mut link, &mut stream).unwrap();

        for t in 2..60 {
            assert!(mgr.step(secs(t), &mut link, &mut stream).unwrap());
        }
        assert_eq!(link.begins, 1);
        assert_eq!(stream.connects, 1);
    }

    #[test]
    fn idle_deadline_forces_reconnect() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::Connected);
        let mut stream = FakeStream::default();
        mgr.step(secs(0), &mut link, &mut stream).unwrap();
        mgr.step(secs(1), &mut link, &mut stream).unwrap();

        assert!(!mgr.step(secs(66), &mut link, &mut stream).unwrap());
        assert_eq!(link.begins, 2);
        assert!(mgr.step(secs(67), &mut link, &mut stream).unwrap());
        assert_eq!(stream.connects, 2);
    }

    #[test]
    fn activity_pushes_idle_deadline() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::Connected);
        let mut stream = FakeStream::default();
        mgr.step(secs(0), &mut link, &mut stream).unwrap();
        mgr.step(secs(1), &mut link, &mut stream).unwrap();

        mgr.note_activity(secs(50));
        assert!(mgr.step(secs(66), &mut link, &mut stream).unwrap());
        assert_eq!(link.begins, 1);
        assert_eq!(mgr.next_connect_attempt(), secs(115));
    }

    #[test]
    fn failed_and_lost_statuses_retry_on_interval() {
        let mut mgr = manager();
        let mut link = FakeLink::default();
        link.statuses.extend([LinkStatus::ConnectFailed, LinkStatus::ConnectionLost]);
        let mut stream = FakeStream::default();

        // First step is always forced to idle.
        assert!(!mgr.step(secs(0), &mut link, &mut stream).unwrap());
        assert!(!mgr.step(secs(1), &mut link, &mut stream).unwrap());
        assert_eq!(link.begins, 2);
        assert_eq!(mgr.next_connect_attempt(), secs(11));

        // Still lost: nothing happens until the retry deadline.
        assert!(!mgr.step(secs(5), &mut link, &mut stream).unwrap());
        assert_eq!(link.begins, 2);
        mgr.step(secs(11), &mut link, &mut stream).unwrap();
        assert_eq!(link.begins, 3);
    }

    #[test]
    fn explicit_disconnect_cannot_send() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::Disconnected);
        let mut stream = FakeStream::default();
        mgr.step(secs(0), &mut link, &mut stream).unwrap();

        assert!(!mgr.step(secs(1), &mut link, &mut stream).unwrap());
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert_eq!(link.begins, 1);
        assert_eq!(stream.connects, 0);
    }

    #[test]
    fn hardware_absent_is_fatal() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::HardwareAbsent);
        let mut stream = FakeStream::default();
        mgr.step(secs(0), &mut link, &mut stream).unwrap();

        let err = mgr.step(secs(1), &mut link, &mut stream).unwrap_err();
        assert_eq!(err, FatalError::HardwareAbsent);
    }

    #[test]
    fn unknown_status_is_fatal() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::Unknown(7));
        let mut stream = FakeStream::default();
        mgr.step(secs(0), &mut link, &mut stream).unwrap();

        let err = mgr.step(secs(1), &mut link, &mut stream).unwrap_err();
        assert_eq!(err, FatalError::UnknownStatus(7));
    }

    #[test]
    fn fatal_status_is_latched_past_connect_interval() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::HardwareAbsent);
        let mut stream = FakeStream::default();
        mgr.step(secs(0), &mut link, &mut stream).unwrap();
        mgr.step(secs(1), &mut link, &mut stream).unwrap_err();
        assert_eq!(link.begins, 1);

        // The link recovering does not clear the latch.
        link.current = Some(LinkStatus::Connected);
        for t in [2, 11, 20, 60] {
            let err = mgr.step(secs(t), &mut link, &mut stream).unwrap_err();
            assert_eq!(err, FatalError::HardwareAbsent);
        }
        assert_eq!(link.begins, 1);
        assert_eq!(stream.connects, 0);
        assert_eq!(mgr.fatal(), Some(FatalError::HardwareAbsent));
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert!(!mgr.can_send());
    }

    #[test]
    fn socket_open_failure_retries_after_connect_interval() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::Connected);
        let mut stream = FakeStream {
            refuse_connect: true,
            ..FakeStream::default()
        };
        mgr.step(secs(0), &mut link, &mut stream).unwrap();
        assert!(!mgr.step(secs(1), &mut link, &mut stream).unwrap());
        assert_eq!(mgr.next_connect_attempt(), secs(11));
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn mark_disconnected_forces_reevaluation() {
        let mut mgr = manager();
        let mut link = FakeLink::fixed(LinkStatus::Connected);
        let mut stream = FakeStream::default();
        mgr.step(secs(0), &mut link, &mut stream).unwrap();
        mgr.step(secs(1), &mut link, &mut stream).unwrap();

        stream.stop();
        mgr.mark_disconnected();
        assert!(!mgr.can_send());
        assert!(mgr.step(secs(2), &mut link, &mut stream).unwrap());
        assert_eq!(stream.connects, 2);
    }

    #[test]
    fn send_direct_when_connected() {
        let mut stream = FakeStream {
            connected: true,
            ..FakeStream::default()
        };
        let delivery = send_with_reconnect(&mut stream, &[1, 2, 3]).unwrap();
        assert_eq!(delivery, Delivery::Direct);
        assert_eq!(stream.connects, 0);
        assert_eq!(stream.written, vec![1, 2, 3]);
    }

    #[test]
    fn short_write_reconnects_and_retries_once() {
        let mut stream = FakeStream {
            connected: true,
            ..FakeStream::default()
        };
        stream.write_caps.push_back(1);

        let delivery = send_with_reconnect(&mut stream, &[1, 2, 3]).unwrap();
        assert_eq!(delivery, Delivery::Reconnected);
        assert_eq!(stream.connects, 1);
        assert_eq!(stream.written, vec![1, 1, 2, 3]);
    }

    #[test]
    fn second_failure_leaves_stream_closed() {
        let mut stream = FakeStream {
            connected: true,
            ..FakeStream::default()
        };
        stream.write_caps.extend([0, 2]);

        let err = send_with_reconnect(&mut stream, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, FrameError::ShortWrite { written: 2, expected: 3 }));
        assert!(!stream.is_connected());
        assert_eq!(stream.connects, 1);
    }

    #[test]
    fn disconnected_stream_reconnects_first() {
        let mut stream = FakeStream::default();
        let delivery = send_with_reconnect(&mut stream, &[9]).unwrap();
        assert_eq!(delivery, Delivery::Reconnected);
        assert_eq!(stream.written, vec![9]);
    }

    #[test]
    fn refused_reconnect_fails_send() {
        let mut stream = FakeStream {
            refuse_connect: true,
            ..FakeStream::default()
        };
        let err = send_with_reconnect(&mut stream, &[9]).unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::NotConnected)));
    }

    #[test]
    fn serial_session_retries_on_interval() {
        let mut session = SerialSession::new(&ClientConfig::default());
        let mut stream = FakeStream {
            refuse_connect: true,
            ..FakeStream::default()
        };

        assert!(!session.step(secs(0), &mut stream));
        assert!(!session.step(secs(5), &mut stream));
        assert_eq!(stream.connects, 1);

        stream.refuse_connect = false;
        assert!(session.step(secs(10), &mut stream));
        assert!(session.step(secs(11), &mut stream));
        assert_eq!(stream.connects, 2);
    }
}
