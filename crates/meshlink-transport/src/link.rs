use std::fmt;

use tracing::debug;

/// Status of the network interface underneath a TCP radio stream.
///
/// The numeric codes follow the convention used by embedded WiFi stacks,
/// which lets links that only expose a raw status byte use
/// [`LinkStatus::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// No network hardware is present. There is no recovery from this.
    HardwareAbsent,
    /// The interface is up but not associated.
    Idle,
    /// The last association attempt failed.
    ConnectFailed,
    /// An established association was lost.
    ConnectionLost,
    /// Associated and ready for traffic.
    Connected,
    /// Explicitly disconnected.
    Disconnected,
    /// A status code this client does not understand.
    Unknown(u8),
}

impl LinkStatus {
    /// Map a raw status code to a [`LinkStatus`].
    pub fn from_code(code: u8) -> Self {
        match code {
            255 => Self::HardwareAbsent,
            0 => Self::Idle,
            3 => Self::Connected,
            4 => Self::ConnectFailed,
            5 => Self::ConnectionLost,
            6 => Self::Disconnected,
            other => Self::Unknown(other),
        }
    }

    /// The raw status code.
    pub fn code(self) -> u8 {
        match self {
            Self::HardwareAbsent => 255,
            Self::Idle => 0,
            Self::Connected => 3,
            Self::ConnectFailed => 4,
            Self::ConnectionLost => 5,
            Self::Disconnected => 6,
            Self::Unknown(code) => code,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareAbsent => f.write_str("hardware-absent"),
            Self::Idle => f.write_str("idle"),
            Self::ConnectFailed => f.write_str("connect-failed"),
            Self::ConnectionLost => f.write_str("connection-lost"),
            Self::Connected => f.write_str("connected"),
            Self::Disconnected => f.write_str("disconnected"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

/// Network credentials handed to [`NetworkLink::begin`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Network name.
    pub ssid: String,
    /// Optional passphrase. Never logged.
    pub password: Option<String>,
}

impl Credentials {
    /// Credentials for an open network.
    pub fn open(ssid: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: None,
        }
    }

    /// Credentials for a protected network.
    pub fn with_password(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: Some(password.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Credentials");
        dbg.field("ssid", &self.ssid);
        if let Some(password) = &self.password {
            dbg.field(
                "password",
                &format_args!("<redacted:{} bytes>", password.len()),
            );
        } else {
            dbg.field("password", &Option::<String>::None);
        }
        dbg.finish()
    }
}

/// The network interface a TCP radio stream rides on.
pub trait NetworkLink {
    /// Current interface status.
    fn status(&mut self) -> LinkStatus;

    /// Start associating with a network. Must not block.
    fn begin(&mut self, credentials: Option<&Credentials>);
}

impl<T: NetworkLink + ?Sized> NetworkLink for Box<T> {
    fn status(&mut self) -> LinkStatus {
        (**self).status()
    }

    fn begin(&mut self, credentials: Option<&Credentials>) {
        (**self).begin(credentials)
    }
}

/// A host whose operating system manages networking.
///
/// Always reports [`LinkStatus::Connected`]; association requests are
/// logged and otherwise ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostNetwork;

impl NetworkLink for HostNetwork {
    fn status(&mut self) -> LinkStatus {
        LinkStatus::Connected
    }

    fn begin(&mut self, credentials: Option<&Credentials>) {
        match credentials {
            Some(creds) => debug!(ssid = %creds.ssid, "host network manages association"),
            None => debug!("host network manages association"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_roundtrip() {
        for status in [
            LinkStatus::HardwareAbsent,
            LinkStatus::Idle,
            LinkStatus::ConnectFailed,
            LinkStatus::ConnectionLost,
            LinkStatus::Connected,
            LinkStatus::Disconnected,
        ] {
            assert_eq!(LinkStatus::from_code(status.code()), status);
        }
    }

    #[test]
    fn unlisted_codes_are_unknown() {
        assert_eq!(LinkStatus::from_code(1), LinkStatus::Unknown(1));
        assert_eq!(LinkStatus::from_code(2), LinkStatus::Unknown(2));
        assert_eq!(LinkStatus::from_code(42).to_string(), "unknown(42)");
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::with_password("meshnet", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("meshnet"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted:7 bytes>"));
    }

    #[test]
    fn host_network_is_always_connected() {
        let mut link = HostNetwork;
        link.begin(Some(&Credentials::open("any")));
        assert_eq!(link.status(), LinkStatus::Connected);
    }
}
