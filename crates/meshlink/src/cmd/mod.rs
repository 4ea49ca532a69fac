use std::net::SocketAddr;
use std::time::{Duration, Instant};

use clap::{Args, Subcommand};
use meshlink_client::{ClientConfig, MeshClient, SocketConfig, Transport};
use meshlink_proto::BROADCAST_ADDR;
use tracing::info;

use crate::exit::{client_error, CliError, CliResult, TIMEOUT, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod nodes;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print messages received from the mesh.
    Listen(ListenArgs),
    /// Send a text message.
    Send(SendArgs),
    /// Ask the radio for its node database and print it.
    Nodes(NodesArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Nodes(args) => nodes::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// How to reach the radio. With neither flag, the radio's own access point
/// address is used.
#[derive(Args, Debug, Clone)]
pub struct TransportArgs {
    /// Serial device the radio is attached to.
    #[arg(long, env = "MESHLINK_SERIAL", value_name = "PATH", conflicts_with = "tcp")]
    pub serial: Option<String>,
    /// Radio network bridge address (e.g. 192.168.42.1:4403).
    #[arg(long, env = "MESHLINK_TCP", value_name = "ADDR")]
    pub tcp: Option<SocketAddr>,
    /// Serial baud rate.
    #[arg(long, env = "MESHLINK_BAUD", default_value_t = 115_200)]
    pub baud: u32,
}

impl TransportArgs {
    pub fn transport(&self) -> CliResult<Transport> {
        if let Some(path) = &self.serial {
            return serial_transport(path, self.baud);
        }
        let socket = match self.tcp {
            Some(endpoint) => SocketConfig::new(endpoint),
            None => SocketConfig::default(),
        };
        info!(endpoint = %socket.endpoint, "using tcp transport");
        Ok(Transport::socket(socket))
    }

    pub fn client(&self, config: ClientConfig) -> CliResult<MeshClient> {
        Ok(MeshClient::new(self.transport()?, config))
    }
}

#[cfg(feature = "serial")]
fn serial_transport(path: &str, baud: u32) -> CliResult<Transport> {
    let config = meshlink_client::SerialConfig {
        baud_rate: baud,
        ..meshlink_client::SerialConfig::new(path)
    };
    info!(path, baud, "using serial transport");
    Ok(Transport::serial(&config))
}

#[cfg(not(feature = "serial"))]
fn serial_transport(_path: &str, _baud: u32) -> CliResult<Transport> {
    Err(CliError::new(
        USAGE,
        "serial support not compiled in (enable the `serial` feature)",
    ))
}

/// Poll until the client can send, or fail after `timeout`.
pub fn wait_for_link(client: &mut MeshClient, timeout: Duration) -> CliResult<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let outcome = client
            .poll()
            .map_err(|err| client_error("radio link failed", err))?;
        if outcome.can_send {
            return Ok(());
        }
        if Instant::now() >= deadline {
            client.close();
            return Err(CliError::new(
                TIMEOUT,
                format!("radio link not up after {timeout:?}"),
            ));
        }
        std::thread::sleep(client.config().poll_backoff);
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub transport: TransportArgs,
    /// Only print messages on these channel indexes (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<u32>>,
    /// Only print text messages.
    #[arg(long)]
    pub text_only: bool,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub transport: TransportArgs,
    /// Message text.
    pub text: String,
    /// Destination node (`!deadbeef`, hex `0x...` or decimal). Default: broadcast.
    #[arg(long, short = 'd', value_parser = parse_node_num, default_value = "^all")]
    pub dest: u32,
    /// Channel index to send on.
    #[arg(long, short = 'c', default_value = "0")]
    pub channel: u32,
    /// Give up if the link is not usable within this time (e.g. 10s, 500ms).
    #[arg(long, default_value = "15s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct NodesArgs {
    #[command(flatten)]
    pub transport: TransportArgs,
    /// Only report the node the radio itself is.
    #[arg(long)]
    pub own_only: bool,
    /// Give up if the report has not finished within this time (e.g. 30s).
    #[arg(long, default_value = "30s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a node number given as `!hex`, `0xhex`, decimal, or `^all`.
pub fn parse_node_num(input: &str) -> Result<u32, String> {
    let input = input.trim();
    if input == "^all" {
        return Ok(BROADCAST_ADDR);
    }
    let parsed = if let Some(hex) = input.strip_prefix('!') {
        u32::from_str_radix(hex, 16)
    } else if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)
    } else {
        input.parse()
    };
    parsed.map_err(|_| format!("invalid node number: {input}"))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_numbers_in_every_notation() {
        assert_eq!(parse_node_num("!deadbeef"), Ok(0xdead_beef));
        assert_eq!(parse_node_num("0x10"), Ok(16));
        assert_eq!(parse_node_num("42"), Ok(42));
        assert_eq!(parse_node_num("^all"), Ok(BROADCAST_ADDR));
        assert!(parse_node_num("!xyz").is_err());
        assert!(parse_node_num("").is_err());
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }
}
