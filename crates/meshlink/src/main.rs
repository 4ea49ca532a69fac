mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "meshlink", version, about = "Mesh radio client CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshlink_proto::BROADCAST_ADDR;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "meshlink",
            "send",
            "--tcp",
            "10.0.0.5:4403",
            "--dest",
            "!a1b2c3d4",
            "--channel",
            "2",
            "hello mesh",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.text, "hello mesh");
        assert_eq!(args.dest, 0xa1b2_c3d4);
        assert_eq!(args.channel, 2);
        assert_eq!(args.transport.tcp, Some("10.0.0.5:4403".parse().unwrap()));
    }

    #[test]
    fn send_defaults_to_broadcast() {
        let cli = Cli::try_parse_from(["meshlink", "send", "ping"]).expect("send should parse");
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.dest, BROADCAST_ADDR);
        assert_eq!(args.channel, 0);
    }

    #[test]
    fn rejects_serial_and_tcp_together() {
        let err = Cli::try_parse_from([
            "meshlink",
            "listen",
            "--serial",
            "/dev/ttyUSB0",
            "--tcp",
            "10.0.0.5:4403",
        ])
        .expect_err("conflicting transports should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_bad_destination() {
        let err = Cli::try_parse_from(["meshlink", "send", "--dest", "!nothex", "hi"])
            .expect_err("bad node id should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_nodes_subcommand() {
        let cli = Cli::try_parse_from([
            "meshlink",
            "--format",
            "json",
            "nodes",
            "--serial",
            "/dev/ttyACM0",
            "--baud",
            "921600",
            "--own-only",
        ])
        .expect("nodes args should parse");

        let Command::Nodes(args) = cli.command else {
            panic!("expected nodes");
        };
        assert!(args.own_only);
        assert_eq!(args.transport.serial.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(args.transport.baud, 921_600);
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }

    #[test]
    fn parses_listen_filters() {
        let cli = Cli::try_parse_from(["meshlink", "listen", "--channels", "0,3", "--count", "5"])
            .expect("listen args should parse");
        let Command::Listen(args) = cli.command else {
            panic!("expected listen");
        };
        assert_eq!(args.channels, Some(vec![0, 3]));
        assert_eq!(args.count, Some(5));
        assert!(!args.text_only);
    }
}
