use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use meshlink_client::{NodeRecord, PacketMeta};
use meshlink_proto::{PortNum, BROADCAST_ADDR};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Category of an inbound application packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Data,
    Encrypted,
}

/// An inbound packet captured by a handler, ready for printing.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub meta: PacketMeta,
    pub kind: MessageKind,
    pub port: Option<PortNum>,
    pub payload: Vec<u8>,
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    kind: MessageKind,
    from: String,
    to: String,
    channel: u32,
    id: u32,
    port: Option<String>,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_message(msg: &InboundMessage, format: OutputFormat) {
    let port = msg.port.map(|p| format!("{p:?}"));
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                kind: msg.kind,
                from: node_id(msg.meta.from),
                to: node_id(msg.meta.to),
                channel: msg.meta.channel,
                id: msg.meta.id,
                port,
                payload_size: msg.payload.len(),
                payload: payload_preview(&msg.payload),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FROM", "TO", "CH", "PORT", "PAYLOAD"])
                .add_row(vec![
                    node_id(msg.meta.from),
                    node_id(msg.meta.to),
                    msg.meta.channel.to_string(),
                    port.unwrap_or_else(|| "-".to_string()),
                    payload_preview(&msg.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match msg.kind {
            MessageKind::Text => println!(
                "{} -> {} ch{}: {}",
                node_id(msg.meta.from),
                node_id(msg.meta.to),
                msg.meta.channel,
                payload_preview(&msg.payload)
            ),
            _ => println!(
                "{} -> {} ch{} {} {} bytes: {}",
                node_id(msg.meta.from),
                node_id(msg.meta.to),
                msg.meta.channel,
                port.as_deref().unwrap_or("encrypted"),
                msg.payload.len(),
                payload_preview(&msg.payload)
            ),
        },
        OutputFormat::Raw => print_raw(&msg.payload),
    }
}

#[derive(Serialize)]
struct SentOutput {
    id: u32,
    to: String,
    channel: u32,
    payload_size: usize,
}

pub fn print_sent(id: u32, dest: u32, channel: u32, size: usize, format: OutputFormat) {
    let out = SentOutput {
        id,
        to: node_id(dest),
        channel,
        payload_size: size,
    };
    match format {
        OutputFormat::Json | OutputFormat::Raw => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("sent id={} to={} channel={} size={}", id, out.to, channel, size);
        }
    }
}

pub fn print_nodes(nodes: &[NodeRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(nodes),
        OutputFormat::Raw => {
            for node in nodes {
                print_json(node);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "", "NODE", "NAME", "SHORT", "SNR", "HOPS", "BATTERY", "POSITION", "LAST HEARD",
                ]);
            for node in nodes {
                table.add_row(vec![
                    if node.is_mine { "*" } else { "" }.to_string(),
                    node_id(node.num),
                    node.long_name.clone(),
                    node.short_name.clone(),
                    format!("{:.1}", node.snr),
                    optional(node.hops_away),
                    node.battery_level
                        .map(|b| format!("{b}%"))
                        .unwrap_or_else(|| "-".to_string()),
                    position(node),
                    node.last_heard.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for node in nodes {
                println!(
                    "{}{} {:?} ({}) snr={:.1} hops={} battery={} pos={}",
                    if node.is_mine { "* " } else { "" },
                    node_id(node.num),
                    node.long_name,
                    node.short_name,
                    node.snr,
                    optional(node.hops_away),
                    optional(node.battery_level),
                    position(node)
                );
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Node number in the `!xxxxxxxx` form radios display.
pub fn node_id(num: u32) -> String {
    if num == BROADCAST_ADDR {
        "^all".to_string()
    } else {
        format!("!{num:08x}")
    }
}

fn position(node: &NodeRecord) -> String {
    match (node.latitude, node.longitude) {
        (Some(lat), Some(lon)) => match node.altitude {
            Some(alt) => format!("{lat:.5},{lon:.5} {alt}m"),
            None => format!("{lat:.5},{lon:.5}"),
        },
        _ => "-".to_string(),
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids() {
        assert_eq!(node_id(0xdead_beef), "!deadbeef");
        assert_eq!(node_id(0x12), "!00000012");
        assert_eq!(node_id(BROADCAST_ADDR), "^all");
    }

    #[test]
    fn binary_payloads_are_summarized() {
        assert_eq!(payload_preview(b"hi"), "hi");
        assert_eq!(payload_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }

    #[test]
    fn position_needs_both_coordinates() {
        let mut node = NodeRecord::from_info(&meshlink_proto::NodeInfo::default(), None);
        assert_eq!(position(&node), "-");
        node.latitude = Some(47.5);
        node.longitude = Some(-122.25);
        assert_eq!(position(&node), "47.50000,-122.25000");
        node.altitude = Some(12);
        assert_eq!(position(&node), "47.50000,-122.25000 12m");
    }
}
