use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use meshlink_client::{ClientConfig, NodeRecord, NodeReportProgress, ReportRecord};
use tracing::debug;

use crate::cmd::{parse_duration, wait_for_link, NodesArgs};
use crate::exit::{client_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT};
use crate::output::{print_nodes, OutputFormat};

/// A report that goes quiet this long after its last record is finished.
const REPORT_STALL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Collected {
    nodes: Vec<NodeRecord>,
    other_records: usize,
    finished: Option<NodeReportProgress>,
}

pub fn run(args: NodesArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let deadline = Instant::now() + timeout;
    let config = ClientConfig {
        node_report_stall_timeout: Some(REPORT_STALL_TIMEOUT),
        ..ClientConfig::default()
    };
    let mut client = args.transport.client(config)?;

    wait_for_link(&mut client, timeout)?;

    let collected = Rc::new(RefCell::new(Collected::default()));
    let sink = Rc::clone(&collected);
    let handler = move |record: Option<&ReportRecord>, progress: NodeReportProgress| {
        let mut collected = sink.borrow_mut();
        match record {
            Some(ReportRecord::Node(node)) => collected.nodes.push(node.clone()),
            Some(_) => collected.other_records += 1,
            None => collected.finished = Some(progress),
        }
    };

    let requested = if args.own_only {
        client.request_own_node_report(handler)
    } else {
        client.request_node_report(handler)
    };
    let nonce = requested.map_err(|err| client_error("node report request failed", err))?;

    let progress = loop {
        let outcome = client
            .poll()
            .map_err(|err| client_error("radio link failed", err))?;
        if let Some(progress) = collected.borrow().finished {
            break progress;
        }
        if Instant::now() >= deadline {
            client.close();
            return Err(CliError::new(
                TIMEOUT,
                format!("node report {nonce} not finished after {timeout:?}"),
            ));
        }
        if outcome.is_idle() {
            std::thread::sleep(client.config().poll_backoff);
        }
    };
    client.close();

    let mut collected = collected.take();
    debug!(
        nonce,
        nodes = collected.nodes.len(),
        other = collected.other_records,
        ?progress,
        "node report finished"
    );
    if progress == NodeReportProgress::Failed {
        return Err(CliError::new(FAILURE, format!("node report {nonce} failed")));
    }

    sort_nodes(&mut collected.nodes);
    print_nodes(&collected.nodes, format);
    Ok(SUCCESS)
}

/// Own node first, then most recently heard.
fn sort_nodes(nodes: &mut [NodeRecord]) {
    nodes.sort_by(|a, b| {
        b.is_mine
            .cmp(&a.is_mine)
            .then(b.last_heard.cmp(&a.last_heard))
            .then(a.num.cmp(&b.num))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshlink_proto::NodeInfo;

    fn node(num: u32, last_heard: u32, mine: bool) -> NodeRecord {
        let info = NodeInfo {
            num,
            last_heard,
            ..NodeInfo::default()
        };
        NodeRecord::from_info(&info, mine.then_some(num))
    }

    #[test]
    fn own_node_sorts_first_then_recency() {
        let mut nodes = vec![node(3, 100, false), node(1, 50, true), node(2, 200, false)];
        sort_nodes(&mut nodes);
        let order: Vec<u32> = nodes.iter().map(|n| n.num).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
