use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use meshlink_client::{ClientConfig, MeshClient};
use meshlink_proto::PortNum;
use tracing::{debug, info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{client_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, InboundMessage, MessageKind, OutputFormat};

type Inbox = Rc<RefCell<Vec<InboundMessage>>>;

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = args.transport.client(ClientConfig::default())?;
    let inbox = capture_messages(&mut client, args.text_only);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    let mut linked = false;

    while running.load(Ordering::SeqCst) {
        let outcome = client
            .poll()
            .map_err(|err| client_error("radio link failed", err))?;

        if outcome.can_send != linked {
            linked = outcome.can_send;
            if linked {
                info!("radio link up");
                // The radio only starts forwarding packets once a client has
                // asked for its configuration.
                if let Err(err) = client.request_own_node_report(|_, progress| {
                    if progress.is_finished() {
                        debug!(?progress, "session established");
                    }
                }) {
                    warn!(error = %err, "session request failed");
                }
            } else {
                warn!("radio link down");
            }
        }

        let messages = std::mem::take(&mut *inbox.borrow_mut());
        for msg in messages {
            if let Some(channels) = &args.channels {
                if !channels.contains(&msg.meta.channel) {
                    continue;
                }
            }

            print_message(&msg, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    client.close();
                    return Ok(SUCCESS);
                }
            }
        }

        if outcome.is_idle() {
            std::thread::sleep(client.config().poll_backoff);
        }
    }

    client.close();
    Ok(SUCCESS)
}

fn capture_messages(client: &mut MeshClient, text_only: bool) -> Inbox {
    let inbox: Inbox = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&inbox);
    client.on_text(move |meta, text| {
        sink.borrow_mut().push(InboundMessage {
            meta,
            kind: MessageKind::Text,
            port: Some(PortNum::TextMessageApp),
            payload: text.as_bytes().to_vec(),
        });
    });

    if !text_only {
        let sink = Rc::clone(&inbox);
        client.on_port(move |meta, port, payload| {
            sink.borrow_mut().push(InboundMessage {
                meta,
                kind: MessageKind::Data,
                port: Some(port),
                payload: payload.to_vec(),
            });
        });

        let sink = Rc::clone(&inbox);
        client.on_encrypted(move |meta, _public_key, blob| {
            sink.borrow_mut().push(InboundMessage {
                meta,
                kind: MessageKind::Encrypted,
                port: None,
                payload: blob.to_vec(),
            });
        });
    }

    inbox
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
