use meshlink_client::ClientConfig;

use crate::cmd::{parse_duration, wait_for_link, SendArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_sent, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut client = args.transport.client(ClientConfig::default())?;

    wait_for_link(&mut client, timeout)?;

    let result = client.send_text(&args.text, args.dest, args.channel);
    client.close();
    let id = result.map_err(|err| client_error("send failed", err))?;

    print_sent(id, args.dest, args.channel, args.text.len(), format);
    Ok(SUCCESS)
}
