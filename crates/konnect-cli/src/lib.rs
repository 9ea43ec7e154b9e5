//! Konnect terminal client
//!
//! Reads lines from stdin, treats `/`-prefixed lines as commands and
//! everything else as chat messages, and prints chat traffic as plain text
//! lines. Logs go to stderr so they never interleave with chat output.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod console;
pub mod error;
pub mod shell;

use std::io;

use konnect_client::{ClientConfig, FileStore, HttpDirectory, Runtime, WsConnector};
use tokio::io::{AsyncBufReadExt, BufReader};

pub use command::{Command, parse};
pub use console::Console;
pub use error::CliError;
pub use shell::{Flow, Shell};

/// Run the interactive client until `/quit` or end of input.
pub async fn run(config: ClientConfig) -> Result<(), CliError> {
    tracing::info!(
        api = %config.api_url,
        ws = %config.ws_url,
        state = %config.state_path.display(),
        "starting client"
    );

    let store = FileStore::open(&config.state_path)?;
    let directory = HttpDirectory::new(&config.api_url);
    let (connector, events) = WsConnector::new(&config.ws_url)?;
    let runtime = Runtime::new(directory, connector, events, store)?;

    let mut shell = Shell::new(runtime, io::stdout());
    shell.greet()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("end of input");
                    break;
                };
                if shell.execute(parse(&line)).await? == Flow::Quit {
                    break;
                }
            },
            more = shell.next_notice() => {
                if !more? {
                    tracing::warn!("transport event channel closed");
                    break;
                }
            },
        }
    }

    shell.flush_notices()?;
    Ok(())
}
