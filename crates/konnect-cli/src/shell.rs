//! Command execution.
//!
//! [`Shell`] applies parsed [`Command`]s to a client [`Runtime`] and reports
//! the outcome on a [`Console`]. Failed commands are printed, never fatal:
//! only output errors end the session.

use std::io;

use konnect_client::{Connector, Runtime};
use konnect_core::{ConnectionState, GroupDirectory, KeyValueStore};

use crate::{
    command::{Command, HELP},
    console::Console,
};

/// Whether the input loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line
    Continue,
    /// User asked to quit
    Quit,
}

/// A runtime plus the console it reports to.
pub struct Shell<D, C, S, W>
where
    D: GroupDirectory,
    C: Connector,
    S: KeyValueStore,
    W: io::Write,
{
    runtime: Runtime<D, C, S>,
    console: Console<W>,
}

impl<D, C, S, W> Shell<D, C, S, W>
where
    D: GroupDirectory,
    C: Connector,
    S: KeyValueStore,
    W: io::Write,
{
    /// Wrap a runtime and an output writer.
    pub fn new(runtime: Runtime<D, C, S>, out: W) -> Self {
        Self { runtime, console: Console::new(out) }
    }

    /// The wrapped runtime.
    pub fn runtime(&self) -> &Runtime<D, C, S> {
        &self.runtime
    }

    /// Output written so far.
    pub fn output(&self) -> &W {
        self.console.get_ref()
    }

    /// Print the startup banner.
    pub fn greet(&mut self) -> io::Result<()> {
        if let Some(identity) = self.runtime.manager().identity() {
            self.console.info(format_args!("Welcome back, {}", identity.name))?;
        } else {
            self.console.info("Choose a name with /name <name>")?;
        }
        self.console.info("Type /help for commands")
    }

    /// Execute one command.
    pub async fn execute(&mut self, command: Command) -> io::Result<Flow> {
        match command {
            Command::Empty => {},
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                for (usage, text) in HELP {
                    self.console.info(format_args!("{usage:<22} {text}"))?;
                }
            },

            Command::Name { name } => match self.runtime.register(&name).await {
                Ok(identity) => self.console.info(format_args!("Name set to {}", identity.name))?,
                Err(e) => self.console.error(e)?,
            },

            Command::Create { group_name } => match self.runtime.create_group(&group_name).await {
                Ok(group) => self
                    .console
                    .info(format_args!("Created group '{}' (id {})", group.name, group.id))?,
                Err(e) => self.console.error(e)?,
            },

            Command::Join { group_id } => match self.runtime.join_group(&group_id).await {
                Ok(group) => self.console.info(format_args!("Joined group '{}'", group.name))?,
                Err(e) => self.console.error(e)?,
            },

            Command::Groups => match self.runtime.list_groups().await {
                Ok(groups) if groups.is_empty() => self.console.info("No groups yet")?,
                Ok(groups) => {
                    for group in groups {
                        self.console.info(format_args!(
                            "{}  {}  (by {})",
                            group.group_id, group.group_name, group.creator_name
                        ))?;
                    }
                },
                Err(e) => self.console.error(e)?,
            },

            Command::Leave => {
                if self.runtime.manager().group().is_none() {
                    self.console.error("not in a group")?;
                } else {
                    self.runtime.leave_group();
                    self.console.info("Left the group")?;
                }
            },

            Command::Rejoin => {
                if self.runtime.rejoin() {
                    self.console.info("Reconnecting")?;
                } else {
                    self.console.error("nothing to rejoin")?;
                }
            },

            Command::Forget => match self.runtime.forget_identity() {
                Ok(()) => self.console.info("Name forgotten")?,
                Err(e) => self.console.error(e)?,
            },

            Command::Who => self.who()?,

            Command::Members => match self.runtime.group_members().await {
                Ok(listing) => self.console.info(format_args!(
                    "Members of '{}': {}",
                    listing.group_name,
                    listing.members.join(", ")
                ))?,
                Err(e) => self.console.error(e)?,
            },

            Command::Message { text } => {
                if let Err(e) = self.runtime.send(&text) {
                    self.console.error(e)?;
                }
            },

            Command::Unknown { input } => {
                self.console.error(format_args!("unknown command: {input} (try /help)"))?;
            },
            Command::InvalidArgs { command, error } => {
                self.console.error(format_args!("/{command}: {error}"))?;
            },
        }
        Ok(Flow::Continue)
    }

    /// Wait for the next notice and print it.
    ///
    /// Returns `false` once the transport event channel is closed.
    /// Cancel-safe.
    pub async fn next_notice(&mut self) -> io::Result<bool> {
        match self.runtime.next().await {
            Some(notice) => {
                self.console.notice(&notice)?;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Print every notice already queued, without waiting.
    pub fn flush_notices(&mut self) -> io::Result<usize> {
        let notices = self.runtime.pump();
        for notice in &notices {
            self.console.notice(notice)?;
        }
        Ok(notices.len())
    }

    fn who(&mut self) -> io::Result<()> {
        let manager = self.runtime.manager();
        let name = manager.identity().map_or("(no name)", |i| i.name.as_str());
        let group = manager.group().map_or_else(
            || "no group".to_string(),
            |g| format!("group '{}' ({})", g.name, g.id),
        );
        let state = match manager.state() {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed if manager.session().is_errored() => "connection lost",
            ConnectionState::Closed => "disconnected",
        };
        let line = format!("{name} in {group}, {state}");
        self.console.info(line)
    }
}
