//! Slash-command parsing.
//!
//! Lines starting with `/` are commands; anything else is a chat message.

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/name <name>`: register and adopt a display name
    Name {
        /// Requested name
        name: String,
    },
    /// `/create <group name>`: create a group and switch to it
    Create {
        /// Name for the new group
        group_name: String,
    },
    /// `/join <group id>`: join a group and switch to it
    Join {
        /// ID of the group to join
        group_id: String,
    },
    /// `/groups`: list known groups
    Groups,
    /// `/leave`: leave the current group
    Leave,
    /// `/rejoin`: reconnect after the connection was lost
    Rejoin,
    /// `/forget`: delete the stored name and disconnect
    Forget,
    /// `/who`: show name, group and connection state
    Who,
    /// `/members`: list the current group's members
    Members,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// Chat message for the current group
    Message {
        /// Line as typed
        text: String,
    },
    /// Blank line
    Empty,
    /// Unrecognized command
    Unknown {
        /// Line as typed
        input: String,
    },
    /// Known command with bad arguments
    InvalidArgs {
        /// Command name without the slash
        command: &'static str,
        /// Usage hint
        error: &'static str,
    },
}

/// Usage text for `/help`.
pub const HELP: &[(&str, &str)] = &[
    ("/name <name>", "set your display name"),
    ("/create <group name>", "create a group and enter it"),
    ("/join <group id>", "join a group by ID"),
    ("/groups", "list groups"),
    ("/leave", "leave the current group"),
    ("/rejoin", "reconnect after a lost connection"),
    ("/forget", "forget your name and disconnect"),
    ("/who", "show who and where you are"),
    ("/members", "list members of the current group"),
    ("/help", "show this help"),
    ("/quit", "exit"),
];

/// Parse one input line.
pub fn parse(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Command::Empty;
    }

    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Command::Message { text: line.to_string() };
    };

    let (command, args) = match rest.split_once(char::is_whitespace) {
        Some((command, args)) => (command, args.trim()),
        None => (rest, ""),
    };

    match command {
        "name" | "nick" => required(args, "name", "usage: /name <name>")
            .map_or_else(|e| e, |name| Command::Name { name }),
        "create" => required(args, "create", "usage: /create <group name>")
            .map_or_else(|e| e, |group_name| Command::Create { group_name }),
        "join" => required(args, "join", "usage: /join <group id>")
            .map_or_else(|e| e, |group_id| Command::Join { group_id }),
        "groups" | "list" => Command::Groups,
        "leave" => Command::Leave,
        "rejoin" | "reconnect" => Command::Rejoin,
        "forget" => Command::Forget,
        "who" | "whoami" => Command::Who,
        "members" => Command::Members,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown { input: line.trim().to_string() },
    }
}

fn required(args: &str, command: &'static str, usage: &'static str) -> Result<String, Command> {
    if args.is_empty() {
        Err(Command::InvalidArgs { command, error: usage })
    } else {
        Ok(args.to_string())
    }
}
