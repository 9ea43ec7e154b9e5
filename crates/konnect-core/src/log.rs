//! Ordered chat event log for the joined group.

/// Whether an event came from a member or from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Message from a group member
    User,
    /// Server announcement
    System,
}

/// One entry in the [`MessageLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// Sender display name
    pub sender: String,
    /// Message text
    pub message: String,
    /// Member message or system announcement
    pub kind: EventKind,
    /// Client-assigned ordinal, starting at 1 for each log scope.
    ///
    /// Display identity only. Arrival order is authoritative.
    pub sequence: u64,
}

/// Append-only, arrival-ordered record of chat events.
///
/// No deduplication and no reordering. The log is scoped to one connection
/// target; the session clears it whenever that scope changes.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    events: Vec<ChatEvent>,
    next_sequence: u64,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self { events: Vec::new(), next_sequence: 1 }
    }

    /// Append an event exactly as given.
    pub fn append(&mut self, event: ChatEvent) {
        self.next_sequence = self.next_sequence.max(event.sequence.saturating_add(1));
        self.events.push(event);
    }

    /// Append a new event with the next sequence ordinal.
    pub fn record(
        &mut self,
        sender: impl Into<String>,
        message: impl Into<String>,
        kind: EventKind,
    ) -> &ChatEvent {
        let sequence = self.next_sequence.max(1);
        self.append(ChatEvent { sender: sender.into(), message: message.into(), kind, sequence });
        &self.events[self.events.len() - 1]
    }

    /// Drop every event and restart sequence numbering.
    pub fn clear(&mut self) {
        self.events.clear();
        self.next_sequence = 1;
    }

    /// Events in arrival order.
    pub fn all(&self) -> &[ChatEvent] {
        &self.events
    }

    /// Most recent event. `None` if the log is empty.
    pub fn last(&self) -> Option<&ChatEvent> {
        self.events.last()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Log holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
