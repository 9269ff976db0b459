use serde::{Deserialize, Serialize};

/// Unique identifier of one audit-log entry. Monotonic-ish but not contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub i64);

impl EntryId {
    pub fn value(self) -> i64 {
        self.0
    }
}

/// Identifier of the acting user or chat. `ActorId::NONE` means "no actor"
/// and never participates in a deletion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub i64);

impl ActorId {
    pub const NONE: ActorId = ActorId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Closed set of audit-log actions. Matched exhaustively; classification is a
/// pure function over the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionVariant {
    /// A message removed by `entry.actor_id`. `service_action` marks deletions
    /// of messages that themselves rendered as service markers (joins, pins);
    /// those are peeled off the tail of a run instead of being absorbed into
    /// the collapsed count.
    MessageDeleted { author: String, service_action: bool },
    MessageEdited { author: String },
    ParticipantJoined,
    ParticipantLeft,
    MessagePinned { author: String },
    TitleChanged { title: String },
    /// A rank transition. `prev_rank == new_rank` is a no-op the display
    /// sequence must not contain.
    RoleChanged { prev_rank: String, new_rank: String },
    /// Unclassifiable action; dropped during merge, never stored.
    Unsupported { code: i32 },
}

/// How an entry renders: a content bubble, a service marker line, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayClass {
    Content,
    ServiceMarker,
    Hidden,
}

/// Opaque display content carried through the engine untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: None,
        }
    }
}

/// One unit of audit-log data. Immutable once merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub timestamp: i64,
    pub actor_id: ActorId,
    pub action: ActionVariant,
    pub payload: Payload,
}

impl Entry {
    /// The deleting actor when this entry is part of a deletion run,
    /// `ActorId::NONE` otherwise. A `NONE` result always terminates a run.
    pub fn deleted_by(&self) -> ActorId {
        match self.action {
            ActionVariant::MessageDeleted { .. } => self.actor_id,
            _ => ActorId::NONE,
        }
    }

    /// Render classification for the display sequence.
    pub fn display_class(&self) -> DisplayClass {
        match &self.action {
            ActionVariant::MessageDeleted { service_action, .. } => {
                if *service_action {
                    DisplayClass::ServiceMarker
                } else {
                    DisplayClass::Content
                }
            }
            ActionVariant::MessageEdited { .. } => DisplayClass::Content,
            ActionVariant::ParticipantJoined
            | ActionVariant::ParticipantLeft
            | ActionVariant::MessagePinned { .. }
            | ActionVariant::TitleChanged { .. } => DisplayClass::ServiceMarker,
            ActionVariant::RoleChanged { prev_rank, new_rank } => {
                if prev_rank == new_rank {
                    DisplayClass::Hidden
                } else {
                    DisplayClass::ServiceMarker
                }
            }
            ActionVariant::Unsupported { .. } => DisplayClass::Hidden,
        }
    }

    /// Whether the entry survives merge classification at all.
    pub fn is_classifiable(&self) -> bool {
        !matches!(self.action, ActionVariant::Unsupported { .. })
    }

    /// Author name attributed to the affected message, when the action has one.
    pub fn author(&self) -> Option<&str> {
        match &self.action {
            ActionVariant::MessageDeleted { author, .. }
            | ActionVariant::MessageEdited { author }
            | ActionVariant::MessagePinned { author } => Some(author),
            _ => None,
        }
    }
}
