use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    Individual,
    SmallGroup,
    Team,
    Broadcast,
}

impl RecipientType {
    /// Strict function of the total recipient count (spec.md §4.3 / §8 invariant 2).
    pub fn classify(total_recipients: usize) -> Self {
        match total_recipients {
            0 | 1 => RecipientType::Individual,
            2..=5 => RecipientType::SmallGroup,
            6..=20 => RecipientType::Team,
            _ => RecipientType::Broadcast,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Internal,
    External,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadPosition {
    Initiating,
    Reply,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Executive,
    Peer,
    Report,
    ExternalClient,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageContext {
    pub recipient_type: RecipientType,
    pub audience: Audience,
    pub thread_position: ThreadPosition,
    pub time_of_day: TimeOfDay,
    pub is_weekend: bool,
    pub bullet_lines: u32,
    pub paragraph_count: u32,
    pub greeting_present: bool,
    pub closing_present: bool,
    /// Advisory only — downstream consumers must not require this field
    /// (spec.md §4.3).
    pub recipient_seniority: Seniority,
}
