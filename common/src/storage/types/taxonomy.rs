use serde::Serialize;

/// Bloom's taxonomy levels offered to clients, lowest cognitive demand first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BloomLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl BloomLevel {
    pub const ALL: [Self; 6] = [
        Self::Remember,
        Self::Understand,
        Self::Apply,
        Self::Analyze,
        Self::Evaluate,
        Self::Create,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuestionType {
    Objective,
    #[serde(rename = "Short Answer")]
    ShortAnswer,
    #[serde(rename = "Long Answer")]
    LongAnswer,
    #[serde(rename = "Case-based")]
    CaseBased,
}

impl QuestionType {
    pub const ALL: [Self; 4] = [
        Self::Objective,
        Self::ShortAnswer,
        Self::LongAnswer,
        Self::CaseBased,
    ];
}
