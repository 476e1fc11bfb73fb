use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the question log.
///
/// `course_outcome` is the outcome the caller asked for, `resolved_course_outcome`
/// the one matched from the retrieved passage. The two may disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestionRecord {
    pub course_outcome: String,
    pub bloom_level: String,
    pub questions: String,
    pub resolved_course_outcome: String,
    pub created_at: DateTime<Utc>,
}

impl GeneratedQuestionRecord {
    pub fn new(
        course_outcome: String,
        bloom_level: String,
        questions: String,
        resolved_course_outcome: String,
    ) -> Self {
        Self {
            course_outcome,
            bloom_level,
            questions,
            resolved_course_outcome,
            created_at: Utc::now(),
        }
    }
}
