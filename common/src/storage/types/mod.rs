pub mod course_outcome;
pub mod generated_question;
pub mod taxonomy;
