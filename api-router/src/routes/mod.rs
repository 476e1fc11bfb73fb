pub mod generate_questions;
pub mod health;
pub mod options;
