use std::path::Path;

use crate::error::AppError;

/// Splits a course-outcomes document into one label per non-blank line.
pub fn parse_course_outcomes(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn load_course_outcomes(path: &Path) -> Result<Vec<String>, AppError> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse_course_outcomes(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_blank_lines_and_trims() {
        let text = "Understand recursion\n\n  Apply sorting  \r\n";

        let outcomes = parse_course_outcomes(text);

        assert_eq!(outcomes, vec!["Understand recursion", "Apply sorting"]);
    }

    #[tokio::test]
    async fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("course_outcomes.txt");
        tokio::fs::write(&path, "CO1: Explain stacks\nCO2: Analyse queues\n")
            .await
            .expect("write outcomes");

        let outcomes = load_course_outcomes(&path).await.expect("load outcomes");

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0], "CO1: Explain stacks");
    }

    #[tokio::test]
    async fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");

        let result = load_course_outcomes(&dir.path().join("absent.txt")).await;

        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
