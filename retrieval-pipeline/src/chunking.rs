const SENTENCE_DELIMITER: &str = ". ";

/// Groups the sentences of `text` into chunks of at most `max_chars` characters.
///
/// Sentences are never split, so a single sentence longer than the limit becomes
/// its own oversized chunk. Each sentence keeps its delimiter, which lets a chunk
/// run up to one delimiter past the limit.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in text.split(SENTENCE_DELIMITER) {
        let sentence_len = sentence.chars().count();
        if current_len.saturating_add(sentence_len) > max_chars {
            flush(&mut chunks, &mut current);
            current_len = 0;
        }
        current.push_str(sentence);
        current.push_str(SENTENCE_DELIMITER);
        current_len = current_len
            .saturating_add(sentence_len)
            .saturating_add(SENTENCE_DELIMITER.len());
    }
    flush(&mut chunks, &mut current);

    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}
