//! Prompt templates for answer generation.

use std::fmt::Write;

/// Build the retrieval-backed prompt.
///
/// Context segments come first, each labeled by its 1-based position,
/// followed by the instruction and the question.
pub fn context_prompt(question: &str, contexts: &[String]) -> String {
    let mut data = String::new();
    for (i, context) in contexts.iter().enumerate() {
        let _ = write!(data, "Chunk {}: {context}\n\n", i + 1);
    }

    format!(
        "We have provided context information below.\n\
         ---------------------\n\
         {data}\
         ---------------------\n\
         Answer the question with only the essential information. Just write the answer to the Question\n\
         Question: {question}\n\
         Answer: "
    )
}

/// Build the prompt used without retrieval.
pub fn direct_prompt(question: &str) -> String {
    format!("Respond to this prompt: {question}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prompt_labels_segments_in_order() {
        let prompt = context_prompt("Who?", &["first".to_string(), "second".to_string()]);

        let first = prompt.find("Chunk 1: first").unwrap();
        let second = prompt.find("Chunk 2: second").unwrap();
        let question = prompt.find("Question: Who?").unwrap();
        assert!(first < second && second < question);
        assert!(prompt.contains("only the essential information"));
    }

    #[test]
    fn context_prompt_without_segments_still_asks() {
        let prompt = context_prompt("Why?", &[]);
        assert!(!prompt.contains("Chunk 1"));
        assert!(prompt.ends_with("Question: Why?\nAnswer: "));
    }

    #[test]
    fn direct_prompt_has_no_context_section() {
        let prompt = direct_prompt("What is Rust?");
        assert_eq!(prompt, "Respond to this prompt: What is Rust?");
        assert!(!prompt.contains("context"));
    }
}
