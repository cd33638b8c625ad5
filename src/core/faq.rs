//! The built-in FAQ corpus
//!
//! The question/answer pairs are embedded from `builtin_faq.toml` at build
//! time and never change while the process runs. Everything the model is
//! allowed to answer from is derived here: the numbered instruction blob
//! sent as grounding context, and the sampled example questions shown to
//! the user at startup.

use serde::Deserialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
struct FaqDocument {
    entries: Vec<FaqEntry>,
}

/// The fixed FAQ list, in source order.
pub fn entries() -> &'static [FaqEntry] {
    static ENTRIES: OnceLock<Vec<FaqEntry>> = OnceLock::new();
    ENTRIES.get_or_init(|| {
        const FAQ_CONTENT: &str = include_str!("../builtin_faq.toml");
        let document: FaqDocument =
            toml::from_str(FAQ_CONTENT).expect("Failed to parse builtin_faq.toml");
        document.entries
    })
}

/// The FAQ serialized as grounding text: a header followed by
/// `Q{n}: {question}` / `A{n}: {answer}` pairs, 1-indexed, in source order.
pub fn faq_text() -> String {
    let mut text = String::from("Gregory University FAQ:\n\n");
    for (i, entry) in entries().iter().enumerate() {
        text.push_str(&format!(
            "Q{n}: {q}\nA{n}: {a}\n\n",
            n = i + 1,
            q = entry.question,
            a = entry.answer
        ));
    }
    text
}

/// Draw `count` distinct example questions at random.
///
/// Uses a partial Fisher-Yates shuffle over the entry indices, so no
/// question repeats within one sample. Returns fewer than `count` only
/// when the FAQ itself is smaller.
pub fn sample_questions(count: usize) -> Result<Vec<&'static FaqEntry>, getrandom::Error> {
    let all = entries();
    let take = count.min(all.len());
    let mut indices: Vec<usize> = (0..all.len()).collect();
    for i in 0..take {
        let remaining = indices.len() - i;
        let j = i + (getrandom::u64()? as usize) % remaining;
        indices.swap(i, j);
    }
    Ok(indices[..take].iter().map(|&i| &all[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn embedded_faq_loads() {
        let all = entries();
        assert_eq!(all.len(), 24);
        assert!(all
            .iter()
            .all(|e| !e.question.is_empty() && !e.answer.is_empty()));
    }

    #[test]
    fn faq_text_numbers_every_pair_in_order() {
        let text = faq_text();
        assert!(text.starts_with("Gregory University FAQ:\n\n"));

        let count = entries().len();
        let mut cursor = 0;
        for i in 1..=count {
            let q_tag = format!("Q{i}: ");
            let a_tag = format!("A{i}: ");
            let q_pos = text[cursor..].find(&q_tag).expect("question tag present");
            let a_pos = text[cursor..].find(&a_tag).expect("answer tag present");
            assert!(q_pos < a_pos, "Q{i} must precede A{i}");
            cursor += a_pos;
        }
        // No extra numbering past the last entry.
        assert!(!text.contains(&format!("Q{}: ", count + 1)));
    }

    #[test]
    fn faq_text_matches_source_order() {
        let text = faq_text();
        assert!(text.contains("Q1: What are the accomodations options?"));
        assert!(text.contains("Q13: What is the motto of Gregory University?"));
        assert!(text.contains("A13: The motto of Gregory University is 'Knowledge for Tomorrow'."));
    }

    #[test]
    fn sampling_returns_distinct_questions() {
        for _ in 0..20 {
            let sample = sample_questions(5).expect("os rng available");
            assert_eq!(sample.len(), 5);
            let distinct: HashSet<&str> =
                sample.iter().map(|e| e.question.as_str()).collect();
            assert_eq!(distinct.len(), 5);
            for entry in &sample {
                assert!(entries().iter().any(|e| e == *entry));
            }
        }
    }

    #[test]
    fn sampling_caps_at_corpus_size() {
        let sample = sample_questions(1000).expect("os rng available");
        assert_eq!(sample.len(), entries().len());
    }
}
