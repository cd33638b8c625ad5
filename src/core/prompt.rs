//! Prompt assembly
//!
//! Builds the ordered `contents` array for a generation request: the fixed
//! instruction (with the FAQ corpus inlined) first, then every chat turn
//! from the transcript in submission order. App-side messages never reach
//! the wire.

use crate::api::Content;
use crate::core::message::Message;

/// Instruction prefixed to every conversation. The FAQ blob is appended
/// after a blank line; together they form the first "user" content entry.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant for Gregory University. \
Only answer questions using the following FAQ. \
If the answer is not in the FAQ, say 'Sorry, I can only answer questions from the official FAQ.'";

pub fn system_text(faq_text: &str) -> String {
    format!("{SYSTEM_INSTRUCTION}\n\n{faq_text}")
}

/// Assemble the request contents from the FAQ blob and the transcript.
/// Pure transformation; the transcript is not modified.
pub fn build_contents<'a, I>(faq_text: &str, transcript: I) -> Vec<Content>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut contents = vec![Content::new("user", system_text(faq_text))];
    for message in transcript {
        if let Some(role) = message.role.to_api_role() {
            contents.push(Content::new(role, message.content.clone()));
        }
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::faq;
    use crate::core::message::Message;

    #[test]
    fn first_content_is_always_the_instruction() {
        let blob = faq::faq_text();

        let empty: Vec<Message> = Vec::new();
        let contents = build_contents(&blob, &empty);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role, "user");
        assert!(contents[0].text().starts_with(SYSTEM_INSTRUCTION));
        assert!(contents[0].text().contains("Gregory University FAQ:"));

        let history = vec![
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("bye"),
        ];
        let contents = build_contents(&blob, &history);
        assert_eq!(contents[0].text(), system_text(&blob));
    }

    #[test]
    fn transcript_roles_map_to_wire_roles_in_order() {
        let history = vec![
            Message::user("first question"),
            Message::assistant("first answer"),
            Message::user("second question"),
        ];
        let contents = build_contents("faq", &history);
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[1].role, "user");
        assert_eq!(contents[1].text(), "first question");
        assert_eq!(contents[2].role, "model");
        assert_eq!(contents[2].text(), "first answer");
        assert_eq!(contents[3].role, "user");
        assert_eq!(contents[3].text(), "second question");
    }

    #[test]
    fn app_messages_are_excluded() {
        let history = vec![
            Message::app_info("welcome"),
            Message::user("question"),
            Message::app_error("API error: boom"),
        ];
        let contents = build_contents("faq", &history);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].text(), "question");
    }

    #[test]
    fn motto_question_is_grounded_at_thirteen() {
        let blob = faq::faq_text();
        let history = vec![Message::user("What is the motto of Gregory University?")];
        let contents = build_contents(&blob, &history);
        assert!(contents[0].text().contains("Q13: What is the motto"));
        assert!(contents[0].text().contains("Knowledge for Tomorrow"));
    }
}
