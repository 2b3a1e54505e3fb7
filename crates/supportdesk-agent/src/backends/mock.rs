use super::{Generation, LlmBackend, REFUSAL};
use async_trait::async_trait;
use std::sync::Arc;
use supportdesk_core::{DeskResult, DocSet, Message};

const GREETINGS: [&str; 6] = [
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
];

const THANKS: [&str; 2] = ["thank", "thanks"];

const THANKS_REPLY: &str = "You're welcome! Is there anything else I can help you with?";

/// (message keyword, title fragment) pairs that select a topic even when no
/// title word appears in the message. The title match is case-sensitive.
const TOPIC_RULES: [(&str, &str); 2] = [("refund", "Refund"), ("password", "Password")];

/// Offline provider: keyword matching over the reference docs.
///
/// Total and deterministic. Every input yields exactly one reply with zero
/// token usage, without touching the network.
pub struct MockBackend {
    docs: Arc<DocSet>,
}

impl MockBackend {
    /// Answer from `docs`.
    pub fn new(docs: Arc<DocSet>) -> Self {
        Self { docs }
    }

    /// The keyword-matching decision procedure, independent of async.
    pub fn answer(&self, user_message: &str) -> String {
        let lower = user_message.to_lowercase();

        if GREETINGS.iter().any(|g| lower.contains(g)) {
            return self.greeting();
        }

        if THANKS.iter().any(|t| lower.contains(t)) {
            return THANKS_REPLY.to_string();
        }

        for doc in self.docs.entries() {
            let title_lower = doc.title.to_lowercase();
            let title_hit = title_lower
                .split_whitespace()
                .any(|keyword| lower.contains(keyword));
            let rule_hit = TOPIC_RULES
                .iter()
                .any(|(keyword, fragment)| lower.contains(keyword) && doc.title.contains(fragment));

            if title_hit || rule_hit {
                return doc.content.clone();
            }
        }

        self.no_information()
    }

    fn greeting(&self) -> String {
        match self.topic_list() {
            Some(topics) => format!(
                "Hello! I'm your support assistant. I can help you with questions about \
                 {topics}. How can I assist you today?"
            ),
            None => "Hello! I'm your support assistant. How can I assist you today?".to_string(),
        }
    }

    fn no_information(&self) -> String {
        match self.topic_list() {
            Some(topics) => format!("{REFUSAL} I can help you with: {topics}."),
            None => REFUSAL.to_string(),
        }
    }

    /// "a", "a and b", "a, b and c".
    fn topic_list(&self) -> Option<String> {
        let topics = self.docs.topics();
        match topics.split_last() {
            None => None,
            Some((last, [])) => Some(last.clone()),
            Some((last, rest)) => Some(format!("{} and {last}", rest.join(", "))),
        }
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(
        &self,
        user_message: &str,
        _context: &[Message],
        _reference_text: &str,
    ) -> DeskResult<Generation> {
        Ok(Generation::new(self.answer(user_message), 0))
    }
}
