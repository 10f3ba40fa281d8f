//! Response engine: ordered keyword matching over lower-cased input.
//!
//! Matching is plain substring containment, not word-based, so a keyword inside
//! a longer word still triggers its topic ("homework" hits `work`). Topics are
//! tried in [`TOPIC_ORDER`] and the first hit wins; nothing is scored.

mod format;

use crate::knowledge::KnowledgeBase;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Categories of user intent recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Experience,
    Education,
    Skills,
    Projects,
    Contact,
    CurrentRole,
    BackendFocus,
    FrontendFocus,
    /// No keyword matched; answers with the help message.
    Fallback,
}

/// Evaluation order for matchable topics. Total, so ties cannot happen.
pub const TOPIC_ORDER: [Topic; 8] = [
    Topic::Experience,
    Topic::Education,
    Topic::Skills,
    Topic::Projects,
    Topic::Contact,
    Topic::CurrentRole,
    Topic::BackendFocus,
    Topic::FrontendFocus,
];

impl Topic {
    /// Lowercase trigger substrings. Empty for [`Topic::Fallback`].
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Experience => &["experience", "work", "job"],
            Self::Education => &["education", "degree", "university"],
            Self::Skills => &["skill", "technology", "tech stack"],
            Self::Projects => &["project"],
            Self::Contact => &["contact", "email", "reach"],
            Self::CurrentRole => &["currently", "now", "recent"],
            Self::BackendFocus => &["nest", "backend"],
            Self::FrontendFocus => &["react", "frontend"],
            Self::Fallback => &[],
        }
    }

    /// Zero-based evaluation rank; Fallback ranks after every matchable topic.
    pub fn priority(&self) -> usize {
        TOPIC_ORDER
            .iter()
            .position(|t| t == self)
            .unwrap_or(TOPIC_ORDER.len())
    }

    /// True when any keyword occurs in the already lower-cased input.
    #[inline]
    fn matches(&self, normalized: &str) -> bool {
        self.keywords().iter().any(|k| normalized.contains(k))
    }

    /// First topic in [`TOPIC_ORDER`] whose keywords occur in `utterance`.
    pub fn classify(utterance: &str) -> Self {
        let normalized = utterance.to_lowercase();
        TOPIC_ORDER
            .iter()
            .copied()
            .find(|t| t.matches(&normalized))
            .unwrap_or(Self::Fallback)
    }
}

/// Engine answer with the matched topic attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub topic: Topic,
    pub text: String,
}

/// Turns utterances into canned answers drawn from an injected knowledge base.
#[derive(Debug, Clone)]
pub struct ResponseEngine {
    knowledge: Arc<KnowledgeBase>,
}

impl ResponseEngine {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn classify(&self, utterance: &str) -> Topic {
        Topic::classify(utterance)
    }

    /// Classifies and formats in one step, keeping the topic tag.
    pub fn respond(&self, utterance: &str) -> Reply {
        let topic = self.classify(utterance);
        tracing::debug!(target: "folio::engine", ?topic, "Utterance classified");
        Reply {
            topic,
            text: format::render(topic, &self.knowledge),
        }
    }

    pub fn classify_and_respond(&self, utterance: &str) -> String {
        self.respond(utterance).text
    }

    /// Help text returned when nothing matches.
    pub fn fallback_text(&self) -> String {
        format::render(Topic::Fallback, &self.knowledge)
    }

    /// Opening bot message for a new session.
    pub fn greeting(&self) -> String {
        format::greeting(&self.knowledge)
    }
}

/// Source of bot text for chat sessions.
pub trait Responder: Send + Sync {
    /// Answer for one user utterance. Must not fail.
    fn respond(&self, utterance: &str) -> Reply;

    /// Opening bot message for a new session.
    fn greeting(&self) -> String;
}

impl Responder for ResponseEngine {
    fn respond(&self, utterance: &str) -> Reply {
        ResponseEngine::respond(self, utterance)
    }

    fn greeting(&self) -> String {
        ResponseEngine::greeting(self)
    }
}

/// Stateless form: classify `utterance` and format the answer from `kb`.
pub fn classify_and_respond(utterance: &str, kb: &KnowledgeBase) -> String {
    format::render(Topic::classify(utterance), kb)
}
