//! folio-core: portfolio chat core library (knowledge base, response engine, chat sessions).
//!
//! The gateway add-on and any other chat surface share this public API; all
//! conversational semantics live here.

mod engine;
mod knowledge;
mod session;
mod shared;

// Shared configuration
pub use shared::{
    CoreConfig, DEFAULT_CONFIG_PATH, DEFAULT_REPLY_DELAY_MS, DEFAULT_SESSION_IDLE_SECS,
};

// Knowledge base - immutable portfolio facts
pub use knowledge::{
    ContactInfo, EducationEntry, ExperienceEntry, Highlights, KnowledgeBase, KnowledgeError,
    ProjectEntry, SkillArea, SkillCategory,
};

// Response engine - ordered keyword matching and formatting
pub use engine::{classify_and_respond, Reply, Responder, ResponseEngine, Topic, TOPIC_ORDER};

// Sessions - transcript, typing delay, cancellation
pub use session::{
    ChatSession, Message, MessageId, SendOutcome, Sender, SessionConfig, SessionError,
    SessionEvent, SessionId, SessionManager,
};
