//! Immutable portfolio knowledge base.
//!
//! ## Collections
//!
//! | Collection | Record            | Used by topic                               |
//! |------------|-------------------|---------------------------------------------|
//! | experience | `ExperienceEntry` | Experience                                  |
//! | education  | `EducationEntry`  | Education                                   |
//! | skills     | `SkillCategory`   | Skills                                      |
//! | projects   | `ProjectEntry`    | Projects                                    |
//! | contact    | `ContactInfo`     | Contact                                     |
//! | highlights | `Highlights`      | CurrentRole, BackendFocus, FrontendFocus    |
//!
//! Record order is display order. The base is built once at startup and shared
//! behind an `Arc`; nothing in the engine or sessions mutates it.

mod store;

pub use store::{KnowledgeBase, KnowledgeError};

use serde::{Deserialize, Serialize};

/// One work-history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    /// Role and company, e.g. "Junior Backend Developer at Norvana".
    pub role: String,
    pub period: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub period: String,
    /// Headline project completed during the degree.
    pub project: String,
}

/// Fixed skill areas. Not user-extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillArea {
    Frontend,
    Backend,
    Tools,
}

impl SkillArea {
    /// Human-readable label.
    #[inline]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Frontend => "Frontend",
            Self::Backend => "Backend",
            Self::Tools => "Tools",
        }
    }

    /// Icon shown before the label in chat replies.
    #[inline]
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Frontend => "🎨",
            Self::Backend => "⚙️",
            Self::Tools => "🛠️",
        }
    }

    /// All areas in display order.
    pub fn all() -> [Self; 3] {
        [Self::Frontend, Self::Backend, Self::Tools]
    }
}

/// Skills grouped under one [`SkillArea`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub area: SkillArea,
    pub skills: Vec<String>,
}

impl SkillCategory {
    pub fn new<I, S>(area: SkillArea, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            area,
            skills: skills.into_iter().map(Into::into).collect(),
        }
    }

    /// Category name (the area label).
    pub fn name(&self) -> &'static str {
        self.area.label()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub profile_url: String,
}

/// Authored one-sentence answers for the "current" topics.
///
/// These summarize facts already known about the present role; they are written
/// by hand and returned verbatim, never derived from the experience list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlights {
    pub current_role: String,
    pub backend_focus: String,
    pub frontend_focus: String,
}
