//! Knowledge base container: built-in portfolio data and one-shot JSON loading.

use super::{
    ContactInfo, EducationEntry, ExperienceEntry, Highlights, ProjectEntry, SkillArea,
    SkillCategory,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Failure to load a knowledge base file. Accessors on a loaded base never fail.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("failed to read knowledge base {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid knowledge base JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("skill area {0:?} listed more than once")]
    DuplicateSkillArea(SkillArea),
    #[error("skill area {0:?} missing")]
    MissingSkillArea(SkillArea),
}

/// Read-only portfolio facts shared by every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    owner: String,
    experience: Vec<ExperienceEntry>,
    education: Vec<EducationEntry>,
    skills: Vec<SkillCategory>,
    projects: Vec<ProjectEntry>,
    contact: ContactInfo,
    highlights: Highlights,
}

impl KnowledgeBase {
    /// Built-in portfolio data served when no knowledge file is configured.
    pub fn portfolio() -> Self {
        Self {
            owner: "Iram".to_string(),
            experience: vec![
                ExperienceEntry {
                    role: "Junior Backend Developer at Norvana".to_string(),
                    period: "Dec 2024 - Present".to_string(),
                    details: "Built scalable backend services with Nest.js and TypeORM. Optimized PostgreSQL queries by 40%. Implemented JWT & OAuth2 authentication.".to_string(),
                },
                ExperienceEntry {
                    role: "Front-End Developer at Tourly Technologies".to_string(),
                    period: "Nov 2023 - Sep 2024".to_string(),
                    details: "Developed responsive UIs with React.js and TypeScript. Optimized performance and ensured accessibility compliance.".to_string(),
                },
                ExperienceEntry {
                    role: "Software Engineer at Jin Technologies".to_string(),
                    period: "Oct 2022 - Oct 2023".to_string(),
                    details: "Led migration of 4D desktop app to web platform, boosting efficiency by 80%. Integrated worker threads reducing processing time by 90%.".to_string(),
                },
            ],
            education: vec![
                EducationEntry {
                    degree: "MS Computer Science".to_string(),
                    institution: "FAST NUCES".to_string(),
                    period: "Expected 2025".to_string(),
                    project: "Advanced Data Analytics Platform with Python, React.js, and PostgreSQL".to_string(),
                },
                EducationEntry {
                    degree: "BS Computer Science".to_string(),
                    institution: "FAST NUCES".to_string(),
                    period: "2018-2022".to_string(),
                    project: "Route & Safety Awareness App using Yolov5, CNN, and Raspberry Pi".to_string(),
                },
            ],
            skills: vec![
                SkillCategory::new(
                    SkillArea::Frontend,
                    ["React.js", "Next.js", "TypeScript", "Tailwind CSS", "SASS", "HTML5/CSS"],
                ),
                SkillCategory::new(
                    SkillArea::Backend,
                    ["Node.js", "Nest.js", "TypeORM", "RESTful APIs", "Swagger", "Postman"],
                ),
                SkillCategory::new(
                    SkillArea::Tools,
                    ["Git", "Docker", "Agile methodologies", "Trello", "ClickUp"],
                ),
            ],
            projects: vec![
                ProjectEntry {
                    name: "Real-time Task Board".to_string(),
                    description: "Collaborative task management with Socket.IO, featuring real-time updates and optimistic UI".to_string(),
                },
                ProjectEntry {
                    name: "Warraich Contracting".to_string(),
                    description: "Responsive business website with modern design for construction company".to_string(),
                },
            ],
            contact: ContactInfo {
                email: "irambashir889@gmail.com".to_string(),
                profile_url: "github.com/IramBashir".to_string(),
            },
            highlights: Highlights {
                current_role: "Iram is currently a Junior Backend Developer at Norvana (since Dec 2024) and pursuing an MS in Computer Science at FAST NUCES (expected 2025).".to_string(),
                backend_focus: "Iram has strong expertise in Nest.js! At Norvana, Iram builds scalable backend services with TypeORM and PostgreSQL, has optimized database queries by 40%, and has implemented secure authentication systems.".to_string(),
                frontend_focus: "Iram is highly skilled in React.js and Next.js! During the contract role at Tourly Technologies, Iram built responsive, pixel-perfect UIs and worked extensively with TypeScript and Tailwind CSS.".to_string(),
            },
        }
    }

    /// Parses a knowledge base from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, KnowledgeError> {
        let kb: Self = serde_json::from_str(json)?;
        kb.validate()?;
        Ok(kb)
    }

    /// Loads a knowledge base from a JSON file. Intended to run once at startup.
    pub fn load_json_path(path: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let kb = Self::from_json_str(&raw)?;
        tracing::info!(
            target: "folio::knowledge",
            path = %path.display(),
            experience = kb.experience.len(),
            projects = kb.projects.len(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    /// Every skill area appears exactly once, in any order.
    fn validate(&self) -> Result<(), KnowledgeError> {
        let mut seen = Vec::with_capacity(self.skills.len());
        for category in &self.skills {
            if seen.contains(&category.area) {
                return Err(KnowledgeError::DuplicateSkillArea(category.area));
            }
            seen.push(category.area);
        }
        match SkillArea::all().into_iter().find(|area| !seen.contains(area)) {
            Some(area) => Err(KnowledgeError::MissingSkillArea(area)),
            None => Ok(()),
        }
    }

    /// Display name used in introductions, greeting and fallback text.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn experience(&self) -> &[ExperienceEntry] {
        &self.experience
    }

    pub fn education(&self) -> &[EducationEntry] {
        &self.education
    }

    pub fn skills(&self) -> &[SkillCategory] {
        &self.skills
    }

    pub fn projects(&self) -> &[ProjectEntry] {
        &self.projects
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn highlights(&self) -> &Highlights {
        &self.highlights
    }

    // Builder-style overrides, applied before the base is shared.

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_experience(mut self, experience: Vec<ExperienceEntry>) -> Self {
        self.experience = experience;
        self
    }

    pub fn with_education(mut self, education: Vec<EducationEntry>) -> Self {
        self.education = education;
        self
    }

    /// Replaces the skill categories; they must still cover every area once.
    pub fn with_skills(mut self, skills: Vec<SkillCategory>) -> Result<Self, KnowledgeError> {
        self.skills = skills;
        self.validate()?;
        Ok(self)
    }

    pub fn with_projects(mut self, projects: Vec<ProjectEntry>) -> Self {
        self.projects = projects;
        self
    }

    pub fn with_contact(mut self, contact: ContactInfo) -> Self {
        self.contact = contact;
        self
    }

    pub fn with_highlights(mut self, highlights: Highlights) -> Self {
        self.highlights = highlights;
        self
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::portfolio()
    }
}
