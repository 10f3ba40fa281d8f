//! Text formatting per topic.

use super::Topic;
use crate::knowledge::KnowledgeBase;

const BULLET: &str = "•";

pub(super) fn render(topic: Topic, kb: &KnowledgeBase) -> String {
    match topic {
        Topic::Experience => experience(kb),
        Topic::Education => education(kb),
        Topic::Skills => skills(kb),
        Topic::Projects => projects(kb),
        Topic::Contact => contact(kb),
        Topic::CurrentRole => kb.highlights().current_role.clone(),
        Topic::BackendFocus => kb.highlights().backend_focus.clone(),
        Topic::FrontendFocus => kb.highlights().frontend_focus.clone(),
        Topic::Fallback => fallback(kb),
    }
}

pub(super) fn greeting(kb: &KnowledgeBase) -> String {
    format!(
        "Hi! I'm {}'s AI assistant. Ask me about experience, skills, projects, or education!",
        kb.owner()
    )
}

/// Intro line, blank line, then blocks separated by blank lines.
fn with_intro(intro: String, blocks: Vec<String>) -> String {
    format!("{}\n\n{}", intro, blocks.join("\n\n"))
}

fn experience(kb: &KnowledgeBase) -> String {
    let blocks = kb
        .experience()
        .iter()
        .map(|e| format!("{} {} ({})\n  {}", BULLET, e.role, e.period, e.details))
        .collect();
    with_intro(format!("Here's {}'s work experience:", kb.owner()), blocks)
}

fn education(kb: &KnowledgeBase) -> String {
    let blocks = kb
        .education()
        .iter()
        .map(|e| {
            format!(
                "{} {} - {} ({})\n  Project: {}",
                BULLET, e.degree, e.institution, e.period, e.project
            )
        })
        .collect();
    with_intro(format!("{}'s educational background:", kb.owner()), blocks)
}

fn skills(kb: &KnowledgeBase) -> String {
    let blocks = kb
        .skills()
        .iter()
        .map(|c| format!("{} {}: {}", c.area.icon(), c.name(), c.skills.join(", ")))
        .collect();
    with_intro(format!("{}'s technical skills:", kb.owner()), blocks)
}

fn projects(kb: &KnowledgeBase) -> String {
    let blocks = kb
        .projects()
        .iter()
        .map(|p| format!("{} {}\n  {}", BULLET, p.name, p.description))
        .collect();
    with_intro("Featured projects:".to_string(), blocks)
}

fn contact(kb: &KnowledgeBase) -> String {
    let c = kb.contact();
    format!(
        "You can reach {} at:\n📧 {}\n💼 {}",
        kb.owner(),
        c.email,
        c.profile_url
    )
}

fn fallback(kb: &KnowledgeBase) -> String {
    format!(
        "I can help you learn about {}'s experience, education, skills, or projects. Try asking:\n\
         {b} What's your work experience?\n\
         {b} Tell me about your education\n\
         {b} What are your technical skills?\n\
         {b} Show me your projects\n\
         {b} How can I contact you?",
        kb.owner(),
        b = BULLET
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::SkillArea;

    #[test]
    fn experience_blocks_are_bulleted_and_blank_line_separated() {
        let kb = KnowledgeBase::portfolio();
        let text = render(Topic::Experience, &kb);
        let expected_first = format!(
            "• {} ({})\n  {}",
            kb.experience()[0].role,
            kb.experience()[0].period,
            kb.experience()[0].details
        );
        assert!(text.starts_with("Here's Iram's work experience:\n\n"));
        assert!(text.contains(&expected_first));
        assert_eq!(text.matches("\n\n• ").count(), kb.experience().len());
    }

    #[test]
    fn education_includes_project_line() {
        let kb = KnowledgeBase::portfolio();
        let text = render(Topic::Education, &kb);
        assert!(text.contains("• MS Computer Science - FAST NUCES (Expected 2025)\n  Project: Advanced Data Analytics Platform"));
        assert!(text.contains("• BS Computer Science - FAST NUCES (2018-2022)"));
    }

    #[test]
    fn skills_render_one_labeled_line_per_category() {
        let kb = KnowledgeBase::portfolio();
        let text = render(Topic::Skills, &kb);
        for area in SkillArea::all() {
            assert!(text.contains(&format!("{}: ", area.label())));
        }
        assert!(text.contains("🛠️ Tools: Git, Docker, Agile methodologies, Trello, ClickUp"));
        assert_eq!(text.split("\n\n").count(), 1 + kb.skills().len());
    }

    #[test]
    fn contact_is_two_line_block_after_intro() {
        let kb = KnowledgeBase::portfolio();
        let text = render(Topic::Contact, &kb);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "📧 irambashir889@gmail.com");
        assert_eq!(lines[2], "💼 github.com/IramBashir");
    }

    #[test]
    fn fallback_lists_sample_questions() {
        let text = render(Topic::Fallback, &KnowledgeBase::portfolio());
        assert_eq!(text.matches("• ").count(), 5);
        assert!(text.ends_with("How can I contact you?"));
    }
}
