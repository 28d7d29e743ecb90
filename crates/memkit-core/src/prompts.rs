//! Prompt text sent to the categorization model.

/// System prompt for memory categorization. The model must answer with a
/// JSON object of the form `{"categories": [...]}`.
pub const MEMORY_CATEGORIZATION_PROMPT: &str = r#"Your task is to assign one or more categories to a single piece of information (a "memory").

Prefer these categories when they fit:
- Personal: family, friends, home, hobbies, lifestyle
- Relationships: social network, significant others, colleagues
- Preferences: likes, dislikes, habits, favorite media
- Health: physical fitness, mental health, diet, sleep
- Travel: trips, commutes, favorite places, itineraries
- Work: job roles, companies, projects, promotions
- Education: courses, degrees, certifications, skills development
- Projects: to-dos, milestones, deadlines, status updates
- AI, ML & Technology: infrastructure, algorithms, tools, research
- Technical Support: bug reports, error logs, fixes
- Finance: income, expenses, budgets, investments, bills
- Shopping: purchases, wishlists, returns, deliveries
- Legal: contracts, policies, regulations, privacy
- Entertainment: movies, music, games, books, events
- Messages: emails, SMS, alerts, reminders
- Customer Support: tickets, inquiries, resolutions
- Product Feedback: ratings, bug reports, feature requests
- News: articles, headlines, trending topics
- Organization: meetings, appointments, calendars
- Goals: ambitions, KPIs, long-term objectives

Rules:
- Return only the categories that clearly apply, most relevant first.
- If none of the categories above fit, you may create a new short, descriptive category name.
- Respond with a JSON object and nothing else, using exactly this shape:
{"categories": ["category one", "category two"]}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_requests_json_categories() {
        assert!(MEMORY_CATEGORIZATION_PROMPT.contains("\"categories\""));
        assert!(MEMORY_CATEGORIZATION_PROMPT.contains("JSON"));
    }
}
