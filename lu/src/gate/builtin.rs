//! Bundled feature definitions

use crate::domain::{FeatureCategory, FeatureDefinition};

pub(super) fn features() -> Vec<FeatureDefinition> {
    use FeatureCategory::*;

    [
        ("profile", "Profile", 1, Core),
        ("job_board", "Job Board", 1, Core),
        ("resume_builder", "Resume Builder", 2, Core),
        ("skill_assessments", "Skill Assessments", 3, Core),
        ("custom_avatar", "Custom Avatar", 4, Cosmetic),
        ("mentor_chat", "Mentor Chat", 5, Social),
        ("interview_prep", "Interview Prep", 6, Core),
        ("profile_themes", "Profile Themes", 7, Cosmetic),
        ("networking_events", "Networking Events", 8, Social),
        ("team_workspace", "Team Workspace", 9, Social),
        ("portfolio_showcase", "Portfolio Showcase", 10, Premium),
        ("analytics_dashboard", "Analytics Dashboard", 11, Premium),
        ("candidate_search", "Candidate Search", 12, Premium),
        ("ai_career_coach", "AI Career Coach", 13, Premium),
        ("featured_listing", "Featured Listing", 15, Premium),
        ("exclusive_webinars", "Exclusive Webinars", 18, Social),
        ("prestige_badge", "Prestige Badge", 20, Cosmetic),
        ("legend_frame", "Legend Frame", 25, Cosmetic),
    ]
    .into_iter()
    .map(|(id, name, level, category)| FeatureDefinition::new(id, name, level, category))
    .collect()
}
