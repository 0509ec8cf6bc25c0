//! Bundled achievements and rules

use crate::domain::{Achievement, AchievementCategory};

use super::{MetaMetric, MetaRule, StreakMilestone};

pub(super) fn achievements() -> Vec<Achievement> {
    use AchievementCategory::*;

    vec![
        Achievement::new("profile_complete", "All Set")
            .with_description("Fill in every section of your profile")
            .with_icon("user-check")
            .with_xp_reward(50),
        Achievement::new("first_application", "First Step")
            .with_description("Submit your first job application")
            .with_icon("send")
            .with_xp_reward(100)
            .with_category(Student),
        Achievement::new("first_interview", "In the Room")
            .with_description("Complete your first interview")
            .with_icon("mic")
            .with_xp_reward(150)
            .with_category(Student),
        Achievement::new("first_offer", "Offer in Hand")
            .with_description("Receive your first job offer")
            .with_icon("award")
            .with_xp_reward(500)
            .with_category(Student),
        Achievement::new("first_job_post", "Now Hiring")
            .with_description("Publish your first job posting")
            .with_icon("briefcase")
            .with_xp_reward(100)
            .with_category(Employer),
        Achievement::new("first_hire", "Team Builder")
            .with_description("Hire a candidate through the platform")
            .with_icon("users")
            .with_xp_reward(500)
            .with_category(Employer),
        Achievement::new("mentor_session", "Guided")
            .with_description("Attend a mentoring session")
            .with_icon("compass")
            .with_xp_reward(75),
        Achievement::new("streak_7", "Week Warrior")
            .with_description("Stay active seven days in a row")
            .with_icon("flame")
            .with_xp_reward(100),
        Achievement::new("streak_30", "Monthly Momentum")
            .with_description("Stay active thirty days in a row")
            .with_icon("flame")
            .with_xp_reward(300),
        Achievement::new("streak_100", "Centurion")
            .with_description("Stay active one hundred days in a row")
            .with_icon("flame")
            .with_xp_reward(1000),
    ]
}

pub(super) fn milestones() -> Vec<StreakMilestone> {
    [(7, "streak_7"), (30, "streak_30"), (100, "streak_100")]
        .into_iter()
        .map(|(days, id)| StreakMilestone {
            days,
            achievement_id: id.to_string(),
        })
        .collect()
}

pub(super) fn meta_rules() -> Vec<MetaRule> {
    let rule = |id: &str, title: &str, metric, threshold| MetaRule {
        id: id.to_string(),
        title: title.to_string(),
        metric,
        threshold,
    };

    vec![
        rule("streak_legend", "Streak Legend", MetaMetric::TotalStreakDays, 365),
        rule("first_prestige", "Born Again", MetaMetric::PrestigeLevel, 1),
        rule("triple_prestige", "Thrice Risen", MetaMetric::PrestigeLevel, 3),
        rule("xp_hoarder", "Lifelong Learner", MetaMetric::TotalXp, 100_000),
        rule("collector", "Collector", MetaMetric::AchievementCount, 10),
    ]
}
