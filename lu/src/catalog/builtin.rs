//! The bundled career level table
//!
//! Level n (n >= 2) costs 50 * n XP on top of level n - 1, so level 2 needs
//! 100 XP and level 3 another 150.

use super::LevelCatalogEntry;

struct LevelRow {
    title: &'static str,
    currency: u64,
    unlocks: &'static [&'static str],
    special: &'static [&'static str],
}

const fn row(
    title: &'static str,
    currency: u64,
    unlocks: &'static [&'static str],
    special: &'static [&'static str],
) -> LevelRow {
    LevelRow {
        title,
        currency,
        unlocks,
        special,
    }
}

/// Index 0 is level 1
const LEVELS: &[LevelRow] = &[
    row("Career Explorer", 0, &["profile", "job_board"], &[]),
    row("Job Seeker", 50, &["resume_builder"], &[]),
    row("Skill Builder", 75, &["skill_assessments"], &[]),
    row("Rising Talent", 100, &["custom_avatar"], &[]),
    row("Networker", 250, &["mentor_chat"], &["networker_badge"]),
    row("Interview Ready", 150, &["interview_prep"], &[]),
    row("Professional", 175, &["profile_themes"], &[]),
    row("Connector", 200, &["networking_events"], &[]),
    row("Collaborator", 225, &["team_workspace"], &[]),
    row("Career Climber", 500, &["portfolio_showcase"], &["silver_frame"]),
    row("Analyst", 275, &["analytics_dashboard"], &[]),
    row("Talent Scout", 300, &["candidate_search"], &[]),
    row("Strategist", 325, &["ai_career_coach"], &[]),
    row("Specialist", 350, &[], &[]),
    row("Industry Insider", 750, &["featured_listing"], &["insider_badge"]),
    row("Mentor", 400, &[], &[]),
    row("Expert", 425, &[], &[]),
    row("Thought Leader", 450, &["exclusive_webinars"], &[]),
    row("Trailblazer", 475, &[], &[]),
    row("Career Champion", 1000, &["prestige_badge"], &["gold_frame"]),
    row("Visionary", 525, &[], &[]),
    row("Pioneer", 550, &[], &[]),
    row("Luminary", 575, &[], &[]),
    row("Icon", 600, &[], &[]),
    row("Career Legend", 2000, &["legend_frame"], &["legend_title"]),
];

fn xp_for_level(level: u32) -> u64 {
    if level <= 1 { 0 } else { 50 * level as u64 }
}

pub(super) fn entries() -> Vec<LevelCatalogEntry> {
    let mut total = 0u64;
    LEVELS
        .iter()
        .zip(1u32..)
        .map(|(def, level)| {
            let delta = xp_for_level(level);
            total += delta;
            LevelCatalogEntry {
                level,
                total_xp_needed: total,
                xp_for_this_level: delta,
                title: def.title.to_string(),
                currency_reward: def.currency,
                unlocks: def.unlocks.iter().map(|s| s.to_string()).collect(),
                special_rewards: def.special.iter().map(|s| s.to_string()).collect(),
            }
        })
        .collect()
}
