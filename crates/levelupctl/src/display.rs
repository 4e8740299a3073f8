//! Terminal rendering for levelupctl
//!
//! Hunter-profile and skills presentation: colored ranks, attribute icons
//! and text progress bars.

use levelup_common::api::{AdminUserRow, ProfileView, SkillsResponse};
use levelup_common::types::{Attribute, CompletionRecord, Habit};
use owo_colors::OwoColorize;

/// Text progress bar over a [0, 1] fraction.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as usize;
    let filled = (percent * width) / 100;
    let empty = width.saturating_sub(filled);
    format!("[{}{}] {}%", "=".repeat(filled), "-".repeat(empty), percent)
}

fn attribute_tag(attribute: Attribute) -> &'static str {
    match attribute {
        Attribute::Brain => "🧠",
        Attribute::Health => "💪",
        Attribute::Skill => "⚔️",
        Attribute::Discipline => "🧘",
        Attribute::Focus => "🎯",
    }
}

pub fn render_status(profile: &ProfileView) {
    println!();
    println!("  {}", profile.full_name.bold());
    println!(
        "  {} XP · Level {} · {}",
        profile.current_xp.to_string().cyan(),
        profile.current_level,
        profile.rank.yellow().bold()
    );
    println!(
        "  Progress to level {}: {}  ({}/{} XP)",
        profile.current_level + 1,
        progress_bar(profile.progress_fraction, 30),
        profile.current_xp,
        profile.next_level_xp.round() as i64
    );
    if profile.streak_count > 0 {
        println!("  🔥 {}-day streak", profile.streak_count.to_string().red());
    } else {
        println!("  No active streak. Complete a habit today to start one.");
    }
    println!();
}

pub fn render_habits(habits: &[Habit], today: &[CompletionRecord]) {
    if habits.is_empty() {
        println!("No active habits. Add one with `levelupctl habits add`.");
        return;
    }
    println!();
    println!("  {}", "Daily Quest Log".bold());
    for habit in habits {
        let done = today.iter().any(|c| c.habit_id == habit.id);
        let mark = if done { "✓".green().to_string() } else { " ".to_string() };
        println!(
            "  [{}] {} {}  {} · +{} XP  ({})",
            mark,
            attribute_tag(habit.attribute),
            habit.name,
            habit.difficulty,
            habit.xp_value,
            short_id(habit),
        );
    }
    let done_count = habits
        .iter()
        .filter(|h| today.iter().any(|c| c.habit_id == h.id))
        .count();
    println!();
    println!("  Completed today: {}/{}", done_count, habits.len());
    println!();
}

pub fn render_skills(skills: &SkillsResponse) {
    println!();
    println!(
        "  Total XP {} · Level {} · {}",
        skills.total_xp.to_string().cyan(),
        skills.overall_level,
        skills.rank.yellow().bold()
    );
    println!();
    for skill in &skills.skills {
        println!(
            "  {} {:<12} Level {:<3} {}  ({} XP, {} habits)",
            attribute_tag(skill.attribute),
            skill.attribute.display_name(),
            skill.level,
            progress_bar(skill.progress_fraction, 24),
            skill.xp,
            skill.habit_count
        );
    }
    println!();
}

pub fn render_admin_users(users: &[AdminUserRow]) {
    if users.is_empty() {
        println!("No users.");
        return;
    }
    println!();
    println!(
        "  {:<36} {:<20} {:<7} {:>6} {:>8} {:>7}",
        "USER ID".bold(),
        "NAME".bold(),
        "ROLE".bold(),
        "LEVEL".bold(),
        "XP".bold(),
        "STREAK".bold()
    );
    for user in users {
        println!(
            "  {:<36} {:<20} {:<7} {:>6} {:>8} {:>7}",
            user.user_id,
            user.full_name,
            user.role.as_str(),
            user.current_level,
            user.current_xp,
            user.current_streak
        );
    }
    println!();
}

fn short_id(habit: &Habit) -> String {
    habit.id.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0, 10), "[----------] 0%");
        assert_eq!(progress_bar(1.0, 10), "[==========] 100%");
        assert_eq!(progress_bar(2.5, 10), "[==========] 100%");
        assert_eq!(progress_bar(-1.0, 10), "[----------] 0%");
    }

    #[test]
    fn test_progress_bar_midpoint() {
        assert_eq!(progress_bar(0.5, 10), "[=====-----] 50%");
    }
}
