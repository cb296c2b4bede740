// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only subcommands: leaderboard, level, notifications, audit.

use merit_core::{MeritError, UserId};
use merit_engine::{AchievementStats, Engine, LevelProgress};
use serde::Serialize;

use crate::output::{Mark, Output};

pub async fn run_leaderboard(
    engine: &Engine,
    limit: usize,
    category: Option<&str>,
    out: &Output,
) -> Result<(), MeritError> {
    let entries = engine.leaderboard(limit, category).await?;
    if out.json {
        out.json(&entries);
        return Ok(());
    }

    match category {
        Some(c) => out.header(&format!("merit leaderboard ({c})")),
        None => out.header("merit leaderboard"),
    }
    if entries.is_empty() {
        println!("    no ranked users yet");
    }
    println!(
        "    {:>4}  {:<10} {:>5} {:>8} {:>8} {:>6}",
        "rank", "user", "level", "xp", "points", "earned"
    );
    for e in &entries {
        println!(
            "    {:>4}  {:<10} {:>5} {:>8} {:>8} {:>6}",
            e.rank,
            e.user_id.to_string(),
            e.level,
            e.total_xp,
            e.total_points,
            e.total_achievements
        );
    }
    println!();
    Ok(())
}

#[derive(Debug, Serialize)]
struct LevelOutput {
    user_id: UserId,
    #[serde(flatten)]
    progress: LevelProgress,
    total_points: i64,
    stats: AchievementStats,
    badges: Vec<String>,
}

pub async fn run_level(engine: &Engine, user: UserId, out: &Output) -> Result<(), MeritError> {
    let progress = engine.user_level(user).await?;
    let total_points = engine
        .level_state(user)
        .await?
        .map_or(0, |s| s.total_points);
    let stats = engine.achievement_stats(user).await?;
    let badges: Vec<String> = engine
        .user_badges(user)
        .await?
        .into_iter()
        .map(|b| b.definition.slug)
        .collect();

    if out.json {
        out.json(&LevelOutput {
            user_id: user,
            progress,
            total_points,
            stats,
            badges,
        });
        return Ok(());
    }

    out.header(&format!("merit level: user {user}"));
    println!(
        "    Level:    {}",
        out.highlight(&progress.level.to_string())
    );
    println!("    XP:       {}", progress.total_xp);
    match progress.next_level_threshold {
        Some(next) => println!(
            "    Next:     {} XP to go (level {} at {next})",
            progress.xp_to_next_level,
            progress.level + 1
        ),
        None => println!("    Next:     maximum level reached"),
    }
    println!("    Points:   {total_points}");
    println!("    Earned:   {} achievements", stats.total_completed);
    for (category, n) in &stats.by_category {
        println!("              {category}: {n}");
    }
    if !badges.is_empty() {
        println!("    Badges:   {}", badges.join(", "));
    }
    println!();
    Ok(())
}

pub async fn run_notifications(
    engine: &Engine,
    user: UserId,
    limit: usize,
    unread: bool,
    mark_read: Option<i64>,
    out: &Output,
) -> Result<(), MeritError> {
    if let Some(id) = mark_read
        && !engine.mark_notification_read(user, id).await?
    {
        return Err(MeritError::Internal(format!(
            "notification {id} does not belong to user {user}"
        )));
    }

    let items = engine.notifications(user, limit, unread).await?;
    if out.json {
        out.json(&items);
        return Ok(());
    }

    out.header(&format!("merit notifications: user {user}"));
    if items.is_empty() {
        println!("    nothing new");
    }
    for n in &items {
        let mark = if n.is_read { Mark::Info } else { Mark::Ok };
        out.line(
            mark,
            &format!("#{:<5} {} {}: {}", n.id, n.created_at, n.title, n.message),
        );
    }
    println!();
    Ok(())
}

/// List every definition and whether its requirement can be evaluated.
pub async fn run_audit(engine: &Engine, out: &Output) -> Result<(), MeritError> {
    let audit = engine.audit().await?;
    if out.json {
        out.json(&audit);
        return Ok(());
    }

    out.header("merit audit");
    let mut problems = 0;
    for entry in &audit {
        let label = format!(
            "{:<11} {:<24} {}({})",
            entry.namespace.to_string(),
            entry.slug,
            entry.requirement_type,
            entry.requirement_value
        );
        match &entry.problem {
            None if entry.is_active => out.line(Mark::Ok, &label),
            None => out.line(Mark::Info, &format!("{label} inactive")),
            Some(problem) => {
                problems += 1;
                out.line(Mark::Warn, &format!("{label} {problem}"));
            }
        }
    }
    println!();
    println!(
        "  {} definitions, {problems} not evaluable",
        audit.len()
    );
    println!();
    Ok(())
}
