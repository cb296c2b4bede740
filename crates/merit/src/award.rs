// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `merit check`, `merit award`, and `merit record`.

use merit_core::{AwardOutcome, AwardReceipt, MeritError, UserId};
use merit_engine::{ActivityKind, CheckReport, Engine};
use serde::Serialize;

use crate::output::{Mark, Output};

#[derive(Debug, Serialize)]
struct CheckOutput<'a> {
    achievements: &'a CheckReport,
    badges: Vec<String>,
}

fn print_receipt(out: &Output, receipt: &AwardReceipt) {
    out.line(
        Mark::Ok,
        &format!(
            "{} (+{} XP, +{} points)",
            out.highlight(&receipt.name),
            receipt.xp_awarded,
            receipt.points_awarded
        ),
    );
    if receipt.leveled_up() {
        out.line(
            Mark::Info,
            &format!("level {} -> {}", receipt.level_before, receipt.level_after),
        );
    }
}

pub fn print_check(out: &Output, report: &CheckReport) {
    for receipt in &report.awarded {
        print_receipt(out, receipt);
    }
    for (slug, percent) in &report.progressed {
        out.line(Mark::Info, &format!("{slug:<24} {percent:>3}%"));
    }
    for (slug, reason) in &report.unevaluable {
        out.line(Mark::Warn, &format!("{slug:<24} unevaluable: {reason}"));
    }
    for (slug, error) in &report.failures {
        out.line(Mark::Fail, &format!("{slug:<24} {error}"));
    }
}

/// Run every achievement and badge check for one user.
pub async fn run_check(engine: &Engine, user: UserId, out: &Output) -> Result<(), MeritError> {
    let report = engine.check_achievements(user).await?;
    let badges = engine.check_and_award_badges(user).await?;

    if out.json {
        out.json(&CheckOutput {
            achievements: &report,
            badges: badges.into_iter().map(|b| b.slug).collect(),
        });
        return Ok(());
    }

    out.header(&format!("merit check: user {user}"));
    print_check(out, &report);
    for badge in &badges {
        out.line(Mark::Ok, &format!("badge {}", out.highlight(&badge.name)));
    }
    println!();
    println!(
        "  {} awarded, {} badges, {} passes",
        report.awarded.len(),
        badges.len(),
        report.passes
    );
    println!();
    Ok(())
}

/// Evaluate and, if met, award one achievement or badge.
pub async fn run_award(
    engine: &Engine,
    user: UserId,
    slug: &str,
    badge: bool,
    out: &Output,
) -> Result<(), MeritError> {
    let outcome = if badge {
        engine.award_badge(user, slug).await?
    } else {
        engine.award(user, slug).await?
    };
    if out.json {
        out.json(&outcome);
        return Ok(());
    }

    out.header(&format!("merit award: {slug} for user {user}"));
    match &outcome {
        AwardOutcome::Completed(receipt) => print_receipt(out, receipt),
        AwardOutcome::AlreadyCompleted => out.line(Mark::Info, "already completed"),
        AwardOutcome::Progressed { percent } => {
            out.line(Mark::Info, &format!("in progress: {percent}%"));
        }
        AwardOutcome::Unevaluable { reason } => {
            out.line(Mark::Warn, &format!("unevaluable: {reason}"));
        }
    }
    println!();
    Ok(())
}

/// Credit an activity reward, then re-check achievements.
pub async fn run_record(
    engine: &Engine,
    user: UserId,
    kind: ActivityKind,
    out: &Output,
) -> Result<(), MeritError> {
    let report = engine.record_activity(user, kind).await?;
    if out.json {
        out.json(&report);
        return Ok(());
    }

    out.header(&format!("merit record: {kind} for user {user}"));
    out.line(
        Mark::Ok,
        &format!(
            "+{} XP, +{} points (level {})",
            report.credited.xp, report.credited.points, report.credited.level_after
        ),
    );
    print_check(out, &report.achievements);
    println!();
    Ok(())
}
