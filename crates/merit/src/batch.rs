// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `merit backfill`: re-run achievement and badge checks over many users.
//!
//! Used after new definitions are added. Each user is isolated; a failing
//! user is reported and the batch continues. The command exits 0 either way.

use merit_core::{MeritError, UserId};
use merit_engine::{BackfillSummary, Engine};

use crate::output::{Mark, Output};

pub async fn run_backfill(
    engine: &Engine,
    users: &[i64],
    out: &Output,
) -> Result<(), MeritError> {
    let summary = if users.is_empty() {
        engine.backfill_all().await?
    } else {
        let users: Vec<UserId> = users.iter().copied().map(UserId).collect();
        engine.backfill(&users).await
    };

    if out.json {
        out.json(&summary);
    } else {
        print_summary(out, &summary);
    }
    Ok(())
}

fn print_summary(out: &Output, summary: &BackfillSummary) {
    out.header("merit backfill");
    for result in &summary.results {
        let awarded = result.achievements.len() + result.badges.len();
        let mark = if result.failures > 0 {
            Mark::Warn
        } else if awarded > 0 {
            Mark::Ok
        } else {
            Mark::Info
        };
        let mut names: Vec<&str> = result.achievements.iter().map(String::as_str).collect();
        names.extend(result.badges.iter().map(String::as_str));
        out.line(
            mark,
            &format!(
                "user {:<8} {awarded} new {}",
                result.user_id,
                if names.is_empty() {
                    String::new()
                } else {
                    format!("({})", names.join(", "))
                }
            ),
        );
    }
    for (user, error) in &summary.failed_users {
        out.line(Mark::Fail, &format!("user {user:<8} {error}"));
    }

    println!();
    println!(
        "  Processed {} users: {} achievements, {} badges awarded, {} failed",
        summary.users_processed,
        summary.achievements_awarded,
        summary.badges_awarded,
        summary.failed_users.len()
    );
    println!();
}
