// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory activity source with scripted facts and failures.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use merit_core::{ActivitySource, Fact, FactValue, MeritError, UserId};
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    facts: HashMap<(UserId, Fact), FactValue>,
    users: BTreeSet<UserId>,
    failing: HashSet<Fact>,
    failing_users: HashSet<UserId>,
    reads: usize,
}

/// An [`ActivitySource`] backed by a fact map.
///
/// Unset facts read as zero. Facts or users marked as failing return a
/// storage error, which lets tests exercise per-achievement isolation.
#[derive(Clone, Default)]
pub struct StaticActivitySource {
    state: Arc<Mutex<State>>,
}

impl StaticActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fact for `user`, registering the user as active.
    pub async fn set(&self, user: UserId, fact: Fact, value: FactValue) {
        let mut state = self.state.lock().await;
        state.users.insert(user);
        state.facts.insert((user, fact), value);
    }

    pub async fn set_count(&self, user: UserId, fact: Fact, n: u64) {
        self.set(user, fact, FactValue::Count(n)).await;
    }

    pub async fn add_user(&self, user: UserId) {
        self.state.lock().await.users.insert(user);
    }

    /// Every read of `fact` fails from now on.
    pub async fn fail_on(&self, fact: Fact) {
        self.state.lock().await.failing.insert(fact);
    }

    /// Every read for `user` fails from now on.
    pub async fn fail_for(&self, user: UserId) {
        self.state.lock().await.failing_users.insert(user);
    }

    /// Number of fact reads served so far.
    pub async fn reads(&self) -> usize {
        self.state.lock().await.reads
    }
}

#[async_trait]
impl ActivitySource for StaticActivitySource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fact(&self, user: UserId, fact: Fact) -> Result<FactValue, MeritError> {
        let mut state = self.state.lock().await;
        state.reads += 1;
        if fact.is_engine_owned() {
            return Err(MeritError::UnknownFact {
                fact: fact.to_string(),
            });
        }
        if state.failing.contains(&fact) || state.failing_users.contains(&user) {
            return Err(MeritError::Internal(format!(
                "scripted failure reading {fact} for user {user}"
            )));
        }
        Ok(state
            .facts
            .get(&(user, fact))
            .copied()
            .unwrap_or(FactValue::Count(0)))
    }

    async fn active_users(&self) -> Result<Vec<UserId>, MeritError> {
        Ok(self.state.lock().await.users.iter().copied().collect())
    }
}
