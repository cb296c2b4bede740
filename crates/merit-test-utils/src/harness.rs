// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine testing.
//!
//! `TestHarness` assembles a temp SQLite file with the engine migrations,
//! the host fixture tables, seeded definitions, and a ready [`Engine`].

use std::path::PathBuf;
use std::sync::Arc;

use merit_config::MeritConfig;
use merit_core::{ActivitySource, MeritError, Namespace, Rarity};
use merit_engine::Engine;
use merit_storage::queries::definitions;
use merit_storage::{Database, NewDefinition, SqliteActivitySource};

use crate::host::HostData;
use crate::static_source::StaticActivitySource;

/// A small catalog covering each requirement kind.
pub fn sample_achievements() -> Vec<NewDefinition> {
    vec![
        NewDefinition::new("first-steps", "first_login", 1)
            .rewards(10, 5)
            .category("onboarding"),
        NewDefinition::new("profile-pro", "profile_complete", 1)
            .rewards(25, 10)
            .category("onboarding"),
        NewDefinition::new("prolific-poster", "posts_count", 20)
            .rewards(50, 25)
            .category("content")
            .rarity(Rarity::Uncommon),
        NewDefinition::new("wordsmith", "article_count", 5)
            .rewards(80, 40)
            .category("content")
            .rarity(Rarity::Rare),
        NewDefinition::new("social-butterfly", "friends_count", 10)
            .rewards(40, 20)
            .category("social"),
        NewDefinition::new("photo-pioneer", "count", 3)
            .rewards(30, 15)
            .category("content"),
        NewDefinition::new("tag-team", "ref_tags", 10)
            .rewards(500, 100)
            .category("content")
            .rarity(Rarity::Epic),
    ]
}

pub fn sample_badges() -> Vec<NewDefinition> {
    vec![
        NewDefinition::new("veteran", "days_since_join", 365).rarity(Rarity::Rare),
        NewDefinition::new("collector", "achievement_count", 3).rarity(Rarity::Uncommon),
    ]
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: MeritConfig,
    achievements: Vec<NewDefinition>,
    badges: Vec<NewDefinition>,
    static_source: Option<StaticActivitySource>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: MeritConfig::default(),
            achievements: Vec::new(),
            badges: Vec::new(),
            static_source: None,
        }
    }

    /// Adjust the configuration before the engine is built.
    pub fn configure(mut self, f: impl FnOnce(&mut MeritConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn with_achievement(mut self, def: NewDefinition) -> Self {
        self.achievements.push(def);
        self
    }

    pub fn with_achievements(mut self, defs: Vec<NewDefinition>) -> Self {
        self.achievements.extend(defs);
        self
    }

    pub fn with_badge(mut self, def: NewDefinition) -> Self {
        self.badges.push(def);
        self
    }

    pub fn with_badges(mut self, defs: Vec<NewDefinition>) -> Self {
        self.badges.extend(defs);
        self
    }

    /// Read facts from an in-memory source instead of the host tables.
    pub fn with_static_source(mut self, source: StaticActivitySource) -> Self {
        self.static_source = Some(source);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(mut self) -> Result<TestHarness, MeritError> {
        let temp_dir = tempfile::TempDir::new().map_err(MeritError::storage)?;
        let db_path = temp_dir.path().join("merit.db");
        self.config.storage.database_path = db_path.to_string_lossy().into_owned();

        let db = Arc::new(Database::open_with(&self.config.storage).await?);
        let host = HostData::install(&db).await?;

        for def in &self.achievements {
            definitions::insert(&db, Namespace::Achievement, def).await?;
        }
        for def in &self.badges {
            definitions::insert(&db, Namespace::Badge, def).await?;
        }

        let source: Arc<dyn ActivitySource> = match self.static_source {
            Some(source) => Arc::new(source),
            None => Arc::new(SqliteActivitySource::from_database(&db)),
        };
        let engine = Arc::new(Engine::new(db.clone(), source.clone(), &self.config));

        Ok(TestHarness {
            engine,
            db,
            host,
            source,
            config: self.config,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine over a temp database file.
pub struct TestHarness {
    pub engine: Arc<Engine>,
    pub db: Arc<Database>,
    pub host: HostData,
    pub source: Arc<dyn ActivitySource>,
    pub config: MeritConfig,
    pub db_path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A second engine over its own connection to the same file.
    ///
    /// Used to race writers across connections rather than through one
    /// serialized connection.
    pub async fn second_engine(&self) -> Result<Engine, MeritError> {
        let db = Arc::new(Database::open_with(&self.config.storage).await?);
        Ok(Engine::new(db, self.source.clone(), &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merit_core::UserId;

    #[tokio::test]
    async fn builds_with_seeded_catalog() {
        let harness = TestHarness::builder()
            .with_achievements(sample_achievements())
            .with_badges(sample_badges())
            .build()
            .await
            .unwrap();

        let audit = harness.engine.audit().await.unwrap();
        assert_eq!(audit.len(), 9);
        assert!(harness.db_path.exists());
    }

    #[tokio::test]
    async fn host_tables_feed_the_engine() {
        let harness = TestHarness::builder()
            .with_achievements(sample_achievements())
            .build()
            .await
            .unwrap();
        harness.host.add_user(UserId(7), 1).await.unwrap();
        harness.host.add_logins(UserId(7), 1).await.unwrap();

        let users = harness.source.active_users().await.unwrap();
        assert_eq!(users, vec![UserId(7)]);
        let outcome = harness.engine.award(UserId(7), "first-steps").await.unwrap();
        assert!(outcome.is_completed());
    }
}
