extern crate rocket;
use rocket::async_test;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use entity::prelude::*;
    use entity::{golfer, pick, tournament, tournament_result, user};
    use migration::MigratorTrait;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use rocket::Config;
    use sea_orm::ActiveValue::{NotSet, Set};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, SqlErr,
    };

    use api::{build_rocket, Providers};
    use service::config::Settings;
    use service::dto::catalog::{CatalogPlayer, CatalogResult, CatalogTournament};
    use service::dto::live_golf::{EarningsRow, LeaderboardRow, ScheduleEntry};
    use service::dto::TournamentInput;
    use service::error::{GatewayError, GenericError, PickError, RemoteError};
    use service::gateway::{LiveGolfFeed, TournamentCatalog};
    use service::ledger::{
        delete_picks, reveal_instant, spend_double_pick, submit_pick, Actor, PickRequest,
    };
    use service::merge::merge_with_autoresolve;
    use service::resolver::sync_live_golf_ids;
    use service::sync::{
        PersistOutcome, Record, RemoteSession, RemoteStore, RemoteTable, Synchronizer,
    };

    async fn make_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.sqlx_logging(false);
        let db = Database::connect(opt).await.expect("sqlite must open");
        migration::Migrator::up(&db, None)
            .await
            .expect("Migration success");
        db
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn early_season() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    struct Pool {
        db: DatabaseConnection,
        jacob: i32,
        carl: i32,
        sentry: i32,
        phoenix: i32,
        masters: i32,
    }

    impl Pool {
        async fn golfer(&self, name: &str) -> i32 {
            Golfer::find()
                .filter(golfer::Column::Name.eq(name))
                .one(&self.db)
                .await
                .unwrap()
                .unwrap_or_else(|| panic!("{name} is seeded"))
                .id
        }

        async fn user(&self, id: i32) -> user::Model {
            User::find_by_id(id).one(&self.db).await.unwrap().unwrap()
        }

        async fn tournament(&self, id: i32) -> tournament::Model {
            Tournament::find_by_id(id).one(&self.db).await.unwrap().unwrap()
        }

        async fn results(&self, tournament_id: i32) -> Vec<tournament_result::Model> {
            TournamentResult::find()
                .filter(tournament_result::Column::TournamentId.eq(tournament_id))
                .all(&self.db)
                .await
                .unwrap()
        }

        async fn pick_count(&self) -> usize {
            Pick::find().all(&self.db).await.unwrap().len()
        }

        async fn owner_pick(
            &self,
            user_id: i32,
            tournament_id: i32,
            golfers: &[&str],
            spend_double_pick: bool,
            now: DateTime<Utc>,
        ) -> Result<service::dto::PickReceipt, GenericError> {
            let request = PickRequest {
                user_id,
                tournament_id,
                golfer_id: self.golfer(golfers[0]).await,
                second_golfer_id: match golfers.get(1) {
                    Some(name) => Some(self.golfer(name).await),
                    None => None,
                },
                spend_double_pick,
                actor: Actor::Owner,
            };
            submit_pick(&self.db, request, now).await
        }
    }

    async fn add_tournament(
        db: &DatabaseConnection,
        name: &str,
        start: NaiveDate,
        is_major: bool,
    ) -> i32 {
        TournamentInput {
            name: name.to_string(),
            start_date: start,
            end_date: start + Duration::days(3),
            is_major,
            is_signature: false,
            season: 2026,
            purse: if is_major { None } else { Some(20_000_000) },
        }
        .upsert(db)
        .await
        .unwrap()
    }

    async fn seeded_pool() -> Pool {
        let db = make_db().await;
        let members = vec!["Jacob".to_string(), "Carl".to_string(), "Admin".to_string()];
        service::ensure_members(&db, &members, Some("Admin"))
            .await
            .unwrap();
        service::import_roster(
            &db,
            "Scottie Scheffler, 1, 5000\nJake Knapp, 28\nSi Woo Kim\nRory McIlroy, 2\nXander Schauffele, 3",
            false,
        )
        .await
        .unwrap();

        let sentry = add_tournament(&db, "The Sentry", date(2026, 1, 8), false).await;
        let phoenix = add_tournament(&db, "WM Phoenix Open", date(2026, 2, 5), false).await;
        let masters = add_tournament(&db, "Masters Tournament", date(2026, 4, 9), true).await;

        let jacob = service::user_by_name(&db, "Jacob").await.unwrap().unwrap().id;
        let carl = service::user_by_name(&db, "Carl").await.unwrap().unwrap().id;
        Pool {
            db,
            jacob,
            carl,
            sentry,
            phoenix,
            masters,
        }
    }

    fn pick_error(result: Result<service::dto::PickReceipt, GenericError>) -> PickError {
        match result {
            Err(GenericError::PickError(e)) => e,
            other => panic!("expected a pick rejection, got {other:?}"),
        }
    }

    #[async_test]
    async fn golfer_cannot_be_used_twice_in_a_season() {
        let pool = seeded_pool().await;
        let now = early_season();

        pool.owner_pick(pool.jacob, pool.sentry, &["Scottie Scheffler"], false, now)
            .await
            .unwrap();
        let err = pick_error(
            pool.owner_pick(pool.jacob, pool.phoenix, &["Scottie Scheffler"], false, now)
                .await,
        );
        assert!(matches!(err, PickError::GolferAlreadyUsed(_)));

        // Another participant is not affected.
        pool.owner_pick(pool.carl, pool.phoenix, &["Scottie Scheffler"], false, now)
            .await
            .unwrap();
    }

    #[async_test]
    async fn resubmitting_replaces_the_earlier_pick() {
        let pool = seeded_pool().await;
        let now = early_season();

        pool.owner_pick(pool.jacob, pool.sentry, &["Scottie Scheffler"], false, now)
            .await
            .unwrap();
        pool.owner_pick(pool.jacob, pool.sentry, &["Jake Knapp"], false, now)
            .await
            .unwrap();
        assert_eq!(pool.pick_count().await, 1);

        pool.owner_pick(pool.jacob, pool.phoenix, &["Scottie Scheffler"], false, now)
            .await
            .unwrap();
        assert_eq!(pool.pick_count().await, 2);
    }

    #[async_test]
    async fn double_pick_is_spent_once() {
        let pool = seeded_pool().await;
        let now = early_season();

        let receipt = pool
            .owner_pick(pool.carl, pool.sentry, &["Jake Knapp", "Si Woo Kim"], true, now)
            .await
            .unwrap();
        assert!(receipt.double_pick_spent);
        assert_eq!(receipt.golfer_ids.len(), 2);
        assert!(pool.user(pool.carl).await.double_pick_used);

        let err = pick_error(
            pool.owner_pick(
                pool.carl,
                pool.phoenix,
                &["Rory McIlroy", "Xander Schauffele"],
                true,
                now,
            )
            .await,
        );
        assert!(matches!(err, PickError::DoublePickExhausted(_)));
        assert_eq!(pool.pick_count().await, 2);
    }

    #[async_test]
    async fn double_pick_token_flips_only_once() {
        let pool = seeded_pool().await;

        spend_double_pick(&pool.db, pool.carl).await.unwrap();
        let err = spend_double_pick(&pool.db, pool.carl).await.unwrap_err();
        assert!(matches!(
            err,
            GenericError::PickError(PickError::DoublePickExhausted(_))
        ));
        assert!(pool.user(pool.carl).await.double_pick_used);
        assert!(!pool.user(pool.jacob).await.double_pick_used);

        // A submission that loses the token keeps none of its rows.
        let err = pick_error(
            pool.owner_pick(pool.carl, pool.sentry, &["Jake Knapp", "Si Woo Kim"], true, early_season())
                .await,
        );
        assert!(matches!(err, PickError::DoublePickExhausted(_)));
        assert_eq!(pool.pick_count().await, 0);
    }

    #[async_test]
    async fn season_rules_are_reported_before_roster_state() {
        let pool = seeded_pool().await;
        let now = early_season();
        pool.owner_pick(pool.jacob, pool.sentry, &["Jake Knapp"], false, now)
            .await
            .unwrap();

        let knapp = pool.golfer("Jake Knapp").await;
        golfer::ActiveModel {
            id: Set(knapp),
            active: Set(false),
            ..Default::default()
        }
        .update(&pool.db)
        .await
        .unwrap();

        let err = pick_error(
            pool.owner_pick(pool.jacob, pool.phoenix, &["Jake Knapp"], false, now)
                .await,
        );
        assert!(matches!(err, PickError::GolferAlreadyUsed(_)));

        let err = pick_error(
            pool.owner_pick(pool.carl, pool.phoenix, &["Jake Knapp"], false, now)
                .await,
        );
        assert!(matches!(err, PickError::UnknownGolfer(_)));
        assert_eq!(pool.pick_count().await, 1);
    }

    #[async_test]
    async fn rejections_follow_the_check_order() {
        let pool = seeded_pool().await;
        let now = early_season();

        pool.owner_pick(pool.jacob, pool.sentry, &["Jake Knapp"], false, now)
            .await
            .unwrap();

        let err = pick_error(
            pool.owner_pick(pool.jacob, pool.phoenix, &["Rory McIlroy", "Jake Knapp"], true, now)
                .await,
        );
        assert!(matches!(err, PickError::SecondGolferAlreadyUsed(_)));

        let err = pick_error(
            pool.owner_pick(pool.jacob, pool.phoenix, &["Rory McIlroy", "Rory McIlroy"], true, now)
                .await,
        );
        assert!(matches!(err, PickError::SameGolferTwice(_)));

        let err = pick_error(
            pool.owner_pick(
                pool.jacob,
                pool.phoenix,
                &["Rory McIlroy", "Xander Schauffele"],
                false,
                now,
            )
            .await,
        );
        assert!(matches!(err, PickError::SecondPickNeedsDoublePick(_)));
        assert!(!pool.user(pool.jacob).await.double_pick_used);
    }

    #[async_test]
    async fn majors_take_two_free_golfers() {
        let pool = seeded_pool().await;
        let now = early_season();

        let err = pick_error(
            pool.owner_pick(pool.jacob, pool.masters, &["Rory McIlroy"], false, now)
                .await,
        );
        assert!(matches!(err, PickError::MajorNeedsTwoGolfers(_)));

        let receipt = pool
            .owner_pick(
                pool.jacob,
                pool.masters,
                &["Rory McIlroy", "Xander Schauffele"],
                true,
                now,
            )
            .await
            .unwrap();
        assert!(!receipt.double_pick_spent);
        assert!(!pool.user(pool.jacob).await.double_pick_used);
    }

    #[async_test]
    async fn picks_lock_at_seven_new_york_time() {
        let pool = seeded_pool().await;
        let reveal = reveal_instant(date(2026, 1, 8));
        assert_eq!(reveal, Utc.with_ymd_and_hms(2026, 1, 8, 12, 0, 0).unwrap());

        let err = pick_error(
            pool.owner_pick(pool.jacob, pool.sentry, &["Jake Knapp"], false, reveal)
                .await,
        );
        assert!(matches!(err, PickError::Locked(_)));

        pool.owner_pick(
            pool.jacob,
            pool.sentry,
            &["Jake Knapp"],
            false,
            reveal - Duration::minutes(1),
        )
        .await
        .unwrap();

        // Administrators backfill after the lock.
        let request = PickRequest {
            user_id: pool.carl,
            tournament_id: pool.sentry,
            golfer_id: pool.golfer("Si Woo Kim").await,
            second_golfer_id: None,
            spend_double_pick: false,
            actor: Actor::Admin {
                replace_existing: true,
            },
        };
        submit_pick(&pool.db, request, reveal + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(pool.pick_count().await, 2);
    }

    #[async_test]
    async fn deleting_picks_keeps_the_double_pick_spent() {
        let pool = seeded_pool().await;
        let now = early_season();
        pool.owner_pick(pool.carl, pool.sentry, &["Jake Knapp", "Si Woo Kim"], true, now)
            .await
            .unwrap();

        let jacob = pool.user(pool.jacob).await;
        let err = delete_picks(&pool.db, &jacob, pool.carl, pool.sentry, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenericError::PickError(PickError::NotPermitted(_))
        ));

        let carl = pool.user(pool.carl).await;
        let removed = delete_picks(&pool.db, &carl, pool.carl, pool.sentry, now)
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(pool.user(pool.carl).await.double_pick_used);

        // Golfers come back, the token does not.
        pool.owner_pick(pool.carl, pool.phoenix, &["Jake Knapp"], false, now)
            .await
            .unwrap();
    }

    #[async_test]
    async fn owners_cannot_delete_after_the_lock_but_admins_can() {
        let pool = seeded_pool().await;
        pool.owner_pick(pool.jacob, pool.sentry, &["Jake Knapp"], false, early_season())
            .await
            .unwrap();
        let after_lock = reveal_instant(date(2026, 1, 8)) + Duration::hours(1);

        let jacob = pool.user(pool.jacob).await;
        let err = delete_picks(&pool.db, &jacob, pool.jacob, pool.sentry, after_lock)
            .await
            .unwrap_err();
        assert!(matches!(err, GenericError::PickError(PickError::Locked(_))));

        let admin = service::user_by_name(&pool.db, "Admin")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.is_admin);
        let removed = delete_picks(&pool.db, &admin, pool.jacob, pool.sentry, after_lock)
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[async_test]
    async fn unique_index_rejects_a_second_claim() {
        let pool = seeded_pool().await;
        let knapp = pool.golfer("Jake Knapp").await;
        let row = |tournament_id| pick::ActiveModel {
            id: NotSet,
            user_id: Set(pool.jacob),
            tournament_id: Set(tournament_id),
            golfer_id: Set(knapp),
            created_at: Set(early_season()),
        };

        row(pool.sentry).insert(&pool.db).await.unwrap();
        let err: DbErr = row(pool.phoenix).insert(&pool.db).await.unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
    }

    #[async_test]
    async fn standings_sum_purses_of_picked_golfers() {
        let pool = seeded_pool().await;
        let now = early_season();
        pool.owner_pick(pool.jacob, pool.sentry, &["Jake Knapp"], false, now)
            .await
            .unwrap();
        pool.owner_pick(pool.carl, pool.sentry, &["Scottie Scheffler"], false, now)
            .await
            .unwrap();

        let report = service::clipboard::import_clipboard(
            &pool.db,
            pool.sentry,
            "1\tScottie Scheffler\t$3,600,000\nT3 Jake Knapp $400,987\nT9 Nobody Known $120,000\nnonsense",
        )
        .await
        .unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.unknown_golfers, vec!["Nobody Known".to_string()]);
        assert_eq!(report.unparsed_lines, vec![4]);

        let table = service::standings(&pool.db).await.unwrap();
        assert_eq!(table[0].user, "Carl");
        assert_eq!(table[0].total, 3_600_000);
        assert_eq!(table[0].wins, 1);
        assert_eq!(table[1].user, "Jacob");
        assert_eq!(table[1].total, 400_987);
        assert_eq!(table[1].top5, 1);
        assert_eq!(table[2].total, 0);
    }

    #[async_test]
    async fn picks_stay_hidden_until_reveal() {
        let pool = seeded_pool().await;
        let now = early_season();
        pool.owner_pick(pool.jacob, pool.sentry, &["Jake Knapp"], false, now)
            .await
            .unwrap();

        let carl = pool.user(pool.carl).await;
        let view = service::tournament_picks(&pool.db, pool.sentry, Some(&carl), now)
            .await
            .unwrap();
        assert!(!view.revealed);
        assert_eq!(view.entries[0].pick_count, 1);
        assert!(view.entries[0].golfers.is_none());

        let jacob = pool.user(pool.jacob).await;
        let own = service::tournament_picks(&pool.db, pool.sentry, Some(&jacob), now)
            .await
            .unwrap();
        assert_eq!(own.entries[0].golfers, Some(vec!["Jake Knapp".to_string()]));

        let later = reveal_instant(date(2026, 1, 8));
        let view = service::tournament_picks(&pool.db, pool.sentry, None, later)
            .await
            .unwrap();
        assert!(view.revealed);
        assert!(view.entries[0].golfers.is_some());
    }

    #[derive(Default)]
    struct FakeFeed {
        schedules: HashMap<i32, Vec<ScheduleEntry>>,
        leaderboards: HashMap<(String, i32), Vec<LeaderboardRow>>,
        earnings: HashMap<(String, i32), Vec<EarningsRow>>,
        calls: Mutex<Vec<String>>,
    }

    fn not_found(resource: &str) -> GatewayError {
        GatewayError::Status {
            resource: resource.to_string(),
            status: 404,
        }
    }

    #[rocket::async_trait]
    impl LiveGolfFeed for FakeFeed {
        async fn schedule(&self, year: i32) -> Result<Vec<ScheduleEntry>, GatewayError> {
            self.calls.lock().unwrap().push(format!("schedule {year}"));
            Ok(self.schedules.get(&year).cloned().unwrap_or_default())
        }

        async fn leaderboard(
            &self,
            event_id: &str,
            year: i32,
        ) -> Result<Vec<LeaderboardRow>, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("leaderboard {event_id} {year}"));
            self.leaderboards
                .get(&(event_id.to_string(), year))
                .cloned()
                .ok_or_else(|| not_found("/leaderboard"))
        }

        async fn earnings(
            &self,
            event_id: &str,
            year: i32,
        ) -> Result<Vec<EarningsRow>, GatewayError> {
            self.earnings
                .get(&(event_id.to_string(), year))
                .cloned()
                .ok_or_else(|| not_found("/earnings"))
        }
    }

    fn board_row(first: &str, last: &str, position: Option<i32>) -> LeaderboardRow {
        LeaderboardRow {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            position,
        }
    }

    fn money_row(first: &str, last: &str, earnings: i64) -> EarningsRow {
        EarningsRow {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            earnings: Some(earnings),
        }
    }

    fn sentry_feed() -> FakeFeed {
        let key = ("016".to_string(), 2026);
        FakeFeed {
            schedules: HashMap::from([(
                2026,
                vec![ScheduleEntry {
                    id: Some("016".to_string()),
                    name: Some("The Sentry".to_string()),
                    start_date: Some(date(2026, 1, 8)),
                }],
            )]),
            leaderboards: HashMap::from([(
                key.clone(),
                vec![
                    board_row("Jake", "Knapp", Some(3)),
                    board_row("Scottie", "Scheffler", Some(1)),
                    board_row("Walk", "On", Some(40)),
                ],
            )]),
            earnings: HashMap::from([(
                key,
                vec![
                    money_row("Jake", "Knapp", 400_987),
                    money_row("Scottie", "Scheffler", 3_600_000),
                    money_row("Walk", "On", 21_000),
                ],
            )]),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[async_test]
    async fn merge_is_idempotent() {
        let pool = seeded_pool().await;
        let feed = sentry_feed();

        let first = merge_with_autoresolve(&pool.db, &feed, Some("016"), 2026, pool.sentry)
            .await
            .unwrap();
        assert_eq!(first.updated, 2);
        assert_eq!(first.skipped, 1);
        assert_eq!(first.event_id.as_deref(), Some("016"));

        let second = merge_with_autoresolve(&pool.db, &feed, Some("016"), 2026, pool.sentry)
            .await
            .unwrap();
        assert_eq!(second, first);

        let results = pool.results(pool.sentry).await;
        assert_eq!(results.len(), 2);
        let knapp = pool.golfer("Jake Knapp").await;
        let row = results.iter().find(|r| r.golfer_id == knapp).unwrap();
        assert_eq!(row.purse, 400_987);
        assert_eq!(row.position, Some(3));
        assert_eq!(
            pool.tournament(pool.sentry).await.live_golf_id.as_deref(),
            Some("016")
        );
    }

    #[async_test]
    async fn positions_only_update_keeps_recorded_purses() {
        let pool = seeded_pool().await;
        merge_with_autoresolve(&pool.db, &sentry_feed(), Some("016"), 2026, pool.sentry)
            .await
            .unwrap();

        let mut feed = sentry_feed();
        feed.earnings.clear();
        feed.leaderboards.insert(
            ("016".to_string(), 2026),
            vec![board_row("Jake", "Knapp", Some(2))],
        );
        let report = merge_with_autoresolve(&pool.db, &feed, Some("016"), 2026, pool.sentry)
            .await
            .unwrap();
        assert_eq!(report.updated, 1);

        let knapp = pool.golfer("Jake Knapp").await;
        let results = pool.results(pool.sentry).await;
        let row = results.iter().find(|r| r.golfer_id == knapp).unwrap();
        assert_eq!(row.purse, 400_987);
        assert_eq!(row.position, Some(2));
    }

    #[async_test]
    async fn stale_event_id_falls_back_to_resolution() {
        let pool = seeded_pool().await;
        let feed = sentry_feed();

        let report = merge_with_autoresolve(&pool.db, &feed, Some("999"), 2026, pool.sentry)
            .await
            .unwrap();
        assert_eq!(report.event_id.as_deref(), Some("016"));
        assert_eq!(report.year, Some(2026));

        let calls = feed.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "leaderboard 999 2026",
                "leaderboard 999 2025",
                "schedule 2026",
                "leaderboard 016 2026",
            ]
        );
        assert_eq!(
            pool.tournament(pool.sentry).await.live_golf_id.as_deref(),
            Some("016")
        );
    }

    #[async_test]
    async fn unresolvable_event_reports_the_failure() {
        let pool = seeded_pool().await;
        let feed = FakeFeed::default();

        let err = merge_with_autoresolve(&pool.db, &feed, Some("999"), 2026, pool.phoenix)
            .await
            .unwrap_err();
        assert!(matches!(err, GenericError::Upstream(_)));
        assert!(pool.results(pool.phoenix).await.is_empty());
    }

    #[async_test]
    async fn bulk_resolution_assigns_literal_matches() {
        let pool = seeded_pool().await;
        let feed = FakeFeed {
            schedules: HashMap::from([(
                2026,
                vec![
                    ScheduleEntry {
                        id: Some("016".to_string()),
                        name: Some("Sentry".to_string()),
                        start_date: Some(date(2026, 1, 8)),
                    },
                    ScheduleEntry {
                        id: Some("003".to_string()),
                        name: Some("WM Phoenix Open".to_string()),
                        start_date: None,
                    },
                    ScheduleEntry {
                        id: Some("777".to_string()),
                        name: Some("Zurich Classic of New Orleans".to_string()),
                        start_date: Some(date(2026, 4, 23)),
                    },
                ],
            )]),
            ..Default::default()
        };

        let counts = sync_live_golf_ids(&pool.db, &feed, 2026).await.unwrap();
        assert_eq!(counts.updated, 2);
        assert_eq!(counts.skipped, 1);
        assert_eq!(
            pool.tournament(pool.phoenix).await.live_golf_id.as_deref(),
            Some("003")
        );
        assert!(pool.tournament(pool.masters).await.live_golf_id.is_none());
    }

    struct FakeCatalog;

    #[rocket::async_trait]
    impl TournamentCatalog for FakeCatalog {
        async fn tournaments(&self, season: i32) -> Result<Vec<CatalogTournament>, GatewayError> {
            Ok(vec![
                CatalogTournament {
                    id: 11,
                    name: "The Sentry".to_string(),
                    season: Some(season),
                    start_date: "2026-01-08T00:00:00.000Z".to_string(),
                    end_date: Some("2026-01-11".to_string()),
                },
                CatalogTournament {
                    id: 12,
                    name: "Sony Open in Hawaii".to_string(),
                    season: Some(season),
                    start_date: "2026-01-15".to_string(),
                    end_date: None,
                },
            ])
        }

        async fn tournament_results(
            &self,
            catalog_id: i32,
        ) -> Result<Vec<CatalogResult>, GatewayError> {
            if catalog_id != 11 {
                return Ok(Vec::new());
            }
            Ok(vec![
                CatalogResult {
                    player: Some(CatalogPlayer {
                        id: Some(501),
                        display_name: Some("Jake Knapp".to_string()),
                    }),
                    earnings: Some(400_987),
                    position_numeric: Some(3),
                },
                CatalogResult {
                    player: Some(CatalogPlayer {
                        id: Some(502),
                        display_name: Some("Nick Taylor".to_string()),
                    }),
                    earnings: Some(80_000),
                    position_numeric: Some(22),
                },
                CatalogResult {
                    player: None,
                    earnings: None,
                    position_numeric: None,
                },
            ])
        }
    }

    #[async_test]
    async fn catalog_sync_fills_schedule_and_results() {
        let pool = seeded_pool().await;

        let schedule = service::catalog_sync::sync_catalog_tournaments(&pool.db, &FakeCatalog, 2026)
            .await
            .unwrap();
        assert_eq!(schedule.updated, 1);
        assert_eq!(schedule.inserted, 1);
        assert_eq!(pool.tournament(pool.sentry).await.catalog_id, Some(11));

        let results = service::catalog_sync::sync_catalog_results(&pool.db, &FakeCatalog, 2026)
            .await
            .unwrap();
        assert_eq!(results.updated, 2);
        assert_eq!(results.inserted, 1);
        assert_eq!(results.skipped, 1);

        let taylor = pool.golfer("Nick Taylor").await;
        assert!(pool
            .results(pool.sentry)
            .await
            .iter()
            .any(|r| r.golfer_id == taylor && r.purse == 80_000));
    }

    /// Spreadsheet stand-in keeping each table as plain rows.
    #[derive(Default)]
    struct MemoryStore {
        tables: Mutex<HashMap<RemoteTable, Vec<Vec<String>>>>,
        connects: AtomicUsize,
        reads: AtomicUsize,
    }

    impl MemoryStore {
        fn with(table: RemoteTable, rows: Vec<Vec<&str>>) -> Self {
            let store = Self::default();
            store.put(table, rows);
            store
        }

        fn put(&self, table: RemoteTable, rows: Vec<Vec<&str>>) {
            self.tables.lock().unwrap().insert(
                table,
                rows.into_iter()
                    .map(|r| r.into_iter().map(String::from).collect())
                    .collect(),
            );
        }

        fn rows(&self, table: RemoteTable) -> Vec<Vec<String>> {
            self.tables
                .lock()
                .unwrap()
                .get(&table)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[rocket::async_trait]
    impl RemoteStore for MemoryStore {
        async fn connect(&self) -> Result<RemoteSession, RemoteError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteSession {
                tables: self
                    .tables
                    .lock()
                    .unwrap()
                    .keys()
                    .map(|t| t.tab().to_string())
                    .collect(),
            })
        }

        async fn read_table(
            &self,
            _session: &RemoteSession,
            table: RemoteTable,
        ) -> Result<Vec<Record>, RemoteError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .rows(table)
                .into_iter()
                .map(|row| {
                    table
                        .header()
                        .iter()
                        .zip(row)
                        .map(|(key, value)| (key.to_string(), value))
                        .collect()
                })
                .collect())
        }

        async fn write_table(
            &self,
            session: &RemoteSession,
            table: RemoteTable,
            rows: Vec<Vec<String>>,
        ) -> Result<bool, RemoteError> {
            self.tables.lock().unwrap().insert(table, rows);
            Ok(!session.has(table))
        }
    }

    struct BrokenStore;

    #[rocket::async_trait]
    impl RemoteStore for BrokenStore {
        async fn connect(&self) -> Result<RemoteSession, RemoteError> {
            Err(RemoteError::Status(503))
        }

        async fn read_table(
            &self,
            _session: &RemoteSession,
            _table: RemoteTable,
        ) -> Result<Vec<Record>, RemoteError> {
            Err(RemoteError::Status(503))
        }

        async fn write_table(
            &self,
            _session: &RemoteSession,
            _table: RemoteTable,
            _rows: Vec<Vec<String>>,
        ) -> Result<bool, RemoteError> {
            Err(RemoteError::Status(503))
        }
    }

    #[async_test]
    async fn mirrored_writes_are_never_followed_by_a_stale_read() {
        let pool = seeded_pool().await;
        let store = Arc::new(MemoryStore::default());
        let dir = tempfile::tempdir().unwrap();
        let sync = Synchronizer::new(Some(store.clone()), dir.path().join("picks.json"));

        assert!(sync.remote_records(RemoteTable::Picks).await.unwrap().is_empty());
        assert!(sync.remote_records(RemoteTable::Picks).await.unwrap().is_empty());
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);

        pool.owner_pick(pool.jacob, pool.sentry, &["Jake Knapp"], false, early_season())
            .await
            .unwrap();
        assert_eq!(sync.persist_picks(&pool.db).await, PersistOutcome::Mirrored);

        let rows = sync.remote_records(RemoteTable::Picks).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["user"], "Jacob");
        assert_eq!(rows[0]["golfer"], "Jake Knapp");
        assert_eq!(rows[0]["tournament"], "The Sentry");
        assert!(!dir.path().join("picks.json").exists());
    }

    #[async_test]
    async fn hydrate_pulls_users_results_and_picks_into_an_empty_store() {
        let pool = seeded_pool().await;
        let store = MemoryStore::with(
            RemoteTable::Users,
            vec![
                vec!["Jacob", "$2b$04$remotehash", "0", "1", "2026-01-02T00:00:00"],
                vec!["Newcomer", "", "0", "0", "2026-01-02T00:00:00"],
            ],
        );
        store.put(
            RemoteTable::Results,
            vec![
                vec!["The Sentry", "Jake Knapp", "400987", "3", "2026-01-12"],
                vec!["Unknown Event", "Jake Knapp", "1", "1", "2026-01-12"],
            ],
        );
        store.put(
            RemoteTable::Picks,
            vec![
                vec!["Jacob", "The Sentry", "Jake Knapp", "2026-01-05T10:00:00+00:00"],
                vec!["Carl", "The Sentry", "Ludvig Aberg", "2026-01-05T11:00:00"],
            ],
        );
        let dir = tempfile::tempdir().unwrap();
        let sync = Synchronizer::new(Some(Arc::new(store)), dir.path().join("picks.json"));

        let report = sync.hydrate(&pool.db).await.unwrap();
        assert_eq!(report.users, 2);
        assert_eq!(report.results, 1);
        assert_eq!(report.picks, 2);

        let jacob = pool.user(pool.jacob).await;
        assert!(jacob.double_pick_used);
        assert_eq!(jacob.pin_hash.as_deref(), Some("$2b$04$remotehash"));
        assert!(service::user_by_name(&pool.db, "Newcomer")
            .await
            .unwrap()
            .is_some());
        assert_eq!(pool.results(pool.sentry).await[0].purse, 400_987);
        // Remote picks may name golfers the roster does not have yet.
        pool.golfer("Ludvig Aberg").await;
    }

    #[async_test]
    async fn hydrate_keeps_local_picks() {
        let pool = seeded_pool().await;
        pool.owner_pick(pool.jacob, pool.sentry, &["Scottie Scheffler"], false, early_season())
            .await
            .unwrap();
        let store = MemoryStore::with(
            RemoteTable::Picks,
            vec![vec!["Jacob", "The Sentry", "Jake Knapp", "2026-01-05T10:00:00+00:00"]],
        );
        let dir = tempfile::tempdir().unwrap();
        let sync = Synchronizer::new(Some(Arc::new(store)), dir.path().join("picks.json"));

        let report = sync.hydrate(&pool.db).await.unwrap();
        assert_eq!(report.picks, 0);
        assert_eq!(pool.pick_count().await, 1);
        let kept = Pick::find().one(&pool.db).await.unwrap().unwrap();
        assert_eq!(kept.golfer_id, pool.golfer("Scottie Scheffler").await);
    }

    #[async_test]
    async fn empty_remote_users_are_seeded_from_local() {
        let pool = seeded_pool().await;
        let store = Arc::new(MemoryStore::default());
        let dir = tempfile::tempdir().unwrap();
        let sync = Synchronizer::new(Some(store.clone()), dir.path().join("picks.json"));

        let report = sync.hydrate(&pool.db).await.unwrap();
        assert!(report.users_pushed);
        let names: Vec<String> = store
            .rows(RemoteTable::Users)
            .into_iter()
            .map(|r| r[0].clone())
            .collect();
        assert_eq!(names, vec!["Admin", "Carl", "Jacob"]);
    }

    #[async_test]
    async fn snapshot_round_trips_picks_without_a_remote() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("picks_backup.json");

        let pool = seeded_pool().await;
        pool.owner_pick(pool.carl, pool.sentry, &["Jake Knapp", "Si Woo Kim"], true, early_season())
            .await
            .unwrap();
        let sync = Synchronizer::new(None, &path);
        assert_eq!(sync.persist_picks(&pool.db).await, PersistOutcome::Snapshot);
        assert_eq!(sync.persist_results(&pool.db).await, PersistOutcome::Skipped);

        let fresh = seeded_pool().await;
        let report = Synchronizer::new(None, &path).hydrate(&fresh.db).await.unwrap();
        assert_eq!(report.picks_from_snapshot, 2);
        assert_eq!(fresh.pick_count().await, 2);
    }

    #[async_test]
    async fn remote_failures_are_not_raised() {
        let pool = seeded_pool().await;
        let dir = tempfile::tempdir().unwrap();
        let sync = Synchronizer::new(Some(Arc::new(BrokenStore)), dir.path().join("picks.json"));

        assert_eq!(sync.persist_picks(&pool.db).await, PersistOutcome::Failed);
        assert_eq!(sync.persist_users(&pool.db).await, PersistOutcome::Failed);
        let report = sync.hydrate(&pool.db).await.unwrap();
        assert_eq!(report.users, 0);
        assert_eq!(report.results, 0);
    }

    struct Served {
        client: Client,
        pool: Pool,
        _snapshots: tempfile::TempDir,
    }

    async fn client(pool: Pool, sync_token: Option<&str>) -> Served {
        let config = Config {
            profile: Config::DEBUG_PROFILE,
            log_level: rocket::config::LogLevel::Critical,
            secret_key: rocket::config::SecretKey::from(&[1u8; 64][..]),
            ..Config::debug_default()
        };
        let mut settings = Settings::local("sqlite::memory:");
        settings.sync_token = sync_token.map(String::from);
        let dir = tempfile::tempdir().unwrap();
        let synchronizer = Synchronizer::new(None, dir.path().join("picks.json"));
        let providers = Providers {
            live_golf: Arc::new(sentry_feed()),
            catalog: Arc::new(FakeCatalog),
        };
        let rocket = build_rocket(pool.db.clone(), settings, synchronizer, providers)
            .configure(config);
        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");
        Served {
            client,
            pool,
            _snapshots: dir,
        }
    }

    #[async_test]
    async fn scheduled_sync_needs_the_shared_token() {
        let pool = seeded_pool().await;
        let sentry = pool.sentry;
        tournament::ActiveModel {
            id: Set(sentry),
            live_golf_id: Set(Some("016".to_string())),
            ..Default::default()
        }
        .update(&pool.db)
        .await
        .unwrap();
        let Served { client, pool, .. } = client(pool, Some("s3cret")).await;

        let res = client
            .get("/api/sync?token=wrong&tournId=016&year=2026")
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Unauthorized);
        let res = client.get("/api/sync?tournId=016&year=2026").dispatch().await;
        assert_eq!(res.status(), Status::Unauthorized);
        assert!(pool.results(sentry).await.is_empty());

        let res = client.get("/api/sync?token=s3cret&year=2026").dispatch().await;
        assert_eq!(res.status(), Status::BadRequest);

        let res = client
            .get("/api/sync?token=s3cret&tournId=016&year=2026")
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);
        let body: serde_json::Value =
            serde_json::from_str(&res.into_string().await.unwrap()).unwrap();
        assert_eq!(body["updated"], 2);
        assert_eq!(pool.results(sentry).await.len(), 2);
    }

    #[async_test]
    async fn scheduled_sync_without_a_configured_token() {
        let Served { client, .. } = client(seeded_pool().await, None).await;
        let res = client
            .get("/api/sync?token=anything&tournId=016&year=2026")
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::ServiceUnavailable);
    }

    #[async_test]
    async fn first_login_sets_the_pin() {
        let Served { client, pool, .. } = client(seeded_pool().await, None).await;

        let res = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(r#"{"name":"Jacob","pin":"12"}"#)
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::UnprocessableEntity);

        let res = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(r#"{"name":"Jacob","pin":"1234"}"#)
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);
        assert!(pool.user(pool.jacob).await.pin_hash.is_some());

        let me = client.get("/api/me").dispatch().await;
        assert_eq!(me.status(), Status::Ok);
        assert!(me.into_string().await.unwrap().contains("Jacob"));

        client.post("/api/logout").dispatch().await;
        let res = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(r#"{"name":"Jacob","pin":"9999"}"#)
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Forbidden);
        assert_eq!(client.get("/api/me").dispatch().await.status(), Status::Unauthorized);
    }

    #[async_test]
    async fn pick_route_uses_the_signed_in_user() {
        let Served { client, pool, .. } = client(seeded_pool().await, None).await;
        let knapp = pool.golfer("Jake Knapp").await;
        let upcoming = add_tournament(&pool.db, "Tour Championship", date(2099, 8, 27), false).await;

        let body = format!(r#"{{"tournament_id":{},"golfer_id":{}}}"#, upcoming, knapp);
        let res = client
            .post("/api/picks")
            .header(ContentType::JSON)
            .body(body.clone())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Unauthorized);

        client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(r#"{"name":"Carl","pin":"4321"}"#)
            .dispatch()
            .await;
        let res = client
            .post("/api/picks")
            .header(ContentType::JSON)
            .body(body)
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);

        let stored = Pick::find().one(&pool.db).await.unwrap().unwrap();
        assert_eq!(stored.user_id, pool.carl);

        let res = client
            .put("/api/results")
            .header(ContentType::JSON)
            .body(format!(
                r#"{{"tournament_id":{},"golfer_id":{},"purse":1000,"position":5}}"#,
                upcoming, knapp
            ))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Forbidden);
    }
}
