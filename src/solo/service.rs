use chrono::Utc;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

use super::{
    models::{SessionStatus, SoloSession},
    types::{LogSoloSetRequest, PersonalRecords, SessionDetail},
};
use crate::{
    scoring::total_score,
    shared::AppError,
    store::Store,
    workout::models::{SetEntry, WorkoutSet},
};

fn not_active() -> AppError {
    AppError::NotFound("Active solo session not found".to_string())
}

fn not_owner() -> AppError {
    AppError::Forbidden("This is not your session".to_string())
}

/// Service for single-user sessions; same lifecycle as a competition minus
/// the opponent and the live stream
pub struct SoloService {
    store: Store,
}

impl SoloService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        caller: &str,
        name: Option<&str>,
    ) -> Result<SoloSession, AppError> {
        let session = self
            .store
            .solo_sessions
            .insert_one(SoloSession::new(caller, name))
            .await?;
        info!(session_id = %session.id, name = %session.name, "Solo session started");
        Ok(session)
    }

    /// Caller's active sessions, newest first
    #[instrument(skip(self))]
    pub async fn active_sessions(&self, caller: &str) -> Result<Vec<SoloSession>, AppError> {
        let mut sessions = self.sessions_with_status(caller, SessionStatus::Active).await?;
        sessions.sort_by_key(|s| Reverse(s.started_at));
        Ok(sessions)
    }

    /// Caller's completed sessions, most recently ended first
    #[instrument(skip(self))]
    pub async fn session_history(&self, caller: &str) -> Result<Vec<SoloSession>, AppError> {
        let mut sessions = self
            .sessions_with_status(caller, SessionStatus::Completed)
            .await?;
        sessions.sort_by_key(|s| Reverse(s.ended_at));
        Ok(sessions)
    }

    async fn sessions_with_status(
        &self,
        caller: &str,
        status: SessionStatus,
    ) -> Result<Vec<SoloSession>, AppError> {
        self.store
            .solo_sessions
            .find_many(&|s: &SoloSession| s.user_id == caller && s.status == status)
            .await
    }

    /// One session with its sets, newest set first
    #[instrument(skip(self))]
    pub async fn session_detail(
        &self,
        caller: &str,
        session_id: &str,
    ) -> Result<SessionDetail, AppError> {
        let session = self
            .store
            .solo_sessions
            .find_one(&|s: &SoloSession| s.id == session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Solo session not found".to_string()))?;
        if session.user_id != caller {
            return Err(not_owner());
        }

        let mut sets = self.session_sets(&session.id).await?;
        sets.sort_by_key(|s| Reverse(s.logged_at));
        let total_score = total_score(&sets);

        Ok(SessionDetail {
            session,
            sets,
            total_score,
        })
    }

    /// Completes an active session with a score recomputed from its sets
    #[instrument(skip(self))]
    pub async fn end_session(
        &self,
        caller: &str,
        session_id: &str,
    ) -> Result<SoloSession, AppError> {
        let session = self.active_session_for(caller, session_id).await?;

        let sets = self.session_sets(&session.id).await?;
        let score = total_score(&sets);
        let ended_at = Utc::now();

        let updated = self
            .store
            .solo_sessions
            .update_many(
                &|s: &SoloSession| s.id == session.id && s.is_active(),
                &|s: &mut SoloSession| {
                    s.status = SessionStatus::Completed;
                    s.score = score;
                    s.ended_at = Some(ended_at);
                },
            )
            .await?;
        if updated == 0 {
            return Err(not_active());
        }

        info!(session_id = %session.id, score = score, sets = sets.len(), "Solo session completed");

        Ok(SoloSession {
            status: SessionStatus::Completed,
            score,
            ended_at: Some(ended_at),
            ..session
        })
    }

    /// Logs a set into one of the caller's active sessions.
    ///
    /// Checks run in order: input (400), session active (404), owner (403).
    #[instrument(skip(self, request))]
    pub async fn log_set(
        &self,
        caller: &str,
        request: LogSoloSetRequest,
    ) -> Result<WorkoutSet, AppError> {
        let session_id = request
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::Validation(
                    "sessionId, exercise, weight, and reps are required".to_string(),
                )
            })?;
        let entry = SetEntry::parse(request.exercise.as_deref(), request.weight, request.reps)?;

        let session = self.active_session_for(caller, session_id).await?;

        let set = WorkoutSet::new(caller, &session.id, entry);
        self.store.solo_sets.insert_one(set.clone()).await?;

        if let Err(e) = self.refresh_running_score(&session.id).await {
            if !self.final_score_counts_current_sets(&session.id).await {
                let set_id = set.id.clone();
                if let Err(rollback) = self
                    .store
                    .solo_sets
                    .remove_many(&|s: &WorkoutSet| s.id == set_id)
                    .await
                {
                    error!(error = %rollback, set_id = %set_id, "Failed to roll back solo set");
                }
            }
            return Err(e);
        }

        debug!(session_id = %session.id, set_id = %set.id, score = set.score, "Solo set logged");
        Ok(set)
    }

    /// Deletes one of the caller's sets while its session is active
    #[instrument(skip(self))]
    pub async fn delete_set(&self, caller: &str, set_id: &str) -> Result<(), AppError> {
        let set = self
            .store
            .solo_sets
            .find_one(&|s: &WorkoutSet| s.id == set_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Set not found".to_string()))?;

        if set.owner_id != caller {
            return Err(AppError::Forbidden(
                "You can only delete your own sets".to_string(),
            ));
        }

        let session = self
            .store
            .solo_sessions
            .find_one(&|s: &SoloSession| s.id == set.parent_id && s.is_active())
            .await?
            .ok_or_else(not_active)?;

        let removed = self
            .store
            .solo_sets
            .remove_many(&|s: &WorkoutSet| s.id == set_id)
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound("Set not found".to_string()));
        }

        if let Err(e) = self.refresh_running_score(&session.id).await {
            if !self.final_score_counts_current_sets(&session.id).await {
                if let Err(restore) = self.store.solo_sets.insert_one(set).await {
                    error!(error = %restore, set_id = %set_id, "Failed to restore solo set");
                }
            }
            return Err(e);
        }

        debug!(session_id = %session.id, set_id = %set_id, "Solo set deleted");
        Ok(())
    }

    /// Best set per exercise, best completed session and lifetime totals
    #[instrument(skip(self))]
    pub async fn personal_records(&self, caller: &str) -> Result<PersonalRecords, AppError> {
        let sets = self
            .store
            .solo_sets
            .find_many(&|s: &WorkoutSet| s.owner_id == caller)
            .await?;
        let sessions = self
            .sessions_with_status(caller, SessionStatus::Completed)
            .await?;

        let mut best_by_exercise: BTreeMap<&str, &WorkoutSet> = BTreeMap::new();
        for set in &sets {
            let best = best_by_exercise.entry(set.exercise.as_str()).or_insert(set);
            if set.score > best.score {
                *best = set;
            }
        }
        let personal_records = best_by_exercise.into_values().cloned().collect();

        let best_session = sessions
            .iter()
            .fold(None::<&SoloSession>, |best, session| match best {
                Some(best) if best.score >= session.score => Some(best),
                _ => Some(session),
            })
            .cloned();

        Ok(PersonalRecords {
            personal_records,
            best_session,
            all_time_score: total_score(&sets),
            total_sets: sets.len(),
            total_sessions: sessions.len(),
        })
    }

    async fn active_session_for(
        &self,
        caller: &str,
        session_id: &str,
    ) -> Result<SoloSession, AppError> {
        let session = self
            .store
            .solo_sessions
            .find_one(&|s: &SoloSession| s.id == session_id && s.is_active())
            .await?
            .ok_or_else(not_active)?;
        if session.user_id != caller {
            return Err(not_owner());
        }
        Ok(session)
    }

    async fn session_sets(&self, session_id: &str) -> Result<Vec<WorkoutSet>, AppError> {
        self.store
            .solo_sets
            .find_many(&|s: &WorkoutSet| s.parent_id == session_id)
            .await
    }

    /// True when the session has been completed with a score that already
    /// reflects its sets as stored now; a write that raced the end is then kept.
    async fn final_score_counts_current_sets(&self, session_id: &str) -> bool {
        self.final_score_matches_sets(session_id)
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, session_id = %session_id, "Failed to read final session score");
                false
            })
    }

    async fn final_score_matches_sets(&self, session_id: &str) -> Result<bool, AppError> {
        let Some(session) = self
            .store
            .solo_sessions
            .find_one(&|s: &SoloSession| s.id == session_id)
            .await?
        else {
            return Ok(false);
        };
        if session.is_active() {
            return Ok(false);
        }
        let sets = self.session_sets(session_id).await?;
        Ok(total_score(&sets) == session.score)
    }

    async fn refresh_running_score(&self, session_id: &str) -> Result<f64, AppError> {
        let sets = self.session_sets(session_id).await?;
        let score = total_score(&sets);

        let updated = self
            .store
            .solo_sessions
            .update_many(
                &|s: &SoloSession| s.id == session_id && s.is_active(),
                &|s: &mut SoloSession| s.score = score,
            )
            .await?;
        if updated == 0 {
            return Err(not_active());
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Collection, Predicate, Updater};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn service() -> SoloService {
        SoloService::new(Store::in_memory())
    }

    fn set_request(session_id: &str, exercise: &str, weight: f64, reps: f64) -> LogSoloSetRequest {
        LogSoloSetRequest {
            session_id: Some(session_id.to_string()),
            exercise: Some(exercise.to_string()),
            weight: Some(weight),
            reps: Some(reps),
        }
    }

    #[tokio::test]
    async fn test_log_set_updates_session_score() {
        let service = service();
        let session = service.start_session("alice", None).await.unwrap();

        service
            .log_set("alice", set_request(&session.id, "Squat", 100.0, 5.0))
            .await
            .unwrap();
        service
            .log_set("alice", set_request(&session.id, "Row", 60.0, 10.0))
            .await
            .unwrap();

        let active = service.active_sessions("alice").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].score, 740.96);
    }

    #[tokio::test]
    async fn test_log_set_check_order() {
        let service = service();
        let session = service.start_session("alice", None).await.unwrap();

        let invalid = service
            .log_set("bob", set_request("missing", "Squat", 100.0, 0.0))
            .await;
        assert!(matches!(invalid, Err(AppError::Validation(_))));

        let missing = service
            .log_set("bob", set_request("missing", "Squat", 100.0, 5.0))
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let not_mine = service
            .log_set("bob", set_request(&session.id, "Squat", 100.0, 5.0))
            .await;
        assert!(matches!(not_mine, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_end_is_terminal_and_recomputes() {
        let service = service();
        let session = service.start_session("alice", Some("Leg day")).await.unwrap();
        let set = service
            .log_set("alice", set_request(&session.id, "Squat", 1.0, 3.0))
            .await
            .unwrap();
        for _ in 0..2 {
            service
                .log_set("alice", set_request(&session.id, "Squat", 1.0, 3.0))
                .await
                .unwrap();
        }

        let ended = service.end_session("alice", &session.id).await.unwrap();
        assert_eq!(ended.status, SessionStatus::Completed);
        assert_eq!(ended.score, 7.22);
        assert!(ended.ended_at.is_some());

        let again = service.end_session("alice", &session.id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));

        let log_after = service
            .log_set("alice", set_request(&session.id, "Squat", 1.0, 3.0))
            .await;
        assert!(matches!(log_after, Err(AppError::NotFound(_))));

        let delete_after = service.delete_set("alice", &set.id).await;
        assert!(matches!(delete_after, Err(AppError::NotFound(_))));

        let history = service.session_history("alice").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, 7.22);
    }

    #[tokio::test]
    async fn test_end_by_other_user_forbidden() {
        let service = service();
        let session = service.start_session("alice", None).await.unwrap();

        let result = service.end_session("bob", &session.id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_detail_sorts_newest_first() {
        let service = service();
        let session = service.start_session("alice", None).await.unwrap();
        let first = service
            .log_set("alice", set_request(&session.id, "Squat", 100.0, 5.0))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = service
            .log_set("alice", set_request(&session.id, "Squat", 100.0, 3.0))
            .await
            .unwrap();

        let detail = service.session_detail("alice", &session.id).await.unwrap();
        assert_eq!(detail.sets[0].id, second.id);
        assert_eq!(detail.sets[1].id, first.id);
        assert_eq!(detail.total_score, total_score(&detail.sets));

        let other = service.session_detail("bob", &session.id).await;
        assert!(matches!(other, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_recomputes_score() {
        let service = service();
        let session = service.start_session("alice", None).await.unwrap();
        let heavy = service
            .log_set("alice", set_request(&session.id, "Squat", 135.0, 8.0))
            .await
            .unwrap();
        let light = service
            .log_set("alice", set_request(&session.id, "Squat", 100.0, 1.0))
            .await
            .unwrap();

        let by_other = service.delete_set("bob", &heavy.id).await;
        assert!(matches!(by_other, Err(AppError::Forbidden(_))));

        service.delete_set("alice", &heavy.id).await.unwrap();
        let active = service.active_sessions("alice").await.unwrap();
        assert_eq!(active[0].score, light.score);
    }

    #[tokio::test]
    async fn test_personal_records() {
        let service = service();
        let first = service.start_session("alice", Some("Push")).await.unwrap();
        service
            .log_set("alice", set_request(&first.id, "Bench", 100.0, 5.0))
            .await
            .unwrap();
        service
            .log_set("alice", set_request(&first.id, "Bench", 135.0, 8.0))
            .await
            .unwrap();
        service.end_session("alice", &first.id).await.unwrap();

        let second = service.start_session("alice", Some("Pull")).await.unwrap();
        service
            .log_set("alice", set_request(&second.id, "Row", 60.0, 10.0))
            .await
            .unwrap();
        service.end_session("alice", &second.id).await.unwrap();

        let records = service.personal_records("alice").await.unwrap();
        assert_eq!(records.total_sets, 3);
        assert_eq!(records.total_sessions, 2);
        assert_eq!(records.personal_records.len(), 2);

        let bench = records
            .personal_records
            .iter()
            .find(|s| s.exercise == "Bench")
            .unwrap();
        assert_eq!(bench.score, 712.53);
        assert_eq!(records.best_session.unwrap().name, "Push");
        assert_eq!(records.all_time_score, 1453.5);

        let empty = service.personal_records("bob").await.unwrap();
        assert!(empty.best_session.is_none());
        assert_eq!(empty.all_time_score, 0.0);
    }

    /// Sessions collection where the owner completes the session just before
    /// the next conditional update runs, once armed
    struct EndsBeforeUpdate {
        inner: Arc<dyn Collection<SoloSession>>,
        ender: SoloService,
        session_id: String,
        armed: AtomicBool,
    }

    #[async_trait]
    impl Collection<SoloSession> for EndsBeforeUpdate {
        async fn find_one(
            &self,
            predicate: Predicate<'_, SoloSession>,
        ) -> Result<Option<SoloSession>, AppError> {
            self.inner.find_one(predicate).await
        }

        async fn find_many(
            &self,
            predicate: Predicate<'_, SoloSession>,
        ) -> Result<Vec<SoloSession>, AppError> {
            self.inner.find_many(predicate).await
        }

        async fn insert_one(&self, document: SoloSession) -> Result<SoloSession, AppError> {
            self.inner.insert_one(document).await
        }

        async fn update_many(
            &self,
            predicate: Predicate<'_, SoloSession>,
            updater: Updater<'_, SoloSession>,
        ) -> Result<usize, AppError> {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.ender.end_session("alice", &self.session_id).await?;
            }
            self.inner.update_many(predicate, updater).await
        }

        async fn remove_many(
            &self,
            predicate: Predicate<'_, SoloSession>,
        ) -> Result<usize, AppError> {
            self.inner.remove_many(predicate).await
        }
    }

    async fn racing_service() -> (SoloService, Store, SoloSession, Arc<EndsBeforeUpdate>) {
        let store = Store::in_memory();
        let plain = SoloService::new(store.clone());
        let session = plain.start_session("alice", None).await.unwrap();

        let racing = Arc::new(EndsBeforeUpdate {
            inner: store.solo_sessions.clone(),
            ender: plain,
            session_id: session.id.clone(),
            armed: AtomicBool::new(false),
        });
        let racing_store = Store {
            solo_sessions: racing.clone(),
            ..store.clone()
        };
        (SoloService::new(racing_store), store, session, racing)
    }

    async fn assert_final_score_matches_sets(store: &Store, session_id: &str) {
        let session = store
            .solo_sessions
            .find_one(&|s: &SoloSession| s.id == session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.status, SessionStatus::Completed);

        let sets = store
            .solo_sets
            .find_many(&|s: &WorkoutSet| s.parent_id == session_id)
            .await
            .unwrap();
        assert_eq!(session.score, total_score(&sets));
    }

    #[tokio::test]
    async fn test_solo_set_counted_by_a_racing_end_is_kept() {
        let (service, store, session, racing) = racing_service().await;
        racing.armed.store(true, Ordering::SeqCst);

        let result = service
            .log_set("alice", set_request(&session.id, "Squat", 135.0, 8.0))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        assert_final_score_matches_sets(&store, &session.id).await;
        let records = service.personal_records("alice").await.unwrap();
        assert_eq!(records.total_sets, 1);
        assert_eq!(records.all_time_score, 712.53);
    }

    #[tokio::test]
    async fn test_solo_delete_missed_by_a_racing_end_stays_deleted() {
        let (service, store, session, racing) = racing_service().await;
        let first = service
            .log_set("alice", set_request(&session.id, "Squat", 100.0, 5.0))
            .await
            .unwrap();
        service
            .log_set("alice", set_request(&session.id, "Row", 60.0, 10.0))
            .await
            .unwrap();

        racing.armed.store(true, Ordering::SeqCst);
        let result = service.delete_set("alice", &first.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        assert_final_score_matches_sets(&store, &session.id).await;
        let history = service.session_history("alice").await.unwrap();
        assert_eq!(history[0].score, 378.57);
    }
}
