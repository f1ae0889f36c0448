use tracing::{debug, error, info, instrument};

use super::{
    models::{SetEntry, WorkoutSet},
    types::{LogSetRequest, LogSetsBatchRequest},
};
use crate::{
    competition::models::Competition,
    event::{CompetitionEvent, EventHub, SetDeleted, SetLogged, SetsLogged},
    scoring::total_score,
    shared::AppError,
    store::Store,
    users::UserDirectory,
};

fn not_active() -> AppError {
    AppError::NotFound("Active competition not found".to_string())
}

fn not_participant() -> AppError {
    AppError::Forbidden("You are not part of this competition".to_string())
}

/// Service for logging and deleting sets inside a competition
pub struct WorkoutService {
    store: Store,
    hub: EventHub,
    users: UserDirectory,
}

impl WorkoutService {
    pub fn new(store: Store, hub: EventHub) -> Self {
        let users = UserDirectory::new(store.users.clone());
        Self { store, hub, users }
    }

    /// Logs one set and refreshes the caller's running score.
    ///
    /// Checks run in order: input (400), competition active (404),
    /// caller participates (403).
    #[instrument(skip(self, request))]
    pub async fn log_set(
        &self,
        caller: &str,
        request: LogSetRequest,
    ) -> Result<WorkoutSet, AppError> {
        let competition_id = request
            .competition_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::Validation(
                    "competitionId, exercise, weight, and reps are required".to_string(),
                )
            })?;
        let entry = SetEntry::parse(request.exercise.as_deref(), request.weight, request.reps)?;

        let competition = self.active_competition_for(caller, competition_id).await?;
        let user_name = self.users.display_name(caller).await?;

        let set = WorkoutSet::new(caller, &competition.id, entry);
        self.store.workout_sets.insert_one(set.clone()).await?;

        if let Err(e) = self.refresh_running_score(&competition, caller).await {
            if !self.final_score_counts_current_sets(&competition, caller).await {
                self.discard(&[set.id.clone()]).await;
            }
            return Err(e);
        }

        info!(
            competition_id = %competition.id,
            set_id = %set.id,
            exercise = %set.exercise,
            score = set.score,
            "Set logged"
        );

        self.hub.publish_competition(
            &competition.id,
            CompetitionEvent::SetLogged(SetLogged {
                set: set.clone(),
                user_id: caller.to_string(),
                user_name,
            }),
        );

        Ok(set)
    }

    /// Logs every valid entry of a batch and skips the rest.
    ///
    /// Returns only the sets that were logged; an all-invalid batch logs
    /// nothing and publishes nothing.
    #[instrument(skip(self, request))]
    pub async fn log_sets_batch(
        &self,
        caller: &str,
        request: LogSetsBatchRequest,
    ) -> Result<Vec<WorkoutSet>, AppError> {
        let competition_id = request
            .competition_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let entries = request.sets.filter(|sets| !sets.is_empty());
        let (Some(competition_id), Some(entries)) = (competition_id, entries) else {
            return Err(AppError::Validation(
                "competitionId and a non-empty sets array are required".to_string(),
            ));
        };

        let competition = self.active_competition_for(caller, competition_id).await?;
        let user_name = self.users.display_name(caller).await?;

        let sets: Vec<WorkoutSet> = entries
            .iter()
            .filter_map(SetEntry::from_value)
            .map(|entry| WorkoutSet::new(caller, &competition.id, entry))
            .collect();
        let skipped = entries.len() - sets.len();

        if sets.is_empty() {
            info!(competition_id = %competition.id, skipped = skipped, "Batch had no valid sets");
            return Ok(sets);
        }

        let mut inserted = Vec::with_capacity(sets.len());
        for set in &sets {
            if let Err(e) = self.store.workout_sets.insert_one(set.clone()).await {
                self.discard(&inserted).await;
                return Err(e);
            }
            inserted.push(set.id.clone());
        }

        if let Err(e) = self.refresh_running_score(&competition, caller).await {
            if !self.final_score_counts_current_sets(&competition, caller).await {
                self.discard(&inserted).await;
            }
            return Err(e);
        }

        info!(
            competition_id = %competition.id,
            logged = sets.len(),
            skipped = skipped,
            "Batch logged"
        );

        self.hub.publish_competition(
            &competition.id,
            CompetitionEvent::SetsLogged(SetsLogged {
                sets: sets.clone(),
                user_id: caller.to_string(),
                user_name,
                count: sets.len(),
            }),
        );

        Ok(sets)
    }

    /// Caller's own sets in a competition of any status, with their total
    #[instrument(skip(self))]
    pub async fn my_sets(
        &self,
        caller: &str,
        competition_id: &str,
    ) -> Result<(Vec<WorkoutSet>, f64), AppError> {
        let competition = self
            .store
            .competitions
            .find_one(&|c: &Competition| c.id == competition_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Competition not found".to_string()))?;
        if !competition.is_participant(caller) {
            return Err(not_participant());
        }

        let sets = self
            .store
            .workout_sets
            .find_many(&|s: &WorkoutSet| s.parent_id == competition.id && s.owner_id == caller)
            .await?;
        let total = total_score(&sets);
        Ok((sets, total))
    }

    /// Deletes one of the caller's sets while its competition is active
    #[instrument(skip(self))]
    pub async fn delete_set(&self, caller: &str, set_id: &str) -> Result<(), AppError> {
        let set = self
            .store
            .workout_sets
            .find_one(&|s: &WorkoutSet| s.id == set_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Set not found".to_string()))?;

        if set.owner_id != caller {
            return Err(AppError::Forbidden(
                "You can only delete your own sets".to_string(),
            ));
        }

        let competition = self
            .store
            .competitions
            .find_one(&|c: &Competition| c.id == set.parent_id && c.is_active())
            .await?
            .ok_or_else(not_active)?;

        let removed = self
            .store
            .workout_sets
            .remove_many(&|s: &WorkoutSet| s.id == set_id)
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound("Set not found".to_string()));
        }

        if let Err(e) = self.refresh_running_score(&competition, caller).await {
            if !self.final_score_counts_current_sets(&competition, caller).await {
                self.restore(set).await;
            }
            return Err(e);
        }

        info!(competition_id = %competition.id, set_id = %set_id, "Set deleted");

        self.hub.publish_competition(
            &competition.id,
            CompetitionEvent::SetDeleted(SetDeleted {
                set_id: set_id.to_string(),
                user_id: caller.to_string(),
            }),
        );

        Ok(())
    }

    async fn active_competition_for(
        &self,
        caller: &str,
        competition_id: &str,
    ) -> Result<Competition, AppError> {
        let competition = self
            .store
            .competitions
            .find_one(&|c: &Competition| c.id == competition_id && c.is_active())
            .await?
            .ok_or_else(not_active)?;

        if !competition.is_participant(caller) {
            return Err(not_participant());
        }
        Ok(competition)
    }

    /// Recomputes `user_id`'s total over their sets and caches it on the
    /// competition. Fails with 404 if the competition is no longer active.
    async fn refresh_running_score(
        &self,
        competition: &Competition,
        user_id: &str,
    ) -> Result<f64, AppError> {
        let side = competition.side_of(user_id).ok_or_else(not_participant)?;

        let sets = self
            .store
            .workout_sets
            .find_many(&|s: &WorkoutSet| s.parent_id == competition.id && s.owner_id == user_id)
            .await?;
        let score = total_score(&sets);

        let updated = self
            .store
            .competitions
            .update_many(
                &|c: &Competition| c.id == competition.id && c.is_active(),
                &|c: &mut Competition| c.set_running_score(side, score),
            )
            .await?;
        if updated == 0 {
            return Err(not_active());
        }

        debug!(
            competition_id = %competition.id,
            user_id = %user_id,
            running_score = score,
            "Running score refreshed"
        );
        Ok(score)
    }

    /// After a failed refresh, tells whether the competition has ended with a
    /// final score for `user_id` that already reflects the sets as stored now.
    ///
    /// An `end` that lands between a set write and its refresh may or may not
    /// have seen the write. When it did, undoing the write would leave the
    /// final snapshot counting sets that no longer exist.
    async fn final_score_counts_current_sets(
        &self,
        competition: &Competition,
        user_id: &str,
    ) -> bool {
        match self.final_score_matches_sets(&competition.id, user_id).await {
            Ok(counted) => {
                if counted {
                    debug!(
                        competition_id = %competition.id,
                        user_id = %user_id,
                        "Competition ended with this write counted, keeping it"
                    );
                }
                counted
            }
            Err(e) => {
                error!(error = %e, competition_id = %competition.id, "Failed to read final score");
                false
            }
        }
    }

    async fn final_score_matches_sets(
        &self,
        competition_id: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let Some(current) = self
            .store
            .competitions
            .find_one(&|c: &Competition| c.id == competition_id)
            .await?
        else {
            return Ok(false);
        };
        let Some(side) = current.side_of(user_id) else {
            return Ok(false);
        };
        if current.is_active() {
            return Ok(false);
        }

        let sets = self
            .store
            .workout_sets
            .find_many(&|s: &WorkoutSet| s.parent_id == current.id && s.owner_id == user_id)
            .await?;
        Ok(total_score(&sets) == current.score_of(side))
    }

    async fn discard(&self, set_ids: &[String]) {
        if set_ids.is_empty() {
            return;
        }
        if let Err(e) = self
            .store
            .workout_sets
            .remove_many(&|s: &WorkoutSet| set_ids.contains(&s.id))
            .await
        {
            error!(error = %e, count = set_ids.len(), "Failed to roll back logged sets");
        }
    }

    async fn restore(&self, set: WorkoutSet) {
        let set_id = set.id.clone();
        if let Err(e) = self.store.workout_sets.insert_one(set).await {
            error!(error = %e, set_id = %set_id, "Failed to restore deleted set");
        }
    }
}
