use chrono::Utc;
use std::cmp::Reverse;
use tracing::{debug, error, info, instrument};

use super::{
    models::{Competition, CompetitionRequest, CompetitionStatus, RequestStatus},
    types::{
        CompetitionDetail, CompetitionResult, CompetitionSummary, ParticipantSummary,
        ParticipantView, Participants, RequestView,
    },
};
use crate::{
    event::{
        CompetitionEvent, EventHub, RequestAccepted, RequestDeclined, RequestReceived,
        UserNotification,
    },
    friends::Friendships,
    scoring::{decide_winner, total_score},
    shared::AppError,
    store::Store,
    users::UserDirectory,
    workout::models::WorkoutSet,
};

/// Service for the competition lifecycle: request, accept or decline, view, end
pub struct CompetitionService {
    store: Store,
    hub: EventHub,
    users: UserDirectory,
    friendships: Friendships,
}

impl CompetitionService {
    pub fn new(store: Store, hub: EventHub) -> Self {
        let users = UserDirectory::new(store.users.clone());
        let friendships = Friendships::new(store.friendships.clone());
        Self {
            store,
            hub,
            users,
            friendships,
        }
    }

    /// Challenges a friend; notifies them on their personal stream
    #[instrument(skip(self))]
    pub async fn request_competition(
        &self,
        caller: &str,
        friend_id: Option<&str>,
    ) -> Result<CompetitionRequest, AppError> {
        let friend_id = friend_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("friendId is required".to_string()))?;

        if friend_id == caller {
            return Err(AppError::Validation("Cannot challenge yourself".to_string()));
        }

        if !self.friendships.are_friends(caller, friend_id).await? {
            return Err(AppError::Forbidden(
                "You can only challenge friends".to_string(),
            ));
        }

        let pending = self
            .store
            .competition_requests
            .find_one(&|r: &CompetitionRequest| r.is_pending() && r.between(caller, friend_id))
            .await?;
        if pending.is_some() {
            return Err(AppError::Conflict(
                "A pending competition request already exists".to_string(),
            ));
        }

        let active = self
            .store
            .competitions
            .find_one(&|c: &Competition| c.is_active() && c.between(caller, friend_id))
            .await?;
        if active.is_some() {
            return Err(AppError::Conflict(
                "An active competition already exists between you two".to_string(),
            ));
        }

        let request = self
            .store
            .competition_requests
            .insert_one(CompetitionRequest::new(caller, friend_id))
            .await?;

        info!(request_id = %request.id, from = %caller, to = %friend_id, "Competition request created");

        let from_name = self.users.display_name(caller).await?;
        self.hub.notify_user(
            friend_id,
            UserNotification::CompetitionRequestReceived(RequestReceived {
                request: request.clone(),
                from_name,
            }),
        );

        Ok(request)
    }

    /// Pending requests addressed to the caller
    #[instrument(skip(self))]
    pub async fn incoming_requests(&self, caller: &str) -> Result<Vec<RequestView>, AppError> {
        let requests = self
            .store
            .competition_requests
            .find_many(&|r: &CompetitionRequest| r.to == caller && r.is_pending())
            .await?;

        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            let from_name = self.users.display_name(&request.from).await?;
            views.push(RequestView {
                request,
                from_name: Some(from_name),
                to_name: None,
            });
        }
        Ok(views)
    }

    /// Pending requests sent by the caller
    #[instrument(skip(self))]
    pub async fn outgoing_requests(&self, caller: &str) -> Result<Vec<RequestView>, AppError> {
        let requests = self
            .store
            .competition_requests
            .find_many(&|r: &CompetitionRequest| r.from == caller && r.is_pending())
            .await?;

        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            let to_name = self.users.display_name(&request.to).await?;
            views.push(RequestView {
                request,
                from_name: None,
                to_name: Some(to_name),
            });
        }
        Ok(views)
    }

    /// Accepts a pending request addressed to the caller and starts the competition
    #[instrument(skip(self))]
    pub async fn accept_request(
        &self,
        caller: &str,
        request_id: &str,
    ) -> Result<Competition, AppError> {
        let request = self
            .answer_request(caller, request_id, RequestStatus::Accepted)
            .await?;

        let competition = match self
            .store
            .competitions
            .insert_one(Competition::from_request(&request))
            .await
        {
            Ok(competition) => competition,
            Err(e) => {
                self.reopen_request(&request.id).await;
                return Err(e);
            }
        };

        info!(
            request_id = %request.id,
            competition_id = %competition.id,
            "Competition started"
        );

        let accepted_by_name = self.users.display_name(caller).await?;
        self.hub.notify_user(
            &request.from,
            UserNotification::CompetitionRequestAccepted(RequestAccepted {
                request_id: request.id.clone(),
                competition: competition.clone(),
                accepted_by_name,
            }),
        );

        Ok(competition)
    }

    /// Declines a pending request addressed to the caller
    #[instrument(skip(self))]
    pub async fn decline_request(
        &self,
        caller: &str,
        request_id: &str,
    ) -> Result<CompetitionRequest, AppError> {
        let request = self
            .answer_request(caller, request_id, RequestStatus::Declined)
            .await?;

        info!(request_id = %request.id, "Competition request declined");

        self.hub.notify_user(
            &request.from,
            UserNotification::CompetitionRequestDeclined(RequestDeclined {
                request_id: request.id.clone(),
                declined_by: caller.to_string(),
            }),
        );

        Ok(request)
    }

    /// Moves a pending request addressed to `caller` into `answer`.
    ///
    /// The write is conditional on the request still being pending, so two
    /// concurrent answers cannot both succeed.
    async fn answer_request(
        &self,
        caller: &str,
        request_id: &str,
        answer: RequestStatus,
    ) -> Result<CompetitionRequest, AppError> {
        let not_found = || AppError::NotFound("Competition request not found".to_string());

        let is_answerable =
            |r: &CompetitionRequest| r.id == request_id && r.to == caller && r.is_pending();

        let mut request = self
            .store
            .competition_requests
            .find_one(&is_answerable)
            .await?
            .ok_or_else(not_found)?;

        let updated = self
            .store
            .competition_requests
            .update_many(&is_answerable, &|r: &mut CompetitionRequest| {
                r.status = answer
            })
            .await?;
        if updated == 0 {
            return Err(not_found());
        }

        request.status = answer;
        Ok(request)
    }

    /// Puts an accepted request back to pending after its competition could
    /// not be created, so the pair is not left with neither.
    async fn reopen_request(&self, request_id: &str) {
        let reopened = self
            .store
            .competition_requests
            .update_many(
                &|r: &CompetitionRequest| {
                    r.id == request_id && r.status == RequestStatus::Accepted
                },
                &|r: &mut CompetitionRequest| r.status = RequestStatus::Pending,
            )
            .await;
        if let Err(e) = reopened {
            error!(error = %e, request_id = %request_id, "Failed to reopen competition request");
        }
    }

    /// Caller's active competitions, newest first, with cached running scores
    #[instrument(skip(self))]
    pub async fn active_competitions(
        &self,
        caller: &str,
    ) -> Result<Vec<CompetitionSummary>, AppError> {
        let mut competitions = self
            .competitions_with_status(caller, CompetitionStatus::Active)
            .await?;
        competitions.sort_by_key(|c| Reverse(c.started_at));
        self.summarize(caller, competitions).await
    }

    /// Caller's completed competitions, most recently ended first
    #[instrument(skip(self))]
    pub async fn competition_history(
        &self,
        caller: &str,
    ) -> Result<Vec<CompetitionSummary>, AppError> {
        let mut competitions = self
            .competitions_with_status(caller, CompetitionStatus::Completed)
            .await?;
        competitions.sort_by_key(|c| Reverse(c.ended_at));
        self.summarize(caller, competitions).await
    }

    async fn competitions_with_status(
        &self,
        caller: &str,
        status: CompetitionStatus,
    ) -> Result<Vec<Competition>, AppError> {
        self.store
            .competitions
            .find_many(&|c: &Competition| c.status == status && c.is_participant(caller))
            .await
    }

    async fn summarize(
        &self,
        caller: &str,
        competitions: Vec<Competition>,
    ) -> Result<Vec<CompetitionSummary>, AppError> {
        let mut summaries = Vec::with_capacity(competitions.len());
        for competition in competitions {
            let opponent_name = self
                .users
                .display_name(competition.opponent_of(caller))
                .await?;
            summaries.push(CompetitionSummary {
                competition,
                opponent_name,
            });
        }
        debug!(count = summaries.len(), "Competitions listed");
        Ok(summaries)
    }

    /// Loads a competition in any state, for one of its participants.
    ///
    /// Absent → 404, caller not a participant → 403.
    #[instrument(skip(self))]
    pub async fn participant_competition(
        &self,
        caller: &str,
        competition_id: &str,
    ) -> Result<Competition, AppError> {
        let competition = self
            .store
            .competitions
            .find_one(&|c: &Competition| c.id == competition_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Competition not found".to_string()))?;

        if !competition.is_participant(caller) {
            return Err(AppError::Forbidden(
                "You are not part of this competition".to_string(),
            ));
        }
        Ok(competition)
    }

    /// Both sides' sets with scores recomputed from them
    #[instrument(skip(self))]
    pub async fn competition_detail(
        &self,
        caller: &str,
        competition_id: &str,
    ) -> Result<CompetitionDetail, AppError> {
        let mut competition = self.participant_competition(caller, competition_id).await?;
        let (sets_a, sets_b) = self.sets_by_side(&competition).await?;

        competition.score_a = total_score(&sets_a);
        competition.score_b = total_score(&sets_b);

        let user_a = ParticipantView {
            id: competition.user_a.clone(),
            name: self.users.display_name(&competition.user_a).await?,
            score: competition.score_a,
            sets: sets_a,
        };
        let user_b = ParticipantView {
            id: competition.user_b.clone(),
            name: self.users.display_name(&competition.user_b).await?,
            score: competition.score_b,
            sets: sets_b,
        };

        Ok(CompetitionDetail {
            competition,
            participants: Participants { user_a, user_b },
        })
    }

    async fn sets_by_side(
        &self,
        competition: &Competition,
    ) -> Result<(Vec<WorkoutSet>, Vec<WorkoutSet>), AppError> {
        let sets = self
            .store
            .workout_sets
            .find_many(&|s: &WorkoutSet| s.parent_id == competition.id)
            .await?;
        Ok(sets
            .into_iter()
            .partition(|s| s.owner_id == competition.user_a))
    }

    /// Ends an active competition.
    ///
    /// Final scores come from every logged set, never from the running cache.
    /// The terminal write only applies while the competition is still active,
    /// so of two concurrent ends exactly one succeeds.
    #[instrument(skip(self))]
    pub async fn end_competition(
        &self,
        caller: &str,
        competition_id: &str,
    ) -> Result<CompetitionResult, AppError> {
        let not_active = || AppError::NotFound("Active competition not found".to_string());

        let competition = self
            .store
            .competitions
            .find_one(&|c: &Competition| c.id == competition_id && c.is_active())
            .await?
            .ok_or_else(not_active)?;

        if !competition.is_participant(caller) {
            return Err(AppError::Forbidden(
                "You are not part of this competition".to_string(),
            ));
        }

        let (sets_a, sets_b) = self.sets_by_side(&competition).await?;
        let score_a = total_score(&sets_a);
        let score_b = total_score(&sets_b);
        let winner_id = decide_winner(&competition.user_a, score_a, &competition.user_b, score_b)
            .map(str::to_string);
        let ended_at = Utc::now();

        let updated = self
            .store
            .competitions
            .update_many(
                &|c: &Competition| c.id == competition_id && c.is_active(),
                &|c: &mut Competition| {
                    c.status = CompetitionStatus::Completed;
                    c.ended_at = Some(ended_at);
                    c.score_a = score_a;
                    c.score_b = score_b;
                    c.winner_id = winner_id.clone();
                },
            )
            .await?;
        if updated == 0 {
            return Err(not_active());
        }

        let user_a = ParticipantSummary {
            id: competition.user_a.clone(),
            name: self.users.display_name(&competition.user_a).await?,
        };
        let user_b = ParticipantSummary {
            id: competition.user_b.clone(),
            name: self.users.display_name(&competition.user_b).await?,
        };
        let winner = match winner_id.as_deref() {
            Some(id) if id == user_a.id => Some(user_a.clone()),
            Some(_) => Some(user_b.clone()),
            None => None,
        };

        let result = CompetitionResult {
            competition_id: competition.id.clone(),
            score_a,
            score_b,
            winner_id,
            user_a,
            user_b,
            winner,
        };

        info!(
            competition_id = %result.competition_id,
            score_a = result.score_a,
            score_b = result.score_b,
            winner_id = ?result.winner_id,
            ended_by = %caller,
            "Competition ended"
        );

        self.hub.publish_competition(
            &competition.id,
            CompetitionEvent::CompetitionEnded(result.clone()),
        );

        Ok(result)
    }
}
