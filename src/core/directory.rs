use crate::core::compatibility::{self, Breakdown};
use crate::core::demo;
use crate::core::lifecycle::{self, Completion, RequestDraft};
use crate::core::progression::{self, LevelProgress};
use crate::domain::model::{Achievement, Badge, Document, Endorsement, SwapRequest, SwapStatus, UserProfile};
use crate::domain::ports::MatchSettings;
use crate::utils::error::{Result, SwapError};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_MIN_SCORE: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub search: Option<String>,
    pub min_score: f64,
    pub limit: Option<usize>,
}

impl Default for MatchQuery {
    fn default() -> Self {
        Self {
            search: None,
            min_score: DEFAULT_MIN_SCORE,
            limit: None,
        }
    }
}

impl MatchQuery {
    pub fn from_settings<S: MatchSettings + ?Sized>(settings: &S) -> Self {
        Self {
            search: None,
            min_score: settings.min_score(),
            limit: settings.match_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub user_id: String,
    pub name: String,
    pub score: f64,
    pub breakdown: Breakdown,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub applied: usize,
    pub failed: Vec<(String, SwapError)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryStats {
    pub total_users: usize,
    pub total_skills_offered: usize,
    pub total_requests: usize,
    pub pending: usize,
    pub accepted: usize,
    pub completed: usize,
    pub rejected: usize,
    pub average_rating: f64,
}

/// In-memory view of the shared document with the operations the
/// presentation layer needs. Loading and saving stay with the caller.
#[derive(Debug, Clone, Default)]
pub struct SkillDirectory {
    document: Document,
}

impl SkillDirectory {
    pub fn new(mut document: Document) -> Self {
        document.normalize();
        progression::sync_levels(&mut document.users);
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn users(&self) -> &[UserProfile] {
        &self.document.users
    }

    pub fn requests(&self) -> &[SwapRequest] {
        &self.document.requests
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn add_user(&mut self, mut user: UserProfile) -> Result<&UserProfile> {
        user.validate()?;
        if self.document.user(&user.id).is_some() {
            return Err(SwapError::ValidationError {
                field: "id".to_string(),
                value: user.id,
                reason: "a user with this id already exists".to_string(),
            });
        }
        user.normalize();
        progression::sync_level(&mut user);
        tracing::info!(user = %user.id, name = %user.name, "added user");
        self.document.users.push(user);
        Ok(&self.document.users[self.document.users.len() - 1])
    }

    fn user_index(&self, id: &str) -> Result<usize> {
        self.document
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| SwapError::missing_user(id))
    }

    fn request_index(&self, id: &str) -> Result<usize> {
        self.document
            .requests
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| SwapError::missing_request(id))
    }

    /// Looks a user up by id, falling back to an exact name match.
    pub fn resolve_user(&self, key: &str) -> Result<&UserProfile> {
        self.document
            .user(key)
            .or_else(|| self.document.users.iter().find(|u| u.name == key))
            .ok_or_else(|| SwapError::missing_user(key))
    }

    /// Removes the user and every request they sent or received.
    /// Returns how many requests went with them.
    pub fn remove_user(&mut self, id: &str) -> Result<usize> {
        let idx = self.user_index(id)?;
        self.document.users.remove(idx);
        let before = self.document.requests.len();
        self.document
            .requests
            .retain(|r| r.sender_id != id && r.receiver_id != id);
        let removed = before - self.document.requests.len();
        tracing::info!(user = %id, requests = removed, "removed user");
        Ok(removed)
    }

    pub fn level_progress(&self, id: &str) -> Result<LevelProgress> {
        let user = self.resolve_user(id)?;
        Ok(LevelProgress::for_xp(user.experience_points))
    }

    pub fn endorse(&mut self, from_id: &str, to_id: &str, skill: &str) -> Result<Endorsement> {
        self.user_index(from_id)?;
        let to = self.user_index(to_id)?;
        let receiver = &mut self.document.users[to];
        receiver.endorsements_received = receiver
            .endorsements_received
            .checked_add(1)
            .ok_or_else(|| SwapError::CounterOverflow {
                user_id: to_id.to_string(),
                counter: "endorsements_received".to_string(),
            })?;
        let endorsement = Endorsement {
            id: uuid::Uuid::new_v4().to_string(),
            from_user_id: from_id.to_string(),
            to_user_id: to_id.to_string(),
            skill: crate::domain::model::normalize_tag(skill).unwrap_or_default(),
            created_at: Utc::now(),
        };
        self.document.endorsements.push(endorsement.clone());
        Ok(endorsement)
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    pub fn find_matches(&self, user_id: &str, query: &MatchQuery) -> Result<Vec<MatchCandidate>> {
        let me = self.resolve_user(user_id)?;
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut candidates: Vec<MatchCandidate> = self
            .document
            .users
            .iter()
            .filter(|other| other.id != me.id)
            .filter(|other| match &needle {
                Some(needle) => other
                    .skills_offered
                    .iter()
                    .chain(other.skills_wanted.iter())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" ")
                    .contains(needle.as_str()),
                None => true,
            })
            .map(|other| {
                let (score, breakdown) = compatibility::score(me, other);
                MatchCandidate {
                    user_id: other.id.clone(),
                    name: other.name.clone(),
                    score,
                    breakdown,
                }
            })
            .filter(|c| c.score >= query.min_score)
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        if let Some(limit) = query.limit {
            candidates.truncate(limit);
        }
        tracing::debug!(user = %me.id, found = candidates.len(), "scored candidates");
        Ok(candidates)
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    pub fn request_swap(&mut self, draft: RequestDraft) -> SwapRequest {
        for id in [&draft.sender_id, &draft.receiver_id] {
            if self.document.user(id).is_none() {
                tracing::warn!(user = %id, "request references an unknown user");
            }
        }
        let request = lifecycle::create(draft, Utc::now());
        tracing::info!(request = %request.id, sender = %request.sender_id, receiver = %request.receiver_id, "created swap request");
        self.document.requests.push(request.clone());
        request
    }

    pub fn accept(&mut self, request_id: &str) -> Result<&SwapRequest> {
        let idx = self.request_index(request_id)?;
        let updated = lifecycle::accept(&self.document.requests[idx], Utc::now())?;
        self.document.requests[idx] = updated;
        tracing::info!(request = %request_id, "accepted");
        Ok(&self.document.requests[idx])
    }

    pub fn reject(&mut self, request_id: &str) -> Result<&SwapRequest> {
        let idx = self.request_index(request_id)?;
        let updated = lifecycle::reject(&self.document.requests[idx], Utc::now())?;
        self.document.requests[idx] = updated;
        tracing::info!(request = %request_id, "rejected");
        Ok(&self.document.requests[idx])
    }

    pub fn mark_viewed(&mut self, request_id: &str) -> Result<&SwapRequest> {
        let idx = self.request_index(request_id)?;
        let updated = lifecycle::mark_viewed(&self.document.requests[idx]);
        self.document.requests[idx] = updated;
        Ok(&self.document.requests[idx])
    }

    /// Completes one accepted request. Both participants must resolve; nothing
    /// is written unless the request and both profiles can all be updated.
    pub fn complete(&mut self, request_id: &str) -> Result<Completion> {
        self.complete_at(request_id, Utc::now())
    }

    fn complete_at(&mut self, request_id: &str, now: DateTime<Utc>) -> Result<Completion> {
        let idx = self.request_index(request_id)?;
        let request = &self.document.requests[idx];
        let sender = self.user_index(&request.sender_id)?;
        let receiver = self.user_index(&request.receiver_id)?;

        let done = lifecycle::complete(
            request,
            &self.document.users[sender],
            &self.document.users[receiver],
            now,
        )?;

        // commit
        self.document.requests[idx] = done.request.clone();
        self.document.users[sender] = done.sender.clone();
        self.document.users[receiver] = done.receiver.clone();
        let earned: Vec<(String, Badge)> = done
            .earned()
            .into_iter()
            .map(|(user, badge)| (user.id.clone(), badge))
            .collect();
        self.log_achievements(earned, now);

        tracing::info!(
            request = %request_id,
            sender = %done.sender.id,
            receiver = %done.receiver.id,
            "swap completed"
        );
        Ok(done)
    }

    fn log_achievements(&mut self, earned: Vec<(String, Badge)>, now: DateTime<Utc>) {
        for (user_id, badge) in earned {
            tracing::info!(user = %user_id, badge = %badge, "badge earned");
            self.document.achievements.push(Achievement {
                id: uuid::Uuid::new_v4().to_string(),
                user_id,
                badge,
                timestamp: now,
            });
        }
    }

    fn ids_with_status(&self, status: SwapStatus) -> Vec<String> {
        self.document
            .requests
            .iter()
            .filter(|r| r.status == status)
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn accept_all_pending(&mut self) -> BatchReport {
        let mut report = BatchReport::default();
        for id in self.ids_with_status(SwapStatus::Pending) {
            match self.accept(&id) {
                Ok(_) => report.applied += 1,
                Err(e) => report.failed.push((id, e)),
            }
        }
        tracing::info!(accepted = report.applied, "accepted pending requests");
        report
    }

    /// Completes every accepted request independently; one failure does not
    /// stop the rest.
    pub fn complete_all_accepted(&mut self) -> BatchReport {
        let mut report = BatchReport::default();
        let now = Utc::now();
        for id in self.ids_with_status(SwapStatus::Accepted) {
            match self.complete_at(&id, now) {
                Ok(_) => report.applied += 1,
                Err(e) => {
                    tracing::warn!(request = %id, error = %e, "skipped completion");
                    report.failed.push((id, e));
                }
            }
        }
        tracing::info!(completed = report.applied, failed = report.failed.len(), "completed accepted requests");
        report
    }

    /// Drops every Completed request; returns how many went.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.document.requests.len();
        self.document
            .requests
            .retain(|r| r.status != SwapStatus::Completed);
        let removed = before - self.document.requests.len();
        tracing::info!(removed, "cleared completed requests");
        removed
    }

    // -----------------------------------------------------------------------
    // Data management
    // -----------------------------------------------------------------------

    /// Adds the sample profiles whose names are not taken yet.
    pub fn seed_demo(&mut self) -> usize {
        let mut added = 0;
        for profile in demo::profiles() {
            if self.document.users.iter().any(|u| u.name == profile.name) {
                tracing::debug!(name = %profile.name, "demo profile already present");
                continue;
            }
            match self.add_user(profile) {
                Ok(_) => added += 1,
                Err(e) => tracing::warn!(error = %e, "skipped demo profile"),
            }
        }
        added
    }

    /// Empties every collection.
    pub fn reset(&mut self) {
        tracing::warn!(
            users = self.document.users.len(),
            requests = self.document.requests.len(),
            "resetting all data"
        );
        self.document = Document::default();
    }

    // -----------------------------------------------------------------------
    // Read models
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> DirectoryStats {
        let users = &self.document.users;
        let requests = &self.document.requests;
        let count = |status: SwapStatus| requests.iter().filter(|r| r.status == status).count();
        let average_rating = if users.is_empty() {
            0.0
        } else {
            users.iter().map(|u| u.rating).sum::<f64>() / users.len() as f64
        };
        DirectoryStats {
            total_users: users.len(),
            total_skills_offered: users.iter().map(|u| u.skills_offered.len()).sum(),
            total_requests: requests.len(),
            pending: count(SwapStatus::Pending),
            accepted: count(SwapStatus::Accepted),
            completed: count(SwapStatus::Completed),
            rejected: count(SwapStatus::Rejected),
            average_rating,
        }
    }

    /// Most swaps first, rating breaking ties.
    pub fn leaderboard(&self, top: usize) -> Vec<&UserProfile> {
        let mut users: Vec<&UserProfile> = self.document.users.iter().collect();
        users.sort_by(|a, b| {
            b.swaps_completed
                .cmp(&a.swaps_completed)
                .then_with(|| b.rating.total_cmp(&a.rating))
        });
        users.truncate(top);
        users
    }

    /// Offered tags with how many users offer them, most common first.
    pub fn skill_popularity(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tag in self.document.users.iter().flat_map(|u| u.skills_offered.iter()) {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tag, n)| (tag.to_string(), n))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Proficiency;

    fn user(id: &str) -> UserProfile {
        UserProfile::new(id, format!("{}@example.com", id)).with_id(id)
    }

    fn draft(sender: &str, receiver: &str) -> RequestDraft {
        RequestDraft {
            sender_id: sender.into(),
            receiver_id: receiver.into(),
            skill_offered: "python".into(),
            skill_wanted: "react".into(),
            ..Default::default()
        }
    }

    fn directory() -> SkillDirectory {
        let mut dir = SkillDirectory::default();
        dir.add_user(user("ana").offering("python", Some(Proficiency::Expert)).wanting("react"))
            .unwrap();
        dir.add_user(user("ben").offering("react", None).wanting("python"))
            .unwrap();
        dir.add_user(user("cid").offering("cooking", None)).unwrap();
        dir
    }

    #[test]
    fn test_duplicate_user_id_is_rejected() {
        let mut dir = directory();
        assert!(dir.add_user(user("ana")).is_err());
        assert_eq!(dir.users().len(), 3);
    }

    #[test]
    fn test_self_completion_credits_once() {
        let mut dir = directory();
        let id = dir.request_swap(draft("ana", "ana")).id;
        dir.accept(&id).unwrap();
        dir.complete(&id).unwrap();

        let ana = dir.resolve_user("ana").unwrap();
        assert_eq!(ana.swaps_completed, 1);
        assert_eq!(ana.experience_points, 50);
        assert_eq!(dir.document().achievements.len(), 1);
    }

    #[test]
    fn test_mark_viewed_in_any_state() {
        let mut dir = directory();
        let id = dir.request_swap(draft("ana", "ben")).id;
        dir.reject(&id).unwrap();
        let viewed = dir.mark_viewed(&id).unwrap();
        assert!(viewed.viewed);
        assert_eq!(viewed.status, SwapStatus::Rejected);
    }

    #[test]
    fn test_find_matches_filters_and_sorts() {
        let dir = directory();
        let all = MatchQuery {
            min_score: 0.0,
            ..Default::default()
        };
        let found = dir.find_matches("ana", &all).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].user_id, "ben");
        assert!(found[0].score > found[1].score);

        let searched = MatchQuery {
            search: Some("COOK".into()),
            min_score: 0.0,
            limit: None,
        };
        let found = dir.find_matches("ana", &searched).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].user_id, "cid");

        let strict = dir.find_matches("ana", &MatchQuery::default()).unwrap();
        assert_eq!(strict.len(), 1);
    }

    #[test]
    fn test_endorse_requires_both_users() {
        let mut dir = directory();
        assert!(dir.endorse("ana", "ghost", "python").is_err());
        assert!(dir.document().endorsements.is_empty());

        dir.endorse("ben", "ana", "Python").unwrap();
        assert_eq!(dir.resolve_user("ana").unwrap().endorsements_received, 1);
        assert_eq!(dir.document().endorsements[0].skill, "python");
    }

    #[test]
    fn test_clear_completed_keeps_open_requests() {
        let mut dir = directory();
        let done = dir.request_swap(draft("ana", "ben")).id;
        dir.accept(&done).unwrap();
        dir.complete(&done).unwrap();
        let open = dir.request_swap(draft("ben", "ana")).id;
        let declined = dir.request_swap(draft("ben", "cid")).id;
        dir.reject(&declined).unwrap();

        assert_eq!(dir.clear_completed(), 1);
        let left: Vec<&str> = dir.requests().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(left, vec![open.as_str(), declined.as_str()]);
        // credited counters survive the cleanup
        assert_eq!(dir.resolve_user("ana").unwrap().swaps_completed, 1);
        assert_eq!(dir.clear_completed(), 0);
    }

    #[test]
    fn test_seed_demo_skips_taken_names() {
        let mut dir = directory();
        dir.add_user(UserProfile::new("Riya Kapoor", "riya@elsewhere.com"))
            .unwrap();

        assert_eq!(dir.seed_demo(), 3);
        assert_eq!(dir.users().len(), 7);
        let riyas = dir.users().iter().filter(|u| u.name == "Riya Kapoor").count();
        assert_eq!(riyas, 1);

        assert_eq!(dir.seed_demo(), 0);
        assert_eq!(dir.users().len(), 7);

        let aman = dir.resolve_user("Aman Verma").unwrap();
        assert_eq!(aman.id, "demo-aman-verma");
        assert_eq!(aman.level, 2);
        let found = dir.find_matches("Aman Verma", &MatchQuery::default()).unwrap();
        assert!(found.iter().any(|c| c.user_id == "demo-priya-sharma"));
    }

    #[test]
    fn test_reset_empties_everything() {
        let mut dir = directory();
        dir.request_swap(draft("ana", "ben"));
        dir.endorse("ben", "ana", "python").unwrap();
        dir.reset();
        assert_eq!(dir.document(), &Document::default());
    }

    #[test]
    fn test_skill_popularity_counts_offers() {
        let mut dir = directory();
        dir.add_user(user("dee").offering("python", None)).unwrap();
        let ranked = dir.skill_popularity();
        assert_eq!(ranked[0], ("python".to_string(), 2));
    }
}
