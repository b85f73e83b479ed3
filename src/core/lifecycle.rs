//! Swap request state machine.
//!
//! ```text
//! Pending --accept--> Accepted --complete--> Completed
//!    \
//!     `---reject----> Rejected
//! ```
//!
//! Every operation takes its inputs by reference and returns new values, so a
//! rejected operation leaves nothing behind.

use crate::core::progression::{self, XP_PER_SWAP};
use crate::domain::model::{normalize_tag, Badge, Priority, SwapRequest, SwapStatus, UserProfile};
use crate::utils::error::{Result, SwapError};
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Accept,
    Reject,
    Complete,
}

impl Action {
    /// The state this action leads to, if it is allowed from `from`.
    pub fn apply(self, from: SwapStatus) -> Option<SwapStatus> {
        match (self, from) {
            (Action::Accept, SwapStatus::Pending) => Some(SwapStatus::Accepted),
            (Action::Reject, SwapStatus::Pending) => Some(SwapStatus::Rejected),
            (Action::Complete, SwapStatus::Accepted) => Some(SwapStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Accept => "accept",
            Action::Reject => "reject",
            Action::Complete => "complete",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestDraft {
    pub sender_id: String,
    pub receiver_id: String,
    pub skill_offered: String,
    pub skill_wanted: String,
    pub message: String,
    pub priority: Priority,
}

/// Always Pending and unviewed. No compatibility or identity check happens here.
pub fn create(draft: RequestDraft, now: DateTime<Utc>) -> SwapRequest {
    SwapRequest {
        id: uuid::Uuid::new_v4().to_string(),
        sender_id: draft.sender_id,
        receiver_id: draft.receiver_id,
        skill_offered: normalize_tag(&draft.skill_offered).unwrap_or_default(),
        skill_wanted: normalize_tag(&draft.skill_wanted).unwrap_or_default(),
        message: draft.message,
        priority: draft.priority,
        status: SwapStatus::Pending,
        viewed: false,
        created_at: now,
        updated_at: now,
    }
}

fn transition(request: &SwapRequest, action: Action, now: DateTime<Utc>) -> Result<SwapRequest> {
    let next = action
        .apply(request.status)
        .ok_or_else(|| SwapError::invalid_transition(&request.id, request.status, &action.to_string()))?;
    Ok(SwapRequest {
        status: next,
        updated_at: now,
        ..request.clone()
    })
}

pub fn accept(request: &SwapRequest, now: DateTime<Utc>) -> Result<SwapRequest> {
    transition(request, Action::Accept, now)
}

pub fn reject(request: &SwapRequest, now: DateTime<Utc>) -> Result<SwapRequest> {
    transition(request, Action::Reject, now)
}

pub fn mark_viewed(request: &SwapRequest) -> SwapRequest {
    SwapRequest {
        viewed: true,
        ..request.clone()
    }
}

/// The three records a completion produces, to be written back together.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub request: SwapRequest,
    pub sender: UserProfile,
    pub receiver: UserProfile,
    pub sender_badges: Vec<Badge>,
    pub receiver_badges: Vec<Badge>,
}

impl Completion {
    /// Newly earned badges per participant; a self swap is one participant.
    pub fn earned(&self) -> Vec<(&UserProfile, Badge)> {
        let sender = self.sender_badges.iter().map(|b| (&self.sender, *b));
        let receiver = self.receiver_badges.iter().map(|b| (&self.receiver, *b));
        if self.sender.id == self.receiver.id {
            receiver.collect()
        } else {
            sender.chain(receiver).collect()
        }
    }
}

fn credit_swap(user: &UserProfile) -> Result<(UserProfile, Vec<Badge>)> {
    let overflow = |counter: &str| SwapError::CounterOverflow {
        user_id: user.id.clone(),
        counter: counter.to_string(),
    };
    let mut updated = user.clone();
    updated.swaps_completed = user
        .swaps_completed
        .checked_add(1)
        .ok_or_else(|| overflow("swaps_completed"))?;
    updated.experience_points = user
        .experience_points
        .checked_add(XP_PER_SWAP)
        .ok_or_else(|| overflow("experience_points"))?;
    progression::sync_level(&mut updated);
    let earned = progression::award_badges(&mut updated);
    Ok((updated, earned))
}

fn check_participant(request: &SwapRequest, expected: &str, user: &UserProfile) -> Result<()> {
    if user.id == expected {
        Ok(())
    } else {
        tracing::debug!(request = %request.id, expected, got = %user.id, "participant mismatch");
        Err(SwapError::missing_user(expected))
    }
}

/// Completes an accepted request, crediting both participants.
///
/// Either all three updated records come back or an error does.
pub fn complete(
    request: &SwapRequest,
    sender: &UserProfile,
    receiver: &UserProfile,
    now: DateTime<Utc>,
) -> Result<Completion> {
    check_participant(request, &request.sender_id, sender)?;
    check_participant(request, &request.receiver_id, receiver)?;
    let request = transition(request, Action::Complete, now)?;
    let (sender, sender_badges) = credit_swap(sender)?;
    let (receiver, receiver_badges) = credit_swap(receiver)?;
    Ok(Completion {
        request,
        sender,
        receiver,
        sender_badges,
        receiver_badges,
    })
}
