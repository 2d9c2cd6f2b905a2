use serde::{Deserialize, Serialize};

/// A user's recorded opinion of an item. `None` means no opinion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Like,
    Dislike,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialCounters {
    pub likes: u32,
    pub dislikes: u32,
}

/// Toggle semantics: requesting the recorded action again clears it
pub fn next_action(old: Option<UserAction>, requested: UserAction) -> Option<UserAction> {
    if old == Some(requested) {
        None
    } else {
        Some(requested)
    }
}

/// Moves one vote from `old` to `new`. Counters never go below zero.
pub fn apply_action(
    old: Option<UserAction>,
    new: Option<UserAction>,
    counters: SocialCounters,
) -> SocialCounters {
    let mut next = counters;
    if old == new {
        return next;
    }

    match old {
        Some(UserAction::Like) => next.likes = next.likes.saturating_sub(1),
        Some(UserAction::Dislike) => next.dislikes = next.dislikes.saturating_sub(1),
        None => {}
    }
    match new {
        Some(UserAction::Like) => next.likes += 1,
        Some(UserAction::Dislike) => next.dislikes += 1,
        None => {}
    }

    next
}
