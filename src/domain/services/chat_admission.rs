//! Single-active-chat admission rule.
//!
//! The center has one operator, so at most one chat is `active`. Everyone
//! else waits in a FIFO queue ordered by `queue_position`.

use crate::domain::entities::{ChatSession, ChatSessionStatus};

/// Outcome of admitting a new chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Active,
    Queued { position: i32 },
}

impl Admission {
    /// Decide how a new session enters the system.
    ///
    /// With no active session the newcomer becomes active. Otherwise it is
    /// queued one past the highest position currently queued.
    pub fn decide(active_sessions: i64, max_queue_position: Option<i32>) -> Self {
        if active_sessions == 0 {
            Admission::Active
        } else {
            Admission::Queued {
                position: max_queue_position.unwrap_or(0) + 1,
            }
        }
    }
}

/// The queued session that should become active next: lowest position,
/// ties broken by creation time.
pub fn next_in_line<'a, I>(sessions: I) -> Option<&'a ChatSession>
where
    I: IntoIterator<Item = &'a ChatSession>,
{
    sessions
        .into_iter()
        .filter(|s| s.status == ChatSessionStatus::Queued)
        .min_by_key(|s| (s.queue_position.unwrap_or(i32::MAX), s.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NewChatSession;
    use chrono::{Duration, Utc};

    fn contact() -> NewChatSession {
        NewChatSession {
            visitor_name: "Olena".into(),
            visitor_phone: "+380671234567".into(),
            visitor_email: None,
        }
    }

    #[test]
    fn first_visitor_becomes_active() {
        assert_eq!(Admission::decide(0, None), Admission::Active);
    }

    #[test]
    fn active_wins_even_with_stale_queue_positions() {
        assert_eq!(Admission::decide(0, Some(4)), Admission::Active);
    }

    #[test]
    fn second_visitor_is_queued_first() {
        assert_eq!(Admission::decide(1, None), Admission::Queued { position: 1 });
    }

    #[test]
    fn queue_position_is_one_past_the_maximum() {
        assert_eq!(Admission::decide(1, Some(3)), Admission::Queued { position: 4 });
    }

    #[test]
    fn next_in_line_picks_lowest_position() {
        let now = Utc::now();
        let active = ChatSession::admitted(&contact(), Admission::Active, now);
        let third = ChatSession::admitted(&contact(), Admission::Queued { position: 3 }, now);
        let second = ChatSession::admitted(
            &contact(),
            Admission::Queued { position: 2 },
            now + Duration::seconds(5),
        );

        let sessions = vec![active, third, second.clone()];
        let next = next_in_line(&sessions).unwrap();
        assert_eq!(next.id, second.id);
    }

    #[test]
    fn next_in_line_is_none_without_queue() {
        let active = ChatSession::admitted(&contact(), Admission::Active, Utc::now());
        assert!(next_in_line(&[active]).is_none());
    }
}
