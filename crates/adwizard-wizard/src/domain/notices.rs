//! User-facing notices: inline or banner, transient or persistent.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Where a notice is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "field", rename_all = "snake_case")]
pub enum NoticeScope {
    /// Next to one field.
    Field(String),
    /// Page-level banner.
    Banner,
}

/// How long a notice stays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "persistence", rename_all = "snake_case")]
pub enum Persistence {
    /// Disappears on its own at `expires_at`.
    Transient {
        /// Expiry time.
        expires_at: DateTime<Utc>,
    },
    /// Stays until dismissed or its cause is fixed.
    Persistent,
}

/// One notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Identifier used to dismiss it.
    pub id: Uuid,
    /// Error kind tag (`draft_save_error`, ...).
    pub kind: &'static str,
    /// Display text.
    pub message: String,
    /// Placement.
    pub scope: NoticeScope,
    /// Lifetime.
    pub persistence: Persistence,
}

impl Notice {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self.persistence {
            Persistence::Transient { expires_at } => now < expires_at,
            Persistence::Persistent => true,
        }
    }
}

/// The set of notices currently raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
}

impl NoticeBoard {
    /// Raises a notice that expires after `ttl`.
    pub fn transient(
        &mut self,
        kind: &'static str,
        message: impl Into<String>,
        scope: NoticeScope,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Uuid {
        self.push(
            kind,
            message.into(),
            scope,
            Persistence::Transient {
                expires_at: now + ttl,
            },
        )
    }

    /// Raises a notice that stays until dismissed.
    pub fn persistent(
        &mut self,
        kind: &'static str,
        message: impl Into<String>,
        scope: NoticeScope,
    ) -> Uuid {
        self.push(kind, message.into(), scope, Persistence::Persistent)
    }

    /// Removes a notice. Returns whether it existed.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    /// Removes every notice of `kind`.
    pub fn dismiss_kind(&mut self, kind: &str) {
        self.notices.retain(|n| n.kind != kind);
    }

    /// Removes persistent notices scoped to any of `fields`.
    pub fn resolve_fields(&mut self, fields: &[String]) {
        self.notices.retain(|n| match &n.scope {
            NoticeScope::Field(field) => !fields.contains(field),
            NoticeScope::Banner => true,
        });
    }

    /// Notices still showing at `now`.
    #[must_use]
    pub fn active(&self, now: DateTime<Utc>) -> Vec<&Notice> {
        self.notices.iter().filter(|n| n.is_live(now)).collect()
    }

    /// Drops expired transient notices.
    pub fn purge(&mut self, now: DateTime<Utc>) {
        self.notices.retain(|n| n.is_live(now));
    }

    fn push(
        &mut self,
        kind: &'static str,
        message: String,
        scope: NoticeScope,
        persistence: Persistence,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.notices.push(Notice {
            id,
            kind,
            message,
            scope,
            persistence,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_transient_notice_expires_after_ttl() {
        let mut board = NoticeBoard::default();
        board.transient("draft_save_error", "retry", NoticeScope::Banner, t0(), Duration::seconds(5));

        assert_eq!(board.active(t0() + Duration::seconds(4)).len(), 1);
        assert!(board.active(t0() + Duration::seconds(5)).is_empty());
    }

    #[test]
    fn test_persistent_notice_stays_until_dismissed() {
        // Arrange
        let mut board = NoticeBoard::default();
        let id = board.persistent(
            "publish_validation_rejection",
            "Price out of range",
            NoticeScope::Field("price_amount".into()),
        );

        // Act
        let later = t0() + Duration::days(30);

        // Assert
        assert_eq!(board.active(later).len(), 1);
        assert!(board.dismiss(id));
        assert!(board.active(later).is_empty());
        assert!(!board.dismiss(id));
    }

    #[test]
    fn test_resolve_fields_only_clears_matching_field_notices() {
        let mut board = NoticeBoard::default();
        board.persistent("x", "price", NoticeScope::Field("price_amount".into()));
        board.persistent("x", "title", NoticeScope::Field("title".into()));
        board.persistent("x", "banner", NoticeScope::Banner);

        board.resolve_fields(&["price_amount".to_owned()]);

        let left: Vec<&str> = board.active(t0()).iter().map(|n| n.message.as_str()).collect();
        assert_eq!(left, vec!["title", "banner"]);
    }
}
