// ── Realtime event classification ──
//
// A realtime delivery lists every event name it matched, from the fully
// qualified form down to the wildcard form. Wrappers only care about the
// wildcard CRUD patterns, checked in a fixed priority order.

use strum::{Display, IntoStaticStr};

/// Which family of CRUD patterns a wrapper listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Documents,
    Files,
}

/// The kind of change a delivery describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Create,
    Update,
    Delete,
}

/// The fixed wildcard event patterns wrappers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum AppwriteEvent {
    #[strum(serialize = "databases.*.collections.*.documents.*.delete")]
    DocumentDelete,
    #[strum(serialize = "databases.*.collections.*.documents.*.create")]
    DocumentCreate,
    #[strum(serialize = "databases.*.collections.*.documents.*.update")]
    DocumentUpdate,
    #[strum(serialize = "buckets.*.files.*.create")]
    BucketCreate,
    #[strum(serialize = "buckets.*.files.*.delete")]
    BucketDelete,
    #[strum(serialize = "buckets.*.files.*.update")]
    BucketUpdate,
}

impl AppwriteEvent {
    /// Every pattern, in table order.
    pub const ALL: [Self; 6] = [
        Self::DocumentDelete,
        Self::DocumentCreate,
        Self::DocumentUpdate,
        Self::BucketCreate,
        Self::BucketDelete,
        Self::BucketUpdate,
    ];

    /// The exact event string this pattern matches.
    pub fn pattern(self) -> &'static str {
        self.into()
    }

    /// The CRUD kind of this pattern.
    pub fn kind(self) -> EventKind {
        match self {
            Self::DocumentCreate | Self::BucketCreate => EventKind::Create,
            Self::DocumentUpdate | Self::BucketUpdate => EventKind::Update,
            Self::DocumentDelete | Self::BucketDelete => EventKind::Delete,
        }
    }

    /// The patterns for `resource`, in classification priority:
    /// delete, then create, then update.
    pub fn by_priority(resource: ResourceKind) -> [Self; 3] {
        match resource {
            ResourceKind::Documents => [
                Self::DocumentDelete,
                Self::DocumentCreate,
                Self::DocumentUpdate,
            ],
            ResourceKind::Files => [Self::BucketDelete, Self::BucketCreate, Self::BucketUpdate],
        }
    }
}

/// Classify a delivery's event list for `resource`.
///
/// Matching is exact string equality against the wildcard patterns; the
/// first pattern found in priority order wins. Returns `None` when no
/// pattern for `resource` is present.
pub fn classify<S: AsRef<str>>(resource: ResourceKind, events: &[S]) -> Option<AppwriteEvent> {
    AppwriteEvent::by_priority(resource)
        .into_iter()
        .find(|candidate| events.iter().any(|e| e.as_ref() == candidate.pattern()))
}
