// ── Realtime channel topics ──
//
// Topic strings are built from fixed templates with identifiers inserted
// verbatim. No escaping or validation happens here; the backend rejects
// malformed channels on subscribe.

use std::fmt;

/// A realtime channel a wrapper can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Changes to the authenticated account.
    Account,
    /// Every document in every collection.
    Documents,
    /// Every document in one collection.
    CollectionDocuments {
        database_id: String,
        collection_id: String,
    },
    /// A single document.
    Document {
        database_id: String,
        collection_id: String,
        document_id: String,
    },
    /// Every file in every bucket.
    Files,
    /// Every file in one bucket.
    Bucket { bucket_id: String },
    /// A single file.
    File { bucket_id: String, file_id: String },
    Teams,
    Team { team_id: String },
    Memberships,
    Membership { membership_id: String },
    Executions,
    Execution { execution_id: String },
    Function { function_id: String },
}

impl Channel {
    pub fn collection(database_id: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self::CollectionDocuments {
            database_id: database_id.into(),
            collection_id: collection_id.into(),
        }
    }

    pub fn document(
        database_id: impl Into<String>,
        collection_id: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        Self::Document {
            database_id: database_id.into(),
            collection_id: collection_id.into(),
            document_id: document_id.into(),
        }
    }

    pub fn bucket(bucket_id: impl Into<String>) -> Self {
        Self::Bucket {
            bucket_id: bucket_id.into(),
        }
    }

    pub fn file(bucket_id: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self::File {
            bucket_id: bucket_id.into(),
            file_id: file_id.into(),
        }
    }

    /// The topic string sent to the realtime endpoint.
    pub fn topic(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => f.write_str("account"),
            Self::Documents => f.write_str("documents"),
            Self::CollectionDocuments {
                database_id,
                collection_id,
            } => write!(f, "databases.{database_id}.collections.{collection_id}.documents"),
            Self::Document {
                database_id,
                collection_id,
                document_id,
            } => write!(
                f,
                "databases.{database_id}.collections.{collection_id}.documents.{document_id}"
            ),
            Self::Files => f.write_str("files"),
            Self::Bucket { bucket_id } => write!(f, "buckets.{bucket_id}.files"),
            Self::File { bucket_id, file_id } => write!(f, "buckets.{bucket_id}.files.{file_id}"),
            Self::Teams => f.write_str("teams"),
            Self::Team { team_id } => write!(f, "teams.{team_id}"),
            Self::Memberships => f.write_str("memberships"),
            Self::Membership { membership_id } => write!(f, "memberships.{membership_id}"),
            Self::Executions => f.write_str("executions"),
            Self::Execution { execution_id } => write!(f, "executions.{execution_id}"),
            Self::Function { function_id } => write!(f, "functions.{function_id}"),
        }
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn templates_render() {
        let cases = [
            (Channel::Account, "account"),
            (Channel::Documents, "documents"),
            (
                Channel::collection("main", "posts"),
                "databases.main.collections.posts.documents",
            ),
            (
                Channel::document("main", "posts", "d1"),
                "databases.main.collections.posts.documents.d1",
            ),
            (Channel::Files, "files"),
            (Channel::bucket("avatars"), "buckets.avatars.files"),
            (Channel::file("avatars", "f1"), "buckets.avatars.files.f1"),
            (Channel::Teams, "teams"),
            (Channel::Team { team_id: "t1".into() }, "teams.t1"),
            (Channel::Memberships, "memberships"),
            (
                Channel::Membership {
                    membership_id: "m1".into(),
                },
                "memberships.m1",
            ),
            (Channel::Executions, "executions"),
            (
                Channel::Execution {
                    execution_id: "e1".into(),
                },
                "executions.e1",
            ),
            (
                Channel::Function {
                    function_id: "fn1".into(),
                },
                "functions.fn1",
            ),
        ];

        for (channel, expected) in cases {
            assert_eq!(channel.topic(), expected);
        }
    }

    #[test]
    fn topics_are_deterministic() {
        let ids = ["main", "65908abe506dfa411615", "", "with space", "dots.inside", "ünïcode"];
        for db in ids {
            for col in ids {
                let a = Channel::collection(db, col).topic();
                let b = Channel::collection(db, col).topic();
                assert_eq!(a.as_bytes(), b.as_bytes());

                let d1 = Channel::document(db, col, "x").topic();
                let d2 = Channel::document(db, col, "x").topic();
                assert_eq!(d1, d2);
            }
        }
    }

    #[test]
    fn identifiers_are_inserted_verbatim() {
        assert_eq!(
            Channel::collection("a.b", "c d").topic(),
            "databases.a.b.collections.c d.documents"
        );
    }

    #[test]
    fn distinct_templates_give_distinct_topics() {
        assert_ne!(
            Channel::collection("main", "posts").topic(),
            Channel::document("main", "posts", "").topic()
        );
        assert_ne!(Channel::bucket("b").topic(), Channel::file("b", "").topic());
    }
}
