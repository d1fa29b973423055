pub mod comment;
pub mod engagement;
pub mod poll;
pub mod post;
pub mod vote;

pub use comment::Comment;
pub use poll::{Poll, PollOption, PollOptionView, PollType, PollView};
pub use post::Post;
pub use vote::{VoteDirection, VoteSets};

/// Serde helpers for 64-bit ids, which travel as strings on the wire.
pub mod id_str {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(i64),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
            Raw::Num(n) => Ok(n),
        }
    }
}

/// Optional variant of [`id_str`].
pub mod opt_id_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.serialize_str(&id.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super::id_str")] i64);
        let raw: Option<Wrapped> = Option::deserialize(deserializer)?;
        Ok(raw.map(|Wrapped(id)| id))
    }
}
