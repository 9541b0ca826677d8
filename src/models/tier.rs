use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MemberTier {
    #[default]
    Member,
    Plus,
    Pro,
}

impl MemberTier {
    pub const ALL: [MemberTier; 3] = [Self::Member, Self::Plus, Self::Pro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Plus => "plus",
            Self::Pro => "pro",
        }
    }

    /// Case-insensitive lookup; anything unrecognised or absent is `Member`.
    pub fn resolve(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Member;
        };
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(value))
            .unwrap_or_default()
    }
}

impl fmt::Display for MemberTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
