use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::{ContestId, ContestantId},
    db::contestant::{Contestant, ContestantCore},
};

use super::validation::{check_length, CONTESTANT_NAME_LENGTH};

/// A contestant specification, as submitted when adding a contestant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestantSpec {
    /// The contest to join; must already exist.
    pub contest_id: ContestId,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl ContestantSpec {
    /// Check the spec is acceptable.
    pub fn validate(&self) -> Result<()> {
        check_length("name", &self.name, CONTESTANT_NAME_LENGTH)
    }

    /// Convert this spec into a stored contestant with the given ID.
    pub fn into_contestant(self, id: ContestantId, created_at: DateTime<Utc>) -> Contestant {
        Contestant {
            id,
            contestant: ContestantCore {
                contest_id: self.contest_id,
                name: self.name,
                bio: self.bio,
                photo_url: self.photo_url,
                region: self.region,
                created_at,
            },
        }
    }
}

/// A partial update to a contestant. Absent fields are left unchanged; a
/// contestant cannot move to another contest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContestantUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl ContestantUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            check_length("name", name, CONTESTANT_NAME_LENGTH)?;
        }
        Ok(())
    }

    pub fn apply(self, contestant: &mut ContestantCore) {
        if let Some(name) = self.name {
            contestant.name = name;
        }
        if self.bio.is_some() {
            contestant.bio = self.bio;
        }
        if self.photo_url.is_some() {
            contestant.photo_url = self.photo_url;
        }
        if self.region.is_some() {
            contestant.region = self.region;
        }
    }
}

/// An API-friendly contestant description, including its live vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestantDescription {
    pub id: ContestantId,
    pub contest_id: ContestId,
    pub name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
    pub vote_count: u64,
}

impl ContestantDescription {
    pub fn new(contestant: Contestant, vote_count: u64) -> Self {
        Self {
            id: contestant.id,
            contest_id: contestant.contestant.contest_id,
            name: contestant.contestant.name,
            bio: contestant.contestant.bio,
            photo_url: contestant.contestant.photo_url,
            region: contestant.contestant.region,
            created_at: contestant.contestant.created_at,
            vote_count,
        }
    }
}
