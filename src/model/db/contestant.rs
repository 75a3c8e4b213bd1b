use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::{ContestId, ContestantId};

/// Core contestant data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ContestantCore {
    /// Foreign Key contest ID.
    pub contest_id: ContestId,
    /// Contestant name.
    pub name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub region: Option<String>,
    /// Creation time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A contestant from the database, with its unique ID.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Contestant {
    #[serde(rename = "_id")]
    pub id: ContestantId,
    #[serde(flatten)]
    pub contestant: ContestantCore,
}

impl Deref for Contestant {
    type Target = ContestantCore;

    fn deref(&self) -> &Self::Target {
        &self.contestant
    }
}

impl DerefMut for Contestant {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.contestant
    }
}
