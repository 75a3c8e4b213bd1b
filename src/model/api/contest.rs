use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::{ContestId, ContestStatus},
    db::contest::{Contest, ContestCore},
};

use super::validation::{check_dates, check_length, CONTEST_NAME_LENGTH};

/// A contest specification, as submitted when creating a contest.
///
/// New contests always start as [`ContestStatus::Draft`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub client_name: Option<String>,
}

impl ContestSpec {
    /// Check the spec is acceptable.
    pub fn validate(&self) -> Result<()> {
        check_length("name", &self.name, CONTEST_NAME_LENGTH)?;
        check_dates(self.start_date, self.end_date)
    }

    /// Convert this spec into a stored contest with the given ID.
    pub fn into_contest(self, id: ContestId, created_at: DateTime<Utc>) -> Contest {
        Contest {
            id,
            contest: ContestCore {
                name: self.name,
                description: self.description,
                start_date: self.start_date,
                end_date: self.end_date,
                client_name: self.client_name,
                status: ContestStatus::Draft,
                created_at,
            },
        }
    }
}

/// A partial update to a contest. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContestUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContestStatus>,
}

impl ContestUpdate {
    /// Check the fields that can be checked without the existing contest.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            check_length("name", name, CONTEST_NAME_LENGTH)?;
        }
        Ok(())
    }

    /// Apply this update to an existing contest, rejecting it if the
    /// resulting window would end before it starts.
    pub fn apply(self, contest: &mut ContestCore) -> Result<()> {
        let start_date = self.start_date.unwrap_or(contest.start_date);
        let end_date = self.end_date.unwrap_or(contest.end_date);
        check_dates(start_date, end_date)?;

        contest.start_date = start_date;
        contest.end_date = end_date;
        if let Some(name) = self.name {
            contest.name = name;
        }
        if let Some(description) = self.description {
            contest.description = Some(description);
        }
        if let Some(client_name) = self.client_name {
            contest.client_name = Some(client_name);
        }
        if let Some(status) = self.status {
            contest.status = status;
        }
        Ok(())
    }
}

/// An API-friendly contest description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestDescription {
    pub id: ContestId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub client_name: Option<String>,
    pub status: ContestStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Contest> for ContestDescription {
    fn from(contest: Contest) -> Self {
        Self {
            id: contest.id,
            name: contest.contest.name,
            description: contest.contest.description,
            start_date: contest.contest.start_date,
            end_date: contest.contest.end_date,
            client_name: contest.contest.client_name,
            status: contest.contest.status,
            created_at: contest.contest.created_at,
        }
    }
}


#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    use crate::error::Error;

    #[test]
    fn spec_validation() {
        assert!(ContestSpec::current_example().validate().is_ok());

        let mut spec = ContestSpec::current_example();
        spec.name = "ab".to_string();
        assert!(matches!(spec.validate(), Err(Error::Validation(_))));

        let mut spec = ContestSpec::current_example();
        spec.end_date = spec.start_date - Duration::seconds(1);
        assert!(matches!(spec.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn new_contests_are_drafts() {
        let contest = ContestSpec::current_example().into_contest(7, Utc::now());
        assert_eq!(contest.id, 7);
        assert_eq!(contest.status, ContestStatus::Draft);
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut contest = ContestSpec::current_example()
            .into_contest(1, Utc::now())
            .contest;
        let original = contest.clone();

        let update = ContestUpdate {
            name: Some("Renamed".to_string()),
            status: Some(ContestStatus::Active),
            ..Default::default()
        };
        update.apply(&mut contest).unwrap();

        assert_eq!(contest.name, "Renamed");
        assert_eq!(contest.status, ContestStatus::Active);
        assert_eq!(contest.description, original.description);
        assert_eq!(contest.start_date, original.start_date);
        assert_eq!(contest.end_date, original.end_date);
        assert_eq!(contest.created_at, original.created_at);
    }

    #[test]
    fn update_checks_merged_window() {
        let mut contest = ContestSpec::current_example()
            .into_contest(1, Utc::now())
            .contest;
        let original = contest.clone();

        // Moving only the end before the existing start is rejected.
        let update = ContestUpdate {
            end_date: Some(original.start_date - Duration::minutes(1)),
            ..Default::default()
        };
        assert!(matches!(
            update.apply(&mut contest),
            Err(Error::Validation(_))
        ));
        assert_eq!(contest, original);

        // Moving both is fine.
        let update = ContestUpdate {
            start_date: Some(original.start_date - Duration::days(2)),
            end_date: Some(original.start_date - Duration::days(1)),
            ..Default::default()
        };
        update.apply(&mut contest).unwrap();
        assert_eq!(contest.start_date, original.start_date - Duration::days(2));
    }

    #[test]
    fn update_name_is_validated() {
        let update = ContestUpdate {
            name: Some("x".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(ContestUpdate::default().validate().is_ok());
    }
}
