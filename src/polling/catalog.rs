//! Season catalog served as `<base>/<year>/Index.json`.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// All meetings of one year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Season {
    /// Championship year.
    pub year: u16,
    /// Meetings in calendar order.
    pub meetings: Vec<Meeting>,
}

impl Season {
    /// Iterates every session of every meeting.
    pub fn sessions(&self) -> impl Iterator<Item = (&Meeting, &Session)> {
        self.meetings
            .iter()
            .flat_map(|meeting| meeting.sessions.iter().map(move |session| (meeting, session)))
    }

    /// Finds a session by key.
    #[must_use]
    pub fn session(&self, key: u32) -> Option<&Session> {
        self.sessions()
            .map(|(_, session)| session)
            .find(|session| session.key == key)
    }
}

/// One race weekend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Meeting {
    /// Meeting key.
    pub key: u32,
    /// Short name (`"Bahrain Grand Prix"`).
    pub name: String,
    /// Official name.
    pub official_name: String,
    /// Host city.
    pub location: String,
    /// Host country.
    pub country: Option<Country>,
    /// Circuit, whose key selects the track geometry.
    pub circuit: Option<Circuit>,
    /// Sessions of the weekend.
    pub sessions: Vec<Session>,
}

/// Host country of a meeting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Country {
    /// ISO-like code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Circuit of a meeting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Circuit {
    /// Circuit key.
    pub key: u32,
    /// Short name.
    pub short_name: String,
}

/// One timed session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Session {
    /// Session key.
    pub key: u32,
    /// Session type (`Practice`, `Qualifying`, `Race`).
    #[serde(rename = "Type")]
    pub kind: String,
    /// Session name (`"Practice 1"`, `"Sprint"`).
    pub name: String,
    /// Local start date.
    pub start_date: Option<String>,
    /// Local end date.
    pub end_date: Option<String>,
    /// Path prefix of the session's static files, relative to the base URL.
    pub path: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"{
        "Year": 2024,
        "Meetings": [{
            "Key": 1229,
            "Name": "Bahrain Grand Prix",
            "Location": "Sakhir",
            "Country": {"Key": 36, "Code": "BRN", "Name": "Bahrain"},
            "Circuit": {"Key": 63, "ShortName": "Sakhir"},
            "Sessions": [
                {"Key": 9472, "Type": "Race", "Name": "Race", "StartDate": "2024-03-02T18:00:00",
                 "Path": "2024/2024-03-02_Bahrain_Grand_Prix/2024-03-02_Race/"},
                {"Key": 9468, "Type": "Qualifying", "Name": "Qualifying", "Path": "q/"}
            ]
        }]
    }"#;

    #[test]
    fn test_parse_season() {
        let season: Season = serde_json::from_str(INDEX).unwrap();
        assert_eq!(season.year, 2024);

        let meeting = &season.meetings[0];
        assert_eq!(meeting.circuit.as_ref().unwrap().key, 63);
        assert_eq!(meeting.country.as_ref().unwrap().code, "BRN");
        assert_eq!(meeting.sessions[0].kind, "Race");
        assert_eq!(meeting.sessions[1].start_date, None);
    }

    #[test]
    fn test_session_lookup() {
        let season: Season = serde_json::from_str(INDEX).unwrap();
        assert_eq!(season.sessions().count(), 2);
        assert_eq!(season.session(9468).unwrap().path, "q/");
        assert!(season.session(1).is_none());
    }
}
