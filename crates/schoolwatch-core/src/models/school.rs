use serde::{Deserialize, Serialize};

use super::lenient;
use super::Record;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct School {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(rename = "schoolNumber", default, deserialize_with = "lenient::string")]
    pub school_number: String,
    #[serde(rename = "schoolName", default, deserialize_with = "lenient::string")]
    pub school_name: String,
    /// Free-text status tag ("good", "normal", "bad")
    #[serde(rename = "schoolStatus", default, deserialize_with = "lenient::string")]
    pub school_status: String,

    #[serde(rename = "unionName", default, deserialize_with = "lenient::string")]
    pub union_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::float")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "lenient::float")]
    pub longitude: f64,

    #[serde(rename = "maleStudents", default, deserialize_with = "lenient::int")]
    pub male_students: i32,
    #[serde(rename = "femaleStudents", default, deserialize_with = "lenient::int")]
    pub female_students: i32,
    #[serde(rename = "totalStudents", default, deserialize_with = "lenient::int")]
    pub total_students: i32,
    #[serde(rename = "dailyAttendance", default, deserialize_with = "lenient::int")]
    pub daily_attendance: i32,

    #[serde(rename = "headmasterName", default, deserialize_with = "lenient::string")]
    pub headmaster_name: String,
    #[serde(rename = "headmasterMobile", default, deserialize_with = "lenient::string")]
    pub headmaster_mobile: String,
    #[serde(rename = "asstHeadmasterName", default, deserialize_with = "lenient::string")]
    pub asst_headmaster_name: String,
    #[serde(rename = "asstHeadmasterMobile", default, deserialize_with = "lenient::string")]
    pub asst_headmaster_mobile: String,

    #[serde(rename = "policeName", default, deserialize_with = "lenient::string")]
    pub police_name: String,
    #[serde(rename = "policeMobile", default, deserialize_with = "lenient::string")]
    pub police_mobile: String,

    #[serde(rename = "lastUpdated", default, deserialize_with = "lenient::string")]
    pub last_updated: String,
}

impl School {
    /// Share of enrolled students present today, as a whole percentage.
    pub fn attendance_percentage(&self) -> i32 {
        if self.total_students > 0 {
            ((self.daily_attendance as f64 / self.total_students as f64) * 100.0) as i32
        } else {
            0
        }
    }

    pub fn has_location(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }

    /// Map search link for the school's coordinates
    pub fn maps_url(&self) -> Option<String> {
        if !self.has_location() {
            return None;
        }
        Some(format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            self.latitude, self.longitude
        ))
    }

    /// Case-insensitive name search. A blank query matches every school.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        self.school_name
            .to_lowercase()
            .contains(&query.to_lowercase())
    }

    pub fn display_name(&self) -> &str {
        if self.school_name.is_empty() {
            &self.id
        } else {
            &self.school_name
        }
    }
}

impl Record for School {
    const COLLECTION: &'static str = "schools";

    fn adopt_remote_key(&mut self, key: &str) {
        if self.id.is_empty() {
            self.id = key.to_string();
        }
    }
}

/// Aggregate figures over a list of schools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SchoolStats {
    pub school_count: usize,
    pub total_students: i64,
    pub total_attendance: i64,
    pub average_attendance_percentage: i32,
}

impl SchoolStats {
    pub fn from_records(schools: &[School]) -> Self {
        if schools.is_empty() {
            return Self::default();
        }
        let total_students = schools.iter().map(|s| s.total_students as i64).sum();
        let total_attendance = schools.iter().map(|s| s.daily_attendance as i64).sum();
        let percentage_sum: i64 = schools
            .iter()
            .map(|s| s.attendance_percentage() as i64)
            .sum();

        Self {
            school_count: schools.len(),
            total_students,
            total_attendance,
            average_attendance_percentage: (percentage_sum / schools.len() as i64) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school(total: i32, present: i32) -> School {
        School {
            total_students: total,
            daily_attendance: present,
            ..Default::default()
        }
    }

    #[test]
    fn test_attendance_percentage() {
        assert_eq!(school(404, 380).attendance_percentage(), 94);
        assert_eq!(school(230, 150).attendance_percentage(), 65);
        assert_eq!(school(0, 10).attendance_percentage(), 0);
    }

    #[test]
    fn test_school_stats() {
        let stats = SchoolStats::from_records(&[school(404, 380), school(230, 150)]);
        assert_eq!(stats.school_count, 2);
        assert_eq!(stats.total_students, 634);
        assert_eq!(stats.total_attendance, 530);
        assert_eq!(stats.average_attendance_percentage, (94 + 65) / 2);

        assert_eq!(SchoolStats::from_records(&[]), SchoolStats::default());
    }

    #[test]
    fn test_maps_url_requires_both_coordinates() {
        let mut s = School::default();
        assert_eq!(s.maps_url(), None);

        s.latitude = 25.7743;
        assert_eq!(s.maps_url(), None);

        s.longitude = 89.6441;
        assert_eq!(
            s.maps_url().as_deref(),
            Some("https://www.google.com/maps/search/?api=1&query=25.7743,89.6441")
        );
    }

    #[test]
    fn test_matches_name_case_insensitively() {
        let s = School {
            school_name: "Ulipur Model Government Primary School".to_string(),
            ..Default::default()
        };

        assert!(s.matches(""));
        assert!(s.matches("   "));
        assert!(s.matches("model"));
        assert!(s.matches("ULIPUR MODEL"));
        assert!(s.matches(" primary "));
        assert!(!s.matches("high school"));
        assert!(!School::default().matches("model"));
    }

    #[test]
    fn test_parse_loosely_typed_school() {
        let json = r#"{
            "id": 1,
            "schoolNumber": "01",
            "schoolName": "Ulipur Model Government Primary School",
            "schoolStatus": "good",
            "latitude": "25.7743",
            "longitude": 89,
            "maleStudents": "215",
            "femaleStudents": 189.0,
            "totalStudents": 404,
            "dailyAttendance": "n/a",
            "headmasterMobile": 1712345678,
            "policeName": null
        }"#;

        let school: School = serde_json::from_str(json).unwrap();
        assert_eq!(school.id, "1");
        assert_eq!(school.latitude, 25.7743);
        assert_eq!(school.longitude, 89.0);
        assert_eq!(school.male_students, 215);
        assert_eq!(school.female_students, 189);
        assert_eq!(school.daily_attendance, 0);
        assert_eq!(school.headmaster_mobile, "1712345678");
        assert_eq!(school.police_name, "");
        assert_eq!(school.address, "");
    }

    #[test]
    fn test_adopt_remote_key_only_fills_empty_id() {
        let mut s = School::default();
        s.adopt_remote_key("-Nabc");
        assert_eq!(s.id, "-Nabc");

        s.adopt_remote_key("other");
        assert_eq!(s.id, "-Nabc");
    }
}
