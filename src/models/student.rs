// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Student roster model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Offset of the class digit within a student id (`"10101"` is class `"1"`).
const CLASS_DIGIT_OFFSET: usize = 2;

/// One roster entry as stored in `students.json`.
///
/// `password` holds either an Argon2 PHC string or, for rosters written by
/// hand, the plain-text password until the student's first login.
/// Any other fields of a hand-written entry are kept through rewrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Student {
    /// Class number derived from the id.
    pub fn class_number(&self) -> Option<&str> {
        class_number_of(&self.id)
    }

    pub fn summary(&self) -> StudentSummary {
        StudentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            class_number: self.class_number().unwrap_or_default().to_string(),
        }
    }
}

/// Class number for a student id, if the id is long enough.
pub fn class_number_of(id: &str) -> Option<&str> {
    id.get(CLASS_DIGIT_OFFSET..CLASS_DIGIT_OFFSET + 1)
}

/// Student as exposed by the API (never carries the password).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "public/generated/")
)]
pub struct StudentSummary {
    pub id: String,
    pub name: String,
    pub class_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_number_uses_third_character() {
        assert_eq!(class_number_of("10101"), Some("1"));
        assert_eq!(class_number_of("10315"), Some("3"));
        assert_eq!(class_number_of("20401"), Some("4"));
    }

    #[test]
    fn test_class_number_ignores_other_digits() {
        let base = class_number_of("10201");
        for id in ["90201", "19299", "00200", "10288"] {
            assert_eq!(class_number_of(id), base, "id {}", id);
        }
    }

    #[test]
    fn test_class_number_short_id() {
        assert_eq!(class_number_of("10"), None);
        assert_eq!(class_number_of(""), None);
    }

    #[test]
    fn test_summary_omits_password() {
        let student = Student {
            id: "10101".to_string(),
            name: "Kim".to_string(),
            password: "1111".to_string(),
            extra: serde_json::Map::from_iter([("phone".to_string(), serde_json::json!("010"))]),
        };
        let json = serde_json::to_value(student.summary()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "10101", "name": "Kim", "classNumber": "1"})
        );
    }

    #[test]
    fn test_unknown_fields_survive_rewrite() {
        let raw = r#"{"id":"10101","name":"Kim","password":"1111","seat":7,"note":"left-handed"}"#;
        let student: Student = serde_json::from_str(raw).unwrap();
        assert_eq!(student.extra.len(), 2);

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["seat"], 7);
        assert_eq!(json["note"], "left-handed");
        assert_eq!(json["password"], "1111");
    }
}
