use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

/// Qualitative rating of a single test result, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FitnessLevel {
    VeryGood,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl FitnessLevel {
    pub const ALL: [FitnessLevel; 5] = [
        FitnessLevel::VeryGood,
        FitnessLevel::Good,
        FitnessLevel::Fair,
        FitnessLevel::Poor,
        FitnessLevel::VeryPoor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FitnessLevel::VeryGood => "Very good",
            FitnessLevel::Good => "Good",
            FitnessLevel::Fair => "Fair",
            FitnessLevel::Poor => "Poor",
            FitnessLevel::VeryPoor => "Very poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub name: String,
    pub role: Role,
    /// Linked student record when role is STUDENT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    /// School-assigned number, distinct from the entity id.
    pub student_id: String,
    pub name: String,
    pub gender: Gender,
    pub birth_date: String,
    pub class_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestItem {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub teacher_id: String,
    pub class_id: String,
    pub test_item_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_item_id: String,
    pub score: f64,
    pub level: FitnessLevel,
}

/// One dated measurement snapshot for one student. A student may accumulate
/// several of these over time; the latest by `date` is the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessRecord {
    pub id: String,
    pub student_id: String,
    /// RFC 3339 UTC timestamp; sorts correctly as a plain string.
    pub date: String,
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
    pub results: Vec<TestResult>,
}

/// The five standard test items every new workspace starts with.
pub fn standard_test_items() -> Vec<TestItem> {
    vec![
        TestItem {
            id: "bmi".to_string(),
            name: "Body mass index (BMI)".to_string(),
            unit: "kg/m²".to_string(),
            description: "Body proportion assessment".to_string(),
        },
        TestItem {
            id: "sit_reach".to_string(),
            name: "Sit and reach".to_string(),
            unit: "cm".to_string(),
            description: "Flexibility".to_string(),
        },
        TestItem {
            id: "push_up".to_string(),
            name: "Modified push-ups, 30 s".to_string(),
            unit: "reps".to_string(),
            description: "Arm and shoulder strength".to_string(),
        },
        TestItem {
            id: "sit_up".to_string(),
            name: "Sit-ups, 60 s".to_string(),
            unit: "reps".to_string(),
            description: "Abdominal strength".to_string(),
        },
        TestItem {
            id: "step_test".to_string(),
            name: "Step test, 3 min".to_string(),
            unit: "reps".to_string(),
            description: "Cardiovascular endurance".to_string(),
        },
    ]
}
