use serde::Serialize;

use crate::calc::{classify_bmi, round_half_up_2, BmiCategory};
use crate::model::{FitnessLevel, FitnessRecord, Student, TestItem};

/// The record a view should treat as "current": max by date string (RFC 3339
/// sorts lexically), ties broken by record id so output is reproducible.
pub fn latest_record<'a>(
    student_id: &str,
    records: &'a [FitnessRecord],
) -> Option<&'a FitnessRecord> {
    records
        .iter()
        .filter(|r| r.student_id == student_id)
        .max_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BmiBucket {
    pub category: BmiCategory,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelBucket {
    pub level: FitnessLevel,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSummary {
    pub student_count: usize,
    pub record_count: usize,
    /// Only non-zero categories, ordered underweight → obese.
    pub bmi_distribution: Vec<BmiBucket>,
    /// All five levels, counting records with at least one result at that
    /// level. Counts records, not students.
    pub level_distribution: Vec<LevelBucket>,
    /// Raw record count over student count, as a percentage. A student with
    /// two records counts twice; kept that way on purpose (see DESIGN.md).
    pub completion_rate: f64,
}

/// School-wide statistics over the full records collection. Total: empty
/// input produces an all-zero summary, never an error.
pub fn summarize_school(students: &[Student], records: &[FitnessRecord]) -> SchoolSummary {
    let mut bmi_counts = [0usize; BmiCategory::ALL.len()];
    for student in students {
        let Some(latest) = latest_record(&student.id, records) else {
            continue;
        };
        if let Some(category) = classify_bmi(latest.bmi) {
            let idx = BmiCategory::ALL
                .iter()
                .position(|c| *c == category)
                .unwrap_or(0);
            bmi_counts[idx] += 1;
        }
    }
    let bmi_distribution = BmiCategory::ALL
        .iter()
        .zip(bmi_counts)
        .filter(|(_, count)| *count > 0)
        .map(|(category, count)| BmiBucket {
            category: *category,
            count,
        })
        .collect();

    let level_distribution = FitnessLevel::ALL
        .iter()
        .map(|level| LevelBucket {
            level: *level,
            count: records
                .iter()
                .filter(|r| r.results.iter().any(|res| res.level == *level))
                .count(),
        })
        .collect();

    let completion_rate =
        round_half_up_2(100.0 * records.len() as f64 / students.len().max(1) as f64);

    SchoolSummary {
        student_count: students.len(),
        record_count: records.len(),
        bmi_distribution,
        level_distribution,
        completion_rate,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Done,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStudentRow {
    pub student_id: String,
    /// School-assigned number.
    pub student_no: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<BmiCategory>,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub class_id: String,
    pub rows: Vec<ClassStudentRow>,
    /// Scoped to this class's students' latest records only.
    pub level_distribution: Vec<LevelBucket>,
}

fn positive(v: f64) -> Option<f64> {
    (v > 0.0).then_some(v)
}

/// Per-class report: one row per enrolled student, latest record joined in,
/// students without a record marked pending. Inputs are never mutated.
pub fn summarize_class(
    class_id: &str,
    students: &[Student],
    records: &[FitnessRecord],
) -> ClassSummary {
    let mut rows = Vec::new();
    let mut latest_records: Vec<&FitnessRecord> = Vec::new();

    for student in students.iter().filter(|s| s.class_id == class_id) {
        let latest = latest_record(&student.id, records);
        if let Some(record) = latest {
            latest_records.push(record);
        }
        // Measurements fall back to the student's baseline when the record
        // carries none, as the class export in the original app does.
        let weight = latest.and_then(|r| positive(r.weight)).or(student.weight);
        let height = latest.and_then(|r| positive(r.height)).or(student.height);
        let bmi = latest.map(|r| r.bmi);
        rows.push(ClassStudentRow {
            student_id: student.id.clone(),
            student_no: student.student_id.clone(),
            name: student.name.clone(),
            weight,
            height,
            bmi,
            category: bmi.and_then(classify_bmi),
            status: if latest.is_some() {
                RecordStatus::Done
            } else {
                RecordStatus::Pending
            },
        });
    }

    let level_distribution = FitnessLevel::ALL
        .iter()
        .map(|level| LevelBucket {
            level: *level,
            count: latest_records
                .iter()
                .filter(|r| r.results.iter().any(|res| res.level == *level))
                .count(),
        })
        .collect();

    ClassSummary {
        class_id: class_id.to_string(),
        rows,
        level_distribution,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualResult {
    pub test_item_id: String,
    pub name: String,
    pub unit: String,
    pub score: f64,
    pub level: FitnessLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualReport {
    pub student_id: String,
    pub record_id: String,
    pub date: String,
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<BmiCategory>,
    /// In canonical test-item order, not result-insertion order. Results
    /// referencing a deleted test item are skipped.
    pub results: Vec<IndividualResult>,
}

/// Latest-record report for one student, or `None` when the student has no
/// records at all ("no data", not an error).
pub fn summarize_individual(
    student_id: &str,
    records: &[FitnessRecord],
    test_items: &[TestItem],
) -> Option<IndividualReport> {
    let record = latest_record(student_id, records)?;
    let results = test_items
        .iter()
        .filter_map(|item| {
            let result = record.results.iter().find(|r| r.test_item_id == item.id)?;
            Some(IndividualResult {
                test_item_id: item.id.clone(),
                name: item.name.clone(),
                unit: item.unit.clone(),
                score: result.score,
                level: result.level,
            })
        })
        .collect();
    Some(IndividualReport {
        student_id: student_id.to_string(),
        record_id: record.id.clone(),
        date: record.date.clone(),
        weight: record.weight,
        height: record.height,
        bmi: record.bmi,
        category: classify_bmi(record.bmi),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, TestResult};

    fn student(id: &str, class_id: &str) -> Student {
        Student {
            id: id.to_string(),
            student_id: format!("no-{id}"),
            name: format!("Student {id}"),
            gender: Gender::Male,
            birth_date: "2012-01-01".to_string(),
            class_id: class_id.to_string(),
            weight: None,
            height: None,
        }
    }

    fn record(id: &str, student_id: &str, date: &str, bmi: f64) -> FitnessRecord {
        FitnessRecord {
            id: id.to_string(),
            student_id: student_id.to_string(),
            date: date.to_string(),
            weight: 50.0,
            height: 150.0,
            bmi,
            results: vec![TestResult {
                test_item_id: "push_up".to_string(),
                score: 20.0,
                level: FitnessLevel::Good,
            }],
        }
    }

    #[test]
    fn empty_school_summary_is_all_zero() {
        let summary = summarize_school(&[], &[]);
        assert_eq!(summary.student_count, 0);
        assert_eq!(summary.record_count, 0);
        assert!(summary.bmi_distribution.is_empty());
        assert!(summary.level_distribution.iter().all(|b| b.count == 0));
        assert_eq!(summary.completion_rate, 0.0);
    }

    #[test]
    fn school_summary_counts_latest_record_per_student() {
        let students = vec![student("s1", "c1"), student("s2", "c1")];
        let records = vec![
            // s1's older record is obese, latest is normal; only the latest
            // may land in the distribution.
            record("r1", "s1", "2025-01-10T08:00:00.000Z", 26.0),
            record("r2", "s1", "2025-06-10T08:00:00.000Z", 22.22),
        ];
        let summary = summarize_school(&students, &records);
        assert_eq!(
            summary.bmi_distribution,
            vec![BmiBucket {
                category: BmiCategory::Normal,
                count: 1
            }]
        );
        // Completion rate is raw records over students: 2 / 2.
        assert_eq!(summary.completion_rate, 100.0);
        // Level distribution counts records, not students.
        let good = summary
            .level_distribution
            .iter()
            .find(|b| b.level == FitnessLevel::Good)
            .expect("good bucket");
        assert_eq!(good.count, 2);
    }

    #[test]
    fn completion_rate_never_divides_by_zero() {
        let records = vec![record("r1", "ghost", "2025-01-10T08:00:00.000Z", 21.0)];
        let summary = summarize_school(&[], &records);
        assert_eq!(summary.completion_rate, 100.0);
    }

    #[test]
    fn latest_record_breaks_date_ties_by_id() {
        let records = vec![
            record("r-b", "s1", "2025-06-10T08:00:00.000Z", 20.0),
            record("r-a", "s1", "2025-06-10T08:00:00.000Z", 21.0),
        ];
        let latest = latest_record("s1", &records).expect("latest");
        assert_eq!(latest.id, "r-b");
    }

    #[test]
    fn class_summary_marks_students_without_records_pending() {
        let students = vec![student("s1", "c1"), student("s2", "c1"), student("s3", "c2")];
        let records = vec![record("r1", "s1", "2025-06-10T08:00:00.000Z", 22.22)];
        let summary = summarize_class("c1", &students, &records);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].status, RecordStatus::Done);
        assert_eq!(summary.rows[0].category, Some(BmiCategory::Normal));
        assert_eq!(summary.rows[1].status, RecordStatus::Pending);
        assert_eq!(summary.rows[1].bmi, None);
    }

    #[test]
    fn class_summary_is_idempotent_over_identical_inputs() {
        let students = vec![student("s1", "c1"), student("s2", "c1")];
        let records = vec![
            record("r1", "s1", "2025-06-10T08:00:00.000Z", 22.22),
            record("r2", "s2", "2025-06-11T08:00:00.000Z", 18.2),
        ];
        let first = summarize_class("c1", &students, &records);
        let second = summarize_class("c1", &students, &records);
        assert_eq!(first, second);
    }

    #[test]
    fn individual_report_without_records_is_none() {
        let items = crate::model::standard_test_items();
        assert_eq!(summarize_individual("s1", &[], &items), None);
    }

    #[test]
    fn individual_report_follows_canonical_item_order() {
        let items = crate::model::standard_test_items();
        let mut rec = record("r1", "s1", "2025-06-10T08:00:00.000Z", 22.22);
        rec.results = vec![
            TestResult {
                test_item_id: "step_test".to_string(),
                score: 90.0,
                level: FitnessLevel::Fair,
            },
            TestResult {
                test_item_id: "gone_item".to_string(),
                score: 1.0,
                level: FitnessLevel::Poor,
            },
            TestResult {
                test_item_id: "sit_reach".to_string(),
                score: 11.0,
                level: FitnessLevel::Good,
            },
        ];
        let report = summarize_individual("s1", &[rec], &items).expect("report");
        // Canonical order puts sit_reach before step_test; the dangling
        // result is dropped silently.
        let ids: Vec<&str> = report
            .results
            .iter()
            .map(|r| r.test_item_id.as_str())
            .collect();
        assert_eq!(ids, vec!["sit_reach", "step_test"]);
    }
}
