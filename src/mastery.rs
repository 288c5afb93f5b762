use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

pub const MIN_MASTERY: f64 = 0.0;
pub const MAX_MASTERY: f64 = 100.0;

pub fn clamp_mastery(level: f64) -> f64 {
    if level.is_nan() {
        return MIN_MASTERY;
    }
    level.clamp(MIN_MASTERY, MAX_MASTERY)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub user_id: String,
    pub course: String,
    pub topic: String,
    pub mastery_level: f64,
}

impl MasteryRecord {
    pub fn new(
        user_id: impl Into<String>,
        course: impl Into<String>,
        topic: impl Into<String>,
        mastery_level: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            course: course.into(),
            topic: topic.into(),
            mastery_level,
        }
    }
}

/// Snapshot of the full mastery table. One row per (user, course, topic);
/// when the input repeats a key the later row wins.
#[derive(Debug, Clone, Default)]
pub struct MasteryTable {
    records: Vec<MasteryRecord>,
}

impl MasteryTable {
    pub fn new(rows: impl IntoIterator<Item = MasteryRecord>) -> Self {
        let mut records: Vec<MasteryRecord> = Vec::new();
        let mut index: HashMap<(String, String, String), usize> = HashMap::new();

        for row in rows {
            let key = (row.user_id.clone(), row.course.clone(), row.topic.clone());
            match index.get(&key) {
                Some(&pos) => records[pos] = row,
                None => {
                    index.insert(key, records.len());
                    records.push(row);
                }
            }
        }

        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MasteryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.records.iter().any(|r| r.user_id == user_id)
    }

    pub fn users(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.user_id.as_str()).collect()
    }

    pub fn topics(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.topic.as_str()).collect()
    }

    pub fn for_user(&self, user_id: &str) -> UserMastery<'_> {
        let mut levels = HashMap::new();
        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

        for record in self.records.iter().filter(|r| r.user_id == user_id) {
            levels.insert(
                (record.course.as_str(), record.topic.as_str()),
                record.mastery_level,
            );
            let entry = sums.entry(record.course.as_str()).or_insert((0.0, 0));
            entry.0 += record.mastery_level;
            entry.1 += 1;
        }

        let course_averages = sums
            .into_iter()
            .map(|(course, (sum, count))| (course, sum / count as f64))
            .collect();

        UserMastery {
            levels,
            course_averages,
        }
    }
}

/// One learner's slice of a [`MasteryTable`].
#[derive(Debug, Clone)]
pub struct UserMastery<'a> {
    levels: HashMap<(&'a str, &'a str), f64>,
    course_averages: BTreeMap<&'a str, f64>,
}

impl<'a> UserMastery<'a> {
    pub fn has_records(&self) -> bool {
        !self.levels.is_empty()
    }

    /// 0.0 when the learner has no record for the topic.
    pub fn mastery(&self, course: &str, topic: &str) -> f64 {
        self.levels.get(&(course, topic)).copied().unwrap_or(MIN_MASTERY)
    }

    /// Mean over the learner's records in `course`, 0.0 when there are none.
    pub fn course_average(&self, course: &str) -> f64 {
        self.course_averages.get(course).copied().unwrap_or(MIN_MASTERY)
    }

    pub fn course_averages(&self) -> &BTreeMap<&'a str, f64> {
        &self.course_averages
    }
}
