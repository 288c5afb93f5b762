//! Course/topic registry and the prerequisite graph built on top of it.
//!
//! A [`TopicCatalog`] is validated once at construction and never mutated
//! afterwards; share it behind an `Arc`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DIFFICULTY: u8 = 3;
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 120;
pub const MAX_DIFFICULTY: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMeta {
    pub difficulty: u8,
    pub prerequisites: Vec<String>,
    pub estimated_minutes: u32,
}

impl Default for TopicMeta {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            prerequisites: Vec::new(),
            estimated_minutes: DEFAULT_ESTIMATED_MINUTES,
        }
    }
}

impl TopicMeta {
    pub fn new(difficulty: u8, prerequisites: &[&str], estimated_minutes: u32) -> Self {
        Self {
            difficulty,
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            estimated_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub name: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
    #[error("topic {topic} is listed in more than one course: {courses:?}")]
    AmbiguousTopic { topic: String, courses: Vec<String> },
    #[error("unknown course: {0}")]
    UnknownCourse(String),
    #[error("course {0} is declared twice")]
    DuplicateCourse(String),
    #[error("topic {topic} is listed twice in course {course}")]
    DuplicateTopic { course: String, topic: String },
    #[error("topic {topic} requires unknown topic {prerequisite}")]
    DanglingPrerequisite { topic: String, prerequisite: String },
    #[error("topic {topic} has difficulty {difficulty}, expected 1..=5")]
    InvalidDifficulty { topic: String, difficulty: u8 },
    #[error("topic {0} has a zero time estimate")]
    InvalidEstimate(String),
    #[error("prerequisite cycle through topic {0}")]
    PrerequisiteCycle(String),
    #[error("catalog parse error: {0}")]
    Parse(String),
    #[error("catalog io error: {0}")]
    Io(String),
}

#[derive(Debug, Clone)]
pub struct TopicCatalog {
    courses: Vec<Course>,
    meta: HashMap<String, TopicMeta>,
}

impl TopicCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn is_empty(&self) -> bool {
        self.courses.iter().all(|c| c.topics.is_empty())
    }

    pub fn topics_of(&self, course: &str) -> Option<&[String]> {
        self.courses
            .iter()
            .find(|c| c.name == course)
            .map(|c| c.topics.as_slice())
    }

    /// `(course, topic)` pairs in declaration order.
    pub fn iter_topics(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.courses
            .iter()
            .flat_map(|c| c.topics.iter().map(move |t| (c.name.as_str(), t.as_str())))
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.meta.contains_key(topic)
    }

    /// Listed topics without explicit metadata resolve to [`TopicMeta::default`].
    pub fn metadata_of(&self, topic: &str) -> Result<&TopicMeta, CatalogError> {
        self.meta
            .get(topic)
            .ok_or_else(|| CatalogError::UnknownTopic(topic.to_string()))
    }

    pub fn course_of(&self, topic: &str) -> Result<&str, CatalogError> {
        let owners: Vec<&str> = self
            .courses
            .iter()
            .filter(|c| c.topics.iter().any(|t| t == topic))
            .map(|c| c.name.as_str())
            .collect();

        match owners.as_slice() {
            [] => Err(CatalogError::UnknownTopic(topic.to_string())),
            [course] => Ok(*course),
            _ => Err(CatalogError::AmbiguousTopic {
                topic: topic.to_string(),
                courses: owners.iter().map(|c| c.to_string()).collect(),
            }),
        }
    }

    /// Topics that list `topic` as a direct prerequisite, in catalog order.
    pub fn dependents_of(&self, topic: &str) -> Result<Vec<&str>, CatalogError> {
        if !self.contains(topic) {
            return Err(CatalogError::UnknownTopic(topic.to_string()));
        }

        let mut seen = HashSet::new();
        Ok(self
            .iter_topics()
            .map(|(_, t)| t)
            .filter(|t| seen.insert(*t))
            .filter(|t| {
                self.meta
                    .get(*t)
                    .is_some_and(|m| m.prerequisites.iter().any(|p| p == topic))
            })
            .collect())
    }

    /// Every transitive prerequisite of `topic`, prerequisites before the
    /// topics that need them, ending with `topic` itself.
    pub fn learning_path(&self, topic: &str) -> Result<Vec<&str>, CatalogError> {
        let (name, _) = self
            .meta
            .get_key_value(topic)
            .ok_or_else(|| CatalogError::UnknownTopic(topic.to_string()))?;

        let mut path = Vec::new();
        let mut visited = HashSet::new();
        self.visit_prerequisites(name.as_str(), &mut visited, &mut path);
        Ok(path)
    }

    fn visit_prerequisites<'a>(
        &'a self,
        topic: &'a str,
        visited: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) {
        if !visited.insert(topic) {
            return;
        }
        if let Some(meta) = self.meta.get(topic) {
            for prereq in &meta.prerequisites {
                self.visit_prerequisites(prereq.as_str(), visited, path);
            }
        }
        path.push(topic);
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_json::from_str(raw).map_err(|e| CatalogError::Parse(e.to_string()))?;

        let mut builder = CatalogBuilder::default();
        for course in file.courses {
            let mut names = Vec::with_capacity(course.topics.len());
            for entry in course.topics {
                match entry {
                    TopicEntry::Name(name) => names.push(name),
                    TopicEntry::Detailed(detail) => {
                        if detail.difficulty.is_some()
                            || detail.estimated_minutes.is_some()
                            || !detail.prerequisites.is_empty()
                        {
                            let defaults = TopicMeta::default();
                            builder = builder.meta(
                                detail.name.clone(),
                                TopicMeta {
                                    difficulty: detail.difficulty.unwrap_or(defaults.difficulty),
                                    prerequisites: detail.prerequisites,
                                    estimated_minutes: detail
                                        .estimated_minutes
                                        .unwrap_or(defaults.estimated_minutes),
                                },
                            );
                        }
                        names.push(detail.name);
                    }
                }
            }
            builder = builder.course(course.name, names);
        }

        builder.build()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// The eight-course catalog the tutor ships with.
    pub fn builtin() -> Result<Self, CatalogError> {
        CatalogBuilder::default()
            .course(
                "Computer Science",
                ["Python Basics", "Data Structures", "Algorithms", "Web Development"],
            )
            .course(
                "Mathematics",
                ["Calculus", "Linear Algebra", "Statistics", "Discrete Mathematics"],
            )
            .course(
                "Physics",
                ["Classical Mechanics", "Electromagnetism", "Quantum Physics", "Thermodynamics"],
            )
            .course(
                "Chemistry",
                [
                    "Organic Chemistry",
                    "Inorganic Chemistry",
                    "Physical Chemistry",
                    "Analytical Chemistry",
                ],
            )
            .course(
                "Biology",
                ["Cell Biology", "Genetics", "Evolutionary Biology", "Ecology"],
            )
            .course(
                "Artificial Intelligence",
                ["RAG", "Generative AI", "Natural Language Processing"],
            )
            .course(
                "Machine Learning",
                [
                    "Transformers",
                    "Supervised Learning",
                    "Unsupervised Learning",
                    "Reinforcement Learning",
                    "Neural Networks",
                ],
            )
            .course(
                "Data Science",
                ["Data Analysis with Python", "Data Visualization", "Big Data Technologies"],
            )
            .topic("Python Basics", 1, &[], 90)
            .topic("Data Structures", 3, &["Python Basics"], 180)
            .topic("Algorithms", 4, &["Data Structures"], 240)
            .topic("Web Development", 3, &["Python Basics"], 200)
            .topic("Calculus", 4, &[], 220)
            .topic("Linear Algebra", 3, &[], 180)
            .topic("Statistics", 2, &[], 150)
            .topic("Discrete Mathematics", 3, &[], 160)
            .topic("Classical Mechanics", 4, &["Calculus"], 240)
            .topic("Electromagnetism", 5, &["Calculus"], 260)
            .topic("Quantum Physics", 5, &["Classical Mechanics", "Linear Algebra"], 300)
            .topic("Thermodynamics", 3, &["Calculus"], 180)
            .topic("RAG", 4, &["Natural Language Processing"], 150)
            .topic("Generative AI", 4, &["Neural Networks"], 180)
            .topic("Natural Language Processing", 3, &["Supervised Learning"], 200)
            .topic("Transformers", 5, &["Neural Networks"], 240)
            .topic("Supervised Learning", 2, &["Python Basics", "Statistics"], 160)
            .topic("Unsupervised Learning", 3, &["Python Basics", "Statistics"], 160)
            .topic("Reinforcement Learning", 5, &["Supervised Learning"], 220)
            .topic("Neural Networks", 4, &["Supervised Learning", "Linear Algebra"], 200)
            .topic("Data Analysis with Python", 2, &["Python Basics"], 180)
            .topic("Data Visualization", 2, &["Data Analysis with Python"], 120)
            .topic("Big Data Technologies", 4, &["Data Structures"], 200)
            .build()
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    courses: Vec<Course>,
    meta: Vec<(String, TopicMeta)>,
}

impl CatalogBuilder {
    pub fn course<I, S>(mut self, name: impl Into<String>, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.courses.push(Course {
            name: name.into(),
            topics: topics.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn topic(
        self,
        name: impl Into<String>,
        difficulty: u8,
        prerequisites: &[&str],
        estimated_minutes: u32,
    ) -> Self {
        self.meta(name, TopicMeta::new(difficulty, prerequisites, estimated_minutes))
    }

    pub fn meta(mut self, name: impl Into<String>, meta: TopicMeta) -> Self {
        self.meta.push((name.into(), meta));
        self
    }

    pub fn build(self) -> Result<TopicCatalog, CatalogError> {
        let mut course_names = HashSet::new();
        let mut listed: HashMap<&str, &str> = HashMap::new();
        for course in &self.courses {
            if !course_names.insert(course.name.as_str()) {
                return Err(CatalogError::DuplicateCourse(course.name.clone()));
            }
            for topic in &course.topics {
                match listed.insert(topic.as_str(), course.name.as_str()) {
                    None => {}
                    Some(owner) if owner == course.name => {
                        return Err(CatalogError::DuplicateTopic {
                            course: course.name.clone(),
                            topic: topic.clone(),
                        });
                    }
                    // A topic belongs to exactly one course.
                    Some(owner) => {
                        return Err(CatalogError::AmbiguousTopic {
                            topic: topic.clone(),
                            courses: vec![owner.to_string(), course.name.clone()],
                        });
                    }
                }
            }
        }

        let mut meta: HashMap<String, TopicMeta> = HashMap::new();
        for (topic, entry) in self.meta {
            if !listed.contains_key(topic.as_str()) {
                return Err(CatalogError::UnknownTopic(topic));
            }
            if entry.difficulty == 0 || entry.difficulty > MAX_DIFFICULTY {
                return Err(CatalogError::InvalidDifficulty {
                    topic,
                    difficulty: entry.difficulty,
                });
            }
            if entry.estimated_minutes == 0 {
                return Err(CatalogError::InvalidEstimate(topic));
            }
            if let Some(missing) = entry
                .prerequisites
                .iter()
                .find(|p| !listed.contains_key(p.as_str()))
            {
                return Err(CatalogError::DanglingPrerequisite {
                    prerequisite: missing.clone(),
                    topic,
                });
            }
            meta.insert(topic, entry);
        }

        for topic in listed.keys() {
            meta.entry(topic.to_string()).or_default();
        }

        let catalog = TopicCatalog {
            courses: self.courses,
            meta,
        };
        catalog.check_acyclic()?;
        Ok(catalog)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl TopicCatalog {
    fn check_acyclic(&self) -> Result<(), CatalogError> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for (_, topic) in self.iter_topics() {
            self.walk_for_cycle(topic, &mut marks)?;
        }
        Ok(())
    }

    fn walk_for_cycle<'a>(
        &'a self,
        topic: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Result<(), CatalogError> {
        match marks.get(topic) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return Err(CatalogError::PrerequisiteCycle(topic.to_string())),
            None => {}
        }

        marks.insert(topic, Mark::InProgress);
        if let Some(meta) = self.meta.get(topic) {
            for prereq in &meta.prerequisites {
                self.walk_for_cycle(prereq.as_str(), marks)?;
            }
        }
        marks.insert(topic, Mark::Done);
        Ok(())
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    courses: Vec<CourseFile>,
}

#[derive(Deserialize)]
struct CourseFile {
    name: String,
    topics: Vec<TopicEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TopicEntry {
    Name(String),
    Detailed(TopicSpec),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicSpec {
    name: String,
    difficulty: Option<u8>,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(alias = "estimated_minutes")]
    estimated_minutes: Option<u32>,
}
