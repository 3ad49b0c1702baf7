mod catalog;

pub use catalog::{StaticKnowledgeBase, roadmap_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mentor {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub link: String,
}

/// Static reference data for one career.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareerRecord {
    pub description: String,
    pub required_skills: Vec<String>,
    pub future_skills: Vec<String>,
    pub courses: Vec<Course>,
    pub portfolio_examples: Vec<String>,
    pub mentors: Vec<Mentor>,
    pub jobs: Vec<JobPosting>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapResource {
    pub label: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapPhase {
    pub phase: String,
    pub focus: String,
    pub resources: Vec<RoadmapResource>,
}

/// A knowledge-base record personalized for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareerInfo {
    pub career: String,
    pub record: CareerRecord,
    pub missing_skills: Vec<String>,
    pub roadmap: Vec<RoadmapPhase>,
}

impl CareerInfo {
    pub fn from_record(career: &str, record: &CareerRecord, user_skills: &[String]) -> Self {
        let missing_skills = record
            .required_skills
            .iter()
            .filter(|skill| {
                !user_skills
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(skill))
            })
            .cloned()
            .collect();

        Self {
            career: career.to_string(),
            record: record.clone(),
            missing_skills,
            roadmap: build_roadmap(record),
        }
    }
}

fn build_roadmap(record: &CareerRecord) -> Vec<RoadmapPhase> {
    let skills = &record.required_skills;
    let course_resources = |from: usize, to: usize| {
        record
            .courses
            .iter()
            .skip(from)
            .take(to.saturating_sub(from))
            .map(|course| RoadmapResource {
                label: course.title.clone(),
                link: course.link.clone(),
            })
            .collect::<Vec<_>>()
    };

    vec![
        RoadmapPhase {
            phase: "Phase 1: Foundations".to_string(),
            focus: format!(
                "Basics: {}",
                skills.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
            ),
            resources: course_resources(0, 2),
        },
        RoadmapPhase {
            phase: "Phase 2: Intermediate Skills".to_string(),
            focus: format!(
                "Intermediate: {}",
                skills
                    .iter()
                    .skip(2)
                    .take(1)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            resources: course_resources(1, 3),
        },
        RoadmapPhase {
            phase: "Phase 3: Projects".to_string(),
            focus: "Project & Portfolio: Build 1-2 projects & share on GitHub".to_string(),
            resources: record
                .portfolio_examples
                .iter()
                .map(|link| RoadmapResource {
                    label: link.clone(),
                    link: link.clone(),
                })
                .collect(),
        },
    ]
}

pub trait KnowledgeBaseStore: Send + Sync {
    /// Exact, case-sensitive lookup by career name.
    fn lookup(&self, career: &str) -> Option<&CareerRecord>;
}
