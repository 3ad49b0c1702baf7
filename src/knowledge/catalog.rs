use std::collections::HashMap;

use super::{CareerRecord, Course, JobPosting, KnowledgeBaseStore, Mentor};

const ROADMAP_URLS: [(&str, &str); 5] = [
    ("frontend developer", "https://roadmap.sh/frontend"),
    ("backend developer", "https://roadmap.sh/backend"),
    ("devops engineer", "https://roadmap.sh/devops"),
    ("data scientist", "https://roadmap.sh/data-science"),
    ("machine learning engineer", "https://roadmap.sh/machine-learning"),
];

/// roadmap.sh page for one of the well-known careers, matched case-insensitively.
pub fn roadmap_url(career: &str) -> Option<&'static str> {
    let needle = career.trim();
    ROADMAP_URLS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(needle))
        .map(|(_, url)| *url)
}

#[derive(Debug, Clone)]
pub struct StaticKnowledgeBase {
    records: HashMap<String, CareerRecord>,
}

impl Default for StaticKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticKnowledgeBase {
    pub fn new() -> Self {
        let mut records = HashMap::new();
        records.insert("Data Scientist".to_string(), data_scientist());
        records.insert("Software Engineer".to_string(), software_engineer());
        Self { records }
    }

    pub fn careers(&self) -> Vec<&str> {
        let mut names = self.records.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

impl KnowledgeBaseStore for StaticKnowledgeBase {
    fn lookup(&self, career: &str) -> Option<&CareerRecord> {
        self.records.get(career)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn course(title: &str, link: &str) -> Course {
    Course {
        title: title.to_string(),
        link: link.to_string(),
    }
}

fn data_scientist() -> CareerRecord {
    CareerRecord {
        description: "Analyze data, build models, and extract insights for decision making."
            .to_string(),
        required_skills: strings(&[
            "Python",
            "Statistics",
            "Machine Learning",
            "Data Visualization",
            "SQL",
        ]),
        future_skills: strings(&[
            "MLOps",
            "Causal ML",
            "Generative AI for data",
            "ModelOps",
        ]),
        courses: vec![
            course(
                "Python for Data Science (Coursera)",
                "https://www.coursera.org/specializations/data-science-python",
            ),
            course(
                "Machine Learning (Andrew Ng)",
                "https://www.coursera.org/learn/machine-learning",
            ),
            course(
                "Data Visualization",
                "https://www.udacity.com/course/data-visualization--nd197",
            ),
        ],
        portfolio_examples: strings(&[
            "https://github.com/ageron/handson-ml",
            "https://github.com/benhamner/Machine-Learning-Projects",
        ]),
        mentors: vec![Mentor {
            name: "Jane Data".to_string(),
            link: "https://linkedin.com/in/janedata".to_string(),
        }],
        jobs: vec![JobPosting {
            title: "Data Scientist".to_string(),
            company: "Acme".to_string(),
            link: "https://example.com/apply_ds".to_string(),
        }],
    }
}

fn software_engineer() -> CareerRecord {
    CareerRecord {
        description:
            "Design and implement software systems, focusing on reliability and scale."
                .to_string(),
        required_skills: strings(&["Programming", "Algorithms", "System Design", "Testing"]),
        future_skills: strings(&[
            "Cloud-native patterns",
            "Distributed Systems",
            "AI-assisted coding",
        ]),
        courses: vec![
            course(
                "CS50",
                "https://online-learning.harvard.edu/course/cs50-introduction-computer-science",
            ),
            course(
                "System Design Primer",
                "https://github.com/donnemartin/system-design-primer",
            ),
        ],
        portfolio_examples: strings(&["https://github.com/trekhleb/javascript-algorithms"]),
        mentors: vec![Mentor {
            name: "John Eng".to_string(),
            link: "https://linkedin.com/in/johneng".to_string(),
        }],
        jobs: vec![JobPosting {
            title: "Backend Engineer".to_string(),
            company: "ScaleX".to_string(),
            link: "https://example.com/apply_be".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::{StaticKnowledgeBase, roadmap_url};
    use crate::knowledge::KnowledgeBaseStore;

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let kb = StaticKnowledgeBase::new();
        assert!(kb.lookup("Data Scientist").is_some());
        assert!(kb.lookup("data scientist").is_none());
        assert!(kb.lookup("Astronaut").is_none());
        assert_eq!(kb.careers(), vec!["Data Scientist", "Software Engineer"]);
    }

    #[test]
    fn roadmap_url_ignores_case_and_padding() {
        assert_eq!(
            roadmap_url("  DevOps Engineer "),
            Some("https://roadmap.sh/devops")
        );
        assert_eq!(
            roadmap_url("data scientist"),
            Some("https://roadmap.sh/data-science")
        );
        assert_eq!(roadmap_url("Astronaut"), None);
    }
}
