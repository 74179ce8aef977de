//! Fixed category → skill-name dictionary backing the offline extractor.

/// Taxonomy categories, in prompt order.
pub const SKILL_CATEGORIES: &[&str] = &[
    "Programming Language",
    "Frontend Framework",
    "Backend Framework",
    "Database",
    "Cloud Platform",
    "DevOps",
    "Security",
    "Data & ML",
    "Soft Skill",
    "Tool",
    "Methodology",
    "Domain Knowledge",
];

/// Category used when a reported category is not one of `SKILL_CATEGORIES`.
pub const FALLBACK_CATEGORY: &str = "Tool";

// Names match as case-insensitive substrings. "Go", "R" and "C" would hit
// nearly every posting and are left out.
pub const KNOWN_SKILLS: &[(&str, &[&str])] = &[
    (
        "Programming Language",
        &[
            "Python", "JavaScript", "TypeScript", "Java", "Rust", "Golang", "Kotlin", "Swift",
            "Ruby", "PHP", "Scala", "C++", "C#", "Elixir", "Haskell", "Clojure",
        ],
    ),
    (
        "Frontend Framework",
        &["React", "Angular", "Vue", "Svelte", "Next.js", "Redux", "Tailwind"],
    ),
    (
        "Backend Framework",
        &[
            "Django", "Flask", "FastAPI", "Express", "Spring Boot", "Rails", "Laravel", "NestJS",
            "Node.js", "GraphQL",
        ],
    ),
    (
        "Database",
        &[
            "PostgreSQL", "MySQL", "MongoDB", "Redis", "Elasticsearch", "DynamoDB", "Cassandra",
            "SQLite", "Snowflake",
        ],
    ),
    ("Cloud Platform", &["AWS", "Azure", "GCP", "Google Cloud", "Heroku"]),
    (
        "DevOps",
        &["Docker", "Kubernetes", "Terraform", "Ansible", "Jenkins", "CI/CD", "GitHub Actions"],
    ),
    ("Security", &["OAuth", "OWASP", "Penetration Testing", "IAM", "SIEM"]),
    (
        "Data & ML",
        &[
            "Machine Learning", "TensorFlow", "PyTorch", "Pandas", "Spark", "Kafka", "Airflow",
            "dbt", "NLP",
        ],
    ),
    (
        "Soft Skill",
        &["Communication", "Leadership", "Mentoring", "Problem Solving", "Teamwork"],
    ),
    ("Tool", &["Git", "Jira", "Figma", "Linux", "Postman"]),
    ("Methodology", &["Agile", "Scrum", "Kanban", "TDD", "Microservices"]),
    (
        "Domain Knowledge",
        &["Fintech", "Healthcare", "E-commerce", "Blockchain", "Payments"],
    ),
];

/// Returns the canonical category spelling, or `FALLBACK_CATEGORY`.
pub fn canonical_category(category: &str) -> &'static str {
    let wanted = category.trim();
    SKILL_CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(wanted))
        .copied()
        .unwrap_or(FALLBACK_CATEGORY)
}

/// Every dictionary entry found in `text`, as `(name, category)`.
pub fn scan(text: &str) -> Vec<(&'static str, &'static str)> {
    let haystack = text.to_lowercase();
    KNOWN_SKILLS
        .iter()
        .flat_map(|(category, names)| names.iter().map(move |name| (*name, *category)))
        .filter(|(name, _)| haystack.contains(&name.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_reports_case_insensitive_hits() {
        let hits = scan("We use python, docker and POSTGRESQL daily.");
        assert!(hits.contains(&("Python", "Programming Language")));
        assert!(hits.contains(&("Docker", "DevOps")));
        assert!(hits.contains(&("PostgreSQL", "Database")));
        assert!(!hits.iter().any(|(n, _)| *n == "Kubernetes"));
    }

    #[test]
    fn test_scan_reports_hits_inside_longer_names() {
        let hits = scan("Senior JavaScript developer, GitHub Actions");
        assert!(hits.contains(&("JavaScript", "Programming Language")));
        assert!(hits.contains(&("Java", "Programming Language")));
        assert!(hits.contains(&("GitHub Actions", "DevOps")));
        assert!(hits.contains(&("Git", "Tool")));
    }

    #[test]
    fn test_canonical_category() {
        assert_eq!(canonical_category("data & ml"), "Data & ML");
        assert_eq!(canonical_category("Spreadsheets"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_every_category_has_entries() {
        for category in SKILL_CATEGORIES {
            assert!(KNOWN_SKILLS.iter().any(|(c, names)| c == category && !names.is_empty()));
        }
    }
}
