pub const MAX_TOPICS: usize = 4;

const TOPIC_TABLE: &[(&[&str], &[&str])] = &[
    (
        &["virtualization"],
        &["VMware vSphere", "Hyper-V", "Memory Optimization", "High Availability"],
    ),
    (&["database"], &["SQL Server", "Oracle Database", "Storage Performance", "Backup Solutions"]),
    (
        &["ai", "machine learning"],
        &["GPU Acceleration", "TensorFlow", "Data Analytics", "Model Training"],
    ),
];

const DEFAULT_TOPICS: &[&str] =
    &["Server Consolidation", "Power Efficiency", "Scalability", "Support Services"];

/// Side-panel topics for an agent message. Every matching row contributes, in
/// table order, capped at [`MAX_TOPICS`].
pub fn related_topics(content: &str) -> Vec<&'static str> {
    let lowered = content.to_lowercase();
    let mut topics: Vec<&'static str> = TOPIC_TABLE
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .flat_map(|(_, topics)| topics.iter().copied())
        .collect();

    if topics.is_empty() {
        topics.extend_from_slice(DEFAULT_TOPICS);
    }
    topics.truncate(MAX_TOPICS);
    topics
}

#[cfg(test)]
mod tests {
    use super::related_topics;

    #[test]
    fn first_matching_row_fills_the_panel() {
        assert_eq!(
            related_topics("Database and virtualization"),
            vec!["VMware vSphere", "Hyper-V", "Memory Optimization", "High Availability"]
        );
        assert_eq!(related_topics("Machine learning")[0], "GPU Acceleration");
    }

    #[test]
    fn unmatched_content_uses_default_topics() {
        assert_eq!(
            related_topics("Hello there"),
            vec!["Server Consolidation", "Power Efficiency", "Scalability", "Support Services"]
        );
    }
}
