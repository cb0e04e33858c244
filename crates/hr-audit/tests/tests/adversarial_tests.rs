#[path = "adversarial/tampered_sections.rs"]
mod tampered_sections;

#[path = "adversarial/forged_links.rs"]
mod forged_links;

#[path = "adversarial/truncated_log.rs"]
mod truncated_log;
