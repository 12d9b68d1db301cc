//! Table output formatting using comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::{or_dash, truncate};
use crate::domain::models::{Classification, Evidence, Lead, Lesson, Strategy};
use crate::domain::models::validation::LeadValidationResult;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
}

impl TableFormatter {
    /// Formatter with colors when stdout is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    /// Formatter with colors forced on or off.
    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn create_base_table(&self, header: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(
                header
                    .iter()
                    .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                    .collect::<Vec<_>>(),
            );
        table
    }

    fn classification_cell(&self, classification: Option<Classification>) -> Cell {
        let text = or_dash(classification);
        match classification {
            Some(c) if self.use_colors => Cell::new(text).fg(classification_color(c)),
            _ => Cell::new(text),
        }
    }

    /// Lead table.
    pub fn format_leads(&self, leads: &[Lead]) -> String {
        let mut table =
            self.create_base_table(&["Domain", "Company", "Stack", "Employees", "Funding", "Score", "Class"]);
        for lead in leads {
            table.add_row(vec![
                Cell::new(&lead.domain),
                Cell::new(truncate(&lead.name, 24)),
                Cell::new(truncate(&lead.tech_stack.join(", "), 36)),
                Cell::new(or_dash(lead.employees)),
                Cell::new(or_dash(lead.funding_stage.as_deref())),
                Cell::new(or_dash(lead.score)),
                self.classification_cell(lead.classification),
            ]);
        }
        table.to_string()
    }

    /// One row per strategy version.
    pub fn format_strategies(&self, strategies: &[Strategy]) -> String {
        let mut table = self.create_base_table(&["Version", "From", "ICP", "Keywords", "Created"]);
        for strategy in strategies {
            table.add_row(vec![
                Cell::new(strategy.version),
                Cell::new(or_dash(strategy.evolved_from)),
                Cell::new(truncate(&strategy.icp, 60)),
                Cell::new(truncate(&strategy.keywords.join(", "), 30)),
                Cell::new(strategy.created_at.format("%Y-%m-%d %H:%M").to_string()),
            ]);
        }
        table.to_string()
    }

    /// Lessons with their subject.
    pub fn format_lessons(&self, lessons: &[Lesson]) -> String {
        let mut table = self.create_base_table(&["Lesson", "Type", "Subject", "Details", "When"]);
        for lesson in lessons {
            let kind = if self.use_colors {
                Cell::new(lesson.lesson_type.as_str()).fg(Color::Yellow)
            } else {
                Cell::new(lesson.lesson_type.as_str())
            };
            table.add_row(vec![
                Cell::new(truncate(&lesson.lesson_id, 12)),
                kind,
                Cell::new(&lesson.subject),
                Cell::new(truncate(&lesson.details, 70)),
                Cell::new(lesson.timestamp.format("%Y-%m-%d %H:%M").to_string()),
            ]);
        }
        table.to_string()
    }

    /// Evidence sources with their retrieval time.
    pub fn format_evidence(&self, evidence: &[Evidence]) -> String {
        let mut table = self.create_base_table(&["Source", "Summary", "Retrieved"]);
        for item in evidence {
            table.add_row(vec![
                Cell::new(&item.source_url),
                Cell::new(truncate(&item.summary, 70)),
                Cell::new(item.retrieved_at.format("%Y-%m-%d %H:%M").to_string()),
            ]);
        }
        table.to_string()
    }

    /// One row per lead of a validation pass.
    pub fn format_validation_results(&self, results: &[LeadValidationResult]) -> String {
        let mut table = self.create_base_table(&["Company", "Domain", "Class", "Was", "Lesson"]);
        for result in results {
            match result {
                LeadValidationResult::Validated(verdict) => table.add_row(vec![
                    Cell::new(truncate(&verdict.company, 24)),
                    Cell::new(&verdict.domain),
                    self.classification_cell(Some(verdict.classification)),
                    Cell::new(or_dash(verdict.previous_classification)),
                    Cell::new(or_dash(verdict.lesson_type)),
                ]),
                LeadValidationResult::Failed { domain, company, error } => {
                    let error_cell = if self.use_colors {
                        Cell::new(truncate(error, 50)).fg(Color::Red)
                    } else {
                        Cell::new(format!("error: {}", truncate(error, 43)))
                    };
                    table.add_row(vec![
                        Cell::new(truncate(company, 24)),
                        Cell::new(domain),
                        error_cell,
                        Cell::new("-"),
                        Cell::new("-"),
                    ])
                }
            };
        }
        table.to_string()
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn supports_color() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    console::colors_enabled()
}

const fn classification_color(classification: Classification) -> Color {
    match classification {
        Classification::Strike => Color::Green,
        Classification::Monitor => Color::Yellow,
        Classification::Disregard => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_table_without_colors() {
        let mut lead = Lead::new("acme.io", "Acme")
            .with_tech_stack(["Postgres", "AWS"])
            .with_employees(120);
        lead.classification = Some(Classification::Strike);

        let rendered = TableFormatter::with_colors(false).format_leads(&[lead]);
        assert!(rendered.contains("acme.io"));
        assert!(rendered.contains("Postgres, AWS"));
        assert!(rendered.contains("Strike"));
    }

    #[test]
    fn test_failed_result_row() {
        let results = vec![LeadValidationResult::Failed {
            domain: "acme.io".to_string(),
            company: "Acme".to_string(),
            error: "tavily: timed out".to_string(),
        }];
        let rendered = TableFormatter::with_colors(false).format_validation_results(&results);
        assert!(rendered.contains("error: tavily: timed out"));
    }
}
