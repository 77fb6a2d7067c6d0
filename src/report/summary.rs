//! Ranking summary report generation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{status_label, PipelineOutcome, RankedCandidate, VariantScore};

/// K values highlighted in the summary when the evaluation set is large enough
const HIGHLIGHT_KS: [usize; 4] = [10, 50, 100, 500];

/// Below this many input rows the held-out ranking is too small to trust
pub const MIN_RECOMMENDED_ROWS: usize = 100;

/// Warning shown for inputs smaller than [`MIN_RECOMMENDED_ROWS`]
pub fn small_input_warning(rows: usize) -> Option<String> {
    (rows < MIN_RECOMMENDED_ROWS).then(|| {
        format!(
            "Only {} rows loaded; at least {} are recommended for a meaningful ranking",
            rows, MIN_RECOMMENDED_ROWS
        )
    })
}

/// Terminal summary of a ranking run
#[derive(Debug, Default)]
pub struct RankingSummary {
    pub selected_variant: String,
    pub scores: Vec<VariantScore>,
    pub failures: Vec<String>,
    pub dropped_correlated: Vec<String>,
    pub top: Vec<RankedCandidate>,
    /// Held-out candidates per status
    pub approved: usize,
    pub rejected: usize,
    /// (k, Precision@k) for the highlighted K values that fit
    pub precision: Vec<(usize, f64)>,
    pub base_rate: f64,
}

impl RankingSummary {
    pub fn from_outcome(outcome: &PipelineOutcome, top: usize) -> Self {
        let selection = &outcome.selection;
        let precision = HIGHLIGHT_KS
            .iter()
            .filter_map(|&k| outcome.precision.at(k).map(|p| (k, p)))
            .collect();
        let approved = selection.ranked.iter().filter(|c| c.approved == 1).count();
        Self {
            selected_variant: selection.best.variant.clone(),
            scores: selection.scores.clone(),
            failures: selection.failures.iter().map(|f| f.to_string()).collect(),
            dropped_correlated: outcome.dropped_correlated.clone(),
            top: selection.ranked.iter().take(top).cloned().collect(),
            approved,
            rejected: selection.ranked.len() - approved,
            precision,
            base_rate: outcome.precision.base_rate,
        }
    }

    /// Per-variant ROC-AUC, the selected one highlighted
    pub fn variant_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Variant").add_attribute(Attribute::Bold),
            Cell::new("ROC-AUC").add_attribute(Attribute::Bold),
        ]);

        for score in &self.scores {
            let selected = score.variant == self.selected_variant;
            let name = if selected {
                Cell::new(format!("🏆 {}", score.variant))
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold)
            } else {
                Cell::new(&score.variant)
            };
            let auc = Cell::new(format!("{:.4}", score.roc_auc)).fg(if selected {
                Color::Green
            } else {
                Color::White
            });
            table.add_row(vec![name, auc]);
        }

        for failure in &self.failures {
            table.add_row(vec![
                Cell::new(failure).fg(Color::Red),
                Cell::new("failed").fg(Color::Red),
            ]);
        }

        table
    }

    /// Top of the ranking
    pub fn ranking_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Candidate").add_attribute(Attribute::Bold),
            Cell::new("Approval").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

        for (i, candidate) in self.top.iter().enumerate() {
            let color = if candidate.approved == 1 {
                Color::Green
            } else {
                Color::Red
            };
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&candidate.candidate_id),
                Cell::new(format!("{:.1}%", candidate.approval_probability * 100.0)),
                Cell::new(candidate.status()).fg(color),
            ]);
        }

        table
    }

    /// One-line count of held-out candidates per status
    pub fn status_line(&self) -> String {
        format!(
            "{} ranked: {} {}, {} {}",
            self.approved + self.rejected,
            self.approved,
            status_label(1),
            self.rejected,
            status_label(0)
        )
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("MODEL SELECTION").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();
        print_indented(&self.variant_table());

        println!();
        println!(
            "    {} {}",
            style("📊").cyan(),
            style("RANKING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!("      {}", self.status_line());

        if !self.precision.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("🎯").cyan(),
                style("PRECISION@K").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            for (k, p) in &self.precision {
                let color_p = if *p > self.base_rate {
                    style(format!("{:.1}%", p * 100.0)).green()
                } else {
                    style(format!("{:.1}%", p * 100.0)).yellow()
                };
                println!("      @{:<5} {}", k, color_p);
            }
            println!(
                "      {} {}",
                style("base rate").dim(),
                style(format!("{:.1}%", self.base_rate * 100.0)).dim()
            );
        }

        if !self.top.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("🏅").cyan(),
                style(format!("TOP {} CANDIDATES", self.top.len())).white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            println!();
            print_indented(&self.ranking_table());
        }

        if !self.dropped_correlated.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Dropped for correlation").yellow(),
                style(format!("({})", self.dropped_correlated.len())).dim()
            );
            for feature in &self.dropped_correlated {
                println!("        {} {}", style("•").dim(), feature);
            }
        }
    }
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_list_variants_and_candidates() {
        let summary = RankingSummary {
            selected_variant: "XGBoost".to_string(),
            scores: vec![
                VariantScore {
                    variant: "RandomForest".to_string(),
                    roc_auc: 0.71,
                },
                VariantScore {
                    variant: "XGBoost".to_string(),
                    roc_auc: 0.83,
                },
            ],
            failures: vec!["variant 'LogisticRegression': boom".to_string()],
            top: vec![RankedCandidate {
                candidate_id: "c-17".to_string(),
                row: 17,
                approval_probability: 0.875,
                approved: 1,
            }],
            ..Default::default()
        };

        let variants = summary.variant_table().to_string();
        assert!(variants.contains("RandomForest"));
        assert!(variants.contains("0.8300"));
        assert!(variants.contains("failed"));

        let ranking = summary.ranking_table().to_string();
        assert!(ranking.contains("c-17"));
        assert!(ranking.contains("87.5%"));
        assert!(ranking.contains("Aprovado"));
    }

    #[test]
    fn test_status_line_counts_both_statuses() {
        let summary = RankingSummary {
            approved: 3,
            rejected: 9,
            ..Default::default()
        };
        assert_eq!(summary.status_line(), "12 ranked: 3 Aprovado, 9 Reprovado");
    }

    #[test]
    fn test_small_input_warning_threshold() {
        assert!(small_input_warning(99).unwrap().contains("99 rows"));
        assert!(small_input_warning(MIN_RECOMMENDED_ROWS).is_none());
        assert!(small_input_warning(5_000).is_none());
    }
}
