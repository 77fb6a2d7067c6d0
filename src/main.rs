//! hirank: Candidate Ranking CLI Tool
//!
//! Ranks job candidates by predicted probability of approval, keeping the
//! best of several classifiers by held-out ROC-AUC.

use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use indicatif::ProgressBar;

use hirank::cli::{confirm_overwrite_models, run_simulate, Cli, Commands};
use hirank::pipeline::{dataset_stats, load_candidates, run_pipeline_with, Stage, StageObserver};
use hirank::report::{
    export_diagnostics, small_input_warning, write_ranked_csv, DiagnosticsExport, RankingSummary,
};
use hirank::utils::{
    create_spinner, finish_with_error, finish_with_success, init_logging, print_banner,
    print_completion, print_config, print_info, print_step_header, print_step_time, print_success,
    print_warning,
};

/// Step headers, spinners and timings for each pipeline stage
struct ConsoleObserver {
    spinner: Option<ProgressBar>,
    started: Instant,
}

impl ConsoleObserver {
    fn new() -> Self {
        Self {
            spinner: None,
            started: Instant::now(),
        }
    }

    /// Close a spinner left open by a failed stage
    fn abort(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            finish_with_error(&spinner, "Stage failed");
        }
    }
}

impl StageObserver for ConsoleObserver {
    fn stage_started(&mut self, stage: Stage) {
        print_step_header(stage.number(), stage.title());
        self.started = Instant::now();
        self.spinner = Some(create_spinner(&format!("{}...", stage.title())));
    }

    fn stage_finished(&mut self, _stage: Stage, summary: &str) {
        if let Some(spinner) = self.spinner.take() {
            finish_with_success(&spinner, summary);
        }
        print_step_time(self.started.elapsed());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::Simulate { output, rows, seed } => {
                let path = run_simulate(output.as_deref(), *rows, *seed)?;
                print_success(&format!("Simulated data saved to {}", path.display()));
                Ok(())
            }
        };
    }

    // Main ranking pipeline - require input
    let input = cli
        .input()
        .ok_or_else(|| anyhow!("Input file is required. Use -i/--input to specify a file."))?;
    let output_path = cli
        .output_path()
        .ok_or_else(|| anyhow!("Cannot derive an output path from {}", input.display()))?;
    let diagnostics_path = cli
        .diagnostics_path()
        .ok_or_else(|| anyhow!("Cannot derive a diagnostics path from {}", input.display()))?;
    let config = cli.pipeline_config();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(input, &output_path, &config);

    let model_paths: Vec<_> = config
        .variants
        .iter()
        .map(|v| config.model_path(&v.name))
        .collect();
    let existing: Vec<&Path> = model_paths
        .iter()
        .filter(|p| p.exists())
        .map(|p| p.as_path())
        .collect();
    if !existing.is_empty() && !cli.no_confirm && !confirm_overwrite_models(&existing)? {
        print_warning("Aborted, existing models left untouched");
        return Ok(());
    }

    // Load
    let step_start = Instant::now();
    let spinner = create_spinner("Loading candidate table...");
    let df = match load_candidates(input, cli.infer_schema_length) {
        Ok(df) => df,
        Err(e) => {
            finish_with_error(&spinner, "Failed to load input");
            return Err(e).with_context(|| format!("Failed to load {}", input.display()));
        }
    };
    let stats = dataset_stats(&df);
    finish_with_success(
        &spinner,
        &format!("Loaded {} rows x {} columns", stats.rows, stats.columns),
    );
    print_info(&format!("Estimated memory: {:.2} MB", stats.memory_mb));
    if let Some(warning) = small_input_warning(stats.rows) {
        print_warning(&warning);
    }
    print_step_time(step_start.elapsed());

    // Pipeline stages
    let mut observer = ConsoleObserver::new();
    let outcome = match run_pipeline_with(&df, &config, &mut observer) {
        Ok(outcome) => outcome,
        Err(e) => {
            observer.abort();
            return Err(e).context("Ranking pipeline failed");
        }
    };

    // Save results
    print_step_header(Stage::ALL.len() + 1, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing ranked candidates...");
    write_ranked_csv(&outcome.selection.ranked, &output_path)?;
    let diagnostics = DiagnosticsExport::from_outcome(&outcome, &config, &input.display().to_string());
    export_diagnostics(&diagnostics, &diagnostics_path)?;
    finish_with_success(&spinner, "Results saved");
    print_success(&format!("Ranking: {}", output_path.display()));
    print_success(&format!("Diagnostics: {}", diagnostics_path.display()));
    print_success(&format!("Model: {}", outcome.selection.model_path.display()));
    print_step_time(step_start.elapsed());

    RankingSummary::from_outcome(&outcome, cli.top).display();
    print_completion();

    Ok(())
}
