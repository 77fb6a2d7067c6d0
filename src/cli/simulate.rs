//! Synthetic candidate table generator

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use console::style;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::pipeline::schema::*;
use crate::utils::{create_spinner, finish_with_success};

pub const DEFAULT_SIMULATED_OUTPUT: &str = "simulated_candidates.csv";

const YES_NO: &[&str] = &["Sim", "Não"];
const LANGUAGE_LEVELS: &[&str] = &["Fluente", "Avançado", "Intermediário", "Básico", "Nenhum"];
const CANDIDATE_LANGUAGE_LEVELS: &[&str] = &["Nenhum", "Básico", "Intermediário", "Avançado"];
const APPLICATION_DAYS: u64 = 1095;

fn pick<'a>(rng: &mut StdRng, options: &[&'a str], rows: usize) -> Vec<&'a str> {
    (0..rows)
        .map(|_| options.choose(rng).copied().unwrap_or_default())
        .collect()
}

fn pick_int(rng: &mut StdRng, options: &[i64], rows: usize) -> Vec<i64> {
    (0..rows)
        .map(|_| options.choose(rng).copied().unwrap_or_default())
        .collect()
}

/// Random candidate records covering every column of the candidate schema.
/// The same seed always produces the same table.
pub fn generate_candidates(rows: usize, seed: u64) -> PolarsResult<DataFrame> {
    let mut rng = StdRng::seed_from_u64(seed);
    let first_day = NaiveDate::from_ymd_opt(2021, 1, 1);

    let dates: Vec<Option<String>> = (0..rows)
        .map(|_| {
            let offset = rng.gen_range(0..APPLICATION_DAYS);
            first_day
                .and_then(|d| d.checked_add_days(Days::new(offset)))
                .map(|d| d.format("%Y-%m-%d").to_string())
        })
        .collect();

    let columns = vec![
        Column::new(VACANCY_CONTRACT_TYPE.into(), pick(&mut rng, &["CLT", "PJ"], rows)),
        Column::new(VACANCY_SAP.into(), pick(&mut rng, YES_NO, rows)),
        Column::new(
            VACANCY_REGION.into(),
            pick(
                &mut rng,
                &["São Paulo", "Pernambuco", "Rio de Janeiro", "Minas Gerais"],
                rows,
            ),
        ),
        Column::new(VACANCY_PCD.into(), pick(&mut rng, YES_NO, rows)),
        Column::new(
            VACANCY_PROFESSIONAL_LEVEL.into(),
            pick(&mut rng, &["Pleno", "Senior", "Junior", "Estágio"], rows),
        ),
        Column::new(
            VACANCY_EDUCATION_LEVEL.into(),
            pick(
                &mut rng,
                &[
                    "Ensino Superior Completo",
                    "Pós Graduação Incompleto",
                    "Mestrado",
                    "Doutorado",
                ],
                rows,
            ),
        ),
        Column::new(VACANCY_ENGLISH_LEVEL.into(), pick(&mut rng, LANGUAGE_LEVELS, rows)),
        Column::new(VACANCY_SPANISH_LEVEL.into(), pick(&mut rng, LANGUAGE_LEVELS, rows)),
        Column::new(
            PROSPECT_CANDIDATE_STATUS.into(),
            pick(
                &mut rng,
                &["Em processo seletivo", "Aprovado", "Rejeitado"],
                rows,
            ),
        ),
        Column::new(PROSPECT_APPLICATION_DATE.into(), dates),
        Column::new(
            CANDIDATE_DDD_MOBILE.into(),
            pick_int(&mut rng, &[11, 21, 31, 41, 51, 61], rows),
        ),
        Column::new(CANDIDATE_PCD.into(), pick_int(&mut rng, &[0, 1], rows)),
        Column::new(
            CANDIDATE_CERTIFICATIONS.into(),
            pick_int(&mut rng, &[0, 1, 2], rows),
        ),
        Column::new(
            CANDIDATE_ACADEMIC_LEVEL.into(),
            pick(
                &mut rng,
                &[
                    "Ensino Médio",
                    "Ensino Superior Completo",
                    "Pós Graduação Incompleto",
                    "Mestrado",
                ],
                rows,
            ),
        ),
        Column::new(
            CANDIDATE_ENGLISH_LEVEL.into(),
            pick(&mut rng, CANDIDATE_LANGUAGE_LEVELS, rows),
        ),
        Column::new(
            CANDIDATE_SPANISH_LEVEL.into(),
            pick(&mut rng, CANDIDATE_LANGUAGE_LEVELS, rows),
        ),
    ];

    DataFrame::new(columns)
}

/// Write a simulated candidate CSV
pub fn run_simulate(output: Option<&Path>, rows: usize, seed: u64) -> Result<PathBuf> {
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SIMULATED_OUTPUT));

    println!(
        "\n {} Generating simulated candidates",
        style("◆").cyan().bold()
    );
    println!("   Rows:   {}", style(rows).yellow());
    println!("   Seed:   {}", style(seed).dim());
    println!("   Output: {}", style(output_path.display()).dim());
    println!();

    let spinner = create_spinner("Generating records...");
    let mut df = generate_candidates(rows, seed).context("Failed to build simulated table")?;

    let mut file = File::create(&output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .with_context(|| format!("Failed to write CSV file: {}", output_path.display()))?;
    finish_with_success(&spinner, &format!("Wrote {} simulated candidates", rows));

    Ok(output_path)
}
