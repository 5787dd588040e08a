use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mendel_core::{
    FitEstimate, FitEstimator, InheritanceModel, Pedigree, PermutationResult, PermutationTest,
};

#[derive(Parser)]
#[command(name = "mendelfit")]
#[command(version)]
#[command(about = "Monte Carlo Mendelian inheritance fitting for pedigrees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate how well an inheritance model explains a pedigree
    Fit {
        /// Path to pedigree CSV file (columns: id, sex, status, father, mother)
        #[arg(short, long)]
        pedigree: String,

        /// Inheritance model code: AD, AR, or YL
        #[arg(short, long)]
        model: String,

        /// Number of simulation trials
        #[arg(long, default_value = "100000")]
        trials: usize,

        /// Random seed (defaults to a fresh random seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Also report the distinct consistent genotype assignments
        #[arg(long)]
        assignments: bool,

        /// Output format: "text" (default) or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compute a permutation-test p-value for the model fit
    Pvalue {
        /// Path to pedigree CSV file (columns: id, sex, status, father, mother)
        #[arg(short, long)]
        pedigree: String,

        /// Inheritance model code: AD, AR, or YL
        #[arg(short, long)]
        model: String,

        /// Number of randomized pedigrees to simulate
        #[arg(long, default_value = "10000")]
        simulations: usize,

        /// Trials per fit estimation
        #[arg(long, default_value = "1000")]
        trials: usize,

        /// Number of parallel workers (defaults to available cores)
        #[arg(long)]
        workers: Option<usize>,

        /// Random seed (defaults to a fresh random seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: "text" (default) or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fit {
            pedigree,
            model,
            trials,
            seed,
            assignments,
            format,
        } => cmd_fit(&pedigree, &model, trials, seed, assignments, &format),
        Commands::Pvalue {
            pedigree,
            model,
            simulations,
            trials,
            workers,
            seed,
            format,
        } => cmd_pvalue(&pedigree, &model, simulations, trials, workers, seed, &format),
    }
}

fn load_inputs(pedigree_path: &str, model_code: &str) -> Result<(Pedigree, InheritanceModel)> {
    let pedigree = Pedigree::from_csv(pedigree_path)
        .with_context(|| format!("Failed to load pedigree from '{}'", pedigree_path))?;
    eprintln!(
        "Loaded pedigree with {} members from '{}'",
        pedigree.len(),
        pedigree_path
    );

    let model = InheritanceModel::from_code(model_code).with_context(|| {
        format!(
            "Unknown model code '{}'. Use one of: AD, AR, YL.",
            model_code
        )
    })?;

    Ok((pedigree, model))
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    let seed = seed.unwrap_or_else(rand::random);
    eprintln!("Random seed: {}", seed);
    seed
}

fn cmd_fit(
    pedigree_path: &str,
    model_code: &str,
    trials: usize,
    seed: Option<u64>,
    assignments: bool,
    output_format: &str,
) -> Result<()> {
    let (pedigree, model) = load_inputs(pedigree_path, model_code)?;
    let seed = resolve_seed(seed);

    let estimate = FitEstimator::new(trials)
        .collect_assignments(assignments)
        .estimate_seeded(&pedigree, model, seed)
        .context("Fit estimation failed")?;

    match output_format.to_lowercase().as_str() {
        "json" => print_fit_json(&estimate, model)?,
        _ => print_fit_text(&estimate, model),
    }

    Ok(())
}

fn cmd_pvalue(
    pedigree_path: &str,
    model_code: &str,
    simulations: usize,
    trials: usize,
    workers: Option<usize>,
    seed: Option<u64>,
    output_format: &str,
) -> Result<()> {
    let (pedigree, model) = load_inputs(pedigree_path, model_code)?;
    let seed = resolve_seed(seed);

    let mut test = PermutationTest::new(simulations).trials(trials).seed(seed);
    if let Some(workers) = workers {
        test = test.workers(workers);
    }

    let result = test
        .run(&pedigree, model)
        .context("Permutation test failed")?;

    match output_format.to_lowercase().as_str() {
        "json" => print_pvalue_json(&result)?,
        _ => println!("{}", result.summary()),
    }

    Ok(())
}

fn print_fit_text(estimate: &FitEstimate, model: InheritanceModel) {
    println!("Model:        {} ({})", model.name(), model.code());
    println!(
        "Fit fraction: {:.6} ({} / {} trials consistent)",
        estimate.fraction, estimate.hits, estimate.trials
    );

    if !estimate.assignments.is_empty() {
        println!("\nDistinct consistent assignments:");
        for (i, assignment) in estimate.assignments.iter().enumerate() {
            println!("--- assignment {} ---", i + 1);
            for entry in assignment.entries() {
                println!(
                    "  [{}] {} {} genotype {}",
                    entry.id, entry.sex, entry.phenotype, entry.genotype
                );
            }
        }
    }
}

fn print_fit_json(estimate: &FitEstimate, model: InheritanceModel) -> Result<()> {
    let assignments: Vec<serde_json::Value> = estimate
        .assignments
        .iter()
        .map(|assignment| {
            let entries: Vec<serde_json::Value> = assignment
                .entries()
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "id": e.id,
                        "sex": e.sex.to_string(),
                        "phenotype": e.phenotype.to_string(),
                        "genotype": e.genotype,
                    })
                })
                .collect();
            serde_json::json!(entries)
        })
        .collect();

    let out = serde_json::json!({
        "model": model.code(),
        "fraction": estimate.fraction,
        "hits": estimate.hits,
        "trials": estimate.trials,
        "assignments": assignments,
    });

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_pvalue_json(result: &PermutationResult) -> Result<()> {
    let out = serde_json::json!({
        "model": result.model.code(),
        "p_value": result.p_value,
        "observed_fit": result.observed_fit,
        "count_at_or_above": result.count_at_or_above,
        "simulations_run": result.simulations_run,
        "trials_per_simulation": result.trials_per_simulation,
    });

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
