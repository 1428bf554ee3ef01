use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

use tools::common::io::model_stem;
use tools::dump::{ModelDump, dump_model};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Dump trained FANN .net files into per-layer CSV weight tables"
)]
struct Cli {
    /// .net ファイル（複数指定可、.gz は展開して読む）
    #[arg(long = "model", required = true, value_name = "PATH")]
    models: Vec<PathBuf>,

    /// 出力先（モデルごとに <output_dir>/<stem>/ を作る）
    #[arg(long, default_value = "weights")]
    output_dir: PathBuf,

    /// モデルごとの要約を JSON で保存
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// 警告（未消費の接続・重複した接続元）も失敗として扱う
    #[arg(long)]
    strict: bool,

    /// 並列数（0: rayon の既定値）
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

#[derive(Serialize)]
struct ModelReport<'a> {
    model: &'a Path,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dump: Option<&'a ModelDump>,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    check_unique_stems(&cli.models)?;

    // スレッド数を設定
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new().num_threads(cli.threads).build_global().unwrap_or_else(
            |e| {
                log::warn!("failed to set thread count: {e}");
            },
        );
    }

    // モデルごとに独立して処理し、表示は入力順に行う
    let results: Vec<Result<ModelDump>> =
        cli.models.par_iter().map(|model| dump_model(model, &cli.output_dir)).collect();

    let multi = cli.models.len() > 1;
    let mut reports = Vec::with_capacity(results.len());
    for (model, result) in cli.models.iter().zip(&results) {
        if multi {
            println!("== {}", model.display());
        }
        reports.push(report(model, result, cli.strict));
    }
    let failed = reports.iter().filter(|r| !r.ok).count();

    if let Some(path) = &cli.summary_json {
        save_summary(path, &reports)?;
        println!("wrote summary JSON: {}", path.display());
    }

    if failed > 0 {
        if multi {
            eprintln!("{failed} of {} models failed", cli.models.len());
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// 同じ stem のモデルは同じ出力先に書き込むため拒否する
fn check_unique_stems(models: &[PathBuf]) -> Result<()> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for model in models {
        let stem = model_stem(model);
        if let Some(prev) = seen.insert(stem.clone(), model) {
            bail!(
                "{} and {} would both write to '{stem}'; rename one of them",
                prev.display(),
                model.display()
            );
        }
    }
    Ok(())
}

fn report<'a>(model: &'a Path, result: &'a Result<ModelDump>, strict: bool) -> ModelReport<'a> {
    let dump = match result {
        Ok(dump) => dump,
        Err(e) => {
            eprintln!("error: {}: {e:#}", model.display());
            return ModelReport { model, ok: false, error: Some(format!("{e:#}")), dump: None };
        }
    };

    for warning in &dump.summary.warnings {
        println!("Warning: {warning}");
    }
    for table in &dump.tables {
        println!(
            "Layer {}→{}: {} targets × {} sources written to {}",
            table.source_layer,
            table.target_layer,
            table.rows,
            table.sources,
            table.path.display()
        );
    }
    if let Some(path) = &dump.extras_path {
        println!("Connections from non-adjacent layers written to {}", path.display());
    }

    let error = if dump.tables.is_empty() {
        println!("No weights found (the model may not have any fully connected layers)");
        Some("no layer tables produced".to_owned())
    } else {
        println!("All CSVs live under {}", dump.output_dir.display());
        if strict && dump.has_warnings() {
            eprintln!("error: {}: warnings are treated as errors (--strict)", model.display());
            Some("warnings treated as errors".to_owned())
        } else {
            None
        }
    };

    ModelReport { model, ok: error.is_none(), error, dump: Some(dump) }
}

fn save_summary(path: &Path, reports: &[ModelReport<'_>]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create JSON file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, reports).context("failed to write JSON")?;
    writer.flush()?;
    Ok(())
}
