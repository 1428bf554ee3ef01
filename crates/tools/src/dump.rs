//! モデル 1 つぶんの処理: 読み込み → パース → 再構成 → CSV 出力

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use fann_weights_core::{ReconstructionSummary, parse_net, reconstruct_net};

use crate::common::io::{create_file_with_parents, model_stem, read_model_text};
use crate::emit::{extras_file_name, table_file_name, write_extras, write_table};

/// 書き出した層ペア表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenTable {
    pub source_layer: usize,
    pub target_layer: usize,
    pub rows: usize,
    pub sources: usize,
    pub path: PathBuf,
}

/// モデル 1 つぶんの結果
#[derive(Debug, Clone, Serialize)]
pub struct ModelDump {
    pub model: PathBuf,
    /// `<output_dir>/<stem>`
    pub output_dir: PathBuf,
    pub tables: Vec<WrittenTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras_path: Option<PathBuf>,
    pub summary: ReconstructionSummary,
}

impl ModelDump {
    pub fn has_warnings(&self) -> bool {
        !self.summary.warnings.is_empty()
    }
}

/// `model` を読み、`<output_dir>/<stem>/` 以下に CSV を書く
///
/// 構文エラーや構造の不整合では何も書かずに失敗する。
/// 表が 1 つも無い場合は成功扱いで `tables` が空になる（判定は呼び出し側）。
pub fn dump_model(model: &Path, output_dir: &Path) -> Result<ModelDump> {
    let text = read_model_text(model).context("failed to read model")?;
    let net = parse_net(&text).context("failed to parse model")?;
    let rec = reconstruct_net(&net).context("failed to reconstruct weights")?;
    if net.header.is_shortcut() {
        log::warn!(
            "{}: shortcut network; connections that skip layers go to the extras CSV",
            model.display()
        );
    }

    let stem = model_stem(model);
    let model_dir = output_dir.join(&stem);
    let removed = remove_stale_outputs(&model_dir, &stem)
        .with_context(|| format!("failed to clean {}", model_dir.display()))?;
    if removed > 0 {
        log::debug!("removed {removed} CSVs from a previous run in {}", model_dir.display());
    }
    let mut tables = Vec::with_capacity(rec.len());

    for table in rec.tables() {
        let path = model_dir.join(table_file_name(&stem, table));
        let file = create_file_with_parents(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        write_table(&mut writer, table)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::debug!("wrote {}", path.display());

        tables.push(WrittenTable {
            source_layer: table.source_layer(),
            target_layer: table.target_layer(),
            rows: table.len(),
            sources: table.source_size(),
            path,
        });
    }

    let extras_path = if rec.extras_count() > 0 {
        let path = model_dir.join(extras_file_name(&stem));
        let file = create_file_with_parents(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        write_extras(&mut writer, &rec)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::warn!(
            "{}: {} connections do not come from the preceding layer; see {}",
            model.display(),
            rec.extras_count(),
            path.display()
        );
        Some(path)
    } else {
        None
    };

    Ok(ModelDump {
        model: model.to_path_buf(),
        output_dir: model_dir,
        tables,
        extras_path,
        summary: ReconstructionSummary::new(&net, &rec),
    })
}

/// 前回の実行で書いたこのモデルの CSV を消す（他のファイルは残す）
fn remove_stale_outputs(model_dir: &Path, stem: &str) -> io::Result<usize> {
    let entries = match fs::read_dir(model_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let layer_prefix = format!("{stem}-layer");
    let extras = extras_file_name(stem);
    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let is_table = name.starts_with(&layer_prefix)
            && name.ends_with(".csv")
            && name.contains("-to-layer");
        if (is_table || name == extras) && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
