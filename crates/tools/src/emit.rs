//! 重み表の CSV 出力
//!
//! 1 行が接続先ニューロン 1 個、列が接続元層のニューロン。
//! 接続の無い位置は空欄にする（0 は学習済みの有効な重みなので区別する）。

use std::io::Write;

use fann_weights_core::{LayerTable, Reconstruction};

/// `<stem>-layer<src>-to-layer<dst>.csv`
pub fn table_file_name(stem: &str, table: &LayerTable) -> String {
    format!("{stem}-layer{}-to-layer{}.csv", table.source_layer(), table.target_layer())
}

/// `<stem>-extras.csv`
pub fn extras_file_name(stem: &str) -> String {
    format!("{stem}-extras.csv")
}

/// `f64` の Display は往復で同じビット列に戻る最短表現
pub fn format_weight(weight: Option<f64>) -> String {
    weight.map(|w| w.to_string()).unwrap_or_default()
}

pub fn write_table<W: Write>(writer: &mut csv::Writer<W>, table: &LayerTable) -> csv::Result<()> {
    let mut header = vec![
        "target_global".to_owned(),
        "target_layer".to_owned(),
        "target_local".to_owned(),
    ];
    header.extend(table.source_globals().map(|g| format!("src_global_{g}")));
    writer.write_record(&header)?;

    let mut record = Vec::with_capacity(header.len());
    for row in table.rows() {
        record.clear();
        record.push(row.target_global.to_string());
        record.push(row.target_layer.to_string());
        record.push(row.target_local.to_string());
        record.extend(row.weights.iter().copied().map(format_weight));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// 直前の層以外からの接続を 1 接続 1 行で書き出す
pub fn write_extras<W: Write>(writer: &mut csv::Writer<W>, rec: &Reconstruction) -> csv::Result<()> {
    writer.write_record([
        "target_global",
        "target_layer",
        "target_local",
        "source_global",
        "weight",
    ])?;
    for table in rec.tables() {
        for row in table.rows() {
            for extra in row.extras {
                writer.write_record([
                    row.target_global.to_string(),
                    row.target_layer.to_string(),
                    row.target_local.to_string(),
                    extra.source.to_string(),
                    extra.weight.to_string(),
                ])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
