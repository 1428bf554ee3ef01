//! 重み行列の再構成
//!
//! ニューロン列と接続列を 1 本のカーソルで同時に進め、
//! 各ニューロンが宣言した `num_inputs` 個ぶんの接続（ウィンドウ）を割り当てる。
//!
//! - `num_inputs == 0` のニューロンはカーソルを進めない
//! - 入力層のニューロンはウィンドウを読み飛ばすだけで行を作らない
//! - 直前の層からの接続は密な重みベクトルへ、それ以外は extras へ
//!
//! 致命的なエラーでは途中結果を一切返さない。

mod table;


use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::error::ReconstructionError;
use crate::index::IndexSpace;
use crate::net::{ConnectionRecord, NetFile, NeuronRecord};

pub use table::{LayerTable, ReconstructedRow};

/// 出力は有効なまま報告だけ行う警告
///
/// 表示は呼び出し側の責務（ここではデバッグログのみ）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionWarning {
    /// どのニューロンにも割り当てられなかった接続が残った
    UnconsumedConnections { consumed: usize, total: usize },
    /// 入力層のウィンドウが接続列の末尾を越えた（入力層の中身は使わない）
    InputWindowOverrun { declared: usize, total: usize },
    /// 同じウィンドウ内で同じ接続元が 2 回現れた（後の値を採用）
    DuplicateSource { target_global: usize, source_global: usize },
}

impl fmt::Display for ReconstructionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnconsumedConnections { consumed, total } => write!(
                f,
                "not all connections were consumed ({consumed} of {total}; some may belong to unused neurons)"
            ),
            Self::InputWindowOverrun { declared, total } => write!(
                f,
                "input-layer windows run past the connection block ({declared} declared, {total} present)"
            ),
            Self::DuplicateSource { target_global, source_global } => write!(
                f,
                "neuron {target_global} lists source {source_global} more than once; keeping the last weight"
            ),
        }
    }
}

/// 再構成結果
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    tables: BTreeMap<usize, LayerTable>,
    consumed: usize,
    total_connections: usize,
    warnings: Vec<ReconstructionWarning>,
}

impl Reconstruction {
    /// 接続先層の昇順。行が 1 つも無い層ペアは含まれない
    pub fn tables(&self) -> impl ExactSizeIterator<Item = &LayerTable> {
        self.tables.values()
    }

    /// `target_layer - 1 → target_layer` の表
    pub fn table(&self, target_layer: usize) -> Option<&LayerTable> {
        self.tables.get(&target_layer)
    }

    /// 表の数
    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// カーソルの最終位置（入力層のウィンドウが末尾を越えた場合は接続数より大きい）
    #[inline]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    #[inline]
    pub fn total_connections(&self) -> usize {
        self.total_connections
    }

    /// すべての接続がいずれかのニューロンに割り当てられたか
    #[inline]
    pub fn is_conserved(&self) -> bool {
        self.consumed == self.total_connections
    }

    pub fn warnings(&self) -> &[ReconstructionWarning] {
        &self.warnings
    }

    pub fn extras_count(&self) -> usize {
        self.tables.values().map(LayerTable::extras_count).sum()
    }
}

/// パース済みファイルから再構成する
///
/// ニューロン数の照合は IndexSpace の確保より先に行う。
pub fn reconstruct_net(net: &NetFile) -> Result<Reconstruction, ReconstructionError> {
    check_neuron_count(net.layer_sizes.total(), net.neurons.len())?;
    let index = IndexSpace::new(&net.layer_sizes);
    reconstruct(&index, &net.neurons, &net.connections)
}

/// ニューロン列と接続列を同時に走査して層ペアごとの表を作る
///
/// `index` は layer_sizes から作ったもの。ニューロン数がその総数と
/// 一致しない場合は以降の位置解決がすべて狂うため即座に失敗する。
pub fn reconstruct(
    index: &IndexSpace,
    neurons: &[NeuronRecord],
    connections: &[ConnectionRecord],
) -> Result<Reconstruction, ReconstructionError> {
    check_neuron_count(index.total(), neurons.len())?;

    let mut tables: BTreeMap<usize, LayerTable> = BTreeMap::new();
    let mut warnings = Vec::new();
    let mut cursor = 0usize;

    for ((global, pos), neuron) in index.iter().zip(neurons) {
        let needed = neuron.num_inputs;
        if needed == 0 {
            continue;
        }

        // 入力層の num_inputs は保存形式上の産物なので中身を見ずに読み飛ばす
        if pos.layer == 0 {
            cursor = cursor.saturating_add(needed);
            continue;
        }

        let remaining = connections.len().saturating_sub(cursor);
        if needed > remaining {
            return Err(ReconstructionError::ConnectionUnderflow {
                neuron: global,
                needed,
                remaining,
            });
        }
        let window = &connections[cursor..cursor + needed];
        cursor += needed;

        let source_layer = pos.layer - 1;
        let table = tables.entry(pos.layer).or_insert_with(|| {
            LayerTable::new(
                pos.layer,
                index.offsets()[source_layer],
                index.layer_size(source_layer).unwrap_or_default(),
            )
        });
        let row = table.begin_row(global, pos.local);

        for &conn in window {
            match index.locate(conn.source) {
                Some(src) if src.layer == source_layer => {
                    if table.set_weight(row, src.local, conn.weight) {
                        warnings.push(ReconstructionWarning::DuplicateSource {
                            target_global: global,
                            source_global: conn.source,
                        });
                    }
                }
                _ => table.push_extra(row, conn),
            }
        }
    }

    let total = connections.len();
    if cursor < total {
        warnings.push(ReconstructionWarning::UnconsumedConnections { consumed: cursor, total });
    } else if cursor > total {
        warnings.push(ReconstructionWarning::InputWindowOverrun { declared: cursor, total });
    }
    for warning in &warnings {
        debug!("{warning}");
    }

    let reconstruction =
        Reconstruction { tables, consumed: cursor, total_connections: connections.len(), warnings };
    debug!(
        "reconstructed {} layer tables ({} extras, {}/{} connections consumed)",
        reconstruction.len(),
        reconstruction.extras_count(),
        reconstruction.consumed,
        reconstruction.total_connections
    );

    Ok(reconstruction)
}

fn check_neuron_count(expected: usize, actual: usize) -> Result<(), ReconstructionError> {
    if expected != actual {
        return Err(ReconstructionError::NeuronCountMismatch { expected, actual });
    }
    Ok(())
}
