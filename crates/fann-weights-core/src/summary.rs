//! 再構成結果の要約（JSON 出力用）

use serde::{Deserialize, Serialize};

use crate::net::NetFile;
use crate::reconstruct::Reconstruction;

/// 層ペア 1 つぶんの要約
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub source_layer: usize,
    pub target_layer: usize,
    /// 接続先ニューロン数（行数）
    pub rows: usize,
    /// 接続元ニューロン数（列数）
    pub sources: usize,
    pub extras: usize,
}

/// モデル 1 つぶんの要約
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// 0 = layered, 1 = shortcut
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_type: Option<u32>,
    pub layer_sizes: Vec<usize>,
    pub neurons: usize,
    pub connections: usize,
    pub consumed: usize,
    pub conserved: bool,
    pub tables: Vec<TableSummary>,
    pub warnings: Vec<String>,
}

impl ReconstructionSummary {
    pub fn new(net: &NetFile, rec: &Reconstruction) -> Self {
        Self {
            version: net.header.version().map(str::to_owned),
            network_type: net.header.network_type(),
            layer_sizes: net.layer_sizes.as_slice().to_vec(),
            neurons: net.neurons.len(),
            connections: rec.total_connections(),
            consumed: rec.consumed(),
            conserved: rec.is_conserved(),
            tables: rec
                .tables()
                .map(|t| TableSummary {
                    source_layer: t.source_layer(),
                    target_layer: t.target_layer(),
                    rows: t.len(),
                    sources: t.source_size(),
                    extras: t.extras_count(),
                })
                .collect(),
            warnings: rec.warnings().iter().map(ToString::to_string).collect(),
        }
    }
}
