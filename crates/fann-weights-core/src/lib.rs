//! FANN `.net` ファイルから層ごとの密な重み行列を再構成する。
//!
//! `.net` はすべてのニューロンを 1 本の列に、すべての接続を 1 本の列に
//! 保存し、どの接続がどのニューロンに属するかは各ニューロンの
//! `num_inputs` によって暗黙に決まる。
//!
//! 処理は 3 段階:
//!
//! 1. [`format`]: テキストから layer_sizes / neurons / connections を取り出す
//! 2. [`index`]: グローバルインデックスと (層, 層内インデックス) の対応表
//! 3. [`reconstruct`]: 2 本の列を同時に走査して層ペアごとの表を作る
//!
//! ```
//! let text = "layer_sizes=2 1\n\
//!     neurons (num_inputs, activation_function, activation_steepness)=(0, 0, 0.0) (0, 0, 0.0) (2, 3, 0.5)\n\
//!     connections (connected_to_neuron, weight)=(0, 0.5) (1, -0.25)\n";
//! let (_, rec) = fann_weights_core::load(text).unwrap();
//! let row = rec.table(1).unwrap().row(0).unwrap();
//! assert_eq!(row.weights, &[Some(0.5), Some(-0.25)]);
//! ```

pub mod error;
pub mod format;
pub mod index;
pub mod net;
pub mod reconstruct;
pub mod summary;

pub use error::{Block, Error, FormatError, ReconstructionError, Result};
pub use format::parse_net;
pub use index::{IndexSpace, NeuronPos};
pub use net::{ConnectionRecord, LayerSizes, NetFile, NetHeader, NeuronRecord};
pub use reconstruct::{
    LayerTable, ReconstructedRow, Reconstruction, ReconstructionWarning, reconstruct,
    reconstruct_net,
};
pub use summary::{ReconstructionSummary, TableSummary};

/// パースと再構成をまとめて行う
///
/// 構文エラーは再構成の前に検出される。
pub fn load(text: &str) -> Result<(NetFile, Reconstruction)> {
    let net = parse_net(text)?;
    let rec = reconstruct_net(&net)?;
    Ok((net, rec))
}
