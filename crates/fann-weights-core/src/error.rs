//! エラー型定義
//!
//! `.net` テキストの構文エラー（[`FormatError`]）と、
//! 宣言された構造の不整合（[`ReconstructionError`]）を区別する。
//! どちらも致命的で、部分的な結果は返さない。

use std::fmt;

/// レコードを読み取ったブロック
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    LayerSizes,
    Neurons,
    Connections,
}

impl Block {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LayerSizes => "layer_sizes",
            Self::Neurons => "neurons",
            Self::Connections => "connections",
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 入力テキストが `.net` 形式として読めない
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// `layer_sizes=` 行が無い、または空
    #[error("layer_sizes line not found in .net file")]
    MissingLayerSizes,

    /// layer_sizes に 0 が含まれる
    #[error("layer_sizes entry {layer} is zero")]
    ZeroLayerSize { layer: usize },

    /// layer_sizes の総和が `usize` を超える
    #[error("layer_sizes total overflows at entry {layer}")]
    LayerSizesOverflow { layer: usize },

    /// neurons ブロックを特定できない
    #[error("neurons block missing")]
    MissingNeuronBlock,

    /// connections ブロックを特定できない
    #[error("connections block missing")]
    MissingConnectionBlock,

    /// 個々のレコードが読めない
    #[error("malformed {block} record #{index} ({reason}): {raw:?}")]
    MalformedRecord { block: Block, index: usize, raw: String, reason: String },
}

/// ニューロン列と接続列の整合性違反
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconstructionError {
    #[error("expected {expected} neuron entries but found {actual}")]
    NeuronCountMismatch { expected: usize, actual: usize },

    #[error(
        "connection block ended unexpectedly: neuron {neuron} needs {needed} connections, {remaining} remain"
    )]
    ConnectionUnderflow { neuron: usize, needed: usize, remaining: usize },
}

/// クレート全体のエラー
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Reconstruction(#[from] ReconstructionError),
}

pub type Result<T> = std::result::Result<T, Error>;
