//! `.net` ファイルから読み出した生データの型
//!
//! ここに定義する型はすべて一度のパースで生成され、以後は変更されない。

use crate::error::FormatError;

/// 層ごとのニューロン数（入力層が先頭、出力層が末尾）
///
/// FANN はバイアスニューロンも層のサイズに含めて保存する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSizes(Vec<usize>);

impl LayerSizes {
    /// 空の列、0 を含む列、総数が `usize` に収まらない列を拒否する。
    pub fn new(sizes: Vec<usize>) -> Result<Self, FormatError> {
        if sizes.is_empty() {
            return Err(FormatError::MissingLayerSizes);
        }
        if let Some(layer) = sizes.iter().position(|&s| s == 0) {
            return Err(FormatError::ZeroLayerSize { layer });
        }
        let mut total = 0usize;
        for (layer, &size) in sizes.iter().enumerate() {
            total = total.checked_add(size).ok_or(FormatError::LayerSizesOverflow { layer })?;
        }
        Ok(Self(sizes))
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// 層数
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, layer: usize) -> Option<usize> {
        self.0.get(layer).copied()
    }

    /// 全層のニューロン総数（構築時にオーバーフローしないことを確認済み）
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

/// neurons ブロックの 1 要素 `(num_inputs, activation_function, activation_steepness)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeuronRecord {
    pub num_inputs: usize,
    pub activation_function: u32,
    pub steepness: f64,
}

/// connections ブロックの 1 要素 `(connected_to_neuron, weight)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionRecord {
    /// 接続元ニューロンのグローバルインデックス
    pub source: usize,
    pub weight: f64,
}

/// neurons ブロックより前にある `key=value` 行とバージョン行
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetHeader {
    version: Option<String>,
    fields: Vec<(String, String)>,
}

impl NetHeader {
    pub fn new(version: Option<String>, fields: Vec<(String, String)>) -> Self {
        Self { version, fields }
    }

    /// `FANN_FLO_2.1` などの先頭行
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// ファイルに現れた順の `key=value`
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 最初に現れた `key` の値
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn num_layers(&self) -> Option<usize> {
        self.get("num_layers")?.trim().parse().ok()
    }

    /// 0 = layered, 1 = shortcut
    pub fn network_type(&self) -> Option<u32> {
        self.get("network_type")?.trim().parse().ok()
    }

    /// 層を飛ばす接続を持つネットワーク（その接続は extras に回る）
    pub fn is_shortcut(&self) -> bool {
        self.network_type() == Some(1)
    }
}

/// パース結果一式
#[derive(Debug, Clone, PartialEq)]
pub struct NetFile {
    pub header: NetHeader,
    pub layer_sizes: LayerSizes,
    pub neurons: Vec<NeuronRecord>,
    pub connections: Vec<ConnectionRecord>,
}
