//! グローバルインデックス ↔ (層, 層内インデックス) の対応表
//!
//! `.net` はすべての層のニューロンを 1 本の列として保存するため、
//! 接続元・接続先の解決には層ごとの開始オフセットが必要になる。

use std::ops::Range;

use crate::net::LayerSizes;

/// ニューロンの位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NeuronPos {
    pub layer: usize,
    pub local: usize,
}

/// layer_sizes から導出されるインデックス空間
///
/// `entries[g]` がグローバルインデックス `g` の位置を持つ。
/// 参照はすべて O(1)。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpace {
    offsets: Vec<usize>,
    sizes: Vec<usize>,
    entries: Vec<NeuronPos>,
}

impl IndexSpace {
    pub fn new(layer_sizes: &LayerSizes) -> Self {
        let sizes = layer_sizes.as_slice().to_vec();
        let mut offsets = Vec::with_capacity(sizes.len());
        let mut entries = Vec::with_capacity(layer_sizes.total());

        for (layer, &size) in sizes.iter().enumerate() {
            offsets.push(entries.len());
            entries.extend((0..size).map(|local| NeuronPos { layer, local }));
        }

        Self { offsets, sizes, entries }
    }

    /// ニューロン総数
    #[inline]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.sizes.len()
    }

    /// 層ごとの開始オフセット
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    #[inline]
    pub fn layer_size(&self, layer: usize) -> Option<usize> {
        self.sizes.get(layer).copied()
    }

    /// グローバルインデックス順に `(global, 位置)` を返す
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, NeuronPos)> + '_ {
        self.entries.iter().copied().enumerate()
    }

    /// 範囲外なら `None`
    #[inline]
    pub fn locate(&self, global: usize) -> Option<NeuronPos> {
        self.entries.get(global).copied()
    }

    /// `layer` に属するグローバルインデックスの範囲
    pub fn layer_range(&self, layer: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(layer)?;
        Some(start..start + self.sizes[layer])
    }

    pub fn global_of(&self, pos: NeuronPos) -> Option<usize> {
        let range = self.layer_range(pos.layer)?;
        (pos.local < range.len()).then_some(range.start + pos.local)
    }
}
