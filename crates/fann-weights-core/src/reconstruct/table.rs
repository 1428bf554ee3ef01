//! 層ペアごとの重み表
//!
//! 行ごとに `Vec` を確保せず、行優先の 1 本のバッファに全行を詰める。

use std::ops::Range;

use crate::net::ConnectionRecord;

/// 表の 1 行ぶんのメタデータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TargetSlot {
    global: usize,
    local: usize,
    extras_start: usize,
    extras_end: usize,
}

/// 再構成された 1 行（接続先ニューロン 1 個）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructedRow<'a> {
    pub target_global: usize,
    pub target_layer: usize,
    pub target_local: usize,
    /// 接続元層の層内インデックス順。接続が無い位置は `None`
    pub weights: &'a [Option<f64>],
    /// 直前の層以外からの接続
    pub extras: &'a [ConnectionRecord],
}

/// `target_layer - 1 → target_layer` の全行
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTable {
    target_layer: usize,
    source_offset: usize,
    source_size: usize,
    targets: Vec<TargetSlot>,
    weights: Vec<Option<f64>>,
    extras: Vec<ConnectionRecord>,
}

impl LayerTable {
    pub(crate) fn new(target_layer: usize, source_offset: usize, source_size: usize) -> Self {
        debug_assert!(target_layer >= 1);
        Self {
            target_layer,
            source_offset,
            source_size,
            targets: Vec::new(),
            weights: Vec::new(),
            extras: Vec::new(),
        }
    }

    /// 空の行を追加して行番号を返す
    pub(crate) fn begin_row(&mut self, global: usize, local: usize) -> usize {
        let start = self.extras.len();
        self.targets.push(TargetSlot { global, local, extras_start: start, extras_end: start });
        self.weights.resize(self.weights.len() + self.source_size, None);
        self.targets.len() - 1
    }

    /// 既に値があった場合は `true`（後勝ちで上書きする）
    pub(crate) fn set_weight(&mut self, row: usize, source_local: usize, weight: f64) -> bool {
        self.weights[row * self.source_size + source_local].replace(weight).is_some()
    }

    /// extras は最後の行にしか追加できない
    pub(crate) fn push_extra(&mut self, row: usize, conn: ConnectionRecord) {
        debug_assert_eq!(row + 1, self.targets.len());
        self.extras.push(conn);
        self.targets[row].extras_end = self.extras.len();
    }

    #[inline]
    pub fn target_layer(&self) -> usize {
        self.target_layer
    }

    #[inline]
    pub fn source_layer(&self) -> usize {
        self.target_layer - 1
    }

    /// 接続元層のニューロン数（= 列数）
    #[inline]
    pub fn source_size(&self) -> usize {
        self.source_size
    }

    /// 接続元層のグローバルインデックス範囲
    pub fn source_globals(&self) -> Range<usize> {
        self.source_offset..self.source_offset + self.source_size
    }

    /// 行数
    #[inline]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// 全行の extras の合計
    #[inline]
    pub fn extras_count(&self) -> usize {
        self.extras.len()
    }

    /// 行優先の重みバッファ（`len() * source_size()` 要素）
    #[inline]
    pub fn weights(&self) -> &[Option<f64>] {
        &self.weights
    }

    pub fn row(&self, row: usize) -> Option<ReconstructedRow<'_>> {
        self.targets.get(row).map(|slot| self.view(row, slot))
    }

    /// 走査順（= 層内インデックスの昇順）
    pub fn rows(&self) -> impl ExactSizeIterator<Item = ReconstructedRow<'_>> + '_ {
        self.targets.iter().enumerate().map(|(row, slot)| self.view(row, slot))
    }

    fn view(&self, row: usize, slot: &TargetSlot) -> ReconstructedRow<'_> {
        let start = row * self.source_size;
        ReconstructedRow {
            target_global: slot.global,
            target_layer: self.target_layer,
            target_local: slot.local,
            weights: &self.weights[start..start + self.source_size],
            extras: &self.extras[slot.extras_start..slot.extras_end],
        }
    }
}
