//! `.net` テキストの読み込み
//!
//! 正規表現は各ブロックの位置を特定するためだけに使い、
//! ブロック内のレコードは逐次スキャナで切り出してから解釈する。
//! 個々のレコードが読めない場合は黙って捨てずにエラーにする。
//!
//! ここでは構文だけを扱い、ニューロン数と layer_sizes の一致などの
//! 列をまたぐ検証は [`crate::reconstruct`] に任せる。

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::error::{Block, FormatError};
use crate::net::{ConnectionRecord, LayerSizes, NetFile, NetHeader, NeuronRecord};

static LAYER_SIZES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*layer_sizes[ \t]*=(.*)$").expect("invalid LAYER_SIZES_RE pattern")
});
static NEURONS_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"neurons\s*\(\s*num_inputs\s*,\s*activation_function\s*,\s*activation_steepness\s*\)\s*=",
    )
    .expect("invalid NEURONS_HEADER_RE pattern")
});
static CONNECTIONS_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"connections\s*\(\s*connected_to_neuron\s*,\s*weight\s*\)\s*=")
        .expect("invalid CONNECTIONS_HEADER_RE pattern")
});

/// テキスト全体をパースする
pub fn parse_net(text: &str) -> Result<NetFile, FormatError> {
    let layer_sizes = parse_layer_sizes(text)?;
    let (neuron_block, connection_block, header_end) = locate_blocks(text)?;
    let neurons = parse_neuron_block(neuron_block)?;
    let connections = parse_connection_block(connection_block)?;
    let header = parse_header(&text[..header_end]);

    if let Some(num_layers) = header.num_layers() {
        if num_layers != layer_sizes.len() {
            warn!(
                "num_layers={num_layers} disagrees with layer_sizes ({} entries)",
                layer_sizes.len()
            );
        }
    }
    debug!(
        "parsed .net: layers={:?} neurons={} connections={}",
        layer_sizes.as_slice(),
        neurons.len(),
        connections.len()
    );

    Ok(NetFile { header, layer_sizes, neurons, connections })
}

/// `layer_sizes=3 4 2` 行を読む
pub fn parse_layer_sizes(text: &str) -> Result<LayerSizes, FormatError> {
    let caps = LAYER_SIZES_RE.captures(text).ok_or(FormatError::MissingLayerSizes)?;
    let raw = caps.get(1).map_or("", |m| m.as_str());

    let sizes = raw
        .split_whitespace()
        .enumerate()
        .map(|(index, token)| {
            token.parse::<usize>().map_err(|_| FormatError::MalformedRecord {
                block: Block::LayerSizes,
                index,
                raw: token.to_owned(),
                reason: "layer size is not a non-negative integer".to_owned(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    LayerSizes::new(sizes)
}

/// (neurons ブロック, connections ブロック, neurons ヘッダの開始位置) を返す
fn locate_blocks(text: &str) -> Result<(&str, &str, usize), FormatError> {
    let neurons = NEURONS_HEADER_RE.find(text).ok_or(FormatError::MissingNeuronBlock)?;
    let Some(connections) = CONNECTIONS_HEADER_RE.find_at(text, neurons.end()) else {
        // connections ヘッダが neurons より前にしか無い場合は neurons 側の区切りが取れない
        return Err(if CONNECTIONS_HEADER_RE.is_match(text) {
            FormatError::MissingNeuronBlock
        } else {
            FormatError::MissingConnectionBlock
        });
    };

    Ok((
        &text[neurons.end()..connections.start()],
        &text[connections.end()..],
        neurons.start(),
    ))
}

fn parse_header(text: &str) -> NetHeader {
    let mut version = None;
    let mut fields = Vec::new();
    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => fields.push((key.trim().to_owned(), value.trim().to_owned())),
            None if idx == 0 => version = Some(line.to_owned()),
            None => debug!("ignoring header line without '=': {line}"),
        }
    }
    NetHeader::new(version, fields)
}

fn parse_neuron_block(block: &str) -> Result<Vec<NeuronRecord>, FormatError> {
    scan_records(Block::Neurons, block)?
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let [num_inputs, activation, steepness] = split_fields(Block::Neurons, index, raw)?;
            Ok(NeuronRecord {
                num_inputs: parse_field(Block::Neurons, index, raw, num_inputs, "num_inputs")?,
                activation_function: parse_field(
                    Block::Neurons,
                    index,
                    raw,
                    activation,
                    "activation_function",
                )?,
                steepness: parse_field(Block::Neurons, index, raw, steepness, "steepness")?,
            })
        })
        .collect()
}

fn parse_connection_block(block: &str) -> Result<Vec<ConnectionRecord>, FormatError> {
    scan_records(Block::Connections, block)?
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let [source, weight] = split_fields(Block::Connections, index, raw)?;
            Ok(ConnectionRecord {
                source: parse_field(Block::Connections, index, raw, source, "connected_to_neuron")?,
                weight: parse_field(Block::Connections, index, raw, weight, "weight")?,
            })
        })
        .collect()
}

/// ブロックを `( ... )` 単位の生テキストに切り出す
///
/// 括弧の外に空白以外の文字がある場合と、閉じ括弧が無い場合はエラー。
fn scan_records(block: Block, text: &str) -> Result<Vec<&str>, FormatError> {
    let mut items = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        if !rest.starts_with('(') {
            let end = rest.find(|c: char| c.is_whitespace() || c == '(').unwrap_or(rest.len());
            let reason = "unexpected text between records";
            return Err(malformed(block, items.len(), &rest[..end], reason));
        }
        match rest[1..].find(['(', ')']).map(|i| i + 1) {
            Some(close) if rest.as_bytes()[close] == b')' => {
                items.push(&rest[..=close]);
                rest = rest[close + 1..].trim_start();
            }
            next_open => {
                let end = next_open.unwrap_or(rest.len());
                let raw = rest[..end].trim_end();
                return Err(malformed(block, items.len(), raw, "unterminated record"));
            }
        }
    }

    Ok(items)
}

/// `(a, b, c)` を N 個のフィールドに分ける
fn split_fields<const N: usize>(
    block: Block,
    index: usize,
    raw: &str,
) -> Result<[&str; N], FormatError> {
    let inner = &raw[1..raw.len() - 1];
    let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
    fields.try_into().map_err(|got: Vec<&str>| {
        malformed(block, index, raw, &format!("expected {N} fields, got {}", got.len()))
    })
}

fn parse_field<T: std::str::FromStr>(
    block: Block,
    index: usize,
    raw: &str,
    field: &str,
    label: &str,
) -> Result<T, FormatError> {
    field
        .parse::<T>()
        .map_err(|_| malformed(block, index, raw, &format!("invalid {label}: {field:?}")))
}

fn malformed(block: Block, index: usize, raw: &str, reason: &str) -> FormatError {
    FormatError::MalformedRecord { block, index, raw: raw.to_owned(), reason: reason.to_owned() }
}
