//! `.net` ファイルの重みを CSV に書き出すツール群

pub mod common;
pub mod dump;
pub mod emit;
