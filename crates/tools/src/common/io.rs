//! ファイルI/Oユーティリティ（gzip対応）

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::Path;

const READER_BUF_CAP: usize = 128 * 1024; // 128 KiB

/// 拡張子 `.gz` なら展開して読む
pub fn open_reader<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read>> {
    let p = path.as_ref();
    let f = File::open(p)?;
    if is_gzip(p) {
        let dec = flate2::read::GzDecoder::new(f);
        return Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, dec)));
    }
    Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, f)))
}

/// モデルファイル全体をテキストとして読む
///
/// 不正な UTF-8 は置換文字にして読み進める（数値部分は ASCII のみ）。
pub fn read_model_text<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut bytes = Vec::new();
    open_reader(path)?.read_to_end(&mut bytes)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// `xor.net` → `xor`, `xor.net.gz` → `xor`
pub fn model_stem(path: &Path) -> String {
    let inner = if is_gzip(path) { path.with_extension("") } else { path.to_path_buf() };
    inner
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_owned())
}

/// 親ディレクトリを作ってからファイルを作成する
pub fn create_file_with_parents(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

fn is_gzip(p: &Path) -> bool {
    p.extension().and_then(|e| e.to_str()).unwrap_or_default().eq_ignore_ascii_case("gz")
}
