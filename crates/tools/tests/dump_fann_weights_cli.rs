use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const LAYER1_CSV: &str = "target_global,target_layer,target_local,src_global_0,src_global_1,src_global_2
3,1,0,1.5,-2.25,0.5
4,1,1,-0.75,3,0.3333333333333333
5,1,2,2,2,-1
";

const LAYER2_CSV: &str =
    "target_global,target_layer,target_local,src_global_3,src_global_4,src_global_5,src_global_6
7,2,0,4.5,-3.125,0.25,-0.5
";

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/xor.net")
}

fn fixture_text() -> String {
    fs::read_to_string(fixture()).expect("fixture exists")
}

fn write_model(tmp: &TempDir, name: &str, text: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, text).expect("write model");
    p
}

fn dump_cmd(out: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dump_fann_weights").expect("binary exists");
    cmd.arg("--output-dir").arg(out);
    cmd
}

#[test]
fn writes_one_csv_per_layer_pair() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("weights");

    dump_cmd(&out)
        .arg("--model")
        .arg(fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("Layer 0→1: 3 targets × 3 sources written to"))
        .stdout(predicate::str::contains("Layer 1→2: 1 targets × 4 sources written to"))
        .stdout(predicate::str::contains("All CSVs live under"))
        .stdout(predicate::str::contains("Warning").not());

    let dir = out.join("xor");
    assert_eq!(fs::read_to_string(dir.join("xor-layer0-to-layer1.csv")).unwrap(), LAYER1_CSV);
    assert_eq!(fs::read_to_string(dir.join("xor-layer1-to-layer2.csv")).unwrap(), LAYER2_CSV);
    assert!(!dir.join("xor-extras.csv").exists());
}

#[test]
fn reads_gzip_models() {
    let tmp = TempDir::new().unwrap();
    let gz = tmp.path().join("xor.net.gz");
    let mut enc = flate2::write::GzEncoder::new(
        fs::File::create(&gz).unwrap(),
        flate2::Compression::default(),
    );
    enc.write_all(fixture_text().as_bytes()).unwrap();
    enc.finish().unwrap();
    let out = tmp.path().join("weights");

    dump_cmd(&out).arg("--model").arg(&gz).assert().success();
    assert_eq!(
        fs::read_to_string(out.join("xor").join("xor-layer0-to-layer1.csv")).unwrap(),
        LAYER1_CSV
    );
}

#[test]
fn no_connections_fails_with_message() {
    let tmp = TempDir::new().unwrap();
    let model = write_model(
        &tmp,
        "empty.net",
        "FANN_FLO_2.1\nnum_layers=2\nlayer_sizes=2 1 \n\
         neurons (num_inputs, activation_function, activation_steepness)=(0, 0, 0.0) (0, 0, 0.0) (0, 3, 0.5) \n\
         connections (connected_to_neuron, weight)=\n",
    );
    let out = tmp.path().join("weights");

    dump_cmd(&out).arg("--model").arg(&model).assert().failure().stdout(predicate::str::contains(
        "No weights found (the model may not have any fully connected layers)",
    ));
}

#[test]
fn malformed_model_reports_error_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let model = write_model(
        &tmp,
        "broken.net",
        &fixture_text().replace("(1, -2.25000000000000000000e+00)", "(1, oops)"),
    );
    let out = tmp.path().join("weights");

    dump_cmd(&out)
        .arg("--model")
        .arg(&model)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.net"))
        .stderr(predicate::str::contains("malformed connections record #1"));
    assert!(!out.exists());
}

#[test]
fn missing_layer_sizes_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let text = fixture_text().replace("layer_sizes=3 4 2 \n", "");
    let model = write_model(&tmp, "nosizes.net", &text);
    let out = tmp.path().join("weights");

    dump_cmd(&out)
        .arg("--model")
        .arg(&model)
        .assert()
        .failure()
        .stderr(predicate::str::contains("layer_sizes line not found"));
}

#[test]
fn unconsumed_connections_warn_and_strict_fails() {
    let tmp = TempDir::new().unwrap();
    let text = fixture_text().replace(
        "(6, -5.00000000000000000000e-01) ",
        "(6, -5.00000000000000000000e-01) (0, 1.00000000000000000000e+00) ",
    );
    let model = write_model(&tmp, "extra.net", &text);
    let out = tmp.path().join("weights");

    dump_cmd(&out)
        .arg("--model")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning: not all connections were consumed (13 of 14"));
    // 出力は警告が無い場合と同じ
    assert_eq!(
        fs::read_to_string(out.join("extra").join("extra-layer1-to-layer2.csv")).unwrap(),
        LAYER2_CSV
    );

    dump_cmd(&out)
        .arg("--model")
        .arg(&model)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--strict"));
}

#[test]
fn summary_json_covers_every_model() {
    let tmp = TempDir::new().unwrap();
    let broken = write_model(&tmp, "broken.net", "FANN_FLO_2.1\nnum_layers=2\n");
    let out = tmp.path().join("weights");
    let summary = tmp.path().join("summary.json");

    dump_cmd(&out)
        .arg("--model")
        .arg(fixture())
        .arg("--model")
        .arg(&broken)
        .arg("--summary-json")
        .arg(&summary)
        .arg("--threads")
        .arg("2")
        .assert()
        .failure()
        .stdout(predicate::str::contains("== "))
        .stderr(predicate::str::contains("1 of 2 models failed"));

    // 失敗したモデルがあっても成功したモデルの出力は残る
    assert!(out.join("xor").join("xor-layer0-to-layer1.csv").exists());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary).expect("summary exists")).unwrap();
    let reports = json.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["ok"], true);
    assert_eq!(reports[0]["dump"]["summary"]["layer_sizes"], serde_json::json!([3, 4, 2]));
    assert_eq!(reports[0]["dump"]["summary"]["connections"], 13);
    assert_eq!(reports[0]["dump"]["summary"]["network_type"], 0);
    assert_eq!(reports[0]["dump"]["summary"]["conserved"], true);
    assert_eq!(reports[0]["dump"]["tables"].as_array().unwrap().len(), 2);
    assert_eq!(reports[1]["ok"], false);
    assert!(reports[1]["error"].as_str().unwrap().contains("layer_sizes"));
}

#[test]
fn corrupt_layer_sizes_do_not_affect_other_models() {
    let tmp = TempDir::new().unwrap();
    let bad = write_model(
        &tmp,
        "bad.net",
        "FANN_FLO_2.1\nnum_layers=2\nlayer_sizes=4000000000000 1 \n\
         neurons (num_inputs, activation_function, activation_steepness)=(0, 0, 0.0) (1, 3, 0.5) \n\
         connections (connected_to_neuron, weight)=(0, 1.0) \n",
    );
    let out = tmp.path().join("weights");
    let summary = tmp.path().join("summary.json");

    dump_cmd(&out)
        .arg("--model")
        .arg(fixture())
        .arg("--model")
        .arg(&bad)
        .arg("--summary-json")
        .arg(&summary)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Layer 1→2: 1 targets × 4 sources written to"))
        .stderr(predicate::str::contains(
            "expected 4000000000001 neuron entries but found 2",
        ));

    assert_eq!(
        fs::read_to_string(out.join("xor").join("xor-layer1-to-layer2.csv")).unwrap(),
        LAYER2_CSV
    );
    assert!(!out.join("bad").exists());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary).expect("summary exists")).unwrap();
    assert_eq!(json[0]["ok"], true);
    assert_eq!(json[1]["ok"], false);
    assert!(json[1]["error"].as_str().unwrap().contains("neuron entries"));
}

#[test]
fn duplicate_stems_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a");
    fs::create_dir_all(&a).unwrap();
    let first = a.join("xor.net");
    fs::copy(fixture(), &first).unwrap();
    let out = tmp.path().join("weights");

    dump_cmd(&out)
        .arg("--model")
        .arg(&first)
        .arg("--model")
        .arg(fixture())
        .assert()
        .failure()
        .stderr(predicate::str::contains("would both write to 'xor'"));
    assert!(!out.exists());
}
