use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kws_cli"))
}

/// Per-test scratch directory under the system temp dir.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kws_cli_{}_{}", name, std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn write_tone_wav(path: &PathBuf, sample_rate: u32, len: usize, channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for n in 0..len {
        let t = n as f32 / sample_rate as f32;
        let s = (10_000.0 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()) as i16;
        for _ in 0..channels {
            writer.write_sample(s).expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
}

fn json_lines(text: &str) -> Vec<Value> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("each line is a JSON object"))
        .collect()
}

#[test]
fn file_emits_one_json_line_per_hop() {
    let dir = scratch_dir("file_stdout");
    let wav = dir.join("tone.wav");
    write_tone_wav(&wav, 16_000, 8_000, 1);

    let output = cli()
        .args(["file", "--wav"])
        .arg(&wav)
        .output()
        .expect("failed to run kws_cli file");
    assert!(
        output.status.success(),
        "CLI exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let lines = json_lines(&stdout);
    // floor((8000 - 400) / 160); the priming frame emits nothing
    assert_eq!(lines.len(), 47);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["hop_index"].as_u64(), Some(i as u64));
        assert_eq!(line["coefficients"].as_array().map(|a| a.len()), Some(13));
    }
    assert_eq!(lines[0]["timestamp_ms"].as_u64(), Some(35));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn file_writes_output_and_keeps_first_channel() {
    let dir = scratch_dir("file_output");
    let mono = dir.join("mono.wav");
    let stereo = dir.join("stereo.wav");
    let mono_out = dir.join("mono.jsonl");
    let stereo_out = dir.join("stereo.jsonl");
    write_tone_wav(&mono, 16_000, 2_000, 1);
    write_tone_wav(&stereo, 16_000, 2_000, 2);

    for (wav, out) in [(&mono, &mono_out), (&stereo, &stereo_out)] {
        let status = cli()
            .args(["file", "--wav"])
            .arg(wav)
            .arg("--output")
            .arg(out)
            .status()
            .expect("failed to run kws_cli file --output");
        assert!(status.success());
    }

    let mono_lines = fs::read_to_string(&mono_out).expect("mono output");
    let stereo_lines = fs::read_to_string(&stereo_out).expect("stereo output");
    assert_eq!(json_lines(&mono_lines).len(), (2_000 - 400) / 160);
    assert_eq!(mono_lines, stereo_lines);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn file_uses_wav_sample_rate() {
    let dir = scratch_dir("file_rate");
    let wav = dir.join("tone8k.wav");
    write_tone_wav(&wav, 8_000, 4_000, 1);

    let output = cli()
        .args(["file", "--wav"])
        .arg(&wav)
        .output()
        .expect("failed to run kws_cli file");
    assert!(output.status.success());

    let lines = json_lines(&String::from_utf8(output.stdout).unwrap());
    assert_eq!(lines.len(), (4_000 - 400) / 160);
    // 560 samples at 8 kHz
    assert_eq!(lines[0]["timestamp_ms"].as_u64(), Some(70));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn file_missing_wav_fails() {
    let output = cli()
        .args(["file", "--wav", "/nonexistent/kws/input.wav"])
        .output()
        .expect("failed to run kws_cli file");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to read"), "stderr: {stderr}");
}

#[test]
fn inspect_reports_band_layout() {
    let output = cli()
        .arg("inspect")
        .output()
        .expect("failed to run kws_cli inspect");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("inspect JSON payload");
    assert_eq!(json["config"]["features"]["num_mel_bands"], 32);
    assert_eq!(json["config"]["features"]["fft_backend"], "radix2");
    assert_eq!(json["hop_duration_ms"].as_f64(), Some(10.0));
    let bands = json["bands"].as_array().expect("bands array");
    assert_eq!(bands.len(), 32);
    assert!((bands[0]["low_hz"].as_f64().unwrap() - 300.0).abs() < 1.0);
}

#[test]
fn inspect_rejects_invalid_config() {
    let dir = scratch_dir("inspect_invalid");
    let config = dir.join("config.json");
    fs::write(&config, r#"{ "features": { "fft_size": 500 } }"#).unwrap();

    let output = cli()
        .arg("--config")
        .arg(&config)
        .arg("inspect")
        .output()
        .expect("failed to run kws_cli inspect");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("power of two"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn run_tone_emits_requested_hops() {
    let output = cli()
        .args(["run", "--source", "tone", "--hops", "3", "--json"])
        .output()
        .expect("failed to run kws_cli run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = json_lines(&String::from_utf8(output.stdout).unwrap());
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2]["hop_index"].as_u64(), Some(2));
}
