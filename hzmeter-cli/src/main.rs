use clap::{Arg, ArgAction, ArgMatches, Command};
use hzmeter_core::{
    analyze_signal, write_contour_csv, ContourSummary, FrameParameters, FrequencyRange,
    SmoothingConfig,
};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

#[cfg(feature = "audio")]
const NORMALIZATION_TARGET: f32 = 0.95;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("hzmeter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract a smoothed pitch contour from a WAV recording")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Input WAV file")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output CSV file (default: stdout)"),
        )
        .arg(
            Arg::new("frame-size")
                .long("frame-size")
                .value_name("SAMPLES")
                .help("Samples per analysis frame")
                .default_value("2048"),
        )
        .arg(
            Arg::new("hop-size")
                .long("hop-size")
                .value_name("SAMPLES")
                .help("Samples advanced between frames")
                .default_value("512"),
        )
        .arg(
            Arg::new("fmin")
                .long("fmin")
                .value_name("HZ")
                .help("Lowest accepted pitch in Hz")
                .default_value("50"),
        )
        .arg(
            Arg::new("range")
                .long("range")
                .value_name("RANGE")
                .help("Upper pitch limit preset: low (2000 Hz) or extended (5000 Hz)")
                .value_parser(["low", "extended"])
                .default_value("low"),
        )
        .arg(
            Arg::new("fmax")
                .long("fmax")
                .value_name("HZ")
                .help("Highest accepted pitch in Hz (overrides --range)"),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .value_name("NUMBER")
                .help("CMND acceptance threshold (0.1-0.2 typical)")
                .default_value("0.15"),
        )
        .arg(
            Arg::new("energy-threshold")
                .long("energy-threshold")
                .value_name("RMS")
                .help("RMS level below which a frame counts as silence")
                .default_value("0.01"),
        )
        .arg(
            Arg::new("median-window")
                .long("median-window")
                .value_name("FRAMES")
                .help("Median filter length, odd")
                .default_value("5"),
        )
        .arg(
            Arg::new("average-window")
                .long("average-window")
                .value_name("FRAMES")
                .help("Moving average length, odd")
                .default_value("3"),
        )
        .arg(
            Arg::new("normalize")
                .long("normalize")
                .help("Peak-normalize the recording before analysis")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let input_path = matches
        .get_one::<String>("input")
        .ok_or_else(|| anyhow::anyhow!("Missing input file"))?;
    let output_path = matches.get_one::<String>("output");

    let range = parse_range(matches.get_one::<String>("range").map(String::as_str))?;

    let mut params = FrameParameters {
        frame_size: parse_arg(&matches, "frame-size")?,
        hop_size: parse_arg(&matches, "hop-size")?,
        fmin: parse_arg(&matches, "fmin")?,
        cmnd_threshold: parse_arg(&matches, "threshold")?,
        energy_threshold: parse_arg(&matches, "energy-threshold")?,
        ..Default::default()
    }
    .with_range(range);
    if matches.contains_id("fmax") {
        params.fmax = parse_arg(&matches, "fmax")?;
    }

    let smoothing = SmoothingConfig {
        median_window: parse_arg(&matches, "median-window")?,
        average_window: parse_arg(&matches, "average-window")?,
    };
    smoothing
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid smoothing settings: {}", e))?;

    // Validate input file exists
    if !Path::new(input_path).exists() {
        return Err(anyhow::anyhow!("Input file does not exist: {}", input_path));
    }

    let (samples, sample_rate) = read_input(input_path, matches.get_flag("normalize"))?;
    params.sample_rate = sample_rate;
    params
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid analysis settings: {}", e))?;

    info!("Analyzing {}", input_path);
    info!(
        "Sample rate: {} Hz, frame size: {}, hop size: {}",
        params.sample_rate, params.frame_size, params.hop_size
    );
    info!(
        "Frequency range: {:.1} - {:.1} Hz, threshold: {:.2}",
        params.fmin, params.fmax, params.cmnd_threshold
    );

    let analysis = analyze_signal(&samples, &params, &smoothing)
        .map_err(|e| anyhow::anyhow!("Pitch analysis failed: {}", e))?;

    match output_path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| anyhow::anyhow!("Failed to create output file {}: {}", path, e))?;
            write_contour_csv(BufWriter::new(file), &analysis)
                .map_err(|e| anyhow::anyhow!("Failed to write contour: {}", e))?;
            info!("Wrote contour to {}", path);
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_contour_csv(&mut handle, &analysis)
                .map_err(|e| anyhow::anyhow!("Failed to write contour: {}", e))?;
            handle.flush()?;
        }
    }

    let raw = ContourSummary::from_contour(&analysis.raw);
    let smoothed = ContourSummary::from_contour(&analysis.smoothed);
    debug!("Raw contour: {:?}", raw);
    info!(
        "Frames: {}, voiced: {} raw / {} smoothed",
        raw.frames, raw.voiced_frames, smoothed.voiced_frames
    );
    match (smoothed.mean_hz, smoothed.min_hz, smoothed.max_hz, smoothed.std_dev_hz) {
        (Some(mean), Some(min), Some(max), Some(std_dev)) => info!(
            "Pitch: mean {:.2} Hz, range {:.2} - {:.2} Hz, std dev {:.2} Hz",
            mean, min, max, std_dev
        ),
        _ => warn!("No pitch detected in {}", input_path),
    }

    Ok(())
}

fn parse_range(value: Option<&str>) -> anyhow::Result<FrequencyRange> {
    match value {
        Some("low") => Ok(FrequencyRange::Low),
        Some("extended") => Ok(FrequencyRange::Extended),
        Some(other) => Err(anyhow::anyhow!(
            "Invalid value for --range: {} (expected low or extended)",
            other
        )),
        None => Err(anyhow::anyhow!("Missing value for --range")),
    }
}

fn parse_arg<T: FromStr>(matches: &ArgMatches, name: &str) -> anyhow::Result<T> {
    matches
        .get_one::<String>(name)
        .ok_or_else(|| anyhow::anyhow!("Missing value for --{}", name))?
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for --{}", name))
}

#[cfg(feature = "audio")]
fn read_input(path: &str, normalize: bool) -> anyhow::Result<(Vec<f32>, f64)> {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("wav") | Some("WAV") => {}
        _ => return Err(anyhow::anyhow!("Unsupported input file (expected .wav): {}", path)),
    }

    let mut signal = hzmeter_core::load_wav(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
    info!(
        "Loaded {:.2} s of audio at {} Hz",
        signal.duration_seconds(),
        signal.sample_rate
    );

    if normalize {
        hzmeter_core::normalize_peak(&mut signal.samples, NORMALIZATION_TARGET);
    }

    Ok((signal.samples, signal.sample_rate as f64))
}

#[cfg(not(feature = "audio"))]
fn read_input(_path: &str, _normalize: bool) -> anyhow::Result<(Vec<f32>, f64)> {
    Err(anyhow::anyhow!(
        "Audio file processing is not available. Build with --features audio to enable audio support."
    ))
}
