//! Per-feature breakdown of how the model scores a clip

use std::env;
use std::process;
use std::sync::Arc;
use voxguard::audio;
use voxguard::{ClassifierModel, Detector, DetectorConfig, FeatureId, Language};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: feature_dump [--model <model.json>] <file1> [file2 ...]");
        process::exit(1);
    }

    let (model, files) = match args[1].as_str() {
        "--model" if args.len() >= 4 => match ClassifierModel::load(&args[2]) {
            Ok(m) => (m, &args[3..]),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        },
        "--model" => {
            eprintln!("Usage: feature_dump [--model <model.json>] <file1> [file2 ...]");
            process::exit(1);
        }
        _ => (ClassifierModel::builtin(), &args[1..]),
    };

    let detector = match Detector::new(Arc::new(model), DetectorConfig::default()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    for path in files {
        println!("\n{}", "=".repeat(72));
        println!("FILE: {}", path);
        println!("{}", "=".repeat(72));
        dump_file(&detector, path);
    }
}

fn dump_file(detector: &Detector, path: &str) {
    let buffer = match audio::decode_file(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    println!("Sample rate: {} Hz", buffer.sample_rate());
    println!("Channels: {}", buffer.channel_count());
    println!("Samples: {} ({:.2}s)", buffer.frames(), buffer.duration_secs());

    let features = detector.extractor().extract(&buffer);
    let prediction = detector.classifier().predict(&features);
    let model = detector.model();

    println!(
        "\n{:<26} {:>12} {:>10} {:>10} {:>8} {:>10}",
        "Feature", "Value", "Mean", "z", "Weight", "Contrib"
    );
    println!("{}", "-".repeat(81));
    for id in FeatureId::ALL {
        let i = id.index();
        println!(
            "{:<26} {:>12.4} {:>10.4} {:>+10.3} {:>+8.3} {:>+10.3}",
            id.name(),
            features.get(id),
            model.mean[i],
            prediction.standardized[i],
            model.weights[i],
            prediction.contributions[i]
        );
    }

    println!("\nRaw logit:        {:+.4}", prediction.raw_logit);
    println!("Raw probability:  {:.4}", prediction.raw_probability);
    println!("Calibrated p(AI): {:.4}", prediction.p_ai);

    match detector.analyze(&buffer, Language::English) {
        Ok(r) => {
            println!(
                "\nVerdict: {} ({:.0}% {}, quality {:.2})",
                r.classification,
                r.confidence_score * 100.0,
                r.confidence_category,
                r.audio_quality.quality_score
            );
            println!("Explanation: {}", r.explanation);
        }
        Err(e) => eprintln!("{}", e),
    }
}
