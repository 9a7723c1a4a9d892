use std::path::{Path, PathBuf};

use serde_json::{Value, json};

/// (image, ground truth, top-1, confidence) for ten images over three labels.
const TEN_IMAGES: [(&str, usize, usize, [f64; 3]); 10] = [
    ("img0.jpg", 0, 0, [0.7, 0.2, 0.1]),
    ("img1.jpg", 0, 0, [0.6, 0.3, 0.1]),
    ("img2.jpg", 0, 1, [0.3, 0.5, 0.2]),
    ("img3.jpg", 1, 1, [0.1, 0.8, 0.1]),
    ("img4.jpg", 1, 1, [0.2, 0.6, 0.2]),
    ("img5.jpg", 1, 2, [0.1, 0.3, 0.6]),
    ("img6.jpg", 2, 2, [0.1, 0.1, 0.8]),
    ("img7.jpg", 2, 2, [0.2, 0.2, 0.6]),
    ("img8.jpg", 2, 0, [0.5, 0.1, 0.4]),
    ("img9.jpg", 0, 0, [0.9, 0.05, 0.05]),
];

pub struct EvalFixture {
    pub in_log: PathBuf,
    pub ground_truth: PathBuf,
}

pub fn inference_log() -> Value {
    let mut log = serde_json::Map::new();
    for (image, _, top1, confidence) in TEN_IMAGES {
        log.insert(
            image.to_string(),
            json!({"Top-1 Index": top1, "Confidence": confidence}),
        );
    }
    Value::Object(log)
}

pub fn ground_truth_text() -> String {
    TEN_IMAGES
        .iter()
        .map(|(image, truth, _, _)| format!("val/{image} {truth}\n"))
        .collect()
}

/// Write the ten-image log and its ground truth into `dir`.
pub fn write_ten_images(dir: &Path) -> EvalFixture {
    let in_log = dir.join("log.json");
    let ground_truth = dir.join("val.txt");
    std::fs::write(&in_log, serde_json::to_vec_pretty(&inference_log()).unwrap()).unwrap();
    std::fs::write(&ground_truth, ground_truth_text()).unwrap();
    EvalFixture {
        in_log,
        ground_truth,
    }
}

pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
