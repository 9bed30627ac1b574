// ============================================================
// Layer 4 — Test Fixtures
// ============================================================
// Deterministic synthetic data shared by tests across layers.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::data::dataset::Dataset;
use crate::domain::{label::Label, record::Record};

/// Separable blobs: even-numbered features sit near `4 * class`,
/// odd-numbered features are uniform noise.
pub fn blobs(per_class: usize, width: usize, seed: u64) -> Dataset {
    let mut rng     = ChaCha8Rng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(per_class * Label::COUNT);

    for i in 0..per_class * Label::COUNT {
        let label    = Label::ALL[i % Label::COUNT];
        let features = (0..width)
            .map(|j| {
                if j % 2 == 0 {
                    label.index() as f64 * 4.0 + rng.gen_range(-1.0..1.0)
                } else {
                    rng.gen_range(-5.0..5.0)
                }
            })
            .collect();
        records.push(Record::new(i, features, label));
    }

    let names = (0..width).map(|j| format!("f{j}")).collect();
    Dataset::new(names, records)
}

/// CSV text shaped like the sensor files: a row-number column,
/// identifier and window columns, a mostly-missing summary column,
/// `width` sensor columns, and `classe`.
pub fn sensor_csv(per_class: usize, width: usize, seed: u64) -> String {
    let data = blobs(per_class, width, seed);

    let mut out = String::from("\"\",user_name,raw_timestamp_part_1,new_window,num_window,kurtosis_roll_belt");
    for name in &data.feature_names {
        out.push(',');
        out.push_str(name);
    }
    out.push_str(",classe\n");

    for (i, record) in data.records.iter().enumerate() {
        let summary = if i % 50 == 0 { "0.25" } else if i % 3 == 0 { "#DIV/0!" } else { "NA" };
        out.push_str(&format!("\"{}\",user{},{},no,{},{}", i + 1, i % 6, 1_323_084_231 + i, i / 20, summary));
        for v in &record.features {
            out.push_str(&format!(",{v}"));
        }
        out.push_str(&format!(",{}\n", record.label));
    }
    out
}

/// Quiz-shaped CSV: same sensor columns, `problem_id` instead of `classe`.
pub fn quiz_csv(rows: usize, width: usize, seed: u64) -> String {
    let data = blobs(rows.div_ceil(Label::COUNT), width, seed);

    let mut out = String::from("\"\",user_name,kurtosis_roll_belt");
    for name in &data.feature_names {
        out.push(',');
        out.push_str(name);
    }
    out.push_str(",problem_id\n");

    for (i, record) in data.records.iter().take(rows).enumerate() {
        out.push_str(&format!("\"{}\",user{},NA", i + 1, i % 6));
        for v in &record.features {
            out.push_str(&format!(",{v}"));
        }
        out.push_str(&format!(",{}\n", i + 1));
    }
    out
}
