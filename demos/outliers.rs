use std::fs::File;
use std::io::BufReader;

use ndarray::Array1;
use simjoin::eval::{flag_scores, roc_auc, truth_from_labels};
use simjoin::{Dataset, Metric, OutlierJoinBuilder, Point, RangeJoin};

// Flags outliers in a labelled dataset and scores the flags with ROC AUC.
//
// Without arguments, a synthetic dataset of three dense clusters (label 0) with a few scattered
// points (label 1) is generated. Otherwise the example reads a comma separated file:
//
//     cargo run --example outliers -- <file> <label column> <radius> <threshold>
//
// Set RUST_LOG=simjoin=debug to see the join's progress.
fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<_> = std::env::args().collect();
    let (mut data, eps, threshold) = if args.len() >= 5 {
        let file = match File::open(&args[1]) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Cannot open {}: {}", args[1], e);
                std::process::exit(1);
            }
        };
        let label_col = args[2].parse::<usize>().ok();
        let data = match Dataset::read_delimited(BufReader::new(file), ',', label_col, true) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        };
        let eps = args[3].parse::<f64>().unwrap_or(0.01);
        let threshold = args[4].parse::<usize>().unwrap_or(5);
        (data, eps, threshold)
    } else if args.len() == 1 {
        (synthetic(), 0.005, 5)
    } else {
        eprintln!("Usage: outliers [<file> <label column> <radius> <threshold>]");
        std::process::exit(1);
    };

    data.normalize();
    println!(
        "> Dim: {} x {}, radius = {}, threshold = {}",
        data.num_rows(),
        data.num_cols(),
        eps,
        threshold
    );

    let mut join = OutlierJoinBuilder::new(threshold)
        .join_threshold(64)
        .reorder_dimensions(true)
        .seed(0)
        .build(Metric::SquaredEuclidean)
        .unwrap();

    let start = std::time::Instant::now();
    join.range(&data, eps).unwrap();
    println!("> Join duration: {:?} (ms)", start.elapsed().as_millis());

    let flags = join.flags();
    println!(
        "> Outliers: {}/{}",
        flags.iter().filter(|&&f| f).count(),
        flags.len()
    );

    let truth = truth_from_labels(data.labels(), 1);
    match roc_auc(&truth, &flag_scores(&flags)) {
        Some(auc) => println!("> AUC: {:.4}", auc),
        None => println!("> AUC: undefined, labels hold a single class"),
    }
}

fn synthetic() -> Dataset {
    let mut rng = oorandom::Rand64::new(7);
    let centres = [[0.2, 0.2, 0.3], [0.7, 0.4, 0.6], [0.4, 0.8, 0.2]];
    let mut points = Vec::new();

    for i in 0..3000 {
        let centre = &centres[i % centres.len()];
        let values = Array1::from_shape_fn(3, |d| centre[d] + (rng.rand_float() - 0.5) * 0.1);
        points.push(Point::new(i, values).with_label(0));
    }

    for i in 3000..3030 {
        let values = Array1::from_shape_fn(3, |_| rng.rand_float());
        points.push(Point::new(i, values).with_label(1));
    }

    Dataset::new(points).unwrap()
}
