use std::{env, fs::File, io::Write};

use knit_art::{verboser::Logger, Optimizer, Settings, TargetImage};

fn main() {
    let input = env::args().nth(1).unwrap_or_else(|| String::from("source.jpg"));
    let config = Settings {
        resolution: 400,
        pins: 180,
        opaqueness: 25,
        report_interval: 500,
        ..Default::default()
    }
    .validate()
    .unwrap();
    let mut logger = Logger::new(config.report_interval());
    let target =
        TargetImage::open(&input, config.resolution(), config.background(), &mut logger).unwrap();
    let mut art = Optimizer::<f32>::new(target, &config, &mut logger).unwrap();
    for i in 1..6 {
        if art.compute(i * 500, &mut logger).is_final() {
            break;
        }
        art.computation()
            .save_image(format!("weave_{}.png", i), true)
            .unwrap();
    }
    art.compute(config.max_threads(), &mut logger);
    let computation = art.into_computation();
    computation.save_image("weave.png", true).unwrap();
    File::create("weave.txt")
        .and_then(|mut file| file.write_all(computation.build_instructions().as_bytes()))
        .unwrap();
}
