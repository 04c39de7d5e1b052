//! rehab_hand — interactive entry point.

use rehab_hand::app::run;
use rehab_hand::config::AppConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Rehab Hand — gesture rehabilitation game            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    match &cfg.detector {
        Some(det) => println!("  Input: hand detector `{}`", det.command.join(" ")),
        None      => println!("  Input: mouse simulation  (left button = pinch)"),
    }
    println!("  Data:  {}", cfg.data_dir.display());
    println!();
    println!("  Opening game window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
