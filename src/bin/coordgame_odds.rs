//! coordgame odds calculator
//!
//! Prints the uniform-random baseline for a game: the single-round success
//! probability, the cumulative success curve and the rounds needed to reach
//! a confidence level.

use coordgame::telemetry::{init_tracing, init_tracing_with_filter};
use coordgame::{GameParameters, ProbabilityModel};

/// Calculator configuration
struct Config {
    participants: u32,
    range_max: u32,
    target: i64,
    rounds: u32,
    confidence: f64,
    log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            participants: 4,
            range_max: 5,
            target: 15,
            rounds: 10,
            confidence: 0.95,
            log_filter: None,
        }
    }
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(v) => v,
        None => {
            eprintln!("error: {flag} requires a value");
            std::process::exit(1);
        }
    }
}

fn parse_or_exit<T: std::str::FromStr>(raw: &str, flag: &str) -> T {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("error: invalid value for {flag}: {raw}");
        std::process::exit(1);
    })
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--participants" | "-n" => {
                config.participants = parse_or_exit(value_of(&args, i, flag), flag);
                i += 2;
            }
            "--range" | "-k" => {
                config.range_max = parse_or_exit(value_of(&args, i, flag), flag);
                i += 2;
            }
            "--target" | "-t" => {
                config.target = parse_or_exit(value_of(&args, i, flag), flag);
                i += 2;
            }
            "--rounds" | "-r" => {
                config.rounds = parse_or_exit(value_of(&args, i, flag), flag);
                i += 2;
            }
            "--confidence" | "-c" => {
                config.confidence = parse_or_exit(value_of(&args, i, flag), flag);
                i += 2;
            }
            "--log" => {
                config.log_filter = Some(value_of(&args, i, flag).to_string());
                i += 2;
            }
            "--help" | "-h" => {
                println!("coordgame-odds - uniform-random baseline for a coordination game");
                println!();
                println!("USAGE:");
                println!("    coordgame-odds [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -n, --participants <N>    Number of participants [default: 4]");
                println!("    -k, --range <K>           Largest allowed number [default: 5]");
                println!("    -t, --target <T>          Target sum [default: 15]");
                println!("    -r, --rounds <R>          Rounds to tabulate [default: 10]");
                println!("    -c, --confidence <P>      Confidence level in [0, 1) [default: 0.95]");
                println!("        --log <FILTER>        Tracing filter, overrides COORDGAME_LOG");
                println!("    -h, --help                Print help information");
                std::process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(1);
            }
        }
    }

    config
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args();
    match &config.log_filter {
        Some(filter) => init_tracing_with_filter(filter),
        None => init_tracing(),
    }

    let params = GameParameters::new(
        config.participants,
        config.range_max,
        config.target,
        config.rounds,
    )?;
    let model = ProbabilityModel::for_game(&params)?;
    let needed = model.rounds_for(config.confidence)?;

    tracing::debug!(?params, p1 = model.single_round(), "odds computed");

    println!(
        "n={} k={} t={}",
        params.participant_count, params.range_max, params.target
    );
    println!("single round: {:.6}", model.single_round());
    println!();
    println!("{:>6}  {:>10}", "rounds", "P(hit)");
    for point in model.growth(u64::from(config.rounds)) {
        println!("{:>6}  {:>10.6}", point.rounds, point.probability);
    }
    println!();
    println!("rounds for {:.1}% confidence: {needed}", config.confidence * 100.0);

    Ok(())
}
