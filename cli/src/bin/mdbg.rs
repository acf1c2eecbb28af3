use definitions::DataSet;
use std::io::BufReader;
use std::io::{BufWriter, Write};
#[macro_use]
extern crate log;

fn main() -> std::io::Result<()> {
    let matches = mdbg_cli::commands::mdbg_parser().get_matches();
    if let Some((_, sub_m)) = matches.subcommand() {
        let level = match sub_m.occurrences_of("verbose") {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }
    let ds = get_input_file()?;
    match matches.subcommand() {
        Some(("resolve", sub_m)) => resolve(sub_m, &ds),
        Some(("stats", sub_m)) => stats(sub_m, &ds),
        Some(("dot", sub_m)) => dot(sub_m, &ds),
        _ => unreachable!(),
    }
}

fn resolve(matches: &clap::ArgMatches, ds: &DataSet) -> std::io::Result<()> {
    debug!("START\tResolve");
    set_threads(matches);
    let k_final: usize = matches
        .value_of("k_final")
        .and_then(|k| k.parse().ok())
        .expect("k_final");
    let validate = !matches.is_present("skip_validation");
    use multiplexer::{ResolveConfig, ResolveRepeats};
    let resolution = ds.resolve_repeats(&ResolveConfig::new(k_final, validate));
    flush_file(&resolution)
}

fn stats(matches: &clap::ArgMatches, ds: &DataSet) -> std::io::Result<()> {
    debug!("START\tStats");
    set_threads(matches);
    let paths = multiplexer::ReadPaths::from_reads(&ds.reads);
    let graph = multiplexer::MultiplexDbg::from_records(&ds.edges, ds.start_k, paths);
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    writeln!(wtr, "{}", graph)
}

fn dot(matches: &clap::ArgMatches, ds: &DataSet) -> std::io::Result<()> {
    debug!("START\tDot");
    set_threads(matches);
    let paths = multiplexer::ReadPaths::from_reads(&ds.reads);
    let mut graph = multiplexer::MultiplexDbg::from_records(&ds.edges, ds.start_k, paths);
    if let Some(k_final) = matches.value_of("k_final").and_then(|k| k.parse().ok()) {
        let increaser = multiplexer::KIncreaser::new(ds.start_k, k_final, false);
        increaser.increase_until_saturation(&mut graph);
    }
    let mut rendered = String::new();
    graph
        .write_dot(&mut rendered)
        .expect("rendering to a string cannot fail");
    let file = std::fs::File::create(matches.value_of("output").unwrap())?;
    let mut wtr = BufWriter::new(file);
    wtr.write_all(rendered.as_bytes())
}

fn get_input_file() -> std::io::Result<DataSet> {
    let stdin = std::io::stdin();
    let reader = BufReader::new(stdin.lock());
    match serde_json::de::from_reader(reader) {
        Err(why) => {
            eprintln!("{:?}", why);
            eprintln!("Invalid input from STDIN.");
            Err(std::io::Error::from(std::io::ErrorKind::Other))
        }
        Ok(res) => Ok(res),
    }
}

fn flush_file(resolution: &definitions::Resolution) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    match serde_json::ser::to_writer(&mut wtr, resolution) {
        Err(why) => {
            eprintln!("{:?}", why);
            eprintln!("Invalid output to the STDOUT.");
            std::process::exit(1);
        }
        _ => Ok(()),
    }
}

fn set_threads(matches: &clap::ArgMatches) {
    if let Some(threads) = matches.value_of("threads").and_then(|num| num.parse().ok()) {
        debug!("Set Threads\t{}", threads);
        if let Err(why) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            debug!("{:?}", why);
        }
    }
}
