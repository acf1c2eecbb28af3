use clap::{Arg, Command};

fn subcommand_resolve() -> Command<'static> {
    Command::new("resolve")
        .version("0.1")
        .about("Increase k until saturation and write the resolved graph as JSON.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::new("k_final")
                .long("k_final")
                .short('K')
                .takes_value(true)
                .required(true)
                .value_name("K")
                .help("Stop once the effective k-mer size reaches this value."),
        )
        .arg(
            Arg::new("skip_validation")
                .long("skip_validation")
                .help("Do not re-check graph invariants after every round."),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .takes_value(true)
                .default_value("1")
                .help("number of threads"),
        )
}

fn subcommand_stats() -> Command<'static> {
    Command::new("stats")
        .version("0.1")
        .about("Print a summary of the input graph without resolving it.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .takes_value(true)
                .default_value("1")
                .help("number of threads"),
        )
}

fn subcommand_dot() -> Command<'static> {
    Command::new("dot")
        .version("0.1")
        .about("Render the graph in Graphviz format, optionally after resolving.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("PATH")
                .required(true)
                .help("Output DOT file."),
        )
        .arg(
            Arg::new("k_final")
                .long("k_final")
                .short('K')
                .takes_value(true)
                .value_name("K")
                .help("Resolve up to this k before rendering."),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .takes_value(true)
                .default_value("1")
                .help("number of threads"),
        )
}

pub fn mdbg_parser() -> Command<'static> {
    Command::new("mdbg")
        .version("0.1")
        .about("Multiplex de Bruijn graph repeat resolution.")
        .subcommand_required(true)
        .subcommand(subcommand_resolve())
        .subcommand(subcommand_stats())
        .subcommand(subcommand_dot())
}
