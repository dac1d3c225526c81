//! Command-line front end: reads host names or URLs, one per line, and
//! prints the requested parts of each resolution.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, LevelFilter};

#[cfg(feature = "download")]
use psl_engine_r::AutoListLoader;
use psl_engine_r::{
    encode_input, extract_host, FileListLoader, ListLoader, PslError, Resolution, ResolverOptions,
    SuffixList,
};

#[derive(Parser)]
#[command(name = "psl-engine")]
#[command(about = "Split domain names into public suffix, registered domain and FQDN using the Public Suffix List", long_about = None)]
#[command(version)]
struct Cli {
    /// File with one host name or URL per line (standard input when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Suffix list file to load
    #[arg(short, long, value_name = "FILE")]
    list: Option<PathBuf>,

    /// Directory holding the downloaded suffix list
    #[arg(long, value_name = "DIR", conflicts_with = "list")]
    data_dir: Option<PathBuf>,

    /// Print suffix
    #[arg(long)]
    tld: bool,

    /// Print registered domain (default when no column is chosen)
    #[arg(long)]
    rd: bool,

    /// Print fully-qualified domain name
    #[arg(long)]
    fqdn: bool,

    /// Use the private section of the list as well
    #[arg(long)]
    private: bool,

    /// Print errors only
    #[arg(long)]
    err: bool,

    /// Comma-separated list of custom suffixes
    #[arg(long, value_name = "SUFFIXES", value_delimiter = ',')]
    custom: Vec<String>,

    /// Print one JSON object per resolved line
    #[arg(short, long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Columns chosen on the command line
struct Columns {
    rd: bool,
    fqdn: bool,
    tld: bool,
}

impl Columns {
    fn from_cli(cli: &Cli) -> Self {
        let rd = cli.rd || !(cli.tld || cli.fqdn);
        Self {
            rd,
            fqdn: cli.fqdn,
            tld: cli.tld,
        }
    }

    fn format(&self, res: &Resolution) -> String {
        let mut fields = Vec::with_capacity(3);
        if self.rd {
            fields.push(res.registered_domain.as_deref().unwrap_or(""));
        }
        if self.fqdn {
            fields.push(res.fqdn.as_deref().unwrap_or(""));
        }
        if self.tld {
            fields.push(res.suffix.as_str());
        }
        fields.join("\t")
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version end up here too
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    init_logger(cli.verbose);

    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                eprintln!("Error opening input file {}: {}", path.display(), e);
                return ExitCode::from(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let loader = match list_loader(&cli) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    let mut psl = match SuffixList::from_loader(loader.as_ref(), ResolverOptions::default()) {
        Ok(psl) => psl,
        Err(e) => {
            eprintln!("Can not load the public suffix list: {}", e);
            return ExitCode::from(2);
        }
    };

    for suffix in cli.custom.iter().filter(|s| !s.trim().is_empty()) {
        if let Err(e) = psl.add_custom_suffix(suffix) {
            eprintln!("ERROR: Can not add custom suffix {}: {}", suffix, e);
        }
    }
    debug!("Loaded {:?}", psl);

    match run(&cli, &psl, input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logger(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn list_loader(cli: &Cli) -> Result<Box<dyn ListLoader>, PslError> {
    if let Some(path) = &cli.list {
        return Ok(Box::new(FileListLoader::new(path)));
    }
    auto_loader(cli)
}

#[cfg(feature = "download")]
fn auto_loader(cli: &Cli) -> Result<Box<dyn ListLoader>, PslError> {
    let dir = cli.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    Ok(Box::new(AutoListLoader::new().with_data_dir(dir)))
}

#[cfg(not(feature = "download"))]
fn auto_loader(_cli: &Cli) -> Result<Box<dyn ListLoader>, PslError> {
    Err(PslError::Config(
        "--list is required when built without download support".to_string(),
    ))
}

fn run(cli: &Cli, psl: &SuffixList, mut input: Box<dyn BufRead>) -> io::Result<()> {
    let columns = Columns::from_cli(cli);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        // a line that is not UTF-8 fails on its own
        let Ok(line) = std::str::from_utf8(&buf) else {
            if cli.err {
                eprintln!("ERROR: Can not parse: {}", String::from_utf8_lossy(&buf).trim());
            }
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let host = extract_host(line);
        let host = host.as_deref().unwrap_or(line);
        let Some(encoded) = encode_input(host) else {
            if cli.err {
                eprintln!("ERROR: Can not parse IDN domain: {}", host);
            }
            continue;
        };

        let res = match psl.resolve(&encoded, cli.private) {
            Ok(res) => res,
            Err(e) => {
                if cli.err {
                    eprintln!("ERROR: Can not parse: {} ({})", line, e);
                }
                continue;
            }
        };
        if cli.err {
            continue;
        }

        if cli.json {
            match serde_json::to_string(&res) {
                Ok(json) => writeln!(out, "{}", json)?,
                Err(e) => eprintln!("ERROR: Can not serialize result for {}: {}", line, e),
            }
        } else {
            writeln!(out, "{}", columns.format(&res))?;
        }
    }

    out.flush()
}
