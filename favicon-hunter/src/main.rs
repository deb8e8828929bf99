use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, ArgGroup, Parser};
use favicon_hunter::config::{
    self, BackendSelection, CENCLI_ENV, Config, DEFAULT_CENCLI, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_LIMIT, KEYS_FILE_ENV, SHODAN_API_KEY_ENV, Target,
};
use favicon_hunter::{Censys, Error, HostSearch, HttpClient, Hunter, SearchResult, Shodan, report};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "favicon-hunter")]
#[command(version)]
#[command(about = "Find related infrastructure via favicon hashes")]
#[command(after_help = "Examples:
  favicon-hunter https://target.com
  favicon-hunter https://target.com --shodan
  favicon-hunter --hash 1848946384 --shodan
  favicon-hunter https://target.com --all -o results.json")]
#[command(group(ArgGroup::new("target").required(true).args(["url", "hash"])))]
struct Args {
    /// Target URL to fetch the favicon from
    url: Option<String>,

    /// Use a precalculated MMH3 hash instead of fetching a favicon
    #[arg(short = 'H', long, allow_negative_numbers = true)]
    hash: Option<i32>,

    /// Search Shodan (needs an API key)
    #[arg(short, long)]
    shodan: bool,

    /// Search Censys (needs cencli)
    #[arg(short, long)]
    censys: bool,

    /// Search all engines
    #[arg(short, long)]
    all: bool,

    /// Maximum results per engine
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// Save results to a JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Request timeout for the target site, in seconds
    #[arg(short, long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    timeout: u64,

    /// Only calculate and print the hashes
    #[arg(long)]
    hash_only: bool,

    /// Validate the target's TLS certificate
    #[arg(long)]
    verify_tls: bool,

    /// Shodan API key
    #[arg(long, env = SHODAN_API_KEY_ENV, hide_env_values = true)]
    shodan_key: Option<String>,

    /// cencli executable
    #[arg(long, env = CENCLI_ENV, default_value = DEFAULT_CENCLI)]
    cencli: PathBuf,

    /// KEY=VALUE file to read SHODAN_API_KEY from
    #[arg(long, env = KEYS_FILE_ENV)]
    keys_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[!] {e}");
            if e.is_usage() { ExitCode::from(2) } else { ExitCode::FAILURE }
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("favicon_hunter={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn build_config(args: Args) -> Result<Config, Error> {
    if args.limit == 0 {
        return Err(Error::InvalidArgs("--limit must be at least 1".to_string()));
    }
    if args.timeout == 0 {
        return Err(Error::InvalidArgs("--timeout must be at least 1".to_string()));
    }

    let target = Target::from_inputs(args.url.as_deref(), args.hash)?;
    let shodan_api_key = config::resolve_shodan_key(args.shodan_key, args.keys_file.as_deref())?;

    let mut config = Config::new(target);
    config.limit = args.limit;
    config.fetch_timeout = Duration::from_secs(args.timeout);
    config.verify_tls = args.verify_tls;
    config.hash_only = args.hash_only;
    config.output = args.output;
    config.backends = BackendSelection::new(args.shodan, args.censys, args.all);
    config.shodan_api_key = shodan_api_key;
    config.cencli = args.cencli;
    Ok(config)
}

async fn run(args: Args) -> Result<(), Error> {
    let config = build_config(args)?;

    let source_url = match &config.target {
        Target::Url(url) => {
            if url.scheme() == "https" && !config.verify_tls {
                warn!("TLS certificate validation is disabled for {url}; use --verify-tls to enable it");
            }
            Some(url.to_string())
        }
        Target::Hash(_) => None,
    };

    let shodan = Shodan::new(config.shodan_api_key.clone())?;
    let censys = Censys::new(&config.cencli);
    let hunter = Hunter::new(&config, HttpClient::for_target(&config)?, &shodan, &censys);

    if let Some(url) = &source_url {
        println!("[*] Fetching favicon from: {url}");
    }
    let hashed = hunter.hashes().await?;
    if let Some(favicon) = &hashed.favicon {
        println!("[+] Favicon fetched: {} bytes from {}", favicon.bytes.len(), favicon.url);
    }

    print!("{}", report::format_hashes(&hashed.hashes));

    if config.hash_only {
        return Ok(());
    }

    let selected = [(config.backends.shodan, shodan.name()), (config.backends.censys, censys.name())];
    let queried: Vec<&str> =
        selected.into_iter().filter_map(|(enabled, name)| enabled.then_some(name)).collect();
    if !queried.is_empty() {
        println!("\n[*] Searching {}...", queried.join(", "));
    }

    let backend_results = hunter.search(&hashed.hashes).await;
    print!("{}", report::format_backends(&backend_results));

    if let Some(path) = &config.output {
        let result = SearchResult::new(hashed, source_url, backend_results);
        match report::persist(&result, path).await {
            Ok(()) => println!("\n[+] Results saved to: {}", path.display()),
            Err(e) => eprintln!("[!] Could not save results to {}: {e}", path.display()),
        }
    }

    Ok(())
}
