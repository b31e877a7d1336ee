use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use nftsnapshot::{
    analytics::{holder_counts, summarize, trait_distribution, RarityTable},
    arguments,
    cache::{prune_stale, RequestCache},
    config::{load_config_from_path, validate_config, SnapshotConfig, CONFIG_FILE_PATH},
    enrich::{Enricher, Shutdown},
    fetchers::{AccountFetcher, Fetcher, HolderFetcher, MetadataHttp, OffChainFetcher, ReqwestMetadataHttp},
    logger::{self, LogTag},
    paths::default_cache_key,
    report::{format_biggest_holders, format_token_rarity, format_trait_frequency, write_snapshot},
    rpc::{LedgerRpc, RpcClient},
    token_list::read_token_list,
};

fn build_cli() -> Command {
    Command::new("nftsnapshot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Snapshot NFT holders, trait distribution and rarity for a token list")
        .arg(
            Arg::new("token-file")
                .value_name("TOKEN_FILE")
                .help("File with one token mint per line")
                .required(true),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Write the CSV snapshot to FILE")
                .default_value("snapshot.csv"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Configuration file")
                .default_value(CONFIG_FILE_PATH),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .value_name("DIR")
                .help("Directory holding request cache files"),
        )
        .arg(
            Arg::new("cache-key")
                .long("cache-key")
                .value_name("KEY")
                .help("Cache file key (defaults to the token file name)"),
        )
        .arg(
            Arg::new("rpc-url")
                .long("rpc-url")
                .value_name("URL")
                .help("Ledger JSON-RPC endpoint"),
        )
        .arg(
            Arg::new("rarity")
                .long("rarity")
                .value_name("TOKEN")
                .help("Print the rarity breakdown of one token"),
        )
        .arg(
            Arg::new("skip-holders")
                .long("skip-holders")
                .help("Do not print the holder report")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("skip-traits")
                .long("skip-traits")
                .help("Do not print the trait report")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("skip-snapshot")
                .long("skip-snapshot")
                .help("Do not write the CSV snapshot")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("prune-stale")
                .long("prune-stale")
                .help("Drop cached tokens that are not in the token file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .help("Hide progress bars")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose logging for every subsystem")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Only print errors")
                .action(ArgAction::SetTrue),
        )
        .after_help("Debug output per subsystem: --debug-<tag> (cache, rpc, holders, metadata, offchain, enrich, report, config, system)")
}

/// Command-line values take precedence over the configuration file
fn apply_overrides(config: &mut SnapshotConfig, matches: &ArgMatches) {
    if let Some(dir) = matches.get_one::<String>("cache-dir") {
        config.cache.directory = dir.clone();
    }
    if let Some(url) = matches.get_one::<String>("rpc-url") {
        config.rpc.url = url.clone();
    }
    if matches.get_flag("prune-stale") {
        config.cache.prune_stale = true;
    }
    if matches.get_flag("no-progress") {
        config.enrich.show_progress = false;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // --debug-<tag> flags are read by the logger straight from argv
    let cli_args: Vec<String> = arguments::get_cmd_args()
        .into_iter()
        .filter(|a| !a.starts_with("--debug-"))
        .collect();
    let matches = build_cli().get_matches_from(cli_args);

    let config_path = PathBuf::from(
        matches
            .get_one::<String>("config")
            .map(String::as_str)
            .unwrap_or(CONFIG_FILE_PATH),
    );
    let mut config = load_config_from_path(&config_path).context("Failed to load configuration")?;
    apply_overrides(&mut config, &matches);
    validate_config(&config).context("Invalid configuration")?;

    logger::init(&config.logging);
    logger::info(LogTag::System, &format!("nftsnapshot {} starting", env!("CARGO_PKG_VERSION")));
    logger::debug(LogTag::Config, &format!("{:?}", config));

    let token_file = PathBuf::from(
        matches
            .get_one::<String>("token-file")
            .context("TOKEN_FILE is required")?,
    );
    let token_list = read_token_list(&token_file).context("Failed to read token list")?;
    logger::info(
        LogTag::System,
        &format!("Read {} tokens from {}", token_list.len(), token_file.display()),
    );

    let cache_key = matches
        .get_one::<String>("cache-key")
        .cloned()
        .unwrap_or_else(|| default_cache_key(&token_file));
    let cache = RequestCache::from_config(&config.cache);
    let mut tokens = cache.load(&cache_key);
    if config.cache.prune_stale {
        prune_stale(&mut tokens, &token_list);
    }
    let added = tokens.seed(&token_list);
    logger::info(
        LogTag::Cache,
        &format!("{} tokens tracked ({} new since last run)", tokens.len(), added),
    );

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    let rpc_client = Arc::new(RpcClient::new(&config.rpc)?);
    let http_client = Arc::new(ReqwestMetadataHttp::new(&config.http)?);
    let rpc: Arc<dyn LedgerRpc> = rpc_client.clone();
    let http: Arc<dyn MetadataHttp> = http_client.clone();

    let holders: Arc<dyn Fetcher> = Arc::new(HolderFetcher::new(rpc.clone()));
    let account: Arc<dyn Fetcher> = Arc::new(AccountFetcher::new(rpc));
    let offchain: Arc<dyn Fetcher> = Arc::new(OffChainFetcher::from_config(http, &config.http));

    let enricher = Enricher::new(cache, &cache_key, &config.enrich).with_shutdown(shutdown.clone());
    enricher.enrich_holders(&mut tokens, holders).await;
    if !shutdown.is_triggered() {
        enricher.enrich_metadata(&mut tokens, account, offchain).await;
    }

    logger::debug(
        LogTag::Rpc,
        &format!(
            "Requests issued: {} ledger, {} off-chain",
            rpc_client.limiter().acquired(),
            http_client.limiter().acquired()
        ),
    );

    if shutdown.is_triggered() {
        logger::warning(LogTag::System, "Interrupted, partial progress saved to cache");
        logger::flush();
        return Ok(());
    }

    if !matches.get_flag("skip-holders") {
        print!("{}", format_biggest_holders(tokens.len(), &holder_counts(&tokens)));
    }
    if !matches.get_flag("skip-traits") {
        print!("{}", format_trait_frequency(&trait_distribution(&tokens)));
    }

    let summaries = summarize(&tokens);
    let table = RarityTable::build(&summaries);

    if let Some(token) = matches.get_one::<String>("rarity") {
        match format_token_rarity(token, &summaries, &table) {
            Some(text) => print!("{}", text),
            None => logger::warning(LogTag::Report, &format!("Token {} is not in the snapshot", token)),
        }
    }

    if !matches.get_flag("skip-snapshot") {
        let outfile = PathBuf::from(
            matches
                .get_one::<String>("file")
                .map(String::as_str)
                .unwrap_or("snapshot.csv"),
        );
        write_snapshot(&outfile, &summaries, &table)
            .with_context(|| format!("Failed to write snapshot {}", outfile.display()))?;
        logger::info(
            LogTag::Report,
            &format!("Wrote {} rows to {}", summaries.len(), outfile.display()),
        );
    }

    logger::flush();
    Ok(())
}
