mod config;
mod error;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use feegrant::{
    Address, Allowance, BlockInfo, Coins, Context, Expiration, FeeAllowanceGrant, GenesisState,
    Keeper,
};
use storage::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "feegrant.toml";

#[derive(Parser)]
#[command(name = "feegrant")]
#[command(about = "Manage revocable fee allowances between accounts", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Path to the state database (overrides store.path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grant (or replace) a fee allowance
    Grant {
        #[arg(long)]
        granter: Address,
        #[arg(long)]
        grantee: Address,
        /// Spend limit, e.g. 555atom,10eth
        #[arg(long)]
        limit: Coins,
        /// Block height at which the allowance expires
        #[arg(long, conflicts_with = "expires_time")]
        expires_height: Option<u64>,
        /// RFC 3339 time at which the allowance expires
        #[arg(long)]
        expires_time: Option<DateTime<Utc>>,
    },
    /// Revoke a fee allowance
    Revoke {
        #[arg(long)]
        granter: Address,
        #[arg(long)]
        grantee: Address,
    },
    /// Show one fee allowance
    Show {
        #[arg(long)]
        granter: Address,
        #[arg(long)]
        grantee: Address,
    },
    /// List fee allowances, optionally for one grantee
    List {
        #[arg(long)]
        grantee: Option<Address>,
    },
    /// Charge a fee against an allowance
    Use {
        #[arg(long)]
        granter: Address,
        #[arg(long)]
        grantee: Address,
        /// Fee to charge, e.g. 1atom
        #[arg(long)]
        fee: Coins,
        /// Current block height
        #[arg(long)]
        height: u64,
        /// Current block time (defaults to now)
        #[arg(long)]
        time: Option<DateTime<Utc>>,
    },
    /// Write every allowance as a JSON genesis document
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Load allowances from a JSON genesis document
    Import { file: PathBuf },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;
    init_tracing(&config.log.level);

    let db_path = config.db_path(cli.db.as_deref())?;
    tracing::debug!(path = %db_path.display(), "opening state");
    let keeper = Keeper::new();

    match cli.command {
        Commands::Grant {
            granter,
            grantee,
            limit,
            expires_height,
            expires_time,
        } => {
            let expiration = expiration_from(expires_height, expires_time)?;
            let mut ctx = open_context(&db_path, now_block())?;
            let grant = FeeAllowanceGrant::new(granter, grantee, Allowance::basic(limit, expiration));
            keeper.grant_fee_allowance(&mut ctx, &grant)?;
            println!("Granted {granter} -> {grantee}: {}", describe(&grant.allowance));
        }
        Commands::Revoke { granter, grantee } => {
            let mut ctx = open_context(&db_path, now_block())?;
            keeper.revoke_fee_allowance(&mut ctx, &granter, &grantee)?;
            println!("Revoked {granter} -> {grantee}");
        }
        Commands::Show { granter, grantee } => {
            let ctx = open_context(&db_path, now_block())?;
            let allowance = keeper
                .get_fee_allowance(&ctx, &granter, &grantee)?
                .ok_or_else(|| Error::NoAllowance {
                    granter: granter.to_string(),
                    grantee: grantee.to_string(),
                })?;
            println!("{}", describe(&allowance));
        }
        Commands::List { grantee } => {
            let ctx = open_context(&db_path, now_block())?;
            let mut grants = Vec::new();
            let collect = |grant: FeeAllowanceGrant| {
                grants.push(grant);
                false
            };
            match grantee {
                Some(grantee) => keeper.iterate_all_grantee_fee_allowances(&ctx, &grantee, collect)?,
                None => keeper.iterate_all_fee_allowances(&ctx, collect)?,
            }
            print_grants(&grants);
        }
        Commands::Use {
            granter,
            grantee,
            fee,
            height,
            time,
        } => {
            let block = BlockInfo::new(height, time.unwrap_or_else(Utc::now));
            let mut ctx = open_context(&db_path, block)?;
            keeper.use_granted_fees(&mut ctx, &granter, &grantee, &fee)?;
            match keeper.get_fee_allowance(&ctx, &granter, &grantee)? {
                Some(left) => println!("Charged {fee}; remaining {}", describe(&left)),
                None => println!("Charged {fee}; allowance exhausted and removed"),
            }
        }
        Commands::Export { out } => {
            let ctx = open_context(&db_path, now_block())?;
            let genesis = keeper.export_genesis(&ctx)?;
            let json = serde_json::to_string_pretty(&genesis)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!(
                        "Exported {} allowances to {}",
                        genesis.fee_allowances.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }
        Commands::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let genesis: GenesisState = serde_json::from_str(&content)?;
            let mut ctx = open_context(&db_path, now_block())?;
            keeper.init_genesis(&mut ctx, &genesis)?;
            println!("Imported {} allowances", genesis.fee_allowances.len());
        }
    }

    Ok(())
}

/// Exactly one of the two grant flags; clap rejects both being set.
fn expiration_from(height: Option<u64>, time: Option<DateTime<Utc>>) -> Result<Expiration> {
    height
        .map(Expiration::at_height)
        .or(time.map(Expiration::at_time))
        .ok_or(Error::MissingExpiration)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_context(db_path: &Path, block: BlockInfo) -> Result<Context<SqliteStore>> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(db_path)?;
    Ok(Context::new(store, block))
}

/// Block info for calls that never consult the deadline.
fn now_block() -> BlockInfo {
    BlockInfo::new(0, Utc::now())
}

fn describe(allowance: &Allowance) -> String {
    match allowance {
        Allowance::Basic(basic) => {
            format!("limit {} (expires {})", basic.spend_limit, basic.expiration)
        }
    }
}

fn print_grants(grants: &[FeeAllowanceGrant]) {
    if grants.is_empty() {
        println!("No fee allowances found.");
        return;
    }

    println!("{:<40}  {:<40}  ALLOWANCE", "GRANTER", "GRANTEE");
    println!("{}", "-".repeat(110));

    for grant in grants {
        println!(
            "{:<40}  {:<40}  {}",
            grant.granter.to_string(),
            grant.grantee.to_string(),
            describe(&grant.allowance)
        );
    }
}
