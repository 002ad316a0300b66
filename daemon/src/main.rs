//! Tally daemon: command-line host for the governance engine.
//!
//! Each invocation loads the configuration, opens the proposal store under the
//! data directory, runs one operation as `--caller` at the current time (or
//! `--now` when replaying), and prints the result on stdout.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use tally_governance::{Proposal, ProposalParams};
use tally_node::{GovernanceNode, LedgerBalances, NodeConfig};
use tally_store_lmdb::LmdbGovernanceStore;
use tally_types::{Address, Clock, FixedClock, ProposalId, SystemClock, Timestamp};
use tally_utils::{format_duration, init_logging, LogFormat};

type Node = GovernanceNode<FixedClock, LedgerBalances, LmdbGovernanceStore>;

#[derive(Parser)]
#[command(name = "tally", about = "Token-weighted proposals and voting")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the proposal store.
    #[arg(long, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    log_format: Option<String>,

    /// Address acting on this invocation.
    #[arg(long, env = "TALLY_CALLER")]
    caller: Option<String>,

    /// Unix time (seconds) to run the operation at, instead of the system clock.
    #[arg(long, env = "TALLY_NOW")]
    now: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Choice {
    Yes,
    No,
}

#[derive(Subcommand)]
enum Command {
    /// Create a proposal.
    Propose {
        #[arg(long)]
        question: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Minimum number of voters (0 means 1).
        #[arg(long, default_value_t = 0)]
        min_votes: u64,
        /// Minimum cumulative weight (0 means 1).
        #[arg(long, default_value_t = 0)]
        min_weight: u64,
        /// Yes share needed to pass, 50..=70 (0 means 50).
        #[arg(long, default_value_t = 0)]
        majority: u16,
        /// Voting window in days, 30..=180 (0 means 60).
        #[arg(long, default_value_t = 0)]
        days: u16,
    },
    /// Vote on a proposal.
    Vote {
        id: u64,
        #[arg(value_enum)]
        choice: Choice,
    },
    /// Settle a proposal whose window has closed.
    Finalize { id: u64 },
    /// Print the current standing of a proposal.
    Status { id: u64 },
    /// Print a proposal as JSON.
    Show { id: u64 },
    /// Print whether an address has voted.
    HasVoted { id: u64, voter: String },
    /// Print the frozen weight of an address's vote.
    Weight { id: u64, voter: String },
    /// Print the time left to vote.
    Remaining { id: u64 },
    /// List proposals still open for voting.
    Active,
    /// List proposals created by an address.
    ByCreator { creator: String },
    /// List every proposal.
    List,
    /// Print a configuration file with default settings.
    InitConfig,
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

fn caller(cli: &Cli) -> anyhow::Result<Address> {
    let Some(raw) = cli.caller.as_deref() else {
        bail!("this command needs --caller (or TALLY_CALLER)");
    };
    let address = Address::new(raw);
    if !address.is_valid() {
        bail!("invalid caller address '{raw}'");
    }
    Ok(address)
}

fn proposal_json(node: &Node, proposal: &Proposal) -> anyhow::Result<serde_json::Value> {
    let id = proposal.id();
    let tally = proposal.tally();
    let votes: Vec<_> = proposal
        .voters()
        .map(|(voter, record)| {
            json!({
                "voter": voter.as_str(),
                "support": record.support,
                "weight": record.weight.to_string(),
                "cast_at": record.cast_at.as_secs(),
            })
        })
        .collect();
    Ok(json!({
        "id": id.get(),
        "creator": proposal.creator().as_str(),
        "question": proposal.question(),
        "description": proposal.description(),
        "minimum_votes": proposal.minimum_votes(),
        "minimum_weight": proposal.minimum_weight(),
        "majority_pct": proposal.majority_pct(),
        "created_at": proposal.created_at().as_secs(),
        "deadline": proposal.deadline().as_secs(),
        "remaining_secs": node.remaining(id)?,
        "total_votes_yes": tally.votes_yes(),
        "total_weight_yes": tally.weight_yes().to_string(),
        "total_votes_no": tally.votes_no(),
        "total_weight_no": tally.weight_no().to_string(),
        "status": node.status(id)?.as_str(),
        "voter_count": proposal.voter_count(),
        "votes": votes,
    }))
}

fn print_ids(ids: &[ProposalId]) {
    for id in ids {
        println!("{}", id.get());
    }
}

fn run(cli: &Cli, config: &NodeConfig) -> anyhow::Result<()> {
    let now = cli
        .now
        .map(Timestamp::new)
        .unwrap_or_else(|| SystemClock.now());
    let store = config
        .open_store()
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;
    let balances = LedgerBalances::from_config(config);
    tracing::debug!(holders = balances.holder_count(), "ledger loaded");
    let mut node: Node = GovernanceNode::open(FixedClock(now), balances, store)?;

    match &cli.command {
        Command::Propose {
            question,
            description,
            min_votes,
            min_weight,
            majority,
            days,
        } => {
            let params = ProposalParams::new(question.as_str(), description.as_str())
                .with_minimums(*min_votes, *min_weight)
                .with_majority(*majority)
                .with_duration_days(*days);
            let id = node.propose(&caller(cli)?, params)?;
            println!("{}", id.get());
        }
        Command::Vote { id, choice } => {
            let support = matches!(choice, Choice::Yes);
            let weight = node.vote(&caller(cli)?, ProposalId::new(*id), support)?;
            println!("{weight}");
        }
        Command::Finalize { id } => {
            let settlement = node.finalize(&caller(cli)?, ProposalId::new(*id))?;
            println!("{}", settlement.status);
        }
        Command::Status { id } => {
            println!("{}", node.status(ProposalId::new(*id))?);
        }
        Command::Show { id } => {
            let proposal = node.proposal(ProposalId::new(*id))?;
            let view = proposal_json(&node, proposal)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::HasVoted { id, voter } => {
            println!(
                "{}",
                node.has_voted(ProposalId::new(*id), &Address::new(voter.as_str()))?
            );
        }
        Command::Weight { id, voter } => {
            println!(
                "{}",
                node.weight(ProposalId::new(*id), &Address::new(voter.as_str()))?
            );
        }
        Command::Remaining { id } => {
            println!("{}", format_duration(node.remaining(ProposalId::new(*id))?));
        }
        Command::Active => print_ids(&node.active()),
        Command::ByCreator { creator } => {
            print_ids(&node.by_creator(&Address::new(creator.as_str())))
        }
        Command::List => print_ids(&node.all()),
        // Printed by `main` before any store is opened.
        Command::InitConfig => {}
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if matches!(cli.command, Command::InitConfig) {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let format: LogFormat = config
        .log_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    init_logging(format, &config.log_level);
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    run(&cli, &config)
}
