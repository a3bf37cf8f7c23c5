use clap::{Parser, Subcommand};
use ledger::{Money, UserId};

#[derive(Parser, Debug)]
#[command(name = "splitbook")]
#[command(about = "Shared-expense ledger for groups")]
pub struct Cli {
    /// Settings file (TOML); missing files are ignored.
    #[arg(long, default_value = "settings")]
    pub config: String,

    /// Directory holding the JSON stores.
    #[arg(long, env = "SPLITBOOK_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Keep everything in memory (nothing is written).
    #[arg(long)]
    pub memory: bool,

    /// Refuse expenses without participants.
    #[arg(long)]
    pub reject_empty_split: bool,

    /// Log level for splitbook and the ledger (e.g. `debug`).
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a group with its members.
    Init {
        #[arg(long)]
        group: String,
        #[arg(long = "member", required = true, num_args = 1..)]
        members: Vec<UserId>,
    },
    /// Delete every member, balance and expense of a group.
    Reset {
        #[arg(long)]
        group: String,
    },
    /// Record an expense.
    Add {
        #[arg(long)]
        group: String,
        #[arg(long)]
        payer: UserId,
        #[arg(long)]
        amount: Money,
        #[arg(long)]
        description: String,
        /// Participants; defaults to every group member.
        #[arg(long = "split", num_args = 1..)]
        split_with: Vec<UserId>,
    },
    /// Pay back (part of) a debt.
    Settle {
        #[arg(long)]
        group: String,
        #[arg(long)]
        from: UserId,
        #[arg(long)]
        to: UserId,
        #[arg(long)]
        amount: Money,
    },
    /// Remove the first expense with the given description.
    Remove {
        #[arg(long)]
        group: String,
        #[arg(long)]
        description: String,
    },
    /// Show balances and who owes whom.
    Balances {
        #[arg(long)]
        group: String,
    },
    /// Show the latest expenses.
    History {
        #[arg(long)]
        group: String,
        #[arg(long, default_value_t = 10)]
        last: usize,
    },
}
