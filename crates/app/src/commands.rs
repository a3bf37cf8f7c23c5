use std::{error::Error, fmt::Write};

use chrono::Utc;
use ledger::{Balances, Debt, Expense, GroupId, Ledger};

use crate::cli::Command;

type CommandResult = Result<String, Box<dyn Error + Send + Sync>>;

/// Runs one command against the ledger and returns what to print.
pub async fn run(ledger: &Ledger, command: Command) -> CommandResult {
    match command {
        Command::Init { group, members } => {
            let summary = ledger.initialize(&GroupId::new(group), &members).await?;
            Ok(format!("{summary}\nMembers: {}", join(&summary.members)))
        }
        Command::Reset { group } => {
            let reset = ledger.reset(&GroupId::new(group)).await?;
            Ok(format!(
                "{reset} ({} expenses removed)",
                reset.removed_expenses
            ))
        }
        Command::Add {
            group,
            payer,
            amount,
            description,
            split_with,
        } => {
            let group = GroupId::new(group);
            if !ledger.is_initialized(&group).await {
                return Err(format!("group {group} not initialized, run `init` first").into());
            }
            let split_with = if split_with.is_empty() {
                ledger.members(&group).await
            } else {
                split_with
            };
            let expense = ledger
                .add_expense(&group, payer, amount, &description, &split_with, Utc::now())
                .await?;
            Ok(format!(
                "Expense #{} added: {} ({})\nPaid by: {}\nSplit with: {}\nPer person: {}",
                expense.id,
                expense.description,
                expense.amount,
                expense.payer_id,
                join(&expense.split_with),
                expense.per_person
            ))
        }
        Command::Settle {
            group,
            from,
            to,
            amount,
        } => {
            if from == to {
                return Err("you can't settle with yourself".into());
            }
            let settlement = ledger
                .settle_debt(&GroupId::new(group), from, to, amount)
                .await?;
            Ok(format!(
                "{settlement}\nPrevious balances: {from}: {}, {to}: {}\nNew balances: {from}: {}, {to}: {}",
                settlement.before.0, settlement.before.1, settlement.after.0, settlement.after.1
            ))
        }
        Command::Remove { group, description } => {
            if description.trim().is_empty() {
                return Err("please provide a description to remove".into());
            }
            let removed = ledger
                .remove_expense(&GroupId::new(group), &description)
                .await?;
            Ok(removed.to_string())
        }
        Command::Balances { group } => {
            let group = GroupId::new(group);
            if !ledger.is_initialized(&group).await {
                return Err(format!("group {group} not initialized, run `init` first").into());
            }
            let balances = ledger.balances(&group).await;
            let debts = ledger.net_debts(&group).await;
            Ok(render_balances(&balances, &debts))
        }
        Command::History { group, last } => {
            let expenses = ledger.expenses(&GroupId::new(group), Some(last)).await;
            Ok(render_history(&expenses))
        }
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_balances(balances: &Balances, debts: &[Debt]) -> String {
    if balances.values().all(|b| b.is_zero()) {
        return "All balances are settled!".to_string();
    }

    let mut out = String::from("Balances:\n");
    for (user, balance) in balances {
        let _ = writeln!(out, "  {user}: {balance}");
    }
    if debts.is_empty() {
        out.push_str("No net debts between individual users");
    } else {
        out.push_str("Net debts:");
        for debt in debts {
            let _ = write!(out, "\n  {debt}");
        }
    }
    out
}

fn render_history(expenses: &[Expense]) -> String {
    if expenses.is_empty() {
        return "No expenses recorded yet!".to_string();
    }

    let mut out = format!("Showing last {} expenses", expenses.len());
    for expense in expenses {
        let _ = write!(
            out,
            "\n#{} - {} ({})\n  Paid by {}\n  Split with: {}\n  {}",
            expense.id,
            expense.description,
            expense.amount,
            expense.payer_id,
            join(&expense.split_with),
            expense.timestamp.format("%m/%d %I:%M %p")
        );
    }
    out
}
