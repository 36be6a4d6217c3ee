use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use ledger_rs::{
    BudgetForm, LedgerForm, PasswordHash, Transaction, TransactionType, ValidatedPassword,
    create_ledger, create_transaction, create_user, initialize_db, upsert_budget,
};

/// A utility for creating a test database for the REST API server of ledger_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user 'test' with the password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("test", password_hash, &conn)?;

    // SHA-256 of "legacy", upgraded to bcrypt on first log in.
    println!("Creating user 'legacy' with an unsalted password hash...");
    create_user(
        "legacy",
        PasswordHash::new_unchecked(
            "c49fea7425fa7f8699897a97c159c6690267d9003bb78c53fafa8fc15c325d84",
        ),
        &conn,
    )?;

    let now = OffsetDateTime::now_utc();
    let now = PrimitiveDateTime::new(now.date(), now.time().replace_nanosecond(0)?);
    let this_month = format!("{:04}-{:02}", now.year(), u8::from(now.month()));

    println!("Creating transactions...");
    let transactions = [
        (4200.0, TransactionType::Income, "Salary", Some("Monthly pay"), 20),
        (1500.0, TransactionType::Expense, "Housing", Some("Rent"), 18),
        (86.5, TransactionType::Expense, "Food", Some("Groceries"), 9),
        (23.0, TransactionType::Expense, "Food", None, 3),
        (45.2, TransactionType::Expense, "Transport", Some("Fuel"), 2),
        (300.0, TransactionType::Income, "Part-time", None, 1),
    ];
    for (amount, transaction_type, category, description, days_ago) in transactions {
        create_transaction(
            user.id,
            Transaction::build(amount, transaction_type, category)
                .description(description)
                .date(now - Duration::days(days_ago)),
            now,
            &conn,
        )?;
    }

    println!("Creating ledgers...");
    for (name, description) in [("Household", Some("Shared expenses")), ("Travel", None)] {
        create_ledger(
            user.id,
            LedgerForm {
                name: name.to_owned(),
                description: description.map(str::to_owned),
            },
            now,
            &conn,
        )?;
    }

    println!("Creating budgets for {this_month}...");
    for (category, amount) in [(None, 3000.0), (Some("Food"), 400.0)] {
        upsert_budget(
            user.id,
            BudgetForm {
                amount,
                category: category.map(str::to_owned),
                month: this_month.clone(),
            },
            now,
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
