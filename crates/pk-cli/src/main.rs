//! One-shot vault administration: initialise a vault, rotate the master
//! password, and manage entries from the terminal. Secrets are prompted,
//! never taken from argv.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use pk_core::hibp::HibpClient;
use pk_core::Service;

#[derive(Parser, Debug)]
#[command(author, version, about = "Passkeep vault administration", long_about = None)]
struct Cli {
    /// Vault directory (holds header.json and vault.db).
    #[arg(long, default_value = "./vault")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialise a new vault with a master password.
    Init {
        /// Label recorded in the vault header.
        #[arg(long)]
        user: String,
    },
    /// Re-derive the vault key under a new master password.
    ChangeMaster,
    /// Add a credential entry.
    Add {
        #[arg(long)]
        site: String,
        #[arg(long)]
        username: String,
    },
    /// Print the password for an entry.
    Get {
        #[arg(long)]
        site: String,
        #[arg(long)]
        username: String,
    },
    /// List entries (metadata only).
    List,
    /// Delete an entry.
    Delete {
        #[arg(long)]
        site: String,
        #[arg(long)]
        username: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { user } => init(cli.dir, &user),
        Commands::ChangeMaster => change_master(cli.dir),
        Commands::Add { site, username } => add(cli.dir, &site, &username),
        Commands::Get { site, username } => get(cli.dir, &site, &username),
        Commands::List => list(cli.dir),
        Commands::Delete { site, username } => delete(cli.dir, &site, &username),
    }
}

fn init(dir: PathBuf, user: &str) -> Result<()> {
    let mut svc = Service::open(&dir)?.with_breach(Box::new(HibpClient::new()));
    if !svc.needs_master_setup()? {
        return Err(anyhow!("vault already initialised at {}", dir.display()));
    }

    let master = prompt_new_password("Master password")?;
    svc.set_master(user, &master)
        .context("master password rejected")?;
    println!("Vault initialised at {}", dir.display());
    Ok(())
}

fn change_master(dir: PathBuf) -> Result<()> {
    let mut svc = Service::open(&dir)?.with_breach(Box::new(HibpClient::new()));
    let old = rpassword::prompt_password("Current master password: ")?;
    let new = prompt_new_password("New master password")?;
    svc.change_master(&old, &new)
        .context("master password change failed")?;
    println!("Master password changed.");
    Ok(())
}

fn add(dir: PathBuf, site: &str, username: &str) -> Result<()> {
    let svc = unlocked(dir)?;
    let password = rpassword::prompt_password(format!("Password for {username}@{site}: "))?;
    let id = svc.add(site, username, &password)?;
    println!("Saved entry {id}.");
    Ok(())
}

fn get(dir: PathBuf, site: &str, username: &str) -> Result<()> {
    let svc = unlocked(dir)?;
    let password = svc.get(site, username)?;
    println!("{}", password.as_str());
    Ok(())
}

fn list(dir: PathBuf) -> Result<()> {
    let svc = unlocked(dir)?;
    for entry in svc.list()? {
        println!("{}\t{}\t{}", entry.id, entry.website, entry.username);
    }
    Ok(())
}

fn delete(dir: PathBuf, site: &str, username: &str) -> Result<()> {
    let svc = unlocked(dir)?;
    svc.delete(site, username)?;
    println!("Deleted {username}@{site}.");
    Ok(())
}

fn unlocked(dir: PathBuf) -> Result<Service> {
    let mut svc = Service::open(&dir)?;
    let master = rpassword::prompt_password("Master password: ")?;
    svc.unlock(&master).context("unlock failed")?;
    Ok(svc)
}

fn prompt_new_password(label: &str) -> Result<String> {
    let first = rpassword::prompt_password(format!("{label}: "))?;
    let confirm = rpassword::prompt_password(format!("{label} (confirm): "))?;
    if first != confirm {
        return Err(anyhow!("passwords do not match"));
    }
    Ok(first)
}
