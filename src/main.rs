//! Quorum-Wallet CLI
//!
//! A command-line wrapper around the wallet engine: create a wallet,
//! propose transactions, sign digests off-line, and submit confirmations.
//! All authorization logic lives in the library; this binary only parses
//! arguments, calls into the engine, and prints results.

use clap::{Parser, Subcommand};
use quorum_wallet::crypto::KeyPair;
use quorum_wallet::storage::{Storage, StorageConfig};
use quorum_wallet::wallet::{AccountBook, TxKind, Wallet};
use quorum_wallet::Address;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "quorum-wallet")]
#[command(version = "0.1.0")]
#[command(about = "A threshold-gated multisig wallet", long_about = None)]
struct Cli {
    /// Data directory for the wallet snapshot
    #[arg(short, long, default_value = ".quorum_wallet")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate key pairs for prospective signers
    Keygen {
        /// Number of key pairs to generate
        #[arg(short, long, default_value = "1")]
        count: u32,
    },

    /// Initialize a new wallet
    Init {
        /// Signer addresses (Base58Check)
        #[arg(short, long, num_args = 1.., required = true)]
        signers: Vec<Address>,

        /// Confirmation threshold (k of n)
        #[arg(short, long)]
        threshold: usize,

        /// Network identity mixed into every digest
        #[arg(short, long, default_value = "1")]
        chain_id: u64,
    },

    /// Credit value to the wallet
    Deposit {
        /// Sender address
        #[arg(short, long)]
        sender: Address,

        /// Amount to deposit
        #[arg(short, long)]
        amount: u64,
    },

    /// Propose a value transfer or call
    Propose {
        /// Proposer address (need not be a signer)
        #[arg(long)]
        sender: Address,

        /// Call target
        #[arg(long)]
        target: Address,

        /// Value to transfer
        #[arg(long, default_value = "0")]
        value: u64,

        /// Hex-encoded call payload
        #[arg(long, default_value = "")]
        payload: String,
    },

    /// Propose adding a signer
    ProposeAddSigner {
        /// Proposer address
        #[arg(long)]
        sender: Address,

        /// Address to add to the signer set
        #[arg(long)]
        signer: Address,
    },

    /// Propose removing a signer
    ProposeRemoveSigner {
        /// Proposer address
        #[arg(long)]
        sender: Address,

        /// Address to remove from the signer set
        #[arg(long)]
        signer: Address,
    },

    /// Print the digest a signer must sign for a transaction
    Digest {
        /// Transaction id
        id: u64,
    },

    /// Sign a transaction digest with a private key (local helper)
    Sign {
        /// Transaction id
        id: u64,

        /// Hex-encoded private key
        #[arg(short, long)]
        key: String,
    },

    /// Submit a signer's confirmation.
    ///
    /// External calls run against a fresh in-memory account book, so only
    /// the wallet's own balance and state survive across invocations;
    /// payee-side credits are not persisted.
    Confirm {
        /// Transaction id
        id: u64,

        /// Confirming signer address
        #[arg(long)]
        signer: Address,

        /// Hex-encoded 65-byte signature over the digest
        #[arg(long)]
        signature: String,

        /// Hex-encoded digest the signature covers
        #[arg(long)]
        digest: String,
    },

    /// Cancel a pending transaction
    Cancel {
        /// Transaction id
        id: u64,

        /// Cancelling signer address
        #[arg(long)]
        signer: Address,
    },

    /// Show the full record of a transaction
    Show {
        /// Transaction id
        id: u64,
    },

    /// List pending transaction ids
    Pending,

    /// List current signers
    Signers,

    /// Show wallet summary
    Status,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::new(StorageConfig {
        data_dir: cli.data_dir,
        ..StorageConfig::default()
    })?;

    match cli.command {
        Commands::Keygen { count } => {
            for _ in 0..count {
                let kp = KeyPair::generate();
                println!("Address:     {}", kp.address());
                println!("Public key:  {}", kp.public_key_hex());
                println!("Private key: {}", kp.private_key_hex());
                println!();
            }
        }

        Commands::Init {
            signers,
            threshold,
            chain_id,
        } => {
            if storage.exists() {
                return Err("Wallet already initialized in this data directory".into());
            }
            let wallet = Wallet::new(&signers, threshold, chain_id)?;
            println!(
                "Initialized {}-of-{} wallet {}",
                threshold,
                signers.len(),
                wallet.address()
            );
            storage.save(&wallet)?;
        }

        Commands::Deposit { sender, amount } => {
            let mut wallet = storage.load()?;
            wallet.deposit(sender, amount);
            println!("Balance: {}", wallet.balance());
            storage.save(&wallet)?;
        }

        Commands::Propose {
            sender,
            target,
            value,
            payload,
        } => {
            let mut wallet = storage.load()?;
            let payload = hex::decode(&payload)?;
            let id = wallet.propose(sender, target, value, payload, TxKind::Normal);
            println!("Transaction id: {}", id);
            println!("Digest: {}", hex::encode(wallet.digest_of(id).unwrap()));
            storage.save(&wallet)?;
        }

        Commands::ProposeAddSigner { sender, signer } => {
            let mut wallet = storage.load()?;
            let id = wallet.propose(
                sender,
                wallet.address(),
                0,
                signer.as_bytes().to_vec(),
                TxKind::AddSigner,
            );
            println!("Transaction id: {}", id);
            println!("Digest: {}", hex::encode(wallet.digest_of(id).unwrap()));
            storage.save(&wallet)?;
        }

        Commands::ProposeRemoveSigner { sender, signer } => {
            let mut wallet = storage.load()?;
            let id = wallet.propose(
                sender,
                wallet.address(),
                0,
                signer.as_bytes().to_vec(),
                TxKind::RemoveSigner,
            );
            println!("Transaction id: {}", id);
            println!("Digest: {}", hex::encode(wallet.digest_of(id).unwrap()));
            storage.save(&wallet)?;
        }

        Commands::Digest { id } => {
            let wallet = storage.load()?;
            let digest = wallet
                .digest_of(id)
                .ok_or_else(|| format!("Unknown transaction id: {}", id))?;
            println!("{}", hex::encode(digest));
        }

        Commands::Sign { id, key } => {
            let wallet = storage.load()?;
            let digest = wallet
                .digest_of(id)
                .ok_or_else(|| format!("Unknown transaction id: {}", id))?;
            let kp = KeyPair::from_private_key_hex(&key)?;
            let signature = kp.sign(&digest)?;
            println!("Signer:    {}", kp.address());
            println!("Digest:    {}", hex::encode(digest));
            println!("Signature: {}", hex::encode(signature));
        }

        Commands::Confirm {
            id,
            signer,
            signature,
            digest,
        } => {
            let mut wallet = storage.load()?;
            let signature = hex::decode(&signature)?;
            let digest_bytes = hex::decode(&digest)?;
            let digest: [u8; 32] = digest_bytes
                .try_into()
                .map_err(|_| "Digest must be 32 bytes")?;

            let mut host = AccountBook::new();
            let state = wallet.confirm(signer, id, &signature, &digest, &mut host)?;
            let confirmations = wallet
                .transaction(id)
                .map(|tx| tx.confirmation_count())
                .unwrap_or(0);
            println!(
                "Confirmed ({}/{}), state: {:?}",
                confirmations,
                wallet.threshold(),
                state
            );
            storage.save(&wallet)?;
        }

        Commands::Cancel { id, signer } => {
            let mut wallet = storage.load()?;
            wallet.cancel(signer, id)?;
            println!("Transaction {} cancelled", id);
            storage.save(&wallet)?;
        }

        Commands::Show { id } => {
            let wallet = storage.load()?;
            let tx = wallet
                .transaction(id)
                .ok_or_else(|| format!("Unknown transaction id: {}", id))?;
            println!("{}", serde_json::to_string_pretty(tx)?);
        }

        Commands::Pending => {
            let wallet = storage.load()?;
            for id in wallet.pending_ids() {
                println!("{}", id);
            }
        }

        Commands::Signers => {
            let wallet = storage.load()?;
            for signer in wallet.signers() {
                println!("{}", signer);
            }
        }

        Commands::Status => {
            let wallet = storage.load()?;
            println!("Address:      {}", wallet.address());
            println!(
                "Signers:      {}-of-{}",
                wallet.threshold(),
                wallet.signer_count()
            );
            println!("Balance:      {}", wallet.balance());
            println!("Nonce:        {}", wallet.nonce());
            println!("Transactions: {}", wallet.transaction_count());
            println!("Pending:      {}", wallet.pending_ids().len());
        }
    }

    Ok(())
}
