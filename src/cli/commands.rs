//! CLI commands for the custody wallet
//!
//! Implements all command handlers for the CLI interface. Every mutating
//! command loads the wallet, runs one operation, and saves it back.

use crate::crypto::{Address, KeyPair};
use crate::multisig::{MultisigConfig, MultisigWallet, Transaction, TxId, WalletError};
use crate::storage::{load_from_file, save_to_file, Storage, StorageConfig, WalletDocument};
use crate::treasury::Treasury;
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub wallet: MultisigWallet,
    pub treasury: Treasury,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the wallet stored in `data_dir`
    pub fn load(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "No wallet found in {:?}. Create one with: custody init",
                data_dir
            )
            .into());
        }

        let (wallet, treasury) = storage.load()?.open()?;

        Ok(Self {
            wallet,
            treasury,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage
            .save(&WalletDocument::capture(&self.wallet, &self.treasury))?;
        Ok(())
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(storage_config)?)
}

/// Parse a comma-separated owner list
pub fn parse_owners(list: &str) -> CliResult<Vec<Address>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| -> CliResult<Address> {
            s.parse().map_err(|e| format!("{}: {}", s, e).into())
        })
        .collect()
}

/// Decode optional hex call data (an optional `0x` prefix is accepted)
pub fn parse_payload(data: Option<&str>) -> CliResult<Vec<u8>> {
    match data {
        None => Ok(Vec::new()),
        Some(hex_data) => {
            let trimmed = hex_data.trim();
            let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
            Ok(hex::decode(digits)?)
        }
    }
}

/// The caller authenticated by a private key
pub fn caller_from_key(private_key: &str) -> CliResult<Address> {
    Ok(KeyPair::from_private_key_hex(private_key)?.address())
}

/// Generate a new owner key
pub fn cmd_keygen() -> CliResult<()> {
    let key_pair = KeyPair::generate();

    println!("🔐 New owner key generated!");
    println!("   📍 Address: {}", key_pair.address());
    println!("   🔑 Public Key: {}", key_pair.public_key_hex());
    println!("   🗝️  Private Key: {}", key_pair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: Store the private key safely.");
    println!("   It is the only way to act as this owner.");

    Ok(())
}

/// Read a wallet configuration from a JSON file
pub fn load_config(path: &Path) -> CliResult<MultisigConfig> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Create a new wallet
pub fn cmd_init(data_dir: &Path, config: MultisigConfig, force: bool) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Wallet already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (the previous wallet is kept as backup 0)");
        return Ok(());
    }

    let wallet = MultisigWallet::from_config(config)?;
    let treasury = Treasury::new();
    storage.save(&WalletDocument::capture(&wallet, &treasury))?;

    println!("✅ Wallet initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🔧 Policy: {}", wallet.description());
    if let Some(label) = wallet.label() {
        println!("   🏷️  Label: {}", label);
    }
    print_owners(&wallet);

    Ok(())
}

/// Deposit funds into the treasury
pub fn cmd_deposit(state: &mut AppState, from: &str, amount: u64) -> CliResult<()> {
    let sender: Address = from.parse()?;
    let balance = state.treasury.deposit(sender, amount)?;
    state.save()?;

    println!("💰 Deposited {} from {}", amount, sender);
    println!("   Holdings: {}", balance);

    Ok(())
}

/// Propose a new transaction
pub fn cmd_submit(
    state: &mut AppState,
    key: &str,
    to: &str,
    value: u64,
    data: Option<&str>,
) -> CliResult<()> {
    let caller = caller_from_key(key)?;
    let target: Address = to.parse()?;
    let payload = parse_payload(data)?;

    let tx_id = state.wallet.submit(&caller, target, value, payload)?;
    state.save()?;

    println!("📤 Transaction {} submitted", tx_id);
    println!("   To: {}", target);
    println!("   Value: {}", value);
    println!(
        "   Needs {} confirmation(s) to execute",
        state.wallet.threshold()
    );

    Ok(())
}

/// Confirm a transaction
pub fn cmd_confirm(state: &mut AppState, key: &str, tx_id: TxId) -> CliResult<()> {
    let caller = caller_from_key(key)?;
    state.wallet.confirm(&caller, tx_id)?;
    state.save()?;

    let tx = state.wallet.transaction(tx_id)?;
    println!("✍️  Transaction {} confirmed by {}", tx_id, caller);
    println!(
        "   Confirmations: {}/{}",
        tx.confirmation_count,
        state.wallet.threshold()
    );
    if state.wallet.can_execute(tx_id)? {
        println!("   ✅ Ready to execute");
    }

    Ok(())
}

/// Revoke a confirmation
pub fn cmd_revoke(state: &mut AppState, key: &str, tx_id: TxId) -> CliResult<()> {
    let caller = caller_from_key(key)?;
    state.wallet.revoke(&caller, tx_id)?;
    state.save()?;

    let tx = state.wallet.transaction(tx_id)?;
    println!("↩️  Confirmation on transaction {} revoked by {}", tx_id, caller);
    println!(
        "   Confirmations: {}/{}",
        tx.confirmation_count,
        state.wallet.threshold()
    );

    Ok(())
}

/// Execute a confirmed transaction through the treasury
pub fn cmd_execute(state: &mut AppState, key: &str, tx_id: TxId) -> CliResult<()> {
    let caller = caller_from_key(key)?;
    let result = state.wallet.execute(&caller, tx_id, &state.treasury);

    // A failed action still consumes the transaction
    if matches!(result, Ok(()) | Err(WalletError::ExecutionFailed { .. })) {
        state.save()?;
    }
    result?;

    let tx = state.wallet.transaction(tx_id)?;
    println!("🚀 Transaction {} executed", tx_id);
    println!("   Sent {} to {}", tx.value, tx.target);
    println!("   Holdings: {}", state.treasury.holdings());

    Ok(())
}

/// Display wallet info
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let transactions = state.wallet.transactions();
    let pending = transactions.iter().filter(|tx| !tx.executed).count();
    let stats = state.storage.stats()?;

    println!("🏦 Wallet Info");
    if let Some(label) = state.wallet.label() {
        println!("   ├─ Label: {}", label);
    }
    println!("   ├─ Policy: {}", state.wallet.description());
    println!("   ├─ Transactions: {}", transactions.len());
    println!("   ├─ Pending: {}", pending);
    println!("   ├─ Holdings: {}", state.treasury.holdings());
    println!("   ├─ Events: {}", state.wallet.events().len());
    println!(
        "   └─ Storage: {} bytes, {} backup(s)",
        stats.file_size, stats.backup_count
    );

    Ok(())
}

/// List owners
pub fn cmd_owners(state: &AppState) -> CliResult<()> {
    print_owners(&state.wallet);
    Ok(())
}

fn print_owners(wallet: &MultisigWallet) {
    println!("👥 Owners ({}):", wallet.description());
    for (i, owner) in wallet.owners().iter().enumerate() {
        println!("   {}. {}", i + 1, owner);
    }
}

/// Show one transaction
pub fn cmd_tx_show(state: &AppState, tx_id: TxId) -> CliResult<()> {
    let tx = state.wallet.transaction(tx_id)?;
    let confirmers = state.wallet.confirmers(tx_id)?;

    println!("📄 Transaction {}", tx.id);
    println!("   ├─ Status: {}", status_label(&tx));
    println!("   ├─ To: {}", tx.target);
    println!("   ├─ Value: {}", tx.value);
    println!("   ├─ Data: 0x{}", hex::encode(&tx.payload));
    println!("   ├─ Submitted by: {}", tx.submitted_by);
    println!(
        "   ├─ Submitted at: {}",
        tx.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(at) = tx.executed_at {
        println!("   ├─ Executed at: {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
    println!(
        "   └─ Confirmations: {}/{}",
        tx.confirmation_count,
        state.wallet.threshold()
    );
    for owner in confirmers {
        println!("      └─ {}", owner);
    }

    Ok(())
}

/// List transactions
pub fn cmd_tx_list(state: &AppState, pending_only: bool) -> CliResult<()> {
    let transactions = if pending_only {
        state.wallet.pending()
    } else {
        state.wallet.transactions()
    };

    if transactions.is_empty() {
        println!("📭 No transactions found.");
        return Ok(());
    }

    println!("📋 Transactions:");
    for tx in &transactions {
        println!(
            "   #{} | {} | {} → {} | {}/{}",
            tx.id,
            status_label(tx),
            tx.value,
            tx.target.short(),
            tx.confirmation_count,
            state.wallet.threshold()
        );
    }

    Ok(())
}

fn status_label(tx: &Transaction) -> &'static str {
    if tx.executed {
        "executed"
    } else {
        "pending"
    }
}

/// Show the event journal
pub fn cmd_events(state: &AppState, limit: usize) -> CliResult<()> {
    let events = state.wallet.events();
    let skip = events.len().saturating_sub(limit);

    println!("📜 Events ({} total):", events.len());
    for record in events.iter().skip(skip) {
        println!(
            "   [{}] {} {}",
            record.sequence,
            record.emitted_at.format("%Y-%m-%d %H:%M:%S"),
            record.event
        );
    }

    Ok(())
}

/// Export wallet to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    save_to_file(&WalletDocument::capture(&state.wallet, &state.treasury), path)?;
    println!("📦 Wallet exported to {:?}", path);
    Ok(())
}

/// Import wallet from file
pub fn cmd_import(data_dir: &Path, path: &Path) -> CliResult<()> {
    let document = load_from_file(path)?;
    // Rejects documents whose confirmations do not add up
    let (wallet, treasury) = document.open()?;

    let storage = open_storage(data_dir)?;
    storage.save(&WalletDocument::capture(&wallet, &treasury))?;

    println!("📥 Wallet imported from {:?}", path);
    println!("   Policy: {}", wallet.description());
    println!("   Transactions: {}", wallet.transaction_count());

    Ok(())
}
