//! Wallet persistence layer
//!
//! Provides save/load functionality for a wallet and its treasury.

use crate::multisig::{MultisigWallet, WalletError, WalletState};
use crate::treasury::{Treasury, TreasuryBook};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Wallet error: {0}")]
    WalletError(#[from] WalletError),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub wallet_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".custody_data"),
            wallet_file: "wallet.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// On-disk form of a wallet and its treasury
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletDocument {
    pub wallet: WalletState,
    #[serde(default)]
    pub treasury: TreasuryBook,
    pub saved_at: DateTime<Utc>,
}

impl WalletDocument {
    /// Capture a wallet and treasury
    pub fn capture(wallet: &MultisigWallet, treasury: &Treasury) -> Self {
        Self {
            wallet: wallet.snapshot(),
            treasury: treasury.book(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuild the live wallet and treasury, re-checking wallet invariants
    pub fn open(self) -> Result<(MultisigWallet, Treasury), StorageError> {
        let wallet = MultisigWallet::restore(self.wallet)?;
        Ok((wallet, Treasury::from_book(self.treasury)))
    }
}

/// Wallet storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        if config.backup_enabled && config.max_backups == 0 {
            return Err(StorageError::InvalidData(
                "max_backups must be at least 1 when backups are enabled".to_string(),
            ));
        }
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Get the wallet file path
    fn wallet_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.wallet_file)
    }

    /// Get a backup file path
    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.wallet_file, index))
    }

    /// Save the document to disk
    pub fn save(&self, document: &WalletDocument) -> Result<(), StorageError> {
        let path = self.wallet_path();

        if self.config.backup_enabled && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("wallet.tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, document)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!("Saved wallet to {:?}", path);
        Ok(())
    }

    /// Load the document from disk
    pub fn load(&self) -> Result<WalletDocument, StorageError> {
        let path = self.wallet_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Wallet file not found".to_string(),
            ));
        }

        read_document(&path)
    }

    /// Check if a saved wallet exists
    pub fn exists(&self) -> bool {
        self.wallet_path().exists()
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                let next = self.backup_path(i + 1);
                fs::rename(&current, &next)?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<WalletDocument, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_document(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.wallet_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

fn read_document(path: &Path) -> Result<WalletDocument, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Save a document to a specific file path
pub fn save_to_file(document: &WalletDocument, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}

/// Load a document from a specific file path
pub fn load_from_file(path: &Path) -> Result<WalletDocument, StorageError> {
    read_document(path)
}
