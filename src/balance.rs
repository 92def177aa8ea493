//! Durable per-participant balance, stored as a single two-decimal text line.
//!
//! Grounded on the durability discipline in `wal.rs` (flush, then fsync) but
//! the representation is a flat scalar file rather than a log: the whole
//! file is the current value, replaced on every write.

use crate::error::{TpcError, TpcResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct BalanceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl BalanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BalanceStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns 0.0 when the file is absent (first boot), per the choice
    /// recorded for the "missing balance file" open question.
    pub fn read(&self) -> TpcResult<f64> {
        let _guard = self.lock.lock().unwrap();
        self.read_locked()
    }

    fn read_locked(&self) -> TpcResult<f64> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents
                .trim()
                .parse::<f64>()
                .map_err(|_| TpcError::MissingBalanceFile),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0.0),
            Err(e) => Err(TpcError::Io(e)),
        }
    }

    /// Replaces the file contents in full via a temp-file-then-rename, which
    /// closes the write-window race the reference design accepted.
    pub fn write(&self, value: f64) -> TpcResult<()> {
        let _guard = self.lock.lock().unwrap();
        self.write_locked(value)
    }

    fn write_locked(&self, value: f64) -> TpcResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = tmp_path_for(&self.path);
        fs::write(&tmp_path, format!("{:.2}", value))?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Local, uncoordinated deposit: requires `amount >= 0`.
    pub fn deposit(&self, amount: f64) -> TpcResult<f64> {
        if amount < 0.0 {
            return Err(TpcError::NegativeAmount);
        }
        let _guard = self.lock.lock().unwrap();
        let new_balance = self.read_locked()? + amount;
        self.write_locked(new_balance)?;
        Ok(new_balance)
    }

    /// Local, uncoordinated withdrawal: requires `amount > 0` and
    /// `balance - amount >= 0`.
    pub fn withdraw(&self, amount: f64) -> TpcResult<f64> {
        if amount <= 0.0 {
            return Err(TpcError::NonPositiveAmount);
        }
        let _guard = self.lock.lock().unwrap();
        let balance = self.read_locked()?;
        if balance - amount < 0.0 {
            return Err(TpcError::InsufficientFunds { balance, amount });
        }
        let new_balance = balance - amount;
        self.write_locked(new_balance)?;
        Ok(new_balance)
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> BalanceStore {
        BalanceStore::new(dir.path().join("Participant-A.data"))
    }

    #[test]
    fn missing_file_reads_as_zero() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store(&dir).read().unwrap(), 0.0);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.write(123.456).unwrap();
        assert_eq!(s.read().unwrap(), 123.46);
    }

    #[test]
    fn deposit_requires_non_negative_amount() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            store(&dir).deposit(-1.0),
            Err(TpcError::NegativeAmount)
        ));
    }

    #[test]
    fn withdraw_rejects_insufficient_funds() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.deposit(10.0).unwrap();
        assert!(matches!(
            s.withdraw(20.0),
            Err(TpcError::InsufficientFunds { .. })
        ));
        assert_eq!(s.read().unwrap(), 10.0);
    }

    #[test]
    fn withdraw_to_exactly_zero_is_allowed() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.deposit(10.0).unwrap();
        assert_eq!(s.withdraw(10.0).unwrap(), 0.0);
    }
}
