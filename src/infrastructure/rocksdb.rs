use crate::domain::payment::{NewPayment, PaymentDetails, PaymentRecord};
use crate::domain::ports::PaymentStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch, WriteOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task::JoinError;

/// Column Family for committed payment records.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for bookkeeping such as the id sequence.
pub const CF_META: &str = "meta";

const NEXT_ID_KEY: &[u8] = b"payments.next_id";

/// A persistent payment store backed by RocksDB.
///
/// A commit writes the record and the advanced id sequence in one
/// `WriteBatch` with a synced WAL, so either both land or neither does.
/// `Clone` shares the underlying `Arc<DB>`. RocksDB calls block, so the port
/// methods run them on tokio's blocking pool.
#[derive(Clone)]
pub struct RocksDBPaymentStore {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDBPaymentStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("payments" and "meta") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_meta])?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn next_id(&self) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, NEXT_ID_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    PaymentError::InternalError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "corrupt payment id sequence",
                    )))
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(1),
        }
    }

    fn read(&self, payment_id: u64) -> Result<Option<PaymentRecord>> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self.db.get_cf(cf, payment_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_record(&self, payment: NewPayment) -> Result<PaymentRecord> {
        let _guard = self.commit_lock.lock().map_err(|_| {
            PaymentError::InternalError(Box::new(std::io::Error::other(
                "payment commit lock poisoned",
            )))
        })?;

        let id = self.next_id()?;
        let next_id = id.checked_add(1).ok_or_else(|| {
            PaymentError::ConstraintViolation("payment id sequence exhausted".to_string())
        })?;
        let record = payment.into_record(id);
        let value = serde_json::to_vec(&record)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_PAYMENTS)?, id.to_be_bytes(), value);
        batch.put_cf(self.cf(CF_META)?, NEXT_ID_KEY, next_id.to_be_bytes());

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db.write_opt(batch, &write_opts)?;

        Ok(record)
    }
}

fn join_error(error: JoinError) -> PaymentError {
    PaymentError::InternalError(Box::new(error))
}

#[async_trait]
impl PaymentStore for RocksDBPaymentStore {
    async fn commit(&self, payment: NewPayment) -> Result<PaymentRecord> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.write_record(payment))
            .await
            .map_err(join_error)?
    }

    async fn fetch_details(&self, payment_id: u64) -> Result<PaymentDetails> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.read(payment_id))
            .await
            .map_err(join_error)??
            .map(|record| record.details())
            .ok_or(PaymentError::NotFound(payment_id))
    }
}
