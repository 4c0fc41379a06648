//! CSV Batch Reader

use crate::record::{Transaction, ID_FIELD};
use crate::TransactionError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reads transactions from a CSV source.
///
/// The header row names the fields. An `id` column (any case) becomes the
/// transaction identifier, empty cells are skipped, and every other cell must
/// be numeric. A bad cell fails only its own row.
pub struct TransactionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl TransactionReader<File> {
    /// Open a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TransactionError> {
        let file = File::open(path.as_ref())?;
        debug!("Reading transactions from {}", path.as_ref().display());
        Ok(Self::new(file))
    }
}

impl<R: Read> TransactionReader<R> {
    /// Creates a new `TransactionReader` from any `Read` source.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads rows as transactions.
    ///
    /// Fails up front only if the header row cannot be read.
    pub fn transactions(
        mut self,
    ) -> Result<impl Iterator<Item = Result<Transaction, TransactionError>>, TransactionError> {
        let headers = self.reader.headers()?.clone();

        Ok(self.reader.into_records().map(move |row| {
            let row = row?;
            let mut transaction = Transaction::new();

            for (name, cell) in headers.iter().zip(row.iter()) {
                if cell.is_empty() {
                    continue;
                }
                if name.eq_ignore_ascii_case(ID_FIELD) {
                    transaction = transaction.with_id(cell);
                    continue;
                }
                let value = cell.parse::<f64>().map_err(|_| TransactionError::NonNumeric {
                    field: name.to_string(),
                    value: cell.to_string(),
                })?;
                transaction = transaction.with_field(name, value);
            }

            Ok(transaction)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = "id, Amount, V2, V14\ntx-1, 120.0, 3.6, -1.2\ntx-2, 5.0, , 0.4";
        let reader = TransactionReader::new(data.as_bytes());
        let results: Vec<_> = reader.transactions().unwrap().collect();

        assert_eq!(results.len(), 2);
        let tx1 = results[0].as_ref().unwrap();
        assert_eq!(tx1.id(), Some("tx-1"));
        assert_eq!(tx1.amount(), Some(120.0));
        assert_eq!(tx1.get("V2"), Some(3.6));

        let tx2 = results[1].as_ref().unwrap();
        assert!(!tx2.contains("V2"));
        assert_eq!(tx2.get("V14"), Some(0.4));
    }

    #[test]
    fn test_reader_malformed_cell_fails_only_its_row() {
        let data = "Amount, V2\nabc, 1.0\n10.0, 2.0";
        let reader = TransactionReader::new(data.as_bytes());
        let results: Vec<_> = reader.transactions().unwrap().collect();

        assert!(matches!(results[0], Err(TransactionError::NonNumeric { .. })));
        assert_eq!(results[1].as_ref().unwrap().amount(), Some(10.0));
    }

    #[test]
    fn test_reader_short_row() {
        let data = "Amount, V2, V3\n10.0";
        let reader = TransactionReader::new(data.as_bytes());
        let results: Vec<_> = reader.transactions().unwrap().collect();

        let tx = results[0].as_ref().unwrap();
        assert_eq!(tx.len(), 1);
    }
}
