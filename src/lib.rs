pub mod amount;
pub mod csv;
pub mod model;
pub mod rates;
pub mod store;
pub mod wallet;

pub use amount::Amount;
pub use model::{Currency, PriorityTable, Source, Transaction, TxId, TxKind, WalletOp};
pub use rates::{FixedRates, RateProvider, RateTable};
pub use store::{LedgerStore, MemoryLedger};
pub use wallet::Wallet;
