use std::env;

use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wallet_eng::csv::{read_operations, write_transactions};
use wallet_eng::{Currency, FixedRates, MemoryLedger, PriorityTable, Wallet};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let path = env::args()
        .nth(1)
        .expect("usage: wallet-eng <operations.csv>");

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let rates = FixedRates::new([
        (Currency::Usd, 1.0),
        (Currency::Eur, 1.1),
        (Currency::Gbp, 0.8),
    ]);
    let mut wallet = Wallet::new(MemoryLedger::new(), rates, PriorityTable::default());

    let (op_sender, op_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in read_operations(&path) {
            match result {
                Ok(op) => {
                    op_sender.send(op).await.unwrap();
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    wallet.run(ReceiverStream::new(op_receiver)).await;

    write_transactions(&wallet.transactions());
}
