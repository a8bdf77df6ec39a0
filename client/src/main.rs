mod fixtures;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::sleep;

use fixtures::{AccountFixture, FixtureSide, OrderFixture};
use proto::account_service_client::AccountServiceClient;
use proto::market_service_client::MarketServiceClient;
use proto::{
    Account, GetAccountRequest, Order, RegisterAccountRequest, RegisterOrderRequest, Side,
    SubscribeTransactionsRequest,
};
use tonic::transport::Channel;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "http://127.0.0.1:50051")]
    server: String,

    /// Accounts fixture: balance,holdings
    #[arg(short, long, default_value = "accounts.csv")]
    accounts: PathBuf,

    /// Orders fixture: delay,account_index,price,quantity,expiration,side
    #[arg(short, long, default_value = "orders.csv")]
    orders: PathBuf,

    /// Milliseconds per delay unit in the orders fixture
    #[arg(short, long, default_value = "100")]
    delay_unit_ms: u64,

    /// Seconds to wait for the last orders to clear before printing accounts
    #[arg(long, default_value = "3")]
    settle_secs: u64,
}

async fn register_accounts(
    client: &mut AccountServiceClient<Channel>,
    fixtures: &[AccountFixture],
) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(fixtures.len());
    for (i, fixture) in fixtures.iter().enumerate() {
        let reply = client
            .register_account(RegisterAccountRequest {
                account: Some(Account {
                    id: String::new(),
                    balance: fixture.balance,
                    holdings: fixture.holdings,
                }),
            })
            .await
            .with_context(|| format!("error registering account on row {}", i + 2))?;
        ids.push(reply.into_inner().account_id);
    }
    Ok(ids)
}

fn to_order(fixture: &OrderFixture, account_ids: &[String]) -> Result<Order> {
    let account_id = account_ids
        .get(fixture.account_index)
        .with_context(|| format!("no account at index {}", fixture.account_index))?;
    let side = match fixture.side {
        FixtureSide::Bid => Side::Bid,
        FixtureSide::Ask => Side::Ask,
    };
    Ok(Order {
        id: String::new(),
        account_id: account_id.clone(),
        side: side as i32,
        price: fixture.price,
        quantity: fixture.quantity,
        expiration: fixture.expiration,
    })
}

/// Pause before submitting `fixture`, in units of `delay_unit_ms`
fn submit_delay(fixture: &OrderFixture, delay_unit_ms: u64) -> Result<Duration> {
    let millis = fixture
        .delay
        .checked_mul(delay_unit_ms)
        .with_context(|| format!("delay {} x {}ms overflows", fixture.delay, delay_unit_ms))?;
    Ok(Duration::from_millis(millis))
}

async fn watch_transactions(mut client: MarketServiceClient<Channel>) {
    let mut stream = match client
        .subscribe_transactions(SubscribeTransactionsRequest {})
        .await
    {
        Ok(response) => response.into_inner(),
        Err(e) => {
            log::error!("error watching transactions: {}", e);
            return;
        }
    };
    loop {
        match stream.message().await {
            Ok(Some(t)) => log::info!(
                "tick {}: {} bought {} from {} at {}",
                t.tick,
                t.buyer_account_id,
                t.quantity,
                t.seller_account_id,
                t.price
            ),
            Ok(None) => return,
            Err(e) => {
                log::error!("error watching transactions: {}", e);
                return;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let account_fixtures = fixtures::load_accounts(&args.accounts)?;
    let order_fixtures = fixtures::load_orders(&args.orders)?;

    let mut accounts = AccountServiceClient::connect(args.server.clone())
        .await
        .with_context(|| format!("failed to dial {}", args.server))?;
    let mut market = MarketServiceClient::connect(args.server.clone())
        .await
        .with_context(|| format!("failed to dial {}", args.server))?;

    let account_ids = register_accounts(&mut accounts, &account_fixtures).await?;
    log::info!("registered {} accounts", account_ids.len());

    let watcher = tokio::spawn(watch_transactions(market.clone()));

    for (i, fixture) in order_fixtures.iter().enumerate() {
        let order = to_order(fixture, &account_ids)
            .with_context(|| format!("error building order on row {}", i + 2))?;
        let delay = submit_delay(fixture, args.delay_unit_ms)
            .with_context(|| format!("error scheduling order on row {}", i + 2))?;
        sleep(delay).await;
        let reply = market
            .register_order(RegisterOrderRequest { order: Some(order) })
            .await
            .with_context(|| format!("error putting order on row {}", i + 2))?;
        log::debug!("row {}: order {}", i + 2, reply.into_inner().order_id);
    }
    log::info!("submitted {} orders", order_fixtures.len());

    sleep(Duration::from_secs(args.settle_secs)).await;
    watcher.abort();

    println!("\nAccounts:");
    for account_id in &account_ids {
        let account = accounts
            .get_account(GetAccountRequest {
                account_id: account_id.clone(),
            })
            .await
            .with_context(|| format!("error fetching account {}", account_id))?
            .into_inner()
            .account
            .unwrap_or_default();
        println!(
            "{}: balance {} holdings {}",
            account.id, account.balance, account.holdings
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_fixture_maps_account_index_and_side() {
        let ids = vec!["a0".to_string(), "a1".to_string()];
        let fixture = OrderFixture {
            delay: 0,
            account_index: 1,
            price: 100,
            quantity: 10,
            expiration: 4,
            side: FixtureSide::Ask,
        };
        let order = to_order(&fixture, &ids).unwrap();
        assert_eq!(order.account_id, "a1");
        assert_eq!(order.side, Side::Ask as i32);
        assert_eq!(order.expiration, 4);

        let missing = OrderFixture {
            account_index: 5,
            ..fixture
        };
        assert!(to_order(&missing, &ids).is_err());
    }

    #[test]
    fn submit_delay_scales_and_rejects_overflow() {
        let fixture = OrderFixture {
            delay: 3,
            account_index: 0,
            price: 100,
            quantity: 1,
            expiration: 0,
            side: FixtureSide::Bid,
        };
        assert_eq!(
            submit_delay(&fixture, 100).unwrap(),
            Duration::from_millis(300)
        );

        let huge = OrderFixture {
            delay: u64::MAX / 2,
            ..fixture
        };
        assert!(submit_delay(&huge, 100).is_err());
        assert_eq!(submit_delay(&huge, 1).unwrap().as_millis(), u128::from(u64::MAX / 2));
    }

    #[test]
    fn settle_wait_is_given_in_seconds() {
        let args = Args::try_parse_from(["client", "--settle-secs", "5"]).unwrap();
        assert_eq!(args.settle_secs, 5);
        assert_eq!(args.delay_unit_ms, 100);
        assert!(Args::try_parse_from(["client", "--settle-ticks", "5"]).is_err());
    }
}
