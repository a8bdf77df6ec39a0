//! Fixture files driving a market session
//!
//! Both files are comma-separated with one header row:
//! - accounts: `balance,holdings`
//! - orders: `delay,account_index,price,quantity,expiration,side`

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFixture {
    pub balance: i64,
    pub holdings: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureSide {
    Bid,
    Ask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFixture {
    /// Delay before submission, in delay units
    pub delay: u64,
    /// Row index into the accounts fixture
    pub account_index: usize,
    pub price: u64,
    pub quantity: u64,
    pub expiration: u64,
    pub side: FixtureSide,
}

pub fn load_accounts(path: &Path) -> Result<Vec<AccountFixture>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("error reading accounts file {}", path.display()))?;
    parse_accounts(&contents).with_context(|| format!("in {}", path.display()))
}

pub fn load_orders(path: &Path) -> Result<Vec<OrderFixture>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("error reading orders file {}", path.display()))?;
    parse_orders(&contents).with_context(|| format!("in {}", path.display()))
}

pub fn parse_accounts(contents: &str) -> Result<Vec<AccountFixture>> {
    rows(contents)
        .map(|(row, fields)| -> Result<AccountFixture> {
            let fields = expect_fields(row, &fields, 2)?;
            Ok(AccountFixture {
                balance: parse_field(row, "balance", fields[0])?,
                holdings: parse_field(row, "holdings", fields[1])?,
            })
        })
        .collect()
}

pub fn parse_orders(contents: &str) -> Result<Vec<OrderFixture>> {
    rows(contents)
        .map(|(row, fields)| -> Result<OrderFixture> {
            let fields = expect_fields(row, &fields, 6)?;
            let side = match fields[5].to_ascii_lowercase().as_str() {
                "bid" => FixtureSide::Bid,
                "ask" => FixtureSide::Ask,
                other => bail!("row {}: unknown side {:?}", row, other),
            };
            Ok(OrderFixture {
                delay: parse_field(row, "delay", fields[0])?,
                account_index: parse_field(row, "account index", fields[1])?,
                price: parse_field(row, "price", fields[2])?,
                quantity: parse_field(row, "quantity", fields[3])?,
                expiration: parse_field(row, "expiration", fields[4])?,
                side,
            })
        })
        .collect()
}

/// Data rows with their 1-based line numbers, skipping the header and blank lines
fn rows<'a>(contents: &'a str) -> impl Iterator<Item = (usize, Vec<&'a str>)> + 'a {
    contents
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line.split(',').map(str::trim).collect()))
}

fn expect_fields<'a>(row: usize, fields: &'a [&'a str], count: usize) -> Result<&'a [&'a str]> {
    if fields.len() < count {
        bail!("row {}: expected {} fields, found {}", row, count, fields.len());
    }
    Ok(fields)
}

fn parse_field<T>(row: usize, name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| anyhow!("row {}: invalid {} {:?}: {}", row, name, value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_accounts_after_header() {
        let accounts = parse_accounts("balance,holdings\n1000,5\n\n200, 0\n").unwrap();
        assert_eq!(
            accounts,
            vec![
                AccountFixture {
                    balance: 1000,
                    holdings: 5
                },
                AccountFixture {
                    balance: 200,
                    holdings: 0
                },
            ]
        );
    }

    #[test]
    fn parses_orders_with_sides() {
        let orders =
            parse_orders("delay,account,price,quantity,expiration,side\n0,1,100,10,0,bid\n3,0,90,4,7,ASK\n")
                .unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].side, FixtureSide::Bid);
        assert_eq!(orders[0].account_index, 1);
        assert_eq!(orders[1].side, FixtureSide::Ask);
        assert_eq!((orders[1].delay, orders[1].expiration), (3, 7));
    }

    #[test]
    fn errors_name_the_row() {
        let err = parse_orders("h\n0,0,100,10,0,bid\n0,0,100,10,0,hold\n").unwrap_err();
        assert!(err.to_string().contains("row 3"), "{}", err);

        let err = parse_accounts("h\n12,x\n").unwrap_err();
        assert!(err.to_string().contains("row 2: invalid holdings"), "{}", err);

        let err = parse_orders("h\n1,2,3\n").unwrap_err();
        assert!(err.to_string().contains("expected 6 fields"), "{}", err);
    }

    #[test]
    fn load_reports_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "balance,holdings\n10,abc").unwrap();
        let err = load_accounts(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid holdings"));
        assert!(load_orders(Path::new("/nonexistent/orders.csv")).is_err());
    }
}
