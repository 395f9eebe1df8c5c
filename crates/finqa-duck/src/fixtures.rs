//! Seeded in-memory store mirroring the production views
//!
//! Latest snapshot (2024-03-29):
//! - Fund ABC: total_market_value 1,234,567.50, ytd_pl 3,800.00
//! - Fund XYZ: total_market_value 400,000.00, ytd_pl 8,000.00

use duckdb::{Connection, Result as DuckResult};

pub const SEED_SQL: &str = r#"
CREATE TABLE holdings (
    PortfolioName VARCHAR,
    AsOfDate DATE,
    Qty DOUBLE,
    MV_Base DOUBLE,
    PL_YTD DOUBLE,
    PL_MTD DOUBLE,
    PL_QTD DOUBLE,
    SecurityId VARCHAR,
    SecName VARCHAR,
    SecurityTypeName VARCHAR
);

INSERT INTO holdings VALUES
    ('Fund ABC', DATE '2024-02-29', 90, 900000.0, 3000.0, 800.0, 2000.0, 'S1', 'Apple Inc', 'Equity'),
    ('Fund ABC', DATE '2024-03-29', 100, 1000000.25, 5000.0, 1000.0, 2500.0, 'S1', 'Apple Inc', 'Equity'),
    ('Fund ABC', DATE '2024-03-29', 50, 234567.25, -1200.0, -100.0, -300.0, 'S2', 'US Treasury 2030', 'Bond'),
    ('Fund XYZ', DATE '2024-03-29', 40, 400000.0, 8000.0, 500.0, 3000.0, 'S1', 'Apple Inc', 'Equity');

CREATE TABLE trades (
    PortfolioName VARCHAR,
    TradeDate DATE,
    Quantity DOUBLE,
    TotalCash DOUBLE,
    SecurityId VARCHAR,
    Name VARCHAR
);

INSERT INTO trades VALUES
    ('Fund ABC', DATE '2024-01-15', 10, -15000.0, 'S1', 'Apple Inc'),
    ('Fund ABC', DATE '2024-02-20', 5, 5000.0, 'S2', 'US Treasury 2030'),
    ('Fund XYZ', DATE '2024-03-01', 4, -6000.0, 'S1', 'Apple Inc');

CREATE VIEW v_fund_summary AS
WITH latest_holdings AS (
    SELECT * FROM holdings WHERE AsOfDate = (SELECT MAX(AsOfDate) FROM holdings)
)
SELECT
    PortfolioName,
    COUNT(DISTINCT SecurityId) AS num_holdings,
    SUM(MV_Base) AS total_market_value,
    SUM(PL_YTD) AS ytd_pl,
    SUM(PL_MTD) AS mtd_pl,
    SUM(PL_QTD) AS qtd_pl,
    MAX(AsOfDate) AS as_of_date
FROM latest_holdings
GROUP BY PortfolioName;

CREATE VIEW v_trade_summary AS
SELECT
    PortfolioName,
    COUNT(*) AS num_trades,
    SUM(TotalCash) AS total_cash_flow,
    AVG(ABS(TotalCash)) AS avg_trade_size,
    MIN(TradeDate) AS first_trade_date,
    MAX(TradeDate) AS last_trade_date
FROM trades
GROUP BY PortfolioName;

CREATE VIEW v_security_summary AS
WITH latest_holdings AS (
    SELECT * FROM holdings WHERE AsOfDate = (SELECT MAX(AsOfDate) FROM holdings)
)
SELECT
    SecurityId,
    SecName,
    SecurityTypeName,
    COUNT(DISTINCT PortfolioName) AS num_funds_holding,
    SUM(Qty) AS total_quantity,
    SUM(MV_Base) AS total_market_value
FROM latest_holdings
GROUP BY SecurityId, SecName, SecurityTypeName;

CREATE VIEW v_data_coverage AS
SELECT 'holdings' AS table_name, MIN(AsOfDate) AS start_date, MAX(AsOfDate) AS end_date,
       COUNT(DISTINCT AsOfDate) AS num_dates, COUNT(*) AS num_records
FROM holdings
UNION ALL
SELECT 'trades' AS table_name, MIN(TradeDate) AS start_date, MAX(TradeDate) AS end_date,
       COUNT(DISTINCT TradeDate) AS num_dates, COUNT(*) AS num_records
FROM trades;
"#;

/// Create the base tables and views on an existing connection
pub fn seed(conn: &Connection) -> DuckResult<()> {
    conn.execute_batch(SEED_SQL)
}

/// Fresh in-memory database with [`SEED_SQL`] applied
pub fn seeded_connection() -> DuckResult<Connection> {
    let conn = Connection::open_in_memory()?;
    seed(&conn)?;
    Ok(conn)
}
