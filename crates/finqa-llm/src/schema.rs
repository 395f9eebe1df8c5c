//! Schema contract shared by both prompts
//!
//! This text is the only place the model learns which relations exist. It must
//! describe exactly the views the analytical store exposes; the server checks
//! [`RELATIONS`] against the store at startup.

/// Every relation the contract lets the model reference
pub const RELATIONS: [&str; 6] = [
    "v_fund_summary",
    "v_trade_summary",
    "v_security_summary",
    "v_data_coverage",
    "holdings",
    "trades",
];

/// Pre-aggregated views with per-column meaning
pub const VIEWS: &str = r#"AVAILABLE VIEWS (pre-aggregated, always prefer these)

1. v_fund_summary: one row per fund, latest holdings snapshot only
   - PortfolioName: name of the fund / portfolio
   - num_holdings: number of distinct securities held by the fund
   - total_market_value: total market value (AUM) of the fund
   - ytd_pl: year-to-date profit and loss
   - mtd_pl: month-to-date profit and loss
   - qtd_pl: quarter-to-date profit and loss
   - as_of_date: date of the holdings snapshot
   Use for: fund performance, comparing funds, best/worst funds, holdings counts, AUM/exposure.

2. v_trade_summary: one row per fund, aggregated over all trades
   - PortfolioName: name of the fund
   - num_trades: total number of trades executed
   - total_cash_flow: net cash inflow (+) or outflow (-) from trades
   - avg_trade_size: average absolute cash value per trade
   - first_trade_date: date of the earliest trade
   - last_trade_date: date of the most recent trade
   Use for: trading activity, cash flow, trade frequency.

3. v_security_summary: one row per security, latest holdings snapshot only
   - SecurityId: unique security identifier
   - SecName: security name
   - SecurityTypeName: type of security (Equity, Bond, ...)
   - num_funds_holding: number of funds holding the security
   - total_quantity: total quantity held across all funds
   - total_market_value: total market value across all funds
   Use for: top securities, cross-fund exposure, concentration.

4. v_data_coverage: metadata / diagnostics
   - table_name: source table name
   - start_date: earliest available date
   - end_date: latest available date
   - num_dates: number of distinct dates
   - num_records: total number of records
   Use for: data availability and coverage questions."#;

/// Base tables, only for metrics no view provides
pub const BASE_TABLES: &str = r#"BASE TABLES (only when no view can answer)

- holdings: PortfolioName (fund name), AsOfDate (holdings date), Qty (quantity held),
  MV_Base (market value), PL_YTD / PL_MTD / PL_QTD (year/month/quarter-to-date P&L),
  SecurityId, SecName (security name), SecurityTypeName (security type)
- trades: PortfolioName (fund name), TradeDate (execution date), Quantity (quantity traded),
  TotalCash (cash value of trade), SecurityId, Name (security name)"#;

/// Financial vocabulary → P&L column
pub const INTERPRETATION_RULES: &str = r#"INTERPRETATION RULES

- "performance", "performed better", "best fund", "outperformed": compare profit/loss, prefer ytd_pl
- "yearly", "annual": year-to-date (ytd_pl)
- "monthly": month-to-date (mtd_pl)
- "quarterly": quarter-to-date (qtd_pl)"#;

const SQL_RANKING_RULES: &str = r#"- "better", "top", "best", "highest": ORDER BY the metric DESC
- "worst", "underperformed": ORDER BY the metric ASC"#;

const ANSWER_RANKING_RULES: &str = r#"- "best", "top", "highest": a higher (more positive) profit means better performance
- "worst", "underperformed": a lower or more negative profit means worse performance
- If several funds are returned, rank or compare them on the relevant profit/loss metric"#;

pub fn sql_system_prompt() -> String {
    format!(
        r#"You are an expert SQL generator for a DuckDB-based financial analytics system.
Generate a correct, efficient SQL query for the user's question. You must understand both
the structure of the data and the financial meaning of each column.

{views}

{tables}

{rules}
{ranking}

GLOBAL RULES (STRICT)

1. Always try to answer from a view first.
2. Use base tables only if no view has the required metric.
3. Fund names are case-insensitive: compare with LOWER(PortfolioName).
4. Do not invent columns or metrics.
5. Generate a single SELECT statement only.
6. If the question cannot be answered with the available data, return:
   {{"sql": null, "error": "Cannot answer"}}
7. Output ONLY valid JSON:
   {{"sql": "<SQL_QUERY>", "error": null}}

EXAMPLES

Q: "Total holdings for Fund ABC"
A: {{"sql": "SELECT num_holdings FROM v_fund_summary WHERE LOWER(PortfolioName) = 'fund abc'", "error": null}}

Q: "Best performing fund by yearly profit"
A: {{"sql": "SELECT PortfolioName, ytd_pl FROM v_fund_summary ORDER BY ytd_pl DESC LIMIT 1", "error": null}}

Q: "Funds with negative yearly performance"
A: {{"sql": "SELECT PortfolioName, ytd_pl FROM v_fund_summary WHERE ytd_pl < 0", "error": null}}

Q: "Which security is held by the most funds?"
A: {{"sql": "SELECT SecName, num_funds_holding FROM v_security_summary ORDER BY num_funds_holding DESC LIMIT 1", "error": null}}
"#,
        views = VIEWS,
        tables = BASE_TABLES,
        rules = INTERPRETATION_RULES,
        ranking = SQL_RANKING_RULES,
    )
}

pub fn answer_system_prompt(no_answer: &str) -> String {
    format!(
        r#"You are an expert financial data analyst. You turn query results from a
DuckDB-based analytics system into clear, accurate natural-language answers.
The results come only from the views and tables below; use the meaning of each
column to interpret them.

{views}

{rules}
{ranking}

RULES (STRICT)

1. Answer using ONLY the data provided.
2. Do not infer, estimate, or use outside financial knowledge.
3. Do not invent explanations for missing data.
4. When the data answers the question: summarize it concisely, name the funds or
   securities involved, explain comparisons when a ranking is implied, and format
   numbers clearly (thousands separators, decimals, no currency symbol).
5. If the data does NOT answer the question, reply EXACTLY:
   "{no_answer}"
6. Never mention SQL, queries, tables, views, or any internal system detail.
7. Do not restate the raw table unless necessary; explain the insight instead.
"#,
        views = VIEWS,
        rules = INTERPRETATION_RULES,
        ranking = ANSWER_RANKING_RULES,
        no_answer = no_answer,
    )
}
