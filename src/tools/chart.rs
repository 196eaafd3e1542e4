//! Chart payload handling: series extraction for the chart widget and the
//! plain-text summary handed back to the model.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Price,
    /// Change relative to the first close, in percent.
    Percent,
    /// First close normalized to 100.
    Relative,
}

/// `(timestamp in milliseconds, value)` pairs for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub data: Vec<(i64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub symbol: String,
    pub title: String,
    pub view_mode: ViewMode,
    /// Main symbol first, then comparisons in response order.
    pub series: Vec<ChartSeries>,
    pub meta: Value,
}

#[must_use]
pub fn first_result(payload: &Value) -> Option<&Value> {
    payload.pointer("/chart/result/0")
}

/// Build the series for `mode`, or `None` if the payload has no chart result.
#[must_use]
pub fn process_chart_data(payload: &Value, symbol: &str, mode: ViewMode) -> Option<ChartView> {
    let result = first_result(payload)?;
    let timestamps: Vec<i64> = result
        .get("timestamp")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    let closes = result
        .pointer("/indicators/quote/0/close")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let meta = result.get("meta").cloned().unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let mut series = vec![ChartSeries {
        name: symbol.to_string(),
        data: series_points(&timestamps, closes, mode),
    }];

    for comparison in result.get("comparisons").and_then(Value::as_array).into_iter().flatten() {
        let name = comparison.get("symbol").and_then(Value::as_str).unwrap_or_default();
        let closes = comparison.get("close").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
        tracing::trace!(symbol = name, points = closes.len(), "Processing comparison series");
        series.push(ChartSeries {
            name: name.to_string(),
            data: series_points(&timestamps, closes, mode),
        });
    }

    let name = meta.get("shortName").and_then(Value::as_str).unwrap_or(symbol);
    Some(ChartView {
        symbol: symbol.to_string(),
        title: format!("{name} Stock Price"),
        view_mode: mode,
        series,
        meta,
    })
}

fn series_points(timestamps: &[i64], closes: &[Value], mode: ViewMode) -> Vec<(i64, f64)> {
    let base = closes.iter().find_map(Value::as_f64).filter(|v| *v != 0.0);
    if mode != ViewMode::Price && base.is_none() {
        return Vec::new();
    }
    let base = base.unwrap_or(1.0);

    timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let close = close.as_f64()?;
            let value = match mode {
                ViewMode::Price => close,
                ViewMode::Percent => (close - base) / base * 100.0,
                ViewMode::Relative => close / base * 100.0,
            };
            Some((ts.checked_mul(1000)?, value))
        })
        .collect()
}

/// Patch comparison entries in place and report requested symbols the provider omitted.
///
/// A comparison without `previousClose` gets its first non-null close.
pub fn repair_comparisons(payload: &mut Value, requested: &str) -> Vec<String> {
    let Some(comparisons) = payload
        .pointer_mut("/chart/result/0/comparisons")
        .and_then(Value::as_array_mut)
    else {
        return Vec::new();
    };

    for comp in comparisons.iter_mut() {
        let symbol = comp.get("symbol").and_then(Value::as_str).unwrap_or_default().to_string();
        let first_close = comp
            .get("close")
            .and_then(Value::as_array)
            .and_then(|closes| closes.iter().find(|v| !v.is_null()).cloned());
        if first_close.is_none() {
            tracing::warn!(symbol = %symbol, "Missing close data for comparison stock");
        }
        let has_previous = comp.get("previousClose").is_some_and(|v| !v.is_null());
        if !has_previous {
            tracing::warn!(symbol = %symbol, "Missing previousClose for comparison stock");
            if let (Some(close), Some(object)) = (first_close, comp.as_object_mut()) {
                object.insert("previousClose".to_string(), close);
            }
        }
    }

    let actual: Vec<String> = comparisons
        .iter()
        .filter_map(|c| c.get("symbol").and_then(Value::as_str))
        .map(str::to_uppercase)
        .collect();
    let missing: Vec<String> = requested
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty() && !actual.contains(s))
        .collect();
    if !missing.is_empty() {
        tracing::warn!("Requested comparison symbols missing from response: {}", missing.join(", "));
    }
    missing
}

fn num(meta: &Value, key: &str) -> Option<f64> {
    meta.get(key).and_then(Value::as_f64)
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn signed(value: f64) -> &'static str {
    if value > 0.0 { "+" } else { "" }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_date(epoch_secs: i64) -> String {
    DateTime::from_timestamp(epoch_secs, 0)
        .map_or_else(|| "N/A".to_string(), |dt| dt.format("%Y-%m-%d").to_string())
}

fn within(period: Option<&Value>, now: i64) -> bool {
    let Some(period) = period else { return false };
    let start = period.get("start").and_then(Value::as_i64);
    let end = period.get("end").and_then(Value::as_i64);
    matches!((start, end), (Some(start), Some(end)) if now >= start && now < end)
}

fn market_state(period: &Value, now: i64) -> &'static str {
    if within(period.get("regular"), now) {
        "Regular Trading"
    } else if within(period.get("pre"), now) {
        "Pre-market"
    } else if within(period.get("post"), now) {
        "After Hours"
    } else {
        "Closed"
    }
}

fn latest_event(events: &Value, kind: &str) -> Option<Value> {
    events
        .get(kind)?
        .as_object()?
        .values()
        .max_by_key(|event| event.get("date").and_then(Value::as_i64).unwrap_or(i64::MIN))
        .cloned()
}

/// Text summary of a chart payload; `now` (unix seconds) selects the market state.
#[must_use]
pub fn summarize(payload: &Value, symbol: &str, now: i64) -> Option<String> {
    let result = first_result(payload)?;
    let empty = Value::Null;
    let meta = result.get("meta").unwrap_or(&empty);
    let mut out = String::new();

    let name = meta.get("shortName").and_then(Value::as_str).unwrap_or(symbol);
    let _ = writeln!(out, "Chart data for {name} ({symbol}):");
    let _ = writeln!(out, "Current price: ${}", money(num(meta, "regularMarketPrice")));
    let _ = writeln!(
        out,
        "Day range: ${} - ${}",
        money(num(meta, "regularMarketDayLow")),
        money(num(meta, "regularMarketDayHigh"))
    );
    let _ = writeln!(
        out,
        "52 week range: ${} - ${}",
        money(num(meta, "fiftyTwoWeekLow")),
        money(num(meta, "fiftyTwoWeekHigh"))
    );
    let volume = meta
        .get("regularMarketVolume")
        .and_then(Value::as_u64)
        .map_or_else(|| "N/A".to_string(), group_thousands);
    let _ = writeln!(out, "Volume: {volume}");

    match (num(meta, "regularMarketPrice"), num(meta, "chartPreviousClose")) {
        (Some(price), Some(previous)) if previous != 0.0 => {
            let change = price - previous;
            let percent = change / previous * 100.0;
            let _ = writeln!(
                out,
                "Change: {}${change:.2} ({}{percent:.2}%)",
                signed(change),
                signed(percent)
            );
        }
        _ => {
            let _ = writeln!(out, "Change: N/A");
        }
    }

    let text = |key: &str| meta.get(key).and_then(Value::as_str).unwrap_or("N/A").to_string();
    let _ = writeln!(out, "Time Range: {}", text("range"));
    let _ = writeln!(out, "Exchange: {}", text("exchangeName"));
    let _ = writeln!(out, "Timezone: {}", text("timezone"));
    if let Some(period) = meta.get("currentTradingPeriod") {
        let _ = writeln!(out, "Market State: {}", market_state(period, now));
    }

    let comparisons = result.get("comparisons").and_then(Value::as_array).filter(|c| !c.is_empty());
    if let Some(comparisons) = comparisons {
        let _ = writeln!(out, "\nComparison Stocks ({}):", comparisons.len());
        for comp in comparisons {
            let sym = comp.get("symbol").and_then(Value::as_str).unwrap_or("?");
            let last = comp
                .get("close")
                .and_then(Value::as_array)
                .and_then(|closes| closes.last())
                .and_then(Value::as_f64);
            let previous = comp.get("previousClose").and_then(Value::as_f64);
            match (last, previous) {
                (Some(last), Some(previous)) if previous != 0.0 => {
                    let percent = (last - previous) / previous * 100.0;
                    let _ = writeln!(out, "- {sym}: ${last:.2} ({}{percent:.2}%)", signed(percent));
                }
                _ => {
                    let _ = writeln!(out, "- {sym}: ${}", money(last));
                }
            }
        }
    }

    if let Some(events) = result.get("events") {
        if let Some(dividend) = latest_event(events, "dividends") {
            let amount = dividend.get("amount").map_or_else(|| "N/A".to_string(), ToString::to_string);
            let date = dividend.get("date").and_then(Value::as_i64).map_or_else(|| "N/A".to_string(), format_date);
            let _ = writeln!(out, "\nLatest Dividend: ${amount} on {date}");
        }
        if let Some(split) = latest_event(events, "splits") {
            let numerator = split.get("numerator").map_or_else(|| "?".to_string(), ToString::to_string);
            let denominator = split.get("denominator").map_or_else(|| "?".to_string(), ToString::to_string);
            let date = split.get("date").and_then(Value::as_i64).map_or_else(|| "N/A".to_string(), format_date);
            let _ = writeln!(out, "Latest Split: {numerator}:{denominator} on {date}");
        }
    }

    let _ = writeln!(out, "\nAvailable Chart Views: Price, Percent Change, Relative Performance");
    let _ = writeln!(out, "You can compare stocks and switch between them to see individual statistics.");
    Some(out)
}
