//! Static HTML report.
//!
//! The report is one self-contained page (styles inlined, no external
//! assets) showing every record in the history as a card, newest period
//! first. Records whose period does not start with `YYYY-MM` sink to the end,
//! keeping their history order among themselves.
//!
//! Every field is escaped on the way out: the text comes from search
//! results via an LLM and must never be trusted as markup.

use crate::models::Record;
use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use url::Url;

const PLACEHOLDER: &str =
    "<div class=\"empty\">暂无商业化联动情报</div>";

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// An href for `url`, or `#` when it is not an absolute http(s) link.
fn safe_href(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => escape_html(parsed.as_str()),
        _ => "#".to_string(),
    }
}

/// `tag-ip` for content/IP categories, `tag-bd` for everything else.
pub fn tag_class(category: &str, ip_categories: &[String]) -> &'static str {
    if ip_categories.iter().any(|c| c == category.trim()) {
        "tag-ip"
    } else {
        "tag-bd"
    }
}

/// The month a period falls in; only the leading `YYYY-MM` is considered.
fn period_key(period: &str) -> Option<NaiveDate> {
    let month = period.trim().get(..7)?;
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok()
}

/// Records ordered by period, newest first; unparseable periods last.
pub fn sort_by_period(records: &[Record]) -> Vec<&Record> {
    records
        .iter()
        .sorted_by(|a, b| period_key(&b.period).cmp(&period_key(&a.period)))
        .collect()
}

fn render_card(record: &Record, ip_categories: &[String]) -> String {
    format!(
        r#"
        <div class="card">
            <div class="card-header">
                <span class="game-name">🎮 {subject}</span>
                <span class="date">{period}</span>
            </div>
            <div class="card-body">
                <div class="row">
                    <span class="brand">{partner}</span>
                    <span class="tag {tag}">{category}</span>
                </div>
                <div class="desc">{description}</div>
            </div>
            <div class="card-footer">
                <a href="{href}" target="_blank" rel="noopener noreferrer" class="verify-btn">🔗 点击验证来源</a>
            </div>
        </div>"#,
        subject = escape_html(&record.subject),
        period = escape_html(&record.period),
        partner = escape_html(&record.partner),
        tag = tag_class(&record.category, ip_categories),
        category = escape_html(&record.category),
        description = escape_html(&record.description),
        href = safe_href(&record.source_url),
    )
}

/// Render the full report page.
pub fn render_report(
    records: &[Record],
    ip_categories: &[String],
    generated_at: NaiveDateTime,
) -> String {
    let cards = if records.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        sort_by_period(records)
            .into_iter()
            .map(|r| render_card(r, ip_categories))
            .join("")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>竞品情报雷达 | Game Radar</title>
    <style>
        :root {{ --bg: #0b0c10; --card-bg: #1f2833; --text-main: #c5c6c7; --highlight: #66fcf1; --gold: #FFD700; --red: #fc5185; }}
        body {{ background-color: var(--bg); color: var(--text-main); font-family: 'Segoe UI', sans-serif; margin: 0; padding: 20px; }}
        h1 {{ text-align: center; color: var(--highlight); margin-bottom: 10px; }}
        .subtitle {{ text-align: center; color: #666; font-size: 14px; margin-bottom: 40px; }}
        .total {{ color: var(--highlight); font-weight: bold; }}

        .grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(300px, 1fr)); gap: 20px; max-width: 1200px; margin: 0 auto; }}
        .empty {{ grid-column: 1 / -1; text-align: center; color: #666; padding: 50px; }}

        .card {{ background: var(--card-bg); border-radius: 12px; border: 1px solid #2d3844; overflow: hidden; transition: transform 0.2s; display: flex; flex-direction: column; }}
        .card:hover {{ transform: translateY(-5px); border-color: var(--highlight); }}

        .card-header {{ background: rgba(0,0,0,0.2); padding: 12px 15px; display: flex; justify-content: space-between; align-items: center; border-bottom: 1px solid #2d3844; }}
        .game-name {{ color: var(--gold); font-weight: bold; font-size: 14px; }}
        .date {{ font-family: monospace; font-size: 12px; color: #666; }}

        .card-body {{ padding: 15px; flex-grow: 1; }}
        .row {{ display: flex; justify-content: space-between; align-items: center; margin-bottom: 12px; }}
        .brand {{ font-size: 18px; font-weight: 900; color: #fff; }}

        .tag {{ font-size: 11px; padding: 2px 8px; border-radius: 4px; color: #fff; font-weight: bold; }}
        .tag-bd {{ background-color: #45a29e; }}
        .tag-ip {{ background-color: var(--red); }}

        .desc {{ font-size: 14px; line-height: 1.5; color: #aeb4b9; }}

        .card-footer {{ padding: 10px 15px; background: rgba(0,0,0,0.2); border-top: 1px solid #2d3844; text-align: right; }}
        .verify-btn {{ font-size: 12px; color: var(--highlight); text-decoration: none; opacity: 0.8; transition: opacity 0.2s; }}
        .verify-btn:hover {{ opacity: 1; text-decoration: underline; }}

        @media (max-width: 600px) {{ .grid {{ grid-template-columns: 1fr; }} }}
    </style>
</head>
<body>
    <h1>🛡️ 竞品商业化情报雷达</h1>
    <p class="subtitle">更新时间: {generated} · 共 <span class="total">{total}</span> 条情报</p>

    <div class="grid">{cards}
    </div>
</body>
</html>
"#,
        generated = generated_at.format("%Y-%m-%d %H:%M"),
        total = records.len(),
        cards = cards,
    )
}
