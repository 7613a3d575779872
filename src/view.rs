// src/view.rs
//! Server-side rendering of the monitor page. Pure functions of the
//! snapshot; no state is touched here.

use crate::model::{ErrorKind, ExchangeRate, FetchStatus, Snapshot};

/// Column order is fixed and matches the xlsx export: name, code, cash buy,
/// cash sell, spot buy, spot sell.
pub const TABLE_HEADERS: [&str; 6] = ["幣別", "代碼", "現鈔買入", "現鈔賣出", "即期買入", "即期賣出"];

/// Minimal HTML escaping for text and attribute positions.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// One `<tr>` per record, in input order, all six fields verbatim. No
/// sorting, no dedup: duplicate codes from upstream are all rendered.
/// Empty input renders a deterministic empty-state block instead.
pub fn render_table(rates: &[ExchangeRate]) -> String {
    if rates.is_empty() {
        return r#"<p class="empty">目前沒有匯率資料。</p>"#.to_string();
    }

    let mut html = String::from("<table class=\"rates\">\n<thead><tr>");
    for h in TABLE_HEADERS {
        html.push_str("<th>");
        html.push_str(h);
        html.push_str("</th>");
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for r in rates {
        html.push_str("<tr>");
        for cell in [
            &r.currency,
            &r.currency_code,
            &r.cash_buy,
            &r.cash_sell,
            &r.spot_buy,
            &r.spot_sell,
        ] {
            html.push_str("<td>");
            html.push_str(&escape_html(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn status_badge(snap: &Snapshot) -> &'static str {
    match snap.status {
        FetchStatus::Loading => "資料擷取中",
        FetchStatus::Error => "連線失敗",
        FetchStatus::Idle | FetchStatus::Success => "系統在線",
    }
}

fn render_error_panel(snap: &Snapshot) -> String {
    let Some(err) = &snap.error else {
        return String::new();
    };
    let hint = if err.kind == ErrorKind::Quota {
        "<p class=\"hint\">已達到服務配額上限，請稍候再重試。</p>"
    } else {
        ""
    };
    format!(
        "<div class=\"error\">\n<h3>無法讀取匯率資訊</h3>\n<p>{msg}</p>\n{hint}\n\
         <form method=\"post\" action=\"/refresh\"><button type=\"submit\">再試一次</button></form>\n</div>",
        msg = escape_html(&err.message),
    )
}

fn render_citations(snap: &Snapshot) -> String {
    let Some(data) = &snap.data else {
        return String::new();
    };
    if data.citations.is_empty() {
        return String::new();
    }
    let mut html = String::from("<div class=\"citations\"><h4>資料來源</h4><ul>\n");
    for c in &data.citations {
        let label = c.title.as_deref().unwrap_or(&c.uri);
        html.push_str(&format!(
            "<li><a href=\"{uri}\" rel=\"noreferrer\">{label}</a></li>\n",
            uri = escape_html(&c.uri),
            label = escape_html(label),
        ));
    }
    html.push_str("</ul></div>");
    html
}

/// The whole monitor page. Stale rows stay visible under the error banner
/// when a later fetch fails.
pub fn render_page(snap: &Snapshot) -> String {
    let loading = snap.status == FetchStatus::Loading;
    let rows = snap.data.as_ref().map(|d| d.rates.as_slice()).unwrap_or(&[]);

    let refresh = if loading {
        "<button type=\"submit\" disabled>正在同步...</button>".to_string()
    } else {
        "<button type=\"submit\">手動更新</button>".to_string()
    };
    let export = if rows.is_empty() {
        "<span class=\"disabled\">下載 Excel 報表</span>".to_string()
    } else {
        "<a href=\"/export.xlsx\">下載 Excel 報表</a>".to_string()
    };
    let last_attempt = snap
        .last_attempt
        .map(|t| format!("<p class=\"meta\">最後檢查時間: {}</p>", t.format("%Y-%m-%d %H:%M:%S UTC")))
        .unwrap_or_default();
    let announced = snap
        .data
        .as_ref()
        .map(|d| {
            format!(
                "<p class=\"meta\">資料時間: {} ｜ 來源: <a href=\"{}\" rel=\"noreferrer\">富邦官網</a></p>",
                escape_html(&d.timestamp),
                escape_html(&d.source_url),
            )
        })
        .unwrap_or_default();

    format!(
        "<!doctype html>\n<html lang=\"zh-Hant\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>富邦銀行匯率監控</title>\n\
         <style>body{{font-family:sans-serif;margin:2rem auto;max-width:64rem}}\
         table.rates{{border-collapse:collapse;width:100%}}\
         table.rates th,table.rates td{{border:1px solid #ccc;padding:.4rem .8rem;text-align:left}}\
         .error{{background:#fee;border:1px solid #c99;padding:1rem;margin:1rem 0}}\
         .disabled{{color:#999}}.meta{{color:#666;font-size:.85rem}}</style>\n</head>\n<body>\n\
         <h1>富邦銀行匯率監控</h1>\n\
         <p class=\"status\">{badge}</p>\n{last_attempt}\
         <form method=\"post\" action=\"/refresh\">{refresh}</form>\n{export}\n\
         {error_panel}\n{announced}\n{table}\n{citations}\n\
         <footer><p class=\"meta\">本工具自動解析富邦官網公開數據，僅供參考，實際交易匯率請依銀行櫃檯為準。</p></footer>\n\
         </body>\n</html>\n",
        badge = status_badge(snap),
        last_attempt = last_attempt,
        refresh = refresh,
        export = export,
        error_panel = render_error_panel(snap),
        announced = announced,
        table = render_table(rows),
        citations = render_citations(snap),
    )
}
