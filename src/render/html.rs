use crate::model::ReportRow;
use anyhow::bail;

/// Placeholder substituted with the JSON row array.
pub const TABLE_PLACEHOLDER: &str = "$table_json";

/// Render the report by embedding `rows` as a JSON array into `template`.
///
/// We avoid `format!()` because the HTML contains many `{}` from CSS and JS,
/// which would conflict with Rust formatting.
pub fn render_report(rows: &[ReportRow], template: &str) -> anyhow::Result<String> {
    if !template.contains(TABLE_PLACEHOLDER) {
        bail!("report template has no {} placeholder", TABLE_PLACEHOLDER);
    }

    let rounded: Vec<ReportRow> = rows.iter().map(round_row).collect();
    // "</" inside a <script> block would end it early.
    let json = serde_json::to_string(&rounded)?.replace("</", "<\\/");

    Ok(template.replace(TABLE_PLACEHOLDER, &json))
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn round_row(row: &ReportRow) -> ReportRow {
    ReportRow {
        url: row.url.clone(),
        count: row.count,
        count_perc: round3(row.count_perc),
        time_sum: round3(row.time_sum),
        time_perc: round3(row.time_perc),
        time_avg: round3(row.time_avg),
        time_max: round3(row.time_max),
        time_med: round3(row.time_med),
    }
}

pub const DEFAULT_TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>rbui log analysis report</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  .main { padding: 12px 16px; }
  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }

  table { border-collapse: collapse; width: 100%; margin-top: 8px; }
  th, td { border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; font-size: 14px; }
  th { position: sticky; top: 0; background: white; border-bottom: 1px solid #ddd; cursor: pointer; user-select: none; }
  th:hover { background: #f3f3f3; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
  code { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 13px; word-break: break-all; }
</style>
</head>
<body>
<header>
  <div class="summary" id="summary"></div>
</header>

<div class="main">
  <input id="search" placeholder="Filter url..." style="width: 320px; padding: 6px 8px; border: 1px solid #ddd; border-radius: 6px;">
  <table>
    <thead>
      <tr>
        <th data-key="url">url</th>
        <th data-key="count" class="num">count</th>
        <th data-key="count_perc" class="num">count_perc</th>
        <th data-key="time_sum" class="num">time_sum</th>
        <th data-key="time_perc" class="num">time_perc</th>
        <th data-key="time_avg" class="num">time_avg</th>
        <th data-key="time_max" class="num">time_max</th>
        <th data-key="time_med" class="num">time_med</th>
      </tr>
    </thead>
    <tbody id="rows"></tbody>
  </table>
</div>

<script>
const ROWS = $table_json;

const state = { key: "time_sum", desc: true, search: "" };

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function renderSummary() {
  const total = ROWS.reduce((acc, r) => acc + r.time_sum, 0);
  document.getElementById("summary").innerHTML = `
    <span class="pill">urls: <b>${ROWS.length}</b></span>
    <span class="pill">time_sum shown: <b>${total.toFixed(3)}</b> s</span>
  `;
}

function renderRows() {
  const body = document.getElementById("rows");
  body.innerHTML = "";
  const s = state.search.toLowerCase();
  const rows = ROWS.filter(r => !s || r.url.toLowerCase().includes(s));
  rows.sort((a, b) => {
    const x = a[state.key], y = b[state.key];
    const c = x < y ? -1 : (x > y ? 1 : 0);
    return state.desc ? -c : c;
  });
  for (const r of rows) {
    const tr = document.createElement("tr");
    tr.innerHTML = `
      <td><code>${escapeHtml(r.url)}</code></td>
      <td class="num">${r.count}</td>
      <td class="num">${r.count_perc}</td>
      <td class="num">${r.time_sum}</td>
      <td class="num">${r.time_perc}</td>
      <td class="num">${r.time_avg}</td>
      <td class="num">${r.time_max}</td>
      <td class="num">${r.time_med}</td>
    `;
    body.appendChild(tr);
  }
}

for (const th of document.querySelectorAll("th[data-key]")) {
  th.onclick = () => {
    const key = th.dataset.key;
    state.desc = state.key === key ? !state.desc : true;
    state.key = key;
    renderRows();
  };
}

document.getElementById("search").addEventListener("input", (e) => {
  state.search = e.target.value || "";
  renderRows();
});

renderSummary();
renderRows();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(url: &str) -> ReportRow {
        ReportRow {
            url: url.to_string(),
            count: 2,
            count_perc: 2.0 / 3.0,
            time_sum: 2.0,
            time_perc: 0.5,
            time_avg: 1.0,
            time_max: 1.23456,
            time_med: 1.0,
        }
    }

    #[test]
    fn substitutes_rounded_rows() {
        let html = render_report(&[row("/api/1")], "<x>$table_json</x>").unwrap();
        assert_eq!(
            html,
            r#"<x>[{"url":"/api/1","count":2,"count_perc":0.667,"time_sum":2.0,"time_perc":0.5,"time_avg":1.0,"time_max":1.235,"time_med":1.0}]</x>"#
        );
    }

    #[test]
    fn default_template_has_placeholder() {
        let html = render_report(&[], DEFAULT_TEMPLATE).unwrap();
        assert!(html.contains("const ROWS = [];"));
        assert!(!html.contains(TABLE_PLACEHOLDER));
    }

    #[test]
    fn script_close_in_url_is_escaped() {
        let html = render_report(&[row("/</script><b>")], "$table_json").unwrap();
        assert!(!html.contains("</script>"));
        assert!(html.contains(r#"<\/script>"#));
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        assert!(render_report(&[row("/a")], "<html></html>").is_err());
    }
}
