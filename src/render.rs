use crate::config::SortOrder;
use crate::error::Result;
use crate::types::AnnotatedRecord;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;
use rss::{ChannelBuilder, ItemBuilder};
use std::collections::HashSet;

const MISSING: &str = "N/A";
const FEED_TITLE: &str = "Procesos SECOP II";
const FEED_LINK: &str = "https://www.colombiacompra.gov.co/secop-ii";
const FEED_DESCRIPTION: &str =
    "Procesos de contratación de SECOP II relacionados con agua, alcantarillado y bombeo";

/// Output format for matched records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Rss,
    Html,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "rss" => OutputFormat::Rss,
            "html" => OutputFormat::Html,
            _ => OutputFormat::Text,
        }
    }
}

/// Apply display order and limit to records already sorted newest first
pub fn arrange(
    mut records: Vec<AnnotatedRecord>,
    order: SortOrder,
    limit: Option<usize>,
) -> Vec<AnnotatedRecord> {
    if order == SortOrder::Ascending {
        records.reverse();
    }
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}

/// Render records in the requested format
pub fn render(
    records: &[AnnotatedRecord],
    format: OutputFormat,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    match format {
        OutputFormat::Text => render_text(records),
        OutputFormat::Json => render_json_lines(records),
        OutputFormat::Rss => render_rss(records, generated_at),
        OutputFormat::Html => render_html(records, generated_at),
    }
}

/// Wrap every case-insensitive occurrence of `terms` in `open`/`close`.
/// Longer terms win where terms overlap.
pub fn highlight(text: &str, terms: &[String], open: &str, close: &str) -> Result<String> {
    highlight_with(text, terms, open, close, str::to_string)
}

/// Like [`highlight`], but passes every piece of `text` (matched or not)
/// through `escape`. Markers are inserted verbatim.
pub fn highlight_with<F>(
    text: &str,
    terms: &[String],
    open: &str,
    close: &str,
    escape: F,
) -> Result<String>
where
    F: Fn(&str) -> String,
{
    let mut alternatives: Vec<&String> = terms.iter().filter(|t| !t.is_empty()).collect();
    if alternatives.is_empty() {
        return Ok(escape(text));
    }
    alternatives.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));

    let pattern = alternatives
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let re = Regex::new(&format!("(?i){}", pattern))?;

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&escape(&text[last..m.start()]));
        out.push_str(open);
        out.push_str(&escape(m.as_str()));
        out.push_str(close);
        last = m.end();
    }
    out.push_str(&escape(&text[last..]));
    Ok(out)
}

/// Format an amount as Colombian pesos without decimals, e.g. `$ 1.500.000`
pub fn format_cop(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-$ {}", grouped)
    } else {
        format!("$ {}", grouped)
    }
}

/// Upper-case the first character, leave the rest alone
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Keep the first character, lower-case the rest. Upstream descriptions are
/// frequently all caps.
pub fn sentence_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => std::iter::once(first)
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

fn or_missing(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(MISSING)
}

fn process_title(record: &AnnotatedRecord) -> &str {
    record
        .record
        .nombre_del_procedimiento
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or("Proceso sin nombre")
}

fn price_text(record: &AnnotatedRecord) -> String {
    record
        .record
        .precio_base
        .map(format_cop)
        .unwrap_or_else(|| MISSING.to_string())
}

/// Plain-text cards, matched terms wrapped in `*`
pub fn render_text(records: &[AnnotatedRecord]) -> Result<String> {
    let mut out = format!("Se encontraron {} procesos\n", records.len());

    for entry in records {
        let record = &entry.record;
        let badges = entry
            .matched_keywords
            .iter()
            .map(|k| format!("[{}]", capitalize(k)))
            .collect::<Vec<_>>()
            .join(" ");
        let description = highlight(
            &sentence_case(record.description_text()),
            &entry.matched_keywords,
            "*",
            "*",
        )?;

        out.push('\n');
        out.push_str(&format!("{}\n", process_title(entry)));
        out.push_str(&format!("{}\n", badges));
        out.push_str(&format!(
            "Estado: {} - {}\n",
            or_missing(record.estado_del_procedimiento.as_deref()),
            or_missing(record.fase.as_deref())
        ));
        out.push_str(&format!(
            "Fecha de publicacion: {}\n",
            or_missing(record.publication_date.as_deref())
        ));
        out.push_str(&format!(
            "Duracion: {} {}\n",
            or_missing(record.duracion.as_deref()),
            record.unidad_de_duracion.as_deref().unwrap_or("")
        ));
        out.push_str(&format!("Entidad: {}\n", or_missing(record.entidad.as_deref())));
        out.push_str(&format!(
            "Ubicacion: {}, {}\n",
            or_missing(record.ciudad_entidad.as_deref()),
            or_missing(record.departamento_entidad.as_deref())
        ));
        out.push_str(&format!("Descripcion: {}\n", description));
        out.push_str(&format!("Precio base: {}\n", price_text(entry)));
        out.push_str(&format!(
            "Link del proceso: {}\n",
            or_missing(record.process_url())
        ));
    }

    Ok(out)
}

/// One JSON object per line
pub fn render_json_lines(records: &[AnnotatedRecord]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse the leading `YYYY-MM-DD` of a publication date as midnight UTC
pub fn parse_publication_date(date: &str) -> Option<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()?;
    Utc.from_local_datetime(&day.and_hms_opt(0, 0, 0)?).single()
}

fn extract_guid(entry: &AnnotatedRecord) -> String {
    if let Some(id) = entry.record.id_del_proceso.as_deref().filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    if let Some(url) = entry.record.process_url() {
        return url.to_string();
    }
    format!(
        "{}_{}",
        entry.record.publication_date_text(),
        process_title(entry)
    )
}

/// RSS 2.0 feed, one item per process
pub fn render_rss(records: &[AnnotatedRecord], generated_at: DateTime<Utc>) -> Result<String> {
    let mut items = Vec::new();
    let mut seen_guids = HashSet::new();

    for entry in records {
        let guid = extract_guid(entry);
        if !seen_guids.insert(guid.clone()) {
            continue;
        }

        let mut item_builder = ItemBuilder::default();
        item_builder.title(process_title(entry).to_string());
        item_builder.description(format!(
            "{}\n\nEntidad: {}\nPrecio base: {}",
            sentence_case(entry.record.description_text()),
            or_missing(entry.record.entidad.as_deref()),
            price_text(entry)
        ));

        if let Some(link) = entry.record.process_url() {
            item_builder.link(link.to_string());
        }

        if let Some(pub_date) = parse_publication_date(entry.record.publication_date_text()) {
            item_builder.pub_date(pub_date.to_rfc2822());
        }

        item_builder.guid(rss::Guid {
            value: guid,
            permalink: false,
        });

        for keyword in &entry.matched_keywords {
            item_builder.category(rss::Category {
                name: keyword.clone(),
                domain: None,
            });
        }

        items.push(item_builder.build());
    }

    let channel = ChannelBuilder::default()
        .title(FEED_TITLE)
        .link(FEED_LINK)
        .description(FEED_DESCRIPTION)
        .language(Some("es-CO".to_string()))
        .last_build_date(Some(generated_at.to_rfc2822()))
        .items(items)
        .build();

    Ok(channel.to_string())
}

/// Escape HTML special characters
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Standalone HTML page with one card per process
pub fn render_html(records: &[AnnotatedRecord], generated_at: DateTime<Utc>) -> Result<String> {
    let mut cards = String::new();

    for entry in records {
        let record = &entry.record;
        let badges = entry
            .matched_keywords
            .iter()
            .map(|k| format!(r#"<span class="badge">{}</span>"#, escape_html(&capitalize(k))))
            .collect::<Vec<_>>()
            .join("");
        let description = highlight_with(
            &sentence_case(record.description_text()),
            &entry.matched_keywords,
            "<mark>",
            "</mark>",
            escape_html,
        )?;
        let link = match record.process_url() {
            Some(url) => format!(
                r#"<a href="{}" class="link">Link del proceso</a>"#,
                escape_html(url)
            ),
            None => String::new(),
        };

        cards.push_str(&format!(
            r#"    <article class="card">
      <h2>{title}</h2>
      <div class="badges">{badges}</div>
      <p>Estado: {state} - {phase}</p>
      <p>Fecha de publicacion: {date}</p>
      <p>Duracion: {duration} {unit}</p>
      <p>Entidad: {entity}</p>
      <p>Ubicacion: {city}, {department}</p>
      <p>Descripcion: {description}</p>
      <p>Precio base: {price}</p>
      {link}
    </article>
"#,
            title = escape_html(process_title(entry)),
            badges = badges,
            state = escape_html(or_missing(record.estado_del_procedimiento.as_deref())),
            phase = escape_html(or_missing(record.fase.as_deref())),
            date = escape_html(or_missing(record.publication_date.as_deref())),
            duration = escape_html(or_missing(record.duracion.as_deref())),
            unit = escape_html(record.unidad_de_duracion.as_deref().unwrap_or("")),
            entity = escape_html(or_missing(record.entidad.as_deref())),
            city = escape_html(or_missing(record.ciudad_entidad.as_deref())),
            department = escape_html(or_missing(record.departamento_entidad.as_deref())),
            description = description,
            price = escape_html(&price_text(entry)),
            link = link,
        ));
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="utf-8">
  <title>Busqueda de procesos SECOP II</title>
  <style>
    body {{ font-family: sans-serif; max-width: 1000px; margin: 0 auto; padding: 1.25rem; }}
    .card {{ border: 1px solid #ddd; border-radius: 6px; padding: 1rem; margin-bottom: 1rem; }}
    .badges {{ display: flex; flex-wrap: wrap; gap: 0.25rem; }}
    .badge {{ background: #111; color: #fff; border-radius: 9999px; padding: 0.1rem 0.6rem; font-size: 0.8rem; }}
    .link {{ color: #3b82f6; text-decoration: underline; }}
    mark {{ background: #fde68a; }}
  </style>
</head>
<body>
  <h1>Busqueda de procesos SECOP II</h1>
  <p>Se encontraron {count} procesos</p>
  <main>
{cards}  </main>
  <footer>Actualizado: {updated}</footer>
</body>
</html>
"#,
        count = records.len(),
        cards = cards,
        updated = generated_at.format("%Y-%m-%d %H:%M UTC"),
    ))
}
