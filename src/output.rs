use serde::Serialize;

use crate::locale::{LocaleIdent, NameStyle};
use crate::record::Record;

#[derive(Debug, Serialize)]
pub struct Status {
    pub path: String,
    pub env_var: String,
    pub env_set: bool,
    pub exists: bool,
    pub size: Option<u64>,
}

#[derive(Serialize)]
pub struct LocaleDetail<'a> {
    #[serde(flatten)]
    pub ident: &'a LocaleIdent,
    pub empty: bool,
    pub tag: String,
    pub windows: String,
    pub unix: String,
    pub macos: String,
}

impl<'a> LocaleDetail<'a> {
    pub fn new(ident: &'a LocaleIdent) -> Self {
        Self {
            ident,
            empty: ident.is_empty(),
            tag: ident.tag(),
            windows: ident.name(NameStyle::Windows),
            unix: ident.name(NameStyle::Unix),
            macos: ident.name(NameStyle::MacOs),
        }
    }
}

pub fn format_status(status: &Status) -> String {
    let mut out = String::new();
    out.push_str(&format!("Path:     {}\n", status.path));
    out.push_str(&format!(
        "Env var:  {} ({})\n",
        status.env_var,
        if status.env_set { "set" } else { "unset" }
    ));
    match status.size {
        Some(size) if status.exists => out.push_str(&format!("File:     {size} bytes\n")),
        _ => out.push_str("File:     missing\n"),
    }
    out
}

/// One record per entry; continuation lines of a message are indented
/// under it.
pub fn format_record(r: &Record) -> String {
    let mut lines = r.message.split('\n');
    let first = lines.next().unwrap_or_default();
    let mut out = format!(
        "{}.{:09} {}:{} {}  {}\n",
        r.time.secs, r.time.nanos, r.file, r.line, r.function, first
    );
    for line in lines {
        out.push_str(&format!("    {line}\n"));
    }
    out
}

pub fn format_record_list(records: &[Record]) -> String {
    records.iter().map(format_record).collect()
}

pub fn format_locale_detail(detail: &LocaleDetail<'_>) -> String {
    if detail.empty {
        return "(empty locale identifier)\n".to_string();
    }
    let ident = detail.ident;
    let mut out = String::new();
    out.push_str(&format!("Language: {}\n", ident.language()));
    for (label, value) in [
        ("Script:  ", ident.script()),
        ("Region:  ", ident.region()),
        ("Charset: ", ident.charset()),
        ("Modifier:", ident.modifier()),
    ] {
        if !value.is_empty() {
            out.push_str(&format!("{label} {value}\n"));
        }
    }
    out.push_str(&format!("Tag:      {}\n", detail.tag));
    out.push_str(&format!("Windows:  {}\n", detail.windows));
    out.push_str(&format!("Unix:     {}\n", detail.unix));
    out.push_str(&format!("macOS:    {}\n", detail.macos));
    out
}
