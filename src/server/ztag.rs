//! Tagged output (`p4 -Mj -ztag`) parsing and spec form rendering.
//!
//! With `-Mj` the client prints one JSON object per line: either a tagged
//! record (`{"Stream": "//depot/main", ...}`) or a server message carrying
//! `data` and `severity`. Values may span lines; JSON keeps them in one
//! string, so a description ending in a newline cannot split a record.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::types::{ClientWorkspace, Stream, StreamSummary};
use super::{ServerError, ServerResult};

pub type Record = BTreeMap<String, String>;

/// `E_INFO` in the server's severity scale.
const SEVERITY_INFO: u64 = 1;
/// `E_FAILED`; anything at or above it is an error.
const SEVERITY_FAILED: u64 = 3;

/// Client form fields mapped onto [`ClientWorkspace`] members.
const CLIENT_FIELDS: [&str; 8] = [
    "Client",
    "client",
    "Owner",
    "Stream",
    "Root",
    "Host",
    "Description",
    "Options",
];

/// Fields the server reports but ignores on input.
const READ_ONLY_FIELDS: [&str; 3] = ["Update", "Access", "code"];

const VIEW: &str = "View";

/// Records and messages from one tagged command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedOutput {
    pub records: Vec<Record>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn message_severity(fields: &Map<String, Value>) -> Option<u64> {
    let severity = fields
        .get("severity")
        .and_then(|value| value.as_u64().or_else(|| value.as_str()?.parse().ok()));

    match fields.get("code").and_then(Value::as_str) {
        Some("error") => Some(severity.unwrap_or(SEVERITY_FAILED)),
        Some("info") | Some("text") => Some(severity.unwrap_or(SEVERITY_INFO)),
        Some(_) => None,
        None if fields.contains_key("data") => severity,
        None => None,
    }
}

pub fn parse_output(output: &str) -> ServerResult<TaggedOutput> {
    let mut parsed = TaggedOutput::default();

    for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| ServerError::Protocol(format!("invalid tagged output: {}", e)))?;
        let Value::Object(fields) = value else {
            return Err(ServerError::Protocol(format!(
                "tagged output line is not an object: {}",
                line
            )));
        };

        match message_severity(&fields) {
            Some(severity) => {
                let text = fields
                    .get("data")
                    .map(value_text)
                    .unwrap_or_default()
                    .trim_end()
                    .to_string();
                if severity >= SEVERITY_FAILED {
                    parsed.errors.push(text);
                } else {
                    parsed.warnings.push(text);
                }
            }
            None => parsed.records.push(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value_text(value)))
                    .collect(),
            ),
        }
    }
    Ok(parsed)
}

/// `View3` -> `("View", 3)`; `None` for keys without a numeric suffix.
fn split_index(key: &str) -> Option<(&str, usize)> {
    let prefix = key.trim_end_matches(|c: char| c.is_ascii_digit());
    if prefix.is_empty() || prefix.len() == key.len() {
        return None;
    }
    let index = key[prefix.len()..].parse().ok()?;
    Some((prefix, index))
}

fn indexed_lists(record: &Record) -> BTreeMap<String, Vec<String>> {
    let mut entries: BTreeMap<String, Vec<(usize, String)>> = BTreeMap::new();
    for (key, value) in record {
        if let Some((prefix, index)) = split_index(key) {
            entries
                .entry(prefix.to_string())
                .or_default()
                .push((index, value.clone()));
        }
    }

    entries
        .into_iter()
        .map(|(prefix, mut lines)| {
            lines.sort_by_key(|(index, _)| *index);
            (prefix, lines.into_iter().map(|(_, line)| line).collect())
        })
        .collect()
}

fn non_empty(record: &Record, key: &str) -> Option<String> {
    record
        .get(key)
        .map(|value| value.trim_end().to_string())
        .filter(|value| !value.is_empty())
}

pub fn client_from_record(record: &Record) -> ServerResult<ClientWorkspace> {
    let name = record
        .get("Client")
        .or_else(|| record.get("client"))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ServerError::Protocol("client record without a name".to_string()))?;

    let mut lists = indexed_lists(record);
    let view = lists.remove(VIEW).unwrap_or_default();

    let extra = record
        .iter()
        .filter(|(key, _)| {
            !CLIENT_FIELDS.contains(&key.as_str())
                && !READ_ONLY_FIELDS.contains(&key.as_str())
                && split_index(key).is_none()
        })
        .map(|(key, value)| (key.clone(), value.trim_end().to_string()))
        .filter(|(_, value)| !value.is_empty())
        .collect();

    Ok(ClientWorkspace {
        name: name.clone(),
        owner_name: record.get("Owner").cloned().unwrap_or_default(),
        stream: non_empty(record, "Stream"),
        root: non_empty(record, "Root"),
        host: non_empty(record, "Host"),
        description: non_empty(record, "Description"),
        options: non_empty(record, "Options"),
        view,
        extra,
        extra_lists: lists,
    })
}

pub fn stream_summary_from_record(record: &Record) -> ServerResult<StreamSummary> {
    let stream = record
        .get("Stream")
        .ok_or_else(|| ServerError::Protocol("stream record without a path".to_string()))?;

    let mut summary = StreamSummary::new(stream.clone());
    if let Some(name) = non_empty(record, "Name") {
        summary.name = name;
    }
    summary.stream_type = non_empty(record, "Type");
    summary.parent = non_empty(record, "Parent").filter(|parent| parent != "none");
    Ok(summary)
}

pub fn stream_from_record(record: &Record) -> ServerResult<Stream> {
    Ok(Stream {
        summary: stream_summary_from_record(record)?,
        owner: non_empty(record, "Owner"),
        description: non_empty(record, "desc").or_else(|| non_empty(record, "Description")),
        options: non_empty(record, "Options"),
    })
}

fn push_block<'a>(form: &mut String, key: &str, lines: impl IntoIterator<Item = &'a str>) {
    form.push_str(key);
    form.push_str(":\n");
    for line in lines {
        form.push('\t');
        form.push_str(line);
        form.push('\n');
    }
    form.push('\n');
}

fn push_field(form: &mut String, key: &str, value: &str) {
    if value.contains('\n') {
        push_block(form, key, value.lines());
        return;
    }
    form.push_str(key);
    form.push_str(":\t");
    form.push_str(value);
    form.push_str("\n\n");
}

/// Render a client as the spec form `p4 client -i` reads from stdin.
///
/// Fields the crate does not manage (`SubmitOptions`, `LineEnd`, `Type`,
/// `AltRoots`, ...) are written back as they were read. The view is omitted
/// for stream clients; the server regenerates it from the stream.
pub fn render_client_form(client: &ClientWorkspace) -> String {
    let mut form = String::new();
    push_field(&mut form, "Client", &client.name);
    if !client.owner_name.is_empty() {
        push_field(&mut form, "Owner", &client.owner_name);
    }
    if let Some(host) = &client.host {
        push_field(&mut form, "Host", host);
    }
    if let Some(description) = &client.description {
        push_block(&mut form, "Description", description.lines());
    }
    if let Some(root) = &client.root {
        push_field(&mut form, "Root", root);
    }
    if let Some(options) = &client.options {
        push_field(&mut form, "Options", options);
    }
    for (key, value) in &client.extra {
        push_field(&mut form, key, value);
    }
    for (key, lines) in &client.extra_lists {
        push_block(&mut form, key, lines.iter().map(String::as_str));
    }
    match &client.stream {
        Some(stream) => push_field(&mut form, "Stream", stream),
        None if !client.view.is_empty() => {
            push_block(&mut form, VIEW, client.view.iter().map(String::as_str));
        }
        None => {}
    }
    form
}
