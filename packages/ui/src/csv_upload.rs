//! CSV paste-and-import.
//!
//! The first record is the header row; its names become the keys of every
//! [`ImportRow`], so the usual lead column names (`name`, `email`, `status`,
//! `is_active`, ...) map straight onto the import coercion. Cells are trimmed
//! and kept as strings.

use dioxus::prelude::*;
use serde_json::Value;
use store::ImportRow;

use crate::icons::FaUpload;
use crate::{use_backend, Icon};

/// Parse CSV text into string-keyed rows. Blank lines are skipped.
pub fn parse_csv(text: &str) -> Result<Vec<ImportRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row: ImportRow = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[derive(Clone, Debug, PartialEq)]
enum Outcome {
    Imported { count: usize, warnings: Vec<String> },
    Failed(String),
}

#[component]
pub fn CsvUpload(on_done: Option<EventHandler<usize>>) -> Element {
    let backend = use_backend();
    let mut text = use_signal(String::new);
    let mut busy = use_signal(|| false);
    let mut outcome = use_signal(|| Option::<Outcome>::None);

    let preview = use_memo(move || {
        parse_csv(&text())
            .map(|rows| rows.len())
            .map_err(|e| e.to_string())
    });

    let handle_import = move |_| {
        let backend = backend.clone();
        async move {
            let rows = match parse_csv(&text()) {
                Ok(rows) => rows,
                Err(e) => {
                    outcome.set(Some(Outcome::Failed(format!("Invalid CSV: {e}"))));
                    return;
                }
            };
            busy.set(true);
            let result = backend.leads.import_rows(&rows).await;
            busy.set(false);
            match result {
                Ok(report) => {
                    let count = report.leads.len();
                    outcome.set(Some(Outcome::Imported {
                        count,
                        warnings: report.warnings.iter().map(ToString::to_string).collect(),
                    }));
                    text.set(String::new());
                    if let Some(on_done) = on_done {
                        on_done.call(count);
                    }
                }
                Err(e) => outcome.set(Some(Outcome::Failed(e.to_string()))),
            }
        }
    };

    rsx! {
        div {
            class: "csv-upload",
            p {
                class: "hint",
                "Paste CSV with a header row. Recognized columns: name, email, phone, address, "
                "is_active, status, priority, target_type, last_followup_remarks, next_steps."
            }
            textarea {
                rows: 12,
                placeholder: "name,email,phone,status,priority",
                value: text(),
                oninput: move |evt: FormEvent| text.set(evt.value()),
            }
            {match preview() {
                Ok(0) => rsx! {},
                Ok(n) => rsx! { p { class: "hint", "{n} rows ready to import" } },
                Err(e) => rsx! { p { class: "notice notice-error", "Invalid CSV: {e}" } },
            }}
            button {
                class: "btn btn-primary",
                disabled: busy() || !matches!(preview(), Ok(n) if n > 0),
                onclick: handle_import,
                Icon { icon: FaUpload, width: 14, height: 14 }
                if busy() { " Importing..." } else { " Import" }
            }
            {match outcome() {
                Some(Outcome::Imported { count, warnings }) => rsx! {
                    div {
                        class: "notice notice-success",
                        "Imported {count} leads."
                        if !warnings.is_empty() {
                            ul {
                                class: "warnings",
                                for warning in warnings {
                                    li { "{warning}" }
                                }
                            }
                        }
                    }
                },
                Some(Outcome::Failed(message)) => rsx! {
                    div { class: "notice notice-error", "{message}" }
                },
                None => rsx! {},
            }}
        }
    }
}
