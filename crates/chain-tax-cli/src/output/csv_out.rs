use serde_json::Value;
use std::io;

use super::table::{format_value, stages, ENTITY_ROWS};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) if result.contains_key("totals") => {
                // One row per chain stage
                let mut header = vec!["role", "id", "name"];
                header.extend(ENTITY_ROWS);
                let _ = wtr.write_record(&header);
                for (role, entity) in stages(result) {
                    let row: Vec<String> = header
                        .iter()
                        .map(|h| match *h {
                            "role" => role.to_string(),
                            key => entity.get(key).map(format_csv_value).unwrap_or_default(),
                        })
                        .collect();
                    let _ = wtr.write_record(&row);
                }
            }
            Some(Value::Object(result)) if result.contains_key("variants") => {
                if let Some(Value::Array(variants)) = result.get("variants") {
                    write_array_csv(&mut wtr, variants);
                }
            }
            Some(Value::Object(result)) if result.contains_key("matrix") => {
                write_matrix_csv(&mut wtr, result);
            }
            Some(Value::Object(result)) => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
            _ => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        },
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_matrix_csv(
    wtr: &mut csv::Writer<io::StdoutLock<'_>>,
    result: &serde_json::Map<String, Value>,
) {
    let list = |key: &str| match result.get(key) {
        Some(Value::Array(v)) => v.clone(),
        _ => Vec::new(),
    };
    let rows = list("variable_1_values");
    let cols = list("variable_2_values");
    let matrix = list("matrix");

    let mut header = vec![result
        .get("variable_1_name")
        .map(format_csv_value)
        .unwrap_or_default()];
    if cols.is_empty() {
        header.push(result.get("metric").map(format_csv_value).unwrap_or_default());
    } else {
        header.extend(cols.iter().map(format_csv_value));
    }
    let _ = wtr.write_record(&header);

    for (value, row) in rows.iter().zip(&matrix) {
        let mut record = vec![format_csv_value(value)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&record);
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Array(_) => serde_json::to_string(value).unwrap_or_default(),
        other => format_value(other),
    }
}
