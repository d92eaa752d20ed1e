use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Chain stages in display order.
pub(crate) const ROLES: [&str; 5] = ["manufacturer", "funder", "platform", "intermediary", "retailer"];

/// Per-entity figures shown side by side.
pub(crate) const ENTITY_ROWS: [&str; 16] = [
    "in_price_incl_tax",
    "out_price_incl_tax",
    "vat_input",
    "vat_output",
    "vat_payable",
    "surcharges",
    "income_tax",
    "tax_refunds",
    "financed_days",
    "finance_cost",
    "operational_cost",
    "gross_profit",
    "net_profit",
    "cash_outflow",
    "tax_burden_rate",
    "is_central_node",
];

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res) if res.contains_key("totals") => print_simulation(res),
        Value::Object(res) if res.contains_key("variants") => print_comparison(res),
        Value::Object(res) if res.contains_key("matrix") => print_sensitivity(res),
        Value::Object(_) => print_flat_object(result),
        _ => print_flat_object(&Value::Object(envelope.clone())),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Stages present in a simulation result, in chain order.
pub(crate) fn stages(res: &Map<String, Value>) -> Vec<(&'static str, &Map<String, Value>)> {
    ROLES
        .iter()
        .filter_map(|role| match res.get(*role) {
            Some(Value::Object(entity)) => Some((*role, entity)),
            _ => None,
        })
        .collect()
}

fn print_simulation(res: &Map<String, Value>) {
    let stages = stages(res);

    let mut builder = Builder::default();
    let mut header = vec!["".to_string()];
    header.extend(stages.iter().map(|(_, e)| entity_label(e)));
    builder.push_record(header);
    for row in ENTITY_ROWS {
        let mut record = vec![row.to_string()];
        record.extend(
            stages
                .iter()
                .map(|(_, e)| e.get(row).map(format_value).unwrap_or_default()),
        );
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));

    if let Some(totals) = res.get("totals") {
        println!("\nTotals:");
        print_flat_object(totals);
    }

    if let Some(Value::Object(strategy)) = res.get("payment_term_strategy") {
        if let Some(Value::String(title)) = strategy.get("title") {
            println!("\n{}", title);
        }
        if let Some(Value::Array(points)) = strategy.get("points") {
            for p in points {
                let label = p.get("label").map(format_value).unwrap_or_default();
                let text = p.get("text").map(format_value).unwrap_or_default();
                println!("  {}: {}", label, text);
            }
        }
    }

    let mut printed = false;
    for (role, entity) in &stages {
        if let Some(Value::Array(tips)) = entity.get("compliance_tips") {
            for tip in tips {
                if !printed {
                    println!("\nCompliance:");
                    printed = true;
                }
                println!("  [{}] {}", role, format_value(tip));
            }
        }
    }
}

fn entity_label(entity: &Map<String, Value>) -> String {
    let name = entity.get("name").map(format_value).unwrap_or_default();
    match entity.get("role") {
        Some(role) => format!("{}\n{}", format_value(role), name),
        None => name,
    }
}

fn print_comparison(res: &Map<String, Value>) {
    if let Some(metric) = res.get("metric") {
        println!(
            "Metric: {}  (base {})",
            format_value(metric),
            res.get("base_value").map(format_value).unwrap_or_default()
        );
    }
    if let Some(Value::Array(variants)) = res.get("variants") {
        print_array_table(variants);
    }
    for key in ["highest", "lowest"] {
        if let Some(Value::String(name)) = res.get(key) {
            println!("{}: {}", key, name);
        }
    }
}

fn print_sensitivity(res: &Map<String, Value>) {
    let empty = Vec::new();
    let rows = match res.get("variable_1_values") {
        Some(Value::Array(v)) => v,
        _ => &empty,
    };
    let cols = match res.get("variable_2_values") {
        Some(Value::Array(v)) => v,
        _ => &empty,
    };
    let matrix = match res.get("matrix") {
        Some(Value::Array(m)) => m,
        _ => &empty,
    };
    let v1 = res.get("variable_1_name").map(format_value).unwrap_or_default();
    let metric = res.get("metric").map(format_value).unwrap_or_default();

    let mut builder = Builder::default();
    let mut header = vec![v1];
    if cols.is_empty() {
        header.push(metric.clone());
    } else {
        header.extend(cols.iter().map(format_value));
    }
    builder.push_record(header);
    for (value, row) in rows.iter().zip(matrix) {
        let mut record = vec![format_value(value)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));

    if let Some(v2) = res.get("variable_2_name") {
        println!("Columns: {}  Metric: {}", format_value(v2), metric);
    }
    if let Some(base) = res.get("base_case_value") {
        println!("Base case: {}", format_value(base));
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
