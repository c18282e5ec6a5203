use anyhow::Result;
use comfy_table::Table;
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;

pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    println!("{}", render(data, format)?);
    Ok(())
}

pub fn render<T: Serialize>(data: T, format: OutputFormat) -> Result<String> {
    let json_value = serde_json::to_value(data)?;

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&json_value)?,
        OutputFormat::Yaml => serde_yaml::to_string(&json_value)?
            .trim_end()
            .to_string(),
        OutputFormat::Text => render_table(&json_value),
    };
    Ok(rendered)
}

fn render_table(value: &Value) -> String {
    match value {
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Field", "Value"]);

            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }

            table.to_string()
        }
        _ => format_value(value),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_output() {
        let out = render(json!({"account_id": "123456789012"}), OutputFormat::Json).unwrap();
        assert!(out.contains("\"account_id\": \"123456789012\""));
    }

    #[test]
    fn test_yaml_output() {
        let out = render(json!({"partition": "aws"}), OutputFormat::Yaml).unwrap();
        assert_eq!(out, "partition: aws");
    }

    #[test]
    fn test_text_output() {
        let out = render(
            json!({"provider": "EnvProvider", "account_id": null}),
            OutputFormat::Text,
        )
        .unwrap();
        assert!(out.contains("EnvProvider"));
        assert!(out.contains("account_id"));
        assert!(out.contains('-'));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(null)), "-");
        assert_eq!(format_value(&json!(["a", "b"])), "a, b");
        assert_eq!(format_value(&json!({"a": 1})), "{1 fields}");
    }
}
