use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use envrec_envelope::standard_registry;
use serde::Serialize;

use crate::cmd::TypesArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct TypeInfo {
    data_type: i32,
    name: &'static str,
}

pub fn run(_args: TypesArgs, format: OutputFormat) -> CliResult<i32> {
    let types: Vec<TypeInfo> = standard_registry()
        .entries()
        .into_iter()
        .map(|(data_type, name)| TypeInfo { data_type, name })
        .collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&types).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "MESSAGE"]);
            for info in &types {
                table.add_row(vec![info.data_type.to_string(), info.name.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for info in &types {
                println!("{:>8}  {}", info.data_type, info.name);
            }
        }
        OutputFormat::Raw => {
            for info in &types {
                println!("{}", info.data_type);
            }
        }
    }

    Ok(SUCCESS)
}
