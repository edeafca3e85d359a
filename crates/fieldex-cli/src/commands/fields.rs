//! Fields command - print the descriptor set used when none is given.

use clap::Args;

use super::load_config;

/// Arguments for the fields command.
#[derive(Args)]
pub struct FieldsArgs {
    /// Print the built-in descriptors, ignoring any configured override
    #[arg(long)]
    builtin: bool,
}

pub async fn run(args: FieldsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let fields = if args.builtin {
        fieldex_core::FieldSet::default()
    } else {
        load_config(config_path)?.extraction.fields()
    };

    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}
