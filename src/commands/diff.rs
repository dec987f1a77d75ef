use anyhow::Result;
use formkit::diff_schema;

use crate::Context;
use crate::cli::DiffArgs;
use crate::config::load_export;
use crate::ui;

/// Show what applying `declared` over `remote` would change
pub fn run(ctx: &Context, args: DiffArgs) -> Result<()> {
    let declared = load_export(&args.declared)?;
    let remote = load_export(&args.remote)?;

    let diff = diff_schema(&declared.schema, &remote.schema);

    if !ctx.quiet {
        ui::header("Schema Diff");
        ui::kv("declared", &args.declared.display().to_string());
        ui::kv("remote", &args.remote.display().to_string());
        if let Some(revision) = remote.revision {
            ui::kv("remote revision", &revision.to_string());
        }
    }

    for warning in diff.warnings() {
        ui::warn(warning);
    }

    if diff.is_empty() {
        println!();
        ui::success("No changes - remote matches declared schema");
        return Ok(());
    }

    if !diff.fields.is_empty() {
        ui::section("Fields");
        ui::diff_entries(&diff.fields);
        ui::dim(&ui::diff_counts(&diff.fields));
    }

    if diff.layout_needs_update() {
        ui::section("Layout");
        if diff.layout.is_empty() {
            ui::info("Arrangement changed; layout will be replaced");
        } else {
            ui::diff_entries(&diff.layout);
            ui::dim(&ui::diff_counts(&diff.layout));
        }
    }

    Ok(())
}
