use anyhow::{Result, bail};
use declarative::{AppStatus, Domain, ProgressCallback, run_multi_app};
use formkit::{FieldSet, diff_fields};

use super::load_plan;
use crate::Context;
use crate::cli::ProjectArgs;
use crate::config::{LoadedSchema, load_export};
use crate::ui;

/// Prints one line per application as the run progresses
struct Printer {
    quiet: bool,
}

impl ProgressCallback for Printer {
    fn on_app_start(&mut self, app: &str, index: usize, total: usize) {
        if !self.quiet {
            ui::step(index + 1, total, app);
        }
    }

    fn on_app_complete(&mut self, app: &str, status: &AppStatus) {
        match status {
            AppStatus::Succeeded => {}
            AppStatus::Failed { error } => ui::error(&format!("{}: {:#}", app, error)),
            AppStatus::Skipped if !self.quiet => ui::dim(&format!("{} skipped", app)),
            AppStatus::Skipped => {}
        }
    }
}

/// Problems that make a schema file unusable
fn check(loaded: &LoadedSchema) -> Result<()> {
    let fields = &loaded.schema.fields;
    let unknown: Vec<&str> = loaded
        .schema
        .layout
        .field_codes()
        .into_iter()
        .filter(|code| !fields.contains(code))
        .collect();
    if !unknown.is_empty() {
        bail!("layout places undeclared field(s): {}", unknown.join(", "));
    }
    Ok(())
}

/// Load every selected application's schema file, dependencies first
///
/// Stops at the first application whose file cannot be used.
pub fn run(ctx: &Context, args: ProjectArgs) -> Result<()> {
    let (project, plan) = load_plan(&args)?;

    if plan.is_empty() {
        ui::warn("No applications declared");
        return Ok(());
    }

    if !ctx.quiet {
        ui::header("Validating Schemas");
    }

    let mut printer = Printer { quiet: ctx.quiet };
    let result = run_multi_app(
        &plan,
        |app| {
            let path = project.file_path(app, Domain::Schema);
            log::info!("Loading {} for '{}'", path.display(), app.name);
            let loaded = load_export(&path)?;
            check(&loaded)?;

            // Duplicate labels are reported but do not fail the file
            let diff = diff_fields(&loaded.schema.fields, &FieldSet::new());
            ui::diff_warnings(&diff);

            if !ctx.quiet {
                let revision = loaded
                    .revision
                    .map_or_else(|| "none".to_string(), |r| r.to_string());
                ui::dim(&format!(
                    "{} field(s), {} layout item(s), revision {}",
                    loaded.schema.fields.all().count(),
                    loaded.schema.layout.items.len(),
                    revision
                ));
            }
            Ok(())
        },
        &mut printer,
    );

    let summary = result.summary();
    if !ctx.quiet {
        ui::section("Summary");
        ui::kv("applications", &ui::run_counts(&summary));
    }

    if let Some((app, error)) = result.failure() {
        bail!("validation failed at '{}': {:#}", app, error);
    }

    if !ctx.quiet {
        ui::success("All schema files are valid");
    }
    Ok(())
}
