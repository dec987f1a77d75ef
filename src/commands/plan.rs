use anyhow::Result;
use declarative::{Auth, Domain};

use super::load_plan;
use crate::Context;
use crate::cli::ProjectArgs;
use crate::ui;

/// Print applications in the order they would be processed
pub fn run(ctx: &Context, args: ProjectArgs) -> Result<()> {
    let (project, plan) = load_plan(&args)?;

    if plan.is_empty() {
        ui::warn("No applications declared");
        return Ok(());
    }

    if !ctx.quiet {
        ui::header("Execution Plan");
    }

    let total = plan.len();
    for (index, app) in plan.iter().enumerate() {
        ui::step(index + 1, total, &app.name);
        ui::kv("app id", &app.app_id);
        if !app.depends_on.is_empty() {
            ui::kv("depends on", &app.depends_on.join(", "));
        }

        if ctx.verbose > 0 {
            let connection = app.connection(&project.config);
            ui::kv("domain", connection.domain.unwrap_or("(not set)"));
            let auth = match connection.auth {
                Some(Auth::ApiToken { .. }) => "api token",
                Some(Auth::Password { .. }) => "password",
                None => "(not set)",
            };
            ui::kv("auth", auth);
            if let Some(space) = connection.guest_space_id {
                ui::kv("guest space", space);
            }
            ui::kv(
                "schema",
                &project.file_path(app, Domain::Schema).display().to_string(),
            );
        }
    }

    if !ctx.quiet {
        println!();
        ui::success(&format!("{} application(s) in dependency order", total));
    }
    Ok(())
}
