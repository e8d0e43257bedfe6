//! `composure plan` — Print the service startup order.

use std::path::PathBuf;

use clap::Args;
use composure_common::config::ComposureConfig;
use composure_compose::{Composition, DependencyGraph, Service};

use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the composition file (YAML or JSON).
    #[arg(default_value = "docker-compose.yml")]
    pub file: PathBuf,
}

/// Executes the `plan` command.
///
/// Normalizes the file, orders its services so every service follows its
/// dependencies, and prints the plan.
///
/// # Errors
///
/// Returns an error if normalization or ordering fails.
pub fn execute(args: &PlanArgs, config: &ComposureConfig) -> anyhow::Result<()> {
    let composition = super::load_composition(&args.file, config)?;
    let order = DependencyGraph::from_composition(&composition).startup_order()?;
    output::emit(&render_plan(&args.file.display().to_string(), &composition, &order));
    Ok(())
}

/// Renders the startup plan of `composition` in `order`.
pub fn render_plan(source: &str, composition: &Composition, order: &[String]) -> String {
    let mut lines = vec![
        format!("Startup plan for: {source}"),
        "\u{2550}".repeat(35),
        String::new(),
    ];

    for (position, name) in order.iter().enumerate() {
        let Some(service) = composition.services.get(name) else {
            continue;
        };
        lines.push(format!("  {}. {name}", position + 1));
        lines.push(format!("      {}", source_line(service)));
        if !service.depends_on.is_empty() {
            lines.push(format!("      after: {}", service.depends_on.join(", ")));
        }
    }

    lines.push(String::new());
    lines.push(format!("  {} service(s) will be started.", order.len()));
    lines.join("\n")
}

fn source_line(service: &Service) -> String {
    match (&service.image, &service.build) {
        (Some(image), None) => format!("image: {image}"),
        (Some(image), Some(build)) => format!("build: {} (tag {image})", build.context),
        (None, Some(build)) => format!("build: {}", build.context),
        (None, None) => "image: <none>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use composure_compose::normalize;
    use serde_json::json;

    use super::*;

    #[test]
    fn plan_lists_dependencies_first() {
        let composition = normalize(&json!({
            "version": "2.1",
            "services": {
                "web": {"build": "./web", "image": "web:dev", "depends_on": ["db"]},
                "db": {"image": "postgres:16"}
            }
        }))
        .expect("normalize");
        let order = DependencyGraph::from_composition(&composition)
            .startup_order()
            .expect("order");
        let plan = render_plan("compose.yml", &composition, &order);

        let db = plan.find("1. db").expect("db first");
        let web = plan.find("2. web").expect("web second");
        assert!(db < web, "got: {plan}");
        assert!(plan.contains("image: postgres:16"), "got: {plan}");
        assert!(plan.contains("build: ./web (tag web:dev)"), "got: {plan}");
        assert!(plan.contains("after: db"), "got: {plan}");
        assert!(plan.ends_with("2 service(s) will be started."), "got: {plan}");
    }
}
