//! `chatgauge models`: the catalog, with the local model probed first.

use crate::core::models::{ModelSelector, ModelSpec, ReachabilityProbe, MODELS};

pub async fn run_models(probe: &dyn ReachabilityProbe, preferred: &ModelSpec) {
    let mut selector = ModelSelector::new(Some(preferred.id));
    selector.apply_probe(probe.check().await);

    println!("{}", selector.probe_status().label());
    println!();
    for line in model_lines(&selector) {
        println!("{line}");
    }
}

pub fn model_lines(selector: &ModelSelector) -> Vec<String> {
    let current = selector.current().id;
    MODELS
        .iter()
        .map(|model| {
            let marker = if model.id == current { "*" } else { " " };
            let mut line = format!("{marker} {:<14} {}", model.id, model.display_name);
            if !selector.is_enabled(model) {
                line.push_str(" (unavailable)");
            }
            line
        })
        .collect()
}
