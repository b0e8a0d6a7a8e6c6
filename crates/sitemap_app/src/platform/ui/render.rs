use sitemap_core::{AppViewModel, Phase};

/// Terminal lines for the current view. `server` is the service base URL
/// used to make the result link absolute. Nothing is shown before a submit.
pub fn render(view: &AppViewModel, server: &str) -> Vec<String> {
    if view.phase == Phase::Idle {
        return Vec::new();
    }

    let target = view
        .submitted
        .as_ref()
        .map(|request| format!("{} (levels {})", request.home_url, request.levels))
        .unwrap_or_default();

    let mut lines = Vec::new();
    lines.push(match view.phase {
        Phase::Idle | Phase::Submitted => format!("Starting sitemap job for {target}"),
        Phase::Polling => format!("Crawling {target}"),
        Phase::Done => format!("Sitemap ready for {target}"),
        Phase::Failed => format!(
            "Sitemap job for {target} stopped: {}",
            view.failure.as_deref().unwrap_or("unknown error")
        ),
    });

    if view.stats_visible && !view.stats.is_empty() {
        let stats = view
            .stats
            .iter()
            .map(|field| format!("{}: {}", field.id, field.value))
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(format!("  {stats}"));
    }

    if let Some(href) = &view.result_href {
        lines.push(format!("  {}/{}", server.trim_end_matches('/'), href));
    }

    lines
}
