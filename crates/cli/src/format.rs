//! Event → output-line rendering
//!
//! One line per event: `x2: 20`, `T1 commits`, `T1 waits for site 3`,
//! one `site S - ...` line per site on dump. An `Unblocked` event renders
//! as two lines; the state report renders as a pretty-JSON block.

use repkv_engine::Event;

/// Render one event into its output text. May contain embedded newlines.
pub fn render(event: &Event) -> String {
    match event {
        Event::ReadValue { var, value } => format!("{var}: {value}"),
        Event::WaitsForSite { tran, site } => format!("{tran} waits for site {site}"),
        Event::Committed(tran) => format!("{tran} commits"),
        Event::Aborted(tran) => format!("{tran} aborts"),
        Event::Unblocked { tran, var, value } => format!("{tran} unblocked\n{var}: {value}"),
        Event::WriteFailed => "Write Failed".to_string(),
        Event::SiteDump { site, values } => {
            if values.is_empty() {
                format!("site {site} -")
            } else {
                let listed: Vec<String> = values
                    .iter()
                    .map(|(var, value)| format!("{var}: {value}"))
                    .collect();
                format!("site {site} - {}", listed.join(", "))
            }
        }
        Event::StateReport(report) => serde_json::to_string_pretty(report)
            .unwrap_or_else(|err| format!("state report unavailable: {err}")),
        Event::Rejected(err) => err.to_string(),
    }
}
