//! Shared helper for script-driven end-to-end tests.

use repkv::Coordinator;

/// Run a script through parser → coordinator → formatter and collect the
/// printed lines.
pub fn run_script(script: &str) -> Vec<String> {
    let mut coordinator = Coordinator::new();
    let mut lines = Vec::new();
    for line in script.lines() {
        let parsed = repkv_cli::parse_line(line)
            .unwrap_or_else(|err| panic!("bad script line `{line}`: {err}"));
        let Some(command) = parsed else { continue };
        for event in coordinator.apply(command) {
            for rendered in repkv_cli::render(&event).split('\n') {
                lines.push(rendered.to_string());
            }
        }
    }
    lines
}
