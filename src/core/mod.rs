pub mod logging;

// Adventure Codex: template import, cloning and relationship resolution
pub mod codex;
