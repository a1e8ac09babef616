//! Command-line interface for taskroute
//!
//! Provides argument parsing and subcommand handling for the taskroute binary.

use clap::{Parser, Subcommand};

/// Task-aware router for hosted LLMs
#[derive(Parser)]
#[command(name = "taskroute")]
#[command(version)]
#[command(about = "Task-aware router for hosted LLMs")]
#[command(
    long_about = "taskroute classifies each prompt into a task category, picks the best-fit \
    model for the caller's priority and latency budget, and executes it against OpenAI or \
    Google Gemini with a single fallback."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# taskroute configuration
# =======================
#
# Configures the HTTP server, provider backends, prompt classification,
# routing defaults, the model catalog, and logging.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"
port = 3000

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDERS
# ─────────────────────────────────────────────────────────────────────────────
#
# API keys are never stored here. Each section names the environment
# variable the key is read from at startup.
#
# timeout_seconds bounds one provider call (1-300, default 60).

[providers.openai]
base_url = "https://api.openai.com/v1"
api_key_env = "OPENAI_API_KEY"
timeout_seconds = 60

[providers.google]
base_url = "https://generativelanguage.googleapis.com/v1beta"
api_key_env = "GOOGLE_GEMINI_API_KEY"
timeout_seconds = 60

# ─────────────────────────────────────────────────────────────────────────────
# CLASSIFIER
# ─────────────────────────────────────────────────────────────────────────────
#
# strategy = "llm"      ask a hosted model through an OpenAI-compatible API
# strategy = "keyword"  local keyword heuristics, no network calls
#
# Failed or inconclusive classifications resolve to "Other".

[classifier]
strategy = "llm"
model = "mistralai/mistral-7b-instruct:free"
base_url = "https://openrouter.ai/api/v1"
api_key_env = "OPENROUTER_API_KEY"
timeout_seconds = 30

# ─────────────────────────────────────────────────────────────────────────────
# ROUTING
# ─────────────────────────────────────────────────────────────────────────────
#
# default_priority: "cost", "latency", or "quality"
# default_latency_budget_ms: applied when a request sends no budget (optional)

[routing]
default_priority = "quality"
# default_latency_budget_ms = 5000

# ─────────────────────────────────────────────────────────────────────────────
# CATALOG
# ─────────────────────────────────────────────────────────────────────────────
#
# Omit every [[catalog.*]] table to use the built-in routing table.
#
# Section keys are task categories: "Code Generation", "Text Summarization",
# "Question Answering", "Creative Writing", "Other". The "Other" list is
# required; categories without a list use it.
#
# Candidate fields:
#   - name: provider model identifier
#   - provider: "openai" or "google"
#   - est_quality: relative quality score (higher is better)
#   - est_cost_per_1k_tokens: estimated USD cost per 1k tokens (> 0)
#   - est_latency_ms: estimated latency, compared against latency budgets
#   - fallback: optional model tried once if this one fails; either a name
#     (same provider) or { name = "...", provider = "..." }

[[catalog."Code Generation"]]
name = "gpt-5-pro"
provider = "openai"
est_quality = 10.0
est_cost_per_1k_tokens = 0.05
est_latency_ms = 1500
fallback = "gpt-5-mini"

[[catalog."Code Generation"]]
name = "gemini-2.5-pro"
provider = "google"
est_quality = 9.5
est_cost_per_1k_tokens = 0.03
est_latency_ms = 1200
fallback = { name = "gpt-5-mini", provider = "openai" }

[[catalog.Other]]
name = "gpt-5-nano"
provider = "openai"
est_quality = 6.0
est_cost_per_1k_tokens = 0.001
est_latency_ms = 300

[[catalog.Other]]
name = "gemini-2.5-flash"
provider = "google"
est_quality = 7.0
est_cost_per_1k_tokens = 0.002
est_latency_ms = 500

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# trace, debug, info, warn, error (RUST_LOG overrides this)
log_level = "info"
"#
}
