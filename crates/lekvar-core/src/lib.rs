//! Lekvar Core
//!
//! Engine for a hierarchical INI-style configuration language. Sections are
//! addressed by dotted paths (`[a.b.c]`), inherit from their dot-parent and
//! from any sections listed on their header (`[a.b.c : x, y]`), and can
//! reshape what they inherit with `RENAME`, `AVOID`, `ONLY` and `INCLUDE`
//! directives.
//!
//! The main entry point is [`Lekvar`].

pub mod document;
pub mod error;
pub mod grammar;
pub mod model;
mod reader;
pub mod result;
pub mod semantic;
pub mod settings;

pub use document::Lekvar;
pub use error::{ErrorKind, LekvarError, MalformedLine};
pub use grammar::{Classifier, Line, LineContext};
pub use model::{Directives, OptionKey, OptionStore, OptionValue, OptionView, Section, SectionRegistry};
pub use result::{Result, ResultExt};
pub use semantic::{
    EdgeKind, GraphError, InheritanceEdge, InheritanceGraph, InheritanceResolver, Resolution,
};
pub use settings::{DEFAULT_SECTION, ParserSettings, SettingsLoader, settings_schema};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    init_tracing_with_filter("lekvar=info");
}

/// Initialize tracing with `default_directive` unless `RUST_LOG` is set.
///
/// Does nothing when a global subscriber is already installed.
pub fn init_tracing_with_filter(default_directive: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
