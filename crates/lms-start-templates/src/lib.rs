use rust_embed::RustEmbed;

/// Files under `templates/`, compiled into the binary.
///
/// `.tera` files are console templates rendered by the core crate;
/// everything else is copied out verbatim (e.g. `lms.toml` by `lms-start init`).
#[derive(RustEmbed)]
#[folder = "templates/"]
pub struct Templates;
