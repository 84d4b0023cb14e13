use error_stack::fmt::{Charset, ColorMode};

pub mod tags;

pub use error_stack::{Context, Report, ResultExt};

pub type Result<T, C> = std::result::Result<T, Report<C>>;

/// Sets up [`error_stack`] report preferences and installs the debug
/// hooks for every attachment defined in this crate.
///
/// Must be called once, before any [`Report`] is rendered.
pub fn init() {
    Report::set_charset(Charset::Ascii);
    Report::set_color_mode(ColorMode::None);

    tags::Suggestion::install_hook();
}
