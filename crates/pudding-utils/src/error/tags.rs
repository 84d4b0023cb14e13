use error_stack::Report;
use std::borrow::Cow;

/// Human readable hint attached to a [`Report`] telling the operator
/// what they can do about the error.
pub struct Suggestion(Cow<'static, str>);

impl Suggestion {
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self(message.into())
    }

    pub fn install_hook() {
        Report::install_debug_hook::<Self>(|this, ctx| {
            ctx.push_body(format!("suggestion: {}", this.0));
        });
    }
}
