pub mod prompt;

pub use prompt::StdoutPrompt;

/// Tells the human to touch the key. Injected into the session so the core
/// runs headless under test.
pub trait UserPresencePrompt {
    fn prompt_touch(&self);
}
