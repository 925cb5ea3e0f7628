use super::UserPresencePrompt;

pub struct StdoutPrompt;

impl UserPresencePrompt for StdoutPrompt {
    fn prompt_touch(&self) {
        println!("Please touch your security key!");
    }
}
