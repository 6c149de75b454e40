use crate::config::AppConfig;

pub fn separator() -> String {
    "\n".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command_history: None,
            separator: separator(),
            copy_items: false,
        }
    }
}
