use crate::core::config::data::Config;
use crate::core::config::settings::ConfigKey;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.summary_lines() {
            println!("  {line}");
        }
    }

    pub fn summary_lines(&self) -> Vec<String> {
        ConfigKey::ALL
            .iter()
            .map(|key| match self.display_value(*key) {
                Some(value) => format!("{}: {value}", key.name()),
                None => format!("{}: (unset)", key.name()),
            })
            .collect()
    }
}
