use neurobot_chat::KeyValueStorage;

/// Color scheme of the page; dark unless the user picked otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Class list for the root element
    pub fn root_class(&self) -> String {
        format!("app {}", self.as_str())
    }

    /// Caption of the toggle button, naming the mode it switches to
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Dark => "Mode clair",
            Theme::Light => "Mode sombre",
        }
    }

    pub fn load(storage: &impl KeyValueStorage, key: &str) -> Self {
        storage
            .read(key)
            .and_then(|value| Theme::parse(&value))
            .unwrap_or_default()
    }

    pub fn save(&self, storage: &impl KeyValueStorage, key: &str) {
        if let Err(e) = storage.write(key, self.as_str()) {
            log::warn!("failed to remember theme: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurobot_chat::MemoryStorage;

    #[test]
    fn test_defaults_to_dark() {
        let storage = MemoryStorage::with_value("theme", "sepia");
        assert_eq!(Theme::load(&storage, "theme"), Theme::Dark);
        assert_eq!(Theme::load(&MemoryStorage::new(), "theme"), Theme::Dark);
    }

    #[test]
    fn test_toggle_is_remembered() {
        let storage = MemoryStorage::new();
        let theme = Theme::default().toggled();
        theme.save(&storage, "theme");

        assert_eq!(Theme::load(&storage, "theme"), Theme::Light);
        assert_eq!(theme.root_class(), "app light");
        assert_eq!(theme.toggle_label(), "Mode sombre");
    }
}
