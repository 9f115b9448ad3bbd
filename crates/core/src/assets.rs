use std::path::PathBuf;

const APP_DIR_NAME: &str = "litechat";

/// Per-user directories that hold litechat files.
#[derive(Debug, Clone, Copy)]
enum AppDir {
    Config,
    Data,
}

impl AppDir {
    fn xdg_var(self) -> &'static str {
        match self {
            AppDir::Config => "XDG_CONFIG_HOME",
            AppDir::Data => "XDG_DATA_HOME",
        }
    }

    fn platform_base(self) -> Option<PathBuf> {
        match self {
            AppDir::Config => dirs::config_dir(),
            AppDir::Data => dirs::data_local_dir(),
        }
    }

    fn home_relative_base(self) -> &'static str {
        match self {
            AppDir::Config => ".config",
            AppDir::Data => ".local/share",
        }
    }

    /// XDG variable first, then the platform directory, then the home
    /// directory. An empty XDG variable counts as unset.
    fn resolve(self) -> PathBuf {
        std::env::var_os(self.xdg_var())
            .filter(|base| !base.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.platform_base())
            .or_else(|| dirs::home_dir().map(|home| home.join(self.home_relative_base())))
            .unwrap_or_else(|| PathBuf::from(self.home_relative_base()))
            .join(APP_DIR_NAME)
    }
}

pub fn get_config_dir() -> PathBuf {
    AppDir::Config.resolve()
}

/// Returns the data directory, creating it if needed.
pub fn get_data_dir() -> std::io::Result<PathBuf> {
    let path = AppDir::Data.resolve();
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

pub fn get_default_config() -> &'static str {
    include_str!("../data/config.yml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Serializes tests that modify the environment
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_get_config_dir_with_xdg_set() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let tmp_dir = tempfile::tempdir().unwrap();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp_dir.path());
        }

        assert_eq!(get_config_dir(), tmp_dir.path().join("litechat"));

        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    fn test_get_config_dir_without_xdg_set() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
        let expected = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap()
            .join("litechat");
        assert_eq!(get_config_dir(), expected);
    }

    #[test]
    fn test_empty_xdg_var_is_ignored() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "");
        }

        let config_dir = get_config_dir();
        assert!(config_dir.is_absolute(), "{}", config_dir.display());
        assert!(config_dir.ends_with("litechat"));

        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    fn test_get_data_dir_with_xdg_set() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let tmp_dir = tempfile::tempdir().unwrap();
        unsafe {
            env::set_var("XDG_DATA_HOME", tmp_dir.path());
        }

        let data_dir = get_data_dir().unwrap();
        assert_eq!(data_dir, tmp_dir.path().join("litechat"));
        assert!(data_dir.is_dir());

        unsafe {
            env::remove_var("XDG_DATA_HOME");
        }
    }

    #[test]
    fn test_get_default_config() {
        let config = get_default_config();
        assert!(config.contains("default_model:"));
        assert!(config.contains("gateway:"));
    }
}
