use serde::Deserialize;
use std::{
    fs::{self},
    path::Path,
};
use tokio::{fs::File, io::AsyncReadExt};

pub const DEFAULT_BASE_URL: &str = "https://app.spiralreports.com";

#[derive(Deserialize, Clone, Debug)]
pub struct Configuration {
    pub api: ApiConfiguration,
    pub core: CoreConfiguration,
    pub log: LogConfiguration,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CoreConfiguration {
    pub data_directory: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiConfiguration {
    pub base_url: Option<String>,
    /// per request timeout in seconds
    pub timeout: Option<u64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub order_by: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LogConfiguration {
    pub level: Option<String>,
    pub retention: Option<usize>,
}

impl Configuration {
    pub fn assert_data_dir_permissions(&self) -> Result<(), &str> {
        let data_dir = self.core.data_directory.to_owned().unwrap_or_default();

        let path = Path::new(&data_dir);

        if !path.try_exists().unwrap_or(false) {
            return Err("data_directory does not exist");
        }

        let permissions = match fs::metadata(path) {
            Err(_) => return Err("cannot read data_directory metadata"),
            Ok(m) => m.permissions(),
        };

        if permissions.readonly() {
            return Err("data_directory cannot be readonly");
        }

        Ok(())
    }
}

impl ApiConfiguration {
    pub fn base_url(&self) -> String {
        let url = self
            .base_url
            .to_owned()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        url.trim_end_matches('/').to_string()
    }
}

pub async fn get_configuration(
    file_path: String,
) -> Result<Configuration, Box<dyn std::error::Error + Send + Sync>> {
    let path = Path::new(&file_path);

    if !path.exists() {
        return Err(format!("configuration file is missing: {}", file_path).into());
    }

    let mut file = File::open(path).await?;
    let mut buffer = vec![];

    file.read_to_end(&mut buffer).await?;

    let result = String::from_utf8(buffer)?;

    match toml::from_str::<Configuration>(&result) {
        Ok(c) => Ok(c),
        Err(e) => Err(format!("configuration file is corrupted: {e}").into()),
    }
}
