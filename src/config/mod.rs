//! Configuration module

mod site;

pub use site::ContentSourceConfig;
pub use site::PreviewConfig;
pub use site::SiteConfig;
pub use site::{ENV_ACCESS_TOKEN, ENV_ENDPOINT};
