use foyer_launch::LaunchError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ServiceError {
	#[error(transparent)]
	Launch(#[from] LaunchError),

	#[error(transparent)]
	Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
