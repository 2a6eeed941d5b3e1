pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::SessionOptions;
pub use config::UnknownConditionPolicy;

pub mod catalog;
pub use catalog::Catalog;
pub use catalog::Pack;

pub mod rules;
pub use rules::RulesEngine;
pub use rules::Variables;

pub mod relationship_resolver;
pub mod install_groups;
pub mod selection;

pub mod context;
pub use context::InstallerContext;
