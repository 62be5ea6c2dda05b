//! Configuration module.
//!
//! Handles the config file schema, layered resolution of provider settings and
//! prompt templates.

pub mod prompts;
mod resolver;
mod settings;

pub use resolver::{
    ConfigResolver, ConfigSource, DocumentSource, EffectiveConfig, EnvSource, Overrides,
};
pub use settings::{mask_key, ConfigDocument, ProviderKind, ProviderSection};
