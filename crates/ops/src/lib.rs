//! Marketplace operations: the service composing the remote store, cache,
//! catalog, access policy, and token protocol, plus its configuration and
//! the typed request/reply shapes the dispatch layer sees.

pub mod config;
pub mod paths;
pub mod service;
pub mod types;

pub use {
    config::MarketplaceConfig,
    service::Marketplace,
    types::{
        BumpReport,
        DeleteReport,
        FileEdit,
        InstalledSkill,
        PublishRequest,
        SaveReport,
        SaveRequest,
        SkillBundle,
        SkillDetails,
        SkillSummary,
        TokenGrant,
        UpdateCheck,
        Whoami,
    },
};
