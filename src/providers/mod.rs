pub mod caching;
pub mod rate_service;
pub mod steam_catalog;
pub mod util;

pub use caching::CachingRateSource;
pub use rate_service::HttpRateProvider;
pub use steam_catalog::SteamCatalogProvider;
