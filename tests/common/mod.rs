//! Common test utilities for sheet-image-dl integration tests

#[allow(dead_code)]
pub mod cms;
#[allow(dead_code)]
pub mod http;

#[allow(unused_imports)]
pub use cms::*;
#[allow(unused_imports)]
pub use http::*;

/// Skip the current test when live credentials are not configured
#[macro_export]
macro_rules! skip_if_no_credentials {
    () => {
        dotenvy::dotenv().ok();
        if std::env::var("CMS_ACCESS_TOKEN").is_err() || std::env::var("LIVE_SIGNED_URL").is_err()
        {
            eprintln!("Skipping: CMS_ACCESS_TOKEN or LIVE_SIGNED_URL not set");
            return;
        }
    };
}
