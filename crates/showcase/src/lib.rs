//! FashionFactory showcase: runs the landing page's lazy videos against a
//! simulated scrolling viewport and reports when each one loaded.

pub mod config;
pub mod page;

pub use config::{MediaSlot, Scene, ShowcaseConfig};
pub use page::{ShowcasePage, ShowcaseReport, VideoReport};

use common::SiteResult;

/// Showcase version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mount the scene, scroll through it, and unmount everything.
///
/// `scrolled` sees the page after the last scroll pass, before teardown.
pub fn run<F>(config: ShowcaseConfig, mut scene: Scene, scrolled: F) -> SiteResult<ShowcaseReport>
where
    F: FnOnce(&ShowcasePage),
{
    if let Some(base) = &config.base_url {
        scene.resolve_against(base)?;
    }

    let mut page = ShowcasePage::new(config, scene);
    page.mount_all()?;
    page.scroll_through();
    scrolled(&page);
    page.unmount_all();
    Ok(page.report())
}
