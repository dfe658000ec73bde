// src/services/browser.rs

//! Chrome-backed listing driver.
//!
//! Drives the listing over the DevTools protocol with `chromiumoxide`. Cell
//! and panel contents are read as HTML and parsed in [`super::panel`].

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use super::{ListingDriver, ListingRow, panel};
use crate::error::{AppError, Result};
use crate::models::{BrowserConfig, ListingSelectors, TimingConfig};

/// Removes Bootstrap modals that cover the listing on first load.
const REMOVE_MODALS_JS: &str = r#"
(() => {
    document.querySelectorAll('.modal.show').forEach(m => m.parentNode.removeChild(m));
    const backdrop = document.querySelector('.modal-backdrop');
    if (backdrop) backdrop.parentNode.removeChild(backdrop);
    document.body.classList.remove('modal-open');
})()
"#;

/// Outer HTML of the child row DataTables inserts after an expanded row.
const DETAIL_ROW_JS: &str = r#"
function() {
    const next = this.nextElementSibling;
    return next ? next.outerHTML : '';
}
"#;

/// Listing driver backed by a Chrome session.
pub struct BrowserDriver {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    page: Page,
    selectors: Arc<ListingSelectors>,
    timing: TimingConfig,
    base_url: StdMutex<Option<Url>>,
}

impl BrowserDriver {
    /// Launch Chrome and open a blank tab.
    pub async fn launch(
        config: &BrowserConfig,
        selectors: &ListingSelectors,
        timing: &TimingConfig,
    ) -> Result<Self> {
        let mut builder = ChromeConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if config.maximized {
            builder = builder.arg("--start-maximized");
        }
        if config.disable_extensions {
            builder = builder.arg("--disable-extensions");
        }
        if config.disable_infobars {
            builder = builder.arg("--disable-infobars");
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let chrome_config = builder
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .build()
            .map_err(AppError::browser)?;

        let (browser, mut events) = Browser::launch(chrome_config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    log::debug!("Browser event loop ended: {e}");
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        log::info!("Browser setup completed");

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            page,
            selectors: Arc::new(selectors.clone()),
            timing: timing.clone(),
            base_url: StdMutex::new(None),
        })
    }

    async fn remove_modals(&self) {
        match self.page.evaluate(REMOVE_MODALS_JS).await {
            Ok(_) => {
                tokio::time::sleep(self.timing.modal_removal()).await;
                log::debug!("Modal popups removed");
            }
            Err(e) => log::warn!("Failed to remove modal popups: {e}"),
        }
    }

    fn base_url(&self) -> Option<Url> {
        self.base_url.lock().ok().and_then(|guard| guard.clone())
    }

    /// The next-page control, or `None` when the page has none.
    async fn next_button(&self) -> Option<Element> {
        match self.page.find_element(self.selectors.next_button.as_str()).await {
            Ok(button) => Some(button),
            Err(e) => {
                log::debug!("Next button not found: {e}");
                None
            }
        }
    }

    async fn is_disabled(&self, button: &Element) -> Result<bool> {
        let class = button.attribute("class").await?.unwrap_or_default();
        Ok(has_class(&class, &self.selectors.disabled_class))
    }
}

fn has_class(class_attr: &str, class: &str) -> bool {
    class_attr.split_whitespace().any(|c| c == class)
}

#[async_trait]
impl ListingDriver for BrowserDriver {
    type Row = BrowserRow;

    async fn navigate(&self, url: &str) -> Result<()> {
        log::info!("Navigating to: {url}");
        self.page.goto(url).await?;
        if let Ok(mut guard) = self.base_url.lock() {
            *guard = Url::parse(url).ok();
        }

        tokio::time::sleep(self.timing.page_load()).await;
        self.remove_modals().await;

        log::info!("Page loaded successfully");
        Ok(())
    }

    async fn list_rows(&self) -> Result<Vec<BrowserRow>> {
        let elements = self
            .page
            .find_elements(self.selectors.row_selector.as_str())
            .await?;

        let base_url = self.base_url();
        let mut rows = Vec::with_capacity(elements.len());
        for element in elements {
            let inner = element.inner_html().await?.unwrap_or_default();
            if panel::is_placeholder(&inner, &self.selectors.placeholder_prefix) {
                continue;
            }
            rows.push(BrowserRow {
                element,
                selectors: Arc::clone(&self.selectors),
                base_url: base_url.clone(),
                panel_html: StdMutex::new(None),
            });
        }
        Ok(rows)
    }

    async fn has_next_page(&self) -> Result<bool> {
        match self.next_button().await {
            Some(button) => Ok(!self.is_disabled(&button).await?),
            None => Ok(false),
        }
    }

    async fn go_to_next_page(&self) -> Result<bool> {
        let Some(button) = self.next_button().await else {
            log::info!("Next button not found, no more pages");
            return Ok(false);
        };
        if self.is_disabled(&button).await? {
            log::info!("Next button is disabled, no more pages");
            return Ok(false);
        }

        button.click().await?;
        Ok(true)
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await?;
        if let Err(e) = browser.wait().await {
            log::debug!("Browser process did not exit cleanly: {e}");
        }
        self.handler.abort();
        log::info!("Browser closed successfully");
        Ok(())
    }
}

/// A listing row inside the Chrome session.
pub struct BrowserRow {
    element: Element,
    selectors: Arc<ListingSelectors>,
    base_url: Option<Url>,
    /// Detail row HTML captured after the panel opened
    panel_html: StdMutex<Option<String>>,
}

impl BrowserRow {
    async fn is_expanded(&self) -> Result<bool> {
        let class = self.element.attribute("class").await?.unwrap_or_default();
        Ok(has_class(&class, &self.selectors.expanded_class))
    }

    async fn toggle(&self) -> Result<()> {
        let control = self.element.find_element("td").await?;
        control.click().await?;
        Ok(())
    }

    fn reset_panel(&self) {
        if let Ok(mut guard) = self.panel_html.lock() {
            *guard = None;
        }
    }

    /// This row's detail panel HTML, fetched once per expansion.
    async fn panel(&self) -> Result<String> {
        let cached = self.panel_html.lock().ok().and_then(|guard| guard.clone());
        if let Some(html) = cached {
            return Ok(html);
        }

        let returned = self.element.call_js_fn(DETAIL_ROW_JS, false).await?;
        let html = returned
            .result
            .value
            .and_then(|value| value.as_str().map(str::to_owned))
            .unwrap_or_default();
        if let Ok(mut guard) = self.panel_html.lock() {
            *guard = Some(html.clone());
        }
        Ok(html)
    }
}

#[async_trait]
impl ListingRow for BrowserRow {
    async fn columns(&self) -> Result<Vec<String>> {
        let html = self
            .element
            .outer_html()
            .await?
            .ok_or_else(|| AppError::stale("row has no markup"))?;
        Ok(panel::row_cells(&html))
    }

    async fn expand(&self) -> Result<()> {
        if !self.is_expanded().await? {
            self.toggle().await?;
        }
        self.reset_panel();
        Ok(())
    }

    async fn collapse(&self) -> Result<()> {
        if self.is_expanded().await? {
            self.toggle().await?;
        }
        self.reset_panel();
        Ok(())
    }

    async fn labeled_value(&self, label: &str) -> Result<String> {
        let html = self.panel().await?;
        Ok(panel::labeled_value(&panel::detail_fragment(&html), label))
    }

    async fn document_links(&self) -> Result<Vec<String>> {
        let html = self.panel().await?;
        Ok(panel::document_links(
            &panel::detail_fragment(&html),
            &self.selectors.documents_label,
            &self.selectors.download_marker,
            self.base_url.as_ref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_matching_is_token_based() {
        assert!(has_class("paginate_button next disabled", "disabled"));
        assert!(!has_class("paginate_button next", "disabled"));
        assert!(has_class("odd dt-hasChild shown", "shown"));
        assert!(!has_class("odd unshown", "shown"));
    }
}
