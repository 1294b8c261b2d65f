//! Media capability: open a song's external link
//!
//! The core never consumes a return value from the media context, so the
//! seam is a fire-and-forget sync call. The presentation layer supplies the
//! real opener; the default just logs.

/// Capability to open a media URL in a new context
pub trait MediaOpener: Send + Sync {
    fn open_url(&self, url: &str);
}

/// Default opener: logs the URL and does nothing else
pub struct LogOpener;

impl MediaOpener for LogOpener {
    fn open_url(&self, url: &str) {
        tracing::info!(url = %url, "Media link opened");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CapturingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl MediaOpener for CapturingOpener {
        fn open_url(&self, url: &str) {
            self.opened.lock().unwrap().push(url.to_string());
        }
    }

    #[test]
    fn test_opener_seam_is_object_safe() {
        let opener: Box<dyn MediaOpener> = Box::new(CapturingOpener {
            opened: Mutex::new(Vec::new()),
        });
        opener.open_url("https://example.com/song");
    }
}
