//! Progress bars for long corpus passes.
//!
//! Bars draw to stderr unless turned off with [`set_progress_enabled`].

use std::{
    borrow::Cow,
    sync::atomic::{AtomicBool, Ordering},
};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

static PROGRESS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Show or hide every progress bar created after this call, process-wide.
pub fn set_progress_enabled(enabled: bool) {
    PROGRESS_ENABLED.store(enabled, Ordering::Relaxed);
}

#[must_use]
pub fn progress_enabled() -> bool {
    PROGRESS_ENABLED.load(Ordering::Relaxed)
}

/// A bar of `len` steps, hidden when progress is disabled.
#[must_use]
pub fn progress_bar(len: usize) -> ProgressBar {
    if progress_enabled() {
        ProgressBar::new(len as u64)
    } else {
        ProgressBar::with_draw_target(Some(len as u64), ProgressDrawTarget::hidden())
    }
}

pub(crate) fn progress_bar_setup(
    len: usize,
    message: impl Into<Cow<'static, str>>,
) -> ProgressBar {
    let pb = progress_bar(len);
    let style = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message);
    pb
}
